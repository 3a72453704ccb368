pub(crate) mod kernel;
pub(crate) mod occupancy;
pub(crate) mod solid;
pub(crate) mod wavefront;
