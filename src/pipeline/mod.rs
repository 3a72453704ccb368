pub(crate) mod ops;
pub(crate) mod processor;
