use crate::foundation::error::{AlphaFillError, AlphaFillResult};

/// Largest accepted kernel radius.
pub const MAX_KERNEL_RADIUS: u32 = 16;

/// Footprint of the sampling neighbourhood.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KernelShape {
    /// Every offset with `max(|dx|, |dy|) <= radius`.
    #[default]
    Square,
    /// Every offset with `dx² + dy² <= radius²`.
    Circle,
}

/// Shape and radius a [`SampleKernel`] is built from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct KernelSpec {
    /// Footprint.
    pub shape: KernelShape,
    /// Reach in pixels, `1..=MAX_KERNEL_RADIUS`.
    pub radius: u32,
}

impl Default for KernelSpec {
    fn default() -> Self {
        Self {
            shape: KernelShape::Square,
            radius: 2,
        }
    }
}

/// One neighbour offset and its inverse-distance weight.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KernelTap {
    /// Column offset.
    pub dx: i32,
    /// Row offset.
    pub dy: i32,
    /// `1 / sqrt(dx² + dy²)`.
    pub weight: f64,
}

/// Fixed list of weighted neighbour offsets, center excluded.
#[derive(Clone, Debug, PartialEq)]
pub struct SampleKernel {
    spec: KernelSpec,
    taps: Vec<KernelTap>,
}

impl SampleKernel {
    /// Build the taps for `spec`, rejecting radii outside `1..=MAX_KERNEL_RADIUS`.
    pub fn new(spec: KernelSpec) -> AlphaFillResult<Self> {
        if spec.radius == 0 || spec.radius > MAX_KERNEL_RADIUS {
            return Err(AlphaFillError::validation(format!(
                "kernel radius must be in 1..={MAX_KERNEL_RADIUS}, got {}",
                spec.radius
            )));
        }

        Ok(Self::build(spec))
    }

    fn build(spec: KernelSpec) -> Self {
        let r = spec.radius as i32;
        let mut taps = Vec::with_capacity(((2 * r + 1) * (2 * r + 1) - 1) as usize);
        for dx in -r..=r {
            for dy in -r..=r {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let dist_sq = dx * dx + dy * dy;
                if spec.shape == KernelShape::Circle && dist_sq > r * r {
                    continue;
                }
                taps.push(KernelTap {
                    dx,
                    dy,
                    weight: 1.0 / f64::from(dist_sq).sqrt(),
                });
            }
        }
        Self { spec, taps }
    }

    /// The shape and radius the taps were built from.
    pub fn spec(&self) -> KernelSpec {
        self.spec
    }

    /// Taps in row-major offset order.
    pub fn taps(&self) -> &[KernelTap] {
        &self.taps
    }

    /// Number of taps.
    pub fn len(&self) -> usize {
        self.taps.len()
    }

    /// Never true for a validated kernel.
    pub fn is_empty(&self) -> bool {
        self.taps.is_empty()
    }
}

impl Default for SampleKernel {
    fn default() -> Self {
        Self::build(KernelSpec::default())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/fill/kernel.rs"]
mod tests;
