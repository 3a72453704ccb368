use std::fmt;

/// Convenience result type used across alphafill.
pub type AlphaFillResult<T> = Result<T, AlphaFillError>;

/// Channel kinds the fill engine refuses to touch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnsupportedChannel {
    /// Palette index channel (indexed color).
    PaletteIndex,
    /// Pre-composited channel.
    Composite,
}

impl fmt::Display for UnsupportedChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::PaletteIndex => "palette index",
            Self::Composite => "composite",
        })
    }
}

/// Top-level error taxonomy used by engine APIs.
///
/// Construction errors (`UnsupportedChannelLayout`, `InvalidColorChannelCount`,
/// `MissingAlphaChannel`) are raised before any pixel is touched. `ZeroTotalWeight` and
/// `Invariant` mean the frontier/occupancy bookkeeping is broken and are never retried.
#[derive(thiserror::Error, Debug)]
pub enum AlphaFillError {
    /// The image carries a channel the engine cannot interpret as color or alpha.
    #[error("unsupported channel layout: channel {index} is a {kind} channel")]
    UnsupportedChannelLayout {
        /// Index of the offending channel in the source layout.
        index: usize,
        /// What kind of channel it is.
        kind: UnsupportedChannel,
    },

    /// The image has no color channels, or more than the engine's three accumulator lanes.
    #[error("invalid color channel count: {count} (expected 1..=3)")]
    InvalidColorChannelCount {
        /// Number of color channels found.
        count: usize,
    },

    /// The image has no alpha channel, so there is nothing to repair.
    #[error("missing alpha channel")]
    MissingAlphaChannel,

    /// Invalid caller-provided data (buffer shape, options, operation syntax).
    #[error("validation error: {0}")]
    Validation(String),

    /// A frontier pixel had no settled sample in its kernel.
    #[error("internal error: total sample weight was zero at ({x}, {y})")]
    ZeroTotalWeight {
        /// Column of the frontier pixel.
        x: u32,
        /// Row of the frontier pixel.
        y: u32,
    },

    /// Any other broken engine invariant.
    #[error("internal error: {0}")]
    Invariant(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AlphaFillError {
    /// Build a [`AlphaFillError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`AlphaFillError::Invariant`] value.
    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::Invariant(msg.into())
    }

    /// True for errors raised while validating the source image layout.
    pub fn is_construction(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedChannelLayout { .. }
                | Self::InvalidColorChannelCount { .. }
                | Self::MissingAlphaChannel
        )
    }

    /// True for errors that signal a bug in engine bookkeeping rather than bad input.
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::ZeroTotalWeight { .. } | Self::Invariant(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
