use crate::foundation::core::MAX_COLOR_CHANNELS;
use crate::foundation::error::{AlphaFillError, AlphaFillResult, UnsupportedChannel};

/// Which color a color channel carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColorComponent {
    /// Red.
    Red,
    /// Green.
    Green,
    /// Blue.
    Blue,
    /// Luminance of a grayscale image.
    Gray,
}

/// Semantic role of one channel in the source pixel layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChannelRole {
    /// Color data the engine estimates.
    Color(ColorComponent),
    /// Coverage. Zero means fully transparent.
    Alpha,
    /// A channel kind the engine rejects outright.
    Unsupported(UnsupportedChannel),
}

/// Alpha and color channel indices derived from a role list.
///
/// The color index order is the source order; accumulation and write-back both rely on it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChannelLayout {
    roles: Vec<ChannelRole>,
    alpha: usize,
    color: Vec<usize>,
}

impl ChannelLayout {
    /// Classify `roles`, rejecting layouts the engine cannot process.
    pub fn derive(roles: &[ChannelRole]) -> AlphaFillResult<Self> {
        let mut alpha = None;
        let mut color = Vec::with_capacity(MAX_COLOR_CHANNELS);

        for (index, role) in roles.iter().enumerate() {
            match *role {
                ChannelRole::Alpha => {
                    if alpha.is_some() {
                        return Err(AlphaFillError::validation(format!(
                            "channel layout has more than one alpha channel (second at index {index})"
                        )));
                    }
                    alpha = Some(index);
                }
                ChannelRole::Color(_) => color.push(index),
                ChannelRole::Unsupported(kind) => {
                    return Err(AlphaFillError::UnsupportedChannelLayout { index, kind });
                }
            }
        }

        if color.is_empty() || color.len() > MAX_COLOR_CHANNELS {
            return Err(AlphaFillError::InvalidColorChannelCount { count: color.len() });
        }
        let alpha = alpha.ok_or(AlphaFillError::MissingAlphaChannel)?;

        Ok(Self {
            roles: roles.to_vec(),
            alpha,
            color,
        })
    }

    /// Index of the alpha channel.
    pub fn alpha_index(&self) -> usize {
        self.alpha
    }

    /// Indices of the color channels, in source order.
    pub fn color_indices(&self) -> &[usize] {
        &self.color
    }

    /// Total number of channels per pixel.
    pub fn channel_count(&self) -> usize {
        self.roles.len()
    }

    /// The role list this layout was derived from.
    pub fn roles(&self) -> &[ChannelRole] {
        &self.roles
    }

    /// Components of the color channels, aligned with [`Self::color_indices`].
    pub fn color_components(&self) -> impl Iterator<Item = ColorComponent> + '_ {
        self.color.iter().filter_map(|&i| match self.roles[i] {
            ChannelRole::Color(c) => Some(c),
            _ => None,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/channel/layout.rs"]
mod tests;
