//! Bridge between `image` crate buffers and the engine's 16-bit [`PixelBuffer`].
//!
//! Decoding widens every supported color type to 16 bits per sample; encoding narrows back to the
//! color type the image was decoded from, so 8-bit inputs round-trip exactly.

use std::path::Path;

use anyhow::Context as _;
use image::{ColorType, DynamicImage, GenericImageView as _, ImageBuffer, ImageFormat};

use crate::channel::layout::{ChannelRole, ColorComponent};
use crate::foundation::core::SAMPLE_TRANSPARENT;
use crate::foundation::error::{AlphaFillError, AlphaFillResult};
use crate::raster::buffer::PixelBuffer;

const GRAY: [ChannelRole; 1] = [ChannelRole::Color(ColorComponent::Gray)];
const GRAY_ALPHA: [ChannelRole; 2] = [ChannelRole::Color(ColorComponent::Gray), ChannelRole::Alpha];
const RGB: [ChannelRole; 3] = [
    ChannelRole::Color(ColorComponent::Red),
    ChannelRole::Color(ColorComponent::Green),
    ChannelRole::Color(ColorComponent::Blue),
];
const RGBA: [ChannelRole; 4] = [
    ChannelRole::Color(ColorComponent::Red),
    ChannelRole::Color(ColorComponent::Green),
    ChannelRole::Color(ColorComponent::Blue),
    ChannelRole::Alpha,
];

/// A decoded image in the engine's working representation.
#[derive(Clone, Debug)]
pub struct DecodedImage {
    /// Widened samples.
    pub buffer: PixelBuffer,
    /// Channel roles, one per sample in a pixel.
    pub roles: Vec<ChannelRole>,
    /// Color type of the source, restored on encode.
    pub color_type: ColorType,
}

/// Channel roles of the canonical layout for `channels` interleaved samples.
pub fn canonical_roles(channels: usize) -> Option<&'static [ChannelRole]> {
    match channels {
        1 => Some(&GRAY),
        2 => Some(&GRAY_ALPHA),
        3 => Some(&RGB),
        4 => Some(&RGBA),
        _ => None,
    }
}

/// Widen a decoded image to 16-bit samples.
///
/// Float alpha that is positive but rounds to zero is kept at the smallest visible step, so such a
/// pixel is never mistaken for a transparent one.
pub fn from_dynamic(img: DynamicImage) -> AlphaFillResult<DecodedImage> {
    let color_type = img.color();
    let (width, height) = img.dimensions();
    let float_visible: Option<Vec<bool>> = match &img {
        DynamicImage::ImageRgba32F(src) => Some(src.pixels().map(|p| p.0[3] > 0.0).collect()),
        _ => None,
    };

    let mut samples = match (color_type.has_color(), color_type.has_alpha()) {
        (false, false) => img.into_luma16().into_raw(),
        (false, true) => img.into_luma_alpha16().into_raw(),
        (true, false) => img.into_rgb16().into_raw(),
        (true, true) => img.into_rgba16().into_raw(),
    };
    if let Some(visible) = float_visible {
        for (px, visible) in samples.chunks_exact_mut(4).zip(visible) {
            if visible && px[3] == SAMPLE_TRANSPARENT {
                px[3] = SAMPLE_TRANSPARENT + 1;
            }
        }
    }
    let channels = usize::from(color_type.channel_count());
    let roles = canonical_roles(channels)
        .ok_or_else(|| {
            AlphaFillError::validation(format!("unsupported color type {color_type:?}"))
        })?
        .to_vec();
    let buffer = PixelBuffer::new(width, height, channels, samples)?;

    Ok(DecodedImage {
        buffer,
        roles,
        color_type,
    })
}

/// Decode encoded image bytes.
pub fn decode_image(bytes: &[u8]) -> AlphaFillResult<DecodedImage> {
    let img = image::load_from_memory(bytes).context("decode image from memory")?;
    from_dynamic(img)
}

/// Open and decode an image file; the format is guessed from its contents.
pub fn open_image(path: &Path) -> AlphaFillResult<DecodedImage> {
    let img = image::ImageReader::open(path)
        .with_context(|| format!("open image '{}'", path.display()))?
        .with_guessed_format()
        .with_context(|| format!("detect format of '{}'", path.display()))?
        .decode()
        .with_context(|| format!("decode image '{}'", path.display()))?;
    from_dynamic(img)
}

/// Narrow `buffer` back to `color_type`.
///
/// The buffer must use the canonical channel order for its channel count (gray, gray+alpha, RGB,
/// RGBA).
pub fn to_dynamic(
    buffer: &PixelBuffer,
    roles: &[ChannelRole],
    color_type: ColorType,
) -> AlphaFillResult<DynamicImage> {
    if canonical_roles(buffer.channels()) != Some(roles) {
        return Err(AlphaFillError::validation(format!(
            "cannot encode channel layout {roles:?}; expected gray, gray+alpha, rgb or rgba order"
        )));
    }

    let (w, h) = (buffer.width(), buffer.height());
    let raw = buffer.samples().to_vec();
    let shape_err = || AlphaFillError::validation("pixel buffer does not match its dimensions");
    let wide = match buffer.channels() {
        1 => DynamicImage::ImageLuma16(ImageBuffer::from_raw(w, h, raw).ok_or_else(shape_err)?),
        2 => DynamicImage::ImageLumaA16(ImageBuffer::from_raw(w, h, raw).ok_or_else(shape_err)?),
        3 => DynamicImage::ImageRgb16(ImageBuffer::from_raw(w, h, raw).ok_or_else(shape_err)?),
        _ => DynamicImage::ImageRgba16(ImageBuffer::from_raw(w, h, raw).ok_or_else(shape_err)?),
    };

    Ok(match color_type {
        ColorType::L8 => DynamicImage::ImageLuma8(wide.to_luma8()),
        ColorType::La8 => DynamicImage::ImageLumaA8(wide.to_luma_alpha8()),
        ColorType::Rgb8 => DynamicImage::ImageRgb8(wide.to_rgb8()),
        ColorType::Rgba8 => DynamicImage::ImageRgba8(wide.to_rgba8()),
        ColorType::Rgb32F => DynamicImage::ImageRgb32F(wide.to_rgb32f()),
        ColorType::Rgba32F => DynamicImage::ImageRgba32F(wide.to_rgba32f()),
        _ => wide,
    })
}

/// Write `img` to `path` using an explicit format.
pub fn save_image(img: &DynamicImage, path: &Path, format: ImageFormat) -> AlphaFillResult<()> {
    img.save_with_format(path, format)
        .with_context(|| format!("write {format:?} image '{}'", path.display()))?;
    Ok(())
}

/// Guess the output format from a file extension.
pub fn format_for_path(path: &Path) -> AlphaFillResult<ImageFormat> {
    let fmt = ImageFormat::from_path(path)
        .with_context(|| format!("unknown image format for '{}'", path.display()))?;
    Ok(fmt)
}

#[cfg(test)]
#[path = "../../tests/unit/raster/codec.rs"]
mod tests;
