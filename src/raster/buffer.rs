use crate::foundation::core::Position;
use crate::foundation::error::{AlphaFillError, AlphaFillResult};

/// Row-major, interleaved 16-bit pixel samples.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    channels: usize,
    samples: Vec<u16>,
}

impl PixelBuffer {
    /// Wrap `samples`, which must hold exactly `width * height * channels` values.
    pub fn new(width: u32, height: u32, channels: usize, samples: Vec<u16>) -> AlphaFillResult<Self> {
        if width == 0 || height == 0 {
            return Err(AlphaFillError::validation(
                "pixel buffer dimensions must be non-zero",
            ));
        }
        if channels == 0 {
            return Err(AlphaFillError::validation(
                "pixel buffer needs at least one channel",
            ));
        }
        let expected_len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(channels))
            .ok_or_else(|| AlphaFillError::validation("pixel buffer size overflow"))?;
        if samples.len() != expected_len {
            return Err(AlphaFillError::validation(format!(
                "pixel buffer expects {expected_len} samples ({width}x{height}x{channels}), got {}",
                samples.len()
            )));
        }
        Ok(Self {
            width,
            height,
            channels,
            samples,
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Samples per pixel.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// `width * height`.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Interleaved samples, row-major.
    pub fn samples(&self) -> &[u16] {
        &self.samples
    }

    /// Take the interleaved samples.
    pub fn into_samples(self) -> Vec<u16> {
        self.samples
    }

    /// Samples of the pixel at `pos`. Panics if `pos` is out of bounds.
    pub fn pixel(&self, pos: Position) -> &[u16] {
        let start = self.offset_of(pos);
        &self.samples[start..start + self.channels]
    }

    /// Mutable samples of the pixel at `pos`. Panics if `pos` is out of bounds.
    pub fn pixel_mut(&mut self, pos: Position) -> &mut [u16] {
        let start = self.offset_of(pos);
        &mut self.samples[start..start + self.channels]
    }

    /// Iterate over every pixel's samples in row-major order.
    pub fn pixels(&self) -> std::slice::ChunksExact<'_, u16> {
        self.samples.chunks_exact(self.channels)
    }

    /// Set one channel of every pixel to `value`.
    pub fn fill_channel(&mut self, channel: usize, value: u16) {
        for px in self.samples.chunks_exact_mut(self.channels) {
            px[channel] = value;
        }
    }

    /// Whether `(x, y)` lies inside the buffer.
    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && x < i64::from(self.width) && y < i64::from(self.height)
    }

    fn offset_of(&self, pos: Position) -> usize {
        debug_assert!(pos.x < self.width && pos.y < self.height);
        (pos.y as usize * self.width as usize + pos.x as usize) * self.channels
    }
}

#[cfg(test)]
#[path = "../../tests/unit/raster/buffer.rs"]
mod tests;
