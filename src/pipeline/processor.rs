use std::path::Path;

use image::{ColorType, DynamicImage, ImageFormat};

use crate::channel::layout::{ChannelLayout, ChannelRole};
use crate::fill::kernel::{KernelSpec, SampleKernel};
use crate::fill::occupancy::OccupancyGrid;
use crate::fill::solid::solid_fill;
use crate::fill::wavefront::{FrontierScratch, PropagateStats, WavefrontEngine};
use crate::foundation::core::{FillColor, SAMPLE_MAX};
use crate::foundation::error::{AlphaFillError, AlphaFillResult};
use crate::raster::buffer::PixelBuffer;
use crate::raster::codec::{self, DecodedImage};

/// How round estimation is spread over threads.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FillThreading {
    /// Split large frontiers across a rayon pool.
    pub parallel: bool,
    /// Worker count for the pool. `None` uses rayon's default.
    pub threads: Option<usize>,
}

impl Default for FillThreading {
    fn default() -> Self {
        Self {
            parallel: true,
            threads: None,
        }
    }
}

/// Options fixed for the lifetime of a [`Processor`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProcessorOpts {
    /// Sampling neighbourhood used by propagation.
    pub kernel: KernelSpec,
    /// Threading for propagation rounds.
    pub threading: FillThreading,
}

/// One image's mutable fill state: pixels, settled flags, kernel and worker pool.
pub struct Processor {
    buffer: PixelBuffer,
    layout: ChannelLayout,
    grid: OccupancyGrid,
    kernel: SampleKernel,
    pool: Option<rayon::ThreadPool>,
    scratch: FrontierScratch,
    color_type: ColorType,
}

impl std::fmt::Debug for Processor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Processor")
            .field("width", &self.buffer.width())
            .field("height", &self.buffer.height())
            .field("layout", &self.layout)
            .field("kernel", &self.kernel.spec())
            .field("parallel", &self.pool.is_some())
            .field("unsettled", &self.grid.unsettled_count())
            .finish()
    }
}

impl Processor {
    /// Build a processor over a raw buffer whose channels carry `roles`.
    ///
    /// Layout errors are reported before anything else is allocated. Any valid role order can be
    /// filled, but only gray, gray+alpha, rgb and rgba order can be encoded; see
    /// [`Self::can_encode`].
    pub fn new(
        buffer: PixelBuffer,
        roles: &[ChannelRole],
        opts: &ProcessorOpts,
    ) -> AlphaFillResult<Self> {
        let color_type = match buffer.channels() {
            1 => ColorType::L16,
            2 => ColorType::La16,
            3 => ColorType::Rgb16,
            _ => ColorType::Rgba16,
        };
        Self::with_color_type(buffer, roles, color_type, opts)
    }

    /// Build a processor from a decoded image, remembering its color type for output.
    pub fn from_decoded(decoded: DecodedImage, opts: &ProcessorOpts) -> AlphaFillResult<Self> {
        Self::with_color_type(decoded.buffer, &decoded.roles, decoded.color_type, opts)
    }

    /// Decode `path` and build a processor for it.
    pub fn open(path: &Path, opts: &ProcessorOpts) -> AlphaFillResult<Self> {
        Self::from_decoded(codec::open_image(path)?, opts)
    }

    fn with_color_type(
        buffer: PixelBuffer,
        roles: &[ChannelRole],
        color_type: ColorType,
        opts: &ProcessorOpts,
    ) -> AlphaFillResult<Self> {
        let layout = ChannelLayout::derive(roles)?;
        if layout.channel_count() != buffer.channels() {
            return Err(AlphaFillError::validation(format!(
                "{} channel roles given for a buffer with {} channels",
                layout.channel_count(),
                buffer.channels()
            )));
        }
        let kernel = SampleKernel::new(opts.kernel)?;
        let pool = if opts.threading.parallel {
            Some(build_thread_pool(opts.threading.threads)?)
        } else {
            None
        };
        let grid = OccupancyGrid::from_alpha(&buffer, layout.alpha_index());

        tracing::debug!(
            width = buffer.width(),
            height = buffer.height(),
            channels = buffer.channels(),
            settled = grid.settled_count(),
            "processor ready"
        );

        Ok(Self {
            buffer,
            layout,
            grid,
            kernel,
            pool,
            scratch: FrontierScratch::default(),
            color_type,
        })
    }

    /// Whether [`Self::output_image`] and the write methods accept this channel order.
    pub fn can_encode(&self) -> bool {
        codec::canonical_roles(self.buffer.channels()) == Some(self.layout.roles())
    }

    /// Current pixel data.
    pub fn buffer(&self) -> &PixelBuffer {
        &self.buffer
    }

    /// Give up the processor and keep its pixels.
    pub fn into_buffer(self) -> PixelBuffer {
        self.buffer
    }

    /// Channel classification of the buffer.
    pub fn layout(&self) -> &ChannelLayout {
        &self.layout
    }

    /// Which pixels hold a valid color.
    pub fn grid(&self) -> &OccupancyGrid {
        &self.grid
    }

    /// Sampling kernel used by [`Self::propagate`].
    pub fn kernel(&self) -> &SampleKernel {
        &self.kernel
    }

    /// Run wavefront propagation for at most `max_rounds` rounds (`None` = until converged).
    #[tracing::instrument(skip(self))]
    pub fn propagate(&mut self, max_rounds: Option<u32>) -> AlphaFillResult<PropagateStats> {
        let engine = WavefrontEngine::new(&self.layout, &self.kernel, self.pool.as_ref());
        let stats = engine.run(
            &mut self.buffer,
            &mut self.grid,
            max_rounds,
            &mut self.scratch,
        )?;
        tracing::info!(
            rounds = stats.rounds,
            settled = stats.settled,
            outcome = ?stats.outcome,
            "propagate done"
        );
        if stats.overflowed > 0 {
            tracing::warn!(
                overflowed = stats.overflowed,
                "samples were clamped; this points at a weighting bug"
            );
        }
        Ok(stats)
    }

    /// Paint every still-unsettled pixel with `color` and zero alpha.
    #[tracing::instrument(skip(self, color), fields(color = %color))]
    pub fn solid_fill(&mut self, color: FillColor) -> AlphaFillResult<usize> {
        let filled = solid_fill(&mut self.buffer, &mut self.grid, &self.layout, color)?;
        tracing::info!(filled, "solid fill done");
        Ok(filled)
    }

    /// Copy of the buffer with alpha forced fully opaque, for looking at the filled colors.
    pub fn preview_buffer(&self) -> PixelBuffer {
        let mut preview = self.buffer.clone();
        preview.fill_channel(self.layout.alpha_index(), SAMPLE_MAX);
        preview
    }

    /// Current state converted back to the source color type.
    pub fn output_image(&self) -> AlphaFillResult<DynamicImage> {
        codec::to_dynamic(&self.buffer, self.layout.roles(), self.color_type)
    }

    /// Like [`Self::output_image`] but fully opaque.
    pub fn preview_image(&self) -> AlphaFillResult<DynamicImage> {
        codec::to_dynamic(&self.preview_buffer(), self.layout.roles(), self.color_type)
    }

    /// Write the current state to `path`, format chosen by extension.
    pub fn write_output(&self, path: &Path) -> AlphaFillResult<()> {
        self.write_image_as(path, codec::format_for_path(path)?, false)
    }

    /// Write an opaque preview of the current state to `path`.
    pub fn write_preview(&self, path: &Path) -> AlphaFillResult<()> {
        self.write_image_as(path, codec::format_for_path(path)?, true)
    }

    pub(crate) fn write_image_as(
        &self,
        path: &Path,
        format: ImageFormat,
        preview: bool,
    ) -> AlphaFillResult<()> {
        let img = if preview {
            self.preview_image()?
        } else {
            self.output_image()?
        };
        codec::save_image(&img, path, format)
    }
}

fn build_thread_pool(threads: Option<usize>) -> AlphaFillResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(AlphaFillError::validation(
            "fill threading 'threads' must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new().thread_name(|i| format!("alphafill-{i}"));
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| anyhow::anyhow!("failed to build rayon thread pool: {e}").into())
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/processor.rs"]
mod tests;
