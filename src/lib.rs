//! alphafill repairs the color of fully transparent pixels.
//!
//! Image tools that resample, blur or composite RGBA data routinely blend the color of
//! transparent pixels into their opaque neighbours. When those colors are garbage (often black),
//! edges come out dark or fringed. alphafill grows plausible color outwards from the visible
//! content so that any later blending stays clean, and leaves alpha alone.
//!
//! # Pipeline overview
//!
//! 1. **Decode**: image file -> 16-bit [`PixelBuffer`] + [`ChannelRole`]s
//! 2. **Classify**: roles -> [`ChannelLayout`] (exactly one alpha, one to three color channels)
//! 3. **Fill**: [`Operation`]s applied in order to one [`Processor`]
//!    - `Propagate`: wavefront rounds of inverse-distance weighted averaging
//!    - `SolidFill`: one color for whatever propagation did not reach
//! 4. **Write**: output (and optional opaque previews), only if every step succeeded
//!
//! ```no_run
//! use std::path::Path;
//!
//! let mut processor = alphafill::Processor::open(
//!     Path::new("sprite.png"),
//!     &alphafill::ProcessorOpts::default(),
//! )?;
//! alphafill::Pipeline::new(vec![
//!     alphafill::Operation::Propagate { max_rounds: Some(16) },
//!     alphafill::Operation::SolidFill { color: alphafill::FillColor::BLACK },
//! ])
//! .with_defaults(Path::new("sprite.filled.png"))
//! .run(&mut processor)?;
//! # Ok::<(), alphafill::AlphaFillError>(())
//! ```
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod channel;
mod fill;
mod foundation;
mod pipeline;
mod raster;

pub use channel::layout::{ChannelLayout, ChannelRole, ColorComponent};
pub use fill::kernel::{KernelShape, KernelSpec, KernelTap, MAX_KERNEL_RADIUS, SampleKernel};
pub use fill::occupancy::OccupancyGrid;
pub use fill::solid::{solid_fill, solid_pixel};
pub use fill::wavefront::{
    FrontierScratch, PropagateOutcome, PropagateStats, WavefrontEngine, WorkItem,
    advance_frontier, quantize_sample,
};
pub use foundation::core::{
    FillColor, MAX_COLOR_CHANNELS, Position, SAMPLE_MAX, SAMPLE_TRANSPARENT,
};
pub use foundation::error::{AlphaFillError, AlphaFillResult, UnsupportedChannel};
pub use pipeline::ops::{OpReport, Operation, Pipeline, PipelineReport, default_output_path};
pub use pipeline::processor::{FillThreading, Processor, ProcessorOpts};
pub use raster::buffer::PixelBuffer;
pub use raster::codec::{
    DecodedImage, canonical_roles, decode_image, from_dynamic, open_image, to_dynamic,
};
