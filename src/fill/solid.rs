use crate::channel::layout::{ChannelLayout, ChannelRole, ColorComponent};
use crate::fill::occupancy::OccupancyGrid;
use crate::fill::wavefront::check_shapes;
use crate::foundation::core::{FillColor, SAMPLE_TRANSPARENT};
use crate::foundation::error::AlphaFillResult;
use crate::raster::buffer::PixelBuffer;

/// The full pixel written by a solid fill: color lanes from `color`, alpha fully transparent.
pub fn solid_pixel(layout: &ChannelLayout, color: FillColor) -> Vec<u16> {
    layout
        .roles()
        .iter()
        .map(|role| match role {
            ChannelRole::Color(ColorComponent::Red) => color.r,
            ChannelRole::Color(ColorComponent::Green) => color.g,
            ChannelRole::Color(ColorComponent::Blue) => color.b,
            ChannelRole::Color(ColorComponent::Gray) => color.luma(),
            ChannelRole::Alpha | ChannelRole::Unsupported(_) => SAMPLE_TRANSPARENT,
        })
        .collect()
}

/// Overwrite every unsettled pixel with `color` and settle it. Returns how many were filled.
///
/// Settled pixels are never touched, so a second call is a no-op.
pub fn solid_fill(
    buffer: &mut PixelBuffer,
    grid: &mut OccupancyGrid,
    layout: &ChannelLayout,
    color: FillColor,
) -> AlphaFillResult<usize> {
    check_shapes(layout, buffer, grid)?;

    let fill = solid_pixel(layout, color);
    let targets: Vec<_> = grid.unsettled().collect();
    for &pos in &targets {
        buffer.pixel_mut(pos).copy_from_slice(&fill);
        grid.mark_settled(pos);
    }
    Ok(targets.len())
}

#[cfg(test)]
#[path = "../../tests/unit/fill/solid.rs"]
mod tests;
