//! Round-based color propagation into transparent pixels.
//!
//! Each round estimates every frontier pixel from its settled neighbourhood, then commits all
//! estimates at once, then derives the next frontier from the pixels just settled. Estimation
//! only reads the buffer and grid, so it can be split across a rayon pool; commits and frontier
//! bookkeeping are sequential.

use rayon::prelude::*;

use crate::channel::layout::ChannelLayout;
use crate::fill::kernel::SampleKernel;
use crate::fill::occupancy::{NEIGHBOURS_4, OccupancyGrid};
use crate::foundation::core::{MAX_COLOR_CHANNELS, Position, SAMPLE_MAX};
use crate::foundation::error::{AlphaFillError, AlphaFillResult};
use crate::raster::buffer::PixelBuffer;

const ITEMS_PER_CHUNK: usize = 100;
const MIN_CHUNKS: usize = 8;

/// Why a propagate run stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PropagateOutcome {
    /// The frontier ran empty: every reachable pixel is settled.
    Converged,
    /// The round budget ran out with frontier pixels left.
    RoundBudgetExhausted,
}

/// Summary of one propagate run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct PropagateStats {
    /// Rounds performed.
    pub rounds: u32,
    /// Pixels settled by this run.
    pub settled: usize,
    /// Samples that fell outside the sample domain before clamping.
    pub overflowed: usize,
    /// Final loop state.
    pub outcome: PropagateOutcome,
}

/// A frontier pixel and its estimated color lanes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorkItem {
    /// Pixel being estimated.
    pub pos: Position,
    /// Averaged color, one lane per color channel in layout order.
    pub values: [f64; MAX_COLOR_CHANNELS],
}

impl WorkItem {
    /// A work item with zeroed accumulators.
    pub fn new(pos: Position) -> Self {
        Self {
            pos,
            values: [0.0; MAX_COLOR_CHANNELS],
        }
    }
}

/// Caller-owned storage reused by every round's frontier deduplication.
#[derive(Debug, Default)]
pub struct FrontierScratch {
    discovered: Vec<Position>,
}

/// Estimates and commits frontier pixels for one image.
#[derive(Clone, Copy)]
pub struct WavefrontEngine<'a> {
    layout: &'a ChannelLayout,
    kernel: &'a SampleKernel,
    pool: Option<&'a rayon::ThreadPool>,
}

impl<'a> WavefrontEngine<'a> {
    /// `pool == None` runs every round on the calling thread.
    pub fn new(
        layout: &'a ChannelLayout,
        kernel: &'a SampleKernel,
        pool: Option<&'a rayon::ThreadPool>,
    ) -> Self {
        Self {
            layout,
            kernel,
            pool,
        }
    }

    /// Unsettled pixels with at least one settled 4-neighbour, row-major.
    pub fn initial_frontier(grid: &OccupancyGrid) -> Vec<WorkItem> {
        let mut work = Vec::new();
        for y in 0..grid.height() {
            for x in 0..grid.width() {
                let pos = Position::new(x, y);
                if grid.borders_settled(pos) {
                    work.push(WorkItem::new(pos));
                }
            }
        }
        work
    }

    /// Propagate settled color outwards for at most `max_rounds` rounds (`None` = until done).
    #[tracing::instrument(skip_all, fields(max_rounds = ?max_rounds))]
    pub fn run(
        &self,
        buffer: &mut PixelBuffer,
        grid: &mut OccupancyGrid,
        max_rounds: Option<u32>,
        scratch: &mut FrontierScratch,
    ) -> AlphaFillResult<PropagateStats> {
        check_shapes(self.layout, buffer, grid)?;

        let mut work = Self::initial_frontier(grid);
        let mut stats = PropagateStats {
            rounds: 0,
            settled: 0,
            overflowed: 0,
            outcome: PropagateOutcome::Converged,
        };

        while !work.is_empty() && max_rounds.is_none_or(|n| stats.rounds < n) {
            let parallel = self.pool.is_some() && parallel_chunk_len(work.len()).is_some();
            tracing::debug!(
                round = stats.rounds,
                frontier = work.len(),
                parallel,
                "propagate round"
            );

            self.estimate_round(&mut work, buffer, grid)?;
            stats.overflowed += self.commit(&work, buffer, grid)?;
            stats.settled += work.len();
            stats.rounds += 1;

            advance_frontier(&mut work, grid, scratch);
        }

        if !work.is_empty() {
            stats.outcome = PropagateOutcome::RoundBudgetExhausted;
        }
        Ok(stats)
    }

    fn estimate_round(
        &self,
        work: &mut [WorkItem],
        buffer: &PixelBuffer,
        grid: &OccupancyGrid,
    ) -> AlphaFillResult<()> {
        match (self.pool, parallel_chunk_len(work.len())) {
            (Some(pool), Some(chunk_len)) => pool.install(|| {
                work.par_chunks_mut(chunk_len).try_for_each(|chunk| {
                    chunk
                        .iter_mut()
                        .try_for_each(|item| self.estimate(item, buffer, grid))
                })
            }),
            _ => work
                .iter_mut()
                .try_for_each(|item| self.estimate(item, buffer, grid)),
        }
    }

    /// Inverse-distance weighted mean of the settled samples under the kernel.
    fn estimate(
        &self,
        item: &mut WorkItem,
        buffer: &PixelBuffer,
        grid: &OccupancyGrid,
    ) -> AlphaFillResult<()> {
        let color = self.layout.color_indices();
        let mut sums = [0.0f64; MAX_COLOR_CHANNELS];
        let mut total_weight = 0.0f64;

        for tap in self.kernel.taps() {
            let (x, y) = item.pos.offset(tap.dx, tap.dy);
            if !grid.is_settled(x, y) {
                continue;
            }
            let px = buffer.pixel(Position::new(x as u32, y as u32));
            total_weight += tap.weight;
            for (sum, &ch) in sums.iter_mut().zip(color) {
                *sum += f64::from(px[ch]) * tap.weight;
            }
        }

        if total_weight == 0.0 {
            return Err(AlphaFillError::ZeroTotalWeight {
                x: item.pos.x,
                y: item.pos.y,
            });
        }
        for (value, sum) in item.values.iter_mut().zip(sums) {
            *value = sum / total_weight;
        }
        Ok(())
    }

    /// Write estimates back and settle their pixels. Returns the number of clamped samples.
    fn commit(
        &self,
        work: &[WorkItem],
        buffer: &mut PixelBuffer,
        grid: &mut OccupancyGrid,
    ) -> AlphaFillResult<usize> {
        let color = self.layout.color_indices();
        let mut overflowed = 0;

        for item in work {
            if !grid.mark_settled(item.pos) {
                return Err(AlphaFillError::invariant(format!(
                    "frontier pixel ({}, {}) was already settled",
                    item.pos.x, item.pos.y
                )));
            }
            let px = buffer.pixel_mut(item.pos);
            for (&value, &ch) in item.values.iter().zip(color) {
                let (sample, in_range) = quantize_sample(value);
                if !in_range {
                    overflowed += 1;
                    tracing::warn!(
                        x = item.pos.x,
                        y = item.pos.y,
                        channel = ch,
                        value,
                        "estimated sample outside 0..={SAMPLE_MAX}, clamping"
                    );
                }
                px[ch] = sample;
            }
        }
        Ok(overflowed)
    }
}

/// The grid and the layout must describe the same raster as `buffer`.
pub(crate) fn check_shapes(
    layout: &ChannelLayout,
    buffer: &PixelBuffer,
    grid: &OccupancyGrid,
) -> AlphaFillResult<()> {
    if (grid.width(), grid.height()) != (buffer.width(), buffer.height()) {
        return Err(AlphaFillError::validation(format!(
            "occupancy grid is {}x{} but pixel buffer is {}x{}",
            grid.width(),
            grid.height(),
            buffer.width(),
            buffer.height()
        )));
    }
    if layout.channel_count() != buffer.channels() {
        return Err(AlphaFillError::validation(format!(
            "channel layout has {} channels but pixel buffer has {}",
            layout.channel_count(),
            buffer.channels()
        )));
    }
    Ok(())
}

/// Replace `work` with the deduplicated unsettled 4-neighbours of its pixels.
pub fn advance_frontier(
    work: &mut Vec<WorkItem>,
    grid: &OccupancyGrid,
    scratch: &mut FrontierScratch,
) {
    scratch.discovered.clear();
    for item in work.iter() {
        for (dx, dy) in NEIGHBOURS_4 {
            let (x, y) = item.pos.offset(dx, dy);
            if grid.contains(x, y) && !grid.is_settled(x, y) {
                scratch.discovered.push(Position::new(x as u32, y as u32));
            }
        }
    }
    scratch.discovered.sort_unstable();
    scratch.discovered.dedup();

    work.clear();
    work.extend(scratch.discovered.iter().copied().map(WorkItem::new));
}

/// Round to nearest and clamp into the sample domain. The flag is `false` if clamping was needed.
pub fn quantize_sample(value: f64) -> (u16, bool) {
    let rounded = (value + 0.5).floor();
    let in_range = (0.0..=f64::from(SAMPLE_MAX)).contains(&rounded);
    (rounded.clamp(0.0, f64::from(SAMPLE_MAX)) as u16, in_range)
}

/// Chunk length for a parallel estimate, or `None` when the frontier is too small to split.
fn parallel_chunk_len(len: usize) -> Option<usize> {
    if len < 2 * ITEMS_PER_CHUNK {
        return None;
    }
    let chunks = (len / ITEMS_PER_CHUNK).max(MIN_CHUNKS);
    Some(len.div_ceil(chunks))
}

#[cfg(test)]
#[path = "../../tests/unit/fill/wavefront.rs"]
mod tests;
