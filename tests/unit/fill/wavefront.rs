use super::*;
use crate::channel::layout::{ChannelRole, ColorComponent};

fn rgba_layout() -> ChannelLayout {
    ChannelLayout::derive(&[
        ChannelRole::Color(ColorComponent::Red),
        ChannelRole::Color(ColorComponent::Green),
        ChannelRole::Color(ColorComponent::Blue),
        ChannelRole::Alpha,
    ])
    .unwrap()
}

fn rgba(width: u32, height: u32, pixels: &[[u16; 4]]) -> PixelBuffer {
    PixelBuffer::new(width, height, 4, pixels.concat()).unwrap()
}

const T: [u16; 4] = [0, 0, 0, 0];

fn center_3x3() -> PixelBuffer {
    let mut px = [T; 9];
    px[4] = [100, 150, 200, 255];
    rgba(3, 3, &px)
}

fn propagate(
    buffer: &mut PixelBuffer,
    grid: &mut OccupancyGrid,
    max_rounds: Option<u32>,
) -> PropagateStats {
    let layout = rgba_layout();
    let kernel = SampleKernel::default();
    WavefrontEngine::new(&layout, &kernel, None)
        .run(buffer, grid, max_rounds, &mut FrontierScratch::default())
        .unwrap()
}

#[test]
fn one_round_settles_edge_neighbours_only() {
    let mut buf = center_3x3();
    let mut grid = OccupancyGrid::from_alpha(&buf, 3);
    let stats = propagate(&mut buf, &mut grid, Some(1));

    assert_eq!(stats.rounds, 1);
    assert_eq!(stats.settled, 4);
    assert_eq!(stats.outcome, PropagateOutcome::RoundBudgetExhausted);
    for (x, y) in [(1, 0), (0, 1), (2, 1), (1, 2)] {
        assert!(grid.is_settled(x, y));
        assert_eq!(buf.pixel(Position::new(x as u32, y as u32)), &[100, 150, 200, 0]);
    }
    for (x, y) in [(0, 0), (2, 0), (0, 2), (2, 2)] {
        assert!(!grid.is_settled(x, y));
        assert_eq!(buf.pixel(Position::new(x as u32, y as u32)), &T);
    }
}

#[test]
fn two_rounds_settle_corners_and_converge() {
    let mut buf = center_3x3();
    let mut grid = OccupancyGrid::from_alpha(&buf, 3);
    let stats = propagate(&mut buf, &mut grid, Some(2));

    assert_eq!(stats.rounds, 2);
    assert_eq!(stats.settled, 8);
    assert_eq!(stats.outcome, PropagateOutcome::Converged);
    for (i, px) in buf.pixels().enumerate() {
        let alpha = if i == 4 { 255 } else { 0 };
        assert_eq!(px, &[100, 150, 200, alpha]);
    }
}

#[test]
fn unbounded_run_stops_when_frontier_empties() {
    let mut buf = center_3x3();
    let mut grid = OccupancyGrid::from_alpha(&buf, 3);
    let stats = propagate(&mut buf, &mut grid, None);
    assert_eq!(stats.rounds, 2);
    assert_eq!(stats.outcome, PropagateOutcome::Converged);
    assert_eq!(grid.unsettled_count(), 0);
}

#[test]
fn fully_opaque_image_is_untouched() {
    let px = [[1, 2, 3, 4], [5, 6, 7, 8], [9, 10, 11, 12], [13, 14, 15, 16]];
    let mut buf = rgba(2, 2, &px);
    let before = buf.clone();
    let mut grid = OccupancyGrid::from_alpha(&buf, 3);
    let stats = propagate(&mut buf, &mut grid, None);
    assert_eq!(stats.rounds, 0);
    assert_eq!(stats.settled, 0);
    assert_eq!(stats.outcome, PropagateOutcome::Converged);
    assert_eq!(buf, before);
}

#[test]
fn fully_transparent_image_has_empty_frontier() {
    let mut buf = rgba(3, 2, &[[7, 7, 7, 0]; 6]);
    let before = buf.clone();
    let mut grid = OccupancyGrid::from_alpha(&buf, 3);
    assert!(WavefrontEngine::initial_frontier(&grid).is_empty());
    let stats = propagate(&mut buf, &mut grid, None);
    assert_eq!(stats.rounds, 0);
    assert_eq!(grid.settled_count(), 0);
    assert_eq!(buf, before);
}

#[test]
fn zero_round_budget_reports_exhaustion() {
    let mut buf = center_3x3();
    let before = buf.clone();
    let mut grid = OccupancyGrid::from_alpha(&buf, 3);
    let stats = propagate(&mut buf, &mut grid, Some(0));
    assert_eq!(stats.rounds, 0);
    assert_eq!(stats.outcome, PropagateOutcome::RoundBudgetExhausted);
    assert_eq!(buf, before);
}

#[test]
fn opaque_pixels_keep_their_samples() {
    // Partially transparent pixels count as settled and must not change either.
    let px = [[1000, 0, 0, 65535], T, [0, 0, 3000, 1], T, T];
    let mut buf = rgba(5, 1, &px);
    let mut grid = OccupancyGrid::from_alpha(&buf, 3);
    propagate(&mut buf, &mut grid, None);
    assert_eq!(buf.pixel(Position::new(0, 0)), &[1000, 0, 0, 65535]);
    assert_eq!(buf.pixel(Position::new(2, 0)), &[0, 0, 3000, 1]);
}

#[test]
fn single_settled_neighbour_is_copied_exactly() {
    let px = [[65535, 12345, 1, 9], T];
    let mut buf = rgba(2, 1, &px);
    let mut grid = OccupancyGrid::from_alpha(&buf, 3);
    propagate(&mut buf, &mut grid, Some(1));
    assert_eq!(buf.pixel(Position::new(1, 0)), &[65535, 12345, 1, 0]);
}

#[test]
fn equidistant_neighbours_average_and_round_half_up() {
    let px = [[100, 0, 40000, 255], T, [201, 0, 40001, 255]];
    let mut buf = rgba(3, 1, &px);
    let mut grid = OccupancyGrid::from_alpha(&buf, 3);
    propagate(&mut buf, &mut grid, None);
    assert_eq!(buf.pixel(Position::new(1, 0)), &[151, 0, 40001, 0]);
}

#[test]
fn farther_samples_weigh_less() {
    // x=2 sees the left pixel at distance 2 and the right one at distance 1.
    let px = [[0, 0, 0, 255], T, T, [3000, 0, 0, 255]];
    let mut buf = rgba(4, 1, &px);
    let mut grid = OccupancyGrid::from_alpha(&buf, 3);
    propagate(&mut buf, &mut grid, Some(1));
    // weights 0.5 and 1.0 -> 3000 * 1.0 / 1.5
    assert_eq!(buf.pixel(Position::new(2, 0))[0], 2000);
    assert_eq!(buf.pixel(Position::new(1, 0))[0], 1000);
}

#[test]
fn round_budget_bounds_graph_distance() {
    let mut px = vec![T; 7];
    px[0] = [500, 500, 500, 255];
    let mut buf = rgba(7, 1, &px);
    let mut grid = OccupancyGrid::from_alpha(&buf, 3);
    let stats = propagate(&mut buf, &mut grid, Some(3));
    assert_eq!(stats.settled, 3);
    for x in 0..7 {
        assert_eq!(grid.is_settled(x, 0), x <= 3, "x={x}");
    }
}

#[test]
fn split_runs_match_a_single_run() {
    let mut px = vec![T; 25];
    px[6] = [100, 0, 0, 255];
    px[18] = [0, 9000, 0, 255];
    let mut a = rgba(5, 5, &px);
    let mut b = a.clone();
    let mut grid_a = OccupancyGrid::from_alpha(&a, 3);
    let mut grid_b = grid_a.clone();

    propagate(&mut a, &mut grid_a, Some(1));
    let settled_after_one = grid_a.clone();
    propagate(&mut a, &mut grid_a, Some(1));
    propagate(&mut b, &mut grid_b, Some(2));

    assert_eq!(a, b);
    assert_eq!(grid_a, grid_b);
    // Nothing settled after one round is unsettled after two.
    for pos in grid_a.unsettled() {
        assert!(!settled_after_one.is_settled_at(pos));
    }
    assert!(grid_a.settled_count() > settled_after_one.settled_count());
}

#[test]
fn parallel_rounds_match_sequential_rounds() {
    let (w, h) = (300u32, 12u32);
    let mut px = vec![T; (w * h) as usize];
    for x in 0..w {
        px[x as usize] = [(x * 200) as u16, (x * 7) as u16, 60000 - (x * 100) as u16, 65535];
    }
    px[(6 * w + 150) as usize] = [1, 2, 3, 4];

    let layout = rgba_layout();
    let kernel = SampleKernel::default();
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(3)
        .build()
        .unwrap();

    let mut seq = rgba(w, h, &px);
    let mut seq_grid = OccupancyGrid::from_alpha(&seq, 3);
    let seq_stats = WavefrontEngine::new(&layout, &kernel, None)
        .run(&mut seq, &mut seq_grid, None, &mut FrontierScratch::default())
        .unwrap();

    let mut par = rgba(w, h, &px);
    let mut par_grid = OccupancyGrid::from_alpha(&par, 3);
    let par_stats = WavefrontEngine::new(&layout, &kernel, Some(&pool))
        .run(&mut par, &mut par_grid, None, &mut FrontierScratch::default())
        .unwrap();

    assert_eq!(seq_stats, par_stats);
    assert_eq!(seq, par);
    assert_eq!(par_grid.unsettled_count(), 0);
}

#[test]
fn estimate_without_settled_samples_is_an_internal_error() {
    let buf = rgba(6, 1, &[[0, 0, 0, 255], T, T, T, T, T]);
    let grid = OccupancyGrid::from_alpha(&buf, 3);
    let layout = rgba_layout();
    let kernel = SampleKernel::default();
    let engine = WavefrontEngine::new(&layout, &kernel, None);

    let mut item = WorkItem::new(Position::new(5, 0));
    let err = engine.estimate(&mut item, &buf, &grid).unwrap_err();
    assert!(matches!(err, AlphaFillError::ZeroTotalWeight { x: 5, y: 0 }));
    assert!(err.is_internal());
}

#[test]
fn committing_a_settled_pixel_is_an_internal_error() {
    let mut buf = rgba(2, 1, &[[0, 0, 0, 255], T]);
    let mut grid = OccupancyGrid::from_alpha(&buf, 3);
    let layout = rgba_layout();
    let kernel = SampleKernel::default();
    let engine = WavefrontEngine::new(&layout, &kernel, None);

    let work = [WorkItem::new(Position::new(0, 0))];
    let err = engine.commit(&work, &mut buf, &mut grid).unwrap_err();
    assert!(matches!(err, AlphaFillError::Invariant(_)));
}

#[test]
fn mismatched_grid_is_rejected() {
    let mut buf = center_3x3();
    let mut grid = OccupancyGrid::from_alpha(&rgba(2, 2, &[T; 4]), 3);
    let layout = rgba_layout();
    let kernel = SampleKernel::default();
    let err = WavefrontEngine::new(&layout, &kernel, None)
        .run(&mut buf, &mut grid, None, &mut FrontierScratch::default())
        .unwrap_err();
    assert!(matches!(err, AlphaFillError::Validation(_)));
}

#[test]
fn advance_frontier_deduplicates() {
    // Two settled pixels share the unsettled neighbour (1, 1).
    let buf = rgba(3, 2, &[T, [0, 0, 0, 1], T, [0, 0, 0, 1], T, T]);
    let mut grid = OccupancyGrid::from_alpha(&buf, 3);
    let mut work = vec![
        WorkItem::new(Position::new(1, 0)),
        WorkItem::new(Position::new(0, 1)),
    ];
    let mut scratch = FrontierScratch::default();
    scratch.discovered.push(Position::new(2, 1));

    grid.mark_settled(Position::new(0, 0));
    advance_frontier(&mut work, &grid, &mut scratch);

    let next: Vec<_> = work.iter().map(|w| w.pos).collect();
    assert_eq!(next, vec![Position::new(2, 0), Position::new(1, 1)]);
}

#[test]
fn quantize_rounds_and_flags_overflow() {
    assert_eq!(quantize_sample(12.5), (13, true));
    assert_eq!(quantize_sample(12.49), (12, true));
    assert_eq!(quantize_sample(65535.4), (65535, true));
    assert_eq!(quantize_sample(65535.6), (65535, false));
    assert_eq!(quantize_sample(-0.6), (0, false));
    assert_eq!(quantize_sample(-0.4), (0, true));
    assert_eq!(quantize_sample(f64::NAN), (0, false));
}

#[test]
fn parallel_split_thresholds() {
    assert_eq!(parallel_chunk_len(0), None);
    assert_eq!(parallel_chunk_len(199), None);
    assert_eq!(parallel_chunk_len(200), Some(25));
    assert_eq!(parallel_chunk_len(10_000), Some(100));
    assert_eq!(parallel_chunk_len(10_050), Some(101));
}
