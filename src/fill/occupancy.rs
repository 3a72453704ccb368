use crate::foundation::core::Position;
use crate::raster::buffer::PixelBuffer;

/// Per-pixel flag: does this pixel's color data count as settled?
///
/// Starts as `alpha > 0` and only ever flips `false -> true`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OccupancyGrid {
    width: u32,
    height: u32,
    cells: Vec<bool>,
}

impl OccupancyGrid {
    /// Mark every pixel whose `alpha_channel` sample is non-zero.
    pub fn from_alpha(buffer: &PixelBuffer, alpha_channel: usize) -> Self {
        let cells = buffer.pixels().map(|px| px[alpha_channel] > 0).collect();
        Self {
            width: buffer.width(),
            height: buffer.height(),
            cells,
        }
    }

    /// Grid width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Grid height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Whether `(x, y)` lies inside the grid.
    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && x < i64::from(self.width) && y < i64::from(self.height)
    }

    /// Settled state at a possibly out-of-bounds coordinate. Outside the grid reads as unsettled.
    pub fn is_settled(&self, x: i64, y: i64) -> bool {
        if !self.contains(x, y) {
            return false;
        }
        self.cells[y as usize * self.width as usize + x as usize]
    }

    /// [`Self::is_settled`] for an in-bounds position.
    pub fn is_settled_at(&self, pos: Position) -> bool {
        self.is_settled(i64::from(pos.x), i64::from(pos.y))
    }

    /// Settle `pos`. Returns `false` if it was already settled.
    pub fn mark_settled(&mut self, pos: Position) -> bool {
        let idx = pos.y as usize * self.width as usize + pos.x as usize;
        !std::mem::replace(&mut self.cells[idx], true)
    }

    /// Pixels that currently hold a valid color.
    pub fn settled_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    /// Pixels still waiting for a color.
    pub fn unsettled_count(&self) -> usize {
        self.cells.len() - self.settled_count()
    }

    /// True if `pos` is unsettled and has a settled 4-neighbour.
    pub fn borders_settled(&self, pos: Position) -> bool {
        !self.is_settled_at(pos)
            && NEIGHBOURS_4.iter().any(|&(dx, dy)| {
                let (x, y) = pos.offset(dx, dy);
                self.is_settled(x, y)
            })
    }

    /// Unsettled positions in row-major order.
    pub fn unsettled(&self) -> impl Iterator<Item = Position> + '_ {
        let width = self.width as usize;
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, settled)| !**settled)
            .map(move |(i, _)| Position::new((i % width) as u32, (i / width) as u32))
    }
}

/// Right, left, down, up.
pub(crate) const NEIGHBOURS_4: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

#[cfg(test)]
#[path = "../../tests/unit/fill/occupancy.rs"]
mod tests;
