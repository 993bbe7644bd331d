//! Static floor geometry: highways, shelf slots and delivery goals.
//!
//! ```text
//!     shelf columns
//!         vv
//!     ----------
//!     -XX-XX-XX-        ^
//!     -XX-XX-XX-   column height
//!     -XX-XX-XX-        v
//!     ----------
//!     -XX----XX-   <\
//!     -XX----XX-   <- shelf rows
//!     -XX----XX-   </
//!     ----------
//!     GGGGGGGGGG
//! ```
//!
//! `-` cells are highways, `X` cells hold shelves, `G` is the delivery row.
//! The two middle columns are kept free in the lower rows so robots can
//! queue next to the goals.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::types::Position;

/// Every third column is a vertical highway.
const VERTICAL_HIGHWAY_PERIOD: usize = 3;
/// Every ninth row is a horizontal highway.
const HORIZONTAL_HIGHWAY_PERIOD: usize = 9;
/// Queuing columns are cleared for rows `y > height - QUEUE_DEPTH`.
const QUEUE_DEPTH: usize = 11;

/// Floor geometry of a `width × height` warehouse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Layout {
    width: usize,
    height: usize,
}

impl Layout {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Total number of cells.
    pub fn cell_count(&self) -> usize {
        self.width * self.height
    }

    /// Checks if the coordinates lie on the grid.
    #[inline]
    pub fn contains(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height
    }

    /// Returns true for cells where shelves may never stand: vertical and
    /// horizontal highways, the delivery row and the two queuing columns
    /// above it.
    pub fn is_highway(&self, x: usize, y: usize) -> bool {
        let delivery_row = self.height - 1;
        let queuing = y + QUEUE_DEPTH > self.height
            && (x + 1 == self.width / 2 || x == self.width / 2);
        x % VERTICAL_HIGHWAY_PERIOD == 0
            || y % HORIZONTAL_HIGHWAY_PERIOD == 0
            || y == delivery_row
            || queuing
    }

    /// Delivery goals: every cell of the bottom row, left to right.
    pub fn goals(&self) -> Vec<Position> {
        (0..self.width)
            .map(|x| Position::new(x, self.height - 1))
            .collect()
    }

    /// Non-highway cells in row-major order; one shelf is created per cell.
    pub fn shelf_cells(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.height)
            .flat_map(move |y| (0..self.width).map(move |x| Position::new(x, y)))
            .filter(move |p| !self.is_highway(p.x, p.y))
    }

    /// Converts a row-major flat index into a position.
    pub fn position_of(&self, index: usize) -> Position {
        Position::new(index % self.width, index / self.width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 3 shelf columns, column height 8, 1 shelf row.
    fn small() -> Layout {
        Layout::new(10, 11)
    }

    #[test]
    fn vertical_highways_every_third_column() {
        let l = small();
        for y in 1..9 {
            assert!(l.is_highway(0, y));
            assert!(l.is_highway(3, y));
            assert!(l.is_highway(9, y));
            assert!(!l.is_highway(1, y));
            assert!(!l.is_highway(8, y));
        }
    }

    #[test]
    fn horizontal_highways_and_delivery_row() {
        let l = small();
        for x in 0..10 {
            assert!(l.is_highway(x, 0));
            assert!(l.is_highway(x, 9));
            assert!(l.is_highway(x, 10));
        }
    }

    #[test]
    fn queuing_columns_are_reserved() {
        let l = small();
        // width / 2 - 1 = 4 and width / 2 = 5
        for y in 1..9 {
            assert!(l.is_highway(4, y));
            assert!(l.is_highway(5, y));
        }
    }

    #[test]
    fn queuing_only_near_the_bottom() {
        let l = Layout::new(10, 29);
        // rows y > 29 - 11 = 18 are reserved, rows above are shelf slots
        assert!(!l.is_highway(4, 10));
        assert!(!l.is_highway(5, 17));
        assert!(l.is_highway(4, 19));
    }

    #[test]
    fn shelf_cells_count() {
        // columns {1, 2, 7, 8} × rows 1..=8
        assert_eq!(small().shelf_cells().count(), 32);
        assert!(small().shelf_cells().all(|p| !small().is_highway(p.x, p.y)));
    }

    #[test]
    fn goals_cover_bottom_row() {
        let goals = small().goals();
        assert_eq!(goals.len(), 10);
        assert!(goals.iter().all(|g| g.y == 10));
        assert_eq!(goals[0], Position::new(0, 10));
    }
}
