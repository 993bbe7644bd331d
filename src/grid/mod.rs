//! Two-layer occupancy grid.
//!
//! Each layer stores `0` for an empty cell or the 1-based id of the entity
//! occupying it, in row-major order. The layers are rebuilt wholesale from
//! the entity records by [`GridState::recompute`]; they are never patched
//! cell by cell.

pub mod layout;

pub use layout::Layout;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::entity::{shelf_position, Agent, AgentId, Placement, Shelf, ShelfId};
use crate::types::Position;

/// Occupancy layers for agents and shelves.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GridState {
    layout: Layout,
    agents: Vec<usize>,
    shelves: Vec<usize>,
}

impl GridState {
    /// Creates empty layers for `layout`.
    pub fn new(layout: Layout) -> Self {
        let cells = layout.cell_count();
        Self {
            layout,
            agents: vec![0; cells],
            shelves: vec![0; cells],
        }
    }

    #[inline]
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.layout.width()
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.layout.height()
    }

    /// Converts a position to a flat index, `None` when out of bounds.
    #[inline]
    fn index_of(&self, pos: Position) -> Option<usize> {
        self.layout
            .contains(pos.x, pos.y)
            .then(|| pos.y * self.layout.width() + pos.x)
    }

    /// Rebuilds both layers from the entity records in O(entities).
    ///
    /// Standing shelves are written first, then carried shelves at their
    /// carrier's cell, so a cell shared by a standing and a carried shelf
    /// shows the carried one.
    pub fn recompute(&mut self, agents: &[Agent], shelves: &[Shelf]) {
        self.agents.fill(0);
        self.shelves.fill(0);

        for shelf in shelves.iter().filter(|s| !s.is_carried()) {
            self.write_shelf(shelf, agents);
        }
        for shelf in shelves.iter().filter(|s| s.is_carried()) {
            self.write_shelf(shelf, agents);
        }
        for agent in agents {
            let idx = self
                .index_of(agent.position)
                .unwrap_or_else(|| panic!("{} is off the grid at {}", agent.id, agent.position));
            debug_assert_eq!(self.agents[idx], 0, "two agents share {}", agent.position);
            self.agents[idx] = agent.id.get();
        }
    }

    fn write_shelf(&mut self, shelf: &Shelf, agents: &[Agent]) {
        let pos = shelf_position(shelf, agents);
        let idx = self
            .index_of(pos)
            .unwrap_or_else(|| panic!("{} is off the grid at {}", shelf.id, pos));
        if let Placement::Standing(_) = shelf.placement {
            debug_assert_eq!(self.shelves[idx], 0, "two standing shelves share {}", pos);
        }
        self.shelves[idx] = shelf.id.get();
    }

    /// Agent occupying `pos`, if any. Out-of-bounds cells are empty.
    pub fn agent_at(&self, pos: Position) -> Option<AgentId> {
        self.index_of(pos)
            .map(|i| self.agents[i])
            .filter(|&id| id != 0)
            .map(AgentId::new)
    }

    /// Shelf occupying `pos`, if any. Out-of-bounds cells are empty.
    pub fn shelf_at(&self, pos: Position) -> Option<ShelfId> {
        self.index_of(pos)
            .map(|i| self.shelves[i])
            .filter(|&id| id != 0)
            .map(ShelfId::new)
    }

    /// Raw agent layer in row-major order.
    pub fn agent_layer(&self) -> &[usize] {
        &self.agents
    }

    /// Raw shelf layer in row-major order.
    pub fn shelf_layer(&self) -> &[usize] {
        &self.shelves
    }

    /// Shorthand for [`Layout::is_highway`].
    pub fn is_highway(&self, x: usize, y: usize) -> bool {
        self.layout.is_highway(x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Direction;

    fn agent(id: usize, x: usize, y: usize) -> Agent {
        Agent::new(AgentId::new(id), Position::new(x, y), Direction::Up, 0)
    }

    #[test]
    fn recompute_writes_both_layers() {
        let mut grid = GridState::new(Layout::new(4, 3));
        let agents = vec![agent(1, 0, 0), agent(2, 3, 2)];
        let shelves = vec![Shelf::new(ShelfId::new(1), Position::new(1, 1))];
        grid.recompute(&agents, &shelves);

        assert_eq!(grid.agent_at(Position::new(0, 0)), Some(AgentId::new(1)));
        assert_eq!(grid.agent_at(Position::new(3, 2)), Some(AgentId::new(2)));
        assert_eq!(grid.agent_at(Position::new(1, 1)), None);
        assert_eq!(grid.shelf_at(Position::new(1, 1)), Some(ShelfId::new(1)));
        assert_eq!(grid.agent_layer().iter().filter(|&&c| c != 0).count(), 2);
    }

    #[test]
    fn recompute_clears_stale_cells() {
        let mut grid = GridState::new(Layout::new(4, 3));
        let mut agents = vec![agent(1, 0, 0)];
        grid.recompute(&agents, &[]);
        agents[0].position = Position::new(1, 0);
        grid.recompute(&agents, &[]);
        assert_eq!(grid.agent_at(Position::new(0, 0)), None);
        assert_eq!(grid.agent_at(Position::new(1, 0)), Some(AgentId::new(1)));
    }

    #[test]
    fn carried_shelf_is_written_at_carrier() {
        let mut grid = GridState::new(Layout::new(4, 3));
        let mut agents = vec![agent(1, 2, 2)];
        let mut shelf = Shelf::new(ShelfId::new(1), Position::new(1, 1));
        shelf.placement = Placement::Carried(AgentId::new(1));
        agents[0].carrying = Some(shelf.id);
        grid.recompute(&agents, &[shelf]);
        assert_eq!(grid.shelf_at(Position::new(1, 1)), None);
        assert_eq!(grid.shelf_at(Position::new(2, 2)), Some(ShelfId::new(1)));
    }

    #[test]
    fn out_of_bounds_reads_as_empty() {
        let grid = GridState::new(Layout::new(4, 3));
        assert_eq!(grid.agent_at(Position::new(4, 0)), None);
        assert_eq!(grid.shelf_at(Position::new(0, 3)), None);
    }
}
