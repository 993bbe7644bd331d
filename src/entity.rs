//! Agent and shelf records, and the per-episode id allocator.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::types::{Action, Direction, Position};

/// 1-based agent identifier, stable for the episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AgentId(usize);

/// 1-based shelf identifier, stable for the episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ShelfId(usize);

macro_rules! entity_id {
    ($name:ident, $label:literal) => {
        impl $name {
            /// Wraps a raw 1-based id.
            ///
            /// # Panics
            ///
            /// Panics on 0, which the grid layers reserve for "empty".
            pub fn new(raw: usize) -> Self {
                assert!(raw > 0, concat!($label, " ids are 1-based"));
                Self(raw)
            }

            /// Raw 1-based id, as written into the grid layer.
            pub fn get(&self) -> usize {
                self.0
            }

            /// 0-based index into the owning entity list.
            pub fn index(&self) -> usize {
                self.0 - 1
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($label, "#{}"), self.0)
            }
        }
    };
}

entity_id!(AgentId, "agent");
entity_id!(ShelfId, "shelf");

/// Hands out consecutive 1-based ids.
///
/// Owned by the episode construction routine and rebuilt on every reset, so
/// ids always run `1..=n` in creation order.
#[derive(Debug, Clone)]
pub struct IdAllocator {
    next: usize,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Returns the next raw id.
    pub fn allocate(&mut self) -> usize {
        let id = self.next;
        self.next += 1;
        id
    }

    pub fn next_agent(&mut self) -> AgentId {
        AgentId::new(self.allocate())
    }

    pub fn next_shelf(&mut self) -> ShelfId {
        ShelfId::new(self.allocate())
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// State of a single robot.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Agent {
    pub id: AgentId,
    pub position: Position,
    /// Cell occupied before the latest step's movement (None after reset).
    pub prev_position: Option<Position>,
    pub direction: Direction,
    /// The shelf this agent carries. A carried shelf has no position of its own.
    pub carrying: Option<ShelfId>,
    /// Broadcast payload, opaque to the engine.
    pub message: Vec<bool>,
    /// Staging flag of the two-stage reward policy.
    pub has_delivered: bool,
    /// Action for the step being resolved; may be rewritten to `Noop` by
    /// conflict resolution.
    pub requested_action: Option<Action>,
}

impl Agent {
    /// Creates an agent at `position` facing `direction` with a zeroed message.
    pub fn new(id: AgentId, position: Position, direction: Direction, msg_bits: usize) -> Self {
        Self {
            id,
            position,
            prev_position: None,
            direction,
            carrying: None,
            message: vec![false; msg_bits],
            has_delivered: false,
            requested_action: None,
        }
    }

    pub fn is_carrying(&self) -> bool {
        self.carrying.is_some()
    }

    /// Cell this agent asks to occupy after the step.
    ///
    /// Only `Forward` leaves the current cell; a forward move into the grid
    /// boundary targets the current cell.
    pub fn requested_position(&self, width: usize, height: usize) -> Position {
        match self.requested_action {
            Some(Action::Forward) => self.position.step(self.direction, width, height),
            _ => self.position,
        }
    }

    /// Heading after the requested action.
    pub fn requested_direction(&self) -> Direction {
        match self.requested_action {
            Some(Action::Right) => self.direction.turned_right(),
            Some(Action::Left) => self.direction.turned_left(),
            _ => self.direction,
        }
    }
}

/// Where a shelf currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Placement {
    /// Standing on the floor.
    Standing(Position),
    /// Lifted by an agent; the position is the carrier's.
    Carried(AgentId),
}

/// A storage shelf.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Shelf {
    pub id: ShelfId,
    /// Non-highway slot the shelf was created at; delivered shelves return here.
    pub home: Position,
    pub placement: Placement,
}

impl Shelf {
    /// Creates a shelf standing at its home slot.
    pub fn new(id: ShelfId, home: Position) -> Self {
        Self {
            id,
            home,
            placement: Placement::Standing(home),
        }
    }

    pub fn is_carried(&self) -> bool {
        matches!(self.placement, Placement::Carried(_))
    }

    /// Floor position when standing.
    pub fn standing_position(&self) -> Option<Position> {
        match self.placement {
            Placement::Standing(pos) => Some(pos),
            Placement::Carried(_) => None,
        }
    }
}

/// Resolves a shelf's position, following the carry link when lifted.
pub fn shelf_position(shelf: &Shelf, agents: &[Agent]) -> Position {
    match shelf.placement {
        Placement::Standing(pos) => pos,
        Placement::Carried(carrier) => agents[carrier.index()].position,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocator_is_one_based_and_sequential() {
        let mut ids = IdAllocator::new();
        assert_eq!(ids.next_agent().get(), 1);
        assert_eq!(ids.next_agent().get(), 2);
        let mut shelves = IdAllocator::new();
        let s = shelves.next_shelf();
        assert_eq!(s.get(), 1);
        assert_eq!(s.index(), 0);
    }

    #[test]
    #[should_panic(expected = "1-based")]
    fn zero_id_panics() {
        let _ = AgentId::new(0);
    }

    #[test]
    fn requested_position_only_moves_on_forward() {
        let mut agent = Agent::new(AgentId::new(1), Position::new(2, 2), Direction::Up, 0);
        agent.requested_action = Some(Action::Left);
        assert_eq!(agent.requested_position(5, 5), Position::new(2, 2));
        assert_eq!(agent.requested_direction(), Direction::Left);

        agent.requested_action = Some(Action::Forward);
        assert_eq!(agent.requested_position(5, 5), Position::new(2, 1));
        assert_eq!(agent.requested_direction(), Direction::Up);
    }

    #[test]
    fn forward_into_boundary_stays() {
        let mut agent = Agent::new(AgentId::new(1), Position::new(0, 3), Direction::Left, 0);
        agent.requested_action = Some(Action::Forward);
        assert_eq!(agent.requested_position(5, 5), Position::new(0, 3));
    }

    #[test]
    fn carried_shelf_follows_carrier() {
        let mut agents = vec![Agent::new(
            AgentId::new(1),
            Position::new(1, 1),
            Direction::Down,
            0,
        )];
        let mut shelf = Shelf::new(ShelfId::new(1), Position::new(1, 1));
        shelf.placement = Placement::Carried(AgentId::new(1));
        agents[0].carrying = Some(shelf.id);
        agents[0].position = Position::new(1, 2);
        assert_eq!(shelf_position(&shelf, &agents), Position::new(1, 2));
        assert_eq!(shelf.standing_position(), None);
    }
}
