//! Core value types for the warehouse simulation.
//!
//! Defines grid positions, agent headings, primitive actions and the reward
//! policy selector used throughout the step engine.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::WarehouseError;

/// Agent heading on the grid.
///
/// The discriminant order (`Up, Down, Left, Right`) is the one-hot order used
/// by the observation encoder. Rotation follows a different, clockwise cycle:
/// `Up → Right → Down → Left → Up`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Number of headings.
    pub const COUNT: usize = 4;

    /// Clockwise rotation cycle.
    const CLOCKWISE: [Direction; 4] = [
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Left,
    ];

    /// Returns all headings in encoding order.
    pub fn all() -> [Direction; 4] {
        [
            Direction::Up,
            Direction::Down,
            Direction::Left,
            Direction::Right,
        ]
    }

    /// Returns the encoding index of this heading (0=Up, 1=Down, 2=Left, 3=Right).
    pub fn index(&self) -> usize {
        match self {
            Direction::Up => 0,
            Direction::Down => 1,
            Direction::Left => 2,
            Direction::Right => 3,
        }
    }

    /// One-hot encoding of this heading as a 4-element vector.
    pub fn one_hot(&self) -> [f32; 4] {
        let mut v = [0.0; 4];
        v[self.index()] = 1.0;
        v
    }

    /// Heading after a clockwise quarter turn.
    pub fn turned_right(&self) -> Direction {
        Self::CLOCKWISE[(self.clockwise_position() + 1) % 4]
    }

    /// Heading after a counter-clockwise quarter turn.
    pub fn turned_left(&self) -> Direction {
        Self::CLOCKWISE[(self.clockwise_position() + 3) % 4]
    }

    fn clockwise_position(&self) -> usize {
        match self {
            Direction::Up => 0,
            Direction::Right => 1,
            Direction::Down => 2,
            Direction::Left => 3,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => write!(f, "up"),
            Direction::Down => write!(f, "down"),
            Direction::Left => write!(f, "left"),
            Direction::Right => write!(f, "right"),
        }
    }
}

/// Primitive action an agent can request for one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Action {
    Noop,
    Forward,
    Left,
    Right,
    ToggleLoad,
}

impl Action {
    /// Number of primitive actions.
    pub const COUNT: usize = 5;

    /// All actions in discrete index order.
    pub const ALL: [Action; 5] = [
        Action::Noop,
        Action::Forward,
        Action::Left,
        Action::Right,
        Action::ToggleLoad,
    ];

    /// Returns the discrete index of this action.
    pub fn index(&self) -> usize {
        match self {
            Action::Noop => 0,
            Action::Forward => 1,
            Action::Left => 2,
            Action::Right => 3,
            Action::ToggleLoad => 4,
        }
    }
}

impl TryFrom<usize> for Action {
    type Error = WarehouseError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Action::Noop),
            1 => Ok(Action::Forward),
            2 => Ok(Action::Left),
            3 => Ok(Action::Right),
            4 => Ok(Action::ToggleLoad),
            other => Err(WarehouseError::UnknownAction(other)),
        }
    }
}

/// One agent's input for a step: a primitive action plus its message bits.
///
/// The message is empty when communication is disabled (`msg_bits == 0`).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AgentAction {
    pub action: Action,
    pub message: Vec<bool>,
}

impl AgentAction {
    /// Creates an action without message bits.
    pub fn new(action: Action) -> Self {
        Self {
            action,
            message: Vec::new(),
        }
    }

    /// Creates an action carrying a message payload.
    pub fn with_message(action: Action, message: Vec<bool>) -> Self {
        Self { action, message }
    }

    /// Decodes the composite `[primitive, bit_0, .., bit_{n-1}]` encoding.
    ///
    /// Any non-zero message entry is read as a set bit.
    ///
    /// # Errors
    ///
    /// - `UnknownAction` if the primitive index is out of range
    /// - `MessageLengthMismatch` if the slice does not hold exactly `msg_bits` bits
    pub fn from_multi_discrete(encoded: &[usize], msg_bits: usize) -> Result<Self, WarehouseError> {
        let (&primitive, bits) = encoded
            .split_first()
            .ok_or(WarehouseError::MessageLengthMismatch {
                expected: msg_bits,
                found: 0,
            })?;
        if bits.len() != msg_bits {
            return Err(WarehouseError::MessageLengthMismatch {
                expected: msg_bits,
                found: bits.len(),
            });
        }
        Ok(Self {
            action: Action::try_from(primitive)?,
            message: bits.iter().map(|&b| b != 0).collect(),
        })
    }
}

impl From<Action> for AgentAction {
    fn from(action: Action) -> Self {
        Self::new(action)
    }
}

/// Reward assignment policy, selected once per environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum RewardType {
    /// One scalar shared by every agent.
    #[default]
    Global,
    /// Each effect credited to the agent that caused it.
    Individual,
    /// Individual credit, split into a pickup half and a delivery half.
    TwoStage,
}

impl fmt::Display for RewardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RewardType::Global => write!(f, "global"),
            RewardType::Individual => write!(f, "individual"),
            RewardType::TwoStage => write!(f, "two_stage"),
        }
    }
}

/// A cell on the warehouse grid. `x` is the column, `y` the row (0 at the top).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    /// Creates a new position.
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Returns the neighbouring cell in `direction`, clamped to a
    /// `width × height` grid. A step off the edge returns `self`.
    pub fn step(&self, direction: Direction, width: usize, height: usize) -> Position {
        match direction {
            Direction::Up => Position::new(self.x, self.y.saturating_sub(1)),
            Direction::Down => Position::new(self.x, (self.y + 1).min(height - 1)),
            Direction::Left => Position::new(self.x.saturating_sub(1), self.y),
            Direction::Right => Position::new((self.x + 1).min(width - 1), self.y),
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}
