//! rware - multi-robot warehouse simulation
//!
//! A discrete-time grid environment in which robots fetch requested shelves,
//! deliver them to goal cells along the bottom row and return them home.
//! Simultaneously requested moves are resolved into a physically consistent
//! joint transition; rewards and fixed-layout observations are produced for
//! every step.

pub mod config;
pub mod entity;
pub mod environment;
pub mod error;
pub mod grid;
pub mod lifecycle;
pub mod movement;
pub mod observation;
pub mod policy;
pub mod request_queue;
pub mod reward;
pub mod types;

pub use config::WarehouseConfig;
pub use entity::{Agent, AgentId, Shelf, ShelfId};
pub use environment::{StepInfo, StepResult, Warehouse};
pub use error::WarehouseError;
pub use observation::{AgentObservation, ObservationBuilder};
pub use types::{Action, AgentAction, Direction, Position, RewardType};
