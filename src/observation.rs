//! Observation encoding for the warehouse environment.
//!
//! Each agent sees its own state plus a square sensor window of side
//! `2r + 1` centred on its cell. The flat vector has the structure:
//!
//! ```text
//! [x, y, carrying, dir_one_hot(4), on_highway]
//!   ++ for each window cell, rows top to bottom, columns left to right:
//!      [has_agent, agent_dir_one_hot(4), message(msg_bits), has_shelf, requested]
//! ```
//!
//! Cells outside the grid read as empty.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::WarehouseConfig;
use crate::entity::{Agent, Shelf};
use crate::grid::GridState;
use crate::request_queue::RequestQueue;
use crate::types::{Direction, Position};

/// The observing agent's own features.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SelfObservation {
    pub location: Position,
    pub carrying_shelf: bool,
    pub direction: Direction,
    pub on_highway: bool,
}

/// Contents of one sensor window cell.
///
/// An empty cell reports `Direction::Up` and an all-zero message.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SensorReading {
    pub has_agent: bool,
    pub direction: Direction,
    pub local_message: Vec<bool>,
    pub has_shelf: bool,
    pub shelf_requested: bool,
}

impl SensorReading {
    fn empty(msg_bits: usize) -> Self {
        Self {
            has_agent: false,
            direction: Direction::Up,
            local_message: vec![false; msg_bits],
            has_shelf: false,
            shelf_requested: false,
        }
    }
}

/// Structured per-agent observation.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AgentObservation {
    pub self_state: SelfObservation,
    /// Window cells in raster order.
    pub sensors: Vec<SensorReading>,
}

impl AgentObservation {
    /// Flattens to the fixed-length numeric layout.
    pub fn to_vec(&self) -> Vec<f32> {
        let s = &self.self_state;
        let msg_bits = self.sensors.first().map_or(0, |r| r.local_message.len());
        let mut obs = Vec::with_capacity(
            WarehouseConfig::SELF_FEATURE_DIM
                + self.sensors.len()
                    * (1 + Direction::COUNT + msg_bits + WarehouseConfig::SHELF_FEATURE_DIM),
        );

        obs.push(s.location.x as f32);
        obs.push(s.location.y as f32);
        obs.push(flag(s.carrying_shelf));
        obs.extend(s.direction.one_hot());
        obs.push(flag(s.on_highway));

        for cell in &self.sensors {
            obs.push(flag(cell.has_agent));
            obs.extend(cell.direction.one_hot());
            obs.extend(cell.local_message.iter().map(|&b| flag(b)));
            obs.push(flag(cell.has_shelf));
            obs.push(flag(cell.shelf_requested));
        }
        obs
    }
}

#[inline]
fn flag(b: bool) -> f32 {
    if b {
        1.0
    } else {
        0.0
    }
}

/// Builds observations from the current grid layers and entity records.
pub struct ObservationBuilder;

impl ObservationBuilder {
    /// Builds the structured observation for one agent.
    ///
    /// # Arguments
    ///
    /// * `agent_idx` - Index of the observing agent
    /// * `agents` - All agents, indexed by id
    /// * `shelves` - All shelves, indexed by id
    /// * `grid` - Occupancy layers, recomputed for the current state
    /// * `queue` - Current request queue
    /// * `config` - Environment configuration (sensor range, message width)
    pub fn observe(
        agent_idx: usize,
        agents: &[Agent],
        shelves: &[Shelf],
        grid: &GridState,
        queue: &RequestQueue,
        config: &WarehouseConfig,
    ) -> AgentObservation {
        let agent = &agents[agent_idx];
        let pos = agent.position;
        let r = config.sensor_range;

        let self_state = SelfObservation {
            location: pos,
            carrying_shelf: agent.is_carrying(),
            direction: agent.direction,
            on_highway: grid.is_highway(pos.x, pos.y),
        };

        let mut sensors = Vec::with_capacity(config.sensor_cells());
        // Window coordinates are offset by `r` so they never go negative.
        for wy in pos.y..=pos.y + 2 * r {
            for wx in pos.x..=pos.x + 2 * r {
                let reading = match (wx.checked_sub(r), wy.checked_sub(r)) {
                    (Some(x), Some(y)) => Self::read_cell(
                        Position::new(x, y),
                        agents,
                        shelves,
                        grid,
                        queue,
                        config.msg_bits,
                    ),
                    _ => SensorReading::empty(config.msg_bits),
                };
                sensors.push(reading);
            }
        }

        AgentObservation {
            self_state,
            sensors,
        }
    }

    fn read_cell(
        cell: Position,
        agents: &[Agent],
        shelves: &[Shelf],
        grid: &GridState,
        queue: &RequestQueue,
        msg_bits: usize,
    ) -> SensorReading {
        let mut reading = SensorReading::empty(msg_bits);
        if let Some(id) = grid.agent_at(cell) {
            let other = &agents[id.index()];
            reading.has_agent = true;
            reading.direction = other.direction;
            reading.local_message = other.message.clone();
        }
        if let Some(id) = grid.shelf_at(cell) {
            reading.has_shelf = true;
            reading.shelf_requested = queue.contains(shelves[id.index()].id);
        }
        reading
    }

    /// Builds the flat observation vector for one agent.
    pub fn build(
        agent_idx: usize,
        agents: &[Agent],
        shelves: &[Shelf],
        grid: &GridState,
        queue: &RequestQueue,
        config: &WarehouseConfig,
    ) -> Vec<f32> {
        Self::observe(agent_idx, agents, shelves, grid, queue, config).to_vec()
    }

    /// Builds flat observations for all agents, in agent id order.
    pub fn build_all(
        agents: &[Agent],
        shelves: &[Shelf],
        grid: &GridState,
        queue: &RequestQueue,
        config: &WarehouseConfig,
    ) -> Vec<Vec<f32>> {
        (0..agents.len())
            .map(|i| Self::build(i, agents, shelves, grid, queue, config))
            .collect()
    }
}
