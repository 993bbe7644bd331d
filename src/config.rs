//! Configuration for the warehouse environment.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::WarehouseError;
use crate::grid::Layout;
use crate::types::{Action, Direction, RewardType};

/// Construction parameters of a warehouse environment.
///
/// Controls the floor layout, the agent population, sensing, the request
/// queue, episode caps and the reward policy.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WarehouseConfig {
    // --- Layout ---
    /// Number of shelf column blocks. Must be odd.
    pub shelf_columns: usize,
    /// Height of each shelf column block in cells.
    pub column_height: usize,
    /// Number of shelf row blocks stacked vertically.
    pub shelf_rows: usize,

    // --- Agents ---
    /// Number of robots.
    pub n_agents: usize,
    /// Width of each robot's broadcast message.
    pub msg_bits: usize,
    /// Radius `r` of the square `(2r+1)²` sensor window.
    pub sensor_range: usize,

    // --- Task ---
    /// Number of simultaneously requested shelves.
    pub request_queue_size: usize,

    // --- Episode caps (None = unbounded) ---
    /// Steps without a delivery after which the episode ends.
    pub max_inactivity_steps: Option<u32>,
    /// Total steps after which the episode ends.
    pub max_steps: Option<u32>,

    // --- Reward ---
    pub reward_type: RewardType,
}

impl WarehouseConfig {
    /// Number of self-state features: x, y, carrying, one_hot(4), on_highway.
    pub const SELF_FEATURE_DIM: usize = 4 + Direction::COUNT;

    /// Number of shelf features per sensor cell: has_shelf, requested.
    pub const SHELF_FEATURE_DIM: usize = 2;

    /// Grid size as `(height, width)`.
    pub fn grid_size(&self) -> (usize, usize) {
        (
            (self.column_height + 1) * self.shelf_rows + 2,
            (2 + 1) * self.shelf_columns + 1,
        )
    }

    /// Floor geometry derived from the layout parameters.
    pub fn layout(&self) -> Layout {
        let (height, width) = self.grid_size();
        Layout::new(width, height)
    }

    /// Number of shelves created at reset (one per non-highway cell).
    pub fn shelf_count(&self) -> usize {
        self.layout().shelf_cells().count()
    }

    /// Side length of the sensor window.
    pub fn sensor_side(&self) -> usize {
        2 * self.sensor_range + 1
    }

    /// Number of cells in the sensor window.
    pub fn sensor_cells(&self) -> usize {
        self.sensor_side() * self.sensor_side()
    }

    /// Number of agent features per sensor cell: has_agent, one_hot(4), message.
    pub fn agent_feature_dim(&self) -> usize {
        1 + Direction::COUNT + self.msg_bits
    }

    /// Observation dimension per agent.
    pub fn observation_dim(&self) -> usize {
        Self::SELF_FEATURE_DIM
            + self.sensor_cells() * (self.agent_feature_dim() + Self::SHELF_FEATURE_DIM)
    }

    /// Number of primitive actions.
    pub fn action_dim(&self) -> usize {
        Action::COUNT
    }

    /// Multi-discrete action shape: `[5]` without communication,
    /// `[5, 2, 2, ..]` with one binary entry per message bit.
    pub fn action_nvec(&self) -> Vec<usize> {
        let mut nvec = vec![Action::COUNT];
        nvec.extend(std::iter::repeat_n(2, self.msg_bits));
        nvec
    }

    /// Checks that the configuration describes a runnable warehouse.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint, see [`WarehouseError`].
    pub fn validate(&self) -> Result<(), WarehouseError> {
        if self.shelf_columns == 0 {
            return Err(WarehouseError::ZeroDimension("shelf_columns"));
        }
        if self.column_height == 0 {
            return Err(WarehouseError::ZeroDimension("column_height"));
        }
        if self.shelf_rows == 0 {
            return Err(WarehouseError::ZeroDimension("shelf_rows"));
        }
        if self.shelf_columns % 2 == 0 {
            return Err(WarehouseError::EvenShelfColumns(self.shelf_columns));
        }

        if self.n_agents == 0 {
            return Err(WarehouseError::NoAgents);
        }
        let (height, width) = self.grid_size();
        let cells = height * width;
        if self.n_agents > cells {
            return Err(WarehouseError::TooManyAgents {
                agents: self.n_agents,
                cells,
            });
        }

        if self.request_queue_size == 0 {
            return Err(WarehouseError::EmptyRequestQueue);
        }
        let shelves = self.shelf_count();
        if self.request_queue_size >= shelves {
            return Err(WarehouseError::RequestQueueTooLarge {
                queue: self.request_queue_size,
                shelves,
            });
        }

        if self.max_inactivity_steps == Some(0) {
            return Err(WarehouseError::ZeroStepCap("max_inactivity_steps"));
        }
        if self.max_steps == Some(0) {
            return Err(WarehouseError::ZeroStepCap("max_steps"));
        }
        Ok(())
    }
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            shelf_columns: 3,
            column_height: 8,
            shelf_rows: 1,
            n_agents: 2,
            msg_bits: 0,
            sensor_range: 1,
            request_queue_size: 2,
            max_inactivity_steps: None,
            max_steps: Some(500),
            reward_type: RewardType::Global,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = WarehouseConfig::default();
        assert_eq!(cfg.validate(), Ok(()));
        assert_eq!(cfg.action_dim(), 5);
        assert_eq!(cfg.action_nvec(), vec![5]);
    }

    #[test]
    fn grid_size_follows_layout_formula() {
        let cfg = WarehouseConfig {
            shelf_columns: 9,
            column_height: 8,
            shelf_rows: 3,
            ..WarehouseConfig::default()
        };
        assert_eq!(cfg.grid_size(), (29, 28));
    }

    #[test]
    fn observation_dim_matches() {
        let cfg = WarehouseConfig {
            msg_bits: 3,
            sensor_range: 1,
            ..WarehouseConfig::default()
        };
        // 8 self features + 9 cells × (1 + 4 + 3 agent + 2 shelf)
        assert_eq!(cfg.observation_dim(), 8 + 9 * 10);
    }

    #[test]
    fn message_bits_extend_action_shape() {
        let cfg = WarehouseConfig {
            msg_bits: 2,
            ..WarehouseConfig::default()
        };
        assert_eq!(cfg.action_nvec(), vec![5, 2, 2]);
    }

    #[test]
    fn even_shelf_columns_rejected() {
        let cfg = WarehouseConfig {
            shelf_columns: 2,
            ..WarehouseConfig::default()
        };
        assert_eq!(cfg.validate(), Err(WarehouseError::EvenShelfColumns(2)));
    }

    #[test]
    fn zero_dimensions_rejected() {
        let cfg = WarehouseConfig {
            column_height: 0,
            ..WarehouseConfig::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(WarehouseError::ZeroDimension("column_height"))
        );
    }

    #[test]
    fn queue_must_leave_a_replacement() {
        let base = WarehouseConfig::default();
        let shelves = base.shelf_count();
        let cfg = WarehouseConfig {
            request_queue_size: shelves,
            ..base
        };
        assert_eq!(
            cfg.validate(),
            Err(WarehouseError::RequestQueueTooLarge {
                queue: shelves,
                shelves
            })
        );
    }

    #[test]
    fn zero_caps_rejected() {
        let cfg = WarehouseConfig {
            max_steps: Some(0),
            ..WarehouseConfig::default()
        };
        assert_eq!(cfg.validate(), Err(WarehouseError::ZeroStepCap("max_steps")));
    }

    #[test]
    fn too_many_agents_rejected() {
        let cfg = WarehouseConfig::default();
        let (h, w) = cfg.grid_size();
        let cfg = WarehouseConfig {
            n_agents: h * w + 1,
            ..cfg
        };
        assert!(matches!(
            cfg.validate(),
            Err(WarehouseError::TooManyAgents { .. })
        ));
    }
}
