use thiserror::Error;

/// Errors returned by the warehouse environment.
///
/// Configuration variants are produced by [`WarehouseConfig::validate`](crate::config::WarehouseConfig::validate)
/// and are fatal for construction. The remaining variants reject malformed
/// step input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WarehouseError {
    #[error("Only an odd number of shelf columns is supported, got {0}")]
    EvenShelfColumns(usize),

    #[error("Warehouse dimension `{0}` must be at least 1")]
    ZeroDimension(&'static str),

    #[error("At least one agent is required")]
    NoAgents,

    #[error("{agents} agents do not fit on a grid of {cells} cells")]
    TooManyAgents { agents: usize, cells: usize },

    #[error("Request queue size must be at least 1")]
    EmptyRequestQueue,

    #[error("Request queue size {queue} must be smaller than the shelf count {shelves}")]
    RequestQueueTooLarge { queue: usize, shelves: usize },

    #[error("Step cap `{0}` must be positive; use `None` to disable it")]
    ZeroStepCap(&'static str),

    #[error("Episode has not been started; call reset() first")]
    EpisodeNotStarted,

    #[error("Expected {expected} actions (one per agent), got {found}")]
    ActionCountMismatch { expected: usize, found: usize },

    #[error("Expected {expected} message bits, got {found}")]
    MessageLengthMismatch { expected: usize, found: usize },

    #[error("Unknown action index: {0}")]
    UnknownAction(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn even_columns_display() {
        let e = WarehouseError::EvenShelfColumns(4);
        assert_eq!(
            e.to_string(),
            "Only an odd number of shelf columns is supported, got 4"
        );
    }

    #[test]
    fn action_count_display() {
        let e = WarehouseError::ActionCountMismatch {
            expected: 3,
            found: 2,
        };
        assert_eq!(e.to_string(), "Expected 3 actions (one per agent), got 2");
    }

    #[test]
    fn queue_too_large_display() {
        let e = WarehouseError::RequestQueueTooLarge {
            queue: 10,
            shelves: 10,
        };
        assert!(e.to_string().contains("smaller than the shelf count 10"));
    }

    #[test]
    fn error_equality() {
        assert_eq!(WarehouseError::NoAgents, WarehouseError::NoAgents);
        assert_ne!(WarehouseError::NoAgents, WarehouseError::EmptyRequestQueue);
    }
}
