//! Action selection interface.

use crate::types::AgentAction;

/// Chooses the joint action of all robots from their current observations.
pub trait Policy: Send + Sync {
    /// Returns one [`AgentAction`] per observation, in the same order.
    ///
    /// # Arguments
    ///
    /// * `observations` - Flat vectors from [`ObservationBuilder`](crate::observation::ObservationBuilder)
    fn select_actions(&mut self, observations: &[Vec<f32>]) -> Vec<AgentAction>;

    /// Human-readable policy name.
    fn name(&self) -> &str;
}
