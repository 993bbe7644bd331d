//! Random policy for testing and baselines.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::trait_::Policy;
use crate::types::{Action, AgentAction};

/// Uniformly random action selection.
///
/// Each agent independently draws a primitive action and, when
/// communication is enabled, an independent fair bit per message slot.
#[derive(Debug, Clone)]
pub struct RandomPolicy {
    msg_bits: usize,
    rng: StdRng,
}

impl RandomPolicy {
    /// Creates a new random policy.
    ///
    /// # Arguments
    ///
    /// * `msg_bits` - Message width expected by the environment
    /// * `seed` - Seed for reproducible action streams
    pub fn new(msg_bits: usize, seed: u64) -> Self {
        Self {
            msg_bits,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn sample(&mut self) -> AgentAction {
        let action = Action::ALL[self.rng.gen_range(0..Action::COUNT)];
        let message = (0..self.msg_bits).map(|_| self.rng.gen_bool(0.5)).collect();
        AgentAction::with_message(action, message)
    }
}

impl Policy for RandomPolicy {
    fn select_actions(&mut self, observations: &[Vec<f32>]) -> Vec<AgentAction> {
        (0..observations.len()).map(|_| self.sample()).collect()
    }

    fn name(&self) -> &str {
        "random"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_action_per_observation() {
        let mut policy = RandomPolicy::new(0, 1);
        let obs = vec![vec![0.0; 10]; 4];
        let actions = policy.select_actions(&obs);
        assert_eq!(actions.len(), 4);
        assert!(actions.iter().all(|a| a.message.is_empty()));
        assert_eq!(policy.name(), "random");
    }

    #[test]
    fn messages_match_configured_width() {
        let mut policy = RandomPolicy::new(3, 1);
        let obs = vec![vec![0.0; 10]; 50];
        for a in policy.select_actions(&obs) {
            assert_eq!(a.message.len(), 3);
        }
    }

    #[test]
    fn same_seed_same_stream() {
        let obs = vec![vec![0.0; 10]; 20];
        let a = RandomPolicy::new(2, 9).select_actions(&obs);
        let b = RandomPolicy::new(2, 9).select_actions(&obs);
        assert_eq!(a, b);
    }

    #[test]
    fn every_action_is_drawn() {
        let mut policy = RandomPolicy::new(0, 5);
        let obs = vec![vec![0.0; 1]; 500];
        let actions = policy.select_actions(&obs);
        for i in 0..Action::COUNT {
            assert!(actions.iter().any(|a| a.action.index() == i));
        }
    }
}
