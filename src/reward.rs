//! Reward attribution policies.
//!
//! The policy is chosen once at construction from [`RewardType`] and only
//! consulted on the two rewarding events of a step: a successful pickup of a
//! requested shelf and a delivery onto a goal.

use std::fmt;

use crate::types::RewardType;

/// Reward for a completed delivery under GLOBAL and INDIVIDUAL attribution.
pub const DELIVERY_REWARD: f64 = 2.0;
/// Reward for picking up a requested shelf under GLOBAL and INDIVIDUAL attribution.
pub const PICKUP_REWARD: f64 = 1.0;
/// TWO_STAGE splits each event's reward in half for the acting agent.
pub const TWO_STAGE_FACTOR: f64 = 0.5;

/// Credits rewarding events to a per-agent reward vector.
pub trait RewardScheme: fmt::Debug + Send + Sync {
    /// Credits a successful pickup by the agent at `agent`.
    fn on_pickup(&self, agent: usize, rewards: &mut [f64]);

    /// Credits a delivery whose carrier is the agent at `agent`.
    fn on_delivery(&self, agent: usize, rewards: &mut [f64]);

    /// Whether a pickup arms the carrier's staging flag.
    fn stages_pickup(&self) -> bool {
        false
    }

    fn name(&self) -> &str;
}

/// Every agent receives every reward.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobalReward;

impl RewardScheme for GlobalReward {
    fn on_pickup(&self, _agent: usize, rewards: &mut [f64]) {
        rewards.iter_mut().for_each(|r| *r += PICKUP_REWARD);
    }

    fn on_delivery(&self, _agent: usize, rewards: &mut [f64]) {
        rewards.iter_mut().for_each(|r| *r += DELIVERY_REWARD);
    }

    fn name(&self) -> &str {
        "global"
    }
}

/// Only the acting agent is rewarded.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndividualReward;

impl RewardScheme for IndividualReward {
    fn on_pickup(&self, agent: usize, rewards: &mut [f64]) {
        rewards[agent] += PICKUP_REWARD;
    }

    fn on_delivery(&self, agent: usize, rewards: &mut [f64]) {
        rewards[agent] += DELIVERY_REWARD;
    }

    fn name(&self) -> &str {
        "individual"
    }
}

/// The acting agent receives half of each reward, at pickup and at delivery.
#[derive(Debug, Clone, Copy, Default)]
pub struct TwoStageReward;

impl RewardScheme for TwoStageReward {
    fn on_pickup(&self, agent: usize, rewards: &mut [f64]) {
        rewards[agent] += TWO_STAGE_FACTOR * PICKUP_REWARD;
    }

    fn on_delivery(&self, agent: usize, rewards: &mut [f64]) {
        rewards[agent] += TWO_STAGE_FACTOR * DELIVERY_REWARD;
    }

    fn stages_pickup(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "two_stage"
    }
}

impl RewardType {
    /// Builds the attribution policy for this reward type.
    pub fn scheme(self) -> Box<dyn RewardScheme> {
        match self {
            RewardType::Global => Box::new(GlobalReward),
            RewardType::Individual => Box::new(IndividualReward),
            RewardType::TwoStage => Box::new(TwoStageReward),
        }
    }
}
