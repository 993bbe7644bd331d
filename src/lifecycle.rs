//! Shelf load/unload effects and delivery detection.
//!
//! Runs after movement has been applied. Rewards are credited through the
//! active [`RewardScheme`] into a per-agent vector owned by the caller.

use rand::Rng;
use tracing::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::entity::{Agent, AgentId, Placement, Shelf, ShelfId};
use crate::grid::GridState;
use crate::request_queue::RequestQueue;
use crate::reward::RewardScheme;
use crate::types::{Action, Position};

/// A completed delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Delivery {
    pub shelf: ShelfId,
    pub goal: Position,
    /// Carrier at the goal.
    pub agent: AgentId,
    /// Shelf that took the delivered shelf's slot in the request queue.
    pub replacement: ShelfId,
}

/// Applies `TOGGLE_LOAD` for every agent that requested it.
///
/// `grid` must reflect the post-movement positions. Returns the number of
/// successful pickups.
pub fn apply_toggles(
    agents: &mut [Agent],
    shelves: &mut [Shelf],
    grid: &GridState,
    queue: &RequestQueue,
    scheme: &dyn RewardScheme,
    rewards: &mut [f64],
) -> usize {
    let mut pickups = 0;
    for i in 0..agents.len() {
        if agents[i].requested_action != Some(Action::ToggleLoad) {
            continue;
        }
        if agents[i].is_carrying() {
            drop_shelf(&mut agents[i], shelves, grid, queue);
        } else if pick_up(&mut agents[i], shelves, grid, queue, scheme.stages_pickup()) {
            scheme.on_pickup(i, rewards);
            pickups += 1;
        }
    }
    pickups
}

/// Lifts the requested shelf under `agent`, if there is one.
fn pick_up(
    agent: &mut Agent,
    shelves: &mut [Shelf],
    grid: &GridState,
    queue: &RequestQueue,
    stage: bool,
) -> bool {
    let Some(shelf_id) = grid.shelf_at(agent.position) else {
        return false;
    };
    if !queue.contains(shelf_id) {
        return false;
    }
    shelves[shelf_id.index()].placement = Placement::Carried(agent.id);
    agent.carrying = Some(shelf_id);
    if stage {
        agent.has_delivered = true;
    }
    debug!(agent = agent.id.get(), shelf = shelf_id.get(), cell = %agent.position, "Shelf picked up");
    true
}

/// Sets an unrequested carried shelf down on a shelf slot.
fn drop_shelf(agent: &mut Agent, shelves: &mut [Shelf], grid: &GridState, queue: &RequestQueue) {
    agent.has_delivered = false;
    let Some(shelf_id) = agent.carrying else {
        return;
    };
    let pos = agent.position;
    if grid.is_highway(pos.x, pos.y) || queue.contains(shelf_id) {
        return;
    }
    shelves[shelf_id.index()].placement = Placement::Standing(pos);
    agent.carrying = None;
    debug!(agent = agent.id.get(), shelf = shelf_id.get(), cell = %pos, "Shelf dropped");
}

/// Scans the goal cells left to right and completes every delivery of a
/// requested shelf.
///
/// The carrier is detached, the shelf goes back to its home slot and a
/// replacement is drawn into the same queue slot. `grid` must reflect the
/// state after load/unload effects; it is not refreshed here.
#[allow(clippy::too_many_arguments)]
pub fn detect_deliveries<R: Rng + ?Sized>(
    agents: &mut [Agent],
    shelves: &mut [Shelf],
    grid: &GridState,
    goals: &[Position],
    queue: &mut RequestQueue,
    rng: &mut R,
    scheme: &dyn RewardScheme,
    rewards: &mut [f64],
) -> Vec<Delivery> {
    let shelf_count = shelves.len();
    let mut deliveries = Vec::new();

    for &goal in goals {
        let Some(shelf_id) = grid.shelf_at(goal) else {
            continue;
        };
        if !queue.contains(shelf_id) {
            continue;
        }
        let shelf = &mut shelves[shelf_id.index()];
        let carrier = match shelf.placement {
            Placement::Carried(carrier) => carrier,
            // Goals are highway cells, so a standing shelf can only be there
            // if it was placed by hand.
            Placement::Standing(_) => match grid.agent_at(goal) {
                Some(agent) => agent,
                None => continue,
            },
        };
        shelf.placement = Placement::Standing(shelf.home);

        let agent = &mut agents[carrier.index()];
        if agent.carrying == Some(shelf_id) {
            agent.carrying = None;
        }
        agent.has_delivered = true;

        let replacement = queue.replace(shelf_id, rng, shelf_count);
        scheme.on_delivery(carrier.index(), rewards);
        debug!(
            shelf = shelf_id.get(),
            goal = %goal,
            agent = carrier.get(),
            replacement = replacement.get(),
            "Shelf delivered"
        );
        deliveries.push(Delivery {
            shelf: shelf_id,
            goal,
            agent: carrier,
            replacement,
        });
    }
    deliveries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Layout;
    use crate::reward::{GlobalReward, IndividualReward, TwoStageReward};
    use crate::types::Direction;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    // 10 × 11 floor: shelf slots in columns {1, 2, 7, 8}, rows 1..=8.
    fn layout() -> Layout {
        Layout::new(10, 11)
    }

    fn shelves() -> Vec<Shelf> {
        layout()
            .shelf_cells()
            .enumerate()
            .map(|(i, p)| Shelf::new(ShelfId::new(i + 1), p))
            .collect()
    }

    fn toggling(id: usize, x: usize, y: usize) -> Agent {
        let mut a = Agent::new(AgentId::new(id), Position::new(x, y), Direction::Down, 0);
        a.requested_action = Some(Action::ToggleLoad);
        a
    }

    fn grid(agents: &[Agent], shelves: &[Shelf]) -> GridState {
        let mut g = GridState::new(layout());
        g.recompute(agents, shelves);
        g
    }

    #[test]
    fn pickup_of_requested_shelf() {
        let mut shelves = shelves();
        let mut agents = vec![toggling(1, 1, 1), toggling(2, 5, 5)];
        let under = shelves[0].id;
        let queue = RequestQueue::from_slots(vec![under]);
        let g = grid(&agents, &shelves);
        let mut rewards = vec![0.0; 2];

        let n = apply_toggles(&mut agents, &mut shelves, &g, &queue, &GlobalReward, &mut rewards);
        assert_eq!(n, 1);
        assert_eq!(agents[0].carrying, Some(under));
        assert_eq!(shelves[0].placement, Placement::Carried(AgentId::new(1)));
        assert_eq!(rewards, vec![1.0, 1.0]);
        assert!(!agents[0].has_delivered);
    }

    #[test]
    fn pickup_of_unrequested_shelf_is_rejected() {
        let mut shelves = shelves();
        let mut agents = vec![toggling(1, 1, 1)];
        let queue = RequestQueue::from_slots(vec![shelves[5].id]);
        let g = grid(&agents, &shelves);
        let mut rewards = vec![0.0];

        let n = apply_toggles(&mut agents, &mut shelves, &g, &queue, &GlobalReward, &mut rewards);
        assert_eq!(n, 0);
        assert!(!agents[0].is_carrying());
        assert!(!shelves[0].is_carried());
        assert_eq!(rewards, vec![0.0]);
    }

    #[test]
    fn two_stage_pickup_arms_flag() {
        let mut shelves = shelves();
        let mut agents = vec![toggling(1, 1, 1), toggling(2, 5, 5)];
        let queue = RequestQueue::from_slots(vec![shelves[0].id]);
        let g = grid(&agents, &shelves);
        let mut rewards = vec![0.0; 2];

        apply_toggles(&mut agents, &mut shelves, &g, &queue, &TwoStageReward, &mut rewards);
        assert!(agents[0].has_delivered);
        assert_eq!(rewards, vec![0.5, 0.0]);
    }

    #[test]
    fn drop_only_unrequested_shelf_off_highway() {
        let mut shelves = shelves();
        let carried = shelves[0].id;
        shelves[0].placement = Placement::Carried(AgentId::new(1));
        // Agent 2 holds the shelf whose slot is (1, 2), leaving that slot free.
        shelves[4].placement = Placement::Carried(AgentId::new(2));
        let mut agents = vec![toggling(1, 1, 2), toggling(2, 4, 4)];
        agents[0].carrying = Some(carried);
        agents[0].has_delivered = true;
        agents[1].carrying = Some(shelves[4].id);

        // Still requested: kept.
        let queue = RequestQueue::from_slots(vec![carried]);
        let g = grid(&agents, &shelves);
        let mut rewards = vec![0.0; 2];
        apply_toggles(&mut agents, &mut shelves, &g, &queue, &GlobalReward, &mut rewards);
        assert_eq!(agents[0].carrying, Some(carried));
        assert!(!agents[0].has_delivered);

        // No longer requested, on a shelf slot: released. Agent 2 sits on a
        // highway column and keeps its shelf, but its staging flag still clears.
        agents[1].has_delivered = true;
        let queue = RequestQueue::from_slots(vec![shelves[9].id]);
        let g = grid(&agents, &shelves);
        apply_toggles(&mut agents, &mut shelves, &g, &queue, &GlobalReward, &mut rewards);
        assert_eq!(agents[0].carrying, None);
        assert_eq!(shelves[0].placement, Placement::Standing(Position::new(1, 2)));
        assert_eq!(agents[1].carrying, Some(shelves[4].id));
        assert!(!agents[1].has_delivered);
        assert_eq!(rewards, vec![0.0, 0.0]);
    }

    #[test]
    fn delivery_returns_shelf_and_replenishes_queue() {
        let mut shelves = shelves();
        let delivered = shelves[3].id;
        let home = shelves[3].home;
        shelves[3].placement = Placement::Carried(AgentId::new(2));
        let mut agents = vec![
            Agent::new(AgentId::new(1), Position::new(0, 0), Direction::Up, 0),
            Agent::new(AgentId::new(2), Position::new(6, 10), Direction::Down, 0),
        ];
        agents[1].carrying = Some(delivered);

        let mut queue = RequestQueue::from_slots(vec![shelves[0].id, delivered]);
        let g = grid(&agents, &shelves);
        let mut rng = StdRng::seed_from_u64(11);
        let mut rewards = vec![0.0; 2];

        let out = detect_deliveries(
            &mut agents,
            &mut shelves,
            &g,
            &layout().goals(),
            &mut queue,
            &mut rng,
            &IndividualReward,
            &mut rewards,
        );

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].shelf, delivered);
        assert_eq!(out[0].goal, Position::new(6, 10));
        assert_eq!(out[0].agent, AgentId::new(2));
        assert_eq!(shelves[3].placement, Placement::Standing(home));
        assert_eq!(agents[1].carrying, None);
        assert!(agents[1].has_delivered);
        assert_eq!(rewards, vec![0.0, 2.0]);

        assert_eq!(queue.len(), 2);
        assert_eq!(queue.slots()[0], shelves[0].id);
        assert_eq!(queue.slots()[1], out[0].replacement);
        assert_ne!(out[0].replacement, delivered);
        assert_ne!(out[0].replacement, shelves[0].id);
    }

    #[test]
    fn unrequested_shelf_on_goal_is_ignored() {
        let mut shelves = shelves();
        shelves[3].placement = Placement::Carried(AgentId::new(1));
        let mut agents = vec![Agent::new(AgentId::new(1), Position::new(2, 10), Direction::Down, 0)];
        agents[0].carrying = Some(shelves[3].id);

        let mut queue = RequestQueue::from_slots(vec![shelves[0].id]);
        let g = grid(&agents, &shelves);
        let mut rng = StdRng::seed_from_u64(0);
        let mut rewards = vec![0.0];

        let out = detect_deliveries(
            &mut agents,
            &mut shelves,
            &g,
            &layout().goals(),
            &mut queue,
            &mut rng,
            &GlobalReward,
            &mut rewards,
        );
        assert!(out.is_empty());
        assert!(agents[0].is_carrying());
        assert_eq!(rewards, vec![0.0]);
    }
}
