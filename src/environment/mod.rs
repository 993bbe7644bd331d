//! The warehouse step engine.
//!
//! One step runs, in order: action intake → movement resolution → grid
//! recompute → load/unload → delivery detection and queue replenishment →
//! counters and termination → observation encoding.

use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::WarehouseConfig;
use crate::entity::{shelf_position, Agent, AgentId, IdAllocator, Placement, Shelf, ShelfId};
use crate::error::WarehouseError;
use crate::grid::{GridState, Layout};
use crate::lifecycle::{self, Delivery};
use crate::movement;
use crate::observation::{AgentObservation, ObservationBuilder};
use crate::request_queue::RequestQueue;
use crate::reward::RewardScheme;
use crate::types::{AgentAction, Direction, Position};


/// Side information about a single step.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StepInfo {
    /// Step counter after this step.
    pub step: u64,
    /// Deliveries completed this step, in goal scan order.
    pub deliveries: Vec<Delivery>,
    /// Successful pickups of requested shelves.
    pub pickups: usize,
    /// Agents whose forward move was cancelled.
    pub cancelled: Vec<AgentId>,
}

/// Result of a single environment step.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StepResult {
    /// Per-agent observations after the step.
    pub observations: Vec<Vec<f32>>,
    /// Per-agent rewards. Under GLOBAL attribution every entry is equal.
    pub rewards: Vec<f64>,
    /// Per-agent done flags; all equal.
    pub dones: Vec<bool>,
    pub info: StepInfo,
}

impl StepResult {
    /// Whether the episode has ended.
    pub fn done(&self) -> bool {
        self.dones.iter().all(|&d| d)
    }
}

/// The multi-robot warehouse environment.
///
/// # Lifecycle
///
/// 1. Call [`Warehouse::new`] with a configuration and seed.
/// 2. Call [`Warehouse::reset`] to lay out a new episode.
/// 3. Call [`Warehouse::step`] with one action per agent until the step
///    result reports `done`.
#[derive(Debug)]
pub struct Warehouse {
    config: WarehouseConfig,
    layout: Layout,
    agents: Vec<Agent>,
    shelves: Vec<Shelf>,
    grid: GridState,
    queue: RequestQueue,
    goals: Vec<Position>,
    reward: Box<dyn RewardScheme>,
    rng: StdRng,
    /// Seed used by the next reset.
    seed: u64,
    steps: u64,
    inactive: u64,
    started: bool,
    /// Per-agent return accumulated over the current episode.
    episode_returns: Vec<f64>,
    total_deliveries: usize,
}

impl Warehouse {
    /// Creates an environment. No episode exists until [`reset`](Self::reset).
    ///
    /// # Arguments
    ///
    /// * `config` - Layout, population, sensing and reward parameters
    /// * `seed` - Random seed for reproducible episodes
    ///
    /// # Errors
    ///
    /// Returns the first configuration constraint violated, see
    /// [`WarehouseConfig::validate`].
    pub fn new(config: WarehouseConfig, seed: u64) -> Result<Self, WarehouseError> {
        config.validate()?;
        let layout = config.layout();
        Ok(Self {
            layout,
            agents: Vec::new(),
            shelves: Vec::new(),
            grid: GridState::new(layout),
            queue: RequestQueue::from_slots(Vec::new()),
            goals: layout.goals(),
            reward: config.reward_type.scheme(),
            rng: StdRng::seed_from_u64(seed),
            seed,
            steps: 0,
            inactive: 0,
            started: false,
            episode_returns: Vec::new(),
            total_deliveries: 0,
            config,
        })
    }

    /// Builds a running episode from hand-placed entities.
    ///
    /// `n_agents` in `config` is replaced by the number of agents given.
    #[cfg(test)]
    pub(crate) fn from_parts(
        mut config: WarehouseConfig,
        seed: u64,
        agents: Vec<Agent>,
        shelves: Vec<Shelf>,
        queue: RequestQueue,
    ) -> Result<Self, WarehouseError> {
        config.n_agents = agents.len();
        config.request_queue_size = queue.len();
        let mut env = Self::new(config, seed)?;
        assert_eq!(shelves.len(), env.config.shelf_count(), "one shelf per slot");
        env.episode_returns = vec![0.0; agents.len()];
        env.agents = agents;
        env.shelves = shelves;
        env.queue = queue;
        env.grid.recompute(&env.agents, &env.shelves);
        env.started = true;
        Ok(env)
    }

    /// Replaces the seed used by the next reset.
    pub fn reseed(&mut self, seed: u64) {
        self.seed = seed;
    }

    /// Starts a new episode and returns the initial observations.
    ///
    /// Reseeds the RNG from the stored seed, then advances the seed so the
    /// next episode differs. Agent cells are drawn first, then headings, then
    /// the request queue.
    pub fn reset(&mut self) -> Vec<Vec<f32>> {
        self.rng = StdRng::seed_from_u64(self.seed);
        self.seed = self.seed.wrapping_add(1);

        let mut ids = IdAllocator::new();
        self.shelves = self
            .layout
            .shelf_cells()
            .map(|home| Shelf::new(ids.next_shelf(), home))
            .collect();

        let n = self.config.n_agents;
        let cells = index::sample(&mut self.rng, self.layout.cell_count(), n);
        let directions: Vec<Direction> = (0..n)
            .map(|_| Direction::all()[self.rng.gen_range(0..Direction::COUNT)])
            .collect();
        let mut ids = IdAllocator::new();
        self.agents = cells
            .iter()
            .zip(directions)
            .map(|(cell, dir)| {
                Agent::new(
                    ids.next_agent(),
                    self.layout.position_of(cell),
                    dir,
                    self.config.msg_bits,
                )
            })
            .collect();

        self.queue = RequestQueue::sample(
            &mut self.rng,
            self.shelves.len(),
            self.config.request_queue_size,
        );

        self.grid.recompute(&self.agents, &self.shelves);
        self.steps = 0;
        self.inactive = 0;
        self.started = true;
        self.episode_returns = vec![0.0; n];
        self.total_deliveries = 0;

        info!(
            height = self.layout.height(),
            width = self.layout.width(),
            shelves = self.shelves.len(),
            agents = n,
            reward = %self.config.reward_type,
            "Warehouse reset"
        );
        self.observations()
    }

    /// Executes one environment step.
    ///
    /// # Arguments
    ///
    /// * `actions` - One action per agent, in agent id order. Each message
    ///   must hold exactly `msg_bits` bits.
    ///
    /// # Errors
    ///
    /// - `EpisodeNotStarted` before the first [`reset`](Self::reset)
    /// - `ActionCountMismatch` if `actions.len()` differs from the agent count
    /// - `MessageLengthMismatch` if any message has the wrong width
    ///
    /// The state is untouched when an error is returned.
    pub fn step(&mut self, actions: &[AgentAction]) -> Result<StepResult, WarehouseError> {
        if !self.started {
            return Err(WarehouseError::EpisodeNotStarted);
        }
        if actions.len() != self.agents.len() {
            return Err(WarehouseError::ActionCountMismatch {
                expected: self.agents.len(),
                found: actions.len(),
            });
        }
        if let Some(bad) = actions
            .iter()
            .find(|a| a.message.len() != self.config.msg_bits)
        {
            return Err(WarehouseError::MessageLengthMismatch {
                expected: self.config.msg_bits,
                found: bad.message.len(),
            });
        }

        for (agent, action) in self.agents.iter_mut().zip(actions) {
            agent.requested_action = Some(action.action);
            agent.message.clone_from(&action.message);
        }

        let resolution = movement::resolve_moves(&mut self.agents, &self.grid);
        movement::apply_moves(&mut self.agents, self.layout.width(), self.layout.height());
        self.grid.recompute(&self.agents, &self.shelves);

        let mut rewards = vec![0.0; self.agents.len()];
        let pickups = lifecycle::apply_toggles(
            &mut self.agents,
            &mut self.shelves,
            &self.grid,
            &self.queue,
            self.reward.as_ref(),
            &mut rewards,
        );
        self.grid.recompute(&self.agents, &self.shelves);

        let deliveries = lifecycle::detect_deliveries(
            &mut self.agents,
            &mut self.shelves,
            &self.grid,
            &self.goals,
            &mut self.queue,
            &mut self.rng,
            self.reward.as_ref(),
            &mut rewards,
        );
        if !deliveries.is_empty() {
            self.grid.recompute(&self.agents, &self.shelves);
        }

        if deliveries.is_empty() {
            self.inactive = self.inactive.saturating_add(1);
        } else {
            self.inactive = 0;
        }
        self.steps = self.steps.saturating_add(1);
        self.total_deliveries += deliveries.len();
        for (total, r) in self.episode_returns.iter_mut().zip(&rewards) {
            *total += r;
        }

        let done = self.is_done();
        if done {
            debug!(
                step = self.steps,
                inactive = self.inactive,
                deliveries = self.total_deliveries,
                "Episode finished"
            );
        }

        Ok(StepResult {
            observations: self.observations(),
            rewards,
            dones: vec![done; self.agents.len()],
            info: StepInfo {
                step: self.steps,
                deliveries,
                pickups,
                cancelled: resolution.cancelled,
            },
        })
    }

    fn is_done(&self) -> bool {
        let idle = self
            .config
            .max_inactivity_steps
            .is_some_and(|cap| self.inactive >= u64::from(cap));
        let expired = self.config.max_steps.is_some_and(|cap| self.steps >= u64::from(cap));
        idle || expired
    }

    /// Flat observations of the current state, one per agent.
    pub fn observations(&self) -> Vec<Vec<f32>> {
        ObservationBuilder::build_all(
            &self.agents,
            &self.shelves,
            &self.grid,
            &self.queue,
            &self.config,
        )
    }

    /// Structured observation of the current state for one agent.
    pub fn observe(&self, agent: AgentId) -> AgentObservation {
        ObservationBuilder::observe(
            agent.index(),
            &self.agents,
            &self.shelves,
            &self.grid,
            &self.queue,
            &self.config,
        )
    }

    pub fn config(&self) -> &WarehouseConfig {
        &self.config
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn shelves(&self) -> &[Shelf] {
        &self.shelves
    }

    pub fn grid(&self) -> &GridState {
        &self.grid
    }

    pub fn request_queue(&self) -> &RequestQueue {
        &self.queue
    }

    /// Delivery cells, left to right along the bottom row.
    pub fn goals(&self) -> &[Position] {
        &self.goals
    }

    pub fn n_agents(&self) -> usize {
        self.agents.len()
    }

    /// Current cell of a shelf; a carried shelf is where its carrier is.
    pub fn shelf_position(&self, shelf: ShelfId) -> Position {
        shelf_position(&self.shelves[shelf.index()], &self.agents)
    }

    /// Agent carrying `shelf`, if lifted.
    pub fn carrier_of(&self, shelf: ShelfId) -> Option<AgentId> {
        match self.shelves[shelf.index()].placement {
            Placement::Carried(agent) => Some(agent),
            Placement::Standing(_) => None,
        }
    }

    pub fn is_highway(&self, x: usize, y: usize) -> bool {
        self.layout.is_highway(x, y)
    }

    /// Steps taken in the current episode.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Consecutive steps without a delivery.
    pub fn inactive_steps(&self) -> u64 {
        self.inactive
    }

    /// Per-agent return accumulated over the current episode.
    pub fn episode_returns(&self) -> &[f64] {
        &self.episode_returns
    }

    /// Deliveries completed in the current episode.
    pub fn total_deliveries(&self) -> usize {
        self.total_deliveries
    }
}
