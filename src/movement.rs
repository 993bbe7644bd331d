//! Simultaneous movement resolution.
//!
//! Every agent's requested transition becomes a directed edge
//! `current cell → target cell` in a per-step intent graph whose nodes are
//! grid cells. Each cell hosts at most one agent, so every node has at most
//! one outgoing edge and every weakly-connected component contains at most
//! one cycle. Components are resolved independently:
//!
//! | Component shape      | Committed agents                         |
//! |----------------------|------------------------------------------|
//! | cycle of length 2    | none (a head-on swap is impossible)      |
//! | cycle of length 1    | the stationary agent on the self-loop    |
//! | cycle of length ≥ 3  | every agent on the cycle (a rotation)    |
//! | acyclic              | the agents on the longest path           |
//!
//! Agents feeding into a cycle or hanging off the longest path are
//! cancelled. Positions are only mutated by [`apply_moves`], after every
//! commit/cancel decision has been made.

use std::collections::HashMap;

use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::unionfind::UnionFind;
use petgraph::visit::{Bfs, EdgeRef, Reversed};
use petgraph::Direction as EdgeDirection;
use tracing::trace;

use crate::entity::{Agent, AgentId};
use crate::grid::GridState;
use crate::types::{Action, Position};

/// Outcome of resolving one step's requested moves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Per agent (by index): whether its requested transition commits.
    pub committed: Vec<bool>,
    /// Agents whose forward move was cancelled and forced to `Noop`.
    pub cancelled: Vec<AgentId>,
}

/// Transient graph of requested transitions over grid cells.
///
/// Built and discarded every step. Nodes live in an arena keyed by cell;
/// edge weights name the agent requesting the transition.
#[derive(Debug, Default)]
pub struct IntentGraph {
    graph: DiGraph<Position, AgentId>,
    /// Maps cell → node index for the node arena.
    node_by_cell: HashMap<Position, NodeIndex>,
}

impl IntentGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn node(&mut self, cell: Position) -> NodeIndex {
        if let Some(&node) = self.node_by_cell.get(&cell) {
            return node;
        }
        let node = self.graph.add_node(cell);
        self.node_by_cell.insert(cell, node);
        node
    }

    /// Records `agent`'s intent to move from `from` to `to`.
    ///
    /// # Panics
    ///
    /// Panics if `from` already has an outgoing intent, i.e. two agents
    /// claim the same cell.
    pub fn add_intent(&mut self, agent: AgentId, from: Position, to: Position) {
        let a = self.node(from);
        let b = self.node(to);
        assert!(
            self.outgoing(a).is_none(),
            "cell {} already holds an agent with a pending move",
            from
        );
        self.graph.add_edge(a, b, agent);
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn intent_count(&self) -> usize {
        self.graph.edge_count()
    }

    fn outgoing(&self, node: NodeIndex) -> Option<(EdgeIndex, NodeIndex)> {
        self.graph
            .edges_directed(node, EdgeDirection::Outgoing)
            .next()
            .map(|e| (e.id(), e.target()))
    }

    /// Incoming edges in insertion order (petgraph lists them newest first).
    fn incoming(&self, node: NodeIndex) -> Vec<(EdgeIndex, NodeIndex)> {
        let mut edges: Vec<_> = self
            .graph
            .edges_directed(node, EdgeDirection::Incoming)
            .filter(|e| e.source() != node)
            .map(|e| (e.id(), e.source()))
            .collect();
        edges.sort_by_key(|&(edge, _)| edge.index());
        edges
    }

    /// Partitions the nodes into weakly-connected components.
    ///
    /// Components come out ordered by their lowest node index, and nodes
    /// within a component in index order.
    pub fn weak_components(&self) -> Vec<Vec<NodeIndex>> {
        let mut sets = UnionFind::new(self.graph.node_count());
        for edge in self.graph.edge_references() {
            sets.union(edge.source().index(), edge.target().index());
        }

        let mut slot_by_root: HashMap<usize, usize> = HashMap::new();
        let mut components: Vec<Vec<NodeIndex>> = Vec::new();
        for node in self.graph.node_indices() {
            let root = sets.find(node.index());
            let slot = *slot_by_root.entry(root).or_insert_with(|| {
                components.push(Vec::new());
                components.len() - 1
            });
            components[slot].push(node);
        }
        components
    }

    /// Follows outgoing edges from `start` until the walk ends at a sink or
    /// revisits a node. Returns the edges of the cycle, if one is reached.
    fn find_cycle(&self, start: NodeIndex) -> Option<Vec<EdgeIndex>> {
        let mut walk: Vec<(NodeIndex, EdgeIndex)> = Vec::new();
        let mut seen_at: HashMap<NodeIndex, usize> = HashMap::new();
        let mut node = start;

        while let Some((edge, next)) = self.outgoing(node) {
            seen_at.insert(node, walk.len());
            walk.push((node, edge));
            if let Some(&first) = seen_at.get(&next) {
                return Some(walk[first..].iter().map(|&(_, e)| e).collect());
            }
            node = next;
        }
        None
    }

    /// Longest path through an acyclic component, as the edges it uses.
    ///
    /// Every node has at most one successor, so the component is an in-tree
    /// rooted at its unique sink. The path ends at that sink and, walking
    /// backwards, always continues through the predecessor with the longest
    /// chain behind it, taking the earliest-added edge on ties.
    fn longest_path(&self, component: &[NodeIndex]) -> Vec<EdgeIndex> {
        let Some(&sink) = component
            .iter()
            .find(|&&n| self.outgoing(n).is_none())
        else {
            return Vec::new();
        };

        // Breadth-first from the sink against edge direction: predecessors
        // always appear after their successor.
        let reversed = Reversed(&self.graph);
        let mut bfs = Bfs::new(reversed, sink);
        let mut order = Vec::with_capacity(component.len());
        while let Some(node) = bfs.next(reversed) {
            order.push(node);
        }

        // Longest chain ending at each node.
        let mut depth: HashMap<NodeIndex, usize> = HashMap::new();
        for &node in order.iter().rev() {
            let d = self
                .incoming(node)
                .iter()
                .map(|(_, src)| depth[src] + 1)
                .max()
                .unwrap_or(0);
            depth.insert(node, d);
        }

        let mut path = Vec::new();
        let mut node = sink;
        loop {
            let preds = self.incoming(node);
            let Some(best) = preds.iter().map(|(_, src)| depth[src]).max() else {
                break;
            };
            let Some(&(edge, src)) = preds.iter().find(|(_, src)| depth[src] == best) else {
                break;
            };
            path.push(edge);
            node = src;
        }
        path.reverse();
        path
    }

    /// Agents whose transition commits, across all components.
    pub fn committed_agents(&self) -> Vec<AgentId> {
        let mut committed = Vec::new();
        for component in self.weak_components() {
            let edges = match self.find_cycle(component[0]) {
                Some(cycle) if cycle.len() == 2 => continue,
                Some(cycle) => cycle,
                None => self.longest_path(&component),
            };
            committed.extend(edges.into_iter().map(|e| self.graph[e]));
        }
        committed
    }
}

/// Decides which requested moves commit this step.
///
/// Carrying agents whose target holds a standing shelf are rewritten to
/// `Noop` up front. Every agent that does not commit is forced to `Noop`.
/// No position or heading is changed here.
///
/// # Panics
///
/// Panics if an agent without a `Forward` request ends up uncommitted,
/// which would mean the resolution logic is broken.
pub fn resolve_moves(agents: &mut [Agent], grid: &GridState) -> Resolution {
    let (width, height) = (grid.width(), grid.height());
    let mut intents = IntentGraph::new();

    for i in 0..agents.len() {
        let start = agents[i].position;
        let mut target = agents[i].requested_position(width, height);

        if agents[i].is_carrying() && start != target && blocks_carrier(agents, grid, target) {
            agents[i].requested_action = Some(Action::Noop);
            target = start;
        }
        intents.add_intent(agents[i].id, start, target);
    }

    let mut committed = vec![false; agents.len()];
    for id in intents.committed_agents() {
        committed[id.index()] = true;
    }

    let mut cancelled = Vec::new();
    for agent in agents.iter_mut().filter(|a| !committed[a.id.index()]) {
        assert_eq!(
            agent.requested_action,
            Some(Action::Forward),
            "{} was cancelled without requesting a forward move",
            agent.id
        );
        trace!(agent = agent.id.get(), cell = %agent.position, "Forward move cancelled");
        agent.requested_action = Some(Action::Noop);
        cancelled.push(agent.id);
    }

    Resolution {
        committed,
        cancelled,
    }
}

/// True when `target` holds a shelf that is not lifted by the agent standing there.
fn blocks_carrier(agents: &[Agent], grid: &GridState, target: Position) -> bool {
    if grid.shelf_at(target).is_none() {
        return false;
    }
    match grid.agent_at(target) {
        Some(occupant) => !agents[occupant.index()].is_carrying(),
        None => true,
    }
}

/// Applies the resolved actions in a single pass: committed forward moves
/// change position, rotations change heading.
///
/// Carried shelves have no stored position, so they follow their carrier
/// without being touched.
pub fn apply_moves(agents: &mut [Agent], width: usize, height: usize) {
    for agent in agents.iter_mut() {
        agent.prev_position = Some(agent.position);
        match agent.requested_action {
            Some(Action::Forward) => agent.position = agent.requested_position(width, height),
            Some(Action::Left) | Some(Action::Right) => {
                agent.direction = agent.requested_direction()
            }
            _ => {}
        }
    }
}
