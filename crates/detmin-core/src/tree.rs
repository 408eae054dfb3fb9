//! Search trees over one determinized hand.
//!
//! Nodes live in an arena owned by [`SearchTree`] and refer to each other by [`NodeId`]. A
//! child is always pushed after its parent, so every child index is greater than its parent's;
//! the solver relies on that to back values up in a single reverse sweep.

use crate::config::RewardPerspective;
use crate::error::SearchError;
use crate::state::GameState;
use std::time::{Duration, Instant};

/// Deadline checks read the clock once per this many inserted nodes.
const DEADLINE_CHECK_INTERVAL: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Maximizer,
    Minimizer,
}

impl NodeKind {
    pub const fn flipped(self) -> Self {
        match self {
            NodeKind::Maximizer => NodeKind::Minimizer,
            NodeKind::Minimizer => NodeKind::Maximizer,
        }
    }

    /// Kind of a child whose player to move differs from this node's when `mover_changed`.
    pub const fn child_kind(self, mover_changed: bool) -> Self {
        if mover_changed { self.flipped() } else { self }
    }

    /// Whether `candidate` strictly beats `incumbent` at a node of this kind.
    pub const fn improves(self, candidate: i32, incumbent: i32) -> bool {
        match self {
            NodeKind::Maximizer => candidate > incumbent,
            NodeKind::Minimizer => candidate < incumbent,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);

    pub const fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
pub struct SearchNode<S: GameState> {
    state: S,
    action: Option<S::Action>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
    actor: S::Actor,
    depth: usize,
}

impl<S: GameState> SearchNode<S> {
    pub fn state(&self) -> &S {
        &self.state
    }

    /// Action that led here from the parent; `None` at the root.
    pub fn action(&self) -> Option<S::Action> {
        self.action
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn actor(&self) -> S::Actor {
        self.actor
    }

    /// Plies below the root. The root is at depth 0.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn reward(&self) -> i32 {
        self.state.hand_point_diff(self.actor)
    }
}

#[derive(Debug, Clone)]
pub struct SearchTree<S: GameState> {
    nodes: Vec<SearchNode<S>>,
}

impl<S: GameState> SearchTree<S> {
    pub fn root(&self) -> &SearchNode<S> {
        &self.nodes[NodeId::ROOT.index()]
    }

    pub fn node(&self, id: NodeId) -> &SearchNode<S> {
        &self.nodes[id.index()]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn ids(&self) -> impl DoubleEndedIterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(NodeId)
    }

    pub fn leaves(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.ids().filter(|id| self.node(*id).is_leaf())
    }

    pub fn max_depth(&self) -> usize {
        self.nodes.iter().map(|node| node.depth).max().unwrap_or(0)
    }

    /// The root's child on the path to `id`, found by climbing exactly `depth - 1` parents.
    pub fn ancestor_below_root(&self, id: NodeId) -> Option<NodeId> {
        let depth = self.node(id).depth;
        if depth == 0 {
            return None;
        }
        let mut current = id;
        for _ in 1..depth {
            current = self.node(current).parent?;
        }
        (self.node(current).parent == Some(NodeId::ROOT)).then_some(current)
    }

    /// First action taken from the root on the way to `id`.
    pub fn first_move(&self, id: NodeId) -> Option<S::Action> {
        self.ancestor_below_root(id)
            .and_then(|child| self.node(child).action)
    }

    fn push(&mut self, node: SearchNode<S>) -> NodeId {
        let id = NodeId(self.nodes.len());
        if let Some(parent) = node.parent {
            self.nodes[parent.index()].children.push(id);
        }
        self.nodes.push(node);
        id
    }
}

/// Limits applied while a tree grows.
#[derive(Debug, Clone, Copy)]
pub struct SearchBudget {
    started: Instant,
    deadline: Option<Instant>,
    max_nodes: Option<usize>,
}

impl SearchBudget {
    pub fn unlimited() -> Self {
        Self {
            started: Instant::now(),
            deadline: None,
            max_nodes: None,
        }
    }

    pub fn new(started: Instant, time_budget: Option<Duration>, max_nodes: Option<usize>) -> Self {
        Self {
            started,
            deadline: time_budget.map(|budget| started + budget),
            max_nodes,
        }
    }

    pub fn started(&self) -> Instant {
        self.started
    }

    /// Fails once a tree of `nodes` nodes is over the node limit or past the deadline.
    pub fn check(&self, nodes: usize) -> Result<(), SearchError> {
        if let Some(limit) = self.max_nodes {
            if nodes > limit {
                return Err(SearchError::NodeLimit { limit });
            }
        }
        if let Some(deadline) = self.deadline {
            if nodes % DEADLINE_CHECK_INTERVAL == 0 {
                let now = Instant::now();
                if now >= deadline {
                    return Err(SearchError::DeadlineElapsed {
                        elapsed_ms: now.duration_since(self.started).as_millis() as u64,
                    });
                }
            }
        }
        Ok(())
    }

    pub fn expired(&self) -> bool {
        self.deadline
            .map(|deadline| Instant::now() >= deadline)
            .unwrap_or(false)
    }
}

/// Expands a determinized position into the complete tree of the rest of the hand.
#[derive(Debug, Clone, Copy)]
pub struct TreeBuilder<'a> {
    perspective: RewardPerspective,
    budget: &'a SearchBudget,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(perspective: RewardPerspective, budget: &'a SearchBudget) -> Self {
        Self {
            perspective,
            budget,
        }
    }

    /// Builds the tree rooted at `root`. The root is a maximizer for the player to move there.
    pub fn build<S: GameState>(&self, root: S) -> Result<SearchTree<S>, SearchError> {
        if root.hand_over() {
            return Err(SearchError::HandOver);
        }
        let root_actor = root.player_to_move().ok_or(SearchError::NoPlayerToMove)?;

        let mut tree = SearchTree {
            nodes: vec![SearchNode {
                state: root,
                action: None,
                parent: None,
                children: Vec::new(),
                kind: NodeKind::Maximizer,
                actor: root_actor,
                depth: 0,
            }],
        };

        let mut pending = vec![NodeId::ROOT];
        while let Some(id) = pending.pop() {
            let open = self.expand(&mut tree, id, root_actor)?;
            pending.extend(open.into_iter().rev());
        }
        Ok(tree)
    }

    // Adds one child per legal action of `id` and returns the children still to be expanded.
    fn expand<S: GameState>(
        &self,
        tree: &mut SearchTree<S>,
        id: NodeId,
        root_actor: S::Actor,
    ) -> Result<Vec<NodeId>, SearchError> {
        let parent = tree.node(id);
        let actions = parent.state.actions();
        if actions.is_empty() {
            return Err(SearchError::NoLegalActions);
        }
        let parent_mover = parent.state.player_to_move();
        let parent_kind = parent.kind;
        let parent_actor = parent.actor;
        let depth = parent.depth + 1;

        let mut open = Vec::new();
        for action in actions {
            let (state, decided) = advance(&tree.node(id).state, action)?;
            let mover = state.player_to_move();
            let actor = match self.perspective {
                RewardPerspective::RootActor => root_actor,
                RewardPerspective::NodeActor => mover.unwrap_or(parent_actor),
            };
            let terminal = decided || state.hand_over();

            self.budget.check(tree.len() + 1)?;
            let child = tree.push(SearchNode {
                state,
                action: Some(action),
                parent: Some(id),
                children: Vec::new(),
                kind: parent_kind.child_kind(mover != parent_mover),
                actor,
                depth,
            });
            if !terminal {
                open.push(child);
            }
        }
        Ok(open)
    }
}

// Applies `action` and steps over the forced position that may follow it. The flag is set when
// the hand was already over on reaching that forced position.
fn advance<S: GameState>(state: &S, action: S::Action) -> Result<(S, bool), SearchError> {
    let next = state.apply_action(action)?;
    if next.player_to_move().is_some() {
        return Ok((next, false));
    }

    let decided = next.hand_over();
    match next.actions().first() {
        Some(&forced) => Ok((next.apply_action(forced)?, decided)),
        None if decided => Ok((next, true)),
        None => Err(SearchError::MissingForcedAction),
    }
}
