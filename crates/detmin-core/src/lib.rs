//! Determinized minimax move selection for hidden-information card games.
//!
//! For each decision the [`EnsemblePlayer`] re-deals everything the deciding player cannot see,
//! builds the complete tree of the rest of the hand for that deal, solves it exactly and keeps
//! the first move of the optimal line. The move recommended most often across all deals is
//! played. A recommendation that is illegal in the real position is replaced by the position's
//! first legal action before it is counted.
//!
//! Game rules stay outside this crate; they arrive through the [`GameState`] trait.

pub mod config;
pub mod ensemble;
pub mod error;
pub mod minimax;
pub mod state;
pub mod tree;
pub mod vote;

pub use config::{EnsembleConfig, RewardPerspective};
pub use ensemble::{EnsemblePlayer, LifetimeStats, SelectionOutcome};
pub use error::{ConfigError, SearchError};
pub use minimax::Solution;
pub use state::{ApplyError, GameState};
pub use tree::{NodeId, NodeKind, SearchBudget, SearchNode, SearchTree, TreeBuilder};
