//! The game-state contract consumed by the search.
//!
//! The search never owns game rules. Everything it knows about a position comes through
//! [`GameState`]: who decides next, what they may do, what doing it produces, how to re-deal
//! hidden information, and how many points each side is up once the hand is scored.

use core::fmt::Debug;
use core::hash::Hash;
use rand::Rng;
use thiserror::Error;

/// A fully specified position of one hand.
///
/// Implementations must be value-like: [`apply_action`](GameState::apply_action) and
/// [`randomize`](GameState::randomize) return new states and never touch `self`.
pub trait GameState: Clone {
    type Actor: Copy + Eq + Hash + Debug;
    type Action: Copy + Eq + Hash + Debug;

    /// Player who decides next, or `None` when the position is waiting on a forced step
    /// (a deal, a count reset, end-of-hand scoring).
    fn player_to_move(&self) -> Option<Self::Actor>;

    /// Legal actions from this position. At a forced step this is the forced action itself.
    /// Empty only once the hand is over.
    fn actions(&self) -> Vec<Self::Action>;

    fn apply_action(&self, action: Self::Action) -> Result<Self, ApplyError>;

    /// Replaces every fact hidden from `observer` with a random assignment consistent with
    /// what `observer` knows.
    fn randomize<R: Rng + ?Sized>(&self, observer: Self::Actor, rng: &mut R) -> Self;

    fn hand_over(&self) -> bool;

    /// Signed point differential of the current hand from `actor`'s side.
    fn hand_point_diff(&self, actor: Self::Actor) -> i32;
}

/// Raised by a [`GameState`] asked to apply an action it does not allow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("action {action} is not legal in this position")]
pub struct ApplyError {
    pub action: String,
}

impl ApplyError {
    pub fn illegal(action: impl Debug) -> Self {
        Self {
            action: format!("{action:?}"),
        }
    }
}
