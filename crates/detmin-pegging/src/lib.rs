//! Two-player pegging, the play phase of a cribbage hand, as a [`detmin_core::GameState`].
//!
//! The opponent's cards are hidden, so the deciding seat only knows its own hand and the cards
//! already played. The count reset and the final last-card point are forced steps with no
//! player to move.

pub mod game;
pub mod model;

pub use game::pegging::{DEFAULT_HAND_SIZE, PegAction, PeggingPhase, PeggingState};
pub use model::seat::Seat;
