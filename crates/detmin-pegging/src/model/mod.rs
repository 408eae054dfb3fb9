pub mod card;
pub mod deck;
pub mod hand;
pub mod seat;
pub mod suit;
