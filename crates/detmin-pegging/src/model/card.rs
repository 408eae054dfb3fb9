use crate::model::suit::Suit;
use core::fmt;
use serde::{Deserialize, Serialize};

pub const MIN_RANK: u8 = 1;
pub const MAX_RANK: u8 = 13;

/// A card; ranks run ace (1) to king (13).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Card {
    pub rank: u8,
    pub suit: Suit,
}

impl Card {
    pub const fn new(rank: u8, suit: Suit) -> Self {
        Self { rank, suit }
    }

    /// Value added to the running count: face cards count ten.
    pub const fn count_value(self) -> u8 {
        if self.rank > 10 { 10 } else { self.rank }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rank = match self.rank {
            1 => "A".to_string(),
            11 => "J".to_string(),
            12 => "Q".to_string(),
            13 => "K".to_string(),
            other => other.to_string(),
        };
        write!(f, "{}{}", rank, self.suit)
    }
}

#[cfg(test)]
mod tests {
    use super::{Card, Suit};

    #[test]
    fn face_cards_count_ten() {
        assert_eq!(Card::new(11, Suit::Hearts).count_value(), 10);
        assert_eq!(Card::new(13, Suit::Clubs).count_value(), 10);
        assert_eq!(Card::new(10, Suit::Spades).count_value(), 10);
        assert_eq!(Card::new(1, Suit::Diamonds).count_value(), 1);
    }

    #[test]
    fn display_uses_short_labels() {
        assert_eq!(Card::new(12, Suit::Spades).to_string(), "QS");
        assert_eq!(Card::new(7, Suit::Hearts).to_string(), "7H");
    }
}
