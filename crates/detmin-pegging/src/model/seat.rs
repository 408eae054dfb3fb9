use core::fmt;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Seat {
    Dealer = 0,
    Pone = 1,
}

impl Seat {
    pub const LOOP: [Seat; 2] = [Seat::Dealer, Seat::Pone];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn other(self) -> Seat {
        match self {
            Seat::Dealer => Seat::Pone,
            Seat::Pone => Seat::Dealer,
        }
    }
}

impl fmt::Display for Seat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Seat::Dealer => f.write_str("Dealer"),
            Seat::Pone => f.write_str("Pone"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Seat;

    #[test]
    fn other_is_an_involution() {
        for seat in Seat::LOOP {
            assert_ne!(seat.other(), seat);
            assert_eq!(seat.other().other(), seat);
        }
    }
}
