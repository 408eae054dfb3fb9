//! Points pegged while cards are played onto the running count.

use crate::model::card::Card;

pub const FIFTEEN: u8 = 15;
pub const THIRTY_ONE: u8 = 31;

/// Points for the card that just went onto `sequence`, given the count after it.
pub fn points_for_play(sequence: &[Card], count: u8) -> u32 {
    let mut points = 0;
    if count == FIFTEEN || count == THIRTY_ONE {
        points += 2;
    }
    points += pair_points(sequence);
    points += run_points(sequence);
    points
}

fn pair_points(sequence: &[Card]) -> u32 {
    let Some(last) = sequence.last() else {
        return 0;
    };
    let matching = sequence
        .iter()
        .rev()
        .take_while(|card| card.rank == last.rank)
        .count();
    match matching {
        2 => 2,
        3 => 6,
        4 => 12,
        _ => 0,
    }
}

// Longest run of three or more formed by the trailing cards, in any order.
fn run_points(sequence: &[Card]) -> u32 {
    for len in (3..=sequence.len()).rev() {
        let mut ranks: Vec<u8> = sequence[sequence.len() - len..]
            .iter()
            .map(|card| card.rank)
            .collect();
        ranks.sort_unstable();
        if ranks.windows(2).all(|pair| pair[1] == pair[0] + 1) {
            return len as u32;
        }
    }
    0
}
