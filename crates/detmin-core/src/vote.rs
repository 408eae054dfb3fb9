use std::collections::HashMap;
use std::hash::Hash;

/// Distinct votes with their counts, in order of first appearance.
pub fn tally<A: Copy + Eq + Hash>(votes: &[A]) -> Vec<(A, usize)> {
    let mut slots: HashMap<A, usize> = HashMap::new();
    let mut counts: Vec<(A, usize)> = Vec::new();
    for &vote in votes {
        match slots.get(&vote) {
            Some(&slot) => counts[slot].1 += 1,
            None => {
                slots.insert(vote, counts.len());
                counts.push((vote, 1));
            }
        }
    }
    counts
}

/// Most frequent vote. On equal counts the vote that appeared first wins.
pub fn plurality<A: Copy + Eq + Hash>(votes: &[A]) -> Option<A> {
    winner(&tally(votes))
}

pub(crate) fn winner<A: Copy>(counts: &[(A, usize)]) -> Option<A> {
    counts
        .iter()
        .fold(None, |best: Option<(A, usize)>, &(vote, count)| match best {
            Some((_, top)) if top >= count => best,
            _ => Some((vote, count)),
        })
        .map(|(vote, _)| vote)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_plurality_wins() {
        assert_eq!(plurality(&[3, 5, 3, 7, 5, 3]), Some(3));
    }

    #[test]
    fn tally_keeps_first_appearance_order() {
        assert_eq!(tally(&[3, 5, 3, 7, 5, 3]), vec![(3, 3), (5, 2), (7, 1)]);
    }

    #[test]
    fn ties_go_to_earliest_vote() {
        assert_eq!(plurality(&[9, 4, 4, 9]), Some(9));
        assert_eq!(plurality(&[4, 9, 9, 4, 1]), Some(4));
    }

    #[test]
    fn empty_vote_has_no_winner() {
        assert_eq!(plurality::<u8>(&[]), None);
    }
}
