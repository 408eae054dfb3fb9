use crate::game::scoring::{THIRTY_ONE, points_for_play};
use crate::model::card::Card;
use crate::model::deck::Deck;
use crate::model::hand::Hand;
use crate::model::seat::Seat;
use core::fmt;
use detmin_core::{ApplyError, GameState};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::array;

pub const DEFAULT_HAND_SIZE: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PegAction {
    Play(Card),
    /// The seat to move has no card that fits under 31.
    Go,
    /// Forced: last-card point, then the count starts again from zero.
    Reset,
    /// Forced: last-card point for the final card of the hand.
    Show,
}

impl fmt::Display for PegAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PegAction::Play(card) => write!(f, "{card}"),
            PegAction::Go => f.write_str("go"),
            PegAction::Reset => f.write_str("reset"),
            PegAction::Show => f.write_str("show"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeggingPhase {
    Playing,
    ResetPending,
    ShowPending,
    Over,
}

/// One hand of two-player pegging.
#[derive(Debug, Clone)]
pub struct PeggingState {
    hands: [Hand; 2],
    sequence: Vec<Card>,
    played: Vec<(Seat, Card)>,
    count: u8,
    to_move: Seat,
    last_player: Option<Seat>,
    said_go: [bool; 2],
    // Largest room under 31 at which each seat has said go. Every card that seat
    // still holds is worth more than this; unlike `said_go` it outlives a reset.
    go_room: [u8; 2],
    points: [u32; 2],
    phase: PeggingPhase,
}

impl PeggingState {
    /// Deals `hand_size` cards to each seat, pone first. Pone leads.
    pub fn deal(deck: &Deck, hand_size: usize) -> Self {
        let mut hands: [Hand; 2] = array::from_fn(|_| Hand::new());
        for (index, card) in deck.cards().iter().take(hand_size * 2).enumerate() {
            let seat = if index % 2 == 0 { Seat::Pone } else { Seat::Dealer };
            hands[seat.index()].add(*card);
        }
        Self::from_hands(hands[Seat::Dealer.index()].clone(), hands[Seat::Pone.index()].clone())
    }

    pub fn from_hands(dealer: Hand, pone: Hand) -> Self {
        let mut state = Self {
            hands: [dealer, pone],
            sequence: Vec::new(),
            played: Vec::new(),
            count: 0,
            to_move: Seat::Pone,
            last_player: None,
            said_go: [false; 2],
            go_room: [0; 2],
            points: [0; 2],
            phase: PeggingPhase::Playing,
        };
        if state.hands.iter().all(Hand::is_empty) {
            state.phase = PeggingPhase::ShowPending;
        } else if state.hand(Seat::Pone).is_empty() {
            state.to_move = Seat::Dealer;
        }
        state
    }

    pub fn hand(&self, seat: Seat) -> &Hand {
        &self.hands[seat.index()]
    }

    pub fn count(&self) -> u8 {
        self.count
    }

    pub fn phase(&self) -> PeggingPhase {
        self.phase
    }

    pub fn points(&self, seat: Seat) -> u32 {
        self.points[seat.index()]
    }

    /// Every card played this hand, in order.
    pub fn played(&self) -> &[(Seat, Card)] {
        &self.played
    }

    pub fn sequence(&self) -> &[Card] {
        &self.sequence
    }

    fn can_play(&self, seat: Seat) -> bool {
        self.hand(seat).playable(self.count, THIRTY_ONE).next().is_some()
    }

    fn all_cards_played(&self) -> bool {
        self.hands.iter().all(Hand::is_empty)
    }

    // Decides who acts after `seat` has played or said go.
    fn pass_turn(&mut self, seat: Seat) {
        let other = seat.other();
        if self.all_cards_played() {
            self.phase = PeggingPhase::ShowPending;
        } else if self.count == THIRTY_ONE {
            self.phase = PeggingPhase::ResetPending;
        } else if !self.said_go[other.index()] && !self.hand(other).is_empty() {
            self.to_move = other;
        } else if self.can_play(seat) {
            self.to_move = seat;
        } else {
            self.phase = PeggingPhase::ResetPending;
        }
    }

    fn peg_last_card(&mut self) {
        if self.count != THIRTY_ONE {
            if let Some(seat) = self.last_player {
                self.points[seat.index()] += 1;
            }
        }
    }

    fn play(&mut self, seat: Seat, card: Card) {
        self.hands[seat.index()].remove(card);
        self.count += card.count_value();
        self.sequence.push(card);
        self.played.push((seat, card));
        self.last_player = Some(seat);
        self.points[seat.index()] += points_for_play(&self.sequence, self.count);
        self.pass_turn(seat);
    }

    fn go(&mut self, seat: Seat) {
        self.said_go[seat.index()] = true;
        let room = &mut self.go_room[seat.index()];
        *room = (*room).max(THIRTY_ONE - self.count);
        if self.can_play(seat.other()) {
            self.to_move = seat.other();
        } else {
            self.phase = PeggingPhase::ResetPending;
        }
    }

    fn reset(&mut self) {
        self.peg_last_card();
        self.count = 0;
        self.sequence.clear();
        self.said_go = [false; 2];
        let leader = self.last_player.map(Seat::other).unwrap_or(self.to_move);
        self.to_move = if self.hand(leader).is_empty() {
            leader.other()
        } else {
            leader
        };
        self.phase = PeggingPhase::Playing;
    }

    fn show(&mut self) {
        self.peg_last_card();
        self.phase = PeggingPhase::Over;
    }
}

impl GameState for PeggingState {
    type Actor = Seat;
    type Action = PegAction;

    fn player_to_move(&self) -> Option<Seat> {
        match self.phase {
            PeggingPhase::Playing => Some(self.to_move),
            _ => None,
        }
    }

    fn actions(&self) -> Vec<PegAction> {
        match self.phase {
            PeggingPhase::Playing => {
                let playable: Vec<PegAction> = self
                    .hand(self.to_move)
                    .playable(self.count, THIRTY_ONE)
                    .map(PegAction::Play)
                    .collect();
                if playable.is_empty() {
                    vec![PegAction::Go]
                } else {
                    playable
                }
            }
            PeggingPhase::ResetPending => vec![PegAction::Reset],
            PeggingPhase::ShowPending => vec![PegAction::Show],
            PeggingPhase::Over => Vec::new(),
        }
    }

    fn apply_action(&self, action: PegAction) -> Result<Self, ApplyError> {
        if !self.actions().contains(&action) {
            return Err(ApplyError::illegal(action));
        }
        let mut next = self.clone();
        match action {
            PegAction::Play(card) => next.play(self.to_move, card),
            PegAction::Go => next.go(self.to_move),
            PegAction::Reset => next.reset(),
            PegAction::Show => next.show(),
        }
        Ok(next)
    }

    /// Re-deals the opponent's unplayed cards from everything `observer` has not seen,
    /// leaving out cards the opponent's earlier go rules out.
    fn randomize<R: Rng + ?Sized>(&self, observer: Seat, rng: &mut R) -> Self {
        let hidden = observer.other();
        let room = self.go_room[hidden.index()];
        let mut unseen: Vec<Card> = Deck::standard()
            .cards()
            .iter()
            .copied()
            .filter(|card| !self.hand(observer).contains(*card))
            .filter(|card| !self.played.iter().any(|(_, played)| played == card))
            .filter(|card| card.count_value() > room)
            .collect();
        unseen.shuffle(rng);

        let mut next = self.clone();
        let size = self.hand(hidden).len();
        next.hands[hidden.index()] = Hand::with_cards(unseen.into_iter().take(size).collect());
        next
    }

    fn hand_over(&self) -> bool {
        self.phase == PeggingPhase::Over
    }

    fn hand_point_diff(&self, actor: Seat) -> i32 {
        self.points(actor) as i32 - self.points(actor.other()) as i32
    }
}
