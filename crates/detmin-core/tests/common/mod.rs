#![allow(dead_code)]

// Table-driven state double: every position is a row, every action an edge to another row.

use detmin_core::{ApplyError, GameState};
use rand::Rng;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Clone)]
pub struct Position {
    pub mover: Option<u8>,
    pub moves: Vec<(u32, usize)>,
    pub over: bool,
    /// Point differential for player 0; player 1 sees the negation.
    pub diff: i32,
}

#[derive(Debug, Default)]
pub struct Calls {
    pub applied: AtomicUsize,
    pub randomized: AtomicUsize,
}

impl Calls {
    pub fn applied(&self) -> usize {
        self.applied.load(Ordering::SeqCst)
    }

    pub fn randomized(&self) -> usize {
        self.randomized.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Default)]
pub struct Script {
    positions: Vec<Position>,
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn decision(&mut self, mover: u8) -> usize {
        self.add(Some(mover), false, 0)
    }

    /// A position with nobody to move; `over` marks the hand as already decided.
    pub fn forced(&mut self, over: bool) -> usize {
        self.add(None, over, 0)
    }

    pub fn terminal(&mut self, diff: i32) -> usize {
        self.add(None, true, diff)
    }

    /// A finished hand where some player is nominally to move (e.g. the next dealer).
    pub fn terminal_with_mover(&mut self, mover: u8, diff: i32) -> usize {
        self.add(Some(mover), true, diff)
    }

    pub fn link(&mut self, from: usize, action: u32, to: usize) -> &mut Self {
        self.positions[from].moves.push((action, to));
        self
    }

    pub fn finish(self) -> Arc<Vec<Position>> {
        Arc::new(self.positions)
    }

    fn add(&mut self, mover: Option<u8>, over: bool, diff: i32) -> usize {
        self.positions.push(Position {
            mover,
            moves: Vec::new(),
            over,
            diff,
        });
        self.positions.len() - 1
    }
}

#[derive(Debug, Clone)]
pub struct Scripted {
    book: Arc<Vec<Position>>,
    at: usize,
    worlds: Arc<Vec<Arc<Vec<Position>>>>,
    calls: Arc<Calls>,
}

impl Scripted {
    /// A fully visible game: every determinization is the game itself.
    pub fn open(book: Arc<Vec<Position>>) -> Self {
        let worlds = Arc::new(vec![Arc::clone(&book)]);
        Self::with_worlds(book, worlds)
    }

    /// True position `book`; determinizations start at the root of one of `worlds`.
    pub fn with_worlds(book: Arc<Vec<Position>>, worlds: Arc<Vec<Arc<Vec<Position>>>>) -> Self {
        Self {
            book,
            at: 0,
            worlds,
            calls: Arc::new(Calls::default()),
        }
    }

    pub fn calls(&self) -> Arc<Calls> {
        Arc::clone(&self.calls)
    }

    pub fn at(&self) -> usize {
        self.at
    }

    fn position(&self) -> &Position {
        &self.book[self.at]
    }
}

impl GameState for Scripted {
    type Actor = u8;
    type Action = u32;

    fn player_to_move(&self) -> Option<u8> {
        self.position().mover
    }

    fn actions(&self) -> Vec<u32> {
        self.position().moves.iter().map(|(action, _)| *action).collect()
    }

    fn apply_action(&self, action: u32) -> Result<Self, ApplyError> {
        self.calls.applied.fetch_add(1, Ordering::SeqCst);
        let (_, to) = self
            .position()
            .moves
            .iter()
            .find(|(candidate, _)| *candidate == action)
            .ok_or_else(|| ApplyError::illegal(action))?;
        Ok(Self {
            at: *to,
            ..self.clone()
        })
    }

    fn randomize<R: Rng + ?Sized>(&self, _observer: u8, rng: &mut R) -> Self {
        self.calls.randomized.fetch_add(1, Ordering::SeqCst);
        let pick = rng.gen_range(0..self.worlds.len());
        Self {
            book: Arc::clone(&self.worlds[pick]),
            at: 0,
            ..self.clone()
        }
    }

    fn hand_over(&self) -> bool {
        self.position().over
    }

    fn hand_point_diff(&self, actor: u8) -> i32 {
        if actor == 0 {
            self.position().diff
        } else {
            -self.position().diff
        }
    }
}

/// Player 0 picks 1, 2 or 3, player 1 answers with 10 or 11, then the hand is over.
/// Under exact play action 2 is the only choice that keeps player 0 ahead.
pub fn three_way_choice() -> Arc<Vec<Position>> {
    let mut script = Script::new();
    let root = script.decision(0);
    for (action, replies) in [(1, [5, -3]), (2, [2, 4]), (3, [9, -8])] {
        let reply = script.decision(1);
        script.link(root, action, reply);
        for (offset, diff) in replies.into_iter().enumerate() {
            let leaf = script.terminal_with_mover(0, diff);
            script.link(reply, 10 + offset as u32, leaf);
        }
    }
    script.finish()
}
