//! Move selection by voting over solved determinizations.

use crate::config::{EnsembleConfig, RewardPerspective};
use crate::error::{ConfigError, SearchError};
use crate::minimax;
use crate::state::GameState;
use crate::tree::{SearchBudget, TreeBuilder};
use crate::vote;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::fmt;
use std::ops::AddAssign;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Diagnostics for one call to [`EnsemblePlayer::select`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionOutcome<A> {
    pub action: A,
    /// Samples that produced a vote.
    pub total_samples: usize,
    /// Samples whose recommendation was illegal in the true position and got replaced.
    pub repaired_samples: usize,
    /// Distinct votes and their counts in order of first appearance.
    pub votes: Vec<(A, usize)>,
    /// The position had a single legal action and nothing was sampled.
    pub shortcut: bool,
    /// A budget ran out before every configured sample finished.
    pub truncated: bool,
    pub nodes_built: usize,
    pub elapsed: Duration,
}

impl<A> SelectionOutcome<A> {
    pub fn accepted_samples(&self) -> usize {
        self.total_samples - self.repaired_samples
    }
}

/// Counters accumulated over every selection a player has made.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LifetimeStats {
    pub selections: u64,
    pub shortcuts: u64,
    pub accepted_samples: u64,
    pub repaired_samples: u64,
    pub truncated_selections: u64,
}

impl AddAssign for LifetimeStats {
    fn add_assign(&mut self, other: Self) {
        self.selections += other.selections;
        self.shortcuts += other.shortcuts;
        self.accepted_samples += other.accepted_samples;
        self.repaired_samples += other.repaired_samples;
        self.truncated_selections += other.truncated_selections;
    }
}

#[derive(Debug, Clone, Copy)]
struct SampleVote<A> {
    action: A,
    repaired: bool,
    nodes: usize,
}

#[derive(Debug, Clone)]
pub struct EnsemblePlayer {
    config: EnsembleConfig,
    lifetime: LifetimeStats,
}

impl EnsemblePlayer {
    pub fn new(config: EnsembleConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            lifetime: LifetimeStats::default(),
        })
    }

    pub fn config(&self) -> &EnsembleConfig {
        &self.config
    }

    pub fn lifetime(&self) -> LifetimeStats {
        self.lifetime
    }

    pub fn select_move<S, R>(&mut self, state: &S, rng: &mut R) -> Result<S::Action, SearchError>
    where
        S: GameState,
        R: Rng + ?Sized,
    {
        self.select(state, rng).map(|outcome| outcome.action)
    }

    /// Samples, solves and votes, one determinization after another.
    pub fn select<S, R>(
        &mut self,
        state: &S,
        rng: &mut R,
    ) -> Result<SelectionOutcome<S::Action>, SearchError>
    where
        S: GameState,
        R: Rng + ?Sized,
    {
        let started = Instant::now();
        let plan = match self.plan(state, rng, started)? {
            Plan::Shortcut(outcome) => return Ok(self.record(outcome)),
            Plan::Sample(plan) => plan,
        };

        let mut results = Vec::with_capacity(plan.seeds.len());
        for &seed in &plan.seeds {
            let result = run_sample(state, &plan, seed);
            let stop = result.is_err();
            results.push(result);
            if stop {
                break;
            }
        }
        let outcome = conclude(&plan, results)?;
        Ok(self.record(outcome))
    }

    /// Same selection as [`select`](Self::select) with samples spread over the rayon pool.
    #[cfg(feature = "parallel")]
    pub fn select_parallel<S, R>(
        &mut self,
        state: &S,
        rng: &mut R,
    ) -> Result<SelectionOutcome<S::Action>, SearchError>
    where
        S: GameState + Sync,
        S::Actor: Send + Sync,
        S::Action: Send + Sync,
        R: Rng + ?Sized,
    {
        use rayon::prelude::*;

        let started = Instant::now();
        let plan = match self.plan(state, rng, started)? {
            Plan::Shortcut(outcome) => return Ok(self.record(outcome)),
            Plan::Sample(plan) => plan,
        };

        let results: Vec<_> = plan
            .seeds
            .par_iter()
            .map(|&seed| run_sample(state, &plan, seed))
            .collect();
        let outcome = conclude(&plan, results)?;
        Ok(self.record(outcome))
    }

    fn plan<S, R>(
        &self,
        state: &S,
        rng: &mut R,
        started: Instant,
    ) -> Result<Plan<S>, SearchError>
    where
        S: GameState,
        R: Rng + ?Sized,
    {
        let legal = state.actions();
        match legal.as_slice() {
            [] => return Err(SearchError::NoLegalActions),
            [only] => {
                return Ok(Plan::Shortcut(SelectionOutcome {
                    action: *only,
                    total_samples: 0,
                    repaired_samples: 0,
                    votes: Vec::new(),
                    shortcut: true,
                    truncated: false,
                    nodes_built: 0,
                    elapsed: started.elapsed(),
                }));
            }
            _ => {}
        }
        let observer = state.player_to_move().ok_or(SearchError::NoPlayerToMove)?;

        // Seeds are drawn up front so every sample's randomness is independent of scheduling.
        let seeds = (0..self.config.samples).map(|_| rng.r#gen::<u64>()).collect();
        let budget = SearchBudget::new(
            started,
            self.config.time_budget_ms.map(Duration::from_millis),
            self.config.max_tree_nodes,
        );

        Ok(Plan::Sample(SamplePlan {
            observer,
            legal,
            seeds,
            budget,
            perspective: self.config.perspective,
        }))
    }

    fn record<A>(&mut self, outcome: SelectionOutcome<A>) -> SelectionOutcome<A> {
        let stats = &mut self.lifetime;
        stats.selections += 1;
        if outcome.shortcut {
            stats.shortcuts += 1;
        }
        if outcome.truncated {
            stats.truncated_selections += 1;
        }
        stats.repaired_samples += outcome.repaired_samples as u64;
        stats.accepted_samples += outcome.accepted_samples() as u64;
        debug!(
            selections = stats.selections,
            accepted = stats.accepted_samples,
            repaired = stats.repaired_samples,
            "ensemble lifetime counters"
        );
        outcome
    }
}

impl fmt::Display for EnsemblePlayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Determinized minimax, {} determinizations", self.config.samples)
    }
}

enum Plan<S: GameState> {
    Shortcut(SelectionOutcome<S::Action>),
    Sample(SamplePlan<S>),
}

struct SamplePlan<S: GameState> {
    observer: S::Actor,
    legal: Vec<S::Action>,
    seeds: Vec<u64>,
    budget: SearchBudget,
    perspective: RewardPerspective,
}

fn run_sample<S: GameState>(
    state: &S,
    plan: &SamplePlan<S>,
    seed: u64,
) -> Result<SampleVote<S::Action>, SearchError> {
    if plan.budget.expired() {
        return Err(SearchError::DeadlineElapsed {
            elapsed_ms: plan.budget.started().elapsed().as_millis() as u64,
        });
    }

    let mut rng = SmallRng::seed_from_u64(seed);
    let determinized = state.randomize(plan.observer, &mut rng);
    let tree = TreeBuilder::new(plan.perspective, &plan.budget).build(determinized)?;
    let solution = minimax::solve(&tree);
    let recommended = tree.first_move(solution.leaf).ok_or(SearchError::EmptyTree)?;

    let repaired = !plan.legal.contains(&recommended);
    let action = if repaired {
        let fallback = plan.legal[0];
        warn!(
            recommended = ?recommended,
            fallback = ?fallback,
            "sampled recommendation is illegal in the true position"
        );
        fallback
    } else {
        recommended
    };
    debug!(
        action = ?action,
        value = solution.value,
        nodes = tree.len(),
        depth = tree.max_depth(),
        "determinization solved"
    );

    Ok(SampleVote {
        action,
        repaired,
        nodes: tree.len(),
    })
}

// Tallies sample results in seed order. The first budget failure ends the count; any other
// failure aborts the selection.
fn conclude<S: GameState>(
    plan: &SamplePlan<S>,
    results: Vec<Result<SampleVote<S::Action>, SearchError>>,
) -> Result<SelectionOutcome<S::Action>, SearchError> {
    let mut ballots = Vec::with_capacity(results.len());
    let mut repaired_samples = 0;
    let mut nodes_built = 0;
    let mut truncated = false;

    for result in results {
        match result {
            Ok(sample) => {
                if sample.repaired {
                    repaired_samples += 1;
                }
                nodes_built += sample.nodes;
                ballots.push(sample.action);
            }
            Err(err) if err.is_budget() => {
                warn!(error = %err, finished = ballots.len(), "search budget exhausted");
                truncated = true;
                break;
            }
            Err(err) => return Err(err),
        }
    }
    if ballots.len() < plan.seeds.len() {
        truncated = true;
    }

    let votes = vote::tally(&ballots);
    let action = vote::winner(&votes).unwrap_or(plan.legal[0]);
    debug!(
        action = ?action,
        samples = ballots.len(),
        repaired = repaired_samples,
        truncated,
        "ensemble vote"
    );

    Ok(SelectionOutcome {
        action,
        total_samples: ballots.len(),
        repaired_samples,
        votes,
        shortcut: false,
        truncated,
        nodes_built,
        elapsed: plan.budget.started().elapsed(),
    })
}
