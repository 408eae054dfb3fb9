use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use detmin_core::{GameState, LifetimeStats};
use detmin_pegging::model::deck::Deck;
use detmin_pegging::{PeggingState, Seat};
use rand::{RngCore, SeedableRng, rngs::StdRng};
use serde::Serialize;
use thiserror::Error;
use tracing::{Level, event, info};

use crate::agents::{AgentBlueprint, AgentError, Decision, Policy};
use crate::analytics::{AnalyticsCollector, AnalyticsError, AnalyticsSummary};
use crate::config::{BenchmarkConfig, ResolvedOutputs};
use crate::logging::TELEMETRY_FILE;

const SEATS: usize = 2;

/// Primary entry point for orchestrating tournaments.
pub struct TournamentRunner {
    config: BenchmarkConfig,
    outputs: ResolvedOutputs,
    agents: Vec<AgentBlueprint>,
    logging_enabled: bool,
}

/// Summary details returned after a run.
pub struct RunSummary {
    pub hands_played: usize,
    pub seatings: usize,
    pub rows_written: usize,
    pub jsonl_path: PathBuf,
    pub summary_path: PathBuf,
    pub telemetry_path: Option<PathBuf>,
    pub analytics: AnalyticsSummary,
}

impl TournamentRunner {
    /// Build a runner from a validated configuration.
    pub fn new(config: BenchmarkConfig, outputs: ResolvedOutputs) -> Result<Self, RunnerError> {
        let agents = AgentBlueprint::from_configs(&config.agents)?;

        if agents.len() != SEATS {
            return Err(RunnerError::SeatCount {
                found: agents.len(),
            });
        }

        Ok(Self {
            logging_enabled: config.logging.enable_structured,
            config,
            outputs,
            agents,
        })
    }

    /// Agent index for each seat, by [`Seat::index`]. The swap replays a deal with roles reversed.
    fn seatings(&self) -> Vec<[usize; SEATS]> {
        if self.config.deals.swap_seats {
            vec![[0, 1], [1, 0]]
        } else {
            vec![[0, 1]]
        }
    }

    /// Execute the tournament, streaming JSONL rows to disk.
    pub fn run(&self) -> Result<RunSummary, RunnerError> {
        ensure_parent(self.outputs.jsonl.parent())?;
        ensure_parent(self.outputs.summary_md.parent())?;

        let mut writer = BufWriter::new(File::create(&self.outputs.jsonl)?);
        let seatings = self.seatings();
        let mut rng = StdRng::seed_from_u64(self.config.deals.seed.unwrap_or(0));
        let mut rows_written = 0usize;
        let mut analytics = AnalyticsCollector::new(&self.config)?;

        for hand_index in 0..self.config.deals.hands {
            let base_seed = rng.next_u64();

            for (seating_index, seating) in seatings.iter().enumerate() {
                let outcome = self.play_hand(hand_index, seating_index, base_seed, seating)?;
                analytics.record_hand(&outcome)?;
                rows_written += write_hand_rows(
                    &mut writer,
                    &self.config,
                    hand_index,
                    seating_index,
                    base_seed,
                    &outcome,
                )?;
            }
        }

        writer.flush()?;

        let summary = analytics.finalize();
        summary.write_markdown(&self.outputs.summary_md)?;

        for agent in &summary.agents {
            if let Some(lifetime) = agent.lifetime {
                info!(
                    run_id = %self.config.run_id,
                    agent = %agent.name,
                    selections = lifetime.selections,
                    shortcuts = lifetime.shortcuts,
                    accepted = lifetime.accepted_samples,
                    repaired = lifetime.repaired_samples,
                    truncated = lifetime.truncated_selections,
                    "ensemble lifetime counters"
                );
            }
        }

        let telemetry_path = self
            .logging_enabled
            .then(|| self.outputs.report_dir().join(TELEMETRY_FILE));

        info!(
            run_id = %self.config.run_id,
            hands = self.config.deals.hands,
            rows = rows_written,
            "tournament complete"
        );

        Ok(RunSummary {
            hands_played: self.config.deals.hands,
            seatings: seatings.len(),
            rows_written,
            jsonl_path: self.outputs.jsonl.clone(),
            summary_path: self.outputs.summary_md.clone(),
            telemetry_path,
            analytics: summary,
        })
    }

    fn play_hand(
        &self,
        hand_index: usize,
        seating_index: usize,
        base_seed: u64,
        seating: &[usize; SEATS],
    ) -> Result<HandOutcome, RunnerError> {
        let deck = Deck::shuffled_with_seed(base_seed);
        let mut state = PeggingState::deal(&deck, self.config.deals.hand_size);
        let mut seats = build_seat_states(seating, &self.agents, base_seed)?;

        while !state.hand_over() {
            let action = match state.player_to_move() {
                None => *state
                    .actions()
                    .first()
                    .ok_or_else(|| RunnerError::game("forced step without an action".into()))?,
                Some(seat) => {
                    let seat_state = &mut seats[seat.index()];
                    let start = Instant::now();
                    let decision = seat_state.policy.choose(&state, &mut seat_state.rng)?;
                    let elapsed_ms = seat_state.metrics.record(start.elapsed(), &decision);

                    if self.logging_enabled && tracing::enabled!(Level::INFO) {
                        event!(
                            target: "detmin_bench::play",
                            Level::INFO,
                            run_id = %self.config.run_id,
                            hand_index = hand_index as u32,
                            seating_index = seating_index as u32,
                            seat = %seat,
                            action = %decision.action,
                            count = state.count(),
                            samples = decision.samples,
                            repaired = decision.repaired_samples,
                            elapsed_ms
                        );
                    }
                    decision.action
                }
            };

            state = state.apply_action(action).map_err(|err| {
                RunnerError::game(format!(
                    "invalid action {action}: {err} (count: {}, played: {})",
                    state.count(),
                    state.played().len()
                ))
            })?;
        }

        let seating_snapshot = seats
            .iter()
            .map(|seat| SeatSnapshot {
                seat: seat.seat.to_string(),
                bot: seat.agent_name.clone(),
            })
            .collect();

        let seat_results = seats
            .into_iter()
            .map(|seat| SeatResult {
                lifetime: seat.policy.lifetime(),
                points: state.points(seat.seat),
                point_diff: state.hand_point_diff(seat.seat),
                agent_name: seat.agent_name,
                seat: seat.seat,
                metrics: seat.metrics.finalize(),
            })
            .collect();

        Ok(HandOutcome {
            seating: seating_snapshot,
            seat_results,
        })
    }
}

fn ensure_parent(path: Option<&Path>) -> Result<(), RunnerError> {
    if let Some(dir) = path.filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

fn write_hand_rows(
    writer: &mut BufWriter<File>,
    config: &BenchmarkConfig,
    hand_index: usize,
    seating_index: usize,
    base_seed: u64,
    outcome: &HandOutcome,
) -> Result<usize, RunnerError> {
    let deal_id = format!("H{hand_index:05}_S{seating_index:02}");

    let mut rows_written = 0usize;
    for seat_result in &outcome.seat_results {
        let row = DealLogRow {
            run_id: config.run_id.clone(),
            deal_id: deal_id.clone(),
            hand_index,
            seating_index,
            deal_seed: base_seed,
            seat: seat_result.seat.to_string(),
            bot: seat_result.agent_name.clone(),
            seating: outcome.seating.clone(),
            points: seat_result.points,
            point_diff: seat_result.point_diff,
            speed_ms_turn: seat_result.metrics.avg_ms_per_decision,
            decisions: seat_result.metrics.decisions,
            samples: seat_result.metrics.samples,
            repaired_samples: seat_result.metrics.repaired_samples,
            truncated: seat_result.metrics.truncated,
        };

        serde_json::to_writer(&mut *writer, &row)?;
        writer.write_all(b"\n")?;
        rows_written += 1;
    }

    Ok(rows_written)
}

fn build_seat_states(
    seating: &[usize; SEATS],
    agents: &[AgentBlueprint],
    base_seed: u64,
) -> Result<Vec<SeatState>, RunnerError> {
    let mut seats = Vec::with_capacity(SEATS);
    for seat in Seat::LOOP {
        let agent_index = seating[seat.index()];
        let agent = agents
            .get(agent_index)
            .ok_or(RunnerError::InvalidSeating {
                index: seat.index(),
                agent_index,
            })?;
        seats.push(SeatState {
            seat,
            agent_name: agent.name.clone(),
            policy: agent.spawn_policy()?,
            rng: StdRng::seed_from_u64(base_seed ^ (seat.index() as u64 + 1)),
            metrics: DecisionMetrics::default(),
        });
    }
    Ok(seats)
}

struct SeatState {
    seat: Seat,
    agent_name: String,
    policy: Box<dyn Policy>,
    rng: StdRng,
    metrics: DecisionMetrics,
}

pub struct HandOutcome {
    pub seating: Vec<SeatSnapshot>,
    pub seat_results: Vec<SeatResult>,
}

#[derive(Clone, Serialize)]
pub struct SeatSnapshot {
    pub seat: String,
    pub bot: String,
}

pub struct SeatResult {
    pub agent_name: String,
    pub seat: Seat,
    pub points: u32,
    pub point_diff: i32,
    pub metrics: DecisionSummary,
    /// Counters of the hand's search player, for agents that search.
    pub lifetime: Option<LifetimeStats>,
}

#[derive(Default)]
struct DecisionMetrics {
    total: Duration,
    decisions: u32,
    samples: usize,
    repaired_samples: usize,
    truncated: u32,
}

impl DecisionMetrics {
    fn record(&mut self, duration: Duration, decision: &Decision) -> f64 {
        self.total += duration;
        self.decisions += 1;
        self.samples += decision.samples;
        self.repaired_samples += decision.repaired_samples;
        if decision.truncated {
            self.truncated += 1;
        }
        duration.as_secs_f64() * 1000.0
    }

    fn finalize(self) -> DecisionSummary {
        let avg_ms = if self.decisions == 0 {
            0.0
        } else {
            self.total.as_secs_f64() * 1000.0 / f64::from(self.decisions)
        };

        DecisionSummary {
            decisions: self.decisions,
            avg_ms_per_decision: avg_ms,
            total_ms: self.total.as_secs_f64() * 1000.0,
            samples: self.samples,
            repaired_samples: self.repaired_samples,
            truncated: self.truncated,
        }
    }
}

#[derive(Clone)]
pub struct DecisionSummary {
    pub decisions: u32,
    pub avg_ms_per_decision: f64,
    pub total_ms: f64,
    pub samples: usize,
    pub repaired_samples: usize,
    pub truncated: u32,
}

#[derive(Serialize)]
struct DealLogRow {
    run_id: String,
    deal_id: String,
    hand_index: usize,
    seating_index: usize,
    deal_seed: u64,
    seat: String,
    bot: String,
    seating: Vec<SeatSnapshot>,
    points: u32,
    point_diff: i32,
    speed_ms_turn: f64,
    decisions: u32,
    samples: usize,
    repaired_samples: usize,
    truncated: u32,
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("{0}")]
    Agent(#[from] AgentError),
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
    #[error("failed to serialize log row: {source}")]
    Serialize {
        #[from]
        source: serde_json::Error,
    },
    #[error("game execution failed: {message}")]
    Game { message: String },
    #[error("configuration requires exactly 2 agents but found {found}")]
    SeatCount { found: usize },
    #[error("seat {index} references invalid agent index {agent_index}")]
    InvalidSeating { index: usize, agent_index: usize },
    #[error("analytics error: {0}")]
    Analytics(#[from] AnalyticsError),
}

impl RunnerError {
    fn game(message: String) -> Self {
        RunnerError::Game { message }
    }
}
