use std::collections::HashMap;
use std::fs;
use std::path::Path;

use detmin_core::LifetimeStats;
use serde::Serialize;
use thiserror::Error;

use crate::config::{AgentKind, BenchmarkConfig};
use crate::tournament::{HandOutcome, SeatResult};

const CONFIDENCE_Z: f64 = 1.96; // 95% CI

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("baseline agent '{0}' not present in tournament results")]
    MissingBaseline(String),
    #[error("agent '{0}' defined in results but missing from configuration")]
    UnknownAgent(String),
    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
}

pub struct AnalyticsCollector {
    baseline: String,
    agents: HashMap<String, AgentAccumulator>,
    agent_order: Vec<String>,
    latency_budget_ms: u64,
}

impl AnalyticsCollector {
    pub fn new(config: &BenchmarkConfig) -> Result<Self, AnalyticsError> {
        let baseline = config
            .metrics
            .baseline()
            .map(str::to_string)
            .ok_or_else(|| AnalyticsError::MissingBaseline("<unset>".into()))?;

        let mut agents = HashMap::new();
        let mut order = Vec::new();
        for agent in &config.agents {
            agents.insert(
                agent.name.clone(),
                AgentAccumulator::new(agent.name.clone(), agent.kind),
            );
            order.push(agent.name.clone());
        }

        if !agents.contains_key(&baseline) {
            return Err(AnalyticsError::MissingBaseline(baseline));
        }

        Ok(Self {
            baseline,
            agents,
            agent_order: order,
            latency_budget_ms: config.metrics.latency_budget_ms,
        })
    }

    pub fn record_hand(&mut self, outcome: &HandOutcome) -> Result<(), AnalyticsError> {
        for seat in &outcome.seat_results {
            let acc = self
                .agents
                .get_mut(&seat.agent_name)
                .ok_or_else(|| AnalyticsError::UnknownAgent(seat.agent_name.clone()))?;
            acc.record_hand(seat);
        }
        Ok(())
    }

    pub fn finalize(mut self) -> AnalyticsSummary {
        let mut reports = Vec::new();
        for name in &self.agent_order {
            if let Some(acc) = self.agents.remove(name) {
                reports.push(acc.into_report(self.latency_budget_ms));
            }
        }

        let baseline_diff = reports
            .iter()
            .find(|report| report.name == self.baseline)
            .map(|report| report.avg_point_diff)
            .unwrap_or(0.0);
        for report in &mut reports {
            report.delta_vs_baseline = report.avg_point_diff - baseline_diff;
        }

        AnalyticsSummary {
            baseline: self.baseline,
            agents: reports,
            latency_budget_ms: self.latency_budget_ms,
        }
    }
}

struct AgentAccumulator {
    name: String,
    kind: AgentKind,
    hands: u32,
    wins: u32,
    total_points: u64,
    per_hand_diff: Vec<f64>,
    total_latency_ms: f64,
    total_decisions: u64,
    samples: u64,
    repaired_samples: u64,
    truncated_decisions: u64,
    lifetime: Option<LifetimeStats>,
}

impl AgentAccumulator {
    fn new(name: String, kind: AgentKind) -> Self {
        Self {
            name,
            kind,
            hands: 0,
            wins: 0,
            total_points: 0,
            per_hand_diff: Vec::new(),
            total_latency_ms: 0.0,
            total_decisions: 0,
            samples: 0,
            repaired_samples: 0,
            truncated_decisions: 0,
            lifetime: None,
        }
    }

    fn record_hand(&mut self, seat: &SeatResult) {
        self.hands += 1;
        if seat.point_diff > 0 {
            self.wins += 1;
        }
        self.total_points += u64::from(seat.points);
        self.per_hand_diff.push(f64::from(seat.point_diff));
        self.total_latency_ms += seat.metrics.total_ms;
        self.total_decisions += u64::from(seat.metrics.decisions);
        self.samples += seat.metrics.samples as u64;
        self.repaired_samples += seat.metrics.repaired_samples as u64;
        self.truncated_decisions += u64::from(seat.metrics.truncated);
        if let Some(stats) = seat.lifetime {
            *self.lifetime.get_or_insert_default() += stats;
        }
    }

    fn into_report(self, latency_budget_ms: u64) -> AgentReport {
        let avg_point_diff = mean(&self.per_hand_diff);
        let avg_points = if self.hands == 0 {
            0.0
        } else {
            self.total_points as f64 / f64::from(self.hands)
        };
        let avg_latency = if self.total_decisions == 0 {
            0.0
        } else {
            self.total_latency_ms / self.total_decisions as f64
        };
        let repair_rate = if self.samples == 0 {
            0.0
        } else {
            self.repaired_samples as f64 / self.samples as f64
        };

        AgentReport {
            ci95: confidence_interval(&self.per_hand_diff),
            name: self.name,
            kind: self.kind,
            hands: self.hands as usize,
            wins: self.wins as usize,
            avg_points,
            avg_point_diff,
            average_ms_per_decision: avg_latency,
            samples: self.samples,
            repaired_samples: self.repaired_samples,
            repair_rate,
            truncated_decisions: self.truncated_decisions,
            lifetime: self.lifetime,
            delta_vs_baseline: 0.0,
            over_budget: avg_latency > latency_budget_ms as f64,
        }
    }
}

pub struct AnalyticsSummary {
    pub baseline: String,
    pub agents: Vec<AgentReport>,
    pub latency_budget_ms: u64,
}

impl AnalyticsSummary {
    pub fn write_markdown(&self, path: impl AsRef<Path>) -> Result<(), AnalyticsError> {
        let mut rows = String::new();
        rows.push_str("# Pegging Tournament Summary\n\n");
        rows.push_str(&format!(
            "Baseline: {} | Latency budget: {} ms average per decision\n\n",
            self.baseline, self.latency_budget_ms
        ));
        rows.push_str("| Agent | Kind | Hands | Win % | Avg points | Avg diff | Δ vs baseline | 95% CI | Samples | Repair % | Truncated | Avg ms/decision | Over Budget |\n");
        rows.push_str("|-------|------|-------|-------|------------|----------|----------------|--------|---------|----------|-----------|------------------|-------------|\n");

        for agent in &self.agents {
            let win_rate = if agent.hands == 0 {
                0.0
            } else {
                agent.wins as f64 / agent.hands as f64
            };

            rows.push_str(&format!(
                "| {name} | {kind:?} | {hands} | {win:.1}% | {points:.3} | {diff:+.3} | {delta:+.3} | [{ci_low:.3}, {ci_high:.3}] | {samples} | {repair:.2}% | {truncated} | {latency:.2} | {over_budget} |\n",
                name = agent.name,
                kind = agent.kind,
                hands = agent.hands,
                win = win_rate * 100.0,
                points = agent.avg_points,
                diff = agent.avg_point_diff,
                delta = agent.delta_vs_baseline,
                ci_low = agent.ci95.0,
                ci_high = agent.ci95.1,
                samples = agent.samples,
                repair = agent.repair_rate * 100.0,
                truncated = agent.truncated_decisions,
                latency = agent.average_ms_per_decision,
                over_budget = if agent.over_budget { "Yes" } else { "No" },
            ));
        }

        fs::write(path.as_ref(), rows).map_err(|e| AnalyticsError::Io {
            context: "writing summary markdown",
            source: e,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentReport {
    pub name: String,
    pub kind: AgentKind,
    pub hands: usize,
    pub wins: usize,
    pub avg_points: f64,
    pub avg_point_diff: f64,
    pub ci95: (f64, f64),
    pub average_ms_per_decision: f64,
    pub samples: u64,
    pub repaired_samples: u64,
    pub repair_rate: f64,
    pub truncated_decisions: u64,
    /// Summed search-player counters; `None` for agents that never search.
    pub lifetime: Option<LifetimeStats>,
    pub delta_vs_baseline: f64,
    #[serde(skip)]
    pub over_budget: bool,
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn confidence_interval(points: &[f64]) -> (f64, f64) {
    let mean = mean(points);
    if points.len() < 2 {
        return (mean, mean);
    }
    let variance = points
        .iter()
        .map(|value| (value - mean).powi(2))
        .sum::<f64>()
        / (points.len() as f64 - 1.0);
    let std_error = (variance / points.len() as f64).sqrt();
    let margin = CONFIDENCE_Z * std_error;
    (mean - margin, mean + margin)
}
