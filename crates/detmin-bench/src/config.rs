use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::Level;

const DEFAULT_HAND_SIZE: usize = detmin_pegging::DEFAULT_HAND_SIZE;
const MAX_HAND_SIZE: usize = 6;
const SEATS: usize = 2;
const DEFAULT_LATENCY_BUDGET_MS: u64 = 500;

/// A pegging tournament between two agents, as read from YAML.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct BenchmarkConfig {
    pub run_id: String,
    pub deals: DealConfig,
    pub agents: Vec<AgentConfig>,
    pub outputs: OutputsConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl BenchmarkConfig {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref().to_path_buf();
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(source) => return Err(ConfigError::Read { path, source }),
        };
        let mut config: Self = match serde_yaml::from_str(&text) {
            Ok(config) => config,
            Err(source) => return Err(ConfigError::Parse { path, source }),
        };
        if let Err(source) = config.validate() {
            return Err(ConfigError::Invalid { path, source });
        }
        Ok(config)
    }

    /// Checks every block and fills in derived defaults such as the baseline agent.
    /// Command-line overrides call this again after patching fields.
    pub fn validate(&mut self) -> Result<(), ValidationError> {
        check_slug("run_id", &self.run_id)?;
        self.deals.validate()?;
        self.validate_agents()?;
        self.metrics.settle_baseline(&self.agents)?;
        self.logging.validate()?;

        let outputs = self.resolved_outputs();
        if outputs.jsonl == outputs.summary_md {
            return Err(ValidationError::SharedOutput(outputs.jsonl));
        }
        Ok(())
    }

    fn validate_agents(&self) -> Result<(), ValidationError> {
        if self.agents.len() != SEATS {
            return Err(ValidationError::SeatCount(self.agents.len()));
        }

        let mut names = HashSet::new();
        for agent in &self.agents {
            check_slug("agents.name", &agent.name)?;
            if !names.insert(agent.name.as_str()) {
                return Err(ValidationError::DuplicateAgent(agent.name.clone()));
            }
            agent.check_params()?;
        }
        Ok(())
    }

    /// Output paths with every `{run_id}` substituted.
    pub fn resolved_outputs(&self) -> ResolvedOutputs {
        let resolve = |template: &str| PathBuf::from(template.replace("{run_id}", &self.run_id));
        ResolvedOutputs {
            jsonl: resolve(&self.outputs.jsonl),
            summary_md: resolve(&self.outputs.summary_md),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DealConfig {
    /// Seeds the per-hand deal seeds; 0 when omitted.
    pub seed: Option<u64>,
    pub hands: usize,
    /// Cards dealt to each seat.
    #[serde(default = "default_hand_size")]
    pub hand_size: usize,
    /// Replay every deal with the agents in swapped seats.
    #[serde(default = "default_true")]
    pub swap_seats: bool,
}

impl DealConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.hands == 0 {
            return Err(ValidationError::NoHands);
        }
        if !(1..=MAX_HAND_SIZE).contains(&self.hand_size) {
            return Err(ValidationError::HandSize(self.hand_size));
        }
        Ok(())
    }
}

fn default_hand_size() -> usize {
    DEFAULT_HAND_SIZE
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AgentConfig {
    pub name: String,
    pub kind: AgentKind,
    /// Search settings; only ensemble agents take any.
    #[serde(default)]
    pub params: serde_yaml::Value,
}

impl AgentConfig {
    fn check_params(&self) -> Result<(), ValidationError> {
        let misplaced = match self.kind {
            AgentKind::Ensemble => !self.params.is_null() && !self.params.is_mapping(),
            AgentKind::Greedy | AgentKind::Random => !self.params.is_null(),
        };
        if misplaced {
            return Err(ValidationError::AgentParams {
                agent: self.name.clone(),
                kind: self.kind,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    Ensemble,
    Greedy,
    Random,
}

/// Templates for the JSONL rows and the Markdown summary; `{run_id}` is substituted.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct OutputsConfig {
    pub jsonl: String,
    pub summary_md: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct MetricsConfig {
    /// Agent the others are compared against. Defaults to the first agent.
    pub baseline: Option<String>,
    /// Average decision time above which an agent is flagged in the summary.
    pub latency_budget_ms: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            baseline: None,
            latency_budget_ms: DEFAULT_LATENCY_BUDGET_MS,
        }
    }
}

impl MetricsConfig {
    fn settle_baseline(&mut self, agents: &[AgentConfig]) -> Result<(), ValidationError> {
        if self.latency_budget_ms == 0 {
            return Err(ValidationError::NoLatencyBudget);
        }
        let baseline = match self.baseline.take() {
            Some(name) => name,
            None => agents
                .first()
                .map(|agent| agent.name.clone())
                .ok_or(ValidationError::SeatCount(0))?,
        };
        if !agents.iter().any(|agent| agent.name == baseline) {
            return Err(ValidationError::UnknownBaseline(baseline));
        }
        self.baseline = Some(baseline);
        Ok(())
    }

    pub fn baseline(&self) -> Option<&str> {
        self.baseline.as_deref()
    }
}

/// Structured telemetry is off unless `enable_structured` is set.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub enable_structured: bool,
    /// A `tracing` level name; `info` when omitted.
    pub tracing_level: Option<String>,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        match &self.tracing_level {
            Some(name) if self.level().is_none() => Err(ValidationError::TracingLevel(name.clone())),
            _ => Ok(()),
        }
    }

    pub fn level(&self) -> Option<Level> {
        self.tracing_level
            .as_deref()
            .and_then(|name| name.trim().parse().ok())
    }
}

// Run ids and agent names end up in paths and JSONL rows.
fn check_slug(field: &'static str, value: &str) -> Result<(), ValidationError> {
    let valid = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    if valid {
        Ok(())
    } else {
        Err(ValidationError::Slug {
            field,
            value: value.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOutputs {
    pub jsonl: PathBuf,
    pub summary_md: PathBuf,
}

impl ResolvedOutputs {
    /// Directory shared by the summary and the telemetry log.
    pub fn report_dir(&self) -> PathBuf {
        match self.summary_md.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid config {}: {source}", .path.display())]
    Invalid {
        path: PathBuf,
        #[source]
        source: ValidationError,
    },
}

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("{field} '{value}' must be non-empty ASCII letters, digits, '.', '_' or '-'")]
    Slug { field: &'static str, value: String },
    #[error("deals.hands must be greater than zero")]
    NoHands,
    #[error("deals.hand_size {0} is outside 1..={max}", max = MAX_HAND_SIZE)]
    HandSize(usize),
    #[error("a pegging tournament seats exactly {seats} agents, found {0}", seats = SEATS)]
    SeatCount(usize),
    #[error("agent name '{0}' is used more than once")]
    DuplicateAgent(String),
    #[error("agent '{agent}' of kind {kind:?} has unusable params")]
    AgentParams { agent: String, kind: AgentKind },
    #[error("metrics.baseline '{0}' is not one of the agents")]
    UnknownBaseline(String),
    #[error("metrics.latency_budget_ms must be greater than zero")]
    NoLatencyBudget,
    #[error("logging.tracing_level '{0}' is not a tracing level")]
    TracingLevel(String),
    #[error("outputs.jsonl and outputs.summary_md both resolve to {}", .0.display())]
    SharedOutput(PathBuf),
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADS_UP: &str = r#"
run_id: "heads_up"
deals:
  hands: 10
agents:
  - name: "ensemble"
    kind: "ensemble"
    params:
      samples: 12
  - name: "greedy"
    kind: "greedy"
outputs:
  jsonl: "out/{run_id}/deals.jsonl"
  summary_md: "out/{run_id}/summary.md"
"#;

    fn parsed() -> BenchmarkConfig {
        serde_yaml::from_str(HEADS_UP).expect("parse yaml")
    }

    #[test]
    fn omitted_fields_take_pegging_defaults() {
        let mut cfg = parsed();
        cfg.validate().expect("valid");

        assert_eq!(cfg.deals.seed, None);
        assert_eq!(cfg.deals.hand_size, DEFAULT_HAND_SIZE);
        assert!(cfg.deals.swap_seats);
        assert_eq!(cfg.metrics.baseline(), Some("ensemble"));
        assert_eq!(cfg.metrics.latency_budget_ms, DEFAULT_LATENCY_BUDGET_MS);
        assert!(!cfg.logging.enable_structured);
        assert_eq!(cfg.logging.level(), None);

        let outputs = cfg.resolved_outputs();
        assert_eq!(outputs.summary_md, PathBuf::from("out/heads_up/summary.md"));
        assert_eq!(outputs.report_dir(), PathBuf::from("out/heads_up"));
    }

    #[test]
    fn hand_size_must_fit_the_deck_split() {
        for size in [0, MAX_HAND_SIZE + 1] {
            let mut cfg = parsed();
            cfg.deals.hand_size = size;
            assert_eq!(cfg.validate(), Err(ValidationError::HandSize(size)));
        }

        let mut cfg = parsed();
        cfg.deals.hand_size = MAX_HAND_SIZE;
        assert_eq!(cfg.validate(), Ok(()));
    }

    #[test]
    fn unknown_deal_keys_are_rejected() {
        let yaml = HEADS_UP.replace("hands: 10", "hands: 10\n  swap: false");
        assert!(serde_yaml::from_str::<BenchmarkConfig>(&yaml).is_err());
    }

    #[test]
    fn exactly_two_seats_are_filled() {
        let mut cfg = parsed();
        cfg.agents.truncate(1);
        assert_eq!(cfg.validate(), Err(ValidationError::SeatCount(1)));

        let mut cfg = parsed();
        cfg.agents[1].name = "ensemble".into();
        assert_eq!(
            cfg.validate(),
            Err(ValidationError::DuplicateAgent("ensemble".into()))
        );
    }

    #[test]
    fn params_belong_to_ensemble_agents() {
        let mut cfg = parsed();
        cfg.agents[1].params = cfg.agents[0].params.clone();
        assert!(matches!(
            cfg.validate(),
            Err(ValidationError::AgentParams { kind: AgentKind::Greedy, .. })
        ));

        let mut cfg = parsed();
        cfg.agents[0].params = serde_yaml::Value::from(12);
        assert!(matches!(
            cfg.validate(),
            Err(ValidationError::AgentParams { kind: AgentKind::Ensemble, .. })
        ));
    }

    #[test]
    fn explicit_baseline_must_name_an_agent() {
        let mut cfg = parsed();
        cfg.metrics.baseline = Some("greedy".into());
        cfg.validate().expect("valid");
        assert_eq!(cfg.metrics.baseline(), Some("greedy"));

        cfg.metrics.baseline = Some("oracle".into());
        assert_eq!(
            cfg.validate(),
            Err(ValidationError::UnknownBaseline("oracle".into()))
        );
    }

    #[test]
    fn overrides_are_rechecked() {
        let mut cfg = parsed();
        cfg.validate().expect("valid");

        cfg.run_id = "heads up".into();
        assert!(matches!(
            cfg.validate(),
            Err(ValidationError::Slug { field: "run_id", .. })
        ));

        cfg.run_id = "heads_up".into();
        cfg.deals.hands = 0;
        assert_eq!(cfg.validate(), Err(ValidationError::NoHands));
    }

    #[test]
    fn tracing_level_is_parsed() {
        let mut cfg = parsed();
        cfg.logging.tracing_level = Some("DEBUG".into());
        cfg.validate().expect("valid");
        assert_eq!(cfg.logging.level(), Some(Level::DEBUG));

        cfg.logging.tracing_level = Some("loud".into());
        assert_eq!(
            cfg.validate(),
            Err(ValidationError::TracingLevel("loud".into()))
        );
    }

    #[test]
    fn outputs_must_not_collide() {
        let mut cfg = parsed();
        cfg.outputs.summary_md = cfg.outputs.jsonl.clone();
        assert_eq!(
            cfg.validate(),
            Err(ValidationError::SharedOutput(PathBuf::from(
                "out/heads_up/deals.jsonl"
            )))
        );
    }
}
