use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

const DEFAULT_SAMPLES: usize = 20;

/// Whose point differential a leaf is scored with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardPerspective {
    /// Every node keeps the player to move in its own state (inherited from the parent at
    /// positions with nobody to move) and the leaf is scored for that player.
    #[default]
    NodeActor,
    /// Every node is scored for the player who was to move at the root.
    RootActor,
}

impl RewardPerspective {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "node" | "node_actor" => Some(RewardPerspective::NodeActor),
            "root" | "root_actor" => Some(RewardPerspective::RootActor),
            _ => None,
        }
    }
}

/// Settings for [`EnsemblePlayer`](crate::ensemble::EnsemblePlayer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnsembleConfig {
    /// Determinizations sampled per decision.
    pub samples: usize,
    pub perspective: RewardPerspective,
    /// Cap on nodes in any one sample's tree.
    pub max_tree_nodes: Option<usize>,
    /// Wall-clock budget for a whole selection.
    pub time_budget_ms: Option<u64>,
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        Self {
            samples: DEFAULT_SAMPLES,
            perspective: RewardPerspective::default(),
            max_tree_nodes: None,
            time_budget_ms: None,
        }
    }
}

impl EnsembleConfig {
    pub fn with_samples(samples: usize) -> Self {
        Self {
            samples,
            ..Self::default()
        }
    }

    pub fn perspective(mut self, perspective: RewardPerspective) -> Self {
        self.perspective = perspective;
        self
    }

    pub fn max_tree_nodes(mut self, limit: usize) -> Self {
        self.max_tree_nodes = Some(limit);
        self
    }

    pub fn time_budget_ms(mut self, budget: u64) -> Self {
        self.time_budget_ms = Some(budget);
        self
    }

    pub fn from_env() -> Self {
        Self::from_reader(|key| std::env::var(key).ok())
    }

    /// Builds a config from `DETMIN_*` keys, keeping defaults for missing or unparsable values.
    pub fn from_reader<F>(mut read: F) -> Self
    where
        F: FnMut(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let samples = read("DETMIN_SAMPLES")
            .and_then(|raw| raw.trim().parse::<usize>().ok())
            .unwrap_or(defaults.samples);

        let perspective = read("DETMIN_PERSPECTIVE")
            .and_then(|raw| RewardPerspective::parse(&raw))
            .unwrap_or(defaults.perspective);

        let max_tree_nodes = read("DETMIN_MAX_TREE_NODES")
            .and_then(|raw| raw.trim().parse::<usize>().ok())
            .or(defaults.max_tree_nodes);

        let time_budget_ms = read("DETMIN_TIME_BUDGET_MS")
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .or(defaults.time_budget_ms);

        Self {
            samples,
            perspective,
            max_tree_nodes,
            time_budget_ms,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.samples == 0 {
            return Err(ConfigError::InvalidField {
                field: "samples".to_string(),
                message: "at least one determinization is required".to_string(),
            });
        }

        if self.max_tree_nodes == Some(0) {
            return Err(ConfigError::InvalidField {
                field: "max_tree_nodes".to_string(),
                message: "node limit must be greater than zero".to_string(),
            });
        }

        if self.time_budget_ms == Some(0) {
            return Err(ConfigError::InvalidField {
                field: "time_budget_ms".to_string(),
                message: "time budget must be greater than zero".to_string(),
            });
        }

        Ok(())
    }
}
