use detmin_core::{EnsembleConfig, EnsemblePlayer, GameState, LifetimeStats, SearchError};
use detmin_pegging::{PegAction, PeggingState};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::Deserialize;
use thiserror::Error;

use crate::config::{AgentConfig, AgentKind};

/// What an agent chose and what it cost.
#[derive(Debug, Clone, Copy)]
pub struct Decision {
    pub action: PegAction,
    pub samples: usize,
    pub repaired_samples: usize,
    pub truncated: bool,
}

impl Decision {
    fn plain(action: PegAction) -> Self {
        Self {
            action,
            samples: 0,
            repaired_samples: 0,
            truncated: false,
        }
    }
}

/// A seat's decision maker for one hand.
pub trait Policy {
    fn choose(&mut self, state: &PeggingState, rng: &mut StdRng) -> Result<Decision, AgentError>;

    fn lifetime(&self) -> Option<LifetimeStats> {
        None
    }
}

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("invalid ensemble parameter for agent '{name}': {message}")]
    InvalidEnsembleParam { name: String, message: String },
    #[error("agent '{name}' could not choose a move: {source}")]
    Search {
        name: String,
        #[source]
        source: SearchError,
    },
    #[error("agent '{name}' was asked to move with no legal action")]
    NoLegalAction { name: String },
}

pub struct AgentBlueprint {
    pub name: String,
    implementation: AgentImplementation,
}

enum AgentImplementation {
    Ensemble(EnsembleOptions),
    Greedy,
    Random,
}

impl AgentBlueprint {
    pub fn from_configs(configs: &[AgentConfig]) -> Result<Vec<Self>, AgentError> {
        configs.iter().map(Self::from_config).collect()
    }

    pub fn from_config(config: &AgentConfig) -> Result<Self, AgentError> {
        let implementation = match config.kind {
            AgentKind::Ensemble => AgentImplementation::Ensemble(EnsembleOptions::from_params(
                &config.name,
                &config.params,
            )?),
            AgentKind::Greedy => AgentImplementation::Greedy,
            AgentKind::Random => AgentImplementation::Random,
        };

        Ok(Self {
            name: config.name.clone(),
            implementation,
        })
    }

    pub fn spawn_policy(&self) -> Result<Box<dyn Policy>, AgentError> {
        Ok(match &self.implementation {
            AgentImplementation::Ensemble(opts) => Box::new(EnsemblePolicy {
                name: self.name.clone(),
                player: opts.player(&self.name)?,
                parallel: opts.parallel,
            }),
            AgentImplementation::Greedy => Box::new(GreedyPolicy {
                name: self.name.clone(),
            }),
            AgentImplementation::Random => Box::new(RandomPolicy {
                name: self.name.clone(),
            }),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct EnsembleOptions {
    #[serde(flatten)]
    config: EnsembleConfig,
    parallel: bool,
}

impl EnsembleOptions {
    fn from_params(name: &str, params: &serde_yaml::Value) -> Result<Self, AgentError> {
        if params.is_null() {
            return Ok(Self::default());
        }
        if !params.is_mapping() {
            return Err(AgentError::InvalidEnsembleParam {
                name: name.to_string(),
                message: "expected mapping for ensemble params".to_string(),
            });
        }

        let options: Self = serde_yaml::from_value(params.clone()).map_err(|err| {
            AgentError::InvalidEnsembleParam {
                name: name.to_string(),
                message: err.to_string(),
            }
        })?;
        options.player(name)?;
        Ok(options)
    }

    fn player(&self, name: &str) -> Result<EnsemblePlayer, AgentError> {
        EnsemblePlayer::new(self.config.clone()).map_err(|err| AgentError::InvalidEnsembleParam {
            name: name.to_string(),
            message: err.to_string(),
        })
    }
}

struct EnsemblePolicy {
    name: String,
    player: EnsemblePlayer,
    parallel: bool,
}

impl Policy for EnsemblePolicy {
    fn choose(&mut self, state: &PeggingState, rng: &mut StdRng) -> Result<Decision, AgentError> {
        let outcome = if self.parallel {
            self.player.select_parallel(state, rng)
        } else {
            self.player.select(state, rng)
        }
        .map_err(|source| AgentError::Search {
            name: self.name.clone(),
            source,
        })?;

        Ok(Decision {
            action: outcome.action,
            samples: outcome.total_samples,
            repaired_samples: outcome.repaired_samples,
            truncated: outcome.truncated,
        })
    }

    fn lifetime(&self) -> Option<LifetimeStats> {
        Some(self.player.lifetime())
    }
}

/// Takes the move with the best immediate pegging swing; the first such move on ties.
struct GreedyPolicy {
    name: String,
}

impl Policy for GreedyPolicy {
    fn choose(&mut self, state: &PeggingState, _rng: &mut StdRng) -> Result<Decision, AgentError> {
        let seat = state
            .player_to_move()
            .ok_or_else(|| AgentError::NoLegalAction {
                name: self.name.clone(),
            })?;

        let mut best: Option<(PegAction, i32)> = None;
        for action in state.actions() {
            let Ok(next) = state.apply_action(action) else {
                continue;
            };
            let swing = next.hand_point_diff(seat);
            if best.is_none_or(|(_, top)| swing > top) {
                best = Some((action, swing));
            }
        }

        best.map(|(action, _)| Decision::plain(action))
            .ok_or_else(|| AgentError::NoLegalAction {
                name: self.name.clone(),
            })
    }
}

struct RandomPolicy {
    name: String,
}

impl Policy for RandomPolicy {
    fn choose(&mut self, state: &PeggingState, rng: &mut StdRng) -> Result<Decision, AgentError> {
        state
            .actions()
            .choose(rng)
            .copied()
            .map(Decision::plain)
            .ok_or_else(|| AgentError::NoLegalAction {
                name: self.name.clone(),
            })
    }
}
