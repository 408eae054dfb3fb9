use crate::state::ApplyError;
use thiserror::Error;

/// Failures that end a move selection or a single sample's search.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    #[error("no player is to move in the root position")]
    NoPlayerToMove,
    #[error("position offers no legal actions before the hand is over")]
    NoLegalActions,
    #[error("hand is already over")]
    HandOver,
    #[error("forced step offered no action to apply")]
    MissingForcedAction,
    #[error("state rejected an action during search: {0}")]
    Apply(#[from] ApplyError),
    #[error("search tree reached the node limit of {limit}")]
    NodeLimit { limit: usize },
    #[error("search deadline elapsed after {elapsed_ms} ms")]
    DeadlineElapsed { elapsed_ms: u64 },
    #[error("search tree has no decision below its root")]
    EmptyTree,
}

impl SearchError {
    /// Budget errors stop sampling but still allow a vote over finished samples.
    pub fn is_budget(&self) -> bool {
        matches!(
            self,
            SearchError::NodeLimit { .. } | SearchError::DeadlineElapsed { .. }
        )
    }
}

/// Validation failures for [`EnsembleConfig`](crate::config::EnsembleConfig).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{field}: {message}")]
    InvalidField { field: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_limits_count_as_budget_errors() {
        assert!(SearchError::NodeLimit { limit: 4 }.is_budget());
        assert!(SearchError::DeadlineElapsed { elapsed_ms: 9 }.is_budget());
        assert!(!SearchError::NoLegalActions.is_budget());
        assert!(!SearchError::Apply(ApplyError::illegal(3)).is_budget());
    }
}
