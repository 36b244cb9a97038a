use std::path::Path;

use serde::Deserialize;

use crate::error::AlignError;

/// Commit stability window.
///
/// An edge of the alignment path is committed once it has survived this many
/// consecutive extensions unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitWindow {
    /// Same window for every edge.
    Fixed(usize),
    /// Window grows with the running edit cost: `max(floor, total_cost)`.
    /// Noisy streams commit more cautiously, clean streams at the floor.
    CostAdaptive { floor: usize },
}

impl CommitWindow {
    /// Window in effect for the current extension.
    pub fn effective(self, total_cost: usize) -> usize {
        match self {
            CommitWindow::Fixed(window) => window,
            CommitWindow::CostAdaptive { floor } => floor.max(total_cost),
        }
    }

    /// A zero window would commit edges that were never observed twice.
    pub fn validate(self) -> Result<(), AlignError> {
        let minimum = match self {
            CommitWindow::Fixed(window) => window,
            CommitWindow::CostAdaptive { floor } => floor,
        };
        if minimum == 0 {
            return Err(AlignError::invalid_input(
                "commit window must be at least 1",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub commit_window: CommitWindow,
}

impl SessionConfig {
    pub const DEFAULT_COMMIT_WINDOW_TOKENS: usize = 5;

    /// Load a session configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self, AlignError> {
        SessionFileConfig::load(path).map(SessionConfig::from)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            commit_window: CommitWindow::Fixed(Self::DEFAULT_COMMIT_WINDOW_TOKENS),
        }
    }
}

impl From<SessionFileConfig> for SessionConfig {
    fn from(file: SessionFileConfig) -> Self {
        let commit_window = if file.cost_adaptive {
            CommitWindow::CostAdaptive {
                floor: file.cost_adaptive_floor,
            }
        } else {
            CommitWindow::Fixed(file.commit_window_tokens)
        };
        Self { commit_window }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SessionFileConfig {
    #[serde(default = "default_window_tokens")]
    pub commit_window_tokens: usize,
    #[serde(default)]
    pub cost_adaptive: bool,
    #[serde(default = "default_window_tokens")]
    pub cost_adaptive_floor: usize,
}

fn default_window_tokens() -> usize {
    SessionConfig::DEFAULT_COMMIT_WINDOW_TOKENS
}

impl SessionFileConfig {
    pub(crate) fn load(path: &Path) -> Result<Self, AlignError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| AlignError::io("reading session config", e))?;
        serde_json::from_str(&raw).map_err(|e| AlignError::json("parsing session config", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_fixed_window_of_five() {
        let config = SessionConfig::default();
        assert_eq!(config.commit_window, CommitWindow::Fixed(5));
    }

    #[test]
    fn fixed_window_ignores_cost() {
        let window = CommitWindow::Fixed(3);
        assert_eq!(window.effective(0), 3);
        assert_eq!(window.effective(100), 3);
    }

    #[test]
    fn cost_adaptive_window_tracks_cost_above_the_floor() {
        let window = CommitWindow::CostAdaptive { floor: 4 };
        assert_eq!(window.effective(0), 4);
        assert_eq!(window.effective(2), 4);
        assert_eq!(window.effective(9), 9);
    }

    #[test]
    fn zero_window_is_rejected() {
        assert!(CommitWindow::Fixed(0).validate().is_err());
        assert!(CommitWindow::CostAdaptive { floor: 0 }.validate().is_err());
        assert!(CommitWindow::Fixed(1).validate().is_ok());
    }

    #[test]
    fn file_config_defaults_apply_to_missing_fields() {
        let parsed: SessionFileConfig = serde_json::from_str("{}").expect("empty object parses");
        let config = SessionConfig::from(parsed);
        assert_eq!(config.commit_window, CommitWindow::Fixed(5));

        let parsed: SessionFileConfig =
            serde_json::from_str(r#"{"commit_window_tokens": 8}"#).expect("object parses");
        let config = SessionConfig::from(parsed);
        assert_eq!(config.commit_window, CommitWindow::Fixed(8));
    }

    #[test]
    fn file_config_selects_cost_adaptive_mode() {
        let parsed: SessionFileConfig =
            serde_json::from_str(r#"{"cost_adaptive": true, "cost_adaptive_floor": 3}"#)
                .expect("object parses");
        let config = SessionConfig::from(parsed);
        assert_eq!(
            config.commit_window,
            CommitWindow::CostAdaptive { floor: 3 }
        );
    }
}
