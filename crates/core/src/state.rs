//! Persisted alert configuration and recipient tracking.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Threshold alert configuration. At most one is active per process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertConfig {
    /// Notify when the best available APY reaches this percentage.
    pub threshold: f64,
    /// Whether the alert is armed.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl AlertConfig {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            enabled: true,
        }
    }
}

/// Process-wide persisted state.
///
/// Recipients are Telegram chat ids accumulated as users interact with
/// the bot; persisting them keeps alert fan-out across restarts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct State {
    /// Active alert, if any.
    pub alert: Option<AlertConfig>,
    /// Chat ids that receive alert notifications.
    #[serde(default)]
    pub recipients: BTreeSet<i64>,
}

impl State {
    /// True when an alert is configured and enabled.
    pub fn armed(&self) -> bool {
        self.alert.as_ref().is_some_and(|a| a.enabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_state_is_idle() {
        let state = State::default();
        assert!(!state.armed());
        assert!(state.recipients.is_empty());
    }

    #[test]
    fn test_armed_requires_enabled() {
        let mut state = State {
            alert: Some(AlertConfig::new(12.0)),
            ..Default::default()
        };
        assert!(state.armed());

        state.alert.as_mut().unwrap().enabled = false;
        assert!(!state.armed());
    }

    #[test]
    fn test_state_round_trip() {
        let mut state = State {
            alert: Some(AlertConfig {
                threshold: 12.5,
                enabled: true,
            }),
            ..Default::default()
        };
        state.recipients.insert(42);

        let json = serde_json::to_string(&state).unwrap();
        let parsed: State = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, state);
    }

    #[test]
    fn test_legacy_file_without_recipients_loads() {
        let parsed: State =
            serde_json::from_str(r#"{"alert":{"threshold":8.0,"enabled":true}}"#).unwrap();
        assert_eq!(parsed.alert, Some(AlertConfig::new(8.0)));
        assert!(parsed.recipients.is_empty());
    }
}
