//! Lifecycle status (reported by the server) and behavioral state
//! (owned by the motion scheduler).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse externally reported state of a worker.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleStatus {
    /// Waiting for work.
    #[default]
    Idle,
    /// Doing work.
    Active,
    /// Finished.
    Complete,
    /// Failed.
    Error,
}

impl LifecycleStatus {
    /// Statuses that send an agent to the retirement landmark.
    pub fn is_resting(self) -> bool {
        matches!(self, Self::Idle | Self::Complete | Self::Error)
    }

    /// Statuses that hide an agent once it reaches the retirement landmark.
    ///
    /// `Error` agents stay visible so the error overlay can be seen.
    pub fn hides_in_retirement(self) -> bool {
        matches!(self, Self::Idle | Self::Complete)
    }

    /// Lowercase wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Active => "active",
            Self::Complete => "complete",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for LifecycleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Local behavioral state of an agent's sprite.
///
/// The error overlay is not a state: it is derived from
/// [`LifecycleStatus::Error`] at snapshot time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BehaviorState {
    /// Standing around, possibly wandering.
    #[default]
    Idle,
    /// Following a path.
    Walking,
    /// Settled at the target landmark while active.
    Working,
    /// Time-boxed reaction to posting a message.
    Posting,
    /// Time-boxed reaction to reading messages.
    Reading,
}

impl BehaviorState {
    /// Whether the state is one of the time-boxed dwell states.
    pub fn is_dwelling(self) -> bool {
        matches!(self, Self::Posting | Self::Reading)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resting_statuses() {
        assert!(LifecycleStatus::Idle.is_resting());
        assert!(LifecycleStatus::Complete.is_resting());
        assert!(LifecycleStatus::Error.is_resting());
        assert!(!LifecycleStatus::Active.is_resting());
    }

    #[test]
    fn error_agents_are_not_hidden() {
        assert!(!LifecycleStatus::Error.hides_in_retirement());
        assert!(LifecycleStatus::Complete.hides_in_retirement());
    }

    #[test]
    fn status_wire_names() {
        let s: LifecycleStatus = serde_json::from_str("\"complete\"").unwrap();
        assert_eq!(s, LifecycleStatus::Complete);
        assert_eq!(serde_json::to_string(&BehaviorState::Posting).unwrap(), "\"posting\"");
        assert!(serde_json::from_str::<LifecycleStatus>("\"running\"").is_err());
    }
}
