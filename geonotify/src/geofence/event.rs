//! Region transitions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Direction of a region boundary crossing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransitionKind {
    Enter,
    Exit,
}

impl fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransitionKind::Enter => write!(f, "Enter"),
            TransitionKind::Exit => write!(f, "Exit"),
        }
    }
}

impl FromStr for TransitionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "enter" => Ok(TransitionKind::Enter),
            "exit" => Ok(TransitionKind::Exit),
            other => Err(format!("unknown transition kind '{}'", other)),
        }
    }
}

/// Payload the OS hands to the background task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionTransition {
    pub region_id: String,
    pub kind: TransitionKind,
}

impl RegionTransition {
    pub fn new(region_id: impl Into<String>, kind: TransitionKind) -> Self {
        Self {
            region_id: region_id.into(),
            kind,
        }
    }

    /// Stamp the transition with the current wall-clock time.
    pub fn into_event(self) -> RegionEvent {
        RegionEvent {
            region_id: self.region_id,
            kind: self.kind,
            occurred_at_epoch_ms: chrono::Utc::now().timestamp_millis(),
        }
    }
}

/// A transition as observed by this process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionEvent {
    pub region_id: String,
    pub kind: TransitionKind,
    pub occurred_at_epoch_ms: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_wire_format() {
        assert_eq!(serde_json::to_string(&TransitionKind::Enter).unwrap(), "\"Enter\"");
        assert_eq!(serde_json::to_string(&TransitionKind::Exit).unwrap(), "\"Exit\"");
        assert_eq!("EXIT".parse::<TransitionKind>().unwrap(), TransitionKind::Exit);
        assert!("dwell".parse::<TransitionKind>().is_err());
    }

    #[test]
    fn test_into_event_keeps_identity() {
        let event = RegionTransition::new("kourion", TransitionKind::Enter).into_event();
        assert_eq!(event.region_id, "kourion");
        assert_eq!(event.kind, TransitionKind::Enter);
        assert!(event.occurred_at_epoch_ms > 0);
    }
}
