//! ═══════════════════════════════════════════════════════════════════════════════
//! ERROR — Unified Engine Error Type
//! ═══════════════════════════════════════════════════════════════════════════════
//!
//! One error enum for everything the engine can fail with. Kill-switch
//! refusals are ordinary errors, not panics: callers decide whether a halted
//! conversation gets reset or disposed.
//! ═══════════════════════════════════════════════════════════════════════════════

use std::error::Error;
use std::fmt;

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Debug)]
pub enum EngineError {
    /// The engine is already halted; no update was attempted
    KillSwitchTripped,
    /// This turn's signals tripped the monitor; the turn was discarded
    KillSwitchTriggered { criteria_met: usize },
    /// Snapshot (de)serialization failure
    Json(serde_json::Error),
    /// Invariant violation inside the engine itself
    Internal(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KillSwitchTripped => {
                write!(f, "kill switch is tripped; reset required before further updates")
            }
            Self::KillSwitchTriggered { criteria_met } => {
                write!(
                    f,
                    "kill switch triggered: {} safety criteria exceeded",
                    criteria_met
                )
            }
            Self::Json(e) => write!(f, "snapshot serialization failed: {}", e),
            Self::Internal(msg) => write!(f, "internal engine error: {}", msg),
        }
    }
}

impl Error for EngineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}
