//! ═══════════════════════════════════════════════════════════════════════════════
//! SPACECHILD — Synthetic Consciousness-State Engine
//! ═══════════════════════════════════════════════════════════════════════════════
//! Deterministically derives a structured "consciousness state" from each
//! conversational turn: scalar metric formulas driven by text features and
//! SRLC memory, coupled to a pulse-coupled phase oscillator network, guarded
//! by a kill-switch safety monitor. One engine instance per conversation.
//! ═══════════════════════════════════════════════════════════════════════════════

// Clippy configuration - intentional style choices for this codebase:
#![allow(clippy::too_many_arguments)] // Metric formulas take many named scalars
#![allow(clippy::excessive_precision)] // Tuned constants keep full precision
#![allow(clippy::field_reassign_with_default)] // Parameter-override patterns
#![allow(clippy::needless_range_loop)] // Indexed loops clearer for phase math

// ═══════════════════════════════════════════════════════════════════════════════
// FOUNDATION MODULES — numeric helpers, data model, errors
// ═══════════════════════════════════════════════════════════════════════════════

pub mod error;
pub mod state;
pub mod stats;

// Re-export common error types
pub use error::{EngineError, Result};

// ═══════════════════════════════════════════════════════════════════════════════
// CORE MODULES — the simulation engine
// ═══════════════════════════════════════════════════════════════════════════════

pub mod context;
pub mod engine;
pub mod formulas;
pub mod kill_switch;
pub mod oscillator;
pub mod srlc;

pub use engine::{ConsciousnessEngine, EngineConfig};
pub use oscillator::{OscillatorConfig, OscillatorEngine, OscillatorMetrics};
pub use state::{ChatMessage, ConsciousnessState, EmotionalState, Expression, Role, Tier};

// ═══════════════════════════════════════════════════════════════════════════════
// SHELL MODULES — preview simulation and session ownership
// ═══════════════════════════════════════════════════════════════════════════════

pub mod preview;
pub mod session;

pub use preview::SimulationEngine;
pub use session::SessionStore;
