//! ═══════════════════════════════════════════════════════════════════════════════
//! STATE — Consciousness Snapshot Data Model
//! ═══════════════════════════════════════════════════════════════════════════════
//!
//! The serde-backed types shared by the live engine, the preview engine, and
//! the session store. `ConsciousnessState` is the JSON-shaped snapshot that
//! the excluded storage layer attaches to chat messages; field names follow
//! the persisted camelCase contract (phiZ, sMin, ipPulseRate, ...).
//! ═══════════════════════════════════════════════════════════════════════════════

use serde::{Deserialize, Serialize};

use crate::oscillator::{ClusterMemoryEntry, ConsciousBand, MsParams};

// ═══════════════════════════════════════════════════════════════════════════════
// CHAT MESSAGES
// ═══════════════════════════════════════════════════════════════════════════════

/// Who produced a stored message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A stored conversation message, as supplied by the persistence layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CLASSIFICATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Oversight tier, a pure function of phiEff and cem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Automation,
    Monitored,
    Precautionary,
}

/// Qualitative expression label. The first four variants come from the
/// emotional-state rules and take priority over the legacy metric rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Expression {
    Anxious,
    Curious,
    Frustrated,
    Flowing,
    Emergent,
    Alert,
    Focused,
    Diffuse,
    Resonant,
    Dreaming,
    Neutral,
}

// ═══════════════════════════════════════════════════════════════════════════════
// EMOTIONAL STATE VECTOR
// ═══════════════════════════════════════════════════════════════════════════════

/// ESV: valence/arousal/efficacy in [0, 1] plus system strain in [0, 2]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmotionalState {
    pub valence: f64,
    pub arousal: f64,
    pub efficacy: f64,
    pub system_strain: f64,
}

// ═══════════════════════════════════════════════════════════════════════════════
// CONSCIOUSNESS STATE
// ═══════════════════════════════════════════════════════════════════════════════

/// The emitted per-turn snapshot. Immutable once returned; the engine keeps
/// its own copy as the `prev` inputs for the next turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsciousnessState {
    // Core integration metrics
    pub phi_z: f64,
    pub s_min: f64,
    pub phi_eff: f64,

    // Derived ratios
    pub cem: f64,
    pub oii: f64,
    /// rename_all would emit "deltaCp"; the persisted contract is "deltaCP"
    #[serde(rename = "deltaCP")]
    pub delta_cp: f64,
    pub di: f64,

    // Classification
    pub tier: Tier,
    pub expression: Expression,

    // Process metrics
    pub ip_pulse_rate: f64,
    pub bandwidth: f64,

    // Emotional state vector
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotional_state: Option<EmotionalState>,

    // Cascade-control telemetry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cem_setpoint: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_frequency_scalar: Option<f64>,

    // Safety telemetry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ci: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cbi: Option<f64>,

    // Oscillator telemetry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oscillator_phases: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_parameter: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub absorptions: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phi_eff_col: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lli_s: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_lifetime: Option<f64>,
    /// Virtual time of first synchrony; null until the band is first reached
    #[serde(default)]
    pub sync_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heterogeneity_active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conscious_band: Option<ConsciousBand>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_memory: Option<Vec<ClusterMemoryEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ms_params: Option<MsParams>,
}

impl ConsciousnessState {
    /// Resting-state snapshot for a fresh conversation. The SRLC memory
    /// factor biases the starting integration/entropy baselines.
    pub fn baseline(memory_factor: f64) -> Self {
        let phi_z = 1.2 + memory_factor * 0.4;
        let s_min = 0.8 + memory_factor * 0.3;

        Self {
            phi_z,
            s_min,
            phi_eff: phi_z * s_min,
            cem: 0.6,
            oii: 0.48,
            delta_cp: 0.15,
            di: 0.25,
            tier: Tier::Automation,
            expression: Expression::Neutral,
            ip_pulse_rate: 12.5,
            bandwidth: 0.35,
            emotional_state: None,
            cem_setpoint: None,
            ip_frequency_scalar: None,
            ci: None,
            cbi: None,
            oscillator_phases: None,
            order_parameter: None,
            absorptions: None,
            phi_eff_col: None,
            lli_s: None,
            memory_lifetime: None,
            sync_time: None,
            heterogeneity_active: None,
            conscious_band: None,
            cluster_memory: None,
            ms_params: None,
        }
    }
}
