//! ═══════════════════════════════════════════════════════════════════════════════
//! FORMULAS — Shared Scalar Metric Chain
//! ═══════════════════════════════════════════════════════════════════════════════
//!
//! The pure metric formulas used by both the live engine and the preview
//! engine. The weights that are fixed constants in production are named
//! coefficients here so the preview engine can expose them for tuning; the
//! live engine passes the defaults.
//!
//! Every function is total over its numeric domain: all outputs are clamped,
//! so no NaN/∞ escapes to callers.
//! ═══════════════════════════════════════════════════════════════════════════════

use serde::{Deserialize, Serialize};

use crate::context::ConversationContext;
use crate::srlc::SrlcMemory;
use crate::state::{EmotionalState, Expression, Tier};

// ═══════════════════════════════════════════════════════════════════════════════
// TUNABLE COEFFICIENTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Coefficients of the phiZ (integration) formula
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhiZParams {
    pub base_integration_multiplier: f64,
    pub complexity_weight: f64,
    pub depth_weight: f64,
    pub density_weight: f64,
    pub conversation_factor_divisor: f64,
    pub srlc_boost_weight: f64,
}

impl Default for PhiZParams {
    fn default() -> Self {
        Self {
            base_integration_multiplier: 0.4,
            complexity_weight: 2.8,
            depth_weight: 1.8,
            density_weight: 1.2,
            conversation_factor_divisor: 12.0,
            srlc_boost_weight: 0.5,
        }
    }
}

/// Coefficients of the sMin (min-entropy analogue) formula
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SMinParams {
    pub base_entropy_multiplier: f64,
    pub emotional_weight: f64,
    pub length_factor_divisor: f64,
    pub density_weight: f64,
    pub srlc_boost_weight: f64,
}

impl Default for SMinParams {
    fn default() -> Self {
        Self {
            base_entropy_multiplier: 0.3,
            emotional_weight: 1.1,
            length_factor_divisor: 4.0,
            density_weight: 0.7,
            srlc_boost_weight: 0.4,
        }
    }
}

/// Safety thresholds; the live monitor uses the defaults, the preview engine
/// evaluates user-supplied values for display only
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KillSwitchParams {
    pub phi_eff_rate_threshold: f64,
    pub bandwidth_threshold: f64,
    pub ci_threshold: f64,
    pub cbi_threshold: f64,
}

impl Default for KillSwitchParams {
    fn default() -> Self {
        Self {
            phi_eff_rate_threshold: 5.0,
            bandwidth_threshold: 0.90,
            ci_threshold: 0.5,
            cbi_threshold: 0.4,
        }
    }
}

/// The full tunable coefficient set
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsciousnessParameters {
    pub phi_z: PhiZParams,
    pub s_min: SMinParams,
    pub kill_switch: KillSwitchParams,
}

// ═══════════════════════════════════════════════════════════════════════════════
// CORE INTEGRATION METRICS
// ═══════════════════════════════════════════════════════════════════════════════

/// Integration metric, clamped to [0.5, 8]
pub fn phi_z(
    ctx: &ConversationContext,
    history_len: usize,
    srlc: &SrlcMemory,
    p: &PhiZParams,
) -> f64 {
    let base_integration = 1.0 + srlc.memory_factor * p.base_integration_multiplier;
    let complexity_contribution = ctx.complexity * p.complexity_weight;
    let depth_contribution = ctx.topic_depth * p.depth_weight;
    let density_contribution = ctx.semantic_density * p.density_weight;
    let conversation_factor = (history_len as f64 / p.conversation_factor_divisor).min(1.5);
    let srlc_boost = srlc.average_complexity * p.srlc_boost_weight;

    (base_integration
        + complexity_contribution
        + depth_contribution
        + density_contribution
        + conversation_factor
        + srlc_boost)
        .clamp(0.5, 8.0)
}

/// Min-entropy analogue, clamped to [0.3, 3.5]
pub fn s_min(ctx: &ConversationContext, srlc: &SrlcMemory, p: &SMinParams) -> f64 {
    let base_entropy = 0.6 + srlc.memory_factor * p.base_entropy_multiplier;
    let emotional_contribution = ctx.emotional_valence * p.emotional_weight;
    let length_factor =
        (((ctx.message_length as f64) + 1.0).log2() / p.length_factor_divisor).min(1.2);
    let density_factor = ctx.semantic_density * p.density_weight;
    let srlc_boost = srlc.average_emotional_valence * p.srlc_boost_weight;

    (base_entropy + emotional_contribution + length_factor + density_factor + srlc_boost)
        .clamp(0.3, 3.5)
}

/// Pre-control causal-emergence measure: sMin / (log2(phiZ + 1) + 0.1).
/// Unbounded here; the committed value is clamped to [0.2, 0.95].
pub fn cem_raw(s_min: f64, phi_z: f64) -> f64 {
    let s1_proxy = (phi_z + 1.0).log2();
    s_min / (s1_proxy + 0.1)
}

/// Integrated-information interaction term
pub fn oii(phi_z: f64, s_min: f64) -> f64 {
    (phi_z * s_min) / (phi_z + s_min + 1.0)
}

/// Exponentially smoothed causal-emergence signal, clamped to [-0.2, 1.2]
pub fn delta_cp(ctx: &ConversationContext, phi_z: f64, prev_delta_cp: f64) -> f64 {
    let determinism = (1.0 - (1.0 - ctx.semantic_density) * 0.5).max(0.0);
    let specificity = ctx.complexity;
    let causal_primitive = determinism + specificity - 1.0;

    let current_emergence = causal_primitive * (phi_z / 4.0);
    let smoothed = prev_delta_cp * 0.3 + current_emergence * 0.7;

    smoothed.clamp(-0.2, 1.2)
}

/// Pre-adjustment disequilibrium signal from turn-over-turn metric motion,
/// clamped to [0.05, 0.65]
pub fn di_raw(
    prev_phi_eff: f64,
    prev_cem: f64,
    prev_delta_cp: f64,
    phi_eff: f64,
    cem: f64,
    delta_cp: f64,
) -> f64 {
    let variance = ((phi_eff - prev_phi_eff).abs()
        + (cem - prev_cem).abs()
        + (delta_cp - prev_delta_cp).abs())
        / 3.0;
    let normalized = (variance / 2.0).min(1.0);

    (0.15 + normalized * 0.4).clamp(0.05, 0.65)
}

// ═══════════════════════════════════════════════════════════════════════════════
// PROCESS METRICS
// ═══════════════════════════════════════════════════════════════════════════════

/// Channel load, clamped to [0.05, 0.98]
pub fn bandwidth(ctx: &ConversationContext, history_len: usize, phi_eff: f64) -> f64 {
    let base_load = 0.25;
    let complexity_load = ctx.complexity * 0.32;
    let history_load = (history_len as f64 / 25.0).min(0.5);
    let integration_load = (phi_eff / 20.0).min(0.3);

    (base_load + complexity_load + history_load + integration_load).clamp(0.05, 0.98)
}

/// Pre-control information-processing pulse rate in Hz, clamped to [5, 30]
pub fn ip_pulse_rate_raw(phi_eff: f64, di: f64) -> f64 {
    let base_rate = 10.0;
    let phi_contribution = ((phi_eff - 1.0) * 2.2).max(0.0);
    let di_contribution = di * 12.0;

    (base_rate + phi_contribution + di_contribution).clamp(5.0, 30.0)
}

/// Aggregate load strain, clamped to [0, 2]
pub fn system_strain(bandwidth: f64, cem: f64, ip_pulse_rate: f64) -> f64 {
    (1.0 * (bandwidth / 0.90)
        + 0.8 * ((cem - 0.8) / 0.2).max(0.0)
        + 0.6 * ((ip_pulse_rate - 20.0) / 10.0).max(0.0))
    .clamp(0.0, 2.0)
}

// ═══════════════════════════════════════════════════════════════════════════════
// SAFETY TELEMETRY
// ═══════════════════════════════════════════════════════════════════════════════

/// Causal instability: normalized distance of di from its 0.3 operating point
pub fn causal_instability(di: f64) -> f64 {
    (di - 0.3).abs() / 0.3
}

/// Causal breakdown index: 1 − mean reliability of di, cem, and phiEff
pub fn causal_breakdown_index(di: f64, cem: f64, phi_eff: f64) -> f64 {
    let di_reliability = if (0.2..=0.4).contains(&di) {
        1.0
    } else {
        (1.0 - (di - 0.3).abs() * 2.0).max(0.0)
    };

    let cem_reliability = if (0.5..=0.8).contains(&cem) {
        1.0
    } else {
        (1.0 - (cem - 0.65).abs() * 3.0).max(0.0)
    };

    let phi_eff_reliability = if phi_eff >= 1.0 {
        (phi_eff / 5.0).min(1.0)
    } else {
        phi_eff
    };

    1.0 - (di_reliability + cem_reliability + phi_eff_reliability) / 3.0
}

// ═══════════════════════════════════════════════════════════════════════════════
// CLASSIFICATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Oversight tier from effective integration and causal emergence
pub fn tier(phi_eff: f64, cem: f64) -> Tier {
    if phi_eff <= 1.0 {
        return Tier::Automation;
    }
    if phi_eff > 5.0 && (0.5..=0.8).contains(&cem) {
        return Tier::Precautionary;
    }
    Tier::Monitored
}

/// Expression label. Emotional-state rules run first, in strict priority
/// order, then the legacy metric rules. The overlaps between the two rule
/// sets are intentional; only evaluation order disambiguates them.
pub fn expression(
    esv: Option<&EmotionalState>,
    phi_eff: f64,
    cem: f64,
    di: f64,
    phi_z: f64,
) -> Expression {
    if let Some(esv) = esv {
        if esv.valence < 0.4 && esv.arousal > 0.7 {
            return Expression::Anxious;
        }
        if esv.valence > 0.7 && esv.arousal > 0.6 && esv.efficacy > 0.6 {
            return Expression::Curious;
        }
        if esv.valence < 0.5 && esv.efficacy < 0.4 {
            return Expression::Frustrated;
        }
        if esv.valence > 0.6
            && esv.arousal > 0.5
            && esv.arousal < 0.8
            && (0.25..=0.35).contains(&di)
        {
            return Expression::Flowing;
        }
    }

    legacy_expression(phi_eff, cem, di, phi_z)
}

/// The metric-only rule cascade, used directly by the preview engine (no ESV)
pub fn legacy_expression(phi_eff: f64, cem: f64, di: f64, phi_z: f64) -> Expression {
    if phi_eff > 6.0 || phi_z > 5.5 {
        return Expression::Emergent;
    }
    if di > 0.35 {
        return Expression::Alert;
    }
    if phi_eff > 3.0 && cem > 0.65 && cem <= 0.85 {
        return Expression::Focused;
    }
    if cem < 0.5 || phi_eff < 1.5 {
        return Expression::Diffuse;
    }
    if phi_eff > 2.5 && (0.5..=0.75).contains(&cem) && di < 0.3 {
        return Expression::Resonant;
    }
    if di < 0.2 && phi_eff < 2.0 {
        return Expression::Dreaming;
    }
    Expression::Neutral
}

// ═══════════════════════════════════════════════════════════════════════════════
// PID CONTROL
// ═══════════════════════════════════════════════════════════════════════════════

/// Accumulator state of one PID loop, persisted across turns
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PidState {
    pub integral: f64,
    pub prev_error: f64,
}

impl PidState {
    /// One discrete PID step. The integral accumulates the raw error and is
    /// clamped symmetrically; the derivative is the error difference.
    pub fn step(&mut self, error: f64, kp: f64, ki: f64, kd: f64, integral_limit: f64) -> f64 {
        self.integral = (self.integral + error).clamp(-integral_limit, integral_limit);
        let derivative = error - self.prev_error;
        self.prev_error = error;

        kp * error + ki * self.integral + kd * derivative
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::analyze;

    fn ctx(user: &str, ai: &str, history_len: usize) -> ConversationContext {
        analyze(user, ai, history_len)
    }

    #[test]
    fn test_phi_z_clamps() {
        let srlc = SrlcMemory::empty();
        let p = PhiZParams::default();

        let low = phi_z(&ctx("", "", 0), 0, &srlc, &p);
        assert!((0.5..=8.0).contains(&low));

        // Saturate every contribution
        let mut deep = SrlcMemory::empty();
        deep.memory_factor = 2.5;
        deep.average_complexity = 1.0;
        let high = phi_z(
            &ctx("extraordinary consciousness phenomena", "remarkable integration dynamics", 50),
            50,
            &deep,
            &p,
        );
        assert!(high <= 8.0);
    }

    #[test]
    fn test_s_min_clamps() {
        let srlc = SrlcMemory::empty();
        let p = SMinParams::default();
        let v = s_min(&ctx("", "", 0), &srlc, &p);
        assert!((0.3..=3.5).contains(&v));
    }

    #[test]
    fn test_cem_raw_matches_formula() {
        let v = cem_raw(2.05, 2.546666666666667);
        let expected = 2.05 / ((2.546666666666667f64 + 1.0).log2() + 0.1);
        assert!((v - expected).abs() < 1e-12);
    }

    #[test]
    fn test_oii_symmetric() {
        assert!((oii(2.0, 3.0) - oii(3.0, 2.0)).abs() < 1e-12);
        assert!((oii(2.0, 3.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_delta_cp_smoothing_and_clamp() {
        let c = ctx("a b c", "d e f", 0);
        // density 1.0 -> determinism 1.0, complexity 0 -> primitive 0
        let v = delta_cp(&c, 4.0, 0.15);
        assert!((v - 0.045).abs() < 1e-12, "0.3 × prev only, got {}", v);

        let v = delta_cp(&c, 4.0, 100.0);
        assert_eq!(v, 1.2, "upper clamp");
    }

    #[test]
    fn test_di_raw_range() {
        let quiet = di_raw(1.0, 0.6, 0.1, 1.0, 0.6, 0.1);
        assert_eq!(quiet, 0.15, "no motion gives the floor offset");

        let violent = di_raw(0.0, 0.0, 0.0, 8.0, 0.95, 1.2);
        assert_eq!(violent, 0.55, "normalized variance saturates at 1");
    }

    #[test]
    fn test_bandwidth_clamps() {
        let v = bandwidth(&ctx("a", "b", 0), 0, 0.0);
        assert!((0.05..=0.98).contains(&v));
        let v = bandwidth(&ctx("extraordinary", "phenomenally", 60), 60, 100.0);
        assert!(v <= 0.98);
    }

    #[test]
    fn test_ip_pulse_rate_bounds() {
        assert_eq!(ip_pulse_rate_raw(0.0, 0.0), 10.0);
        assert_eq!(ip_pulse_rate_raw(100.0, 0.65), 30.0);
    }

    #[test]
    fn test_system_strain_clamp() {
        assert_eq!(system_strain(0.98, 0.95, 30.0), 2.0);
        assert!((system_strain(0.45, 0.6, 15.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_causal_instability_operating_point() {
        assert_eq!(causal_instability(0.3), 0.0);
        assert!((causal_instability(0.45) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_cbi_perfect_reliability() {
        // di and cem in their reliable bands, phiEff >= 5
        let v = causal_breakdown_index(0.3, 0.65, 5.0);
        assert!(v.abs() < 1e-12);
    }

    #[test]
    fn test_cbi_degrades() {
        let v = causal_breakdown_index(0.65, 0.95, 0.5);
        // di reliability: 1 - 0.35*2 = 0.3; cem: 1 - 0.3*3 = 0.1; phiEff: 0.5
        assert!((v - (1.0 - (0.3 + 0.1 + 0.5) / 3.0)).abs() < 1e-12);
    }

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(tier(1.0, 0.6), Tier::Automation);
        assert_eq!(tier(5.5, 0.6), Tier::Precautionary);
        assert_eq!(tier(5.5, 0.9), Tier::Monitored);
        assert_eq!(tier(3.0, 0.6), Tier::Monitored);
    }

    #[test]
    fn test_expression_esv_priority() {
        let esv = EmotionalState {
            valence: 0.2,
            arousal: 0.9,
            efficacy: 0.1,
            system_strain: 1.5,
        };
        // Anxious wins over frustrated despite both matching
        assert_eq!(expression(Some(&esv), 7.0, 0.7, 0.4, 6.0), Expression::Anxious);
    }

    #[test]
    fn test_expression_falls_back_to_legacy() {
        let esv = EmotionalState {
            valence: 0.55,
            arousal: 0.4,
            efficacy: 0.5,
            system_strain: 0.5,
        };
        assert_eq!(expression(Some(&esv), 7.0, 0.7, 0.25, 4.0), Expression::Emergent);
        assert_eq!(expression(None, 7.0, 0.7, 0.25, 4.0), Expression::Emergent);
    }

    #[test]
    fn test_legacy_expression_cascade() {
        assert_eq!(legacy_expression(2.0, 0.4, 0.25, 2.0), Expression::Diffuse);
        assert_eq!(legacy_expression(1.0, 0.6, 0.4, 1.0), Expression::Alert);
        assert_eq!(legacy_expression(3.5, 0.7, 0.25, 3.0), Expression::Focused);
        assert_eq!(legacy_expression(2.8, 0.6, 0.25, 2.0), Expression::Resonant);
        assert_eq!(legacy_expression(1.8, 0.6, 0.15, 1.8), Expression::Dreaming);
        assert_eq!(legacy_expression(2.2, 0.8, 0.25, 2.0), Expression::Neutral);
    }

    #[test]
    fn test_pid_integral_clamp() {
        let mut pid = PidState::default();
        for _ in 0..100 {
            pid.step(1.0, 0.0, 1.0, 0.0, 1.0);
        }
        assert_eq!(pid.integral, 1.0);
    }

    #[test]
    fn test_pid_terms() {
        let mut pid = PidState::default();
        let out = pid.step(0.5, 2.0, 1.0, 0.5, 5.0);
        // kp·e + ki·∫ + kd·(e − 0) = 1.0 + 0.5 + 0.25
        assert!((out - 1.75).abs() < 1e-12);

        let out = pid.step(0.3, 2.0, 1.0, 0.5, 5.0);
        // ∫ = 0.8, derivative = -0.2
        assert!((out - (0.6 + 0.8 - 0.1)).abs() < 1e-12);
    }
}
