//! ═══════════════════════════════════════════════════════════════════════════════
//! STATS — Numeric Primitives for Phase and Metric Processing
//! ═══════════════════════════════════════════════════════════════════════════════
//!
//! Small shared helpers:
//! - Total ordering for f64 slices (phase sorting in cluster detection)
//! - Circular order parameter (Kuramoto R) over phases in [0, 1)
//! - Wall-clock millisecond timestamps for cluster memory entries
//! ═══════════════════════════════════════════════════════════════════════════════

use std::cmp::Ordering;
use std::f64::consts::TAU;
use std::time::{SystemTime, UNIX_EPOCH};

/// Total-order comparator for f64 values. NaN never occurs in phase space
/// (every producer clamps), so ties resolve as Equal.
pub fn float_cmp(a: &f64, b: &f64) -> Ordering {
    a.partial_cmp(b).unwrap_or(Ordering::Equal)
}

/// Circular-mean magnitude of phases expressed in cycles ([0, 1) each).
/// R = |mean_j exp(2πi·θ_j)|; 1.0 means full synchrony, 0.0 incoherence.
pub fn order_parameter(phases: &[f64]) -> f64 {
    if phases.is_empty() {
        return 0.0;
    }

    let mut real_sum = 0.0;
    let mut imag_sum = 0.0;
    for &theta in phases {
        let angle = TAU * theta;
        real_sum += angle.cos();
        imag_sum += angle.sin();
    }

    real_sum /= phases.len() as f64;
    imag_sum /= phases.len() as f64;

    (real_sum * real_sum + imag_sum * imag_sum).sqrt()
}

/// Milliseconds since the Unix epoch, for timestamping stored cluster patterns.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
