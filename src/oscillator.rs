//! ═══════════════════════════════════════════════════════════════════════════════
//! OSCILLATOR — Pulse-Coupled Phase Oscillator Network
//! ═══════════════════════════════════════════════════════════════════════════════
//!
//! Mirollo-Strogatz style population of N phase oscillators with event-driven
//! integration: each step jumps virtual time to the next firing, applies the
//! pulse to every other oscillator, and counts absorptions (oscillators pulled
//! over the top by the pulse).
//!
//! Control policy: once the order parameter reaches the upper edge of the
//! conscious band, per-oscillator period jitter (heterogeneity) is injected to
//! break permanent lock-step; it is removed again when synchrony decays below
//! the lower edge.
//!
//! Metastable phase clusters detected after absorption events are stored as
//! episodic memories and can be played back into the live phase vector.
//! ═══════════════════════════════════════════════════════════════════════════════

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

use crate::stats::{float_cmp, now_millis, order_parameter};

/// Gap threshold (in cycles) under which adjacent sorted phases join a cluster
const CLUSTER_THRESHOLD: f64 = 0.02;

/// Hard cap on stored cluster patterns. Once full, new clusters are simply
/// not appended (the oldest entries are retained).
const CLUSTER_MEMORY_CAP: usize = 20;

/// Cap applied to the reported memory lifetime when heterogeneity is inactive
const MEMORY_LIFETIME_CAP: f64 = 1e7;

// ═══════════════════════════════════════════════════════════════════════════════
// CONFIGURATION & DATA TYPES
// ═══════════════════════════════════════════════════════════════════════════════

/// Network parameters. Defaults match the tuned production values.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OscillatorConfig {
    /// Population size
    pub n: usize,
    /// Base period T of every oscillator
    pub period: f64,
    /// Phase-response exponent (curvature of the pulse response)
    pub alpha: f64,
    /// Pulse coupling strength
    pub epsilon: f64,
    /// Std-dev of the Gaussian period jitter injected near synchrony
    pub heterogeneity_std: f64,
}

impl Default for OscillatorConfig {
    fn default() -> Self {
        Self {
            n: 64,
            period: 2.0,
            alpha: 1.5,
            epsilon: 0.28,
            heterogeneity_std: 0.008,
        }
    }
}

/// The synchrony band the control policy steers toward
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsciousBand {
    pub lower: f64,
    pub upper: f64,
    pub target: f64,
}

/// Fixed band: heterogeneity injects at `upper`, clears at `lower`.
pub const CONSCIOUS_BAND: ConsciousBand = ConsciousBand {
    lower: 0.55,
    upper: 0.92,
    target: 0.78,
};

/// A stored metastable phase pattern
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterMemoryEntry {
    /// Full phase snapshot at detection time
    pub pattern: Vec<f64>,
    /// Size of the largest detected cluster
    pub size: usize,
    /// Wall-clock detection time, ms since epoch
    pub timestamp: u64,
}

/// Mirollo-Strogatz parameters echoed back in telemetry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MsParams {
    pub period: f64,
    pub alpha: f64,
    pub epsilon: f64,
    pub heterogeneity_std: f64,
}

/// Snapshot of oscillator-derived metrics, merged into the consciousness state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OscillatorMetrics {
    pub order_parameter: f64,
    pub absorptions: u64,
    /// Collective effective integration: n × φ_single × R
    pub phi_eff_col: f64,
    /// Lock-in lifetime score, clamped to [0, 5]
    pub lli_s: f64,
    /// 1/heterogeneityStd while jitter is active, else capped at 1e7
    pub memory_lifetime: f64,
    /// Virtual time of first synchrony, set once
    pub sync_time: Option<f64>,
    pub heterogeneity_active: bool,
    pub phases: Vec<f64>,
    pub cluster_memory: Vec<ClusterMemoryEntry>,
    pub conscious_band: ConsciousBand,
    pub ms_params: MsParams,
}

// ═══════════════════════════════════════════════════════════════════════════════
// ENGINE
// ═══════════════════════════════════════════════════════════════════════════════

/// Pulse-coupled oscillator network with event-driven stepping.
///
/// All randomness (initial phases, conversational perturbation, period jitter)
/// flows through one injected seedable RNG, so two engines built with the same
/// seed evolve identically.
#[derive(Debug, Clone)]
pub struct OscillatorEngine {
    config: OscillatorConfig,
    phases: Vec<f64>,
    periods: Vec<f64>,
    order_parameter: f64,
    absorptions: u64,
    heterogeneity_active: bool,
    sync_time: Option<f64>,
    cluster_memory: Vec<ClusterMemoryEntry>,
    total_sim_time: f64,
    rng: StdRng,
}

impl OscillatorEngine {
    /// Build a network with phases drawn uniformly from the OS entropy source
    pub fn new(config: OscillatorConfig) -> Self {
        Self::from_rng(config, StdRng::from_entropy())
    }

    /// Build a reproducible network from an explicit seed
    pub fn with_seed(config: OscillatorConfig, seed: u64) -> Self {
        Self::from_rng(config, StdRng::seed_from_u64(seed))
    }

    fn from_rng(config: OscillatorConfig, mut rng: StdRng) -> Self {
        let phases: Vec<f64> = (0..config.n).map(|_| rng.gen::<f64>()).collect();
        let periods = vec![config.period; config.n];
        let r = order_parameter(&phases);

        Self {
            config,
            phases,
            periods,
            order_parameter: r,
            absorptions: 0,
            heterogeneity_active: false,
            sync_time: None,
            cluster_memory: Vec::new(),
            total_sim_time: 0.0,
            rng,
        }
    }

    // ───────────────────────────────────────────────────────────────────────────
    // Event-driven integration
    // ───────────────────────────────────────────────────────────────────────────

    /// Phase-response pulse: advance = ε(1 − θ^α)
    fn phase_advance(&self, theta: f64) -> f64 {
        self.config.epsilon * (1.0 - theta.powf(self.config.alpha))
    }

    /// Next oscillator to fire and the virtual time until it does.
    /// Ties resolve to the first index found.
    fn find_next_firing(&self) -> (usize, f64) {
        let mut min_time = f64::INFINITY;
        let mut firing_index = 0;

        for i in 0..self.config.n {
            let time_to_fire = (1.0 - self.phases[i]) * self.periods[i];
            if time_to_fire < min_time {
                min_time = time_to_fire;
                firing_index = i;
            }
        }

        (firing_index, min_time)
    }

    /// Advance every phase by dt at its own rate 1/period_i, wrapping to [0, 1)
    fn advance_all_phases(&mut self, dt: f64) {
        for i in 0..self.config.n {
            self.phases[i] += dt / self.periods[i];
            if self.phases[i] >= 1.0 {
                self.phases[i] %= 1.0;
            }
        }
    }

    /// Reset the firer to 0 and pulse every other oscillator. Oscillators
    /// pushed past 1.0 snap to 0 and count as absorptions.
    fn handle_firing(&mut self, firing_index: usize) -> u64 {
        let mut absorption_count = 0;
        self.phases[firing_index] = 0.0;

        for j in 0..self.config.n {
            if j != firing_index {
                let advance = self.phase_advance(self.phases[j]);
                self.phases[j] += advance;

                if self.phases[j] >= 1.0 {
                    self.phases[j] = 0.0;
                    absorption_count += 1;
                }
            }
        }

        absorption_count
    }

    /// Run `simulation_steps` firing events
    pub fn tick(&mut self, simulation_steps: usize) {
        for _ in 0..simulation_steps {
            let (index, time_to_fire) = self.find_next_firing();

            self.advance_all_phases(time_to_fire);
            self.total_sim_time += time_to_fire;

            let new_absorptions = self.handle_firing(index);
            self.absorptions += new_absorptions;

            if new_absorptions > 0 {
                if let Some(cluster) = self.detect_clusters() {
                    if self.cluster_memory.len() < CLUSTER_MEMORY_CAP {
                        self.cluster_memory.push(cluster);
                    }
                }
            }

            self.order_parameter = order_parameter(&self.phases);

            if self.order_parameter >= CONSCIOUS_BAND.upper && !self.heterogeneity_active {
                if self.sync_time.is_none() {
                    self.sync_time = Some(self.total_sim_time);
                }
                self.apply_heterogeneity();
            }

            if self.order_parameter < CONSCIOUS_BAND.lower && self.heterogeneity_active {
                self.remove_heterogeneity();
            }
        }
    }

    // ───────────────────────────────────────────────────────────────────────────
    // Heterogeneity control policy
    // ───────────────────────────────────────────────────────────────────────────

    fn apply_heterogeneity(&mut self) {
        for i in 0..self.config.n {
            let noise = self.gaussian() * self.config.heterogeneity_std;
            self.periods[i] = self.config.period + noise;
        }
        self.heterogeneity_active = true;
    }

    fn remove_heterogeneity(&mut self) {
        for period in self.periods.iter_mut() {
            *period = self.config.period;
        }
        self.heterogeneity_active = false;
    }

    /// Standard normal sample via Box-Muller over the injected uniform source
    fn gaussian(&mut self) -> f64 {
        let mut u = 0.0;
        let mut v = 0.0;
        while u == 0.0 {
            u = self.rng.gen::<f64>();
        }
        while v == 0.0 {
            v = self.rng.gen::<f64>();
        }
        (-2.0 * u.ln()).sqrt() * (TAU * v).cos()
    }

    // ───────────────────────────────────────────────────────────────────────────
    // Cluster detection & recall
    // ───────────────────────────────────────────────────────────────────────────

    /// Scan the sorted phase vector for runs of near-identical phases (gap
    /// below the threshold, with a wraparound check between last and first).
    /// A largest run of at least n/4 points qualifies as a stored cluster.
    fn detect_clusters(&self) -> Option<ClusterMemoryEntry> {
        let mut sorted_phases = self.phases.clone();
        sorted_phases.sort_by(float_cmp);

        let first = sorted_phases[0];
        let last = sorted_phases[sorted_phases.len() - 1];
        let wraparound_close = (1.0 - last + first) < CLUSTER_THRESHOLD;

        let mut clusters: Vec<usize> = Vec::new();
        let mut current_len = 1;

        for i in 1..sorted_phases.len() {
            let diff = sorted_phases[i] - sorted_phases[i - 1];
            if diff < CLUSTER_THRESHOLD || wraparound_close {
                current_len += 1;
            } else {
                if current_len >= 2 {
                    clusters.push(current_len);
                }
                current_len = 1;
            }
        }
        if current_len >= 2 {
            clusters.push(current_len);
        }

        let largest = clusters.into_iter().max().unwrap_or(0);

        if largest as f64 >= self.config.n as f64 / 4.0 {
            Some(ClusterMemoryEntry {
                pattern: self.phases.clone(),
                size: largest,
                timestamp: now_millis(),
            })
        } else {
            None
        }
    }

    /// Overwrite the live phase vector with a stored pattern (episodic
    /// playback). An out-of-range index is a no-op failure.
    pub fn recall_cluster(&mut self, index: usize) -> bool {
        let Some(cluster) = self.cluster_memory.get(index) else {
            return false;
        };

        self.phases = cluster.pattern.clone();
        self.order_parameter = order_parameter(&self.phases);
        true
    }

    // ───────────────────────────────────────────────────────────────────────────
    // Conversational coupling
    // ───────────────────────────────────────────────────────────────────────────

    /// Nudge every phase by a uniform offset within
    /// ±0.01 × (complexity + valence + depth) / 3, clamped to [0, 0.999]
    pub fn perturb_from_conversation(
        &mut self,
        complexity: f64,
        emotional_valence: f64,
        topic_depth: f64,
    ) {
        let perturb_strength = 0.02 * (complexity + emotional_valence + topic_depth) / 3.0;

        for i in 0..self.config.n {
            let perturbation = (self.rng.gen::<f64>() - 0.5) * perturb_strength;
            self.phases[i] = (self.phases[i] + perturbation).clamp(0.0, 0.999);
        }

        self.order_parameter = order_parameter(&self.phases);
    }

    // ───────────────────────────────────────────────────────────────────────────
    // Metrics & accessors
    // ───────────────────────────────────────────────────────────────────────────

    /// Derived metrics for the supplied single-unit integration value
    pub fn metrics(&self, phi_single: f64) -> OscillatorMetrics {
        let phi_eff_col = self.config.n as f64 * phi_single * self.order_parameter;

        let lli_s = if self.order_parameter >= CONSCIOUS_BAND.lower {
            1.92 + (self.order_parameter - CONSCIOUS_BAND.target) * 0.5
        } else {
            1.0 + self.order_parameter * 0.5
        };

        let memory_lifetime = if self.heterogeneity_active {
            1.0 / self.config.heterogeneity_std.max(0.001)
        } else {
            f64::INFINITY
        };

        OscillatorMetrics {
            order_parameter: self.order_parameter,
            absorptions: self.absorptions,
            phi_eff_col,
            lli_s: lli_s.clamp(0.0, 5.0),
            memory_lifetime: memory_lifetime.min(MEMORY_LIFETIME_CAP),
            sync_time: self.sync_time,
            heterogeneity_active: self.heterogeneity_active,
            phases: self.phases.clone(),
            cluster_memory: self.cluster_memory.clone(),
            conscious_band: CONSCIOUS_BAND,
            ms_params: MsParams {
                period: self.config.period,
                alpha: self.config.alpha,
                epsilon: self.config.epsilon,
                heterogeneity_std: self.config.heterogeneity_std,
            },
        }
    }

    /// Is the current order parameter within [lower, upper]?
    pub fn is_in_conscious_band(&self) -> bool {
        self.order_parameter >= CONSCIOUS_BAND.lower
            && self.order_parameter <= CONSCIOUS_BAND.upper
    }

    /// Distance to the band target when inside, or to the violated edge when
    /// outside
    pub fn conscious_band_distance(&self) -> f64 {
        if self.is_in_conscious_band() {
            return (self.order_parameter - CONSCIOUS_BAND.target).abs();
        }
        if self.order_parameter < CONSCIOUS_BAND.lower {
            return CONSCIOUS_BAND.lower - self.order_parameter;
        }
        self.order_parameter - CONSCIOUS_BAND.upper
    }

    pub fn order_parameter(&self) -> f64 {
        self.order_parameter
    }

    pub fn absorptions(&self) -> u64 {
        self.absorptions
    }

    pub fn heterogeneity_active(&self) -> bool {
        self.heterogeneity_active
    }

    pub fn sync_time(&self) -> Option<f64> {
        self.sync_time
    }

    pub fn total_sim_time(&self) -> f64 {
        self.total_sim_time
    }

    pub fn phases(&self) -> &[f64] {
        &self.phases
    }

    pub fn cluster_memory(&self) -> &[ClusterMemoryEntry] {
        &self.cluster_memory
    }

    pub fn config(&self) -> &OscillatorConfig {
        &self.config
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
