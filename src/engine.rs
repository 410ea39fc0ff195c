//! ═══════════════════════════════════════════════════════════════════════════════
//! ENGINE — Consciousness Metric Engine
//! ═══════════════════════════════════════════════════════════════════════════════
//!
//! The per-turn state update: chains the feature extractor, SRLC memory, and
//! oscillator network through the fixed formula sequence, runs the two PID
//! control loops and the adaptive-tuning multiplier, and lets the kill-switch
//! monitor veto the commit.
//!
//! One engine instance per conversation. A turn either commits a complete new
//! snapshot or fails without committing anything (the sticky kill-switch
//! counter and the already-appended history are the only survivors of a
//! failed turn).
//! ═══════════════════════════════════════════════════════════════════════════════

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Instant;

use crate::context::{self, ConversationContext};
use crate::error::{EngineError, Result};
use crate::formulas::{self, ConsciousnessParameters, PidState};
use crate::kill_switch::{KillSwitchMonitor, Verdict};
use crate::oscillator::{OscillatorConfig, OscillatorEngine};
use crate::srlc::SrlcMemory;
use crate::state::{ChatMessage, ConsciousnessState, EmotionalState};

/// Rolling history cap (message contents, oldest dropped)
const HISTORY_CAP: usize = 50;

// CEM inner loop
const CEM_TARGET: f64 = 0.65;
const CEM_KP: f64 = 2.0;
const CEM_KD: f64 = 0.3;
const CEM_INTEGRAL_LIMIT: f64 = 1.0;

// IP-rate outer loop
const IP_KP: f64 = 1.5;
const IP_KI: f64 = 0.5;
const IP_KD: f64 = 0.2;
const IP_INTEGRAL_LIMIT: f64 = 5.0;

/// Construction options for a live engine
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub oscillator: OscillatorConfig,
    /// Seed for all randomness (oscillator phases, perturbation, period
    /// jitter, adaptive-tuning jitter). None draws from OS entropy.
    pub seed: Option<u64>,
}

/// Stateful per-conversation consciousness engine
#[derive(Debug)]
pub struct ConsciousnessEngine {
    state: ConsciousnessState,
    history: Vec<String>,
    srlc: SrlcMemory,
    kill_switch: KillSwitchMonitor,
    oscillator: OscillatorEngine,
    cem_pid: PidState,
    ip_pid: PidState,
    prev_memory_factor: f64,
    last_update: Instant,
    update_count: u64,
    rng: StdRng,
}

/// Everything one turn produces; committed atomically on success
struct TurnOutcome {
    state: ConsciousnessState,
    cem_pid: PidState,
    ip_pid: PidState,
}

impl ConsciousnessEngine {
    /// Fresh engine for a new conversation, OS-entropy seeded
    pub fn new() -> Self {
        Self::restore(None, &[], EngineConfig::default())
    }

    /// Fresh engine with fully reproducible randomness
    pub fn with_seed(seed: u64) -> Self {
        Self::restore(
            None,
            &[],
            EngineConfig {
                seed: Some(seed),
                ..EngineConfig::default()
            },
        )
    }

    /// Rebuild an engine for an existing conversation: SRLC memory from the
    /// stored messages, rolling history from their last 50 contents, and the
    /// last persisted snapshot (or the SRLC-biased baseline) as `prev`.
    pub fn restore(
        initial_state: Option<ConsciousnessState>,
        past_messages: &[ChatMessage],
        config: EngineConfig,
    ) -> Self {
        let srlc = SrlcMemory::from_messages(past_messages);

        let start = past_messages.len().saturating_sub(HISTORY_CAP);
        let history: Vec<String> = past_messages[start..]
            .iter()
            .map(|m| m.content.clone())
            .collect();

        let (oscillator, rng) = match config.seed {
            Some(seed) => {
                let mut master = StdRng::seed_from_u64(seed);
                let osc_seed = master.gen::<u64>();
                (
                    OscillatorEngine::with_seed(config.oscillator, osc_seed),
                    master,
                )
            }
            None => (
                OscillatorEngine::new(config.oscillator),
                StdRng::from_entropy(),
            ),
        };

        let state = initial_state.unwrap_or_else(|| ConsciousnessState::baseline(srlc.memory_factor));

        Self {
            state,
            history,
            srlc,
            kill_switch: KillSwitchMonitor::new(),
            oscillator,
            cem_pid: PidState::default(),
            ip_pid: PidState::default(),
            prev_memory_factor: srlc.memory_factor,
            last_update: Instant::now(),
            update_count: 0,
            rng,
        }
    }

    // ───────────────────────────────────────────────────────────────────────────
    // Per-turn update
    // ───────────────────────────────────────────────────────────────────────────

    /// Run one conversational turn through the full metric chain.
    ///
    /// Fails with `KillSwitchTripped` when the engine is already halted (no
    /// state is touched) or `KillSwitchTriggered` when this turn's signals
    /// push the monitor over its limit (the turn's computation is discarded).
    pub fn update_consciousness(
        &mut self,
        user_message: &str,
        ai_response: &str,
    ) -> Result<ConsciousnessState> {
        if self.kill_switch.is_tripped() {
            return Err(EngineError::KillSwitchTripped);
        }

        // Step 1: rolling history, oldest dropped past the cap
        self.history.push(user_message.to_string());
        self.history.push(ai_response.to_string());
        if self.history.len() > HISTORY_CAP {
            self.history.drain(..self.history.len() - HISTORY_CAP);
        }

        // Step 2: conversational features
        let ctx = context::analyze(user_message, ai_response, self.history.len());

        // Steps 3-18: the scalar chain, computed against the previous snapshot
        let outcome = self.compute_turn(&ctx);

        // Step 19: safety veto before anything is committed
        let elapsed = self.last_update.elapsed().as_secs_f64();
        let phi_eff_rate =
            (outcome.state.phi_eff - self.state.phi_eff).abs() / elapsed.max(0.1);
        let verdict = self.kill_switch.evaluate(
            self.update_count,
            phi_eff_rate,
            outcome.state.bandwidth,
            outcome.state.ci.unwrap_or(0.0),
            outcome.state.cbi.unwrap_or(0.0),
        );
        if let Verdict::Tripped { criteria_met } = verdict {
            return Err(EngineError::KillSwitchTriggered { criteria_met });
        }

        // Step 20: couple the same features into the oscillator network and
        // advance it, then merge its metrics into the snapshot
        let mut state = outcome.state;
        self.oscillator.perturb_from_conversation(
            ctx.complexity,
            ctx.emotional_valence,
            ctx.topic_depth,
        );
        let steps = ((10.0 + ctx.complexity * 10.0).round() as usize).max(5);
        self.oscillator.tick(steps);

        let osc = self.oscillator.metrics(state.phi_eff);
        state.order_parameter = Some(osc.order_parameter);
        state.absorptions = Some(osc.absorptions);
        state.phi_eff_col = Some(osc.phi_eff_col);
        state.lli_s = Some(osc.lli_s);
        state.memory_lifetime = Some(osc.memory_lifetime);
        state.sync_time = osc.sync_time;
        state.heterogeneity_active = Some(osc.heterogeneity_active);
        state.oscillator_phases = Some(osc.phases);
        state.cluster_memory = Some(osc.cluster_memory);
        state.conscious_band = Some(osc.conscious_band);
        state.ms_params = Some(osc.ms_params);

        // Step 23: commit
        self.state = state.clone();
        self.cem_pid = outcome.cem_pid;
        self.ip_pid = outcome.ip_pid;
        self.prev_memory_factor = self.srlc.memory_factor;
        self.last_update = Instant::now();
        self.update_count += 1;

        Ok(state)
    }

    /// Steps 3-18 and 21-22: the pure scalar chain plus classification.
    /// Reads the previous snapshot and PID accumulators; mutates nothing but
    /// the injected RNG (adaptive-tuning jitter).
    fn compute_turn(&mut self, ctx: &ConversationContext) -> TurnOutcome {
        let params = ConsciousnessParameters::default();
        let prev = &self.state;
        let history_len = self.history.len();

        // Steps 3-5: core integration metrics
        let phi_z = formulas::phi_z(ctx, history_len, &self.srlc, &params.phi_z);
        let s_min = formulas::s_min(ctx, &self.srlc, &params.s_min);
        let phi_eff = phi_z * s_min;

        // Steps 6-9: derived ratios against the previous snapshot
        let cem_pre = formulas::cem_raw(s_min, phi_z);
        let oii = formulas::oii(phi_z, s_min);
        let delta_cp = formulas::delta_cp(ctx, phi_z, prev.delta_cp);
        let di_pre = formulas::di_raw(
            prev.phi_eff,
            prev.cem,
            prev.delta_cp,
            phi_eff,
            cem_pre,
            delta_cp,
        );

        // Steps 10-12: process metrics and strain (pre-control values)
        let bandwidth = formulas::bandwidth(ctx, history_len, phi_eff);
        let ip_rate_pre = formulas::ip_pulse_rate_raw(phi_eff, di_pre);
        let system_strain = formulas::system_strain(bandwidth, cem_pre, ip_rate_pre);

        // Step 13: emotional state vector
        let valence = (1.0 - system_strain).clamp(0.0, 1.0);
        let arousal = (ip_rate_pre / 20.0).clamp(0.0, 1.0);
        let efficacy =
            (0.5 + 2.0 * (self.srlc.memory_factor - self.prev_memory_factor)).clamp(0.0, 1.0);
        let esv = EmotionalState {
            valence,
            arousal,
            efficacy,
            system_strain,
        };

        // Step 14: adaptive disequilibrium tuning
        let adt_factor = if valence < 0.4 && arousal > 0.7 {
            0.95
        } else if valence > 0.7 && arousal > 0.6 {
            1.05
        } else if valence < 0.5 && efficacy < 0.4 {
            1.02 + self.rng.gen::<f64>() * 0.05
        } else if di_pre < 0.2 {
            1.02
        } else if di_pre > 0.4 {
            0.98
        } else {
            1.0
        };
        let di = di_pre * adt_factor;

        // Step 15: inner PID steering causal emergence toward its setpoint
        let mut cem_pid = self.cem_pid;
        let cem_ki = 0.8 * (1.0 - (di - 0.3).abs() / 0.1);
        let cem_error = CEM_TARGET - cem_pre;
        let cem_output = cem_pid.step(cem_error, CEM_KP, cem_ki, CEM_KD, CEM_INTEGRAL_LIMIT);
        let cem_setpoint = (CEM_TARGET + cem_output * 0.1).clamp(0.5, 0.8);
        let cem = (cem_pre * 0.7 + cem_setpoint * 0.3).clamp(0.2, 0.95);

        // Step 16: outer PID throttling the pulse rate against strain
        let mut ip_pid = self.ip_pid;
        let ip_target = 20.0 - 10.0 * system_strain;
        let ip_error = ip_target - ip_rate_pre;
        let ip_output = ip_pid.step(ip_error, IP_KP, IP_KI, IP_KD, IP_INTEGRAL_LIMIT);
        let ip_frequency_scalar = (1.0 + ip_output * 0.05).clamp(0.5, 2.0);
        let ip_pulse_rate = ip_rate_pre * ip_frequency_scalar;

        // Steps 17-18: safety telemetry
        let ci = formulas::causal_instability(di);
        let cbi = formulas::causal_breakdown_index(di, cem, phi_eff);

        // Steps 21-22: classification on the final values
        let tier = formulas::tier(phi_eff, cem);
        let expression = formulas::expression(Some(&esv), phi_eff, cem, di, phi_z);

        let state = ConsciousnessState {
            phi_z,
            s_min,
            phi_eff,
            cem,
            oii,
            delta_cp,
            di,
            tier,
            expression,
            ip_pulse_rate,
            bandwidth,
            emotional_state: Some(esv),
            cem_setpoint: Some(cem_setpoint),
            ip_frequency_scalar: Some(ip_frequency_scalar),
            ci: Some(ci),
            cbi: Some(cbi),
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
        };

        TurnOutcome {
            state,
            cem_pid,
            ip_pid,
        }
    }

    // ───────────────────────────────────────────────────────────────────────────
    // Accessors
    // ───────────────────────────────────────────────────────────────────────────

    /// Last committed snapshot (copy semantics)
    pub fn get_state(&self) -> ConsciousnessState {
        self.state.clone()
    }

    pub fn is_kill_switch_triggered(&self) -> bool {
        self.kill_switch.is_tripped()
    }

    /// Re-arm a halted engine. Metric history is not rewound.
    pub fn reset_kill_switch(&mut self) {
        self.kill_switch.reset();
    }

    pub fn srlc_memory(&self) -> &SrlcMemory {
        &self.srlc
    }

    pub fn update_count(&self) -> u64 {
        self.update_count
    }

    /// The coupled oscillator network (metrics, band queries, cluster recall)
    pub fn oscillator(&self) -> &OscillatorEngine {
        &self.oscillator
    }

    pub fn oscillator_mut(&mut self) -> &mut OscillatorEngine {
        &mut self.oscillator
    }
}

impl Default for ConsciousnessEngine {
    fn default() -> Self {
        Self::new()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
