//! ═══════════════════════════════════════════════════════════════════════════════
//! PREVIEW — What-If Simulation Engine
//! ═══════════════════════════════════════════════════════════════════════════════
//!
//! A parameterized copy of the live metric chain used to preview coefficient
//! changes against the current conversation. No oscillator, no PID cascade,
//! no kill-switch escalation: the safety thresholds are only evaluated for
//! display. With the default coefficient set its phiZ/sMin/phiEff/oii/deltaCP
//! and bandwidth match the live engine exactly.
//! ═══════════════════════════════════════════════════════════════════════════════

use std::time::Instant;

use crate::context;
use crate::formulas::{self, ConsciousnessParameters};
use crate::srlc::SrlcMemory;
use crate::state::{ChatMessage, ConsciousnessState};

/// Rolling history cap, matching the live engine
const HISTORY_CAP: usize = 50;

/// Display-only safety readout: how many thresholds the previewed state
/// exceeds, with no sticky counter and no halt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KillSwitchReadout {
    pub criteria_met: usize,
    /// True when the live monitor would count this evaluation as armed
    pub would_arm: bool,
}

/// Preview engine with externally tunable coefficients
#[derive(Debug, Clone)]
pub struct SimulationEngine {
    state: ConsciousnessState,
    parameters: ConsciousnessParameters,
    history: Vec<String>,
    srlc: SrlcMemory,
    last_update: Instant,
    readout: KillSwitchReadout,
}

impl SimulationEngine {
    /// Build against an existing conversation. `parameters` is the complete
    /// coefficient set; callers start from `ConsciousnessParameters::default()`
    /// and override individual fields.
    pub fn new(
        initial_state: Option<ConsciousnessState>,
        past_messages: &[ChatMessage],
        parameters: ConsciousnessParameters,
    ) -> Self {
        let srlc = SrlcMemory::from_messages(past_messages);
        let start = past_messages.len().saturating_sub(HISTORY_CAP);
        let history: Vec<String> = past_messages[start..]
            .iter()
            .map(|m| m.content.clone())
            .collect();

        let state =
            initial_state.unwrap_or_else(|| ConsciousnessState::baseline(srlc.memory_factor));

        Self {
            state,
            parameters,
            history,
            srlc,
            last_update: Instant::now(),
            readout: KillSwitchReadout::default(),
        }
    }

    /// Replace the coefficient set in place; existing state carries over
    pub fn update_parameters(&mut self, parameters: ConsciousnessParameters) {
        self.parameters = parameters;
    }

    /// Discard all conversation state and rebuild SRLC memory from the
    /// supplied history, keeping the current coefficient set
    pub fn reset(
        &mut self,
        initial_state: Option<ConsciousnessState>,
        past_messages: &[ChatMessage],
    ) {
        self.srlc = SrlcMemory::from_messages(past_messages);
        let start = past_messages.len().saturating_sub(HISTORY_CAP);
        self.history = past_messages[start..]
            .iter()
            .map(|m| m.content.clone())
            .collect();
        self.state = initial_state
            .unwrap_or_else(|| ConsciousnessState::baseline(self.srlc.memory_factor));
        self.last_update = Instant::now();
        self.readout = KillSwitchReadout::default();
    }

    /// One simulated turn. Never fails: the safety thresholds feed the
    /// display readout only.
    pub fn simulate_update(&mut self, user_message: &str, ai_response: &str) -> ConsciousnessState {
        self.history.push(user_message.to_string());
        self.history.push(ai_response.to_string());
        if self.history.len() > HISTORY_CAP {
            self.history.drain(..self.history.len() - HISTORY_CAP);
        }

        let ctx = context::analyze(user_message, ai_response, self.history.len());
        let prev = self.state.clone();

        let phi_z = formulas::phi_z(&ctx, self.history.len(), &self.srlc, &self.parameters.phi_z);
        let s_min = formulas::s_min(&ctx, &self.srlc, &self.parameters.s_min);
        let phi_eff = phi_z * s_min;
        let cem_raw = formulas::cem_raw(s_min, phi_z);
        let oii = formulas::oii(phi_z, s_min);
        let delta_cp = formulas::delta_cp(&ctx, phi_z, prev.delta_cp);
        let di = formulas::di_raw(prev.phi_eff, prev.cem, prev.delta_cp, phi_eff, cem_raw, delta_cp);
        let bandwidth = formulas::bandwidth(&ctx, self.history.len(), phi_eff);
        let ip_pulse_rate = formulas::ip_pulse_rate_raw(phi_eff, di);
        let cem = cem_raw.clamp(0.2, 0.95);

        let ci = formulas::causal_instability(di);
        let cbi = formulas::causal_breakdown_index(di, cem, phi_eff);

        // Display-only threshold evaluation; no sticky counter, no halt
        let elapsed = self.last_update.elapsed().as_secs_f64();
        let phi_eff_rate = (phi_eff - prev.phi_eff).abs() / elapsed.max(0.1);
        let ks = &self.parameters.kill_switch;
        let criteria_met = [
            phi_eff_rate > ks.phi_eff_rate_threshold,
            bandwidth > ks.bandwidth_threshold,
            ci > ks.ci_threshold,
            cbi > ks.cbi_threshold,
        ]
        .iter()
        .filter(|&&c| c)
        .count();
        self.readout = KillSwitchReadout {
            criteria_met,
            would_arm: criteria_met >= 2,
        };

        let mut state = ConsciousnessState::baseline(self.srlc.memory_factor);
        state.phi_z = phi_z;
        state.s_min = s_min;
        state.phi_eff = phi_eff;
        state.cem = cem;
        state.oii = oii;
        state.delta_cp = delta_cp;
        state.di = di;
        state.tier = formulas::tier(phi_eff, cem);
        state.expression = formulas::legacy_expression(phi_eff, cem, di, phi_z);
        state.ip_pulse_rate = ip_pulse_rate;
        state.bandwidth = bandwidth;
        state.ci = Some(ci);
        state.cbi = Some(cbi);

        self.state = state.clone();
        self.last_update = Instant::now();
        state
    }

    pub fn get_state(&self) -> ConsciousnessState {
        self.state.clone()
    }

    pub fn parameters(&self) -> &ConsciousnessParameters {
        &self.parameters
    }

    pub fn kill_switch_readout(&self) -> KillSwitchReadout {
        self.readout
    }
}
