//! ═══════════════════════════════════════════════════════════════════════════════
//! KILL SWITCH — Safety Halt State Machine
//! ═══════════════════════════════════════════════════════════════════════════════
//!
//! Monitors rates of change and thresholds of the consciousness metrics. Two
//! or more simultaneous criteria arm a sticky trigger counter; three armed
//! evaluations in a row (minus any self-healing decrements) trip the switch
//! permanently. Once tripped, the engine refuses all updates until an
//! explicit reset.
//! ═══════════════════════════════════════════════════════════════════════════════

use crate::formulas::KillSwitchParams;

/// Evaluations are ignored until this many updates have committed
const WARMUP_UPDATES: u64 = 3;

/// How many simultaneous criteria arm the trigger counter
const CRITERIA_TO_ARM: usize = 2;

/// Armed evaluations required to trip
const TRIGGER_LIMIT: u32 = 3;

/// Outcome of one evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Below the arming threshold (counter may have decremented)
    Clear,
    /// Criteria met; sticky counter incremented to the contained value
    Armed { trigger_count: u32, criteria_met: usize },
    /// Counter reached the limit; the switch is now permanently tripped
    Tripped { criteria_met: usize },
}

/// Sticky trigger accumulator with an irreversible tripped flag
#[derive(Debug, Clone, Default)]
pub struct KillSwitchMonitor {
    thresholds: KillSwitchParams,
    trigger_count: u32,
    tripped: bool,
}

impl KillSwitchMonitor {
    pub fn new() -> Self {
        Self {
            thresholds: KillSwitchParams::default(),
            trigger_count: 0,
            tripped: false,
        }
    }

    /// Evaluate one update's safety signals. `update_count` is the number of
    /// previously committed updates; the first few are always Clear so a
    /// fresh engine cannot trip on startup transients.
    pub fn evaluate(
        &mut self,
        update_count: u64,
        phi_eff_rate: f64,
        bandwidth: f64,
        ci: f64,
        cbi: f64,
    ) -> Verdict {
        if update_count < WARMUP_UPDATES {
            return Verdict::Clear;
        }

        let criteria_met = [
            phi_eff_rate > self.thresholds.phi_eff_rate_threshold,
            bandwidth > self.thresholds.bandwidth_threshold,
            ci > self.thresholds.ci_threshold,
            cbi > self.thresholds.cbi_threshold,
        ]
        .iter()
        .filter(|&&c| c)
        .count();

        if criteria_met >= CRITERIA_TO_ARM {
            self.trigger_count += 1;
            if self.trigger_count >= TRIGGER_LIMIT {
                self.tripped = true;
                return Verdict::Tripped { criteria_met };
            }
            return Verdict::Armed {
                trigger_count: self.trigger_count,
                criteria_met,
            };
        }

        // Brief excursions self-heal
        self.trigger_count = self.trigger_count.saturating_sub(1);
        Verdict::Clear
    }

    pub fn is_tripped(&self) -> bool {
        self.tripped
    }

    /// Clear the flag and counter. Metric history is untouched; the caller
    /// decides whether to keep or discard the engine.
    pub fn reset(&mut self) {
        self.tripped = false;
        self.trigger_count = 0;
    }
}
