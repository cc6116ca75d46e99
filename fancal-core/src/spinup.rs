//! Spin-up state machine: time from initial power to the target RPM band
//!
//! A strict linear sequence of phases, one per timer invocation, with a
//! single self-loop while the RPM climbs:
//!
//! ```text
//! DriveToTargetToProbe → ProbeMaxRpm → DriveToInitial → WaitAfterInitial
//!                                                            ↓
//!                                              Stabilizing ⟲ → Reached
//! ```
//!
//! The probe phases run the fan at target power long enough to learn what
//! "at speed" means for this fan (`reference_max_rpm`); the measurement then
//! drops to the initial power, jumps back to target, and polls until the
//! reading is within `rpm_tolerance` of the reference. Elapsed time from the
//! jump is the spin-up time.
//!
//! An unreadable tachometer is fatal here: the stabilization predicate
//! cannot be evaluated without readings, so the run aborts.

use crate::actuator::{self, FanHandle};
use crate::constants::{INITIAL_SETTLE_MS, PROBE_SETTLE_MS};
use crate::errors::MeasureError;
use crate::host::HostContext;
use crate::time::{Timestamp, Wake};

/// Phase of the spin-up measurement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpinupPhase {
    /// Not running
    #[default]
    Idle,
    /// Fan driven to target power; waiting for it to reach full speed
    DriveToTargetToProbe,
    /// Read the reference maximum RPM at target power
    ProbeMaxRpm,
    /// Fan driven back down to the initial power
    DriveToInitial,
    /// Jump to target power and start the clock
    WaitAfterInitial,
    /// Polling until the reading enters the tolerance band (self-loop)
    Stabilizing,
    /// Target band reached; terminal
    Reached,
}

/// Validated spin-up parameters
#[derive(Debug, Clone, Copy)]
pub struct SpinupConfig {
    /// Starting power fraction in [0, 1]
    pub initial_power: f32,
    /// Target power fraction in [0, 1]
    pub target_power: f32,
    /// Poll interval while stabilizing
    pub step_interval_ms: Timestamp,
    /// Band around the reference RPM that counts as "reached"
    pub rpm_tolerance: f32,
}

/// What one spin-up invocation decided
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpinupProgress {
    /// Keep going; re-arm the timer per the wake instruction
    Again(Wake),
    /// Target band reached after `elapsed_ms`
    Reached {
        /// Time from the power jump to the in-band reading, in milliseconds
        elapsed_ms: u64,
    },
    /// Run cannot continue (unreadable tachometer)
    Aborted(MeasureError),
}

/// Spin-up machine state
#[derive(Debug)]
pub struct SpinupState {
    config: SpinupConfig,
    phase: SpinupPhase,
    reference_max_rpm: f32,
    start_time: Timestamp,
}

/// In-band test for stabilization.
///
/// Inclusive on the boundary: a reading exactly `tolerance` away from the
/// reference terminates the run.
pub(crate) fn within_band(reference: f32, sample: f32, tolerance: f32) -> bool {
    libm::fabsf(reference - sample) <= tolerance
}

impl SpinupState {
    /// Fresh machine, ready for its first invocation
    pub fn new(config: SpinupConfig) -> Self {
        Self {
            config,
            phase: SpinupPhase::DriveToTargetToProbe,
            reference_max_rpm: 0.0,
            start_time: 0,
        }
    }

    /// Current phase (observability, tests)
    pub fn phase(&self) -> SpinupPhase {
        self.phase
    }

    /// Reference RPM captured at target power, once `ProbeMaxRpm` has run
    pub fn reference_max_rpm(&self) -> f32 {
        self.reference_max_rpm
    }

    /// Advance the machine by one invocation.
    pub fn step(
        &mut self,
        fan: &FanHandle,
        ctx: &mut HostContext<'_>,
        now: Timestamp,
    ) -> SpinupProgress {
        match self.phase {
            SpinupPhase::Idle | SpinupPhase::Reached => {
                // A timer firing here means the host re-armed after terminal;
                // nothing sensible to do but stay terminal.
                SpinupProgress::Again(Wake::Never)
            }
            SpinupPhase::DriveToTargetToProbe => {
                respond_info!(
                    ctx,
                    "Driving fan to {:.0}% power to probe maximum RPM",
                    self.config.target_power * 100.0
                );
                let _ = actuator::set_power(fan, ctx, self.config.target_power);
                self.phase = SpinupPhase::ProbeMaxRpm;
                SpinupProgress::Again(Wake::At(now + PROBE_SETTLE_MS))
            }
            SpinupPhase::ProbeMaxRpm => match actuator::read_rpm(ctx.registry, fan, now) {
                None => SpinupProgress::Aborted(MeasureError::SensorUnavailable),
                Some(rpm) => {
                    self.reference_max_rpm = rpm;
                    respond_info!(ctx, "Reference maximum RPM: {rpm:.0}");
                    self.phase = SpinupPhase::DriveToInitial;
                    SpinupProgress::Again(Wake::Immediately)
                }
            },
            SpinupPhase::DriveToInitial => {
                respond_info!(
                    ctx,
                    "Dropping fan to {:.0}% power before timing spin-up",
                    self.config.initial_power * 100.0
                );
                let _ = actuator::set_power(fan, ctx, self.config.initial_power);
                self.phase = SpinupPhase::WaitAfterInitial;
                SpinupProgress::Again(Wake::At(now + INITIAL_SETTLE_MS))
            }
            SpinupPhase::WaitAfterInitial => {
                let _ = actuator::set_power(fan, ctx, self.config.target_power);
                self.start_time = now;
                self.phase = SpinupPhase::Stabilizing;
                SpinupProgress::Again(Wake::At(now + self.config.step_interval_ms))
            }
            SpinupPhase::Stabilizing => match actuator::read_rpm(ctx.registry, fan, now) {
                None => SpinupProgress::Aborted(MeasureError::SensorUnavailable),
                Some(rpm) => {
                    if within_band(self.reference_max_rpm, rpm, self.config.rpm_tolerance) {
                        self.phase = SpinupPhase::Reached;
                        SpinupProgress::Reached {
                            elapsed_ms: now.saturating_sub(self.start_time),
                        }
                    } else {
                        SpinupProgress::Again(Wake::At(now + self.config.step_interval_ms))
                    }
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_is_inclusive_on_the_boundary() {
        assert!(within_band(2000.0, 1950.0, 100.0)); // diff 50
        assert!(within_band(2000.0, 1900.0, 100.0)); // diff exactly 100
        assert!(!within_band(2000.0, 1890.0, 100.0)); // diff 110
        assert!(!within_band(2000.0, 1500.0, 100.0)); // still climbing
        assert!(within_band(2000.0, 2050.0, 100.0)); // overshoot counts too
    }

    #[test]
    fn fresh_machine_starts_at_probe_drive() {
        let state = SpinupState::new(SpinupConfig {
            initial_power: 0.0,
            target_power: 1.0,
            step_interval_ms: 100,
            rpm_tolerance: 100.0,
        });
        assert_eq!(state.phase(), SpinupPhase::DriveToTargetToProbe);
    }
}
