//! Sweep state machine: 0% to 100% power in discrete steps
//!
//! Walks the fan through `steps + 1` power levels (step 0 is power off),
//! recording `samples_per_step` tachometer readings at each level. Driven by
//! repeated invocation of [`SweepState::step`] from the host's timer; each
//! invocation runs to completion and returns a [`Wake`].
//!
//! The very first invocations perform a pre-check: a fan left spinning by a
//! previous state would pollute the zero-power samples, so the machine probes
//! the tachometer (reading dropped from the dataset), issues a single stop
//! command, and re-arms until the fan reads stopped or unreadable.
//!
//! The percentage driven at step `i` and the percentage recorded for step `i`
//! come from one function, [`SweepState::power_percent_for_step`], so the
//! dataset can never disagree with what was actually commanded.

use crate::actuator::{self, FanHandle};
use crate::constants::{
    DWELL_MS, MAX_POINTS, PRECHECK_RETRY_MS, SAMPLE_GAP_MS,
};
use crate::errors::{MeasureError, MeasureResult};
use crate::host::HostContext;
use crate::sampler::{MeasurementPoint, SampleLog};
use crate::time::{Timestamp, Wake};

/// Validated sweep parameters
#[derive(Debug, Clone, Copy)]
pub struct SweepConfig {
    /// Number of power steps from 0% to 100% (>= 1)
    pub steps: u32,
    /// Samples recorded at each power level (>= 1)
    pub samples_per_step: u32,
    /// Dwell after each power change before sampling resumes
    pub dwell_ms: Timestamp,
}

impl SweepConfig {
    /// Build a config, rejecting degenerate step counts and runs that would
    /// overflow the bounded sample log.
    pub fn new(steps: u32, samples_per_step: u32) -> MeasureResult<Self> {
        if steps < 1 {
            return Err(MeasureError::InvalidParam { param: "STEPS" });
        }
        if samples_per_step < 1 {
            return Err(MeasureError::InvalidParam { param: "SAMPLES_PER_STEP" });
        }
        let total = (steps as usize + 1) * samples_per_step as usize;
        if total > MAX_POINTS {
            return Err(MeasureError::LogFull { capacity: MAX_POINTS });
        }
        Ok(Self {
            steps,
            samples_per_step,
            dwell_ms: DWELL_MS,
        })
    }

    /// Override the dwell time (tests, unusually slow fans)
    pub fn with_dwell_ms(mut self, dwell_ms: Timestamp) -> Self {
        self.dwell_ms = dwell_ms;
        self
    }
}

/// Sweep machine state
///
/// `step_index` only ever increases; `samples_in_step` resets to zero exactly
/// when `step_index` increments.
#[derive(Debug)]
pub struct SweepState {
    config: SweepConfig,
    step_index: u32,
    samples_in_step: u32,
    initial_stop_issued: bool,
    log: SampleLog,
}

impl SweepState {
    /// Fresh machine at step 0 with an empty log
    pub fn new(config: SweepConfig) -> Self {
        Self {
            config,
            step_index: 0,
            samples_in_step: 0,
            initial_stop_issued: false,
            log: SampleLog::new(),
        }
    }

    /// Power percentage for a given step: exactly `(100 / steps) * i`.
    ///
    /// The single source for both the drive command and the recorded value.
    pub fn power_percent_for_step(&self, step_index: u32) -> f32 {
        (100.0 / self.config.steps as f32) * step_index as f32
    }

    /// Recorded points so far, in sweep order
    pub fn points(&self) -> &[MeasurementPoint] {
        self.log.points()
    }

    /// Advance the machine by one invocation.
    ///
    /// Returns [`Wake::Never`] once the final step has been sampled; the run
    /// controller then performs completion (final stop command, persistence,
    /// reset).
    pub fn step(&mut self, fan: &FanHandle, ctx: &mut HostContext<'_>, now: Timestamp) -> Wake {
        // Pre-check: only before the first recorded sample of the run.
        if self.step_index == 0 && self.samples_in_step == 0 {
            if let Some(rpm) = actuator::read_rpm(ctx.registry, fan, now) {
                if rpm > 0.0 {
                    respond_info!(
                        ctx,
                        "Fan is already spinning at {rpm:.0} RPM, waiting for it to stop"
                    );
                    if !self.initial_stop_issued {
                        let _ = actuator::set_power(fan, ctx, 0.0);
                        self.initial_stop_issued = true;
                    }
                    return Wake::At(now + PRECHECK_RETRY_MS);
                }
            }
        }

        let rpm = actuator::read_rpm(ctx.registry, fan, now);
        let pct = self.power_percent_for_step(self.step_index);
        if self.log.record(pct, rpm).is_err() {
            // Capacity is validated at start; if this ever trips, finish with
            // what was collected rather than spinning forever.
            log_warn!("measurement log full at step {}, finishing early", self.step_index);
            return Wake::Never;
        }

        self.samples_in_step += 1;
        if self.samples_in_step < self.config.samples_per_step {
            return Wake::At(now + SAMPLE_GAP_MS);
        }

        self.samples_in_step = 0;
        self.step_index += 1;
        if self.step_index > self.config.steps {
            return Wake::Never;
        }

        let pct = self.power_percent_for_step(self.step_index);
        respond_info!(ctx, "Setting fan power to {pct:.0}%");
        let _ = actuator::set_power(fan, ctx, pct / 100.0);
        Wake::At(now + self.config.dwell_ms)
    }
}
