//! Run controller: command entry points, timer dispatch, session lifecycle
//!
//! Owns the single [`RunSession`] allowed process-wide. The host wires it up
//! like any other timer-driven object:
//!
//! 1. The command layer calls [`RunController::dispatch`] (or the typed
//!    `start_*` methods) when a start command arrives; the returned [`Wake`]
//!    arms the host's timer.
//! 2. Each timer firing calls [`RunController::on_timer`]; the return value
//!    re-arms the timer, and [`Wake::Never`] means the host must disarm and
//!    unregister it - a fresh timer is registered per run, and letting one
//!    leak across resets would fire into a dead session.
//! 3. The host's shutdown event calls [`RunController::shutdown`]; this is
//!    mandatory, not optional, so no run state survives a restart.
//!
//! Mutual exclusion is the `session.is_some()` check: the host loop is
//! single-threaded and cooperative, so no further locking exists or is
//! needed. A second start while a run is active is answered with an
//! informational rejection and touches nothing.

use crate::actuator::{self, FanHandle};
use crate::command::CommandArgs;
use crate::constants::{
    DEFAULT_ACTUATOR, DEFAULT_RPM_THRESHOLD, DEFAULT_RPM_TOLERANCE, DEFAULT_SAMPLES_PER_STEP,
    DEFAULT_STEPS, DEFAULT_STEP_INTERVAL_MS, FAN_NAME_CAP,
};
use crate::errors::{MeasureError, MeasureResult};
use crate::host::HostContext;
use crate::spinup::{SpinupConfig, SpinupProgress, SpinupState};
use crate::sweep::{SweepConfig, SweepState};
use crate::time::Wake;

#[cfg(feature = "std")]
use crate::constants::{REPORT_BASE, REPORT_DIR};
#[cfg(feature = "std")]
use crate::report;

/// The state machine owning a run
#[derive(Debug)]
enum Machine {
    Sweep(SweepState),
    Spinup(SpinupState),
}

/// One active measurement run
///
/// Created by a start command, destroyed on completion or abort. Only the
/// [`RunController`] ever mutates it.
#[derive(Debug)]
struct RunSession {
    fan: FanHandle,
    machine: Machine,
    /// Stage derived limits via the config writer on completion (sweep only)
    save: bool,
    /// RPM increase that still counts as useful extra power (sweep analysis)
    rpm_threshold: f32,
}

/// What a terminal step left for the controller to finish
enum Terminal {
    SweepDone,
    SpinupReached { elapsed_ms: u64 },
    SpinupAborted(MeasureError),
}

/// Controller for the one-run-at-a-time measurement procedure
pub struct RunController {
    session: Option<RunSession>,
    #[cfg(feature = "std")]
    output_dir: std::path::PathBuf,
}

impl Default for RunController {
    fn default() -> Self {
        Self::new()
    }
}

impl RunController {
    /// Controller with no active run
    pub fn new() -> Self {
        Self {
            session: None,
            #[cfg(feature = "std")]
            output_dir: std::path::PathBuf::from(REPORT_DIR),
        }
    }

    /// Override the report directory (tests, hosts without a writable /tmp)
    #[cfg(feature = "std")]
    pub fn with_output_dir(mut self, dir: impl Into<std::path::PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// True while a run owns the timer
    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Route a raw command line to the matching start handler.
    ///
    /// Unknown commands and argument errors are answered on the responder;
    /// nothing propagates to the host as a failure.
    pub fn dispatch(&mut self, line: &str, ctx: &mut HostContext<'_>) -> Wake {
        let line = line.trim();
        let (name, rest) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest),
            None => (line, ""),
        };
        let args = match CommandArgs::parse(rest) {
            Ok(args) => args,
            Err(err) => {
                respond_error!(ctx, "{err}");
                return Wake::Never;
            }
        };
        match name {
            "START_SWEEP" => self.start_sweep(&args, ctx),
            "START_SPINUP" => self.start_spinup(&args, ctx),
            _ => {
                respond_error!(ctx, "Unknown command: {name}");
                Wake::Never
            }
        }
    }

    /// Handle `START_SWEEP [ACTUATOR=fan] [STEPS=10] [SAMPLES_PER_STEP=3]
    /// [RPM_THRESHOLD=100] [SAVE=0]`.
    pub fn start_sweep(&mut self, args: &CommandArgs<'_>, ctx: &mut HostContext<'_>) -> Wake {
        if let Err(err) = self.ensure_idle() {
            report_rejection(ctx, err);
            return Wake::Never;
        }

        let name = args.get_str("ACTUATOR", DEFAULT_ACTUATOR);
        let config = match sweep_config_from_args(args) {
            Ok(config) => config,
            Err(err) => {
                respond_error!(ctx, "{err}");
                return Wake::Never;
            }
        };
        let rpm_threshold = match args.get_f32("RPM_THRESHOLD", DEFAULT_RPM_THRESHOLD) {
            Ok(v) => v,
            Err(err) => {
                respond_error!(ctx, "{err}");
                return Wake::Never;
            }
        };

        let fan = match actuator::resolve(ctx.registry, name) {
            Ok(fan) => fan,
            Err(err) => {
                report_resolve_failure(ctx, name, err);
                return Wake::Never;
            }
        };

        respond_info!(ctx, "Measuring fan {name} ...");
        respond_info!(
            ctx,
            "Running fan from 0 to 100% power in {} steps",
            config.steps
        );

        self.session = Some(RunSession {
            fan,
            machine: Machine::Sweep(SweepState::new(config)),
            save: args.get_flag("SAVE"),
            rpm_threshold,
        });
        Wake::Immediately
    }

    /// Handle `START_SPINUP [ACTUATOR=fan] [INITIAL_POWER=0] [TARGET_POWER=1]
    /// [STEP_INTERVAL=0.1] [RPM_TOLERANCE=100]` (`STEP_INTERVAL` in seconds).
    pub fn start_spinup(&mut self, args: &CommandArgs<'_>, ctx: &mut HostContext<'_>) -> Wake {
        if let Err(err) = self.ensure_idle() {
            report_rejection(ctx, err);
            return Wake::Never;
        }

        let name = args.get_str("ACTUATOR", DEFAULT_ACTUATOR);
        let config = match spinup_config_from_args(args) {
            Ok(config) => config,
            Err(err) => {
                respond_error!(ctx, "{err}");
                return Wake::Never;
            }
        };

        let fan = match actuator::resolve(ctx.registry, name) {
            Ok(fan) => fan,
            Err(err) => {
                report_resolve_failure(ctx, name, err);
                return Wake::Never;
            }
        };

        respond_info!(ctx, "Measuring spin-up time of fan {name} ...");

        self.session = Some(RunSession {
            fan,
            machine: Machine::Spinup(SpinupState::new(config)),
            save: false,
            rpm_threshold: DEFAULT_RPM_THRESHOLD,
        });
        Wake::Immediately
    }

    /// Advance the active run by one step. Called from the host's timer.
    pub fn on_timer(&mut self, ctx: &mut HostContext<'_>) -> Wake {
        let now = ctx.now();
        let outcome = match self.session.as_mut() {
            // Stale timer after a reset; tell the host to tear it down.
            None => return Wake::Never,
            Some(session) => match &mut session.machine {
                Machine::Sweep(state) => match state.step(&session.fan, ctx, now) {
                    Wake::Never => Err(Terminal::SweepDone),
                    wake => Ok(wake),
                },
                Machine::Spinup(state) => match state.step(&session.fan, ctx, now) {
                    SpinupProgress::Again(wake) => Ok(wake),
                    SpinupProgress::Reached { elapsed_ms } => {
                        Err(Terminal::SpinupReached { elapsed_ms })
                    }
                    SpinupProgress::Aborted(err) => Err(Terminal::SpinupAborted(err)),
                },
            },
        };

        match outcome {
            Ok(wake) => wake,
            Err(terminal) => {
                if let Some(session) = self.session.take() {
                    match terminal {
                        Terminal::SweepDone => self.finish_sweep(session, ctx),
                        Terminal::SpinupReached { elapsed_ms } => {
                            finish_spinup(session, ctx, elapsed_ms)
                        }
                        Terminal::SpinupAborted(err) => abort_spinup(session, ctx, err),
                    }
                }
                Wake::Never
            }
        }
    }

    /// Force-reset on host shutdown.
    ///
    /// Drops any active session so a stale timer firing after restart finds
    /// nothing to advance. No commands are issued - the firmware is going
    /// down with us.
    pub fn shutdown(&mut self) {
        if self.session.take().is_some() {
            log_warn!("shutdown with a measurement active; run state reset");
        }
    }

    fn ensure_idle(&self) -> MeasureResult<()> {
        if self.session.is_some() {
            Err(MeasureError::MeasureBusy)
        } else {
            Ok(())
        }
    }

    fn finish_sweep(&self, session: RunSession, ctx: &mut HostContext<'_>) {
        let Machine::Sweep(state) = &session.machine else {
            return;
        };

        ctx.responder.info("Setting fan power to 0%");
        let _ = actuator::set_power(&session.fan, ctx, 0.0);

        ctx.responder.info("Saving calibration data...");
        #[cfg(feature = "std")]
        {
            let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
            match report::save_csv(
                &self.output_dir,
                REPORT_BASE,
                session.fan.name.as_str(),
                &stamp,
                state.points(),
            ) {
                Ok(path) => {
                    respond_info!(ctx, "Calibration data saved to {}", path.display());
                }
                Err(err) => {
                    respond_error!(ctx, "Failed to write calibration data: {err}");
                }
            }

            if session.save {
                stage_limits(&session, ctx, state.points());
            }
        }
        #[cfg(not(feature = "std"))]
        {
            respond_info!(
                ctx,
                "No persistent storage on this host; {} points discarded",
                state.points().len()
            );
        }
        log_info!("sweep of {} complete, {} points", session.fan.name, state.points().len());
    }
}

/// Stage min/max power recommendations for a later durable save.
#[cfg(feature = "std")]
fn stage_limits(session: &RunSession, ctx: &mut HostContext<'_>, points: &[crate::sampler::MeasurementPoint]) {
    use core::fmt::Write as _;
    use heapless::String;

    match report::recommend_limits(points, session.rpm_threshold) {
        None => {
            ctx.responder
                .info("Fan never spun; no power limits to save");
        }
        Some(limits) => {
            let section = session.fan.name.as_str();
            let mut value: String<16> = String::new();
            let _ = write!(value, "{:.2}", limits.min_power);
            ctx.config.set(section, "min_power", value.as_str());
            value.clear();
            let _ = write!(value, "{:.2}", limits.max_power);
            ctx.config.set(section, "max_power", value.as_str());
            respond_info!(
                ctx,
                "{section}: min_power set to {:.2}, max_power set to {:.2}",
                limits.min_power,
                limits.max_power
            );
            ctx.responder.info(
                "The SAVE_CONFIG command will update the config file with these values",
            );
        }
    }
}

fn finish_spinup(session: RunSession, ctx: &mut HostContext<'_>, elapsed_ms: u64) {
    respond_info!(
        ctx,
        "Fan {} reached the target RPM band in {:.2} s",
        session.fan.name,
        elapsed_ms as f32 / 1000.0
    );
    let _ = actuator::set_power(&session.fan, ctx, 0.0);
    log_info!("spin-up of {} complete in {} ms", session.fan.name, elapsed_ms);
}

fn abort_spinup(session: RunSession, ctx: &mut HostContext<'_>, err: MeasureError) {
    respond_error!(ctx, "Spin-up measurement aborted: {err}");
    let _ = actuator::set_power(&session.fan, ctx, 0.0);
    log_warn!("spin-up of {} aborted: {}", session.fan.name, err);
}

fn report_rejection(ctx: &mut HostContext<'_>, err: MeasureError) {
    match err {
        // Informational by design: the active run must not be disturbed.
        MeasureError::MeasureBusy => ctx.responder.info("Measure already in progress"),
        other => respond_error!(ctx, "{other}"),
    }
}

fn report_resolve_failure(ctx: &mut HostContext<'_>, name: &str, err: MeasureError) {
    match err {
        MeasureError::ActuatorNotFound => respond_error!(ctx, "Fan {name} not found"),
        other => respond_error!(ctx, "{other}"),
    }
}

fn sweep_config_from_args(args: &CommandArgs<'_>) -> MeasureResult<SweepConfig> {
    let steps = args.get_u32("STEPS", DEFAULT_STEPS)?;
    let samples = args.get_u32("SAMPLES_PER_STEP", DEFAULT_SAMPLES_PER_STEP)?;
    SweepConfig::new(steps, samples)
}

fn spinup_config_from_args(args: &CommandArgs<'_>) -> MeasureResult<SpinupConfig> {
    let initial_power = args.get_f32("INITIAL_POWER", 0.0)?.clamp(0.0, 1.0);
    let target_power = args.get_f32("TARGET_POWER", 1.0)?.clamp(0.0, 1.0);
    let step_interval_ms = match args.get("STEP_INTERVAL") {
        None => DEFAULT_STEP_INTERVAL_MS,
        Some(_) => {
            let seconds = args.get_f32("STEP_INTERVAL", 0.0)?;
            if seconds <= 0.0 {
                return Err(MeasureError::InvalidParam { param: "STEP_INTERVAL" });
            }
            (seconds * 1000.0) as u64
        }
    };
    let rpm_tolerance = args.get_f32("RPM_TOLERANCE", DEFAULT_RPM_TOLERANCE)?;
    if rpm_tolerance < 0.0 {
        return Err(MeasureError::InvalidParam { param: "RPM_TOLERANCE" });
    }
    Ok(SpinupConfig {
        initial_power,
        target_power,
        step_interval_ms,
        rpm_tolerance,
    })
}
