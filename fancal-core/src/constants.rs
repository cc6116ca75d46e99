//! Capacities, fixed delays, and command defaults
//!
//! All buffers in the step path are bounded; the constants here document the
//! bounds in one place so hosts with tighter RAM budgets can audit them.

use crate::time::Timestamp;

// --- Capacities ---

/// Maximum recorded (power, RPM) points per run.
///
/// A run records `(steps + 1) * samples_per_step` points; the default
/// configuration (10 steps, 3 samples) uses 33. 512 leaves generous headroom
/// at 512 * 8 bytes = 4KB, and start requests that would exceed it are
/// rejected up front.
pub const MAX_POINTS: usize = 512;

/// Maximum length of a fan's logical name
pub const FAN_NAME_CAP: usize = 48;

/// Maximum length of a registry key (category prefix + space + name)
pub const REGISTRY_KEY_CAP: usize = 64;

/// Scratch buffer for a formatted firmware command
pub const COMMAND_LINE_CAP: usize = 96;

/// Scratch buffer for a formatted response line
pub const RESPONSE_LINE_CAP: usize = 128;

/// Maximum KEY=VALUE pairs accepted on a command line
pub const MAX_COMMAND_ARGS: usize = 16;

// --- Sweep timing ---

/// Retry interval while waiting for an already-spinning fan to stop
pub const PRECHECK_RETRY_MS: Timestamp = 1_000;

/// Gap between repeated samples within one power step
pub const SAMPLE_GAP_MS: Timestamp = 500;

/// Dwell after a power change before sampling, so the fan speed settles
pub const DWELL_MS: Timestamp = 3_000;

// --- Spin-up timing ---

/// Settle time at target power before probing the maximum RPM
pub const PROBE_SETTLE_MS: Timestamp = 5_000;

/// Settle time after dropping back to the initial power
pub const INITIAL_SETTLE_MS: Timestamp = 3_000;

/// Default poll interval while waiting for the RPM to stabilize
pub const DEFAULT_STEP_INTERVAL_MS: Timestamp = 100;

// --- Command defaults ---

/// Default actuator name looked up in the device registry
pub const DEFAULT_ACTUATOR: &str = "fan";

/// Default number of sweep steps (0% to 100%)
pub const DEFAULT_STEPS: u32 = 10;

/// Default samples recorded per sweep step
pub const DEFAULT_SAMPLES_PER_STEP: u32 = 3;

/// Default stabilization band around the reference RPM
pub const DEFAULT_RPM_TOLERANCE: f32 = 100.0;

/// Default RPM increase that still counts as "useful" extra power
pub const DEFAULT_RPM_THRESHOLD: f32 = 100.0;

// --- Report output ---

/// Base name for the per-run data file
pub const REPORT_BASE: &str = "calibration_data";

/// Default directory for per-run data files
#[cfg(feature = "std")]
pub const REPORT_DIR: &str = "/tmp";
