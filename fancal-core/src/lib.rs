//! Fan characterization engine for motion-control firmware hosts
//!
//! Drives an automated fan measurement procedure inside a single-threaded,
//! cooperative firmware event loop: a power sweep that records (power, RPM)
//! pairs across the actuator's range, and a spin-up timer that measures how
//! long the fan takes to reach a target RPM band.
//!
//! Key constraints:
//! - The host event loop is never blocked; every step function returns a
//!   [`Wake`] instruction and the host's timer does the waiting
//! - No heap allocation in the step path (bounded `heapless` buffers)
//! - At most one measurement run is active process-wide
//!
//! ```no_run
//! use fancal_core::{RunController, Wake};
//! use fancal_core::host::{HostContext, DeviceRegistry, FanDevice, CommandSink,
//!                         Responder, ConfigWriter};
//! use fancal_core::time::FixedClock;
//!
//! struct NoDevices;
//! impl DeviceRegistry for NoDevices {
//!     fn lookup(&self, _name: &str) -> Option<&dyn FanDevice> { None }
//! }
//! struct Firmware;
//! impl CommandSink for Firmware {
//!     fn run_script(&mut self, _cmd: &str) {}
//! }
//! struct Console;
//! impl Responder for Console {
//!     fn info(&mut self, line: &str) { println!("// {line}"); }
//!     fn error(&mut self, line: &str) { println!("!! {line}"); }
//! }
//! struct Staging;
//! impl ConfigWriter for Staging {
//!     fn set(&mut self, _section: &str, _key: &str, _value: &str) {}
//! }
//!
//! let registry = NoDevices;
//! let clock = FixedClock::new(0);
//! let mut gcode = Firmware;
//! let mut responder = Console;
//! let mut config = Staging;
//! let mut ctx = HostContext {
//!     registry: &registry,
//!     gcode: &mut gcode,
//!     responder: &mut responder,
//!     config: &mut config,
//!     clock: &clock,
//! };
//!
//! let mut controller = RunController::new();
//! // No fan registered, so the command is rejected without a run starting.
//! let wake = controller.dispatch("START_SWEEP ACTUATOR=exhaust", &mut ctx);
//! assert!(matches!(wake, Wake::Never));
//! assert!(!controller.is_active());
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

#[macro_use]
mod macros;

pub mod actuator;
pub mod command;
pub mod constants;
pub mod errors;
pub mod host;
pub mod runner;
pub mod sampler;
pub mod spinup;
pub mod sweep;
pub mod time;

#[cfg(feature = "std")]
pub mod report;

// Public API
pub use actuator::{FanHandle, FanProtocol};
pub use errors::{MeasureError, MeasureResult};
pub use runner::RunController;
pub use sampler::MeasurementPoint;
pub use time::{Timestamp, Wake};

/// Crate version string
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_exists() {
        assert!(!VERSION.is_empty());
    }
}
