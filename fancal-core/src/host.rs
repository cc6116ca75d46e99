//! Collaborator traits at the host boundary
//!
//! The measurement engine does not own the firmware host; it borrows it, one
//! timer callback at a time. Everything the engine needs from the host sits
//! behind the small traits here:
//!
//! - [`DeviceRegistry`] — named object lookup (a failed configuration lookup
//!   on the host side must be folded into `None`, never propagated)
//! - [`FanDevice`] — a resolved registry entry: protocol tag plus tachometer
//! - [`CommandSink`] — opaque textual command dispatch against the firmware
//! - [`Responder`] — human-readable lines back to the originating command
//! - [`ConfigWriter`] — staging area for derived settings, saved durably by
//!   the host on its own explicit save command
//!
//! [`HostContext`] bundles borrowed trait objects so the step functions take
//! one argument instead of five. References, not boxes: this works without
//! `alloc` and the borrows end when the step returns.

use crate::actuator::FanProtocol;
use crate::time::{Clock, Timestamp};

/// Named device lookup, backed by the host's object registry
pub trait DeviceRegistry {
    /// Resolve `name` to a device, or `None` if the registry has no such
    /// object (including the case where the host-side lookup errored).
    fn lookup(&self, name: &str) -> Option<&dyn FanDevice>;
}

/// A fan-like device resolved from the registry
pub trait FanDevice {
    /// Which power-set protocol this device speaks.
    ///
    /// Resolved once at actuator-resolution time; the engine never inspects
    /// the device's type again after this.
    fn protocol(&self) -> FanProtocol;

    /// Tachometer reading at `at`, or `None` if the device has no readable
    /// tachometer.
    fn rpm(&self, at: Timestamp) -> Option<f32>;
}

/// Executes a textual command against the firmware
pub trait CommandSink {
    /// Run one command line (e.g. `M106 S128`)
    fn run_script(&mut self, cmd: &str);
}

/// Response channel back to the command that started the run
pub trait Responder {
    /// Informational line
    fn info(&mut self, line: &str);
    /// Error line (command misuse, aborted run)
    fn error(&mut self, line: &str);
}

/// Stages configuration values for a later durable save
pub trait ConfigWriter {
    /// Stage `section.key = value`
    fn set(&mut self, section: &str, key: &str, value: &str);
}

/// Borrowed host collaborators, rebuilt by the host for every callback
pub struct HostContext<'a> {
    /// Device registry
    pub registry: &'a dyn DeviceRegistry,
    /// Firmware command dispatch
    pub gcode: &'a mut dyn CommandSink,
    /// Response channel for the originating command
    pub responder: &'a mut dyn Responder,
    /// Config staging
    pub config: &'a mut dyn ConfigWriter,
    /// Monotonic clock
    pub clock: &'a dyn Clock,
}

impl HostContext<'_> {
    /// Current monotonic time in milliseconds
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }
}
