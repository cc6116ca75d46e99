//! Actuator adapter: name resolution and power-protocol dispatch
//!
//! Firmware hosts register fans under several naming conventions, and
//! different fan classes take their power over different commands. This
//! module resolves a logical name to a [`FanHandle`] once, pinning down the
//! protocol as a closed [`FanProtocol`] variant so the rest of the engine
//! never does runtime type inspection.
//!
//! Two protocols are driven, both scaling a [0, 1] power fraction to an
//! integer wire value in [0, 255]:
//! - `M106 S<n>` — the legacy percent-style part-cooling command
//! - `SET_FAN_SPEED FAN=<name> SPEED=<n>` — the named-fan command

use core::fmt::Write;

use heapless::String;

use crate::constants::{COMMAND_LINE_CAP, FAN_NAME_CAP, REGISTRY_KEY_CAP};
use crate::errors::{MeasureError, MeasureResult};
use crate::host::{DeviceRegistry, HostContext};
use crate::time::Timestamp;

/// Registry prefixes tried after the literal name, in order
const CATEGORY_PREFIXES: [&str; 2] = ["fan_generic", "heater_fan"];

/// Power-set protocol for a resolved fan, decided once at resolution time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanProtocol {
    /// `M106 S<0..255>`
    LegacyPercent,
    /// `SET_FAN_SPEED FAN=<name> SPEED=<0..255>`
    NamedSpeed,
    /// Recognized device, but no protocol this engine can drive.
    /// Power commands against it are skipped and the skip is reported.
    Unsupported,
}

/// A resolved fan: logical name, the registry key that matched, and protocol
#[derive(Debug, Clone)]
pub struct FanHandle {
    /// Logical name as given on the command line (used by `SET_FAN_SPEED`)
    pub name: String<FAN_NAME_CAP>,
    /// Registry key that actually resolved (may carry a category prefix)
    pub key: String<REGISTRY_KEY_CAP>,
    /// Power protocol, fixed for the lifetime of the handle
    pub protocol: FanProtocol,
}

/// Resolve a logical fan name against the device registry.
///
/// Tries the literal name first, then each category-qualified form
/// (`fan_generic <name>`, `heater_fan <name>`). The first key the registry
/// provides wins.
pub fn resolve(registry: &dyn DeviceRegistry, name: &str) -> MeasureResult<FanHandle> {
    let logical: String<FAN_NAME_CAP> = String::try_from(name)
        .map_err(|_| MeasureError::InvalidParam { param: "ACTUATOR" })?;

    let mut key: String<REGISTRY_KEY_CAP> = String::new();
    let _ = key.push_str(name);
    if let Some(dev) = registry.lookup(key.as_str()) {
        let protocol = dev.protocol();
        return Ok(FanHandle { name: logical, key, protocol });
    }

    for prefix in CATEGORY_PREFIXES {
        key.clear();
        let _ = write!(key, "{prefix} {name}");
        if let Some(dev) = registry.lookup(key.as_str()) {
            let protocol = dev.protocol();
            return Ok(FanHandle { name: logical, key, protocol });
        }
    }

    Err(MeasureError::ActuatorNotFound)
}

/// Scale a power fraction to the 0..255 wire range.
///
/// The fraction is clamped first; callers never have to pre-validate.
pub fn scale_to_wire(fraction: f32) -> u8 {
    let clamped = fraction.clamp(0.0, 1.0);
    libm::roundf(clamped * 255.0) as u8
}

/// Drive the fan to `fraction` of full power.
///
/// An [`FanProtocol::Unsupported`] handle makes this a reported no-op: the
/// skip goes to the responder (and log) every time, so a dataset recorded
/// against never-applied power levels is visibly flagged.
pub fn set_power(
    fan: &FanHandle,
    ctx: &mut HostContext<'_>,
    fraction: f32,
) -> MeasureResult<()> {
    let scaled = scale_to_wire(fraction);
    let mut cmd: String<COMMAND_LINE_CAP> = String::new();
    match fan.protocol {
        FanProtocol::LegacyPercent => {
            let _ = write!(cmd, "M106 S{scaled}");
        }
        FanProtocol::NamedSpeed => {
            let _ = write!(cmd, "SET_FAN_SPEED FAN={} SPEED={}", fan.name, scaled);
        }
        FanProtocol::Unsupported => {
            respond_info!(ctx, "Fan type of {} not supported, power command skipped", fan.name);
            log_warn!("unsupported fan protocol for {}, power command skipped", fan.name);
            return Err(MeasureError::UnsupportedProtocol);
        }
    }
    ctx.gcode.run_script(cmd.as_str());
    Ok(())
}

/// Read the tachometer via the registry key pinned at resolution time.
///
/// `None` means the device is gone or reports no tachometer value; the
/// caller decides whether that is fatal.
pub fn read_rpm(registry: &dyn DeviceRegistry, fan: &FanHandle, at: Timestamp) -> Option<f32> {
    registry.lookup(fan.key.as_str())?.rpm(at)
}
