//! Error types for measurement runs
//!
//! Errors are run-scoped and never crash the host process: every failure is
//! reported through the command responder and leaves the controller ready for
//! a clean subsequent run. Variants are kept small and `Copy` since they are
//! returned from the timer-driven step path.
//!
//! Taxonomy:
//! - `ActuatorNotFound`, `InvalidParam` — bad user input; the run never starts
//! - `MeasureBusy` — start requested while a run is active; no state changes
//! - `SensorUnavailable` — tachometer unreadable where the machine cannot
//!   continue (fatal for spin-up, recorded as an absent value by the sweep)
//! - `UnsupportedProtocol` — recognized device, unknown power protocol; the
//!   power command is skipped and the skip is reported
//! - `LogFull` — requested configuration exceeds the bounded measurement log

use thiserror_no_std::Error;

/// Result type for measurement operations
pub type MeasureResult<T> = Result<T, MeasureError>;

/// Measurement errors - kept small and Copy for the step path
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasureError {
    /// No device registry entry matched any naming convention
    #[error("actuator not found in device registry")]
    ActuatorNotFound,

    /// A measurement run is already active
    #[error("measurement already in progress")]
    MeasureBusy,

    /// The tachometer reported no reading
    #[error("tachometer reading unavailable")]
    SensorUnavailable,

    /// The device's power protocol is not one this crate can drive
    #[error("actuator power protocol not supported")]
    UnsupportedProtocol,

    /// A command argument failed to parse or was out of range
    #[error("invalid value for parameter {param}")]
    InvalidParam {
        /// Name of the offending command parameter
        param: &'static str,
    },

    /// The requested run would not fit the bounded measurement log
    #[error("measurement log full (capacity {capacity})")]
    LogFull {
        /// Fixed capacity of the measurement log
        capacity: usize,
    },
}

#[cfg(feature = "defmt")]
impl defmt::Format for MeasureError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::ActuatorNotFound => defmt::write!(fmt, "actuator not found"),
            Self::MeasureBusy => defmt::write!(fmt, "measurement busy"),
            Self::SensorUnavailable => defmt::write!(fmt, "tachometer unavailable"),
            Self::UnsupportedProtocol => defmt::write!(fmt, "protocol not supported"),
            Self::InvalidParam { param } => defmt::write!(fmt, "invalid parameter {}", param),
            Self::LogFull { capacity } => defmt::write!(fmt, "log full (capacity {})", capacity),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_are_copy_and_small() {
        let e = MeasureError::InvalidParam { param: "STEPS" };
        let e2 = e; // Copy
        assert_eq!(e, e2);
        assert!(core::mem::size_of::<MeasureError>() <= 24);
    }

    #[cfg(feature = "std")]
    #[test]
    fn display_names_the_parameter() {
        let e = MeasureError::InvalidParam { param: "STEPS" };
        assert_eq!(e.to_string(), "invalid value for parameter STEPS");
    }
}
