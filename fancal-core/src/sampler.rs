//! Measurement points and the bounded per-run sample log
//!
//! One reading per step-function invocation; the caller decides how many
//! invocations make up a power step. Insertion order is the sweep
//! progression and is preserved verbatim into the output file.

use heapless::Vec;

use crate::constants::MAX_POINTS;
use crate::errors::{MeasureError, MeasureResult};

/// One recorded (power, RPM) pair
///
/// `rpm == None` is a recorded fact ("sensor had no reading here"), not an
/// error: the sweep keeps going and the absence lands in the dataset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeasurementPoint {
    /// Power at sampling time, as a percentage in [0, 100]
    pub power_pct: f32,
    /// Tachometer reading, if the sensor produced one
    pub rpm: Option<f32>,
}

/// Ordered, bounded log of measurement points for one run
#[derive(Debug, Default)]
pub struct SampleLog {
    points: Vec<MeasurementPoint, MAX_POINTS>,
}

impl SampleLog {
    /// Empty log
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    /// Append one point, preserving insertion order
    pub fn record(&mut self, power_pct: f32, rpm: Option<f32>) -> MeasureResult<()> {
        self.points
            .push(MeasurementPoint { power_pct, rpm })
            .map_err(|_| MeasureError::LogFull { capacity: MAX_POINTS })
    }

    /// Recorded points in insertion order
    pub fn points(&self) -> &[MeasurementPoint] {
        &self.points
    }

    /// Number of recorded points
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True if nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Drop all points (run reset)
    pub fn clear(&mut self) {
        self.points.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_is_preserved() {
        let mut log = SampleLog::new();
        log.record(0.0, Some(0.0)).unwrap();
        log.record(10.0, None).unwrap();
        log.record(20.0, Some(1200.0)).unwrap();

        let pts = log.points();
        assert_eq!(pts.len(), 3);
        assert_eq!(pts[0].power_pct, 0.0);
        assert_eq!(pts[1].rpm, None);
        assert_eq!(pts[2].rpm, Some(1200.0));
    }

    #[test]
    fn overflow_reports_capacity() {
        let mut log = SampleLog::new();
        for _ in 0..MAX_POINTS {
            log.record(50.0, Some(1.0)).unwrap();
        }
        let err = log.record(50.0, Some(1.0)).unwrap_err();
        assert_eq!(err, MeasureError::LogFull { capacity: MAX_POINTS });
    }
}
