//! CSV persistence and power-limit recommendation (std only)
//!
//! One flat file per run: header `Power, RPM`, one row per recorded point,
//! power written as a fraction in [0, 1] with two decimals. The offline
//! plotting tooling consumes exactly this shape, so the format is frozen.
//!
//! `recommend_limits` reproduces the analysis the offline tooling performs:
//! the minimum power that produced rotation and the highest power that still
//! bought a meaningful RPM increase.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::sampler::MeasurementPoint;

/// Recommended operating limits derived from one sweep
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerLimits {
    /// Lowest power fraction that produced rotation
    pub min_power: f32,
    /// RPM observed at `min_power`
    pub min_rpm: f32,
    /// Highest power fraction that still increased RPM beyond the threshold
    pub max_power: f32,
    /// RPM observed at `max_power`
    pub max_rpm: f32,
}

/// Write the recorded points to `<dir>/<base>_<fan_name>_<stamp>.csv`.
///
/// Unreadable samples are written as `0.00` RPM: the row shape must stay two
/// fixed-point columns, and zero preserves "did not spin" semantics for the
/// aggregation downstream.
pub fn save_csv(
    dir: &Path,
    base: &str,
    fan_name: &str,
    stamp: &str,
    points: &[MeasurementPoint],
) -> io::Result<PathBuf> {
    let path = dir.join(format!("{base}_{fan_name}_{stamp}.csv"));
    let mut out = BufWriter::new(File::create(&path)?);
    writeln!(out, "Power, RPM")?;
    for point in points {
        writeln!(
            out,
            "{:.2}, {:.2}",
            point.power_pct / 100.0,
            point.rpm.unwrap_or(0.0)
        )?;
    }
    out.flush()?;
    Ok(path)
}

/// Read back a per-run CSV as (power fraction, rpm) rows.
///
/// Malformed rows are skipped rather than failing the whole file, matching
/// the tolerance of the offline tooling.
pub fn load_csv(path: &Path) -> io::Result<std::vec::Vec<(f32, f32)>> {
    let reader = BufReader::new(File::open(path)?);
    let mut rows = std::vec::Vec::new();
    for line in reader.lines().skip(1) {
        let line = line?;
        let mut cols = line.split(',');
        let (Some(power), Some(rpm)) = (cols.next(), cols.next()) else {
            continue;
        };
        let (Ok(power), Ok(rpm)) = (power.trim().parse(), rpm.trim().parse()) else {
            continue;
        };
        rows.push((power, rpm));
    }
    Ok(rows)
}

/// Derive min/max power recommendations from a sweep's points.
///
/// - `min_power`: the power of the point with the lowest non-zero RPM (the
///   cheapest setting that still moved air)
/// - `max_power`: the last power whose RPM exceeded the running maximum by
///   more than `rpm_threshold` (past it, extra power buys only noise)
///
/// Returns `None` when no point recorded rotation.
pub fn recommend_limits(points: &[MeasurementPoint], rpm_threshold: f32) -> Option<PowerLimits> {
    let mut limits: Option<PowerLimits> = None;
    for point in points {
        let Some(rpm) = point.rpm else { continue };
        if rpm <= 0.0 {
            continue;
        }
        let power = point.power_pct / 100.0;
        match &mut limits {
            None => {
                limits = Some(PowerLimits {
                    min_power: power,
                    min_rpm: rpm,
                    max_power: power,
                    max_rpm: rpm,
                });
            }
            Some(l) => {
                if rpm < l.min_rpm {
                    l.min_power = power;
                    l.min_rpm = rpm;
                }
                if rpm > l.max_rpm + rpm_threshold {
                    l.max_power = power;
                    l.max_rpm = rpm;
                }
            }
        }
    }
    limits
}
