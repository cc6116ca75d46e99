//! CSV format round-trip and filename tests

use fancal_core::report::{load_csv, save_csv};
use fancal_core::MeasurementPoint;
use tempfile::tempdir;

fn pt(power_pct: f32, rpm: Option<f32>) -> MeasurementPoint {
    MeasurementPoint { power_pct, rpm }
}

#[test]
fn roundtrip_preserves_order_and_values() {
    let dir = tempdir().unwrap();
    let points = [
        pt(0.0, Some(0.0)),
        pt(10.0, Some(0.0)),
        pt(20.0, Some(743.21)),
        pt(30.0, None), // unreadable: lands in the file as 0.00
        pt(40.0, Some(1288.88)),
        pt(100.0, Some(2001.5)),
    ];

    let path = save_csv(dir.path(), "calibration_data", "fan", "20260830_120000", &points).unwrap();
    assert_eq!(
        path.file_name().unwrap().to_str().unwrap(),
        "calibration_data_fan_20260830_120000.csv"
    );

    let rows = load_csv(&path).unwrap();
    assert_eq!(rows.len(), points.len());
    for (row, point) in rows.iter().zip(&points) {
        assert!((row.0 - point.power_pct / 100.0).abs() < 0.01);
        assert!((row.1 - point.rpm.unwrap_or(0.0)).abs() < 0.01);
    }
}

#[test]
fn header_and_row_format_are_frozen() {
    let dir = tempdir().unwrap();
    let points = [pt(50.0, Some(1234.567))];
    let path = save_csv(dir.path(), "calibration_data", "fan", "stamp", &points).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("Power, RPM"));
    assert_eq!(lines.next(), Some("0.50, 1234.57"));
    assert_eq!(lines.next(), None);
}

#[test]
fn loader_skips_malformed_rows() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("hand_edited.csv");
    std::fs::write(
        &path,
        "Power, RPM\n0.10, 100.00\nnot a row\n0.20\n0.30, nan_rpm\n0.40, 400.00\n",
    )
    .unwrap();

    let rows = load_csv(&path).unwrap();
    assert_eq!(rows, vec![(0.10, 100.00), (0.40, 400.00)]);
}

#[test]
fn empty_run_still_produces_a_parseable_file() {
    let dir = tempdir().unwrap();
    let path = save_csv(dir.path(), "calibration_data", "fan", "stamp", &[]).unwrap();
    let rows = load_csv(&path).unwrap();
    assert!(rows.is_empty());
}
