mod common;

use approx::assert_relative_eq;
use common::{write_file, HOOD_CSV, VELOCITY_CSV};
use tempfile::TempDir;
use turret_core::error::{CalibrationError, CoreError};
use turret_core::lifecycle::{LifecycleNode, State};
use turret_core::shooting::{load_calibration_table, ShooterTables};

#[test]
fn loads_file_with_header() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "velocity.csv", VELOCITY_CSV);
    let table = load_calibration_table(&path).unwrap();
    assert_eq!(table.len(), 3);
    assert_relative_eq!(table.lookup(2.0).unwrap(), 35.0);
    // Clamped past both ends
    assert_relative_eq!(table.lookup(0.2).unwrap(), 30.0);
    assert_relative_eq!(table.lookup(9.0).unwrap(), 50.0);
}

#[test]
fn malformed_row_reports_line_and_path() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "bad.csv", "distance,velocity\n1.0,30.0\n\n2.0;35.0\n");
    match load_calibration_table(&path) {
        Err(CalibrationError::MalformedCalibrationFile { path: p, line, .. }) => {
            assert_eq!(p, path);
            assert_eq!(line, 4);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn tables_follow_lifecycle() {
    let dir = TempDir::new().unwrap();
    let mut tables = ShooterTables::new(
        write_file(&dir, "velocity.csv", VELOCITY_CSV),
        write_file(&dir, "hood.csv", HOOD_CSV),
    );
    assert_eq!(tables.state(), State::Unconfigured);
    assert_eq!(tables.flywheel_velocity(2.0), None);

    tables.on_configure().unwrap();
    assert_eq!(tables.state(), State::Inactive);
    assert!(!tables.is_available());

    tables.on_activate().unwrap();
    assert!(tables.is_available());
    assert_relative_eq!(tables.flywheel_velocity(4.0).unwrap(), 45.0);
    assert_relative_eq!(tables.hood_angle(2.0).unwrap(), 10.0);

    tables.on_deactivate().unwrap();
    assert_eq!(tables.hood_angle(2.0), None);
    tables.on_cleanup().unwrap();
    assert_eq!(tables.state(), State::Unconfigured);
}

#[test]
fn missing_hood_file_faults_both_tables() {
    let dir = TempDir::new().unwrap();
    let mut tables = ShooterTables::new(
        write_file(&dir, "velocity.csv", VELOCITY_CSV),
        dir.path().join("hood.csv"),
    );
    let err = tables.on_configure().unwrap_err();
    assert!(matches!(
        err,
        CoreError::Calibration(CalibrationError::MissingCalibrationFile { ref path }) if path.ends_with("hood.csv")
    ));
    assert_eq!(tables.state(), State::Faulted);
    assert!(tables.on_activate().is_err());
    assert_eq!(tables.flywheel_velocity(2.0), None);
}
