//! Distance calibration files
//!
//! Each file is plain text with one `distance_meters,value` row per sample.
//! A leading header row is skipped; blank lines are ignored.

use super::interpolation::InterpolationTable;
use crate::error::{CalibrationError, CoreError, InterpolationError};
use crate::lifecycle::{LifecycleNode, LifecycleNodeBase, State};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{error, info};

pub type CalibrationTable = InterpolationTable<f64, f64>;

/// Read a two-column calibration file into a fresh table
pub fn load_calibration_table(path: &Path) -> Result<CalibrationTable, CalibrationError> {
    let text = fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => CalibrationError::MissingCalibrationFile {
            path: path.to_path_buf(),
        },
        _ => CalibrationError::Unreadable {
            path: path.to_path_buf(),
            source: e,
        },
    })?;
    parse_calibration_table(path, &text)
}

/// Parse calibration text; `path` is only used for error context
pub fn parse_calibration_table(path: &Path, text: &str) -> Result<CalibrationTable, CalibrationError> {
    let mut table = CalibrationTable::new();
    let mut seen_row = false;

    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        let malformed = |reason: String| CalibrationError::MalformedCalibrationFile {
            path: path.to_path_buf(),
            line: index + 1,
            reason,
        };

        let columns: Vec<&str> = line.split(',').map(str::trim).collect();
        if columns.len() != 2 {
            return Err(malformed(format!("expected 2 columns, found {}", columns.len())));
        }

        let parsed = (columns[0].parse::<f64>(), columns[1].parse::<f64>());
        let (distance, value) = match parsed {
            (Ok(d), Ok(v)) => (d, v),
            // First non-empty row may be a header, but only if no column is numeric
            (Err(_), Err(_)) if !seen_row => {
                seen_row = true;
                continue;
            }
            _ => return Err(malformed(format!("non-numeric row '{line}'"))),
        };
        seen_row = true;

        if !distance.is_finite() || !value.is_finite() {
            return Err(malformed(format!("non-finite value in row '{line}'")));
        }
        table.insert(distance, value);
    }

    if table.is_empty() {
        return Err(CalibrationError::EmptyCalibrationFile {
            path: path.to_path_buf(),
        });
    }
    Ok(table)
}

/// Distance to flywheel velocity and distance to hood angle curves
pub struct ShooterTables {
    base: LifecycleNodeBase,
    velocity_path: PathBuf,
    hood_path: PathBuf,
    velocity: CalibrationTable,
    hood: CalibrationTable,
}

impl ShooterTables {
    pub fn new(velocity_path: impl Into<PathBuf>, hood_path: impl Into<PathBuf>) -> Self {
        ShooterTables {
            base: LifecycleNodeBase::new("Shooter"),
            velocity_path: velocity_path.into(),
            hood_path: hood_path.into(),
            velocity: CalibrationTable::new(),
            hood: CalibrationTable::new(),
        }
    }

    /// Build from already-populated tables, skipping file I/O
    pub fn from_tables(velocity: CalibrationTable, hood: CalibrationTable) -> Self {
        let mut base = LifecycleNodeBase::new("Shooter");
        base.set_state(State::Active);
        ShooterTables {
            base,
            velocity_path: PathBuf::new(),
            hood_path: PathBuf::new(),
            velocity,
            hood,
        }
    }

    pub fn is_available(&self) -> bool {
        self.base.is_active()
    }

    /// Flywheel velocity (rotations/s) for a distance; None unless active
    pub fn flywheel_velocity(&self, distance: f64) -> Option<f64> {
        self.sample(&self.velocity, distance)
    }

    /// Hood angle (degrees) for a distance; None unless active
    pub fn hood_angle(&self, distance: f64) -> Option<f64> {
        self.sample(&self.hood, distance)
    }

    fn sample(&self, table: &CalibrationTable, distance: f64) -> Option<f64> {
        if !self.is_available() {
            return None;
        }
        match table.lookup(distance) {
            Ok(v) => Some(v),
            Err(InterpolationError::EmptyTable) => None,
        }
    }
}

impl LifecycleNode for ShooterTables {
    fn name(&self) -> &str {
        &self.base.name
    }

    fn on_configure(&mut self) -> Result<(), CoreError> {
        let loaded = load_calibration_table(&self.velocity_path)
            .and_then(|v| load_calibration_table(&self.hood_path).map(|h| (v, h)));
        match loaded {
            Ok((velocity, hood)) => {
                info!(
                    "Loaded shooter tables: {} velocity points, {} hood points",
                    velocity.len(),
                    hood.len()
                );
                self.velocity = velocity;
                self.hood = hood;
                self.base.set_state(State::Inactive);
                Ok(())
            }
            Err(e) => {
                error!(subsystem = %self.base.name, path = %e.path().display(), "{e}");
                self.base.set_state(State::Faulted);
                Err(e.into())
            }
        }
    }

    fn on_activate(&mut self) -> Result<(), CoreError> {
        if self.base.get_state() != State::Inactive {
            return Err(CoreError::Config(format!(
                "{} cannot activate from {:?}",
                self.base.name,
                self.base.get_state()
            )));
        }
        self.base.set_state(State::Active);
        Ok(())
    }

    fn on_deactivate(&mut self) -> Result<(), CoreError> {
        if self.base.is_active() {
            self.base.set_state(State::Inactive);
        }
        Ok(())
    }

    fn on_cleanup(&mut self) -> Result<(), CoreError> {
        self.velocity = CalibrationTable::new();
        self.hood = CalibrationTable::new();
        self.base.set_state(State::Unconfigured);
        Ok(())
    }

    fn state(&self) -> State {
        self.base.get_state()
    }
}
