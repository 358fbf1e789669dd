//! Error types for the turret core

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type
#[derive(Error, Debug)]
pub enum CoreError {
    #[error(transparent)]
    Calibration(#[from] CalibrationError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid value {value} for tunable {key}")]
    InvalidTunable { key: String, value: f64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<toml::de::Error> for CoreError {
    fn from(e: toml::de::Error) -> Self {
        CoreError::Config(e.to_string())
    }
}

/// Failures while reading a distance calibration file
#[derive(Error, Debug)]
pub enum CalibrationError {
    #[error("calibration file {} does not exist", path.display())]
    MissingCalibrationFile { path: PathBuf },

    #[error("calibration file {}: line {line}: {reason}", path.display())]
    MalformedCalibrationFile {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("calibration file {} has no data rows", path.display())]
    EmptyCalibrationFile { path: PathBuf },

    #[error("failed to read calibration file {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CalibrationError {
    /// File the error refers to
    pub fn path(&self) -> &PathBuf {
        match self {
            CalibrationError::MissingCalibrationFile { path }
            | CalibrationError::MalformedCalibrationFile { path, .. }
            | CalibrationError::EmptyCalibrationFile { path }
            | CalibrationError::Unreadable { path, .. } => path,
        }
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpolationError {
    #[error("lookup on an empty interpolation table")]
    EmptyTable,
}

/// A sensor or collaborator read that did not produce a value this cycle
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SensorError {
    #[error("{sensor} is disconnected")]
    Disconnected { sensor: String },

    #[error("{sensor} reported a stale sample")]
    Stale { sensor: String },
}

/// A startup-time failure that disabled one subsystem
#[derive(Error, Debug)]
#[error("subsystem {subsystem} failed to start: {source}")]
pub struct StartupError {
    pub subsystem: String,
    #[source]
    pub source: CoreError,
}

pub type Result<T> = std::result::Result<T, CoreError>;
