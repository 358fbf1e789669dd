//! Key/value telemetry
pub mod registry;

pub use registry::OutputRegistry;

use crate::common::types::{Pose2D, Translation2D};
use std::collections::BTreeMap;
use tracing::trace;

/// A single logged value
#[derive(Debug, Clone, PartialEq)]
pub enum TelemetryValue {
    Number(f64),
    Boolean(bool),
    Text(String),
    Translation(Translation2D),
    Pose(Pose2D),
}

impl From<f64> for TelemetryValue {
    fn from(v: f64) -> Self {
        TelemetryValue::Number(v)
    }
}

impl From<bool> for TelemetryValue {
    fn from(v: bool) -> Self {
        TelemetryValue::Boolean(v)
    }
}

impl From<&str> for TelemetryValue {
    fn from(v: &str) -> Self {
        TelemetryValue::Text(v.to_string())
    }
}

impl From<Translation2D> for TelemetryValue {
    fn from(v: Translation2D) -> Self {
        TelemetryValue::Translation(v)
    }
}

impl From<Pose2D> for TelemetryValue {
    fn from(v: Pose2D) -> Self {
        TelemetryValue::Pose(v)
    }
}

/// Destination for per-cycle records
pub trait TelemetrySink {
    fn record(&mut self, key: &str, value: TelemetryValue);
}

/// Keeps the latest value of every key
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    values: BTreeMap<String, TelemetryValue>,
    records: usize,
}

impl MemorySink {
    pub fn new() -> Self {
        MemorySink::default()
    }

    pub fn get(&self, key: &str) -> Option<&TelemetryValue> {
        self.values.get(key)
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        match self.values.get(key) {
            Some(TelemetryValue::Number(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn boolean(&self, key: &str) -> Option<bool> {
        match self.values.get(key) {
            Some(TelemetryValue::Boolean(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        match self.values.get(key) {
            Some(TelemetryValue::Text(v)) => Some(v),
            _ => None,
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Total records received, including overwrites
    pub fn records(&self) -> usize {
        self.records
    }
}

impl TelemetrySink for MemorySink {
    fn record(&mut self, key: &str, value: TelemetryValue) {
        self.records += 1;
        self.values.insert(key.to_string(), value);
    }
}

/// Forwards every record to `tracing` at trace level on the `telemetry` target
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl TelemetrySink for TracingSink {
    fn record(&mut self, key: &str, value: TelemetryValue) {
        trace!(target: "telemetry", key, value = ?value);
    }
}
