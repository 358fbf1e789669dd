//! Ball presence sensors

use super::filters::{Debouncer, Filter};
use crate::error::SensorError;
use std::time::Duration;

/// Result of reading a boolean sensor this cycle
pub type Reading = Result<bool, SensorError>;

/// A beam-break or time-of-flight sensor reporting whether something is in front of it
pub trait ProximitySensor {
    /// Get the sensor name
    fn name(&self) -> &str;

    fn is_detecting(&self) -> Reading;
}

/// A proximity sensor read through a rising-edge debouncer
#[derive(Debug, Clone)]
pub struct DebouncedBallSensor {
    debouncer: Debouncer,
    last: Reading,
}

impl DebouncedBallSensor {
    pub fn new(window: Duration) -> Self {
        DebouncedBallSensor {
            debouncer: Debouncer::new(window),
            last: Ok(false),
        }
    }

    /// Read the sensor and debounce the result.
    ///
    /// A failed read clears the debounce history so a ball is only reported
    /// again after a full window of good reads.
    pub fn sample(&mut self, sensor: &dyn ProximitySensor, now: Duration) -> Reading {
        self.last = match sensor.is_detecting() {
            Ok(raw) => Ok(self.debouncer.filter(raw, now)),
            Err(e) => {
                self.debouncer.reset();
                Err(e)
            }
        };
        self.last.clone()
    }

    /// Value produced by the most recent `sample`
    pub fn last(&self) -> &Reading {
        &self.last
    }
}
