//! Fault-aware predicate combinators
//!
//! Guards are built from sensor [`Reading`]s. A faulted reading is unknown,
//! not false: `both`/`either` short-circuit on a known result and otherwise carry
//! the fault, so a guard never fires on bad data.

use crate::error::SensorError;
use crate::perception::Reading;
use tracing::{info, warn};

pub trait Predicate: Sized {
    fn both(self, other: Reading) -> Reading;
    fn either(self, other: Reading) -> Reading;
    fn negate(self) -> Reading;
}

impl Predicate for Reading {
    fn both(self, other: Reading) -> Reading {
        match (self, other) {
            (Ok(false), _) | (_, Ok(false)) => Ok(false),
            (Ok(true), Ok(true)) => Ok(true),
            (Err(e), _) | (_, Err(e)) => Err(e),
        }
    }

    fn either(self, other: Reading) -> Reading {
        match (self, other) {
            (Ok(true), _) | (_, Ok(true)) => Ok(true),
            (Ok(false), Ok(false)) => Ok(false),
            (Err(e), _) | (_, Err(e)) => Err(e),
        }
    }

    fn negate(self) -> Reading {
        self.map(|v| !v)
    }
}

/// Lift a plain flag into a reading
pub fn known(value: bool) -> Reading {
    Ok(value)
}

/// A guard holds only on a good reading of true
pub fn holds(reading: &Reading) -> bool {
    matches!(reading, Ok(true))
}

/// Logs a fault once when it appears and once when it clears
#[derive(Debug, Clone)]
pub struct FaultLatch {
    name: String,
    faulted: bool,
}

impl FaultLatch {
    pub fn new(name: impl Into<String>) -> Self {
        FaultLatch {
            name: name.into(),
            faulted: false,
        }
    }

    /// Record this cycle's result; returns whether it is faulted
    pub fn observe<T>(&mut self, result: &Result<T, SensorError>) -> bool {
        match result {
            Err(e) => {
                if !self.faulted {
                    warn!("{} faulted: {}", self.name, e);
                }
                self.faulted = true;
            }
            Ok(_) => {
                if self.faulted {
                    info!("{} recovered", self.name);
                }
                self.faulted = false;
            }
        }
        self.faulted
    }

    pub fn is_faulted(&self) -> bool {
        self.faulted
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}
