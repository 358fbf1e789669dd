//! Live-tunable values
//!
//! Values are registered under `/Tuning/...` keys with a default and can be
//! changed at any time from the network side. Readers hold cheap handles and
//! call `get()` every cycle, so a change takes effect on the next read.

use crate::control::controllers::PidGains;
use crate::control::trajectory::Constraints;
use crate::error::{CoreError, Result};
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TunableValue {
    Number(f64),
    Boolean(bool),
}

/// Shared store of tunable values
#[derive(Debug, Clone, Default)]
pub struct TunableRegistry {
    values: Arc<RwLock<BTreeMap<String, TunableValue>>>,
}

impl TunableRegistry {
    pub fn new() -> Self {
        TunableRegistry::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<String, TunableValue>> {
        self.values.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<String, TunableValue>> {
        self.values.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Register a number (keeping any existing value) and return a handle
    pub fn number(&self, key: &str, default: f64) -> TunableNumber {
        self.write()
            .entry(key.to_string())
            .or_insert(TunableValue::Number(default));
        TunableNumber {
            registry: self.clone(),
            key: key.to_string(),
            default,
        }
    }

    /// Register a boolean (keeping any existing value) and return a handle
    pub fn boolean(&self, key: &str, default: bool) -> TunableBool {
        self.write()
            .entry(key.to_string())
            .or_insert(TunableValue::Boolean(default));
        TunableBool {
            registry: self.clone(),
            key: key.to_string(),
            default,
        }
    }

    pub fn set_number(&self, key: &str, value: f64) -> Result<()> {
        if !value.is_finite() {
            return Err(CoreError::InvalidTunable {
                key: key.to_string(),
                value,
            });
        }
        let mut values = self.write();
        match values.get(key) {
            Some(TunableValue::Boolean(_)) => Err(CoreError::Config(format!("{key} is a boolean tunable"))),
            _ => {
                values.insert(key.to_string(), TunableValue::Number(value));
                Ok(())
            }
        }
    }

    pub fn set_bool(&self, key: &str, value: bool) -> Result<()> {
        let mut values = self.write();
        match values.get(key) {
            Some(TunableValue::Number(_)) => Err(CoreError::Config(format!("{key} is a numeric tunable"))),
            _ => {
                values.insert(key.to_string(), TunableValue::Boolean(value));
                Ok(())
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<TunableValue> {
        self.read().get(key).copied()
    }

    pub fn keys(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }
}

/// Handle to a numeric tunable
#[derive(Debug, Clone)]
pub struct TunableNumber {
    registry: TunableRegistry,
    key: String,
    default: f64,
}

impl TunableNumber {
    pub fn get(&self) -> f64 {
        match self.registry.get(&self.key) {
            Some(TunableValue::Number(v)) => v,
            _ => self.default,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

/// Handle to a boolean tunable
#[derive(Debug, Clone)]
pub struct TunableBool {
    registry: TunableRegistry,
    key: String,
    default: bool,
}

impl TunableBool {
    pub fn get(&self) -> bool {
        match self.registry.get(&self.key) {
            Some(TunableValue::Boolean(v)) => v,
            _ => self.default,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

/// kP/kI/kD under `/Tuning/<group>/<name>/`
#[derive(Debug, Clone)]
pub struct TunableGains {
    kp: TunableNumber,
    ki: TunableNumber,
    kd: TunableNumber,
}

impl TunableGains {
    pub fn new(registry: &TunableRegistry, group: &str, name: &str, defaults: PidGains) -> Self {
        let path = format!("/Tuning/{group}/{name}");
        TunableGains {
            kp: registry.number(&format!("{path}/kP"), defaults.kp),
            ki: registry.number(&format!("{path}/kI"), defaults.ki),
            kd: registry.number(&format!("{path}/kD"), defaults.kd),
        }
    }

    pub fn get(&self) -> PidGains {
        PidGains::new(self.kp.get(), self.ki.get(), self.kd.get())
    }
}

/// Max velocity/acceleration pair for a motion profile
#[derive(Debug, Clone)]
pub struct TunableConstraints {
    max_velocity: TunableNumber,
    max_acceleration: TunableNumber,
}

impl TunableConstraints {
    pub fn new(registry: &TunableRegistry, prefix: &str, defaults: Constraints) -> Self {
        TunableConstraints {
            max_velocity: registry.number(&format!("{prefix}MaxVelocity"), defaults.max_velocity),
            max_acceleration: registry.number(&format!("{prefix}MaxAcceleration"), defaults.max_acceleration),
        }
    }

    pub fn get(&self) -> Constraints {
        Constraints::new(self.max_velocity.get(), self.max_acceleration.get())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_sees_live_changes() {
        let registry = TunableRegistry::new();
        let flag = registry.boolean("/Tuning/disableShotCompensation", false);
        assert!(!flag.get());
        registry.set_bool("/Tuning/disableShotCompensation", true).unwrap();
        assert!(flag.get());
    }

    #[test]
    fn re_registering_keeps_value() {
        let registry = TunableRegistry::new();
        registry.number("/Tuning/x", 1.0);
        registry.set_number("/Tuning/x", 5.0).unwrap();
        assert_eq!(registry.number("/Tuning/x", 1.0).get(), 5.0);
    }

    #[test]
    fn non_finite_numbers_are_rejected() {
        let registry = TunableRegistry::new();
        let n = registry.number("/Tuning/kP", 2.0);
        assert!(matches!(
            registry.set_number("/Tuning/kP", f64::NAN),
            Err(CoreError::InvalidTunable { .. })
        ));
        assert_eq!(n.get(), 2.0);
    }

    #[test]
    fn type_mismatch_is_rejected() {
        let registry = TunableRegistry::new();
        registry.boolean("/Tuning/flag", false);
        assert!(registry.set_number("/Tuning/flag", 1.0).is_err());
        registry.number("/Tuning/n", 0.0);
        assert!(registry.set_bool("/Tuning/n", true).is_err());
    }

    #[test]
    fn gains_follow_path_layout() {
        let registry = TunableRegistry::new();
        let gains = TunableGains::new(&registry, "AutoAlignment", "x Gains", PidGains::new(4.0, 0.0, 0.0));
        registry.set_number("/Tuning/AutoAlignment/x Gains/kD", 0.3).unwrap();
        assert_eq!(gains.get(), PidGains::new(4.0, 0.0, 0.3));
    }
}
