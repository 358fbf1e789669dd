//! Lifecycle management for startup-loaded components

use crate::error::CoreError;

/// Trait for components that follow a lifecycle pattern
pub trait LifecycleNode {
    /// Name used in startup reports and telemetry
    fn name(&self) -> &str;

    /// Load resources (files, tunables). Failing here leaves the node faulted.
    fn on_configure(&mut self) -> Result<(), CoreError>;

    /// Activate the node
    fn on_activate(&mut self) -> Result<(), CoreError>;

    /// Deactivate the node
    fn on_deactivate(&mut self) -> Result<(), CoreError>;

    /// Release loaded resources
    fn on_cleanup(&mut self) -> Result<(), CoreError>;

    fn state(&self) -> State;
}

/// Base implementation for lifecycle nodes
#[derive(Debug, Clone)]
pub struct LifecycleNodeBase {
    pub name: String,
    state: State,
}

/// State of a lifecycle node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Unconfigured,
    Inactive,
    Active,
    /// Configuration failed; the node refuses to produce output
    Faulted,
}

impl LifecycleNodeBase {
    /// Create a new lifecycle node base
    pub fn new(name: &str) -> Self {
        LifecycleNodeBase {
            name: name.to_string(),
            state: State::Unconfigured,
        }
    }

    /// Get the current state
    pub fn get_state(&self) -> State {
        self.state
    }

    /// Set the state
    pub fn set_state(&mut self, state: State) {
        self.state = state;
    }

    pub fn is_active(&self) -> bool {
        self.state == State::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_active_counts_as_active() {
        let mut base = LifecycleNodeBase::new("Shooter");
        assert_eq!(base.get_state(), State::Unconfigured);
        for state in [State::Unconfigured, State::Inactive, State::Faulted] {
            base.set_state(state);
            assert!(!base.is_active());
        }
        base.set_state(State::Active);
        assert!(base.is_active());
    }
}
