//! Feedback controllers for the robot

use super::trajectory::{Constraints, ProfileState, TrapezoidProfile};
use crate::common::input_modulus;

/// Proportional, integral and derivative gains
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PidGains {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
}

impl PidGains {
    pub fn new(kp: f64, ki: f64, kd: f64) -> Self {
        PidGains { kp, ki, kd }
    }

    /// Gains must be finite and non-negative
    pub fn is_valid(&self) -> bool {
        [self.kp, self.ki, self.kd]
            .iter()
            .all(|g| g.is_finite() && *g >= 0.0)
    }
}

/// Discrete PID controller running at a fixed period
#[derive(Debug, Clone)]
pub struct PidController {
    gains: PidGains,
    period: f64,
    continuous: Option<(f64, f64)>,
    integrator_limit: f64,
    position_tolerance: f64,
    setpoint: f64,
    position_error: f64,
    prev_error: Option<f64>,
    total_error: f64,
}

impl PidController {
    pub fn new(gains: PidGains, period: f64) -> Self {
        PidController {
            gains,
            period,
            continuous: None,
            integrator_limit: 1.0,
            position_tolerance: 0.05,
            setpoint: 0.0,
            position_error: 0.0,
            prev_error: None,
            total_error: 0.0,
        }
    }

    pub fn gains(&self) -> PidGains {
        self.gains
    }

    pub fn set_gains(&mut self, gains: PidGains) {
        self.gains = gains;
    }

    /// Treat inputs as circular over [min, max], e.g. headings
    pub fn enable_continuous_input(&mut self, min: f64, max: f64) {
        self.continuous = Some((min, max));
    }

    pub fn set_tolerance(&mut self, tolerance: f64) {
        self.position_tolerance = tolerance;
    }

    pub fn tolerance(&self) -> f64 {
        self.position_tolerance
    }

    /// Error relative to the last setpoint, wrapped when continuous
    pub fn wrap_error(&self, error: f64) -> f64 {
        match self.continuous {
            Some((min, max)) => {
                let bound = (max - min) / 2.0;
                input_modulus(error, -bound, bound)
            }
            None => error,
        }
    }

    pub fn continuous_range(&self) -> Option<(f64, f64)> {
        self.continuous
    }

    pub fn calculate(&mut self, measurement: f64, setpoint: f64) -> f64 {
        self.setpoint = setpoint;
        self.position_error = self.wrap_error(setpoint - measurement);

        let derivative = match self.prev_error {
            Some(prev) => (self.position_error - prev) / self.period,
            None => 0.0,
        };
        self.prev_error = Some(self.position_error);

        if self.gains.ki != 0.0 {
            let limit = self.integrator_limit / self.gains.ki;
            self.total_error = (self.total_error + self.position_error * self.period).clamp(-limit, limit);
        }

        self.gains.kp * self.position_error + self.gains.ki * self.total_error + self.gains.kd * derivative
    }

    pub fn at_setpoint(&self) -> bool {
        self.prev_error.is_some() && self.position_error.abs() <= self.position_tolerance
    }

    pub fn reset(&mut self) {
        self.prev_error = None;
        self.total_error = 0.0;
        self.position_error = 0.0;
    }
}

/// PID controller whose setpoint follows a trapezoidal profile toward a goal
#[derive(Debug, Clone)]
pub struct ProfiledPidController {
    pid: PidController,
    profile: TrapezoidProfile,
    goal: ProfileState,
    setpoint: ProfileState,
    last_measurement: Option<f64>,
}

impl ProfiledPidController {
    pub fn new(gains: PidGains, constraints: Constraints, period: f64) -> Self {
        ProfiledPidController {
            pid: PidController::new(gains, period),
            profile: TrapezoidProfile::new(constraints),
            goal: ProfileState::default(),
            setpoint: ProfileState::default(),
            last_measurement: None,
        }
    }

    pub fn enable_continuous_input(&mut self, min: f64, max: f64) {
        self.pid.enable_continuous_input(min, max);
    }

    pub fn set_gains(&mut self, gains: PidGains) {
        self.pid.set_gains(gains);
    }

    pub fn gains(&self) -> PidGains {
        self.pid.gains()
    }

    pub fn set_constraints(&mut self, constraints: Constraints) {
        self.profile = TrapezoidProfile::new(constraints);
    }

    pub fn constraints(&self) -> Constraints {
        self.profile.constraints()
    }

    pub fn set_tolerance(&mut self, tolerance: f64) {
        self.pid.set_tolerance(tolerance);
    }

    pub fn set_goal(&mut self, goal: ProfileState) {
        self.goal = goal;
    }

    pub fn goal(&self) -> ProfileState {
        self.goal
    }

    pub fn setpoint(&self) -> ProfileState {
        self.setpoint
    }

    /// Restart the profile from a measured state
    pub fn reset(&mut self, measurement: ProfileState) {
        self.pid.reset();
        self.setpoint = measurement;
        self.last_measurement = Some(measurement.position);
    }

    /// Velocity command for this period: profile velocity plus PID correction
    pub fn calculate(&mut self, measurement: f64) -> f64 {
        if let Some((min, max)) = self.pid.continuous_range() {
            // Chase the goal the short way around
            let bound = (max - min) / 2.0;
            let goal_offset = input_modulus(self.goal.position - measurement, -bound, bound);
            let setpoint_offset = input_modulus(self.setpoint.position - measurement, -bound, bound);
            self.goal.position = measurement + goal_offset;
            self.setpoint.position = measurement + setpoint_offset;
        }

        self.setpoint = self.profile.calculate(self.pid.period, self.setpoint, self.goal);
        self.last_measurement = Some(measurement);
        self.setpoint.velocity + self.pid.calculate(measurement, self.setpoint.position)
    }

    /// Profile finished and measurement within tolerance of the goal
    pub fn at_goal(&self) -> bool {
        let Some(measurement) = self.last_measurement else {
            return false;
        };
        let tolerance = self.pid.tolerance();
        let profile_done = (self.setpoint.position - self.goal.position).abs() <= 1e-9
            && (self.setpoint.velocity - self.goal.velocity).abs() <= 1e-9;
        profile_done && self.pid.wrap_error(self.goal.position - measurement).abs() <= tolerance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::PI;

    #[test]
    fn proportional_only() {
        let mut pid = PidController::new(PidGains::new(2.0, 0.0, 0.0), 0.02);
        assert_abs_diff_eq!(pid.calculate(1.0, 3.0), 4.0, epsilon = 1e-12);
    }

    #[test]
    fn derivative_uses_previous_error() {
        let mut pid = PidController::new(PidGains::new(0.0, 0.0, 1.0), 0.02);
        assert_abs_diff_eq!(pid.calculate(0.0, 1.0), 0.0, epsilon = 1e-12);
        // error drops from 1.0 to 0.5 in one period
        assert_abs_diff_eq!(pid.calculate(0.5, 1.0), -25.0, epsilon = 1e-9);
    }

    #[test]
    fn continuous_error_takes_short_way() {
        let mut pid = PidController::new(PidGains::new(1.0, 0.0, 0.0), 0.02);
        pid.enable_continuous_input(-PI, PI);
        let out = pid.calculate(PI - 0.1, -PI + 0.1);
        assert_abs_diff_eq!(out, 0.2, epsilon = 1e-9);
    }

    #[test]
    fn gains_reject_negative_and_nan() {
        assert!(PidGains::new(1.0, 0.0, 0.1).is_valid());
        assert!(!PidGains::new(-1.0, 0.0, 0.0).is_valid());
        assert!(!PidGains::new(f64::NAN, 0.0, 0.0).is_valid());
    }

    #[test]
    fn profiled_controller_converges() {
        let mut ctrl = ProfiledPidController::new(PidGains::new(4.0, 0.0, 0.0), Constraints::new(3.0, 2.0), 0.02);
        ctrl.set_tolerance(0.05);
        ctrl.reset(ProfileState::new(0.0, 0.0));
        ctrl.set_goal(ProfileState::new(2.0, 0.0));
        let mut x = 0.0;
        for _ in 0..500 {
            let v = ctrl.calculate(x);
            x += v * 0.02;
        }
        assert!(ctrl.at_goal());
        assert_abs_diff_eq!(x, 2.0, epsilon = 0.05);
    }

    #[test]
    fn profiled_controller_not_at_goal_before_running() {
        let mut ctrl = ProfiledPidController::new(PidGains::new(4.0, 0.0, 0.0), Constraints::new(3.0, 2.0), 0.02);
        ctrl.set_goal(ProfileState::new(2.0, 0.0));
        assert!(!ctrl.at_goal());
    }

    #[test]
    fn heading_profile_wraps() {
        let mut ctrl = ProfiledPidController::new(PidGains::new(6.0, 0.0, 0.0), Constraints::new(7.0, 20.0), 0.02);
        ctrl.enable_continuous_input(-PI, PI);
        ctrl.set_tolerance(3f64.to_radians());
        let start = PI - 0.2;
        ctrl.reset(ProfileState::new(start, 0.0));
        ctrl.set_goal(ProfileState::new(-PI + 0.2, 0.0));
        // First command must turn counter-clockwise through pi, not back across zero
        assert!(ctrl.calculate(start) > 0.0);
    }
}
