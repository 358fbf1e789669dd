//! Drivetrain alignment control
pub mod controllers;
pub mod trajectory;

use self::controllers::{PidGains, ProfiledPidController};
use self::trajectory::{Constraints, ProfileState};
use crate::common::types::{ChassisVelocity, Pose2D, Translation2D};
use crate::config::AlignmentConfig;
use crate::error::CoreError;
use crate::lifecycle::{LifecycleNode, LifecycleNodeBase, State};
use crate::tuning::{TunableConstraints, TunableGains, TunableRegistry};
use std::f64::consts::PI;
use tracing::{debug, warn};

const TUNING_GROUP: &str = "AutoAlignment";

/// Where the alignment controller should drive the robot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignmentGoal {
    pub pose: Pose2D,
    /// Speed (m/s) the robot should still carry when it reaches the goal,
    /// along its direction of travel
    pub linear_velocity_hint: f64,
}

impl AlignmentGoal {
    pub fn new(pose: Pose2D) -> Self {
        AlignmentGoal {
            pose,
            linear_velocity_hint: 0.0,
        }
    }
}

/// Three profiled PID loops (x, y, heading) driving the chassis to a pose.
///
/// Callers must `reset` with the measured pose and velocity before the first
/// `set_goal` after any discontinuity; `set_goal` never resets the profiles.
pub struct AlignmentController {
    base: LifecycleNodeBase,
    x: ProfiledPidController,
    y: ProfiledPidController,
    theta: ProfiledPidController,
    x_gains: TunableGains,
    y_gains: TunableGains,
    theta_gains: TunableGains,
    linear_constraints: TunableConstraints,
    rotation_constraints: TunableConstraints,
    goal: Option<AlignmentGoal>,
}

impl AlignmentController {
    pub fn new(config: &AlignmentConfig, period: f64, registry: &TunableRegistry) -> Self {
        let linear = Constraints::new(config.linear_max_velocity, config.linear_max_acceleration);
        let rotation = Constraints::new(config.rotation_max_velocity, config.rotation_max_acceleration);
        let x_gains = PidGains::new(config.x_kp, config.x_ki, config.x_kd);
        let y_gains = PidGains::new(config.y_kp, config.y_ki, config.y_kd);
        let theta_gains = PidGains::new(config.theta_kp, config.theta_ki, config.theta_kd);

        let mut x = ProfiledPidController::new(x_gains, linear, period);
        x.set_tolerance(config.x_tolerance);
        let mut y = ProfiledPidController::new(y_gains, linear, period);
        y.set_tolerance(config.y_tolerance);
        let mut theta = ProfiledPidController::new(theta_gains, rotation, period);
        theta.enable_continuous_input(-PI, PI);
        theta.set_tolerance(config.heading_tolerance_deg.to_radians());

        AlignmentController {
            base: LifecycleNodeBase::new("AutoAlignment"),
            x,
            y,
            theta,
            x_gains: TunableGains::new(registry, TUNING_GROUP, "x Gains", x_gains),
            y_gains: TunableGains::new(registry, TUNING_GROUP, "y Gains", y_gains),
            theta_gains: TunableGains::new(registry, TUNING_GROUP, "ϴ Gains", theta_gains),
            linear_constraints: TunableConstraints::new(registry, "/Tuning/AutoAlignment/linear", linear),
            rotation_constraints: TunableConstraints::new(registry, "/Tuning/AutoAlignment/rotation", rotation),
            goal: None,
        }
    }

    /// Restart all three profiles from the measured pose and field-relative velocity
    pub fn reset(&mut self, pose: &Pose2D, field_velocity: &ChassisVelocity) {
        self.x.reset(ProfileState::new(pose.x, field_velocity.vx));
        self.y.reset(ProfileState::new(pose.y, field_velocity.vy));
        self.theta.reset(ProfileState::new(pose.heading, field_velocity.omega));
    }

    /// Set a new goal, re-reading gains and constraints from tuning
    pub fn set_goal(&mut self, goal: AlignmentGoal) {
        self.apply_tunables();

        let from = Translation2D::new(self.x.setpoint().position, self.y.setpoint().position);
        let travel = goal.pose.translation() - from;
        let terminal = if travel.norm() > 1e-9 && goal.linear_velocity_hint.is_finite() {
            travel.normalize() * goal.linear_velocity_hint
        } else {
            Translation2D::zeros()
        };

        self.x.set_goal(ProfileState::new(goal.pose.x, terminal.x));
        self.y.set_goal(ProfileState::new(goal.pose.y, terminal.y));
        self.theta.set_goal(ProfileState::new(goal.pose.heading, 0.0));
        debug!(
            "Alignment goal ({:.3}, {:.3}, {:.3})",
            goal.pose.x, goal.pose.y, goal.pose.heading
        );
        self.goal = Some(goal);
    }

    pub fn goal(&self) -> Option<AlignmentGoal> {
        self.goal
    }

    /// Field-relative velocity command for this cycle
    pub fn calculate(&mut self, pose: &Pose2D) -> ChassisVelocity {
        ChassisVelocity::new(
            self.x.calculate(pose.x),
            self.y.calculate(pose.y),
            self.theta.calculate(pose.heading),
        )
    }

    /// Every axis has finished its profile and is within tolerance
    pub fn at_goal(&self) -> bool {
        self.x.at_goal() && self.y.at_goal() && self.theta.at_goal()
    }

    fn apply_tunables(&mut self) {
        let axes = [
            (&mut self.x, &self.x_gains, &self.linear_constraints, "x"),
            (&mut self.y, &self.y_gains, &self.linear_constraints, "y"),
            (&mut self.theta, &self.theta_gains, &self.rotation_constraints, "heading"),
        ];
        for (controller, gains, constraints, axis) in axes {
            let gains = gains.get();
            if gains.is_valid() {
                controller.set_gains(gains);
            } else {
                warn!("Ignoring invalid {axis} alignment gains {gains:?}");
            }
            let constraints = constraints.get();
            if constraints.is_valid() {
                controller.set_constraints(constraints);
            } else {
                warn!("Ignoring invalid {axis} alignment constraints {constraints:?}");
            }
        }
    }
}

impl LifecycleNode for AlignmentController {
    fn name(&self) -> &str {
        &self.base.name
    }

    fn on_configure(&mut self) -> Result<(), CoreError> {
        self.apply_tunables();
        self.base.set_state(State::Inactive);
        Ok(())
    }

    fn on_activate(&mut self) -> Result<(), CoreError> {
        self.base.set_state(State::Active);
        Ok(())
    }

    fn on_deactivate(&mut self) -> Result<(), CoreError> {
        self.goal = None;
        self.base.set_state(State::Inactive);
        Ok(())
    }

    fn on_cleanup(&mut self) -> Result<(), CoreError> {
        self.goal = None;
        self.base.set_state(State::Unconfigured);
        Ok(())
    }

    fn state(&self) -> State {
        self.base.get_state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const DT: f64 = 0.02;

    fn controller(registry: &TunableRegistry) -> AlignmentController {
        AlignmentController::new(&AlignmentConfig::default(), DT, registry)
    }

    fn drive(ctrl: &mut AlignmentController, mut pose: Pose2D, cycles: usize) -> Pose2D {
        for _ in 0..cycles {
            let v = ctrl.calculate(&pose);
            pose = Pose2D::new(pose.x + v.vx * DT, pose.y + v.vy * DT, pose.heading + v.omega * DT);
        }
        pose
    }

    #[test]
    fn converges_to_goal() {
        let registry = TunableRegistry::new();
        let mut ctrl = controller(&registry);
        let start = Pose2D::new(0.0, 0.0, 0.0);
        ctrl.reset(&start, &ChassisVelocity::zero());
        ctrl.set_goal(AlignmentGoal::new(Pose2D::new(1.5, -0.5, 1.0)));
        assert!(!ctrl.at_goal());

        let end = drive(&mut ctrl, start, 300);
        assert!(ctrl.at_goal());
        assert_abs_diff_eq!(end.x, 1.5, epsilon = 0.05);
        assert_abs_diff_eq!(end.y, -0.5, epsilon = 0.05);
        assert_abs_diff_eq!(end.heading, 1.0, epsilon = 3f64.to_radians());
    }

    #[test]
    fn output_respects_linear_limit_early() {
        let registry = TunableRegistry::new();
        let mut ctrl = controller(&registry);
        let start = Pose2D::new(0.0, 0.0, 0.0);
        ctrl.reset(&start, &ChassisVelocity::zero());
        ctrl.set_goal(AlignmentGoal::new(Pose2D::new(10.0, 0.0, 0.0)));
        let v = ctrl.calculate(&start);
        // One period of acceleration plus the proportional correction on it
        assert!(v.vx > 0.0 && v.vx < 1.0);
        assert_abs_diff_eq!(v.vy, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn goal_change_rereads_gains() {
        let registry = TunableRegistry::new();
        let mut ctrl = controller(&registry);
        registry.set_number("/Tuning/AutoAlignment/x Gains/kP", 1.5).unwrap();
        ctrl.set_goal(AlignmentGoal::new(Pose2D::new(1.0, 0.0, 0.0)));
        assert_eq!(ctrl.x.gains().kp, 1.5);
    }

    #[test]
    fn negative_gains_keep_previous() {
        let registry = TunableRegistry::new();
        let mut ctrl = controller(&registry);
        registry.set_number("/Tuning/AutoAlignment/ϴ Gains/kP", -2.0).unwrap();
        ctrl.set_goal(AlignmentGoal::new(Pose2D::new(1.0, 0.0, 0.0)));
        assert_eq!(ctrl.theta.gains().kp, 6.0);
    }

    #[test]
    fn constraints_are_tunable() {
        let registry = TunableRegistry::new();
        let mut ctrl = controller(&registry);
        registry.set_number("/Tuning/AutoAlignment/linearMaxVelocity", 2.0).unwrap();
        ctrl.set_goal(AlignmentGoal::new(Pose2D::new(1.0, 0.0, 0.0)));
        assert_eq!(ctrl.x.constraints().max_velocity, 2.0);
        assert_eq!(ctrl.theta.constraints().max_velocity, 7.0);
    }

    #[test]
    fn velocity_hint_points_along_travel() {
        let registry = TunableRegistry::new();
        let mut ctrl = controller(&registry);
        ctrl.reset(&Pose2D::new(0.0, 0.0, 0.0), &ChassisVelocity::zero());
        let mut goal = AlignmentGoal::new(Pose2D::new(3.0, 4.0, 0.0));
        goal.linear_velocity_hint = 1.0;
        ctrl.set_goal(goal);
        assert_abs_diff_eq!(ctrl.x.goal().velocity, 0.6, epsilon = 1e-12);
        assert_abs_diff_eq!(ctrl.y.goal().velocity, 0.8, epsilon = 1e-12);
    }
}
