//! Turning a state machine action into subsystem setpoints

use crate::common::types::Pose2D;
use crate::config::{FeederConfig, ShooterConfig};
use crate::control::AlignmentGoal;
use crate::shooting::{AimCommand, AimingState};

/// What the robot does this cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Everything stopped
    StopAll,
    /// Flywheel and hopper off
    StopShooting,
    /// Spin up, lock the chassis, feed once the flywheel is ready
    RunShooter,
    /// Spin up and drive to where the shot is possible, no feeding
    AlignForShot,
    /// Both feeder motors off, cargo held
    StopRollers,
    /// Short reverse pulse on the hopper while the roller keeps intaking
    SlowFeedBack { pulse_active: bool, align_to_piece: bool },
    /// Hopper and roller pull the front ball in
    IntakeFrontOnly,
    RunIntake { align_to_piece: bool },
    /// Fixed setpoints, feeding immediately
    StaticShot,
    /// A guard faulted: feeder off, no drive command, state kept
    Hold,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::StopAll => "StopAll",
            Action::StopShooting => "StopShooting",
            Action::RunShooter => "RunShooter",
            Action::AlignForShot => "AlignForShot",
            Action::StopRollers => "StopRollers",
            Action::SlowFeedBack { .. } => "SlowFeedBack",
            Action::IntakeFrontOnly => "IntakeFrontOnly",
            Action::RunIntake { .. } => "RunIntake",
            Action::StaticShot => "StaticShot",
            Action::Hold => "Hold",
        }
    }
}

/// Request sent to the drivetrain
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DriveCommand {
    /// Leave the drivetrain to the driver
    Idle,
    /// Hold position with the wheels crossed
    Lock,
    Align(AlignmentGoal),
}

/// Every setpoint the core writes in one cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubsystemCommands {
    pub aim: AimCommand,
    pub hopper_volts: f64,
    pub roller_volts: f64,
    pub drive: DriveCommand,
}

/// Inputs needed to turn an action into setpoints
#[derive(Debug, Clone, Copy)]
pub struct ActionContext<'a> {
    pub pose: &'a Pose2D,
    pub aiming: &'a AimingState,
    /// Calibrated flywheel velocity, None when the tables are unavailable
    pub flywheel_velocity: Option<f64>,
    /// Calibrated hood angle, None when the tables are unavailable
    pub hood_angle: Option<f64>,
    pub flywheel_ready: bool,
    pub auto_align_disabled: bool,
    /// Where to pick up the nearest game piece, if one is visible
    pub piece_goal: Option<Pose2D>,
    pub shooter: &'a ShooterConfig,
    pub feeder: &'a FeederConfig,
}

impl ActionContext<'_> {
    fn align(&self, pose: Pose2D) -> DriveCommand {
        if self.auto_align_disabled {
            DriveCommand::Idle
        } else {
            DriveCommand::Align(AlignmentGoal::new(pose))
        }
    }

    fn align_to_piece(&self, requested: bool) -> DriveCommand {
        match self.piece_goal {
            Some(goal) if requested => self.align(goal),
            _ => DriveCommand::Idle,
        }
    }

    /// Reposition point for a shot: out of the dead zone if needed, turned
    /// so the turret can reach the target
    fn shot_alignment_pose(&self) -> Pose2D {
        let translation = if self.aiming.is_in_dead_zone {
            self.aiming.dead_zone_alignment_setpoint
        } else {
            self.pose.translation()
        };
        Pose2D::from_translation(translation, self.aiming.alignment_heading)
    }
}

/// Setpoints for `action`
pub fn plan(action: Action, ctx: &ActionContext) -> SubsystemCommands {
    let feeder = ctx.feeder;
    let mut commands = SubsystemCommands {
        aim: AimCommand {
            turret_angle: ctx.aiming.turret_command_angle,
            flywheel_velocity: 0.0,
            hood_angle: ctx.hood_angle.unwrap_or(0.0),
        },
        hopper_volts: 0.0,
        roller_volts: 0.0,
        drive: DriveCommand::Idle,
    };

    match action {
        Action::StopAll | Action::StopShooting | Action::StopRollers | Action::Hold => {}
        Action::RunShooter => {
            commands.drive = DriveCommand::Lock;
            if let Some(velocity) = ctx.flywheel_velocity {
                commands.aim.flywheel_velocity = velocity;
                if ctx.flywheel_ready {
                    commands.hopper_volts = feeder.hopper_shoot_volts;
                    commands.roller_volts = feeder.roller_intake_volts;
                }
            }
        }
        Action::AlignForShot => {
            commands.aim.flywheel_velocity = ctx.flywheel_velocity.unwrap_or(0.0);
            commands.drive = ctx.align(ctx.shot_alignment_pose());
        }
        Action::SlowFeedBack {
            pulse_active,
            align_to_piece,
        } => {
            if pulse_active {
                commands.hopper_volts = feeder.slow_back_volts;
            }
            commands.roller_volts = feeder.roller_intake_volts;
            commands.drive = ctx.align_to_piece(align_to_piece);
        }
        Action::IntakeFrontOnly => {
            commands.hopper_volts = feeder.hopper_intake_volts;
            commands.roller_volts = feeder.roller_intake_volts;
        }
        Action::RunIntake { align_to_piece } => {
            commands.hopper_volts = feeder.hopper_intake_volts;
            commands.roller_volts = feeder.roller_intake_volts;
            commands.drive = ctx.align_to_piece(align_to_piece);
        }
        Action::StaticShot => {
            commands.aim.flywheel_velocity = ctx.shooter.static_flywheel_rps;
            commands.aim.hood_angle = ctx.shooter.static_hood_deg;
            commands.hopper_volts = feeder.hopper_shoot_volts;
            commands.roller_volts = feeder.roller_intake_volts;
        }
    }
    commands
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::types::Translation2D;

    fn aiming(in_dead_zone: bool) -> AimingState {
        AimingState {
            robot_distance_from_target: 2.0,
            bearing_from_robot_to_target: 0.0,
            static_turret_bearing: 0.0,
            applied_turret_bearing: 0.3,
            turret_command_angle: 0.3,
            is_target_in_range: true,
            is_in_dead_zone: in_dead_zone,
            dead_zone_alignment_setpoint: Translation2D::new(4.0, 4.1),
            alignment_heading: 0.5,
        }
    }

    struct Fixture {
        pose: Pose2D,
        aiming: AimingState,
        shooter: ShooterConfig,
        feeder: FeederConfig,
    }

    impl Fixture {
        fn new(in_dead_zone: bool) -> Self {
            Fixture {
                pose: Pose2D::new(1.0, 2.0, 0.1),
                aiming: aiming(in_dead_zone),
                shooter: ShooterConfig::default(),
                feeder: FeederConfig::default(),
            }
        }

        fn ctx(&self) -> ActionContext<'_> {
            ActionContext {
                pose: &self.pose,
                aiming: &self.aiming,
                flywheel_velocity: Some(40.0),
                hood_angle: Some(12.0),
                flywheel_ready: false,
                auto_align_disabled: false,
                piece_goal: Some(Pose2D::new(3.0, 3.0, 0.7)),
                shooter: &self.shooter,
                feeder: &self.feeder,
            }
        }
    }

    #[test]
    fn shooter_waits_for_flywheel() {
        let f = Fixture::new(false);
        let mut ctx = f.ctx();
        let waiting = plan(Action::RunShooter, &ctx);
        assert_eq!(waiting.aim.flywheel_velocity, 40.0);
        assert_eq!(waiting.hopper_volts, 0.0);
        assert_eq!(waiting.drive, DriveCommand::Lock);

        ctx.flywheel_ready = true;
        let feeding = plan(Action::RunShooter, &ctx);
        assert_eq!(feeding.hopper_volts, 8.0);
        assert_eq!(feeding.roller_volts, 8.0);
    }

    #[test]
    fn faulted_tables_never_feed() {
        let f = Fixture::new(false);
        let mut ctx = f.ctx();
        ctx.flywheel_velocity = None;
        ctx.hood_angle = None;
        ctx.flywheel_ready = true;
        let out = plan(Action::RunShooter, &ctx);
        assert_eq!(out.aim.flywheel_velocity, 0.0);
        assert_eq!(out.hopper_volts, 0.0);
        assert_eq!(out.aim.hood_angle, 0.0);
    }

    #[test]
    fn dead_zone_alignment_uses_setpoint_and_heading() {
        let f = Fixture::new(true);
        let out = plan(Action::AlignForShot, &f.ctx());
        match out.drive {
            DriveCommand::Align(goal) => {
                assert_eq!(goal.pose, Pose2D::new(4.0, 4.1, 0.5));
            }
            other => panic!("expected alignment, got {other:?}"),
        }
    }

    #[test]
    fn out_of_range_alignment_turns_in_place() {
        let f = Fixture::new(false);
        let out = plan(Action::AlignForShot, &f.ctx());
        assert_eq!(out.drive, DriveCommand::Align(AlignmentGoal::new(Pose2D::new(1.0, 2.0, 0.5))));
    }

    #[test]
    fn disabled_auto_align_leaves_drive_idle() {
        let f = Fixture::new(true);
        let mut ctx = f.ctx();
        ctx.auto_align_disabled = true;
        assert_eq!(plan(Action::AlignForShot, &ctx).drive, DriveCommand::Idle);
        let intake = plan(Action::RunIntake { align_to_piece: true }, &ctx);
        assert_eq!(intake.drive, DriveCommand::Idle);
    }

    #[test]
    fn slow_back_pulse_then_hold() {
        let f = Fixture::new(false);
        let ctx = f.ctx();
        let pulse = plan(
            Action::SlowFeedBack {
                pulse_active: true,
                align_to_piece: false,
            },
            &ctx,
        );
        assert_eq!(pulse.hopper_volts, -1.2);
        assert_eq!(pulse.roller_volts, 8.0);
        let after = plan(
            Action::SlowFeedBack {
                pulse_active: false,
                align_to_piece: false,
            },
            &ctx,
        );
        assert_eq!(after.hopper_volts, 0.0);
        assert_eq!(after.roller_volts, 8.0);
    }

    #[test]
    fn vision_intake_drives_to_piece() {
        let f = Fixture::new(false);
        let out = plan(Action::RunIntake { align_to_piece: true }, &f.ctx());
        assert_eq!(out.drive, DriveCommand::Align(AlignmentGoal::new(Pose2D::new(3.0, 3.0, 0.7))));
        assert_eq!(out.hopper_volts, 3.0);
    }

    #[test]
    fn static_shot_bypasses_tables() {
        let f = Fixture::new(false);
        let mut ctx = f.ctx();
        ctx.flywheel_velocity = None;
        let out = plan(Action::StaticShot, &ctx);
        assert_eq!(out.aim.flywheel_velocity, f.shooter.static_flywheel_rps);
        assert_eq!(out.aim.hood_angle, f.shooter.static_hood_deg);
        assert_eq!(out.hopper_volts, 8.0);
    }
}
