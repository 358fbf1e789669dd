pub mod behaviors;
pub mod common;
pub mod config;
pub mod control;
pub mod error;
pub mod lifecycle;
pub mod perception;
pub mod shooting;
pub mod subsystems;
pub mod telemetry;
pub mod tuning;

use crate::behaviors::actions::{plan, ActionContext, DriveCommand, SubsystemCommands};
use crate::behaviors::triggers::{holds, FaultLatch};
use crate::behaviors::{BehaviorManager, Decision, Guards, OperatorInput, RobotState};
use crate::common::types::{ChassisVelocity, Pose2D, Translation2D};
use crate::config::RobotConfig;
use crate::control::{AlignmentController, AlignmentGoal};
use crate::error::{CoreError, SensorError, StartupError};
use crate::lifecycle::{LifecycleNode, State};
use crate::perception::game_pieces::{nearest_piece, pickup_pose, to_field_frame};
use crate::perception::{DebouncedBallSensor, Debouncer, Filter};
use crate::shooting::{compute_aim, exit_speed, AimingGeometry, AimingState, ShooterTables, ShotContext, ShotSolution};
use crate::subsystems::Hardware;
use crate::telemetry::{OutputRegistry, TelemetrySink, TelemetryValue};
use crate::tuning::{TunableBool, TunableNumber, TunableRegistry};
use std::time::Duration;
use tracing::{error, info};

/// Live flags and trims read every cycle
struct Tunables {
    disable_compensation: TunableBool,
    disable_auto_align: TunableBool,
    intake_by_vision: TunableBool,
    flywheel_scale: TunableNumber,
    hood_offset_deg: TunableNumber,
    turret_offset_deg: TunableNumber,
}

impl Tunables {
    fn register(registry: &TunableRegistry, config: &RobotConfig) -> Self {
        Tunables {
            disable_compensation: registry.boolean("/Tuning/disableShotCompensation", config.tuning.disable_compensation),
            disable_auto_align: registry.boolean("/Tuning/disableAutoAlign", config.tuning.disable_auto_align),
            intake_by_vision: registry.boolean("/Tuning/intakeByVision", config.tuning.intake_by_vision),
            flywheel_scale: registry.number("/Tuning/Shooter/flywheelVelocityScale", 1.0),
            hood_offset_deg: registry.number("/Tuning/Shooter/hoodAngleOffsetDeg", 0.0),
            turret_offset_deg: registry.number("/Tuning/Shooter/turretAngleOffsetDeg", 0.0),
        }
    }
}

/// Everything decided in one control cycle
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub now: Duration,
    pub pose: Pose2D,
    pub pose_faulted: bool,
    pub field_velocity: ChassisVelocity,
    pub target: Translation2D,
    pub shooter_exit_velocity: f64,
    pub shot: ShotSolution,
    pub aiming: AimingState,
    pub guards: Guards,
    pub flywheel_ready: bool,
    pub decision: Decision,
    pub commands: SubsystemCommands,
    pub alignment_at_goal: bool,
    pub calibration_faulted: bool,
}

/// Core functionality for the turret robot: owns the hardware and runs one
/// control cycle per `tick`
pub struct RobotCore {
    config: RobotConfig,
    hardware: Hardware,
    tunables: Tunables,
    geometry: AimingGeometry,
    shooter_tables: ShooterTables,
    alignment: AlignmentController,
    behavior: BehaviorManager,
    front_ball: DebouncedBallSensor,
    back_ball: DebouncedBallSensor,
    flywheel_ready: Debouncer,
    last_flywheel_command: f64,
    last_good_pose: Pose2D,
    active_goal: Option<AlignmentGoal>,
    pose_latch: FaultLatch,
    velocity_latch: FaultLatch,
    front_latch: FaultLatch,
    back_latch: FaultLatch,
    camera_latch: FaultLatch,
    outputs: OutputRegistry<CycleReport>,
    startup_errors: Vec<StartupError>,
}

impl RobotCore {
    /// Create the core; nothing is loaded until `init`
    pub fn new(config: RobotConfig, hardware: Hardware, tuning: &TunableRegistry) -> Result<Self, CoreError> {
        config.validate()?;
        let field = &config.field;
        let target = Translation2D::new(field.target_x, field.target_y);
        let geometry = AimingGeometry::new(target, field.inner_radius, field.outer_radius)
            .with_turret_limits(
                config.shooter.turret_min_deg.to_radians(),
                config.shooter.turret_max_deg.to_radians(),
            )
            .with_alignment_margin(field.alignment_margin);
        let ball_window = Duration::from_millis(config.sensors.ball_debounce_ms);

        Ok(RobotCore {
            tunables: Tunables::register(tuning, &config),
            geometry,
            shooter_tables: ShooterTables::new(&config.shooter.velocity_table, &config.shooter.hood_table),
            alignment: AlignmentController::new(&config.alignment, config.period_secs(), tuning),
            behavior: BehaviorManager::new(Duration::from_millis(config.feeder.slow_back_ms)),
            front_ball: DebouncedBallSensor::new(ball_window),
            back_ball: DebouncedBallSensor::new(ball_window),
            flywheel_ready: Debouncer::new(Duration::from_millis(config.shooter.at_velocity_debounce_ms)),
            last_flywheel_command: 0.0,
            last_good_pose: Pose2D::new(field.start_x, field.start_y, field.start_heading_deg.to_radians()),
            active_goal: None,
            pose_latch: FaultLatch::new("Drive/pose"),
            velocity_latch: FaultLatch::new("Drive/chassisSpeeds"),
            front_latch: FaultLatch::new("Roller/hasBall"),
            back_latch: FaultLatch::new("Hopper/hasBall"),
            camera_latch: FaultLatch::new("Vision/gamePieces"),
            outputs: robot_outputs(),
            startup_errors: Vec::new(),
            hardware,
            config,
        })
    }

    /// Configure and activate every startup-loaded component.
    ///
    /// Failures are recorded and the failed component stays faulted; the
    /// rest of the robot keeps running.
    pub fn init(&mut self) -> &[StartupError] {
        self.startup_errors.clear();
        let nodes: [&mut dyn LifecycleNode; 2] = [&mut self.shooter_tables, &mut self.alignment];
        for node in nodes {
            let result = node.on_configure().and_then(|_| node.on_activate());
            match result {
                Ok(()) => info!("{} active", node.name()),
                Err(source) => {
                    error!("{} failed to start: {}", node.name(), source);
                    self.startup_errors.push(StartupError {
                        subsystem: node.name().to_string(),
                        source,
                    });
                }
            }
        }
        &self.startup_errors
    }

    /// Deactivate and clean up every component
    pub fn shutdown(&mut self) -> Result<(), CoreError> {
        let nodes: [&mut dyn LifecycleNode; 2] = [&mut self.shooter_tables, &mut self.alignment];
        for node in nodes {
            node.on_deactivate()?;
            node.on_cleanup()?;
        }
        info!("Core shut down");
        Ok(())
    }

    pub fn startup_errors(&self) -> &[StartupError] {
        &self.startup_errors
    }

    pub fn state(&self) -> RobotState {
        self.behavior.state()
    }

    pub fn config(&self) -> &RobotConfig {
        &self.config
    }

    /// Run one control cycle at time `now` and emit its telemetry
    pub fn tick(&mut self, now: Duration, operator: &OperatorInput, sink: &mut dyn TelemetrySink) -> CycleReport {
        let (pose, pose_faulted) = self.read_pose();
        let field_velocity = self.read_velocity().to_field_relative(pose.heading);

        let shooter_exit_velocity =
            exit_speed(self.hardware.flywheel.current_velocity(), self.config.shooter.flywheel_diameter);
        let compensation_enabled = !self.tunables.disable_compensation.get();
        let ctx = ShotContext {
            target: self.geometry.target,
            epsilon: self.config.shooter.compensation_epsilon,
            compensation_enabled,
        };
        let turret_trim = self.tunables.turret_offset_deg.get().to_radians();
        let (shot, aiming) = compute_aim(&pose, &field_velocity, shooter_exit_velocity, &ctx, &self.geometry, turret_trim);

        let front_ball = self.front_ball.sample(&*self.hardware.front_sensor, now);
        self.front_latch.observe(&front_ball);
        let back_ball = self.back_ball.sample(&*self.hardware.back_sensor, now);
        self.back_latch.observe(&back_ball);

        let auto_align_disabled = self.tunables.disable_auto_align.get();
        let piece_goal = self.nearest_piece_goal(&pose);
        let vision_intake = self.tunables.intake_by_vision.get() && piece_goal.is_some() && !auto_align_disabled;

        let at_speed = self.hardware.flywheel.is_at_setpoint() && self.last_flywheel_command > 0.0;
        let flywheel_ready = self.flywheel_ready.filter(at_speed, now);

        let guards = Guards {
            disabled: !operator.enabled,
            front_ball,
            back_ball,
            force_shoot: operator.force_shoot,
            shoot_one_ball: operator.shoot_one_ball,
            in_dead_zone: aiming.is_in_dead_zone,
            turret_in_range: aiming.is_target_in_range,
            shoot_on_move: compensation_enabled,
            vision_intake,
        };
        let decision = self.behavior.update(now, operator, &guards);

        let distance = shot.compensated_distance;
        let flywheel_scale = self.tunables.flywheel_scale.get();
        let hood_offset = self.tunables.hood_offset_deg.get();
        let action_ctx = ActionContext {
            pose: &pose,
            aiming: &aiming,
            flywheel_velocity: self.shooter_tables.flywheel_velocity(distance).map(|v| v * flywheel_scale),
            hood_angle: self.shooter_tables.hood_angle(distance).map(|h| h + hood_offset),
            flywheel_ready,
            auto_align_disabled,
            piece_goal,
            shooter: &self.config.shooter,
            feeder: &self.config.feeder,
        };
        let commands = plan(decision.action, &action_ctx);

        self.apply(&commands, &pose, &field_velocity);

        let report = CycleReport {
            now,
            pose,
            pose_faulted,
            field_velocity,
            target: self.geometry.target,
            shooter_exit_velocity,
            shot,
            aiming,
            guards,
            flywheel_ready,
            decision,
            commands,
            alignment_at_goal: self.active_goal.is_some() && self.alignment.at_goal(),
            calibration_faulted: !self.shooter_tables.is_available(),
        };
        self.outputs.emit(&report, sink);
        report
    }

    fn read_pose(&mut self) -> (Pose2D, bool) {
        let read = self.hardware.drivetrain.current_pose().and_then(|p| {
            if p.is_finite() {
                Ok(p)
            } else {
                Err(SensorError::Stale {
                    sensor: "odometry".to_string(),
                })
            }
        });
        let faulted = self.pose_latch.observe(&read);
        if let Ok(pose) = read {
            self.last_good_pose = pose;
        }
        (self.last_good_pose, faulted)
    }

    /// Robot-relative speeds; a failed read counts as stopped
    fn read_velocity(&mut self) -> ChassisVelocity {
        let read = self.hardware.drivetrain.current_chassis_velocity();
        self.velocity_latch.observe(&read);
        read.unwrap_or_else(|_| ChassisVelocity::zero())
    }

    fn nearest_piece_goal(&mut self, pose: &Pose2D) -> Option<Pose2D> {
        let read = self.hardware.camera.detections();
        self.camera_latch.observe(&read);
        let detections = read.ok()?;
        let pieces = to_field_frame(pose, &detections);
        nearest_piece(pose, &pieces).map(|piece| pickup_pose(pose, piece))
    }

    fn apply(&mut self, commands: &SubsystemCommands, pose: &Pose2D, field_velocity: &ChassisVelocity) {
        let hw = &mut self.hardware;
        hw.turret.set_angle(commands.aim.turret_angle);
        hw.flywheel.set_velocity(commands.aim.flywheel_velocity);
        hw.hood.set_angle(commands.aim.hood_angle);
        hw.hopper.set_voltage(commands.hopper_volts);
        hw.roller.set_voltage(commands.roller_volts);
        self.last_flywheel_command = commands.aim.flywheel_velocity;

        match commands.drive {
            DriveCommand::Align(goal) if self.alignment.state() == State::Active => {
                // Entering alignment restarts the profiles from the measured state
                if self.active_goal.is_none() {
                    self.alignment.reset(pose, field_velocity);
                }
                if self.active_goal != Some(goal) {
                    self.alignment.set_goal(goal);
                }
                self.active_goal = Some(goal);
                let output = self.alignment.calculate(pose);
                self.hardware.drivetrain.drive_at(output.to_robot_relative(pose.heading));
            }
            DriveCommand::Lock => {
                self.active_goal = None;
                self.hardware.drivetrain.lock();
            }
            DriveCommand::Align(_) | DriveCommand::Idle => {
                self.active_goal = None;
            }
        }
    }
}

fn reading(value: &perception::Reading) -> TelemetryValue {
    TelemetryValue::Boolean(holds(value))
}

/// Every value logged per cycle
pub fn robot_outputs() -> OutputRegistry<CycleReport> {
    OutputRegistry::new()
        .output("RobotState/state", |r: &CycleReport| r.decision.state.name())
        .output("RobotState/action", |r: &CycleReport| r.decision.action.name())
        .output("RobotState/transitioned", |r: &CycleReport| r.decision.transitioned)
        .output("RobotState/guardFaulted", |r: &CycleReport| r.decision.guard_faulted)
        .output("RobotState/pose", |r: &CycleReport| r.pose)
        .output("RobotState/poseFaulted", |r: &CycleReport| r.pose_faulted)
        .output("RobotState/fieldVelocity/vx", |r: &CycleReport| r.field_velocity.vx)
        .output("RobotState/fieldVelocity/vy", |r: &CycleReport| r.field_velocity.vy)
        .output("RobotState/shooterExitVelocity", |r: &CycleReport| r.shooter_exit_velocity)
        .output("RobotState/compensatedShot/compensatedTarget", |r: &CycleReport| r.shot.compensated_target)
        .output("RobotState/compensatedShot/compensatedDistance", |r: &CycleReport| r.shot.compensated_distance)
        .output("RobotState/compensatedShot/turretAngle", |r: &CycleReport| r.shot.turret_bearing)
        .output("RobotState/compensatedShot/compensated", |r: &CycleReport| r.shot.compensated)
        .output("RobotState/regularShot/target", |r: &CycleReport| r.target)
        .output("RobotState/regularShot/distance", |r: &CycleReport| r.aiming.robot_distance_from_target)
        .output("RobotState/regularShot/turretAngle", |r: &CycleReport| r.aiming.static_turret_bearing)
        .output("RobotState/bearingFromRobotToTarget", |r: &CycleReport| r.aiming.bearing_from_robot_to_target)
        .output("RobotState/appliedTurretBearing", |r: &CycleReport| r.aiming.applied_turret_bearing)
        .output("RobotState/turretCommandAngle", |r: &CycleReport| r.aiming.turret_command_angle)
        .output("RobotState/alignmentHeading", |r: &CycleReport| r.aiming.alignment_heading)
        .output("RobotState/deadZoneAlignmentSetpoint", |r: &CycleReport| r.aiming.dead_zone_alignment_setpoint)
        .output("RobotState/isTargetInRange", |r: &CycleReport| r.guards.turret_in_range)
        .output("RobotState/isInDeadZone", |r: &CycleReport| r.guards.in_dead_zone)
        .output("RobotState/isDisabled", |r: &CycleReport| r.guards.disabled)
        .output("RobotState/hasFrontBall", |r: &CycleReport| reading(&r.guards.front_ball))
        .output("RobotState/hasBackBall", |r: &CycleReport| reading(&r.guards.back_ball))
        .output("RobotState/frontBallFaulted", |r: &CycleReport| r.guards.front_ball.is_err())
        .output("RobotState/backBallFaulted", |r: &CycleReport| r.guards.back_ball.is_err())
        .output("RobotState/ballsEmpty", |r: &CycleReport| reading(&r.guards.cargo_empty()))
        .output("RobotState/forceShoot", |r: &CycleReport| r.guards.force_shoot)
        .output("RobotState/shouldShootOneBall", |r: &CycleReport| r.guards.shoot_one_ball)
        .output("RobotState/shouldShootOnMove", |r: &CycleReport| r.guards.shoot_on_move)
        .output("RobotState/isIntakeByVision", |r: &CycleReport| r.guards.vision_intake)
        .output("RobotState/isFlywheelReady", |r: &CycleReport| r.flywheel_ready)
        .output("RobotState/commands/turretAngle", |r: &CycleReport| r.commands.aim.turret_angle)
        .output("RobotState/commands/flywheelVelocity", |r: &CycleReport| r.commands.aim.flywheel_velocity)
        .output("RobotState/commands/hoodAngle", |r: &CycleReport| r.commands.aim.hood_angle)
        .output("RobotState/commands/hopperVolts", |r: &CycleReport| r.commands.hopper_volts)
        .output("RobotState/commands/rollerVolts", |r: &CycleReport| r.commands.roller_volts)
        .output("RobotState/commands/drive", |r: &CycleReport| match r.commands.drive {
            DriveCommand::Idle => "Idle",
            DriveCommand::Lock => "Lock",
            DriveCommand::Align(_) => "Align",
        })
        .output("AutoAlignment/atGoal", |r: &CycleReport| r.alignment_at_goal)
        .output("Shooter/calibrationFaulted", |r: &CycleReport| r.calibration_faulted)
}
