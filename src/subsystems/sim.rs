//! In-memory hardware for the desktop loop and tests
//!
//! Mechanisms reach their setpoints instantly. The drivetrain integrates the
//! last velocity command when [`SimHandle::step`] is called.

use super::{AngleActuator, Drivetrain, Hardware, PieceCamera, ProximitySensor, VelocityActuator, VoltageActuator};
use crate::common::types::{ChassisVelocity, Pose2D, Translation2D};
use crate::error::SensorError;
use crate::perception::Reading;
use std::sync::{Arc, Mutex, MutexGuard};

/// Everything the simulated robot knows
#[derive(Debug, Clone)]
pub struct SimState {
    pub pose: Pose2D,
    /// Robot-relative
    pub velocity: ChassisVelocity,
    pub pose_fault: Option<SensorError>,
    pub last_drive: Option<ChassisVelocity>,
    pub locked: bool,
    pub turret_angle: f64,
    pub hood_angle: f64,
    pub flywheel_setpoint: f64,
    pub flywheel_velocity: f64,
    pub hopper_volts: f64,
    pub roller_volts: f64,
    pub front_ball: Reading,
    pub back_ball: Reading,
    /// Robot-relative piece detections
    pub pieces: Vec<Translation2D>,
}

impl Default for SimState {
    fn default() -> Self {
        SimState {
            pose: Pose2D::default(),
            velocity: ChassisVelocity::zero(),
            pose_fault: None,
            last_drive: None,
            locked: false,
            turret_angle: 0.0,
            hood_angle: 0.0,
            flywheel_setpoint: 0.0,
            flywheel_velocity: 0.0,
            hopper_volts: 0.0,
            roller_volts: 0.0,
            front_ball: Ok(false),
            back_ball: Ok(false),
            pieces: Vec::new(),
        }
    }
}

type Shared = Arc<Mutex<SimState>>;

fn shared(state: &Shared) -> MutexGuard<'_, SimState> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}

/// Test-side view of the simulated robot
#[derive(Debug, Clone)]
pub struct SimHandle {
    state: Shared,
}

impl SimHandle {
    /// Run `f` against the shared state
    pub fn with<R>(&self, f: impl FnOnce(&mut SimState) -> R) -> R {
        f(&mut shared(&self.state))
    }

    pub fn snapshot(&self) -> SimState {
        shared(&self.state).clone()
    }

    pub fn set_pose(&self, pose: Pose2D) {
        self.with(|s| s.pose = pose);
    }

    pub fn set_velocity(&self, velocity: ChassisVelocity) {
        self.with(|s| s.velocity = velocity);
    }

    pub fn set_balls(&self, front: bool, back: bool) {
        self.with(|s| {
            s.front_ball = Ok(front);
            s.back_ball = Ok(back);
        });
    }

    /// Advance the drivetrain by `dt` seconds using the last drive command
    pub fn step(&self, dt: f64) {
        self.with(|s| {
            let command = if s.locked {
                ChassisVelocity::zero()
            } else {
                s.last_drive.unwrap_or_else(ChassisVelocity::zero)
            };
            s.velocity = command;
            let field = command.to_field_relative(s.pose.heading);
            s.pose = Pose2D::new(
                s.pose.x + field.vx * dt,
                s.pose.y + field.vy * dt,
                s.pose.heading + field.omega * dt,
            );
        });
    }
}

struct SimDrivetrain(Shared);
struct SimTurret(Shared);
struct SimHood(Shared);
struct SimFlywheel(Shared);
struct SimHopper(Shared);
struct SimRoller(Shared);
struct SimFrontSensor(Shared);
struct SimBackSensor(Shared);
struct SimCamera(Shared);

impl Drivetrain for SimDrivetrain {
    fn current_pose(&self) -> Result<Pose2D, SensorError> {
        let s = shared(&self.0);
        match &s.pose_fault {
            Some(e) => Err(e.clone()),
            None => Ok(s.pose),
        }
    }

    fn current_chassis_velocity(&self) -> Result<ChassisVelocity, SensorError> {
        Ok(shared(&self.0).velocity)
    }

    fn drive_at(&mut self, velocity: ChassisVelocity) {
        let mut s = shared(&self.0);
        s.locked = false;
        s.last_drive = Some(velocity);
    }

    fn lock(&mut self) {
        let mut s = shared(&self.0);
        s.locked = true;
        s.last_drive = None;
    }
}

impl AngleActuator for SimTurret {
    fn set_angle(&mut self, angle: f64) {
        shared(&self.0).turret_angle = angle;
    }

    fn current_angle(&self) -> f64 {
        shared(&self.0).turret_angle
    }

    fn is_at_setpoint(&self) -> bool {
        true
    }
}

impl AngleActuator for SimHood {
    fn set_angle(&mut self, angle: f64) {
        shared(&self.0).hood_angle = angle;
    }

    fn current_angle(&self) -> f64 {
        shared(&self.0).hood_angle
    }

    fn is_at_setpoint(&self) -> bool {
        true
    }
}

impl VelocityActuator for SimFlywheel {
    fn set_velocity(&mut self, velocity: f64) {
        let mut s = shared(&self.0);
        s.flywheel_setpoint = velocity;
        s.flywheel_velocity = velocity;
    }

    fn current_velocity(&self) -> f64 {
        shared(&self.0).flywheel_velocity
    }

    fn is_at_setpoint(&self) -> bool {
        let s = shared(&self.0);
        (s.flywheel_velocity - s.flywheel_setpoint).abs() < 1.0
    }
}

impl VoltageActuator for SimHopper {
    fn set_voltage(&mut self, volts: f64) {
        shared(&self.0).hopper_volts = volts;
    }

    fn current_voltage(&self) -> f64 {
        shared(&self.0).hopper_volts
    }
}

impl VoltageActuator for SimRoller {
    fn set_voltage(&mut self, volts: f64) {
        shared(&self.0).roller_volts = volts;
    }

    fn current_voltage(&self) -> f64 {
        shared(&self.0).roller_volts
    }
}

impl ProximitySensor for SimFrontSensor {
    fn name(&self) -> &str {
        "Roller/hasBall"
    }

    fn is_detecting(&self) -> Reading {
        shared(&self.0).front_ball.clone()
    }
}

impl ProximitySensor for SimBackSensor {
    fn name(&self) -> &str {
        "Hopper/hasBall"
    }

    fn is_detecting(&self) -> Reading {
        shared(&self.0).back_ball.clone()
    }
}

impl PieceCamera for SimCamera {
    fn detections(&self) -> Result<Vec<Translation2D>, SensorError> {
        Ok(shared(&self.0).pieces.clone())
    }
}

/// Build simulated hardware and the handle that controls it
pub fn sim_hardware(initial: SimState) -> (Hardware, SimHandle) {
    let state: Shared = Arc::new(Mutex::new(initial));
    let hardware = Hardware {
        drivetrain: Box::new(SimDrivetrain(state.clone())),
        turret: Box::new(SimTurret(state.clone())),
        hood: Box::new(SimHood(state.clone())),
        flywheel: Box::new(SimFlywheel(state.clone())),
        hopper: Box::new(SimHopper(state.clone())),
        roller: Box::new(SimRoller(state.clone())),
        front_sensor: Box::new(SimFrontSensor(state.clone())),
        back_sensor: Box::new(SimBackSensor(state.clone())),
        camera: Box::new(SimCamera(state.clone())),
    };
    (hardware, SimHandle { state })
}
