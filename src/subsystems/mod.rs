//! Interfaces to the hardware the core drives
pub mod sim;

use crate::common::types::{ChassisVelocity, Pose2D, Translation2D};
use crate::error::SensorError;
pub use crate::perception::ProximitySensor;

/// Swerve drivetrain with odometry
pub trait Drivetrain {
    /// Estimated field pose
    fn current_pose(&self) -> Result<Pose2D, SensorError>;

    /// Measured robot-relative chassis speeds
    fn current_chassis_velocity(&self) -> Result<ChassisVelocity, SensorError>;

    /// Robot-relative velocity command
    fn drive_at(&mut self, velocity: ChassisVelocity);

    /// Point the modules inward so the robot resists being pushed
    fn lock(&mut self);
}

/// A mechanism closed-loop controlled to an angle (turret in radians, hood in degrees)
pub trait AngleActuator {
    fn set_angle(&mut self, angle: f64);
    fn current_angle(&self) -> f64;
    fn is_at_setpoint(&self) -> bool;
}

/// A mechanism closed-loop controlled to a velocity (rotations per second)
pub trait VelocityActuator {
    fn set_velocity(&mut self, velocity: f64);
    fn current_velocity(&self) -> f64;
    fn is_at_setpoint(&self) -> bool;
}

/// An open-loop motor driven by voltage
pub trait VoltageActuator {
    fn set_voltage(&mut self, volts: f64);
    fn current_voltage(&self) -> f64;
}

/// Camera reporting game pieces relative to the robot
pub trait PieceCamera {
    fn detections(&self) -> Result<Vec<Translation2D>, SensorError>;
}

/// Every collaborator the core talks to, owned for the life of the process
pub struct Hardware {
    pub drivetrain: Box<dyn Drivetrain + Send>,
    pub turret: Box<dyn AngleActuator + Send>,
    pub hood: Box<dyn AngleActuator + Send>,
    pub flywheel: Box<dyn VelocityActuator + Send>,
    pub hopper: Box<dyn VoltageActuator + Send>,
    pub roller: Box<dyn VoltageActuator + Send>,
    /// Ball sensor at the roller
    pub front_sensor: Box<dyn ProximitySensor + Send>,
    /// Ball sensor at the hopper
    pub back_sensor: Box<dyn ProximitySensor + Send>,
    pub camera: Box<dyn PieceCamera + Send>,
}
