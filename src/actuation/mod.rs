//! Motor commands, the quad mixing matrix and the motor output seam.

mod motor_command;
mod motor_output;

pub use motor_command::{AxisCorrections, MOTOR_COUNT, MotorCommand, MotorPosition};
pub use motor_output::{ActuatorError, LoggingMotorOutput, MotorOutput};
