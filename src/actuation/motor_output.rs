use super::motor_command::MotorCommand;
use crate::event;
use std::sync::{Mutex, PoisonError};
use strum_macros::Display;

#[derive(Debug, Display, Clone, PartialEq)]
pub enum ActuatorError {
    ChannelWrite(usize),
    Disconnected,
}

impl std::error::Error for ActuatorError {}

/// Hardware seam for the rotors.
///
/// `zero` must be infallible, non-blocking and callable from any thread at any
/// time, the emergency stop relies on it while other loops are still unwinding.
pub trait MotorOutput: Send + Sync {
    fn apply(&self, command: &MotorCommand) -> Result<(), ActuatorError>;
    fn zero(&self);
}

/// Bench output that keeps the last command and traces writes as events.
#[derive(Default)]
pub struct LoggingMotorOutput {
    last: Mutex<MotorCommand>,
}

impl LoggingMotorOutput {
    pub fn new() -> Self { Self::default() }

    pub fn last(&self) -> MotorCommand { *self.last.lock().unwrap_or_else(PoisonError::into_inner) }
}

impl MotorOutput for LoggingMotorOutput {
    fn apply(&self, command: &MotorCommand) -> Result<(), ActuatorError> {
        *self.last.lock().unwrap_or_else(PoisonError::into_inner) = *command;
        event!("motors <- {:?}", command.duties());
        Ok(())
    }

    fn zero(&self) {
        *self.last.lock().unwrap_or_else(PoisonError::into_inner) = MotorCommand::DISARMED;
        event!("motors <- zero");
    }
}
