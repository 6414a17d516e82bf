use super::{
    flight_phase::FlightPhase,
    mission::MissionPlan,
    pid::{Axis, Gains},
};
use strum_macros::Display;

/// Operator commands arriving from the network layer.
#[derive(Debug, Clone, PartialEq)]
pub enum FlightCommand {
    Arm,
    Disarm,
    SetGains(Axis, Gains),
    StartMission(MissionPlan),
    Abort,
}

#[derive(Debug, Display, Clone, PartialEq)]
pub enum CommandError {
    UnknownAxis(i32),
    InvalidGains(Gains),
    InvalidMission,
    NotAllowedIn(FlightPhase),
    Empty,
}

impl std::error::Error for CommandError {}

impl FlightCommand {
    /// Rejects values that must never reach the controller.
    pub fn validate(&self, altitude_ceiling_m: f64) -> Result<(), CommandError> {
        match self {
            FlightCommand::SetGains(_, gains) if !gains.is_valid() => Err(CommandError::InvalidGains(*gains)),
            FlightCommand::StartMission(plan) if !plan.is_valid(altitude_ceiling_m) => {
                Err(CommandError::InvalidMission)
            }
            _ => Ok(()),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FlightCommand::Arm => "Arm",
            FlightCommand::Disarm => "Disarm",
            FlightCommand::SetGains(..) => "SetGains",
            FlightCommand::StartMission(_) => "StartMission",
            FlightCommand::Abort => "Abort",
        }
    }
}
