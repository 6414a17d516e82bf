use crate::flight_control::{
    Axis, CommandError, FlightCommand, Gains, MissionLeg, MissionPlan, TelemetrySnapshot,
};
use crate::safety::FaultRecord;
use std::time::Duration;

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Upstream {
    #[prost(oneof = "UpstreamContent", tags = "1, 2, 3, 4, 5, 6")]
    pub content: Option<UpstreamContent>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Downstream {
    #[prost(oneof = "DownstreamContent", tags = "1, 2, 3, 4")]
    pub content: Option<DownstreamContent>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Ping {
    #[prost(string, optional, tag = "1")]
    pub echo: Option<String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Pong {
    #[prost(string, optional, tag = "1")]
    pub echo: Option<String>,
}

#[derive(Clone, Copy, PartialEq, prost::Message)]
pub struct Arm {}

#[derive(Clone, Copy, PartialEq, prost::Message)]
pub struct Disarm {}

#[derive(Clone, Copy, PartialEq, prost::Message)]
pub struct Abort {}

#[derive(Clone, Copy, PartialEq, prost::Message)]
pub struct SetGains {
    #[prost(enumeration = "PidAxis", tag = "1")]
    pub axis: i32,
    #[prost(double, tag = "2")]
    pub kp: f64,
    #[prost(double, tag = "3")]
    pub ki: f64,
    #[prost(double, tag = "4")]
    pub kd: f64,
}

#[derive(Clone, Copy, PartialEq, prost::Message)]
pub struct MissionLegMessage {
    #[prost(double, tag = "1")]
    pub altitude_m: f64,
    #[prost(double, tag = "2")]
    pub heading_deg: f64,
    #[prost(uint32, tag = "3")]
    pub hold_ms: u32,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct StartMission {
    #[prost(message, repeated, tag = "1")]
    pub legs: Vec<MissionLegMessage>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Telemetry {
    #[prost(int64, tag = "1")]
    pub timestamp: i64,
    #[prost(enumeration = "Phase", tag = "2")]
    pub phase: i32,
    #[prost(float, tag = "3")]
    pub pitch: f32,
    #[prost(float, tag = "4")]
    pub roll: f32,
    #[prost(float, tag = "5")]
    pub yaw: f32,
    #[prost(float, optional, tag = "6")]
    pub altitude_m: Option<f32>,
    #[prost(float, optional, tag = "7")]
    pub distance_m: Option<f32>,
    #[prost(float, repeated, tag = "8")]
    pub motors: Vec<f32>,
    #[prost(message, repeated, tag = "9")]
    pub pending_faults: Vec<FaultReport>,
    #[prost(uint64, tag = "10")]
    pub dropped_faults: u64,
}

#[derive(Clone, Copy, PartialEq, prost::Message)]
pub struct FaultReport {
    #[prost(uint32, tag = "1")]
    pub code: u32,
    #[prost(bool, tag = "2")]
    pub fatal: bool,
    #[prost(int64, tag = "3")]
    pub timestamp: i64,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct CommandRejected {
    #[prost(string, tag = "1")]
    pub command: String,
    #[prost(string, tag = "2")]
    pub reason: String,
}

#[derive(Clone, PartialEq, prost::Oneof)]
pub enum UpstreamContent {
    #[prost(message, tag = "1")]
    Ping(Ping),
    #[prost(message, tag = "2")]
    Arm(Arm),
    #[prost(message, tag = "3")]
    Disarm(Disarm),
    #[prost(message, tag = "4")]
    SetGains(SetGains),
    #[prost(message, tag = "5")]
    StartMission(StartMission),
    #[prost(message, tag = "6")]
    Abort(Abort),
}

#[derive(Clone, PartialEq, prost::Oneof)]
pub enum DownstreamContent {
    #[prost(message, tag = "1")]
    Pong(Pong),
    #[prost(message, tag = "2")]
    Telemetry(Telemetry),
    #[prost(message, tag = "3")]
    FaultReport(FaultReport),
    #[prost(message, tag = "4")]
    CommandRejected(CommandRejected),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum PidAxis {
    Pitch = 0,
    Roll = 1,
    Yaw = 2,
    Altitude = 3,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum Phase {
    None = 0,
    Idle = 1,
    Calibrating = 2,
    Armed = 3,
    Stabilizing = 4,
    Autonomous = 5,
    Landing = 6,
    EmergencyStopped = 7,
}

impl UpstreamContent {
    pub fn name(&self) -> &'static str {
        match self {
            UpstreamContent::Ping(_) => "Ping",
            UpstreamContent::Arm(_) => "Arm",
            UpstreamContent::Disarm(_) => "Disarm",
            UpstreamContent::SetGains(_) => "SetGains",
            UpstreamContent::StartMission(_) => "StartMission",
            UpstreamContent::Abort(_) => "Abort",
        }
    }
}

impl TryFrom<UpstreamContent> for FlightCommand {
    type Error = CommandError;

    fn try_from(value: UpstreamContent) -> Result<Self, Self::Error> {
        match value {
            UpstreamContent::Ping(_) => Err(CommandError::Empty),
            UpstreamContent::Arm(_) => Ok(FlightCommand::Arm),
            UpstreamContent::Disarm(_) => Ok(FlightCommand::Disarm),
            UpstreamContent::Abort(_) => Ok(FlightCommand::Abort),
            UpstreamContent::SetGains(g) => {
                let axis = usize::try_from(g.axis)
                    .ok()
                    .and_then(Axis::from_repr)
                    .ok_or(CommandError::UnknownAxis(g.axis))?;
                Ok(FlightCommand::SetGains(axis, Gains::new(g.kp, g.ki, g.kd)))
            }
            UpstreamContent::StartMission(m) => {
                let legs = m
                    .legs
                    .iter()
                    .map(|l| MissionLeg {
                        altitude_m: l.altitude_m,
                        heading_deg: l.heading_deg,
                        hold: Duration::from_millis(u64::from(l.hold_ms)),
                    })
                    .collect();
                Ok(FlightCommand::StartMission(MissionPlan::new(legs)))
            }
        }
    }
}

impl From<&FaultRecord> for FaultReport {
    fn from(value: &FaultRecord) -> Self {
        Self {
            code: u32::from(value.code()),
            fatal: value.is_fatal(),
            timestamp: value.timestamp().timestamp_millis(),
        }
    }
}

impl From<&TelemetrySnapshot> for Telemetry {
    #[allow(clippy::cast_possible_truncation)]
    fn from(value: &TelemetrySnapshot) -> Self {
        Self {
            timestamp: value.timestamp.timestamp_millis(),
            phase: value.phase.code(),
            pitch: value.orientation.pitch_deg as f32,
            roll: value.orientation.roll_deg as f32,
            yaw: value.orientation.yaw_deg as f32,
            altitude_m: value.altitude.map(|a| a.altitude_m() as f32),
            distance_m: value.proximity.map(|p| p.distance_m() as f32),
            motors: value.motor_command.duties().iter().map(|d| *d as f32).collect(),
            pending_faults: value.pending_faults.iter().map(FaultReport::from).collect(),
            dropped_faults: value.dropped_faults,
        }
    }
}
