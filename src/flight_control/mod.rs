//! The real-time control core: orientation estimation, pid stabilization, autoflight
//! sequencing and the shared state these loops exchange.

mod auto_flight;
mod calibration;
mod command;
mod flight_phase;
mod mission;
mod orientation;
mod pid;
mod shared_state;
mod telemetry;
#[cfg(test)]
mod tests;

pub use auto_flight::{AutoFlight, AutoFlightParams};
pub use calibration::{CalibrationStatus, Calibrator, ZeroReference};
pub use command::{CommandError, FlightCommand};
pub use flight_phase::{ALLOWED_TRANSITIONS, FlightPhase};
pub use mission::{MissionLeg, MissionPlan, MissionProgress};
pub use orientation::{OrientationEstimate, OrientationEstimator, wrap_degrees};
pub use pid::{Axis, AxisState, Gains, PidController, PidLimits, PidLink, Setpoint};
pub use shared_state::SharedFlightState;
pub use telemetry::{TelemetryPublisher, TelemetrySnapshot, run_log_sink};
