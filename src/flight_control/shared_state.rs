use super::{calibration::ZeroReference, flight_phase::FlightPhase, orientation::OrientationEstimate};
use crate::actuation::MotorCommand;
use crate::sensors::{AltitudeReading, HeadingReading, PositionFix, ProximityReading};
use tokio::sync::watch;

/// Live values exchanged between the loops.
///
/// Each field is a `watch` cell with exactly one producer loop:
///
/// | field         | producer              |
/// |---------------|-----------------------|
/// | orientation   | orientation estimator |
/// | altitude      | barometer poller      |
/// | proximity     | proximity poller      |
/// | heading       | autoflight            |
/// | position      | autoflight            |
/// | motor command | pid loop              |
/// | phase         | autoflight            |
///
/// Reads copy the whole value out under the cell's lock, so a consumer always gets
/// a complete value. Producers only touch the cell after their hardware read has
/// finished, and a read never waits on a producer's I/O.
pub struct SharedFlightState {
    orientation: watch::Sender<OrientationEstimate>,
    altitude: watch::Sender<Option<AltitudeReading>>,
    proximity: watch::Sender<Option<ProximityReading>>,
    heading: watch::Sender<Option<HeadingReading>>,
    position: watch::Sender<Option<PositionFix>>,
    motor_command: watch::Sender<MotorCommand>,
    phase: watch::Sender<FlightPhase>,
}

impl Default for SharedFlightState {
    fn default() -> Self { Self::new() }
}

impl SharedFlightState {
    pub fn new() -> Self {
        Self {
            orientation: watch::Sender::new(OrientationEstimate::level()),
            altitude: watch::Sender::new(None),
            proximity: watch::Sender::new(None),
            heading: watch::Sender::new(None),
            position: watch::Sender::new(None),
            motor_command: watch::Sender::new(MotorCommand::DISARMED),
            phase: watch::Sender::new(FlightPhase::Idle),
        }
    }

    pub fn publish_orientation(&self, estimate: OrientationEstimate) { self.orientation.send_replace(estimate); }
    pub fn publish_altitude(&self, reading: AltitudeReading) { self.altitude.send_replace(Some(reading)); }
    pub fn publish_proximity(&self, reading: ProximityReading) { self.proximity.send_replace(Some(reading)); }
    pub fn publish_heading(&self, reading: HeadingReading) { self.heading.send_replace(Some(reading)); }
    pub fn publish_position(&self, fix: PositionFix) { self.position.send_replace(Some(fix)); }
    pub fn publish_motor_command(&self, command: MotorCommand) { self.motor_command.send_replace(command); }
    pub fn publish_phase(&self, phase: FlightPhase) { self.phase.send_replace(phase); }

    pub fn orientation(&self) -> OrientationEstimate { *self.orientation.borrow() }
    pub fn altitude(&self) -> Option<AltitudeReading> { *self.altitude.borrow() }
    pub fn proximity(&self) -> Option<ProximityReading> { *self.proximity.borrow() }
    pub fn heading(&self) -> Option<HeadingReading> { *self.heading.borrow() }
    pub fn position(&self) -> Option<PositionFix> { *self.position.borrow() }
    pub fn motor_command(&self) -> MotorCommand { *self.motor_command.borrow() }
    pub fn phase(&self) -> FlightPhase { *self.phase.borrow() }

    /// Height used by altitude hold: the proximity sensor while it is within its
    /// trusted range, otherwise barometric altitude relative to the calibrated ground.
    pub fn height_above_ground(&self, reference: &ZeroReference, proximity_ceiling_m: f64) -> Option<f64> {
        match self.proximity() {
            Some(p) if p.distance_m() < proximity_ceiling_m => Some(p.distance_m()),
            _ => self.altitude().map(|a| a.altitude_m() - reference.ground_altitude_m),
        }
    }
}
