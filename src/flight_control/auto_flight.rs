use super::{
    calibration::{CalibrationStatus, Calibrator},
    command::{CommandError, FlightCommand},
    flight_phase::FlightPhase,
    mission::{MissionPlan, MissionProgress},
    pid::{Axis, PidLink, Setpoint},
    shared_state::SharedFlightState,
};
use crate::safety::{FaultKind, LoopKind, SafetyHandler};
use crate::sensors::{HeadingSource, PositionSource, SensorKind, SensorPoller};
use crate::{event, info, warn};
use std::{sync::Arc, time::Duration};
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior, interval};

#[derive(Debug, Clone, Copy)]
pub struct AutoFlightParams {
    pub navigation_timeout: Duration,
    pub calibration_window: usize,
    pub calibration_tolerance_deg: f64,
    pub calibration_max_cycles: u32,
    pub descent_rate_mps: f64,
    pub touchdown_distance_m: f64,
    pub altitude_ceiling_m: f64,
    pub min_clearance_m: f64,
    pub proximity_ceiling_m: f64,
}

/// Flight phase sequencer.
///
/// Owns the [`FlightPhase`] and is the only place it changes. Steers the aircraft
/// exclusively through the pid setpoint, it never writes motor commands.
pub struct AutoFlight {
    state: Arc<SharedFlightState>,
    pid: Arc<PidLink>,
    safety: Arc<SafetyHandler>,
    heading_src: Arc<dyn HeadingSource>,
    position_src: Arc<dyn PositionSource>,
    compass: SensorPoller,
    gps: SensorPoller,
    commands: mpsc::Receiver<FlightCommand>,
    params: AutoFlightParams,
    phase: FlightPhase,
    calibrator: Calibrator,
    mission: Option<MissionProgress>,
    queued_mission: Option<MissionPlan>,
    cleared_ground: bool,
}

impl AutoFlight {
    /// Creates the sequencer in [`FlightPhase::Idle`] and publishes that phase.
    ///
    /// # Arguments
    /// - `state`: Shared flight state to read from and publish navigation into.
    /// - `pid`: Link to the stabilization controller, the only steering channel.
    /// - `safety`: Fault sink and root cancellation token.
    /// - `heading_src`: Compass driver.
    /// - `position_src`: GPS driver.
    /// - `commands`: Receiving end of the operator command queue.
    /// - `params`: Timing, thresholds and calibration tunables.
    ///
    /// # Returns
    /// An idle `AutoFlight`, driven by [`AutoFlight::step`] or [`AutoFlight::run`].
    pub fn new(
        state: Arc<SharedFlightState>,
        pid: Arc<PidLink>,
        safety: Arc<SafetyHandler>,
        heading_src: Arc<dyn HeadingSource>,
        position_src: Arc<dyn PositionSource>,
        commands: mpsc::Receiver<FlightCommand>,
        params: AutoFlightParams,
    ) -> Self {
        let calibrator = Calibrator::new(
            params.calibration_window,
            params.calibration_tolerance_deg,
            params.calibration_max_cycles,
        );
        let poller = |sensor| {
            SensorPoller::new(sensor, LoopKind::AutoFlight, params.navigation_timeout, params.navigation_timeout)
        };
        state.publish_phase(FlightPhase::Idle);
        Self {
            state,
            pid,
            safety,
            heading_src,
            position_src,
            compass: poller(SensorKind::Compass),
            gps: poller(SensorKind::Gps),
            commands,
            params,
            phase: FlightPhase::Idle,
            calibrator,
            mission: None,
            queued_mission: None,
            cleared_ground: false,
        }
    }

    /// Current flight phase.
    pub fn phase(&self) -> FlightPhase { self.phase }

    /// Progress through the active mission, if one is being flown.
    pub fn mission(&self) -> Option<&MissionProgress> { self.mission.as_ref() }

    fn transition(&mut self, to: FlightPhase) -> bool {
        if !self.phase.can_transition_to(to) {
            warn!("Refusing phase transition {} -> {to}", self.phase);
            return false;
        }
        info!("Phase {} -> {to}", self.phase);
        self.phase = to;
        self.state.publish_phase(to);
        true
    }

    fn begin_landing(&mut self) {
        self.mission = None;
        self.queued_mission = None;
        self.transition(FlightPhase::Landing);
    }

    /// Applies one operator command.
    ///
    /// # Arguments
    /// - `command`: The command, validated before any state is touched.
    ///
    /// # Returns
    /// `Err` for a malformed command or one the current phase does not accept.
    /// Nothing changes in that case.
    pub async fn handle_command(&mut self, command: FlightCommand) -> Result<(), CommandError> {
        command.validate(self.params.altitude_ceiling_m)?;
        match command {
            FlightCommand::Arm => match self.phase {
                FlightPhase::Idle => {
                    self.calibrator.reset();
                    self.transition(FlightPhase::Calibrating);
                }
                FlightPhase::EmergencyStopped => {
                    self.transition(FlightPhase::Idle);
                    self.calibrator.reset();
                    self.transition(FlightPhase::Calibrating);
                }
                phase => return Err(CommandError::NotAllowedIn(phase)),
            },
            FlightCommand::Disarm => match self.phase {
                FlightPhase::Idle | FlightPhase::Landing | FlightPhase::EmergencyStopped => {}
                _ => self.begin_landing(),
            },
            FlightCommand::SetGains(axis, gains) => {
                info!("{axis} gains set to {gains}");
                self.pid.set_gains(axis, gains);
            }
            FlightCommand::StartMission(plan) => match self.phase {
                FlightPhase::Landing | FlightPhase::EmergencyStopped => {
                    return Err(CommandError::NotAllowedIn(self.phase));
                }
                FlightPhase::Autonomous => {
                    info!("Replacing running mission with {} legs", plan.legs().len());
                    self.mission = Some(MissionProgress::new(plan));
                }
                _ => {
                    info!("Mission with {} legs queued", plan.legs().len());
                    self.queued_mission = Some(plan);
                }
            },
            FlightCommand::Abort => {
                self.safety.report_fault(FaultKind::OperatorInterrupt, true).await;
                self.transition(FlightPhase::EmergencyStopped);
            }
        }
        Ok(())
    }

    async fn read_navigation(&self) {
        let heading_src = &self.heading_src;
        match self.compass.poll_once(&|| heading_src.read_heading()).await {
            Ok(heading) => self.state.publish_heading(heading),
            Err(kind) => self.safety.report_fault(kind, false).await,
        }
        let position_src = &self.position_src;
        match self.gps.poll_once(&|| position_src.read_position()).await {
            Ok(fix) => self.state.publish_position(fix),
            Err(kind) => self.safety.report_fault(kind, false).await,
        }
    }

    fn height(&self) -> Option<f64> {
        self.state.height_above_ground(&self.pid.zero_reference(), self.params.proximity_ceiling_m)
    }

    fn descent_threshold_reached(&mut self) -> bool {
        let height = self.height();
        if let Some(h) = height {
            if h >= self.params.altitude_ceiling_m {
                warn!("Altitude {h:.2} m reached the ceiling, landing");
                return true;
            }
        }
        if self.phase == FlightPhase::Autonomous {
            let clearance = self.params.min_clearance_m;
            if height.is_some_and(|h| h > clearance) {
                self.cleared_ground = true;
            }
            if let Some(p) = self.state.proximity() {
                if self.cleared_ground && p.distance_m() < clearance {
                    warn!("Obstacle at {:.2} m below clearance, landing", p.distance_m());
                    return true;
                }
            }
        }
        false
    }

    fn hover_setpoint(&self) -> Setpoint {
        let heading = self.state.heading().map_or(self.state.orientation().yaw_deg, |h| h.heading_deg());
        Setpoint::new(0.0, 0.0, heading, self.height().unwrap_or(0.0))
    }

    /// One sequencing cycle over `dt` seconds.
    ///
    /// Once the safety handler is stopping, the cycle only pins the phase to
    /// `EmergencyStopped` and leaves queued commands untouched. The reset edge out of
    /// that phase is then reachable through [`AutoFlight::handle_command`] alone, since
    /// the fail-stop path terminates the process in production.
    pub async fn step(&mut self, dt: f64) {
        if self.safety.is_stopping() {
            if self.phase != FlightPhase::EmergencyStopped {
                self.transition(FlightPhase::EmergencyStopped);
            }
            return;
        }
        while let Ok(command) = self.commands.try_recv() {
            let name = command.name();
            if let Err(e) = self.handle_command(command).await {
                warn!("Rejected {name} command: {e}");
            }
        }
        self.read_navigation().await;

        match self.phase {
            FlightPhase::Idle | FlightPhase::EmergencyStopped => {}
            FlightPhase::Calibrating => {
                let altitude = self.state.altitude().map(|a| a.altitude_m());
                match self.calibrator.feed(self.state.orientation(), altitude) {
                    CalibrationStatus::Pending => {}
                    CalibrationStatus::Converged(reference) => {
                        info!(
                            "Level reference pitch {:.2}, roll {:.2}, ground {:.2} m after {} cycles",
                            reference.pitch_deg,
                            reference.roll_deg,
                            reference.ground_altitude_m,
                            self.calibrator.cycles()
                        );
                        self.pid.set_zero_reference(reference);
                        self.transition(FlightPhase::Armed);
                    }
                    CalibrationStatus::Failed => {
                        warn!("Calibration did not converge in {} cycles", self.calibrator.cycles());
                        self.transition(FlightPhase::Idle);
                        self.safety.report_fault(FaultKind::CalibrationFailure, false).await;
                    }
                }
            }
            FlightPhase::Armed => {
                self.pid.set_setpoints(self.hover_setpoint());
                self.pid.rearm();
                self.transition(FlightPhase::Stabilizing);
            }
            FlightPhase::Stabilizing => {
                if self.descent_threshold_reached() {
                    self.begin_landing();
                } else if let Some(plan) = self.queued_mission.take() {
                    self.mission = Some(MissionProgress::new(plan));
                    self.cleared_ground = false;
                    self.transition(FlightPhase::Autonomous);
                }
            }
            FlightPhase::Autonomous => {
                if self.descent_threshold_reached() {
                    self.begin_landing();
                    return;
                }
                let elapsed = Duration::try_from_secs_f64(dt).unwrap_or_default();
                match self.mission.as_mut().and_then(|m| m.advance(elapsed)) {
                    Some(leg) => {
                        self.pid.set_setpoint(Axis::Altitude, leg.altitude_m);
                        self.pid.set_setpoint(Axis::Yaw, leg.heading_deg);
                    }
                    None => {
                        info!("Mission complete, holding position");
                        self.mission = None;
                        self.transition(FlightPhase::Stabilizing);
                    }
                }
            }
            FlightPhase::Landing => self.step_landing(dt),
        }
    }

    fn step_landing(&mut self, dt: f64) {
        if self.pid.is_interrupted() {
            // never got off the ground
            self.transition(FlightPhase::Idle);
            return;
        }
        let current = self.pid.setpoint().get(Axis::Altitude);
        let next = (current - self.params.descent_rate_mps * dt.max(0.0)).max(0.0);
        self.pid.set_setpoint(Axis::Altitude, next);
        let touchdown = self.params.touchdown_distance_m;
        if next <= 0.0 && self.height().is_none_or(|h| h <= touchdown) {
            info!("Touchdown");
            self.pid.interrupt();
            self.transition(FlightPhase::Idle);
        }
    }

    /// Steps the sequencer every `period` until the root token is cancelled, then
    /// settles in [`FlightPhase::EmergencyStopped`].
    pub async fn run(mut self, period: Duration) {
        let c_tok = self.safety.c_tok();
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut last = Instant::now();
        loop {
            tokio::select! {
                biased;
                () = c_tok.cancelled() => break,
                _ = ticker.tick() => {}
            }
            let started = Instant::now();
            let dt = (started - last).as_secs_f64();
            last = started;
            self.step(dt).await;
            if started.elapsed() > period {
                self.safety.report_fault(FaultKind::LoopOverrun(LoopKind::AutoFlight), false).await;
            }
        }
        if self.phase != FlightPhase::EmergencyStopped {
            self.transition(FlightPhase::EmergencyStopped);
        }
        event!("AutoFlight loop stopped");
    }
}
