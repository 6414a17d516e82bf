use crate::actuation::MotorOutput;
use crate::config::FlightConfig;
use crate::flight_control::{FlightCommand, PidController, PidLink, SharedFlightState, TelemetryPublisher};
use crate::safety::SafetyHandler;
use std::sync::Arc;
use tokio::sync::mpsc;

/// The long-lived collaborators every flight loop is built from, wired together
/// once at startup.
#[derive(Clone)]
pub struct FlightKeychain {
    /// Tunables the process was started with.
    config: Arc<FlightConfig>,
    /// Snapshot cells shared by all loops.
    state: Arc<SharedFlightState>,
    /// Setpoint, gains and interrupt flag of the stabilization controller.
    pid: Arc<PidLink>,
    /// Fault recorder and owner of the emergency stop.
    safety: Arc<SafetyHandler>,
    /// The actuator every motor write goes through.
    motors: Arc<dyn MotorOutput>,
    /// Periodic state sampler for the ground link and the log sink.
    telemetry: Arc<TelemetryPublisher>,
    /// Producer side of the AutoFlight command queue.
    commands: mpsc::Sender<FlightCommand>,
}

impl FlightKeychain {
    const COMMAND_QUEUE_LEN: usize = 16;

    /// Builds the shared state, the controller and the safety handler around `motors`.
    ///
    /// # Returns
    /// The keychain, the controller to spawn and the command receiver for AutoFlight.
    pub fn new(
        config: FlightConfig,
        motors: Arc<dyn MotorOutput>,
    ) -> (Self, PidController, mpsc::Receiver<FlightCommand>) {
        let state = Arc::new(SharedFlightState::new());
        let controller = PidController::new(config.gains, config.pid_limits(), Arc::clone(&state));
        let pid = controller.link();
        let safety = Arc::new(SafetyHandler::new(
            Arc::clone(&pid),
            Arc::clone(&motors),
            config.settling_delay,
            config.pending_fault_capacity,
        ));
        let telemetry = Arc::new(TelemetryPublisher::new(Arc::clone(&state), Arc::clone(&safety)));
        let (commands, command_rx) = mpsc::channel(Self::COMMAND_QUEUE_LEN);
        let keychain = Self { config: Arc::new(config), state, pid, safety, motors, telemetry, commands };
        (keychain, controller, command_rx)
    }

    /// Provides a cloned reference to the configuration.
    pub fn config(&self) -> Arc<FlightConfig> { Arc::clone(&self.config) }

    /// Provides a cloned reference to the shared flight state.
    pub fn state(&self) -> Arc<SharedFlightState> { Arc::clone(&self.state) }

    /// Provides a cloned reference to the pid link.
    pub fn pid(&self) -> Arc<PidLink> { Arc::clone(&self.pid) }

    /// Provides a cloned reference to the safety handler.
    pub fn safety(&self) -> Arc<SafetyHandler> { Arc::clone(&self.safety) }

    /// Provides a cloned reference to the motor output.
    pub fn motors(&self) -> Arc<dyn MotorOutput> { Arc::clone(&self.motors) }

    /// Provides a cloned reference to the telemetry publisher.
    pub fn telemetry(&self) -> Arc<TelemetryPublisher> { Arc::clone(&self.telemetry) }

    /// Provides a new handle to the command queue.
    pub fn commands(&self) -> mpsc::Sender<FlightCommand> { self.commands.clone() }
}
