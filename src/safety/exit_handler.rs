use super::fault::{FaultKind, FaultRecord, PendingFaults};
use crate::actuation::MotorOutput;
use crate::flight_control::PidLink;
use crate::{fault, info};
use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

/// Called once the emergency stop sequence has finished, with the process exit code.
pub type ExitHook = Arc<dyn Fn(i32) + Send + Sync>;

/// Records faults and owns the fail-stop path.
///
/// Exactly one instance exists per process. It is built by the top-level assembly
/// and handed to every loop by `Arc`, together with the root cancellation token
/// all loops select on.
pub struct SafetyHandler {
    pid: Arc<PidLink>,
    motors: Arc<dyn MotorOutput>,
    c_tok: CancellationToken,
    settling_delay: Duration,
    pending: PendingFaults,
    fault_tx: broadcast::Sender<FaultRecord>,
    stopping: AtomicBool,
    exit_hook: ExitHook,
}

impl SafetyHandler {
    const FAULT_CHANNEL_CAPACITY: usize = 64;

    pub fn new(
        pid: Arc<PidLink>,
        motors: Arc<dyn MotorOutput>,
        settling_delay: Duration,
        pending_capacity: usize,
    ) -> Self {
        Self {
            pid,
            motors,
            c_tok: CancellationToken::new(),
            settling_delay,
            pending: PendingFaults::new(pending_capacity),
            fault_tx: broadcast::Sender::new(Self::FAULT_CHANNEL_CAPACITY),
            stopping: AtomicBool::new(false),
            exit_hook: Arc::new(|code| std::process::exit(code)),
        }
    }

    /// Replaces the process termination step, used by tests and the sensor check mode.
    #[must_use]
    pub fn with_exit_hook(mut self, hook: ExitHook) -> Self {
        self.exit_hook = hook;
        self
    }

    /// Root token, cancelled as soon as an emergency stop begins.
    pub fn c_tok(&self) -> CancellationToken { self.c_tok.clone() }

    pub fn pending(&self) -> &PendingFaults { &self.pending }

    pub fn subscribe_faults(&self) -> broadcast::Receiver<FaultRecord> { self.fault_tx.subscribe() }

    pub fn is_stopping(&self) -> bool { self.stopping.load(Ordering::SeqCst) }

    /// Records a fault. Fatal faults run the emergency stop before returning, and in
    /// production the process is gone by then.
    pub async fn report_fault(&self, kind: FaultKind, fatal: bool) {
        let record = FaultRecord::new(kind, fatal);
        fault!("{record}");
        self.pending.push(record).await;
        // no receivers just means no ground link is attached
        let _ = self.fault_tx.send(record);
        if record.is_fatal() {
            self.emergency_stop(record).await;
        }
    }

    async fn emergency_stop(&self, record: FaultRecord) {
        self.pid.interrupt();
        if self.stopping.swap(true, Ordering::SeqCst) {
            // a sequence is already running, only make sure nothing slipped through since
            self.motors.zero();
            return;
        }
        self.c_tok.cancel();
        self.motors.zero();
        // a compute cycle may have been past its interrupt check when we zeroed
        tokio::time::sleep(self.settling_delay).await;
        self.motors.zero();
        info!("Motors stopped after {record}. Terminating.");
        (self.exit_hook)(record.exit_code());
    }
}
