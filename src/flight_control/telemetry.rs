use super::{flight_phase::FlightPhase, orientation::OrientationEstimate, shared_state::SharedFlightState};
use crate::actuation::MotorCommand;
use crate::safety::{FaultKind, FaultRecord, LoopKind, SafetyHandler};
use crate::sensors::{AltitudeReading, ProximityReading};
use crate::{event, fault, log, warn};
use chrono::{DateTime, Utc};
use std::{sync::Arc, time::Duration};
use tokio::sync::broadcast;
use tokio::time::{Instant, MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq)]
pub struct TelemetrySnapshot {
    pub timestamp: DateTime<Utc>,
    pub orientation: OrientationEstimate,
    pub altitude: Option<AltitudeReading>,
    pub proximity: Option<ProximityReading>,
    pub phase: FlightPhase,
    pub motor_command: MotorCommand,
    pub pending_faults: Vec<FaultRecord>,
    /// Faults evicted from the pending queue before anyone drained them.
    pub dropped_faults: u64,
}

/// Samples the shared flight state periodically and broadcasts it to the network
/// and logging collaborators. Pending faults are drained into the snapshot, so
/// every fault is delivered with exactly one snapshot.
pub struct TelemetryPublisher {
    state: Arc<SharedFlightState>,
    safety: Arc<SafetyHandler>,
    tx: broadcast::Sender<TelemetrySnapshot>,
}

impl TelemetryPublisher {
    const CHANNEL_CAPACITY: usize = 32;

    pub fn new(state: Arc<SharedFlightState>, safety: Arc<SafetyHandler>) -> Self {
        Self { state, safety, tx: broadcast::Sender::new(Self::CHANNEL_CAPACITY) }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TelemetrySnapshot> { self.tx.subscribe() }

    pub async fn snapshot(&self) -> TelemetrySnapshot {
        TelemetrySnapshot {
            timestamp: Utc::now(),
            orientation: self.state.orientation(),
            altitude: self.state.altitude(),
            proximity: self.state.proximity(),
            phase: self.state.phase(),
            motor_command: self.state.motor_command(),
            pending_faults: self.safety.pending().drain().await,
            dropped_faults: self.safety.pending().dropped(),
        }
    }

    pub async fn run(self: Arc<Self>, period: Duration, c_tok: CancellationToken) {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                biased;
                () = c_tok.cancelled() => break,
                _ = ticker.tick() => {}
            }
            // faults stay queued until somebody is listening
            if self.tx.receiver_count() == 0 {
                continue;
            }
            let started = Instant::now();
            let snapshot = self.snapshot().await;
            let _ = self.tx.send(snapshot);
            if started.elapsed() > period {
                self.safety.report_fault(FaultKind::LoopOverrun(LoopKind::Telemetry), false).await;
            }
        }
        event!("Telemetry publisher stopped");
    }
}

/// Writes every `every`-th snapshot through the log macros, faults always.
pub async fn run_log_sink(mut rx: broadcast::Receiver<TelemetrySnapshot>, every: usize) {
    let mut count = 0usize;
    loop {
        match rx.recv().await {
            Ok(snapshot) => {
                for record in &snapshot.pending_faults {
                    fault!("telemetry: {record} at {}", record.timestamp().format("%H:%M:%S%.3f"));
                }
                count += 1;
                if count % every.max(1) == 0 {
                    let o = snapshot.orientation;
                    log!(
                        "{} | pitch {:6.2} roll {:6.2} yaw {:7.2} | alt {} | prox {} | motors {:.3?}",
                        snapshot.phase,
                        o.pitch_deg,
                        o.roll_deg,
                        o.yaw_deg,
                        snapshot.altitude.map_or("-".to_string(), |a| format!("{:.2} m", a.altitude_m())),
                        snapshot.proximity.map_or("-".to_string(), |p| format!("{:.2} m", p.distance_m())),
                        snapshot.motor_command.duties(),
                    );
                }
            }
            Err(broadcast::error::RecvError::Lagged(n)) => warn!("Telemetry log sink lagged by {n} snapshots"),
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
