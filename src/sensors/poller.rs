use super::capability::{SensorError, SensorKind, bounded_read};
use super::readings::{AltitudeReading, HeadingReading, PositionFix, ProximityReading, TiltSample};
use crate::event;
use crate::safety::{FaultKind, LoopKind, SafetyHandler};
use std::{future::Future, sync::Arc, time::Duration};
use tokio::time::{Instant, MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;

/// Sanity check applied to every reading before it is published.
pub trait Plausible {
    fn is_plausible(&self) -> bool;
}

impl Plausible for TiltSample {
    fn is_plausible(&self) -> bool {
        self.accel.is_finite() && self.gyro.is_finite() && self.accel.magnitude() > 0.0
    }
}

impl Plausible for AltitudeReading {
    fn is_plausible(&self) -> bool { AltitudeReading::is_plausible(self) }
}

impl Plausible for ProximityReading {
    fn is_plausible(&self) -> bool { ProximityReading::is_plausible(self) }
}

impl Plausible for HeadingReading {
    fn is_plausible(&self) -> bool { HeadingReading::is_plausible(self) }
}

impl Plausible for PositionFix {
    fn is_plausible(&self) -> bool { PositionFix::is_plausible(self) }
}

/// Periodic reader for a non-critical scalar sensor.
///
/// Every failed or implausible read is reported as a non-fatal fault and nothing is
/// published for that cycle, consumers keep seeing the last-known-good value.
#[derive(Debug, Clone, Copy)]
pub struct SensorPoller {
    sensor: SensorKind,
    loop_kind: LoopKind,
    period: Duration,
    read_timeout: Duration,
}

impl SensorPoller {
    pub fn new(sensor: SensorKind, loop_kind: LoopKind, period: Duration, read_timeout: Duration) -> Self {
        Self { sensor, loop_kind, period, read_timeout }
    }

    /// One bounded read, mapped into the fault taxonomy on failure.
    pub async fn poll_once<T, R, Fut>(&self, read: &R) -> Result<T, FaultKind>
    where
        T: Plausible,
        R: Fn() -> Fut,
        Fut: Future<Output = Result<T, SensorError>>,
    {
        match bounded_read(self.read_timeout, read()).await {
            Ok(reading) if reading.is_plausible() => Ok(reading),
            Ok(_) => Err(FaultKind::SensorInvalidReading(self.sensor)),
            Err(err) => Err(FaultKind::from_sensor_error(self.sensor, &err)),
        }
    }

    pub async fn run<T, R, Fut, P>(
        self,
        read: R,
        publish: P,
        safety: Arc<SafetyHandler>,
        c_tok: CancellationToken,
    ) where
        T: Plausible + Send,
        R: Fn() -> Fut + Send + Sync,
        Fut: Future<Output = Result<T, SensorError>> + Send,
        P: Fn(T) + Send + Sync,
    {
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                biased;
                () = c_tok.cancelled() => break,
                _ = ticker.tick() => {}
            }
            let started = Instant::now();
            match self.poll_once(&read).await {
                Ok(reading) => publish(reading),
                Err(kind) => safety.report_fault(kind, false).await,
            }
            let elapsed = started.elapsed();
            if elapsed > self.period {
                event!("{} loop took {elapsed:?}", self.loop_kind);
                safety.report_fault(FaultKind::LoopOverrun(self.loop_kind), false).await;
            }
        }
        event!("{} poller stopped", self.sensor);
    }
}
