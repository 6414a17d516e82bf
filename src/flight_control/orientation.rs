use super::shared_state::SharedFlightState;
use crate::safety::{FaultKind, LoopKind, SafetyHandler};
use crate::sensors::{AccelSample, Plausible, SensorKind, TiltSource, bounded_read};
use crate::{event, warn};
use chrono::{DateTime, Utc};
use std::{sync::Arc, time::Duration};
use tokio::time::{Instant, MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;

/// Attitude snapshot in degrees, as published by the estimator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientationEstimate {
    /// Within `[-90, 90]`.
    pub pitch_deg: f64,
    /// Within `[-90, 90]`.
    pub roll_deg: f64,
    /// Integrated gyro rate, drifts without bound.
    pub yaw_deg: f64,
    pub timestamp: DateTime<Utc>,
}

impl OrientationEstimate {
    /// A level attitude stamped now, the value the shared state starts with.
    pub fn level() -> Self { Self { pitch_deg: 0.0, roll_deg: 0.0, yaw_deg: 0.0, timestamp: Utc::now() } }
}

/// Single-sample accelerometer tilt plus coarse gyro yaw.
pub struct OrientationEstimator {
    source: Arc<dyn TiltSource>,
    state: Arc<SharedFlightState>,
    safety: Arc<SafetyHandler>,
    c_tok: CancellationToken,
    period: Duration,
    read_timeout: Duration,
    max_consecutive_failures: u32,
}

/// `atan(num / sqrt(a² + b²))` in degrees, saturating to ±90° when the
/// denominator vanishes instead of dividing by zero.
fn tilt_angle(num: f64, a: f64, b: f64) -> f64 {
    let den = (a * a + b * b).sqrt();
    if den == 0.0 {
        return if num > 0.0 {
            90.0
        } else if num < 0.0 {
            -90.0
        } else {
            0.0
        };
    }
    (num / den).atan().to_degrees()
}

/// Wraps an angle into `(-180, 180]`.
pub fn wrap_degrees(angle: f64) -> f64 {
    let wrapped = (angle + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped == -180.0 { 180.0 } else { wrapped }
}

impl OrientationEstimator {
    /// Creates an estimator that publishes into the shared flight state.
    ///
    /// # Arguments
    /// - `source`: The accelerometer and gyroscope driver.
    /// - `state`: Shared flight state receiving every estimate.
    /// - `safety`: Fault sink, its root token is the parent of the estimator's own.
    /// - `period`: Loop period.
    /// - `read_timeout`: Upper bound on a single driver read.
    /// - `max_consecutive_failures`: Failed reads tolerated before the fault turns fatal.
    ///
    /// # Returns
    /// An estimator ready to be started with [`OrientationEstimator::run`].
    pub fn new(
        source: Arc<dyn TiltSource>,
        state: Arc<SharedFlightState>,
        safety: Arc<SafetyHandler>,
        period: Duration,
        read_timeout: Duration,
        max_consecutive_failures: u32,
    ) -> Self {
        let c_tok = safety.c_tok().child_token();
        Self { source, state, safety, c_tok, period, read_timeout, max_consecutive_failures }
    }

    /// Pitch and roll in degrees from one accelerometer vector.
    ///
    /// # Arguments
    /// - `accel`: Specific force in any consistent unit, only its direction matters.
    ///
    /// # Returns
    /// `(pitch, roll)`, both within `[-90, 90]`. A vanishing denominator saturates
    /// instead of dividing by zero.
    pub fn tilt_from_accel(accel: AccelSample) -> (f64, f64) {
        let pitch = tilt_angle(accel.x, accel.y, accel.z);
        let roll = tilt_angle(accel.y, accel.x, accel.z);
        (pitch, roll)
    }

    /// Latest published estimate.
    pub fn estimate(&self) -> OrientationEstimate { self.state.orientation() }

    /// Stops `run` at its next iteration boundary. Also triggered by an emergency stop.
    pub fn interrupt(&self) { self.c_tok.cancel(); }

    /// Whether `run` has been told to stop.
    pub fn is_interrupted(&self) -> bool { self.c_tok.is_cancelled() }

    /// Samples the tilt source every period and publishes a new estimate.
    ///
    /// A failed or implausible read keeps the last estimate and is reported as a
    /// non-fatal fault, `max_consecutive_failures` of them in a row as a fatal one.
    /// Returns once interrupted.
    pub async fn run(self: Arc<Self>) {
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut last_sample = Instant::now();
        let mut yaw = self.state.orientation().yaw_deg;
        let mut failures = 0u32;
        loop {
            tokio::select! {
                biased;
                () = self.c_tok.cancelled() => break,
                _ = ticker.tick() => {}
            }
            let started = Instant::now();
            match bounded_read(self.read_timeout, self.source.read_tilt()).await {
                Ok(sample) if sample.is_plausible() => {
                    failures = 0;
                    let now = Instant::now();
                    let dt = (now - last_sample).as_secs_f64();
                    last_sample = now;
                    let (pitch_deg, roll_deg) = Self::tilt_from_accel(sample.accel);
                    yaw = wrap_degrees(yaw + sample.gyro.z * dt);
                    self.state.publish_orientation(OrientationEstimate {
                        pitch_deg,
                        roll_deg,
                        yaw_deg: yaw,
                        timestamp: Utc::now(),
                    });
                }
                result => {
                    failures += 1;
                    let kind = match result {
                        Err(err) => FaultKind::from_sensor_error(SensorKind::Imu, &err),
                        Ok(_) => FaultKind::SensorInvalidReading(SensorKind::Imu),
                    };
                    let fatal = failures >= self.max_consecutive_failures;
                    if fatal {
                        warn!("IMU failed {failures} times in a row, escalating");
                    }
                    // the last-known-good estimate stays published
                    self.safety.report_fault(kind, fatal).await;
                }
            }
            if started.elapsed() > self.period {
                self.safety.report_fault(FaultKind::LoopOverrun(LoopKind::Orientation), false).await;
            }
        }
        event!("Orientation estimator stopped");
    }
}
