use super::orientation::OrientationEstimate;
use chrono::{DateTime, Utc};
use std::collections::VecDeque;

/// Baselines captured on the ground before arming.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ZeroReference {
    /// Tilt reported while the frame sits level, subtracted from every estimate.
    pub pitch_deg: f64,
    pub roll_deg: f64,
    /// Barometric altitude of the takeoff spot.
    pub ground_altitude_m: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CalibrationStatus {
    Pending,
    Converged(ZeroReference),
    Failed,
}

/// Collects fresh orientation estimates until a full window of them lies within
/// the tolerance band, or gives up after `max_cycles` feeds.
#[derive(Debug, Clone)]
pub struct Calibrator {
    window: VecDeque<(OrientationEstimate, Option<f64>)>,
    window_len: usize,
    tolerance_deg: f64,
    max_cycles: u32,
    cycles: u32,
    last_timestamp: Option<DateTime<Utc>>,
}

impl Calibrator {
    pub fn new(window_len: usize, tolerance_deg: f64, max_cycles: u32) -> Self {
        Self {
            window: VecDeque::with_capacity(window_len),
            window_len: window_len.max(1),
            tolerance_deg,
            max_cycles,
            cycles: 0,
            last_timestamp: None,
        }
    }

    pub fn reset(&mut self) {
        self.window.clear();
        self.cycles = 0;
        self.last_timestamp = None;
    }

    pub fn cycles(&self) -> u32 { self.cycles }

    /// Feeds one cycle. Stale estimates (same timestamp as the previous one) count
    /// towards the cycle budget but never towards convergence, a stalled estimator
    /// must not look perfectly steady.
    #[allow(clippy::cast_precision_loss)]
    pub fn feed(&mut self, estimate: OrientationEstimate, altitude_m: Option<f64>) -> CalibrationStatus {
        self.cycles += 1;
        let fresh = self.last_timestamp.is_none_or(|t| estimate.timestamp > t);
        if fresh {
            self.last_timestamp = Some(estimate.timestamp);
            if self.window.len() == self.window_len {
                self.window.pop_front();
            }
            self.window.push_back((estimate, altitude_m));
        }

        if self.window.len() == self.window_len && self.is_steady() {
            let n = self.window.len() as f64;
            let pitch_deg = self.window.iter().map(|(e, _)| e.pitch_deg).sum::<f64>() / n;
            let roll_deg = self.window.iter().map(|(e, _)| e.roll_deg).sum::<f64>() / n;
            let altitudes: Vec<f64> = self.window.iter().filter_map(|(_, a)| *a).collect();
            let ground_altitude_m = if altitudes.is_empty() {
                0.0
            } else {
                altitudes.iter().sum::<f64>() / altitudes.len() as f64
            };
            return CalibrationStatus::Converged(ZeroReference { pitch_deg, roll_deg, ground_altitude_m });
        }
        if self.cycles >= self.max_cycles {
            return CalibrationStatus::Failed;
        }
        CalibrationStatus::Pending
    }

    fn is_steady(&self) -> bool {
        let spread = |f: fn(&OrientationEstimate) -> f64| {
            let (min, max) = self
                .window
                .iter()
                .map(|(e, _)| f(e))
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
            max - min
        };
        spread(|e| e.pitch_deg) <= self.tolerance_deg && spread(|e| e.roll_deg) <= self.tolerance_deg
    }
}
