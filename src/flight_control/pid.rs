use super::{
    calibration::ZeroReference, orientation::wrap_degrees, shared_state::SharedFlightState,
};
use crate::actuation::{AxisCorrections, MotorCommand, MotorOutput};
use crate::safety::{FaultKind, LoopKind, SafetyHandler};
use crate::{error, event, warn};
use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, FromRepr};
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;

/// Controlled axes, the discriminant is the slot in every per-axis array.
#[derive(Debug, Display, EnumIter, FromRepr, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum Axis {
    Pitch,
    Roll,
    Yaw,
    Altitude,
}

impl Axis {
    pub fn index(self) -> usize { self as usize }
}

/// Proportional, integral and derivative gain of one axis.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Gains {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
}

impl Gains {
    pub fn new(kp: f64, ki: f64, kd: f64) -> Self { Self { kp, ki, kd } }

    /// Finite and non-negative.
    pub fn is_valid(&self) -> bool {
        [self.kp, self.ki, self.kd].iter().all(|g| g.is_finite() && *g >= 0.0)
    }
}

impl fmt::Display for Gains {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Kp={:.4} Ki={:.4} Kd={:.4}", self.kp, self.ki, self.kd)
    }
}

/// Target value per axis: degrees for pitch, roll and yaw, meters above ground for altitude.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Setpoint {
    values: [f64; 4],
}

impl Setpoint {
    pub fn new(pitch: f64, roll: f64, yaw: f64, altitude: f64) -> Self {
        Self { values: [pitch, roll, yaw, altitude] }
    }

    pub fn get(&self, axis: Axis) -> f64 { self.values[axis.index()] }

    pub fn set(&mut self, axis: Axis, value: f64) { self.values[axis.index()] = value; }

    pub fn is_finite(&self) -> bool { self.values.iter().all(|v| v.is_finite()) }
}

/// Integrator state of one axis, owned by the pid loop.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AxisState {
    pub integral: f64,
    pub previous_error: f64,
    pub last_output: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PidLimits {
    /// Symmetric clamp on every integral term.
    pub integral_limit: f64,
    /// Symmetric clamp on every axis output before mixing.
    pub output_limit: f64,
    /// Duty that roughly holds the aircraft in the air, the altitude axis corrects around it.
    pub hover_throttle: f64,
    /// Above this distance the proximity sensor is ignored for altitude hold.
    pub proximity_ceiling_m: f64,
}

/// The part of the pid controller other loops may touch.
///
/// Setpoint, gains and zero reference live in `watch` cells: a write replaces or
/// modifies the value under the cell's lock and a read copies it out, so readers
/// never observe half a setpoint. The interrupt flag is a plain atomic so the
/// emergency path can set it without waiting on anything.
pub struct PidLink {
    setpoint: watch::Sender<Setpoint>,
    gains: watch::Sender<[Gains; 4]>,
    reference: watch::Sender<ZeroReference>,
    interrupted: AtomicBool,
    reset_requested: AtomicBool,
}

impl PidLink {
    fn new(gains: [Gains; 4]) -> Self {
        Self {
            setpoint: watch::Sender::new(Setpoint::default()),
            gains: watch::Sender::new(gains),
            reference: watch::Sender::new(ZeroReference::default()),
            // disarmed until autoflight arms it
            interrupted: AtomicBool::new(true),
            reset_requested: AtomicBool::new(true),
        }
    }

    /// Atomically replaces one axis of the setpoint.
    ///
    /// # Arguments
    /// - `axis`: The axis to change.
    /// - `value`: Degrees, or meters above ground for [`Axis::Altitude`]. Non-finite
    ///   values are logged and ignored.
    pub fn set_setpoint(&self, axis: Axis, value: f64) {
        if !value.is_finite() {
            warn!("Ignoring non-finite {axis} setpoint {value}");
            return;
        }
        self.setpoint.send_modify(|s| s.set(axis, value));
    }

    /// Replaces all four axes at once.
    pub fn set_setpoints(&self, setpoint: Setpoint) {
        if !setpoint.is_finite() {
            warn!("Ignoring non-finite setpoint {setpoint:?}");
            return;
        }
        self.setpoint.send_replace(setpoint);
    }

    /// Copy of the whole setpoint, never a mix of two writes.
    pub fn setpoint(&self) -> Setpoint { *self.setpoint.borrow() }

    /// Replaces the gains of one axis, effective from the next compute.
    pub fn set_gains(&self, axis: Axis, gains: Gains) { self.gains.send_modify(|g| g[axis.index()] = gains); }

    pub fn gains(&self, axis: Axis) -> Gains { self.gains.borrow()[axis.index()] }

    /// Level attitude and ground altitude found by calibration.
    pub fn set_zero_reference(&self, reference: ZeroReference) { self.reference.send_replace(reference); }

    pub fn zero_reference(&self) -> ZeroReference { *self.reference.borrow() }

    /// Idempotent. From now on every compute yields the all-zero command.
    pub fn interrupt(&self) { self.interrupted.store(true, Ordering::SeqCst); }

    /// Allows non-zero output again, starting from a cleared integrator.
    pub fn rearm(&self) {
        self.reset_requested.store(true, Ordering::SeqCst);
        self.interrupted.store(false, Ordering::SeqCst);
    }

    pub fn is_interrupted(&self) -> bool { self.interrupted.load(Ordering::SeqCst) }
}

/// Stabilization controller for pitch, roll, yaw and altitude.
pub struct PidController {
    link: Arc<PidLink>,
    state: Arc<SharedFlightState>,
    axes: [AxisState; 4],
    limits: PidLimits,
}

impl PidController {
    /// Creates a disarmed controller.
    ///
    /// # Arguments
    /// - `gains`: Initial gains, indexed by [`Axis::index`].
    /// - `limits`: Integral, output and throttle limits.
    /// - `state`: Shared flight state the measurements are read from.
    ///
    /// # Returns
    /// A controller whose every compute yields [`MotorCommand::DISARMED`] until
    /// [`PidLink::rearm`] is called.
    pub fn new(gains: [Gains; 4], limits: PidLimits, state: Arc<SharedFlightState>) -> Self {
        Self { link: Arc::new(PidLink::new(gains)), state, axes: [AxisState::default(); 4], limits }
    }

    /// Provides a cloned handle to the shared part of the controller.
    pub fn link(&self) -> Arc<PidLink> { Arc::clone(&self.link) }

    pub fn set_setpoint(&self, axis: Axis, value: f64) { self.link.set_setpoint(axis, value); }

    pub fn interrupt(&self) { self.link.interrupt(); }

    pub fn rearm(&self) { self.link.rearm(); }

    pub fn axis_state(&self, axis: Axis) -> AxisState { self.axes[axis.index()] }

    /// Current measurement per axis, `None` when there is nothing to hold against.
    fn measure(&self, reference: &ZeroReference) -> [Option<f64>; 4] {
        let orientation = self.state.orientation();
        let yaw = self.state.heading().map_or(orientation.yaw_deg, |h| h.heading_deg());
        [
            Some(orientation.pitch_deg - reference.pitch_deg),
            Some(orientation.roll_deg - reference.roll_deg),
            Some(yaw),
            self.state.height_above_ground(reference, self.limits.proximity_ceiling_m),
        ]
    }

    fn step_axis(&mut self, axis: Axis, error: f64, gains: Gains, dt: f64) -> f64 {
        let limits = self.limits;
        let axis_state = &mut self.axes[axis.index()];
        let derivative = if dt > 0.0 {
            axis_state.integral =
                (axis_state.integral + error * dt).clamp(-limits.integral_limit, limits.integral_limit);
            (error - axis_state.previous_error) / dt
        } else {
            0.0
        };
        let output = (gains.kp * error + gains.ki * axis_state.integral + gains.kd * derivative)
            .clamp(-limits.output_limit, limits.output_limit);
        axis_state.previous_error = error;
        axis_state.last_output = output;
        output
    }

    /// One control step over `dt` seconds.
    ///
    /// Returns [`MotorCommand::DISARMED`] whenever the controller is interrupted,
    /// including when the interrupt arrives while this call is running.
    pub fn compute(&mut self, dt: f64) -> MotorCommand {
        if self.link.is_interrupted() {
            return MotorCommand::DISARMED;
        }
        if self.link.reset_requested.swap(false, Ordering::SeqCst) {
            self.axes = [AxisState::default(); 4];
        }
        let dt = if dt.is_finite() { dt } else { 0.0 };
        let setpoint = self.link.setpoint();
        let gains = *self.link.gains.borrow();
        let reference = self.link.zero_reference();
        let measured = self.measure(&reference);

        let mut out = [0.0; 4];
        for axis in Axis::iter() {
            let Some(value) = measured[axis.index()] else {
                continue;
            };
            let mut error = setpoint.get(axis) - value;
            if axis == Axis::Yaw {
                error = wrap_degrees(error);
            }
            out[axis.index()] = self.step_axis(axis, error, gains[axis.index()], dt);
        }

        let command = MotorCommand::mix(AxisCorrections {
            pitch: out[Axis::Pitch.index()],
            roll: out[Axis::Roll.index()],
            yaw: out[Axis::Yaw.index()],
            throttle: self.limits.hover_throttle + out[Axis::Altitude.index()],
        });
        if self.link.is_interrupted() {
            return MotorCommand::DISARMED;
        }
        command
    }

    /// Computes and writes a motor command every `period` until `c_tok` is cancelled.
    ///
    /// Interrupted cycles write zero. A failed motor write is an actuator fault and
    /// hands over to the emergency stop, which owns the zeroing from then on.
    pub async fn run(
        mut self,
        motors: Arc<dyn MotorOutput>,
        safety: Arc<SafetyHandler>,
        period: Duration,
        c_tok: CancellationToken,
    ) {
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

            let command = self.compute(dt);
            let written = if command.is_disarmed() || self.link.is_interrupted() {
                motors.zero();
                MotorCommand::DISARMED
            } else {
                match motors.apply(&command) {
                    Ok(()) => command,
                    Err(e) => {
                        error!("Motor write failed: {e}");
                        self.state.publish_motor_command(MotorCommand::DISARMED);
                        safety.report_fault(FaultKind::ActuatorFault, true).await;
                        continue;
                    }
                }
            };
            self.state.publish_motor_command(written);

            let elapsed = started.elapsed();
            if elapsed > period {
                event!("PID cycle took {elapsed:?}");
                safety.report_fault(FaultKind::LoopOverrun(LoopKind::Pid), false).await;
            }
        }
        event!("PID loop stopped");
    }
}
