use super::{
    ALLOWED_TRANSITIONS, AutoFlight, AutoFlightParams, Axis, CalibrationStatus, Calibrator, CommandError,
    FlightCommand, FlightPhase, Gains, MissionLeg, MissionPlan, MissionProgress, OrientationEstimate,
    OrientationEstimator, PidController, PidLimits, PidLink, Setpoint, SharedFlightState, TelemetryPublisher,
    ZeroReference, wrap_degrees,
};
use crate::actuation::{LoggingMotorOutput, MotorCommand};
use crate::safety::{FaultKind, SafetyHandler};
use crate::sensors::{
    AccelSample, AltitudeReading, GyroSample, HeadingReading, HeadingSource, PositionFix, PositionSource,
    ProximityReading, SensorError, SensorKind, TiltSample, TiltSource,
};
use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use rand::{Rng, rng};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use strum::IntoEnumIterator;
use tokio::sync::mpsc;

const DT: f64 = 0.1;

struct FixedTilt(TiltSample);

#[async_trait]
impl TiltSource for FixedTilt {
    async fn read_tilt(&self) -> Result<TiltSample, SensorError> { Ok(self.0) }
}

struct DeadImu;

#[async_trait]
impl TiltSource for DeadImu {
    async fn read_tilt(&self) -> Result<TiltSample, SensorError> { Err(SensorError::Timeout) }
}

struct FixedCompass(f64);

#[async_trait]
impl HeadingSource for FixedCompass {
    async fn read_heading(&self) -> Result<HeadingReading, SensorError> { Ok(HeadingReading::new(self.0)) }
}

struct FixedGps;

#[async_trait]
impl PositionSource for FixedGps {
    async fn read_position(&self) -> Result<PositionFix, SensorError> { Ok(PositionFix::new(48.1, 11.6, 520.0, 8)) }
}

fn limits() -> PidLimits {
    PidLimits { integral_limit: 2.0, output_limit: 0.4, hover_throttle: 0.5, proximity_ceiling_m: 4.0 }
}

fn params() -> AutoFlightParams {
    AutoFlightParams {
        navigation_timeout: Duration::from_millis(50),
        calibration_window: 5,
        calibration_tolerance_deg: 0.5,
        calibration_max_cycles: 20,
        descent_rate_mps: 0.3,
        touchdown_distance_m: 0.08,
        altitude_ceiling_m: 10.0,
        min_clearance_m: 0.5,
        proximity_ceiling_m: 4.0,
    }
}

struct Rig {
    state: Arc<SharedFlightState>,
    pid: Arc<PidLink>,
    safety: Arc<SafetyHandler>,
    exits: Arc<Mutex<Vec<i32>>>,
    controller: PidController,
}

fn rig(gains: [Gains; 4]) -> Rig {
    let state = Arc::new(SharedFlightState::new());
    let controller = PidController::new(gains, limits(), Arc::clone(&state));
    let pid = controller.link();
    let exits = Arc::new(Mutex::new(Vec::new()));
    let exits_local = Arc::clone(&exits);
    let safety = Arc::new(
        SafetyHandler::new(Arc::clone(&pid), Arc::new(LoggingMotorOutput::new()), Duration::from_millis(1), 64)
            .with_exit_hook(Arc::new(move |code| exits_local.lock().unwrap().push(code))),
    );
    Rig { state, pid, safety, exits, controller }
}

fn auto_flight(r: &Rig) -> (AutoFlight, mpsc::Sender<FlightCommand>) {
    let (tx, rx) = mpsc::channel(8);
    let af = AutoFlight::new(
        Arc::clone(&r.state),
        Arc::clone(&r.pid),
        Arc::clone(&r.safety),
        Arc::new(FixedCompass(90.0)),
        Arc::new(FixedGps),
        rx,
        params(),
    );
    (af, tx)
}

fn estimate_at(base: DateTime<Utc>, i: i64, pitch_deg: f64, roll_deg: f64) -> OrientationEstimate {
    OrientationEstimate { pitch_deg, roll_deg, yaw_deg: 0.0, timestamp: base + TimeDelta::milliseconds(i) }
}

/// Drives AutoFlight with a steady, slightly tilted frame until it reaches `Stabilizing`.
async fn fly_to_stabilizing(r: &Rig, af: &mut AutoFlight, tx: &mpsc::Sender<FlightCommand>) {
    r.state.publish_proximity(ProximityReading::new(0.05));
    tx.send(FlightCommand::Arm).await.unwrap();
    let base = Utc::now();
    for i in 0..30 {
        r.state.publish_orientation(estimate_at(base, i, 1.5, -0.5));
        af.step(DT).await;
        if af.phase() == FlightPhase::Stabilizing {
            return;
        }
    }
    panic!("never reached Stabilizing, stuck in {}", af.phase());
}

#[test]
fn test_tilt_from_level_and_vertical_vectors() {
    let (pitch, roll) = OrientationEstimator::tilt_from_accel(AccelSample::new(0.0, 0.0, 1.0));
    assert!(pitch.abs() < 1e-12 && roll.abs() < 1e-12);

    let (pitch, roll) = OrientationEstimator::tilt_from_accel(AccelSample::new(1.0, 0.0, 0.0));
    assert!((pitch - 90.0).abs() < 1e-12);
    assert!(roll.abs() < 1e-12);

    let (pitch, roll) = OrientationEstimator::tilt_from_accel(AccelSample::new(0.0, -1.0, 0.0));
    assert!(pitch.abs() < 1e-12);
    assert!((roll + 90.0).abs() < 1e-12);

    let (_, roll) = OrientationEstimator::tilt_from_accel(AccelSample::new(0.0, 0.5, 0.75_f64.sqrt()));
    assert!((roll - 30.0).abs() < 1e-9);
}

#[test]
fn test_tilt_stays_in_range() {
    let mut r = rng();
    for _ in 0..10_000 {
        let accel = AccelSample::new(r.random_range(-4.0..4.0), r.random_range(-4.0..4.0), r.random_range(-4.0..4.0));
        let (pitch, roll) = OrientationEstimator::tilt_from_accel(accel);
        assert!(pitch.is_finite() && (-90.0..=90.0).contains(&pitch), "{accel:?} -> {pitch}");
        assert!(roll.is_finite() && (-90.0..=90.0).contains(&roll), "{accel:?} -> {roll}");
    }
}

#[test]
fn test_wrap_degrees() {
    assert!((wrap_degrees(190.0) + 170.0).abs() < 1e-9);
    assert!((wrap_degrees(-190.0) - 170.0).abs() < 1e-9);
    assert!((wrap_degrees(-180.0) - 180.0).abs() < 1e-9);
    assert!((wrap_degrees(540.0) - 180.0).abs() < 1e-9);
    assert!((wrap_degrees(45.0) - 45.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_estimator_publishes_and_stops() {
    let r = rig([Gains::default(); 4]);
    let sample = TiltSample {
        accel: AccelSample::new(0.0, 0.5, 0.75_f64.sqrt()),
        gyro: GyroSample::new(0.0, 0.0, 20.0),
    };
    let estimator = Arc::new(OrientationEstimator::new(
        Arc::new(FixedTilt(sample)),
        Arc::clone(&r.state),
        Arc::clone(&r.safety),
        Duration::from_millis(2),
        Duration::from_millis(20),
        3,
    ));
    let handle = tokio::spawn(Arc::clone(&estimator).run());
    tokio::time::sleep(Duration::from_millis(60)).await;
    estimator.interrupt();
    handle.await.unwrap();

    let estimate = estimator.estimate();
    assert!(estimate.pitch_deg.abs() < 1e-9);
    assert!((estimate.roll_deg - 30.0).abs() < 1e-9);
    assert!(estimate.yaw_deg > 0.0);
    assert!(estimator.is_interrupted());
    assert!(!r.safety.c_tok().is_cancelled());
}

#[tokio::test]
async fn test_estimator_escalates_repeated_failures() {
    let r = rig([Gains::default(); 4]);
    let estimator = Arc::new(OrientationEstimator::new(
        Arc::new(DeadImu),
        Arc::clone(&r.state),
        Arc::clone(&r.safety),
        Duration::from_millis(2),
        Duration::from_millis(20),
        3,
    ));
    tokio::time::timeout(Duration::from_secs(2), Arc::clone(&estimator).run()).await.unwrap();

    assert_eq!(*r.exits.lock().unwrap(), vec![1]);
    assert!(r.pid.is_interrupted());
    let pending = r.safety.pending().drain().await;
    assert!(pending.len() >= 3);
    assert!(!pending[0].is_fatal());
    assert!(pending.iter().any(|f| f.is_fatal() && f.kind() == FaultKind::SensorTimeout(SensorKind::Imu)));
}

#[test]
fn test_anti_windup_clamps_integral() {
    let mut gains = [Gains::default(); 4];
    gains[Axis::Pitch.index()] = Gains::new(0.0, 1.0, 0.0);
    let mut r = rig(gains);
    r.pid.set_setpoint(Axis::Pitch, 10.0);
    r.pid.rearm();
    for _ in 0..100 {
        r.controller.compute(DT);
    }
    let pitch = r.controller.axis_state(Axis::Pitch);
    assert!((pitch.integral - limits().integral_limit).abs() < 1e-12);
    assert!((pitch.last_output - limits().output_limit).abs() < 1e-12);
    assert!(r.controller.axis_state(Axis::Roll).integral.abs() < 1e-12);
}

#[test]
fn test_zero_error_holds_hover() {
    let mut r = rig([Gains::new(0.02, 0.5, 0.01); 4]);
    r.pid.rearm();
    let mut command = MotorCommand::DISARMED;
    for _ in 0..50 {
        command = r.controller.compute(DT);
    }
    for axis in Axis::iter() {
        assert!(r.controller.axis_state(axis).integral.abs() < 1e-12, "{axis}");
    }
    for duty in command.duties() {
        assert!((duty - limits().hover_throttle).abs() < 1e-12);
    }
}

#[test]
fn test_interrupt_and_rearm() {
    let mut gains = [Gains::default(); 4];
    gains[Axis::Pitch.index()] = Gains::new(0.01, 1.0, 0.0);
    let mut r = rig(gains);

    // starts interrupted
    assert_eq!(r.controller.compute(DT), MotorCommand::DISARMED);

    r.pid.set_setpoint(Axis::Pitch, 10.0);
    r.controller.rearm();
    for _ in 0..5 {
        assert!(!r.controller.compute(DT).is_disarmed());
    }
    r.controller.interrupt();
    r.controller.interrupt();
    for _ in 0..5 {
        assert_eq!(r.controller.compute(DT), MotorCommand::DISARMED);
    }

    r.controller.rearm();
    r.controller.compute(DT);
    assert!((r.controller.axis_state(Axis::Pitch).integral - 10.0 * DT).abs() < 1e-12);
}

#[test]
fn test_non_finite_setpoint_ignored() {
    let r = rig([Gains::default(); 4]);
    r.controller.set_setpoint(Axis::Yaw, 45.0);
    r.pid.set_setpoint(Axis::Yaw, f64::NAN);
    r.pid.set_setpoints(Setpoint::new(1.0, f64::INFINITY, 0.0, 0.0));
    assert_eq!(r.pid.setpoint(), Setpoint::new(0.0, 0.0, 45.0, 0.0));
}

#[test]
fn test_setpoint_reads_never_torn() {
    let r = rig([Gains::default(); 4]);
    let pid = &r.pid;
    std::thread::scope(|s| {
        s.spawn(|| {
            for i in 0..20_000 {
                let v = f64::from(i);
                pid.set_setpoints(Setpoint::new(v, v, v, v));
            }
        });
        s.spawn(|| {
            for _ in 0..20_000 {
                let sp = pid.setpoint();
                let first = sp.get(Axis::Pitch);
                for axis in Axis::iter() {
                    assert_eq!(sp.get(axis).to_bits(), first.to_bits());
                }
            }
        });
    });
}

#[test]
fn test_height_above_ground() {
    let state = SharedFlightState::new();
    let reference = ZeroReference { pitch_deg: 0.0, roll_deg: 0.0, ground_altitude_m: 100.0 };
    assert_eq!(state.height_above_ground(&reference, 4.0), None);

    let baro = AltitudeReading::from_pressure(15.0, 1000.0, AltitudeReading::SEA_LEVEL_HPA);
    state.publish_altitude(baro);
    let expected = baro.altitude_m() - 100.0;
    assert_eq!(state.height_above_ground(&reference, 4.0), Some(expected));

    state.publish_proximity(ProximityReading::new(1.5));
    assert_eq!(state.height_above_ground(&reference, 4.0), Some(1.5));

    state.publish_proximity(ProximityReading::new(6.0));
    assert_eq!(state.height_above_ground(&reference, 4.0), Some(expected));
}

#[test]
fn test_transition_table() {
    use FlightPhase::{Armed, Autonomous, Calibrating, EmergencyStopped, Idle, Landing, Stabilizing};
    assert!(!Idle.can_transition_to(Stabilizing));
    assert!(!Idle.can_transition_to(Armed));
    assert!(!Armed.can_transition_to(Autonomous));
    assert!(!Calibrating.can_transition_to(Stabilizing));
    assert!(!Landing.can_transition_to(Autonomous));
    assert!(Idle.can_transition_to(Calibrating));
    assert!(Calibrating.can_transition_to(Armed));
    assert!(Armed.can_transition_to(Stabilizing));
    assert!(Stabilizing.can_transition_to(Autonomous));
    assert!(Autonomous.can_transition_to(Landing));
    assert!(Landing.can_transition_to(Idle));

    for phase in FlightPhase::iter() {
        assert_eq!(phase.can_transition_to(EmergencyStopped), phase != EmergencyStopped, "{phase}");
        assert!(!phase.can_transition_to(phase), "{phase}");
    }
    let out_of_emergency: Vec<_> =
        ALLOWED_TRANSITIONS.iter().filter(|(from, _)| *from == EmergencyStopped).map(|(_, to)| *to).collect();
    assert_eq!(out_of_emergency, vec![Idle]);
    assert_eq!(FlightPhase::from("Autonomous"), Autonomous);
    assert_eq!(FlightPhase::from("bogus"), EmergencyStopped);
    assert_eq!(<&'static str>::from(Landing), "landing");
}

#[test]
fn test_calibrator_window() {
    let base = Utc::now();
    let mut calibrator = Calibrator::new(4, 0.5, 100);
    let mut status = CalibrationStatus::Pending;
    for (i, pitch) in [2.0, 2.1, 2.2, 2.3].into_iter().enumerate() {
        status = calibrator.feed(estimate_at(base, i64::try_from(i).unwrap(), pitch, -1.0), Some(30.0));
    }
    let CalibrationStatus::Converged(reference) = status else {
        panic!("expected convergence, got {status:?}");
    };
    assert!((reference.pitch_deg - 2.15).abs() < 1e-9);
    assert!((reference.roll_deg + 1.0).abs() < 1e-9);
    assert!((reference.ground_altitude_m - 30.0).abs() < 1e-9);

    // a stalled estimator repeats its timestamp and never converges
    let mut calibrator = Calibrator::new(4, 0.5, 10);
    let stale = estimate_at(base, 0, 0.0, 0.0);
    let mut last = CalibrationStatus::Pending;
    for _ in 0..10 {
        last = calibrator.feed(stale, None);
        if last != CalibrationStatus::Pending {
            break;
        }
    }
    assert_eq!(last, CalibrationStatus::Failed);
    assert_eq!(calibrator.cycles(), 10);

    calibrator.reset();
    assert_eq!(calibrator.cycles(), 0);
}

#[test]
fn test_mission_progress() {
    let legs = vec![
        MissionLeg { altitude_m: 2.0, heading_deg: 45.0, hold: Duration::from_millis(200) },
        MissionLeg { altitude_m: 3.0, heading_deg: 90.0, hold: Duration::from_millis(100) },
    ];
    let plan = MissionPlan::new(legs.clone());
    assert!(plan.is_valid(10.0));
    assert!(!plan.is_valid(2.5));
    assert!(!MissionPlan::default().is_valid(10.0));

    let mut progress = MissionProgress::new(plan);
    let step = Duration::from_millis(100);
    assert_eq!(progress.advance(step), Some(legs[0]));
    assert_eq!(progress.advance(step), Some(legs[1]));
    assert_eq!(progress.leg_index(), 1);
    assert_eq!(progress.advance(step), None);
    assert_eq!(progress.advance(step), None);
}

#[tokio::test]
async fn test_calibration_failure_returns_to_idle() {
    let r = rig([Gains::default(); 4]);
    let (mut af, tx) = auto_flight(&r);
    tx.send(FlightCommand::Arm).await.unwrap();

    let base = Utc::now();
    for i in 0..25 {
        let jitter = if i % 2 == 0 { 2.0 } else { -2.0 };
        r.state.publish_orientation(estimate_at(base, i, jitter, 0.0));
        af.step(DT).await;
    }

    assert_eq!(af.phase(), FlightPhase::Idle);
    assert_eq!(r.state.phase(), FlightPhase::Idle);
    assert!(r.pid.is_interrupted());
    assert!(!r.safety.is_stopping());
    let pending = r.safety.pending().drain().await;
    let calibration: Vec<_> = pending.iter().filter(|f| f.kind() == FaultKind::CalibrationFailure).collect();
    assert_eq!(calibration.len(), 1);
    assert!(!calibration[0].is_fatal());
}

#[tokio::test]
async fn test_arm_calibrate_stabilize_and_land() {
    let r = rig([Gains::default(); 4]);
    let (mut af, tx) = auto_flight(&r);
    assert!(r.pid.is_interrupted());

    fly_to_stabilizing(&r, &mut af, &tx).await;
    assert!(!r.pid.is_interrupted());
    let reference = r.pid.zero_reference();
    assert!((reference.pitch_deg - 1.5).abs() < 1e-9);
    assert!((reference.roll_deg + 0.5).abs() < 1e-9);
    let setpoint = r.pid.setpoint();
    assert!((setpoint.get(Axis::Yaw) - 90.0).abs() < 1e-9);
    assert!((setpoint.get(Axis::Altitude) - 0.05).abs() < 1e-9);
    assert!(r.state.heading().is_some() && r.state.position().is_some());

    tx.send(FlightCommand::Disarm).await.unwrap();
    af.step(DT).await;
    assert_eq!(af.phase(), FlightPhase::Landing);
    assert!((r.pid.setpoint().get(Axis::Altitude) - 0.02).abs() < 1e-9);
    af.step(DT).await;
    assert_eq!(af.phase(), FlightPhase::Idle);
    assert!(r.pid.is_interrupted());
}

#[tokio::test]
async fn test_ceiling_forces_landing() {
    let r = rig([Gains::default(); 4]);
    let (mut af, tx) = auto_flight(&r);
    fly_to_stabilizing(&r, &mut af, &tx).await;

    r.state.publish_proximity(ProximityReading::new(8.0));
    r.state.publish_altitude(AltitudeReading::from_pressure(15.0, 1000.0, AltitudeReading::SEA_LEVEL_HPA));
    af.step(DT).await;
    assert_eq!(af.phase(), FlightPhase::Landing);
}

#[tokio::test]
async fn test_rejected_commands() {
    let r = rig([Gains::default(); 4]);
    let (mut af, tx) = auto_flight(&r);

    let bad_gains = FlightCommand::SetGains(Axis::Pitch, Gains::new(-1.0, 0.0, 0.0));
    assert_eq!(af.handle_command(bad_gains).await, Err(CommandError::InvalidGains(Gains::new(-1.0, 0.0, 0.0))));
    let nan_gains = FlightCommand::SetGains(Axis::Roll, Gains::new(f64::NAN, 0.0, 0.0));
    assert!(matches!(af.handle_command(nan_gains).await, Err(CommandError::InvalidGains(_))));
    assert_eq!(r.pid.gains(Axis::Pitch), Gains::default());

    let empty = FlightCommand::StartMission(MissionPlan::default());
    assert_eq!(af.handle_command(empty).await, Err(CommandError::InvalidMission));
    let too_high = FlightCommand::StartMission(MissionPlan::new(vec![MissionLeg {
        altitude_m: 25.0,
        heading_deg: 0.0,
        hold: Duration::from_secs(1),
    }]));
    assert_eq!(af.handle_command(too_high).await, Err(CommandError::InvalidMission));

    assert_eq!(af.handle_command(FlightCommand::Disarm).await, Ok(()));
    assert_eq!(af.phase(), FlightPhase::Idle);

    fly_to_stabilizing(&r, &mut af, &tx).await;
    assert_eq!(
        af.handle_command(FlightCommand::Arm).await,
        Err(CommandError::NotAllowedIn(FlightPhase::Stabilizing))
    );

    let good = Gains::new(0.02, 0.001, 0.003);
    assert_eq!(af.handle_command(FlightCommand::SetGains(Axis::Yaw, good)).await, Ok(()));
    assert_eq!(r.pid.gains(Axis::Yaw), good);
    assert!(r.exits.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_mission_flight() {
    let r = rig([Gains::default(); 4]);
    let (mut af, tx) = auto_flight(&r);
    fly_to_stabilizing(&r, &mut af, &tx).await;

    let plan = MissionPlan::new(vec![
        MissionLeg { altitude_m: 2.0, heading_deg: 45.0, hold: Duration::from_millis(200) },
        MissionLeg { altitude_m: 3.0, heading_deg: 120.0, hold: Duration::from_millis(200) },
    ]);
    tx.send(FlightCommand::StartMission(plan)).await.unwrap();
    af.step(DT).await;
    assert_eq!(af.phase(), FlightPhase::Autonomous);

    af.step(DT).await;
    assert_eq!(r.pid.setpoint().get(Axis::Altitude), 2.0);
    assert_eq!(r.pid.setpoint().get(Axis::Yaw), 45.0);
    af.step(DT).await;
    assert_eq!(r.pid.setpoint().get(Axis::Altitude), 3.0);
    assert_eq!(r.pid.setpoint().get(Axis::Yaw), 120.0);
    assert_eq!(af.mission().map(MissionProgress::leg_index), Some(1));
    af.step(DT).await;
    assert_eq!(af.phase(), FlightPhase::Autonomous);
    af.step(DT).await;
    assert_eq!(af.phase(), FlightPhase::Stabilizing);
    assert!(af.mission().is_none());
    assert!(!r.pid.is_interrupted());
}

#[tokio::test]
async fn test_abort_runs_emergency_stop() {
    let r = rig([Gains::default(); 4]);
    let (mut af, tx) = auto_flight(&r);
    fly_to_stabilizing(&r, &mut af, &tx).await;

    tx.send(FlightCommand::Abort).await.unwrap();
    af.step(DT).await;
    assert_eq!(af.phase(), FlightPhase::EmergencyStopped);
    assert!(r.pid.is_interrupted());
    assert!(r.safety.c_tok().is_cancelled());
    assert_eq!(*r.exits.lock().unwrap(), vec![0]);

    // a stopping core refuses to leave the emergency phase on its own
    tx.send(FlightCommand::Arm).await.unwrap();
    af.step(DT).await;
    assert_eq!(r.state.phase(), FlightPhase::EmergencyStopped);

    // only a direct reset leaves it, going through Idle into calibration
    af.handle_command(FlightCommand::Arm).await.unwrap();
    assert_eq!(af.phase(), FlightPhase::Calibrating);
    assert!(r.pid.is_interrupted());
}

#[tokio::test]
async fn test_autoflight_loop_ends_in_emergency_stop() {
    let r = rig([Gains::default(); 4]);
    let (af, _tx) = auto_flight(&r);
    let handle = tokio::spawn(af.run(Duration::from_millis(5)));
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(r.state.phase(), FlightPhase::Idle);

    r.safety.report_fault(FaultKind::SensorTimeout(SensorKind::Imu), true).await;
    handle.await.unwrap();
    assert_eq!(r.state.phase(), FlightPhase::EmergencyStopped);
}

#[tokio::test]
async fn test_telemetry_snapshot_drains_faults() {
    let r = rig([Gains::default(); 4]);
    let telemetry = TelemetryPublisher::new(Arc::clone(&r.state), Arc::clone(&r.safety));
    r.state.publish_proximity(ProximityReading::new(0.3));
    r.safety.report_fault(FaultKind::CalibrationFailure, false).await;

    let first = telemetry.snapshot().await;
    assert_eq!(first.pending_faults.len(), 1);
    assert_eq!(first.proximity.map(|p| p.distance_m()), Some(0.3));
    assert_eq!(first.phase, FlightPhase::Idle);
    assert!(first.motor_command.is_disarmed());

    let second = telemetry.snapshot().await;
    assert!(second.pending_faults.is_empty());
    assert_eq!(second.dropped_faults, 0);
}
