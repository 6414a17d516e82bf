#![allow(dead_code, clippy::similar_names)]
#![warn(clippy::shadow_reuse, clippy::shadow_same, clippy::builtin_type_shadow)]
mod actuation;
mod config;
mod flight_control;
mod ground_link;
mod keychain;
mod logger;
mod safety;
mod sensors;

use crate::actuation::{LoggingMotorOutput, MotorOutput};
use crate::config::FlightConfig;
use crate::flight_control::{AutoFlight, OrientationEstimator, run_log_sink};
use crate::ground_link::GroundMessenger;
use crate::keychain::FlightKeychain;
use crate::safety::{FaultKind, LoopKind};
use crate::sensors::sim::{SimBarometer, SimCompass, SimGps, SimImu, SimProximity};
use crate::sensors::{
    AltitudeSource, HeadingSource, PositionSource, ProximitySource, SensorKind, SensorPoller,
    TiltSource,
};
use futures::future::join_all;
use std::{env, sync::Arc, time::Duration};
use tokio::task::JoinHandle;

#[cfg(all(feature = "profiling", not(target_env = "msvc")))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

const SENSOR_CHECK_ARG: &str = "sensor-check";
const SENSOR_CHECK_READINGS: usize = 100;
const SENSOR_CHECK_INTERVAL: Duration = Duration::from_millis(50);
const LOG_SINK_EVERY: usize = 10;

/// Bench drivers standing in for the flight hardware.
struct Drivers {
    imu: Arc<dyn TiltSource>,
    barometer: Arc<dyn AltitudeSource>,
    proximity: Arc<dyn ProximitySource>,
    compass: Arc<dyn HeadingSource>,
    gps: Arc<dyn PositionSource>,
}

impl Drivers {
    fn simulated(config: &FlightConfig) -> Self {
        Self {
            imu: Arc::new(SimImu::new(0.002, 0.05)),
            barometer: Arc::new(SimBarometer::new(1009.5, 18.0, config.sea_level_hpa)),
            proximity: Arc::new(SimProximity::new(0.05)),
            compass: Arc::new(SimCompass::new(20.0, 0.0)),
            gps: Arc::new(SimGps::new(52.52, 13.405, 34.0)),
        }
    }
}

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    let config = FlightConfig::from_env();
    let drivers = Drivers::simulated(&config);
    let motors = Arc::new(LoggingMotorOutput::new());
    let (keychain, controller, command_rx) = FlightKeychain::new(config, Arc::clone(&motors) as Arc<dyn MotorOutput>);

    let mut handles = spawn_sensing(&keychain, &drivers);

    if env::args().nth(1).as_deref() == Some(SENSOR_CHECK_ARG) {
        sensor_check(&keychain, &motors).await;
        keychain.safety().c_tok().cancel();
        join_all(handles).await;
        return;
    }

    let cfg = keychain.config();
    let safety = keychain.safety();
    let c_tok = safety.c_tok();

    let pid_safety = Arc::clone(&safety);
    let pid_motors = keychain.motors();
    let pid_tok = c_tok.clone();
    let pid_period = cfg.pid_period;
    handles.push(tokio::spawn(async move {
        controller.run(pid_motors, pid_safety, pid_period, pid_tok).await;
    }));

    let auto_flight = AutoFlight::new(
        keychain.state(),
        keychain.pid(),
        Arc::clone(&safety),
        Arc::clone(&drivers.compass),
        Arc::clone(&drivers.gps),
        command_rx,
        cfg.autoflight_params(),
    );
    handles.push(tokio::spawn(auto_flight.run(cfg.autoflight_period)));

    let telemetry = keychain.telemetry();
    let log_rx = telemetry.subscribe();
    let ground = GroundMessenger::start(
        cfg.ground_link_addr.clone(),
        keychain.commands(),
        telemetry.subscribe(),
        safety.subscribe_faults(),
    );
    handles.push(tokio::spawn(Arc::clone(&telemetry).run(cfg.telemetry_period, c_tok.clone())));
    handles.push(tokio::spawn(run_log_sink(log_rx, LOG_SINK_EVERY)));

    let signal_safety = Arc::clone(&safety);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                warn!("Operator interrupt received");
                signal_safety.report_fault(FaultKind::OperatorInterrupt, true).await;
            }
            Err(e) => error!("Unable to listen for the operator interrupt: {e}"),
        }
    });

    info!("Flight core running, ground link attached: {}", ground.is_connected());
    join_all(handles).await;
    drop(ground);
}

/// Starts the orientation estimator and the barometer and proximity pollers.
fn spawn_sensing(keychain: &FlightKeychain, drivers: &Drivers) -> Vec<JoinHandle<()>> {
    let cfg = keychain.config();
    let safety = keychain.safety();
    let mut handles = Vec::new();

    let estimator = Arc::new(OrientationEstimator::new(
        Arc::clone(&drivers.imu),
        keychain.state(),
        Arc::clone(&safety),
        cfg.orientation_period,
        cfg.imu_timeout,
        cfg.max_tilt_failures,
    ));
    handles.push(tokio::spawn(estimator.run()));

    let baro = Arc::clone(&drivers.barometer);
    let baro_state = keychain.state();
    let baro_poller = SensorPoller::new(
        SensorKind::Barometer,
        LoopKind::Barometer,
        cfg.barometer_period,
        cfg.scalar_sensor_timeout,
    );
    handles.push(tokio::spawn(baro_poller.run(
        move || {
            let baro_clone = Arc::clone(&baro);
            async move { baro_clone.read_altitude().await }
        },
        move |reading| baro_state.publish_altitude(reading),
        Arc::clone(&safety),
        safety.c_tok(),
    )));

    let prox = Arc::clone(&drivers.proximity);
    let prox_state = keychain.state();
    let prox_poller = SensorPoller::new(
        SensorKind::Proximity,
        LoopKind::Proximity,
        cfg.proximity_period,
        cfg.scalar_sensor_timeout,
    );
    handles.push(tokio::spawn(prox_poller.run(
        move || {
            let prox_clone = Arc::clone(&prox);
            async move { prox_clone.read_proximity().await }
        },
        move |reading| prox_state.publish_proximity(reading),
        Arc::clone(&safety),
        safety.c_tok(),
    )));

    handles
}

/// Prints a fixed number of readings from the sensing loops, motors stay untouched.
async fn sensor_check(keychain: &FlightKeychain, motors: &LoggingMotorOutput) {
    let state = keychain.state();
    info!("Sensor check, printing {SENSOR_CHECK_READINGS} readings");
    for i in 0..SENSOR_CHECK_READINGS {
        tokio::time::sleep(SENSOR_CHECK_INTERVAL).await;
        let o = state.orientation();
        log!(
            "#{i:03} pitch {:6.2} roll {:6.2} yaw {:7.2} | baro {} | prox {}",
            o.pitch_deg,
            o.roll_deg,
            o.yaw_deg,
            state.altitude().map_or("-".to_string(), |a| format!(
                "{:.2} hPa {:.1} C {:.2} m",
                a.pressure_hpa(),
                a.temperature_c(),
                a.altitude_m()
            )),
            state.proximity().map_or("-".to_string(), |p| format!("{:.3} m", p.distance_m())),
        );
    }
    let pending = keychain.safety().pending().drain().await;
    info!("Sensor check done, {} faults recorded, motors at {:?}", pending.len(), motors.last().duties());
    for record in pending {
        fault!("{record}");
    }
}
