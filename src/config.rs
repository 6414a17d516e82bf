use crate::flight_control::{AutoFlightParams, Gains, PidLimits};
use crate::warn;
use std::{env, str::FromStr, time::Duration};

/// Every tunable of the flight core, defaults first, then `FC_*` environment overrides.
#[derive(Debug, Clone)]
pub struct FlightConfig {
    pub orientation_period: Duration,
    pub pid_period: Duration,
    pub autoflight_period: Duration,
    pub barometer_period: Duration,
    pub proximity_period: Duration,
    pub telemetry_period: Duration,
    pub imu_timeout: Duration,
    pub scalar_sensor_timeout: Duration,
    pub navigation_timeout: Duration,
    pub max_tilt_failures: u32,
    pub settling_delay: Duration,
    pub pending_fault_capacity: usize,
    /// Pitch, roll, yaw, altitude.
    pub gains: [Gains; 4],
    pub integral_limit: f64,
    pub output_limit: f64,
    pub hover_throttle: f64,
    pub proximity_ceiling_m: f64,
    pub calibration_window: usize,
    pub calibration_tolerance_deg: f64,
    pub calibration_max_cycles: u32,
    pub descent_rate_mps: f64,
    pub touchdown_distance_m: f64,
    pub altitude_ceiling_m: f64,
    pub min_clearance_m: f64,
    pub sea_level_hpa: f64,
    pub ground_link_addr: String,
}

impl Default for FlightConfig {
    fn default() -> Self {
        Self {
            orientation_period: Duration::from_millis(5),
            pid_period: Duration::from_millis(10),
            autoflight_period: Duration::from_millis(5),
            barometer_period: Duration::from_millis(50),
            proximity_period: Duration::from_millis(30),
            telemetry_period: Duration::from_millis(100),
            imu_timeout: Duration::from_millis(4),
            scalar_sensor_timeout: Duration::from_millis(25),
            navigation_timeout: Duration::from_millis(2),
            max_tilt_failures: 5,
            settling_delay: Duration::from_millis(250),
            pending_fault_capacity: 1024,
            gains: [
                Gains::new(0.012, 0.002, 0.004),
                Gains::new(0.012, 0.002, 0.004),
                Gains::new(0.008, 0.0005, 0.0),
                Gains::new(0.15, 0.02, 0.05),
            ],
            integral_limit: 50.0,
            output_limit: 0.4,
            hover_throttle: 0.45,
            proximity_ceiling_m: 4.0,
            calibration_window: 50,
            calibration_tolerance_deg: 1.0,
            calibration_max_cycles: 400,
            descent_rate_mps: 0.3,
            touchdown_distance_m: 0.08,
            altitude_ceiling_m: 50.0,
            min_clearance_m: 0.5,
            sea_level_hpa: 1013.25,
            ground_link_addr: "0.0.0.0:1337".to_string(),
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("Ignoring unparsable {key}={raw}, keeping the default");
            default
        }),
        Err(_) => default,
    }
}

fn env_ms(key: &str, default: Duration) -> Duration {
    Duration::from_millis(env_or(key, u64::try_from(default.as_millis()).unwrap_or(u64::MAX)))
}

impl FlightConfig {
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            orientation_period: env_ms("FC_ORIENTATION_PERIOD_MS", d.orientation_period),
            pid_period: env_ms("FC_PID_PERIOD_MS", d.pid_period),
            autoflight_period: env_ms("FC_AUTOFLIGHT_PERIOD_MS", d.autoflight_period),
            barometer_period: env_ms("FC_BAROMETER_PERIOD_MS", d.barometer_period),
            proximity_period: env_ms("FC_PROXIMITY_PERIOD_MS", d.proximity_period),
            telemetry_period: env_ms("FC_TELEMETRY_PERIOD_MS", d.telemetry_period),
            imu_timeout: env_ms("FC_IMU_TIMEOUT_MS", d.imu_timeout),
            scalar_sensor_timeout: env_ms("FC_SCALAR_TIMEOUT_MS", d.scalar_sensor_timeout),
            navigation_timeout: env_ms("FC_NAV_TIMEOUT_MS", d.navigation_timeout),
            max_tilt_failures: env_or("FC_MAX_TILT_FAILURES", d.max_tilt_failures),
            settling_delay: env_ms("FC_SETTLING_DELAY_MS", d.settling_delay),
            pending_fault_capacity: env_or("FC_PENDING_FAULTS", d.pending_fault_capacity),
            gains: d.gains,
            integral_limit: env_or("FC_INTEGRAL_LIMIT", d.integral_limit),
            output_limit: env_or("FC_OUTPUT_LIMIT", d.output_limit),
            hover_throttle: env_or("FC_HOVER_THROTTLE", d.hover_throttle),
            proximity_ceiling_m: env_or("FC_PROXIMITY_CEILING_M", d.proximity_ceiling_m),
            calibration_window: env_or("FC_CALIBRATION_WINDOW", d.calibration_window),
            calibration_tolerance_deg: env_or("FC_CALIBRATION_TOLERANCE_DEG", d.calibration_tolerance_deg),
            calibration_max_cycles: env_or("FC_CALIBRATION_MAX_CYCLES", d.calibration_max_cycles),
            descent_rate_mps: env_or("FC_DESCENT_RATE_MPS", d.descent_rate_mps),
            touchdown_distance_m: env_or("FC_TOUCHDOWN_M", d.touchdown_distance_m),
            altitude_ceiling_m: env_or("FC_ALTITUDE_CEILING_M", d.altitude_ceiling_m),
            min_clearance_m: env_or("FC_MIN_CLEARANCE_M", d.min_clearance_m),
            sea_level_hpa: env_or("FC_SEA_LEVEL_HPA", d.sea_level_hpa),
            ground_link_addr: env_or("FC_GROUND_ADDR", d.ground_link_addr),
        }
    }

    pub fn pid_limits(&self) -> PidLimits {
        PidLimits {
            integral_limit: self.integral_limit,
            output_limit: self.output_limit,
            hover_throttle: self.hover_throttle,
            proximity_ceiling_m: self.proximity_ceiling_m,
        }
    }

    pub fn autoflight_params(&self) -> AutoFlightParams {
        AutoFlightParams {
            navigation_timeout: self.navigation_timeout,
            calibration_window: self.calibration_window,
            calibration_tolerance_deg: self.calibration_tolerance_deg,
            calibration_max_cycles: self.calibration_max_cycles,
            descent_rate_mps: self.descent_rate_mps,
            touchdown_distance_m: self.touchdown_distance_m,
            altitude_ceiling_m: self.altitude_ceiling_m,
            min_clearance_m: self.min_clearance_m,
            proximity_ceiling_m: self.proximity_ceiling_m,
        }
    }
}
