//! Bench drivers. They implement every capability with a resting aircraft plus
//! uniform noise, so the whole control core can run without hardware attached.

use super::capability::{
    AltitudeSource, HeadingSource, PositionSource, ProximitySource, SensorError, TiltSource,
};
use super::readings::{
    AccelSample, AltitudeReading, GyroSample, HeadingReading, PositionFix, ProximityReading,
    TiltSample,
};
use async_trait::async_trait;
use rand::Rng;

fn noise(amplitude: f64) -> f64 {
    if amplitude <= 0.0 {
        return 0.0;
    }
    rand::rng().random_range(-amplitude..=amplitude)
}

pub struct SimImu {
    accel_noise: f64,
    gyro_noise: f64,
}

impl SimImu {
    pub fn new(accel_noise: f64, gyro_noise: f64) -> Self { Self { accel_noise, gyro_noise } }
}

#[async_trait]
impl TiltSource for SimImu {
    async fn read_tilt(&self) -> Result<TiltSample, SensorError> {
        Ok(TiltSample {
            accel: AccelSample::new(noise(self.accel_noise), noise(self.accel_noise), 1.0 + noise(self.accel_noise)),
            gyro: GyroSample::new(noise(self.gyro_noise), noise(self.gyro_noise), noise(self.gyro_noise)),
        })
    }
}

pub struct SimBarometer {
    ground_pressure_hpa: f64,
    temperature_c: f64,
    sea_level_hpa: f64,
}

impl SimBarometer {
    pub fn new(ground_pressure_hpa: f64, temperature_c: f64, sea_level_hpa: f64) -> Self {
        Self { ground_pressure_hpa, temperature_c, sea_level_hpa }
    }
}

#[async_trait]
impl AltitudeSource for SimBarometer {
    async fn read_altitude(&self) -> Result<AltitudeReading, SensorError> {
        let pressure = self.ground_pressure_hpa + noise(0.02);
        Ok(AltitudeReading::from_pressure(self.temperature_c + noise(0.1), pressure, self.sea_level_hpa))
    }
}

pub struct SimProximity {
    distance_m: f64,
}

impl SimProximity {
    pub fn new(distance_m: f64) -> Self { Self { distance_m } }
}

#[async_trait]
impl ProximitySource for SimProximity {
    async fn read_proximity(&self) -> Result<ProximityReading, SensorError> {
        Ok(ProximityReading::new((self.distance_m + noise(0.005)).max(0.0)))
    }
}

pub struct SimCompass {
    mag_x: f64,
    mag_y: f64,
}

impl SimCompass {
    pub fn new(mag_x: f64, mag_y: f64) -> Self { Self { mag_x, mag_y } }
}

#[async_trait]
impl HeadingSource for SimCompass {
    async fn read_heading(&self) -> Result<HeadingReading, SensorError> {
        Ok(HeadingReading::from_magnetometer(self.mag_x + noise(2.0), self.mag_y + noise(2.0)))
    }
}

pub struct SimGps {
    latitude_deg: f64,
    longitude_deg: f64,
    altitude_m: f64,
}

impl SimGps {
    pub fn new(latitude_deg: f64, longitude_deg: f64, altitude_m: f64) -> Self {
        Self { latitude_deg, longitude_deg, altitude_m }
    }
}

#[async_trait]
impl PositionSource for SimGps {
    async fn read_position(&self) -> Result<PositionFix, SensorError> {
        Ok(PositionFix::new(
            self.latitude_deg + noise(1e-6),
            self.longitude_deg + noise(1e-6),
            self.altitude_m + noise(0.5),
            9,
        ))
    }
}
