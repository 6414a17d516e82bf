use super::readings::{AltitudeReading, HeadingReading, PositionFix, ProximityReading, TiltSample};
use async_trait::async_trait;
use std::{future::Future, time::Duration};
use strum_macros::{Display, EnumIter};

/// The measurement kinds a driver can provide.
#[derive(Debug, Display, EnumIter, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorKind {
    Imu,
    Barometer,
    Proximity,
    Compass,
    Gps,
}

impl SensorKind {
    pub fn code(self) -> u16 {
        match self {
            SensorKind::Imu => 1,
            SensorKind::Barometer => 2,
            SensorKind::Proximity => 3,
            SensorKind::Compass => 4,
            SensorKind::Gps => 5,
        }
    }
}

#[derive(Debug, Display, Clone, PartialEq)]
pub enum SensorError {
    Timeout,
    InvalidReading,
    Bus(String),
}

impl std::error::Error for SensorError {}

/// Accelerometer and gyroscope in one read.
#[async_trait]
pub trait TiltSource: Send + Sync {
    async fn read_tilt(&self) -> Result<TiltSample, SensorError>;
}

#[async_trait]
pub trait AltitudeSource: Send + Sync {
    async fn read_altitude(&self) -> Result<AltitudeReading, SensorError>;
}

#[async_trait]
pub trait ProximitySource: Send + Sync {
    async fn read_proximity(&self) -> Result<ProximityReading, SensorError>;
}

#[async_trait]
pub trait HeadingSource: Send + Sync {
    async fn read_heading(&self) -> Result<HeadingReading, SensorError>;
}

#[async_trait]
pub trait PositionSource: Send + Sync {
    async fn read_position(&self) -> Result<PositionFix, SensorError>;
}

/// Runs a driver read under a hard time limit. A read that does not finish in time
/// resolves to [`SensorError::Timeout`], it never blocks the calling loop longer.
pub async fn bounded_read<T, F>(limit: Duration, read: F) -> Result<T, SensorError>
where F: Future<Output = Result<T, SensorError>> {
    tokio::time::timeout(limit, read).await.unwrap_or(Err(SensorError::Timeout))
}
