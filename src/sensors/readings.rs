use chrono::{DateTime, Utc};

/// Raw accelerometer vector in units of g.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AccelSample {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl AccelSample {
    pub fn new(x: f64, y: f64, z: f64) -> Self { Self { x, y, z } }

    pub fn magnitude(&self) -> f64 { (self.x * self.x + self.y * self.y + self.z * self.z).sqrt() }

    pub fn is_finite(&self) -> bool { self.x.is_finite() && self.y.is_finite() && self.z.is_finite() }
}

/// Raw gyroscope rates in degrees per second.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GyroSample {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl GyroSample {
    pub fn new(x: f64, y: f64, z: f64) -> Self { Self { x, y, z } }

    pub fn is_finite(&self) -> bool { self.x.is_finite() && self.y.is_finite() && self.z.is_finite() }
}

/// One combined read of an inertial measurement unit.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TiltSample {
    pub accel: AccelSample,
    pub gyro: GyroSample,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AltitudeReading {
    temperature_c: f64,
    pressure_hpa: f64,
    altitude_m: f64,
}

impl AltitudeReading {
    /// Standard sea level pressure in hPa.
    pub const SEA_LEVEL_HPA: f64 = 1013.25;

    /// Derives the altitude with the international barometric formula.
    pub fn from_pressure(temperature_c: f64, pressure_hpa: f64, sea_level_hpa: f64) -> Self {
        let altitude_m = 44_330.0 * (1.0 - (pressure_hpa / sea_level_hpa).powf(1.0 / 5.255));
        Self { temperature_c, pressure_hpa, altitude_m }
    }

    pub fn temperature_c(&self) -> f64 { self.temperature_c }
    pub fn pressure_hpa(&self) -> f64 { self.pressure_hpa }
    pub fn altitude_m(&self) -> f64 { self.altitude_m }

    pub fn is_plausible(&self) -> bool {
        self.pressure_hpa.is_finite()
            && self.pressure_hpa > 0.0
            && self.temperature_c.is_finite()
            && self.altitude_m.is_finite()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ProximityReading {
    distance_m: f64,
}

impl ProximityReading {
    pub fn new(distance_m: f64) -> Self { Self { distance_m } }
    pub fn distance_m(&self) -> f64 { self.distance_m }
    pub fn is_plausible(&self) -> bool { self.distance_m.is_finite() && self.distance_m >= 0.0 }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HeadingReading {
    heading_deg: f64,
}

impl HeadingReading {
    pub fn new(heading_deg: f64) -> Self { Self { heading_deg: heading_deg.rem_euclid(360.0) } }

    /// Heading from the horizontal magnetometer components, level mounting assumed.
    pub fn from_magnetometer(mag_x: f64, mag_y: f64) -> Self {
        Self::new(mag_y.atan2(mag_x).to_degrees())
    }

    /// Degrees in `[0, 360)`.
    pub fn heading_deg(&self) -> f64 { self.heading_deg }
    pub fn is_plausible(&self) -> bool { self.heading_deg.is_finite() }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionFix {
    latitude_deg: f64,
    longitude_deg: f64,
    altitude_m: f64,
    satellites: u8,
    timestamp: DateTime<Utc>,
}

impl PositionFix {
    pub fn new(latitude_deg: f64, longitude_deg: f64, altitude_m: f64, satellites: u8) -> Self {
        Self { latitude_deg, longitude_deg, altitude_m, satellites, timestamp: Utc::now() }
    }

    pub fn latitude_deg(&self) -> f64 { self.latitude_deg }
    pub fn longitude_deg(&self) -> f64 { self.longitude_deg }
    pub fn altitude_m(&self) -> f64 { self.altitude_m }
    pub fn satellites(&self) -> u8 { self.satellites }
    pub fn timestamp(&self) -> DateTime<Utc> { self.timestamp }

    pub fn is_plausible(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude_deg)
            && (-180.0..=180.0).contains(&self.longitude_deg)
            && self.altitude_m.is_finite()
    }
}
