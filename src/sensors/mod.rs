//! Capability interfaces for the sensors the core consumes, the strongly typed
//! readings they return, the pollers publishing scalar sensors into the shared
//! flight state and simulated drivers for bench runs.

mod capability;
mod poller;
mod readings;
pub mod sim;

pub use capability::{
    AltitudeSource, HeadingSource, PositionSource, ProximitySource, SensorError, SensorKind,
    TiltSource, bounded_read,
};
pub use poller::{Plausible, SensorPoller};
pub use readings::{
    AccelSample, AltitudeReading, GyroSample, HeadingReading, PositionFix, ProximityReading,
    TiltSample,
};
