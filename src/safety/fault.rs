use crate::sensors::{SensorError, SensorKind};
use chrono::{DateTime, Utc};
use std::{
    collections::VecDeque,
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};
use strum_macros::{Display, EnumIter};
use tokio::sync::Mutex;

/// The concurrently running loops, used to attribute overruns.
#[derive(Debug, Display, EnumIter, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoopKind {
    Orientation,
    Pid,
    AutoFlight,
    Barometer,
    Proximity,
    Telemetry,
}

impl LoopKind {
    fn code(self) -> u16 {
        match self {
            LoopKind::Orientation => 1,
            LoopKind::Pid => 2,
            LoopKind::AutoFlight => 3,
            LoopKind::Barometer => 4,
            LoopKind::Proximity => 5,
            LoopKind::Telemetry => 6,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultKind {
    SensorTimeout(SensorKind),
    SensorInvalidReading(SensorKind),
    ActuatorFault,
    CalibrationFailure,
    LoopOverrun(LoopKind),
    OperatorInterrupt,
}

impl FaultKind {
    /// Stable numeric code, high nibble names the kind, low nibble the sensor or loop.
    pub fn code(self) -> u16 {
        match self {
            FaultKind::SensorTimeout(s) => 0x10 | s.code(),
            FaultKind::SensorInvalidReading(s) => 0x20 | s.code(),
            FaultKind::ActuatorFault => 0x30,
            FaultKind::CalibrationFailure => 0x40,
            FaultKind::LoopOverrun(l) => 0x50 | l.code(),
            FaultKind::OperatorInterrupt => 0x60,
        }
    }

    /// Kinds that run the emergency stop no matter how they were reported.
    pub fn is_always_fatal(self) -> bool {
        matches!(self, FaultKind::ActuatorFault | FaultKind::OperatorInterrupt)
    }

    pub fn from_sensor_error(sensor: SensorKind, err: &SensorError) -> Self {
        match err {
            SensorError::Timeout | SensorError::Bus(_) => FaultKind::SensorTimeout(sensor),
            SensorError::InvalidReading => FaultKind::SensorInvalidReading(sensor),
        }
    }
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaultKind::SensorTimeout(s) => write!(f, "SensorTimeout({s})"),
            FaultKind::SensorInvalidReading(s) => write!(f, "SensorInvalidReading({s})"),
            FaultKind::ActuatorFault => write!(f, "ActuatorFault"),
            FaultKind::CalibrationFailure => write!(f, "CalibrationFailure"),
            FaultKind::LoopOverrun(l) => write!(f, "LoopOverrun({l})"),
            FaultKind::OperatorInterrupt => write!(f, "OperatorInterrupt"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaultRecord {
    kind: FaultKind,
    fatal: bool,
    timestamp: DateTime<Utc>,
}

impl FaultRecord {
    pub fn new(kind: FaultKind, fatal: bool) -> Self {
        Self { kind, fatal: fatal || kind.is_always_fatal(), timestamp: Utc::now() }
    }

    pub fn kind(&self) -> FaultKind { self.kind }
    pub fn code(&self) -> u16 { self.kind.code() }
    pub fn is_fatal(&self) -> bool { self.fatal }
    pub fn timestamp(&self) -> DateTime<Utc> { self.timestamp }

    /// An operator interrupt is a clean shutdown, everything else is a failure exit.
    pub fn exit_code(&self) -> i32 {
        if self.kind == FaultKind::OperatorInterrupt { 0 } else { 1 }
    }
}

impl fmt::Display for FaultRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = if self.fatal { "fatal" } else { "non-fatal" };
        write!(f, "{} [{:#04x}, {severity}]", self.kind, self.code())
    }
}

/// Faults waiting to be picked up by telemetry.
///
/// Bounded: once full the oldest record is evicted and counted in `dropped`, so a
/// flood of identical faults can neither grow memory nor disappear unnoticed.
pub struct PendingFaults {
    queue: Mutex<VecDeque<FaultRecord>>,
    capacity: usize,
    dropped: AtomicU64,
}

impl PendingFaults {
    pub fn new(capacity: usize) -> Self {
        Self {
            queue: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity: capacity.max(1),
            dropped: AtomicU64::new(0),
        }
    }

    pub async fn push(&self, record: FaultRecord) {
        let mut queue = self.queue.lock().await;
        if queue.len() >= self.capacity {
            queue.pop_front();
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
        queue.push_back(record);
    }

    pub async fn drain(&self) -> Vec<FaultRecord> { self.queue.lock().await.drain(..).collect() }

    pub async fn len(&self) -> usize { self.queue.lock().await.len() }

    pub async fn is_empty(&self) -> bool { self.queue.lock().await.is_empty() }

    pub fn dropped(&self) -> u64 { self.dropped.load(Ordering::Relaxed) }
}
