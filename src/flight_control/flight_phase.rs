use std::collections::HashSet;
use std::sync::LazyLock;
use strum_macros::{Display, EnumIter};

#[derive(Debug, Display, EnumIter, PartialEq, Eq, Clone, Copy, Hash)]
pub enum FlightPhase {
    Idle,
    Calibrating,
    Armed,
    Stabilizing,
    Autonomous,
    Landing,
    EmergencyStopped,
}

impl FlightPhase {
    pub fn can_transition_to(self, to: FlightPhase) -> bool { ALLOWED_TRANSITIONS.contains(&(self, to)) }

    pub fn code(self) -> i32 {
        match self {
            FlightPhase::Idle => 1,
            FlightPhase::Calibrating => 2,
            FlightPhase::Armed => 3,
            FlightPhase::Stabilizing => 4,
            FlightPhase::Autonomous => 5,
            FlightPhase::Landing => 6,
            FlightPhase::EmergencyStopped => 7,
        }
    }
}

impl From<&str> for FlightPhase {
    fn from(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "idle" => FlightPhase::Idle,
            "calibrating" => FlightPhase::Calibrating,
            "armed" => FlightPhase::Armed,
            "stabilizing" => FlightPhase::Stabilizing,
            "autonomous" => FlightPhase::Autonomous,
            "landing" => FlightPhase::Landing,
            // anything unknown is treated as the most restrictive phase
            _ => FlightPhase::EmergencyStopped,
        }
    }
}

impl From<FlightPhase> for &'static str {
    fn from(value: FlightPhase) -> Self {
        match value {
            FlightPhase::Idle => "idle",
            FlightPhase::Calibrating => "calibrating",
            FlightPhase::Armed => "armed",
            FlightPhase::Stabilizing => "stabilizing",
            FlightPhase::Autonomous => "autonomous",
            FlightPhase::Landing => "landing",
            FlightPhase::EmergencyStopped => "emergency_stopped",
        }
    }
}

/// Every legal phase edge. Anything not listed here is unreachable.
pub static ALLOWED_TRANSITIONS: LazyLock<HashSet<(FlightPhase, FlightPhase)>> = LazyLock::new(|| {
    use FlightPhase::{
        Armed, Autonomous, Calibrating, EmergencyStopped, Idle, Landing, Stabilizing,
    };
    let mut edges = HashSet::new();
    let sequence = vec![
        (Idle, Calibrating),
        (Calibrating, Armed),
        // calibration did not converge
        (Calibrating, Idle),
        (Armed, Stabilizing),
        (Stabilizing, Autonomous),
        // mission plan complete
        (Autonomous, Stabilizing),
        // touchdown
        (Landing, Idle),
        // reset after an emergency stop, only ever followed by a new arm sequence
        (EmergencyStopped, Idle),
    ];
    edges.extend(sequence);
    for from in [Calibrating, Armed, Stabilizing, Autonomous] {
        edges.insert((from, Landing));
    }
    for from in [Idle, Calibrating, Armed, Stabilizing, Autonomous, Landing] {
        edges.insert((from, EmergencyStopped));
    }
    edges
});
