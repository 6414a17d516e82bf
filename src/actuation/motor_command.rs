use strum_macros::{Display, EnumIter};

pub const MOTOR_COUNT: usize = 4;

/// Rotor positions on a plus-configured quad, in command order.
#[derive(Debug, Display, EnumIter, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum MotorPosition {
    Front,
    Right,
    Back,
    Left,
}

impl MotorPosition {
    pub fn index(self) -> usize { self as usize }
}

/// Per-axis corrections going into the mixer, `throttle` already includes the hover offset.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AxisCorrections {
    pub pitch: f64,
    pub roll: f64,
    pub yaw: f64,
    pub throttle: f64,
}

/// Normalized duty per motor. Every constructor clamps into `[0, 1]` and maps
/// non-finite values to zero, so an out of range command cannot be built.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MotorCommand {
    duties: [f64; MOTOR_COUNT],
}

impl MotorCommand {
    pub const DISARMED: MotorCommand = MotorCommand { duties: [0.0; MOTOR_COUNT] };

    pub fn new(duties: [f64; MOTOR_COUNT]) -> Self {
        Self { duties: duties.map(|d| if d.is_finite() { d.clamp(0.0, 1.0) } else { 0.0 }) }
    }

    /// Plus-frame mixing matrix.
    ///
    /// Positive pitch correction raises the back rotor and lowers the front one,
    /// positive roll raises the left one and lowers the right one. Yaw is applied
    /// common-mode: front/back spin one way, left/right the other.
    pub fn mix(c: AxisCorrections) -> Self {
        let mut duties = [0.0; MOTOR_COUNT];
        duties[MotorPosition::Front.index()] = c.throttle - c.pitch + c.yaw;
        duties[MotorPosition::Back.index()] = c.throttle + c.pitch + c.yaw;
        duties[MotorPosition::Right.index()] = c.throttle - c.roll - c.yaw;
        duties[MotorPosition::Left.index()] = c.throttle + c.roll - c.yaw;
        Self::new(duties)
    }

    pub fn duties(&self) -> [f64; MOTOR_COUNT] { self.duties }

    pub fn duty(&self, position: MotorPosition) -> f64 { self.duties[position.index()] }

    pub fn is_disarmed(&self) -> bool { self.duties.iter().all(|d| *d == 0.0) }
}
