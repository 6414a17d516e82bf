use std::time::Duration;

/// One leg: climb or descend to `altitude_m`, turn to `heading_deg`, hold for `hold`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MissionLeg {
    pub altitude_m: f64,
    pub heading_deg: f64,
    pub hold: Duration,
}

impl MissionLeg {
    pub fn is_valid(&self, altitude_ceiling_m: f64) -> bool {
        self.altitude_m.is_finite()
            && self.altitude_m >= 0.0
            && self.altitude_m < altitude_ceiling_m
            && self.heading_deg.is_finite()
    }
}

/// Setpoint schedule handed in by the ground link. There is no path planning here,
/// the legs are flown in order exactly as given.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MissionPlan {
    legs: Vec<MissionLeg>,
}

impl MissionPlan {
    pub fn new(legs: Vec<MissionLeg>) -> Self { Self { legs } }

    pub fn legs(&self) -> &[MissionLeg] { &self.legs }

    pub fn is_valid(&self, altitude_ceiling_m: f64) -> bool {
        !self.legs.is_empty() && self.legs.iter().all(|l| l.is_valid(altitude_ceiling_m))
    }
}

/// Position inside a running plan, advanced by the autoflight cycle time.
#[derive(Debug, Clone)]
pub struct MissionProgress {
    plan: MissionPlan,
    leg: usize,
    leg_elapsed: Duration,
}

impl MissionProgress {
    pub fn new(plan: MissionPlan) -> Self { Self { plan, leg: 0, leg_elapsed: Duration::ZERO } }

    pub fn current(&self) -> Option<&MissionLeg> { self.plan.legs.get(self.leg) }

    pub fn leg_index(&self) -> usize { self.leg }

    /// Adds `dt` to the current leg and moves on once its hold time is used up.
    /// Returns the leg to fly now, `None` when the plan is complete.
    pub fn advance(&mut self, dt: Duration) -> Option<MissionLeg> {
        let leg = *self.current()?;
        self.leg_elapsed += dt;
        if self.leg_elapsed >= leg.hold {
            self.leg += 1;
            self.leg_elapsed = Duration::ZERO;
        }
        self.current().copied()
    }
}
