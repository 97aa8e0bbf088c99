//! Per dive configuration.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::depth_converter::{DepthConverter, Salinity};
use crate::error::{ConfigValidationErr, ConfigValidationErrorField, ConfigValidationErrorReason};
use crate::gas::{Gas, MIN_PPO2};
use crate::tank::{Tank, TankRole};

/// Safety stop duration (s).
pub const SAFETY_STOP_DURATION: f64 = 180.0;

/// Ascent speed band boundary (m) below which the slowest speed applies.
pub const SLOW_ASCENT_DEPTH: f64 = 6.0;

const DEPTH_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SafetyStop {
    Never,
    /// Only when the dive goes deeper than the minimum auto stop depth.
    #[default]
    Auto,
    Always,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Options {
    pub gf_low: f64,                       // 0 < x <= 1
    pub gf_high: f64,                      // 0 < x <= 1
    pub max_ppo2: f64,                     // bar
    pub max_deco_ppo2: f64,                // bar
    pub salinity: Salinity,
    pub altitude: f64,                     // m above sea level
    pub round_stops_to_minutes: bool,
    pub gas_switch_duration: f64,          // s
    pub safety_stop: SafetyStop,
    pub last_stop_depth: f64,              // m
    pub deco_stop_distance: f64,           // m
    pub minimum_auto_stop_depth: f64,      // m
    pub max_end: f64,                      // m
    pub oxygen_narcotic: bool,
    pub descent_speed: f64,                // m/min
    pub ascent_speed_50perc: f64,          // m/min
    pub ascent_speed_50perc_to_6m: f64,    // m/min
    pub ascent_speed_6m: f64,              // m/min
    pub problem_solving_duration: f64,     // s
}

impl Options {
    pub fn new(gf_low: f64, gf_high: f64) -> Self {
        Options {
            gf_low,
            gf_high,
            ..Options::default()
        }
    }

    pub fn with_gradient_factors(mut self, gf_low: f64, gf_high: f64) -> Self {
        self.gf_low = gf_low;
        self.gf_high = gf_high;
        self
    }

    pub fn with_salinity(mut self, salinity: Salinity) -> Self {
        self.salinity = salinity;
        self
    }

    pub fn with_altitude(mut self, altitude: f64) -> Self {
        self.altitude = altitude;
        self
    }

    pub fn with_safety_stop(mut self, safety_stop: SafetyStop) -> Self {
        self.safety_stop = safety_stop;
        self
    }

    pub fn depth_converter(&self) -> DepthConverter {
        DepthConverter::for_salinity(self.salinity, self.altitude)
    }

    pub fn validate(&self) -> Result<(), ConfigValidationErr> {
        use ConfigValidationErrorField as Field;
        use ConfigValidationErrorReason as Reason;

        let fraction = |value: f64| value > 0.0 && value <= 1.0;
        if !fraction(self.gf_low) || !fraction(self.gf_high) {
            return Err(ConfigValidationErr::new(Field::GradientFactors, Reason::OutOfRange));
        }
        if self.gf_low > self.gf_high {
            return Err(ConfigValidationErr::new(Field::GradientFactors, Reason::GfOrder));
        }

        let ppo2 = |value: f64| (MIN_PPO2..=3.0).contains(&value);
        if !ppo2(self.max_ppo2) {
            return Err(ConfigValidationErr::new(Field::MaxPpO2, Reason::OutOfRange));
        }
        if !ppo2(self.max_deco_ppo2) {
            return Err(ConfigValidationErr::new(Field::MaxDecoPpO2, Reason::OutOfRange));
        }
        if self.max_deco_ppo2 < self.max_ppo2 {
            return Err(ConfigValidationErr::new(Field::MaxDecoPpO2, Reason::PpO2Order));
        }

        if !(0.0..=8000.0).contains(&self.altitude) {
            return Err(ConfigValidationErr::new(Field::Altitude, Reason::OutOfRange));
        }

        if self.deco_stop_distance <= 0.0
            || self.last_stop_depth <= 0.0
            || self.minimum_auto_stop_depth < 0.0
        {
            return Err(ConfigValidationErr::new(Field::StopDepths, Reason::OutOfRange));
        }

        let speed = |value: f64| value > 0.0 && value.is_finite();
        if !speed(self.descent_speed)
            || !speed(self.ascent_speed_50perc)
            || !speed(self.ascent_speed_50perc_to_6m)
            || !speed(self.ascent_speed_6m)
        {
            return Err(ConfigValidationErr::new(Field::Speeds, Reason::OutOfRange));
        }

        if self.gas_switch_duration < 0.0 || self.problem_solving_duration < 0.0 {
            return Err(ConfigValidationErr::new(Field::Durations, Reason::OutOfRange));
        }

        if self.max_end <= 0.0 {
            return Err(ConfigValidationErr::new(Field::MaxEnd, Reason::OutOfRange));
        }

        Ok(())
    }

    /// Ascent speed (m/min) when leaving `depth`.
    ///
    /// Fast above half of the average depth, medium down to 6 m, slow in the last 6 m.
    pub fn ascent_speed(&self, depth: f64, average_depth: f64) -> f64 {
        if depth <= SLOW_ASCENT_DEPTH + DEPTH_TOLERANCE {
            self.ascent_speed_6m
        } else if depth > average_depth * 0.5 {
            self.ascent_speed_50perc
        } else {
            self.ascent_speed_50perc_to_6m
        }
    }

    /// Gas is neither hypoxic, toxic over `max_ppo2` nor over the narcotic limit.
    pub fn is_breathable(
        &self,
        gas: &Gas,
        depth: f64,
        max_ppo2: f64,
        converter: &DepthConverter,
    ) -> bool {
        gas.ppo2(depth, converter) <= max_ppo2 + DEPTH_TOLERANCE
            && gas.ceiling(converter) <= depth + DEPTH_TOLERANCE
            && gas.end(depth, self.oxygen_narcotic, converter) <= self.max_end + DEPTH_TOLERANCE
    }

    pub fn safety_stop_required(&self, max_depth: f64) -> bool {
        match self.safety_stop {
            SafetyStop::Never => false,
            SafetyStop::Auto => max_depth >= self.minimum_auto_stop_depth,
            SafetyStop::Always => true,
        }
    }
}

impl Default for Options {
    fn default() -> Self {
        Options {
            gf_low: 0.4,
            gf_high: 0.85,
            max_ppo2: 1.4,
            max_deco_ppo2: 1.6,
            salinity: Salinity::Fresh,
            altitude: 0.0,
            round_stops_to_minutes: false,
            gas_switch_duration: 120.0,
            safety_stop: SafetyStop::Auto,
            last_stop_depth: 3.0,
            deco_stop_distance: 3.0,
            minimum_auto_stop_depth: 10.0,
            max_end: 30.0,
            oxygen_narcotic: true,
            descent_speed: 18.0,
            ascent_speed_50perc: 9.0,
            ascent_speed_50perc_to_6m: 6.0,
            ascent_speed_6m: 3.0,
            problem_solving_duration: 60.0,
        }
    }
}

/// Breathing rates of the diver at the surface.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Diver {
    pub rmv: f64,        // litres per minute
    pub stress_rmv: f64, // litres per minute
}

impl Diver {
    pub fn new(rmv: f64) -> Self {
        Diver {
            rmv,
            stress_rmv: rmv * 1.5,
        }
    }

    /// Two divers sharing one gas supply under stress.
    pub fn team_stress_rmv(&self) -> f64 {
        self.stress_rmv * 2.0
    }
}

impl Default for Diver {
    fn default() -> Self {
        Diver {
            rmv: 20.0,
            stress_rmv: 30.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReserveRule {
    /// Fixed pressure (bar).
    Minimum(f64),
    /// Share of the start pressure, 0-100.
    Percentage(f64),
}

impl ReserveRule {
    pub fn bars(&self, tank: &Tank) -> f64 {
        match *self {
            ReserveRule::Minimum(bars) => bars,
            ReserveRule::Percentage(percent) => tank.start_pressure * percent / 100.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReservePolicy {
    pub primary: ReserveRule,
    pub stage: ReserveRule,
}

impl ReservePolicy {
    pub fn minimum(&self, role: TankRole, tank: &Tank) -> f64 {
        match role {
            TankRole::Primary => self.primary.bars(tank),
            TankRole::Stage => self.stage.bars(tank),
        }
    }
}

impl Default for ReservePolicy {
    fn default() -> Self {
        ReservePolicy {
            primary: ReserveRule::Minimum(30.0),
            stage: ReserveRule::Minimum(20.0),
        }
    }
}

/// Optional computations, passed explicitly to every call needing them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FeatureFlags {
    /// Collect per compartment over-pressures for every profile segment.
    pub collect_saturation: bool,
}
