//! Display units. Calculations always run in metric, imperial values are converted
//! at the edges only.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::depth_converter::AltitudePressure;

pub const METERS_PER_FOOT: f64 = 0.3048;
pub const PSI_PER_BAR: f64 = 14.503773773;
pub const LITERS_PER_CUFT: f64 = 28.316846592;

pub fn feet_to_meters(feet: f64) -> f64 {
    feet * METERS_PER_FOOT
}

pub fn meters_to_feet(meters: f64) -> f64 {
    meters / METERS_PER_FOOT
}

pub fn psi_to_bar(psi: f64) -> f64 {
    psi / PSI_PER_BAR
}

pub fn bar_to_psi(bars: f64) -> f64 {
    bars * PSI_PER_BAR
}

pub fn cuft_to_liters(cuft: f64) -> f64 {
    cuft * LITERS_PER_CUFT
}

pub fn liters_to_cuft(liters: f64) -> f64 {
    liters / LITERS_PER_CUFT
}

/// Water volume (l) of a tank rated as `cuft` of free gas at `working_pressure` (bar).
pub fn tank_size_from_cuft(cuft: f64, working_pressure: f64) -> f64 {
    cuft_to_liters(cuft) * AltitudePressure::STANDARD / working_pressure
}

/// Free gas (cuft) of a tank with `liters` water volume filled to `working_pressure` (bar).
pub fn tank_size_to_cuft(liters: f64, working_pressure: f64) -> f64 {
    liters_to_cuft(liters * working_pressure / AltitudePressure::STANDARD)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UnitSystem {
    #[default]
    Metric,
    Imperial,
}

impl UnitSystem {
    pub fn length_unit(self) -> &'static str {
        match self {
            UnitSystem::Metric => "m",
            UnitSystem::Imperial => "ft",
        }
    }

    pub fn pressure_unit(self) -> &'static str {
        match self {
            UnitSystem::Metric => "bar",
            UnitSystem::Imperial => "psi",
        }
    }

    pub fn volume_unit(self) -> &'static str {
        match self {
            UnitSystem::Metric => "l",
            UnitSystem::Imperial => "cuft",
        }
    }

    pub fn to_length(self, meters: f64) -> f64 {
        match self {
            UnitSystem::Metric => meters,
            UnitSystem::Imperial => meters_to_feet(meters),
        }
    }

    pub fn from_length(self, value: f64) -> f64 {
        match self {
            UnitSystem::Metric => value,
            UnitSystem::Imperial => feet_to_meters(value),
        }
    }

    pub fn to_pressure(self, bars: f64) -> f64 {
        match self {
            UnitSystem::Metric => bars,
            UnitSystem::Imperial => bar_to_psi(bars),
        }
    }

    pub fn from_pressure(self, value: f64) -> f64 {
        match self {
            UnitSystem::Metric => value,
            UnitSystem::Imperial => psi_to_bar(value),
        }
    }

    /// Tank size shown as water volume (l) or free gas volume (cuft).
    pub fn to_tank_size(self, liters: f64, working_pressure: f64) -> f64 {
        match self {
            UnitSystem::Metric => liters,
            UnitSystem::Imperial => tank_size_to_cuft(liters, working_pressure),
        }
    }

    pub fn from_tank_size(self, value: f64, working_pressure: f64) -> f64 {
        match self {
            UnitSystem::Metric => value,
            UnitSystem::Imperial => tank_size_from_cuft(value, working_pressure),
        }
    }

    /// Volume at surface pressure (l or cuft), used for consumed gas and RMV.
    pub fn to_volume(self, liters: f64) -> f64 {
        match self {
            UnitSystem::Metric => liters,
            UnitSystem::Imperial => liters_to_cuft(liters),
        }
    }

    pub fn from_volume(self, value: f64) -> f64 {
        match self {
            UnitSystem::Metric => value,
            UnitSystem::Imperial => cuft_to_liters(value),
        }
    }

    /// Vertical speed shown per minute in the length unit.
    pub fn to_speed(self, meters_per_minute: f64) -> f64 {
        self.to_length(meters_per_minute)
    }

    pub fn from_speed(self, value: f64) -> f64 {
        self.from_length(value)
    }
}
