//! Depth to ambient pressure conversion.

use libm::pow;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Standard gravity (m/s²).
pub const GRAVITY: f64 = 9.80665;

const PASCALS_PER_BAR: f64 = 100_000.0;

/// Water type the dive happens in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Salinity {
    #[default]
    Fresh,
    /// EN 13319 reference density used by most dive computers.
    Brackish,
    Salt,
}

impl Salinity {
    /// Water density in kg/m³.
    pub fn density(self) -> f64 {
        match self {
            Salinity::Fresh => 1000.0,
            Salinity::Brackish => 1020.0,
            Salinity::Salt => 1030.0,
        }
    }
}

/// International standard atmosphere, barometric formula.
pub struct AltitudePressure;

impl AltitudePressure {
    /// Sea level pressure (bar).
    pub const STANDARD: f64 = 1.01325;

    const GRADIENT: f64 = 2.25577e-5;
    const EXPONENT: f64 = 5.25588;

    /// Surface pressure (bar) at given altitude in meters above sea level.
    pub fn pressure(altitude: f64) -> f64 {
        let altitude = altitude.max(0.0);
        Self::STANDARD * pow(1.0 - Self::GRADIENT * altitude, Self::EXPONENT)
    }

    /// Altitude in meters above sea level with the given surface pressure.
    pub fn altitude(pressure: f64) -> f64 {
        let ratio = pow(pressure / Self::STANDARD, 1.0 / Self::EXPONENT);
        ((1.0 - ratio) / Self::GRADIENT).max(0.0)
    }
}

/// Converts depth in meters to absolute pressure in bars and back.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DepthConverter {
    surface_pressure: f64,
    bar_per_meter: f64,
}

impl DepthConverter {
    /// Rule of thumb: 1 bar at the surface plus 1 bar every 10 meters.
    pub fn simple() -> Self {
        DepthConverter {
            surface_pressure: 1.0,
            bar_per_meter: 0.1,
        }
    }

    pub fn for_salinity(salinity: Salinity, altitude: f64) -> Self {
        Self::from_surface(salinity, AltitudePressure::pressure(altitude))
    }

    pub fn from_surface(salinity: Salinity, surface_pressure: f64) -> Self {
        DepthConverter {
            surface_pressure,
            bar_per_meter: salinity.density() * GRAVITY / PASCALS_PER_BAR,
        }
    }

    pub fn surface_pressure(&self) -> f64 {
        self.surface_pressure
    }

    /// Pressure change (bar) of one meter of water column.
    pub fn bar_per_meter(&self) -> f64 {
        self.bar_per_meter
    }

    /// Absolute pressure at depth. Negative depth counts as the surface.
    pub fn to_bar(&self, depth: f64) -> f64 {
        depth.max(0.0) * self.bar_per_meter + self.surface_pressure
    }

    /// Depth where the absolute pressure is reached, never above the surface.
    pub fn from_bar(&self, bars: f64) -> f64 {
        ((bars - self.surface_pressure) / self.bar_per_meter).max(0.0)
    }
}

impl Default for DepthConverter {
    fn default() -> Self {
        Self::for_salinity(Salinity::Fresh, 0.0)
    }
}
