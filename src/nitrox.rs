//! Nitrox calculator, every result is rounded toward the safe side.

use libm::{ceil, floor};

use crate::FN2_AIR;
use crate::depth_converter::{DepthConverter, Salinity};

fn floor_to(value: f64, factor: f64) -> f64 {
    floor(value * factor) / factor
}

fn ceil_to(value: f64, factor: f64) -> f64 {
    ceil(value * factor) / factor
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NitroxCalculator {
    converter: DepthConverter,
}

impl NitroxCalculator {
    pub fn new(converter: DepthConverter) -> Self {
        NitroxCalculator { converter }
    }

    /// Maximum operating depth (m) of `f_o2` at `ppo2`, rounded down to cm.
    pub fn mod_depth(&self, ppo2: f64, f_o2: f64) -> f64 {
        floor_to(self.converter.from_bar(ppo2 / f_o2), 100.0)
    }

    /// Richest oxygen fraction usable at `depth`, rounded down to a hundredth of a percent.
    pub fn best_mix(&self, ppo2: f64, depth: f64) -> f64 {
        let fraction = ppo2 / self.converter.to_bar(depth);
        floor_to(fraction.min(1.0), 10_000.0)
    }

    /// Equivalent air depth (m) of `f_o2` at `depth`, rounded up to cm.
    pub fn ead(&self, f_o2: f64, depth: f64) -> f64 {
        let n2_pressure = self.converter.to_bar(depth) * (1.0 - f_o2);
        ceil_to(self.converter.from_bar(n2_pressure / FN2_AIR), 100.0)
    }

    /// Oxygen partial pressure (bar) of `f_o2` at `depth`, rounded up.
    pub fn partial_pressure(&self, f_o2: f64, depth: f64) -> f64 {
        ceil_to(f_o2 * self.converter.to_bar(depth), 100.0)
    }
}

impl Default for NitroxCalculator {
    /// Fresh water with exactly 1 bar at the surface.
    fn default() -> Self {
        NitroxCalculator::new(DepthConverter::from_surface(Salinity::Fresh, 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mod_rounds_down() {
        let calculator = NitroxCalculator::default();
        assert_eq!(calculator.mod_depth(1.4, 0.32), 34.41);
        assert_eq!(calculator.mod_depth(1.6, 0.5), 22.43);
    }

    #[test]
    fn test_best_mix() {
        let calculator = NitroxCalculator::default();
        assert_eq!(calculator.best_mix(1.4, 30.0), 0.3551);
        assert_eq!(calculator.best_mix(1.6, 0.0), 1.0);
    }

    #[test]
    fn test_ead_rounds_up() {
        let calculator = NitroxCalculator::default();
        assert_eq!(calculator.ead(0.32, 30.0), 24.41);
        assert_eq!(calculator.ead(0.5, 0.0), 0.0);
    }

    #[test]
    fn test_partial_pressure_rounds_up() {
        let calculator = NitroxCalculator::default();
        assert_eq!(calculator.partial_pressure(0.32, 30.0), 1.27);
    }
}
