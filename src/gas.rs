//! Breathing gas mixtures.

use alloc::format;
use alloc::string::String;
use libm::{fabs, round};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::depth_converter::DepthConverter;

/// Minimum oxygen partial pressure (bar) able to sustain a diver.
pub const MIN_PPO2: f64 = 0.18;

const DENSITY_O2: f64 = 1.429;
const DENSITY_N2: f64 = 1.251;
const DENSITY_HE: f64 = 0.1786;

const FRACTION_TOLERANCE: f64 = 1e-9;

/// Gas content by fractions, nitrogen is the remainder.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Gas {
    pub f_o2: f64,
    pub f_he: f64,
}

/// Partial pressures (bar) of the gas components at ambient pressure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PartialPressures {
    pub o2: f64,
    pub n2: f64,
    pub he: f64,
}

impl Gas {
    pub const fn new(f_o2: f64, f_he: f64) -> Self {
        Gas { f_o2, f_he }
    }

    pub const fn air() -> Self {
        StandardGases::AIR
    }

    pub fn f_n2(&self) -> f64 {
        1.0 - self.f_o2 - self.f_he
    }

    pub fn is_valid(&self) -> bool {
        self.f_o2 > 0.0
            && self.f_o2 <= 1.0
            && self.f_he >= 0.0
            && self.f_he <= 1.0
            && self.f_o2 + self.f_he <= 1.0 + FRACTION_TOLERANCE
    }

    /// Same content within fraction tolerance.
    pub fn same_content(&self, other: &Gas) -> bool {
        fabs(self.f_o2 - other.f_o2) < FRACTION_TOLERANCE
            && fabs(self.f_he - other.f_he) < FRACTION_TOLERANCE
    }

    pub fn partial_pressures(&self, depth: f64, converter: &DepthConverter) -> PartialPressures {
        let ambient = converter.to_bar(depth);
        PartialPressures {
            o2: self.f_o2 * ambient,
            n2: self.f_n2() * ambient,
            he: self.f_he * ambient,
        }
    }

    pub fn ppo2(&self, depth: f64, converter: &DepthConverter) -> f64 {
        self.f_o2 * converter.to_bar(depth)
    }

    /// Maximum operating depth for the given oxygen partial pressure limit.
    pub fn mod_depth(&self, max_ppo2: f64, converter: &DepthConverter) -> f64 {
        converter.from_bar(max_ppo2 / self.f_o2)
    }

    /// Shallowest depth where the gas is not hypoxic.
    pub fn ceiling(&self, converter: &DepthConverter) -> f64 {
        converter.from_bar(MIN_PPO2 / self.f_o2)
    }

    /// Fraction counted as narcotic, oxygen optionally included.
    pub fn narcotic_fraction(&self, oxygen_narcotic: bool) -> f64 {
        if oxygen_narcotic {
            self.f_n2() + self.f_o2
        } else {
            self.f_n2()
        }
    }

    /// Equivalent narcotic depth relative to air.
    pub fn end(&self, depth: f64, oxygen_narcotic: bool, converter: &DepthConverter) -> f64 {
        let air_narcotic = StandardGases::AIR.narcotic_fraction(oxygen_narcotic);
        let bars = converter.to_bar(depth) * self.narcotic_fraction(oxygen_narcotic) / air_narcotic;
        converter.from_bar(bars)
    }

    /// Density in g/l at depth.
    pub fn density(&self, depth: f64, converter: &DepthConverter) -> f64 {
        let surface_density =
            self.f_o2 * DENSITY_O2 + self.f_n2() * DENSITY_N2 + self.f_he * DENSITY_HE;
        surface_density * converter.to_bar(depth)
    }

    pub fn name(&self) -> String {
        let o2 = round(self.f_o2 * 100.0) as u32;
        let he = round(self.f_he * 100.0) as u32;

        if he == 0 {
            return match o2 {
                100 => String::from("Oxygen"),
                21 => String::from("Air"),
                _ => format!("EAN{}", o2),
            };
        }

        if o2 + he >= 100 {
            format!("Heliox {}/{}", o2, he)
        } else {
            format!("Trimix {}/{}", o2, he)
        }
    }
}

impl Default for Gas {
    fn default() -> Self {
        StandardGases::AIR
    }
}

pub struct StandardGases;

impl StandardGases {
    pub const AIR: Gas = Gas::new(0.209, 0.0);
    pub const EAN32: Gas = Gas::new(0.32, 0.0);
    pub const EAN36: Gas = Gas::new(0.36, 0.0);
    pub const EAN50: Gas = Gas::new(0.50, 0.0);
    pub const OXYGEN: Gas = Gas::new(1.0, 0.0);
    pub const TRIMIX_21_35: Gas = Gas::new(0.21, 0.35);
    pub const TRIMIX_18_45: Gas = Gas::new(0.18, 0.45);
    pub const TRIMIX_15_55: Gas = Gas::new(0.15, 0.55);
    pub const TRIMIX_10_70: Gas = Gas::new(0.10, 0.70);

    const ALL: [Gas; 9] = [
        Self::AIR,
        Self::EAN32,
        Self::EAN36,
        Self::EAN50,
        Self::OXYGEN,
        Self::TRIMIX_21_35,
        Self::TRIMIX_18_45,
        Self::TRIMIX_15_55,
        Self::TRIMIX_10_70,
    ];

    pub fn by_name(name: &str) -> Option<Gas> {
        Self::ALL.iter().copied().find(|gas| gas.name() == name)
    }
}
