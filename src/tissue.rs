#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use alloc::vec::Vec;
use libm::{exp, log};

use crate::depth_converter::DepthConverter;
use crate::gas::Gas;
use crate::m_value::gradient;
use crate::segments::Segment;
use crate::zh16c::ZhL16cGf;
use crate::{COMPARTMENTS, MINUTE, WATER_VAPOR_PRESSURE, default_tissue_load};

/// Inert gas partial pressures (bar) loaded in one compartment.
#[derive(Default, Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LoadedTissue {
    pub load_n2: f64,
    pub load_he: f64,
}

impl LoadedTissue {
    pub fn total(&self) -> f64 {
        self.load_n2 + self.load_he
    }

    /// Bühlmann `a`/`b` of this compartment for its current gas mix.
    pub fn coefficients(&self, tissue_index: usize) -> (f64, f64) {
        ZhL16cGf::coefficients(tissue_index, self.load_n2, self.load_he)
    }
}

/// Breathing a gas while ambient pressure changes linearly.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GasLoading {
    /// Ambient pressure at the start (bar).
    pub start_pressure: f64,
    /// Ambient pressure change (bar/min).
    pub rate: f64,
    pub gas: Gas,
}

impl GasLoading {
    pub fn for_segment(segment: &Segment, converter: &DepthConverter) -> Self {
        let start_pressure = converter.to_bar(segment.start_depth);
        let minutes = segment.duration / MINUTE;
        let rate = if minutes > 0.0 {
            (converter.to_bar(segment.end_depth) - start_pressure) / minutes
        } else {
            0.0
        };

        GasLoading {
            start_pressure,
            rate,
            gas: segment.gas,
        }
    }
}

// Schreiner equation
// pt(t) = palv0 + R(t - 1/k) - [palv0 - pt0 - R/k] * e^(-kt)
// pt0 -> compartment inert gas pressure at t=0
// palv0 -> alveolar inert gas pressure at t=0
// R -> rate of change of the alveolar inert gas pressure (bar/min)
// k -> ln 2 / half-time
fn schreiner(pt0: f64, palv0: f64, rate: f64, half_time: f64, minutes: f64) -> f64 {
    let k = log(2.0) / half_time;
    palv0 + rate * (minutes - 1.0 / k) - (palv0 - pt0 - rate / k) * exp(-k * minutes)
}

pub fn calculate_tissue(
    mut tissue: LoadedTissue,
    tissue_index: usize,
    loading: &GasLoading,
    minutes: f64,
) -> LoadedTissue {
    if minutes <= 0.0 {
        return tissue;
    }

    let alveolar = loading.start_pressure - WATER_VAPOR_PRESSURE;
    let fn2 = loading.gas.f_n2();
    let fhe = loading.gas.f_he;

    tissue.load_n2 = schreiner(
        tissue.load_n2,
        alveolar * fn2,
        loading.rate * fn2,
        ZhL16cGf::N2_HALF_LIFE[tissue_index],
        minutes,
    );
    tissue.load_he = schreiner(
        tissue.load_he,
        alveolar * fhe,
        loading.rate * fhe,
        ZhL16cGf::HE_HALF_LIFE[tissue_index],
        minutes,
    );

    tissue
}

/// State of all 16 compartments, the only state carried between dives.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Tissues {
    pub compartments: [LoadedTissue; COMPARTMENTS],
}

impl Tissues {
    /// Saturated with air at the given surface pressure.
    pub fn create(surface_pressure: f64) -> Self {
        let tissue = LoadedTissue {
            load_n2: default_tissue_load(surface_pressure),
            load_he: 0.0,
        };
        Tissues {
            compartments: [tissue; COMPARTMENTS],
        }
    }

    /// `None` unless exactly one record per compartment is given.
    pub fn from_slice(compartments: &[LoadedTissue]) -> Option<Self> {
        let compartments: [LoadedTissue; COMPARTMENTS] = compartments.try_into().ok()?;
        Some(Tissues { compartments })
    }

    pub fn to_vec(&self) -> Vec<LoadedTissue> {
        self.compartments.to_vec()
    }

    pub fn load(&mut self, loading: &GasLoading, duration: f64) {
        let minutes = duration / MINUTE;
        for (index, tissue) in self.compartments.iter_mut().enumerate() {
            *tissue = calculate_tissue(*tissue, index, loading, minutes);
        }
    }

    pub fn load_segment(&mut self, segment: &Segment, converter: &DepthConverter) {
        let loading = GasLoading::for_segment(segment, converter);
        self.load(&loading, segment.duration);
    }

    /// Copy of the tissues after the segment, `self` stays untouched.
    pub fn with_segment(mut self, segment: &Segment, converter: &DepthConverter) -> Self {
        self.load_segment(segment, converter);
        self
    }

    /// Off-gassing at the surface on air between repetitive dives.
    pub fn surface_interval(&mut self, duration: f64, converter: &DepthConverter) {
        let loading = GasLoading {
            start_pressure: converter.surface_pressure(),
            rate: 0.0,
            gas: Gas::air(),
        };
        self.load(&loading, duration);
    }

    /// Sum of inert gas pressures over all compartments.
    pub fn total_load(&self) -> f64 {
        self.compartments.iter().map(LoadedTissue::total).sum()
    }

    /// Highest compartment inert gas pressure.
    pub fn leading_load(&self) -> f64 {
        self.compartments
            .iter()
            .map(LoadedTissue::total)
            .fold(0.0, f64::max)
    }

    /// Gradient of every compartment against its M-value at the ambient pressure.
    pub fn over_pressures(&self, ambient_pressure: f64) -> [f64; COMPARTMENTS] {
        let mut result = [0.0; COMPARTMENTS];
        for (index, tissue) in self.compartments.iter().enumerate() {
            result[index] = gradient(tissue, index, ambient_pressure);
        }
        result
    }

    /// Surface gradient factor: highest compartment gradient at the surface, in percent.
    pub fn surface_gradient(&self, surface_pressure: f64) -> f64 {
        self.over_pressures(surface_pressure)
            .iter()
            .fold(0.0, |max, value| f64::max(max, *value))
            * 100.0
    }

    pub fn iter(&self) -> core::slice::Iter<'_, LoadedTissue> {
        self.compartments.iter()
    }
}

impl Default for Tissues {
    fn default() -> Self {
        Tissues::create(DepthConverter::default().surface_pressure())
    }
}

#[test]
fn test_calculate_tissues() {
    let tissues = Tissues::create(1.0);
    let loading = GasLoading {
        start_pressure: 5.0,
        rate: 0.0,
        gas: Gas::new(0.21, 0.0),
    };
    let result = calculate_tissue(tissues.compartments[15], 15, &loading, 1.0);
    let expected = 0.740467 + (4.9373 * 0.79 - 0.740467) * (1.0 - libm::exp2(-1.0 / 635.0));
    assert!(libm::fabs(result.load_n2 - expected) < 1e-9);
}
