use libm::ceil;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::depth_converter::DepthConverter;
use crate::tissue::{LoadedTissue, Tissues};

const ROUNDING_TOLERANCE: f64 = 1e-9;

/// Gradient factors interpolated from gfLow at the first stop to gfHigh at the surface.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GradientFactors {
    gf_low: f64,
    gf_high: f64,
    first_stop: f64,
}

impl GradientFactors {
    pub fn new(gf_low: f64, gf_high: f64) -> Self {
        GradientFactors {
            gf_low,
            gf_high,
            first_stop: 0.0,
        }
    }

    pub fn gf_low(&self) -> f64 {
        self.gf_low
    }

    pub fn gf_high(&self) -> f64 {
        self.gf_high
    }

    /// Depth where gfLow applies, zero for a dive without decompression.
    pub fn first_stop(&self) -> f64 {
        self.first_stop
    }

    /// Moves the gfLow anchor deeper, it never moves up.
    pub fn anchor(&mut self, first_stop: f64) {
        self.first_stop = self.first_stop.max(first_stop);
    }

    pub fn gradient_at(&self, depth: f64) -> f64 {
        if self.first_stop <= 0.0 {
            return self.gf_high;
        }
        if depth >= self.first_stop {
            return self.gf_low;
        }

        self.gf_high + (self.gf_low - self.gf_high) * depth / self.first_stop
    }
}

/// Lowest ambient pressure (bar) the compartment tolerates with the gradient factor.
pub fn tolerated_pressure(gradient: f64, tissue: LoadedTissue, tissue_index: usize) -> f64 {
    let p_total = tissue.total();
    let (a, b) = tissue.coefficients(tissue_index);
    (b * p_total - gradient * a * b) / ((1.0 - b) * gradient + b)
}

/// Ceiling depth (m) of one compartment, zero when it may surface.
pub fn ceiling(
    gradient: f64,
    tissue: LoadedTissue,
    tissue_index: usize,
    converter: &DepthConverter,
) -> f64 {
    converter.from_bar(tolerated_pressure(gradient, tissue, tissue_index))
}

/// Deepest ceiling over all compartments with the index of the controlling one.
pub fn max_ceiling(gradient: f64, tissues: &Tissues, converter: &DepthConverter) -> (f64, usize) {
    let mut max_ceiling = 0.0;
    let mut tissue_index = 0;
    for (index, tissue) in tissues.iter().enumerate() {
        let tentative_max_ceiling = ceiling(gradient, *tissue, index, converter);
        if tentative_max_ceiling > max_ceiling {
            max_ceiling = tentative_max_ceiling;
            tissue_index = index;
        }
    }
    (max_ceiling, tissue_index)
}

/// Rounds a ceiling down to the next stop depth, i.e. to the deeper multiple of `distance`.
pub fn round_to_stop(depth: f64, distance: f64) -> f64 {
    if depth <= ROUNDING_TOLERANCE {
        return 0.0;
    }
    ceil(depth / distance - ROUNDING_TOLERANCE) * distance
}
