//! Oxygen toxicity: pulmonary (OTU) and central nervous system (CNS %).

use libm::{exp, log, pow};

use crate::MINUTE;
use crate::depth_converter::DepthConverter;
use crate::segments::Segment;

/// Oxygen partial pressure (bar) below which no toxicity accumulates.
pub const PPO2_THRESHOLD: f64 = 0.5;

/// Oxygen tolerance units, one unit is a minute breathing oxygen at 1 bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OtuCalculator {
    converter: DepthConverter,
}

impl OtuCalculator {
    pub fn new(converter: DepthConverter) -> Self {
        OtuCalculator { converter }
    }

    /// Units for `duration` minutes at constant `ppo2`.
    pub fn calculate_flat(&self, duration: f64, ppo2: f64) -> f64 {
        if ppo2 <= PPO2_THRESHOLD {
            return 0.0;
        }
        duration * pow((ppo2 - PPO2_THRESHOLD) / PPO2_THRESHOLD, 5.0 / 6.0)
    }

    /// Units for `duration` minutes of a linear depth change.
    ///
    /// The part of the change spent under the threshold doesn't count.
    pub fn calculate_difference(
        &self,
        duration: f64,
        f_o2: f64,
        start_depth: f64,
        end_depth: f64,
    ) -> f64 {
        let start_ppo2 = f_o2 * self.converter.to_bar(start_depth);
        let end_ppo2 = f_o2 * self.converter.to_bar(end_depth);
        let max_ppo2 = start_ppo2.max(end_ppo2);
        let mut min_ppo2 = start_ppo2.min(end_ppo2);
        let mut duration = duration;

        if max_ppo2 <= PPO2_THRESHOLD {
            return 0.0;
        }
        if max_ppo2 - min_ppo2 < 1e-9 {
            return self.calculate_flat(duration, max_ppo2);
        }
        if min_ppo2 < PPO2_THRESHOLD {
            duration *= (max_ppo2 - PPO2_THRESHOLD) / (max_ppo2 - min_ppo2);
            min_ppo2 = PPO2_THRESHOLD;
        }

        let exponent = 11.0 / 6.0;
        let scale = 3.0 / 11.0 * duration / (max_ppo2 - min_ppo2);
        let upper = pow((max_ppo2 - PPO2_THRESHOLD) / PPO2_THRESHOLD, exponent);
        let lower = pow((min_ppo2 - PPO2_THRESHOLD) / PPO2_THRESHOLD, exponent);
        scale * (upper - lower)
    }

    pub fn calculate_for_profile(&self, segments: &[Segment]) -> f64 {
        segments
            .iter()
            .map(|segment| {
                let minutes = segment.duration / MINUTE;
                if segment.is_flat() {
                    let ppo2 = segment.gas.ppo2(segment.start_depth, &self.converter);
                    self.calculate_flat(minutes, ppo2)
                } else {
                    self.calculate_difference(
                        minutes,
                        segment.gas.f_o2,
                        segment.start_depth,
                        segment.end_depth,
                    )
                }
            })
            .sum()
    }
}

/// Central nervous system toxicity as percent of the NOAA single exposure limits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CnsCalculator {
    converter: DepthConverter,
}

impl CnsCalculator {
    // ppO2 (bar), limit (min)
    const NOAA_LIMITS: [(f64, f64); 11] = [
        (0.6, 720.0),
        (0.7, 570.0),
        (0.8, 450.0),
        (0.9, 360.0),
        (1.0, 300.0),
        (1.1, 240.0),
        (1.2, 210.0),
        (1.3, 180.0),
        (1.4, 150.0),
        (1.5, 120.0),
        (1.6, 45.0),
    ];

    pub fn new(converter: DepthConverter) -> Self {
        CnsCalculator { converter }
    }

    /// Exposure limit (min) at the oxygen partial pressure, `None` under the threshold.
    pub fn limit(ppo2: f64) -> Option<f64> {
        if ppo2 <= PPO2_THRESHOLD {
            return None;
        }

        let table = &Self::NOAA_LIMITS;
        let (first_ppo2, first_limit) = table[0];
        if ppo2 <= first_ppo2 {
            return Some(first_limit);
        }

        for pair in table.windows(2) {
            let (low_ppo2, low_limit) = pair[0];
            let (high_ppo2, high_limit) = pair[1];
            if ppo2 <= high_ppo2 {
                let ratio = (ppo2 - low_ppo2) / (high_ppo2 - low_ppo2);
                return Some(low_limit + (high_limit - low_limit) * ratio);
            }
        }

        // continue the last step exponentially
        let (previous_ppo2, previous_limit) = table[table.len() - 2];
        let (last_ppo2, last_limit) = table[table.len() - 1];
        let slope = log(last_limit / previous_limit) / (last_ppo2 - previous_ppo2);
        Some(last_limit * exp(slope * (ppo2 - last_ppo2)))
    }

    /// Percent of the limit used by `duration` minutes at `ppo2`.
    pub fn calculate_flat(&self, duration: f64, ppo2: f64) -> f64 {
        match Self::limit(ppo2) {
            Some(limit) => duration / limit * 100.0,
            None => 0.0,
        }
    }

    /// Depth changes are split into minute slices evaluated at their average depth.
    pub fn calculate_for_profile(&self, segments: &[Segment]) -> f64 {
        let mut total = 0.0;
        for segment in segments {
            let mut elapsed = 0.0;
            while elapsed < segment.duration {
                let next = (elapsed + MINUTE).min(segment.duration);
                let slice = segment.slice(elapsed, next);
                let ppo2 = slice.gas.ppo2(slice.average_depth(), &self.converter);
                total += self.calculate_flat(slice.duration / MINUTE, ppo2);
                elapsed = next;
            }
        }
        total
    }
}
