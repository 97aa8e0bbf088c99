//! No-decompression limits.

use crate::MINUTE;
use crate::ceiling::max_ceiling;
use crate::depth_converter::DepthConverter;
use crate::gas::Gas;
use crate::tissue::{GasLoading, Tissues};

/// Longest no-decompression time reported (min), shallow dives never need a stop.
pub const MAX_NDL: f64 = 1000.0;

fn loading_at(depth: f64, gas: Gas, converter: &DepthConverter) -> GasLoading {
    GasLoading {
        start_pressure: converter.to_bar(depth),
        rate: 0.0,
        gas,
    }
}

fn surfaceable(gf_high: f64, tissues: &Tissues, converter: &DepthConverter) -> bool {
    max_ceiling(gf_high, tissues, converter).0 <= 0.0
}

/// Whole minutes the diver can stay at `depth` before the gfHigh ceiling leaves the surface.
///
/// Zero when a stop is already required, capped at [`MAX_NDL`].
pub fn ndl(
    gf_high: f64,
    tissues: &Tissues,
    depth: f64,
    gas: Gas,
    converter: &DepthConverter,
) -> f64 {
    let loading = loading_at(depth, gas, converter);
    let mut tissues = *tissues;
    let mut bottom_time = 0.0;

    if !surfaceable(gf_high, &tissues, converter) {
        return 0.0;
    }

    while bottom_time < MAX_NDL {
        tissues.load(&loading, MINUTE);
        if !surfaceable(gf_high, &tissues, converter) {
            return bottom_time;
        }
        bottom_time += 1.0;
    }

    MAX_NDL
}

/// Same result as [`ndl`], probing doubled durations first and bisecting the last interval.
pub fn binary_ndl(
    gf_high: f64,
    tissues: &Tissues,
    depth: f64,
    gas: Gas,
    converter: &DepthConverter,
) -> f64 {
    let loading = loading_at(depth, gas, converter);
    let clear_after = |minutes: f64| {
        let mut probe = *tissues;
        probe.load(&loading, minutes * MINUTE);
        surfaceable(gf_high, &probe, converter)
    };

    if !clear_after(0.0) {
        return 0.0;
    }

    // low is always clear, high is the first probe that is not
    let mut low = 0.0;
    let mut high = 1.0;
    while clear_after(high) {
        low = high;
        if high >= MAX_NDL {
            return MAX_NDL;
        }
        high = (high * 2.0).min(MAX_NDL);
    }

    while high - low > 1.0 {
        let middle = libm::floor((low + high) / 2.0);
        if clear_after(middle) {
            low = middle;
        } else {
            high = middle;
        }
    }

    low
}

/// Static air no-decompression table used when the limit can't be computed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoDecoTable {
    rows: &'static [(f64, f64)],
}

impl NoDecoTable {
    const AIR: [(f64, f64); 11] = [
        (12.0, 130.0),
        (15.0, 75.0),
        (18.0, 50.0),
        (21.0, 35.0),
        (24.0, 25.0),
        (27.0, 20.0),
        (30.0, 17.0),
        (33.0, 13.0),
        (36.0, 10.0),
        (39.0, 8.0),
        (42.0, 7.0),
    ];

    pub fn air() -> Self {
        NoDecoTable { rows: &Self::AIR }
    }

    /// Limit (min) of the first row at or below `depth`, `None` deeper than the table.
    pub fn lookup(&self, depth: f64) -> Option<f64> {
        self.rows
            .iter()
            .find(|(row_depth, _)| depth <= *row_depth)
            .map(|(_, minutes)| *minutes)
    }
}
