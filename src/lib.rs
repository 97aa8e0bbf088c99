//! Decompression planning core.
//!
//! A Bühlmann ZH-L16C tissue model with gradient factors, the ascent and stop
//! scheduling built on top of it, and the gas consumption accounting that
//! depends on the resulting profile. Everything is a plain synchronous call:
//! inputs are copied in, a new result is returned, nothing is shared.
#![no_std]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

#[macro_use]
mod fmt;

pub mod algorithm;
pub mod api;
pub mod ceiling;
pub mod consumption;
pub mod depth_converter;
pub mod dive_info;
pub mod error;
pub mod events;
pub mod gas;
pub mod m_value;
pub mod ndl;
pub mod nitrox;
pub mod options;
pub mod oxygen;
pub mod segments;
pub mod tank;
pub mod tissue;
pub mod units;
pub mod zh16c;

pub use algorithm::{BuhlmannAlgorithm, CalculatedProfile, Ceiling};
pub use api::{
    ConsumptionRequest, ConsumptionResult, DiveInfoRequest, DiveInfoResult, PlanRequest,
    ProfileResult, TankConsumption, consumption, dive_info, plan,
};
pub use depth_converter::{AltitudePressure, DepthConverter, Salinity};
pub use error::{ConfigValidationErr, PlanningError};
pub use events::{Event, EventOptions, EventType, Events};
pub use gas::{Gas, StandardGases};
pub use options::{Diver, FeatureFlags, Options, ReservePolicy, ReserveRule, SafetyStop};
pub use segments::{Segment, Segments, SegmentsFactory};
pub use tank::{Tank, TankId, Tanks};
pub use tissue::{LoadedTissue, Tissues};

/// Water vapour pressure in the lungs (bar) at 37 °C.
pub const WATER_VAPOR_PRESSURE: f64 = 0.0627;

/// Nitrogen fraction used for surface saturation of a diver breathing air.
pub const FN2_AIR: f64 = 0.79;

/// Number of Bühlmann compartments.
pub const COMPARTMENTS: usize = 16;

/// Seconds per minute, the planner stores every duration in seconds.
pub const MINUTE: f64 = 60.0;

// nitrogen partial pressure in a compartment saturated at the given ambient pressure
pub fn default_tissue_load(surface_pressure: f64) -> f64 {
    (surface_pressure - WATER_VAPOR_PRESSURE) * FN2_AIR
}

#[test]
fn test_default_tissue_load() {
    let load = default_tissue_load(1.0);
    assert!(libm::fabs(load - 0.740_467) < 1e-6);
}
