//! Request/response boundary. Every call is synchronous and works on copies of its input.
//!
//! All values are metric: meters, bars, liters and seconds.

use alloc::vec::Vec;

#[cfg(feature = "serde")]
use alloc::string::String;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub use crate::consumption::{ConsumptionResult, TankConsumption};
use crate::algorithm::{BuhlmannAlgorithm, CalculatedProfile, Ceiling};
use crate::consumption::GasConsumption;
use crate::dive_info::{DiveInfo, DiveInfoCalculator};
use crate::error::PlanningError;
use crate::events::{EventOptions, Events};
use crate::options::{Diver, FeatureFlags, Options, ReservePolicy};
use crate::segments::{Segment, Segments};
use crate::tank::{Tank, Tanks};
use crate::tissue::{LoadedTissue, Tissues};

pub type DiveInfoResult = DiveInfo;

/// Tissues to start from: fresh when empty, otherwise the state left by a previous dive
/// off-gassed for `surface_interval` seconds.
fn initial_tissues(
    compartments: &[LoadedTissue],
    surface_interval: f64,
    options: &Options,
) -> Result<Tissues, PlanningError> {
    let converter = options.depth_converter();
    if compartments.is_empty() {
        return Ok(Tissues::create(converter.surface_pressure()));
    }

    let mut tissues = Tissues::from_slice(compartments).ok_or(PlanningError::InvalidTissues {
        count: compartments.len(),
    })?;
    if surface_interval > 0.0 {
        tissues.surface_interval(surface_interval, &converter);
    }
    Ok(tissues)
}

#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PlanRequest {
    pub tanks: Vec<Tank>,
    pub segments: Vec<Segment>,
    pub options: Options,
    #[cfg_attr(feature = "serde", serde(default))]
    pub initial_tissues: Vec<LoadedTissue>,
    /// Seconds since the previous dive, only used with `initial_tissues`.
    #[cfg_attr(feature = "serde", serde(default))]
    pub surface_interval: f64,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ProfileResult {
    pub segments: Vec<Segment>,
    pub ceilings: Vec<Ceiling>,
    pub final_tissues: Vec<LoadedTissue>,
    pub errors: Vec<PlanningError>,
    pub events: Events,
    pub bottom_segments: usize,
}

impl From<CalculatedProfile> for ProfileResult {
    fn from(profile: CalculatedProfile) -> Self {
        ProfileResult {
            final_tissues: profile.tissues.to_vec(),
            segments: profile.segments.into_vec(),
            ceilings: profile.ceilings,
            errors: profile.errors,
            events: profile.events,
            bottom_segments: profile.bottom_segments,
        }
    }
}

impl From<ProfileResult> for CalculatedProfile {
    fn from(result: ProfileResult) -> Self {
        let tissues = Tissues::from_slice(&result.final_tissues).unwrap_or_default();
        CalculatedProfile {
            segments: Segments::from_vec(result.segments),
            ceilings: result.ceilings,
            tissues,
            errors: result.errors,
            events: result.events,
            bottom_segments: result.bottom_segments,
        }
    }
}

pub fn plan(request: PlanRequest) -> ProfileResult {
    let tanks = Tanks::from_numbered(request.tanks);
    let segments = Segments::from_vec(request.segments);
    let tissues = match initial_tissues(
        &request.initial_tissues,
        request.surface_interval,
        &request.options,
    ) {
        Ok(tissues) => tissues,
        Err(err) => {
            return ProfileResult {
                segments: Vec::new(),
                ceilings: Vec::new(),
                final_tissues: request.initial_tissues,
                errors: alloc::vec![err],
                events: Events::new(),
                bottom_segments: 0,
            };
        }
    };

    BuhlmannAlgorithm::new(request.options)
        .decompression(&segments, &tanks, &tissues)
        .into()
}

#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ConsumptionRequest {
    /// The planned part of the dive.
    pub plan: Vec<Segment>,
    /// The calculated dive, planned segments followed by the ascent.
    pub profile: Vec<Segment>,
    pub options: Options,
    pub diver: Diver,
    pub reserve_policy: ReservePolicy,
    pub tanks: Vec<Tank>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub initial_tissues: Vec<LoadedTissue>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub surface_interval: f64,
}

/// Tanks in the result carry their consumed gas and reserve, the request is left untouched.
pub fn consumption(request: ConsumptionRequest) -> Result<ConsumptionResult, PlanningError> {
    let tissues = initial_tissues(
        &request.initial_tissues,
        request.surface_interval,
        &request.options,
    )?;
    let mut tanks = Tanks::from_numbered(request.tanks);
    tanks.validate_ids()?;
    let planned = Segments::from_vec(request.plan);
    let calculator = GasConsumption::new(request.options, request.diver, request.reserve_policy);
    Ok(calculator.calculate(&planned, &request.profile, &mut tanks, &tissues))
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DiveInfoRequest {
    pub profile: ProfileResult,
    pub options: Options,
    #[cfg_attr(feature = "serde", serde(default))]
    pub event_options: EventOptions,
    #[cfg_attr(feature = "serde", serde(default))]
    pub flags: FeatureFlags,
    #[cfg_attr(feature = "serde", serde(default))]
    pub initial_tissues: Vec<LoadedTissue>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub surface_interval: f64,
}

pub fn dive_info(request: DiveInfoRequest) -> Result<DiveInfoResult, PlanningError> {
    let tissues = initial_tissues(
        &request.initial_tissues,
        request.surface_interval,
        &request.options,
    )?;
    let profile = CalculatedProfile::from(request.profile);
    let calculator =
        DiveInfoCalculator::new(&request.options, &request.event_options, request.flags);
    Ok(calculator.calculate(&profile, &tissues))
}

/// JSON in, JSON out, for hosts talking to the planner through strings.
#[cfg(feature = "serde")]
pub fn plan_json(request: &str) -> Result<String, serde_json::Error> {
    let request: PlanRequest = serde_json::from_str(request)?;
    serde_json::to_string(&plan(request))
}
