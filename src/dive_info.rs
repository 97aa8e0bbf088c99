//! Summary of a calculated dive: limits, toxicity and the tissue state along the profile.

use alloc::vec::Vec;
use libm::floor;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::algorithm::{CalculatedProfile, Ceiling};
use crate::events::{Event, EventOptions, EventType, Events, ProfileEvents};
use crate::gas::Gas;
use crate::ndl::{NoDecoTable, ndl};
use crate::options::{FeatureFlags, Options};
use crate::oxygen::{CnsCalculator, OtuCalculator};
use crate::segments::Segment;
use crate::tissue::Tissues;
use crate::{COMPARTMENTS, MINUTE};

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GasDensity {
    pub gas: Gas,
    pub depth: f64,
    pub density: f64, // g/l
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DiveInfo {
    /// Whole minutes from leaving the surface.
    pub no_deco_time: f64,
    pub average_depth: f64,
    /// Highest surface gradient factor along the dive (%).
    pub surface_gradient: f64,
    pub offgassing_start_time: f64,  // s
    pub offgassing_start_depth: f64, // m
    pub otu: f64,
    pub cns: f64, // %
    pub highest_density: GasDensity,
    pub ceilings: Vec<Ceiling>,
    /// Compartment gradients at the end of every segment, empty unless collected.
    pub tissue_over_pressures: Vec<[f64; COMPARTMENTS]>,
    pub events: Events,
}

pub struct DiveInfoCalculator<'a> {
    options: &'a Options,
    event_options: &'a EventOptions,
    flags: FeatureFlags,
}

impl<'a> DiveInfoCalculator<'a> {
    pub fn new(options: &'a Options, event_options: &'a EventOptions, flags: FeatureFlags) -> Self {
        DiveInfoCalculator {
            options,
            event_options,
            flags,
        }
    }

    /// `tissues` are the tissues the profile started with.
    pub fn calculate(&self, profile: &CalculatedProfile, tissues: &Tissues) -> DiveInfo {
        let converter = self.options.depth_converter();
        let segments = profile.segments.as_slice();
        let replay = TissueReplay::run(segments, tissues, self.options, self.flags);

        let mut events = profile.events.clone();
        events.merge(ProfileEvents::analyze(
            profile,
            tissues,
            self.options,
            self.event_options,
        ));
        if let Some(event) = self.no_deco_end(profile) {
            events.add(event);
        }

        DiveInfo {
            no_deco_time: self.no_deco_time(profile, tissues),
            average_depth: profile.segments.average_depth(),
            surface_gradient: replay.surface_gradient,
            offgassing_start_time: replay.offgassing_start.map_or(0.0, |(time, _)| time),
            offgassing_start_depth: replay.offgassing_start.map_or(0.0, |(_, depth)| depth),
            otu: OtuCalculator::new(converter).calculate_for_profile(segments),
            cns: CnsCalculator::new(converter).calculate_for_profile(segments),
            highest_density: highest_density(segments, self.options),
            ceilings: profile.ceilings.clone(),
            tissue_over_pressures: replay.over_pressures,
            events: events.filtered(self.event_options),
        }
    }

    /// NDL from leaving the surface, measured at the deepest point of the plan.
    ///
    /// Falls back to the air table when the profile failed.
    pub fn no_deco_time(&self, profile: &CalculatedProfile, tissues: &Tissues) -> f64 {
        if !profile.is_valid() {
            if profile.segments.is_empty() {
                return 0.0;
            }
            return NoDecoTable::air()
                .lookup(profile.max_depth())
                .unwrap_or_default();
        }

        let planned = profile
            .segments
            .as_slice()
            .get(..profile.bottom_segments)
            .unwrap_or(&[]);
        let max_depth = planned
            .iter()
            .map(Segment::max_depth)
            .fold(0.0, f64::max);
        let Some(reached) = planned
            .iter()
            .position(|segment| segment.end_depth >= max_depth)
        else {
            return 0.0;
        };

        let converter = self.options.depth_converter();
        let mut loaded = *tissues;
        let mut descent = 0.0;
        for segment in &planned[..=reached] {
            loaded.load_segment(segment, &converter);
            descent += segment.duration;
        }
        let gas = planned[reached].gas;
        let at_depth = ndl(self.options.gf_high, &loaded, max_depth, gas, &converter);
        floor(descent / MINUTE + at_depth)
    }

    // first time the gfHigh ceiling leaves the surface while still following the plan
    fn no_deco_end(&self, profile: &CalculatedProfile) -> Option<Event> {
        let ascent_start = profile.ascent_start()?;
        let ceiling = profile
            .ceilings
            .iter()
            .take_while(|ceiling| ceiling.time <= ascent_start)
            .find(|ceiling| ceiling.depth > 0.0)?;
        let depth = profile.segments.depth_at_time(ceiling.time);
        Some(Event::new(EventType::NoDecoEnd, ceiling.time, depth))
    }
}

fn highest_density(segments: &[Segment], options: &Options) -> GasDensity {
    let converter = options.depth_converter();
    let mut highest = GasDensity {
        gas: Gas::air(),
        depth: 0.0,
        density: 0.0,
    };
    for segment in segments {
        let depth = segment.max_depth();
        let density = segment.gas.density(depth, &converter);
        if density > highest.density {
            highest = GasDensity {
                gas: segment.gas,
                depth,
                density,
            };
        }
    }
    highest
}

struct TissueReplay {
    surface_gradient: f64,
    offgassing_start: Option<(f64, f64)>,
    over_pressures: Vec<[f64; COMPARTMENTS]>,
}

impl TissueReplay {
    fn run(segments: &[Segment], tissues: &Tissues, options: &Options, flags: FeatureFlags) -> Self {
        let converter = options.depth_converter();
        let surface = converter.surface_pressure();
        let mut tissues = *tissues;
        let mut replay = TissueReplay {
            surface_gradient: tissues.surface_gradient(surface),
            offgassing_start: None,
            over_pressures: Vec::new(),
        };

        let mut time = 0.0;
        for segment in segments {
            let mut elapsed = 0.0;
            while elapsed < segment.duration {
                let next = (elapsed + MINUTE).min(segment.duration);
                let slice = segment.slice(elapsed, next);
                let before = tissues.total_load();
                tissues.load_segment(&slice, &converter);
                if replay.offgassing_start.is_none() && tissues.total_load() < before {
                    replay.offgassing_start = Some((time + elapsed, slice.start_depth));
                }
                elapsed = next;
            }
            time += segment.duration;

            replay.surface_gradient = replay
                .surface_gradient
                .max(tissues.surface_gradient(surface));
            if flags.collect_saturation {
                let ambient = converter.to_bar(segment.end_depth);
                replay.over_pressures.push(tissues.over_pressures(ambient));
            }
        }

        replay
    }
}
