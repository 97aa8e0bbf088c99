//! Warnings collected along a profile. They never stop the calculation.

use alloc::collections::BTreeSet;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::algorithm::CalculatedProfile;
use crate::ceiling::max_ceiling;
use crate::gas::{Gas, MIN_PPO2};
use crate::options::Options;
use crate::segments::{DEPTH_TOLERANCE, Segment};
use crate::tank::TankId;
use crate::tissue::Tissues;

const BROKEN_CEILING_TOLERANCE: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EventType {
    GasSwitch,
    SafetyStopStart,
    /// No tank can be breathed at the depth during the ascent.
    NoSuitableGas,
    LowPpO2,
    HighPpO2,
    HighAscentSpeed,
    HighDescentSpeed,
    BrokenCeiling,
    /// Isobaric counter diffusion risk.
    SwitchToHigherN2,
    MaxEndExceeded,
    HighGasDensity,
    NoDecoEnd,
    MissingDecoGas,
    NotEnoughGas,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Event {
    pub event_type: EventType,
    /// Seconds from the start of the dive.
    pub timestamp: f64,
    pub depth: f64,
    pub gas: Option<Gas>,
    pub message: Option<String>,
}

impl Event {
    pub fn new(event_type: EventType, timestamp: f64, depth: f64) -> Self {
        Event {
            event_type,
            timestamp,
            depth,
            gas: None,
            message: None,
        }
    }

    pub fn with_gas(mut self, gas: Gas) -> Self {
        self.gas = Some(gas);
        self
    }

    pub fn with_message(mut self, message: String) -> Self {
        self.message = Some(message);
        self
    }
}

/// Which events reach the consumer.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EventOptions {
    pub max_gas_density: f64, // g/l
    pub ignored: Vec<EventType>,
}

impl EventOptions {
    pub fn ignore(mut self, event_type: EventType) -> Self {
        if !self.ignored.contains(&event_type) {
            self.ignored.push(event_type);
        }
        self
    }

    pub fn is_ignored(&self, event_type: EventType) -> bool {
        self.ignored.contains(&event_type)
    }
}

impl Default for EventOptions {
    fn default() -> Self {
        EventOptions {
            max_gas_density: 5.5,
            ignored: Vec::new(),
        }
    }
}

/// Events ordered by timestamp, insertion order kept for equal timestamps.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Events {
    items: Vec<Event>,
}

impl Events {
    pub fn new() -> Self {
        Events { items: Vec::new() }
    }

    pub fn add(&mut self, event: Event) {
        let index = self
            .items
            .partition_point(|existing| existing.timestamp <= event.timestamp);
        self.items.insert(index, event);
    }

    pub fn merge(&mut self, other: Events) {
        for event in other.items {
            self.add(event);
        }
    }

    /// Copy without the events the consumer chose to ignore.
    pub fn filtered(&self, options: &EventOptions) -> Events {
        Events {
            items: self
                .items
                .iter()
                .filter(|event| !options.is_ignored(event.event_type))
                .cloned()
                .collect(),
        }
    }

    pub fn contains(&self, event_type: EventType) -> bool {
        self.items.iter().any(|event| event.event_type == event_type)
    }

    pub fn count(&self, event_type: EventType) -> usize {
        self.items
            .iter()
            .filter(|event| event.event_type == event_type)
            .count()
    }

    pub fn iter(&self) -> core::slice::Iter<'_, Event> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn as_slice(&self) -> &[Event] {
        &self.items
    }

    pub fn into_vec(self) -> Vec<Event> {
        self.items
    }
}

/// Looks for physiological issues along a calculated profile.
pub struct ProfileEvents<'a> {
    profile: &'a CalculatedProfile,
    options: &'a Options,
    event_options: &'a EventOptions,
    events: Events,
}

// reports a condition once when it starts, again only after it was resolved
#[derive(Default)]
struct Streak {
    active: bool,
}

impl Streak {
    fn starts(&mut self, condition: bool) -> bool {
        let starts = condition && !self.active;
        self.active = condition;
        starts
    }
}

impl<'a> ProfileEvents<'a> {
    pub fn analyze(
        profile: &'a CalculatedProfile,
        initial_tissues: &Tissues,
        options: &'a Options,
        event_options: &'a EventOptions,
    ) -> Events {
        let mut analyzer = ProfileEvents {
            profile,
            options,
            event_options,
            events: Events::new(),
        };
        analyzer.check_segments(initial_tissues);
        analyzer.check_missing_deco_gas();
        analyzer.events
    }

    fn add(&mut self, event_type: EventType, timestamp: f64, depth: f64, gas: Gas) {
        self.events
            .add(Event::new(event_type, timestamp, depth).with_gas(gas));
    }

    fn check_segments(&mut self, initial_tissues: &Tissues) {
        let converter = self.options.depth_converter();
        let mut tissues = *initial_tissues;
        let mut low_ppo2 = Streak::default();
        let mut high_ppo2 = Streak::default();
        let mut narcotic = Streak::default();
        let mut density = Streak::default();
        let mut broken_ceiling = Streak::default();
        let mut previous: Option<Segment> = None;

        let timeline: Vec<(f64, Segment)> = self
            .profile
            .segments
            .with_start_times()
            .map(|(start, segment)| (start, *segment))
            .collect();

        for (index, (start, segment)) in timeline.into_iter().enumerate() {
            let end = start + segment.duration;
            let gas = segment.gas;
            let shallow = segment.start_depth.min(segment.end_depth);
            let deep = segment.max_depth();

            if let Some(previous) = previous {
                if previous.tank_id != segment.tank_id {
                    self.check_counter_diffusion(&previous.gas, &gas, start, segment.start_depth);
                }
            }

            if low_ppo2.starts(gas.ppo2(shallow, &converter) < MIN_PPO2) {
                self.add(EventType::LowPpO2, start, shallow, gas);
            }

            let ppo2_limit = if index < self.profile.bottom_segments {
                self.options.max_ppo2
            } else {
                self.options.max_deco_ppo2
            };
            if high_ppo2.starts(gas.ppo2(deep, &converter) > ppo2_limit + DEPTH_TOLERANCE) {
                self.add(EventType::HighPpO2, start, deep, gas);
            }

            let end_depth = gas.end(deep, self.options.oxygen_narcotic, &converter);
            if narcotic.starts(end_depth > self.options.max_end + DEPTH_TOLERANCE) {
                self.events.add(
                    Event::new(EventType::MaxEndExceeded, start, deep)
                        .with_gas(gas)
                        .with_message(format!("END {} m", libm::round(end_depth))),
                );
            }

            if density.starts(gas.density(deep, &converter) > self.event_options.max_gas_density) {
                self.add(EventType::HighGasDensity, start, deep, gas);
            }

            let speed = segment.speed();
            if segment.is_ascent() && -speed > self.options.ascent_speed_50perc + DEPTH_TOLERANCE {
                self.add(EventType::HighAscentSpeed, start, segment.start_depth, gas);
            }
            if segment.is_descent() && speed > self.options.descent_speed + DEPTH_TOLERANCE {
                self.add(EventType::HighDescentSpeed, start, segment.start_depth, gas);
            }

            tissues.load_segment(&segment, &converter);
            let (ceiling, _) = max_ceiling(self.options.gf_high, &tissues, &converter);
            if broken_ceiling.starts(ceiling > segment.end_depth + BROKEN_CEILING_TOLERANCE) {
                self.add(EventType::BrokenCeiling, end, segment.end_depth, gas);
            }

            previous = Some(segment);
        }
    }

    // rule of fifths: nitrogen may rise by at most a fifth of the helium drop
    fn check_counter_diffusion(&mut self, from: &Gas, to: &Gas, timestamp: f64, depth: f64) {
        let n2_increase = to.f_n2() - from.f_n2();
        let he_decrease = from.f_he - to.f_he;
        if n2_increase > DEPTH_TOLERANCE
            && he_decrease > DEPTH_TOLERANCE
            && n2_increase > he_decrease / 5.0
        {
            self.add(EventType::SwitchToHigherN2, timestamp, depth, *to);
        }
    }

    fn check_missing_deco_gas(&mut self) {
        if !self.profile.decompression_required() {
            return;
        }

        let used: BTreeSet<TankId> = self
            .profile
            .segments
            .iter()
            .map(|segment| segment.tank_id)
            .collect();
        if used.len() > 1 {
            return;
        }

        if let Some(start) = self.profile.ascent_start() {
            let depth = self.profile.segments.get(self.profile.bottom_segments.saturating_sub(1));
            let depth = depth.map_or(0.0, |segment| segment.end_depth);
            self.events
                .add(Event::new(EventType::MissingDecoGas, start, depth));
        }
    }
}
