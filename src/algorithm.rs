//! Ascent planning: loads the planned segments and schedules the stops needed to surface.

use alloc::format;
use alloc::vec::Vec;
use libm::ceil;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::MINUTE;
use crate::ceiling::{GradientFactors, max_ceiling, round_to_stop};
use crate::depth_converter::DepthConverter;
use crate::error::PlanningError;
use crate::events::{Event, EventType, Events};
use crate::options::{Options, SAFETY_STOP_DURATION};
use crate::segments::{DEPTH_TOLERANCE, Segment, Segments};
use crate::tank::{Tank, Tanks};
use crate::tissue::Tissues;

/// Length of one stop increment (s).
pub const STOP_TICK: f64 = MINUTE;

/// Upper bound of stop ticks, a full day of decompression.
pub const MAX_STOP_TICKS: usize = 24 * 60;

// every ascent step is a move, a gas switch or a stop tick
const MAX_ASCENT_STEPS: usize = 2 * MAX_STOP_TICKS;

/// Longest planned part of a dive (s), a full day like the stop bound.
pub const MAX_PLAN_DURATION: f64 = MAX_STOP_TICKS as f64 * STOP_TICK;

/// Ceiling depth (m) at a time (s) from the start of the dive.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Ceiling {
    pub time: f64,
    pub depth: f64,
}

/// Result of one planning run. Segments are unreliable when `errors` isn't empty.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CalculatedProfile {
    pub segments: Segments,
    pub ceilings: Vec<Ceiling>,
    /// Tissues at the end of the profile.
    pub tissues: Tissues,
    pub errors: Vec<PlanningError>,
    pub events: Events,
    /// Number of leading segments copied from the plan, the rest is the calculated ascent.
    pub bottom_segments: usize,
}

impl CalculatedProfile {
    fn from_errors(errors: Vec<PlanningError>, tissues: Tissues) -> Self {
        CalculatedProfile {
            segments: Segments::new(),
            ceilings: Vec::new(),
            tissues,
            errors,
            events: Events::new(),
            bottom_segments: 0,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Runtime (s).
    pub fn duration(&self) -> f64 {
        self.segments.duration()
    }

    pub fn max_depth(&self) -> f64 {
        self.segments.max_depth()
    }

    /// Time (s) the calculated ascent starts at.
    pub fn ascent_start(&self) -> Option<f64> {
        if self.bottom_segments == 0 {
            return None;
        }
        Some(
            self.segments
                .iter()
                .take(self.bottom_segments)
                .map(|segment| segment.duration)
                .sum(),
        )
    }

    /// The gfHigh ceiling left the surface before the ascent started.
    pub fn decompression_required(&self) -> bool {
        let Some(ascent_start) = self.ascent_start() else {
            return false;
        };
        self.ceilings
            .iter()
            .take_while(|ceiling| ceiling.time <= ascent_start + DEPTH_TOLERANCE)
            .any(|ceiling| ceiling.depth > 0.0)
    }

    pub fn ascent(&self) -> &[Segment] {
        let start = self.bottom_segments.min(self.segments.len());
        &self.segments.as_slice()[start..]
    }
}

/// Bühlmann ZH-L16C with gradient factors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuhlmannAlgorithm {
    options: Options,
    converter: DepthConverter,
}

impl BuhlmannAlgorithm {
    pub fn new(options: Options) -> Self {
        BuhlmannAlgorithm {
            converter: options.depth_converter(),
            options,
        }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn converter(&self) -> &DepthConverter {
        &self.converter
    }

    /// Input checks, every problem found is reported.
    pub fn validate(&self, segments: &Segments, tanks: &Tanks) -> Vec<PlanningError> {
        let mut errors = Vec::new();

        if let Err(err) = self.options.validate() {
            errors.push(PlanningError::InvalidOptions(err));
        }

        if tanks.is_empty() {
            errors.push(PlanningError::NoTanks);
        }
        for tank in tanks.iter() {
            if !tank.gas.is_valid() {
                errors.push(PlanningError::InvalidGas { tank: tank.id });
            }
        }
        if let Err(err) = tanks.validate_ids() {
            errors.push(err);
        }

        let Some(first) = segments.get(0) else {
            errors.push(PlanningError::NoSegments);
            return errors;
        };
        if libm::fabs(first.start_depth) >= DEPTH_TOLERANCE {
            errors.push(PlanningError::NotStartingAtSurface);
        }

        let mut planned_duration = 0.0;
        for (index, segment) in segments.iter().enumerate() {
            let valid = segment.start_depth.is_finite()
                && segment.end_depth.is_finite()
                && segment.duration.is_finite()
                && segment.start_depth >= 0.0
                && segment.end_depth >= 0.0
                && segment.duration >= 0.0;
            // reported once, on the segment crossing the limit
            let too_long = valid
                && planned_duration <= MAX_PLAN_DURATION
                && planned_duration + segment.duration > MAX_PLAN_DURATION;
            if valid {
                planned_duration += segment.duration;
            }
            if !valid || too_long {
                errors.push(PlanningError::InvalidSegment { segment: index });
            }
            if tanks.get(segment.tank_id).is_none() {
                errors.push(PlanningError::UnknownTank {
                    segment: index,
                    tank: segment.tank_id,
                });
            }
        }

        if let Some(segment) = segments.first_gap() {
            errors.push(PlanningError::NonContiguousSegments { segment });
        }

        errors
    }

    /// Loads the planned segments and appends the ascent with all required stops.
    ///
    /// Inputs are copied, nothing the caller passes in is modified.
    pub fn decompression(
        &self,
        segments: &Segments,
        tanks: &Tanks,
        tissues: &Tissues,
    ) -> CalculatedProfile {
        let errors = self.validate(segments, tanks);
        if !errors.is_empty() {
            warn!("Plan rejected with {} errors", errors.len());
            return CalculatedProfile::from_errors(errors, *tissues);
        }

        info!(
            "Planning {} segments with {} tanks",
            segments.len(),
            tanks.len()
        );

        let mut context = AlgorithmContext::new(self, tanks, *tissues, segments.average_depth());
        for segment in segments.iter() {
            // tank gas wins over a stale copy in the segment
            let mut planned = *segment;
            if let Some(tank) = tanks.get(segment.tank_id) {
                planned.gas = tank.gas;
                context.current_tank = tank.clone();
            }
            context.add_planned(planned);
        }
        let bottom_segments = context.segments.len();

        context.ascent(segments.max_depth());

        CalculatedProfile {
            segments: context.segments,
            ceilings: context.ceilings,
            tissues: context.tissues,
            errors: context.errors,
            events: context.events,
            bottom_segments,
        }
    }
}

struct AlgorithmContext<'a> {
    options: &'a Options,
    converter: DepthConverter,
    tanks: &'a Tanks,
    tissues: Tissues,
    segments: Segments,
    ceilings: Vec<Ceiling>,
    events: Events,
    errors: Vec<PlanningError>,
    gradients: GradientFactors,
    current_tank: Tank,
    runtime: f64,
    average_depth: f64,
    // time spent at the current depth since the last move (s)
    stop_time: f64,
    planned_segments: usize,
    no_suitable_gas_reported: bool,
}

impl<'a> AlgorithmContext<'a> {
    fn new(
        algorithm: &'a BuhlmannAlgorithm,
        tanks: &'a Tanks,
        tissues: Tissues,
        average_depth: f64,
    ) -> Self {
        let options = &algorithm.options;
        AlgorithmContext {
            options,
            converter: algorithm.converter,
            tanks,
            tissues,
            segments: Segments::new(),
            ceilings: Vec::new(),
            events: Events::new(),
            errors: Vec::new(),
            gradients: GradientFactors::new(options.gf_low, options.gf_high),
            current_tank: tanks.first().cloned().unwrap_or_default(),
            runtime: 0.0,
            average_depth,
            stop_time: 0.0,
            planned_segments: 0,
            no_suitable_gas_reported: false,
        }
    }

    fn current_depth(&self) -> f64 {
        self.segments.current_depth()
    }

    fn ceiling_at(&self, tissues: &Tissues, depth: f64) -> f64 {
        max_ceiling(self.gradients.gradient_at(depth), tissues, &self.converter).0
    }

    // loads in slices of at most one tick so the ceiling history stays dense
    fn load(&mut self, segment: &Segment) {
        let mut elapsed = 0.0;
        while elapsed < segment.duration {
            let next = (elapsed + STOP_TICK).min(segment.duration);
            let slice = segment.slice(elapsed, next);
            self.tissues.load_segment(&slice, &self.converter);
            self.runtime += slice.duration;
            let ceiling = self.ceiling_at(&self.tissues, slice.end_depth);
            self.ceilings.push(Ceiling {
                time: self.runtime,
                depth: ceiling,
            });
            elapsed = next;
        }
    }

    fn add_planned(&mut self, segment: Segment) {
        self.load(&segment);
        self.segments.push(segment);
        self.planned_segments = self.segments.len();
    }

    fn add_calculated(&mut self, segment: Segment) {
        self.load(&segment);
        if segment.is_flat() {
            self.stop_time += segment.duration;
        } else {
            self.stop_time = 0.0;
        }
        // planned segments stay as given
        if self.segments.len() > self.planned_segments {
            self.segments.add_or_merge(segment);
        } else {
            self.segments.push(segment);
        }
    }

    fn ascent(&mut self, max_depth: f64) {
        let (first_ceiling, _) =
            max_ceiling(self.options.gf_low, &self.tissues, &self.converter);
        let first_stop = round_to_stop(first_ceiling, self.options.deco_stop_distance);
        self.gradients.anchor(first_stop);
        debug!("First stop at {} m", first_stop);

        let safety_stop = self.options.safety_stop_required(max_depth);
        let mut safety_stop_started = false;
        let mut stop_ticks = 0;
        let mut exhausted = MAX_ASCENT_STEPS;
        self.stop_time = 0.0;

        for _ in 0..MAX_ASCENT_STEPS {
            let depth = self.current_depth();
            if depth <= DEPTH_TOLERANCE {
                return;
            }

            if self.switch_gas(depth) {
                continue;
            }

            let next_stop = self.next_stop(depth);
            let at_last_stop = libm::fabs(depth - self.options.last_stop_depth) < DEPTH_TOLERANCE;
            if safety_stop && at_last_stop && !safety_stop_started {
                safety_stop_started = true;
                self.events
                    .add(Event::new(EventType::SafetyStopStart, self.runtime, depth));
            }

            if self.can_ascend(depth, next_stop) {
                if safety_stop && at_last_stop && self.stop_time < SAFETY_STOP_DURATION {
                    let remaining = SAFETY_STOP_DURATION - self.stop_time;
                    self.add_calculated(self.flat(depth, remaining));
                    continue;
                }
                self.leave_stop(depth);
                self.ascend(depth, next_stop);
                continue;
            }

            stop_ticks += 1;
            if stop_ticks > MAX_STOP_TICKS {
                exhausted = MAX_STOP_TICKS;
                break;
            }
            self.add_calculated(self.flat(depth, STOP_TICK));
        }

        warn!("Ascent did not reach the surface within {} steps", exhausted);
        self.errors
            .push(PlanningError::NonConvergence { steps: exhausted });
    }

    fn flat(&self, depth: f64, duration: f64) -> Segment {
        Segment::new(depth, depth, &self.current_tank, duration)
    }

    fn next_stop(&self, depth: f64) -> f64 {
        let last_stop = self.options.last_stop_depth;
        if depth <= last_stop + DEPTH_TOLERANCE {
            return 0.0;
        }
        let distance = self.options.deco_stop_distance;
        (round_to_stop(depth, distance) - distance).max(last_stop)
    }

    fn ascent_segment(&self, depth: f64, target: f64) -> Segment {
        let speed = self.options.ascent_speed(depth, self.average_depth);
        let duration = (depth - target) * MINUTE / speed;
        Segment::new(depth, target, &self.current_tank, duration)
    }

    fn can_ascend(&self, depth: f64, target: f64) -> bool {
        let segment = self.ascent_segment(depth, target);
        let tissues = self.tissues.with_segment(&segment, &self.converter);
        self.ceiling_at(&tissues, target) <= target + DEPTH_TOLERANCE
    }

    fn ascend(&mut self, depth: f64, target: f64) {
        let segment = self.ascent_segment(depth, target);
        self.add_calculated(segment);
    }

    // a stop held for a while ends on a whole minute of runtime when requested
    fn leave_stop(&mut self, depth: f64) {
        if self.stop_time <= 0.0 {
            return;
        }
        if self.options.round_stops_to_minutes {
            let rounded = ceil(self.runtime / MINUTE - DEPTH_TOLERANCE) * MINUTE;
            let remaining = rounded - self.runtime;
            if remaining > DEPTH_TOLERANCE {
                self.add_calculated(self.flat(depth, remaining));
            }
        }
        debug!("Leaving stop at {} m after {} s", depth, self.stop_time);
    }

    fn switch_gas(&mut self, depth: f64) -> bool {
        let current_breathable = self.options.is_breathable(
            &self.current_tank.gas,
            depth,
            self.options.max_deco_ppo2,
            &self.converter,
        );

        let candidate = self
            .tanks
            .best_gas(depth, self.options, &self.converter)
            .filter(|tank| tank.id != self.current_tank.id)
            .cloned();

        let Some(tank) = candidate else {
            self.report_unsuitable_gas(depth, current_breathable);
            return false;
        };
        // a breathable gas is only replaced by a richer one
        if current_breathable && tank.gas.f_o2 <= self.current_tank.gas.f_o2 {
            return false;
        }

        debug!("Switching to tank {} at {} m", tank.id, depth);
        self.events.add(
            Event::new(EventType::GasSwitch, self.runtime, depth)
                .with_gas(tank.gas)
                .with_message(format!("Switch to {}", tank.gas.name())),
        );
        self.current_tank = tank;
        if self.options.gas_switch_duration > 0.0 {
            self.add_calculated(self.flat(depth, self.options.gas_switch_duration));
        }
        true
    }

    fn report_unsuitable_gas(&mut self, depth: f64, current_breathable: bool) {
        if current_breathable || self.no_suitable_gas_reported {
            return;
        }
        let gas = self.current_tank.gas;
        let hypoxic = gas.ceiling(&self.converter) > depth + DEPTH_TOLERANCE;
        let toxic = gas.ppo2(depth, &self.converter) > self.options.max_deco_ppo2 + DEPTH_TOLERANCE;
        if hypoxic || toxic {
            self.no_suitable_gas_reported = true;
            self.events.add(
                Event::new(EventType::NoSuitableGas, self.runtime, depth).with_gas(gas),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segments::SegmentsFactory;
    use alloc::vec;

    #[test]
    fn test_invalid_input_returns_errors() {
        let algorithm = BuhlmannAlgorithm::new(Options::default());
        let tank = Tank::default();
        let segments = Segments::from_vec(vec![
            Segment::new(0.0, 10.0, &tank, 60.0),
            Segment::new(12.0, 12.0, &tank, 60.0),
        ]);
        let profile = algorithm.decompression(&segments, &Tanks::new(), &Tissues::default());

        assert!(!profile.is_valid());
        assert!(profile.segments.is_empty());
        assert!(profile.errors.contains(&PlanningError::NoTanks));
        assert!(
            profile
                .errors
                .contains(&PlanningError::NonContiguousSegments { segment: 1 })
        );
    }

    #[test]
    fn test_short_dive_surfaces() {
        let options = Options::default();
        let tanks = Tanks::from_vec(vec![Tank::default()]);
        let tank = tanks.first().cloned().unwrap_or_default();
        let segments = SegmentsFactory::create_for_plan(12.0, 10.0 * 60.0, &tank, &options);

        let profile = BuhlmannAlgorithm::new(options).decompression(
            &segments,
            &tanks,
            &Tissues::default(),
        );
        assert!(profile.is_valid());
        assert_eq!(profile.segments.current_depth(), 0.0);
        assert!(profile.segments.is_contiguous());
        assert!(profile.events.contains(EventType::SafetyStopStart));
    }

    #[test]
    fn test_next_stop_rounding() {
        let options = Options::default();
        let tanks = Tanks::from_vec(vec![Tank::default()]);
        let algorithm = BuhlmannAlgorithm::new(options);
        let context = AlgorithmContext::new(&algorithm, &tanks, Tissues::default(), 20.0);
        assert_eq!(context.next_stop(31.0), 30.0);
        assert_eq!(context.next_stop(30.0), 27.0);
        assert_eq!(context.next_stop(4.0), 3.0);
        assert_eq!(context.next_stop(3.0), 0.0);
    }
}
