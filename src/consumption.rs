//! Gas consumption, reserves and the time limits derived from them.

use alloc::vec::Vec;
use libm::{ceil, floor};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::MINUTE;
use crate::algorithm::{BuhlmannAlgorithm, CalculatedProfile};
use crate::depth_converter::DepthConverter;
use crate::events::{Event, EventType, Events};
use crate::options::{Diver, Options, ReservePolicy};
use crate::segments::{DEPTH_TOLERANCE, Segment, Segments};
use crate::tank::{TankId, Tanks};
use crate::tissue::Tissues;

/// Longest bottom time probed by the max bottom time search (min).
pub const MAX_BOTTOM_MINUTES: f64 = 1024.0;

// doubling and bisection each need at most log2(MAX_BOTTOM_MINUTES) + 1 probes
const MAX_SEARCH_STEPS: usize = 64;

/// Gas (bar, not rounded) used from a tank of `size` liters during the segment.
pub fn consumed_bars(segment: &Segment, size: f64, rmv: f64, converter: &DepthConverter) -> f64 {
    let average_pressure = converter.to_bar(segment.average_depth());
    average_pressure * segment.duration / MINUTE * rmv / size
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TankConsumption {
    pub id: TankId,
    pub consumed: f64, // bar
    pub reserve: f64,  // bar
    pub enough_gas: bool,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ConsumptionResult {
    /// Longest time (s) from leaving the surface to the start of the ascent with enough gas.
    pub max_bottom_time: f64,
    /// Emergency ascent duration (s) from the end of the planned segments.
    pub time_to_surface: f64,
    pub tanks: Vec<TankConsumption>,
    pub enough_gas: bool,
    pub short_tanks: Vec<TankId>,
    /// Only for dives on a single tank (bar).
    pub turn_pressure: Option<f64>,
    /// Only for dives on a single tank (s).
    pub turn_time: Option<f64>,
    pub events: Events,
}

pub struct GasConsumption {
    algorithm: BuhlmannAlgorithm,
    diver: Diver,
    reserve_policy: ReservePolicy,
}

impl GasConsumption {
    pub fn new(options: Options, diver: Diver, reserve_policy: ReservePolicy) -> Self {
        GasConsumption {
            algorithm: BuhlmannAlgorithm::new(options),
            diver,
            reserve_policy,
        }
    }

    fn converter(&self) -> &DepthConverter {
        self.algorithm.converter()
    }

    fn options(&self) -> &Options {
        self.algorithm.options()
    }

    /// Sets `consumed` (bar, rounded up) of every tank used by the segments.
    pub fn consumed_by_tanks(&self, segments: &[Segment], tanks: &mut Tanks) {
        self.add_consumption(segments, tanks, self.diver.rmv);
        for tank in tanks.iter_mut() {
            tank.consumed = ceil(tank.consumed);
        }
    }

    fn add_consumption(&self, segments: &[Segment], tanks: &mut Tanks, rmv: f64) {
        for segment in segments {
            if let Some(tank) = tanks.get_mut(segment.tank_id) {
                tank.consumed += consumed_bars(segment, tank.size, rmv, self.converter());
            }
        }
    }

    /// Planned segments, a problem solving stay at the last depth and the ascent from there.
    pub fn emergency_ascent(
        &self,
        planned: &Segments,
        tanks: &Tanks,
        tissues: &Tissues,
    ) -> CalculatedProfile {
        let mut segments = planned.clone();
        let duration = self.options().problem_solving_duration;
        let tank = planned
            .last()
            .and_then(|segment| tanks.get(segment.tank_id));
        if let Some(tank) = tank {
            if duration > 0.0 {
                segments.add_flat(tank, duration);
            }
        }
        self.algorithm.decompression(&segments, tanks, tissues)
    }

    /// Sets `reserve` (bar, rounded up) of every tank: gas for two stressed divers during the
    /// emergency ascent, at least the reserve policy minimum.
    pub fn reserve_by_tanks(
        &self,
        emergency: &CalculatedProfile,
        planned_segments: usize,
        tanks: &mut Tanks,
    ) {
        let mut needed = tanks.clone();
        needed.reset_consumption();
        let ascent = emergency
            .segments
            .as_slice()
            .get(planned_segments..)
            .unwrap_or(&[]);
        self.add_consumption(ascent, &mut needed, self.diver.team_stress_rmv());

        let roles: Vec<_> = tanks.iter().map(|tank| tanks.role(tank.id)).collect();
        for ((tank, role), needed) in tanks.iter_mut().zip(roles).zip(needed.iter()) {
            let minimum = self.reserve_policy.minimum(role, tank);
            tank.reserve = ceil(needed.consumed).max(minimum);
        }
    }

    /// Consumption and reserves of the plan, tanks are updated in place.
    ///
    /// `profile` is the calculated dive starting with the `planned` segments.
    pub fn calculate(
        &self,
        planned: &Segments,
        profile: &[Segment],
        tanks: &mut Tanks,
        tissues: &Tissues,
    ) -> ConsumptionResult {
        tanks.reset_consumption();
        let emergency = self.emergency_ascent(planned, tanks, tissues);
        self.consumed_by_tanks(profile, tanks);
        self.reserve_by_tanks(&emergency, planned.len(), tanks);

        let time_to_surface = (emergency.duration() - planned.duration()).max(0.0);
        let surfaced = profile
            .last()
            .is_some_and(|segment| segment.end_depth <= DEPTH_TOLERANCE);
        let enough_gas = surfaced
            && emergency.is_valid()
            && tanks.iter().all(|tank| tank.has_enough_gas());
        let short_tanks: Vec<TankId> = tanks
            .iter()
            .filter(|tank| !tank.has_enough_gas())
            .map(|tank| tank.id)
            .collect();

        let mut events = Events::new();
        let ascent_start = planned.duration();
        for id in &short_tanks {
            if let Some(tank) = tanks.get(*id) {
                events.add(
                    Event::new(EventType::NotEnoughGas, ascent_start, planned.current_depth())
                        .with_gas(tank.gas),
                );
            }
        }

        let (turn_pressure, turn_time) = if tanks.len() == 1 {
            self.turn(planned, tanks)
        } else {
            (None, None)
        };

        let max_bottom_time = self.max_bottom_time(planned, tanks, tissues);

        ConsumptionResult {
            max_bottom_time,
            time_to_surface,
            tanks: tanks
                .iter()
                .map(|tank| TankConsumption {
                    id: tank.id,
                    consumed: tank.consumed,
                    reserve: tank.reserve,
                    enough_gas: tank.has_enough_gas(),
                })
                .collect(),
            enough_gas,
            short_tanks,
            turn_pressure,
            turn_time,
            events,
        }
    }

    // rule of thirds on the gas above the reserve
    fn turn(&self, planned: &Segments, tanks: &Tanks) -> (Option<f64>, Option<f64>) {
        let Some(tank) = tanks.first() else {
            return (None, None);
        };
        let usable = (tank.start_pressure - tank.reserve).max(0.0);
        let third = floor(usable / 3.0);
        let turn_pressure = tank.start_pressure - third;

        let mut consumed = 0.0;
        for (start, segment) in planned.with_start_times() {
            let mut elapsed = 0.0;
            while elapsed < segment.duration {
                let next = (elapsed + MINUTE).min(segment.duration);
                let slice = segment.slice(elapsed, next);
                consumed += consumed_bars(&slice, tank.size, self.diver.rmv, self.converter());
                if consumed >= third {
                    return (Some(turn_pressure), Some(floor((start + next) / MINUTE) * MINUTE));
                }
                elapsed = next;
            }
        }

        (Some(turn_pressure), None)
    }

    fn enough_gas_for(&self, planned: &Segments, tanks: &Tanks, tissues: &Tissues) -> bool {
        let profile = self.algorithm.decompression(planned, tanks, tissues);
        if !profile.is_valid() {
            return false;
        }
        let mut tanks = tanks.clone();
        tanks.reset_consumption();
        let emergency = self.emergency_ascent(planned, &tanks, tissues);
        if !emergency.is_valid() {
            return false;
        }
        self.consumed_by_tanks(profile.segments.as_slice(), &mut tanks);
        self.reserve_by_tanks(&emergency, planned.len(), &mut tanks);
        tanks.iter().all(|tank| tank.has_enough_gas())
    }

    // the plan with its last flat segment lasting `minutes`
    fn with_bottom_minutes(planned: &Segments, minutes: f64) -> Segments {
        let mut segments = planned.clone();
        if let Some(last) = segments.last_mut() {
            last.duration = minutes * MINUTE;
        }
        segments
    }

    /// Longest bottom time (s) with enough gas including reserves, zero when even the shortest
    /// bottom runs out of gas.
    ///
    /// Only the last planned segment is prolonged, it has to be flat.
    pub fn max_bottom_time(&self, planned: &Segments, tanks: &Tanks, tissues: &Tissues) -> f64 {
        let Some(last) = planned.last() else {
            return 0.0;
        };
        if !last.is_flat() {
            return 0.0;
        }
        let prefix = planned.duration() - last.duration;
        let enough = |minutes: f64| {
            let segments = Self::with_bottom_minutes(planned, minutes);
            self.enough_gas_for(&segments, tanks, tissues)
        };

        if !enough(0.0) {
            return 0.0;
        }

        // low has enough gas, high doesn't
        let mut low = 0.0;
        let mut high = 1.0;
        let mut steps = 0;
        while steps < MAX_SEARCH_STEPS && enough(high) {
            low = high;
            if high >= MAX_BOTTOM_MINUTES {
                return prefix + MAX_BOTTOM_MINUTES * MINUTE;
            }
            high = (high * 2.0).min(MAX_BOTTOM_MINUTES);
            steps += 1;
        }

        while steps < MAX_SEARCH_STEPS && high - low > 1.0 {
            let middle = floor((low + high) / 2.0);
            if enough(middle) {
                low = middle;
            } else {
                high = middle;
            }
            steps += 1;
        }

        debug!("Max bottom time {} min after {} probes", low, steps);
        prefix + low * MINUTE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segments::SegmentsFactory;
    use crate::tank::Tank;
    use alloc::vec;
    use libm::fabs;

    #[test]
    fn test_consumed_bars_at_depth() {
        let tank = Tank::default();
        // 10 minutes at 4 bar breathing 20 l/min from 15 l
        let segment = Segment::new(30.0, 30.0, &tank, 600.0);
        let consumed = consumed_bars(&segment, tank.size, 20.0, &DepthConverter::simple());
        assert!(fabs(consumed - 4.0 * 10.0 * 20.0 / 15.0) < 1e-9);
    }

    #[test]
    fn test_reserve_respects_policy_minimum() {
        let options = Options::default();
        let mut tanks = Tanks::from_vec(vec![Tank::default()]);
        let tank = tanks.first().cloned().unwrap_or_default();
        let planned = SegmentsFactory::create_for_plan(6.0, 600.0, &tank, &options);
        let consumption = GasConsumption::new(options, Diver::default(), ReservePolicy::default());
        let emergency = consumption.emergency_ascent(&planned, &tanks, &Tissues::default());
        consumption.reserve_by_tanks(&emergency, planned.len(), &mut tanks);
        assert_eq!(tanks.first().map(|tank| tank.reserve), Some(30.0));
    }
}
