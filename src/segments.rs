//! Legs of a dive and the contiguous path they form.

use alloc::vec::Vec;
use libm::fabs;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::MINUTE;
use crate::gas::Gas;
use crate::options::Options;
use crate::tank::{Tank, TankId};

/// Two depths closer than this are the same depth.
pub const DEPTH_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Segment {
    pub start_depth: f64, // m
    pub end_depth: f64,   // m
    pub duration: f64,    // s
    pub tank_id: TankId,
    pub gas: Gas,
}

impl Segment {
    pub fn new(start_depth: f64, end_depth: f64, tank: &Tank, duration: f64) -> Self {
        Segment {
            start_depth,
            end_depth,
            duration,
            tank_id: tank.id,
            gas: tank.gas,
        }
    }

    pub fn is_flat(&self) -> bool {
        fabs(self.end_depth - self.start_depth) < DEPTH_TOLERANCE
    }

    pub fn is_ascent(&self) -> bool {
        self.end_depth < self.start_depth - DEPTH_TOLERANCE
    }

    pub fn is_descent(&self) -> bool {
        self.end_depth > self.start_depth + DEPTH_TOLERANCE
    }

    /// Vertical speed in m/min, positive while descending.
    pub fn speed(&self) -> f64 {
        if self.duration <= 0.0 {
            return 0.0;
        }
        (self.end_depth - self.start_depth) / (self.duration / MINUTE)
    }

    pub fn average_depth(&self) -> f64 {
        (self.start_depth + self.end_depth) / 2.0
    }

    pub fn max_depth(&self) -> f64 {
        self.start_depth.max(self.end_depth)
    }

    /// Depth reached `elapsed` seconds into the segment.
    pub fn depth_at(&self, elapsed: f64) -> f64 {
        if self.duration <= 0.0 {
            return self.end_depth;
        }
        let ratio = (elapsed / self.duration).clamp(0.0, 1.0);
        self.start_depth + (self.end_depth - self.start_depth) * ratio
    }

    /// Portion of the segment between two offsets (s).
    pub fn slice(&self, from: f64, to: f64) -> Segment {
        Segment {
            start_depth: self.depth_at(from),
            end_depth: self.depth_at(to),
            duration: to - from,
            ..*self
        }
    }

    fn continues_with(&self, next: &Segment) -> bool {
        if self.tank_id != next.tank_id || !self.gas.same_content(&next.gas) {
            return false;
        }
        if fabs(self.end_depth - next.start_depth) >= DEPTH_TOLERANCE {
            return false;
        }
        if self.is_flat() && next.is_flat() {
            return true;
        }
        self.is_ascent() && next.is_ascent() && fabs(self.speed() - next.speed()) < DEPTH_TOLERANCE
    }
}

/// Ordered segments where each one starts at the depth the previous one ended.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Segments {
    items: Vec<Segment>,
}

impl Segments {
    pub fn new() -> Self {
        Segments { items: Vec::new() }
    }

    pub fn from_vec(items: Vec<Segment>) -> Self {
        Segments { items }
    }

    pub fn add(&mut self, start_depth: f64, end_depth: f64, tank: &Tank, duration: f64) -> &Segment {
        self.push(Segment::new(start_depth, end_depth, tank, duration))
    }

    /// Continues from the current depth to `end_depth`.
    pub fn add_change_to(&mut self, end_depth: f64, tank: &Tank, duration: f64) -> &Segment {
        let start_depth = self.current_depth();
        self.add(start_depth, end_depth, tank, duration)
    }

    /// Stays at the current depth.
    pub fn add_flat(&mut self, tank: &Tank, duration: f64) -> &Segment {
        let depth = self.current_depth();
        self.add(depth, depth, tank, duration)
    }

    pub fn push(&mut self, segment: Segment) -> &Segment {
        self.items.push(segment);
        let last = self.items.len() - 1;
        &self.items[last]
    }

    /// Extends the last segment when the new one continues it with the same gas,
    /// otherwise appends.
    pub fn add_or_merge(&mut self, segment: Segment) {
        if let Some(last) = self.items.last_mut() {
            if last.continues_with(&segment) {
                last.end_depth = segment.end_depth;
                last.duration += segment.duration;
                return;
            }
        }
        self.items.push(segment);
    }

    pub fn remove(&mut self, index: usize) -> Option<Segment> {
        if index < self.items.len() {
            Some(self.items.remove(index))
        } else {
            None
        }
    }

    pub fn last(&self) -> Option<&Segment> {
        self.items.last()
    }

    pub fn last_mut(&mut self) -> Option<&mut Segment> {
        self.items.last_mut()
    }

    pub fn get(&self, index: usize) -> Option<&Segment> {
        self.items.get(index)
    }

    pub fn iter(&self) -> core::slice::Iter<'_, Segment> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> core::slice::IterMut<'_, Segment> {
        self.items.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn as_slice(&self) -> &[Segment] {
        &self.items
    }

    pub fn into_vec(self) -> Vec<Segment> {
        self.items
    }

    /// End depth of the last segment, surface when empty.
    pub fn current_depth(&self) -> f64 {
        self.items.last().map_or(0.0, |segment| segment.end_depth)
    }

    /// Total duration (s).
    pub fn duration(&self) -> f64 {
        self.items.iter().map(|segment| segment.duration).sum()
    }

    pub fn max_depth(&self) -> f64 {
        self.items
            .iter()
            .map(Segment::max_depth)
            .fold(0.0, f64::max)
    }

    /// Time weighted average depth (m).
    pub fn average_depth(&self) -> f64 {
        let duration = self.duration();
        if duration <= 0.0 {
            return 0.0;
        }
        let weighted: f64 = self
            .items
            .iter()
            .map(|segment| segment.average_depth() * segment.duration)
            .sum();
        weighted / duration
    }

    /// Index of the first segment not starting where the previous one ended.
    pub fn first_gap(&self) -> Option<usize> {
        self.items
            .windows(2)
            .position(|pair| fabs(pair[0].end_depth - pair[1].start_depth) >= DEPTH_TOLERANCE)
            .map(|index| index + 1)
    }

    pub fn is_contiguous(&self) -> bool {
        self.first_gap().is_none()
    }

    /// Depth at `time` (s) from the beginning of the dive, the last depth after the end.
    pub fn depth_at_time(&self, time: f64) -> f64 {
        for (start, segment) in self.with_start_times() {
            if time <= start + segment.duration {
                return segment.depth_at(time - start);
            }
        }
        self.current_depth()
    }

    /// Segments paired with their start time (s) from the beginning of the dive.
    pub fn with_start_times(&self) -> impl Iterator<Item = (f64, &Segment)> {
        self.items.iter().scan(0.0, |time, segment| {
            let start = *time;
            *time += segment.duration;
            Some((start, segment))
        })
    }
}

impl From<Vec<Segment>> for Segments {
    fn from(items: Vec<Segment>) -> Self {
        Segments::from_vec(items)
    }
}

impl<'a> IntoIterator for &'a Segments {
    type Item = &'a Segment;
    type IntoIter = core::slice::Iter<'a, Segment>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Builds the planned part of simple dives.
pub struct SegmentsFactory;

impl SegmentsFactory {
    /// Time (s) to reach `depth` from the surface.
    pub fn descent_duration(depth: f64, options: &Options) -> f64 {
        depth.max(0.0) * MINUTE / options.descent_speed
    }

    /// Descent to `target_depth` and a bottom segment filling the rest of `duration` (s).
    /// The bottom segment is dropped when the descent alone takes longer.
    pub fn create_for_plan(
        target_depth: f64,
        duration: f64,
        tank: &Tank,
        options: &Options,
    ) -> Segments {
        let mut segments = Segments::new();
        let descent = Self::descent_duration(target_depth, options);
        if descent > 0.0 {
            segments.add(0.0, target_depth, tank, descent);
        }

        let bottom = duration - descent;
        if bottom > 0.0 || segments.is_empty() {
            segments.add(target_depth, target_depth, tank, bottom.max(0.0));
        }

        segments
    }
}
