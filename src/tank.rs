//! Cylinders and their gas inventory.

use alloc::vec::Vec;
use core::cmp::Ordering;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::depth_converter::DepthConverter;
use crate::error::PlanningError;
use crate::gas::Gas;
use crate::options::Options;

/// Tank identity, contiguous from 1 within a dive.
pub type TankId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TankRole {
    Primary,
    Stage,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Tank {
    pub id: TankId,
    pub gas: Gas,
    /// Water volume (l).
    pub size: f64,
    /// Rated filling pressure (bar).
    pub working_pressure: f64,
    /// Filled pressure at the start of the dive (bar).
    pub start_pressure: f64,
    /// Computed by the consumption calculator (bar), not an input.
    pub consumed: f64,
    /// Computed by the consumption calculator (bar), not an input.
    pub reserve: f64,
}

impl Tank {
    pub fn new(size: f64, start_pressure: f64, gas: Gas) -> Self {
        Tank {
            id: 0,
            gas,
            size,
            working_pressure: start_pressure,
            start_pressure,
            consumed: 0.0,
            reserve: 0.0,
        }
    }

    pub fn with_id(mut self, id: TankId) -> Self {
        self.id = id;
        self
    }

    /// Gas volume (l) at surface pressure.
    pub fn volume(&self) -> f64 {
        self.size * self.start_pressure
    }

    pub fn end_pressure(&self) -> f64 {
        (self.start_pressure - self.consumed).max(0.0)
    }

    pub fn end_volume(&self) -> f64 {
        self.end_pressure() * self.size
    }

    pub fn consumed_volume(&self) -> f64 {
        self.consumed * self.size
    }

    pub fn reserve_volume(&self) -> f64 {
        self.reserve * self.size
    }

    pub fn has_enough_gas(&self) -> bool {
        self.start_pressure - self.consumed >= self.reserve
    }

    pub fn reset_consumption(&mut self) {
        self.consumed = 0.0;
        self.reserve = 0.0;
    }
}

impl Default for Tank {
    fn default() -> Self {
        Tank::new(15.0, 200.0, Gas::air()).with_id(1)
    }
}

/// The tank inventory of one dive.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Tanks {
    items: Vec<Tank>,
}

impl Tanks {
    pub fn new() -> Self {
        Tanks { items: Vec::new() }
    }

    /// Keeps the given order, ids are reassigned from 1.
    pub fn from_vec(items: Vec<Tank>) -> Self {
        let mut tanks = Tanks { items };
        tanks.renumber();
        tanks
    }

    /// Takes the tanks as they are, ids included.
    pub fn from_numbered(items: Vec<Tank>) -> Self {
        Tanks { items }
    }

    pub fn add(&mut self, tank: Tank) -> TankId {
        self.items.push(tank);
        self.renumber();
        self.items.len()
    }

    pub fn remove(&mut self, id: TankId) -> Option<Tank> {
        let index = self.items.iter().position(|tank| tank.id == id)?;
        let removed = self.items.remove(index);
        self.renumber();
        Some(removed)
    }

    pub fn renumber(&mut self) {
        for (index, tank) in self.items.iter_mut().enumerate() {
            tank.id = index + 1;
        }
    }

    /// Ids have to be unique and run from 1 to the number of tanks, in any order.
    pub fn validate_ids(&self) -> Result<(), PlanningError> {
        for (index, tank) in self.items.iter().enumerate() {
            if self.items[..index].iter().any(|other| other.id == tank.id) {
                return Err(PlanningError::DuplicateTank { tank: tank.id });
            }
        }
        let count = self.items.len();
        match self.items.iter().find(|tank| tank.id == 0 || tank.id > count) {
            Some(tank) => Err(PlanningError::NonContiguousTanks { tank: tank.id }),
            None => Ok(()),
        }
    }

    pub fn get(&self, id: TankId) -> Option<&Tank> {
        self.items.iter().find(|tank| tank.id == id)
    }

    pub fn get_mut(&mut self, id: TankId) -> Option<&mut Tank> {
        self.items.iter_mut().find(|tank| tank.id == id)
    }

    pub fn first(&self) -> Option<&Tank> {
        self.items.first()
    }

    pub fn role(&self, id: TankId) -> TankRole {
        match self.first() {
            Some(first) if first.id == id => TankRole::Primary,
            _ => TankRole::Stage,
        }
    }

    pub fn iter(&self) -> core::slice::Iter<'_, Tank> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> core::slice::IterMut<'_, Tank> {
        self.items.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn as_slice(&self) -> &[Tank] {
        &self.items
    }

    pub fn reset_consumption(&mut self) {
        self.items.iter_mut().for_each(Tank::reset_consumption);
    }

    /// The tank with the best gas breathable at depth.
    ///
    /// Richest oxygen wins, then the least narcotic mix, then the lower id.
    pub fn best_gas(
        &self,
        depth: f64,
        options: &Options,
        converter: &DepthConverter,
    ) -> Option<&Tank> {
        self.items
            .iter()
            .filter(|tank| options.is_breathable(&tank.gas, depth, options.max_deco_ppo2, converter))
            .min_by(|left, right| {
                compare_richness(&left.gas, &right.gas).then(left.id.cmp(&right.id))
            })
    }
}

// richer gas orders first
fn compare_richness(left: &Gas, right: &Gas) -> Ordering {
    right
        .f_o2
        .total_cmp(&left.f_o2)
        .then(left.f_n2().total_cmp(&right.f_n2()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gas::StandardGases;
    use alloc::vec;

    #[test]
    fn test_ids_stay_contiguous() {
        let mut tanks = Tanks::new();
        tanks.add(Tank::default());
        tanks.add(Tank::new(11.0, 200.0, StandardGases::EAN50));
        tanks.add(Tank::new(7.0, 200.0, StandardGases::OXYGEN));

        let removed = tanks.remove(2).map(|tank| tank.gas);
        assert_eq!(removed, Some(StandardGases::EAN50));
        let ids: alloc::vec::Vec<TankId> = tanks.iter().map(|tank| tank.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(tanks.get(2).map(|tank| tank.gas), Some(StandardGases::OXYGEN));
    }

    #[test]
    fn test_end_pressure_and_reserve() {
        let mut tank = Tank::default();
        tank.consumed = 120.0;
        tank.reserve = 60.0;
        assert_eq!(tank.end_pressure(), 80.0);
        assert!(tank.has_enough_gas());
        tank.consumed = 150.0;
        assert!(!tank.has_enough_gas());
        assert_eq!(tank.volume(), 3000.0);
    }

    #[test]
    fn test_best_gas_prefers_richest_within_limits() {
        let tanks = Tanks::from_vec(vec![
            Tank::default(),
            Tank::new(11.0, 200.0, StandardGases::EAN50),
            Tank::new(7.0, 200.0, StandardGases::OXYGEN),
        ]);
        let options = Options::default();
        let converter = DepthConverter::default();

        let at_21 = tanks.best_gas(21.0, &options, &converter).map(|tank| tank.id);
        let at_5 = tanks.best_gas(5.0, &options, &converter).map(|tank| tank.id);
        let at_25 = tanks.best_gas(25.0, &options, &converter).map(|tank| tank.id);
        assert_eq!(at_21, Some(2));
        assert_eq!(at_5, Some(3));
        assert_eq!(at_25, Some(1));
        // air is too narcotic there
        assert!(tanks.best_gas(40.0, &options, &converter).is_none());
    }

    #[test]
    fn test_validate_ids() {
        let air = Tank::default();
        let ean50 = Tank::new(11.0, 200.0, StandardGases::EAN50);

        let numbered = Tanks::from_numbered(vec![ean50.clone().with_id(2), air.clone()]);
        assert_eq!(numbered.validate_ids(), Ok(()));

        let duplicate = Tanks::from_numbered(vec![air.clone(), ean50.clone().with_id(1)]);
        assert_eq!(duplicate.validate_ids(), Err(PlanningError::DuplicateTank { tank: 1 }));

        let gap = Tanks::from_numbered(vec![air, ean50.with_id(3)]);
        assert_eq!(gap.validate_ids(), Err(PlanningError::NonContiguousTanks { tank: 3 }));
    }
}
