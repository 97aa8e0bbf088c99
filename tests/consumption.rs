use dive_planner_deco::{
    BuhlmannAlgorithm, Diver, EventType, Gas, Options, ReservePolicy, ReserveRule, SegmentsFactory,
    Tank, Tanks, Tissues, consumption::GasConsumption,
};

fn calculate(depth: f64, duration: f64, tanks: &mut Tanks) -> dive_planner_deco::ConsumptionResult {
    let options = Options::default();
    let tank = tanks.first().cloned().unwrap();
    let planned = SegmentsFactory::create_for_plan(depth, duration, &tank, &options);
    let tissues = Tissues::default();
    let profile = BuhlmannAlgorithm::new(options).decompression(&planned, tanks, &tissues);

    GasConsumption::new(options, Diver::default(), ReservePolicy::default()).calculate(
        &planned,
        profile.segments.as_slice(),
        tanks,
        &tissues,
    )
}

#[test]
fn test_single_tank_dive() {
    let mut tanks = Tanks::from_vec(vec![Tank::default()]);
    let result = calculate(30.0, 720.0, &mut tanks);

    assert_eq!(result.tanks.len(), 1);
    assert_eq!(result.tanks[0].consumed, 80.0);
    assert_eq!(result.tanks[0].reserve, 75.0);
    assert!(result.enough_gas);
    assert!(result.short_tanks.is_empty());
    assert!(result.events.is_empty());
    assert!((result.time_to_surface - 540.0).abs() < 1e-6);
    assert_eq!(result.max_bottom_time, 1180.0);

    // tanks are updated in place
    assert_eq!(tanks.first().map(|tank| tank.end_pressure()), Some(120.0));
}

#[test]
fn test_turn_pressure_by_thirds() {
    let mut tanks = Tanks::from_vec(vec![Tank::default()]);
    let result = calculate(30.0, 720.0, &mut tanks);

    assert_eq!(result.turn_pressure, Some(159.0));
    assert_eq!(result.turn_time, Some(480.0));
}

#[test]
fn test_no_turn_with_more_tanks() {
    let mut tanks = Tanks::from_vec(vec![
        Tank::default(),
        Tank::new(11.0, 200.0, Gas::new(0.5, 0.0)),
    ]);
    let result = calculate(30.0, 720.0, &mut tanks);

    assert_eq!(result.turn_pressure, None);
    assert_eq!(result.turn_time, None);
}

#[test]
fn test_reserve_never_below_policy() {
    let mut tanks = Tanks::from_vec(vec![Tank::default()]);
    let options = Options::default();
    let tank = tanks.first().cloned().unwrap();
    let planned = SegmentsFactory::create_for_plan(10.0, 600.0, &tank, &options);
    let tissues = Tissues::default();
    let profile = BuhlmannAlgorithm::new(options).decompression(&planned, &tanks, &tissues);
    let policy = ReservePolicy {
        primary: ReserveRule::Percentage(50.0),
        stage: ReserveRule::Minimum(20.0),
    };

    GasConsumption::new(options, Diver::default(), policy).calculate(
        &planned,
        profile.segments.as_slice(),
        &mut tanks,
        &tissues,
    );
    assert_eq!(tanks.first().map(|tank| tank.reserve), Some(100.0));
}

#[test]
fn test_not_enough_gas() {
    let mut tanks = Tanks::from_vec(vec![Tank::new(7.0, 200.0, Gas::air())]);
    let result = calculate(40.0, 1800.0, &mut tanks);

    assert!(!result.enough_gas);
    assert_eq!(result.short_tanks, vec![1]);
    assert!(!result.tanks[0].enough_gas);
    assert_eq!(result.events.count(EventType::NotEnoughGas), 1);
    let event = &result.events.as_slice()[0];
    assert_eq!(event.timestamp, 1800.0);
    assert_eq!(event.depth, 40.0);
}

#[test]
fn test_max_bottom_time_needs_flat_bottom() {
    let options = Options::default();
    let tank = Tank::default();
    let tanks = Tanks::from_vec(vec![tank.clone()]);
    let mut planned = SegmentsFactory::create_for_plan(20.0, 1200.0, &tank, &options);
    planned.add_change_to(15.0, &tank, 60.0);

    let consumption = GasConsumption::new(options, Diver::default(), ReservePolicy::default());
    assert_eq!(consumption.max_bottom_time(&planned, &tanks, &Tissues::default()), 0.0);
}

#[test]
fn test_unused_tank_keeps_its_gas() {
    let mut tanks = Tanks::from_vec(vec![
        Tank::default(),
        Tank::new(7.0, 200.0, Gas::air()),
    ]);
    let result = calculate(12.0, 600.0, &mut tanks);

    assert_eq!(result.tanks[1].consumed, 0.0);
    assert_eq!(result.tanks[1].reserve, 20.0);
    assert!(result.enough_gas);
}
