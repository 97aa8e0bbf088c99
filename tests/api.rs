use dive_planner_deco::{
    ConsumptionRequest, Diver, DiveInfoRequest, EventType, Gas, Options, PlanRequest,
    PlanningError, ProfileResult, ReservePolicy, Salinity, SafetyStop, Segment, SegmentsFactory,
    Tank, Tissues, consumption, dive_info, plan,
};

const TOLERANCE: f64 = 1e-6;

fn close(actual: f64, expected: f64) -> bool {
    (actual - expected).abs() < TOLERANCE
}

fn plan_request(depth: f64, duration: f64) -> PlanRequest {
    let options = Options::default();
    let tank = Tank::default();
    PlanRequest {
        tanks: vec![tank.clone()],
        segments: SegmentsFactory::create_for_plan(depth, duration, &tank, &options).into_vec(),
        options,
        initial_tissues: Vec::new(),
        surface_interval: 0.0,
    }
}

#[test]
fn test_plan() {
    let result = plan(plan_request(30.0, 1500.0));

    assert!(result.errors.is_empty());
    assert_eq!(result.bottom_segments, 2);
    assert_eq!(result.final_tissues.len(), 16);
    assert!((result.segments.iter().map(|segment| segment.duration).sum::<f64>() - 2100.0).abs() < 1e-6);
}

#[test]
fn test_repetitive_plan_uses_final_tissues() {
    let first = plan(plan_request(30.0, 1500.0));
    let mut request = plan_request(30.0, 1500.0);
    request.initial_tissues = first.final_tissues.clone();
    request.surface_interval = 3600.0;
    let second = plan(request);

    let duration = |result: &ProfileResult| -> f64 {
        result.segments.iter().map(|segment| segment.duration).sum()
    };
    assert!(second.errors.is_empty());
    assert!(duration(&second) > duration(&first));
}

#[test]
fn test_wrong_tissue_count() {
    let mut request = plan_request(30.0, 1500.0);
    request.initial_tissues = Tissues::default().to_vec()[..3].to_vec();
    let result = plan(request);

    assert_eq!(result.errors, vec![PlanningError::InvalidTissues { count: 3 }]);
    assert!(result.segments.is_empty());
}

#[test]
fn test_consumption() {
    let request = plan_request(30.0, 720.0);
    let profile = plan(request.clone());
    let result = consumption(ConsumptionRequest {
        plan: request.segments,
        profile: profile.segments,
        options: request.options,
        diver: Diver::default(),
        reserve_policy: ReservePolicy::default(),
        tanks: request.tanks,
        initial_tissues: Vec::new(),
        surface_interval: 0.0,
    })
    .unwrap();

    assert!(result.enough_gas);
    assert_eq!(result.tanks[0].id, 1);
    assert_eq!(result.tanks[0].consumed, 80.0);
}

#[test]
fn test_consumption_rejects_duplicate_tank_ids() {
    let request = plan_request(30.0, 720.0);
    let profile = plan(request.clone());
    let mut tanks = request.tanks.clone();
    tanks.push(Tank::new(11.0, 200.0, Gas::new(0.5, 0.0)).with_id(1));
    let result = consumption(ConsumptionRequest {
        plan: request.segments,
        profile: profile.segments,
        options: request.options,
        diver: Diver::default(),
        reserve_policy: ReservePolicy::default(),
        tanks,
        initial_tissues: Vec::new(),
        surface_interval: 0.0,
    });

    assert_eq!(result, Err(PlanningError::DuplicateTank { tank: 1 }));
}

#[test]
fn test_dive_info() {
    let request = plan_request(30.0, 1500.0);
    let profile = plan(request.clone());
    let info = dive_info(DiveInfoRequest {
        profile,
        options: request.options,
        event_options: Default::default(),
        flags: Default::default(),
        initial_tissues: Vec::new(),
        surface_interval: 0.0,
    })
    .unwrap();

    assert!(info.events.contains(EventType::NoDecoEnd));
    assert!(info.otu > 0.0);
}

#[cfg(feature = "serde")]
#[test]
fn test_plan_json() {
    let request = serde_json::to_string(&plan_request(12.0, 600.0)).unwrap();
    let response = dive_planner_deco::api::plan_json(&request).unwrap();
    let result: ProfileResult = serde_json::from_str(&response).unwrap();

    assert!(result.errors.is_empty());
    assert_eq!(result.segments.len(), 6);
    assert!(result.events.contains(EventType::SafetyStopStart));
}

#[cfg(feature = "serde")]
#[test]
fn test_request_defaults() {
    let mut value = serde_json::to_value(plan_request(12.0, 600.0)).unwrap();
    let object = value.as_object_mut().unwrap();
    object.remove("initial_tissues");
    object.remove("surface_interval");

    let request: PlanRequest = serde_json::from_value(value).unwrap();
    assert!(request.initial_tissues.is_empty());
    assert_eq!(request.surface_interval, 0.0);
}

#[cfg(feature = "serde")]
#[test]
fn test_malformed_json() {
    assert!(dive_planner_deco::api::plan_json("{\"tanks\": 3}").is_err());
}

#[cfg(feature = "serde")]
#[test]
fn test_tank_json() {
    let mut tank = Tank::new(15.0, 232.5, Gas::new(0.32, 0.1)).with_id(2);
    tank.working_pressure = 300.0;
    tank.consumed = 87.25;
    tank.reserve = 41.125;

    let json = serde_json::to_string(&tank).unwrap();
    let parsed: Tank = serde_json::from_str(&json).unwrap();

    assert_eq!(parsed.id, 2);
    assert!(close(parsed.gas.f_o2, 0.32) && close(parsed.gas.f_he, 0.1));
    assert!(close(parsed.size, 15.0));
    assert!(close(parsed.working_pressure, 300.0));
    assert!(close(parsed.start_pressure, 232.5));
    assert!(close(parsed.consumed, 87.25));
    assert!(close(parsed.reserve, 41.125));
}

#[cfg(feature = "serde")]
#[test]
fn test_segment_json() {
    let tank = Tank::new(11.0, 200.0, Gas::new(0.5, 0.0)).with_id(3);
    let segment = Segment::new(21.0, 6.5, &tank, 97.3);

    let json = serde_json::to_string(&segment).unwrap();
    let parsed: Segment = serde_json::from_str(&json).unwrap();

    assert_eq!(parsed.tank_id, 3);
    assert!(close(parsed.start_depth, 21.0));
    assert!(close(parsed.end_depth, 6.5));
    assert!(close(parsed.duration, 97.3));
    assert!(close(parsed.gas.f_o2, 0.5) && close(parsed.gas.f_he, 0.0));
}

#[cfg(feature = "serde")]
#[test]
fn test_options_json() {
    let options = Options {
        max_ppo2: 1.3,
        max_deco_ppo2: 1.5,
        salinity: Salinity::Salt,
        altitude: 1200.0,
        round_stops_to_minutes: true,
        gas_switch_duration: 60.0,
        safety_stop: SafetyStop::Always,
        last_stop_depth: 6.0,
        max_end: 35.0,
        oxygen_narcotic: false,
        descent_speed: 20.0,
        problem_solving_duration: 120.0,
        ..Options::new(0.35, 0.75)
    };

    let json = serde_json::to_string(&options).unwrap();
    let parsed: Options = serde_json::from_str(&json).unwrap();

    assert!(close(parsed.gf_low, 0.35) && close(parsed.gf_high, 0.75));
    assert!(close(parsed.max_ppo2, 1.3) && close(parsed.max_deco_ppo2, 1.5));
    assert_eq!(parsed.salinity, Salinity::Salt);
    assert!(close(parsed.altitude, 1200.0));
    assert!(parsed.round_stops_to_minutes);
    assert!(close(parsed.gas_switch_duration, 60.0));
    assert_eq!(parsed.safety_stop, SafetyStop::Always);
    assert!(close(parsed.last_stop_depth, 6.0));
    assert!(close(parsed.deco_stop_distance, options.deco_stop_distance));
    assert!(close(parsed.minimum_auto_stop_depth, options.minimum_auto_stop_depth));
    assert!(close(parsed.max_end, 35.0));
    assert!(!parsed.oxygen_narcotic);
    assert!(close(parsed.descent_speed, 20.0));
    assert!(close(parsed.ascent_speed_50perc, options.ascent_speed_50perc));
    assert!(close(parsed.ascent_speed_50perc_to_6m, options.ascent_speed_50perc_to_6m));
    assert!(close(parsed.ascent_speed_6m, options.ascent_speed_6m));
    assert!(close(parsed.problem_solving_duration, 120.0));
}
