use dive_planner_deco::{
    BuhlmannAlgorithm, Options, SegmentsFactory, Tank, Tanks, Tissues,
};
use rand::{Rng, SeedableRng, rngs::StdRng};

const TOLERANCE: f64 = 1e-3;

#[test]
fn test_random_air_dives() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let tanks = Tanks::from_vec(vec![Tank::default()]);
    let tank = tanks.first().cloned().unwrap();

    for _ in 0..40 {
        let target_depth = rng.random_range(6.0..45.0);
        let bottom_time = rng.random_range(5.0..50.0) * 60.0;
        let gf_low = rng.random_range(0.2..0.9);
        let gf_high = rng.random_range(gf_low..1.0);
        let options = Options::new(gf_low, gf_high);

        let segments = SegmentsFactory::create_for_plan(target_depth, bottom_time, &tank, &options);
        let algorithm = BuhlmannAlgorithm::new(options);
        let profile = algorithm.decompression(&segments, &tanks, &Tissues::default());
        let label = format!("{:.1} m for {:.0} s, GF {:.2}/{:.2}", target_depth, bottom_time, gf_low, gf_high);

        assert!(profile.is_valid(), "{}: {:?}", label, profile.errors);
        assert!(profile.segments.is_contiguous(), "{}", label);
        assert!(profile.segments.current_depth().abs() < 1e-6, "{}", label);
        assert!(profile.duration() >= segments.duration(), "{}", label);

        let mut time = profile.ascent_start().unwrap();
        for segment in profile.ascent() {
            time += segment.duration;
            assert!(!segment.is_descent(), "{}", label);
            if segment.is_flat() {
                let stops = segment.start_depth / options.deco_stop_distance;
                assert!((stops - stops.round()).abs() < 1e-6, "{}: stop at {}", label, segment.start_depth);
            } else if let Some(ceiling) = profile
                .ceilings
                .iter()
                .find(|ceiling| (ceiling.time - time).abs() < 1e-6)
            {
                assert!(ceiling.depth <= segment.end_depth + TOLERANCE, "{}: ceiling broken", label);
            }
        }

        // same input, same result
        let again = algorithm.decompression(&segments, &tanks, &Tissues::default());
        assert_eq!(profile, again, "{}", label);
    }
}
