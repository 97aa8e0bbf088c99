use criterion::{Criterion, criterion_group, criterion_main};
use dive_planner_deco::{
    BuhlmannAlgorithm, DepthConverter, Diver, EventOptions, FeatureFlags, Gas, LoadedTissue,
    Options, ReservePolicy, Segment, SegmentsFactory, Tank, Tanks, Tissues,
    ceiling::{ceiling, max_ceiling},
    consumption::GasConsumption,
    dive_info::DiveInfoCalculator,
    ndl::{binary_ndl, ndl},
    tissue::{GasLoading, calculate_tissue},
};

fn benchmark_tissue_calculations(c: &mut Criterion) {
    let mut group = c.benchmark_group("tissue_calculations");
    let tissue = Tissues::default().compartments[0];
    let at_depth = GasLoading {
        start_pressure: 4.0,
        rate: 0.0,
        gas: Gas::air(),
    };
    let at_surface = GasLoading {
        start_pressure: 1.0,
        ..at_depth
    };

    group.bench_function("tissue_saturation", |b| {
        b.iter(|| calculate_tissue(tissue, 0, &at_depth, 1.0 / 60.0))
    });

    group.bench_function("tissue_desaturation", |b| {
        let saturated_tissue = LoadedTissue {
            load_n2: 3.0,
            load_he: 0.0,
        };
        b.iter(|| calculate_tissue(saturated_tissue, 0, &at_surface, 1.0 / 60.0))
    });

    group.finish();
}

fn benchmark_ceiling_calculations(c: &mut Criterion) {
    let mut group = c.benchmark_group("ceiling_calculations");
    let converter = DepthConverter::default();
    let tissue = LoadedTissue {
        load_n2: 3.0,
        load_he: 0.0,
    };

    group.bench_function("single_tissue_ceiling", |b| {
        b.iter(|| ceiling(0.85, tissue, 0, &converter))
    });

    group.bench_function("max_ceiling", |b| {
        let mut tissues = Tissues::default();
        for (index, tissue) in tissues.compartments.iter_mut().enumerate() {
            tissue.load_n2 = 1.0 + index as f64 * 0.1;
        }
        b.iter(|| max_ceiling(0.85, &tissues, &converter))
    });

    group.finish();
}

fn benchmark_ndl_calculations(c: &mut Criterion) {
    let mut group = c.benchmark_group("ndl_calculations");
    let converter = DepthConverter::default();
    let tank = Tank::default();
    let descent = Segment::new(0.0, 30.0, &tank, 100.0);
    let tissues = Tissues::default().with_segment(&descent, &converter);

    group.bench_function("regular_ndl", |b| {
        b.iter(|| ndl(0.85, &tissues, 30.0, Gas::air(), &converter))
    });

    group.bench_function("binary_ndl", |b| {
        b.iter(|| binary_ndl(0.85, &tissues, 30.0, Gas::air(), &converter))
    });

    group.finish();
}

fn benchmark_planning(c: &mut Criterion) {
    let mut group = c.benchmark_group("planning");
    let options = Options::default();
    let tanks = Tanks::from_vec(vec![
        Tank::default(),
        Tank::new(11.0, 200.0, Gas::new(0.5, 0.0)),
    ]);
    let tank = Tank::default();
    let no_deco = SegmentsFactory::create_for_plan(18.0, 40.0 * 60.0, &tank, &options);
    let deco = SegmentsFactory::create_for_plan(40.0, 30.0 * 60.0, &tank, &options);
    let algorithm = BuhlmannAlgorithm::new(options);
    let tissues = Tissues::default();

    group.bench_function("plan_18m_40min", |b| {
        b.iter(|| algorithm.decompression(&no_deco, &tanks, &tissues))
    });

    group.bench_function("plan_40m_30min_ean50", |b| {
        b.iter(|| algorithm.decompression(&deco, &tanks, &tissues))
    });

    let profile = algorithm.decompression(&deco, &tanks, &tissues);
    let event_options = EventOptions::default();
    let calculator = DiveInfoCalculator::new(&options, &event_options, FeatureFlags::default());
    group.bench_function("dive_info_40m_30min", |b| {
        b.iter(|| calculator.calculate(&profile, &tissues))
    });

    let consumption = GasConsumption::new(options, Diver::default(), ReservePolicy::default());
    group.bench_function("consumption_40m_30min", |b| {
        b.iter(|| {
            let mut tanks = tanks.clone();
            consumption.calculate(&deco, profile.segments.as_slice(), &mut tanks, &tissues)
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_tissue_calculations,
    benchmark_ceiling_calculations,
    benchmark_ndl_calculations,
    benchmark_planning
);
criterion_main!(benches);
