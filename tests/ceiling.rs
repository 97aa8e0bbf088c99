use dive_planner_deco::{
    DepthConverter, LoadedTissue, Tissues,
    ceiling::{GradientFactors, ceiling, max_ceiling, round_to_stop},
};

fn n2(load_n2: f64) -> LoadedTissue {
    LoadedTissue {
        load_n2,
        load_he: 0.0,
    }
}

#[test]
fn test_ceiling_with_high_n2_load() {
    let result = ceiling(0.85, n2(5.0), 2, &DepthConverter::default());
    assert!(result > 0.0, "Ceiling should be greater than 0 for high N2 load");
}

#[test]
fn test_ceiling_with_high_he_load() {
    let tissue = LoadedTissue {
        load_n2: 0.0,
        load_he: 5.0,
    };
    let result = ceiling(0.85, tissue, 3, &DepthConverter::default());
    assert!(result > 0.0, "Ceiling should be greater than 0 for high He load");
}

#[test]
fn test_helium_uses_weighted_coefficients() {
    let converter = DepthConverter::simple();
    let nitrogen = ceiling(1.0, n2(3.0), 4, &converter);
    let trimix = ceiling(
        1.0,
        LoadedTissue {
            load_n2: 1.5,
            load_he: 1.5,
        },
        4,
        &converter,
    );
    assert_ne!(nitrogen, trimix);
}

#[test]
fn test_ceiling_with_zero_loads() {
    let result = ceiling(0.85, n2(0.0), 0, &DepthConverter::default());
    assert_eq!(result, 0.0, "Ceiling should be 0 for zero gas loads");
}

#[test]
fn test_ceiling() {
    let result = ceiling(1.0, n2(3.11), 1, &DepthConverter::simple());
    assert!((result - 3.74454).abs() < 1e-5);
    assert_eq!(round_to_stop(result, 3.0), 6.0);
}

#[test]
fn test_ceiling_gf() {
    let result = ceiling(0.3, n2(3.11), 1, &DepthConverter::simple());
    assert!((result - 14.21273).abs() < 1e-5);
    assert_eq!(round_to_stop(result, 3.0), 15.0);
}

#[test]
fn test_lower_gradient_gives_deeper_ceiling() {
    let converter = DepthConverter::default();
    let tissue = n2(3.0);
    assert!(ceiling(0.3, tissue, 5, &converter) > ceiling(0.8, tissue, 5, &converter));
}

#[test]
fn test_max_ceiling_with_multiple_tissues() {
    let mut tissues = Tissues::default();
    for (index, tissue) in tissues.compartments.iter_mut().enumerate() {
        *tissue = n2(1.0 + index as f64 * 0.1);
    }
    tissues.compartments[4] = n2(4.0);

    let converter = DepthConverter::default();
    let (max, tissue_index) = max_ceiling(0.85, &tissues, &converter);
    assert!(max > 0.0, "Max ceiling should be greater than 0");
    assert_eq!(tissue_index, 4);
    assert_eq!(max, ceiling(0.85, tissues.compartments[4], 4, &converter));
}

#[test]
fn test_saturated_at_surface_has_no_ceiling() {
    let (max, _) = max_ceiling(0.3, &Tissues::default(), &DepthConverter::default());
    assert_eq!(max, 0.0);
}

#[test]
fn test_gradient_moves_from_low_to_high() {
    let mut gradients = GradientFactors::new(0.3, 0.8);
    assert_eq!(gradients.gradient_at(9.0), 0.8);

    gradients.anchor(12.0);
    assert_eq!(gradients.gradient_at(12.0), 0.3);
    assert_eq!(gradients.gradient_at(0.0), 0.8);
    assert!((gradients.gradient_at(6.0) - 0.55).abs() < 1e-12);

    // anchor only moves deeper
    gradients.anchor(6.0);
    assert_eq!(gradients.first_stop(), 12.0);
}
