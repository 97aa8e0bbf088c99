use crate::tissue::LoadedTissue;
use crate::zh16c::ZhL16cGf;

/// Nitrogen M-value of a compartment at ambient pressure.
pub fn calculate_m_values(amb_pressure: f64, tissue_index: usize) -> f64 {
    amb_pressure / ZhL16cGf::N2_B[tissue_index] + ZhL16cGf::N2_A[tissue_index]
}

/// M-value using `a`/`b` weighted by the compartment's nitrogen and helium loads.
pub fn m_value(tissue: &LoadedTissue, tissue_index: usize, amb_pressure: f64) -> f64 {
    let (a, b) = tissue.coefficients(tissue_index);
    amb_pressure / b + a
}

/// Share of the allowed supersaturation used by the compartment, 1.0 means at the M-value.
/// Negative while the compartment is still on-gassing.
pub fn gradient(tissue: &LoadedTissue, tissue_index: usize, amb_pressure: f64) -> f64 {
    let denominator = m_value(tissue, tissue_index, amb_pressure) - amb_pressure;
    if denominator > 1e-10 {
        (tissue.total() - amb_pressure) / denominator
    } else {
        0.0
    }
}

#[test]
fn test_gradient_at_m_value() {
    let amb_pressure = 1.0;
    let tissue = LoadedTissue {
        load_n2: calculate_m_values(amb_pressure, 3),
        load_he: 0.0,
    };
    assert!(libm::fabs(gradient(&tissue, 3, amb_pressure) - 1.0) < 1e-12);
}
