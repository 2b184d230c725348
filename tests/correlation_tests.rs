use std::f64::consts::PI;

use approx::assert_relative_eq;
use nalgebra::DMatrix;
use rusty_cos::{
    correlate, hilbert_noda, prepare, AlignOptions, CenteredMatrix, Centering, CosError,
    PreprocessConfig, Spectrum, SpectrumSet,
};

fn set_from(wavenumbers: &[f64], replicates: &[&[f64]]) -> SpectrumSet {
    SpectrumSet::from_spectra(
        replicates
            .iter()
            .enumerate()
            .map(|(i, y)| Spectrum::new(format!("rep{}", i + 1), wavenumbers.to_vec(), y.to_vec()))
            .collect(),
    )
}

fn centered(wavenumbers: &[f64], replicates: &[&[f64]]) -> CenteredMatrix {
    prepare(
        &set_from(wavenumbers, replicates),
        &PreprocessConfig::none(),
        &AlignOptions::default(),
    )
    .unwrap()
    .centered
}

// ============================================================================
// Hilbert–Noda Matrix Tests
// ============================================================================

#[test]
fn test_noda_is_antisymmetric_with_zero_diagonal() {
    let noda = hilbert_noda(6);
    for i in 0..6 {
        assert_eq!(noda[(i, i)], 0.0);
        for j in 0..6 {
            assert_relative_eq!(noda[(i, j)], -noda[(j, i)]);
        }
    }
}

#[test]
fn test_noda_entries() {
    let noda = hilbert_noda(3);
    assert_relative_eq!(noda[(0, 1)], 1.0 / PI);
    assert_relative_eq!(noda[(0, 2)], 0.5 / PI);
    assert_relative_eq!(noda[(2, 0)], -0.5 / PI);
    assert_relative_eq!(noda[(1, 0)], -1.0 / PI);
}

// ============================================================================
// Hand-Computed Maps
// ============================================================================

#[test]
fn test_constant_replicates_give_zero_maps() {
    let wn = [4000.0, 3999.0, 3998.0, 3997.0, 3996.0];
    let flat = [1.0; 5];
    let reps: [&[f64]; 3] = [&flat, &flat, &flat];

    for config in [PreprocessConfig::default(), PreprocessConfig::none()] {
        let spec1 = prepare(&set_from(&wn, &reps), &config, &AlignOptions::default())
            .unwrap()
            .centered;
        let spec2 = prepare(&set_from(&wn, &reps), &config, &AlignOptions::default())
            .unwrap()
            .centered;
        assert!(spec1.values.iter().all(|&v| v == 0.0));

        let cos = correlate(&spec1, Some(&spec2)).unwrap();
        assert_eq!(cos.synchronous.shape(), (5, 5));
        assert_eq!(cos.asynchronous.shape(), (5, 5));
        assert!(cos.synchronous.values.iter().all(|&v| v == 0.0));
        assert!(cos.asynchronous.values.iter().all(|&v| v == 0.0));
    }
}

#[test]
fn test_two_opposite_replicates() {
    // Replicates [1,2,3] and [3,2,1]: centered columns [-1,0,1] and [1,0,-1].
    let wn = [10.0, 11.0, 12.0];
    let spec = centered(&wn, &[&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]]);

    let col0: Vec<f64> = spec.values.column(0).iter().copied().collect();
    let col1: Vec<f64> = spec.values.column(1).iter().copied().collect();
    assert_eq!(col0, vec![-1.0, 0.0, 1.0]);
    assert_eq!(col1, vec![1.0, 0.0, -1.0]);
    assert_relative_eq!(spec.values.column(0).dot(&spec.values.column(1)), -2.0);

    let cos = correlate(&spec, None).unwrap();
    assert_eq!(cos.synchronous.x, wn.to_vec());
    assert_eq!(cos.synchronous.y, wn.to_vec());
    let expected = DMatrix::from_row_slice(3, 3, &[2.0, 0.0, -2.0, 0.0, 0.0, 0.0, -2.0, 0.0, 2.0]);
    assert_relative_eq!(cos.synchronous.values, expected, epsilon = 1e-12);
    // Two observations are always in phase or in anti-phase.
    assert_relative_eq!(cos.asynchronous.values, DMatrix::<f64>::zeros(3, 3), epsilon = 1e-12);
}

#[test]
fn test_three_observation_maps() {
    // Rows over 3 replicates: 100 → [0,1,2], 200 → [2,0,1].
    let wn = [100.0, 200.0];
    let spec = centered(&wn, &[&[0.0, 2.0], &[1.0, 0.0], &[2.0, 1.0]]);
    let cos = correlate(&spec, None).unwrap();

    let sync = DMatrix::from_row_slice(2, 2, &[1.0, -0.5, -0.5, 1.0]);
    assert_relative_eq!(cos.synchronous.values, sync, epsilon = 1e-12);

    assert_relative_eq!(cos.asynchronous.at(0, 0), 0.0, epsilon = 1e-12);
    assert_relative_eq!(cos.asynchronous.at(1, 1), 0.0, epsilon = 1e-12);
    assert_relative_eq!(cos.asynchronous.at(0, 1), -3.0 / (4.0 * PI), epsilon = 1e-12);
    assert_relative_eq!(cos.asynchronous.at(1, 0), 3.0 / (4.0 * PI), epsilon = 1e-12);
}

// ============================================================================
// Structural Properties
// ============================================================================

fn wavy_set(n_points: usize, n_reps: usize, phase: f64) -> CenteredMatrix {
    let wn: Vec<f64> = (0..n_points).map(|i| 1800.0 - 4.0 * i as f64).collect();
    let reps: Vec<Vec<f64>> = (0..n_reps)
        .map(|k| {
            (0..n_points)
                .map(|i| ((i as f64) * 0.3 + k as f64 * phase).sin() * (1.0 + k as f64 * 0.1))
                .collect()
        })
        .collect();
    let refs: Vec<&[f64]> = reps.iter().map(Vec::as_slice).collect();
    centered(&wn, &refs)
}

#[test]
fn test_homo_sync_symmetric_async_antisymmetric() {
    let spec = wavy_set(12, 5, 0.7);
    let cos = correlate(&spec, None).unwrap();
    let sync = &cos.synchronous.values;
    let asyn = &cos.asynchronous.values;
    for i in 0..12 {
        for j in 0..12 {
            assert_relative_eq!(sync[(i, j)], sync[(j, i)], epsilon = 1e-12);
            assert_relative_eq!(asyn[(i, j)], -asyn[(j, i)], epsilon = 1e-12);
        }
    }
    assert!(sync.iter().chain(asyn.iter()).all(|v| v.is_finite()));
    assert!(asyn.iter().any(|v| v.abs() > 1e-6));
}

#[test]
fn test_hetero_shape_and_orientation() {
    let spec1 = wavy_set(8, 4, 0.5);
    let spec2 = wavy_set(5, 4, 1.1);
    let cos = correlate(&spec1, Some(&spec2)).unwrap();

    // Rows follow set 2, columns follow set 1.
    assert_eq!(cos.synchronous.shape(), (5, 8));
    assert_eq!(cos.asynchronous.shape(), (5, 8));
    assert_eq!(cos.synchronous.x, spec1.wavenumbers);
    assert_eq!(cos.synchronous.y, spec2.wavenumbers);

    for r in 0..5 {
        for c in 0..8 {
            let expected: f64 = (0..4)
                .map(|k| spec2.values[(r, k)] * spec1.values[(c, k)])
                .sum::<f64>()
                / 3.0;
            assert_relative_eq!(cos.synchronous.at(r, c), expected, epsilon = 1e-12);
        }
    }

    let swapped = correlate(&spec2, Some(&spec1)).unwrap();
    assert_relative_eq!(
        swapped.synchronous.values,
        cos.synchronous.values.transpose(),
        epsilon = 1e-12
    );
    assert_relative_eq!(
        swapped.asynchronous.values,
        -cos.asynchronous.values.transpose(),
        epsilon = 1e-12
    );
}

#[test]
fn test_per_spectrum_centering_gives_zero_column_means() {
    let wn = [10.0, 11.0, 12.0, 13.0];
    let set = set_from(&wn, &[&[1.0, 5.0, 2.0, 0.0], &[4.0, 4.0, 3.0, 1.0]]);
    let options = AlignOptions {
        centering: Centering::PerSpectrum,
        ..AlignOptions::default()
    };
    let spec = prepare(&set, &PreprocessConfig::none(), &options).unwrap().centered;
    for col in spec.values.column_iter() {
        assert_relative_eq!(col.sum(), 0.0, epsilon = 1e-12);
    }
    assert!(correlate(&spec, None).is_ok());
}

// ============================================================================
// Error Cases
// ============================================================================

#[test]
fn test_observation_count_mismatch() {
    let spec1 = wavy_set(6, 4, 0.5);
    let spec2 = wavy_set(6, 3, 0.5);
    match correlate(&spec1, Some(&spec2)) {
        Err(CosError::DataMismatch {
            expected, actual, ..
        }) => {
            assert_eq!(expected, 4);
            assert_eq!(actual, 3);
        }
        other => panic!("expected DataMismatch, got {other:?}"),
    }
}

#[test]
fn test_single_observation_is_degenerate() {
    let spec = centered(&[1.0, 2.0, 3.0], &[&[1.0, 2.0, 3.0]]);
    assert!(matches!(
        correlate(&spec, None),
        Err(CosError::DegenerateInput(_))
    ));
}

#[test]
fn test_single_sample_point_is_degenerate() {
    let spec = centered(&[1.0], &[&[1.0], &[2.0], &[4.0]]);
    assert!(matches!(
        correlate(&spec, None),
        Err(CosError::DegenerateInput(_))
    ));
}

#[test]
fn test_non_finite_input_is_rejected() {
    let spec = centered(&[1.0, 2.0], &[&[1.0, f64::NAN], &[2.0, 1.0]]);
    assert!(matches!(
        correlate(&spec, None),
        Err(CosError::DegenerateInput(_))
    ));
}
