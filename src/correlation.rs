//! Generalised 2D correlation (Noda) of one or two dynamic spectra.
//!
//! With `A1` (`N1 × M`) and `A2` (`N2 × M`) the centered wavenumber ×
//! replicate tables, the correlation runs over the `M` replicates:
//!
//! ```text
//! sync = (A1 · A2ᵀ)ᵀ        / (M − 1)
//! asyn = (A1 · H · A2ᵀ)ᵀ    / (M − 1)      H = Hilbert–Noda matrix (M × M)
//! ```
//!
//! Both maps have one row per wavenumber of set 2 and one column per
//! wavenumber of set 1.

use std::f64::consts::PI;

use clap::ValueEnum;
use log::{debug, info};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::data::model::CenteredMatrix;
use crate::error::{CosError, Result};

/// A correlation intensity grid with its wavenumber axes.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMap {
    /// Column axis: wavenumbers of set 1.
    pub x: Vec<f64>,
    /// Row axis: wavenumbers of set 2 (set 1 for homo-correlation).
    pub y: Vec<f64>,
    /// `y.len() × x.len()` intensities.
    pub values: DMatrix<f64>,
}

impl CorrelationMap {
    /// Intensity at (`y[row]`, `x[col]`).
    pub fn at(&self, row: usize, col: usize) -> f64 {
        self.values[(row, col)]
    }

    /// `(rows, columns)`.
    pub fn shape(&self) -> (usize, usize) {
        self.values.shape()
    }

    /// Row-major copy of the grid.
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.values
            .row_iter()
            .map(|row| row.iter().copied().collect())
            .collect()
    }
}

/// Which of the two maps to hand to a consumer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum CorrelationKind {
    #[default]
    Synchronous,
    Asynchronous,
}

/// Synchronous and asynchronous maps of one computation.
#[derive(Debug, Clone, PartialEq)]
pub struct Correlation {
    pub synchronous: CorrelationMap,
    pub asynchronous: CorrelationMap,
}

impl Correlation {
    pub fn map(&self, kind: CorrelationKind) -> &CorrelationMap {
        match kind {
            CorrelationKind::Synchronous => &self.synchronous,
            CorrelationKind::Asynchronous => &self.asynchronous,
        }
    }
}

/// Hilbert–Noda transformation matrix of order `m`.
///
/// `H[i][j] = 1 / (π (j − i))` off the diagonal, zero on it.
pub fn hilbert_noda(m: usize) -> DMatrix<f64> {
    DMatrix::from_fn(m, m, |i, j| {
        if i == j {
            0.0
        } else {
            1.0 / PI / (j as f64 - i as f64)
        }
    })
}

fn check_input(name: &str, spec: &CenteredMatrix) -> Result<()> {
    if spec.wavenumbers.len() != spec.n_points() {
        return Err(CosError::DataMismatch {
            context: format!("wavenumber axis of {name}"),
            expected: spec.n_points(),
            actual: spec.wavenumbers.len(),
        });
    }
    if spec.n_points() < 2 {
        return Err(CosError::DegenerateInput(format!(
            "{name} has {} sample point(s), at least 2 are required",
            spec.n_points()
        )));
    }
    Ok(())
}

/// Correlate `spec1` with `spec2`, or with itself when `spec2` is `None`.
///
/// Both maps are returned together or not at all.
pub fn correlate(spec1: &CenteredMatrix, spec2: Option<&CenteredMatrix>) -> Result<Correlation> {
    let hetero = spec2.is_some();
    let spec2 = spec2.unwrap_or(spec1);

    let m = spec1.n_observations();
    if spec2.n_observations() != m {
        return Err(CosError::DataMismatch {
            context: "observation count of spectrum set 2".into(),
            expected: m,
            actual: spec2.n_observations(),
        });
    }
    if m < 2 {
        return Err(CosError::DegenerateInput(format!(
            "{m} observation(s); correlation needs at least 2 replicates"
        )));
    }
    check_input("spectrum set 1", spec1)?;
    check_input("spectrum set 2", spec2)?;

    let a1 = &spec1.values;
    let a2 = &spec2.values;
    let scale = 1.0 / (m - 1) as f64;

    let sync = (a1 * a2.transpose()).transpose() * scale;
    let noda = hilbert_noda(m);
    let asyn = (a1 * &noda * a2.transpose()).transpose() * scale;

    if sync.iter().chain(asyn.iter()).any(|v| !v.is_finite()) {
        return Err(CosError::DegenerateInput(
            "correlation produced non-finite intensities".into(),
        ));
    }

    debug!("correlation maps: {}x{}", sync.nrows(), sync.ncols());
    info!(
        "{}-correlation over {m} observation(s)",
        if hetero { "hetero" } else { "homo" }
    );

    let map = |values: DMatrix<f64>| CorrelationMap {
        x: spec1.wavenumbers.clone(),
        y: spec2.wavenumbers.clone(),
        values,
    };
    Ok(Correlation {
        synchronous: map(sync),
        asynchronous: map(asyn),
    })
}
