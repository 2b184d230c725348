use log::{debug, info};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::data::model::{AlignedMatrix, CenteredMatrix, Centering, SpectrumSet};
use crate::error::{CosError, Result};
use crate::preprocess::{preprocess, PreprocessConfig};

const GRID_TOLERANCE: f64 = 1e-9;

/// How a replicate set is turned into a correlation input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignOptions {
    pub centering: Centering,
    /// Also require every replicate to sit on the first replicate's
    /// wavenumbers, not just to have as many rows.
    pub strict_wavenumbers: bool,
}

/// A set after alignment, preprocessing and centering.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedSet {
    /// Preprocessed wavenumber × replicate table.
    pub aligned: AlignedMatrix,
    pub centered: CenteredMatrix,
    /// Average over replicates of `aligned`, one value per wavenumber.
    pub mean_spectrum: Vec<f64>,
}

/// Merge the replicates of `set` into one wavenumber × replicate table.
///
/// Wavenumbers are taken from the first replicate. Every other replicate
/// must have the same number of points; with `strict_wavenumbers` their
/// wavenumbers must also match.
pub fn align(set: &SpectrumSet, strict_wavenumbers: bool) -> Result<AlignedMatrix> {
    let first = set
        .spectra
        .first()
        .ok_or_else(|| CosError::DegenerateInput("spectrum set has no replicates".into()))?;
    let n_points = first.len();

    for (idx, spectrum) in set.spectra.iter().enumerate() {
        if spectrum.y.len() != n_points || spectrum.x.len() != n_points {
            let actual = if spectrum.x.len() != n_points {
                spectrum.x.len()
            } else {
                spectrum.y.len()
            };
            return Err(CosError::DataMismatch {
                context: format!("replicate {} ('{}')", idx + 1, spectrum.label),
                expected: n_points,
                actual,
            });
        }
        if strict_wavenumbers {
            check_grid(idx, &first.x, &spectrum.x)?;
        }
    }

    let intensities = DMatrix::from_fn(n_points, set.len(), |r, c| set.spectra[c].y[r]);
    debug!("aligned {} replicate(s) x {} point(s)", set.len(), n_points);
    Ok(AlignedMatrix {
        wavenumbers: first.x.clone(),
        intensities,
    })
}

fn check_grid(replicate: usize, reference: &[f64], grid: &[f64]) -> Result<()> {
    for (row, (&expected, &actual)) in reference.iter().zip(grid).enumerate() {
        let scale = expected.abs().max(actual.abs()).max(1.0);
        if (expected - actual).abs() > GRID_TOLERANCE * scale {
            return Err(CosError::GridMismatch {
                replicate: replicate + 1,
                row,
                expected,
                actual,
            });
        }
    }
    Ok(())
}

/// Align, preprocess and center one replicate set.
pub fn prepare(
    set: &SpectrumSet,
    config: &PreprocessConfig,
    options: &AlignOptions,
) -> Result<PreparedSet> {
    let aligned = align(set, options.strict_wavenumbers)?;
    let aligned = preprocess(&aligned, config)?;
    let centered = aligned.center(options.centering);
    let mean_spectrum = aligned.mean_spectrum();
    info!(
        "prepared set: {} point(s), {} replicate(s), centering {:?}",
        aligned.n_points(),
        aligned.n_replicates(),
        options.centering
    );
    Ok(PreparedSet {
        aligned,
        centered,
        mean_spectrum,
    })
}
