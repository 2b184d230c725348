use clap::ValueEnum;
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Spectrum – one replicate measurement
// ---------------------------------------------------------------------------

/// A single replicate spectrum.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    /// Where the replicate came from (file stem, dataset row, ...).
    pub label: String,
    /// Wavenumber axis (x).
    pub x: Vec<f64>,
    /// Intensity axis (y) – same length as `x`.
    pub y: Vec<f64>,
}

impl Spectrum {
    pub fn new(label: impl Into<String>, x: Vec<f64>, y: Vec<f64>) -> Self {
        Spectrum {
            label: label.into(),
            x,
            y,
        }
    }

    /// Number of sample points.
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

// ---------------------------------------------------------------------------
// SpectrumSet – ordered replicates of one sample series
// ---------------------------------------------------------------------------

/// Ordered replicate spectra that are meant to share one wavenumber grid.
///
/// The order is the observation order of the correlation (the perturbation
/// axis), so it is never re-sorted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpectrumSet {
    pub spectra: Vec<Spectrum>,
}

impl SpectrumSet {
    pub fn from_spectra(spectra: Vec<Spectrum>) -> Self {
        SpectrumSet { spectra }
    }

    /// Number of replicates.
    pub fn len(&self) -> usize {
        self.spectra.len()
    }

    /// Whether the set holds no replicate.
    pub fn is_empty(&self) -> bool {
        self.spectra.is_empty()
    }

    pub fn push(&mut self, spectrum: Spectrum) {
        self.spectra.push(spectrum);
    }
}

// ---------------------------------------------------------------------------
// AlignedMatrix – wavenumber × replicate table
// ---------------------------------------------------------------------------

/// Replicates of a set merged against the first replicate's wavenumbers.
///
/// `intensities` has one row per wavenumber and one column per replicate
/// (replicate `k` is labelled `k + 1` in artifacts).
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedMatrix {
    pub wavenumbers: Vec<f64>,
    pub intensities: DMatrix<f64>,
}

impl AlignedMatrix {
    /// Number of wavenumber rows.
    pub fn n_points(&self) -> usize {
        self.intensities.nrows()
    }

    /// Number of replicate columns.
    pub fn n_replicates(&self) -> usize {
        self.intensities.ncols()
    }

    /// Mean intensity over all replicates at every wavenumber.
    pub fn mean_spectrum(&self) -> Vec<f64> {
        self.intensities.row_iter().map(|row| row.mean()).collect()
    }

    /// Mean-centered copy of this table.
    pub fn center(&self, mode: Centering) -> CenteredMatrix {
        CenteredMatrix {
            wavenumbers: self.wavenumbers.clone(),
            values: center(&self.intensities, mode),
        }
    }
}

// ---------------------------------------------------------------------------
// Centering
// ---------------------------------------------------------------------------

/// What is subtracted from the aligned table before correlating.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Centering {
    /// Subtract the average spectrum (mean over replicates at each
    /// wavenumber); yields the dynamic spectrum.
    #[default]
    MeanSpectrum,
    /// Subtract each replicate's own average intensity.
    PerSpectrum,
    /// Correlate the raw table.
    None,
}

/// Remove the mean selected by `mode` from a wavenumber × replicate matrix.
///
/// Applying the same mode twice is a no-op up to rounding.
pub fn center(values: &DMatrix<f64>, mode: Centering) -> DMatrix<f64> {
    let mut out = values.clone();
    match mode {
        Centering::MeanSpectrum => {
            for mut row in out.row_iter_mut() {
                let mean = row.mean();
                row.add_scalar_mut(-mean);
            }
        }
        Centering::PerSpectrum => {
            for mut col in out.column_iter_mut() {
                let mean = col.mean();
                col.add_scalar_mut(-mean);
            }
        }
        Centering::None => {}
    }
    out
}

/// The input of the correlation engine.
#[derive(Debug, Clone, PartialEq)]
pub struct CenteredMatrix {
    pub wavenumbers: Vec<f64>,
    pub values: DMatrix<f64>,
}

impl CenteredMatrix {
    /// Number of wavenumber rows.
    pub fn n_points(&self) -> usize {
        self.values.nrows()
    }

    /// Number of observations (replicates) the correlation runs over.
    pub fn n_observations(&self) -> usize {
        self.values.ncols()
    }
}
