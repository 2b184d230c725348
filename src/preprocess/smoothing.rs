use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::error::{CosError, Result};

/// Savitzky–Golay smoothing filter.
///
/// Each point is replaced by the value of a `polyorder` polynomial fitted
/// over a centred window of `window_length` points. The first and last
/// half-windows are taken from the polynomial fitted to the first and last
/// full window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavitzkyGolay {
    pub window_length: usize,
    pub polyorder: usize,
}

impl SavitzkyGolay {
    /// Build a filter, rejecting parameters that can never be valid.
    pub fn new(window_length: usize, polyorder: usize) -> Result<Self> {
        let filter = SavitzkyGolay {
            window_length,
            polyorder,
        };
        filter.check_shape()?;
        Ok(filter)
    }

    fn invalid(&self, reason: impl Into<String>) -> CosError {
        CosError::InvalidFilterParameters {
            window_length: self.window_length,
            polyorder: self.polyorder,
            reason: reason.into(),
        }
    }

    fn check_shape(&self) -> Result<()> {
        if self.window_length == 0 || self.window_length % 2 == 0 {
            return Err(self.invalid("window_length must be a positive odd integer"));
        }
        if self.polyorder >= self.window_length {
            return Err(self.invalid("polyorder must be less than window_length"));
        }
        Ok(())
    }

    /// Check the filter against a spectrum of `n_points` samples.
    pub fn validate(&self, n_points: usize) -> Result<()> {
        self.check_shape()?;
        if self.window_length > n_points {
            return Err(self.invalid(format!(
                "window_length must not exceed the number of sample points ({n_points})"
            )));
        }
        Ok(())
    }

    /// `window × window` matrix mapping a window of samples onto the fitted
    /// polynomial evaluated at every position of that window.
    fn hat_matrix(&self) -> Result<DMatrix<f64>> {
        let half = (self.window_length / 2) as f64;
        let scale = if half > 0.0 { half } else { 1.0 };
        let design = DMatrix::from_fn(self.window_length, self.polyorder + 1, |r, c| {
            ((r as f64 - half) / scale).powi(c as i32)
        });
        let pinv = design
            .clone()
            .pseudo_inverse(1e-12)
            .map_err(|e| CosError::Numerical(e.to_string()))?;
        Ok(&design * pinv)
    }

    /// Smooth one spectrum.
    pub fn smooth(&self, y: &[f64]) -> Result<Vec<f64>> {
        self.validate(y.len())?;
        let hat = self.hat_matrix()?;
        Ok(self.smooth_with(&hat, y))
    }

    fn smooth_with(&self, hat: &DMatrix<f64>, y: &[f64]) -> Vec<f64> {
        let n = y.len();
        let w = self.window_length;
        let half = w / 2;
        let tail = n - w;

        let apply_row = |row: usize, start: usize| -> f64 {
            hat.row(row)
                .iter()
                .zip(&y[start..start + w])
                .map(|(h, v)| h * v)
                .sum()
        };

        (0..n)
            .map(|i| {
                if i < half {
                    apply_row(i, 0)
                } else if i >= n - half {
                    apply_row(i - tail, tail)
                } else {
                    apply_row(half, i - half)
                }
            })
            .collect()
    }

    /// Smooth every replicate column.
    pub fn apply(&self, intensities: &mut DMatrix<f64>) -> Result<()> {
        self.validate(intensities.nrows())?;
        let hat = self.hat_matrix()?;
        for mut col in intensities.column_iter_mut() {
            let y: Vec<f64> = col.iter().copied().collect();
            let smoothed = self.smooth_with(&hat, &y);
            for (dst, src) in col.iter_mut().zip(smoothed) {
                *dst = src;
            }
        }
        Ok(())
    }
}
