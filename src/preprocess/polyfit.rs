use nalgebra::{DMatrix, DVector};

use crate::error::{CosError, Result};

/// Least-squares projection onto polynomials of a fixed degree over a fixed
/// abscissa.
///
/// The abscissa is mapped onto `[-1, 1]` before building the Vandermonde
/// matrix, which keeps wavenumber powers (4000^5 ...) well conditioned.
#[derive(Debug, Clone)]
pub(crate) struct PolynomialFit {
    design: DMatrix<f64>,
    pinv: DMatrix<f64>,
}

impl PolynomialFit {
    pub(crate) fn new(x: &[f64], degree: usize) -> Result<Self> {
        if x.len() <= degree {
            return Err(CosError::DegenerateInput(format!(
                "a degree {degree} polynomial needs more than {degree} sample points, got {}",
                x.len()
            )));
        }

        let (lo, hi) = x
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        let span = hi - lo;
        if !span.is_finite() || (degree > 0 && span <= 0.0) {
            return Err(CosError::DegenerateInput(
                "polynomial fit needs at least two distinct finite wavenumbers".into(),
            ));
        }
        let scaled = |v: f64| {
            if span > 0.0 {
                (2.0 * v - (hi + lo)) / span
            } else {
                0.0
            }
        };

        let design = DMatrix::from_fn(x.len(), degree + 1, |r, c| scaled(x[r]).powi(c as i32));
        let pinv = design
            .clone()
            .pseudo_inverse(1e-12)
            .map_err(|e| CosError::Numerical(e.to_string()))?;
        Ok(PolynomialFit { design, pinv })
    }

    /// Values of the best-fit polynomial at every abscissa.
    pub(crate) fn fitted(&self, y: &DVector<f64>) -> DVector<f64> {
        &self.design * (&self.pinv * y)
    }
}
