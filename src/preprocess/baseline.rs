use log::debug;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use super::polyfit::PolynomialFit;
use crate::error::Result;

fn default_max_iterations() -> usize {
    100
}

fn default_tolerance() -> f64 {
    1e-3
}

/// Baseline estimators. Only one can be active for a spectrum set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum Baseline {
    /// Single least-squares polynomial fit.
    Polynomial { degree: usize },
    /// Iterative modified polynomial: peaks are clipped to the fit until
    /// the working signal stops changing.
    ModPoly {
        order: usize,
        #[serde(default = "default_max_iterations")]
        max_iterations: usize,
        #[serde(default = "default_tolerance")]
        tolerance: f64,
    },
}

impl Baseline {
    pub fn polynomial(degree: usize) -> Self {
        Baseline::Polynomial { degree }
    }

    pub fn modpoly(order: usize) -> Self {
        Baseline::ModPoly {
            order,
            max_iterations: default_max_iterations(),
            tolerance: default_tolerance(),
        }
    }

    /// Subtract the estimated baseline from every replicate column.
    pub fn apply(&self, x: &[f64], intensities: &mut DMatrix<f64>) -> Result<()> {
        let (degree, iterative) = match *self {
            Baseline::Polynomial { degree } => (degree, None),
            Baseline::ModPoly {
                order,
                max_iterations,
                tolerance,
            } => (order, Some((max_iterations, tolerance))),
        };
        let fit = PolynomialFit::new(x, degree)?;

        for mut col in intensities.column_iter_mut() {
            let y = col.clone_owned();
            let baseline = match iterative {
                None => fit.fitted(&y),
                Some((max_iterations, tolerance)) => modpoly(&fit, &y, max_iterations, tolerance),
            };
            col -= baseline;
        }
        Ok(())
    }
}

fn modpoly(
    fit: &PolynomialFit,
    y: &DVector<f64>,
    max_iterations: usize,
    tolerance: f64,
) -> DVector<f64> {
    let mut work = y.clone();
    let mut baseline = fit.fitted(&work);

    for iteration in 0..max_iterations {
        baseline = fit.fitted(&work);
        let next = work.zip_map(&baseline, f64::min);
        let scale = work.abs().sum();
        let change = (&next - &work).abs().sum();
        work = next;
        if scale == 0.0 || change / scale < tolerance {
            debug!("modpoly converged after {} iteration(s)", iteration + 1);
            break;
        }
    }
    baseline
}
