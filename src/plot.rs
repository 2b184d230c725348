use serde::{Deserialize, Serialize};

use crate::align::PreparedSet;
use crate::correlation::{Correlation, CorrelationKind};

// ---------------------------------------------------------------------------
// Plot contract
// ---------------------------------------------------------------------------
//
// Everything an external plotting layer needs to draw a 2D-COS figure: the
// contour grid with its two wavenumber axes, plus the averaged spectrum of
// each set for the top and left margins.

/// A line plot: one averaged spectrum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Curve {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl Curve {
    fn of(set: &PreparedSet) -> Self {
        Curve {
            x: set.aligned.wavenumbers.clone(),
            y: set.mean_spectrum.clone(),
        }
    }
}

/// Plot-ready bundle for one correlation map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotData {
    pub kind: CorrelationKind,
    pub hetero: bool,
    /// Wavenumbers of set 1 (columns of `z`).
    pub x: Vec<f64>,
    /// Wavenumbers of set 2, or set 1 again for homo-correlation (rows of `z`).
    pub y: Vec<f64>,
    /// `y.len()` rows of `x.len()` intensities.
    pub z: Vec<Vec<f64>>,
    /// Averaged spectrum drawn along the x axis.
    pub top: Curve,
    /// Averaged spectrum drawn along the y axis.
    pub left: Curve,
}

impl PlotData {
    pub fn new(
        correlation: &Correlation,
        kind: CorrelationKind,
        set1: &PreparedSet,
        set2: Option<&PreparedSet>,
    ) -> Self {
        let map = correlation.map(kind);
        PlotData {
            kind,
            hetero: set2.is_some(),
            x: map.x.clone(),
            y: map.y.clone(),
            z: map.to_rows(),
            top: Curve::of(set1),
            left: Curve::of(set2.unwrap_or(set1)),
        }
    }

    /// Largest absolute intensity, for a colour scale centred on zero.
    pub fn max_abs(&self) -> f64 {
        self.z
            .iter()
            .flatten()
            .fold(0.0_f64, |acc, v| acc.max(v.abs()))
    }
}
