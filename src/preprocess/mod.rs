//! Optional preprocessing of an aligned replicate table.
//!
//! Steps always run in the same order: baseline correction, then
//! smoothing, then normalisation. Each step is a pure transformation of the
//! intensity matrix; the wavenumber axis is never modified.

pub mod baseline;
pub mod normalize;
mod polyfit;
pub mod smoothing;

use log::debug;
use serde::{Deserialize, Serialize};

pub use baseline::Baseline;
pub use normalize::min_max_normalize;
pub use smoothing::SavitzkyGolay;

use crate::data::model::AlignedMatrix;
use crate::error::Result;

/// Per-set preprocessing toggles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    pub baseline: Option<Baseline>,
    pub smoothing: Option<SavitzkyGolay>,
    pub normalize: bool,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            baseline: None,
            smoothing: None,
            normalize: true,
        }
    }
}

impl PreprocessConfig {
    /// Nothing enabled: the aligned table passes through unchanged.
    pub fn none() -> Self {
        Self {
            baseline: None,
            smoothing: None,
            normalize: false,
        }
    }

    /// Enabled steps in execution order.
    pub fn steps(&self) -> Vec<Step> {
        let mut steps = Vec::with_capacity(3);
        if let Some(baseline) = self.baseline {
            steps.push(Step::Baseline(baseline));
        }
        if let Some(filter) = self.smoothing {
            steps.push(Step::Smooth(filter));
        }
        if self.normalize {
            steps.push(Step::Normalize);
        }
        steps
    }
}

/// One preprocessing stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    Baseline(Baseline),
    Smooth(SavitzkyGolay),
    Normalize,
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Step::Baseline(Baseline::Polynomial { .. }) => "polynomial baseline",
            Step::Baseline(Baseline::ModPoly { .. }) => "modpoly baseline",
            Step::Smooth(_) => "savitzky-golay",
            Step::Normalize => "min-max normalisation",
        }
    }

    /// Fail early on parameters that cannot work for `n_points` samples.
    fn validate(&self, n_points: usize) -> Result<()> {
        match self {
            Step::Smooth(filter) => filter.validate(n_points),
            _ => Ok(()),
        }
    }

    /// Apply the step to a copy of `aligned`.
    pub fn apply(&self, aligned: &AlignedMatrix) -> Result<AlignedMatrix> {
        let mut out = aligned.clone();
        match self {
            Step::Baseline(baseline) => baseline.apply(&aligned.wavenumbers, &mut out.intensities)?,
            Step::Smooth(filter) => filter.apply(&mut out.intensities)?,
            Step::Normalize => min_max_normalize(&mut out.intensities),
        }
        Ok(out)
    }
}

/// Run `steps` in the given order.
///
/// All steps are validated before the first one runs, so bad filter
/// parameters abort without producing any matrix.
pub fn apply_steps(aligned: &AlignedMatrix, steps: &[Step]) -> Result<AlignedMatrix> {
    for step in steps {
        step.validate(aligned.n_points())?;
    }
    let mut current = aligned.clone();
    for step in steps {
        debug!("applying {}", step.name());
        current = step.apply(&current)?;
    }
    Ok(current)
}

/// Apply the steps enabled in `config` in their fixed order.
pub fn preprocess(aligned: &AlignedMatrix, config: &PreprocessConfig) -> Result<AlignedMatrix> {
    apply_steps(aligned, &config.steps())
}
