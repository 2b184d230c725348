//! Two-dimensional correlation spectroscopy (2D-COS) of replicate IR spectra.
//!
//! ```text
//!  replicate files ──► SpectrumSet ──► align ──► preprocess ──► center
//!                                                                  │
//!                        PlotData ◄── Correlation ◄── correlate ◄──┘
//! ```
//!
//! Every stage is a pure function of its arguments; files are only touched
//! by [`data::loader`], [`data::artifact`] and [`pipeline::run`].

pub mod align;
pub mod config;
pub mod correlation;
pub mod data;
pub mod error;
pub mod pipeline;
pub mod plot;
pub mod preprocess;

pub use align::{align, prepare, AlignOptions, PreparedSet};
pub use config::RunConfig;
pub use correlation::{correlate, hilbert_noda, Correlation, CorrelationKind, CorrelationMap};
pub use data::model::{AlignedMatrix, CenteredMatrix, Centering, Spectrum, SpectrumSet};
pub use error::{CosError, Result};
pub use pipeline::{analyze, run, Analysis, RunOutcome};
pub use plot::PlotData;
pub use preprocess::{Baseline, PreprocessConfig, SavitzkyGolay};
