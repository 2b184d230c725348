use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::align::AlignOptions;
use crate::correlation::CorrelationKind;
use crate::error::{CosError, Result};
use crate::preprocess::PreprocessConfig;

/// Aligned table of set 1.
pub const COMBINED_1: &str = "Combined.csv";
/// Aligned table of set 2 (hetero-correlation only).
pub const COMBINED_2: &str = "Combined2.csv";
pub const SYNC_MAP: &str = "_sync.csv";
pub const ASYNC_MAP: &str = "_async.csv";
pub const PLOT_JSON: &str = "plot.json";

/// Input files and preprocessing of one spectrum set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SetConfig {
    /// Replicate files in observation order.
    pub files: Vec<PathBuf>,
    pub preprocess: PreprocessConfig,
}

/// Where results go. Nothing is written when `dir` is unset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: Option<PathBuf>,
    /// Also write `plot.json` for this map.
    pub plot: Option<CorrelationKind>,
}

/// A full correlation run.
///
/// ```json
/// {
///   "set1": { "files": ["a1.csv", "a2.csv", "a3.csv"],
///             "preprocess": { "smoothing": { "window_length": 11, "polyorder": 3 } } },
///   "set2": { "files": ["b1.csv", "b2.csv", "b3.csv"] },
///   "align": { "centering": "mean-spectrum" },
///   "output": { "dir": "out", "plot": "asynchronous" }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub set1: SetConfig,
    /// Second set for hetero-correlation.
    pub set2: Option<SetConfig>,
    pub align: AlignOptions,
    pub output: OutputConfig,
}

impl RunConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| CosError::io(path, e))?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn is_hetero(&self) -> bool {
        self.set2.is_some()
    }

    /// Check that every set names at least one file.
    pub fn validate(&self) -> Result<()> {
        if self.set1.files.is_empty() {
            return Err(CosError::DegenerateInput(
                "no input files for spectrum set 1".into(),
            ));
        }
        if matches!(&self.set2, Some(set) if set.files.is_empty()) {
            return Err(CosError::DegenerateInput(
                "no input files for spectrum set 2".into(),
            ));
        }
        Ok(())
    }
}
