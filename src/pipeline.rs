use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::align::{prepare, AlignOptions, PreparedSet};
use crate::config::{RunConfig, ASYNC_MAP, COMBINED_1, COMBINED_2, PLOT_JSON, SYNC_MAP};
use crate::correlation::{correlate, Correlation, CorrelationKind};
use crate::data::artifact::ArtifactBatch;
use crate::data::loader::load_set;
use crate::data::model::SpectrumSet;
use crate::error::{CosError, Result};
use crate::plot::PlotData;
use crate::preprocess::PreprocessConfig;

/// Prepared inputs and both correlation maps of one computation.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub set1: PreparedSet,
    pub set2: Option<PreparedSet>,
    pub correlation: Correlation,
}

impl Analysis {
    pub fn plot_data(&self, kind: CorrelationKind) -> PlotData {
        PlotData::new(&self.correlation, kind, &self.set1, self.set2.as_ref())
    }
}

/// Result of [`run`]: the analysis plus every file it wrote.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub analysis: Analysis,
    pub written: Vec<PathBuf>,
}

/// Prepare one or two in-memory sets and correlate them.
///
/// `set2 = None` is a homo-correlation of `set1`.
pub fn analyze(
    set1: (&SpectrumSet, &PreprocessConfig),
    set2: Option<(&SpectrumSet, &PreprocessConfig)>,
    options: &AlignOptions,
) -> Result<Analysis> {
    let prepared1 = prepare(set1.0, set1.1, options)?;
    let prepared2 = set2
        .map(|(set, config)| prepare(set, config, options))
        .transpose()?;
    let correlation = correlate(
        &prepared1.centered,
        prepared2.as_ref().map(|p| &p.centered),
    )?;
    Ok(Analysis {
        set1: prepared1,
        set2: prepared2,
        correlation,
    })
}

/// Load, prepare and correlate the sets named in `config`, then persist
/// the results when an output directory is configured.
///
/// Artifacts are only written once both maps exist.
pub fn run(config: &RunConfig) -> Result<RunOutcome> {
    config.validate()?;

    let set1 = load_set(&config.set1.files)?;
    let set2 = config
        .set2
        .as_ref()
        .map(|set| load_set(&set.files))
        .transpose()?;

    let analysis = analyze(
        (&set1, &config.set1.preprocess),
        set2.as_ref()
            .zip(config.set2.as_ref())
            .map(|(set, cfg)| (set, &cfg.preprocess)),
        &config.align,
    )?;

    let written = match &config.output.dir {
        Some(dir) => persist(&analysis, dir, config.output.plot)?,
        None => Vec::new(),
    };
    Ok(RunOutcome { analysis, written })
}

/// Write aligned tables, both maps and optionally the plot bundle to `dir`.
///
/// All files are staged first and replace their predecessors together, so
/// a failure leaves the previous run's artifacts as they were.
pub fn persist(
    analysis: &Analysis,
    dir: &Path,
    plot: Option<CorrelationKind>,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir).map_err(|e| CosError::io(dir, e))?;
    let mut batch = ArtifactBatch::new();

    batch.aligned_table(&dir.join(COMBINED_1), &analysis.set1.aligned)?;
    if let Some(set2) = &analysis.set2 {
        batch.aligned_table(&dir.join(COMBINED_2), &set2.aligned)?;
    }
    batch.correlation_map(&dir.join(SYNC_MAP), &analysis.correlation.synchronous)?;
    batch.correlation_map(&dir.join(ASYNC_MAP), &analysis.correlation.asynchronous)?;

    if let Some(kind) = plot {
        let data = analysis.plot_data(kind);
        debug!("{kind:?} plot: colour scale +/-{:.4e}", data.max_abs());
        batch.plot_json(&dir.join(PLOT_JSON), &data)?;
    }

    let written = batch.commit()?;
    info!("wrote {} artifact(s) to {}", written.len(), dir.display());
    Ok(written)
}
