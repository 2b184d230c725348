use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::debug;
use nalgebra::DMatrix;

use super::model::AlignedMatrix;
use crate::correlation::CorrelationMap;
use crate::error::{CosError, Result};
use crate::plot::PlotData;

// ---------------------------------------------------------------------------
// Labelled tables
// ---------------------------------------------------------------------------
//
// Both artifacts share one layout: a header row whose first cell is empty,
// then one row per matrix row starting with that row's label.
//
//   ,1,2,3                 ,4000,3999,3998
//   4000,0.1,0.2,0.3       4000,0.5,0.1,...
//   3999,...               3999,...
//
// This is what pandas writes for a DataFrame with an unnamed index, so
// tables produced by the original plotting notebook load unchanged.
//
// Every artifact of a run is first written to a hidden sibling
// (`.<name>.tmp`). Only when all of them exist are they moved over their
// targets; if one move fails the targets already replaced get their old
// content back. Dropping a batch without committing removes whatever it
// staged.

/// Artifacts written next to their destinations, not yet moved into place.
#[derive(Debug, Default)]
pub struct ArtifactBatch {
    staged: Vec<Staged>,
}

#[derive(Debug)]
struct Staged {
    staging: PathBuf,
    target: PathBuf,
}

impl ArtifactBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage the aligned replicate table (`Combined.csv`).
    pub fn aligned_table(&mut self, path: &Path, aligned: &AlignedMatrix) -> Result<()> {
        let header: Vec<String> = (1..=aligned.n_replicates()).map(|k| k.to_string()).collect();
        self.stage(path, |staging| {
            write_labelled_table(staging, &header, &aligned.wavenumbers, &aligned.intensities)
        })
    }

    /// Stage a correlation map (`_sync.csv` / `_async.csv`).
    pub fn correlation_map(&mut self, path: &Path, map: &CorrelationMap) -> Result<()> {
        let header: Vec<String> = map.x.iter().map(|v| v.to_string()).collect();
        self.stage(path, |staging| {
            write_labelled_table(staging, &header, &map.y, &map.values)
        })
    }

    /// Stage the plot bundle as pretty-printed JSON.
    pub fn plot_json(&mut self, path: &Path, plot: &PlotData) -> Result<()> {
        let text = serde_json::to_string_pretty(plot)?;
        self.stage(path, |staging| {
            fs::write(staging, text).map_err(|e| CosError::io(staging, e))
        })
    }

    fn stage(&mut self, path: &Path, write: impl FnOnce(&Path) -> Result<()>) -> Result<()> {
        let staging = staging_path(path);
        if let Err(e) = write(&staging) {
            let _ = fs::remove_file(&staging);
            return Err(e);
        }
        self.staged.push(Staged {
            staging,
            target: path.to_path_buf(),
        });
        Ok(())
    }

    /// Move every staged file over its target and return the targets.
    ///
    /// Either all targets are replaced or none is.
    pub fn commit(mut self) -> Result<Vec<PathBuf>> {
        let staged = std::mem::take(&mut self.staged);

        // Targets must be absent or regular files before anything moves.
        if let Some(blocked) = staged.iter().find(|s| occupied_by_non_file(&s.target)) {
            let err = CosError::io(
                &blocked.target,
                io::Error::new(io::ErrorKind::AlreadyExists, "target exists and is not a file"),
            );
            discard(&staged);
            return Err(err);
        }

        let mut replaced: Vec<(&Staged, Option<PathBuf>)> = Vec::with_capacity(staged.len());
        for item in &staged {
            match replace(item) {
                Ok(backup) => replaced.push((item, backup)),
                Err(e) => {
                    roll_back(&replaced);
                    discard(&staged);
                    return Err(e);
                }
            }
        }

        for backup in replaced.into_iter().filter_map(|(_, backup)| backup) {
            let _ = fs::remove_file(backup);
        }
        for item in &staged {
            debug!("wrote {}", item.target.display());
        }
        Ok(staged.into_iter().map(|s| s.target).collect())
    }
}

impl Drop for ArtifactBatch {
    fn drop(&mut self) {
        discard(&self.staged);
    }
}

fn occupied_by_non_file(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok_and(|meta| !meta.is_file())
}

/// Move the current target aside (if any), then the staged file into place.
/// Returns where the previous content now lives.
fn replace(item: &Staged) -> Result<Option<PathBuf>> {
    let backup = if item.target.exists() {
        let backup = backup_path(&item.target);
        fs::rename(&item.target, &backup).map_err(|e| CosError::io(&item.target, e))?;
        Some(backup)
    } else {
        None
    };
    if let Err(e) = fs::rename(&item.staging, &item.target) {
        if let Some(backup) = &backup {
            let _ = fs::rename(backup, &item.target);
        }
        return Err(CosError::io(&item.target, e));
    }
    Ok(backup)
}

/// Undo completed replacements, newest first.
fn roll_back(replaced: &[(&Staged, Option<PathBuf>)]) {
    for (item, backup) in replaced.iter().rev() {
        match backup {
            Some(backup) => {
                let _ = fs::rename(backup, &item.target);
            }
            None => {
                let _ = fs::remove_file(&item.target);
            }
        }
    }
}

fn discard(staged: &[Staged]) {
    for item in staged {
        if item.staging.exists() {
            let _ = fs::remove_file(&item.staging);
        }
    }
}

/// Sibling path an artifact is staged in before it replaces `path`.
fn staging_path(path: &Path) -> PathBuf {
    sibling(path, "tmp")
}

/// Sibling path the previous artifact waits in while the batch commits.
fn backup_path(path: &Path) -> PathBuf {
    sibling(path, "bak")
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("artifact");
    path.with_file_name(format!(".{name}.{suffix}"))
}

fn write_labelled_table(
    path: &Path,
    header: &[String],
    row_labels: &[f64],
    values: &DMatrix<f64>,
) -> Result<()> {
    if row_labels.len() != values.nrows() {
        return Err(CosError::DataMismatch {
            context: format!("row labels of {}", path.display()),
            expected: values.nrows(),
            actual: row_labels.len(),
        });
    }
    if header.len() != values.ncols() {
        return Err(CosError::DataMismatch {
            context: format!("column labels of {}", path.display()),
            expected: values.ncols(),
            actual: header.len(),
        });
    }

    let mut writer = csv::Writer::from_path(path).map_err(|e| CosError::csv(path, e))?;

    let mut record = Vec::with_capacity(header.len() + 1);
    record.push(String::new());
    record.extend(header.iter().cloned());
    writer
        .write_record(&record)
        .map_err(|e| CosError::csv(path, e))?;

    for (label, row) in row_labels.iter().zip(values.row_iter()) {
        record.clear();
        record.push(label.to_string());
        record.extend(row.iter().map(|v| v.to_string()));
        writer
            .write_record(&record)
            .map_err(|e| CosError::csv(path, e))?;
    }
    writer.flush().map_err(|e| CosError::io(path, e))?;
    debug!(
        "staged {}x{} table in {}",
        values.nrows(),
        values.ncols(),
        path.display()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Readers
// ---------------------------------------------------------------------------

/// Read an aligned replicate table (`Combined.csv`).
pub fn read_aligned_table(path: &Path) -> Result<AlignedMatrix> {
    let (_, wavenumbers, intensities) = read_labelled_table(path)?;
    Ok(AlignedMatrix {
        wavenumbers,
        intensities,
    })
}

/// Read a correlation map; column labels become `x`, row labels `y`.
pub fn read_correlation_map(path: &Path) -> Result<CorrelationMap> {
    let (header, y, values) = read_labelled_table(path)?;
    let x = header
        .iter()
        .map(|h| {
            h.parse::<f64>().map_err(|_| {
                CosError::format(path, format!("column label '{h}' is not a wavenumber"))
            })
        })
        .collect::<Result<Vec<f64>>>()?;
    Ok(CorrelationMap { x, y, values })
}

fn read_labelled_table(path: &Path) -> Result<(Vec<String>, Vec<f64>, DMatrix<f64>)> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| CosError::csv(path, e))?;

    let header: Vec<String> = reader
        .headers()
        .map_err(|e| CosError::csv(path, e))?
        .iter()
        .skip(1)
        .map(str::to_string)
        .collect();

    let mut labels = Vec::new();
    let mut body = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.map_err(|e| CosError::csv(path, e))?;
        if record.len() != header.len() + 1 {
            return Err(CosError::format(
                path,
                format!(
                    "row {row_no} has {} cells, expected {}",
                    record.len(),
                    header.len() + 1
                ),
            ));
        }
        for (col_idx, cell) in record.iter().enumerate() {
            let value = cell.parse::<f64>().map_err(|_| {
                CosError::format(
                    path,
                    format!("row {row_no}, column {col_idx}: '{cell}' is not a number"),
                )
            })?;
            if col_idx == 0 {
                labels.push(value);
            } else {
                body.push(value);
            }
        }
    }

    let values = DMatrix::from_row_iterator(labels.len(), header.len(), body);
    Ok((header, labels, values))
}
