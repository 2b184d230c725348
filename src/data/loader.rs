use std::path::Path;
use std::sync::Arc;

use arrow::array::{Array, Float32Array, Float64Array, LargeListArray, ListArray};
use arrow::datatypes::DataType;
use log::{debug, info};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{Spectrum, SpectrumSet};
use crate::error::{CosError, Result};

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load every replicate stored in one file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv` / `.txt` / no extension – headerless table, wavenumber in the
///   first column, one replicate per following column
/// * `.json`    – `[{ "x": [...], "y": [...] }, ...]`, one replicate per record
/// * `.parquet` – `x` and `y` list columns, one replicate per row
///
/// A CSV with more than two columns is read as several replicates sharing
/// the first column's wavenumbers, not as one replicate with extra data:
/// `10,1,4` contributes `stem#1` = `[1]` and `stem#2` = `[4]`. Drop surplus
/// columns beforehand when only the first intensity column is meant.
pub fn load_replicate_file(path: &Path) -> Result<Vec<Spectrum>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let spectra = match ext.as_str() {
        "parquet" | "pq" => load_parquet(path)?,
        "json" => load_json(path)?,
        "csv" | "txt" | "" => load_csv(path)?,
        other => {
            return Err(CosError::format(
                path,
                format!("unsupported file extension: .{other}"),
            ))
        }
    };
    debug!(
        "{}: {} replicate(s) of {} point(s)",
        path.display(),
        spectra.len(),
        spectra.first().map_or(0, Spectrum::len)
    );
    Ok(spectra)
}

/// Load a replicate set from files, keeping the order of `paths`.
pub fn load_set<P: AsRef<Path>>(paths: &[P]) -> Result<SpectrumSet> {
    let mut set = SpectrumSet::default();
    for path in paths {
        for spectrum in load_replicate_file(path.as_ref())? {
            set.push(spectrum);
        }
    }
    info!(
        "loaded {} replicate(s) from {} file(s)",
        set.len(),
        paths.len()
    );
    Ok(set)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("replicate")
        .to_string()
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// Headerless CSV layout, as exported by the spectrometer software:
///   `4000.0,0.12`
///   `3999.0,0.14`
/// Additional columns are further replicates on the same wavenumbers.
fn load_csv(path: &Path) -> Result<Vec<Spectrum>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| CosError::csv(path, e))?;

    let mut x = Vec::new();
    let mut columns: Vec<Vec<f64>> = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        let record = result.map_err(|e| CosError::csv(path, e))?;
        if row_no == 0 {
            if record.len() < 2 {
                return Err(CosError::format(
                    path,
                    "expected a wavenumber column and at least one intensity column",
                ));
            }
            columns = vec![Vec::new(); record.len() - 1];
        } else if record.len() != columns.len() + 1 {
            return Err(CosError::format(
                path,
                format!(
                    "row {row_no} has {} columns, expected {}",
                    record.len(),
                    columns.len() + 1
                ),
            ));
        }

        for (col_idx, field) in record.iter().enumerate() {
            let value = field.parse::<f64>().map_err(|_| {
                CosError::format(
                    path,
                    format!("row {row_no}, column {col_idx}: '{field}' is not a number"),
                )
            })?;
            if col_idx == 0 {
                x.push(value);
            } else {
                columns[col_idx - 1].push(value);
            }
        }
    }

    if x.is_empty() {
        return Err(CosError::format(path, "file contains no rows"));
    }

    let stem = file_stem(path);
    let single = columns.len() == 1;
    Ok(columns
        .into_iter()
        .enumerate()
        .map(|(i, y)| {
            let label = if single {
                stem.clone()
            } else {
                format!("{stem}#{}", i + 1)
            };
            Spectrum::new(label, x.clone(), y)
        })
        .collect())
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "x": [4000.0, 3999.0, ...], "y": [0.12, 0.14, ...] },
///   ...
/// ]
/// ```
/// Other keys are ignored.
fn load_json(path: &Path) -> Result<Vec<Spectrum>> {
    let text = std::fs::read_to_string(path).map_err(|e| CosError::io(path, e))?;
    let root: JsonValue = serde_json::from_str(&text)?;

    let records = root
        .as_array()
        .ok_or_else(|| CosError::format(path, "expected top-level JSON array"))?;

    let stem = file_stem(path);
    let mut spectra = Vec::with_capacity(records.len());

    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .ok_or_else(|| CosError::format(path, format!("record {i} is not a JSON object")))?;

        let x = json_array_to_f64(path, obj.get("x"), i, "x")?;
        let y = json_array_to_f64(path, obj.get("y"), i, "y")?;

        if x.len() != y.len() {
            return Err(CosError::format(
                path,
                format!("record {i}: x has {} values but y has {}", x.len(), y.len()),
            ));
        }

        spectra.push(Spectrum::new(format!("{stem}[{i}]"), x, y));
    }

    Ok(spectra)
}

fn json_array_to_f64(
    path: &Path,
    val: Option<&JsonValue>,
    row: usize,
    col: &str,
) -> Result<Vec<f64>> {
    let arr = val
        .and_then(|v| v.as_array())
        .ok_or_else(|| CosError::format(path, format!("record {row}: missing or invalid '{col}' array")))?;

    arr.iter()
        .enumerate()
        .map(|(j, v)| {
            v.as_f64().ok_or_else(|| {
                CosError::format(path, format!("record {row}, {col}[{j}]: not a number"))
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load replicates from a Parquet file.
///
/// Expected schema:
/// - `x`: List<Float64> or LargeList<Float64> – wavenumber arrays
/// - `y`: List<Float64> or LargeList<Float64> – intensity arrays
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<Vec<Spectrum>> {
    let file = std::fs::File::open(path).map_err(|e| CosError::io(path, e))?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;

    let stem = file_stem(path);
    let mut spectra = Vec::new();

    for batch_result in reader {
        let batch = batch_result?;
        let schema = batch.schema();

        let x_idx = schema
            .index_of("x")
            .map_err(|_| CosError::format(path, "Parquet file missing 'x' column"))?;
        let y_idx = schema
            .index_of("y")
            .map_err(|_| CosError::format(path, "Parquet file missing 'y' column"))?;

        let x_col = batch.column(x_idx);
        let y_col = batch.column(y_idx);

        for row in 0..batch.num_rows() {
            let index = spectra.len();
            let x = extract_f64_list(path, x_col, row)?;
            let y = extract_f64_list(path, y_col, row)?;

            if x.len() != y.len() {
                return Err(CosError::format(
                    path,
                    format!("row {index}: x has {} values but y has {}", x.len(), y.len()),
                ));
            }

            spectra.push(Spectrum::new(format!("{stem}[{index}]"), x, y));
        }
    }

    Ok(spectra)
}

/// Extract a `Vec<f64>` from a List or LargeList column at the given row.
fn extract_f64_list(path: &Path, col: &Arc<dyn Array>, row: usize) -> Result<Vec<f64>> {
    if col.is_null(row) {
        return Err(CosError::format(path, format!("row {row}: null value in list column")));
    }

    let values_array = match col.data_type() {
        DataType::List(_) => col
            .as_any()
            .downcast_ref::<ListArray>()
            .ok_or_else(|| CosError::format(path, "expected ListArray"))?
            .value(row),
        DataType::LargeList(_) => col
            .as_any()
            .downcast_ref::<LargeListArray>()
            .ok_or_else(|| CosError::format(path, "expected LargeListArray"))?
            .value(row),
        other => {
            return Err(CosError::format(
                path,
                format!("expected List or LargeList column, got {other:?}"),
            ))
        }
    };

    // The inner array can be Float64 or Float32
    if let Some(f64_arr) = values_array.as_any().downcast_ref::<Float64Array>() {
        Ok(f64_arr.iter().map(|v| v.unwrap_or(f64::NAN)).collect())
    } else if let Some(f32_arr) = values_array.as_any().downcast_ref::<Float32Array>() {
        Ok(f32_arr.iter().map(|v| v.unwrap_or(f32::NAN) as f64).collect())
    } else {
        Err(CosError::format(
            path,
            format!(
                "list inner type is {:?}, expected Float64 or Float32",
                values_array.data_type()
            ),
        ))
    }
}
