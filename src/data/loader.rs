use std::path::Path;

use ndarray::{Array2, Array3, Array4, ArrayView2, ArrayView3, Axis};

use crate::error::{Error, Result};

use super::classify::{collect_model_dirs, receiver_files, station_id};
use super::model::{Ensemble, FinalIndex, StationRecord, TRACE_ROWS};

/// Descriptive lines preceding the data rows of a receiver file.
const HEADER_LINES: usize = 5;

/// Columns of a receiver row holding time, v1, v2 and v3.
const USED_COLUMNS: [usize; TRACE_ROWS] = [0, 7, 8, 9];

const MIN_COLUMNS: usize = 10;

// ---------------------------------------------------------------------------
// Single receiver file
// ---------------------------------------------------------------------------

/// Load one SeisSol receiver file into a `(4, ndt)` array of time, v1, v2, v3.
///
/// File layout:
/// ```text
/// TITLE = "Temporal Signal for receiver number 1"
/// VARIABLES = "Time","xx","yy","zz","xy","yz","xz","v1","v2","v3"
/// # x1 ...
/// # x2 ...
/// # x3 ...
/// 0.000000e+00 <six stress columns> <v1> <v2> <v3>
/// ```
/// Blank lines and `#` comments after the header are ignored.
pub fn load_receiver_file(path: &Path, final_ind: FinalIndex) -> Result<Array2<f64>> {
    let bytes = std::fs::read(path).map_err(|e| Error::io(path, e))?;

    let mut columns: [Vec<f64>; TRACE_ROWS] = Default::default();

    // Decoded line by line so that bad bytes are reported where they occur.
    for (idx, raw) in bytes.split(|&b| b == b'\n').enumerate().skip(HEADER_LINES) {
        let line_no = idx + 1;
        let line = std::str::from_utf8(raw).map_err(|e| Error::FileFormat {
            path: path.to_path_buf(),
            line: line_no,
            reason: format!("not valid UTF-8 text ({e})"),
        })?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let tokens: Vec<&str> = trimmed.split_whitespace().collect();
        if tokens.len() < MIN_COLUMNS {
            return Err(Error::FileFormat {
                path: path.to_path_buf(),
                line: line_no,
                reason: format!(
                    "expected at least {MIN_COLUMNS} columns, found {}",
                    tokens.len()
                ),
            });
        }

        for (column, &col_idx) in columns.iter_mut().zip(USED_COLUMNS.iter()) {
            let tok = tokens[col_idx];
            let value = tok.parse::<f64>().map_err(|_| Error::FileFormat {
                path: path.to_path_buf(),
                line: line_no,
                reason: format!("column {col_idx}: '{tok}' is not a number"),
            })?;
            column.push(value);
        }
    }

    let n = final_ind.resolve(columns[0].len());
    Ok(Array2::from_shape_fn((TRACE_ROWS, n), |(row, i)| columns[row][i]))
}

// ---------------------------------------------------------------------------
// One directory → StationRecord
// ---------------------------------------------------------------------------

/// Load every receiver file of `dir` (sorted by file name) into a
/// `(n_receivers, 4, ndt)` array.
pub fn load_directory(dir: &Path, final_ind: FinalIndex) -> Result<StationRecord> {
    let files = receiver_files(dir).map_err(|e| Error::io(dir, e))?;
    if files.is_empty() {
        return Err(Error::NoReceivers(dir.to_path_buf()));
    }

    let mut traces = Vec::with_capacity(files.len());
    for name in &files {
        let trace = load_receiver_file(&dir.join(name), final_ind)?;
        if let Some(first) = traces.first() {
            check_shape(first, &trace, &dir.join(name))?;
        }
        traces.push(trace);
    }

    let views: Vec<ArrayView2<'_, f64>> = traces.iter().map(|t| t.view()).collect();
    let data: Array3<f64> = ndarray::stack(Axis(0), &views).map_err(|e| Error::ShapeMismatch {
        context: format!("{}: {e}", dir.display()),
        expected: traces[0].shape().to_vec(),
        found: Vec::new(),
    })?;

    let station_ids = files.iter().map(|f| station_id(f)).collect();
    Ok(StationRecord {
        files,
        station_ids,
        data,
    })
}

fn check_shape(expected: &Array2<f64>, found: &Array2<f64>, path: &Path) -> Result<()> {
    if expected.shape() != found.shape() {
        return Err(Error::ShapeMismatch {
            context: path.display().to_string(),
            expected: expected.shape().to_vec(),
            found: found.shape().to_vec(),
        });
    }
    Ok(())
}

/// Load the observed receivers.
///
/// Observations always drop their final sample, like the synthetics do by
/// default, unless every synthetic timestep is kept: then the observations
/// keep theirs too, so equally long records still line up.
pub fn load_observations(dir: &Path, synthetic: FinalIndex) -> Result<StationRecord> {
    let final_ind = match synthetic {
        FinalIndex::All => FinalIndex::All,
        FinalIndex::Bound(_) => FinalIndex::default(),
    };
    load_directory(dir, final_ind)
}

// ---------------------------------------------------------------------------
// Ensemble root → Ensemble
// ---------------------------------------------------------------------------

/// Load every valid simulation directory under `root` into a
/// `(n_models, n_stations, 4, ndt)` array, models in sorted name order.
///
/// All members must share the same station list and timestep count.
pub fn load_ensemble(root: &Path, final_ind: FinalIndex) -> Result<Ensemble> {
    let model_names = collect_model_dirs(root)?;
    log::info!("Reading synthetic data from the following directories: {model_names:?}");
    if model_names.is_empty() {
        return Err(Error::EmptyEnsemble(root.to_path_buf()));
    }

    let mut records: Vec<StationRecord> = Vec::with_capacity(model_names.len());
    for name in &model_names {
        let record = load_directory(&root.join(name), final_ind)?;
        if let Some(first) = records.first() {
            if first.data.shape() != record.data.shape() {
                return Err(Error::ShapeMismatch {
                    context: format!("model {name}"),
                    expected: first.data.shape().to_vec(),
                    found: record.data.shape().to_vec(),
                });
            }
            if first.station_ids != record.station_ids {
                return Err(Error::StationMismatch {
                    context: format!("model {name}"),
                    expected: first.station_ids.clone(),
                    found: record.station_ids,
                });
            }
        }
        records.push(record);
    }

    let views: Vec<ArrayView3<'_, f64>> = records.iter().map(|r| r.view()).collect();
    let data: Array4<f64> = ndarray::stack(Axis(0), &views).map_err(|e| Error::ShapeMismatch {
        context: format!("{}: {e}", root.display()),
        expected: records[0].data.shape().to_vec(),
        found: Vec::new(),
    })?;

    let station_ids = records.swap_remove(0).station_ids;
    Ok(Ensemble {
        model_names,
        station_ids,
        data,
    })
}
