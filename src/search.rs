use std::fmt;
use std::path::Path;

use ndarray::Array1;
use rayon::prelude::*;
use serde::Serialize;

use crate::data::model::{Ensemble, StationRecord};
use crate::error::{Error, Result};
use crate::misfit::model_misfit;

// ---------------------------------------------------------------------------
// Best-fit search
// ---------------------------------------------------------------------------

/// Misfit of every ensemble member and the index of the smallest one.
#[derive(Debug, Clone)]
pub struct BestFit {
    pub model_names: Vec<String>,
    /// Summed misfit per model, parallel to `model_names`.
    pub misfits: Array1<f64>,
    pub best_index: usize,
}

impl BestFit {
    pub fn best_name(&self) -> &str {
        &self.model_names[self.best_index]
    }

    pub fn best_misfit(&self) -> f64 {
        self.misfits[self.best_index]
    }

    /// `(model, misfit)` pairs ordered from best to worst. Ties keep model order.
    pub fn ranking(&self) -> Vec<(&str, f64)> {
        let mut ranked: Vec<(&str, f64)> = self
            .model_names
            .iter()
            .map(String::as_str)
            .zip(self.misfits.iter().copied())
            .collect();
        ranked.sort_by(|a, b| a.1.total_cmp(&b.1));
        ranked
    }
}

impl fmt::Display for BestFit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} yields the smallest misfit ({:.5}).",
            self.best_name(),
            self.best_misfit()
        )
    }
}

/// Score every model of `ensemble` against the observations and pick the
/// one with the smallest summed misfit.
///
/// Stations are joined by ID: the observation must list exactly the
/// ensemble's stations, in the same order. Models are scored in parallel;
/// scores stay attached to their model names.
pub fn find_best_fit(obs: &StationRecord, ensemble: &Ensemble) -> Result<BestFit> {
    if obs.station_ids != ensemble.station_ids {
        return Err(Error::StationMismatch {
            context: "observations vs. ensemble".to_string(),
            expected: ensemble.station_ids.clone(),
            found: obs.station_ids.clone(),
        });
    }
    if ensemble.n_models() == 0 {
        return Err(Error::NoModels);
    }

    let misfits: Vec<f64> = (0..ensemble.n_models())
        .into_par_iter()
        .map(|i| model_misfit(obs.view(), ensemble.model(i)))
        .collect::<Result<_>>()?;
    let misfits = Array1::from(misfits);

    Ok(BestFit {
        model_names: ensemble.model_names.clone(),
        best_index: argmin(&misfits),
        misfits,
    })
}

/// Index of the first smallest value. NaN never wins against a number.
fn argmin(values: &Array1<f64>) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate() {
        if v < values[best] || (values[best].is_nan() && !v.is_nan()) {
            best = i;
        }
    }
    best
}

// ---------------------------------------------------------------------------
// CSV report
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ReportRow<'a> {
    rank: usize,
    model: &'a str,
    misfit: f64,
}

/// Write the ranking as CSV (`rank,model,misfit`), best model first.
pub fn write_report(path: &Path, best_fit: &BestFit) -> Result<()> {
    let report_err = |source: csv::Error| Error::Report {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = csv::Writer::from_path(path).map_err(report_err)?;
    for (i, (model, misfit)) in best_fit.ranking().into_iter().enumerate() {
        writer
            .serialize(ReportRow {
                rank: i + 1,
                model,
                misfit,
            })
            .map_err(report_err)?;
    }
    writer
        .flush()
        .map_err(|e| report_err(csv::Error::from(e)))?;
    Ok(())
}
