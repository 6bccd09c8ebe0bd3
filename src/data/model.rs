use std::fmt;
use std::str::FromStr;

use ndarray::{Array3, Array4, ArrayView3};

/// Row of a trace holding the sample times.
pub const TIME_ROW: usize = 0;

/// Rows of a trace holding the three velocity components.
pub const VELOCITY_ROWS: [usize; 3] = [1, 2, 3];

/// Rows per trace: time plus three velocity components.
pub const TRACE_ROWS: usize = 4;

// ---------------------------------------------------------------------------
// FinalIndex – how many leading timesteps to keep
// ---------------------------------------------------------------------------

/// Exclusive upper bound on the retained timesteps of a trace.
///
/// Follows slice-end semantics: `k >= 0` keeps `[0, min(k, n))`, a negative
/// `k` counts from the end and keeps `[0, max(n + k, 0))`. The default of
/// `-1` therefore drops the final sample. Use [`FinalIndex::All`] to keep
/// every timestep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalIndex {
    All,
    Bound(i64),
}

impl FinalIndex {
    /// Number of samples retained from a trace of `n` samples.
    pub fn resolve(self, n: usize) -> usize {
        match self {
            FinalIndex::All => n,
            FinalIndex::Bound(k) if k >= 0 => n.min(k as usize),
            FinalIndex::Bound(k) => n.saturating_sub(k.unsigned_abs() as usize),
        }
    }
}

impl Default for FinalIndex {
    fn default() -> Self {
        FinalIndex::Bound(-1)
    }
}

impl From<i64> for FinalIndex {
    fn from(k: i64) -> Self {
        FinalIndex::Bound(k)
    }
}

impl FromStr for FinalIndex {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i64>().map(FinalIndex::Bound)
    }
}

impl fmt::Display for FinalIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FinalIndex::All => write!(f, "all"),
            FinalIndex::Bound(k) => write!(f, "{k}"),
        }
    }
}

// ---------------------------------------------------------------------------
// StationRecord – every receiver of one directory
// ---------------------------------------------------------------------------

/// All receiver traces of one simulation (or observation) directory.
#[derive(Debug, Clone)]
pub struct StationRecord {
    /// Receiver file names, sorted lexicographically.
    pub files: Vec<String>,
    /// Station identifiers parallel to `files`.
    pub station_ids: Vec<String>,
    /// Traces shaped `(n_receivers, 4, ndt)`.
    pub data: Array3<f64>,
}

impl StationRecord {
    pub fn n_stations(&self) -> usize {
        self.data.shape()[0]
    }

    pub fn n_timesteps(&self) -> usize {
        self.data.shape()[2]
    }

    pub fn view(&self) -> ArrayView3<'_, f64> {
        self.data.view()
    }
}

// ---------------------------------------------------------------------------
// Ensemble – every candidate model
// ---------------------------------------------------------------------------

/// Waveforms of every candidate model, stacked into one regular array.
#[derive(Debug, Clone)]
pub struct Ensemble {
    /// Model directory names, sorted ascending.
    pub model_names: Vec<String>,
    /// Station identifiers shared by every model.
    pub station_ids: Vec<String>,
    /// Traces shaped `(n_models, n_stations, 4, ndt)`.
    pub data: Array4<f64>,
}

impl Ensemble {
    pub fn n_models(&self) -> usize {
        self.data.shape()[0]
    }

    pub fn n_stations(&self) -> usize {
        self.data.shape()[1]
    }

    pub fn n_timesteps(&self) -> usize {
        self.data.shape()[3]
    }

    /// Traces of model `index`, shaped `(n_stations, 4, ndt)`.
    pub fn model(&self, index: usize) -> ArrayView3<'_, f64> {
        self.data.index_axis(ndarray::Axis(0), index)
    }
}
