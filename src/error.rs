use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading waveforms or scoring models.
///
/// Everything here is fatal for a run: directory-level problems found
/// during discovery are recovered inside [`crate::data::classify`] and
/// never surface as an `Error`.
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{path}:{line}: {reason}")]
    FileFormat {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("no receiver files found in {0}")]
    NoReceivers(PathBuf),

    #[error("no simulation output directories found under {0}")]
    EmptyEnsemble(PathBuf),

    #[error("ensemble contains no models to score")]
    NoModels,

    #[error("shape mismatch in {context}: expected {expected:?}, got {found:?}")]
    ShapeMismatch {
        context: String,
        expected: Vec<usize>,
        found: Vec<usize>,
    },

    #[error("station mismatch in {context}: expected {expected:?}, got {found:?}")]
    StationMismatch {
        context: String,
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("observed trace has {observed} samples, shorter than synthetic trace ({synthetic})")]
    TraceTooShort { observed: usize, synthetic: usize },

    #[error("cannot compare empty traces")]
    EmptyTrace,

    #[error("trace lengths differ: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },

    #[error("writing report {path}: {source}")]
    Report {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
