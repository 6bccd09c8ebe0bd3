//! Search an ensemble of SeisSol simulations for the model whose surface
//! receiver waveforms best match a set of observed waveforms.
//!
//! Pipeline:
//! ```text
//!  ensemble root ──► data::classify ──► data::loader ──► misfit ──► search
//!                    (valid dirs)       (4-D array)      (per model) (argmin)
//! ```

pub mod data;
pub mod error;
pub mod misfit;
pub mod search;

pub use error::{Error, Result};
