/// Data layer: discovery and loading of SeisSol output.
///
/// Architecture:
/// ```text
///   ensemble root
///        │
///        ▼
///   ┌──────────┐
///   │ classify  │  which subdirectories hold receivers + a readable surface.xdmf
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse receiver .dat files → StationRecord / Ensemble
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  model    │  (n_models, n_stations, 4, ndt) arrays + names
///   └──────────┘
/// ```

pub mod classify;
pub mod loader;
pub mod model;
pub mod xdmf;

#[cfg(test)]
pub(crate) mod fixtures;
