use std::io;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

use super::xdmf::read_element_count;

const RECEIVER_TOKEN: &str = "receiver";
const RECEIVER_EXTENSION: &str = "dat";
const SURFACE_SUFFIX: &str = "-surface.xdmf";

// ---------------------------------------------------------------------------
// Naming rules
// ---------------------------------------------------------------------------

/// SeisSol surface receiver files carry a `receiver` token between dashes
/// and the `.dat` extension, e.g. `run-receiver-00003-00000.dat`.
pub fn is_receiver_file(name: &str) -> bool {
    let has_token = name.split('-').any(|tok| tok == RECEIVER_TOKEN);
    let extension = name.rsplit('.').next().unwrap_or("");
    has_token && extension == RECEIVER_EXTENSION
}

pub fn is_surface_metadata_file(name: &str) -> bool {
    name.ends_with(SURFACE_SUFFIX)
}

/// Station identifier of a receiver file: the token after `receiver` in the
/// dash-split stem, or the whole stem if there is none.
pub fn station_id(name: &str) -> String {
    let stem = name.rsplit_once('.').map_or(name, |(stem, _)| stem);
    let mut tokens = stem.split('-');
    while let Some(tok) = tokens.next() {
        if tok == RECEIVER_TOKEN {
            if let Some(id) = tokens.next() {
                return id.to_string();
            }
        }
    }
    stem.to_string()
}

/// Names of all receiver files in `dir`, sorted lexicographically.
pub fn receiver_files(dir: &Path) -> io::Result<Vec<String>> {
    let mut names: Vec<String> = file_names(dir)?
        .into_iter()
        .filter(|n| is_receiver_file(n))
        .collect();
    names.sort();
    Ok(names)
}

fn file_names(dir: &Path) -> io::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        // Non-UTF-8 names can never match the naming rules.
        if let Ok(name) = entry.file_name().into_string() {
            names.push(name);
        }
    }
    Ok(names)
}

// ---------------------------------------------------------------------------
// Directory classification
// ---------------------------------------------------------------------------

/// Outcome of inspecting one candidate simulation output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirClass {
    /// Receivers present and at least one readable surface XDMF file.
    Valid { receivers: usize },
    /// Receivers present, but every surface XDMF file failed to load.
    InvalidMetadata { defective: Vec<PathBuf> },
    /// Receivers present, no surface XDMF file at all.
    NoMetadata,
    /// No receiver files; metadata is irrelevant.
    NoReceivers,
}

impl DirClass {
    pub fn is_valid(&self) -> bool {
        matches!(self, DirClass::Valid { .. })
    }
}

/// Inspect `dir` and decide whether it holds usable SeisSol output.
///
/// Every defective surface XDMF file is reported with a warning, even when
/// the directory is later rejected for lacking receivers. Listing failures
/// are returned as-is so the caller can decide whether they are recoverable.
pub fn classify_dir(dir: &Path) -> io::Result<DirClass> {
    let names = file_names(dir)?;

    let mut readable_metadata = 0usize;
    let mut defective = Vec::new();
    for name in names.iter().filter(|n| is_surface_metadata_file(n)) {
        let path = dir.join(name);
        match read_element_count(&path) {
            Ok(n) => {
                log::debug!("{}: {n} surface elements", path.display());
                readable_metadata += 1;
            }
            Err(e) => {
                log::warn!("A defective surface.xdmf file was detected: {} ({e})", path.display());
                defective.push(path);
            }
        }
    }

    let receivers = names.iter().filter(|n| is_receiver_file(n)).count();

    Ok(if receivers == 0 {
        DirClass::NoReceivers
    } else if readable_metadata > 0 {
        DirClass::Valid { receivers }
    } else if !defective.is_empty() {
        DirClass::InvalidMetadata { defective }
    } else {
        DirClass::NoMetadata
    })
}

// ---------------------------------------------------------------------------
// Ensemble collection
// ---------------------------------------------------------------------------

/// I/O failures on a single candidate directory that only exclude it.
fn is_recoverable(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied
    )
}

/// Names of all subdirectories of `root` that hold valid SeisSol output,
/// sorted ascending.
pub fn collect_model_dirs(root: &Path) -> Result<Vec<String>> {
    let entries = std::fs::read_dir(root).map_err(|e| Error::io(root, e))?;

    let mut dirs = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| Error::io(root, e))?;
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }

        match classify_dir(&path) {
            Ok(DirClass::Valid { receivers }) => {
                log::debug!("{name}: {receivers} receivers");
                dirs.push(name);
            }
            Ok(class) => log::debug!("skipping {name}: {class:?}"),
            Err(e) if is_recoverable(&e) => log::debug!("skipping {name}: {e}"),
            Err(e) => return Err(Error::io(path, e)),
        }
    }

    dirs.sort();
    dirs.dedup();
    Ok(dirs)
}
