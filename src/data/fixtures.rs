//! Helpers for building SeisSol-like output directories in tests.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, Once};

/// One sample row: time, v1, v2, v3.
pub type Sample = [f64; 4];

pub fn ramp(n: usize) -> Vec<Sample> {
    (0..n)
        .map(|i| {
            let t = i as f64 * 0.1;
            [t, t.sin(), (2.0 * t).cos(), 0.5 * t]
        })
        .collect()
}

pub fn write_receiver(dir: &Path, name: &str, samples: &[Sample]) -> PathBuf {
    let mut text = String::new();
    text.push_str("TITLE = \"Temporal Signal for receiver number 1\"\n");
    text.push_str(
        "VARIABLES = \"Time\",\"xx\",\"yy\",\"zz\",\"xy\",\"yz\",\"xz\",\"v1\",\"v2\",\"v3\"\n",
    );
    text.push_str("# x1       1.000000e+03\n");
    text.push_str("# x2       2.000000e+03\n");
    text.push_str("# x3       0.000000e+00\n");
    for [t, v1, v2, v3] in samples {
        let _ = writeln!(
            text,
            "  {t:.15e} 0 0 0 0 0 0 {v1:.15e} {v2:.15e} {v3:.15e}"
        );
    }
    let path = dir.join(name);
    std::fs::write(&path, text).unwrap();
    path
}

pub fn write_surface_xdmf(dir: &Path, prefix: &str) -> PathBuf {
    let xml = format!(
        r#"<?xml version="1.0" ?>
<Xdmf Version="2.0">
 <Domain>
  <Grid Name="TimeSeries" GridType="Collection" CollectionType="Temporal">
   <Grid Name="step_000000000000" GridType="Uniform">
    <Topology TopologyType="Triangle" NumberOfElements="12">
     <DataItem Format="HDF" Dimensions="12 3">{prefix}-surface_cell.h5:/connect</DataItem>
    </Topology>
   </Grid>
  </Grid>
 </Domain>
</Xdmf>
"#
    );
    let path = dir.join(format!("{prefix}-surface.xdmf"));
    std::fs::write(&path, xml).unwrap();
    path
}

/// Create `root/name` with a surface XDMF file and one receiver per station.
pub fn write_model_dir(root: &Path, name: &str, stations: &[Vec<Sample>]) -> PathBuf {
    let dir = root.join(name);
    std::fs::create_dir_all(&dir).unwrap();
    write_surface_xdmf(&dir, name);
    for (i, samples) in stations.iter().enumerate() {
        write_receiver(&dir, &format!("{name}-receiver-{:05}-00000.dat", i + 1), samples);
    }
    dir
}

// ---------------------------------------------------------------------------
// Log capture
// ---------------------------------------------------------------------------

static CAPTURED: Mutex<Vec<String>> = Mutex::new(Vec::new());
static INSTALL: Once = Once::new();

struct CaptureLogger;

static LOGGER: CaptureLogger = CaptureLogger;

impl log::Log for CaptureLogger {
    fn enabled(&self, _: &log::Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &log::Record<'_>) {
        if let Ok(mut lines) = CAPTURED.lock() {
            lines.push(format!("{} {}", record.level(), record.args()));
        }
    }

    fn flush(&self) {}
}

/// Route log records into an in-memory buffer for the whole test binary.
pub fn capture_logs() {
    INSTALL.call_once(|| {
        if log::set_logger(&LOGGER).is_ok() {
            log::set_max_level(log::LevelFilter::Trace);
        }
    });
}

/// Captured lines mentioning `needle`. Tests share the buffer, so callers
/// should search for something unique to them, such as a temp path.
pub fn logged_lines(needle: &str) -> Vec<String> {
    CAPTURED
        .lock()
        .map(|lines| lines.iter().filter(|l| l.contains(needle)).cloned().collect())
        .unwrap_or_default()
}
