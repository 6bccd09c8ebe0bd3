use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

const N_STATIONS: usize = 6;
const DT: f64 = 0.01;
const OBS_STEPS: usize = 700;
const SYN_STEPS: usize = 600;

/// Ricker wavelet with peak frequency `freq` centred on `t0`.
fn ricker(t: f64, t0: f64, freq: f64) -> f64 {
    let a = (std::f64::consts::PI * freq * (t - t0)).powi(2);
    (1.0 - 2.0 * a) * (-a).exp()
}

/// A candidate source: rupture speed scales arrival times, `moment` scales amplitude.
#[derive(Debug, Clone, Copy)]
struct Source {
    speed: f64,
    moment: f64,
}

fn station_distance(station: usize) -> f64 {
    1.0 + 0.75 * station as f64
}

fn station_samples(
    source: Source,
    station: usize,
    n_steps: usize,
    t_shift: f64,
    noise: Normal<f64>,
    rng: &mut StdRng,
) -> Vec<[f64; 4]> {
    let distance = station_distance(station);
    let arrival = distance / source.speed + t_shift;
    let amplitude = source.moment / distance;
    (0..n_steps)
        .map(|i| {
            let t = i as f64 * DT;
            let v1 = amplitude * ricker(t, arrival, 4.0);
            let v2 = 0.6 * amplitude * ricker(t, arrival + 0.05, 3.0);
            let v3 = 0.3 * amplitude * ricker(t, arrival + 0.1, 5.0);
            [
                t,
                v1 + noise.sample(rng),
                v2 + noise.sample(rng),
                v3 + noise.sample(rng),
            ]
        })
        .collect()
}

fn write_receiver(path: &Path, station: usize, samples: &[[f64; 4]]) -> Result<()> {
    let mut text = String::new();
    writeln!(text, "TITLE = \"Temporal Signal for receiver number {}\"", station + 1)?;
    writeln!(
        text,
        "VARIABLES = \"Time\",\"xx\",\"yy\",\"zz\",\"xy\",\"yz\",\"xz\",\"v1\",\"v2\",\"v3\""
    )?;
    writeln!(text, "# x1       {:.6e}", station_distance(station) * 1000.0)?;
    writeln!(text, "# x2       {:.6e}", 0.0)?;
    writeln!(text, "# x3       {:.6e}", 0.0)?;
    for [t, v1, v2, v3] in samples {
        writeln!(
            text,
            "  {t:.15e}  0.0 0.0 0.0 0.0 0.0 0.0  {v1:.15e} {v2:.15e} {v3:.15e}"
        )?;
    }
    std::fs::write(path, text).with_context(|| format!("writing {}", path.display()))
}

fn write_surface_xdmf(dir: &Path, prefix: &str) -> Result<()> {
    let xml = format!(
        r#"<?xml version="1.0" ?>
<!DOCTYPE Xdmf SYSTEM "Xdmf.dtd" []>
<Xdmf Version="2.0">
 <Domain>
  <Grid Name="TimeSeries" GridType="Collection" CollectionType="Temporal">
   <Grid Name="step_000000000000" GridType="Uniform">
    <Topology TopologyType="Triangle" NumberOfElements="2048">
     <DataItem NumberType="Int" Precision="8" Format="HDF" Dimensions="2048 3">{prefix}-surface_cell.h5:/connect</DataItem>
    </Topology>
    <Time Value="0"/>
   </Grid>
  </Grid>
 </Domain>
</Xdmf>
"#
    );
    let path = dir.join(format!("{prefix}-surface.xdmf"));
    std::fs::write(&path, xml).with_context(|| format!("writing {}", path.display()))
}

#[allow(clippy::too_many_arguments)]
fn write_run(
    dir: &Path,
    prefix: &str,
    source: Source,
    n_steps: usize,
    t_shift: f64,
    noise_level: f64,
    rng: &mut StdRng,
    with_metadata: bool,
) -> Result<()> {
    let noise = Normal::new(0.0, noise_level)?;
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    if with_metadata {
        write_surface_xdmf(dir, prefix)?;
    }
    for station in 0..N_STATIONS {
        let samples = station_samples(source, station, n_steps, t_shift, noise, rng);
        let name = format!("{prefix}-receiver-{:05}-00000.dat", station + 1);
        write_receiver(&dir.join(name), station, &samples)?;
    }
    Ok(())
}

fn main() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(42);
    let root = Path::new("sample_data");

    // "True" source, recorded with a longer window and a delayed start.
    let truth = Source {
        speed: 3.2,
        moment: 1.5,
    };
    write_run(
        &root.join("observations"),
        "obs",
        truth,
        OBS_STEPS,
        0.4,
        0.01,
        &mut rng,
        false,
    )?;

    let speeds = [2.6, 3.0, 3.2, 3.6];
    let moments = [1.0, 1.5];
    let mut n_models = 0;
    for &speed in &speeds {
        for &moment in &moments {
            let name = format!("model_{n_models:02}");
            write_run(
                &root.join("ensemble").join(&name),
                &name,
                Source { speed, moment },
                SYN_STEPS,
                0.0,
                0.0,
                &mut rng,
                true,
            )?;
            n_models += 1;
        }
    }

    // A broken run: receivers present, surface output truncated.
    let broken = root.join("ensemble").join("model_broken");
    write_run(&broken, "model_broken", truth, SYN_STEPS, 0.0, 0.0, &mut rng, false)?;
    std::fs::write(broken.join("model_broken-surface.xdmf"), "<Xdmf><Domain>")
        .context("writing broken surface file")?;

    println!(
        "Wrote {N_STATIONS} observed stations ({OBS_STEPS} steps) and {n_models} models ({SYN_STEPS} steps) to {}",
        root.display()
    );
    Ok(())
}
