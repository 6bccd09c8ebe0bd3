use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use seis_bestfit::data::loader::{load_ensemble, load_observations};
use seis_bestfit::data::model::FinalIndex;
use seis_bestfit::search::{find_best_fit, write_report};

#[derive(Debug, Parser)]
#[command(name = "seis-bestfit")]
#[command(about = "Search the best-fit model of the ensemble")]
struct Cli {
    /// Directory with the observed receiver files
    obs_path: PathBuf,

    /// Directory containing one SeisSol output subdirectory per model
    ensemble_dir: PathBuf,

    /// Last index (exclusive) of the synthetic data to be loaded; negative
    /// values count from the end
    #[arg(long = "final_ind", alias = "final-ind", default_value = "-1", allow_hyphen_values = true)]
    final_ind: FinalIndex,

    /// Load every observed and synthetic timestep (overrides --final_ind)
    #[arg(long, default_value_t = false)]
    all_timesteps: bool,

    /// Write the misfit ranking to this CSV file
    #[arg(long)]
    report: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let final_ind = if cli.all_timesteps {
        FinalIndex::All
    } else {
        cli.final_ind
    };

    let obs = load_observations(&cli.obs_path, final_ind)
        .with_context(|| format!("loading observations from {}", cli.obs_path.display()))?;
    log::info!("Observations contain {} stations.", obs.n_stations());
    log::info!("Observations contain {} time steps.", obs.n_timesteps());

    let ensemble = load_ensemble(&cli.ensemble_dir, final_ind)
        .with_context(|| format!("loading ensemble from {}", cli.ensemble_dir.display()))?;
    log::info!("Synthetics contain {} stations.", ensemble.n_stations());
    log::info!("Synthetics contain {} time steps.", ensemble.n_timesteps());

    let best = find_best_fit(&obs, &ensemble).context("computing model misfits")?;

    let listed: Vec<String> = best.misfits.iter().map(|m| format!("{m:.5}")).collect();
    println!("List of all model misfits: [{}]", listed.join(", "));
    println!("{best}");

    if let Some(path) = &cli.report {
        write_report(path, &best)
            .with_context(|| format!("writing report to {}", path.display()))?;
        log::info!("Wrote misfit ranking to {}", path.display());
    }

    println!("Done.");
    Ok(())
}
