use std::fmt::Write as _;
use std::path::Path;

use approx::assert_abs_diff_eq;
use seis_bestfit::data::classify::collect_model_dirs;
use seis_bestfit::data::loader::{load_directory, load_ensemble, load_observations};
use seis_bestfit::data::model::FinalIndex;
use seis_bestfit::search::{find_best_fit, write_report};
use seis_bestfit::Error;

type Channels = [Vec<f64>; 3];

fn write_receiver(path: &Path, channels: &Channels) {
    let mut text = String::from("TITLE = \"receiver\"\nVARIABLES = ...\n# x1 0\n# x2 0\n# x3 0\n");
    for i in 0..channels[0].len() {
        writeln!(
            text,
            "{:.15e} 0 0 0 0 0 0 {:.15e} {:.15e} {:.15e}",
            i as f64 * 0.01,
            channels[0][i],
            channels[1][i],
            channels[2][i]
        )
        .unwrap();
    }
    std::fs::write(path, text).unwrap();
}

fn write_surface(dir: &Path, prefix: &str) {
    let xml = format!(
        "<Xdmf><Domain><Grid><Grid><Topology NumberOfElements=\"8\">\
         <DataItem Dimensions=\"8 3\">{prefix}-surface_cell.h5:/connect</DataItem>\
         </Topology></Grid></Grid></Domain></Xdmf>"
    );
    std::fs::write(dir.join(format!("{prefix}-surface.xdmf")), xml).unwrap();
}

fn write_run(dir: &Path, prefix: &str, stations: &[Channels], surface: bool) {
    std::fs::create_dir_all(dir).unwrap();
    if surface {
        write_surface(dir, prefix);
    }
    for (i, channels) in stations.iter().enumerate() {
        write_receiver(
            &dir.join(format!("{prefix}-receiver-{:05}-00000.dat", i + 1)),
            channels,
        );
    }
}

/// Quiet trace with a non-periodic pulse starting at `onset`.
fn pulse(n: usize, onset: usize, scale: f64) -> Vec<f64> {
    (0..n)
        .map(|i| {
            if (onset..onset + 20).contains(&i) {
                scale * (1.0 + 0.5 * ((i - onset) as f64 * 0.9).sin())
            } else {
                0.0
            }
        })
        .collect()
}

fn station(n: usize, onset: usize, station: usize) -> Channels {
    let s = 1.0 + station as f64;
    [pulse(n, onset, s), pulse(n, onset + 2, -0.5 * s), pulse(n, onset + 4, 0.25 * s)]
}

fn offset(channels: &Channels, by: f64) -> Channels {
    channels.clone().map(|c| c.into_iter().map(|v| v + by).collect::<Vec<f64>>())
}

#[test]
fn exact_copy_beats_offset_model() {
    let tmp = tempfile::tempdir().unwrap();
    let obs_dir = tmp.path().join("obs");
    let root = tmp.path().join("ensemble");

    let observed: Vec<Channels> = (0..3).map(|s| station(60, 10 + 3 * s, s)).collect();
    write_run(&obs_dir, "obs", &observed, false);

    let shifted: Vec<Channels> = observed.iter().map(|c| offset(c, 10.0)).collect();
    write_run(&root.join("model_b"), "model_b", &shifted, true);
    write_run(&root.join("model_a"), "model_a", &observed, true);

    // Excluded: defective metadata, no receivers, no metadata.
    write_run(&root.join("broken"), "broken", &observed, false);
    std::fs::write(root.join("broken").join("broken-surface.xdmf"), "<Xdmf><Dom").unwrap();
    std::fs::create_dir_all(root.join("empty")).unwrap();
    write_surface(&root.join("empty"), "empty");
    write_run(&root.join("bare"), "bare", &observed, false);

    assert_eq!(collect_model_dirs(&root).unwrap(), vec!["model_a", "model_b"]);

    let obs = load_directory(&obs_dir, FinalIndex::default()).unwrap();
    assert_eq!(obs.data.shape(), &[3, 4, 59]);

    let ensemble = load_ensemble(&root, FinalIndex::default()).unwrap();
    assert_eq!(ensemble.data.shape(), &[2, 3, 4, 59]);

    let best = find_best_fit(&obs, &ensemble).unwrap();
    assert_eq!(best.best_name(), "model_a");
    assert_abs_diff_eq!(best.best_misfit(), 0.0, epsilon = 1e-12);
    assert!(best.misfits[1] > best.misfits[0]);
    assert_abs_diff_eq!(best.misfits[1], 3.0 * 3.0 * 10.0, epsilon = 1e-9);

    let report = tmp.path().join("misfits.csv");
    write_report(&report, &best).unwrap();
    let text = std::fs::read_to_string(&report).unwrap();
    assert!(text.starts_with("rank,model,misfit\n1,model_a,"));
}

#[test]
fn delayed_observations_are_aligned_before_scoring() {
    let tmp = tempfile::tempdir().unwrap();
    let obs_dir = tmp.path().join("obs");
    let root = tmp.path().join("ensemble");

    // Observed arrivals come 25 samples later than in the synthetics.
    let observed: Vec<Channels> = (0..2).map(|s| station(100, 30, s)).collect();
    write_run(&obs_dir, "obs", &observed, false);

    let early: Vec<Channels> = (0..2).map(|s| station(100, 5, s)).collect();
    let weak: Vec<Channels> = (0..2)
        .map(|s| station(100, 5, s).map(|c| c.into_iter().map(|v| 0.5 * v).collect::<Vec<f64>>()))
        .collect();
    write_run(&root.join("early"), "early", &early, true);
    write_run(&root.join("weak"), "weak", &weak, true);

    let obs = load_directory(&obs_dir, FinalIndex::default()).unwrap();
    let ensemble = load_ensemble(&root, FinalIndex::Bound(40)).unwrap();
    assert_eq!(ensemble.n_timesteps(), 40);

    let best = find_best_fit(&obs, &ensemble).unwrap();
    assert_eq!(best.best_name(), "early");
    assert_abs_diff_eq!(best.best_misfit(), 0.0, epsilon = 1e-12);
    assert!(best.misfits[1] > 0.0);
}

#[test]
fn differing_station_sets_are_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let obs_dir = tmp.path().join("obs");
    let root = tmp.path().join("ensemble");

    let observed: Vec<Channels> = (0..2).map(|s| station(50, 10, s)).collect();
    write_run(&obs_dir, "obs", &observed, false);
    // Same count, but the model recorded stations 00002 and 00003.
    let model = root.join("m");
    std::fs::create_dir_all(&model).unwrap();
    write_surface(&model, "m");
    write_receiver(&model.join("m-receiver-00002-00000.dat"), &observed[0]);
    write_receiver(&model.join("m-receiver-00003-00000.dat"), &observed[1]);

    let obs = load_directory(&obs_dir, FinalIndex::default()).unwrap();
    let ensemble = load_ensemble(&root, FinalIndex::default()).unwrap();
    assert!(matches!(
        find_best_fit(&obs, &ensemble),
        Err(Error::StationMismatch { .. })
    ));
}

#[test]
fn malformed_receiver_in_valid_dir_is_fatal() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("ensemble");
    let model = root.join("m");
    write_run(&model, "m", &[station(30, 5, 0)], true);
    std::fs::write(
        model.join("m-receiver-00002-00000.dat"),
        "a\nb\nc\nd\ne\n0.0 1.0 oops\n",
    )
    .unwrap();

    assert!(matches!(
        load_ensemble(&root, FinalIndex::default()),
        Err(Error::FileFormat { .. })
    ));
}

#[test]
fn keeping_all_timesteps_applies_to_observations_too() {
    let tmp = tempfile::tempdir().unwrap();
    let obs_dir = tmp.path().join("obs");
    let root = tmp.path().join("ensemble");

    let observed: Vec<Channels> = (0..2).map(|s| station(50, 12, s)).collect();
    write_run(&obs_dir, "obs", &observed, false);
    write_run(&root.join("same"), "same", &observed, true);
    let shifted: Vec<Channels> = observed.iter().map(|c| offset(c, 1.0)).collect();
    write_run(&root.join("shifted"), "shifted", &shifted, true);

    let obs = load_observations(&obs_dir, FinalIndex::All).unwrap();
    let ensemble = load_ensemble(&root, FinalIndex::All).unwrap();
    assert_eq!(obs.n_timesteps(), 50);
    assert_eq!(ensemble.n_timesteps(), 50);

    let best = find_best_fit(&obs, &ensemble).unwrap();
    assert_eq!(best.best_name(), "same");
    assert_abs_diff_eq!(best.best_misfit(), 0.0, epsilon = 1e-12);
    assert_abs_diff_eq!(best.misfits[1], 2.0 * 3.0, epsilon = 1e-9);
}
