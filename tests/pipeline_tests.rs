use std::fs;
use std::path::{Path, PathBuf};

use approx::assert_relative_eq;
use rusty_cos::config::{OutputConfig, SetConfig, ASYNC_MAP, COMBINED_1, COMBINED_2, PLOT_JSON, SYNC_MAP};
use rusty_cos::data::artifact::{read_aligned_table, read_correlation_map};
use rusty_cos::{
    analyze, run, AlignOptions, CorrelationKind, CosError, PlotData, PreprocessConfig, RunConfig,
    SavitzkyGolay, Spectrum, SpectrumSet,
};

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("rusty_cos_pipeline_{name}_{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

/// Write `count` replicates of a band that grows along the series.
fn write_series(dir: &Path, prefix: &str, wavenumbers: &[f64], count: usize) -> Vec<PathBuf> {
    (0..count)
        .map(|k| {
            let t = k as f64 / count as f64;
            let path = dir.join(format!("{prefix}_{k:02}.csv"));
            let body: String = wavenumbers
                .iter()
                .map(|&wn| {
                    let y = 0.1 + (1.0 + t) * (-(wn - wavenumbers[wavenumbers.len() / 2]).powi(2) / 40.0).exp()
                        + 0.05 * (t * 7.0 + wn).sin();
                    format!("{wn},{y}\n")
                })
                .collect();
            fs::write(&path, body).unwrap();
            path
        })
        .collect()
}

fn grid(start: f64, step: f64, n: usize) -> Vec<f64> {
    (0..n).map(|i| start - step * i as f64).collect()
}

#[test]
fn test_homo_run_writes_artifacts() {
    let dir = scratch_dir("homo");
    let files = write_series(&dir, "rep", &grid(1700.0, 2.0, 30), 5);
    let out = dir.join("out");

    let config = RunConfig {
        set1: SetConfig {
            files,
            preprocess: PreprocessConfig {
                smoothing: Some(SavitzkyGolay::new(5, 2).unwrap()),
                ..PreprocessConfig::default()
            },
        },
        output: OutputConfig {
            dir: Some(out.clone()),
            plot: Some(CorrelationKind::Synchronous),
        },
        ..RunConfig::default()
    };
    let outcome = run(&config).unwrap();

    let names: Vec<String> = outcome
        .written
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec![COMBINED_1, SYNC_MAP, ASYNC_MAP, PLOT_JSON]);

    let sync = read_correlation_map(&out.join(SYNC_MAP)).unwrap();
    assert_eq!(sync, outcome.analysis.correlation.synchronous);
    let asyn = read_correlation_map(&out.join(ASYNC_MAP)).unwrap();
    assert_eq!(asyn, outcome.analysis.correlation.asynchronous);
    let combined = read_aligned_table(&out.join(COMBINED_1)).unwrap();
    assert_eq!(combined, outcome.analysis.set1.aligned);
    assert_eq!(combined.n_replicates(), 5);

    let plot: PlotData =
        serde_json::from_str(&fs::read_to_string(out.join(PLOT_JSON)).unwrap()).unwrap();
    assert!(!plot.hetero);
    assert_eq!(plot.x.len(), 30);
    assert_eq!(plot.y.len(), 30);
    assert_eq!(plot.z.len(), 30);
    assert_eq!(plot.top, plot.left);
    assert_eq!(plot.top.y, outcome.analysis.set1.mean_spectrum);
}

#[test]
fn test_hetero_run_and_failed_rerun_keeps_artifacts() {
    let dir = scratch_dir("hetero");
    let files1 = write_series(&dir, "a", &grid(1700.0, 2.0, 20), 4);
    let files2 = write_series(&dir, "b", &grid(3000.0, 4.0, 12), 4);
    let out = dir.join("out");

    let mut config = RunConfig {
        set1: SetConfig {
            files: files1,
            ..SetConfig::default()
        },
        set2: Some(SetConfig {
            files: files2.clone(),
            ..SetConfig::default()
        }),
        output: OutputConfig {
            dir: Some(out.clone()),
            plot: None,
        },
        ..RunConfig::default()
    };
    let outcome = run(&config).unwrap();
    assert!(out.join(COMBINED_2).exists());
    assert_eq!(outcome.analysis.correlation.synchronous.shape(), (12, 20));
    assert_eq!(outcome.analysis.correlation.asynchronous.shape(), (12, 20));

    let before = fs::read_to_string(out.join(SYNC_MAP)).unwrap();

    // Drop one replicate of set 2: observation counts no longer match.
    config.set2.as_mut().unwrap().files = files2[..3].to_vec();
    match run(&config) {
        Err(CosError::DataMismatch {
            expected, actual, ..
        }) => {
            assert_eq!(expected, 4);
            assert_eq!(actual, 3);
        }
        other => panic!("expected DataMismatch, got {other:?}"),
    }
    assert_eq!(fs::read_to_string(out.join(SYNC_MAP)).unwrap(), before);
}

fn leftover_staging(dir: &Path) -> Vec<String> {
    fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".tmp") || name.ends_with(".bak"))
        .collect()
}

#[test]
fn test_late_write_failure_keeps_previous_artifacts() {
    let dir = scratch_dir("late_failure");
    let files = write_series(&dir, "rep", &grid(12.0, 1.0, 3), 3);
    let out = dir.join("out");
    fs::create_dir_all(&out).unwrap();
    fs::write(out.join(COMBINED_1), "OLD").unwrap();
    fs::write(out.join(SYNC_MAP), "OLD").unwrap();
    // The asynchronous map cannot replace a non-empty directory.
    fs::create_dir_all(out.join(ASYNC_MAP).join("keep")).unwrap();

    let config = RunConfig {
        set1: SetConfig {
            files,
            ..SetConfig::default()
        },
        output: OutputConfig {
            dir: Some(out.clone()),
            plot: Some(CorrelationKind::Asynchronous),
        },
        ..RunConfig::default()
    };
    assert!(matches!(run(&config), Err(CosError::Io { .. })));

    assert_eq!(fs::read_to_string(out.join(COMBINED_1)).unwrap(), "OLD");
    assert_eq!(fs::read_to_string(out.join(SYNC_MAP)).unwrap(), "OLD");
    assert!(out.join(ASYNC_MAP).is_dir());
    assert!(!out.join(PLOT_JSON).exists());
    assert_eq!(leftover_staging(&out), Vec::<String>::new());
}

#[test]
fn test_staging_failure_keeps_previous_artifacts() {
    let dir = scratch_dir("staging_failure");
    let files = write_series(&dir, "rep", &grid(12.0, 1.0, 3), 3);
    let out = dir.join("out");
    fs::create_dir_all(&out).unwrap();
    fs::write(out.join(SYNC_MAP), "OLD").unwrap();
    // plot.json is staged last; its staging path is occupied.
    fs::create_dir_all(out.join(".plot.json.tmp").join("keep")).unwrap();

    let config = RunConfig {
        set1: SetConfig {
            files,
            ..SetConfig::default()
        },
        output: OutputConfig {
            dir: Some(out.clone()),
            plot: Some(CorrelationKind::Synchronous),
        },
        ..RunConfig::default()
    };
    assert!(matches!(run(&config), Err(CosError::Io { .. })));

    assert_eq!(fs::read_to_string(out.join(SYNC_MAP)).unwrap(), "OLD");
    assert!(!out.join(COMBINED_1).exists());
    for staged in [".Combined.csv.tmp", "._sync.csv.tmp", "._async.csv.tmp"] {
        assert!(!out.join(staged).exists(), "{staged} left behind");
    }
}

#[test]
fn test_run_requires_input_files() {
    assert!(matches!(
        run(&RunConfig::default()),
        Err(CosError::DegenerateInput(_))
    ));
}

#[test]
fn test_run_config_from_json() {
    let dir = scratch_dir("config");
    let path = dir.join("run.json");
    fs::write(
        &path,
        r#"{
            "set1": { "files": ["a.csv", "b.csv"],
                      "preprocess": { "baseline": { "mode": "mod-poly", "order": 2 } } },
            "align": { "centering": "per-spectrum", "strict_wavenumbers": true },
            "output": { "dir": "out", "plot": "asynchronous" }
        }"#,
    )
    .unwrap();

    let config = RunConfig::from_json_file(&path).unwrap();
    assert_eq!(config.set1.files.len(), 2);
    assert!(config.set1.preprocess.normalize);
    assert!(config.set1.preprocess.baseline.is_some());
    assert!(!config.is_hetero());
    assert!(config.align.strict_wavenumbers);
    assert_eq!(config.output.plot, Some(CorrelationKind::Asynchronous));
}

#[test]
fn test_in_memory_analysis_matches_plot_contract() {
    let x = vec![10.0, 11.0, 12.0];
    let set1 = SpectrumSet::from_spectra(vec![
        Spectrum::new("a", x.clone(), vec![1.0, 2.0, 3.0]),
        Spectrum::new("b", x.clone(), vec![3.0, 2.0, 1.0]),
    ]);
    let set2 = SpectrumSet::from_spectra(vec![
        Spectrum::new("c", vec![20.0, 21.0], vec![0.0, 1.0]),
        Spectrum::new("d", vec![20.0, 21.0], vec![1.0, 0.0]),
    ]);
    let none = PreprocessConfig::none();
    let analysis = analyze((&set1, &none), Some((&set2, &none)), &AlignOptions::default()).unwrap();

    let plot = analysis.plot_data(CorrelationKind::Synchronous);
    assert!(plot.hetero);
    assert_eq!(plot.x, x);
    assert_eq!(plot.y, vec![20.0, 21.0]);
    assert_eq!(plot.z.len(), 2);
    assert_eq!(plot.z[0].len(), 3);
    assert_eq!(plot.left.x, vec![20.0, 21.0]);
    assert_eq!(plot.left.y, vec![0.5, 0.5]);

    // Set 2 row 20 is centered to [-0.5, 0.5]; set 1 column 10 to [-1, 1].
    assert_relative_eq!(plot.z[0][0], 1.0, epsilon = 1e-12);
    assert_relative_eq!(plot.max_abs(), 1.0, epsilon = 1e-12);
}
