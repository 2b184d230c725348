use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::info;

use rusty_cos::preprocess::{Baseline, SavitzkyGolay};
use rusty_cos::{run, Centering, CorrelationKind, RunConfig};

/// Compute synchronous and asynchronous 2D correlation maps of replicate IR spectra.
#[derive(Parser, Debug)]
#[command(name = "rusty-cos", version, about)]
struct Cli {
    /// JSON run configuration; the flags below override it
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Replicate files of spectrum set 1, in perturbation order
    #[arg(long = "set1", value_name = "FILE", num_args = 1..)]
    set1: Vec<PathBuf>,

    /// Replicate files of spectrum set 2 (hetero-correlation)
    #[arg(long = "set2", value_name = "FILE", num_args = 1..)]
    set2: Vec<PathBuf>,

    /// Directory for Combined.csv, _sync.csv and _async.csv
    #[arg(short, long, value_name = "DIR")]
    out_dir: Option<PathBuf>,

    /// Mean removed before correlating
    #[arg(long, value_enum)]
    centering: Option<Centering>,

    /// Require identical wavenumber grids across replicates
    #[arg(long)]
    strict_wavenumbers: bool,

    /// Skip min-max normalisation
    #[arg(long)]
    no_normalize: bool,

    /// Subtract a least-squares polynomial baseline of this degree
    #[arg(long, value_name = "DEGREE", conflicts_with = "baseline_modpoly")]
    baseline_poly: Option<usize>,

    /// Subtract an iterative modified-polynomial baseline of this order
    #[arg(long, value_name = "ORDER")]
    baseline_modpoly: Option<usize>,

    /// Savitzky-Golay smoothing
    #[arg(long, num_args = 2, value_names = ["WINDOW", "POLYORDER"])]
    smooth: Option<Vec<usize>>,

    /// Also write plot.json for this map
    #[arg(long, value_enum)]
    plot: Option<CorrelationKind>,
}

impl Cli {
    /// Start from the config file (or defaults) and apply the flags.
    fn into_config(self) -> Result<RunConfig> {
        let mut config = match &self.config {
            Some(path) => RunConfig::from_json_file(path)
                .with_context(|| format!("reading config {}", path.display()))?,
            None => RunConfig::default(),
        };

        if !self.set1.is_empty() {
            config.set1.files = self.set1;
        }
        if !self.set2.is_empty() {
            config.set2.get_or_insert_with(Default::default).files = self.set2;
        }
        if self.out_dir.is_some() {
            config.output.dir = self.out_dir;
        }
        if self.plot.is_some() {
            config.output.plot = self.plot;
        }
        if let Some(centering) = self.centering {
            config.align.centering = centering;
        }
        if self.strict_wavenumbers {
            config.align.strict_wavenumbers = true;
        }

        let baseline = match (self.baseline_poly, self.baseline_modpoly) {
            (Some(degree), _) => Some(Baseline::polynomial(degree)),
            (None, Some(order)) => Some(Baseline::modpoly(order)),
            (None, None) => None,
        };
        let smoothing = match self.smooth.as_deref() {
            Some(&[window_length, polyorder]) => Some(
                SavitzkyGolay::new(window_length, polyorder).context("invalid --smooth")?,
            ),
            Some(other) => bail!("--smooth takes WINDOW and POLYORDER, got {other:?}"),
            None => None,
        };

        let sets = std::iter::once(&mut config.set1).chain(config.set2.as_mut());
        for set in sets {
            if baseline.is_some() {
                set.preprocess.baseline = baseline;
            }
            if smoothing.is_some() {
                set.preprocess.smoothing = smoothing;
            }
            if self.no_normalize {
                set.preprocess.normalize = false;
            }
        }

        Ok(config)
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let config = Cli::parse().into_config()?;
    let outcome = run(&config).context("2D correlation failed")?;

    let (rows, cols) = outcome.analysis.correlation.synchronous.shape();
    info!(
        "{} correlation: {rows} x {cols} map(s)",
        if config.is_hetero() { "hetero" } else { "homo" }
    );
    for path in &outcome.written {
        println!("{}", path.display());
    }
    Ok(())
}
