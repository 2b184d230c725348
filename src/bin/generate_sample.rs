//! Write a synthetic perturbation series for trying `rusty-cos`.
//!
//! Usage: `generate_sample [OUT_DIR]` (default `sample_data`).
//!
//! Produces two replicate sets on different wavenumber windows:
//! * `set1/rep_XX.csv` – fingerprint region (1800 → 1400 cm⁻¹): an amide band
//!   growing with the perturbation and a second band following it with a lag
//! * `set2/rep_XX.csv` – C–H / O–H region (3600 → 2800 cm⁻¹): a band that
//!   decays as the perturbation proceeds
//! * `set1.parquet`   – set 1 again as a Parquet dataset (`x`, `y`, `step`)

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{Float64Builder, Int64Array, ListBuilder};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

const STEPS: usize = 7;

fn gaussian(x: f64, mu: f64, sigma: f64, amplitude: f64) -> f64 {
    amplitude * (-(x - mu).powi(2) / (2.0 * sigma.powi(2))).exp()
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// Absorbance of one replicate at perturbation `t ∈ [0, 1]`.
type Model = fn(f64, f64) -> f64;

fn fingerprint(wn: f64, t: f64) -> f64 {
    let lagged = 1.0 / (1.0 + (-(t - 0.6) * 12.0).exp());
    gaussian(wn, 1650.0, 18.0, 0.2 + 0.8 * t)
        + gaussian(wn, 1540.0, 15.0, 0.1 + 0.5 * lagged)
        + 0.05 + 1e-4 * (wn - 1400.0)
}

fn stretching(wn: f64, t: f64) -> f64 {
    gaussian(wn, 3350.0, 120.0, 0.9 - 0.6 * t) + gaussian(wn, 2920.0, 25.0, 0.35)
}

fn generate_series(
    wavenumbers: &[f64],
    model: Model,
    noise_level: f64,
    rng: &mut SimpleRng,
) -> Vec<Vec<f64>> {
    (0..STEPS)
        .map(|step| {
            let t = step as f64 / (STEPS - 1) as f64;
            wavenumbers
                .iter()
                .map(|&wn| model(wn, t) + rng.gauss(0.0, noise_level))
                .collect()
        })
        .collect()
}

fn write_replicates(dir: &Path, wavenumbers: &[f64], series: &[Vec<f64>]) -> Vec<PathBuf> {
    fs::create_dir_all(dir).expect("Failed to create output directory");
    series
        .iter()
        .enumerate()
        .map(|(i, y)| {
            let path = dir.join(format!("rep_{:02}.csv", i + 1));
            let mut writer = csv::Writer::from_path(&path).expect("Failed to create CSV file");
            for (wn, v) in wavenumbers.iter().zip(y) {
                writer
                    .write_record([wn.to_string(), v.to_string()])
                    .expect("Failed to write CSV row");
            }
            writer.flush().expect("Failed to flush CSV file");
            path
        })
        .collect()
}

fn write_parquet(path: &Path, wavenumbers: &[f64], series: &[Vec<f64>]) {
    let mut x_builder = ListBuilder::new(Float64Builder::new());
    let mut y_builder = ListBuilder::new(Float64Builder::new());
    for y in series {
        x_builder.values().append_slice(wavenumbers);
        x_builder.append(true);
        y_builder.values().append_slice(y);
        y_builder.append(true);
    }
    let steps = Int64Array::from((0..series.len() as i64).collect::<Vec<_>>());

    let item = Arc::new(Field::new("item", DataType::Float64, true));
    let schema = Arc::new(Schema::new(vec![
        Field::new("x", DataType::List(item.clone()), false),
        Field::new("y", DataType::List(item), false),
        Field::new("step", DataType::Int64, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(x_builder.finish()),
            Arc::new(y_builder.finish()),
            Arc::new(steps),
        ],
    )
    .expect("Failed to create RecordBatch");

    let file = fs::File::create(path).expect("Failed to create output file");
    let mut writer = ArrowWriter::try_new(file, schema, None).expect("Failed to create writer");
    writer.write(&batch).expect("Failed to write batch");
    writer.close().expect("Failed to close writer");
}

fn main() {
    let out_dir = PathBuf::from(
        std::env::args()
            .nth(1)
            .unwrap_or_else(|| "sample_data".to_string()),
    );
    let mut rng = SimpleRng::new(42);

    let wn1: Vec<f64> = (0..201).map(|i| 1800.0 - i as f64 * 2.0).collect();
    let wn2: Vec<f64> = (0..201).map(|i| 3600.0 - i as f64 * 4.0).collect();

    let series1 = generate_series(&wn1, fingerprint, 0.002, &mut rng);
    let series2 = generate_series(&wn2, stretching, 0.002, &mut rng);

    let files1 = write_replicates(&out_dir.join("set1"), &wn1, &series1);
    let files2 = write_replicates(&out_dir.join("set2"), &wn2, &series2);
    write_parquet(&out_dir.join("set1.parquet"), &wn1, &series1);

    println!(
        "Wrote {} + {} replicates ({} / {} wavenumbers) to {}",
        files1.len(),
        files2.len(),
        wn1.len(),
        wn2.len(),
        out_dir.display()
    );
}
