use log::warn;
use nalgebra::DMatrix;

/// Min-max scale every replicate column to `[0, 1]`.
///
/// A flat column has no range to scale by and is set to zeros.
pub fn min_max_normalize(intensities: &mut DMatrix<f64>) {
    for (idx, mut col) in intensities.column_iter_mut().enumerate() {
        let min = col.iter().copied().fold(f64::INFINITY, f64::min);
        let max = col.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let range = max - min;
        if range.abs() < f64::EPSILON {
            warn!("replicate {} is flat; normalised to zeros", idx + 1);
            col.fill(0.0);
        } else {
            col.apply(|v| *v = (*v - min) / range);
        }
    }
}
