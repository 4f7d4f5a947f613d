///! Asinh intensity stretch for a single raster layer
use ndarray::{Array2, ArrayView2};

/// Softening factor of the asinh curve
pub const ASINH_Q: f64 = 8.0;

const LOW_PERCENTILE: f64 = 1.0;
const HIGH_PERCENTILE: f64 = 99.0;

/// Percentile of sorted data with linear interpolation between neighbours
fn percentile(sorted: &[f64], q: f64) -> f64 {
    let rank = q / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
}

/// Map a layer to 8-bit intensities.
///
/// Non-finite pixels count as zero. Limits are the 1st and 99th percentile of
/// the positive pixels (their min and max when those coincide). A layer
/// without positive pixels, or whose positive pixels are all equal, maps to
/// zero everywhere.
pub fn asinh_stretch(layer: ArrayView2<'_, f32>) -> Array2<u8> {
    let data = layer.mapv(|v| if v.is_finite() { v as f64 } else { 0.0 });

    let mut positive: Vec<f64> = data.iter().copied().filter(|v| *v > 0.0).collect();
    if positive.is_empty() {
        return Array2::zeros(layer.raw_dim());
    }
    positive.sort_by(f64::total_cmp);

    let mut vmin = percentile(&positive, LOW_PERCENTILE);
    let mut vmax = percentile(&positive, HIGH_PERCENTILE);
    if vmin == vmax {
        vmin = positive[0];
        vmax = positive[positive.len() - 1];
    }
    if vmin >= vmax {
        return Array2::zeros(layer.raw_dim());
    }

    let norm = ASINH_Q.asinh();
    data.mapv(|v| {
        let scaled = ((v - vmin) / (vmax - vmin)).clamp(0.0, 1.0);
        let stretched = (ASINH_Q * scaled).asinh() / norm;
        (stretched * 255.0) as u8
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};

    #[test]
    fn test_percentile_interpolates() {
        let sorted = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(percentile(&sorted, 50.0), 3.0);
        assert!((percentile(&sorted, 1.0) - 1.04).abs() < 1e-12);
        assert!((percentile(&sorted, 99.0) - 4.96).abs() < 1e-12);
        assert_eq!(percentile(&[7.0], 99.0), 7.0);
    }

    #[test]
    fn test_all_zero_layer() {
        let layer = Array2::<f32>::zeros((4, 5));
        assert!(asinh_stretch(layer.view()).iter().all(|v| *v == 0));
    }

    #[test]
    fn test_non_positive_and_nan_layer() {
        let layer = array![[-1.0f32, f32::NAN], [0.0, -5.0]];
        assert_eq!(asinh_stretch(layer.view()), Array2::<u8>::zeros((2, 2)));
    }

    #[test]
    fn test_constant_positive_layer() {
        let layer = Array2::<f32>::from_elem((3, 3), 4.2);
        assert!(asinh_stretch(layer.view()).iter().all(|v| *v == 0));
    }

    #[test]
    fn test_monotonic_and_bounded() {
        let layer = Array2::from_shape_fn((10, 10), |(y, x)| (y * 10 + x) as f32);
        let out = asinh_stretch(layer.view());
        assert_eq!(out[[0, 0]], 0);
        assert_eq!(out[[9, 9]], 255);
        let flat: Vec<u8> = out.iter().copied().collect();
        assert!(flat.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_asinh_curve_value() {
        // Positives are 1..=100; pixel 50 lands on asinh(8x) / asinh(8)
        let layer = Array2::from_shape_fn((1, 101), |(_, x)| x as f32);
        let out = asinh_stretch(layer.view());
        let sorted: Vec<f64> = (1..=100).map(|v| v as f64).collect();
        let (lo, hi) = (percentile(&sorted, 1.0), percentile(&sorted, 99.0));
        let x = (50.0 - lo) / (hi - lo);
        let expected = ((8.0 * x).asinh() / 8.0f64.asinh() * 255.0) as u8;
        assert_eq!(out[[0, 50]], expected);
    }

    #[test]
    fn test_infinite_pixels_are_zero() {
        let layer = array![[1.0f32, 2.0], [3.0, f32::INFINITY]];
        let out = asinh_stretch(layer.view());
        assert_eq!(out[[1, 1]], 0);
        assert_eq!(out[[1, 0]], 255);
    }
}
