//! Field statistics, GPU-vs-CPU comparison, spectral probes and PNG export.

use std::path::Path;

use image::{GrayImage, ImageResult, Luma};
use rustfft::num_complex::Complex32;
use rustfft::FftPlanner;

use crate::ocean::GridSpec;

/// Summary statistics of a scalar field
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldStats {
    pub min: f32,
    pub max: f32,
    pub mean: f32,
    pub rms: f32,
}

impl FieldStats {
    /// Statistics of `values`; all zero for an empty input
    pub fn of(values: &[f32]) -> Self {
        if values.is_empty() {
            return Self {
                min: 0.0,
                max: 0.0,
                mean: 0.0,
                rms: 0.0,
            };
        }

        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;
        let mut sum = 0.0f64;
        let mut sum_sq = 0.0f64;
        for &v in values {
            min = min.min(v);
            max = max.max(v);
            sum += v as f64;
            sum_sq += (v as f64) * (v as f64);
        }
        let count = values.len() as f64;

        Self {
            min,
            max,
            mean: (sum / count) as f32,
            rms: (sum_sq / count).sqrt() as f32,
        }
    }

    pub fn range(&self) -> f32 {
        self.max - self.min
    }
}

/// Real part of one packed block (0 = height, 1 = dx, 2 = dz) as N×N
pub fn packed_channel(grid: &GridSpec, field: &[Complex32], block: usize) -> Vec<f32> {
    let n = grid.n();
    let mut out = Vec::with_capacity(grid.texels());
    for y in 0..n {
        for x in 0..n {
            out.push(field[grid.packed_index(block, x, y)].re);
        }
    }
    out
}

/// Height channel of a packed displacement field
pub fn height_channel(grid: &GridSpec, field: &[Complex32]) -> Vec<f32> {
    packed_channel(grid, field, 0)
}

/// Difference between two buffers of equal length
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Comparison {
    pub max_abs_error: f32,
    pub rms_error: f32,
    /// Largest magnitude in the reference buffer
    pub reference_peak: f32,
}

impl Comparison {
    /// Max error relative to the reference peak (absolute when the peak is 0)
    pub fn relative_error(&self) -> f32 {
        if self.reference_peak > 0.0 {
            self.max_abs_error / self.reference_peak
        } else {
            self.max_abs_error
        }
    }

    pub fn within(&self, relative_tolerance: f32) -> bool {
        self.relative_error() <= relative_tolerance
    }
}

fn compare_by<T>(reference: &[T], actual: &[T], error: impl Fn(&T, &T) -> f32, magnitude: impl Fn(&T) -> f32) -> Comparison {
    assert_eq!(reference.len(), actual.len(), "compared buffers differ in length");

    let mut max_abs_error = 0.0f32;
    let mut sum_sq = 0.0f64;
    let mut reference_peak = 0.0f32;
    for (r, a) in reference.iter().zip(actual) {
        let e = error(r, a);
        // NaN anywhere must fail the comparison
        max_abs_error = if e.is_nan() { f32::INFINITY } else { max_abs_error.max(e) };
        sum_sq += (e as f64) * (e as f64);
        reference_peak = reference_peak.max(magnitude(r));
    }
    let count = reference.len().max(1) as f64;

    Comparison {
        max_abs_error,
        rms_error: (sum_sq / count).sqrt() as f32,
        reference_peak,
    }
}

/// Compare complex buffers texel for texel
pub fn compare_fields(reference: &[Complex32], actual: &[Complex32]) -> Comparison {
    compare_by(reference, actual, |r, a| (*r - *a).norm(), |r| r.norm())
}

/// Compare scalar buffers element for element
pub fn compare_scalars(reference: &[f32], actual: &[f32]) -> Comparison {
    compare_by(reference, actual, |r, a| (r - a).abs(), |r| r.abs())
}

/// In-place forward 2D FFT of an N×N buffer (rows, then columns)
pub fn forward_fft_2d(grid: &GridSpec, data: &mut [Complex32]) {
    let n = grid.n();
    let fft = FftPlanner::<f32>::new().plan_fft_forward(n);

    for row in data.chunks_exact_mut(n) {
        fft.process(row);
    }

    let mut column = vec![Complex32::new(0.0, 0.0); n];
    for x in 0..n {
        for y in 0..n {
            column[y] = data[y * n + x];
        }
        fft.process(&mut column);
        for y in 0..n {
            data[y * n + x] = column[y];
        }
    }
}

/// Strongest non-DC spatial frequency of a height field
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DominantWave {
    /// Signed bin indices (cycles per patch)
    pub bin: (i64, i64),
    /// Amplitude of the real sinusoid at that bin
    pub amplitude: f32,
    pub wavelength_m: f32,
}

/// Find the dominant wave of an N×N height field over a patch
pub fn dominant_wave(grid: &GridSpec, heights: &[f32], patch_size_m: f32) -> Option<DominantWave> {
    let n = grid.n();
    let mut spectrum: Vec<Complex32> = heights.iter().map(|&h| Complex32::new(h, 0.0)).collect();
    forward_fft_2d(grid, &mut spectrum);

    // Below this the bin is rounding noise
    let floor = 1e-5 * grid.texels() as f32;
    let mut best: Option<(usize, f32)> = None;
    for (i, c) in spectrum.iter().enumerate().skip(1) {
        let magnitude = c.norm();
        if best.map_or(magnitude > floor, |(_, m)| magnitude > m) {
            best = Some((i, magnitude));
        }
    }

    best.map(|(i, magnitude)| {
        let bin = (grid.signed_frequency(i % n), grid.signed_frequency(i / n));
        let cycles = ((bin.0 * bin.0 + bin.1 * bin.1) as f32).sqrt();
        DominantWave {
            bin,
            amplitude: 2.0 * magnitude / grid.texels() as f32,
            wavelength_m: patch_size_m / cycles,
        }
    })
}

/// Height field as 8-bit grayscale, stretched to its own min..max
pub fn height_image(grid: &GridSpec, heights: &[f32]) -> GrayImage {
    let n = grid.n() as u32;
    let stats = FieldStats::of(heights);
    let range = stats.range();
    GrayImage::from_fn(n, n, |x, y| {
        let h = heights[(y * n + x) as usize];
        let t = if range > 0.0 { (h - stats.min) / range } else { 0.5 };
        Luma([(t * 255.0).round() as u8])
    })
}

/// Foam coverage as 8-bit grayscale (0 = none, 255 = full)
pub fn foam_image(grid: &GridSpec, foam: &[f32]) -> GrayImage {
    let n = grid.n() as u32;
    GrayImage::from_fn(n, n, |x, y| {
        let f = foam[(y * n + x) as usize].clamp(0.0, 1.0);
        Luma([(f * 255.0).round() as u8])
    })
}

pub fn save_image(image: &GrayImage, path: &Path) -> ImageResult<()> {
    image.save(path)
}
