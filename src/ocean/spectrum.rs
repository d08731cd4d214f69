//! Phillips-spectrum generator with dispersion-driven phase animation.

use std::f32::consts::TAU;

use glam::Vec2;
use rustfft::num_complex::Complex32;

use super::hash::gaussian_pair;
use super::GridSpec;
use crate::params::{BandParams, GRAVITY_M_PER_S2};

/// Wave vectors shorter than this are treated as the DC bin
pub(crate) const MIN_WAVENUMBER: f32 = 1e-6;

/// Wave vector (rad/m) of FFT bin (x, y) for a patch of `patch_size_m`
pub fn wave_vector(grid: &GridSpec, x: usize, y: usize, patch_size_m: f32) -> Vec2 {
    let step = TAU / patch_size_m;
    Vec2::new(
        grid.signed_frequency(x) as f32 * step,
        grid.signed_frequency(y) as f32 * step,
    )
}

/// Phillips spectrum P(k), zero at the DC bin
fn phillips(k: Vec2, band: &BandParams) -> f32 {
    let k_len = k.length();
    if k_len < MIN_WAVENUMBER {
        return 0.0;
    }

    let largest_wave_m = band.wind_speed_m_per_s * band.wind_speed_m_per_s / GRAVITY_M_PER_S2;
    let smallest_wave_m = largest_wave_m * 0.001;
    let wind = Vec2::from_array(band.wind_dir).normalize_or_zero();

    let kl = k_len * largest_wave_m;
    let alignment = (k / k_len).dot(wind);
    let k2 = k_len * k_len;

    band.amplitude * (-1.0 / (kl * kl)).exp() / (k2 * k2)
        * alignment
        * alignment
        * (-k2 * smallest_wave_m * smallest_wave_m).exp()
}

/// Time-independent amplitude h0 of bin (x, y)
fn initial_amplitude(grid: &GridSpec, band: &BandParams, x: usize, y: usize) -> Complex32 {
    let k = wave_vector(grid, x, y, band.patch_size_m);
    let (xi_re, xi_im) = gaussian_pair(x as u32, y as u32, band.seed);
    let delta_k = TAU / band.patch_size_m;
    let scale = (phillips(k, band) * 0.5).sqrt() * delta_k;
    Complex32::new(xi_re * scale, xi_im * scale)
}

/// Fill `out` (N×N) with the band's spectrum at simulation time `time_s`.
///
/// `h(k, t) = h0(k)·e^{iωt} + conj(h0(−k))·e^{−iωt}` with ω = √(g|k|).
/// Pure function of its arguments; the DC bin is exactly zero.
pub fn generate_spectrum(grid: &GridSpec, band: &BandParams, time_s: f32, out: &mut [Complex32]) {
    debug_assert_eq!(out.len(), grid.texels());
    let n = grid.n();

    for y in 0..n {
        for x in 0..n {
            let k = wave_vector(grid, x, y, band.patch_size_m);
            let k_len = k.length();
            let texel = &mut out[y * n + x];

            if k_len < MIN_WAVENUMBER {
                *texel = Complex32::new(0.0, 0.0);
                continue;
            }

            let h0 = initial_amplitude(grid, band, x, y);
            let h0_mirror = initial_amplitude(grid, band, (n - x) % n, (n - y) % n);

            let omega_t = (GRAVITY_M_PER_S2 * k_len).sqrt() * time_s;
            let (sin, cos) = omega_t.sin_cos();
            let phase = Complex32::new(cos, sin);

            *texel = h0 * phase + h0_mirror.conj() * phase.conj();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocean::complex_zeros;

    fn spectrum(n: usize, band: &BandParams, time_s: f32) -> Vec<Complex32> {
        let grid = GridSpec::new(n).unwrap();
        let mut out = complex_zeros(grid.texels());
        generate_spectrum(&grid, band, time_s, &mut out);
        out
    }

    #[test]
    fn test_spectrum_is_deterministic() {
        let band = BandParams::swell();
        let a = spectrum(64, &band, 3.25);
        let b = spectrum(64, &band, 3.25);
        assert!(a
            .iter()
            .zip(&b)
            .all(|(p, q)| p.re.to_bits() == q.re.to_bits() && p.im.to_bits() == q.im.to_bits()));
    }

    #[test]
    fn test_dc_bin_is_zero() {
        for band in [BandParams::swell(), BandParams::wind()] {
            for t in [0.0, 10.0] {
                let s = spectrum(32, &band, t);
                assert_eq!(s[0], Complex32::new(0.0, 0.0));
                assert!(s.iter().all(|c| c.re.is_finite() && c.im.is_finite()));
            }
        }
    }

    #[test]
    fn test_seed_and_time_change_output() {
        let band = BandParams::wind();
        let other_seed = BandParams { seed: 7, ..band };
        assert_ne!(spectrum(16, &band, 1.0), spectrum(16, &other_seed, 1.0));
        assert_ne!(spectrum(16, &band, 0.0), spectrum(16, &band, 10.0));
    }

    #[test]
    fn test_spectrum_is_hermitian() {
        // h(-k) = conj(h(k)) so the height field is real
        let grid = GridSpec::new(16).unwrap();
        let s = spectrum(16, &BandParams::swell(), 2.0);
        for y in 0..16 {
            for x in 0..16 {
                let a = s[grid.wrap_index(x as i64, y as i64)];
                let b = s[grid.wrap_index(-(x as i64), -(y as i64))].conj();
                assert!((a - b).norm() <= 1e-6 * (1.0 + a.norm()));
            }
        }
    }

    #[test]
    fn test_wave_vector_signs() {
        let grid = GridSpec::new(8).unwrap();
        let k = wave_vector(&grid, 7, 1, TAU);
        assert_eq!(k, Vec2::new(-1.0, 1.0));
    }
}
