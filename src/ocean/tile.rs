//! Expands one band spectrum into the packed (height, dx, dz) layout.

use rustfft::num_complex::Complex32;

use super::GridSpec;

/// Write the packed 3N×N sub-spectra for `spectrum` into `packed`.
///
/// Block 0 is the height spectrum; blocks 1 and 2 are `i·(k/|k|)·h` along
/// x and z. Only the direction of k matters, so signed bin indices stand in
/// for the wave vector. The DC bin is exactly zero in every block.
pub fn build_tiles(grid: &GridSpec, spectrum: &[Complex32], packed: &mut [Complex32]) {
    debug_assert_eq!(spectrum.len(), grid.texels());
    debug_assert_eq!(packed.len(), grid.packed_texels());
    let n = grid.n();
    let zero = Complex32::new(0.0, 0.0);

    for y in 0..n {
        let kz = grid.signed_frequency(y) as f32;
        for x in 0..n {
            let kx = grid.signed_frequency(x) as f32;
            let h = spectrum[y * n + x];
            let k_len = (kx * kx + kz * kz).sqrt();

            let (dx, dz) = if k_len == 0.0 {
                (zero, zero)
            } else {
                // i·(a + ib) = -b + ia
                let ih = Complex32::new(-h.im, h.re);
                (ih * (kx / k_len), ih * (kz / k_len))
            };

            packed[grid.packed_index(0, x, y)] = if k_len == 0.0 { zero } else { h };
            packed[grid.packed_index(1, x, y)] = dx;
            packed[grid.packed_index(2, x, y)] = dz;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocean::{complex_zeros, generate_spectrum};
    use crate::params::BandParams;

    #[test]
    fn test_dc_bin_is_zero_in_every_block() {
        let grid = GridSpec::new(16).unwrap();
        // Non-zero DC input must still produce zero displacement
        let spectrum = vec![Complex32::new(1.0, -2.0); grid.texels()];
        let mut packed = complex_zeros(grid.packed_texels());
        build_tiles(&grid, &spectrum, &mut packed);
        for block in 0..3 {
            assert_eq!(packed[grid.packed_index(block, 0, 0)], Complex32::new(0.0, 0.0));
        }
        assert!(packed.iter().all(|c| c.re.is_finite() && c.im.is_finite()));
    }

    #[test]
    fn test_displacement_is_rotated_height() {
        let grid = GridSpec::new(8).unwrap();
        let mut spectrum = complex_zeros(grid.texels());
        // Bin (1, 0): k along +x
        spectrum[1] = Complex32::new(2.0, 3.0);
        let mut packed = complex_zeros(grid.packed_texels());
        build_tiles(&grid, &spectrum, &mut packed);

        assert_eq!(packed[grid.packed_index(0, 1, 0)], Complex32::new(2.0, 3.0));
        assert_eq!(packed[grid.packed_index(1, 1, 0)], Complex32::new(-3.0, 2.0));
        assert_eq!(packed[grid.packed_index(2, 1, 0)], Complex32::new(0.0, 0.0));
    }

    #[test]
    fn test_generated_band_packs_cleanly() {
        let grid = GridSpec::new(32).unwrap();
        let mut spectrum = complex_zeros(grid.texels());
        generate_spectrum(&grid, &BandParams::wind(), 10.0, &mut spectrum);
        let mut packed = complex_zeros(grid.packed_texels());
        build_tiles(&grid, &spectrum, &mut packed);
        assert!(packed.iter().all(|c| c.re.is_finite() && c.im.is_finite()));
    }
}
