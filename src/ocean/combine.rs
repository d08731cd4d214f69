//! Merges the transformed swell and wind bands into the displacement field.

use rustfft::num_complex::Complex32;

use super::GridSpec;

/// Block 0 gets `swell + wind`; blocks 1 and 2 get `swell + wind_disp · wind`
pub fn combine_bands(
    grid: &GridSpec,
    swell: &[Complex32],
    wind: &[Complex32],
    wind_displacement: f32,
    out: &mut [Complex32],
) {
    debug_assert_eq!(swell.len(), grid.packed_texels());
    debug_assert_eq!(wind.len(), grid.packed_texels());
    debug_assert_eq!(out.len(), grid.packed_texels());
    let n = grid.n();

    for (i, texel) in out.iter_mut().enumerate() {
        let block = (i % grid.packed_width()) / n;
        let weight = if block == 0 { 1.0 } else { wind_displacement };
        *texel = swell[i] + wind[i] * weight;
    }
}
