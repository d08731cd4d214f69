//! Separable radix-2 inverse FFT over the packed 3N×N layout.
//!
//! Mirrors `shaders/ifft.wgsl`: a bit-reversal load followed by log2(N)
//! butterfly stages with a positive exponent. The rows pass reads buffer A
//! and writes B; the columns pass reads B, writes A and applies
//! `final_scale` once. No 1/N factor is applied to amplitudes: `inv_n` only
//! sets the twiddle step, so a unit bin synthesises a wave of amplitude
//! `final_scale`.

use std::f32::consts::TAU;

use rustfft::num_complex::Complex32;

use super::{GridSpec, PACKED_BLOCKS};

/// Precomputed plan shared by both passes
#[derive(Debug, Clone)]
pub struct InverseFft {
    grid: GridSpec,
    inv_n: f32,
    final_scale: f32,
    reversed: Vec<usize>,
}

impl InverseFft {
    pub fn new(grid: GridSpec, final_scale: f32) -> Self {
        let bits = grid.log2_n();
        let reversed = (0..grid.n())
            .map(|i| {
                if bits == 0 {
                    0
                } else {
                    i.reverse_bits() >> (usize::BITS - bits)
                }
            })
            .collect();

        Self {
            grid,
            inv_n: 1.0 / grid.n() as f32,
            final_scale,
            reversed,
        }
    }

    pub fn grid(&self) -> &GridSpec {
        &self.grid
    }

    /// Twiddle step constant fed to both passes
    pub fn inv_n(&self) -> f32 {
        self.inv_n
    }

    pub fn final_scale(&self) -> f32 {
        self.final_scale
    }

    /// In-place inverse transform of one line of length N
    fn transform_line(&self, input: &[Complex32], line: &mut [Complex32]) {
        let n = self.grid.n();
        for (i, &r) in self.reversed.iter().enumerate() {
            line[i] = input[r];
        }

        let mut half = 1;
        while half < n {
            let stride = n / (2 * half);
            for t in 0..n / 2 {
                let group = t / half;
                let pos = t % half;
                let i0 = group * 2 * half + pos;
                let i1 = i0 + half;

                let angle = TAU * (pos * stride) as f32 * self.inv_n;
                let (sin, cos) = angle.sin_cos();
                let w = Complex32::new(cos, sin);

                let a = line[i0];
                let b = line[i1] * w;
                line[i0] = a + b;
                line[i1] = a - b;
            }
            half *= 2;
        }
    }
}

/// Rows pass: transform every (row, block) line of `src` into `dst`
pub fn inverse_fft_rows(plan: &InverseFft, src: &[Complex32], dst: &mut [Complex32]) {
    let grid = plan.grid;
    debug_assert_eq!(src.len(), grid.packed_texels());
    debug_assert_eq!(dst.len(), grid.packed_texels());
    let n = grid.n();
    let mut input = vec![Complex32::new(0.0, 0.0); n];
    let mut line = input.clone();

    for y in 0..n {
        for block in 0..PACKED_BLOCKS {
            let start = grid.packed_index(block, 0, y);
            input.copy_from_slice(&src[start..start + n]);
            plan.transform_line(&input, &mut line);
            dst[start..start + n].copy_from_slice(&line);
        }
    }
}

/// Columns pass: transform every (column, block) line of `src` into `dst`,
/// scaled by `final_scale`
pub fn inverse_fft_columns(plan: &InverseFft, src: &[Complex32], dst: &mut [Complex32]) {
    let grid = plan.grid;
    debug_assert_eq!(src.len(), grid.packed_texels());
    debug_assert_eq!(dst.len(), grid.packed_texels());
    let n = grid.n();
    let mut input = vec![Complex32::new(0.0, 0.0); n];
    let mut line = input.clone();

    for x in 0..n {
        for block in 0..PACKED_BLOCKS {
            for (y, value) in input.iter_mut().enumerate() {
                *value = src[grid.packed_index(block, x, y)];
            }
            plan.transform_line(&input, &mut line);
            for (y, value) in line.iter().enumerate() {
                dst[grid.packed_index(block, x, y)] = *value * plan.final_scale;
            }
        }
    }
}
