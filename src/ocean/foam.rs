//! Foam accumulation over ping-ponged N×N buffers.
//!
//! Each frame reads last frame's foam ("current"), decays it, advects it
//! downslope, injects new foam at steep or folding crests and writes the
//! result into "next". The caller swaps the two after the frame.

use rustfft::num_complex::Complex32;

use super::field::{bilinear, sample_surface};
use super::{smoothstep, GridSpec, PingPong, Slot};
use crate::params::{clamp_dt, FoamParams, CHOP_UNIT};

/// Advection distance at full streak strength (texels per second)
pub const STREAK_TEXELS_PER_S: f32 = 8.0;

/// Per-frame inputs of the foam pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FoamStep {
    /// Frame delta (seconds); clamped to `[0, MAX_DT_S]` when applied
    pub dt_s: f32,
    pub patch_size_m: f32,
    pub choppiness: f32,
    pub params: FoamParams,
}

impl FoamStep {
    /// Timestep actually integrated
    pub fn effective_dt(&self) -> f32 {
        clamp_dt(self.dt_s)
    }
}

/// Write the next foam buffer from the displacement field and `prev`
pub fn accumulate_foam(
    grid: &GridSpec,
    step: &FoamStep,
    displacement: &[Complex32],
    prev: &[f32],
    next: &mut [f32],
) {
    debug_assert_eq!(prev.len(), grid.texels());
    debug_assert_eq!(next.len(), grid.texels());
    let n = grid.n();
    let p = &step.params;
    let dt = step.effective_dt();
    let spacing_m = step.patch_size_m / n as f32;
    let chop = step.choppiness * CHOP_UNIT;
    let decay = (-p.decay_per_s * dt).exp();

    for y in 0..n {
        for x in 0..n {
            let (u, v) = (x as f32, y as f32);
            let surface = sample_surface(grid, displacement, u, v, spacing_m, chop);
            let slope = surface.slope();

            let crest = smoothstep(p.slope0, p.slope1, slope).max(smoothstep(p.fold0, p.fold1, surface.fold));

            let strength = (slope / p.slope1).min(1.0);
            let offset = surface.downslope() * (p.flow_scale * p.streak * STREAK_TEXELS_PER_S * strength * dt);
            let advected = bilinear(grid, u - offset.x, v - offset.y, |sx, sy| prev[sy * n + sx]);

            next[y * n + x] = (advected * decay + p.inject_per_s * crest * dt).clamp(0.0, 1.0);
        }
    }
}

/// Two foam buffers with explicit parity, zeroed at startup
#[derive(Debug, Clone)]
pub struct FoamState {
    buffers: PingPong<Vec<f32>>,
}

impl FoamState {
    pub fn new(grid: &GridSpec) -> Self {
        Self::filled(grid, 0.0)
    }

    /// Both buffers set to `value`
    pub fn filled(grid: &GridSpec, value: f32) -> Self {
        let buffer = vec![value; grid.texels()];
        Self {
            buffers: PingPong::new(buffer.clone(), buffer),
        }
    }

    /// Run the foam pass: current → next
    pub fn step(&mut self, grid: &GridSpec, step: &FoamStep, displacement: &[Complex32]) {
        let (prev, next) = self.buffers.split();
        accumulate_foam(grid, step, displacement, prev, next);
    }

    /// Make the buffer written this frame current
    pub fn swap(&mut self) {
        self.buffers.swap();
    }

    pub fn current_slot(&self) -> Slot {
        self.buffers.current_slot()
    }

    /// Last completed foam buffer
    pub fn current(&self) -> &[f32] {
        self.buffers.current()
    }

    /// Buffer written by the most recent `step`
    pub fn next(&self) -> &[f32] {
        self.buffers.next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocean::{complex_zeros, generate_spectrum, build_tiles, inverse_fft_columns, inverse_fft_rows, InverseFft};
    use crate::params::BandParams;

    fn step(dt_s: f32) -> FoamStep {
        FoamStep {
            dt_s,
            patch_size_m: 512.0,
            choppiness: 6.0,
            params: FoamParams::default(),
        }
    }

    fn wavy_field(grid: &GridSpec) -> Vec<Complex32> {
        let mut spectrum = complex_zeros(grid.texels());
        generate_spectrum(grid, &BandParams::wind(), 4.0, &mut spectrum);
        let mut a = complex_zeros(grid.packed_texels());
        let mut b = complex_zeros(grid.packed_texels());
        build_tiles(grid, &spectrum, &mut a);
        let plan = InverseFft::new(*grid, 25.0);
        inverse_fft_rows(&plan, &a, &mut b);
        inverse_fft_columns(&plan, &b, &mut a);
        a
    }

    #[test]
    fn test_decay_without_injection_is_exponential() {
        let grid = GridSpec::new(8).unwrap();
        let field = complex_zeros(grid.packed_texels());
        let mut foam = FoamState::filled(&grid, 0.8);
        let mut s = step(0.02);
        s.params.inject_per_s = 0.0;

        for _ in 0..100 {
            foam.step(&grid, &s, &field);
            foam.swap();
        }

        let expected = 0.8 * (-s.params.decay_per_s * 2.0).exp();
        for &value in foam.current() {
            assert!(value >= 0.0);
            assert!((value - expected).abs() < 1e-4, "{} vs {}", value, expected);
        }
    }

    #[test]
    fn test_dt_spike_matches_clamp_ceiling() {
        let grid = GridSpec::new(32).unwrap();
        let field = wavy_field(&grid);
        let prev = vec![0.3; grid.texels()];

        let mut spiked = vec![0.0; grid.texels()];
        let mut ceiling = vec![0.0; grid.texels()];
        accumulate_foam(&grid, &step(10.0), &field, &prev, &mut spiked);
        accumulate_foam(&grid, &step(0.05), &field, &prev, &mut ceiling);
        assert_eq!(spiked, ceiling);
    }

    #[test]
    fn test_foam_stays_in_unit_range() {
        let grid = GridSpec::new(32).unwrap();
        let field = wavy_field(&grid);
        let mut foam = FoamState::new(&grid);
        let mut s = step(0.05);
        s.params.inject_per_s = 50.0;

        for _ in 0..20 {
            foam.step(&grid, &s, &field);
            foam.swap();
        }
        assert!(foam.current().iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn test_step_writes_next_and_swap_flips_parity() {
        let grid = GridSpec::new(4).unwrap();
        let field = complex_zeros(grid.packed_texels());
        let mut foam = FoamState::filled(&grid, 0.5);
        let mut s = step(0.05);
        s.params.inject_per_s = 0.0;

        foam.step(&grid, &s, &field);
        assert_eq!(foam.current()[0], 0.5);
        assert!(foam.next()[0] < 0.5);

        foam.swap();
        assert_eq!(foam.current_slot(), Slot::B);
        assert!(foam.current()[0] < 0.5);
    }
}
