//! Spectral ocean simulation: CPU reference kernels for every compute pass.
//!
//! Each kernel here mirrors one WGSL compute shader under `src/shaders/`
//! and operates on the same flat buffer layouts, so GPU readbacks can be
//! compared texel-for-texel against these results.

mod combine;
mod fft;
mod field;
mod foam;
pub mod hash;
mod mesh;
mod spectrum;
mod spray;
mod system;
mod tile;

// Re-export public types
pub use combine::combine_bands;
pub use fft::{inverse_fft_columns, inverse_fft_rows, InverseFft};
pub use foam::{accumulate_foam, FoamState, FoamStep, STREAK_TEXELS_PER_S};
pub use mesh::{PatchMesh, Vertex};
pub use spectrum::{generate_spectrum, wave_vector};
pub(crate) use spectrum::MIN_WAVENUMBER;
pub use spray::{spawn_particles, update_particles, Particle, ParticlePool, SpawnStep, UpdateStep};
pub use system::{BandBuffers, FrameInput, OceanSystem, SimClock};
pub use tile::build_tiles;

use rustfft::num_complex::Complex32;

use crate::error::ConfigError;
use crate::params::{MAX_GRID, MIN_GRID};

/// Number of packed sub-spectra per band (height, dx, dz)
pub const PACKED_BLOCKS: usize = 3;

/// Validated FFT grid resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridSpec {
    n: usize,
}

impl GridSpec {
    /// Validate a grid resolution (power of two within the supported range)
    pub fn new(n: usize) -> Result<Self, ConfigError> {
        if !n.is_power_of_two() {
            return Err(ConfigError::GridNotPowerOfTwo(n));
        }
        if !(MIN_GRID..=MAX_GRID).contains(&n) {
            return Err(ConfigError::GridOutOfRange(n));
        }
        Ok(Self { n })
    }

    /// Texels per side
    pub fn n(&self) -> usize {
        self.n
    }

    pub fn log2_n(&self) -> u32 {
        self.n.trailing_zeros()
    }

    /// Texels in one N×N buffer
    pub fn texels(&self) -> usize {
        self.n * self.n
    }

    /// Width of a packed buffer (3N)
    pub fn packed_width(&self) -> usize {
        PACKED_BLOCKS * self.n
    }

    /// Texels in one packed 3N×N buffer
    pub fn packed_texels(&self) -> usize {
        PACKED_BLOCKS * self.texels()
    }

    /// Index of texel (x, y) in an N×N buffer, wrapping periodically
    pub fn wrap_index(&self, x: i64, y: i64) -> usize {
        let n = self.n as i64;
        (y.rem_euclid(n) * n + x.rem_euclid(n)) as usize
    }

    /// Index of texel (x, y) of `block` in a packed buffer
    pub fn packed_index(&self, block: usize, x: usize, y: usize) -> usize {
        y * self.packed_width() + block * self.n + x
    }

    /// Signed frequency index for FFT bin `i` (0..N/2 then -N/2..0)
    pub fn signed_frequency(&self, i: usize) -> i64 {
        let half = self.n / 2;
        if i < half {
            i as i64
        } else {
            i as i64 - self.n as i64
        }
    }
}

/// Which of two ping-ponged buffers is meant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    A,
    B,
}

impl Slot {
    pub fn other(self) -> Self {
        match self {
            Slot::A => Slot::B,
            Slot::B => Slot::A,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Slot::A => 0,
            Slot::B => 1,
        }
    }
}

/// Two buffers with an explicit "current" slot; the other is the write target
#[derive(Debug, Clone)]
pub struct PingPong<T> {
    slots: [T; 2],
    current: Slot,
}

impl<T> PingPong<T> {
    pub fn new(a: T, b: T) -> Self {
        Self {
            slots: [a, b],
            current: Slot::A,
        }
    }

    /// Slot holding last frame's result
    pub fn current_slot(&self) -> Slot {
        self.current
    }

    /// Buffer read as prior state this frame
    pub fn current(&self) -> &T {
        &self.slots[self.current.index()]
    }

    /// Buffer written this frame
    pub fn next(&self) -> &T {
        &self.slots[self.current.other().index()]
    }

    /// Borrow (current, next) at once for a read-then-write step
    pub fn split(&mut self) -> (&T, &mut T) {
        let [a, b] = &mut self.slots;
        match self.current {
            Slot::A => (&*a, b),
            Slot::B => (&*b, a),
        }
    }

    /// Make the freshly written buffer current
    pub fn swap(&mut self) {
        self.current = self.current.other();
    }
}

/// Zeroed complex buffer
pub(crate) fn complex_zeros(len: usize) -> Vec<Complex32> {
    vec![Complex32::new(0.0, 0.0); len]
}

/// Smooth Hermite step, identical to WGSL `smoothstep`
pub(crate) fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_spec_validation() {
        assert!(GridSpec::new(256).is_ok());
        assert_eq!(GridSpec::new(100), Err(ConfigError::GridNotPowerOfTwo(100)));
        assert_eq!(GridSpec::new(1), Err(ConfigError::GridOutOfRange(1)));
        assert_eq!(GridSpec::new(0), Err(ConfigError::GridNotPowerOfTwo(0)));
    }

    #[test]
    fn test_signed_frequency_and_wrap() {
        let grid = GridSpec::new(8).unwrap();
        assert_eq!(grid.signed_frequency(0), 0);
        assert_eq!(grid.signed_frequency(3), 3);
        assert_eq!(grid.signed_frequency(4), -4);
        assert_eq!(grid.signed_frequency(7), -1);
        assert_eq!(grid.wrap_index(-1, 0), 7);
        assert_eq!(grid.wrap_index(8, 9), 8);
        assert_eq!(grid.packed_index(2, 1, 1), 24 + 16 + 1);
    }

    #[test]
    fn test_ping_pong_swaps_roles() {
        let mut pp = PingPong::new(vec![1.0_f32], vec![2.0_f32]);
        assert_eq!(pp.current_slot(), Slot::A);
        {
            let (read, write) = pp.split();
            write[0] = read[0] + 10.0;
        }
        assert_eq!(pp.next()[0], 11.0);
        pp.swap();
        assert_eq!(pp.current_slot(), Slot::B);
        assert_eq!(pp.current()[0], 11.0);
        assert_eq!(pp.next()[0], 1.0);
    }

    #[test]
    fn test_smoothstep_edges() {
        assert_eq!(smoothstep(0.1, 0.3, 0.0), 0.0);
        assert_eq!(smoothstep(0.1, 0.3, 1.0), 1.0);
        assert!((smoothstep(0.0, 1.0, 0.5) - 0.5).abs() < 1e-6);
    }
}
