//! Ocean simulation parameters: fixed build-time sizes, per-band spectra,
//! foam and spray tuning, and the live-adjustable tunables.

use crate::error::ConfigError;

/// Default FFT grid resolution (texels per side)
pub const DEFAULT_GRID: usize = 256;

/// Smallest accepted grid resolution
pub const MIN_GRID: usize = 2;

/// Largest accepted grid resolution (GPU FFT runs N/2 invocations per workgroup)
pub const MAX_GRID: usize = 512;

/// World-space extent of one simulated tile (meters)
pub const PATCH_SIZE_M: f32 = 512.0;

/// Default spray particle pool capacity
pub const MAX_PARTICLES: u32 = 16384;

/// Upper bound on the simulation timestep (seconds); frame hitches are clamped to this
pub const MAX_DT_S: f32 = 0.05;

/// Gravitational acceleration used by the dispersion relation (m/s²)
pub const GRAVITY_M_PER_S2: f32 = 9.81;

/// Meters of surface height per unit of `height_scale` per field unit
pub const HEIGHT_UNIT: f32 = 0.01;

/// Horizontal displacement per unit of `choppiness` per field unit
pub const CHOP_UNIT: f32 = 0.1;

/// Clamp a frame delta to the stable range `[0, MAX_DT_S]`.
pub fn clamp_dt(dt_s: f32) -> f32 {
    if dt_s.is_nan() {
        return 0.0;
    }
    dt_s.clamp(0.0, MAX_DT_S)
}

/// One independent spectral band (swell or wind sea)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandParams {
    /// Wind direction on the XZ plane (normalized by the generator)
    pub wind_dir: [f32; 2],

    /// Phillips spectrum amplitude (dimensionless)
    pub amplitude: f32,

    /// Wind speed (m/s), sets the largest wave length V²/g
    pub wind_speed_m_per_s: f32,

    /// Patch size this band is simulated over (meters)
    pub patch_size_m: f32,

    /// Seed for the per-texel gaussian draw
    pub seed: u32,
}

impl BandParams {
    /// Long-period swell band
    pub fn swell() -> Self {
        Self {
            wind_dir: [0.8, 0.2],
            amplitude: 0.0018,
            wind_speed_m_per_s: 38.0,
            patch_size_m: PATCH_SIZE_M,
            seed: 1337,
        }
    }

    /// Short, choppy wind-sea band
    pub fn wind() -> Self {
        Self {
            wind_dir: [1.0, 0.0],
            amplitude: 0.0030,
            wind_speed_m_per_s: 22.0,
            patch_size_m: PATCH_SIZE_M,
            seed: 424242,
        }
    }
}

/// Foam accumulation tuning
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FoamParams {
    /// Strength of downslope advection of existing foam
    pub flow_scale: f32,

    /// Exponential decay rate (1/s)
    pub decay_per_s: f32,

    /// Injection rate at full crest weight (foam units/s)
    pub inject_per_s: f32,

    /// Slope magnitude where injection starts
    pub slope0: f32,

    /// Slope magnitude where injection saturates
    pub slope1: f32,

    /// Fold (1 - Jacobian) where crest detection starts
    pub fold0: f32,

    /// Fold where crest detection saturates
    pub fold1: f32,

    /// Streak multiplier applied on top of `flow_scale`
    pub streak: f32,
}

impl Default for FoamParams {
    fn default() -> Self {
        Self {
            flow_scale: 0.75,
            decay_per_s: 0.22,
            inject_per_s: 1.60,
            slope0: 0.09,
            slope1: 0.30,
            fold0: 0.0,
            fold1: 0.60,
            streak: 1.0,
        }
    }
}

/// Spray particle tuning
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SprayParams {
    /// Linear drag coefficient (1/s)
    pub drag_per_s: f32,

    /// Signed gravity along +Y (m/s²)
    pub gravity_m_per_s2: f32,

    /// Expected spawns per second per fully-weighted cell
    pub spawn_rate: f32,

    /// Candidate spawn cells per side
    pub spawn_grid: u32,

    /// Side of the spawn square around the camera, in patches
    pub spawn_area_patches: f32,

    /// Wind direction biasing the outward launch direction
    pub wind_dir: [f32; 2],

    pub slope0: f32,
    pub slope1: f32,
    pub fold0: f32,
    pub fold1: f32,

    /// Mean particle lifetime (seconds)
    pub base_life_s: f32,

    /// Upward launch speed (m/s)
    pub v_up_m_per_s: f32,

    /// Outward launch speed (m/s)
    pub v_side_m_per_s: f32,
}

impl Default for SprayParams {
    fn default() -> Self {
        Self {
            drag_per_s: 1.5,
            gravity_m_per_s2: -9.8,
            spawn_rate: 8.0,
            spawn_grid: 128,
            spawn_area_patches: 2.25,
            wind_dir: [1.0, 0.0],
            slope0: 0.10,
            slope1: 0.35,
            fold0: 0.0,
            fold1: 0.6,
            base_life_s: 1.15,
            v_up_m_per_s: 8.5,
            v_side_m_per_s: 4.0,
        }
    }
}

/// Fixed-at-startup simulation configuration
#[derive(Debug, Clone, PartialEq)]
pub struct OceanConfig {
    /// FFT grid resolution (power of two)
    pub grid_size: usize,

    /// Simulated tile extent (meters)
    pub patch_size_m: f32,

    /// Spray particle pool capacity
    pub particle_capacity: u32,

    /// Multiplier converting the inverse transform into field units
    pub final_scale: f32,

    /// Weight of the wind band's horizontal displacement in the combined field
    pub wind_displacement: f32,

    pub swell: BandParams,
    pub wind: BandParams,
    pub foam: FoamParams,
    pub spray: SprayParams,
}

impl Default for OceanConfig {
    fn default() -> Self {
        Self {
            grid_size: DEFAULT_GRID,
            patch_size_m: PATCH_SIZE_M,
            particle_capacity: MAX_PARTICLES,
            final_scale: 25.0,
            wind_displacement: 0.35,
            swell: BandParams::swell(),
            wind: BandParams::wind(),
            foam: FoamParams::default(),
            spray: SprayParams::default(),
        }
    }
}

impl OceanConfig {
    /// Check startup preconditions
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.grid_size.is_power_of_two() {
            return Err(ConfigError::GridNotPowerOfTwo(self.grid_size));
        }
        if !(MIN_GRID..=MAX_GRID).contains(&self.grid_size) {
            return Err(ConfigError::GridOutOfRange(self.grid_size));
        }
        if self.particle_capacity == 0 {
            return Err(ConfigError::EmptyParticlePool);
        }
        for patch in [
            self.patch_size_m,
            self.swell.patch_size_m,
            self.wind.patch_size_m,
        ] {
            if !(patch.is_finite() && patch > 0.0) {
                return Err(ConfigError::InvalidPatchSize(patch));
            }
        }
        Ok(())
    }

    /// Both bands in dispatch order (swell first)
    pub fn bands(&self) -> [BandParams; 2] {
        [self.swell, self.wind]
    }
}

/// Live tunables adjusted from keyboard input each frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationParams {
    /// Simulation time advanced per wall-clock second
    pub wave_speed: f32,

    /// Vertical exaggeration (percent of field height)
    pub height_scale: f32,

    /// Horizontal displacement strength
    pub choppiness: f32,

    /// Extra analytic swell height in the water vertex shader (meters)
    pub swell_amplitude: f32,

    /// Analytic swell phase speed (rad/s)
    pub swell_speed: f32,

    /// Exposure applied before display tonemapping
    pub exposure: f32,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            wave_speed: 3.0,
            height_scale: 100.0,
            choppiness: 6.0,
            swell_amplitude: 1.5,
            swell_speed: 0.25,
            exposure: 0.55,
        }
    }
}

/// Names of the live-adjustable tunables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tunable {
    WaveSpeed,
    HeightScale,
    Choppiness,
    SwellAmplitude,
    SwellSpeed,
    Exposure,
}

impl Tunable {
    /// (min, max, step) per key press
    pub fn range(self) -> (f32, f32, f32) {
        match self {
            Tunable::WaveSpeed => (0.05, 5.0, 0.05),
            Tunable::HeightScale => (0.0, 200.0, 0.5),
            Tunable::Choppiness => (0.0, 50.0, 0.25),
            Tunable::SwellAmplitude => (0.0, 20.0, 0.1),
            Tunable::SwellSpeed => (0.0, 5.0, 0.02),
            Tunable::Exposure => (0.2, 2.0, 0.03),
        }
    }
}

impl SimulationParams {
    fn field_mut(&mut self, tunable: Tunable) -> &mut f32 {
        match tunable {
            Tunable::WaveSpeed => &mut self.wave_speed,
            Tunable::HeightScale => &mut self.height_scale,
            Tunable::Choppiness => &mut self.choppiness,
            Tunable::SwellAmplitude => &mut self.swell_amplitude,
            Tunable::SwellSpeed => &mut self.swell_speed,
            Tunable::Exposure => &mut self.exposure,
        }
    }

    /// Step a tunable up (`steps > 0`) or down, clamped to its range.
    /// Returns the new value.
    pub fn adjust(&mut self, tunable: Tunable, steps: i32) -> f32 {
        let (min, max, step) = tunable.range();
        let value = self.field_mut(tunable);
        *value = (*value + step * steps as f32).clamp(min, max);
        *value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(OceanConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_rejects_non_power_of_two_grid() {
        let config = OceanConfig {
            grid_size: 200,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::GridNotPowerOfTwo(200)));
    }

    #[test]
    fn test_rejects_oversized_grid_and_empty_pool() {
        let config = OceanConfig {
            grid_size: 1024,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::GridOutOfRange(1024)));

        let config = OceanConfig {
            particle_capacity: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::EmptyParticlePool));
    }

    #[test]
    fn test_clamp_dt() {
        assert_eq!(clamp_dt(10.0), MAX_DT_S);
        assert_eq!(clamp_dt(0.016), 0.016);
        assert_eq!(clamp_dt(-1.0), 0.0);
        assert_eq!(clamp_dt(f32::NAN), 0.0);
    }

    #[test]
    fn test_adjust_clamps_to_range() {
        let mut params = SimulationParams::default();
        for _ in 0..1000 {
            params.adjust(Tunable::HeightScale, 1);
        }
        assert_eq!(params.height_scale, 200.0);

        let v = params.adjust(Tunable::Exposure, -1000);
        assert_eq!(v, 0.2);

        let before = params.choppiness;
        let after = params.adjust(Tunable::Choppiness, 1);
        assert!((after - (before + 0.25)).abs() < 1e-6);
    }
}
