//! CPU reference backend: runs the frame graph with the kernels in this module.

use glam::Vec2;
use log::debug;
use rustfft::num_complex::Complex32;

use super::{
    build_tiles, combine_bands, complex_zeros, generate_spectrum, inverse_fft_columns,
    inverse_fft_rows, spawn_particles, update_particles, FoamState, FoamStep, GridSpec,
    InverseFft, ParticlePool, SpawnStep, UpdateStep,
};
use crate::error::ConfigError;
use crate::graph::{Band, FrameGraph, Stage};
use crate::params::{BandParams, OceanConfig, SimulationParams};

/// Per-band working buffers: spectrum plus the two packed FFT buffers
#[derive(Debug, Clone)]
pub struct BandBuffers {
    pub params: BandParams,
    pub spectrum: Vec<Complex32>,
    /// Tile builder output and final spatial result
    pub packed_a: Vec<Complex32>,
    /// Row pass output
    pub packed_b: Vec<Complex32>,
}

impl BandBuffers {
    fn new(grid: &GridSpec, params: BandParams) -> Self {
        Self {
            params,
            spectrum: complex_zeros(grid.texels()),
            packed_a: complex_zeros(grid.packed_texels()),
            packed_b: complex_zeros(grid.packed_texels()),
        }
    }
}

/// Everything one frame of simulation depends on
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInput {
    /// Simulation time (seconds, already scaled by wave speed)
    pub time_s: f32,
    /// Wall-clock frame delta (seconds, clamped by each pass)
    pub dt_s: f32,
    pub frame: u32,
    /// Camera position in local XZ (meters)
    pub camera_xz: Vec2,
    /// Origin shift applied this frame (meters)
    pub origin_shift: Vec2,
    pub params: SimulationParams,
}

impl FrameInput {
    /// Stationary camera at the origin
    pub fn at_time(time_s: f32, dt_s: f32, frame: u32) -> Self {
        Self {
            time_s,
            dt_s,
            frame,
            camera_xz: Vec2::ZERO,
            origin_shift: Vec2::ZERO,
            params: SimulationParams::default(),
        }
    }

    pub fn with_camera(mut self, camera_xz: Vec2, origin_shift: Vec2) -> Self {
        self.camera_xz = camera_xz;
        self.origin_shift = origin_shift;
        self
    }
}

/// Simulation time, advanced by frame delta scaled by wave speed
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SimClock {
    time_s: f32,
    frame: u32,
}

impl SimClock {
    pub fn time_s(&self) -> f32 {
        self.time_s
    }

    pub fn frame(&self) -> u32 {
        self.frame
    }

    /// Advance one frame and describe it (camera at the origin)
    pub fn tick(&mut self, dt_s: f32, params: SimulationParams) -> FrameInput {
        self.time_s += dt_s * params.wave_speed;
        let input = FrameInput {
            params,
            ..FrameInput::at_time(self.time_s, dt_s, self.frame)
        };
        self.frame = self.frame.wrapping_add(1);
        input
    }
}

/// Whole simulation on the CPU, walking the same task list as the GPU
pub struct OceanSystem {
    config: OceanConfig,
    grid: GridSpec,
    fft: InverseFft,
    graph: FrameGraph,
    bands: [BandBuffers; 2],
    displacement: Vec<Complex32>,
    foam: FoamState,
    pool: ParticlePool,
    last_spawned: u32,
}

impl OceanSystem {
    /// Create new ocean system; fails on invalid configuration
    pub fn new(config: OceanConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let grid = GridSpec::new(config.grid_size)?;
        let pool = ParticlePool::new(config.particle_capacity)?;

        Ok(Self {
            fft: InverseFft::new(grid, config.final_scale),
            graph: FrameGraph::ocean_frame(),
            bands: [
                BandBuffers::new(&grid, config.swell),
                BandBuffers::new(&grid, config.wind),
            ],
            displacement: complex_zeros(grid.packed_texels()),
            foam: FoamState::new(&grid),
            pool,
            last_spawned: 0,
            grid,
            config,
        })
    }

    /// Run every compute stage in graph order, then swap foam parity
    pub fn run_frame(&mut self, input: &FrameInput) {
        let stages: Vec<Stage> = self.graph.compute_stages().collect();
        for stage in stages {
            self.run_stage(stage, input);
        }
        self.foam.swap();
    }

    /// Run one compute stage against the current buffers
    pub fn run_stage(&mut self, stage: Stage, input: &FrameInput) {
        let grid = self.grid;
        match stage {
            Stage::Spectrum(band) => {
                let buffers = &mut self.bands[band.index()];
                generate_spectrum(&grid, &buffers.params, input.time_s, &mut buffers.spectrum);
            }
            Stage::TileBuild(band) => {
                let buffers = &mut self.bands[band.index()];
                build_tiles(&grid, &buffers.spectrum, &mut buffers.packed_a);
            }
            Stage::RowFft(band) => {
                let buffers = &mut self.bands[band.index()];
                inverse_fft_rows(&self.fft, &buffers.packed_a, &mut buffers.packed_b);
            }
            Stage::ColumnFft(band) => {
                let buffers = &mut self.bands[band.index()];
                inverse_fft_columns(&self.fft, &buffers.packed_b, &mut buffers.packed_a);
            }
            Stage::Combine => {
                let [swell, wind] = &self.bands;
                combine_bands(
                    &grid,
                    &swell.packed_a,
                    &wind.packed_a,
                    self.config.wind_displacement,
                    &mut self.displacement,
                );
            }
            Stage::Foam => {
                let step = FoamStep {
                    dt_s: input.dt_s,
                    patch_size_m: self.config.patch_size_m,
                    choppiness: input.params.choppiness,
                    params: self.config.foam,
                };
                self.foam.step(&grid, &step, &self.displacement);
            }
            Stage::SprayUpdate => {
                let step = UpdateStep::new(input.dt_s, &self.config.spray, input.origin_shift);
                update_particles(self.pool.particles_mut(), &step);
            }
            Stage::SpraySpawn => {
                let step = SpawnStep {
                    dt_s: input.dt_s,
                    frame: input.frame,
                    camera_xz: input.camera_xz,
                    patch_size_m: self.config.patch_size_m,
                    height_scale: input.params.height_scale,
                    choppiness: input.params.choppiness,
                    params: self.config.spray,
                };
                self.last_spawned = spawn_particles(&grid, &self.displacement, &mut self.pool, &step);
                debug!("frame {}: spawned {} spray particles", input.frame, self.last_spawned);
            }
        }
    }

    pub fn config(&self) -> &OceanConfig {
        &self.config
    }

    pub fn grid(&self) -> &GridSpec {
        &self.grid
    }

    pub fn graph(&self) -> &FrameGraph {
        &self.graph
    }

    /// Spatial result of one band (packed layout)
    pub fn band_field(&self, band: Band) -> &[Complex32] {
        &self.bands[band.index()].packed_a
    }

    pub fn band(&self, band: Band) -> &BandBuffers {
        &self.bands[band.index()]
    }

    /// Combined displacement field (packed layout)
    pub fn displacement(&self) -> &[Complex32] {
        &self.displacement
    }

    pub fn foam(&self) -> &FoamState {
        &self.foam
    }

    pub fn pool(&self) -> &ParticlePool {
        &self.pool
    }

    pub fn last_spawned(&self) -> u32 {
        self.last_spawned
    }
}
