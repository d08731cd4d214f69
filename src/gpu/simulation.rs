//! GPU backend: encodes the frame graph as one compute pass per stage.

use std::mem::size_of;

use bytemuck::Zeroable;
use log::{debug, trace};
use rustfft::num_complex::Complex32;
use wgpu::util::DeviceExt;

use super::buffers::{read_buffer, OceanBuffers};
use super::pipelines::ComputeKernels;
use super::uniforms::{
    CombineUniforms, FftUniforms, FoamUniforms, SpawnUniforms, SpectrumUniforms, UpdateUniforms,
};
use crate::error::{ConfigError, GpuError};
use crate::graph::{Band, Barrier, FrameGraph, Node, Stage};
use crate::ocean::{FoamStep, FrameInput, GridSpec, Particle, Slot, SpawnStep, UpdateStep};
use crate::params::OceanConfig;

/// Uniform buffers rewritten every frame
struct FrameUniformBuffers {
    spectrum: [wgpu::Buffer; 2],
    foam: wgpu::Buffer,
    update: wgpu::Buffer,
    spawn: wgpu::Buffer,
}

struct BindGroups {
    spectrum: [wgpu::BindGroup; 2],
    tile_build: [wgpu::BindGroup; 2],
    rows: [wgpu::BindGroup; 2],
    cols: [wgpu::BindGroup; 2],
    combine: wgpu::BindGroup,
    /// Indexed by the slot that is current (read) this frame
    foam: [wgpu::BindGroup; 2],
    spray_update: wgpu::BindGroup,
    spray_spawn: wgpu::BindGroup,
}

/// Ocean simulation resident on the GPU
pub struct GpuOcean {
    config: OceanConfig,
    grid: GridSpec,
    graph: FrameGraph,
    barriers: Vec<Barrier>,
    kernels: ComputeKernels,
    buffers: OceanBuffers,
    uniforms: FrameUniformBuffers,
    bind_groups: BindGroups,
    // Kept alive for the bind groups that reference them
    _fft_uniforms: wgpu::Buffer,
    _combine_uniforms: wgpu::Buffer,
    foam_slot: Slot,
    frame: u32,
}

fn uniform_buffer<T: bytemuck::Pod>(device: &wgpu::Device, label: &str, value: &T) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::bytes_of(value),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    })
}

impl GpuOcean {
    /// Allocate buffers, compile kernels and build every bind group
    pub fn new(device: &wgpu::Device, config: OceanConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let grid = GridSpec::new(config.grid_size)?;
        let graph = FrameGraph::ocean_frame();
        let barriers = graph.barriers();
        for barrier in &barriers {
            debug!("barrier {}", barrier);
        }

        let kernels = ComputeKernels::new(device, &grid);
        let buffers = OceanBuffers::new(device, &grid, config.particle_capacity);

        let fft_uniforms = uniform_buffer(
            device,
            "ifft_params",
            &FftUniforms {
                inv_n: 1.0 / grid.n() as f32,
                final_scale: config.final_scale,
                _padding: [0.0; 2],
            },
        );
        let combine_uniforms = uniform_buffer(
            device,
            "combine_params",
            &CombineUniforms {
                wind_displacement: config.wind_displacement,
                _padding: [0.0; 3],
            },
        );

        let uniforms = FrameUniformBuffers {
            spectrum: [
                uniform_buffer(device, "spectrum_params_swell", &SpectrumUniforms::new(&config.swell, 0.0)),
                uniform_buffer(device, "spectrum_params_wind", &SpectrumUniforms::new(&config.wind, 0.0)),
            ],
            foam: uniform_buffer(device, "foam_params", &FoamUniforms::zeroed()),
            update: uniform_buffer(device, "spray_update_params", &UpdateUniforms::zeroed()),
            spawn: uniform_buffer(device, "spray_spawn_params", &SpawnUniforms::zeroed()),
        };

        let bind_groups = BindGroups {
            spectrum: Band::ALL.map(|band| {
                kernels.spectrum.bind(
                    device,
                    "spectrum",
                    &[&uniforms.spectrum[band.index()], &buffers.band(band).spectrum],
                )
            }),
            tile_build: Band::ALL.map(|band| {
                let b = buffers.band(band);
                kernels.tile_build.bind(device, "tile_build", &[&b.spectrum, &b.packed_a])
            }),
            rows: Band::ALL.map(|band| {
                let b = buffers.band(band);
                kernels
                    .fft_rows
                    .bind(device, "ifft_rows", &[&fft_uniforms, &b.packed_a, &b.packed_b])
            }),
            cols: Band::ALL.map(|band| {
                let b = buffers.band(band);
                kernels
                    .fft_cols
                    .bind(device, "ifft_cols", &[&fft_uniforms, &b.packed_b, &b.packed_a])
            }),
            combine: kernels.combine.bind(
                device,
                "combine",
                &[
                    &combine_uniforms,
                    &buffers.band(Band::Swell).packed_a,
                    &buffers.band(Band::Wind).packed_a,
                    &buffers.displacement,
                ],
            ),
            foam: [Slot::A, Slot::B].map(|current| {
                kernels.foam.bind(
                    device,
                    "foam",
                    &[
                        &uniforms.foam,
                        &buffers.displacement,
                        buffers.foam(current),
                        buffers.foam(current.other()),
                    ],
                )
            }),
            spray_update: kernels
                .spray_update
                .bind(device, "spray_update", &[&uniforms.update, &buffers.particles]),
            spray_spawn: kernels.spray_spawn.bind(
                device,
                "spray_spawn",
                &[
                    &uniforms.spawn,
                    &buffers.displacement,
                    &buffers.particles,
                    &buffers.counter,
                ],
            ),
        };

        Ok(Self {
            config,
            grid,
            graph,
            barriers,
            kernels,
            buffers,
            uniforms,
            bind_groups,
            _fft_uniforms: fft_uniforms,
            _combine_uniforms: combine_uniforms,
            foam_slot: Slot::A,
            frame: 0,
        })
    }

    /// Upload this frame's uniforms
    pub fn prepare(&self, queue: &wgpu::Queue, input: &FrameInput) {
        for band in Band::ALL {
            let params = &self.config.bands()[band.index()];
            queue.write_buffer(
                &self.uniforms.spectrum[band.index()],
                0,
                bytemuck::bytes_of(&SpectrumUniforms::new(params, input.time_s)),
            );
        }

        let foam = FoamStep {
            dt_s: input.dt_s,
            patch_size_m: self.config.patch_size_m,
            choppiness: input.params.choppiness,
            params: self.config.foam,
        };
        queue.write_buffer(&self.uniforms.foam, 0, bytemuck::bytes_of(&FoamUniforms::from(&foam)));

        let update = UpdateStep::new(input.dt_s, &self.config.spray, input.origin_shift);
        queue.write_buffer(
            &self.uniforms.update,
            0,
            bytemuck::bytes_of(&UpdateUniforms::from(&update)),
        );

        let spawn = SpawnStep {
            dt_s: input.dt_s,
            frame: input.frame,
            camera_xz: input.camera_xz,
            patch_size_m: self.config.patch_size_m,
            height_scale: input.params.height_scale,
            choppiness: input.params.choppiness,
            params: self.config.spray,
        };
        queue.write_buffer(
            &self.uniforms.spawn,
            0,
            bytemuck::bytes_of(&SpawnUniforms::new(&spawn, self.config.particle_capacity)),
        );
    }

    /// Record every compute stage in graph order, one pass each.
    ///
    /// Pass boundaries are where wgpu inserts the storage-buffer barriers the
    /// frame graph derives.
    pub fn encode(&self, encoder: &mut wgpu::CommandEncoder) {
        for stage in self.graph.compute_stages() {
            for barrier in self.barriers.iter().filter(|b| b.before == Node::Compute(stage)) {
                trace!("frame {}: {}", self.frame, barrier);
            }

            let label = stage.to_string();
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some(&label),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.kernels.kernel(stage).pipeline);
            pass.set_bind_group(0, self.bind_group(stage), &[]);
            let (x, y, z) = self.kernels.dispatch_size(
                stage,
                self.config.particle_capacity,
                self.config.spray.spawn_grid,
            );
            pass.dispatch_workgroups(x, y, z);
        }
    }

    fn bind_group(&self, stage: Stage) -> &wgpu::BindGroup {
        let groups = &self.bind_groups;
        match stage {
            Stage::Spectrum(band) => &groups.spectrum[band.index()],
            Stage::TileBuild(band) => &groups.tile_build[band.index()],
            Stage::RowFft(band) => &groups.rows[band.index()],
            Stage::ColumnFft(band) => &groups.cols[band.index()],
            Stage::Combine => &groups.combine,
            Stage::Foam => &groups.foam[self.foam_slot.index()],
            Stage::SprayUpdate => &groups.spray_update,
            Stage::SpraySpawn => &groups.spray_spawn,
        }
    }

    /// Flip foam parity; call once the frame's commands are submitted
    pub fn finish_frame(&mut self) {
        self.foam_slot = self.foam_slot.other();
        self.frame = self.frame.wrapping_add(1);
    }

    /// Prepare, encode, submit and finish one frame without rendering
    pub fn step(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, input: &FrameInput) {
        self.prepare(queue, input);
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Simulation Encoder"),
        });
        self.encode(&mut encoder);
        queue.submit(std::iter::once(encoder.finish()));
        self.finish_frame();
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

    pub fn barriers(&self) -> &[Barrier] {
        &self.barriers
    }

    /// Frames finished so far
    pub fn frame(&self) -> u32 {
        self.frame
    }

    pub fn displacement_buffer(&self) -> &wgpu::Buffer {
        &self.buffers.displacement
    }

    /// Foam slot read this frame; the other slot is written
    pub fn foam_slot(&self) -> Slot {
        self.foam_slot
    }

    pub fn foam_buffer(&self, slot: Slot) -> &wgpu::Buffer {
        self.buffers.foam(slot)
    }

    pub fn particle_buffer(&self) -> &wgpu::Buffer {
        &self.buffers.particles
    }

    /// Combined displacement field (packed layout)
    pub fn read_displacement(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
    ) -> Result<Vec<Complex32>, GpuError> {
        read_complex(device, queue, &self.buffers.displacement, self.buffers.packed_bytes())
    }

    /// Spatial result of one band (packed layout)
    pub fn read_band(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        band: Band,
    ) -> Result<Vec<Complex32>, GpuError> {
        read_complex(device, queue, &self.buffers.band(band).packed_a, self.buffers.packed_bytes())
    }

    /// Foam of the last finished frame
    pub fn read_foam(&self, device: &wgpu::Device, queue: &wgpu::Queue) -> Result<Vec<f32>, GpuError> {
        read_buffer(device, queue, self.buffers.foam(self.foam_slot), self.buffers.foam_bytes())
    }

    pub fn read_particles(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
    ) -> Result<Vec<Particle>, GpuError> {
        read_buffer(device, queue, &self.buffers.particles, self.buffers.particle_bytes())
    }

    /// Total slot claims so far
    pub fn read_counter(&self, device: &wgpu::Device, queue: &wgpu::Queue) -> Result<u32, GpuError> {
        let values: Vec<u32> = read_buffer(device, queue, &self.buffers.counter, size_of::<u32>() as u64)?;
        Ok(values.first().copied().unwrap_or_default())
    }
}

fn read_complex(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    buffer: &wgpu::Buffer,
    size: u64,
) -> Result<Vec<Complex32>, GpuError> {
    let pairs: Vec<[f32; 2]> = read_buffer(device, queue, buffer, size)?;
    Ok(pairs.into_iter().map(|[re, im]| Complex32::new(re, im)).collect())
}
