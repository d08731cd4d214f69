//! Compute pipelines and their bind group layouts.

use super::{create_shader, ShaderKind};
use crate::graph::Stage;
use crate::ocean::GridSpec;

/// 2D workgroup edge used by every per-texel kernel
pub const TILE_WORKGROUP: u32 = 8;
/// Workgroup width of the particle update kernel
pub const PARTICLE_WORKGROUP: u32 = 64;

pub(crate) fn uniform_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

pub(crate) fn storage_entry(
    binding: u32,
    read_only: bool,
    visibility: wgpu::ShaderStages,
) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

/// Binding kinds of a compute kernel, in binding order
#[derive(Clone, Copy)]
enum BindingKind {
    Uniform,
    Read,
    ReadWrite,
}

/// One compute pipeline plus the layout its bind groups are built against
pub struct Kernel {
    pub pipeline: wgpu::ComputePipeline,
    pub layout: wgpu::BindGroupLayout,
}

impl Kernel {
    fn new(
        device: &wgpu::Device,
        module: &wgpu::ShaderModule,
        entry_point: &str,
        label: &str,
        bindings: &[BindingKind],
    ) -> Self {
        let entries: Vec<_> = bindings
            .iter()
            .enumerate()
            .map(|(binding, kind)| {
                let binding = binding as u32;
                match kind {
                    BindingKind::Uniform => uniform_entry(binding, wgpu::ShaderStages::COMPUTE),
                    BindingKind::Read => storage_entry(binding, true, wgpu::ShaderStages::COMPUTE),
                    BindingKind::ReadWrite => storage_entry(binding, false, wgpu::ShaderStages::COMPUTE),
                }
            })
            .collect();

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(label),
            entries: &entries,
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(label),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some(label),
            layout: Some(&pipeline_layout),
            module,
            entry_point: Some(entry_point),
            compilation_options: Default::default(),
            cache: None,
        });

        Self { pipeline, layout }
    }

    /// Bind group whose entries are `buffers` in binding order
    pub fn bind(&self, device: &wgpu::Device, label: &str, buffers: &[&wgpu::Buffer]) -> wgpu::BindGroup {
        let entries: Vec<_> = buffers
            .iter()
            .enumerate()
            .map(|(binding, buffer)| wgpu::BindGroupEntry {
                binding: binding as u32,
                resource: buffer.as_entire_binding(),
            })
            .collect();

        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &self.layout,
            entries: &entries,
        })
    }
}

/// All simulation kernels for one grid size
pub struct ComputeKernels {
    pub spectrum: Kernel,
    pub tile_build: Kernel,
    pub fft_rows: Kernel,
    pub fft_cols: Kernel,
    pub combine: Kernel,
    pub foam: Kernel,
    pub spray_update: Kernel,
    pub spray_spawn: Kernel,
    grid: GridSpec,
}

impl ComputeKernels {
    pub fn new(device: &wgpu::Device, grid: &GridSpec) -> Self {
        use BindingKind::*;

        let fft = create_shader(device, ShaderKind::Fft, grid);

        Self {
            spectrum: Kernel::new(
                device,
                &create_shader(device, ShaderKind::Spectrum, grid),
                "main",
                "spectrum",
                &[Uniform, ReadWrite],
            ),
            tile_build: Kernel::new(
                device,
                &create_shader(device, ShaderKind::TileBuild, grid),
                "main",
                "tile_build",
                &[Read, ReadWrite],
            ),
            fft_rows: Kernel::new(device, &fft, "rows", "ifft_rows", &[Uniform, Read, ReadWrite]),
            fft_cols: Kernel::new(device, &fft, "cols", "ifft_cols", &[Uniform, Read, ReadWrite]),
            combine: Kernel::new(
                device,
                &create_shader(device, ShaderKind::Combine, grid),
                "main",
                "combine",
                &[Uniform, Read, Read, ReadWrite],
            ),
            foam: Kernel::new(
                device,
                &create_shader(device, ShaderKind::Foam, grid),
                "main",
                "foam",
                &[Uniform, Read, Read, ReadWrite],
            ),
            spray_update: Kernel::new(
                device,
                &create_shader(device, ShaderKind::SprayUpdate, grid),
                "main",
                "spray_update",
                &[Uniform, ReadWrite],
            ),
            spray_spawn: Kernel::new(
                device,
                &create_shader(device, ShaderKind::SpraySpawn, grid),
                "main",
                "spray_spawn",
                &[Uniform, Read, ReadWrite, ReadWrite],
            ),
            grid: *grid,
        }
    }

    pub fn kernel(&self, stage: Stage) -> &Kernel {
        match stage {
            Stage::Spectrum(_) => &self.spectrum,
            Stage::TileBuild(_) => &self.tile_build,
            Stage::RowFft(_) => &self.fft_rows,
            Stage::ColumnFft(_) => &self.fft_cols,
            Stage::Combine => &self.combine,
            Stage::Foam => &self.foam,
            Stage::SprayUpdate => &self.spray_update,
            Stage::SpraySpawn => &self.spray_spawn,
        }
    }

    /// Workgroup counts for `stage`
    pub fn dispatch_size(&self, stage: Stage, particle_capacity: u32, spawn_grid: u32) -> (u32, u32, u32) {
        dispatch_size(&self.grid, stage, particle_capacity, spawn_grid)
    }
}

pub(crate) fn dispatch_size(
    grid: &GridSpec,
    stage: Stage,
    particle_capacity: u32,
    spawn_grid: u32,
) -> (u32, u32, u32) {
    let n = grid.n() as u32;
    let tiles = n.div_ceil(TILE_WORKGROUP);
    match stage {
        Stage::Spectrum(_) | Stage::TileBuild(_) | Stage::Foam => (tiles, tiles, 1),
        // One workgroup per (line, block)
        Stage::RowFft(_) | Stage::ColumnFft(_) => (n, 3, 1),
        Stage::Combine => ((grid.packed_width() as u32).div_ceil(TILE_WORKGROUP), tiles, 1),
        Stage::SprayUpdate => (particle_capacity.div_ceil(PARTICLE_WORKGROUP), 1, 1),
        Stage::SpraySpawn => {
            let cells = spawn_grid.div_ceil(TILE_WORKGROUP);
            (cells, cells, 1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Band;

    #[test]
    fn test_dispatch_covers_grid() {
        let grid = GridSpec::new(256).unwrap();
        assert_eq!(dispatch_size(&grid, Stage::Spectrum(Band::Swell), 16384, 128), (32, 32, 1));
        assert_eq!(dispatch_size(&grid, Stage::RowFft(Band::Wind), 16384, 128), (256, 3, 1));
        assert_eq!(dispatch_size(&grid, Stage::Combine, 16384, 128), (96, 32, 1));
        assert_eq!(dispatch_size(&grid, Stage::SprayUpdate, 16384, 128), (256, 1, 1));
        assert_eq!(dispatch_size(&grid, Stage::SpraySpawn, 16384, 128), (16, 16, 1));
    }

    #[test]
    fn test_dispatch_rounds_up_small_sizes() {
        let grid = GridSpec::new(4).unwrap();
        assert_eq!(dispatch_size(&grid, Stage::Foam, 100, 5), (1, 1, 1));
        assert_eq!(dispatch_size(&grid, Stage::SprayUpdate, 100, 5), (2, 1, 1));
        assert_eq!(dispatch_size(&grid, Stage::SpraySpawn, 100, 5), (1, 1, 1));
    }
}
