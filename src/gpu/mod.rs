//! wgpu backend: device bootstrap, shader assembly, buffers, compute
//! pipelines and the per-frame simulation encoder.

mod buffers;
mod pipelines;
mod simulation;
mod uniforms;

pub use buffers::{read_buffer, OceanBuffers};
pub use pipelines::ComputeKernels;
pub use simulation::GpuOcean;
pub use uniforms::{
    CombineUniforms, FftUniforms, FoamUniforms, SkyUniforms, SpawnUniforms, SpectrumUniforms,
    SprayUniforms, UpdateUniforms, WaterUniforms,
};

use std::f32::consts::TAU;

use log::info;

use crate::error::GpuError;
use crate::ocean::GridSpec;
use crate::params::{CHOP_UNIT, GRAVITY_M_PER_S2, HEIGHT_UNIT, MAX_DT_S};

/// Adapter, device and queue shared by simulation and rendering
pub struct GpuContext {
    pub adapter: wgpu::Adapter,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
}

impl GpuContext {
    /// Device without a surface (headless export and verify)
    pub async fn headless() -> Result<Self, GpuError> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;

        Self::from_adapter(adapter).await
    }

    /// Request the device on an already selected adapter
    pub async fn from_adapter(adapter: wgpu::Adapter) -> Result<Self, GpuError> {
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Ocean Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        let adapter_info = adapter.get_info();
        info!("GPU: {} ({:?})", adapter_info.name, adapter_info.backend);

        Ok(Self {
            adapter,
            device,
            queue,
        })
    }
}

/// Every WGSL program the crate builds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderKind {
    Spectrum,
    TileBuild,
    Fft,
    Combine,
    Foam,
    SprayUpdate,
    SpraySpawn,
    Water,
    Sky,
    SprayRender,
}

impl ShaderKind {
    pub const ALL: [ShaderKind; 10] = [
        ShaderKind::Spectrum,
        ShaderKind::TileBuild,
        ShaderKind::Fft,
        ShaderKind::Combine,
        ShaderKind::Foam,
        ShaderKind::SprayUpdate,
        ShaderKind::SpraySpawn,
        ShaderKind::Water,
        ShaderKind::Sky,
        ShaderKind::SprayRender,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ShaderKind::Spectrum => "Spectrum Shader",
            ShaderKind::TileBuild => "Tile Build Shader",
            ShaderKind::Fft => "IFFT Shader",
            ShaderKind::Combine => "Combine Shader",
            ShaderKind::Foam => "Foam Shader",
            ShaderKind::SprayUpdate => "Spray Update Shader",
            ShaderKind::SpraySpawn => "Spray Spawn Shader",
            ShaderKind::Water => "Water Shader",
            ShaderKind::Sky => "Sky Shader",
            ShaderKind::SprayRender => "Spray Render Shader",
        }
    }

    fn body(self) -> &'static str {
        match self {
            ShaderKind::Spectrum => include_str!("../shaders/spectrum.wgsl"),
            ShaderKind::TileBuild => include_str!("../shaders/tile_build.wgsl"),
            ShaderKind::Fft => include_str!("../shaders/ifft.wgsl"),
            ShaderKind::Combine => include_str!("../shaders/combine.wgsl"),
            ShaderKind::Foam => include_str!("../shaders/foam.wgsl"),
            ShaderKind::SprayUpdate => include_str!("../shaders/spray_update.wgsl"),
            ShaderKind::SpraySpawn => include_str!("../shaders/spray_spawn.wgsl"),
            ShaderKind::Water => include_str!("../shaders/water.wgsl"),
            ShaderKind::Sky => include_str!("../shaders/sky.wgsl"),
            ShaderKind::SprayRender => include_str!("../shaders/spray_render.wgsl"),
        }
    }

    /// Shaders that read the displacement field through `surface_at`
    fn samples_surface(self) -> bool {
        matches!(
            self,
            ShaderKind::Foam | ShaderKind::SpraySpawn | ShaderKind::Water
        )
    }
}

/// Full WGSL source: grid constants, shared helpers, then the program body.
///
/// Grid size is baked in as constants so workgroup sizes and workgroup
/// arrays can depend on it.
pub fn shader_source(kind: ShaderKind, grid: &GridSpec) -> String {
    let n = grid.n() as u32;
    let mut source = format!(
        "const N: u32 = {n}u;\n\
         const HALF_N: u32 = {half}u;\n\
         const LOG2_N: u32 = {log2}u;\n\
         const PACKED_WIDTH: u32 = {width}u;\n\
         const TAU: f32 = {tau:?};\n\
         const GRAVITY: f32 = {gravity:?};\n\
         const MIN_WAVENUMBER: f32 = {min_k:?};\n\
         const MAX_DT: f32 = {max_dt:?};\n\
         const HEIGHT_UNIT: f32 = {height_unit:?};\n\
         const CHOP_UNIT: f32 = {chop_unit:?};\n\
         const STREAK_TEXELS_PER_S: f32 = {streak:?};\n\n",
        half = (n / 2).max(1),
        log2 = grid.log2_n(),
        width = grid.packed_width(),
        tau = TAU,
        gravity = GRAVITY_M_PER_S2,
        min_k = crate::ocean::MIN_WAVENUMBER,
        max_dt = MAX_DT_S,
        height_unit = HEIGHT_UNIT,
        chop_unit = CHOP_UNIT,
        streak = crate::ocean::STREAK_TEXELS_PER_S,
    );
    source.push_str(include_str!("../shaders/common.wgsl"));
    source.push('\n');
    if kind.samples_surface() {
        source.push_str(include_str!("../shaders/surface.wgsl"));
        source.push('\n');
    }
    source.push_str(kind.body());
    source
}

/// Compile one program for the device
pub fn create_shader(device: &wgpu::Device, kind: ShaderKind, grid: &GridSpec) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(kind.label()),
        source: wgpu::ShaderSource::Wgsl(shader_source(kind, grid).into()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validate(kind: ShaderKind, n: usize) {
        let grid = GridSpec::new(n).unwrap();
        let source = shader_source(kind, &grid);
        let module = naga::front::wgsl::parse_str(&source)
            .unwrap_or_else(|e| panic!("{:?} failed to parse:\n{}", kind, e.emit_to_string(&source)));
        naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::empty(),
        )
        .validate(&module)
        .unwrap_or_else(|e| panic!("{:?} failed validation: {:?}", kind, e));
    }

    #[test]
    fn test_all_shaders_validate() {
        for kind in ShaderKind::ALL {
            validate(kind, 256);
        }
    }

    #[test]
    fn test_shaders_validate_at_grid_extremes() {
        for kind in [ShaderKind::Fft, ShaderKind::Foam, ShaderKind::SpraySpawn] {
            validate(kind, 2);
            validate(kind, 512);
        }
    }

    #[test]
    fn test_constants_are_prepended() {
        let grid = GridSpec::new(64).unwrap();
        let source = shader_source(ShaderKind::Fft, &grid);
        assert!(source.starts_with("const N: u32 = 64u;"));
        assert!(source.contains("const LOG2_N: u32 = 6u;"));
        assert!(source.contains("const PACKED_WIDTH: u32 = 192u;"));
        assert!(!source.contains("fn surface_at"));
        assert!(shader_source(ShaderKind::Foam, &grid).contains("fn surface_at"));
    }
}
