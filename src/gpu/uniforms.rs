//! Uniform blocks, laid out to match the WGSL structs field for field.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use crate::ocean::{FoamStep, SpawnStep, UpdateStep};
use crate::params::{BandParams, SimulationParams};

/// `SpectrumParams` in spectrum.wgsl
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct SpectrumUniforms {
    pub wind_dir: [f32; 2],
    pub amplitude: f32,
    pub wind_speed: f32,
    pub patch_size: f32,
    pub time: f32,
    pub seed: u32,
    pub _padding: u32,
}

impl SpectrumUniforms {
    pub fn new(band: &BandParams, time_s: f32) -> Self {
        Self {
            wind_dir: band.wind_dir,
            amplitude: band.amplitude,
            wind_speed: band.wind_speed_m_per_s,
            patch_size: band.patch_size_m,
            time: time_s,
            seed: band.seed,
            _padding: 0,
        }
    }
}

/// `FftParams` in ifft.wgsl; shared by the row and column passes
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct FftUniforms {
    pub inv_n: f32,
    pub final_scale: f32,
    pub _padding: [f32; 2],
}

/// `CombineParams` in combine.wgsl
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct CombineUniforms {
    pub wind_displacement: f32,
    pub _padding: [f32; 3],
}

/// `FoamParams` in foam.wgsl
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct FoamUniforms {
    pub dt: f32,
    pub patch_size: f32,
    pub choppiness: f32,
    pub flow_scale: f32,
    pub decay: f32,
    pub inject: f32,
    pub slope0: f32,
    pub slope1: f32,
    pub fold0: f32,
    pub fold1: f32,
    pub streak: f32,
    pub _padding: f32,
}

impl From<&FoamStep> for FoamUniforms {
    fn from(step: &FoamStep) -> Self {
        let p = &step.params;
        Self {
            // Clamped in the shader
            dt: step.dt_s,
            patch_size: step.patch_size_m,
            choppiness: step.choppiness,
            flow_scale: p.flow_scale,
            decay: p.decay_per_s,
            inject: p.inject_per_s,
            slope0: p.slope0,
            slope1: p.slope1,
            fold0: p.fold0,
            fold1: p.fold1,
            streak: p.streak,
            _padding: 0.0,
        }
    }
}

/// `UpdateParams` in spray_update.wgsl
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct UpdateUniforms {
    pub origin_shift: [f32; 2],
    pub dt: f32,
    pub drag: f32,
    pub gravity: f32,
    pub _padding: [f32; 3],
}

impl From<&UpdateStep> for UpdateUniforms {
    fn from(step: &UpdateStep) -> Self {
        Self {
            origin_shift: step.origin_shift.to_array(),
            dt: step.dt_s,
            drag: step.drag_per_s,
            gravity: step.gravity_m_per_s2,
            _padding: [0.0; 3],
        }
    }
}

/// `SpawnParams` in spray_spawn.wgsl
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct SpawnUniforms {
    pub camera_xz: [f32; 2],
    pub wind_dir: [f32; 2],
    pub dt: f32,
    pub frame: u32,
    pub patch_size: f32,
    pub height_scale: f32,
    pub choppiness: f32,
    pub spawn_rate: f32,
    /// Side of the spawn square (meters)
    pub spawn_area: f32,
    pub spawn_grid: u32,
    pub slope0: f32,
    pub slope1: f32,
    pub fold0: f32,
    pub fold1: f32,
    pub base_life: f32,
    pub v_up: f32,
    pub v_side: f32,
    pub capacity: u32,
}

impl SpawnUniforms {
    pub fn new(step: &SpawnStep, capacity: u32) -> Self {
        let p = &step.params;
        Self {
            camera_xz: step.camera_xz.to_array(),
            wind_dir: p.wind_dir,
            dt: step.dt_s,
            frame: step.frame,
            patch_size: step.patch_size_m,
            height_scale: step.height_scale,
            choppiness: step.choppiness,
            spawn_rate: p.spawn_rate,
            spawn_area: p.spawn_area_patches * step.patch_size_m,
            spawn_grid: p.spawn_grid,
            slope0: p.slope0,
            slope1: p.slope1,
            fold0: p.fold0,
            fold1: p.fold1,
            base_life: p.base_life_s,
            v_up: p.v_up_m_per_s,
            v_side: p.v_side_m_per_s,
            capacity,
        }
    }
}

/// `WaterUniforms` in water.wgsl
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct WaterUniforms {
    pub view_proj: [[f32; 4]; 4],
    /// xyz = camera (local), w = simulation time
    pub camera_pos: [f32; 4],
    /// x = patch size, y = tile radius
    pub tiling: [f32; 4],
    /// height scale, choppiness, swell amplitude, swell speed
    pub surface: [f32; 4],
    /// x = exposure
    pub shading: [f32; 4],
}

impl WaterUniforms {
    pub fn new(
        view_proj: Mat4,
        camera: Vec3,
        time_s: f32,
        patch_size_m: f32,
        tile_radius: i32,
        params: &SimulationParams,
    ) -> Self {
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            camera_pos: [camera.x, camera.y, camera.z, time_s],
            tiling: [patch_size_m, tile_radius as f32, 0.0, 0.0],
            surface: [
                params.height_scale,
                params.choppiness,
                params.swell_amplitude,
                params.swell_speed,
            ],
            shading: [params.exposure, 0.0, 0.0, 0.0],
        }
    }
}

/// `SkyUniforms` in sky.wgsl
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct SkyUniforms {
    pub inv_view_proj: [[f32; 4]; 4],
    /// x = exposure, y = simulation time
    pub params: [f32; 4],
}

/// `SprayUniforms` in spray_render.wgsl
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct SprayUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub camera_right: [f32; 4],
    pub camera_up: [f32; 4],
    /// x = billboard size (m), y = exposure
    pub params: [f32; 4],
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::size_of;

    #[test]
    fn test_uniform_sizes_match_wgsl() {
        assert_eq!(size_of::<SpectrumUniforms>(), 32);
        assert_eq!(size_of::<FftUniforms>(), 16);
        assert_eq!(size_of::<CombineUniforms>(), 16);
        assert_eq!(size_of::<FoamUniforms>(), 48);
        assert_eq!(size_of::<UpdateUniforms>(), 32);
        assert_eq!(size_of::<SpawnUniforms>(), 80);
        assert_eq!(size_of::<WaterUniforms>(), 128);
        assert_eq!(size_of::<SkyUniforms>(), 80);
        assert_eq!(size_of::<SprayUniforms>(), 112);
    }

    #[test]
    fn test_spawn_area_is_in_meters() {
        let step = SpawnStep {
            dt_s: 0.016,
            frame: 3,
            camera_xz: glam::Vec2::new(10.0, 20.0),
            patch_size_m: 512.0,
            height_scale: 100.0,
            choppiness: 6.0,
            params: Default::default(),
        };
        let uniforms = SpawnUniforms::new(&step, 1024);
        assert_eq!(uniforms.spawn_area, 2.25 * 512.0);
        assert_eq!(uniforms.spawn_grid, 128);
        assert_eq!(uniforms.capacity, 1024);
        assert_eq!(uniforms.camera_xz, [10.0, 20.0]);
    }
}
