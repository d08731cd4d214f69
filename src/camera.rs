//! Camera paths and world-origin recentring.
//!
//! The camera moves in local coordinates. Whenever its XZ position leaves
//! the [0, patch) cell the world origin absorbs whole patch multiples, so
//! shader-side coordinates stay small while the periodic ocean looks the
//! same. Visual position is always `local + origin`.

use glam::{Mat4, Vec2, Vec3};

use crate::params::{CameraPreset, RenderConfig};

/// Accumulated world origin, moved in whole-patch steps
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OriginShift {
    patch_size_m: f32,
    world_origin: Vec2,
}

impl OriginShift {
    pub fn new(patch_size_m: f32) -> Self {
        Self {
            patch_size_m,
            world_origin: Vec2::ZERO,
        }
    }

    pub fn world_origin(&self) -> Vec2 {
        self.world_origin
    }

    /// Snap `local` back into the origin cell.
    ///
    /// Returns the shift applied this call (zero when no boundary was
    /// crossed); anything else stored in local coordinates must be moved by
    /// minus this amount.
    pub fn recenter(&mut self, local: &mut Vec3) -> Vec2 {
        let xz = Vec2::new(local.x, local.z);
        let snap = (xz / self.patch_size_m).floor() * self.patch_size_m;
        if snap != Vec2::ZERO {
            local.x -= snap.x;
            local.z -= snap.y;
            self.world_origin += snap;
        }
        snap
    }

    /// World-space position of a local point
    pub fn visual_position(&self, local: Vec3) -> Vec3 {
        local + Vec3::new(self.world_origin.x, 0.0, self.world_origin.y)
    }
}

/// Camera state for one of the presets
pub struct CameraSystem {
    preset: CameraPreset,
    eye: Vec3,
    look_offset: Vec3,
    velocity: Vec3,
    origin: OriginShift,
}

impl CameraSystem {
    /// Create new camera system with specified preset
    pub fn new(preset: CameraPreset, patch_size_m: f32) -> Self {
        let (eye, look_offset, velocity) = match &preset {
            CameraPreset::Basic(p) => {
                let heading = p.heading_deg.to_radians();
                let forward = Vec3::new(heading.cos(), 0.0, heading.sin());
                let eye = Vec3::new(0.0, p.altitude_m, 0.0);
                // Ahead and below eye level
                let target = Vec3::new(0.0, p.altitude_m * p.look_down_fraction, 0.0)
                    + forward * p.look_ahead_m;
                (eye, target - eye, forward * p.forward_speed_m_per_s)
            }
            CameraPreset::Fixed(p) => {
                let eye = Vec3::from_array(p.position);
                (eye, Vec3::from_array(p.target) - eye, Vec3::ZERO)
            }
        };

        let mut camera = Self {
            preset,
            eye,
            look_offset,
            velocity,
            origin: OriginShift::new(patch_size_m),
        };
        camera.origin.recenter(&mut camera.eye);
        camera
    }

    pub fn preset(&self) -> &CameraPreset {
        &self.preset
    }

    /// Advance along the path and recentre. Returns the origin shift.
    pub fn advance(&mut self, dt_s: f32) -> Vec2 {
        self.eye += self.velocity * dt_s;
        self.origin.recenter(&mut self.eye)
    }

    /// Eye in local coordinates
    pub fn local_eye(&self) -> Vec3 {
        self.eye
    }

    pub fn local_xz(&self) -> Vec2 {
        Vec2::new(self.eye.x, self.eye.z)
    }

    pub fn origin(&self) -> &OriginShift {
        &self.origin
    }

    pub fn visual_position(&self) -> Vec3 {
        self.origin.visual_position(self.eye)
    }

    /// Unit (right, up) vectors of the view, for camera-facing billboards
    pub fn basis(&self) -> (Vec3, Vec3) {
        let forward = self.look_offset.normalize_or(Vec3::Z);
        let right = forward.cross(Vec3::Y).normalize_or(Vec3::X);
        (right, right.cross(forward))
    }

    /// View-projection matrix in local coordinates
    pub fn view_proj(&self, render_config: &RenderConfig) -> Mat4 {
        let view = Mat4::look_at_rh(self.eye, self.eye + self.look_offset, Vec3::Y);
        let proj = Mat4::perspective_rh(
            render_config.fov_degrees.to_radians(),
            render_config.aspect_ratio(),
            render_config.near_plane_m,
            render_config.far_plane_m,
        );
        proj * view
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{BasicCameraPath, FixedCamera};

    #[test]
    fn test_no_shift_inside_origin_cell() {
        let mut origin = OriginShift::new(512.0);
        let mut local = Vec3::new(10.0, 5.0, 511.0);
        assert_eq!(origin.recenter(&mut local), Vec2::ZERO);
        assert_eq!(local, Vec3::new(10.0, 5.0, 511.0));
        assert_eq!(origin.world_origin(), Vec2::ZERO);
    }

    #[test]
    fn test_shift_preserves_visual_position() {
        let mut origin = OriginShift::new(512.0);
        let mut local = Vec3::new(1030.0, 7.0, -20.0);
        let before = origin.visual_position(local);

        let shift = origin.recenter(&mut local);
        assert_eq!(shift, Vec2::new(1024.0, -512.0));
        assert_eq!(local, Vec3::new(6.0, 7.0, 492.0));
        assert_eq!(origin.visual_position(local), before);
    }

    #[test]
    fn test_basic_camera_crosses_patches() {
        let path = BasicCameraPath {
            heading_deg: 0.0,
            forward_speed_m_per_s: 100.0,
            ..Default::default()
        };
        let mut camera = CameraSystem::new(CameraPreset::Basic(path.clone()), 512.0);

        let mut total_shift = Vec2::ZERO;
        for _ in 0..60 {
            total_shift += camera.advance(0.1);
            let local = camera.local_xz();
            assert!((0.0..512.0).contains(&local.x));
            assert!((0.0..512.0).contains(&local.y));
        }
        assert_eq!(total_shift, Vec2::new(512.0, 0.0));
        assert!((camera.visual_position().x - 600.0).abs() < 1e-3);
        assert_eq!(camera.local_eye().y, path.altitude_m);
    }

    #[test]
    fn test_fixed_camera_stays_put() {
        let mut camera = CameraSystem::new(CameraPreset::Fixed(FixedCamera::default()), 512.0);
        let start = camera.visual_position();
        for _ in 0..10 {
            assert_eq!(camera.advance(0.05), Vec2::ZERO);
        }
        assert_eq!(camera.visual_position(), start);
    }

    #[test]
    fn test_basis_is_orthonormal() {
        let camera = CameraSystem::new(CameraPreset::default(), 512.0);
        let (right, up) = camera.basis();
        assert!((right.length() - 1.0).abs() < 1e-5);
        assert!((up.length() - 1.0).abs() < 1e-5);
        assert!(right.dot(up).abs() < 1e-5);
        assert!(up.y > 0.0);
        assert_eq!(right.y, 0.0);
    }

    #[test]
    fn test_view_proj_matrix_generation() {
        let camera = CameraSystem::new(CameraPreset::default(), 512.0);
        let view_proj = camera.view_proj(&RenderConfig::default());
        assert_ne!(view_proj, Mat4::IDENTITY);
        assert!(view_proj.is_finite());
    }
}
