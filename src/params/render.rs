//! Rendering and headless-run configuration.

use std::path::PathBuf;

/// Rendering configuration
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Window width (pixels)
    pub window_width: u32,

    /// Window height (pixels)
    pub window_height: u32,

    /// Vertical field of view (degrees)
    pub fov_degrees: f32,

    /// Near clipping plane (meters)
    pub near_plane_m: f32,

    /// Far clipping plane (meters)
    pub far_plane_m: f32,

    /// Water tile mesh resolution (quads per side of one patch)
    pub mesh_resolution: usize,

    /// Tiles drawn on each side of the camera's tile (radius 2 = 5x5 tiles)
    pub tile_radius: i32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            window_width: 1280,
            window_height: 720,
            fov_degrees: 45.0,
            near_plane_m: 0.1,
            far_plane_m: 8000.0,
            mesh_resolution: 256,
            tile_radius: 2,
        }
    }
}

impl RenderConfig {
    pub fn aspect_ratio(&self) -> f32 {
        self.window_width as f32 / self.window_height.max(1) as f32
    }

    /// Number of water tile instances drawn per frame
    pub fn tile_count(&self) -> u32 {
        let side = (2 * self.tile_radius + 1).max(1) as u32;
        side * side
    }
}

/// Headless run configuration (no window, fixed timestep)
#[derive(Debug, Clone)]
pub struct HeadlessConfig {
    /// Frames to simulate
    pub frames: u32,

    /// Fixed timestep per frame (seconds)
    pub dt_s: f32,

    /// Directory for exported PNGs, if any
    pub export_dir: Option<PathBuf>,
}

impl HeadlessConfig {
    pub fn new(frames: u32, export_dir: Option<PathBuf>) -> Self {
        Self {
            frames,
            dt_s: 1.0 / 60.0,
            export_dir,
        }
    }

    /// Height map output path
    pub fn height_path(&self) -> Option<PathBuf> {
        self.export_dir.as_ref().map(|dir| dir.join("height.png"))
    }

    /// Foam map output path
    pub fn foam_path(&self) -> Option<PathBuf> {
        self.export_dir.as_ref().map(|dir| dir.join("foam.png"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_count() {
        let config = RenderConfig::default();
        assert_eq!(config.tile_count(), 25);
    }

    #[test]
    fn test_export_paths() {
        let headless = HeadlessConfig::new(10, Some(PathBuf::from("out")));
        assert_eq!(headless.height_path(), Some(PathBuf::from("out/height.png")));
        assert_eq!(HeadlessConfig::new(10, None).foam_path(), None);
    }
}
