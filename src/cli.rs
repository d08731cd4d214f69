//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;
use log::{info, warn};

use crate::params::{
    BasicCameraPath, CameraPreset, FixedCamera, HeadlessConfig, OceanConfig, DEFAULT_GRID,
    MAX_PARTICLES,
};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "oceansim")]
#[command(about = "GPU spectral ocean with foam and spray", long_about = None)]
pub struct Args {
    /// FFT grid resolution (power of two, 2..=512)
    #[arg(long, value_name = "N", default_value_t = DEFAULT_GRID)]
    pub grid: usize,

    /// Spray particle pool capacity
    #[arg(long, value_name = "COUNT", default_value_t = MAX_PARTICLES)]
    pub particles: u32,

    /// Run the simulation without a window
    #[arg(long)]
    pub headless: bool,

    /// Frames to simulate in headless mode
    #[arg(long, value_name = "FRAMES", default_value_t = 600)]
    pub frames: u32,

    /// Write height.png and foam.png to this directory after a headless run
    #[arg(long, value_name = "DIR")]
    pub export: Option<PathBuf>,

    /// Compare GPU output against the CPU reference and exit
    #[arg(long)]
    pub verify: bool,

    /// Camera preset: basic (default), fixed
    #[arg(long, value_name = "PRESET", default_value = "basic")]
    pub camera_preset: String,

    /// Camera elevation (meters above mean sea level)
    #[arg(long, value_name = "METERS", default_value_t = 30.0)]
    pub elevation: f32,
}

impl Args {
    /// Parse camera preset from command-line arguments
    pub fn parse_camera_preset(&self) -> CameraPreset {
        match self.camera_preset.to_lowercase().as_str() {
            "basic" => {
                info!("Camera: Basic (straight-line flight, {}m)", self.elevation);
                CameraPreset::Basic(BasicCameraPath {
                    altitude_m: self.elevation,
                    ..Default::default()
                })
            }
            "fixed" => {
                info!("Camera: Fixed (elevation: {}m)", self.elevation);
                let mut fixed = FixedCamera::default();
                fixed.position[1] = self.elevation;
                CameraPreset::Fixed(fixed)
            }
            other => {
                warn!("Unknown camera preset '{}', using basic", other);
                CameraPreset::default()
            }
        }
    }

    /// Ocean configuration with command-line overrides (validated later)
    pub fn ocean_config(&self) -> OceanConfig {
        OceanConfig {
            grid_size: self.grid,
            particle_capacity: self.particles,
            ..Default::default()
        }
    }

    pub fn headless_config(&self) -> HeadlessConfig {
        HeadlessConfig::new(self.frames, self.export.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["oceansim"]);
        assert_eq!(args.grid, 256);
        assert_eq!(args.particles, 16384);
        assert!(!args.headless && !args.verify);
        assert!(matches!(args.parse_camera_preset(), CameraPreset::Basic(_)));
        assert!(args.ocean_config().validate().is_ok());
    }

    #[test]
    fn test_overrides() {
        let args = Args::parse_from([
            "oceansim",
            "--grid",
            "64",
            "--particles",
            "512",
            "--headless",
            "--frames",
            "10",
            "--export",
            "out",
            "--camera-preset",
            "fixed",
            "--elevation",
            "12",
        ]);
        let config = args.ocean_config();
        assert_eq!(config.grid_size, 64);
        assert_eq!(config.particle_capacity, 512);
        assert_eq!(args.headless_config().frames, 10);
        assert_eq!(args.headless_config().export_dir, Some(PathBuf::from("out")));
        match args.parse_camera_preset() {
            CameraPreset::Fixed(fixed) => assert_eq!(fixed.position[1], 12.0),
            other => panic!("expected fixed preset, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_grid_fails_validation() {
        let args = Args::parse_from(["oceansim", "--grid", "300"]);
        assert!(args.ocean_config().validate().is_err());
    }
}
