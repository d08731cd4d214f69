//! Parameter definitions with physical units and documented semantics.
//!
//! All magic numbers are extracted here with:
//! - Physical units (meters, seconds, etc.)
//! - Documented ranges and meanings
//! - Startup validation where a bad value is a precondition violation

mod camera;
mod ocean;
mod render;

// Re-export all types
pub use camera::{BasicCameraPath, CameraPreset, FixedCamera};
pub use ocean::{
    clamp_dt, BandParams, FoamParams, OceanConfig, SimulationParams, SprayParams, Tunable,
    CHOP_UNIT, DEFAULT_GRID, GRAVITY_M_PER_S2, HEIGHT_UNIT, MAX_DT_S, MAX_GRID, MAX_PARTICLES,
    MIN_GRID, PATCH_SIZE_M,
};
pub use render::{HeadlessConfig, RenderConfig};
