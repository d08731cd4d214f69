//! Camera path configuration and presets.

/// Basic camera path parameters (straight-line flight over the water)
#[derive(Debug, Clone)]
pub struct BasicCameraPath {
    /// Constant altitude (meters)
    pub altitude_m: f32,

    /// Forward movement speed (meters per second)
    pub forward_speed_m_per_s: f32,

    /// Heading on the XZ plane (degrees, 0 = +X, 90 = +Z)
    pub heading_deg: f32,

    /// Look-ahead distance (meters)
    pub look_ahead_m: f32,

    /// Target height as a fraction of altitude (below 1 looks down)
    pub look_down_fraction: f32,
}

impl Default for BasicCameraPath {
    fn default() -> Self {
        Self {
            altitude_m: 30.0,
            forward_speed_m_per_s: 25.0,
            heading_deg: 73.0,
            look_ahead_m: 150.0,
            look_down_fraction: 0.6,
        }
    }
}

/// Fixed camera position (for debugging)
#[derive(Debug, Clone)]
pub struct FixedCamera {
    /// Camera position (meters)
    pub position: [f32; 3],

    /// Look-at target (meters)
    pub target: [f32; 3],
}

impl Default for FixedCamera {
    fn default() -> Self {
        Self {
            position: [0.0, 30.0, 0.0],
            target: [60.0, 0.0, 200.0],
        }
    }
}

/// Camera preset selection
#[derive(Debug, Clone)]
pub enum CameraPreset {
    /// Straight-line flight at constant altitude; crosses patch boundaries
    Basic(BasicCameraPath),

    /// Stationary camera
    Fixed(FixedCamera),
}

impl Default for CameraPreset {
    fn default() -> Self {
        Self::Basic(BasicCameraPath::default())
    }
}
