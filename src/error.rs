//! Error types for setup-time failures.
//!
//! The per-frame simulation has no error paths: dt spikes are clamped and
//! buffers are rebuilt every frame. Everything here is fatal at startup.

use thiserror::Error;

/// Invalid simulation configuration (precondition violations)
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("grid resolution must be a power of two, got {0}")]
    GridNotPowerOfTwo(usize),

    #[error("grid resolution {0} is outside the supported range {min}..={max}", min = crate::params::MIN_GRID, max = crate::params::MAX_GRID)]
    GridOutOfRange(usize),

    #[error("particle pool capacity must be > 0")]
    EmptyParticlePool,

    #[error("patch size must be positive and finite, got {0}")]
    InvalidPatchSize(f32),
}

/// GPU bootstrap and readback failures
#[derive(Debug, Error)]
pub enum GpuError {
    #[error("failed to find a suitable GPU adapter")]
    NoAdapter,

    #[error("failed to request device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("failed to map buffer for readback: {0}")]
    Map(#[from] wgpu::BufferAsyncError),

    #[error("readback channel closed before the buffer was mapped")]
    MapChannelClosed,

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Malformed frame graph
#[derive(Debug, Error, PartialEq)]
pub enum GraphError {
    #[error("{node} reads {resource} before any pass writes it")]
    UnproducedRead { node: String, resource: String },
}
