//! oceansim library - GPU spectral ocean simulation with a CPU reference

pub mod analysis;
pub mod camera;
pub mod cli;
pub mod error;
pub mod gpu;
pub mod graph;
pub mod ocean;
pub mod params;
pub mod rendering;
