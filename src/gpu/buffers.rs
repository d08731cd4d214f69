//! Storage buffers for one simulation instance, plus blocking readback.

use std::mem::size_of;
use std::sync::mpsc;

use bytemuck::Pod;
use rustfft::num_complex::Complex32;

use crate::error::GpuError;
use crate::graph::Band;
use crate::ocean::{GridSpec, Particle, Slot};

/// Bytes of one complex texel (`vec2<f32>`)
const COMPLEX_BYTES: u64 = size_of::<Complex32>() as u64;

/// Per-band spectrum and packed FFT buffers
pub struct BandGpuBuffers {
    pub spectrum: wgpu::Buffer,
    /// Tile build output and column pass output
    pub packed_a: wgpu::Buffer,
    /// Row pass output
    pub packed_b: wgpu::Buffer,
}

/// Every storage buffer the frame graph touches
pub struct OceanBuffers {
    pub bands: [BandGpuBuffers; 2],
    pub displacement: wgpu::Buffer,
    /// Ping-ponged foam, indexed by `Slot::index`
    pub foam: [wgpu::Buffer; 2],
    pub particles: wgpu::Buffer,
    pub counter: wgpu::Buffer,
    packed_bytes: u64,
    foam_bytes: u64,
    particle_bytes: u64,
}

fn storage(device: &wgpu::Device, label: &str, size: u64, extra: wgpu::BufferUsages) -> wgpu::Buffer {
    // wgpu zero-fills new buffers, which is the required initial state for
    // foam, particles and the counter
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size,
        usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC | extra,
        mapped_at_creation: false,
    })
}

impl OceanBuffers {
    pub fn new(device: &wgpu::Device, grid: &GridSpec, particle_capacity: u32) -> Self {
        let spectrum_bytes = grid.texels() as u64 * COMPLEX_BYTES;
        let packed_bytes = grid.packed_texels() as u64 * COMPLEX_BYTES;
        let foam_bytes = grid.texels() as u64 * size_of::<f32>() as u64;
        let particle_bytes = particle_capacity as u64 * size_of::<Particle>() as u64;
        let none = wgpu::BufferUsages::empty();

        let band = |band: Band| BandGpuBuffers {
            spectrum: storage(device, &format!("spectrum_{}", band.name()), spectrum_bytes, none),
            packed_a: storage(device, &format!("packed_a_{}", band.name()), packed_bytes, none),
            packed_b: storage(device, &format!("packed_b_{}", band.name()), packed_bytes, none),
        };

        Self {
            bands: [band(Band::Swell), band(Band::Wind)],
            displacement: storage(device, "displacement", packed_bytes, none),
            foam: [
                storage(device, "foam_a", foam_bytes, none),
                storage(device, "foam_b", foam_bytes, none),
            ],
            particles: storage(device, "particles", particle_bytes, wgpu::BufferUsages::VERTEX),
            counter: storage(device, "spray_counter", size_of::<u32>() as u64, none),
            packed_bytes,
            foam_bytes,
            particle_bytes,
        }
    }

    pub fn band(&self, band: Band) -> &BandGpuBuffers {
        &self.bands[band.index()]
    }

    pub fn foam(&self, slot: Slot) -> &wgpu::Buffer {
        &self.foam[slot.index()]
    }

    pub fn packed_bytes(&self) -> u64 {
        self.packed_bytes
    }

    pub fn foam_bytes(&self) -> u64 {
        self.foam_bytes
    }

    pub fn particle_bytes(&self) -> u64 {
        self.particle_bytes
    }
}

/// Copy `size` bytes of `buffer` into a staging buffer and block until mapped
pub fn read_buffer<T: Pod>(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    buffer: &wgpu::Buffer,
    size: u64,
) -> Result<Vec<T>, GpuError> {
    let staging = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Readback Buffer"),
        size,
        usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("Readback Encoder"),
    });
    encoder.copy_buffer_to_buffer(buffer, 0, &staging, 0, size);
    queue.submit(std::iter::once(encoder.finish()));

    let slice = staging.slice(..);
    let (tx, rx) = mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        // Receiver is alive until after poll returns
        let _ = tx.send(result);
    });
    device.poll(wgpu::Maintain::Wait);
    rx.recv().map_err(|_| GpuError::MapChannelClosed)??;

    let data = slice.get_mapped_range();
    let values = bytemuck::cast_slice(&data).to_vec();
    drop(data);
    staging.unmap();
    Ok(values)
}
