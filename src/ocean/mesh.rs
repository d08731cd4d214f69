//! Flat patch mesh displaced on the GPU by the water vertex shader.

use bytemuck::{Pod, Zeroable};

/// Vertex data for the water mesh (position + UV coordinates)
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

/// One patch-sized grid spanning [0, patch] on X and Z.
///
/// UVs run 0..1 across the patch so the vertex shader can map them straight
/// onto displacement-field texels; neighbouring tiles reuse the same mesh
/// with a per-instance offset.
pub struct PatchMesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    resolution: usize,
}

impl PatchMesh {
    /// Build a `resolution`×`resolution` quad grid over `patch_size_m`
    pub fn new(resolution: usize, patch_size_m: f32) -> Self {
        let resolution = resolution.max(1);
        let spacing = patch_size_m / resolution as f32;

        let mut vertices = Vec::with_capacity((resolution + 1) * (resolution + 1));
        let mut indices = Vec::with_capacity(resolution * resolution * 6);

        for z in 0..=resolution {
            for x in 0..=resolution {
                vertices.push(Vertex {
                    position: [x as f32 * spacing, 0.0, z as f32 * spacing],
                    uv: [x as f32 / resolution as f32, z as f32 / resolution as f32],
                });
            }
        }

        // Counter-clockwise winding seen from above
        for z in 0..resolution {
            for x in 0..resolution {
                let top_left = (z * (resolution + 1) + x) as u32;
                let top_right = top_left + 1;
                let bottom_left = ((z + 1) * (resolution + 1) + x) as u32;
                let bottom_right = bottom_left + 1;

                indices.extend_from_slice(&[
                    top_left,
                    bottom_left,
                    top_right,
                    top_right,
                    bottom_left,
                    bottom_right,
                ]);
            }
        }

        Self {
            vertices,
            indices,
            resolution,
        }
    }

    pub fn resolution(&self) -> usize {
        self.resolution
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mesh_counts() {
        let mesh = PatchMesh::new(4, 512.0);
        assert_eq!(mesh.vertices.len(), 25);
        assert_eq!(mesh.index_count(), 4 * 4 * 6);
        assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.vertices.len()));
    }

    #[test]
    fn test_mesh_spans_one_patch() {
        let mesh = PatchMesh::new(8, 512.0);
        let last = mesh.vertices.last().unwrap();
        assert_eq!(last.position, [512.0, 0.0, 512.0]);
        assert_eq!(last.uv, [1.0, 1.0]);
        assert_eq!(mesh.vertices[0].position, [0.0, 0.0, 0.0]);
    }
}
