use std::ops::Range;

use cgmath::{InnerSpace, Vector3, Zero};
use wgpu::util::DeviceExt;

use super::vertex::VertexPosNormTexCol;

/// Growable vertex and index lists for procedural or loaded geometry
#[derive(Debug, Clone, Default)]
pub struct MeshBuilder {
    vertices: Vec<VertexPosNormTexCol>,
    indices: Vec<u32>,
}

impl MeshBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a vertex and returns its index
    pub fn add_vertex(&mut self, vertex: VertexPosNormTexCol) -> u32 {
        self.vertices.push(vertex);
        (self.vertices.len() - 1) as u32
    }

    pub fn add_index_tri(&mut self, a: u32, b: u32, c: u32) {
        self.indices.extend_from_slice(&[a, b, c]);
    }

    pub fn vertices(&self) -> &[VertexPosNormTexCol] {
        &self.vertices
    }

    pub fn vertices_mut(&mut self) -> &mut [VertexPosNormTexCol] {
        &mut self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn indices_mut(&mut self) -> &mut [u32] {
        &mut self.indices
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Freezes the geometry into a mesh; GPU buffers are created on first draw
    pub fn bake(self) -> Mesh {
        Mesh {
            vertices: self.vertices,
            indices: self.indices,
            gpu: None,
        }
    }
}

#[derive(Debug)]
struct MeshBuffers {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
}

/// Baked geometry with lazily created GPU buffers
#[derive(Debug)]
pub struct Mesh {
    vertices: Vec<VertexPosNormTexCol>,
    indices: Vec<u32>,
    gpu: Option<MeshBuffers>,
}

impl Mesh {
    pub fn vertices(&self) -> &[VertexPosNormTexCol] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    pub fn is_uploaded(&self) -> bool {
        self.gpu.is_some()
    }

    /// Creates the vertex and index buffers if they do not exist yet
    pub fn upload(&mut self, device: &wgpu::Device) {
        if self.gpu.is_some() {
            return;
        }
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Vertex Buffer"),
            contents: bytemuck::cast_slice(&self.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Index Buffer"),
            contents: bytemuck::cast_slice(&self.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        log::trace!(
            "Uploaded mesh: {} vertices, {} triangles",
            self.vertices.len(),
            self.indices.len() / 3
        );
        self.gpu = Some(MeshBuffers {
            vertex_buffer,
            index_buffer,
        });
    }
}

/// Averages adjacent face normals into per-vertex normals
///
/// Used for OBJ files exported without normals. Vertices touched by no
/// triangle keep a zero normal.
pub fn calculate_smooth_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    let mut sums = vec![Vector3::<f32>::zero(); positions.len()];
    for triangle in indices.chunks_exact(3) {
        let [i0, i1, i2] = [
            triangle[0] as usize,
            triangle[1] as usize,
            triangle[2] as usize,
        ];
        if i0 >= positions.len() || i1 >= positions.len() || i2 >= positions.len() {
            continue;
        }
        let v0 = Vector3::from(positions[i0]);
        let face_normal = (Vector3::from(positions[i1]) - v0).cross(Vector3::from(positions[i2]) - v0);
        for index in [i0, i1, i2] {
            sums[index] += face_normal;
        }
    }
    sums.into_iter()
        .map(|sum| {
            if sum.magnitude2() > 0.0 {
                sum.normalize().into()
            } else {
                [0.0; 3]
            }
        })
        .collect()
}

pub trait DrawMesh<'a> {
    fn draw_mesh(&mut self, mesh: &'a Mesh);
    fn draw_mesh_instanced(&mut self, mesh: &'a Mesh, instances: Range<u32>);
}

impl<'a, 'b> DrawMesh<'b> for wgpu::RenderPass<'a>
where
    'b: 'a,
{
    fn draw_mesh(&mut self, mesh: &'b Mesh) {
        self.draw_mesh_instanced(mesh, 0..1);
    }

    fn draw_mesh_instanced(&mut self, mesh: &'b Mesh, instances: Range<u32>) {
        // Skip drawing if not uploaded
        let Some(buffers) = &mesh.gpu else {
            return;
        };
        self.set_vertex_buffer(0, buffers.vertex_buffer.slice(..));
        self.set_index_buffer(buffers.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.draw_indexed(0..mesh.index_count(), 0, instances);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_add_vertex_returns_sequential_indices() {
        let mut builder = MeshBuilder::new();
        let v = VertexPosNormTexCol::new([0.0; 3], [0.0, 0.0, 1.0], [0.0; 2], [1.0; 4]);
        assert_eq!(builder.add_vertex(v), 0);
        assert_eq!(builder.add_vertex(v), 1);
        assert_eq!(builder.add_vertex(v), 2);
        builder.add_index_tri(0, 1, 2);
        assert_eq!(builder.triangle_count(), 1);

        let mesh = builder.bake();
        assert_eq!(mesh.index_count(), 3);
        assert!(!mesh.is_uploaded());
    }

    #[test]
    fn test_smooth_normals_follow_winding() {
        let positions = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [5.0, 5.0, 5.0]];
        let normals = calculate_smooth_normals(&positions, &[0, 1, 2]);
        assert_relative_eq!(Vector3::from(normals[0]), Vector3::new(0.0, 0.0, 1.0));
        assert_eq!(normals[3], [0.0; 3]);
    }
}
