//! GPU mesh built from [`MeshGeometry`](super::geometry::MeshGeometry).

use cgmath::{InnerSpace, Vector3, Zero};
use wgpu::util::DeviceExt;

use crate::data_structures::geometry::MeshGeometry;

pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl Vertex for ModelVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<ModelVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/// Vertices with smooth normals.
///
/// glTF primitives without a NORMAL attribute are common for scanned assets,
/// so normals are always derived from the faces: every face adds its
/// (area-weighted) normal to its three vertices and the sums are normalized.
/// Vertices no face touches get +Z.
pub fn model_vertices(geometry: &MeshGeometry) -> Vec<ModelVertex> {
    let mut normals = vec![Vector3::<f32>::zero(); geometry.vertices.len()];

    for face in &geometry.faces {
        let [a, b, c] = face.map(|idx| idx as usize);
        let pos0 = geometry.vertices[a];
        let pos1 = geometry.vertices[b];
        let pos2 = geometry.vertices[c];
        // Length is twice the triangle area, which gives the weighting for free
        let face_normal = (pos1 - pos0).cross(pos2 - pos0);
        normals[a] += face_normal;
        normals[b] += face_normal;
        normals[c] += face_normal;
    }

    geometry
        .vertices
        .iter()
        .zip(normals)
        .map(|(position, normal)| {
            let normal = if normal.magnitude2() > 0.0 {
                normal.normalize()
            } else {
                Vector3::unit_z()
            };
            ModelVertex {
                position: (*position).into(),
                normal: normal.into(),
            }
        })
        .collect()
}

#[derive(Debug)]
pub struct Mesh {
    pub name: String,
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_elements: u32,
}

impl Mesh {
    /// Upload `geometry` to vertex and index buffers. The geometry must have
    /// been validated so that every face index is in range.
    pub fn from_geometry(device: &wgpu::Device, geometry: &MeshGeometry, name: &str) -> Self {
        let vertices = model_vertices(geometry);
        let indices: Vec<u32> = geometry.faces.iter().flatten().copied().collect();

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Vertex Buffer", name)),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        // Empty buffers cannot be bound, keep one dummy index around
        let index_contents: &[u32] = if indices.is_empty() { &[0] } else { &indices };
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Index Buffer", name)),
            contents: bytemuck::cast_slice(index_contents),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            name: name.to_string(),
            vertex_buffer,
            index_buffer,
            num_elements: indices.len() as u32,
        }
    }
}

pub trait DrawMesh<'a> {
    fn draw_mesh(
        &mut self,
        mesh: &'a Mesh,
        camera_bind_group: &'a wgpu::BindGroup,
        light_bind_group: &'a wgpu::BindGroup,
    );
}

impl<'a, 'b> DrawMesh<'b> for wgpu::RenderPass<'a>
where
    'b: 'a,
{
    fn draw_mesh(
        &mut self,
        mesh: &'b Mesh,
        camera_bind_group: &'b wgpu::BindGroup,
        light_bind_group: &'b wgpu::BindGroup,
    ) {
        if mesh.num_elements == 0 {
            log::warn!("mesh {} has no faces, nothing to draw", mesh.name);
            return;
        }
        self.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        self.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.set_bind_group(0, camera_bind_group, &[]);
        self.set_bind_group(1, light_bind_group, &[]);
        self.draw_indexed(0..mesh.num_elements, 0, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use cgmath::Point3;

    use super::*;

    #[test]
    fn should_compute_face_normal_for_ccw_triangle() {
        let geometry = MeshGeometry::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            vec![[0, 1, 2]],
        );
        let vertices = model_vertices(&geometry);
        for v in vertices {
            assert_eq!(v.normal, [0.0, 0.0, 1.0]);
        }
    }

    #[test]
    fn should_average_shared_vertex_normals() {
        // Two faces folded along the x axis, one facing +z and one facing +y
        let geometry = MeshGeometry::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
                Point3::new(0.0, 0.0, -1.0),
            ],
            vec![[0, 1, 2], [0, 1, 3]],
        );
        let vertices = model_vertices(&geometry);
        let shared: Vector3<f32> = vertices[0].normal.into();
        let expected = Vector3::new(0.0, 1.0, 1.0).normalize();
        assert!((shared - expected).magnitude() < 1e-6);
    }

    #[test]
    fn unreferenced_vertex_should_face_up() {
        let geometry = MeshGeometry::new(vec![Point3::new(0.0, 0.0, 0.0)], Vec::new());
        assert_eq!(model_vertices(&geometry)[0].normal, [0.0, 0.0, 1.0]);
    }
}
