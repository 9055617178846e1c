use anyhow::{Context as _, bail};
use nerf_capture::{
    Point3, RenderedFrame, Resolution, SceneRenderer,
    camera::Pose,
    data_structures::geometry::MeshGeometry,
    scene::Scene,
};
use serde_json::json;

/// CPU stand-in for the GPU renderer.
///
/// Records the pose of the camera attached on every call and returns a solid
/// grey frame. Fails on frame `fail_at` if set.
#[derive(Default)]
pub(crate) struct RecordingRenderer {
    pub uploads: usize,
    pub poses: Vec<Pose>,
    pub fail_at: Option<usize>,
}

impl RecordingRenderer {
    pub(crate) fn failing_at(frame: usize) -> Self {
        Self {
            fail_at: Some(frame),
            ..Default::default()
        }
    }
}

impl SceneRenderer for RecordingRenderer {
    /// Number of vertices uploaded.
    type Mesh = usize;

    fn upload(&mut self, geometry: &MeshGeometry) -> anyhow::Result<usize> {
        self.uploads += 1;
        Ok(geometry.vertices.len())
    }

    fn render(&mut self, scene: &Scene<usize>, resolution: Resolution) -> anyhow::Result<RenderedFrame> {
        let camera = scene
            .camera()
            .context("render called without an attached camera")?;
        if self.fail_at == Some(self.poses.len()) {
            bail!("simulated rasterizer failure");
        }
        self.poses.push(camera.pose);
        Ok(RenderedFrame {
            color: image::RgbaImage::from_pixel(
                resolution.width,
                resolution.height,
                image::Rgba([128, 128, 128, 255]),
            ),
            depth: vec![0.5; resolution.pixel_count()],
        })
    }
}

/// The 8 corners of the cube spanning [-1, 1] on every axis.
pub(crate) fn cube_vertices() -> Vec<[f32; 3]> {
    let mut corners = Vec::with_capacity(8);
    for x in [-1.0, 1.0] {
        for y in [-1.0, 1.0] {
            for z in [-1.0, 1.0] {
                corners.push([x, y, z]);
            }
        }
    }
    corners
}

/// Triangles of [`cube_vertices`], two per side.
pub(crate) fn cube_indices() -> Vec<u32> {
    // corner index = 4x + 2y + z with x, y, z in {0, 1}
    vec![
        0, 1, 3, 0, 3, 2, // -x
        4, 6, 7, 4, 7, 5, // +x
        0, 4, 5, 0, 5, 1, // -y
        2, 3, 7, 2, 7, 6, // +y
        0, 2, 6, 0, 6, 4, // -z
        1, 5, 7, 1, 7, 3, // +z
    ]
}

pub(crate) fn cube_geometry() -> MeshGeometry {
    let vertices = cube_vertices().into_iter().map(Point3::from).collect();
    let faces = cube_indices()
        .chunks_exact(3)
        .map(|f| [f[0], f[1], f[2]])
        .collect();
    MeshGeometry::new(vertices, faces)
}

/// Build a binary glTF with a single mesh and primitive.
///
/// Without `positions` the primitive only carries a NORMAL attribute for
/// three vertices. Without `indices` the primitive is unindexed.
pub(crate) fn glb(positions: Option<&[[f32; 3]]>, indices: Option<&[u32]>) -> Vec<u8> {
    let mut bin: Vec<u8> = Vec::new();
    let mut views = Vec::new();
    let mut accessors = Vec::new();
    let mut attributes = serde_json::Map::new();

    let mut push_view = |bin: &mut Vec<u8>, bytes: Vec<u8>| {
        let offset = bin.len();
        bin.extend_from_slice(&bytes);
        views.push(json!({ "buffer": 0, "byteOffset": offset, "byteLength": bytes.len() }));
        views.len() - 1
    };
    let vec3_bytes = |values: &[[f32; 3]]| -> Vec<u8> {
        values
            .iter()
            .flatten()
            .flat_map(|c| c.to_le_bytes())
            .collect()
    };

    match positions {
        Some(positions) => {
            let view = push_view(&mut bin, vec3_bytes(positions));
            let mut min = [f32::MAX; 3];
            let mut max = [f32::MIN; 3];
            for p in positions {
                for axis in 0..3 {
                    min[axis] = min[axis].min(p[axis]);
                    max[axis] = max[axis].max(p[axis]);
                }
            }
            accessors.push(json!({
                "bufferView": view,
                "componentType": 5126,
                "count": positions.len(),
                "type": "VEC3",
                "min": min,
                "max": max,
            }));
            attributes.insert("POSITION".to_string(), json!(accessors.len() - 1));
        }
        None => {
            let view = push_view(&mut bin, vec3_bytes(&[[0.0, 0.0, 1.0]; 3]));
            accessors.push(json!({
                "bufferView": view,
                "componentType": 5126,
                "count": 3,
                "type": "VEC3",
            }));
            attributes.insert("NORMAL".to_string(), json!(accessors.len() - 1));
        }
    }

    let mut primitive = json!({ "attributes": attributes });
    if let Some(indices) = indices {
        let bytes = indices.iter().flat_map(|i| i.to_le_bytes()).collect();
        let view = push_view(&mut bin, bytes);
        accessors.push(json!({
            "bufferView": view,
            "componentType": 5125,
            "count": indices.len(),
            "type": "SCALAR",
        }));
        primitive["indices"] = json!(accessors.len() - 1);
    }

    let document = json!({
        "asset": { "version": "2.0" },
        "buffers": [{ "byteLength": bin.len() }],
        "bufferViews": views,
        "accessors": accessors,
        "meshes": [{ "primitives": [primitive] }],
    });
    pack_glb(&document, bin)
}

/// Binary glTF whose POSITION accessor declares three vertices but has no
/// buffer view, so no position data can be read.
pub(crate) fn glb_without_position_data() -> Vec<u8> {
    let document = json!({
        "asset": { "version": "2.0" },
        "accessors": [{
            "componentType": 5126,
            "count": 3,
            "type": "VEC3",
            "min": [0.0, 0.0, 0.0],
            "max": [1.0, 1.0, 0.0],
        }],
        "meshes": [{ "primitives": [{ "attributes": { "POSITION": 0 } }] }],
    });
    pack_glb(&document, Vec::new())
}

/// GLB container around `document`. An empty `bin` omits the binary chunk.
fn pack_glb(document: &serde_json::Value, mut bin: Vec<u8>) -> Vec<u8> {
    let mut json = serde_json::to_vec(document).unwrap();
    while json.len() % 4 != 0 {
        json.push(b' ');
    }
    while bin.len() % 4 != 0 {
        bin.push(0);
    }

    let bin_chunk = if bin.is_empty() { 0 } else { 8 + bin.len() };
    let total = 12 + 8 + json.len() + bin_chunk;
    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(b"glTF");
    out.extend_from_slice(&2u32.to_le_bytes());
    out.extend_from_slice(&(total as u32).to_le_bytes());
    out.extend_from_slice(&(json.len() as u32).to_le_bytes());
    out.extend_from_slice(&0x4E4F_534Au32.to_le_bytes());
    out.extend_from_slice(&json);
    if !bin.is_empty() {
        out.extend_from_slice(&(bin.len() as u32).to_le_bytes());
        out.extend_from_slice(&0x004E_4942u32.to_le_bytes());
        out.extend_from_slice(&bin);
    }
    out
}

pub(crate) fn assert_close(actual: f32, expected: f32, tolerance: f32) {
    assert!(
        (actual - expected).abs() <= tolerance,
        "expected {expected} +- {tolerance}, got {actual}"
    );
}
