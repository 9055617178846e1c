/*!
 * This module contains all logic for loading geometry from external files.
 *
 * Only the first primitive of the first mesh is read. Materials, textures,
 * animations and node transforms are ignored: the capture renders the raw
 * vertex positions with a fixed material.
 */
use std::path::Path;

use cgmath::Point3;
use gltf::json::{mesh::Semantic, validation::Checked};

use crate::{
    data_structures::geometry::{GeometrySource, MeshGeometry},
    error::CaptureError,
};

pub async fn load_binary(path: &Path) -> Result<Vec<u8>, CaptureError> {
    tokio::fs::read(path)
        .await
        .map_err(|e| CaptureError::io(path, e))
}

/// Load a `.glb`/`.gltf` file and extract its geometry.
///
/// External buffers of a `.gltf` file are resolved relative to the file's
/// directory.
pub async fn load_geometry_gltf(path: impl AsRef<Path>) -> Result<GeometrySource, CaptureError> {
    let path = path.as_ref();
    let bytes = load_binary(path).await?;
    parse_geometry_gltf(&bytes, path)
}

/// Extract geometry from glTF bytes; `path` locates external buffers and
/// labels errors.
pub fn parse_geometry_gltf(bytes: &[u8], path: &Path) -> Result<GeometrySource, CaptureError> {
    // Validation rejects a primitive without POSITION data, so that case is
    // decided on the raw JSON first.
    let raw = gltf::Gltf::from_slice_without_validation(bytes)
        .map_err(|e| CaptureError::asset(path, e))?;
    if !has_position_data(raw.document.as_json(), path)? {
        log::warn!(
            "{} has no vertex positions, falling back to a single point at the origin",
            path.display()
        );
        return Ok(GeometrySource::missing_positions());
    }

    let gltf::Gltf { document, blob } =
        gltf::Gltf::from_slice(bytes).map_err(|e| CaptureError::asset(path, e))?;
    let buffers = gltf::import_buffers(&document, path.parent(), blob)
        .map_err(|e| CaptureError::asset(path, e))?;

    let mesh_count = document.meshes().len();
    let mesh = document
        .meshes()
        .next()
        .ok_or_else(|| CaptureError::asset(path, "asset contains no meshes"))?;
    if mesh_count > 1 {
        log::warn!(
            "{} contains {} meshes, only the first one is captured",
            path.display(),
            mesh_count
        );
    }
    let primitive = mesh
        .primitives()
        .next()
        .ok_or_else(|| CaptureError::asset(path, "first mesh has no primitives"))?;
    if primitive.mode() != gltf::mesh::Mode::Triangles {
        return Err(CaptureError::asset(
            path,
            format!("unsupported primitive mode {:?}", primitive.mode()),
        ));
    }

    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| data.0.as_slice()));

    let positions = reader
        .read_positions()
        .ok_or_else(|| CaptureError::asset(path, "position accessor could not be read"))?;
    let vertices: Vec<Point3<f32>> = positions.map(Point3::from).collect();

    let source = match reader.read_indices() {
        Some(indices) => {
            let indices: Vec<u32> = indices.into_u32().collect();
            if indices.len() % 3 != 0 {
                return Err(CaptureError::asset(
                    path,
                    format!("index count {} is not a multiple of 3", indices.len()),
                ));
            }
            let faces = indices
                .chunks_exact(3)
                .map(|face| [face[0], face[1], face[2]])
                .collect();
            GeometrySource::Indexed(MeshGeometry::new(vertices, faces))
        }
        None => {
            let faces = MeshGeometry::sequential_faces(vertices.len()).ok_or_else(|| {
                CaptureError::asset(
                    path,
                    format!(
                        "{} unindexed vertices do not form whole triangles",
                        vertices.len()
                    ),
                )
            })?;
            log::warn!(
                "{} has no index buffer, using sequential triangles",
                path.display()
            );
            GeometrySource::SequentialIndices(MeshGeometry::new(vertices, faces))
        }
    };

    if let Some(face) = source.geometry().first_invalid_face() {
        return Err(CaptureError::asset(
            path,
            format!("face {} references a vertex that does not exist", face),
        ));
    }

    let geometry = source.geometry();
    log::info!(
        "loaded {}: {} vertices, {} faces",
        path.display(),
        geometry.vertices.len(),
        geometry.faces.len()
    );
    Ok(source)
}

/// Whether the first primitive of the first mesh carries a POSITION accessor
/// backed by buffer data. Sparse accessors count as backed.
fn has_position_data(root: &gltf::json::Root, path: &Path) -> Result<bool, CaptureError> {
    let mesh = root
        .meshes
        .first()
        .ok_or_else(|| CaptureError::asset(path, "asset contains no meshes"))?;
    let primitive = mesh
        .primitives
        .first()
        .ok_or_else(|| CaptureError::asset(path, "first mesh has no primitives"))?;
    let position = primitive
        .attributes
        .iter()
        .find(|(semantic, _)| matches!(semantic, Checked::Valid(Semantic::Positions)))
        .map(|(_, accessor)| accessor.value());
    let Some(index) = position else {
        return Ok(false);
    };
    // a dangling index is left for validation to report
    Ok(root
        .accessors
        .get(index)
        .is_none_or(|accessor| accessor.buffer_view.is_some() || accessor.sparse.is_some()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_reject_bytes_that_are_not_gltf() {
        let err = parse_geometry_gltf(b"definitely not a model", Path::new("junk.glb")).unwrap_err();
        assert!(matches!(err, CaptureError::AssetParse { .. }), "{err}");
    }

    #[test]
    fn should_reject_asset_without_meshes() {
        let json = br#"{"asset":{"version":"2.0"}}"#;
        let err = parse_geometry_gltf(json, Path::new("empty.gltf")).unwrap_err();
        match err {
            CaptureError::AssetParse { path, reason } => {
                assert_eq!(path, Path::new("empty.gltf"));
                assert!(reason.contains("no meshes"), "{reason}");
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn should_reject_mesh_without_primitives() {
        let json = br#"{"asset":{"version":"2.0"},"meshes":[{"primitives":[]}]}"#;
        let err = parse_geometry_gltf(json, Path::new("hollow.gltf")).unwrap_err();
        match err {
            CaptureError::AssetParse { reason, .. } => assert!(reason.contains("no primitives"), "{reason}"),
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn should_fall_back_when_position_accessor_has_no_buffer_view() {
        let json = br#"{
            "asset": {"version": "2.0"},
            "accessors": [{
                "componentType": 5126,
                "count": 3,
                "type": "VEC3",
                "min": [0.0, 0.0, 0.0],
                "max": [1.0, 1.0, 0.0]
            }],
            "meshes": [{"primitives": [{"attributes": {"POSITION": 0}}]}]
        }"#;
        let source = parse_geometry_gltf(json, Path::new("unbacked.gltf")).unwrap();
        assert_eq!(source, GeometrySource::missing_positions());
    }

    #[tokio::test]
    async fn should_report_missing_file_as_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.glb");
        let err = load_geometry_gltf(&missing).await.unwrap_err();
        assert!(matches!(err, CaptureError::Io { ref path, .. } if path == &missing));
    }
}
