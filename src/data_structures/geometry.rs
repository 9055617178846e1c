//! CPU-side mesh geometry as delivered by the asset geometry provider.

use cgmath::{EuclideanSpace, Point3};

/// Triangle soup: vertex positions plus 0-based vertex-index triples.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshGeometry {
    pub vertices: Vec<Point3<f32>>,
    pub faces: Vec<[u32; 3]>,
}

impl MeshGeometry {
    pub fn new(vertices: Vec<Point3<f32>>, faces: Vec<[u32; 3]>) -> Self {
        Self { vertices, faces }
    }

    /// Faces `(3k, 3k+1, 3k+2)` for a primitive without an index buffer.
    ///
    /// Returns `None` if the vertex count is not a multiple of three.
    pub fn sequential_faces(vertex_count: usize) -> Option<Vec<[u32; 3]>> {
        if vertex_count % 3 != 0 {
            return None;
        }
        let faces = (0..vertex_count / 3)
            .map(|k| {
                let base = (k * 3) as u32;
                [base, base + 1, base + 2]
            })
            .collect();
        Some(faces)
    }

    /// The first face referencing a vertex that does not exist, if any.
    pub fn first_invalid_face(&self) -> Option<usize> {
        let count = self.vertices.len();
        self.faces
            .iter()
            .position(|face| face.iter().any(|&idx| idx as usize >= count))
    }
}

/// How the provider arrived at the geometry it returned.
///
/// The fallbacks are kept explicit so callers can tell a valid minimal mesh
/// apart from an asset that was missing data.
#[derive(Clone, Debug, PartialEq)]
pub enum GeometrySource {
    /// Positions and an index buffer were both present.
    Indexed(MeshGeometry),
    /// No index buffer; faces were generated sequentially.
    SequentialIndices(MeshGeometry),
    /// No position data. Carries a single point at the origin and no faces,
    /// which downstream stages reject as degenerate.
    MissingPositions(MeshGeometry),
}

impl GeometrySource {
    pub fn missing_positions() -> Self {
        Self::MissingPositions(MeshGeometry::new(vec![Point3::origin()], Vec::new()))
    }

    pub fn geometry(&self) -> &MeshGeometry {
        match self {
            Self::Indexed(g) | Self::SequentialIndices(g) | Self::MissingPositions(g) => g,
        }
    }

    pub fn into_geometry(self) -> MeshGeometry {
        match self {
            Self::Indexed(g) | Self::SequentialIndices(g) | Self::MissingPositions(g) => g,
        }
    }

    pub fn is_fallback(&self) -> bool {
        !matches!(self, Self::Indexed(_))
    }
}
