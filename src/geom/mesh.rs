use crate::error::{GeometryKind, RadiationError, Result};
use crate::{Point, Vector};

/// Type for holding vertex indices for a triangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriangleIndex(pub usize, pub usize, pub usize);

/// Minimum face area regarded as non-degenerate.
pub const MIN_FACE_AREA: f64 = 1e-12;

/// Polygonal mesh with triangular or quadrilateral faces.
///
/// Faces are stored as counter-clockwise vertex index loops
/// (seen from the side the face normal points to).
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub vertices: Vec<Point>,
    pub faces: Vec<Vec<usize>>,
}

impl Mesh {
    pub fn new(vertices: Vec<Point>, faces: Vec<Vec<usize>>) -> Self {
        Self { vertices, faces }
    }

    /// Builds a mesh out of triangles.
    pub fn from_triangles(vertices: Vec<Point>, triangles: &[TriangleIndex]) -> Self {
        let faces = triangles.iter().map(|t| vec![t.0, t.1, t.2]).collect();
        Self { vertices, faces }
    }

    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Returns the points of a face.
    pub fn face_points(&self, face: usize) -> Vec<Point> {
        self.faces[face].iter().map(|&i| self.vertices[i]).collect()
    }

    /// Newell's area vector of a face: normal direction times twice the area.
    fn area_vector(&self, face: &[usize]) -> Vector {
        let mut n = Vector::new(0., 0., 0.);
        for k in 0..face.len() {
            let a = self.vertices[face[k]];
            let b = self.vertices[face[(k + 1) % face.len()]];
            n.dx += (a.y - b.y) * (a.z + b.z);
            n.dy += (a.z - b.z) * (a.x + b.x);
            n.dz += (a.x - b.x) * (a.y + b.y);
        }
        n
    }

    pub fn face_centroids(&self) -> Vec<Point> {
        (0..self.faces.len())
            .map(|i| Point::centroid(&self.face_points(i)))
            .collect()
    }

    /// Unit normals of all faces. Degenerate faces get a zero vector.
    pub fn face_normals(&self) -> Vec<Vector> {
        self.faces
            .iter()
            .map(|f| {
                self.area_vector(f)
                    .normalize()
                    .unwrap_or(Vector::new(0., 0., 0.))
            })
            .collect()
    }

    pub fn face_areas(&self) -> Vec<f64> {
        self.faces
            .iter()
            .map(|f| 0.5 * self.area_vector(f).length())
            .collect()
    }

    /// Fan-triangulates all faces.
    pub fn triangles(&self) -> Vec<TriangleIndex> {
        let mut tris = Vec::with_capacity(self.faces.len() * 2);
        for f in &self.faces {
            for k in 1..f.len().saturating_sub(1) {
                tris.push(TriangleIndex(f[0], f[k], f[k + 1]));
            }
        }
        tris
    }

    /// Appends all faces of `other`, re-indexing its vertices.
    pub fn join(&mut self, other: &Mesh) {
        let offset = self.vertices.len();
        self.vertices.extend_from_slice(&other.vertices);
        self.faces.extend(
            other
                .faces
                .iter()
                .map(|f| f.iter().map(|i| i + offset).collect::<Vec<usize>>()),
        );
    }

    /// Joins several meshes into one (face order is preserved).
    pub fn join_meshes(meshes: &[Mesh]) -> Mesh {
        let mut joined = Mesh::default();
        for m in meshes {
            joined.join(m);
        }
        joined
    }

    /// Checks that every face references existing, finite vertices and has non-zero area.
    pub fn validate(&self, kind: GeometryKind) -> Result<()> {
        for (i, f) in self.faces.iter().enumerate() {
            if f.len() < 3 {
                return Err(RadiationError::geometry(
                    kind,
                    i,
                    format!("face has {} vertices", f.len()),
                ));
            }
            if let Some(&bad) = f.iter().find(|&&v| v >= self.vertices.len()) {
                return Err(RadiationError::geometry(
                    kind,
                    i,
                    format!("vertex index {bad} out of range"),
                ));
            }
            if f.iter().any(|&v| !self.vertices[v].is_finite()) {
                return Err(RadiationError::geometry(kind, i, "non-finite coordinate"));
            }
            let area = 0.5 * self.area_vector(f).length();
            if !(area > MIN_FACE_AREA) {
                return Err(RadiationError::geometry(kind, i, "zero-area face"));
            }
        }
        Ok(())
    }
}
