use crate::geom::mesh::Mesh;
use crate::{Point, Vector};

/// Planar polygonal face (e.g. a study surface received from a CAD tool).
#[derive(Debug, Clone)]
pub struct Face {
    vertices: Vec<Point>,
    /// Unit normal (from the vertex winding)
    pub vn: Vector,
}

impl Face {
    /// Creates a face from its boundary. Returns None for degenerate boundaries.
    pub fn new(vertices: Vec<Point>) -> Option<Self> {
        if vertices.len() < 3 || vertices.iter().any(|p| !p.is_finite()) {
            return None;
        }
        let mesh = Mesh::new(vertices.clone(), vec![(0..vertices.len()).collect()]);
        let vn = mesh.face_normals()[0];
        if vn.length() < 0.5 {
            return None;
        }
        Some(Self { vertices, vn })
    }

    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    /// Local orthonormal axes (u, v) on the face plane, u along the first edge.
    fn local_axes(&self) -> Option<(Vector, Vector)> {
        let u_axis = (self.vertices[1] - self.vertices[0]).normalize()?;
        let v_axis = self.vn.cross(u_axis);
        Some((u_axis, v_axis))
    }

    /// Tests if a point on the face plane lies inside the boundary.
    ///
    /// Crossing-number test in local 2D coordinates.
    pub fn is_point_inside(&self, pt: Point) -> bool {
        let Some((u_axis, v_axis)) = self.local_axes() else {
            return false;
        };
        let origin = self.vertices[0];
        let to_2d = |p: Point| {
            let d = p - origin;
            (d.dot(u_axis), d.dot(v_axis))
        };
        let (px, py) = to_2d(pt);
        let poly: Vec<(f64, f64)> = self.vertices.iter().map(|p| to_2d(*p)).collect();

        let mut inside = false;
        let mut j = poly.len() - 1;
        for i in 0..poly.len() {
            let (xi, yi) = poly[i];
            let (xj, yj) = poly[j];
            if (yi > py) != (yj > py) {
                let x_cross = xi + (py - yi) / (yj - yi) * (xj - xi);
                if px < x_cross {
                    inside = !inside;
                }
            }
            j = i;
        }
        inside
    }

    /// Meshes the face into square cells of size `grid_size`.
    ///
    /// Cells are aligned with the first edge; only cells whose center lies inside
    /// the face are kept. Returns None when no cell fits (grid too coarse).
    pub fn mesh_grid(&self, grid_size: f64) -> Option<Mesh> {
        if !(grid_size > 0.0) {
            return None;
        }
        let (u_axis, v_axis) = self.local_axes()?;
        let origin = self.vertices[0];

        let local: Vec<(f64, f64)> = self
            .vertices
            .iter()
            .map(|p| {
                let d = *p - origin;
                (d.dot(u_axis), d.dot(v_axis))
            })
            .collect();
        let u_min = local.iter().map(|p| p.0).fold(f64::INFINITY, f64::min);
        let u_max = local.iter().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max);
        let v_min = local.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
        let v_max = local.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max);

        let nu = ((u_max - u_min) / grid_size).floor() as usize;
        let nv = ((v_max - v_min) / grid_size).floor() as usize;

        let mut mesh = Mesh::default();
        let at = |u: f64, v: f64| origin + u_axis * u + v_axis * v;

        for i in 0..nu.max(1) {
            for j in 0..nv.max(1) {
                let u0 = u_min + i as f64 * grid_size;
                let v0 = v_min + j as f64 * grid_size;
                let center = at(u0 + 0.5 * grid_size, v0 + 0.5 * grid_size);
                if u0 + grid_size > u_max + 1e-9 || v0 + grid_size > v_max + 1e-9 {
                    continue;
                }
                if !self.is_point_inside(center) {
                    continue;
                }
                let start = mesh.vertices.len();
                mesh.vertices.push(at(u0, v0));
                mesh.vertices.push(at(u0 + grid_size, v0));
                mesh.vertices.push(at(u0 + grid_size, v0 + grid_size));
                mesh.vertices.push(at(u0, v0 + grid_size));
                mesh.faces.push(vec![start, start + 1, start + 2, start + 3]);
            }
        }

        if mesh.is_empty() { None } else { Some(mesh) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn floor(size: f64) -> Face {
        Face::new(vec![
            Point::new(0.0, 0.0, 0.0),
            Point::new(size, 0.0, 0.0),
            Point::new(size, size, 0.0),
            Point::new(0.0, size, 0.0),
        ])
        .unwrap()
    }

    #[test]
    fn test_degenerate_face() {
        let f = Face::new(vec![
            Point::new(0.0, 0.0, 0.0),
            Point::new(1.0, 0.0, 0.0),
            Point::new(2.0, 0.0, 0.0),
        ]);
        assert!(f.is_none());
    }

    #[test]
    fn test_point_inside() {
        let f = floor(2.0);
        assert!(f.is_point_inside(Point::new(1.0, 1.0, 0.0)));
        assert!(!f.is_point_inside(Point::new(3.0, 1.0, 0.0)));
    }

    #[test]
    fn test_mesh_grid_square() {
        let mesh = floor(2.0).mesh_grid(0.5).unwrap();
        assert_eq!(mesh.num_faces(), 16);
        let total: f64 = mesh.face_areas().iter().sum();
        assert!((total - 4.0).abs() < 1e-9);
        for n in mesh.face_normals() {
            assert!(n.is_close(&Vector::new(0.0, 0.0, 1.0)));
        }
    }

    #[test]
    fn test_mesh_grid_l_shape() {
        let f = Face::new(vec![
            Point::new(0.0, 0.0, 0.0),
            Point::new(2.0, 0.0, 0.0),
            Point::new(2.0, 1.0, 0.0),
            Point::new(1.0, 1.0, 0.0),
            Point::new(1.0, 2.0, 0.0),
            Point::new(0.0, 2.0, 0.0),
        ])
        .unwrap();
        let mesh = f.mesh_grid(1.0).unwrap();
        assert_eq!(mesh.num_faces(), 3);
    }

    #[test]
    fn test_mesh_grid_too_coarse() {
        assert!(floor(1.0).mesh_grid(5.0).is_none());
        assert!(floor(1.0).mesh_grid(0.0).is_none());
    }
}
