pub mod voxel_grid;

use tracing::debug;

use crate::error::{GeometryKind, Result};
use crate::geom::bboxes::{bounding_box, ray_box_interval};
use crate::geom::mesh::Mesh;
use crate::geom::ray::Ray;
use crate::{Point, Vector};

use self::voxel_grid::VoxelGrid;

/// Triangles with a doubled area below this are dropped from the scene.
const MIN_TRIANGLE_CROSS: f64 = 1e-12;

/// Triangle with precomputed edges for ray tests.
#[derive(Debug, Clone, Copy)]
pub struct Triangle {
    pub v0: Point,
    pub e1: Vector,
    pub e2: Vector,
}

impl Triangle {
    pub fn new(v0: Point, v1: Point, v2: Point) -> Self {
        Self {
            v0,
            e1: v1 - v0,
            e2: v2 - v0,
        }
    }

    fn bbox(&self) -> (Point, Point) {
        bounding_box(&[self.v0, self.v0 + self.e1, self.v0 + self.e2])
    }

    fn is_degenerate(&self) -> bool {
        self.e1.cross(self.e2).length() < MIN_TRIANGLE_CROSS
    }
}

/// Opaque context geometry indexed for occlusion queries.
pub struct ContextScene {
    triangles: Vec<Triangle>,
    voxel_grid: VoxelGrid,
}

impl ContextScene {
    /// Scene without any occluder.
    pub fn empty() -> Self {
        Self {
            triangles: Vec::new(),
            voxel_grid: VoxelGrid::new(&[], 1.0),
        }
    }

    /// Creates the scene from a context mesh.
    ///
    /// Faces are validated and fan-triangulated. `voxel_size` defaults to a
    /// value derived from the scene extent and the triangle count.
    pub fn new(mesh: &Mesh, voxel_size: Option<f64>) -> Result<Self> {
        mesh.validate(GeometryKind::Context)?;

        let triangles: Vec<Triangle> = mesh
            .triangles()
            .into_iter()
            .map(|t| {
                Triangle::new(
                    mesh.vertices[t.0],
                    mesh.vertices[t.1],
                    mesh.vertices[t.2],
                )
            })
            .filter(|t| !t.is_degenerate())
            .collect();

        Ok(Self::from_triangles(triangles, voxel_size))
    }

    pub fn from_triangles(triangles: Vec<Triangle>, voxel_size: Option<f64>) -> Self {
        let bboxes: Vec<(Point, Point)> = triangles.iter().map(Triangle::bbox).collect();
        let step = voxel_size
            .filter(|s| s.is_finite() && *s > 0.0)
            .unwrap_or_else(|| auto_voxel_size(&bboxes));
        let voxel_grid = VoxelGrid::new(&bboxes, step);

        debug!(
            triangles = triangles.len(),
            cells = voxel_grid.num_cells(),
            step,
            "Built context scene"
        );

        Self {
            triangles,
            voxel_grid,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    pub fn num_triangles(&self) -> usize {
        self.triangles.len()
    }

    /// Checks whether the ray hits any triangle.
    ///
    /// Walks the voxel grid along the ray and exits on the first hit.
    pub fn is_occluded(&self, ray: &Ray) -> bool {
        if self.triangles.is_empty() {
            return false;
        }
        let (bmin, bmax) = self.voxel_grid.bounds();
        let d = ray.direction;
        let Some((t_enter, _)) = ray_box_interval(ray.origin, (d.dx, d.dy, d.dz), bmin, bmax)
        else {
            return false;
        };

        self.voxel_grid
            .traverse(ray.origin, ray.direction, t_enter, |indices| {
                indices.iter().any(|&i| {
                    let tri = &self.triangles[i];
                    ray.intersect_triangle(tri.v0, tri.e1, tri.e2).is_some()
                })
            })
    }

    /// Checks the ray against every triangle, without the voxel grid.
    pub fn is_occluded_brute_force(&self, ray: &Ray) -> bool {
        self.triangles
            .iter()
            .any(|tri| ray.intersect_triangle(tri.v0, tri.e1, tri.e2).is_some())
    }
}

/// Cell size such that the scene extent holds about `2·cbrt(n)` cells per axis.
fn auto_voxel_size(bboxes: &[(Point, Point)]) -> f64 {
    if bboxes.is_empty() {
        return 1.0;
    }
    let corners: Vec<Point> = bboxes.iter().flat_map(|(a, b)| [*a, *b]).collect();
    let (bmin, bmax) = bounding_box(&corners);
    let extent = (bmax.x - bmin.x)
        .max(bmax.y - bmin.y)
        .max(bmax.z - bmin.z);
    let cells_per_axis = 2.0 * (bboxes.len() as f64).cbrt();
    let step = extent / cells_per_axis.max(1.0);
    if step.is_finite() && step > 0.0 { step } else { 1.0 }
}
