use std::collections::HashMap;

use crate::geom::bboxes::bounding_box;
use crate::{Point, Vector};

type Cell = (i32, i32, i32);

/// Uniform grid of cubic cells holding the indices of the elements whose
/// bounding boxes touch each cell.
pub struct VoxelGrid {
    grid: HashMap<Cell, Vec<usize>>,
    step: f64,
    min_cell: Cell,
    max_cell: Cell,
}

impl VoxelGrid {
    /// Builds the grid from element bounding boxes `(min, max)`.
    pub fn new(bboxes: &[(Point, Point)], step: f64) -> Self {
        let mut grid: HashMap<Cell, Vec<usize>> = HashMap::new();

        if bboxes.is_empty() || !(step > 0.0) {
            return Self {
                grid,
                step: 1.0,
                min_cell: (0, 0, 0),
                max_cell: (-1, -1, -1),
            };
        }

        let corners: Vec<Point> = bboxes.iter().flat_map(|(a, b)| [*a, *b]).collect();
        let (bbox_min, bbox_max) = bounding_box(&corners);

        let cell = |p: Point| -> Cell {
            (
                (p.x / step).floor() as i32,
                (p.y / step).floor() as i32,
                (p.z / step).floor() as i32,
            )
        };

        // Each element goes to every cell its own bounding box covers
        for (idx, (pmin, pmax)) in bboxes.iter().enumerate() {
            let (i0, j0, k0) = cell(*pmin);
            let (i1, j1, k1) = cell(*pmax);
            for i in i0..=i1 {
                for j in j0..=j1 {
                    for k in k0..=k1 {
                        grid.entry((i, j, k)).or_default().push(idx);
                    }
                }
            }
        }

        Self {
            grid,
            step,
            min_cell: cell(bbox_min),
            max_cell: cell(bbox_max),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.grid.is_empty()
    }

    pub fn num_cells(&self) -> usize {
        self.grid.len()
    }

    /// Minimum and maximum corners of the occupied cell range.
    pub fn bounds(&self) -> (Point, Point) {
        let s = self.step;
        (
            Point::new(
                self.min_cell.0 as f64 * s,
                self.min_cell.1 as f64 * s,
                self.min_cell.2 as f64 * s,
            ),
            Point::new(
                (self.max_cell.0 + 1) as f64 * s,
                (self.max_cell.1 + 1) as f64 * s,
                (self.max_cell.2 + 1) as f64 * s,
            ),
        )
    }

    fn contains_cell(&self, c: Cell) -> bool {
        (self.min_cell.0..=self.max_cell.0).contains(&c.0)
            && (self.min_cell.1..=self.max_cell.1).contains(&c.1)
            && (self.min_cell.2..=self.max_cell.2).contains(&c.2)
    }

    /// Walks the cells pierced by the ray (3D-DDA), starting at parameter
    /// `t_enter` along the unit direction `dir`.
    ///
    /// `visit` receives the element indices of every non-empty cell in ray
    /// order; traversal stops as soon as it returns true, and so does this
    /// function.
    pub fn traverse<F>(&self, origin: Point, dir: Vector, t_enter: f64, mut visit: F) -> bool
    where
        F: FnMut(&[usize]) -> bool,
    {
        if self.grid.is_empty() {
            return false;
        }
        let s = self.step;
        let start = origin + dir * t_enter;

        let axis = |p: f64, lo: i32, hi: i32| ((p / s).floor() as i32).clamp(lo, hi);
        let mut cell = (
            axis(start.x, self.min_cell.0, self.max_cell.0),
            axis(start.y, self.min_cell.1, self.max_cell.1),
            axis(start.z, self.min_cell.2, self.max_cell.2),
        );

        // Per axis: step direction, parameter of the next boundary, parameter per cell
        let setup = |o: f64, d: f64, c: i32| -> (i32, f64, f64) {
            if d > 0.0 {
                (1, ((c + 1) as f64 * s - o) / d, s / d)
            } else if d < 0.0 {
                (-1, (c as f64 * s - o) / d, -s / d)
            } else {
                (0, f64::INFINITY, f64::INFINITY)
            }
        };
        let (sx, mut tx, dtx) = setup(origin.x, dir.dx, cell.0);
        let (sy, mut ty, dty) = setup(origin.y, dir.dy, cell.1);
        let (sz, mut tz, dtz) = setup(origin.z, dir.dz, cell.2);

        while self.contains_cell(cell) {
            if let Some(indices) = self.grid.get(&cell)
                && visit(indices)
            {
                return true;
            }
            if tx <= ty && tx <= tz {
                cell.0 += sx;
                tx += dtx;
            } else if ty <= tz {
                cell.1 += sy;
                ty += dty;
            } else {
                cell.2 += sz;
                tz += dtz;
            }
            if !(tx.is_finite() || ty.is_finite() || tz.is_finite()) {
                break;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square_bbox() -> (Point, Point) {
        (Point::new(0.0, 0.0, 0.0), Point::new(1.0, 1.0, 0.0))
    }

    #[test]
    fn test_voxel_grid_basic() {
        let grid = VoxelGrid::new(&[unit_square_bbox()], 0.5);
        assert!(!grid.is_empty());
        // The square touches cells 0..=2 along x and y on the z = 0 layer
        assert_eq!(grid.num_cells(), 9);
    }

    #[test]
    fn test_traverse_hits_cell_below() {
        let grid = VoxelGrid::new(&[unit_square_bbox()], 0.5);
        let mut seen = Vec::new();
        let hit = grid.traverse(
            Point::new(0.25, 0.25, 5.0),
            Vector::new(0.0, 0.0, -1.0),
            4.9,
            |idx| {
                seen.extend_from_slice(idx);
                true
            },
        );
        assert!(hit);
        assert_eq!(seen, vec![0]);
    }

    #[test]
    fn test_traverse_diagonal_visits_cells_in_order() {
        let bboxes: Vec<(Point, Point)> = (0..4)
            .map(|i| {
                let p = Point::new(i as f64 + 0.5, i as f64 + 0.5, 0.5);
                (p, p)
            })
            .collect();
        let grid = VoxelGrid::new(&bboxes, 1.0);
        let mut order = Vec::new();
        let dir = Vector::new(1.0, 1.0, 0.0).normalize().unwrap();
        let hit = grid.traverse(Point::new(0.1, 0.2, 0.5), dir, 0.0, |idx| {
            order.extend_from_slice(idx);
            false
        });
        assert!(!hit);
        assert_eq!(order, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_traverse_empty_grid() {
        let grid = VoxelGrid::new(&[], 1.0);
        assert!(grid.is_empty());
        assert!(!grid.traverse(
            Point::new(0.0, 0.0, 0.0),
            Vector::new(0.0, 0.0, 1.0),
            0.0,
            |_| true
        ));
    }
}
