use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{GeometryKind, RadiationError, Result};
use crate::geom::face::Face;
use crate::geom::mesh::Mesh;
use crate::{Point, Vector};

/// A single sensor point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorPoint {
    pub position: Point,
    /// Outward normal; normalized by the evaluator.
    pub normal: Vector,
    /// Area represented by the sensor (m^2), when it comes from a mesh face.
    pub area: Option<f64>,
}

impl SensorPoint {
    pub fn new(position: Point, normal: Vector) -> Self {
        Self {
            position,
            normal,
            area: None,
        }
    }

    pub fn with_area(mut self, area: f64) -> Self {
        self.area = Some(area);
        self
    }

    /// Returns the unit normal, or `MalformedGeometry` for NaN positions and
    /// zero or non-finite normals.
    pub fn unit_normal(&self, index: usize) -> Result<Vector> {
        if !self.position.is_finite() {
            return Err(RadiationError::geometry(
                GeometryKind::Sensor,
                index,
                format!("non-finite position {}", self.position),
            ));
        }
        self.normal.normalize().ok_or_else(|| {
            RadiationError::geometry(
                GeometryKind::Sensor,
                index,
                format!("invalid normal {}", self.normal),
            )
        })
    }
}

/// A named ordered collection of sensors.
#[derive(Debug, Clone)]
pub struct SensorGrid {
    pub name: String,
    pub sensors: Vec<SensorPoint>,
}

impl SensorGrid {
    pub fn new(name: &str, sensors: Vec<SensorPoint>) -> Self {
        Self {
            name: name.to_string(),
            sensors,
        }
    }

    /// One sensor per mesh face at its centroid, with the face normal and area.
    pub fn from_mesh(name: &str, mesh: &Mesh) -> Result<Self> {
        mesh.validate(GeometryKind::Sensor)?;
        let sensors = mesh
            .face_centroids()
            .into_iter()
            .zip(mesh.face_normals())
            .zip(mesh.face_areas())
            .map(|((c, n), a)| SensorPoint::new(c, n).with_area(a))
            .collect();
        Ok(Self::new(name, sensors))
    }

    /// Meshes a planar face into square cells and places a sensor on each.
    pub fn from_face(name: &str, face: &Face, grid_size: f64) -> Result<Self> {
        let mesh = face.mesh_grid(grid_size).ok_or_else(|| {
            RadiationError::config(format!(
                "grid size {grid_size} produces no sensors on face '{name}'"
            ))
        })?;
        Self::from_mesh(name, &mesh)
    }

    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }
}

/// Position of one grid inside a joined sensor list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridInfo {
    pub name: String,
    pub identifier: String,
    pub count: usize,
    #[serde(skip)]
    pub start: usize,
}

/// Concatenates the grids for a single run.
///
/// Identifiers are unique within the run: a clash gets a numeric suffix.
pub fn join_grids(grids: &[SensorGrid]) -> (Vec<SensorPoint>, Vec<GridInfo>) {
    let mut sensors = Vec::with_capacity(grids.iter().map(SensorGrid::len).sum());
    let mut infos = Vec::with_capacity(grids.len());
    let mut taken = HashSet::new();
    for grid in grids {
        let base = identifier(&grid.name);
        let mut id = base.clone();
        let mut suffix = 1;
        while !taken.insert(id.clone()) {
            id = format!("{base}_{suffix}");
            suffix += 1;
        }
        infos.push(GridInfo {
            name: grid.name.clone(),
            identifier: id,
            count: grid.len(),
            start: sensors.len(),
        });
        sensors.extend_from_slice(&grid.sensors);
    }
    (sensors, infos)
}

/// File-system safe version of a grid name.
fn identifier(name: &str) -> String {
    let id: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    if id.is_empty() { "grid".to_string() } else { id }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_normal() -> anyhow::Result<()> {
        let s = SensorPoint::new(Point::new(0.0, 0.0, 0.0), Vector::new(0.0, 0.0, 3.0));
        assert!(s.unit_normal(0)?.is_close(&Vector::new(0.0, 0.0, 1.0)));

        let s = SensorPoint::new(Point::new(f64::NAN, 0.0, 0.0), Vector::new(0.0, 0.0, 1.0));
        assert!(matches!(
            s.unit_normal(4),
            Err(RadiationError::MalformedGeometry { index: 4, .. })
        ));

        let s = SensorPoint::new(Point::new(0.0, 0.0, 0.0), Vector::new(0.0, 0.0, 0.0));
        assert!(s.unit_normal(0).is_err());
        Ok(())
    }

    #[test]
    fn test_grid_from_face() -> anyhow::Result<()> {
        let face = Face::new(vec![
            Point::new(0.0, 0.0, 0.0),
            Point::new(2.0, 0.0, 0.0),
            Point::new(2.0, 2.0, 0.0),
            Point::new(0.0, 2.0, 0.0),
        ])
        .unwrap();
        let grid = SensorGrid::from_face("roof", &face, 0.5)?;
        assert_eq!(grid.len(), 16);
        for s in &grid.sensors {
            assert!((s.area.unwrap() - 0.25).abs() < 1e-12);
            assert!(s.normal.is_close(&Vector::new(0.0, 0.0, 1.0)));
        }
        assert!(SensorGrid::from_face("roof", &face, 5.0).is_err());
        Ok(())
    }

    #[test]
    fn test_join_grids() {
        let p = SensorPoint::new(Point::new(0.0, 0.0, 0.0), Vector::new(0.0, 0.0, 1.0));
        let grids = vec![
            SensorGrid::new("south wall", vec![p; 3]),
            SensorGrid::new("roof", vec![p; 2]),
        ];
        let (sensors, infos) = join_grids(&grids);
        assert_eq!(sensors.len(), 5);
        assert_eq!(infos[0].identifier, "south_wall");
        assert_eq!(infos[1].start, 3);
        assert_eq!(infos[1].count, 2);
    }

    #[test]
    fn test_join_grids_unique_identifiers() {
        let p = SensorPoint::new(Point::new(0.0, 0.0, 0.0), Vector::new(0.0, 0.0, 1.0));
        let grids = vec![
            SensorGrid::new("a b", vec![p]),
            SensorGrid::new("a_b", vec![p]),
            SensorGrid::new("a b", vec![p]),
            SensorGrid::new("a_b_1", vec![p]),
        ];
        let (_, infos) = join_grids(&grids);
        let ids: Vec<&str> = infos.iter().map(|g| g.identifier.as_str()).collect();
        assert_eq!(ids, ["a_b", "a_b_1", "a_b_2", "a_b_1_1"]);
    }
}
