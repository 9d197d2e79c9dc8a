//! Ray casting infrastructure.
//!
//! This module provides a Ray struct and ray-triangle intersection tests
//! used for occlusion queries between sensors and dome patches.

use crate::{Point, Vector};

/// Rays closer than this to their origin do not count as hits.
pub const T_MIN: f64 = 1e-9;

/// A ray defined by an origin point and a direction vector.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    /// Origin point of the ray
    pub origin: Point,
    /// Unit direction vector
    pub direction: Vector,
}

impl Ray {
    /// Creates a new ray from origin point and direction vector.
    ///
    /// The direction vector is automatically normalized.
    pub fn new(origin: Point, direction: Vector) -> Option<Self> {
        let normalized = direction.normalize()?;
        Some(Self {
            origin,
            direction: normalized,
        })
    }

    /// Returns the point along the ray at parameter t.
    ///
    /// point = origin + t * direction
    pub fn point_at(&self, t: f64) -> Point {
        self.origin + self.direction * t
    }

    /// Intersects the ray with the triangle `(v0, v0 + e1, v0 + e2)`.
    ///
    /// Uses the Moller-Trumbore algorithm with precomputed edges.
    /// Returns the ray parameter `t > T_MIN` of the hit, if any.
    /// Hits exactly on an edge or vertex are reported.
    pub fn intersect_triangle(&self, v0: Point, e1: Vector, e2: Vector) -> Option<f64> {
        let p = self.direction.cross(e2);
        let det = e1.dot(p);
        if det.abs() < 1e-14 {
            return None; // Ray parallel to the triangle plane
        }
        let inv_det = 1.0 / det;

        let s = self.origin - v0;
        let u = s.dot(p) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(e1);
        let v = self.direction.dot(q) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = e2.dot(q) * inv_det;
        if t > T_MIN { Some(t) } else { None }
    }
}
