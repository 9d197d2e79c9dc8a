pub mod bboxes;
pub mod face;
pub mod mesh;
pub mod point;
pub mod ray;
pub mod vector;

/// Geometric precision
pub const EPS: f64 = 1e-13;
