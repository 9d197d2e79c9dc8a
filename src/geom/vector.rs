use crate::Point;
use crate::geom::EPS;
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vector {
    pub dx: f64,
    pub dy: f64,
    pub dz: f64,
}

impl Vector {
    pub fn new(dx: f64, dy: f64, dz: f64) -> Self {
        Self { dx, dy, dz }
    }

    pub fn from_points(beg: Point, end: Point) -> Self {
        Self {
            dx: end.x - beg.x,
            dy: end.y - beg.y,
            dz: end.z - beg.z,
        }
    }

    /// Unit vector from altitude and azimuth angles given in degrees.
    ///
    /// Azimuth is measured clockwise from north (+Y) toward east (+X).
    pub fn from_altitude_azimuth(altitude: f64, azimuth: f64) -> Self {
        let alt = altitude.to_radians();
        let azi = azimuth.to_radians();
        Self::new(alt.cos() * azi.sin(), alt.cos() * azi.cos(), alt.sin())
    }

    /// Cross product between 2 vectors.
    pub fn cross(self, other: Self) -> Self {
        Self {
            dx: self.dy * other.dz - self.dz * other.dy,
            dy: self.dz * other.dx - self.dx * other.dz,
            dz: self.dx * other.dy - self.dy * other.dx,
        }
    }

    /// Dot product between 2 vectors.
    pub fn dot(self, other: Self) -> f64 {
        self.dx * other.dx + self.dy * other.dy + self.dz * other.dz
    }

    /// Returns the length of the vector.
    pub fn length(&self) -> f64 {
        (self.dx.powi(2) + self.dy.powi(2) + self.dz.powi(2)).sqrt()
    }

    pub fn is_close(&self, other: &Self) -> bool {
        (self.dx - other.dx).abs() < EPS
            && (self.dy - other.dy).abs() < EPS
            && (self.dz - other.dz).abs() < EPS
    }

    pub fn is_finite(&self) -> bool {
        self.dx.is_finite() && self.dy.is_finite() && self.dz.is_finite()
    }

    /// Normalizes the vector (divides by its length) and returns a copy.
    pub fn normalize(&self) -> Option<Self> {
        let len = self.length();
        if len < EPS || !len.is_finite() {
            None
        } else {
            Some(Self {
                dx: self.dx / len,
                dy: self.dy / len,
                dz: self.dz / len,
            })
        }
    }

    /// Rotates the vector around the Z axis by `angle` radians (counter-clockwise).
    pub fn rotate_xy(&self, angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        Self {
            dx: self.dx * c - self.dy * s,
            dy: self.dx * s + self.dy * c,
            dz: self.dz,
        }
    }

    /// Calculates vector normal to the surface defined with 3 points.
    ///
    /// Returns None for collinear points.
    pub fn normal(pt0: Point, pt1: Point, pt2: Point) -> Option<Self> {
        let v01 = Self::from_points(pt0, pt1);
        let v02 = Self::from_points(pt0, pt2);
        v01.cross(v02).normalize()
    }
}

impl fmt::Display for Vector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prec = f.precision().unwrap_or(2); // Default 2 decimals
        write!(
            f,
            "Vector({:.prec$}, {:.prec$}, {:.prec$})",
            self.dx,
            self.dy,
            self.dz,
            prec = prec
        )
    }
}

impl Add for Vector {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self {
            dx: self.dx + other.dx,
            dy: self.dy + other.dy,
            dz: self.dz + other.dz,
        }
    }
}

impl Sub for Vector {
    type Output = Self;
    fn sub(self, other: Self) -> Self {
        Self {
            dx: self.dx - other.dx,
            dy: self.dy - other.dy,
            dz: self.dz - other.dz,
        }
    }
}

impl Mul<f64> for Vector {
    type Output = Self;
    fn mul(self, other: f64) -> Self {
        Self {
            dx: self.dx * other,
            dy: self.dy * other,
            dz: self.dz * other,
        }
    }
}

impl Neg for Vector {
    type Output = Self;
    fn neg(self) -> Self {
        Self {
            dx: -self.dx,
            dy: -self.dy,
            dz: -self.dz,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_points() {
        let p0 = Point::new(1., 1., 1.);
        let p1 = Point::new(0., 0., 0.);
        let va = Vector::from_points(p0, p1);
        let vb = Vector::from_points(p1, p0);
        assert_eq!(va, vb * -1.);
        assert_eq!(va, -vb);
    }

    #[test]
    fn test_cross() {
        let vx = Vector::new(1., 0., 0.);
        let vy = Vector::new(0., 1., 0.);
        let v_cross = vx.cross(vy);
        assert_eq!(v_cross, Vector::new(0., 0., 1.));
        assert_eq!(v_cross.length(), 1.);
    }

    #[test]
    fn test_normalize() {
        let v = Vector::new(9., 0., 0.);
        assert_eq!(v.normalize(), Some(Vector::new(1., 0., 0.)));
        assert!(Vector::new(0., 0., 0.).normalize().is_none());
        assert!(Vector::new(f64::NAN, 0., 0.).normalize().is_none());
    }

    #[test]
    fn test_altitude_azimuth() {
        let zenith = Vector::from_altitude_azimuth(90., 0.);
        assert!((zenith.dz - 1.).abs() < 1e-12);
        let east = Vector::from_altitude_azimuth(0., 90.);
        assert!((east.dx - 1.).abs() < 1e-12);
        assert!(east.dy.abs() < 1e-12);
        let south = Vector::from_altitude_azimuth(0., 180.);
        assert!((south.dy + 1.).abs() < 1e-12);
    }

    #[test]
    fn test_rotate_xy() {
        let v = Vector::new(1., 0., 0.5);
        let r = v.rotate_xy(std::f64::consts::FRAC_PI_2);
        assert!(r.dx.abs() < 1e-12);
        assert!((r.dy - 1.).abs() < 1e-12);
        assert_eq!(r.dz, 0.5);
    }

    #[test]
    fn test_normal() {
        let vn = Vector::normal(
            Point::new(1., 0., 0.),
            Point::new(1., 1., 0.),
            Point::new(0., 1., 0.),
        );
        assert!(vn.is_some_and(|v| v.is_close(&Vector::new(0., 0., 1.))));
        let collinear = Vector::normal(
            Point::new(0., 0., 0.),
            Point::new(1., 0., 0.),
            Point::new(2., 0., 0.),
        );
        assert!(collinear.is_none());
    }
}
