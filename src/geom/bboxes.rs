use crate::geom::EPS;
use crate::geom::point::Point;

/// Checks whether two bounding boxes overlap.
///
/// Takes min and max corners of each bbox.
/// Returns true if boxes overlap (including touching).
pub fn are_bboxes_overlapping(min1: Point, max1: Point, min2: Point, max2: Point) -> bool {
    // Boxes don't overlap if separated along any axis
    if max1.x < min2.x - EPS || min1.x > max2.x + EPS {
        return false;
    }
    if max1.y < min2.y - EPS || min1.y > max2.y + EPS {
        return false;
    }
    if max1.z < min2.z - EPS || min1.z > max2.z + EPS {
        return false;
    }
    true
}

/// Returns the (min, max) corners of the box holding all points `pts`.
///
/// For an empty slice both corners are at the origin.
pub fn bounding_box(pts: &[Point]) -> (Point, Point) {
    if pts.is_empty() {
        let origin = Point::new(0., 0., 0.);
        return (origin, origin);
    }
    let mut pmin = Point::new(f64::INFINITY, f64::INFINITY, f64::INFINITY);
    let mut pmax = Point::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY);
    for p in pts {
        pmin.x = pmin.x.min(p.x);
        pmin.y = pmin.y.min(p.y);
        pmin.z = pmin.z.min(p.z);
        pmax.x = pmax.x.max(p.x);
        pmax.y = pmax.y.max(p.y);
        pmax.z = pmax.z.max(p.z);
    }
    (pmin, pmax)
}

/// Slab test of a ray against an axis-aligned box.
///
/// Returns the parametric `(t_enter, t_exit)` interval of the ray inside the box,
/// or `None` if the ray misses it or the box lies entirely behind the origin.
pub fn ray_box_interval(
    origin: Point,
    dir: (f64, f64, f64),
    bmin: Point,
    bmax: Point,
) -> Option<(f64, f64)> {
    let mut t_enter = f64::NEG_INFINITY;
    let mut t_exit = f64::INFINITY;

    let axes = [
        (origin.x, dir.0, bmin.x, bmax.x),
        (origin.y, dir.1, bmin.y, bmax.y),
        (origin.z, dir.2, bmin.z, bmax.z),
    ];
    for (o, d, lo, hi) in axes {
        if d.abs() < EPS {
            if o < lo || o > hi {
                return None;
            }
            continue;
        }
        let t0 = (lo - o) / d;
        let t1 = (hi - o) / d;
        let (t0, t1) = if t0 < t1 { (t0, t1) } else { (t1, t0) };
        t_enter = t_enter.max(t0);
        t_exit = t_exit.min(t1);
        if t_enter > t_exit {
            return None;
        }
    }

    if t_exit < 0.0 {
        return None;
    }
    Some((t_enter.max(0.0), t_exit))
}
