//! Pure 2D geometry primitives: orientation, segment intersection,
//! point-in-bbox, edge-point distance, polygon area.
//!
//! All functions are free functions on plain coordinates; none of them
//! touch the mesh arenas.

use nalgebra::Vector2;

/// A 2D point / free vector.
pub type Point = Vector2<f64>;

/// Orientation epsilon: twice the squared signed area must exceed this
/// for three points to be considered non-colinear.
pub const EPS_ORIENT: f64 = 1e-13;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Colinear,
    Ccw,
    Cw,
}

/// Signed area of the parallelogram spanned by `(q-p)` and `(r-p)`,
/// i.e. twice the signed area of triangle `pqr`.
#[inline]
pub fn cross2(p: Point, q: Point, r: Point) -> f64 {
    let a = q - p;
    let b = r - p;
    a.x * b.y - a.y * b.x
}

/// Orientation of the ordered triple `(p,q,r)`.
///
/// `2 * area(pqr)^2 < EPS_ORIENT` is treated as colinear, where
/// `area = 0.5 * cross2(p,q,r)`.
pub fn orientation(p: Point, q: Point, r: Point) -> Orientation {
    let cross = cross2(p, q, r);
    let area = 0.5 * cross;
    if 2.0 * area * area < EPS_ORIENT {
        Orientation::Colinear
    } else if cross > 0.0 {
        Orientation::Ccw
    } else {
        Orientation::Cw
    }
}

/// True when `r` lies on the open segment `pq` (colinear and strictly
/// between the endpoints).
pub fn in_segment(p: Point, q: Point, r: Point) -> bool {
    if orientation(p, q, r) != Orientation::Colinear {
        return false;
    }
    in_on_segment(p, q, r) && (r - p).norm_squared() > 0.0 && (r - q).norm_squared() > 0.0
}

/// True when `r` lies on the closed segment `pq` (colinear and within
/// the bounding box of `p,q`); endpoints count.
pub fn in_on_segment(p: Point, q: Point, r: Point) -> bool {
    if orientation(p, q, r) != Orientation::Colinear {
        return false;
    }
    r.x >= p.x.min(q.x) && r.x <= p.x.max(q.x) && r.y >= p.y.min(q.y) && r.y <= p.y.max(q.y)
}

/// True when the open segments `p1 q1` and `p2 q2` cross, or share a
/// colinear sub-interval. False when they meet only at shared
/// endpoints.
pub fn lines_intersect(p1: Point, q1: Point, p2: Point, q2: Point) -> bool {
    let o1 = orientation(p1, q1, p2);
    let o2 = orientation(p1, q1, q2);
    let o3 = orientation(p2, q2, p1);
    let o4 = orientation(p2, q2, q1);

    if o1 != o2 && o3 != o4 {
        // General case: straddle test, but exclude touches that occur
        // exactly at a shared endpoint.
        let shares_endpoint = p1 == p2 || p1 == q2 || q1 == p2 || q1 == q2;
        if !shares_endpoint {
            return true;
        }
        // With a shared endpoint the straddle test alone can't
        // distinguish "crossing through" from "meeting at the tip";
        // fall through to the colinear machinery below, which handles
        // the non-degenerate cases correctly and rejects pure touches.
    }

    // Colinear overlap cases.
    if o1 == Orientation::Colinear && in_segment(p1, q1, p2) {
        return true;
    }
    if o2 == Orientation::Colinear && in_segment(p1, q1, q2) {
        return true;
    }
    if o3 == Orientation::Colinear && in_segment(p2, q2, p1) {
        return true;
    }
    if o4 == Orientation::Colinear && in_segment(p2, q2, q1) {
        return true;
    }

    false
}

/// Squared distance from `p` to segment `vw`, via projection clamped to
/// `[0,1]`.
pub fn edge_point_dist2(v: Point, w: Point, p: Point) -> f64 {
    let d = w - v;
    let len2 = d.norm_squared();
    if len2 <= f64::EPSILON {
        return (p - v).norm_squared();
    }
    let t = ((p - v).dot(&d) / len2).clamp(0.0, 1.0);
    let proj = v + d * t;
    (p - proj).norm_squared()
}

/// Inclusive axis-aligned bounding-box overlap test.
pub fn bbox_overlap(min1: Point, max1: Point, min2: Point, max2: Point) -> bool {
    min1.x <= max2.x && max1.x >= min2.x && min1.y <= max2.y && max1.y >= min2.y
}

/// Inclusive point-in-bbox test.
pub fn in_bbox(p: Point, min: Point, max: Point) -> bool {
    p.x >= min.x && p.x <= max.x && p.y >= min.y && p.y <= max.y
}

/// Signed polygon area via the shoelace formula; positive for CCW
/// polygons, negative for CW.
pub fn polygon_area(points: &[Point]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut area = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        area += points[i].x * points[j].y - points[j].x * points[i].y;
    }
    0.5 * area
}

/// Midpoint of `a` and `b`.
#[inline]
pub fn midpoint(a: Point, b: Point) -> Point {
    (a + b) * 0.5
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn orientation_basic_cases() {
        let p = Point::new(0.0, 0.0);
        let q = Point::new(1.0, 0.0);
        let r_ccw = Point::new(0.0, 1.0);
        let r_cw = Point::new(0.0, -1.0);
        let r_col = Point::new(2.0, 0.0);
        assert_eq!(orientation(p, q, r_ccw), Orientation::Ccw);
        assert_eq!(orientation(p, q, r_cw), Orientation::Cw);
        assert_eq!(orientation(p, q, r_col), Orientation::Colinear);
    }

    #[test]
    fn crossing_segments_intersect() {
        let p1 = Point::new(0.0, 0.0);
        let q1 = Point::new(2.0, 2.0);
        let p2 = Point::new(0.0, 2.0);
        let q2 = Point::new(2.0, 0.0);
        assert!(lines_intersect(p1, q1, p2, q2));
    }

    #[test]
    fn shared_endpoint_only_does_not_intersect() {
        let p1 = Point::new(0.0, 0.0);
        let q1 = Point::new(1.0, 0.0);
        let p2 = Point::new(1.0, 0.0);
        let q2 = Point::new(1.0, 1.0);
        assert!(!lines_intersect(p1, q1, p2, q2));
    }

    #[test]
    fn colinear_overlap_intersects() {
        let p1 = Point::new(0.0, 0.0);
        let q1 = Point::new(2.0, 0.0);
        let p2 = Point::new(1.0, 0.0);
        let q2 = Point::new(3.0, 0.0);
        assert!(lines_intersect(p1, q1, p2, q2));
    }

    #[test]
    fn colinear_disjoint_does_not_intersect() {
        let p1 = Point::new(0.0, 0.0);
        let q1 = Point::new(1.0, 0.0);
        let p2 = Point::new(2.0, 0.0);
        let q2 = Point::new(3.0, 0.0);
        assert!(!lines_intersect(p1, q1, p2, q2));
    }

    #[test]
    fn edge_point_dist_clamped() {
        let v = Point::new(0.0, 0.0);
        let w = Point::new(10.0, 0.0);
        // Beyond w: clamp to w.
        let p = Point::new(15.0, 0.0);
        assert!((edge_point_dist2(v, w, p) - 25.0).abs() < 1e-9);
        // Perpendicular midpoint.
        let mid = Point::new(5.0, 3.0);
        assert!((edge_point_dist2(v, w, mid) - 9.0).abs() < 1e-9);
    }

    #[test]
    fn square_area_is_positive_ccw() {
        let pts = [
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(0.0, 1.0),
        ];
        assert!((polygon_area(&pts) - 1.0).abs() < 1e-12);
        let rev: Vec<_> = pts.iter().rev().cloned().collect();
        assert!((polygon_area(&rev) + 1.0).abs() < 1e-12);
    }

    proptest! {
        #[test]
        fn orientation_antisymmetric(
            px in -10.0..10.0, py in -10.0..10.0,
            qx in -10.0..10.0, qy in -10.0..10.0,
            rx in -10.0..10.0, ry in -10.0..10.0,
        ) {
            let p = Point::new(px, py);
            let q = Point::new(qx, qy);
            let r = Point::new(rx, ry);
            let o_pqr = orientation(p, q, r);
            let o_prq = orientation(p, r, q);
            match o_pqr {
                Orientation::Ccw => prop_assert_eq!(o_prq, Orientation::Cw),
                Orientation::Cw => prop_assert_eq!(o_prq, Orientation::Ccw),
                Orientation::Colinear => prop_assert_eq!(o_prq, Orientation::Colinear),
            }
        }

        #[test]
        fn edge_point_dist_nonnegative(
            vx in -10.0..10.0, vy in -10.0..10.0,
            wx in -10.0..10.0, wy in -10.0..10.0,
            px in -10.0..10.0, py in -10.0..10.0,
        ) {
            let d2 = edge_point_dist2(Point::new(vx, vy), Point::new(wx, wy), Point::new(px, py));
            prop_assert!(d2 >= 0.0);
        }
    }
}
