//! Mesh triangle entity and its immutable derived geometric quantities.

use crate::geometry::Point;
use crate::ids::{EdgeId, NodeId, TriId};

/// A CCW-oriented triangle `(n1, n2, n3)` with edge references `e_i`
/// opposite `n_i`, and all derived quantities precomputed once at
/// creation (`area > 0` is an invariant, not re-checked downstream).
#[derive(Debug, Clone)]
pub struct Triangle {
    pub n1: NodeId,
    pub n2: NodeId,
    pub n3: NodeId,
    /// `e1` is opposite `n1` (i.e. `n2-n3`), and so on.
    pub e1: EdgeId,
    pub e2: EdgeId,
    pub e3: EdgeId,
    /// Neighbor across `e_i`; populated in the final sweep after
    /// meshing completes (`None` until then).
    pub t1: Option<TriId>,
    pub t2: Option<TriId>,
    pub t3: Option<TriId>,
    pub geom: TriGeom,
}

/// Derived quantities, computed once from the three vertex positions.
#[derive(Debug, Clone, Copy)]
pub struct TriGeom {
    pub centroid: Point,
    /// Signed area; positive for CCW (invariant).
    pub area: f64,
    /// `edge_lengths[0]` is `|n2-n3|` (opposite n1), and so on.
    pub edge_lengths: [f64; 3],
    /// Interior angle at `n1, n2, n3` respectively.
    pub angles: [f64; 3],
    pub min_angle: f64,
    pub max_angle: f64,
    pub circumcenter: Point,
    pub circumradius: f64,
    /// `(3*sqrt(3) * area) / sum(edge_length^2)`; 1 for equilateral, 0
    /// for degenerate.
    pub shape_factor: f64,
    /// Composite quality combining shape and size-weighted edge
    /// lengths; see `compute_quality`.
    pub quality: f64,
}

const SHAPE_NORM: f64 = 3.0 * 1.732_050_807_568_877_2; // 3*sqrt(3)
const SMALL: f64 = 1e-13;

/// Computes centroid, area, edge lengths, angles, and circumcircle for
/// triangle `(p, q, r)`. Does not depend on the size function; callers
/// combine this with `compute_quality` to get the full `TriGeom`.
pub fn compute_tri_geom_bare(p: Point, q: Point, r: Point) -> TriGeom {
    let centroid = Point::new((p.x + q.x + r.x) / 3.0, (p.y + q.y + r.y) / 3.0);

    let area2 = (q.x - p.x) * (r.y - p.y) - (r.x - p.x) * (q.y - p.y);
    let area = 0.5 * area2;

    let e1 = (r - q).norm(); // opposite n1
    let e2 = (p - r).norm(); // opposite n2
    let e3 = (q - p).norm(); // opposite n3
    let edge_lengths = [e1, e2, e3];

    let a1 = angle_at(p, q, r);
    let a2 = angle_at(q, p, r);
    let a3 = angle_at(r, p, q);
    let angles = [a1, a2, a3];
    let min_angle = a1.min(a2).min(a3);
    let max_angle = a1.max(a2).max(a3);

    let (circumcenter, circumradius) = circumcircle(p, q, r);

    let sum_edge2: f64 = edge_lengths.iter().map(|e| e * e).sum();
    let shape_factor = (SHAPE_NORM * area) / (sum_edge2 + SMALL);

    TriGeom {
        centroid,
        area,
        edge_lengths,
        angles,
        min_angle,
        max_angle,
        circumcenter,
        circumradius,
        shape_factor,
        quality: 0.0,
    }
}

/// Interior angle at vertex `v` of triangle `(v, a, b)`, via the law of
/// cosines on the dot product of the two incident edges.
fn angle_at(v: Point, a: Point, b: Point) -> f64 {
    let u = a - v;
    let w = b - v;
    let cos_theta = (u.dot(&w) / (u.norm() * w.norm())).clamp(-1.0, 1.0);
    cos_theta.acos()
}

/// Circumcenter and circumradius of triangle `(p, q, r)`.
fn circumcircle(p: Point, q: Point, r: Point) -> (Point, f64) {
    let bx = q.x - p.x;
    let by = q.y - p.y;
    let cx = r.x - p.x;
    let cy = r.y - p.y;
    let d = 2.0 * (bx * cy - by * cx);
    if d.abs() < SMALL {
        // Degenerate (near-colinear) triangle; callers reject these via
        // the min-angle / quality checks before trusting the
        // circumradius, so returning something finite is enough here.
        return (p, f64::INFINITY);
    }
    let ux = (cy * (bx * bx + by * by) - by * (cx * cx + cy * cy)) / d;
    let uy = (bx * (cx * cx + cy * cy) - cx * (bx * bx + by * by)) / d;
    let center = Point::new(p.x + ux, p.y + uy);
    let radius = (ux * ux + uy * uy).sqrt();
    (center, radius)
}

/// Composite quality `Q = shape_factor * prod(min(l_i/d_i, d_i/l_i))`
/// with `d_i = (rho(end_i) + rho(start_i)) / 2`, where edge `i` runs
/// `(n2,n3), (n3,n1), (n1,n2)` matching `edge_lengths`.
pub fn compute_quality(geom: &TriGeom, rho_n1: f64, rho_n2: f64, rho_n3: f64) -> f64 {
    let deltas = [
        (rho_n2 + rho_n3) / 2.0, // edge opposite n1: n2-n3
        (rho_n3 + rho_n1) / 2.0, // edge opposite n2: n3-n1
        (rho_n1 + rho_n2) / 2.0, // edge opposite n3: n1-n2
    ];
    let mut prod = 1.0;
    for (l, d) in geom.edge_lengths.iter().zip(deltas.iter()) {
        if *d <= 0.0 {
            return 0.0;
        }
        prod *= (l / d).min(d / l);
    }
    geom.shape_factor * prod
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equilateral_triangle_shape_factor_is_one() {
        let p = Point::new(0.0, 0.0);
        let q = Point::new(1.0, 0.0);
        let r = Point::new(0.5, 3f64.sqrt() / 2.0);
        let geom = compute_tri_geom_bare(p, q, r);
        assert!(geom.area > 0.0);
        assert!((geom.shape_factor - 1.0).abs() < 1e-9);
        assert!((geom.min_angle - std::f64::consts::FRAC_PI_3).abs() < 1e-9);
        assert!((geom.max_angle - std::f64::consts::FRAC_PI_3).abs() < 1e-9);
    }

    #[test]
    fn right_triangle_circumcenter_is_hypotenuse_midpoint() {
        let p = Point::new(0.0, 0.0);
        let q = Point::new(4.0, 0.0);
        let r = Point::new(0.0, 3.0);
        let geom = compute_tri_geom_bare(p, q, r);
        // Hypotenuse is q-r; circumcenter is its midpoint, radius = 2.5.
        let mid = Point::new(2.0, 1.5);
        assert!((geom.circumcenter - mid).norm() < 1e-9);
        assert!((geom.circumradius - 2.5).abs() < 1e-9);
    }

    #[test]
    fn quality_of_uniform_equilateral_is_shape_factor() {
        let p = Point::new(0.0, 0.0);
        let q = Point::new(1.0, 0.0);
        let r = Point::new(0.5, 3f64.sqrt() / 2.0);
        let geom = compute_tri_geom_bare(p, q, r);
        let q_val = compute_quality(&geom, 1.0, 1.0, 1.0);
        assert!((q_val - geom.shape_factor).abs() < 1e-9);
    }
}
