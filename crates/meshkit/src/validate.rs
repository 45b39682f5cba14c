//! Node and triangle validity checks (§4.I): the gate every advancing
//! front candidate must pass before it is committed.

use crate::geometry::{edge_point_dist2, in_segment, lines_intersect, orientation, Orientation, Point};
use crate::ids::{EdgeId, NodeId, TriId};
use crate::mesh::Mesh;

/// Broad-phase quadtree queries are padded past the exact radius
/// because objects are indexed by a representative point (an edge's
/// centroid, not its nearest point); the padding absorbs half the
/// longest edge we expect to meet near the query point.
const QUERY_PAD_FACTOR: f64 = 2.0;

impl Mesh {
    /// A Stage-2 apex candidate `p` is valid when it lies strictly
    /// inside the domain and keeps distance `> (0.4 * rho(p))^2` from
    /// every boundary edge, front edge, and node within `rho(p)`.
    pub fn node_is_valid(&self, p: Point) -> bool {
        if !self.object_inside(p) {
            return false;
        }
        let r = self.rho(p);
        let thresh2 = (0.4 * r).powi(2);
        let query_r = r * QUERY_PAD_FACTOR;

        for b in &self.boundaries {
            for (eid, _) in b.qtree.query_disk(p, query_r) {
                if self.edge_point_dist2(eid, p) <= thresh2 {
                    return false;
                }
            }
        }
        for (eid, _) in self.front.qtree.query_disk(p, query_r) {
            if self.edge_point_dist2(eid, p) <= thresh2 {
                return false;
            }
        }
        for (nid, d2) in self.node_qtree.query_disk(p, r) {
            let _ = nid;
            if d2 <= thresh2 {
                return false;
            }
        }
        true
    }

    fn edge_point_dist2(&self, e: EdgeId, p: Point) -> f64 {
        let edge = self.edges.get(e.0).unwrap();
        edge_point_dist2(self.node_xy(edge.n1), self.node_xy(edge.n2), p)
    }

    /// Validates candidate triangle `(a,b,c)` (already-committed nodes)
    /// against every rule in §4.I.2-6.
    pub fn triangle_is_valid(&self, a: NodeId, b: NodeId, c: NodeId) -> bool {
        self.triangle_points_valid(self.node_xy(a), self.node_xy(b), self.node_xy(c), &[a, b, c])
    }

    /// Validates a candidate triangle built on two committed nodes
    /// `e.n1, e.n2` and a not-yet-committed apex `p_new` (Stage 2):
    /// the same rule set, with no node id to exclude for the apex
    /// since it is not registered in any adjacency list or quadtree
    /// yet.
    pub fn triangle_is_valid_with_provisional_apex(&self, a: NodeId, b: NodeId, p_new: Point) -> bool {
        self.triangle_points_valid(self.node_xy(a), self.node_xy(b), p_new, &[a, b])
    }

    fn triangle_points_valid(&self, pa: Point, pb: Point, pc: Point, exclude: &[NodeId]) -> bool {
        if orientation(pa, pb, pc) != Orientation::Ccw {
            return false;
        }

        let geom = crate::triangle::compute_tri_geom_bare(pa, pb, pc);
        if !self.object_inside(geom.centroid) {
            return false;
        }

        if geom.min_angle <= 10f64.to_radians() || geom.max_angle >= 170f64.to_radians() {
            return false;
        }

        let search_r = 1.5 * geom.circumradius;
        if !search_r.is_finite() {
            return false;
        }

        for (other, _) in self.tri_qtree.query_disk(geom.centroid, search_r) {
            if !self.triangle_noncrossing(pa, pb, pc, other) {
                return false;
            }
        }

        let r_centroid = self.rho(geom.centroid);
        for (nid, _) in self.node_qtree.query_disk(geom.centroid, search_r) {
            if exclude.contains(&nid) {
                continue;
            }
            let node = self.nodes.get(nid.0).unwrap();
            if !node.active || !node.is_on_front() {
                continue;
            }
            let p = node.xy;
            if point_in_triangle(p, pa, pb, pc) {
                return false;
            }
            let thresh2 = (0.4 * r_centroid).powi(2);
            for (v, w) in [(pa, pb), (pb, pc), (pc, pa)] {
                if edge_point_dist2(v, w, p) <= thresh2 {
                    return false;
                }
            }
        }

        let rho_a = self.rho(pa);
        let rho_b = self.rho(pb);
        let rho_c = self.rho(pc);
        let quality = crate::triangle::compute_quality(&geom, rho_a, rho_b, rho_c);
        quality > 0.05
    }

    /// `false` when candidate `(pa,pb,pc)` properly crosses triangle
    /// `other`'s edges.
    fn triangle_noncrossing(&self, pa: Point, pb: Point, pc: Point, other: TriId) -> bool {
        let Some(tri) = self.tris.get(other.0) else {
            return true;
        };
        let op = [self.node_xy(tri.n1), self.node_xy(tri.n2), self.node_xy(tri.n3)];
        let np = [pa, pb, pc];
        if op == np {
            return true; // same triangle (degenerate self-hit from the qtree)
        }
        for i in 0..3 {
            let (p1, q1) = (np[i], np[(i + 1) % 3]);
            for j in 0..3 {
                let (p2, q2) = (op[j], op[(j + 1) % 3]);
                if lines_intersect(p1, q1, p2, q2) {
                    return false;
                }
            }
        }
        true
    }
}

/// `true` when `p` lies strictly inside triangle `(a,b,c)` (CCW).
fn point_in_triangle(p: Point, a: Point, b: Point, c: Point) -> bool {
    let o1 = orientation(a, b, p);
    let o2 = orientation(b, c, p);
    let o3 = orientation(c, a, p);
    matches!(o1, Orientation::Ccw) && matches!(o2, Orientation::Ccw) && matches!(o3, Orientation::Ccw)
        && !in_segment(a, b, p)
        && !in_segment(b, c, p)
        && !in_segment(c, a, p)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_in_triangle_detects_center() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(2.0, 0.0);
        let c = Point::new(0.0, 2.0);
        assert!(point_in_triangle(Point::new(0.5, 0.5), a, b, c));
        assert!(!point_in_triangle(Point::new(5.0, 5.0), a, b, c));
    }
}
