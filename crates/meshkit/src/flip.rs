//! Local-Delaunay edge-flip repair pass (§4.J).

use crate::edge::EdgeKind;
use crate::error::MeshError;
use crate::ids::{EdgeId, NodeId, TriId};
use crate::mesh::Mesh;

/// Cap on total flips as a multiple of `|edges|^2`; a pass that would
/// exceed this is logged and abandoned rather than looping forever on
/// a degenerate configuration.
const MAX_FLIP_MULTIPLIER: usize = 1;

impl Mesh {
    fn opposite_vertex(&self, t: TriId, e: EdgeId) -> Option<NodeId> {
        let tri = self.tris.get(t.0)?;
        if tri.e1 == e {
            Some(tri.n1)
        } else if tri.e2 == e {
            Some(tri.n2)
        } else if tri.e3 == e {
            Some(tri.n3)
        } else {
            None
        }
    }

    /// Edge of triangle `t` connecting `a` and `b`, excluding `skip`.
    fn tri_edge_between(&self, t: TriId, a: NodeId, b: NodeId) -> Option<EdgeId> {
        let tri = self.tris.get(t.0)?;
        for &e in &[tri.e1, tri.e2, tri.e3] {
            let edge = self.edges.get(e.0)?;
            let ends = (edge.n1, edge.n2);
            if (ends == (a, b)) || (ends == (b, a)) {
                return Some(e);
            }
        }
        None
    }

    /// `true` for boundary-adjacent edges (either side null) and for
    /// internal edges where neither opposing vertex lies strictly
    /// inside the other triangle's circumcircle.
    pub fn edge_is_locally_delaunay(&self, e: EdgeId) -> bool {
        let edge = match self.edges.get(e.0) {
            Some(edge) => edge,
            None => return true,
        };
        let (Some(t_left), Some(t_right)) = (edge.t1, edge.t2) else {
            return true;
        };
        let Some(p_left) = self.opposite_vertex(t_left, e) else {
            return true;
        };
        let Some(p_right) = self.opposite_vertex(t_right, e) else {
            return true;
        };

        let left_geom = self.tris.get(t_left.0).unwrap().geom;
        let right_geom = self.tris.get(t_right.0).unwrap().geom;

        let p_right_xy = self.node_xy(p_right);
        let p_left_xy = self.node_xy(p_left);

        let p_right_outside_left_circle = (p_right_xy - left_geom.circumcenter).norm() >= left_geom.circumradius - 1e-12;
        let p_left_outside_right_circle = (p_left_xy - right_geom.circumcenter).norm() >= right_geom.circumradius - 1e-12;

        p_right_outside_left_circle && p_left_outside_right_circle
    }

    /// Flips edge `e = (n1, n2)` whose left/right triangles have
    /// opposite vertices `p2`/`p1`: destroys both old triangles and
    /// `e`, creates `(n1,p1,p2)` and `(n2,p2,p1)` with a new edge
    /// `(p1,p2)` between them, and reassigns the four surrounding
    /// edges' triangle pointers.
    fn flip_edge(&mut self, e: EdgeId) {
        let (n1, n2, t_left, t_right) = {
            let edge = self.edges.get(e.0).unwrap();
            let (Some(tl), Some(tr)) = (edge.t1, edge.t2) else {
                return;
            };
            (edge.n1, edge.n2, tl, tr)
        };
        let Some(p2) = self.opposite_vertex(t_left, e) else {
            let err = MeshError::GeometryDegenerate {
                detail: "flip: missing opposite vertex on left triangle".into(),
            };
            tracing::warn!(%err, "skipping flip");
            return;
        };
        let Some(p1) = self.opposite_vertex(t_right, e) else {
            let err = MeshError::GeometryDegenerate {
                detail: "flip: missing opposite vertex on right triangle".into(),
            };
            tracing::warn!(%err, "skipping flip");
            return;
        };

        let Some(e_n1_p2) = self.tri_edge_between(t_left, n1, p2) else {
            return;
        };
        let Some(e_n2_p2) = self.tri_edge_between(t_left, n2, p2) else {
            return;
        };
        let Some(e_n1_p1) = self.tri_edge_between(t_right, n1, p1) else {
            return;
        };
        let Some(e_n2_p1) = self.tri_edge_between(t_right, n2, p1) else {
            return;
        };

        self.destroy_triangle(t_left);
        self.destroy_triangle(t_right);
        self.destroy_edge(e);

        let new_edge = self.add_edge(EdgeKind::Mesh, p1, p2);

        let tri_a = self.add_triangle(n1, p1, p2, new_edge, e_n1_p2, e_n1_p1);
        let tri_b = self.add_triangle(n2, p2, p1, new_edge, e_n2_p1, e_n2_p2);

        self.reassign_neighbor(new_edge, tri_a, tri_b);
        self.reassign_neighbor(e_n1_p2, t_left, tri_a);
        self.reassign_neighbor(e_n2_p2, t_left, tri_b);
        self.reassign_neighbor(e_n1_p1, t_right, tri_a);
        self.reassign_neighbor(e_n2_p1, t_right, tri_b);

        for surrounding in [e_n1_p2, e_n2_p2, e_n1_p1, e_n2_p1] {
            self.flip_stack.push(surrounding);
        }
    }

    /// Replaces `old` with `new` wherever an edge's `t1`/`t2` pointed
    /// at the since-destroyed `old` triangle.
    fn reassign_neighbor(&mut self, e: EdgeId, old: TriId, new: TriId) {
        if let Some(edge) = self.edges.get_mut(e.0) {
            if edge.t1 == Some(old) {
                edge.t1 = Some(new);
            } else if edge.t2 == Some(old) {
                edge.t2 = Some(new);
            } else if edge.t1.is_none() {
                edge.t1 = Some(new);
            } else if edge.t2.is_none() {
                edge.t2 = Some(new);
            }
        }
    }

    /// Drains `flip_stack`, flipping every edge found not locally
    /// Delaunay, re-queuing the four edges around each flip, up to
    /// `|edges|^2` total flips.
    pub fn run_delaunay_flip_pass(&mut self) {
        let cap = self.edges.len().pow(2).max(1) * MAX_FLIP_MULTIPLIER;
        let mut performed = 0usize;

        while let Some(e) = self.flip_stack.pop() {
            if !self.edges.contains(e.0) {
                continue;
            }
            let delaunay = self.edge_is_locally_delaunay(e);
            if let Some(edge) = self.edges.get_mut(e.0) {
                edge.locally_delaunay = delaunay;
            }
            if delaunay {
                continue;
            }
            if performed >= cap {
                tracing::warn!(cap, "delaunay flip pass hit its flip cap; stopping early");
                break;
            }
            self.flip_edge(e);
            performed += 1;
        }
    }
}
