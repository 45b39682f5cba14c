//! The advancing front: the set of currently unpaired edges separating
//! meshed from unmeshed territory, kept sorted by length so the driver
//! always attacks the shortest live edge first.

use crate::edge::EdgeKind;
use crate::error::{MeshError, MeshResult};
use crate::geometry::{orientation, Orientation, Point};
use crate::ids::{EdgeId, NodeId, TriId};
use crate::mesh::Mesh;
use crate::quadtree::Quadtree;

#[derive(Debug)]
pub struct Front {
    /// Length-ascending order; the driver's cursor walks this list.
    pub edges: Vec<EdgeId>,
    pub qtree: Quadtree<EdgeId>,
    /// Index into `edges` the driver is currently attacking.
    pub cursor: usize,
}

impl Front {
    pub fn new(bbox_min: Point, bbox_max: Point, qtree_cap: usize) -> Self {
        Self {
            edges: Vec::new(),
            qtree: Quadtree::new(bbox_min, bbox_max, qtree_cap),
            cursor: 0,
        }
    }

    pub fn remove_edge(&mut self, e: EdgeId) {
        if let Some(pos) = self.edges.iter().position(|&x| x == e) {
            self.edges.remove(pos);
            if self.cursor > pos {
                self.cursor -= 1;
            }
        }
        self.qtree.remove(e);
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

impl Mesh {
    fn edge_length(&self, e: EdgeId) -> f64 {
        let edge = self.edges.get(e.0).unwrap();
        (self.node_xy(edge.n2) - self.node_xy(edge.n1)).norm()
    }

    fn edge_centroid(&self, e: EdgeId) -> Point {
        let edge = self.edges.get(e.0).unwrap();
        crate::geometry::midpoint(self.node_xy(edge.n1), self.node_xy(edge.n2))
    }

    /// Unit tangent `n2 - n1`, normalized.
    fn edge_tangent(&self, e: EdgeId) -> Point {
        let edge = self.edges.get(e.0).unwrap();
        (self.node_xy(edge.n2) - self.node_xy(edge.n1)).normalize()
    }

    /// Inward unit normal: 90 degrees CCW from the tangent, pointing to
    /// the left of `n1 -> n2`.
    pub fn edge_normal(&self, e: EdgeId) -> Point {
        let t = self.edge_tangent(e);
        Point::new(-t.y, t.x)
    }

    /// Clones every boundary edge as a front edge in the same endpoint
    /// order, with no left triangle and a null right triangle, then
    /// sorts the front by length ascending (stable).
    pub fn initialize_front(&mut self) {
        let boundary_edges: Vec<(NodeId, NodeId, Option<i64>, f64)> = self
            .boundaries
            .iter()
            .flat_map(|b| b.edges.iter())
            .map(|&e| {
                let edge = self.edges.get(e.0).unwrap();
                (edge.n1, edge.n2, edge.marker, edge.size_factor)
            })
            .collect();

        for (n1, n2, marker, size_factor) in boundary_edges {
            let id = self.add_edge(EdgeKind::Front, n1, n2);
            let e = self.edges.get_mut(id.0).unwrap();
            e.marker = marker;
            e.size_factor = size_factor;
        }
        self.sort_front_by_length();
    }

    /// Subdivides front edges until each edge's length is `<=
    /// REFINE_FAC * (rho(n1) + rho(midpoint))`, the same rule as
    /// `refine_boundaries` but applied to the front's own edge copies
    /// (the original separates these into two passes: one over the
    /// input boundary polygon, one over the front edges cloned from
    /// it). Must run before any triangle is accepted, while every
    /// front edge is still fully open (`t1 = t2 = None`).
    pub fn refine_front(&mut self) -> crate::error::MeshResult<()> {
        const REFINE_FAC: f64 = 1.0;
        loop {
            let mut did_split = false;
            let mut i = 0;
            while i < self.front.edges.len() {
                let eid = self.front.edges[i];
                let edge = self.edges.get(eid.0).unwrap().clone();
                let p1 = self.node_xy(edge.n1);
                let p2 = self.node_xy(edge.n2);
                let mid = crate::geometry::midpoint(p1, p2);

                let rho_n1 = self.check_rho(p1)?;
                let rho_mid = self.check_rho(mid)?;
                let target = REFINE_FAC * (rho_n1 + rho_mid);
                let len = (p2 - p1).norm();

                if len > target {
                    self.split_front_edge(i, eid);
                    did_split = true;
                    // `i` now indexes the first new half; revisit it.
                } else {
                    i += 1;
                }
            }
            if !did_split {
                break;
            }
        }
        Ok(())
    }

    /// Splits front edge `e`, currently at position `pos` in
    /// `front.edges`, at its midpoint: destroys `e` and creates two
    /// new front edges inheriting its marker and size factor, spliced
    /// back in at `pos` so the walk can continue from the first new
    /// half. Valid only while `e` is still fully open.
    fn split_front_edge(&mut self, pos: usize, e: EdgeId) {
        let old = self.edges.get(e.0).unwrap().clone();
        let p1 = self.node_xy(old.n1);
        let p2 = self.node_xy(old.n2);
        let mid = self.add_node(crate::geometry::midpoint(p1, p2));

        self.destroy_edge(e);

        let first = self.add_edge(EdgeKind::Front, old.n1, mid);
        let second = self.add_edge(EdgeKind::Front, mid, old.n2);
        for id in [first, second] {
            let ne = self.edges.get_mut(id.0).unwrap();
            ne.marker = old.marker;
            ne.size_factor = old.size_factor;
        }

        // add_edge appended both halves at the list's tail; move them
        // back to where the split edge used to sit.
        self.front.edges.retain(|&x| x != first && x != second);
        self.front.edges.insert(pos, second);
        self.front.edges.insert(pos, first);
    }

    /// Stable sort of `front.edges` by length ascending; resets the
    /// cursor to the head (§4.G).
    pub fn sort_front_by_length(&mut self) {
        let mut edges = std::mem::take(&mut self.front.edges);
        edges.sort_by(|&a, &b| {
            self.edge_length(a)
                .partial_cmp(&self.edge_length(b))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        self.front.edges = edges;
        self.front.cursor = 0;
    }

    /// Candidate apex offset from front edge `e`: its centroid,
    /// displaced along the inward normal by `1.25 * rho(centroid)`.
    pub fn apex_candidate(&self, e: EdgeId) -> Point {
        let c = self.edge_centroid(e);
        let r = self.rho(c);
        let n = self.edge_normal(e);
        Point::new(c.x + 1.25 * r * n.x, c.y + 1.25 * r * n.y)
    }

    /// §4.H `update`: commits the triangle built on base edge `e` and
    /// apex `c` (already validated by the caller). Reuses front edges
    /// already running between `c` and `e`'s endpoints, promoting them
    /// to mesh edges; creates new front edges for whichever side has
    /// none yet.
    pub fn update_front(&mut self, c: NodeId, e: EdgeId) -> TriId {
        let (en1, en2) = {
            let edge = self.edges.get(e.0).unwrap();
            (edge.n1, edge.n2)
        };

        let ea = self.front_edge_between(en1, c);
        let eb = self.front_edge_between(en2, c);
        let ea_final = ea.unwrap_or_else(|| self.add_edge(EdgeKind::Front, en1, c));
        let eb_final = eb.unwrap_or_else(|| self.add_edge(EdgeKind::Front, en2, c));

        // Triangle (en1, en2, c): e_i opposite n_i, so the edge
        // opposite en1 is (en2,c) = eb_final, opposite en2 is (en1,c)
        // = ea_final, and opposite c is e itself.
        let t = self.add_triangle(en1, en2, c, eb_final, ea_final, e);

        for (existed, side_edge) in [(ea.is_some(), ea_final), (eb.is_some(), eb_final)] {
            if existed {
                self.set_tri_side(side_edge, t);
                self.reclassify_edge(side_edge, EdgeKind::Mesh);
                self.flag_edge_for_delaunay_check(side_edge);
            } else {
                self.edges.get_mut(side_edge.0).unwrap().t2 = Some(t);
            }
        }

        // Promote e itself: t becomes its left side, carrying whatever
        // right-triangle it already had (null until a neighboring
        // advance fills it in).
        self.edges.get_mut(e.0).unwrap().t1 = Some(t);
        self.reclassify_edge(e, EdgeKind::Mesh);
        self.flag_edge_for_delaunay_check(e);

        self.sort_front_by_length();
        t
    }

    fn set_tri_side(&mut self, e: EdgeId, t: TriId) {
        let edge = self.edges.get_mut(e.0).unwrap();
        if edge.t2.is_none() {
            edge.t2 = Some(t);
        } else {
            edge.t1 = Some(t);
        }
    }

    fn flag_edge_for_delaunay_check(&mut self, e: EdgeId) {
        if self.edges.get(e.0).map(|ed| ed.is_internal()).unwrap_or(false) {
            self.flip_stack.push(e);
        }
    }

    /// §4.H main loop: repeatedly attacks the front's current head,
    /// trying Stage 1 (reuse a nearby front vertex) then Stage 2
    /// (introduce a new vertex), advancing the cursor on failure and
    /// resetting to the head on acceptance. Exits when a full sweep
    /// with no acceptance completes, or the front empties.
    pub fn run_advancing_front(&mut self) -> MeshResult<()> {
        let total_area = self.total_boundary_area();
        if total_area <= 0.0 {
            return Err(MeshError::InvalidInput {
                detail: format!("boundary area must be positive, got {total_area}"),
            });
        }
        let mut failed = 0usize;
        let mut last_decile = 0i64;

        while failed < self.front.len() && !self.front.is_empty() {
            let progress = (100.0 * self.total_triangle_area() / total_area) as i64;
            let decile = progress / 10;
            if decile > last_decile {
                last_decile = decile;
                tracing::info!(percent = progress, "advancing front progress");
            }

            let e = self.front.edges[self.front.cursor];
            if self.try_advance_edge(e) {
                self.front.cursor = 0;
                failed = 0;
            } else {
                self.front.cursor = (self.front.cursor + 1) % self.front.len().max(1);
                failed += 1;
            }
        }

        if !self.front.is_empty() {
            return Err(MeshError::FrontStalled {
                remaining: self.front.len(),
            });
        }
        Ok(())
    }

    /// One attempt to advance base edge `e`: Stage 1 then Stage 2.
    /// Returns `true` on acceptance.
    fn try_advance_edge(&mut self, e: EdgeId) -> bool {
        let (en1, en2) = {
            let edge = self.edges.get(e.0).unwrap();
            (edge.n1, edge.n2)
        };
        let p_new = self.apex_candidate(e);
        let r = self.rho(p_new);

        // Stage 1: reuse a nearby committed front vertex.
        let mut candidates = self.node_qtree.query_disk(p_new, 0.9 * r);
        candidates.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

        let p1 = self.node_xy(en1);
        let p2 = self.node_xy(en2);
        for (c, _) in candidates {
            if c == en1 || c == en2 {
                continue;
            }
            let node = self.nodes.get(c.0).unwrap();
            if !node.is_on_front() {
                continue;
            }
            let pc = node.xy;
            if matches!(orientation(p1, p2, pc), Orientation::Colinear) {
                continue;
            }
            if self.triangle_is_valid(en1, en2, c) {
                self.update_front(c, e);
                return true;
            }
        }

        // Stage 2: introduce a new vertex at p_new.
        if self.node_is_valid(p_new) && self.triangle_is_valid_with_provisional_apex(en1, en2, p_new) {
            let c = self.add_node(p_new);
            self.update_front(c, e);
            return true;
        }

        false
    }
}
