//! Boundary model: ordered polygon, enclosure tests, segment splitting.

use crate::edge::EdgeKind;
use crate::error::{MeshError, MeshResult};
use crate::geometry::{in_on_segment, midpoint, polygon_area, Point};
use crate::ids::EdgeId;
use crate::mesh::Mesh;
use crate::quadtree::Quadtree;

/// An ordered polygon of directed boundary edges.
#[derive(Debug, Clone)]
pub struct Boundary {
    pub marker: i64,
    /// `false` for the single exterior boundary, `true` for holes.
    pub interior: bool,
    /// Ordered, forming one closed loop.
    pub edges: Vec<EdgeId>,
    pub qtree: Quadtree<EdgeId>,
}

impl Boundary {
    pub fn new(marker: i64, interior: bool, bbox_min: Point, bbox_max: Point, qtree_cap: usize) -> Self {
        Self {
            marker,
            interior,
            edges: Vec::new(),
            qtree: Quadtree::new(bbox_min, bbox_max, qtree_cap),
        }
    }
}

impl Mesh {
    /// Signed area enclosed by boundary `b`'s polygon, via its node
    /// coordinates in edge order.
    pub fn boundary_signed_area(&self, b: usize) -> f64 {
        let pts: Vec<Point> = self.boundaries[b]
            .edges
            .iter()
            .map(|&e| self.edges.get(e.0).unwrap().n1)
            .map(|n| self.nodes.get(n.0).unwrap().xy)
            .collect();
        polygon_area(&pts)
    }

    /// Validates every boundary's orientation: exterior area must be
    /// `> 0`, interior areas `< 0`. Fatal on violation.
    pub fn check_boundary_orientations(&self) -> MeshResult<()> {
        for (i, b) in self.boundaries.iter().enumerate() {
            let area = self.boundary_signed_area(i);
            let ok = if b.interior { area < 0.0 } else { area > 0.0 };
            if !ok {
                return Err(MeshError::InvalidInput {
                    detail: format!(
                        "boundary {} ({}) has signed area {area:.6}, expected {}",
                        i,
                        b.marker,
                        if b.interior { "< 0" } else { "> 0" }
                    ),
                });
            }
        }
        Ok(())
    }

    /// Ray-casting point-in-polygon test against boundary `b`: a
    /// horizontal ray from `xy` rightward, counting crossings. Points
    /// exactly on an edge are declared inside.
    pub fn boundary_contains(&self, b: usize, xy: Point) -> bool {
        let edges = &self.boundaries[b].edges;
        let mut crossings = 0usize;
        for &eid in edges {
            let edge = self.edges.get(eid.0).unwrap();
            let p1 = self.nodes.get(edge.n1.0).unwrap().xy;
            let p2 = self.nodes.get(edge.n2.0).unwrap().xy;

            if in_on_segment(p1, p2, xy) {
                return true;
            }

            let (a, c) = if p1.y <= p2.y { (p1, p2) } else { (p2, p1) };
            if xy.y < a.y || xy.y >= c.y {
                continue;
            }
            let t = (xy.y - a.y) / (c.y - a.y);
            let x_at = a.x + t * (c.x - a.x);
            if x_at > xy.x {
                crossings += 1;
            }
        }
        crossings % 2 == 1
    }

    /// `true` when `xy` is strictly inside the exterior boundary and
    /// strictly outside every interior boundary.
    pub fn object_inside(&self, xy: Point) -> bool {
        let Some(ext) = self.boundaries.iter().position(|b| !b.interior) else {
            return false;
        };
        if !self.boundary_contains(ext, xy) {
            return false;
        }
        for (i, b) in self.boundaries.iter().enumerate() {
            if b.interior && self.boundary_contains(i, xy) {
                return false;
            }
        }
        true
    }

    /// Every interior boundary's nodes must lie strictly inside the
    /// exterior boundary and strictly outside every other interior
    /// boundary before refinement starts.
    pub fn check_interior_boundaries_enclosed(&self) -> MeshResult<()> {
        let Some(ext) = self.boundaries.iter().position(|b| !b.interior) else {
            return Err(MeshError::InvalidInput {
                detail: "no exterior boundary defined".into(),
            });
        };
        for (i, b) in self.boundaries.iter().enumerate() {
            if !b.interior {
                continue;
            }
            for &eid in &b.edges {
                let n1 = self.edges.get(eid.0).unwrap().n1;
                let xy = self.nodes.get(n1.0).unwrap().xy;
                if !self.boundary_contains(ext, xy) {
                    return Err(MeshError::InvalidInput {
                        detail: format!("interior boundary {i} has a node outside the exterior boundary"),
                    });
                }
                for (j, other) in self.boundaries.iter().enumerate() {
                    if j == i || !other.interior {
                        continue;
                    }
                    if self.boundary_contains(j, xy) {
                        return Err(MeshError::InvalidInput {
                            detail: format!("interior boundaries {i} and {j} overlap"),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Splits boundary edge `e` at its midpoint: destroys `e`, creates
    /// two new boundary edges inheriting its marker and size factor,
    /// and returns the id of the first half (`n1 -> midpoint`).
    pub fn split_boundary_edge(&mut self, boundary_idx: usize, e: EdgeId) -> EdgeId {
        let old = self.edges.get(e.0).unwrap().clone();
        let p1 = self.nodes.get(old.n1.0).unwrap().xy;
        let p2 = self.nodes.get(old.n2.0).unwrap().xy;
        let mid = self.add_node(midpoint(p1, p2));

        let first = self.add_edge(EdgeKind::Boundary, old.n1, mid);
        let second = self.add_edge(EdgeKind::Boundary, mid, old.n2);
        for new_eid in [first, second] {
            let ne = self.edges.get_mut(new_eid.0).unwrap();
            ne.marker = old.marker;
            ne.size_factor = old.size_factor;
        }

        let pos = self.boundaries[boundary_idx]
            .edges
            .iter()
            .position(|&x| x == e)
            .expect("split_boundary_edge: e not in boundary_idx");
        self.remove_boundary_edge(boundary_idx, e);
        // Splice the two halves in at the original edge's position so
        // the polygon's cyclic order is preserved.
        let edges = &mut self.boundaries[boundary_idx].edges;
        edges.insert(pos, second);
        edges.insert(pos, first);
        self.boundaries[boundary_idx].qtree.insert(first, midpoint(p1, mid));
        self.boundaries[boundary_idx].qtree.insert(second, midpoint(mid, p2));
        first
    }

    /// Removes `e` from boundary `boundary_idx`'s edge list and from
    /// the mesh's arena/quadtree/adjacency bookkeeping. Used only as
    /// part of `split_boundary_edge`.
    fn remove_boundary_edge(&mut self, boundary_idx: usize, e: EdgeId) {
        let edge = self.edges.get(e.0).unwrap().clone();
        self.detach_edge(e, edge.n1, edge.n2, edge.kind);
        self.boundaries[boundary_idx].qtree.remove(e);
        self.edges.remove(e.0);
        let edges = &mut self.boundaries[boundary_idx].edges;
        if let Some(pos) = edges.iter().position(|&x| x == e) {
            edges.remove(pos);
        }
    }
}
