//! Mesh store: the root container owning every entity arena, the three
//! global quadtrees, the boundary list, the front, and the size
//! function. Other modules add `impl Mesh` blocks for their concern
//! (boundary, front, refine, validate, flip) rather than each owning a
//! separate top-level type, mirroring the original single `tmMesh`
//! registry that every operation threads through.

use crate::boundary::Boundary;
use crate::edge::{Edge, EdgeKind};
use crate::error::MeshResult;
use crate::front::Front;
use crate::geometry::Point;
use crate::ids::{Arena, EdgeId, NodeId, TriId};
use crate::node::Node;
use crate::quadtree::Quadtree;
use crate::size_fn::SizeFn;
use crate::triangle::{compute_tri_geom_bare, Triangle};

/// Default quadtree leaf capacity (§6, `Number of quadtree elements:`).
pub const DEFAULT_QTREE_CAP: usize = 100;

pub struct Mesh {
    pub bbox_min: Point,
    pub bbox_max: Point,
    pub size_fn: SizeFn,
    pub qtree_cap: usize,

    pub boundaries: Vec<Boundary>,
    pub front: Front,

    pub nodes: Arena<Node>,
    pub edges: Arena<Edge>,
    pub tris: Arena<Triangle>,

    pub node_qtree: Quadtree<NodeId>,
    pub edge_qtree: Quadtree<EdgeId>,
    pub tri_qtree: Quadtree<TriId>,

    /// Mesh edges currently flagged not locally Delaunay, awaiting the
    /// flip pass.
    pub flip_stack: Vec<EdgeId>,
}

impl Mesh {
    pub fn new(bbox_min: Point, bbox_max: Point, size_fn: SizeFn, qtree_cap: usize) -> Self {
        Self {
            bbox_min,
            bbox_max,
            size_fn,
            qtree_cap,
            boundaries: Vec::new(),
            front: Front::new(bbox_min, bbox_max, qtree_cap),
            nodes: Arena::new(),
            edges: Arena::new(),
            tris: Arena::new(),
            node_qtree: Quadtree::new(bbox_min, bbox_max, qtree_cap),
            edge_qtree: Quadtree::new(bbox_min, bbox_max, qtree_cap),
            tri_qtree: Quadtree::new(bbox_min, bbox_max, qtree_cap),
            flip_stack: Vec::new(),
        }
    }

    pub fn rho(&self, p: Point) -> f64 {
        self.size_fn.rho(p)
    }

    pub fn check_rho(&self, p: Point) -> MeshResult<f64> {
        self.size_fn.check_rho(p)
    }

    /// Registers a new boundary (built by the caller via
    /// `Boundary::new` and populated with edges) and returns its index.
    pub fn add_boundary(&mut self, b: Boundary) -> usize {
        self.boundaries.push(b);
        self.boundaries.len() - 1
    }

    pub fn add_node(&mut self, xy: Point) -> NodeId {
        let id = NodeId(self.nodes.insert(Node::new(xy)));
        self.node_qtree.insert(id, xy);
        id
    }

    pub fn node_xy(&self, n: NodeId) -> Point {
        self.nodes.get(n.0).expect("dangling NodeId").xy
    }

    /// Creates an edge of the given `kind` between `n1` and `n2`,
    /// wiring it into both endpoints' adjacency lists, the edge
    /// quadtree, and (if `kind == Front`) the front's own quadtree.
    pub fn add_edge(&mut self, kind: EdgeKind, n1: NodeId, n2: NodeId) -> EdgeId {
        let edge = Edge::new(n1, n2, kind);
        let centroid = crate::geometry::midpoint(self.node_xy(n1), self.node_xy(n2));
        let id = EdgeId(self.edges.insert(edge));
        self.edge_qtree.insert(id, centroid);

        for n in [n1, n2] {
            let node = self.nodes.get_mut(n.0).expect("dangling NodeId");
            match kind {
                EdgeKind::Boundary => node.boundary_edges.push(id),
                EdgeKind::Front => node.front_edges.push(id),
                EdgeKind::Mesh => node.mesh_edges.push(id),
            }
        }
        if kind == EdgeKind::Front {
            self.front.edges.push(id);
            self.front.qtree.insert(id, centroid);
        }
        id
    }

    /// Removes edge `e`'s id from `n1`/`n2`'s adjacency list matching
    /// `kind`, and from the front's bookkeeping if it was a front edge.
    /// Does not touch the edge arena or the global edge quadtree; used
    /// both when destroying an edge outright and when reclassifying it
    /// (front -> mesh) in place.
    pub fn detach_edge(&mut self, e: EdgeId, n1: NodeId, n2: NodeId, kind: EdgeKind) {
        for n in [n1, n2] {
            if let Some(node) = self.nodes.get_mut(n.0) {
                let list = match kind {
                    EdgeKind::Boundary => &mut node.boundary_edges,
                    EdgeKind::Front => &mut node.front_edges,
                    EdgeKind::Mesh => &mut node.mesh_edges,
                };
                if let Some(pos) = list.iter().position(|&x| x == e) {
                    list.remove(pos);
                }
            }
        }
        if kind == EdgeKind::Front {
            self.front.remove_edge(e);
        }
    }

    /// Fully destroys a boundary/front/mesh edge: detaches it from
    /// endpoints and front, and drops it from the arena and edge
    /// quadtree.
    pub fn destroy_edge(&mut self, e: EdgeId) {
        let Some(edge) = self.edges.get(e.0).cloned() else {
            return;
        };
        self.detach_edge(e, edge.n1, edge.n2, edge.kind);
        self.edge_qtree.remove(e);
        self.edges.remove(e.0);
    }

    /// Reclassifies edge `e` in place (e.g. front -> mesh) without
    /// recreating it, detaching it from the old classification's
    /// bookkeeping and attaching it to the new one.
    pub fn reclassify_edge(&mut self, e: EdgeId, new_kind: EdgeKind) {
        let (n1, n2, old_kind) = {
            let edge = self.edges.get(e.0).expect("dangling EdgeId");
            (edge.n1, edge.n2, edge.kind)
        };
        if old_kind == new_kind {
            return;
        }
        self.detach_edge(e, n1, n2, old_kind);
        self.edges.get_mut(e.0).unwrap().kind = new_kind;
        for n in [n1, n2] {
            let node = self.nodes.get_mut(n.0).expect("dangling NodeId");
            match new_kind {
                EdgeKind::Boundary => node.boundary_edges.push(e),
                EdgeKind::Front => node.front_edges.push(e),
                EdgeKind::Mesh => node.mesh_edges.push(e),
            }
        }
        if new_kind == EdgeKind::Front {
            let centroid = crate::geometry::midpoint(self.node_xy(n1), self.node_xy(n2));
            self.front.edges.push(e);
            self.front.qtree.insert(e, centroid);
        }
    }

    /// Creates a mesh triangle from three nodes already in CCW order,
    /// with its three bounding edges. Also computes and stores every
    /// derived geometric quantity (area, circumcircle, angles, shape
    /// factor, quality); these never change for the triangle's life.
    pub fn add_triangle(&mut self, n1: NodeId, n2: NodeId, n3: NodeId, e1: EdgeId, e2: EdgeId, e3: EdgeId) -> TriId {
        let p1 = self.node_xy(n1);
        let p2 = self.node_xy(n2);
        let p3 = self.node_xy(n3);
        let mut geom = compute_tri_geom_bare(p1, p2, p3);
        let rho1 = self.rho(p1);
        let rho2 = self.rho(p2);
        let rho3 = self.rho(p3);
        geom.quality = crate::triangle::compute_quality(&geom, rho1, rho2, rho3);

        let tri = Triangle {
            n1,
            n2,
            n3,
            e1,
            e2,
            e3,
            t1: None,
            t2: None,
            t3: None,
            geom,
        };
        let id = TriId(self.tris.insert(tri));
        self.tri_qtree.insert(id, geom.centroid);
        for n in [n1, n2, n3] {
            self.nodes.get_mut(n.0).expect("dangling NodeId").tris.push(id);
        }
        id
    }

    pub fn destroy_triangle(&mut self, t: TriId) {
        let Some(tri) = self.tris.get(t.0).cloned() else {
            return;
        };
        for n in [tri.n1, tri.n2, tri.n3] {
            if let Some(node) = self.nodes.get_mut(n.0) {
                if let Some(pos) = node.tris.iter().position(|&x| x == t) {
                    node.tris.remove(pos);
                }
            }
        }
        self.tri_qtree.remove(t);
        self.tris.remove(t.0);
    }

    /// Existing front edge directly between `a` and `b`, if any.
    pub fn front_edge_between(&self, a: NodeId, b: NodeId) -> Option<EdgeId> {
        let node = self.nodes.get(a.0)?;
        node.front_edges.iter().copied().find(|&e| {
            self.edges
                .get(e.0)
                .map(|edge| edge.other(a) == Some(b))
                .unwrap_or(false)
        })
    }

    /// Sum of all accepted mesh triangles' areas.
    pub fn total_triangle_area(&self) -> f64 {
        self.tris.iter().map(|(_, t)| t.geom.area).sum()
    }

    /// Sum of the signed areas of every exterior boundary minus every
    /// interior (hole) boundary — i.e. the bounded domain area.
    pub fn total_boundary_area(&self) -> f64 {
        (0..self.boundaries.len())
            .map(|i| self.boundary_signed_area(i).abs())
            .zip(self.boundaries.iter())
            .map(|(a, b)| if b.interior { -a } else { a })
            .sum()
    }

    /// Final sweep (§4 control flow's `assign_tri_neighbors`): for
    /// every triangle's three bounding edges, reads the other side's
    /// triangle off the edge itself and stores it as the neighbor
    /// across that edge.
    pub fn assign_tri_neighbors(&mut self) {
        let ids: Vec<TriId> = self.tris.iter().map(|(i, _)| TriId(i)).collect();
        for t in ids {
            let (e1, e2, e3) = {
                let tri = self.tris.get(t.0).unwrap();
                (tri.e1, tri.e2, tri.e3)
            };
            let neighbor_across = |mesh: &Self, e: EdgeId| -> Option<TriId> {
                let edge = mesh.edges.get(e.0)?;
                match (edge.t1, edge.t2) {
                    (Some(a), Some(b)) => Some(if a == t { b } else { a }),
                    (Some(a), None) if a != t => Some(a),
                    (None, Some(b)) if b != t => Some(b),
                    _ => None,
                }
            };
            let n1 = neighbor_across(self, e1);
            let n2 = neighbor_across(self, e2);
            let n3 = neighbor_across(self, e3);
            let tri = self.tris.get_mut(t.0).unwrap();
            tri.t1 = n1;
            tri.t2 = n2;
            tri.t3 = n3;
        }
    }

    /// Top-level control flow: `refine_boundaries -> initialize_front
    /// -> refine_front -> loop{ advance_front } -> flip_non_delaunay ->
    /// assign_tri_neighbors`, preceded by input sanity checks and
    /// followed by the final area-mismatch check.
    pub fn generate(&mut self) -> MeshResult<()> {
        self.check_boundary_orientations()?;
        self.check_interior_boundaries_enclosed()?;
        self.init_boundary_size_terms();
        self.refine_boundaries()?;
        self.initialize_front();
        self.refine_front()?;
        self.run_advancing_front()?;
        self.run_delaunay_flip_pass();
        self.assign_tri_neighbors();

        let boundary_area = self.total_boundary_area();
        let mesh_area = self.total_triangle_area();
        let rel_error = (mesh_area - boundary_area).abs() / boundary_area.abs().max(crate::size_fn::SINKHOLE_THRESHOLD);
        if rel_error > 1e-5 {
            return Err(crate::error::MeshError::AreaMismatch {
                mesh_area,
                boundary_area,
                rel_error,
            });
        }
        Ok(())
    }
}
