//! Per-boundary-node size-function initialization and the boundary
//! refinement driver (§4.E init, §4.F).

use crate::error::MeshResult;
use crate::geometry::midpoint;
use crate::size_fn::{node_k, node_rho0};

impl crate::mesh::Mesh {
    /// For every boundary edge `e1 = (n1, n2)`, finds `n1`'s other
    /// incident boundary edge `e2 = (n1, n3)` and computes `(ρ₀, k)`
    /// for `n1` from the angle between `e1` and `e2` and their lengths,
    /// using `e1`'s size factor as the curvature exponent. Matches the
    /// original per-(node, edge-starting-there) pairing exactly: a
    /// node with more than two incident boundary edges would get
    /// overwritten per edge, but boundary polygons only ever have two.
    pub fn init_boundary_size_terms(&mut self) {
        let global_rho = self.size_fn.global_rho();
        let mut terms = Vec::new();

        for b in &self.boundaries {
            for &e1_id in &b.edges {
                let e1 = self.edges.get(e1_id.0).unwrap();
                let n1 = e1.n1;
                let n2 = e1.n2;

                let node1 = self.nodes.get(n1.0).unwrap();
                let Some(&e2_id) = node1
                    .boundary_edges
                    .iter()
                    .find(|&&e| e != e1_id)
                else {
                    continue; // degenerate: node has only one boundary edge
                };
                let e2 = self.edges.get(e2_id.0).unwrap();
                let n3 = e2.other(n1).unwrap_or(n1);

                let p1 = self.node_xy(n1);
                let p2 = self.node_xy(n2);
                let p3 = self.node_xy(n3);

                let d1 = p2 - p1;
                let d2 = p3 - p1;
                let l1 = d1.norm();
                let l2 = d2.norm();
                let cos_a = (d1.dot(&d2) / (l1 * l2)).clamp(-1.0, 1.0);
                let alpha = cos_a.acos();

                let rho0 = node_rho0(global_rho, alpha, e1.size_factor);
                let k = node_k(l1, l2);
                terms.push((p1, rho0, k));
            }
        }

        self.size_fn.set_boundary_terms(terms);
    }

    /// Subdivides every boundary's edges until each edge's length is
    /// `<= TM_BDRY_REFINE_FAC * (ρ(n1) + ρ(midpoint))`, restarting the
    /// walk at the first new half after each split. Terminates when a
    /// full sweep over a boundary makes no further splits.
    pub fn refine_boundaries(&mut self) -> MeshResult<()> {
        const REFINE_FAC: f64 = 1.0;

        for b in 0..self.boundaries.len() {
            loop {
                let mut did_split = false;
                let mut i = 0;
                while i < self.boundaries[b].edges.len() {
                    let eid = self.boundaries[b].edges[i];
                    let edge = self.edges.get(eid.0).unwrap().clone();
                    let p1 = self.node_xy(edge.n1);
                    let p2 = self.node_xy(edge.n2);
                    let mid = midpoint(p1, p2);

                    let rho_n1 = self.check_rho(p1)?;
                    let rho_mid = self.check_rho(mid)?;
                    let target = REFINE_FAC * (rho_n1 + rho_mid);
                    let len = (p2 - p1).norm();

                    if len > target {
                        self.split_boundary_edge(b, eid);
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
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::boundary::Boundary;
    use crate::edge::EdgeKind;
    use crate::geometry::Point;
    use crate::mesh::Mesh;
    use crate::size_fn::SizeFn;

    fn square_mesh(rho: f64) -> Mesh {
        let min = Point::new(-1.0, -1.0);
        let max = Point::new(2.0, 2.0);
        let mut mesh = Mesh::new(min, max, SizeFn::global(rho), 8);
        let pts = [
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(0.0, 1.0),
        ];
        let nodes: Vec<_> = pts.iter().map(|&p| mesh.add_node(p)).collect();
        let mut b = Boundary::new(1, false, min, max, 8);
        for i in 0..4 {
            let e = mesh.add_edge(EdgeKind::Boundary, nodes[i], nodes[(i + 1) % 4]);
            b.qtree.insert(e, Point::new(0.0, 0.0));
            b.edges.push(e);
        }
        mesh.add_boundary(b);
        mesh
    }

    #[test]
    fn refines_square_edges_below_target() {
        let mut mesh = square_mesh(0.3);
        mesh.init_boundary_size_terms();
        mesh.refine_boundaries().unwrap();
        for &eid in &mesh.boundaries[0].edges {
            let edge = mesh.edges.get(eid.0).unwrap();
            let len = (mesh.node_xy(edge.n2) - mesh.node_xy(edge.n1)).norm();
            let mid = crate::geometry::midpoint(mesh.node_xy(edge.n1), mesh.node_xy(edge.n2));
            let target = mesh.rho(mesh.node_xy(edge.n1)) + mesh.rho(mid);
            assert!(len <= target + 1e-9);
        }
    }

    #[test]
    fn no_refinement_needed_when_rho_is_large() {
        let mut mesh = square_mesh(10.0);
        mesh.init_boundary_size_terms();
        let before = mesh.boundaries[0].edges.len();
        mesh.refine_boundaries().unwrap();
        assert_eq!(mesh.boundaries[0].edges.len(), before);
    }

    #[test]
    fn sinkhole_size_function_is_fatal() {
        let mut mesh = square_mesh(1e-10);
        mesh.init_boundary_size_terms();
        assert!(mesh.refine_boundaries().is_err());
    }
}
