//! Mesh printer (§6 output format): assigns final node indices and
//! writes the canonical tab-separated block format.

use std::io::{self, Write};

use crate::mesh::Mesh;

impl Mesh {
    /// Assigns `node.index` 0..n over every live node, in arena
    /// iteration order. Must run once, after meshing completes and
    /// before `write_mesh`.
    pub fn assign_node_indices(&mut self) {
        let ids: Vec<usize> = (0..self.nodes.len_slots()).filter(|&i| self.nodes.contains(i)).collect();
        for (out_idx, slot) in ids.into_iter().enumerate() {
            self.nodes.get_mut(slot).unwrap().index = Some(out_idx);
        }
    }

    /// Assigns `triangle` output indices in the same way, separately
    /// from node indices, returning the ordered list of live triangle
    /// slot indices so `write_mesh` can look up neighbors by position.
    fn triangle_output_order(&self) -> Vec<usize> {
        (0..self.tris.len_slots()).filter(|&i| self.tris.contains(i)).collect()
    }

    fn node_out_index(&self, n: crate::ids::NodeId) -> usize {
        self.nodes.get(n.0).unwrap().index.expect("assign_node_indices not run")
    }

    /// Writes the full mesh in the canonical output format to `w`.
    /// Call `assign_node_indices` first.
    pub fn write_mesh<W: Write>(&self, w: &mut W) -> io::Result<()> {
        let node_ids: Vec<usize> = (0..self.nodes.len_slots()).filter(|&i| self.nodes.contains(i)).collect();
        writeln!(w, "NODES {}", node_ids.len())?;
        for &slot in &node_ids {
            let node = self.nodes.get(slot).unwrap();
            writeln!(w, "{}\t{:.10}\t{:.10}", node.index.unwrap(), node.xy.x, node.xy.y)?;
        }

        for b in &self.boundaries {
            writeln!(w, "BOUNDARY {} {}", b.marker, b.edges.len())?;
            for (i, &eid) in b.edges.iter().enumerate() {
                let edge = self.edges.get(eid.0).unwrap();
                writeln!(
                    w,
                    "{}\t{}\t{}\t{}",
                    i,
                    self.node_out_index(edge.n1),
                    self.node_out_index(edge.n2),
                    edge.marker.unwrap_or(-1)
                )?;
            }
        }

        writeln!(w, "FRONT {}", self.front.len())?;

        let tri_slots = self.triangle_output_order();
        writeln!(w, "TRIANGLES {}", tri_slots.len())?;
        for (i, &slot) in tri_slots.iter().enumerate() {
            let tri = self.tris.get(slot).unwrap();
            writeln!(
                w,
                "{}\t{}\t{}\t{}",
                i,
                self.node_out_index(tri.n1),
                self.node_out_index(tri.n2),
                self.node_out_index(tri.n3)
            )?;
        }

        writeln!(w, "NEIGHBORS {}", tri_slots.len())?;
        let slot_to_out: std::collections::HashMap<usize, usize> =
            tri_slots.iter().enumerate().map(|(i, &s)| (s, i)).collect();
        for (i, &slot) in tri_slots.iter().enumerate() {
            let tri = self.tris.get(slot).unwrap();
            let fmt_nbr = |t: Option<crate::ids::TriId>| -> i64 {
                t.and_then(|id| slot_to_out.get(&id.0)).map(|&v| v as i64).unwrap_or(-1)
            };
            writeln!(w, "{}\t{}\t{}\t{}", i, fmt_nbr(tri.t1), fmt_nbr(tri.t2), fmt_nbr(tri.t3))?;
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

    #[test]
    fn writes_expected_block_structure() {
        let min = Point::new(-1.0, -1.0);
        let max = Point::new(2.0, 2.0);
        let mut mesh = Mesh::new(min, max, SizeFn::global(1.0), 8);
        let n1 = mesh.add_node(Point::new(0.0, 0.0));
        let n2 = mesh.add_node(Point::new(1.0, 0.0));
        let n3 = mesh.add_node(Point::new(0.0, 1.0));
        let e1 = mesh.add_edge(EdgeKind::Boundary, n1, n2);
        let e2 = mesh.add_edge(EdgeKind::Boundary, n2, n3);
        let e3 = mesh.add_edge(EdgeKind::Boundary, n3, n1);
        let mut b = Boundary::new(7, false, min, max, 8);
        b.edges = vec![e1, e2, e3];
        mesh.add_boundary(b);
        mesh.add_triangle(n1, n2, n3, e2, e3, e1);

        mesh.assign_node_indices();
        let mut buf = Vec::new();
        mesh.write_mesh(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("NODES 3\n"));
        assert!(text.contains("BOUNDARY 7 3"));
        assert!(text.contains("TRIANGLES 1"));
        assert!(text.contains("NEIGHBORS 1"));
    }
}
