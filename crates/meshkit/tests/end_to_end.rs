//! End-to-end scenarios exercising the full `Mesh::generate` pipeline,
//! the literal cases of spec §8.

use meshkit::boundary::Boundary;
use meshkit::edge::EdgeKind;
use meshkit::ids::NodeId;
use meshkit::size_fn::SizeFn;
use meshkit::{MeshError, Mesh, Point};

fn square_domain(pts: &[Point], rho: f64, qtree_cap: usize) -> Mesh {
    domain(pts, &[], rho, qtree_cap)
}

fn domain(exterior_pts: &[Point], interior_loops: &[&[Point]], rho: f64, qtree_cap: usize) -> Mesh {
    let all_pts: Vec<Point> = exterior_pts
        .iter()
        .copied()
        .chain(interior_loops.iter().flat_map(|loop_pts| loop_pts.iter().copied()))
        .collect();
    let min_x = all_pts.iter().map(|p| p.x).fold(f64::INFINITY, f64::min) - 10.0;
    let min_y = all_pts.iter().map(|p| p.y).fold(f64::INFINITY, f64::min) - 10.0;
    let max_x = all_pts.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max) + 10.0;
    let max_y = all_pts.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max) + 10.0;
    let bbox_min = Point::new(min_x, min_y);
    let bbox_max = Point::new(max_x, max_y);

    let mut mesh = Mesh::new(bbox_min, bbox_max, SizeFn::global(rho), qtree_cap);

    add_loop(&mut mesh, exterior_pts, 1, false);
    for (i, loop_pts) in interior_loops.iter().enumerate() {
        add_loop(&mut mesh, loop_pts, 100 + i as i64, true);
    }
    mesh
}

fn add_loop(mesh: &mut Mesh, pts: &[Point], marker: i64, interior: bool) {
    let nodes: Vec<NodeId> = pts.iter().map(|&p| mesh.add_node(p)).collect();
    let mut b = Boundary::new(marker, interior, mesh.bbox_min, mesh.bbox_max, mesh.qtree_cap);
    let n = nodes.len();
    for i in 0..n {
        let a = nodes[i];
        let c = nodes[(i + 1) % n];
        let e = mesh.add_edge(EdgeKind::Boundary, a, c);
        mesh.edges.get_mut(e.0).unwrap().marker = Some(marker);
        b.edges.push(e);
        b.qtree.insert(e, meshkit::geometry::midpoint(mesh.node_xy(a), mesh.node_xy(c)));
    }
    mesh.add_boundary(b);
}

#[test]
fn unit_square_meshes_cleanly() {
    let pts = [
        Point::new(0.0, 0.0),
        Point::new(1.0, 0.0),
        Point::new(1.0, 1.0),
        Point::new(0.0, 1.0),
    ];
    let mut mesh = square_domain(&pts, 0.5, 16);
    mesh.generate().expect("unit square should mesh");

    let tri_count = mesh.tris.len();
    assert!(tri_count >= 8, "expected >= 8 triangles, got {tri_count}");

    for (_, tri) in mesh.tris.iter() {
        assert!(tri.geom.min_angle > 10f64.to_radians());
        assert!(tri.geom.max_angle < 170f64.to_radians());
    }

    let area = mesh.total_triangle_area();
    assert!((area - 1.0).abs() < 1e-5, "area = {area}");
    assert!(mesh.front.is_empty());
}

#[test]
fn triangle_with_triangular_hole_excludes_hole_area() {
    let exterior = [Point::new(-1.0, -1.0), Point::new(16.0, 7.0), Point::new(-1.0, 10.0)];
    // Same three vertices as the source scenario, traversed so the
    // signed area is negative (this codebase's CW convention for
    // interior loops).
    let hole = [Point::new(1.0, 4.0), Point::new(6.0, 8.0), Point::new(6.0, 4.0)];
    let mut mesh = domain(&exterior, &[&hole], 1.0, 16);
    mesh.generate().expect("triangle with hole should mesh");

    let tri_count = mesh.tris.len();
    assert!(tri_count > 100, "expected > 100 triangles, got {tri_count}");

    let boundary_area = mesh.total_boundary_area();
    let mesh_area = mesh.total_triangle_area();
    assert!((mesh_area - boundary_area).abs() / boundary_area < 1e-4);
}

#[test]
fn long_channel_area_matches_exactly() {
    let pts = [
        Point::new(0.0, 0.0),
        Point::new(120.0, 0.0),
        Point::new(120.0, 20.0),
        Point::new(0.0, 20.0),
    ];
    let mut mesh = square_domain(&pts, 3.0, 32);
    mesh.generate().expect("long channel should mesh");

    let area = mesh.total_triangle_area();
    assert!((area - 2400.0).abs() < 1e-4, "area = {area}");
}

#[test]
fn cylinder_in_channel_avoids_the_hole() {
    let exterior = [
        Point::new(0.0, 0.0),
        Point::new(2200.0, 0.0),
        Point::new(2200.0, 410.0),
        Point::new(0.0, 410.0),
    ];
    let center = Point::new(200.0, 200.0);
    let radius = 50.0;
    let n_sides = 60;
    // CW 60-gon hole: decreasing angle traces the circle clockwise.
    let hole: Vec<Point> = (0..n_sides)
        .map(|i| {
            let theta = -2.0 * std::f64::consts::PI * (i as f64) / (n_sides as f64);
            Point::new(center.x + radius * theta.cos(), center.y + radius * theta.sin())
        })
        .collect();

    let mut mesh = domain(&exterior, &[&hole], 40.0, 64);
    mesh.generate().expect("cylinder-in-channel should mesh");

    for (_, tri) in mesh.tris.iter() {
        let d = (tri.geom.centroid - center).norm();
        assert!(d >= radius - 1e-6, "triangle centroid fell inside the cylinder hole");
        assert!(tri.geom.min_angle > 10f64.to_radians());
    }
    assert!(mesh.front.is_empty());
}

#[test]
fn three_colinear_boundary_nodes_are_invalid_input() {
    let pts = [Point::new(0.0, 0.0), Point::new(1.0, 0.0), Point::new(2.0, 0.0)];
    let mut mesh = square_domain(&pts, 0.5, 8);
    let err = mesh.generate().unwrap_err();
    assert!(matches!(err, MeshError::InvalidInput { .. }));
}

#[test]
fn global_sinkhole_size_function_aborts() {
    let pts = [
        Point::new(0.0, 0.0),
        Point::new(1.0, 0.0),
        Point::new(1.0, 1.0),
        Point::new(0.0, 1.0),
    ];
    let mut mesh = square_domain(&pts, 1e-10, 8);
    let err = mesh.generate().unwrap_err();
    assert!(matches!(err, MeshError::SizeFunctionSinkhole { .. }));
}
