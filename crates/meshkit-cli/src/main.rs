use std::fs;
use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::fmt::SubscriberBuilder;

use meshkit::boundary::Boundary;
use meshkit::edge::EdgeKind;
use meshkit::geometry::midpoint;
use meshkit::ids::NodeId;
use meshkit::param::{self, BoundarySpec};
use meshkit::size_fn::SizeFn;
use meshkit::Mesh;

#[derive(Parser)]
#[command(name = "meshkit")]
#[command(about = "2D advancing-front triangular mesh generator")]
struct Cli {
    /// Path to a mesh parameter file in the §6 text format.
    parameter_file: PathBuf,
}

fn main() -> ExitCode {
    SubscriberBuilder::default().with_target(false).init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "meshkit failed");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let input = fs::read_to_string(&cli.parameter_file)
        .with_context(|| format!("reading parameter file {}", cli.parameter_file.display()))?;
    let params = param::parse(&input).map_err(anyhow::Error::msg)?;

    let mut mesh = Mesh::new(
        params.bbox_min,
        params.bbox_max,
        SizeFn::global(params.global_size),
        params.qtree_cap,
    );

    let nodes: Vec<NodeId> = params.nodes.iter().map(|&p| mesh.add_node(p)).collect();
    add_boundary(&mut mesh, &params.exterior, &nodes, false);
    for interior in &params.interiors {
        add_boundary(&mut mesh, interior, &nodes, true);
    }

    mesh.generate().map_err(anyhow::Error::msg)?;
    mesh.assign_node_indices();

    let mut w = BufWriter::new(io::stdout());
    mesh.write_mesh(&mut w).context("writing mesh to stdout")?;

    Ok(())
}

fn add_boundary(mesh: &mut Mesh, spec: &BoundarySpec, nodes: &[NodeId], interior: bool) {
    let mut boundary = Boundary::new(spec.marker, interior, mesh.bbox_min, mesh.bbox_max, mesh.qtree_cap);
    for &(i, j, marker, size_factor) in &spec.edges {
        let e = mesh.add_edge(EdgeKind::Boundary, nodes[i], nodes[j]);
        {
            let edge = mesh.edges.get_mut(e.0).unwrap();
            edge.marker = Some(marker);
            edge.size_factor = size_factor;
        }
        boundary.edges.push(e);
        let centroid = midpoint(mesh.node_xy(nodes[i]), mesh.node_xy(nodes[j]));
        boundary.qtree.insert(e, centroid);
    }
    mesh.add_boundary(boundary);
}
