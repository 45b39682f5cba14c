//! Fatal and recoverable error kinds surfaced by the mesher.
//!
//! Recovery policy: validity failures inside the advancing-front inner
//! loop (invalid triangle or invalid node) are expected and cause a
//! silent rejection, never an `Err`. Structural failures during a flip
//! (missing triangle neighbor) are logged via `tracing::warn!` and the
//! flip is skipped. Everything else propagates as `MeshError` to the
//! top-level driver.

use std::fmt;

/// Errors that abort meshing or input parsing.
#[derive(Debug, Clone)]
pub enum MeshError {
    /// Missing required parameter, ill-formed block, out-of-range node
    /// index, or wrong polygon orientation. Aborts before meshing.
    InvalidInput { detail: String },
    /// ρ evaluated below `1e-8` somewhere during refinement or
    /// advancing-front placement.
    SizeFunctionSinkhole { at: (f64, f64), rho: f64 },
    /// Main advancing-front loop exited with the front still non-empty.
    FrontStalled { remaining: usize },
    /// A quadtree depth cap, an unresolvable validity tie, or a skipped
    /// flip left the mesh locally malformed. Never returned as an
    /// `Err`: logged via `tracing::warn!` and meshing continues.
    GeometryDegenerate { detail: String },
    /// `|ΣT.area - Σboundary.area| / Σboundary.area` exceeded `1e-5` at
    /// completion.
    AreaMismatch {
        mesh_area: f64,
        boundary_area: f64,
        rel_error: f64,
    },
}

impl fmt::Display for MeshError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeshError::InvalidInput { detail } => write!(f, "invalid input: {detail}"),
            MeshError::SizeFunctionSinkhole { at, rho } => write!(
                f,
                "size function sinkhole: rho({:.6}, {:.6}) = {:.3e} < 1e-8",
                at.0, at.1, rho
            ),
            MeshError::FrontStalled { remaining } => write!(
                f,
                "advancing front stalled with {remaining} front edge(s) remaining"
            ),
            MeshError::GeometryDegenerate { detail } => write!(f, "geometry degenerate: {detail}"),
            MeshError::AreaMismatch {
                mesh_area,
                boundary_area,
                rel_error,
            } => write!(
                f,
                "area mismatch: mesh area {mesh_area:.6} vs boundary area {boundary_area:.6} \
                 (relative error {rel_error:.3e} > 1e-5)"
            ),
        }
    }
}

impl std::error::Error for MeshError {}

pub type MeshResult<T> = Result<T, MeshError>;
