//! Size function ρ(x,y): target edge length at a point, combining a
//! user size source with boundary-node curvature/length terms.

use std::rc::Rc;

use crate::error::{MeshError, MeshResult};
use crate::geometry::Point;

/// Evaluated below this, ρ is considered a sinkhole: the front would
/// never terminate placing vertices at vanishing spacing.
pub const SINKHOLE_THRESHOLD: f64 = 1e-8;

/// ρ(xy) = min(base(xy), min_i(ρ₀_i + k_i · |xy - node_i|² / 4)), where
/// `base` is a caller-supplied callback if present, else the constant
/// `global_rho`, and `i` ranges over every boundary node. `global_rho`
/// itself (not `base`) is also what seeds each boundary node's `ρ₀`;
/// see `node_rho0`.
#[derive(Clone)]
pub struct SizeFn {
    global_rho: f64,
    callback: Option<Rc<dyn Fn(Point) -> f64>>,
    /// `(position, rho0, k)` for each boundary node, populated once by
    /// `Mesh::init_boundary_size_terms` before meshing starts.
    boundary_terms: Vec<(Point, f64, f64)>,
}

impl std::fmt::Debug for SizeFn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SizeFn")
            .field("global_rho", &self.global_rho)
            .field("has_callback", &self.callback.is_some())
            .field("boundary_terms", &self.boundary_terms.len())
            .finish()
    }
}

impl SizeFn {
    pub fn global(global_rho: f64) -> Self {
        Self {
            global_rho,
            callback: None,
            boundary_terms: Vec::new(),
        }
    }

    pub fn with_callback(global_rho: f64, f: Rc<dyn Fn(Point) -> f64>) -> Self {
        Self {
            global_rho,
            callback: Some(f),
            boundary_terms: Vec::new(),
        }
    }

    pub fn global_rho(&self) -> f64 {
        self.global_rho
    }

    pub fn set_boundary_terms(&mut self, terms: Vec<(Point, f64, f64)>) {
        self.boundary_terms = terms;
    }

    fn base_at(&self, p: Point) -> f64 {
        match &self.callback {
            Some(f) => f(p),
            None => self.global_rho,
        }
    }

    /// Raw ρ(p), not clamped. Most callers want [`SizeFn::check_rho`]
    /// instead; this is exposed for tests and for offset computations
    /// that already have a validated point.
    pub fn rho(&self, p: Point) -> f64 {
        let mut m = self.base_at(p);
        for (node_p, rho0, k) in &self.boundary_terms {
            let d2 = (p - node_p).norm_squared();
            let term = rho0 + k * d2 / 4.0;
            if term < m {
                m = term;
            }
        }
        m
    }

    /// ρ(p), rejecting a sinkhole (`ρ < 1e-8`) as a fatal error.
    pub fn check_rho(&self, p: Point) -> MeshResult<f64> {
        let r = self.rho(p);
        if r < SINKHOLE_THRESHOLD {
            Err(MeshError::SizeFunctionSinkhole { at: (p.x, p.y), rho: r })
        } else {
            Ok(r)
        }
    }
}

/// Per-node ρ₀/k initialization (§4.E): for boundary node `n` with
/// incident boundary edges of length `len_a, len_b` meeting at
/// interior angle `alpha`:
///   ρ₀(n) = global_rho · |sin(alpha/2)|^edge_size_factor(n)
///   k(n) = 1 / max(len_a, len_b)
pub fn node_rho0(global_rho: f64, alpha: f64, edge_size_factor: f64) -> f64 {
    global_rho * (alpha / 2.0).sin().abs().powf(edge_size_factor)
}

pub fn node_k(len_a: f64, len_b: f64) -> f64 {
    1.0 / len_a.max(len_b).max(f64::MIN_POSITIVE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_only_is_constant() {
        let f = SizeFn::global(0.5);
        assert!((f.rho(Point::new(3.0, 7.0)) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn boundary_term_can_undercut_global() {
        let mut f = SizeFn::global(10.0);
        f.set_boundary_terms(vec![(Point::new(0.0, 0.0), 0.1, 0.01)]);
        let near = f.rho(Point::new(0.01, 0.0));
        assert!(near < 10.0);
        assert!(near >= 0.1);
    }

    #[test]
    fn sinkhole_is_flagged() {
        let f = SizeFn::global(1e-10);
        assert!(f.check_rho(Point::new(0.0, 0.0)).is_err());
    }

    #[test]
    fn rho0_smaller_near_sharp_corners() {
        let sharp = node_rho0(1.0, std::f64::consts::FRAC_PI_6, 1.0); // 30 deg
        let flat = node_rho0(1.0, std::f64::consts::PI * 0.9, 1.0); // near straight
        assert!(sharp < flat);
    }
}
