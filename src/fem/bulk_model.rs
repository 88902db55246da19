use crate::base::{facet_integ_points, interpolate_geometry, GlobalJacobian, ShapeCache, SurfaceMesh};
use crate::StrError;
use russell_lab::Vector;

/// Defines the continuum part of the discrete problem (everything but contact)
///
/// The residual follows R(u) = f_int(u) − f_ext(t), thus the contact forces are added to R
/// with the opposite sign of the external forces, and K = ∂R/∂u.
pub trait BulkModel {
    /// Returns the total number of equations (DOFs)
    fn n_equation(&self) -> usize;

    /// Returns an upper bound of the number of non-zero values of the Jacobian
    fn nnz_sup(&self) -> usize;

    /// Adds the residual vector at time t
    fn residual(&self, rr: &mut Vector, uu: &Vector, t: f64, prescribed: &[bool]) -> Result<(), StrError>;

    /// Adds the Jacobian matrix at time t
    fn jacobian(&self, kk: &mut dyn GlobalJacobian, uu: &Vector, t: f64, prescribed: &[bool]) -> Result<(), StrError>;
}

/// Holds a spring attached to one equation and to a moving base
#[derive(Clone, Copy, Debug)]
pub struct NodalSpring {
    /// Equation number
    pub eq: usize,

    /// Stiffness (or conductance, for pressure and concentration DOFs)
    pub k: f64,

    /// Position of the base as a function of time
    pub base: fn(f64) -> f64,
}

/// Implements a bulk model made of springs attached to the DOFs
///
/// Each spring adds R = k (u − ū(t)) to its equation, where ū(t) is the base position. This is
/// the simplest stand-in for the continuum elements that still transmits forces (or fluxes) to the
/// contact surfaces. For example, a patch pressed against an obstacle by springs whose base moves
/// by δ reaches equilibrium with a penetration of about δ k / (k + ε A).
pub struct NodalSprings {
    /// Total number of equations
    n_equation: usize,

    /// All springs
    pub all: Vec<NodalSpring>,
}

impl NodalSprings {
    /// Allocates a new instance without springs
    pub fn new(n_equation: usize) -> Self {
        NodalSprings {
            n_equation,
            all: Vec::new(),
        }
    }

    /// Adds springs with the same stiffness and base to a set of equations
    pub fn add(&mut self, equations: &[usize], k: f64, base: fn(f64) -> f64) -> Result<&mut Self, StrError> {
        if k < 0.0 {
            return Err("spring stiffness must be ≥ 0.0");
        }
        for eq in equations {
            if *eq >= self.n_equation {
                return Err("equation number of spring is out of bounds");
            }
            self.all.push(NodalSpring { eq: *eq, k, base });
        }
        Ok(self)
    }

    /// Adds springs distributed over a surface (stiffness per unit area)
    ///
    /// The stiffness of the spring at node m is k ∫ Nₘ dA, thus a uniform base displacement
    /// produces the same nodal forces as a uniform traction.
    ///
    /// # Input
    ///
    /// * `mesh` -- surface mesh (reference configuration)
    /// * `equations` -- one equation number per node of the mesh
    /// * `k` -- stiffness per unit area
    /// * `base` -- position of the base as a function of time
    pub fn add_distributed(
        &mut self,
        mesh: &SurfaceMesh,
        equations: &[usize],
        k: f64,
        base: fn(f64) -> f64,
    ) -> Result<&mut Self, StrError> {
        if equations.len() != mesh.npoint() {
            return Err("there must be one equation number per surface node");
        }
        let mut areas = vec![0.0; mesh.npoint()];
        let mut cache = ShapeCache::new();
        for facet in &mesh.facets {
            let xx: Vec<[f64; 3]> = facet.points.iter().map(|p| mesh.coords[*p]).collect();
            let shape = cache.get(facet.kind)?;
            for ip in facet_integ_points(facet.kind)? {
                let eval = shape.eval(&[ip[0], ip[1]], false);
                let det_jac = interpolate_geometry(&eval, &xx).jacobian();
                for (a, m) in facet.points.iter().enumerate() {
                    areas[*m] += ip[2] * det_jac * eval.nn[a];
                }
            }
        }
        for (m, eq) in equations.iter().enumerate() {
            self.add(&[*eq], k * areas[m], base)?;
        }
        Ok(self)
    }
}

impl BulkModel for NodalSprings {
    fn n_equation(&self) -> usize {
        self.n_equation
    }

    fn nnz_sup(&self) -> usize {
        self.all.len()
    }

    fn residual(&self, rr: &mut Vector, uu: &Vector, t: f64, prescribed: &[bool]) -> Result<(), StrError> {
        if rr.dim() != self.n_equation || uu.dim() != self.n_equation {
            return Err("vectors must have dimension equal to the number of equations");
        }
        for s in &self.all {
            if !prescribed[s.eq] {
                rr[s.eq] += s.k * (uu[s.eq] - (s.base)(t));
            }
        }
        Ok(())
    }

    fn jacobian(&self, kk: &mut dyn GlobalJacobian, _uu: &Vector, _t: f64, prescribed: &[bool]) -> Result<(), StrError> {
        for s in &self.all {
            if !prescribed[s.eq] {
                kk.add_entry(s.eq, s.eq, s.k)?;
            }
        }
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
