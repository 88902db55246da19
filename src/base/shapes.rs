use super::{cross3, facet_integ_points, norm3, NDIM, SECOND_DERIV_STEP};
use crate::StrError;
use gemlab::shapes::{GeoKind, Scratchpad};
use std::collections::HashMap;

/// Holds shape functions and derivatives evaluated at a point of a facet
#[derive(Clone, Debug)]
pub struct ShapeEval {
    /// Natural coordinates (r, s)
    pub ksi: [f64; 2],

    /// Shape functions N_m
    pub nn: Vec<f64>,

    /// First derivatives (∂N_m/∂r, ∂N_m/∂s)
    pub dnn: Vec<[f64; 2]>,

    /// Second derivatives (∂²N_m/∂r², ∂²N_m/∂s², ∂²N_m/∂r∂s); empty if not requested
    pub ddnn: Vec<[f64; 3]>,
}

impl ShapeEval {
    /// Returns ∂²N_m/∂ξα∂ξβ (requires the second derivatives)
    #[inline]
    pub fn ddn(&self, m: usize, alpha: usize, beta: usize) -> f64 {
        if alpha == beta {
            self.ddnn[m][alpha]
        } else {
            self.ddnn[m][2]
        }
    }
}

/// Holds the position and covariant basis of a point on a facet
#[derive(Clone, Debug)]
pub struct PointGeometry {
    /// Position x(ξ)
    pub x: [f64; 3],

    /// Tangent vectors τ₁ = ∂x/∂r and τ₂ = ∂x/∂s
    pub tau: [[f64; 3]; 2],

    /// Second derivatives of the position (∂²x/∂r², ∂²x/∂s², ∂²x/∂r∂s); zero if not requested
    pub x_dd: [[f64; 3]; 3],
}

impl PointGeometry {
    /// Returns τ₁ × τ₂ (its norm is the area Jacobian)
    pub fn area_vector(&self) -> [f64; 3] {
        cross3(&self.tau[0], &self.tau[1])
    }

    /// Returns the area Jacobian |τ₁ × τ₂|
    pub fn jacobian(&self) -> f64 {
        norm3(&self.area_vector())
    }

    /// Returns the components of the second derivative of x w.r.t (α, β)
    #[inline]
    pub fn x_ab(&self, alpha: usize, beta: usize) -> &[f64; 3] {
        if alpha == beta {
            &self.x_dd[alpha]
        } else {
            &self.x_dd[2]
        }
    }
}

/// Evaluates shape functions of a surface facet embedded in 3D
pub struct FacetShape {
    /// Kind of facet
    pub kind: GeoKind,

    /// Number of nodes
    pub nnode: usize,

    /// Scratchpad providing the interpolation functions and derivatives
    pad: Scratchpad,
}

impl FacetShape {
    /// Allocates a new instance
    pub fn new(kind: GeoKind) -> Result<Self, StrError> {
        facet_integ_points(kind)?; // checks the kind
        let pad = Scratchpad::new(NDIM, kind)?;
        Ok(FacetShape {
            kind,
            nnode: kind.nnode(),
            pad,
        })
    }

    /// Evaluates the shape functions and first derivatives
    ///
    /// If `second` is true, computes the second derivatives as well
    pub fn eval(&mut self, ksi: &[f64; 2], second: bool) -> ShapeEval {
        let nnode = self.nnode;
        (self.pad.fn_interp)(&mut self.pad.interp, &ksi[..]);
        let nn: Vec<f64> = (0..nnode).map(|m| self.pad.interp[m]).collect();
        let dnn = self.first_derivatives(ksi);
        let mut ddnn = Vec::new();
        if second {
            // central differences of the first derivatives
            let h = SECOND_DERIV_STEP;
            let d_rp = self.first_derivatives(&[ksi[0] + h, ksi[1]]);
            let d_rm = self.first_derivatives(&[ksi[0] - h, ksi[1]]);
            let d_sp = self.first_derivatives(&[ksi[0], ksi[1] + h]);
            let d_sm = self.first_derivatives(&[ksi[0], ksi[1] - h]);
            ddnn = (0..nnode)
                .map(|m| {
                    [
                        (d_rp[m][0] - d_rm[m][0]) / (2.0 * h),
                        (d_sp[m][1] - d_sm[m][1]) / (2.0 * h),
                        (d_sp[m][0] - d_sm[m][0]) / (2.0 * h),
                    ]
                })
                .collect();
        }
        ShapeEval {
            ksi: *ksi,
            nn,
            dnn,
            ddnn,
        }
    }

    /// Computes (∂N_m/∂r, ∂N_m/∂s)
    fn first_derivatives(&mut self, ksi: &[f64; 2]) -> Vec<[f64; 2]> {
        (self.pad.fn_deriv)(&mut self.pad.deriv, &ksi[..]);
        (0..self.nnode)
            .map(|m| [self.pad.deriv.get(m, 0), self.pad.deriv.get(m, 1)])
            .collect()
    }
}

/// Interpolates the position and covariant basis from nodal coordinates
///
/// # Input
///
/// * `eval` -- shape functions (and derivatives) evaluated at the point
/// * `xx` -- coordinates of the facet nodes (in the local order of the facet)
pub fn interpolate_geometry(eval: &ShapeEval, xx: &[[f64; 3]]) -> PointGeometry {
    let mut geo = PointGeometry {
        x: [0.0; 3],
        tau: [[0.0; 3]; 2],
        x_dd: [[0.0; 3]; 3],
    };
    for m in 0..eval.nn.len() {
        for i in 0..3 {
            geo.x[i] += eval.nn[m] * xx[m][i];
            geo.tau[0][i] += eval.dnn[m][0] * xx[m][i];
            geo.tau[1][i] += eval.dnn[m][1] * xx[m][i];
        }
    }
    for m in 0..eval.ddnn.len() {
        for k in 0..3 {
            for i in 0..3 {
                geo.x_dd[k][i] += eval.ddnn[m][k] * xx[m][i];
            }
        }
    }
    geo
}

/// Holds one FacetShape per kind of facet
///
/// Each thread keeps its own cache because the scratchpads are mutable.
pub struct ShapeCache {
    shapes: HashMap<GeoKind, FacetShape>,
}

impl ShapeCache {
    /// Allocates an empty cache
    pub fn new() -> Self {
        ShapeCache { shapes: HashMap::new() }
    }

    /// Returns the (possibly new) FacetShape of a given kind
    pub fn get(&mut self, kind: GeoKind) -> Result<&mut FacetShape, StrError> {
        if !self.shapes.contains_key(&kind) {
            self.shapes.insert(kind, FacetShape::new(kind)?);
        }
        self.shapes.get_mut(&kind).ok_or("cannot find FacetShape in cache")
    }
}

/// Returns true if the facet is a triangle (otherwise it is a quadrilateral)
#[inline]
pub fn is_triangle(kind: GeoKind) -> bool {
    match kind {
        GeoKind::Tri3 | GeoKind::Tri6 => true,
        _ => false,
    }
}

/// Returns the number of corners (and edges) of a facet
#[inline]
pub fn n_corners(kind: GeoKind) -> usize {
    if is_triangle(kind) {
        3
    } else {
        4
    }
}

/// Returns the natural coordinates of the center of the reference domain
#[inline]
pub fn domain_center(kind: GeoKind) -> [f64; 2] {
    if is_triangle(kind) {
        [1.0 / 3.0, 1.0 / 3.0]
    } else {
        [0.0, 0.0]
    }
}

/// Returns the natural coordinates of the corners of the reference domain
pub fn corner_coords(kind: GeoKind) -> Vec<[f64; 2]> {
    if is_triangle(kind) {
        vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]
    } else {
        vec![[-1.0, -1.0], [1.0, -1.0], [1.0, 1.0], [-1.0, 1.0]]
    }
}

/// Returns the distances by which (r, s) lies outside each edge of the reference domain
///
/// Edge `e` connects the corners `e` and `(e + 1) % n_corners`. Negative values indicate
/// that the point is on the inner side of the edge.
pub fn edge_violations(kind: GeoKind, ksi: &[f64; 2]) -> Vec<f64> {
    let (r, s) = (ksi[0], ksi[1]);
    if is_triangle(kind) {
        vec![-s, r + s - 1.0, -r]
    } else {
        vec![-1.0 - s, r - 1.0, s - 1.0, -1.0 - r]
    }
}

/// Returns true if (r, s) is inside the reference domain (enlarged by `tol`)
pub fn inside_domain(kind: GeoKind, ksi: &[f64; 2], tol: f64) -> bool {
    edge_violations(kind, ksi).iter().all(|v| *v <= tol)
}

/// Returns the most violated edge, if any
pub fn most_violated_edge(kind: GeoKind, ksi: &[f64; 2]) -> Option<usize> {
    let mut edge = None;
    let mut max = 0.0;
    for (e, v) in edge_violations(kind, ksi).iter().enumerate() {
        if *v > max {
            max = *v;
            edge = Some(e);
        }
    }
    edge
}

/// Moves (r, s) to the closest point of the reference domain
pub fn clamp_to_domain(kind: GeoKind, ksi: &[f64; 2]) -> [f64; 2] {
    if is_triangle(kind) {
        let (mut r, mut s) = (f64::max(ksi[0], 0.0), f64::max(ksi[1], 0.0));
        let excess = r + s - 1.0;
        if excess > 0.0 {
            r -= excess / 2.0;
            s -= excess / 2.0;
            if r < 0.0 {
                s += r;
                r = 0.0;
            }
            if s < 0.0 {
                r += s;
                s = 0.0;
            }
        }
        [r, s]
    } else {
        [ksi[0].clamp(-1.0, 1.0), ksi[1].clamp(-1.0, 1.0)]
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use russell_lab::{approx_eq, vec_approx_eq, Vector};

    // Returns a quadratic-like warped Qua8 with mid nodes lifted
    fn warped_qua8() -> Vec<[f64; 3]> {
        vec![
            [0.0, 0.0, 0.0],
            [2.0, 0.0, 0.0],
            [2.0, 2.0, 0.0],
            [0.0, 2.0, 0.0],
            [1.0, 0.0, 0.2],
            [2.0, 1.0, 0.1],
            [1.0, 2.0, 0.2],
            [0.0, 1.0, 0.1],
        ]
    }

    #[test]
    fn facet_shape_new_handles_errors() {
        assert_eq!(
            FacetShape::new(GeoKind::Lin2).err(),
            Some("facet kind is not supported; use Tri3, Tri6, Qua4, Qua8, or Qua9")
        );
    }

    #[test]
    fn eval_works() {
        let mut shape = FacetShape::new(GeoKind::Qua4).unwrap();
        let res = shape.eval(&[0.0, 0.0], false);
        vec_approx_eq(&Vector::from(&res.nn), &[0.25, 0.25, 0.25, 0.25], 1e-15);
        assert_eq!(res.ddnn.len(), 0);
        let res = shape.eval(&[0.3, -0.2], true);
        approx_eq(res.nn.iter().sum::<f64>(), 1.0, 1e-15);
        approx_eq(res.dnn.iter().map(|d| d[0]).sum::<f64>(), 0.0, 1e-15);
        // bilinear: N_m,rr = N_m,ss = 0 and N_0,rs = 1/4
        for m in 0..4 {
            approx_eq(res.ddnn[m][0], 0.0, 1e-10);
            approx_eq(res.ddnn[m][1], 0.0, 1e-10);
        }
        approx_eq(res.ddnn[0][2], 0.25, 1e-10);
        approx_eq(res.ddn(0, 1, 0), 0.25, 1e-10);
        approx_eq(res.ddn(0, 1, 1), 0.0, 1e-10);

        let mut shape = FacetShape::new(GeoKind::Tri3).unwrap();
        let res = shape.eval(&[0.2, 0.3], false);
        vec_approx_eq(&Vector::from(&res.nn), &[0.5, 0.2, 0.3], 1e-15);
    }

    #[test]
    fn second_derivatives_are_accurate() {
        // compare the second derivative of x with a numerical derivative of τ
        let xx = warped_qua8();
        let mut shape = FacetShape::new(GeoKind::Qua8).unwrap();
        let ksi = [0.25, -0.4];
        let geo = interpolate_geometry(&shape.eval(&ksi, true), &xx);
        let h = 1e-5;
        let gp = interpolate_geometry(&shape.eval(&[ksi[0], ksi[1] + h], false), &xx);
        let gm = interpolate_geometry(&shape.eval(&[ksi[0], ksi[1] - h], false), &xx);
        for i in 0..3 {
            approx_eq(geo.x_dd[1][i], (gp.tau[1][i] - gm.tau[1][i]) / (2.0 * h), 1e-8);
            approx_eq(geo.x_dd[2][i], (gp.tau[0][i] - gm.tau[0][i]) / (2.0 * h), 1e-8);
            approx_eq(geo.x_ab(1, 0)[i], geo.x_dd[2][i], 1e-15);
        }
    }

    #[test]
    fn interpolate_geometry_works() {
        let xx = [[0.0, 0.0, 1.0], [2.0, 0.0, 1.0], [2.0, 3.0, 1.0], [0.0, 3.0, 1.0]];
        let mut shape = FacetShape::new(GeoKind::Qua4).unwrap();
        let geo = interpolate_geometry(&shape.eval(&[0.0, 0.0], true), &xx);
        vec_approx_eq(&Vector::from(&geo.x), &[1.0, 1.5, 1.0], 1e-15);
        vec_approx_eq(&Vector::from(&geo.tau[0]), &[1.0, 0.0, 0.0], 1e-15);
        vec_approx_eq(&Vector::from(&geo.tau[1]), &[0.0, 1.5, 0.0], 1e-15);
        vec_approx_eq(&Vector::from(&geo.area_vector()), &[0.0, 0.0, 1.5], 1e-15);
        approx_eq(geo.jacobian(), 1.5, 1e-15);
    }

    #[test]
    fn shape_cache_works() {
        let mut cache = ShapeCache::new();
        assert_eq!(cache.get(GeoKind::Tri6).unwrap().nnode, 6);
        assert_eq!(cache.get(GeoKind::Qua9).unwrap().nnode, 9);
        assert_eq!(cache.get(GeoKind::Tri6).unwrap().kind, GeoKind::Tri6);
        assert_eq!(
            cache.get(GeoKind::Tet4).err(),
            Some("facet kind is not supported; use Tri3, Tri6, Qua4, Qua8, or Qua9")
        );
    }

    #[test]
    fn domain_functions_work() {
        assert_eq!(n_corners(GeoKind::Tri6), 3);
        assert_eq!(n_corners(GeoKind::Qua8), 4);
        assert_eq!(domain_center(GeoKind::Qua4), [0.0, 0.0]);
        assert_eq!(corner_coords(GeoKind::Tri6)[2], [0.0, 1.0]);
        assert_eq!(corner_coords(GeoKind::Qua9)[3], [-1.0, 1.0]);
        for kind in [GeoKind::Tri3, GeoKind::Qua8] {
            for ksi in corner_coords(kind) {
                assert!(inside_domain(kind, &ksi, 1e-15));
            }
        }
        assert!(inside_domain(GeoKind::Qua4, &[1.005, 0.0], 0.01));
        assert!(!inside_domain(GeoKind::Qua4, &[1.02, 0.0], 0.01));
        assert!(inside_domain(GeoKind::Tri3, &[0.5, 0.5], 0.0));
        assert!(!inside_domain(GeoKind::Tri3, &[0.6, 0.5], 0.01));
        assert_eq!(most_violated_edge(GeoKind::Qua4, &[0.0, 0.0]), None);
        assert_eq!(most_violated_edge(GeoKind::Qua4, &[0.5, -1.5]), Some(0));
        assert_eq!(most_violated_edge(GeoKind::Qua4, &[1.5, 1.2]), Some(1));
        assert_eq!(most_violated_edge(GeoKind::Qua4, &[-1.1, 1.5]), Some(2));
        assert_eq!(most_violated_edge(GeoKind::Qua4, &[-1.5, 0.0]), Some(3));
        assert_eq!(most_violated_edge(GeoKind::Tri3, &[0.8, 0.8]), Some(1));
        assert_eq!(most_violated_edge(GeoKind::Tri3, &[-0.1, 0.3]), Some(2));
        assert_eq!(clamp_to_domain(GeoKind::Qua4, &[1.5, -3.0]), [1.0, -1.0]);
        vec_approx_eq(&Vector::from(&clamp_to_domain(GeoKind::Tri3, &[0.8, 0.4])), &[0.7, 0.3], 1e-15);
        vec_approx_eq(&Vector::from(&clamp_to_domain(GeoKind::Tri3, &[1.5, -0.1])), &[1.0, 0.0], 1e-15);
        vec_approx_eq(&Vector::from(&clamp_to_domain(GeoKind::Tri3, &[-2.0, 2.5])), &[0.0, 1.0], 1e-15);
    }
}
