use super::{evaluate_gaps, ContactPoint, Coupling, GapData, SurfaceGeometry};
use crate::base::{dot3, symmetrize, Config, ShapeCache, SECOND_DERIV_STEP};
use crate::StrError;
use russell_lab::{Matrix, Vector};

/// Defines the local equations of a pair (tracked facet, target facet)
///
/// The local unknowns are ordered as follows (n = na + nb; tracked nodes come first):
///
/// ```text
/// u: [ux uy uz]₀ ... [ux uy uz]ₙ₋₁    (3·n)
/// p: p₀ ... pₙ₋₁                      (n, if poro-coupled)
/// c: for each coupled solute s: c₀ ... cₙ₋₁
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct PairLayout {
    /// Number of nodes of the tracked facet
    pub na: usize,

    /// Number of nodes of the target facet
    pub nb: usize,

    /// Includes the pressure equations
    pub poro: bool,

    /// Number of coupled solutes
    pub nsolute: usize,

    /// Local-to-global map of equation numbers
    pub l2g: Vec<usize>,
}

impl PairLayout {
    /// Allocates a new instance
    pub fn new(
        tracked: &SurfaceGeometry,
        target: &SurfaceGeometry,
        coupling: &Coupling,
        fa: usize,
        fb: usize,
    ) -> Result<Self, StrError> {
        let nodes_a = &tracked.mesh.facets[fa].points;
        let nodes_b = &target.mesh.facets[fb].points;
        let (na, nb) = (nodes_a.len(), nodes_b.len());
        let mut l2g = Vec::with_capacity((3 + 1 + coupling.nsolute()) * (na + nb));
        for m in nodes_a {
            l2g.extend_from_slice(&tracked.dofs[*m].u);
        }
        for m in nodes_b {
            l2g.extend_from_slice(&target.dofs[*m].u);
        }
        if coupling.poro {
            for m in nodes_a {
                l2g.push(tracked.dofs[*m].p_eq()?);
            }
            for m in nodes_b {
                l2g.push(target.dofs[*m].p_eq()?);
            }
        }
        for (k, kb) in coupling.solute_map.iter().enumerate() {
            for m in nodes_a {
                l2g.push(tracked.dofs[*m].c_eq(k)?);
            }
            for m in nodes_b {
                l2g.push(target.dofs[*m].c_eq(*kb)?);
            }
        }
        Ok(PairLayout {
            na,
            nb,
            poro: coupling.poro,
            nsolute: coupling.nsolute(),
            l2g,
        })
    }

    /// Returns the number of local equations
    pub fn ndof(&self) -> usize {
        self.l2g.len()
    }

    /// Returns the total number of nodes
    #[inline]
    fn n(&self) -> usize {
        self.na + self.nb
    }

    /// Returns the local index of the i-th displacement of node k
    #[inline]
    fn u(&self, k: usize, i: usize) -> usize {
        3 * k + i
    }

    /// Returns the local index of the pressure of node k
    #[inline]
    fn p(&self, k: usize) -> usize {
        3 * self.n() + k
    }

    /// Returns the local index of the s-th concentration of node k
    #[inline]
    fn c(&self, s: usize, k: usize) -> usize {
        let offset = if self.poro { 4 * self.n() } else { 3 * self.n() };
        offset + s * self.n() + k
    }
}

/// Holds the local residual vector and Jacobian matrix of one contact point
pub struct LocalContribution {
    /// Local-to-global map of equation numbers
    pub l2g: Vec<usize>,

    /// Local residual vector
    pub residual: Vector,

    /// Local Jacobian matrix (None if only the residual was requested)
    pub jacobian: Option<Matrix>,
}

/// Holds the derivatives of the projection w.r.t. the displacements of the pair
struct Linearization {
    /// ∂g/∂u (3·n)
    dg: Vec<f64>,

    /// ∂ξ^β/∂u (3·n each)
    dxi: [Vec<f64>; 2],

    /// ∂²g/∂u∂u (3·n × 3·n)
    ddg: Vec<Vec<f64>>,

    /// (a − g b)⁻¹
    aa_inv: [[f64; 2]; 2],
}

/// Inverts a 2×2 matrix
fn inverse2(m: &[[f64; 2]; 2]) -> Result<[[f64; 2]; 2], StrError> {
    let det = m[0][0] * m[1][1] - m[0][1] * m[1][0];
    if det == 0.0 || !det.is_finite() {
        return Err("cannot linearize the projection because the metric is singular");
    }
    Ok([[m[1][1] / det, -m[0][1] / det], [-m[1][0] / det, m[0][0] / det]])
}

/// Linearizes the normal gap and the projected coordinates
///
/// With d = x − y = g n, the closest-point condition d·τα = 0 yields
///
/// ```text
/// (a − g b) Δξ = Dτ + g Tn
/// ```
///
/// where a is the metric, b = n·y,αβ the curvature, Dτα = δd·τα and Tnα = n·δτα.
/// The second variation of the gap is
///
/// ```text
/// Δδg = −a^γβ (Tnβ[Δ] + bβμ Δξ^μ) Dτγ[δ] − Tnβ[δ] Δξ^β
/// ```
fn linearize(layout: &PairLayout, data: &GapData) -> Result<Linearization, StrError> {
    let (na, n) = (layout.na, layout.n());
    let nu = 3 * n;
    let normal = &data.normal;
    let tau = &data.geo_b.tau;
    let g = data.gap;

    // coefficients of the displacements in δd = δx − δy
    let coef: Vec<f64> = (0..n)
        .map(|k| {
            if k < na {
                data.nn_a[k]
            } else {
                -data.eval_b.nn[k - na]
            }
        })
        .collect();

    let mut dg = vec![0.0; nu];
    let mut dtau = [vec![0.0; nu], vec![0.0; nu]];
    let mut tn = [vec![0.0; nu], vec![0.0; nu]];
    for k in 0..n {
        for i in 0..3 {
            let l = layout.u(k, i);
            dg[l] = coef[k] * normal[i];
            for alpha in 0..2 {
                dtau[alpha][l] = coef[k] * tau[alpha][i];
                if k >= na {
                    tn[alpha][l] = data.eval_b.dnn[k - na][alpha] * normal[i];
                }
            }
        }
    }

    let mut a = [[0.0; 2]; 2];
    let mut b = [[0.0; 2]; 2];
    let mut aa = [[0.0; 2]; 2];
    for alpha in 0..2 {
        for beta in 0..2 {
            a[alpha][beta] = dot3(&tau[alpha], &tau[beta]);
            b[alpha][beta] = dot3(normal, data.geo_b.x_ab(alpha, beta));
            aa[alpha][beta] = a[alpha][beta] - g * b[alpha][beta];
        }
    }
    let a_inv = inverse2(&a)?;
    let aa_inv = inverse2(&aa)?;

    let mut dxi = [vec![0.0; nu], vec![0.0; nu]];
    for l in 0..nu {
        for beta in 0..2 {
            for gamma in 0..2 {
                dxi[beta][l] += aa_inv[beta][gamma] * (dtau[gamma][l] + g * tn[gamma][l]);
            }
        }
    }

    let mut ddg = vec![vec![0.0; nu]; nu];
    for i in 0..nu {
        for j in 0..nu {
            let mut sum = 0.0;
            for beta in 0..2 {
                let mut dn = tn[beta][j];
                for mu in 0..2 {
                    dn += b[beta][mu] * dxi[mu][j];
                }
                for gamma in 0..2 {
                    sum -= a_inv[gamma][beta] * dn * dtau[gamma][i];
                }
                sum -= tn[beta][i] * dxi[beta][j];
            }
            ddg[i][j] = sum;
        }
    }
    Ok(Linearization { dg, dxi, ddg, aa_inv })
}

/// Computes n · ∂³y/∂ξα∂ξβ∂ξγ at the projection by central differences of the second derivatives
fn normal_third_derivatives(
    target: &SurfaceGeometry,
    cache: &mut ShapeCache,
    fb: usize,
    rs: &[f64; 2],
    normal: &[f64; 3],
) -> Result<[[[f64; 2]; 2]; 2], StrError> {
    let h = SECOND_DERIV_STEP;
    let mut n_y3 = [[[0.0; 2]; 2]; 2];
    for gamma in 0..2 {
        let mut rs_p = *rs;
        let mut rs_m = *rs;
        rs_p[gamma] += h;
        rs_m[gamma] -= h;
        let (_, geo_p) = target.eval_geometry(cache, fb, &rs_p, true)?;
        let (_, geo_m) = target.eval_geometry(cache, fb, &rs_m, true)?;
        for alpha in 0..2 {
            for beta in 0..2 {
                let diff = dot3(normal, geo_p.x_ab(alpha, beta)) - dot3(normal, geo_m.x_ab(alpha, beta));
                n_y3[alpha][beta][gamma] = diff / (2.0 * h);
            }
        }
    }
    Ok(n_y3)
}

/// Computes the second derivatives of the projected coordinates ∂²ξ^β/∂u∂u (3·n × 3·n each)
///
/// Differentiating the closest-point condition Fα = d·τα = 0 twice yields
///
/// ```text
/// (a − g b) ∂²ξ[i,j] = Fα,ij + Fα,iγ ξγ,j + Fα,jγ ξγ,i + Fα,βγ ξβ,i ξγ,j
/// ```
///
/// where the indices i, j stand for displacements and β, γ for natural coordinates.
fn projection_hessian(
    layout: &PairLayout,
    data: &GapData,
    lin: &Linearization,
    n_y3: &[[[f64; 2]; 2]; 2],
) -> [Vec<Vec<f64>>; 2] {
    let (na, n) = (layout.na, layout.n());
    let nu = 3 * n;
    let tau = &data.geo_b.tau;
    let geo = &data.geo_b;
    let eval = &data.eval_b;
    let d: Vec<f64> = data.normal.iter().map(|v| data.gap * v).collect();

    // coefficient of node k in δd, in δτα, and in δ(∂τα/∂ξγ)
    let coef = |k: usize| if k < na { data.nn_a[k] } else { -eval.nn[k - na] };
    let m1 = |k: usize, alpha: usize| if k < na { 0.0 } else { eval.dnn[k - na][alpha] };
    let m2 = |k: usize, alpha: usize, gamma: usize| if k < na { 0.0 } else { eval.ddn(k - na, alpha, gamma) };

    // Fα,iγ
    let mut f_u_xi = vec![[[0.0; 2]; 2]; nu];
    for k in 0..n {
        for c in 0..3 {
            let i = layout.u(k, c);
            for alpha in 0..2 {
                for gamma in 0..2 {
                    f_u_xi[i][alpha][gamma] = -m1(k, gamma) * tau[alpha][c] + coef(k) * geo.x_ab(alpha, gamma)[c]
                        - tau[gamma][c] * m1(k, alpha)
                        + d[c] * m2(k, alpha, gamma);
                }
            }
        }
    }

    // Fα,βγ
    let mut f_xi_xi = [[[0.0; 2]; 2]; 2];
    for alpha in 0..2 {
        for beta in 0..2 {
            for gamma in 0..2 {
                f_xi_xi[alpha][beta][gamma] = -dot3(geo.x_ab(beta, gamma), &tau[alpha])
                    - dot3(&tau[beta], geo.x_ab(alpha, gamma))
                    - dot3(&tau[gamma], geo.x_ab(alpha, beta))
                    + data.gap * n_y3[alpha][beta][gamma];
            }
        }
    }

    let dxi = &lin.dxi;
    let mut ddxi = [vec![vec![0.0; nu]; nu], vec![vec![0.0; nu]; nu]];
    for i in 0..nu {
        let (ki, ci) = (i / 3, i % 3);
        for j in 0..nu {
            let (kj, cj) = (j / 3, j % 3);
            let mut rhs = [0.0; 2];
            for alpha in 0..2 {
                if ci == cj {
                    rhs[alpha] += coef(ki) * m1(kj, alpha) + coef(kj) * m1(ki, alpha);
                }
                for gamma in 0..2 {
                    rhs[alpha] += f_u_xi[i][alpha][gamma] * dxi[gamma][j] + f_u_xi[j][alpha][gamma] * dxi[gamma][i];
                    for beta in 0..2 {
                        rhs[alpha] += f_xi_xi[alpha][beta][gamma] * dxi[beta][i] * dxi[gamma][j];
                    }
                }
            }
            for beta in 0..2 {
                ddxi[beta][i][j] = lin.aa_inv[beta][0] * rhs[0] + lin.aa_inv[beta][1] * rhs[1];
            }
        }
    }
    ddxi
}

/// Adds the terms of a scalar field gap (pressure or concentration) with flux w = λ + ε g
///
/// # Input
///
/// * `base` -- local index of the field at the first node (the field at node k is at `base + k`)
/// * `db` -- derivatives of the interpolated target field w.r.t. (r, s)
/// * `ddb` -- second derivatives of the interpolated target field w.r.t. (r, s)
/// * `ddxi` -- second derivatives of the projected coordinates (None skips the curvature terms)
/// * `osmotic` -- (base of a coupled concentration, R·T) pairs, for the effective pressure p − R·T Σc
#[allow(clippy::too_many_arguments)]
fn add_field_terms(
    residual: &mut Vector,
    jacobian: Option<&mut Matrix>,
    layout: &PairLayout,
    lin: &Linearization,
    data: &GapData,
    base: usize,
    db: &[f64; 2],
    ddb: &[[f64; 2]; 2],
    ddxi: Option<&[Vec<Vec<f64>>; 2]>,
    osmotic: &[(usize, f64)],
    flux: f64,
    eps: f64,
    wj0: f64,
    knmult: f64,
) {
    let (na, n) = (layout.na, layout.n());
    let ndof = layout.ndof();
    let nu = 3 * n;

    // ∂g_f
    let mut dgf = vec![0.0; ndof];
    for l in 0..nu {
        dgf[l] = -(db[0] * lin.dxi[0][l] + db[1] * lin.dxi[1][l]);
    }
    for k in 0..n {
        let nk = if k < na { data.nn_a[k] } else { -data.eval_b.nn[k - na] };
        dgf[base + k] += nk;
        for (c, rt) in osmotic {
            dgf[c + k] -= rt * nk;
        }
    }
    for l in 0..ndof {
        residual[l] += wj0 * flux * dgf[l];
    }

    if let Some(kk) = jacobian {
        for i in 0..ndof {
            for j in 0..ndof {
                kk.set(i, j, kk.get(i, j) + wj0 * eps * dgf[i] * dgf[j]);
            }
        }
        // mixed (target field, displacement) terms of ∂²g_f
        for b in 0..layout.nb {
            let dn = &data.eval_b.dnn[b];
            let k = na + b;
            for l in 0..nu {
                let v = -(dn[0] * lin.dxi[0][l] + dn[1] * lin.dxi[1][l]);
                let add = wj0 * knmult * flux * v;
                kk.set(base + k, l, kk.get(base + k, l) + add);
                kk.set(l, base + k, kk.get(l, base + k) + add);
                for (c, rt) in osmotic {
                    let add = -rt * wj0 * knmult * flux * v;
                    kk.set(c + k, l, kk.get(c + k, l) + add);
                    kk.set(l, c + k, kk.get(l, c + k) + add);
                }
            }
        }
        // displacement-displacement terms of ∂²g_f = −(f,αβ ξα,i ξβ,j + f,α ξα,ij)
        if let Some(ddxi) = ddxi {
            for i in 0..nu {
                for j in 0..nu {
                    let mut v = 0.0;
                    for alpha in 0..2 {
                        v -= db[alpha] * ddxi[alpha][i][j];
                        for beta in 0..2 {
                            v -= ddb[alpha][beta] * lin.dxi[alpha][i] * lin.dxi[beta][j];
                        }
                    }
                    kk.set(i, j, kk.get(i, j) + wj0 * knmult * flux * v);
                }
            }
        }
    }
}

/// Computes the local residual and Jacobian of an active contact point
///
/// Returns None if the point is not active.
///
/// The normal traction t = ⟨λ − ε g⟩ contributes R = −w J₀ t ∂g and K = w J₀ (ε ∂g ⊗ ∂g − t ∂²g).
/// The fluid and solute fluxes w = λ + ε g contribute R = w J₀ w ∂g and K = w J₀ (ε ∂g ⊗ ∂g + w ∂²g).
/// J₀ is the reference area Jacobian. The terms with second derivatives are scaled by `knmult`.
pub fn point_contribution(
    tracked: &SurfaceGeometry,
    target: &SurfaceGeometry,
    coupling: &Coupling,
    config: &Config,
    cache: &mut ShapeCache,
    point: &ContactPoint,
    with_jacobian: bool,
) -> Result<Option<LocalContribution>, StrError> {
    let fb = match point.target {
        Some(fb) => fb,
        None => return Ok(None),
    };
    if !point.status.active() {
        return Ok(None);
    }
    let data = evaluate_gaps(tracked, target, coupling, cache, point.facet, &point.ksi, fb, &point.rs)?;
    let layout = PairLayout::new(tracked, target, coupling, point.facet, fb)?;
    let lin = linearize(&layout, &data)?;
    let ndof = layout.ndof();
    let nu = 3 * layout.n();
    let wj0 = point.weight * point.jac0;
    let knmult = config.knmult;
    let tn = f64::max(0.0, point.lambda_n - point.eps_n * data.gap);
    let ddxi = if with_jacobian && knmult != 0.0 && (coupling.poro || layout.nsolute > 0) {
        let n_y3 = normal_third_derivatives(target, cache, fb, &point.rs, &data.normal)?;
        Some(projection_hessian(&layout, &data, &lin, &n_y3))
    } else {
        None
    };

    // normal traction
    let mut residual = Vector::new(ndof);
    for l in 0..nu {
        residual[l] = -wj0 * tn * lin.dg[l];
    }
    let mut jacobian = if with_jacobian {
        let mut kk = Matrix::new(ndof, ndof);
        for i in 0..nu {
            for j in 0..nu {
                kk.set(i, j, wj0 * (point.eps_n * lin.dg[i] * lin.dg[j] - knmult * tn * lin.ddg[i][j]));
            }
        }
        Some(kk)
    } else {
        None
    };

    // fluid flux
    if coupling.poro {
        let flux = point.lambda_p + point.eps_p * data.pressure_gap;
        let osmotic: Vec<(usize, f64)> = if coupling.rt != 0.0 {
            (0..layout.nsolute).map(|s| (layout.c(s, 0), coupling.rt)).collect()
        } else {
            Vec::new()
        };
        add_field_terms(
            &mut residual,
            jacobian.as_mut(),
            &layout,
            &lin,
            &data,
            layout.p(0),
            &data.dp_b,
            &data.ddp_b,
            ddxi.as_ref(),
            &osmotic,
            flux,
            point.eps_p,
            wj0,
            knmult,
        );
    }

    // solute fluxes
    for s in 0..layout.nsolute {
        let flux = point.lambda_c[s] + point.eps_c[s] * data.concentration_gap[s];
        add_field_terms(
            &mut residual,
            jacobian.as_mut(),
            &layout,
            &lin,
            &data,
            layout.c(s, 0),
            &data.dc_b[s],
            &data.ddc_b[s],
            ddxi.as_ref(),
            &[],
            flux,
            point.eps_c[s],
            wj0,
            knmult,
        );
    }

    if config.symmetric_stiffness {
        if let Some(kk) = jacobian.as_mut() {
            symmetrize(kk);
        }
    }
    Ok(Some(LocalContribution {
        l2g: layout.l2g,
        residual,
        jacobian,
    }))
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
