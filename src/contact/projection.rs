use super::SurfaceGeometry;
use crate::base::{
    domain_center, dot3, edge_violations, inside_domain, interpolate_geometry, most_violated_edge, norm3, sub3, unit3,
    Config, ShapeCache, GLOBAL_SEARCH_N_CANDIDATES, PROJECTION_MAX_DRIFT, PROJECTION_NEWTON_TOL,
    PROJECTION_N_MAX_ITERATIONS,
};
use crate::StrError;

/// Holds the result of a closest-point projection
#[derive(Clone, Debug, PartialEq)]
pub struct Projection {
    /// Target facet
    pub facet: usize,

    /// Natural coordinates on the target facet
    pub rs: [f64; 2],

    /// Signed normal gap g = n · (x − y)
    pub gap: f64,

    /// Unit normal of the target surface at the projected point
    pub normal: [f64; 3],
}

/// Holds the outcome of the Newton iterations on one facet
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum FacetAttempt {
    /// Converged inside the (enlarged) domain
    Inside([f64; 2]),

    /// Converged outside the domain; the most violated edge is given
    Outside(usize),

    /// Singular, not converged, drifted beyond a neighbor, or degenerate facet
    Lost,
}

/// Finds the closest point of a facet to x by Newton iterations
///
/// Minimizes ½|x − y(ξ)|² with the residual fα = (x − y)·τα and the Hessian
/// Hαβ = τα·τβ − (x − y)·y,αβ. The iterations stop when |Δξ| is below the tolerance
/// without applying the last increment; thus, restarting from a converged ξ returns ξ.
pub(crate) fn newton_closest_point(
    target: &SurfaceGeometry,
    cache: &mut ShapeCache,
    f: usize,
    x: &[f64; 3],
    ksi_ini: &[f64; 2],
) -> Result<Option<[f64; 2]>, StrError> {
    let kind = target.mesh.facets[f].kind;
    let xx = target.facet_coords(f);
    let shape = cache.get(kind)?;
    let mut ksi = *ksi_ini;
    for _ in 0..PROJECTION_N_MAX_ITERATIONS {
        let geo = interpolate_geometry(&shape.eval(&ksi, true), &xx);
        let d = sub3(x, &geo.x);
        let (t1, t2) = (&geo.tau[0], &geo.tau[1]);
        let f1 = dot3(&d, t1);
        let f2 = dot3(&d, t2);
        let h11 = dot3(t1, t1) - dot3(&d, geo.x_ab(0, 0));
        let h12 = dot3(t1, t2) - dot3(&d, geo.x_ab(0, 1));
        let h22 = dot3(t2, t2) - dot3(&d, geo.x_ab(1, 1));
        let det = h11 * h22 - h12 * h12;
        if det == 0.0 || !det.is_finite() {
            return Ok(None);
        }
        let dr = (h22 * f1 - h12 * f2) / det;
        let ds = (h11 * f2 - h12 * f1) / det;
        if f64::sqrt(dr * dr + ds * ds) < PROJECTION_NEWTON_TOL {
            return Ok(Some(ksi));
        }
        ksi[0] += dr;
        ksi[1] += ds;
        if edge_violations(kind, &ksi).iter().any(|v| *v > PROJECTION_MAX_DRIFT) {
            return Ok(None);
        }
    }
    Ok(None)
}

/// Projects x onto a facet and classifies the outcome
pub(crate) fn attempt_facet(
    target: &SurfaceGeometry,
    cache: &mut ShapeCache,
    f: usize,
    x: &[f64; 3],
    ksi_ini: &[f64; 2],
    stol: f64,
) -> Result<FacetAttempt, StrError> {
    if target.degenerate(cache, f)? {
        return Ok(FacetAttempt::Lost);
    }
    let kind = target.mesh.facets[f].kind;
    match newton_closest_point(target, cache, f, x, ksi_ini)? {
        Some(ksi) => {
            if inside_domain(kind, &ksi, stol) {
                Ok(FacetAttempt::Inside(ksi))
            } else {
                match most_violated_edge(kind, &ksi) {
                    Some(edge) => Ok(FacetAttempt::Outside(edge)),
                    None => Ok(FacetAttempt::Lost),
                }
            }
        }
        None => Ok(FacetAttempt::Lost),
    }
}

/// Computes the gap at a converged projection and checks the acceptance criteria
///
/// The projection is rejected if the surfaces do not face each other (n · ν ≥ 0, where ν is
/// the normal of the tracked surface) or if |g| exceeds the search radius.
pub(crate) fn accept_projection(
    target: &SurfaceGeometry,
    cache: &mut ShapeCache,
    f: usize,
    rs: [f64; 2],
    x: &[f64; 3],
    nu: &[f64; 3],
    search_radius: f64,
) -> Result<Option<Projection>, StrError> {
    let (_, geo) = target.eval_geometry(cache, f, &rs, false)?;
    let normal = match unit3(&geo.area_vector(), 0.0) {
        Some(n) => n,
        None => return Ok(None),
    };
    if norm3(nu) > 0.0 && dot3(&normal, nu) >= 0.0 {
        return Ok(None);
    }
    let gap = dot3(&normal, &sub3(x, &geo.x));
    if f64::abs(gap) > search_radius {
        return Ok(None);
    }
    Ok(Some(Projection {
        facet: f,
        rs,
        gap,
        normal,
    }))
}

/// Finds the projection of a point of the tracked surface onto the target surface
///
/// # Input
///
/// * `x` -- current position of the tracked point
/// * `nu` -- outward normal of the tracked surface at x
/// * `previous` -- previous (facet, natural coordinates), if any
/// * `update_segments` -- whether the projection may move to another facet
///
/// With a previous projection, the search starts on the previous facet. If the closest point
/// falls outside it, the neighbor across the violated edge is tried once, and then the global
/// search runs. Without segment updates, points stay on their facet or become unprojected.
pub(crate) fn project_point(
    target: &SurfaceGeometry,
    cache: &mut ShapeCache,
    config: &Config,
    x: &[f64; 3],
    nu: &[f64; 3],
    previous: Option<(usize, [f64; 2])>,
    update_segments: bool,
) -> Result<Option<Projection>, StrError> {
    let (stol, srad) = (config.stol, config.search_radius);
    if let Some((f0, rs0)) = previous {
        match attempt_facet(target, cache, f0, x, &rs0, stol)? {
            FacetAttempt::Inside(rs) => {
                let res = accept_projection(target, cache, f0, rs, x, nu, srad)?;
                if res.is_some() || !update_segments {
                    return Ok(res);
                }
            }
            FacetAttempt::Outside(edge) => {
                if !update_segments {
                    return Ok(None);
                }
                if let Some(f1) = target.neighbors[f0][edge] {
                    let center = domain_center(target.mesh.facets[f1].kind);
                    if let FacetAttempt::Inside(rs) = attempt_facet(target, cache, f1, x, &center, stol)? {
                        let res = accept_projection(target, cache, f1, rs, x, nu, srad)?;
                        if res.is_some() {
                            return Ok(res);
                        }
                    }
                }
            }
            FacetAttempt::Lost => {
                if !update_segments {
                    return Ok(None);
                }
            }
        }
    } else if !update_segments {
        return Ok(None);
    }
    global_search(target, cache, config, x, nu)
}

/// Performs the global search of the closest facet
///
/// The seed node minimizes |d|² − ½(d·νₘ)², where d = x − xₘ and νₘ is the node normal; hence
/// nodes along the normal direction are preferred. The facets around the seed node and their
/// neighbors are tried first; if none succeeds, the nearest facets (by centroid) are tried.
/// The accepted projection with the smallest |g| wins.
pub(crate) fn global_search(
    target: &SurfaceGeometry,
    cache: &mut ShapeCache,
    config: &Config,
    x: &[f64; 3],
    nu: &[f64; 3],
) -> Result<Option<Projection>, StrError> {
    let npoint = target.npoint();
    if npoint == 0 {
        return Ok(None);
    }

    // seed node
    let mut seed = 0;
    let mut min = f64::MAX;
    for m in 0..npoint {
        let d = sub3(x, &target.xx[m]);
        let dn = dot3(&d, &target.node_normals[m]);
        let measure = dot3(&d, &d) - 0.5 * dn * dn;
        if measure < min {
            min = measure;
            seed = m;
        }
    }

    // facets around the seed node and their neighbors
    let mut candidates: Vec<usize> = Vec::new();
    for f in &target.node_facets[seed] {
        if !candidates.contains(f) {
            candidates.push(*f);
        }
    }
    let n_first = candidates.len();
    for i in 0..n_first {
        for neighbor in target.neighbors[candidates[i]].iter().flatten() {
            if !candidates.contains(neighbor) {
                candidates.push(*neighbor);
            }
        }
    }
    let mut best = try_candidates(target, cache, config, x, nu, &candidates)?;

    // brute force over the nearest facets
    if best.is_none() {
        let mut others: Vec<(f64, usize)> = (0..target.nfacet())
            .filter(|f| !candidates.contains(f))
            .map(|f| {
                let xx = target.facet_coords(f);
                let n = xx.len() as f64;
                let mut c = [0.0; 3];
                for p in &xx {
                    for i in 0..3 {
                        c[i] += p[i] / n;
                    }
                }
                let d = sub3(x, &c);
                (dot3(&d, &d), f)
            })
            .collect();
        others.sort_by(|a, b| a.0.total_cmp(&b.0));
        let nearest: Vec<usize> = others
            .iter()
            .take(GLOBAL_SEARCH_N_CANDIDATES)
            .map(|(_, f)| *f)
            .collect();
        best = try_candidates(target, cache, config, x, nu, &nearest)?;
    }
    Ok(best)
}

/// Tries a list of facets and returns the accepted projection with the smallest |g|
fn try_candidates(
    target: &SurfaceGeometry,
    cache: &mut ShapeCache,
    config: &Config,
    x: &[f64; 3],
    nu: &[f64; 3],
    candidates: &[usize],
) -> Result<Option<Projection>, StrError> {
    let mut best: Option<Projection> = None;
    for f in candidates {
        let center = domain_center(target.mesh.facets[*f].kind);
        if let FacetAttempt::Inside(rs) = attempt_facet(target, cache, *f, x, &center, config.stol)? {
            if let Some(proj) = accept_projection(target, cache, *f, rs, x, nu, config.search_radius)? {
                let better = match &best {
                    Some(b) => f64::abs(proj.gap) < f64::abs(b.gap),
                    None => true,
                };
                if better {
                    best = Some(proj);
                }
            }
        }
    }
    Ok(best)
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
