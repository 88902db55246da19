use super::SurfaceGeometry;
use crate::base::{dot3, interpolate_geometry, sub3, unit3, PointGeometry, ShapeCache, ShapeEval};
use crate::StrError;

/// Describes which fields are coupled between a tracked surface and its target
#[derive(Clone, Debug, PartialEq)]
pub struct Coupling {
    /// Both surfaces carry a fluid pressure
    pub poro: bool,

    /// Index of the target solute matching each solute of the tracked surface
    ///
    /// Empty if the surfaces carry no solutes or if one of them is not porous.
    pub solute_map: Vec<usize>,

    /// R·T if the fluid pressure gap uses the effective (osmotic) pressure; zero otherwise
    pub rt: f64,
}

impl Coupling {
    /// Matches the fields of the tracked and target surfaces
    ///
    /// The solutes are matched by their global identifiers. If both surfaces are porous, they
    /// must carry the same set of solutes (a biphasic surface cannot face a multiphasic one).
    pub fn new(tracked: &SurfaceGeometry, target: &SurfaceGeometry, rt: f64) -> Result<Self, StrError> {
        let poro = tracked.porous && target.porous;
        let (na, nb) = (tracked.solute_ids.len(), target.solute_ids.len());
        let mut solute_map = Vec::new();
        if poro {
            if na != nb {
                return Err("surfaces carry different numbers of solutes");
            }
            for id in &tracked.solute_ids {
                let k = target
                    .solute_ids
                    .iter()
                    .position(|other| other == id)
                    .ok_or("surfaces carry different solutes")?;
                solute_map.push(k);
            }
        }
        let rt = if solute_map.is_empty() { 0.0 } else { rt };
        Ok(Coupling { poro, solute_map, rt })
    }

    /// Returns the number of coupled solutes
    pub fn nsolute(&self) -> usize {
        self.solute_map.len()
    }
}

/// Holds the gaps at a projected point and the local data needed to linearize them
#[derive(Clone, Debug)]
pub struct GapData {
    /// Shape functions of the tracked facet at the point
    pub nn_a: Vec<f64>,

    /// Shape functions (and derivatives) of the target facet at the projection
    pub eval_b: ShapeEval,

    /// Geometry of the target facet at the projection (with second derivatives)
    pub geo_b: PointGeometry,

    /// Unit outward normal of the target surface
    pub normal: [f64; 3],

    /// Normal gap g = n · (x − y)
    pub gap: f64,

    /// Effective pressure gap (zero if not poro-coupled)
    pub pressure_gap: f64,

    /// Concentration gaps (one per coupled solute)
    pub concentration_gap: Vec<f64>,

    /// Derivatives of the target effective pressure w.r.t. (r, s)
    pub dp_b: [f64; 2],

    /// Derivatives of the target concentrations w.r.t. (r, s)
    pub dc_b: Vec<[f64; 2]>,

    /// Second derivatives of the target effective pressure w.r.t. (r, s)
    pub ddp_b: [[f64; 2]; 2],

    /// Second derivatives of the target concentrations w.r.t. (r, s)
    pub ddc_b: Vec<[[f64; 2]; 2]>,
}

/// Evaluates the normal, pressure, and concentration gaps of a tracked point
///
/// # Input
///
/// * `fa`, `ksi` -- tracked facet and natural coordinates of the point
/// * `fb`, `rs` -- target facet and natural coordinates of the projection
pub fn evaluate_gaps(
    tracked: &SurfaceGeometry,
    target: &SurfaceGeometry,
    coupling: &Coupling,
    cache: &mut ShapeCache,
    fa: usize,
    ksi: &[f64; 2],
    fb: usize,
    rs: &[f64; 2],
) -> Result<GapData, StrError> {
    let (eval_a, geo_a) = tracked.eval_geometry(cache, fa, ksi, false)?;
    let (eval_b, geo_b) = target.eval_geometry(cache, fb, rs, true)?;
    let normal = unit3(&geo_b.area_vector(), 0.0).ok_or("target facet has zero area at the projection")?;
    let gap = dot3(&normal, &sub3(&geo_a.x, &geo_b.x));
    let nodes_a = &tracked.mesh.facets[fa].points;
    let nodes_b = &target.mesh.facets[fb].points;

    let mut pressure_gap = 0.0;
    let mut dp_b = [0.0, 0.0];
    let mut ddp_b = [[0.0; 2]; 2];
    if coupling.poro {
        for (a, m) in nodes_a.iter().enumerate() {
            pressure_gap += eval_a.nn[a] * tracked.effective_pressure(*m, coupling.rt);
        }
        for (b, m) in nodes_b.iter().enumerate() {
            let p = target.effective_pressure(*m, coupling.rt);
            pressure_gap -= eval_b.nn[b] * p;
            dp_b[0] += eval_b.dnn[b][0] * p;
            dp_b[1] += eval_b.dnn[b][1] * p;
            add_hessian(&mut ddp_b, &eval_b, b, p);
        }
    }

    let nsolute = coupling.nsolute();
    let mut concentration_gap = vec![0.0; nsolute];
    let mut dc_b = vec![[0.0, 0.0]; nsolute];
    let mut ddc_b = vec![[[0.0; 2]; 2]; nsolute];
    for (k, kb) in coupling.solute_map.iter().enumerate() {
        for (a, m) in nodes_a.iter().enumerate() {
            concentration_gap[k] += eval_a.nn[a] * tracked.cc[*m][k];
        }
        for (b, m) in nodes_b.iter().enumerate() {
            let c = target.cc[*m][*kb];
            concentration_gap[k] -= eval_b.nn[b] * c;
            dc_b[k][0] += eval_b.dnn[b][0] * c;
            dc_b[k][1] += eval_b.dnn[b][1] * c;
            add_hessian(&mut ddc_b[k], &eval_b, b, c);
        }
    }

    Ok(GapData {
        nn_a: eval_a.nn,
        eval_b,
        geo_b,
        normal,
        gap,
        pressure_gap,
        concentration_gap,
        dp_b,
        dc_b,
        ddp_b,
        ddc_b,
    })
}

/// Adds the contribution of node m with field value f to the Hessian of an interpolated field
fn add_hessian(hess: &mut [[f64; 2]; 2], eval: &ShapeEval, m: usize, f: f64) {
    for alpha in 0..2 {
        for beta in 0..2 {
            hess[alpha][beta] += eval.ddn(m, alpha, beta) * f;
        }
    }
}

/// Returns the position and the outward normal of a tracked point
///
/// The normal is zero if the facet has no area at the point.
pub fn tracked_position_and_normal(
    tracked: &SurfaceGeometry,
    cache: &mut ShapeCache,
    fa: usize,
    ksi: &[f64; 2],
) -> Result<([f64; 3], [f64; 3]), StrError> {
    let shape = cache.get(tracked.mesh.facets[fa].kind)?;
    let geo = interpolate_geometry(&shape.eval(ksi, false), &tracked.facet_coords(fa));
    let nu = unit3(&geo.area_vector(), 0.0).unwrap_or([0.0; 3]);
    Ok((geo.x, nu))
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{evaluate_gaps, tracked_position_and_normal, Coupling};
    use crate::base::{NodeDofs, SampleSurfaces, ShapeCache};
    use crate::contact::ContactSurface;
    use crate::material::ParamContactMaterial;
    use russell_lab::{approx_eq, vec_approx_eq, Vector};

    fn multiphasic(z: f64, upward: bool, solutes: &[(usize, f64)]) -> ContactSurface {
        let mesh = SampleSurfaces::flat_qua4(0.0, 0.0, 1.0, 1, z, upward);
        let (dofs, _) = NodeDofs::sequential(mesh.npoint(), 0, true, solutes.len());
        let material = ParamContactMaterial::sample_multiphasic(100.0, 1e-3, solutes);
        ContactSurface::new(mesh, dofs, &material).unwrap()
    }

    #[test]
    fn coupling_new_handles_errors() {
        let a = multiphasic(0.1, false, &[(0, 1.0), (1, 1.0)]);
        let b = multiphasic(0.0, true, &[(0, 1.0)]);
        assert_eq!(
            Coupling::new(&a.geo, &b.geo, 1.0).err(),
            Some("surfaces carry different numbers of solutes")
        );
        let b = multiphasic(0.0, true, &[(0, 1.0), (2, 1.0)]);
        assert_eq!(
            Coupling::new(&a.geo, &b.geo, 1.0).err(),
            Some("surfaces carry different solutes")
        );
        // biphasic facing multiphasic
        let b = multiphasic(0.0, true, &[]);
        assert_eq!(
            Coupling::new(&a.geo, &b.geo, 1.0).err(),
            Some("surfaces carry different numbers of solutes")
        );
        assert_eq!(
            Coupling::new(&b.geo, &a.geo, 1.0).err(),
            Some("surfaces carry different numbers of solutes")
        );
    }

    #[test]
    fn coupling_new_works() {
        let a = multiphasic(0.1, false, &[(3, 1.0), (7, 1.0)]);
        let b = multiphasic(0.0, true, &[(7, 1.0), (3, 1.0)]);
        let coupling = Coupling::new(&a.geo, &b.geo, 2.5).unwrap();
        assert_eq!(coupling.poro, true);
        assert_eq!(coupling.solute_map, &[1, 0]);
        assert_eq!(coupling.rt, 2.5);

        // biphasic surfaces: no osmotic effect
        let a = multiphasic(0.1, false, &[]);
        let b = multiphasic(0.0, true, &[]);
        let coupling = Coupling::new(&a.geo, &b.geo, 2.5).unwrap();
        assert_eq!(coupling.poro, true);
        assert_eq!(coupling.nsolute(), 0);
        assert_eq!(coupling.rt, 0.0);

        // solid target: no field is coupled
        let a = multiphasic(0.1, false, &[(3, 1.0)]);
        let mesh = SampleSurfaces::flat_qua4(0.0, 0.0, 1.0, 1, 0.0, true);
        let (dofs, _) = NodeDofs::sequential(mesh.npoint(), 0, false, 0);
        let solid = ContactSurface::new(mesh, dofs, &ParamContactMaterial::sample_solid(1.0)).unwrap();
        let coupling = Coupling::new(&a.geo, &solid.geo, 2.5).unwrap();
        assert_eq!(coupling.poro, false);
        assert_eq!(coupling.nsolute(), 0);
        assert_eq!(coupling.rt, 0.0);
    }

    #[test]
    fn evaluate_gaps_works() {
        // tracked: top (normal -z) at z = 0.1; target: bottom (normal +z) at z = 0
        let mut a = multiphasic(0.1, false, &[(0, 1.0)]);
        let mut b = multiphasic(0.0, true, &[(0, 1.0)]);
        // pressures and concentrations vary linearly with x on the target
        for m in 0..4 {
            a.geo.pp[m] = 3.0;
            a.geo.cc[m][0] = 0.5;
            let x = b.geo.xx[m][0];
            b.geo.pp[m] = 1.0 + 2.0 * x;
            b.geo.cc[m][0] = 0.25 * x;
        }
        let coupling = Coupling::new(&a.geo, &b.geo, 0.1).unwrap();
        let mut cache = ShapeCache::new();

        let (x, nu) = tracked_position_and_normal(&a.geo, &mut cache, 0, &[0.0, 0.0]).unwrap();
        vec_approx_eq(&Vector::from(&x), &[0.5, 0.5, 0.1], 1e-15);
        vec_approx_eq(&Vector::from(&nu), &[0.0, 0.0, -1.0], 1e-15);

        // the tracked point at the center projects onto the center of the target
        let data = evaluate_gaps(&a.geo, &b.geo, &coupling, &mut cache, 0, &[0.0, 0.0], 0, &[0.0, 0.0]).unwrap();
        approx_eq(data.gap, 0.1, 1e-15);
        vec_approx_eq(&Vector::from(&data.normal), &[0.0, 0.0, 1.0], 1e-15);
        // effective pressures: tracked 3 − 0.1·0.5 = 2.95; target (1 + 2·0.5) − 0.1·0.125 = 1.9875
        approx_eq(data.pressure_gap, 2.95 - 1.9875, 1e-15);
        approx_eq(data.concentration_gap[0], 0.5 - 0.125, 1e-15);
        // dP/dr = dP/dx · dx/dr = (2 − 0.1·0.25) · 0.5
        vec_approx_eq(&Vector::from(&data.dp_b), &[0.9875, 0.0], 1e-14);
        vec_approx_eq(&Vector::from(&data.dc_b[0]), &[0.125, 0.0], 1e-15);
        // linear fields have no curvature
        vec_approx_eq(&Vector::from(&data.ddp_b[0]), &[0.0, 0.0], 1e-10);
        vec_approx_eq(&Vector::from(&data.ddp_b[1]), &[0.0, 0.0], 1e-10);

        // bilinear target field c = x·y: ∂²c/∂r∂s = 1/4
        for m in 0..4 {
            b.geo.cc[m][0] = b.geo.xx[m][0] * b.geo.xx[m][1];
        }
        let data = evaluate_gaps(&a.geo, &b.geo, &coupling, &mut cache, 0, &[0.0, 0.0], 0, &[0.0, 0.0]).unwrap();
        vec_approx_eq(&Vector::from(&data.ddc_b[0][0]), &[0.0, 0.25], 1e-10);
        vec_approx_eq(&Vector::from(&data.ddc_b[0][1]), &[0.25, 0.0], 1e-10);

        // penetration
        a.geo.xx.iter_mut().for_each(|x| x[2] = -0.05);
        let data = evaluate_gaps(&a.geo, &b.geo, &coupling, &mut cache, 0, &[0.0, 0.0], 0, &[0.0, 0.0]).unwrap();
        approx_eq(data.gap, -0.05, 1e-15);
    }
}
