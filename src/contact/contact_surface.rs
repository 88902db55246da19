use crate::base::{
    corner_coords, dot3, domain_center, facet_integ_points, interpolate_geometry, n_corners, norm3, unit3,
    ContactStatus, NodeDofs, PointGeometry, ShapeCache, ShapeEval, SurfaceMesh, DEGENERATE_AREA_RATIO,
};
use crate::material::ContactMaterial;
use crate::StrError;
use russell_lab::Vector;
use std::collections::HashMap;

/// Holds the persistent state of an integration point of a contact surface
///
/// A point is addressed by the stable key (facet, index).
#[derive(Clone, Debug, PartialEq)]
pub struct ContactPoint {
    /// Index of the facet owning this point
    pub facet: usize,

    /// Index of the integration point within the facet
    pub index: usize,

    /// Natural coordinates of the integration point on its own facet
    pub ksi: [f64; 2],

    /// Integration weight
    pub weight: f64,

    /// Area Jacobian in the reference configuration
    pub jac0: f64,

    /// Facet of the opposing surface onto which this point projects
    pub target: Option<usize>,

    /// Natural coordinates of the projection on the target facet
    pub rs: [f64; 2],

    /// Contact state
    pub status: ContactStatus,

    /// Normal gap (negative means penetration)
    pub gap: f64,

    /// Fluid (effective) pressure gap
    pub pressure_gap: f64,

    /// Concentration gaps (one per solute of the surface material)
    pub concentration_gap: Vec<f64>,

    /// Lagrange multiplier of the normal traction
    pub lambda_n: f64,

    /// Lagrange multiplier of the fluid flux
    pub lambda_p: f64,

    /// Lagrange multipliers of the solute fluxes
    pub lambda_c: Vec<f64>,

    /// Normal penalty factor
    pub eps_n: f64,

    /// Pressure penalty factor
    pub eps_p: f64,

    /// Concentration penalty factors
    pub eps_c: Vec<f64>,

    /// Net contact pressure (for reporting only)
    pub net_pressure: f64,
}

impl ContactPoint {
    /// Allocates a new (unprojected) point
    pub fn new(facet: usize, index: usize, ksi: [f64; 2], weight: f64, jac0: f64, nsolute: usize) -> Self {
        ContactPoint {
            facet,
            index,
            ksi,
            weight,
            jac0,
            target: None,
            rs: [0.0, 0.0],
            status: ContactStatus::Unprojected,
            gap: 0.0,
            pressure_gap: 0.0,
            concentration_gap: vec![0.0; nsolute],
            lambda_n: 0.0,
            lambda_p: 0.0,
            lambda_c: vec![0.0; nsolute],
            eps_n: 0.0,
            eps_p: 0.0,
            eps_c: vec![0.0; nsolute],
            net_pressure: 0.0,
        }
    }

    /// Returns the normal traction t_n = ⟨λ_n − ε_n g⟩ (zero if unprojected)
    pub fn traction(&self) -> f64 {
        if self.status.projected() {
            f64::max(0.0, self.lambda_n - self.eps_n * self.gap)
        } else {
            0.0
        }
    }

    /// Returns the fluid flux λ_p + ε_p g_p
    pub fn fluid_flux(&self) -> f64 {
        self.lambda_p + self.eps_p * self.pressure_gap
    }

    /// Returns the flux λ_c + ε_c g_c of the k-th solute
    pub fn solute_flux(&self, k: usize) -> f64 {
        self.lambda_c[k] + self.eps_c[k] * self.concentration_gap[k]
    }

    /// Marks the point as unprojected and clears its gaps
    pub fn release(&mut self) {
        self.target = None;
        self.status = ContactStatus::Unprojected;
        self.gap = 0.0;
        self.pressure_gap = 0.0;
        self.concentration_gap.iter_mut().for_each(|g| *g = 0.0);
    }
}

/// Holds the geometry, DOF maps, material data, and current nodal values of a surface
pub struct SurfaceGeometry {
    /// Facets and reference coordinates
    pub mesh: SurfaceMesh,

    /// Global equation numbers of each surface node
    pub dofs: Vec<NodeDofs>,

    /// Carries a fluid pressure field
    pub porous: bool,

    /// Global identifiers of the solutes
    pub solute_ids: Vec<usize>,

    /// Stiffness measure of the material (for auto-penalty)
    pub stiffness: f64,

    /// Permeability of the material (for auto-penalty)
    pub permeability: f64,

    /// Diffusivities of the solutes (for auto-penalty)
    pub diffusivities: Vec<f64>,

    /// Index of the first point of each facet (len = nfacet + 1)
    pub offsets: Vec<usize>,

    /// Neighbor facet across each edge of each facet
    pub neighbors: Vec<Vec<Option<usize>>>,

    /// Facets sharing each node
    pub node_facets: Vec<Vec<usize>>,

    /// Area Jacobian at the center of each facet in the reference configuration
    pub ref_jacobians: Vec<f64>,

    /// Current nodal coordinates
    pub xx: Vec<[f64; 3]>,

    /// Current nodal fluid pressures
    pub pp: Vec<f64>,

    /// Current nodal concentrations (node, solute)
    pub cc: Vec<Vec<f64>>,

    /// Averaged outward normals at nodes
    pub node_normals: Vec<[f64; 3]>,

    /// Normal penalty factor of each facet
    pub facet_eps_n: Vec<f64>,

    /// Pressure penalty factor of each facet
    pub facet_eps_p: Vec<f64>,

    /// Concentration penalty factors of each facet (facet, solute)
    pub facet_eps_c: Vec<Vec<f64>>,
}

/// Holds a contact surface: geometry and the state of all integration points
pub struct ContactSurface {
    /// Geometry, DOFs, and current nodal values
    pub geo: SurfaceGeometry,

    /// All integration points, facet by facet
    pub points: Vec<ContactPoint>,
}

impl ContactSurface {
    /// Allocates a new instance
    ///
    /// The material capabilities are queried once and cached.
    pub fn new(mesh: SurfaceMesh, dofs: Vec<NodeDofs>, material: &dyn ContactMaterial) -> Result<Self, StrError> {
        mesh.validate()?;
        if dofs.len() != mesh.npoint() {
            return Err("number of NodeDofs must equal the number of surface points");
        }
        let porous = material.porous();
        let nsolute = material.solute_count();
        if nsolute > 0 && !porous {
            return Err("solutes require a porous material");
        }
        for d in &dofs {
            if porous && d.p.is_none() {
                return Err("porous surface requires a pressure DOF at every node");
            }
            if d.c.len() < nsolute {
                return Err("surface nodes must have one concentration DOF per solute");
            }
        }
        let solute_ids = (0..nsolute)
            .map(|k| material.solute_id(k))
            .collect::<Result<Vec<_>, _>>()?;
        let diffusivities = (0..nsolute)
            .map(|k| material.diffusivity(k))
            .collect::<Result<Vec<_>, _>>()?;

        // integration points and reference data
        let (npoint, nfacet) = (mesh.npoint(), mesh.nfacet());
        let mut cache = ShapeCache::new();
        let mut offsets = Vec::with_capacity(nfacet + 1);
        let mut ref_jacobians = Vec::with_capacity(nfacet);
        let mut points = Vec::new();
        for (f, facet) in mesh.facets.iter().enumerate() {
            offsets.push(points.len());
            let xx0: Vec<[f64; 3]> = facet.points.iter().map(|p| mesh.coords[*p]).collect();
            let shape = cache.get(facet.kind)?;
            let center = interpolate_geometry(&shape.eval(&domain_center(facet.kind), false), &xx0);
            let jac_center = center.jacobian();
            if jac_center <= 0.0 {
                return Err("facet has zero area in the reference configuration");
            }
            ref_jacobians.push(jac_center);
            for (index, ip) in facet_integ_points(facet.kind)?.iter().enumerate() {
                let ksi = [ip[0], ip[1]];
                let geo = interpolate_geometry(&shape.eval(&ksi, false), &xx0);
                points.push(ContactPoint::new(f, index, ksi, ip[2], geo.jacobian(), nsolute));
            }
        }
        offsets.push(points.len());

        // connectivity
        let neighbors = find_neighbors(&mesh);
        let mut node_facets = vec![Vec::new(); npoint];
        for (f, facet) in mesh.facets.iter().enumerate() {
            for p in &facet.points {
                node_facets[*p].push(f);
            }
        }

        let xx = mesh.coords.clone();
        let mut surface = ContactSurface {
            geo: SurfaceGeometry {
                mesh,
                dofs,
                porous,
                solute_ids,
                stiffness: material.stiffness(),
                permeability: material.permeability(),
                diffusivities,
                offsets,
                neighbors,
                node_facets,
                ref_jacobians,
                xx,
                pp: vec![0.0; npoint],
                cc: vec![vec![0.0; nsolute]; npoint],
                node_normals: vec![[0.0; 3]; npoint],
                facet_eps_n: vec![0.0; nfacet],
                facet_eps_p: vec![0.0; nfacet],
                facet_eps_c: vec![vec![0.0; nsolute]; nfacet],
            },
            points,
        };
        surface.geo.update_node_normals(&mut cache)?;
        Ok(surface)
    }

    /// Returns the number of solutes
    pub fn nsolute(&self) -> usize {
        self.geo.solute_ids.len()
    }

    /// Returns the points of a facet
    pub fn facet_points(&self, f: usize) -> &[ContactPoint] {
        &self.points[self.geo.offsets[f]..self.geo.offsets[f + 1]]
    }

    /// Returns the point with key (facet, index)
    pub fn point(&self, facet: usize, index: usize) -> Option<&ContactPoint> {
        if facet >= self.geo.mesh.nfacet() {
            return None;
        }
        self.facet_points(facet).get(index)
    }

    /// Returns the number of points in contact (active)
    pub fn n_active(&self) -> usize {
        self.points.iter().filter(|p| p.status.active()).count()
    }
}

impl SurfaceGeometry {
    /// Returns the number of nodes
    pub fn npoint(&self) -> usize {
        self.mesh.npoint()
    }

    /// Returns the number of facets
    pub fn nfacet(&self) -> usize {
        self.mesh.nfacet()
    }

    /// Returns the largest global equation number referenced by this surface
    pub fn max_equation(&self) -> usize {
        let mut max = 0;
        for d in &self.dofs {
            max = usize::max(max, d.u.iter().copied().max().unwrap_or(0));
            if let Some(p) = d.p {
                max = usize::max(max, p);
            }
            max = usize::max(max, d.c.iter().copied().max().unwrap_or(0));
        }
        max
    }

    /// Returns the number of unknowns per node (displacements, pressure, and concentrations)
    pub fn ndof_per_node(&self) -> usize {
        3 + if self.porous { 1 } else { 0 } + self.solute_ids.len()
    }

    /// Gathers the current coordinates, pressures, and concentrations from the global vector
    pub fn update_current(&mut self, uu: &Vector) -> Result<(), StrError> {
        if self.npoint() > 0 && self.max_equation() >= uu.dim() {
            return Err("global vector is too small for the surface equations");
        }
        let nsolute = self.solute_ids.len();
        for m in 0..self.npoint() {
            let dofs = &self.dofs[m];
            for i in 0..3 {
                self.xx[m][i] = self.mesh.coords[m][i] + uu[dofs.u[i]];
            }
            if let Some(p) = dofs.p {
                self.pp[m] = uu[p];
            }
            for k in 0..nsolute {
                self.cc[m][k] = uu[dofs.c[k]];
            }
        }
        Ok(())
    }

    /// Returns the current coordinates of the nodes of a facet
    pub fn facet_coords(&self, f: usize) -> Vec<[f64; 3]> {
        self.mesh.facets[f].points.iter().map(|p| self.xx[*p]).collect()
    }

    /// Evaluates shape functions and the current geometry at a point of a facet
    pub fn eval_geometry(
        &self,
        cache: &mut ShapeCache,
        f: usize,
        ksi: &[f64; 2],
        second: bool,
    ) -> Result<(ShapeEval, PointGeometry), StrError> {
        let shape = cache.get(self.mesh.facets[f].kind)?;
        let eval = shape.eval(ksi, second);
        let geo = interpolate_geometry(&eval, &self.facet_coords(f));
        Ok((eval, geo))
    }

    /// Returns the effective pressure of a node: p − rt Σc (use rt = 0 for the plain pressure)
    pub fn effective_pressure(&self, m: usize, rt: f64) -> f64 {
        if rt == 0.0 {
            self.pp[m]
        } else {
            self.pp[m] - rt * self.cc[m].iter().sum::<f64>()
        }
    }

    /// Returns the current area of a facet
    pub fn facet_area(&self, cache: &mut ShapeCache, f: usize) -> Result<f64, StrError> {
        let kind = self.mesh.facets[f].kind;
        let xx = self.facet_coords(f);
        let shape = cache.get(kind)?;
        let mut area = 0.0;
        for ip in facet_integ_points(kind)? {
            let geo = interpolate_geometry(&shape.eval(&[ip[0], ip[1]], false), &xx);
            area += ip[2] * geo.jacobian();
        }
        Ok(area)
    }

    /// Returns true if the facet collapsed or folded over itself
    ///
    /// A facet is degenerate if its area Jacobian at the center drops below a fraction of the
    /// reference one, or if the normal at a corner opposes the normal at the center.
    pub fn degenerate(&self, cache: &mut ShapeCache, f: usize) -> Result<bool, StrError> {
        let kind = self.mesh.facets[f].kind;
        let xx = self.facet_coords(f);
        let shape = cache.get(kind)?;
        let center = interpolate_geometry(&shape.eval(&domain_center(kind), false), &xx).area_vector();
        if norm3(&center) <= DEGENERATE_AREA_RATIO * self.ref_jacobians[f] {
            return Ok(true);
        }
        for ksi in corner_coords(kind) {
            let corner = interpolate_geometry(&shape.eval(&ksi, false), &xx).area_vector();
            if dot3(&corner, &center) <= 0.0 {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Calculates the nodal normals by averaging the area vectors of the adjacent facets
    pub fn update_node_normals(&mut self, cache: &mut ShapeCache) -> Result<(), StrError> {
        let mut sums = vec![[0.0; 3]; self.npoint()];
        for (f, facet) in self.mesh.facets.iter().enumerate() {
            let xx = self.facet_coords(f);
            let shape = cache.get(facet.kind)?;
            for (local, ksi) in corner_coords(facet.kind).iter().enumerate() {
                let area = interpolate_geometry(&shape.eval(ksi, false), &xx).area_vector();
                let m = facet.points[local];
                for i in 0..3 {
                    sums[m][i] += area[i];
                }
            }
            // mid nodes take the normal at the center of the facet
            let center = interpolate_geometry(&shape.eval(&domain_center(facet.kind), false), &xx).area_vector();
            for m in facet.points.iter().skip(n_corners(facet.kind)) {
                for i in 0..3 {
                    sums[*m][i] += center[i];
                }
            }
        }
        for m in 0..self.npoint() {
            self.node_normals[m] = unit3(&sums[m], 0.0).unwrap_or([0.0; 3]);
        }
        Ok(())
    }
}

/// Finds the neighbor facet across each edge
fn find_neighbors(mesh: &SurfaceMesh) -> Vec<Vec<Option<usize>>> {
    let edge_key = |a: usize, b: usize| (usize::min(a, b), usize::max(a, b));
    let mut edges: HashMap<(usize, usize), Vec<usize>> = HashMap::new();
    for (f, facet) in mesh.facets.iter().enumerate() {
        let nc = n_corners(facet.kind);
        for e in 0..nc {
            let key = edge_key(facet.points[e], facet.points[(e + 1) % nc]);
            edges.entry(key).or_insert_with(Vec::new).push(f);
        }
    }
    mesh.facets
        .iter()
        .enumerate()
        .map(|(f, facet)| {
            let nc = n_corners(facet.kind);
            (0..nc)
                .map(|e| {
                    let key = edge_key(facet.points[e], facet.points[(e + 1) % nc]);
                    edges
                        .get(&key)
                        .and_then(|list| list.iter().find(|other| **other != f).copied())
                })
                .collect()
        })
        .collect()
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
