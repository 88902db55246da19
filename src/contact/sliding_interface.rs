use super::{
    evaluate_gaps, point_contribution, project_point, set_point_penalties, tracked_position_and_normal,
    update_facet_penalties, update_multipliers, AugmentationReport, ContactSurface, Coupling, InterfaceState,
    LocalContribution, SurfaceState,
};
use crate::base::{
    assemble_matrix, assemble_vector, Config, ContactError, ContactStatus, GlobalJacobian, ShapeCache, Side,
};
use crate::StrError;
use rayon::prelude::*;
use russell_lab::Vector;

/// Implements the sliding contact between two (porous) surfaces
///
/// The points of surface A are projected onto surface B (first pass). With two-pass enabled,
/// the points of surface B are projected onto surface A as well (second pass), and the
/// contributions of both passes are summed.
///
/// The interface exposes the contract consumed by the global nonlinear solver:
///
/// 1. [SlidingInterface::init] once, before the analysis
/// 2. [SlidingInterface::begin_step] at the beginning of each load/time step
/// 3. [SlidingInterface::update] at every iteration, before computing residuals
/// 4. [SlidingInterface::contact_forces] and [SlidingInterface::contact_stiffness]
/// 5. [SlidingInterface::augment] after the iterations converged
/// 6. [SlidingInterface::serialize] and [SlidingInterface::restore] for restart and cutback
pub struct SlidingInterface {
    /// Configuration parameters
    pub config: Config,

    /// Surface A (tracked in the first pass)
    pub surf_a: ContactSurface,

    /// Surface B (target in the first pass)
    pub surf_b: ContactSurface,

    /// Number of augmentations performed in the current step
    pub naug: usize,

    /// Coupled fields with A tracked and B as target
    coupling_ab: Coupling,

    /// Coupled fields with B tracked and A as target
    coupling_ba: Coupling,
}

impl SlidingInterface {
    /// Allocates a new instance
    pub fn new(config: Config, surf_a: ContactSurface, surf_b: ContactSurface) -> Result<Self, ContactError> {
        if let Some(msg) = config.validate() {
            return Err(ContactError::Fatal(format!("interface {}: {}", config.name, msg)));
        }
        let none = Coupling {
            poro: false,
            solute_map: Vec::new(),
            rt: 0.0,
        };
        Ok(SlidingInterface {
            config,
            surf_a,
            surf_b,
            naug: 0,
            coupling_ab: none.clone(),
            coupling_ba: none,
        })
    }

    /// Validates the pairing and performs the initial projection
    ///
    /// Fails if a surface is empty or if the surfaces carry different solutes.
    pub fn init(&mut self, uu: &Vector) -> Result<(), ContactError> {
        if self.surf_a.points.len() == 0 {
            return Err(self.fatal("surface A is empty"));
        }
        if self.surf_b.points.len() == 0 {
            return Err(self.fatal("surface B is empty"));
        }
        let rt = self.config.rt();
        self.coupling_ab = Coupling::new(&self.surf_a.geo, &self.surf_b.geo, rt).map_err(|e| self.fatal(e))?;
        self.coupling_ba = Coupling::new(&self.surf_b.geo, &self.surf_a.geo, rt).map_err(|e| self.fatal(e))?;
        self.begin_step(uu)?;
        self.update(uu, 0)
    }

    /// Prepares a new load/time step
    ///
    /// Resets the augmentation counter and recomputes the penalty factors of the facets.
    pub fn begin_step(&mut self, uu: &Vector) -> Result<(), ContactError> {
        self.naug = 0;
        self.update_geometry(uu)?;
        let mut cache = ShapeCache::new();
        for side in [Side::A, Side::B] {
            let config = &self.config;
            let surf = match side {
                Side::A => &mut self.surf_a,
                Side::B => &mut self.surf_b,
            };
            update_facet_penalties(&mut surf.geo, config, &mut cache)
                .map_err(|e| ContactError::Recoverable(format!("interface {}: {}", config.name, e)))?;
        }
        Ok(())
    }

    /// Updates the geometry, projections, and gaps
    ///
    /// Projections may move to other facets only if `iteration < n_seg_up` (or `n_seg_up = 0`).
    pub fn update(&mut self, uu: &Vector, iteration: usize) -> Result<(), ContactError> {
        self.update_geometry(uu)?;
        let update_segments = self.config.update_segments(iteration);
        project_surface(
            &mut self.surf_a,
            &self.surf_b,
            &self.coupling_ab,
            &self.config,
            update_segments,
        )
        .map_err(|e| self.recoverable(e))?;
        if self.config.two_pass {
            project_surface(
                &mut self.surf_b,
                &self.surf_a,
                &self.coupling_ba,
                &self.config,
                update_segments,
            )
            .map_err(|e| self.recoverable(e))?;
        }
        Ok(())
    }

    /// Adds the contact forces to the global residual vector
    ///
    /// # Input
    ///
    /// * `rr` -- the global residual vector
    /// * `prescribed` -- flags the prescribed equations (skipped)
    pub fn contact_forces(&self, rr: &mut Vector, prescribed: &[bool]) -> Result<(), ContactError> {
        for c in self.contributions(false)? {
            assemble_vector(rr, &c.residual, &c.l2g, prescribed);
        }
        Ok(())
    }

    /// Adds the contact stiffness to the global Jacobian matrix
    ///
    /// # Input
    ///
    /// * `kk` -- the global Jacobian matrix
    /// * `prescribed` -- flags the prescribed equations (skipped)
    pub fn contact_stiffness(&self, kk: &mut dyn GlobalJacobian, prescribed: &[bool]) -> Result<(), ContactError> {
        for c in self.contributions(true)? {
            if let Some(jacobian) = &c.jacobian {
                assemble_matrix(kk, jacobian, &c.l2g, prescribed).map_err(|e| self.fatal(e))?;
            }
        }
        Ok(())
    }

    /// Performs an augmentation
    ///
    /// Returns `Ok(true)` if the constraints are satisfied (within the tolerances) and at least
    /// `naug_min` augmentations have been performed. Otherwise, updates the multipliers and returns
    /// `Ok(false)`, meaning that the nonlinear problem must be solved again. Returns a recoverable
    /// error if the tolerances are not satisfied after `naug_max` augmentations.
    ///
    /// Without augmented Lagrangian, always returns `Ok(true)`.
    pub fn augment(&mut self, naug: usize) -> Result<bool, ContactError> {
        if !self.config.augmented_lagrangian {
            return Ok(true);
        }
        self.naug = naug;
        let mut report = AugmentationReport::new();
        report.accumulate(&self.surf_a.points, &self.coupling_ab);
        if self.config.two_pass {
            report.accumulate(&self.surf_b.points, &self.coupling_ba);
        }
        let converged = report.converged(&self.config);
        if self.config.verbose {
            if naug == 0 {
                AugmentationReport::print_header(&self.config.name);
            }
            report.print(naug, converged);
        }
        if converged && naug >= self.config.naug_min {
            return Ok(true);
        }
        if naug >= self.config.naug_max {
            return Err(self.recoverable(&format!(
                "augmentations did not converge after {} rounds (max |g| = {:e})",
                naug, report.max_gap
            )));
        }
        update_multipliers(&mut self.surf_a.points, &self.coupling_ab);
        if self.config.two_pass {
            update_multipliers(&mut self.surf_b.points, &self.coupling_ba);
        }
        Ok(false)
    }

    /// Updates the net contact pressure of each point (for reporting)
    ///
    /// In two-pass mode, the pressure of a point is averaged with the mean pressure of the
    /// points of the opposing facet it projects onto.
    pub fn update_contact_pressures(&mut self) {
        let ta: Vec<f64> = self.surf_a.points.iter().map(|p| p.traction()).collect();
        let tb: Vec<f64> = self.surf_b.points.iter().map(|p| p.traction()).collect();
        if !self.config.two_pass {
            for (p, t) in self.surf_a.points.iter_mut().zip(&ta) {
                p.net_pressure = *t;
            }
            return;
        }
        let mean_a = facet_means(&self.surf_a, &ta);
        let mean_b = facet_means(&self.surf_b, &tb);
        for (p, t) in self.surf_a.points.iter_mut().zip(&ta) {
            p.net_pressure = match p.target {
                Some(fb) => 0.5 * (t + mean_b[fb]),
                None => *t,
            };
        }
        for (p, t) in self.surf_b.points.iter_mut().zip(&tb) {
            p.net_pressure = match p.target {
                Some(fa) => 0.5 * (t + mean_a[fa]),
                None => *t,
            };
        }
    }

    /// Returns the (equation, value) pairs of the free-draining nodes
    ///
    /// A node of a porous surface drains freely if none of its facets is in contact. A facet is
    /// in contact if one of its points is active or if an active point of the other surface
    /// projects onto it. The values are the ambient pressure and the ambient concentration.
    pub fn mark_ambient(&self) -> Vec<(usize, f64)> {
        let mut contact_a = vec![false; self.surf_a.geo.nfacet()];
        let mut contact_b = vec![false; self.surf_b.geo.nfacet()];
        mark_contact(&self.surf_a, &mut contact_a, &mut contact_b);
        mark_contact(&self.surf_b, &mut contact_b, &mut contact_a);
        let mut ambient = Vec::new();
        for (surf, contact) in [(&self.surf_a, &contact_a), (&self.surf_b, &contact_b)] {
            if !surf.geo.porous {
                continue;
            }
            for m in 0..surf.geo.npoint() {
                if surf.geo.node_facets[m].iter().any(|f| contact[*f]) {
                    continue;
                }
                let dofs = &surf.geo.dofs[m];
                if let Some(eq) = dofs.p {
                    ambient.push((eq, self.config.ambient_pressure));
                }
                for eq in dofs.c.iter().take(surf.nsolute()) {
                    ambient.push((*eq, self.config.ambient_concentration));
                }
            }
        }
        ambient
    }

    /// Writes the ambient values into the free-draining equations of the global vector
    pub fn set_ambient(&self, uu: &mut Vector) {
        for (eq, value) in self.mark_ambient() {
            uu[eq] = value;
        }
    }

    /// Returns the persistent state of the interface
    pub fn serialize(&self) -> InterfaceState {
        InterfaceState {
            name: self.config.name.clone(),
            naug: self.naug,
            surf_a: SurfaceState::capture(&self.surf_a),
            surf_b: SurfaceState::capture(&self.surf_b),
        }
    }

    /// Restores the persistent state of the interface
    ///
    /// Both surface states are checked before any of them is written.
    pub fn restore(&mut self, state: &InterfaceState) -> Result<(), ContactError> {
        let nfacet_a = self.surf_a.geo.nfacet();
        let nfacet_b = self.surf_b.geo.nfacet();
        if state.surf_a.target.iter().flatten().any(|f| *f >= nfacet_b)
            || state.surf_b.target.iter().flatten().any(|f| *f >= nfacet_a)
        {
            return Err(self.fatal("state has an invalid target facet"));
        }
        state.surf_a.check(&self.surf_a).map_err(|e| self.fatal(e))?;
        state.surf_b.check(&self.surf_b).map_err(|e| self.fatal(e))?;
        state.surf_a.apply(&mut self.surf_a).map_err(|e| self.fatal(e))?;
        state.surf_b.apply(&mut self.surf_b).map_err(|e| self.fatal(e))?;
        self.naug = state.naug;
        Ok(())
    }

    /// Returns an upper bound of the number of non-zero values added to the global Jacobian
    pub fn nnz_sup(&self) -> usize {
        let mut nnz = pass_nnz_sup(&self.surf_a, &self.surf_b, &self.coupling_ab);
        if self.config.two_pass {
            nnz += pass_nnz_sup(&self.surf_b, &self.surf_a, &self.coupling_ba);
        }
        nnz
    }

    /// Returns the number of active points (both surfaces)
    pub fn n_active(&self) -> usize {
        self.surf_a.n_active() + self.surf_b.n_active()
    }

    /// Updates the current configuration and checks the facets
    fn update_geometry(&mut self, uu: &Vector) -> Result<(), ContactError> {
        let mut cache = ShapeCache::new();
        for side in [Side::A, Side::B] {
            let name = &self.config.name;
            let surf = match side {
                Side::A => &mut self.surf_a,
                Side::B => &mut self.surf_b,
            };
            surf.geo
                .update_current(uu)
                .map_err(|e| ContactError::Fatal(format!("interface {}: {}", name, e)))?;
            for f in 0..surf.geo.nfacet() {
                let degenerate = surf
                    .geo
                    .degenerate(&mut cache, f)
                    .map_err(|e| ContactError::Fatal(format!("interface {}: {}", name, e)))?;
                if degenerate {
                    let err = ContactError::Recoverable(format!(
                        "interface {}: facet {} of surface {:?} is degenerate",
                        name, f, side
                    ));
                    if self.config.verbose {
                        println!("ERROR: {}", err);
                    }
                    return Err(err);
                }
            }
            surf.geo
                .update_node_normals(&mut cache)
                .map_err(|e| ContactError::Fatal(format!("interface {}: {}", name, e)))?;
        }
        Ok(())
    }

    /// Computes the local contributions of all active points
    fn contributions(&self, with_jacobian: bool) -> Result<Vec<LocalContribution>, ContactError> {
        let mut all = pass_contributions(
            &self.surf_a,
            &self.surf_b,
            &self.coupling_ab,
            &self.config,
            with_jacobian,
        )
        .map_err(|e| self.recoverable(e))?;
        if self.config.two_pass {
            let second = pass_contributions(
                &self.surf_b,
                &self.surf_a,
                &self.coupling_ba,
                &self.config,
                with_jacobian,
            )
            .map_err(|e| self.recoverable(e))?;
            all.extend(second);
        }
        Ok(all)
    }

    /// Returns a fatal error naming this interface (and prints it if verbose)
    fn fatal(&self, msg: &str) -> ContactError {
        let err = ContactError::Fatal(format!("interface {}: {}", self.config.name, msg));
        if self.config.verbose {
            println!("ERROR: {}", err);
        }
        err
    }

    /// Returns a recoverable error naming this interface (and prints it if verbose)
    fn recoverable(&self, msg: &str) -> ContactError {
        let err = ContactError::Recoverable(format!("interface {}: {}", self.config.name, msg));
        if self.config.verbose {
            println!("ERROR: {}", err);
        }
        err
    }
}

/// Projects the points of the tracked surface and evaluates their gaps
///
/// Each point is processed independently (in parallel) and only its own state is modified.
fn project_surface(
    tracked: &mut ContactSurface,
    target: &ContactSurface,
    coupling: &Coupling,
    config: &Config,
    update_segments: bool,
) -> Result<(), StrError> {
    let geo = &tracked.geo;
    let tgt = &target.geo;
    tracked
        .points
        .par_iter_mut()
        .try_for_each_init(ShapeCache::new, |cache, point| -> Result<(), StrError> {
            let (x, nu) = tracked_position_and_normal(geo, cache, point.facet, &point.ksi)?;
            let previous = point.target.map(|f| (f, point.rs));
            match project_point(tgt, cache, config, &x, &nu, previous, update_segments)? {
                Some(proj) => {
                    point.target = Some(proj.facet);
                    point.rs = proj.rs;
                    set_point_penalties(point, geo, tgt, coupling);
                    let data = evaluate_gaps(geo, tgt, coupling, cache, point.facet, &point.ksi, proj.facet, &proj.rs)?;
                    point.gap = data.gap;
                    point.pressure_gap = data.pressure_gap;
                    for k in 0..coupling.nsolute() {
                        point.concentration_gap[k] = data.concentration_gap[k];
                    }
                    point.status = if point.lambda_n - point.eps_n * point.gap > 0.0 {
                        ContactStatus::Active
                    } else {
                        ContactStatus::Inactive
                    };
                }
                None => point.release(),
            }
            Ok(())
        })
}

/// Computes the local contributions of the active points of a tracked surface
///
/// The facets are processed in parallel, each into its own buffers.
fn pass_contributions(
    tracked: &ContactSurface,
    target: &ContactSurface,
    coupling: &Coupling,
    config: &Config,
    with_jacobian: bool,
) -> Result<Vec<LocalContribution>, StrError> {
    let per_facet: Result<Vec<Vec<LocalContribution>>, StrError> = (0..tracked.geo.nfacet())
        .into_par_iter()
        .map_init(ShapeCache::new, |cache, f| {
            let mut local = Vec::new();
            for point in tracked.facet_points(f) {
                if let Some(c) = point_contribution(&tracked.geo, &target.geo, coupling, config, cache, point, with_jacobian)? {
                    local.push(c);
                }
            }
            Ok(local)
        })
        .collect();
    Ok(per_facet?.into_iter().flatten().collect())
}

/// Returns an upper bound of the number of non-zero values of one pass
fn pass_nnz_sup(tracked: &ContactSurface, target: &ContactSurface, coupling: &Coupling) -> usize {
    let nb_max = target.geo.mesh.facets.iter().map(|f| f.points.len()).max().unwrap_or(0);
    let ndof_node = 3 + if coupling.poro { 1 } else { 0 } + coupling.nsolute();
    let mut nnz = 0;
    for facet in &tracked.geo.mesh.facets {
        let ndof = ndof_node * (facet.points.len() + nb_max);
        let npoint = match crate::base::facet_integ_points(facet.kind) {
            Ok(ips) => ips.len(),
            Err(_) => 0,
        };
        nnz += npoint * ndof * ndof;
    }
    nnz
}

/// Flags the facets touched by the active points of a tracked surface
fn mark_contact(tracked: &ContactSurface, own: &mut [bool], other: &mut [bool]) {
    for p in tracked.points.iter().filter(|p| p.status.active()) {
        own[p.facet] = true;
        if let Some(f) = p.target {
            other[f] = true;
        }
    }
}

/// Returns the mean of point values over each facet
fn facet_means(surf: &ContactSurface, values: &[f64]) -> Vec<f64> {
    (0..surf.geo.nfacet())
        .map(|f| {
            let (start, end) = (surf.geo.offsets[f], surf.geo.offsets[f + 1]);
            if end > start {
                values[start..end].iter().sum::<f64>() / ((end - start) as f64)
            } else {
                0.0
            }
        })
        .collect()
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
