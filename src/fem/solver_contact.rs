use super::{BulkModel, ControlStep, Essential, PrescribedValues};
use crate::base::ContactError;
use crate::contact::{InterfaceState, SlidingInterface};
use crate::StrError;
use russell_lab::{solve_lin_sys, vec_copy, vec_norm, Norm, Vector};
use russell_sparse::{CooMatrix, Sym};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Holds the statistics of a contact analysis
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SolverStats {
    /// Number of converged steps
    pub n_steps: usize,

    /// Number of step cutbacks
    pub n_cutbacks: usize,

    /// Total number of Newton iterations (including failed steps)
    pub n_iterations: usize,

    /// Total number of augmentations (of converged steps)
    pub n_augmentations: usize,

    /// Final time
    pub t: f64,
}

impl fmt::Display for SolverStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Number of converged steps        = {}\n\
             Number of cutbacks               = {}\n\
             Number of Newton iterations      = {}\n\
             Number of augmentations          = {}\n\
             Final time                       = {:?}",
            self.n_steps, self.n_cutbacks, self.n_iterations, self.n_augmentations, self.t
        )
    }
}

/// Implements an implicit quasi-static solver with sliding contact interfaces
///
/// Each step performs the augmentation loop: Newton iterations with the multipliers held fixed,
/// followed by one augmentation of every interface, until all interfaces accept. Recoverable
/// failures roll the state back and cut the step back; the retry budget is given by
/// [ControlStep::allowed_step_n_failure]. After a cutback, Δt grows back towards [ControlStep::dt]
/// with every converged step.
pub struct SolverContact<'a> {
    /// Holds the control parameters
    pub control: &'a ControlStep,

    /// Holds the continuum part of the problem
    pub bulk: &'a dyn BulkModel,

    /// Holds the contact interfaces
    pub interfaces: Vec<SlidingInterface>,

    /// Holds the prescribed values
    pub prescribed: PrescribedValues,

    /// Holds the statistics
    pub stats: SolverStats,

    /// Global residual vector
    rr: Vector,

    /// Minus delta U vector (the solution of the linear system)
    mdu: Vector,
}

impl<'a> SolverContact<'a> {
    /// Allocates a new instance
    pub fn new(
        control: &'a ControlStep,
        bulk: &'a dyn BulkModel,
        essential: &Essential,
        interfaces: Vec<SlidingInterface>,
    ) -> Result<Self, ContactError> {
        if let Some(msg) = control.validate() {
            return Err(ContactError::Fatal(format!("cannot allocate solver: {}", msg)));
        }
        let neq = bulk.n_equation();
        for interface in &interfaces {
            let max_eq = usize::max(interface.surf_a.geo.max_equation(), interface.surf_b.geo.max_equation());
            if max_eq >= neq {
                return Err(ContactError::Fatal(format!(
                    "interface {}: equation numbers exceed the number of equations",
                    interface.config.name
                )));
            }
        }
        let prescribed = PrescribedValues::new(neq, essential)?;
        Ok(SolverContact {
            control,
            bulk,
            interfaces,
            prescribed,
            stats: SolverStats::default(),
            rr: Vector::new(neq),
            mdu: Vector::new(neq),
        })
    }

    /// Solves the problem from t_ini to t_fin
    ///
    /// On input, `uu` holds the initial values; on output, the values at the final time.
    pub fn solve(&mut self, uu: &mut Vector) -> Result<(), ContactError> {
        let control = self.control;
        if uu.dim() != self.bulk.n_equation() {
            return Err(ContactError::Fatal(
                "vector of unknowns must have dimension equal to the number of equations".to_string(),
            ));
        }

        // initial projections
        for interface in self.interfaces.iter_mut() {
            interface.init(uu)?;
        }
        control.print_header();

        let mut t = control.t_ini;
        let mut dt = control.dt;
        let mut n_failed = 0;
        let mut uu_backup = uu.clone();
        while control.t_fin - t > 0.5 * control.dt_min {
            if self.stats.n_steps >= control.n_max_steps {
                return Err(ContactError::Fatal("too many steps".to_string()));
            }
            let dt_step = f64::min(dt, control.t_fin - t);
            control.print_timestep(self.stats.n_steps, t + dt_step, dt_step);

            // backup
            vec_copy(&mut uu_backup, uu)?;
            let backup: Vec<InterfaceState> = self.interfaces.iter().map(|i| i.serialize()).collect();

            match self.step(uu, t + dt_step) {
                Ok(naug) => {
                    t += dt_step;
                    n_failed = 0;
                    self.stats.n_steps += 1;
                    self.stats.n_augmentations += naug;
                    for interface in self.interfaces.iter_mut() {
                        interface.update_contact_pressures();
                    }
                    dt = f64::min(control.dt, dt / control.cutback_factor);
                }
                Err(err) => {
                    if !err.is_recoverable() {
                        return Err(err);
                    }
                    n_failed += 1;
                    self.stats.n_cutbacks += 1;

                    // rollback
                    vec_copy(uu, &uu_backup)?;
                    for (interface, state) in self.interfaces.iter_mut().zip(&backup) {
                        interface.restore(state)?;
                    }

                    // cutback
                    if n_failed > control.allowed_step_n_failure {
                        return Err(ContactError::Fatal(format!(
                            "step failed {} times (the last time because {})",
                            n_failed,
                            err.message()
                        )));
                    }
                    dt = dt_step * control.cutback_factor;
                    if dt < control.dt_min {
                        return Err(ContactError::Fatal(format!(
                            "Δt is smaller than the allowed minimum (the last failure was because {})",
                            err.message()
                        )));
                    }
                    control.print_cutback(dt, err.message());
                }
            }
        }
        self.stats.t = t;
        control.print_stats(&self.stats);
        Ok(())
    }

    /// Solves one step ending at time t; returns the number of augmentations
    fn step(&mut self, uu: &mut Vector, t: f64) -> Result<usize, ContactError> {
        // ambient conditions from the previous (converged) contact state
        let mut ambient = Vec::new();
        for interface in self.interfaces.iter_mut() {
            interface.begin_step(uu)?;
            ambient.extend(interface.mark_ambient());
        }
        self.prescribed.set_ambient(ambient)?;
        self.prescribed.apply(uu, t);

        // augmentation loop
        let mut naug = 0;
        loop {
            self.newton(uu, t)?;
            let mut accepted = true;
            for interface in self.interfaces.iter_mut() {
                if !interface.augment(naug)? {
                    accepted = false;
                }
            }
            if accepted {
                return Ok(naug);
            }
            naug += 1;
        }
    }

    /// Performs the Newton iterations with the multipliers held fixed
    fn newton(&mut self, uu: &mut Vector, t: f64) -> Result<(), ContactError> {
        let control = self.control;
        let flags = &self.prescribed.flags;
        let neq = self.rr.dim();
        let mut norm_rr0 = 0.0;
        for iteration in 0..control.n_max_iterations {
            self.stats.n_iterations += 1;

            // contact geometry and gaps
            for interface in self.interfaces.iter_mut() {
                interface.update(uu, iteration)?;
            }

            // residual vector
            self.rr.fill(0.0);
            self.bulk.residual(&mut self.rr, uu, t, flags)?;
            for interface in &self.interfaces {
                interface.contact_forces(&mut self.rr, flags)?;
            }

            // check convergence
            let norm_rr = vec_norm(&self.rr, Norm::Max);
            if iteration == 0 {
                norm_rr0 = norm_rr;
            }
            control.print_iteration(iteration, norm_rr, norm_rr0);
            if !norm_rr.is_finite() {
                return Err(ContactError::Recoverable("found NaN or Inf".to_string()));
            }
            if control.converged(iteration, norm_rr, norm_rr0) {
                return Ok(());
            }

            // Jacobian matrix
            let nnz = self.bulk.nnz_sup()
                + self.interfaces.iter().map(|i| i.nnz_sup()).sum::<usize>()
                + self.prescribed.equations.len();
            let mut kk = CooMatrix::new(neq, neq, nnz, Sym::No)?;
            self.bulk.jacobian(&mut kk, uu, t, flags)?;
            for interface in &self.interfaces {
                interface.contact_stiffness(&mut kk, flags)?;
            }
            for eq in &self.prescribed.equations {
                kk.put(*eq, *eq, 1.0)?;
            }

            // solve linear system and update
            let mut kk_dense = kk.as_dense();
            vec_copy(&mut self.mdu, &self.rr)?;
            solve_lin_sys(&mut self.mdu, &mut kk_dense).map_err(recoverable)?;
            for i in 0..neq {
                uu[i] -= self.mdu[i];
            }
        }
        Err(ContactError::Recoverable("Newton-Raphson did not converge".to_string()))
    }
}

/// Converts a linear solver failure into a recoverable error
fn recoverable(err: StrError) -> ContactError {
    ContactError::Recoverable(format!("cannot solve the linear system: {}", err))
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
