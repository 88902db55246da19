use super::SolverStats;

/// Defines the smallest allowed dt_min (ControlStep)
pub const CONTROL_MIN_DT_MIN: f64 = 1e-10;

/// Defines the smallest allowed tolerance (ControlStep)
pub const CONTROL_MIN_TOL: f64 = 1e-15;

/// Holds the options to control the load/time steps, the Newton iterations, and the cutbacks
pub struct ControlStep {
    /// Initial time (pseudo-time for quasi-static analyses)
    pub t_ini: f64,

    /// Final time
    pub t_fin: f64,

    /// Time increment
    pub dt: f64,

    /// Minimum allowed time increment min(Δt)
    pub dt_min: f64,

    /// Maximum number of (converged) steps
    pub n_max_steps: usize,

    /// Maximum number of Newton iterations
    pub n_max_iterations: usize,

    /// Absolute tolerance for the max norm of the residual vector
    pub tol_abs_residual: f64,

    /// Relative tolerance for the max norm of the residual vector
    pub tol_rel_residual: f64,

    /// Allowed number of consecutive failures (cutbacks) of one step
    pub allowed_step_n_failure: usize,

    /// Factor multiplying Δt after a recoverable failure; 0 < factor < 1
    ///
    /// After each converged step, Δt is divided by this factor until it reaches `dt` again.
    pub cutback_factor: f64,

    /// Verbose mode during steps
    pub verbose_timesteps: bool,

    /// Verbose mode during iterations
    pub verbose_iterations: bool,
}

impl ControlStep {
    /// Allocates a new instance with default values
    pub fn new() -> Self {
        ControlStep {
            t_ini: 0.0,
            t_fin: 1.0,
            dt: 0.1,
            dt_min: 1e-6,
            n_max_steps: 1_000,
            n_max_iterations: 20,
            tol_abs_residual: 1e-10,
            tol_rel_residual: 1e-9,
            allowed_step_n_failure: 5,
            cutback_factor: 0.5,
            verbose_timesteps: false,
            verbose_iterations: false,
        }
    }

    /// Validates all data
    ///
    /// Returns a message with the inconsistent data, or returns None if everything is all right.
    pub fn validate(&self) -> Option<String> {
        if self.t_ini < 0.0 {
            return Some(format!("t_ini = {:?} is incorrect; it must be ≥ 0.0", self.t_ini));
        }
        if self.t_fin < self.t_ini {
            return Some(format!(
                "t_fin = {:?} is incorrect; it must be ≥ t_ini = {:?}",
                self.t_fin, self.t_ini
            ));
        }
        if self.dt_min < CONTROL_MIN_DT_MIN {
            return Some(format!(
                "dt_min = {:?} is incorrect; it must be ≥ {:e}",
                self.dt_min, CONTROL_MIN_DT_MIN
            ));
        }
        if self.dt < self.dt_min {
            return Some(format!(
                "dt = {:?} is incorrect; it must be ≥ dt_min = {:?}",
                self.dt, self.dt_min
            ));
        }
        if self.n_max_iterations < 1 {
            return Some("n_max_iterations must be ≥ 1".to_string());
        }
        if self.tol_abs_residual < CONTROL_MIN_TOL {
            return Some(format!(
                "tol_abs_residual = {:?} is incorrect; it must be ≥ {:e}",
                self.tol_abs_residual, CONTROL_MIN_TOL
            ));
        }
        if self.tol_rel_residual < CONTROL_MIN_TOL {
            return Some(format!(
                "tol_rel_residual = {:?} is incorrect; it must be ≥ {:e}",
                self.tol_rel_residual, CONTROL_MIN_TOL
            ));
        }
        if self.cutback_factor <= 0.0 || self.cutback_factor >= 1.0 {
            return Some(format!(
                "cutback_factor = {:?} is incorrect; it must be in (0, 1)",
                self.cutback_factor
            ));
        }
        None // all good
    }

    /// Returns true if the residual norm satisfies the absolute or the relative tolerance
    pub fn converged(&self, iteration: usize, norm_rr: f64, norm_rr0: f64) -> bool {
        norm_rr < self.tol_abs_residual || (iteration > 0 && norm_rr < self.tol_rel_residual * norm_rr0)
    }

    /// Prints the header of the table with step and iteration data
    #[inline]
    pub fn print_header(&self) {
        if self.verbose_timesteps || self.verbose_iterations {
            println!("Legend:");
            println!("✅ : converged");
            println!("👍 : converging");
            println!("🥵 : diverging");
            println!("😱 : found NaN or Inf");
            println!("✂️  : cutback\n");
            println!(
                "{:>8} {:>13} {:>13} {:>5} {:>8}   {:>8}  ",
                "step", "t", "Δt", "iter", "|R|", "tol·|R₀|"
            );
        }
    }

    /// Prints step data
    #[inline]
    #[rustfmt::skip]
    pub fn print_timestep(&self, step: usize, t: f64, dt: f64) {
        if !self.verbose_timesteps {
            return ;
        }
        println!(
            "{:>8} {:>13.6e} {:>13.6e} {:>5} {:>8}   {:>8}  ",
            step+1, t, dt, ".", ".", "."
        );
    }

    /// Prints a cutback message
    #[inline]
    pub fn print_cutback(&self, dt_new: f64, reason: &str) {
        if !self.verbose_timesteps {
            return;
        }
        println!("✂️  Δt = {:.6e} because {}", dt_new, reason);
    }

    /// Prints iteration data
    #[inline]
    pub fn print_iteration(&self, it: usize, norm_rr: f64, norm_rr0: f64) {
        if !self.verbose_iterations {
            return;
        }
        let (l, r) = if !norm_rr.is_finite() {
            ("😱", "  ") // found NaN or Inf
        } else if norm_rr < self.tol_abs_residual {
            ("✅", "  ") // converged on absolute residual
        } else if it == 0 {
            ("  ", "? ") // first iteration (we don't have norm_r0 yet)
        } else if norm_rr < self.tol_rel_residual * norm_rr0 {
            ("  ", "✅") // converged on relative residual
        } else if norm_rr > norm_rr0 {
            ("🥵", "  ") // diverging
        } else {
            ("👍", "  ") // converging
        };
        let n = it + 1;
        let v = self.tol_rel_residual * norm_rr0;
        println!(
            "{:>8} {:>13} {:>13} {:>5} {:>8.2e}{} {:>8.2e}{}",
            ".", ".", ".", n, norm_rr, l, v, r,
        );
    }

    /// Prints the final statistics
    #[inline]
    pub fn print_stats(&self, stats: &SolverStats) {
        if self.verbose_timesteps {
            println!("\n{}", stats);
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
