/// Defines the directory where the simulation result files are saved
pub const DEFAULT_OUT_DIR: &str = "/tmp/pmcontact/results";

/// Defines an auxiliary directory where the test result files are saved
pub const DEFAULT_TEST_DIR: &str = "/tmp/pmcontact/test";

/// Space dimension (contact surfaces are 2D manifolds embedded in 3D)
pub const NDIM: usize = 3;

/// Number of displacement DOFs per node
pub const N_DISP: usize = 3;

/// Tolerance on the increment of natural coordinates to stop the projection Newton iterations
pub const PROJECTION_NEWTON_TOL: f64 = 1e-12;

/// Maximum number of Newton iterations of the closest-point projection
pub const PROJECTION_N_MAX_ITERATIONS: usize = 25;

/// Step to compute second derivatives of shape functions by central differences
///
/// The shapes are polynomials of at most second order in each natural coordinate; hence the
/// central differences of the first derivatives are exact up to round-off errors.
pub const SECOND_DERIV_STEP: f64 = 1e-3;

/// Relative area below which a facet is considered degenerate (compared to its reference area)
pub const DEGENERATE_AREA_RATIO: f64 = 1e-10;

/// Maximum number of facets examined by the brute-force stage of the global search
pub const GLOBAL_SEARCH_N_CANDIDATES: usize = 16;

/// Largest distance (in natural coordinates) that the projection Newton iterations may drift
/// outside a facet before the search restarts from the global seed
pub const PROJECTION_MAX_DRIFT: f64 = 1.0;
