use pmcontact::prelude::*;
use russell_lab::Vector;
use structopt::StructOpt;

/// Command line options
#[derive(StructOpt, Debug)]
#[structopt(
    name = "contact_patch",
    about = "Presses a flat patch against a fixed flat patch and writes the interface state"
)]
struct Options {
    /// Number of facets along each direction of the patches
    #[structopt(long, default_value = "2")]
    n: usize,

    /// Initial separation between the patches
    #[structopt(long, default_value = "0.1")]
    gap: f64,

    /// Prescribed displacement of the base of the springs pulling the top patch
    #[structopt(long, default_value = "0.15")]
    displacement: f64,

    /// Stiffness of the springs per unit area
    #[structopt(long, default_value = "1.0")]
    spring: f64,

    /// Normal penalty factor
    #[structopt(long, default_value = "1000.0")]
    penalty: f64,

    /// Enables the augmented Lagrangian method with the given gap tolerance
    #[structopt(long)]
    gtol: Option<f64>,

    /// Enables the two-pass algorithm
    #[structopt(long)]
    two_pass: bool,

    /// Number of steps
    #[structopt(long, default_value = "4")]
    steps: usize,

    /// Prints steps, iterations, and augmentations
    #[structopt(short, long)]
    verbose: bool,

    /// Output JSON file with the final interface state
    #[structopt(long)]
    output: Option<String>,
}

// Returns the base position of the springs; the pseudo-time equals the imposed displacement
fn base(t: f64) -> f64 {
    -t
}

fn main() -> Result<(), ContactError> {
    // parse options
    let options = Options::from_args();
    if options.n < 1 || options.steps < 1 {
        return Err(ContactError::Fatal("n and steps must be ≥ 1".to_string()));
    }

    // configuration
    let mut config = Config::new();
    config
        .set_name("patch")?
        .set_penalty(options.penalty)?
        .set_two_pass(options.two_pass)?
        .set_verbose(options.verbose)?;
    if let Some(gtol) = options.gtol {
        config
            .set_augmented_lagrangian(true)?
            .set_augmentation_tolerances(0.0, gtol, 0.0, 0.0)?;
    }

    // surfaces: the top patch (normal −z) is tracked; the bottom patch is fixed
    let material = ParamContactMaterial::sample_solid(1.0);
    let mesh_a = SampleSurfaces::flat_qua4(0.0, 0.0, 1.0, options.n, options.gap, false);
    let mesh_b = SampleSurfaces::flat_qua4(0.0, 0.0, 1.0, options.n, 0.0, true);
    let (dofs_a, next) = NodeDofs::sequential(mesh_a.npoint(), 0, false, 0);
    let (dofs_b, neq) = NodeDofs::sequential(mesh_b.npoint(), next, false, 0);

    // springs pulling uz of the top patch; the other displacements are fixed
    let mut springs = NodalSprings::new(neq);
    let uz_a: Vec<usize> = dofs_a.iter().map(|d| d.u[2]).collect();
    springs.add_distributed(&mesh_a, &uz_a, options.spring, base)?;
    let mut essential = Essential::new();
    for d in &dofs_a {
        essential.at(&[d.u[0], d.u[1]], |_| 0.0);
    }
    for d in &dofs_b {
        essential.at(&d.u, |_| 0.0);
    }

    // interface
    let a = ContactSurface::new(mesh_a, dofs_a, &material)?;
    let b = ContactSurface::new(mesh_b, dofs_b, &material)?;
    let interface = SlidingInterface::new(config, a, b)?;

    // solve
    let mut control = ControlStep::new();
    control.t_fin = options.displacement;
    control.dt = options.displacement / (options.steps as f64);
    control.verbose_timesteps = options.verbose;
    control.verbose_iterations = options.verbose;
    let mut solver = SolverContact::new(&control, &springs, &essential, vec![interface])?;
    let mut uu = Vector::new(neq);
    solver.solve(&mut uu)?;

    // results
    let interface = &solver.interfaces[0];
    let min_gap = interface.surf_a.points.iter().map(|p| p.gap).fold(f64::INFINITY, f64::min);
    let mean_pressure = interface.surf_a.points.iter().map(|p| p.net_pressure).sum::<f64>()
        / (interface.surf_a.points.len() as f64);
    println!("{}", solver.stats);
    println!("Number of active points          = {}", interface.n_active());
    println!("Minimum gap                      = {:.6e}", min_gap);
    println!("Mean contact pressure            = {:.6e}", mean_pressure);

    // state file
    let path = match &options.output {
        Some(p) => p.clone(),
        None => format!("{}/contact_patch.json", DEFAULT_OUT_DIR),
    };
    interface.serialize().write_json(&path)?;
    println!("Interface state written to {}", path);
    Ok(())
}
