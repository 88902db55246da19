use pmcontact::prelude::*;
use russell_lab::{approx_eq, Vector};

// Flat patch pressed against a fixed flat patch (augmented Lagrangian method)
//
// TEST GOAL
//
// This test verifies that the augmentations remove the penetration of the penalty method:
// after convergence |g| < gtol and the multipliers approach the exact contact traction
//
// GEOMETRY
//
//     ↓   ↓   ↓   ↓   ↓     springs (k per unit area); base moving down by 0.15·t
//   +---------------+       A: z = 0.1, normal −z (tracked)
//                           gap d₀ = 0.1
//   +---------------+       B: z = 0.0, normal +z (fixed)
//
// 2 × 2 Qua4 facets on each side; unit square
//
// BOUNDARY CONDITIONS
//
// A: ux = uy = 0; B: ux = uy = uz = 0
//
// CONFIGURATION AND PARAMETERS
//
// Quasi-static; t from 0 to 1 with Δt = 0.25
// ε = 1000; k = 1; gtol = 1e-7
//
// SOLUTION
//
// With g → 0, the traction is λ = k (0.15 − 0.1) = 0.05. Each augmentation reduces the
// penetration by the factor k / (k + ε) ≈ 1e-3; hence, the multipliers lag behind the traction
// by about ε |g| of the previous augmentation

fn base(t: f64) -> f64 {
    -0.15 * t
}

#[test]
fn test_flat_patch_augmented() -> Result<(), ContactError> {
    // surfaces
    let material = ParamContactMaterial::sample_solid(1.0);
    let mesh_a = SampleSurfaces::flat_qua4(0.0, 0.0, 1.0, 2, 0.1, false);
    let mesh_b = SampleSurfaces::flat_qua4(0.0, 0.0, 1.0, 2, 0.0, true);
    let (dofs_a, next) = NodeDofs::sequential(mesh_a.npoint(), 0, false, 0);
    let (dofs_b, neq) = NodeDofs::sequential(mesh_b.npoint(), next, false, 0);

    // springs
    let mut springs = NodalSprings::new(neq);
    let uz_a: Vec<usize> = dofs_a.iter().map(|d| d.u[2]).collect();
    springs.add_distributed(&mesh_a, &uz_a, 1.0, base)?;

    // essential boundary conditions
    let mut essential = Essential::new();
    for d in &dofs_a {
        essential.at(&[d.u[0], d.u[1]], |_| 0.0);
    }
    for d in &dofs_b {
        essential.at(&d.u, |_| 0.0);
    }

    // interface
    let mut config = Config::new();
    config
        .set_penalty(1000.0)?
        .set_augmented_lagrangian(true)?
        .set_augmentation_tolerances(0.01, 1e-7, 0.0, 0.0)?
        .set_augmentation_limits(0, 5)?;
    let a = ContactSurface::new(mesh_a, dofs_a, &material)?;
    let b = ContactSurface::new(mesh_b, dofs_b, &material)?;
    let interface = SlidingInterface::new(config, a, b)?;

    // solve
    let mut control = ControlStep::new();
    control.dt = 0.25;
    let mut solver = SolverContact::new(&control, &springs, &essential, vec![interface])?;
    let mut uu = Vector::new(neq);
    solver.solve(&mut uu)?;
    assert_eq!(solver.stats.n_steps, 4);
    assert_eq!(solver.stats.n_cutbacks, 0);
    // one augmentation in each of the last two steps (the first two have no contact)
    assert!(solver.stats.n_augmentations >= 2);
    assert!(solver.stats.n_augmentations <= 4);

    // check
    let interface = &solver.interfaces[0];
    assert_eq!(interface.surf_a.n_active(), 16);
    for p in &interface.surf_a.points {
        assert!(f64::abs(p.gap) < 1e-7);
        assert!(p.traction() >= 0.0);
        approx_eq(p.traction(), 0.05, 1e-6);
        approx_eq(p.lambda_n, 0.05, 1e-4);
    }
    for d in &interface.surf_a.geo.dofs {
        approx_eq(uu[d.u[2]], -0.1, 1e-7);
    }

    // the state can be written and read back
    let path = format!("{}/test_flat_patch_augmented.json", DEFAULT_TEST_DIR);
    let state = interface.serialize();
    state.write_json(&path)?;
    let read = InterfaceState::read_json(&path)?;
    assert_eq!(read, state);
    Ok(())
}
