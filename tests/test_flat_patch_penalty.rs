use pmcontact::prelude::*;
use russell_lab::{approx_eq, Vector};

// Flat patch pressed against a fixed flat patch (penalty method)
//
// TEST GOAL
//
// This test verifies the steady-state penetration of the penalty method: at equilibrium, the
// traction of the distributed springs equals the contact traction ε |g|
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
// ε = 1000; k = 1
//
// SOLUTION
//
// k (0.15 − 0.1 + g) = −ε g  ⇒  g = −0.05 k / (k + ε) ≈ −4.995e-5

fn base(t: f64) -> f64 {
    -0.15 * t
}

#[test]
fn test_flat_patch_penalty() -> Result<(), ContactError> {
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
    config.set_penalty(1000.0)?;
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
    assert_eq!(solver.stats.n_augmentations, 0);

    // check
    let g = -0.05 / 1001.0;
    let interface = &solver.interfaces[0];
    assert_eq!(interface.surf_a.n_active(), 16);
    for p in &interface.surf_a.points {
        assert_eq!(p.status, ContactStatus::Active);
        approx_eq(p.gap, g, 1e-12);
        approx_eq(p.traction(), -1000.0 * g, 1e-9);
        approx_eq(p.net_pressure, -1000.0 * g, 1e-9);
    }
    approx_eq(g, -4.995e-5, 1e-8);
    for d in &interface.surf_a.geo.dofs {
        approx_eq(uu[d.u[2]], -0.1 + g, 1e-12);
    }

    // single pass: B is not tracked
    for p in &interface.surf_b.points {
        assert_eq!(p.status, ContactStatus::Unprojected);
    }
    Ok(())
}
