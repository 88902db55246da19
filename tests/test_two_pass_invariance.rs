use pmcontact::prelude::*;
use russell_lab::{approx_eq, vec_approx_eq, Vector};

// Two-pass contact between flat patches with swapped labels
//
// TEST GOAL
//
// This test verifies that the two-pass algorithm does not depend on which surface is called
// primary: swapping the labels of the surfaces yields the same displacements
//
// GEOMETRY
//
//     ↓   ↓   ↓   ↓   ↓     springs (k per unit area); base moving down by 0.15·t
//   +---------------+       top: z = 0.1, normal −z
//                           gap d₀ = 0.1
//   +---------------+       bottom: z = 0.0, normal +z (fixed)
//
// 2 × 2 Qua4 facets on each side; unit square
//
// BOUNDARY CONDITIONS
//
// top: ux = uy = 0; bottom: ux = uy = uz = 0
//
// CONFIGURATION AND PARAMETERS
//
// Quasi-static; t from 0 to 1 with Δt = 0.25
// ε = 1000; k = 1; two-pass
//
// SOLUTION
//
// Both passes contribute a penalty traction; thus the effective penalty doubles:
//
// k (0.15 − 0.1 + g) = −2 ε g  ⇒  g = −0.05 k / (k + 2 ε)

fn base(t: f64) -> f64 {
    -0.15 * t
}

// Solves the problem with the top surface labeled as A (top_is_a) or as B
fn run(top_is_a: bool) -> Result<(Vector, SolverStats, Vec<f64>), ContactError> {
    let material = ParamContactMaterial::sample_solid(1.0);
    let mesh_top = SampleSurfaces::flat_qua4(0.0, 0.0, 1.0, 2, 0.1, false);
    let mesh_bot = SampleSurfaces::flat_qua4(0.0, 0.0, 1.0, 2, 0.0, true);
    let (dofs_top, next) = NodeDofs::sequential(mesh_top.npoint(), 0, false, 0);
    let (dofs_bot, neq) = NodeDofs::sequential(mesh_bot.npoint(), next, false, 0);

    let mut springs = NodalSprings::new(neq);
    let uz_top: Vec<usize> = dofs_top.iter().map(|d| d.u[2]).collect();
    springs.add_distributed(&mesh_top, &uz_top, 1.0, base)?;

    let mut essential = Essential::new();
    for d in &dofs_top {
        essential.at(&[d.u[0], d.u[1]], |_| 0.0);
    }
    for d in &dofs_bot {
        essential.at(&d.u, |_| 0.0);
    }

    let mut config = Config::new();
    config.set_penalty(1000.0)?.set_two_pass(true)?;
    let top = ContactSurface::new(mesh_top, dofs_top, &material)?;
    let bot = ContactSurface::new(mesh_bot, dofs_bot, &material)?;
    let interface = if top_is_a {
        SlidingInterface::new(config, top, bot)?
    } else {
        SlidingInterface::new(config, bot, top)?
    };

    let mut control = ControlStep::new();
    control.dt = 0.25;
    let mut solver = SolverContact::new(&control, &springs, &essential, vec![interface])?;
    let mut uu = Vector::new(neq);
    solver.solve(&mut uu)?;

    let interface = &solver.interfaces[0];
    let gaps_top: Vec<f64> = if top_is_a {
        interface.surf_a.points.iter().map(|p| p.gap).collect()
    } else {
        interface.surf_b.points.iter().map(|p| p.gap).collect()
    };
    Ok((uu, solver.stats.clone(), gaps_top))
}

#[test]
fn test_two_pass_invariance() -> Result<(), ContactError> {
    let (uu_1, stats_1, gaps_1) = run(true)?;
    let (uu_2, stats_2, gaps_2) = run(false)?;

    // same steps and iterations
    assert_eq!(stats_1.n_steps, 4);
    assert_eq!(stats_2.n_steps, 4);
    assert_eq!(stats_1.n_iterations, stats_2.n_iterations);

    // exact penetration with doubled penalty
    let g = -0.05 / 2001.0;
    for gap in gaps_1.iter().chain(gaps_2.iter()) {
        approx_eq(*gap, g, 1e-12);
    }

    // same displacements
    vec_approx_eq(&uu_1, &uu_2, 1e-12);
    for i in 0..9 {
        approx_eq(uu_1[3 * i + 2], -0.1 + g, 1e-12);
    }
    Ok(())
}
