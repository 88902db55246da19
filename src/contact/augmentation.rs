use super::{ContactPoint, Coupling, SurfaceGeometry};
use crate::base::{Config, ShapeCache};
use crate::StrError;

/// Calculates the penalty factors of each facet
///
/// With auto-penalty, the factors are estimated from the material and the characteristic size
/// h = √A of the facet (in the current configuration):
///
/// ```text
/// εn = epsn · E / h     εp = epsp · k / h     εc = epsc · D / h
/// ```
///
/// Otherwise, the factors given in the configuration are used directly.
pub fn update_facet_penalties(geo: &mut SurfaceGeometry, config: &Config, cache: &mut ShapeCache) -> Result<(), StrError> {
    let nsolute = geo.solute_ids.len();
    for f in 0..geo.nfacet() {
        if config.auto_penalty {
            let area = geo.facet_area(cache, f)?;
            if area <= 0.0 {
                return Err("cannot estimate the penalty of a facet with non-positive area");
            }
            let h = f64::sqrt(area);
            geo.facet_eps_n[f] = config.epsn * geo.stiffness / h;
            geo.facet_eps_p[f] = config.epsp * geo.permeability / h;
            for k in 0..nsolute {
                geo.facet_eps_c[f][k] = config.epsc * geo.diffusivities[k] / h;
            }
        } else {
            geo.facet_eps_n[f] = config.epsn;
            geo.facet_eps_p[f] = config.epsp;
            for k in 0..nsolute {
                geo.facet_eps_c[f][k] = config.epsc;
            }
        }
    }
    Ok(())
}

/// Sets the penalty factors of a projected point as the mean of the factors of both facets
pub fn set_point_penalties(point: &mut ContactPoint, tracked: &SurfaceGeometry, target: &SurfaceGeometry, coupling: &Coupling) {
    if let Some(fb) = point.target {
        let fa = point.facet;
        point.eps_n = 0.5 * (tracked.facet_eps_n[fa] + target.facet_eps_n[fb]);
        if coupling.poro {
            point.eps_p = 0.5 * (tracked.facet_eps_p[fa] + target.facet_eps_p[fb]);
        }
        for (k, kb) in coupling.solute_map.iter().enumerate() {
            point.eps_c[k] = 0.5 * (tracked.facet_eps_c[fa][k] + target.facet_eps_c[fb][*kb]);
        }
    }
}

/// Holds the measures of constraint violation used to decide on augmentations
#[derive(Clone, Debug, PartialEq)]
pub struct AugmentationReport {
    /// Norm of the normal multipliers before the update
    pub norm0: f64,

    /// Norm of the normal multipliers after the (candidate) update
    pub norm1: f64,

    /// Largest |g| over active points
    pub max_gap: f64,

    /// Largest |g_p| over active points
    pub max_pressure_gap: f64,

    /// Largest |g_c| over active points and solutes
    pub max_concentration_gap: f64,
}

impl AugmentationReport {
    /// Allocates a new instance
    pub fn new() -> Self {
        AugmentationReport {
            norm0: 0.0,
            norm1: 0.0,
            max_gap: 0.0,
            max_pressure_gap: 0.0,
            max_concentration_gap: 0.0,
        }
    }

    /// Accumulates the data of the points of a tracked surface
    ///
    /// The norms are accumulated as sums of squares; see [AugmentationReport::lnorm].
    pub fn accumulate(&mut self, points: &[ContactPoint], coupling: &Coupling) {
        for p in points {
            self.norm0 += p.lambda_n * p.lambda_n;
            if !p.status.projected() {
                continue;
            }
            let candidate = f64::max(0.0, p.lambda_n - p.eps_n * p.gap);
            self.norm1 += candidate * candidate;
            if p.status.active() {
                self.max_gap = f64::max(self.max_gap, f64::abs(p.gap));
                if coupling.poro {
                    self.max_pressure_gap = f64::max(self.max_pressure_gap, f64::abs(p.pressure_gap));
                }
                for k in 0..coupling.nsolute() {
                    self.max_concentration_gap = f64::max(self.max_concentration_gap, f64::abs(p.concentration_gap[k]));
                }
            }
        }
    }

    /// Returns the relative change of the norm of the normal multipliers
    ///
    /// Returns zero if the updated norm is zero (e.g., no contact).
    pub fn lnorm(&self) -> f64 {
        let (l0, l1) = (f64::sqrt(self.norm0), f64::sqrt(self.norm1));
        if l1 > 0.0 {
            f64::abs(l1 - l0) / l1
        } else {
            0.0
        }
    }

    /// Returns true if every enabled tolerance is satisfied
    pub fn converged(&self, config: &Config) -> bool {
        let mut ok = true;
        if config.atol > 0.0 && self.lnorm() >= config.atol {
            ok = false;
        }
        if config.gtol > 0.0 && self.max_gap >= config.gtol {
            ok = false;
        }
        if config.ptol > 0.0 && self.max_pressure_gap >= config.ptol {
            ok = false;
        }
        if config.ctol > 0.0 && self.max_concentration_gap >= config.ctol {
            ok = false;
        }
        ok
    }

    /// Prints the header of the table printed by [AugmentationReport::print]
    pub fn print_header(name: &str) {
        println!("\nAugmentations of {}", name);
        println!(
            "{:>5} {:>13} {:>13} {:>13} {:>13} {:>9}",
            "naug", "lnorm", "max |g|", "max |gp|", "max |gc|", "converged"
        );
    }

    /// Prints one line of the augmentations table
    pub fn print(&self, naug: usize, converged: bool) {
        println!(
            "{:>5} {:>13.6e} {:>13.6e} {:>13.6e} {:>13.6e} {:>9}",
            naug,
            self.lnorm(),
            self.max_gap,
            self.max_pressure_gap,
            self.max_concentration_gap,
            if converged { "✅" } else { "❌" }
        );
    }
}

/// Updates the multipliers of the points of a tracked surface
///
/// ```text
/// λn ← ⟨λn − εn g⟩     λp ← λp + εp gp     λc ← λc + εc gc
/// ```
///
/// The multipliers of points that are not in contact are reset.
pub fn update_multipliers(points: &mut [ContactPoint], coupling: &Coupling) {
    for p in points.iter_mut() {
        if p.status.active() {
            p.lambda_n = f64::max(0.0, p.lambda_n - p.eps_n * p.gap);
            if coupling.poro {
                p.lambda_p += p.eps_p * p.pressure_gap;
            }
            for k in 0..coupling.nsolute() {
                p.lambda_c[k] += p.eps_c[k] * p.concentration_gap[k];
            }
        } else {
            p.lambda_n = 0.0;
            p.lambda_p = 0.0;
            p.lambda_c.iter_mut().for_each(|l| *l = 0.0);
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{set_point_penalties, update_facet_penalties, update_multipliers, AugmentationReport};
    use crate::base::{Config, ContactStatus, NodeDofs, SampleSurfaces, ShapeCache};
    use crate::contact::{ContactPoint, ContactSurface, Coupling};
    use crate::material::ParamContactMaterial;
    use russell_lab::approx_eq;

    fn surface(size: f64, young: f64) -> ContactSurface {
        let mesh = SampleSurfaces::flat_qua4(0.0, 0.0, size, 2, 0.0, true);
        let (dofs, _) = NodeDofs::sequential(mesh.npoint(), 0, true, 1);
        let material = ParamContactMaterial::sample_multiphasic(young, 0.01, &[(0, 0.5)]);
        ContactSurface::new(mesh, dofs, &material).unwrap()
    }

    #[test]
    fn update_facet_penalties_works() {
        let mut surf = surface(4.0, 100.0);
        let mut cache = ShapeCache::new();
        let mut config = Config::new();
        config.epsn = 2.0;
        config.epsp = 3.0;
        config.epsc = 4.0;
        update_facet_penalties(&mut surf.geo, &config, &mut cache).unwrap();
        assert_eq!(surf.geo.facet_eps_n, &[2.0, 2.0, 2.0, 2.0]);
        assert_eq!(surf.geo.facet_eps_p[3], 3.0);
        assert_eq!(surf.geo.facet_eps_c[1], &[4.0]);

        // facets of area 4 (h = 2)
        config.auto_penalty = true;
        update_facet_penalties(&mut surf.geo, &config, &mut cache).unwrap();
        approx_eq(surf.geo.facet_eps_n[0], 2.0 * 100.0 / 2.0, 1e-13);
        approx_eq(surf.geo.facet_eps_p[2], 3.0 * 0.01 / 2.0, 1e-15);
        approx_eq(surf.geo.facet_eps_c[3][0], 4.0 * 0.5 / 2.0, 1e-15);

        // smaller facets are stiffer
        let mut small = surface(1.0, 100.0);
        update_facet_penalties(&mut small.geo, &config, &mut cache).unwrap();
        assert!(small.geo.facet_eps_n[0] > surf.geo.facet_eps_n[0]);
    }

    #[test]
    fn set_point_penalties_works() {
        let mut a = surface(1.0, 100.0);
        let mut b = surface(1.0, 100.0);
        a.geo.facet_eps_n[1] = 10.0;
        b.geo.facet_eps_n[2] = 30.0;
        a.geo.facet_eps_c[1][0] = 1.0;
        b.geo.facet_eps_c[2][0] = 2.0;
        let coupling = Coupling::new(&a.geo, &b.geo, 1.0).unwrap();
        let mut point = a.points[4].clone();
        assert_eq!(point.facet, 1);
        set_point_penalties(&mut point, &a.geo, &b.geo, &coupling);
        assert_eq!(point.eps_n, 0.0); // unprojected
        point.target = Some(2);
        set_point_penalties(&mut point, &a.geo, &b.geo, &coupling);
        assert_eq!(point.eps_n, 20.0);
        assert_eq!(point.eps_c, &[1.5]);
    }

    fn point(status: ContactStatus, gap: f64, lambda_n: f64) -> ContactPoint {
        let mut p = ContactPoint::new(0, 0, [0.0, 0.0], 1.0, 1.0, 1);
        p.status = status;
        p.target = if status.projected() { Some(0) } else { None };
        p.gap = gap;
        p.lambda_n = lambda_n;
        p.eps_n = 100.0;
        p.eps_p = 2.0;
        p.eps_c = vec![4.0];
        p.pressure_gap = 0.5;
        p.concentration_gap = vec![-0.25];
        p
    }

    #[test]
    fn report_works() {
        let coupling = Coupling {
            poro: true,
            solute_map: vec![0],
            rt: 0.0,
        };
        let points = vec![
            point(ContactStatus::Active, -0.03, 0.0),
            point(ContactStatus::Active, -0.04, 0.0),
            point(ContactStatus::Inactive, 0.2, 0.0),
            point(ContactStatus::Unprojected, 0.0, 0.0),
        ];
        let mut report = AugmentationReport::new();
        report.accumulate(&points, &coupling);
        approx_eq(report.norm0, 0.0, 1e-15);
        approx_eq(report.norm1, 25.0, 1e-12); // 3² + 4²
        approx_eq(report.lnorm(), 1.0, 1e-15);
        approx_eq(report.max_gap, 0.04, 1e-15);
        approx_eq(report.max_pressure_gap, 0.5, 1e-15);
        approx_eq(report.max_concentration_gap, 0.25, 1e-15);

        let mut config = Config::new();
        config.atol = 0.0;
        assert!(report.converged(&config)); // nothing enabled
        config.gtol = 0.05;
        assert!(report.converged(&config));
        config.gtol = 0.01;
        assert!(!report.converged(&config));
        config.gtol = 0.0;
        config.ptol = 0.1;
        assert!(!report.converged(&config));
        config.ptol = 0.0;
        config.atol = 0.5;
        assert!(!report.converged(&config));

        // no contact
        let mut report = AugmentationReport::new();
        report.accumulate(&points[2..], &coupling);
        assert_eq!(report.lnorm(), 0.0);
    }

    #[test]
    fn update_multipliers_works() {
        let coupling = Coupling {
            poro: true,
            solute_map: vec![0],
            rt: 0.0,
        };
        let mut points = vec![
            point(ContactStatus::Active, -0.03, 1.0),
            point(ContactStatus::Inactive, 0.2, 5.0),
        ];
        points[1].lambda_p = 3.0;
        update_multipliers(&mut points, &coupling);
        approx_eq(points[0].lambda_n, 4.0, 1e-14);
        approx_eq(points[0].lambda_p, 1.0, 1e-15);
        approx_eq(points[0].lambda_c[0], -1.0, 1e-15);
        assert_eq!(points[1].lambda_n, 0.0);
        assert_eq!(points[1].lambda_p, 0.0);
    }
}
