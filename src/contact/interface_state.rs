use super::ContactSurface;
use crate::base::ContactStatus;
use crate::StrError;
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

/// Holds the persistent state of a contact surface
///
/// The fields are stored as arrays (one entry per integration point, facet by facet, unless
/// noted otherwise) in the following order: surface flags, gaps, multipliers, projections,
/// penalty factors, and node normals.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SurfaceState {
    /// Carries a fluid pressure
    pub porous: bool,

    /// Global identifiers of the solutes
    pub solute_ids: Vec<usize>,

    /// Normal gaps
    pub gap: Vec<f64>,

    /// Pressure gaps
    pub pressure_gap: Vec<f64>,

    /// Concentration gaps (point, solute)
    pub concentration_gap: Vec<Vec<f64>>,

    /// Normal multipliers
    pub lambda_n: Vec<f64>,

    /// Fluid flux multipliers
    pub lambda_p: Vec<f64>,

    /// Solute flux multipliers (point, solute)
    pub lambda_c: Vec<Vec<f64>>,

    /// Net contact pressures
    pub net_pressure: Vec<f64>,

    /// Target facets
    pub target: Vec<Option<usize>>,

    /// Natural coordinates on the target facets
    pub rs: Vec<[f64; 2]>,

    /// Contact states
    pub status: Vec<ContactStatus>,

    /// Normal penalty factors
    pub eps_n: Vec<f64>,

    /// Pressure penalty factors
    pub eps_p: Vec<f64>,

    /// Concentration penalty factors (point, solute)
    pub eps_c: Vec<Vec<f64>>,

    /// Normal penalty factors of the facets
    pub facet_eps_n: Vec<f64>,

    /// Pressure penalty factors of the facets
    pub facet_eps_p: Vec<f64>,

    /// Concentration penalty factors of the facets (facet, solute)
    pub facet_eps_c: Vec<Vec<f64>>,

    /// Node normals
    pub node_normals: Vec<[f64; 3]>,
}

impl SurfaceState {
    /// Captures the state of a surface
    pub fn capture(surf: &ContactSurface) -> Self {
        let pts = &surf.points;
        SurfaceState {
            porous: surf.geo.porous,
            solute_ids: surf.geo.solute_ids.clone(),
            gap: pts.iter().map(|p| p.gap).collect(),
            pressure_gap: pts.iter().map(|p| p.pressure_gap).collect(),
            concentration_gap: pts.iter().map(|p| p.concentration_gap.clone()).collect(),
            lambda_n: pts.iter().map(|p| p.lambda_n).collect(),
            lambda_p: pts.iter().map(|p| p.lambda_p).collect(),
            lambda_c: pts.iter().map(|p| p.lambda_c.clone()).collect(),
            net_pressure: pts.iter().map(|p| p.net_pressure).collect(),
            target: pts.iter().map(|p| p.target).collect(),
            rs: pts.iter().map(|p| p.rs).collect(),
            status: pts.iter().map(|p| p.status).collect(),
            eps_n: pts.iter().map(|p| p.eps_n).collect(),
            eps_p: pts.iter().map(|p| p.eps_p).collect(),
            eps_c: pts.iter().map(|p| p.eps_c.clone()).collect(),
            facet_eps_n: surf.geo.facet_eps_n.clone(),
            facet_eps_p: surf.geo.facet_eps_p.clone(),
            facet_eps_c: surf.geo.facet_eps_c.clone(),
            node_normals: surf.geo.node_normals.clone(),
        }
    }

    /// Checks whether the state fits the layout of a surface
    ///
    /// The target facets are not checked here because they refer to the opposing surface.
    pub fn check(&self, surf: &ContactSurface) -> Result<(), StrError> {
        if self.porous != surf.geo.porous || self.solute_ids != surf.geo.solute_ids {
            return Err("surface state has incompatible flags");
        }
        let npoint = surf.points.len();
        let nsolute = surf.nsolute();
        let sizes_ok = self.gap.len() == npoint
            && self.pressure_gap.len() == npoint
            && self.concentration_gap.len() == npoint
            && self.lambda_n.len() == npoint
            && self.lambda_p.len() == npoint
            && self.lambda_c.len() == npoint
            && self.net_pressure.len() == npoint
            && self.target.len() == npoint
            && self.rs.len() == npoint
            && self.status.len() == npoint
            && self.eps_n.len() == npoint
            && self.eps_p.len() == npoint
            && self.eps_c.len() == npoint
            && self.facet_eps_n.len() == surf.geo.nfacet()
            && self.facet_eps_p.len() == surf.geo.nfacet()
            && self.facet_eps_c.len() == surf.geo.nfacet()
            && self.node_normals.len() == surf.geo.npoint();
        if !sizes_ok {
            return Err("surface state has incompatible number of points, facets, or nodes");
        }
        let species_ok = self.concentration_gap.iter().all(|v| v.len() == nsolute)
            && self.lambda_c.iter().all(|v| v.len() == nsolute)
            && self.eps_c.iter().all(|v| v.len() == nsolute)
            && self.facet_eps_c.iter().all(|v| v.len() == nsolute);
        if !species_ok {
            return Err("surface state has incompatible number of solutes");
        }
        Ok(())
    }

    /// Writes the state into a surface with the same layout
    ///
    /// Nothing is written if [SurfaceState::check] fails.
    pub fn apply(&self, surf: &mut ContactSurface) -> Result<(), StrError> {
        self.check(surf)?;
        for (i, p) in surf.points.iter_mut().enumerate() {
            p.gap = self.gap[i];
            p.pressure_gap = self.pressure_gap[i];
            p.concentration_gap = self.concentration_gap[i].clone();
            p.lambda_n = self.lambda_n[i];
            p.lambda_p = self.lambda_p[i];
            p.lambda_c = self.lambda_c[i].clone();
            p.net_pressure = self.net_pressure[i];
            p.target = self.target[i];
            p.rs = self.rs[i];
            p.status = self.status[i];
            p.eps_n = self.eps_n[i];
            p.eps_p = self.eps_p[i];
            p.eps_c = self.eps_c[i].clone();
        }
        surf.geo.facet_eps_n = self.facet_eps_n.clone();
        surf.geo.facet_eps_p = self.facet_eps_p.clone();
        surf.geo.facet_eps_c = self.facet_eps_c.clone();
        surf.geo.node_normals = self.node_normals.clone();
        Ok(())
    }
}

/// Holds the persistent state of a sliding interface (for restart and step cutback)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InterfaceState {
    /// Name of the interface
    pub name: String,

    /// Number of augmentations performed in the current step
    pub naug: usize,

    /// State of surface A
    pub surf_a: SurfaceState,

    /// State of surface B
    pub surf_b: SurfaceState,
}

impl InterfaceState {
    /// Reads a JSON file containing the state
    ///
    /// # Input
    ///
    /// * `full_path` -- may be a String, &str, or Path
    pub fn read_json<P>(full_path: &P) -> Result<Self, StrError>
    where
        P: AsRef<OsStr> + ?Sized,
    {
        let path = Path::new(full_path).to_path_buf();
        let input = File::open(path).map_err(|_| "cannot open file")?;
        let buffered = BufReader::new(input);
        let state = serde_json::from_reader(buffered).map_err(|_| "cannot parse JSON file")?;
        Ok(state)
    }

    /// Writes a JSON file with the state
    ///
    /// # Input
    ///
    /// * `full_path` -- may be a String, &str, or Path
    pub fn write_json<P>(&self, full_path: &P) -> Result<(), StrError>
    where
        P: AsRef<OsStr> + ?Sized,
    {
        let path = Path::new(full_path).to_path_buf();
        if let Some(p) = path.parent() {
            fs::create_dir_all(p).map_err(|_| "cannot create directory")?;
        }
        let mut file = File::create(&path).map_err(|_| "cannot create file")?;
        serde_json::to_writer(&mut file, &self).map_err(|_| "cannot write file")?;
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{InterfaceState, SurfaceState};
    use crate::base::{ContactStatus, NodeDofs, SampleSurfaces, DEFAULT_TEST_DIR};
    use crate::contact::ContactSurface;
    use crate::material::ParamContactMaterial;

    fn surface(n: usize, nsolute: usize) -> ContactSurface {
        let mesh = SampleSurfaces::flat_tri3(0.0, 0.0, 1.0, n, 0.0, true);
        let solutes: Vec<(usize, f64)> = (0..nsolute).map(|k| (k, 1.0)).collect();
        let (dofs, _) = NodeDofs::sequential(mesh.npoint(), 0, true, nsolute);
        let material = ParamContactMaterial::sample_multiphasic(1.0, 1.0, &solutes);
        ContactSurface::new(mesh, dofs, &material).unwrap()
    }

    #[test]
    fn capture_and_apply_work() {
        let mut surf = surface(1, 1);
        surf.points[1].target = Some(1);
        surf.points[1].rs = [0.2, 0.3];
        surf.points[1].status = ContactStatus::Active;
        surf.points[1].gap = -0.01;
        surf.points[1].lambda_c = vec![7.0];
        surf.geo.facet_eps_n[1] = 5.0;
        let state = SurfaceState::capture(&surf);
        assert_eq!(state.target, &[None, Some(1), None, None, None, None]);
        assert_eq!(state.lambda_c[1], &[7.0]);

        let mut other = surface(1, 1);
        state.apply(&mut other).unwrap();
        assert_eq!(other.points, surf.points);
        assert_eq!(other.geo.facet_eps_n, &[0.0, 5.0]);
    }

    #[test]
    fn apply_handles_errors() {
        let state = SurfaceState::capture(&surface(1, 1));
        assert_eq!(
            state.apply(&mut surface(1, 0)).err(),
            Some("surface state has incompatible flags")
        );
        assert_eq!(
            state.apply(&mut surface(2, 1)).err(),
            Some("surface state has incompatible number of points, facets, or nodes")
        );
        let mut bad = state.clone();
        bad.eps_c[0] = vec![1.0, 2.0];
        bad.lambda_n[0] = 123.0;
        let mut surf = surface(1, 1);
        assert_eq!(
            bad.check(&surf).err(),
            Some("surface state has incompatible number of solutes")
        );
        assert_eq!(
            bad.apply(&mut surf).err(),
            Some("surface state has incompatible number of solutes")
        );
        assert_eq!(surf.points[0].lambda_n, 0.0);
    }

    #[test]
    fn read_and_write_json_work() {
        let surf = surface(1, 0);
        let state = InterfaceState {
            name: "patch".to_string(),
            naug: 2,
            surf_a: SurfaceState::capture(&surf),
            surf_b: SurfaceState::capture(&surf),
        };
        let path = format!("{}/interface_state.json", DEFAULT_TEST_DIR);
        state.write_json(&path).unwrap();
        let read = InterfaceState::read_json(&path).unwrap();
        assert_eq!(read, state);
        assert_eq!(
            InterfaceState::read_json("/tmp/pmcontact/__not_found__.json").err(),
            Some("cannot open file")
        );
    }
}
