use crate::StrError;
use serde::{Deserialize, Serialize};

/// Defines the capabilities of the material attached to a contact surface
///
/// The contact surface queries these values once at initialization and caches them.
pub trait ContactMaterial: Send + Sync {
    /// Returns true if the material carries a fluid pressure field
    fn porous(&self) -> bool;

    /// Returns the number of solutes
    fn solute_count(&self) -> usize;

    /// Returns the global identifier of the k-th solute
    fn solute_id(&self, k: usize) -> Result<usize, StrError>;

    /// Returns a measure of the stiffness of the solid (e.g., Young's modulus)
    fn stiffness(&self) -> f64;

    /// Returns a measure of the hydraulic permeability (zero if not porous)
    fn permeability(&self) -> f64;

    /// Returns the diffusivity of the k-th solute
    fn diffusivity(&self, k: usize) -> Result<f64, StrError>;
}

/// Holds parameters of a solute
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub struct ParamSolute {
    /// Global identifier of the solute (e.g., 0 for Na⁺, 1 for Cl⁻)
    pub id: usize,

    /// Diffusivity
    pub diffusivity: f64,
}

/// Holds parameters of a (possibly porous and multiphasic) material on a contact surface
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct ParamContactMaterial {
    /// Young's modulus
    pub young: f64,

    /// Hydraulic permeability (None if not porous)
    pub permeability: Option<f64>,

    /// Solutes (requires a porous material)
    pub solutes: Vec<ParamSolute>,
}

impl ParamContactMaterial {
    /// Returns parameters for an elastic solid
    pub fn sample_solid(young: f64) -> Self {
        ParamContactMaterial {
            young,
            permeability: None,
            solutes: Vec::new(),
        }
    }

    /// Returns parameters for a biphasic (solid + fluid) material
    pub fn sample_biphasic(young: f64, permeability: f64) -> Self {
        ParamContactMaterial {
            young,
            permeability: Some(permeability),
            solutes: Vec::new(),
        }
    }

    /// Returns parameters for a multiphasic material with the given solutes
    ///
    /// # Input
    ///
    /// * `solutes` -- pairs of (id, diffusivity)
    pub fn sample_multiphasic(young: f64, permeability: f64, solutes: &[(usize, f64)]) -> Self {
        ParamContactMaterial {
            young,
            permeability: Some(permeability),
            solutes: solutes
                .iter()
                .map(|(id, diffusivity)| ParamSolute {
                    id: *id,
                    diffusivity: *diffusivity,
                })
                .collect(),
        }
    }

    /// Validates all data
    ///
    /// Returns a message with the inconsistent data, or returns None if everything is all right.
    pub fn validate(&self) -> Option<String> {
        if self.young <= 0.0 {
            return Some(format!("young = {:?} is incorrect; it must be > 0.0", self.young));
        }
        if let Some(k) = self.permeability {
            if k < 0.0 {
                return Some(format!("permeability = {:?} is incorrect; it must be ≥ 0.0", k));
            }
        } else if self.solutes.len() > 0 {
            return Some("solutes require a porous material (permeability must be given)".to_string());
        }
        for (k, solute) in self.solutes.iter().enumerate() {
            if solute.diffusivity < 0.0 {
                return Some(format!("diffusivity of solute {} must be ≥ 0.0", k));
            }
            if self.solutes[..k].iter().any(|s| s.id == solute.id) {
                return Some(format!("solute id {} is repeated", solute.id));
            }
        }
        None // all good
    }
}

impl ContactMaterial for ParamContactMaterial {
    fn porous(&self) -> bool {
        self.permeability.is_some()
    }

    fn solute_count(&self) -> usize {
        self.solutes.len()
    }

    fn solute_id(&self, k: usize) -> Result<usize, StrError> {
        self.solutes.get(k).map(|s| s.id).ok_or("solute index is out of bounds")
    }

    fn stiffness(&self) -> f64 {
        self.young
    }

    fn permeability(&self) -> f64 {
        self.permeability.unwrap_or(0.0)
    }

    fn diffusivity(&self, k: usize) -> Result<f64, StrError> {
        self.solutes
            .get(k)
            .map(|s| s.diffusivity)
            .ok_or("solute index is out of bounds")
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
