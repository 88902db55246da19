//! Implements the base structures for a contact analysis

mod assembly;
mod config;
mod constants;
mod dofs;
mod enums;
mod error;
mod quadrature;
mod sample_surfaces;
mod shapes;
mod surface_mesh;
mod vec3;
pub use crate::base::assembly::*;
pub use crate::base::config::*;
pub use crate::base::constants::*;
pub use crate::base::dofs::*;
pub use crate::base::enums::*;
pub use crate::base::error::*;
pub use crate::base::quadrature::*;
pub use crate::base::sample_surfaces::*;
pub use crate::base::shapes::*;
pub use crate::base::surface_mesh::*;
pub use crate::base::vec3::*;
