//! Implements the material capabilities needed by contact surfaces

mod contact_material;
pub use crate::material::contact_material::*;
