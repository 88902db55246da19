//! Implements an implicit step driver for analyses with sliding contact

mod bulk_model;
mod control_step;
mod prescribed_values;
mod solver_contact;
pub use crate::fem::bulk_model::*;
pub use crate::fem::control_step::*;
pub use crate::fem::prescribed_values::*;
pub use crate::fem::solver_contact::*;
