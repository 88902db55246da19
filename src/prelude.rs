//! Makes available common structures needed to set up a contact analysis
//!
//! You may write `use pmcontact::prelude::*` in your code and obtain
//! access to commonly used functionality.

pub use crate::base::{
    Config, ContactError, ContactStatus, Facet, GlobalJacobian, NodeDofs, SampleSurfaces, SurfaceMesh,
    DEFAULT_OUT_DIR, DEFAULT_TEST_DIR,
};
pub use crate::contact::{ContactSurface, InterfaceState, SlidingInterface};
pub use crate::fem::{BulkModel, ControlStep, Essential, NodalSprings, SolverContact, SolverStats};
pub use crate::material::{ContactMaterial, ParamContactMaterial, ParamSolute};
pub use crate::StrError;
