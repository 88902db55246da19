//! Implements the sliding contact interface between (porous) surfaces

mod augmentation;
mod contact_surface;
mod enforcer;
mod gap;
mod interface_state;
mod projection;
mod sliding_interface;
pub use crate::contact::augmentation::*;
pub use crate::contact::contact_surface::*;
pub use crate::contact::enforcer::*;
pub use crate::contact::gap::*;
pub use crate::contact::interface_state::*;
pub use crate::contact::projection::*;
pub use crate::contact::sliding_interface::*;
