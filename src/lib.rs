//! Sliding contact between deforming (porous) surfaces
//!
//! This crate implements a surface-to-surface contact constraint engine for nonlinear finite element
//! analyses of solids, biphasic, and multiphasic media. Non-penetration is enforced with penalty and
//! augmented Lagrangian methods; for porous bodies, the continuity of fluid pressure and solute
//! concentrations across the contact interface is enforced as well.
//!
//! The main structure is [contact::SlidingInterface], which owns two [contact::ContactSurface]s and
//! exposes the residual, stiffness, update, augmentation, and serialization contract consumed by
//! a global nonlinear solver. The [fem] module provides a small implicit driver implementing that
//! solver side (Newton iterations, augmentations, and step cutback).

/// Defines a type alias for the error type as a static string
pub type StrError = &'static str;

pub mod base;
pub mod contact;
pub mod fem;
pub mod material;
pub mod prelude;
