//! Physics package and boundary contracts for Cadence simulations.
//!
//! [`Physics`] is the per-package protocol the integrator drives each
//! cycle; [`Boundary`] constrains a package's proposed state after
//! integration; [`KinematicsCore`] is the shared particle-kinematics
//! core the concrete packages embed.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod boundary;
pub mod kinematics;
pub mod physics;

pub use boundary::Boundary;
pub use kinematics::KinematicsCore;
pub use physics::{enroll_fields, enroll_state_fields, runtime_error, Physics};
