//! Core data model for the Cadence multiphysics engine.
//!
//! Provides the typed field storage ([`Field`]), the shared node database
//! ([`NodeList`]), the integrable state vector ([`State`]), the error
//! taxonomy, and the unit-system constant bundle ([`PhysicalConstants`]).

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod constants;
pub mod error;
pub mod field;
pub mod nodelist;
pub mod state;

pub use constants::PhysicalConstants;
pub use error::{ConfigurationError, PhysicsError, StepError};
pub use field::{Field, FieldData, FieldKind, Vector};
pub use nodelist::{NodeList, ACCELERATION, MASS, POSITION, VELOCITY};
pub use state::State;
