//! Reference physics packages and boundaries for Cadence simulations.
//!
//! Gravity in four flavours (constant field, moving point source,
//! direct O(N²) summation, Barnes–Hut tree), Kuramoto phase coupling,
//! and two boundaries (sphere collider, motion constraint). Each
//! package implements the [`Physics`](cadence_physics::Physics)
//! protocol; the particle packages embed a
//! [`KinematicsCore`](cadence_physics::KinematicsCore) and integrate
//! `position` and `velocity`.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod constant_gravity;
pub mod motion_constraint;
pub mod nbody_gravity;
pub mod phase_coupling;
pub mod point_source_gravity;
pub mod sphere_collider;
pub mod tree_gravity;

pub use constant_gravity::ConstantGravity;
pub use motion_constraint::MotionConstraint;
pub use nbody_gravity::NBodyGravity;
pub use phase_coupling::PhaseCoupling;
pub use point_source_gravity::PointSourceGravity;
pub use sphere_collider::SphereCollider;
pub use tree_gravity::TreeGravity;

use cadence_core::PhysicsError;

pub(crate) fn missing(name: &str) -> PhysicsError {
    PhysicsError::MissingField {
        name: name.to_string(),
    }
}
