//! Cadence: a modular multiphysics time-stepping engine.
//!
//! This is the top-level facade crate that re-exports the public API
//! from all Cadence sub-crates. For most users, adding `cadence` as a
//! single dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use cadence::prelude::*;
//!
//! // Two bodies falling in a uniform field, stepped with RK4.
//! let mut nodes: NodeList<3> = NodeList::new(2);
//! let gravity = ConstantGravity::new(&mut nodes, Vector::<3>::from([0.0, 0.0, -9.81]))?;
//! nodes.vector_mut(POSITION).unwrap()[1] = Vector::<3>::from([1.0, 0.0, 10.0]);
//!
//! let config = IntegratorConfig {
//!     scheme: SubstepScheme::RungeKutta4,
//!     dt_min: 1e-3,
//!     ..IntegratorConfig::default()
//! };
//! let mut integrator = Integrator::new(config, vec![Box::new(gravity)])?;
//! for _ in 0..10 {
//!     integrator.step(&mut nodes)?;
//! }
//! assert!(nodes.positions().unwrap()[1][2] < 10.0);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in
//! the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `cadence-core` | Fields, node database, states, constants, errors |
//! | [`tree`] | `cadence-tree` | Barnes-Hut spatial tree |
//! | [`physics`] | `cadence-physics` | Physics and boundary contracts, kinematics core |
//! | [`packages`] | `cadence-packages` | Reference packages (gravity, oscillators) and boundaries |
//! | [`engine`] | `cadence-engine` | Integrator, substep schemes, timestep voting |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Fields, node database, states, and physical constants
/// (`cadence-core`).
///
/// The data model every other crate builds on: [`types::NodeList`]
/// owns the authoritative per-node fields, [`types::State`] is the
/// integrable copy a package works with.
pub use cadence_core as types;

/// Barnes-Hut spatial tree (`cadence-tree`).
///
/// [`tree::SpatialTree`] answers approximate gravitational
/// acceleration queries in `O(log n)` per body.
pub use cadence_tree as tree;

/// Physics and boundary contracts (`cadence-physics`).
///
/// The [`physics::Physics`] trait is the main extension point for
/// user-defined simulation logic; [`physics::KinematicsCore`] carries
/// the particle-kinematics plumbing most packages share.
pub use cadence_physics as physics;

/// Reference physics packages and boundaries (`cadence-packages`).
///
/// Gravity in four flavours ([`packages::ConstantGravity`],
/// [`packages::PointSourceGravity`], [`packages::NBodyGravity`],
/// [`packages::TreeGravity`]), Kuramoto phase coupling, and the
/// [`packages::SphereCollider`] / [`packages::MotionConstraint`]
/// boundaries.
pub use cadence_packages as packages;

/// Integration driver (`cadence-engine`).
///
/// [`engine::Integrator`] steps registered packages through one of
/// four substep schemes and votes the next timestep.
pub use cadence_engine as engine;

/// Common imports for typical Cadence usage.
///
/// ```rust
/// use cadence::prelude::*;
/// ```
///
/// This imports the most frequently used types: the node database and
/// state, the physics and boundary traits, the reference packages, and
/// the integrator.
pub mod prelude {
    // Data model
    pub use cadence_core::{
        Field, FieldKind, NodeList, PhysicalConstants, State, Vector, ACCELERATION, MASS,
        POSITION, VELOCITY,
    };

    // Errors
    pub use cadence_core::{ConfigurationError, PhysicsError, StepError};

    // Contracts
    pub use cadence_physics::{Boundary, KinematicsCore, Physics};

    // Reference packages and boundaries
    pub use cadence_packages::{
        ConstantGravity, MotionConstraint, NBodyGravity, PhaseCoupling, PointSourceGravity,
        SphereCollider, TreeGravity,
    };

    // Engine
    pub use cadence_engine::{
        ConvergenceReport, Integrator, IntegratorConfig, StepDiagnostics, SubstepScheme,
    };
}
