//! Benchmark profiles and utilities for the Cadence multiphysics
//! engine.
//!
//! Provides deterministic particle clouds and pre-wired integrators for
//! benchmarking:
//!
//! - [`random_cloud`]: seeded cluster of massive bodies
//! - [`tree_gravity_profile`]: Barnes-Hut gravity under RK4
//! - [`nbody_gravity_profile`]: direct-summation gravity under RK4

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use cadence_core::{FieldKind, NodeList, PhysicalConstants, Vector, MASS, POSITION, VELOCITY};
use cadence_engine::{Integrator, IntegratorConfig, SubstepScheme};
use cadence_packages::{NBodyGravity, TreeGravity};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Softening length shared by the gravity profiles.
pub const SOFTENING: f64 = 1e-4;

/// A seeded cloud of `n` bodies with masses in [0.5, 2), positions in
/// a 10-unit cube, and small random velocities.
pub fn random_cloud(n: usize, seed: u64) -> NodeList<3> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut nodes: NodeList<3> = NodeList::new(n);
    nodes.enroll(MASS, FieldKind::Scalar).unwrap();
    nodes.enroll(POSITION, FieldKind::Vector).unwrap();
    nodes.enroll(VELOCITY, FieldKind::Vector).unwrap();
    for m in nodes.scalar_mut(MASS).unwrap() {
        *m = rng.random_range(0.5..2.0);
    }
    for x in nodes.vector_mut(POSITION).unwrap() {
        *x = Vector::<3>::from([
            rng.random_range(-5.0..5.0),
            rng.random_range(-5.0..5.0),
            rng.random_range(-5.0..5.0),
        ]);
    }
    for v in nodes.vector_mut(VELOCITY).unwrap() {
        *v = Vector::<3>::from([
            rng.random_range(-0.1..0.1),
            rng.random_range(-0.1..0.1),
            rng.random_range(-0.1..0.1),
        ]);
    }
    nodes
}

fn rk4_config() -> IntegratorConfig {
    IntegratorConfig {
        scheme: SubstepScheme::RungeKutta4,
        dt_min: 1e-3,
        ..IntegratorConfig::default()
    }
}

/// An `n`-body cloud stepped with Barnes-Hut gravity under RK4.
pub fn tree_gravity_profile(n: usize, seed: u64) -> (NodeList<3>, Integrator<3>) {
    let mut nodes = random_cloud(n, seed);
    let gravity = TreeGravity::new(&mut nodes, PhysicalConstants::si(), SOFTENING).unwrap();
    let integrator = Integrator::new(rk4_config(), vec![Box::new(gravity)]).unwrap();
    (nodes, integrator)
}

/// An `n`-body cloud stepped with direct-summation gravity under RK4.
pub fn nbody_gravity_profile(n: usize, seed: u64) -> (NodeList<3>, Integrator<3>) {
    let mut nodes = random_cloud(n, seed);
    let gravity = NBodyGravity::new(&mut nodes, PhysicalConstants::si(), SOFTENING).unwrap();
    let integrator = Integrator::new(rk4_config(), vec![Box::new(gravity)]).unwrap();
    (nodes, integrator)
}
