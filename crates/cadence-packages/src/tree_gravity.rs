//! Barnes–Hut tree gravity.

use cadence_core::{
    ConfigurationError, NodeList, PhysicalConstants, PhysicsError, State, Vector, ACCELERATION,
    MASS, POSITION, VELOCITY,
};
use cadence_physics::{Boundary, KinematicsCore, Physics};
use cadence_tree::SpatialTree;
use rayon::prelude::*;

use crate::missing;

const TIMESTEP_COEFFICIENT: f64 = 1e-2;
const DEFAULT_OPENING_ANGLE: f64 = 0.5;

/// Approximate N-body gravity via a Barnes–Hut tree.
///
/// A fresh tree is built from the stage-input positions on every
/// derivative evaluation; per-body force queries then run in parallel
/// against the shared tree.
pub struct TreeGravity<const D: usize> {
    core: KinematicsCore<D>,
    constants: PhysicalConstants,
    /// Squared Plummer softening length.
    plummer_length: f64,
    opening_angle: f64,
}

impl<const D: usize> TreeGravity<D> {
    /// Enroll the particle fields and build the package with the
    /// standard opening angle of 0.5.
    pub fn new(
        nodes: &mut NodeList<D>,
        constants: PhysicalConstants,
        plummer_length: f64,
    ) -> Result<Self, ConfigurationError> {
        Ok(Self {
            core: KinematicsCore::enroll(nodes, TIMESTEP_COEFFICIENT)?,
            constants,
            plummer_length,
            opening_angle: DEFAULT_OPENING_ANGLE,
        })
    }

    /// Override the opening angle. Smaller is more accurate and more
    /// expensive; 0 degenerates to direct summation.
    pub fn with_opening_angle(mut self, theta: f64) -> Self {
        self.opening_angle = theta;
        self
    }

    /// Attach a boundary.
    pub fn add_boundary(&mut self, boundary: Box<dyn Boundary<D>>) {
        self.core.add_boundary(boundary);
    }
}

impl<const D: usize> Physics<D> for TreeGravity<D> {
    fn name(&self) -> &str {
        "tree_gravity"
    }

    fn state(&self) -> &State<D> {
        self.core.state()
    }

    fn state_mut(&mut self) -> &mut State<D> {
        self.core.state_mut()
    }

    fn boundaries_mut(&mut self) -> &mut Vec<Box<dyn Boundary<D>>> {
        self.core.boundaries_mut()
    }

    fn evaluate_derivatives(
        &mut self,
        input: &State<D>,
        deriv: &mut State<D>,
        nodes: &mut NodeList<D>,
        _time: f64,
        dt_offset: f64,
    ) -> Result<(), PhysicsError> {
        self.core.begin_evaluation(dt_offset);
        let positions = input.vector(POSITION).ok_or_else(|| missing(POSITION))?;
        let velocities = input.vector(VELOCITY).ok_or_else(|| missing(VELOCITY))?;
        let masses = nodes.mass().ok_or_else(|| missing(MASS))?;

        let tree = SpatialTree::build(positions, masses);
        let g = self.constants.g();
        let theta = self.opening_angle;
        let eps2 = self.plummer_length;
        let accels: Vec<Vector<D>> = positions
            .par_iter()
            .enumerate()
            .map(|(i, xi)| tree.accel_on(i, xi, theta, g, eps2))
            .collect();

        for (v, a) in velocities.iter().zip(&accels) {
            self.core.note_node(v, a);
        }

        let accel_field = nodes
            .vector_mut(ACCELERATION)
            .ok_or_else(|| missing(ACCELERATION))?;
        accel_field.copy_from_slice(&accels);

        let dxdt = deriv.vector_mut(POSITION).ok_or_else(|| missing(POSITION))?;
        dxdt.copy_from_slice(velocities);
        let dvdt = deriv.vector_mut(VELOCITY).ok_or_else(|| missing(VELOCITY))?;
        dvdt.copy_from_slice(&accels);
        Ok(())
    }

    fn estimate_timestep(&self) -> Option<f64> {
        self.core.timestep_estimate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NBodyGravity;
    use rand::Rng;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn random_cluster(n: usize, seed: u64) -> NodeList<3> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut nodes: NodeList<3> = NodeList::new(n);
        nodes.enroll(MASS, cadence_core::FieldKind::Scalar).unwrap();
        nodes
            .enroll(POSITION, cadence_core::FieldKind::Vector)
            .unwrap();
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
        nodes
    }

    #[test]
    fn matches_direct_summation_at_zero_opening_angle() {
        let mut nodes = random_cluster(100, 3);
        let mut tree_pkg = TreeGravity::new(&mut nodes, PhysicalConstants::si(), 1e-8)
            .unwrap()
            .with_opening_angle(0.0);
        let mut direct_pkg = NBodyGravity::new(&mut nodes, PhysicalConstants::si(), 0.0).unwrap();
        tree_pkg.zero_time_initialize(&mut nodes).unwrap();
        direct_pkg.zero_time_initialize(&mut nodes).unwrap();

        let input = tree_pkg.state().clone();
        let mut tree_deriv = input.ghost();
        tree_pkg
            .evaluate_derivatives(&input, &mut tree_deriv, &mut nodes, 0.0, 0.0)
            .unwrap();
        let mut direct_deriv = input.ghost();
        direct_pkg
            .evaluate_derivatives(&input, &mut direct_deriv, &mut nodes, 0.0, 0.0)
            .unwrap();

        // Softening differs slightly in form; compare loosely but per node.
        let ta = tree_deriv.vector(VELOCITY).unwrap();
        let da = direct_deriv.vector(VELOCITY).unwrap();
        for (t, d) in ta.iter().zip(da) {
            let scale = d.norm().max(1e-20);
            assert!(
                (t - d).norm() / scale < 1e-3,
                "tree {t:?} vs direct {d:?}"
            );
        }
    }

    #[test]
    fn single_body_is_force_free() {
        let mut nodes: NodeList<3> = NodeList::new(1);
        let mut pkg = TreeGravity::new(&mut nodes, PhysicalConstants::si(), 1e-8).unwrap();
        nodes.scalar_mut(MASS).unwrap()[0] = 1e20;
        pkg.zero_time_initialize(&mut nodes).unwrap();
        let input = pkg.state().clone();
        let mut deriv = input.ghost();
        pkg.evaluate_derivatives(&input, &mut deriv, &mut nodes, 0.0, 0.0)
            .unwrap();
        assert_eq!(deriv.vector(VELOCITY).unwrap()[0], Vector::<3>::zeros());
        assert!(pkg.estimate_timestep().is_none());
    }
}
