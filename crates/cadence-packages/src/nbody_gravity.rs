//! Direct-summation N-body gravity.

use cadence_core::{
    ConfigurationError, NodeList, PhysicalConstants, PhysicsError, State, Vector, ACCELERATION,
    MASS, POSITION, VELOCITY,
};
use cadence_physics::{Boundary, KinematicsCore, Physics};
use rayon::prelude::*;

use crate::missing;

const TIMESTEP_COEFFICIENT: f64 = 1e-2;

/// Pairwise O(N²) gravity with Plummer softening.
///
/// Exact up to the softening; use [`TreeGravity`](crate::TreeGravity)
/// when N grows past a few thousand.
pub struct NBodyGravity<const D: usize> {
    core: KinematicsCore<D>,
    constants: PhysicalConstants,
    /// Squared softening length added to each pair's squared distance.
    plummer_length: f64,
}

impl<const D: usize> NBodyGravity<D> {
    /// Enroll the particle fields and build the package.
    pub fn new(
        nodes: &mut NodeList<D>,
        constants: PhysicalConstants,
        plummer_length: f64,
    ) -> Result<Self, ConfigurationError> {
        Ok(Self {
            core: KinematicsCore::enroll(nodes, TIMESTEP_COEFFICIENT)?,
            constants,
            plummer_length,
        })
    }

    /// Attach a boundary.
    pub fn add_boundary(&mut self, boundary: Box<dyn Boundary<D>>) {
        self.core.add_boundary(boundary);
    }
}

impl<const D: usize> Physics<D> for NBodyGravity<D> {
    fn name(&self) -> &str {
        "nbody_gravity"
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

        let g = self.constants.g();
        let eps = self.plummer_length;
        let accels: Vec<Vector<D>> = positions
            .par_iter()
            .enumerate()
            .map(|(i, xi)| {
                let mut a = Vector::<D>::zeros();
                for (j, xj) in positions.iter().enumerate() {
                    if j == i {
                        continue;
                    }
                    let rij = xj - xi;
                    let r2 = rij.norm_squared() + eps;
                    a += rij * (g * masses[j] / (r2 * rij.norm()));
                }
                a
            })
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
