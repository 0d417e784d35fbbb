//! Constant gravitational field.

use cadence_core::{
    ConfigurationError, NodeList, PhysicsError, State, Vector, ACCELERATION, POSITION, VELOCITY,
};
use cadence_physics::{Boundary, KinematicsCore, Physics};

use crate::missing;

const TIMESTEP_COEFFICIENT: f64 = 1e-4;

/// Uniform acceleration applied to every node.
///
/// The acceleration never changes, so it is written into the
/// `acceleration` field once at zero time and only read thereafter.
pub struct ConstantGravity<const D: usize> {
    core: KinematicsCore<D>,
    gravity: Vector<D>,
}

impl<const D: usize> ConstantGravity<D> {
    /// Enroll the particle fields and build the package.
    pub fn new(nodes: &mut NodeList<D>, gravity: Vector<D>) -> Result<Self, ConfigurationError> {
        Ok(Self {
            core: KinematicsCore::enroll(nodes, TIMESTEP_COEFFICIENT)?,
            gravity,
        })
    }

    /// Attach a boundary.
    pub fn add_boundary(&mut self, boundary: Box<dyn Boundary<D>>) {
        self.core.add_boundary(boundary);
    }
}

impl<const D: usize> Physics<D> for ConstantGravity<D> {
    fn name(&self) -> &str {
        "constant_gravity"
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

    fn zero_time_initialize(&mut self, nodes: &mut NodeList<D>) -> Result<(), PhysicsError> {
        let accel = nodes
            .vector_mut(ACCELERATION)
            .ok_or_else(|| missing(ACCELERATION))?;
        for a in accel.iter_mut() {
            *a = self.gravity;
        }
        self.refresh_state(nodes)?;
        self.initialize_boundaries(nodes);
        Ok(())
    }

    fn evaluate_derivatives(
        &mut self,
        input: &State<D>,
        deriv: &mut State<D>,
        _nodes: &mut NodeList<D>,
        _time: f64,
        dt_offset: f64,
    ) -> Result<(), PhysicsError> {
        self.core.begin_evaluation(dt_offset);
        let velocities = input.vector(VELOCITY).ok_or_else(|| missing(VELOCITY))?;
        for v in velocities {
            self.core.note_node(v, &self.gravity);
        }

        let dxdt = deriv.vector_mut(POSITION).ok_or_else(|| missing(POSITION))?;
        dxdt.copy_from_slice(velocities);
        let dvdt = deriv.vector_mut(VELOCITY).ok_or_else(|| missing(VELOCITY))?;
        for a in dvdt.iter_mut() {
            *a = self.gravity;
        }
        Ok(())
    }

    fn estimate_timestep(&self) -> Option<f64> {
        self.core.timestep_estimate()
    }
}
