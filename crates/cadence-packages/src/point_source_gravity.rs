//! Gravity from a single moving point mass.

use cadence_core::{
    ConfigurationError, NodeList, PhysicalConstants, PhysicsError, State, Vector, ACCELERATION,
    POSITION, VELOCITY,
};
use cadence_physics::{Boundary, KinematicsCore, Physics};

use crate::missing;

const TIMESTEP_COEFFICIENT: f64 = 1e-4;

/// Newtonian attraction toward a point source that drifts at a fixed
/// velocity. The source is not a node; it advances once per cycle in
/// [`Physics::pre_step_initialize`], so Runge–Kutta stages within a
/// cycle all see the same source position.
pub struct PointSourceGravity<const D: usize> {
    core: KinematicsCore<D>,
    constants: PhysicalConstants,
    source_position: Vector<D>,
    source_velocity: Vector<D>,
    source_mass: f64,
}

impl<const D: usize> PointSourceGravity<D> {
    /// Enroll the particle fields and build the package.
    pub fn new(
        nodes: &mut NodeList<D>,
        constants: PhysicalConstants,
        source_position: Vector<D>,
        source_velocity: Vector<D>,
        source_mass: f64,
    ) -> Result<Self, ConfigurationError> {
        Ok(Self {
            core: KinematicsCore::enroll(nodes, TIMESTEP_COEFFICIENT)?,
            constants,
            source_position,
            source_velocity,
            source_mass,
        })
    }

    /// Where the source currently is.
    pub fn source_position(&self) -> Vector<D> {
        self.source_position
    }

    /// Attach a boundary.
    pub fn add_boundary(&mut self, boundary: Box<dyn Boundary<D>>) {
        self.core.add_boundary(boundary);
    }
}

impl<const D: usize> Physics<D> for PointSourceGravity<D> {
    fn name(&self) -> &str {
        "point_source_gravity"
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

    fn pre_step_initialize(&mut self, nodes: &mut NodeList<D>, dt: f64) -> Result<(), PhysicsError> {
        self.refresh_state(nodes)?;
        self.source_position += self.source_velocity * dt;
        Ok(())
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

        let gm = self.constants.g() * self.source_mass;
        let source = self.source_position;
        let mut accels = vec![Vector::<D>::zeros(); positions.len()];
        for (i, xi) in positions.iter().enumerate() {
            let r = source - xi;
            let r2 = r.norm_squared();
            // a = G m r_hat / r^2; unsoftened, as a point source should be.
            accels[i] = r * (gm / (r2 * r2.sqrt()));
            self.core.note_node(&velocities[i], &accels[i]);
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
