//! Shared particle-kinematics core.
//!
//! Every particle package integrates the same pair of fields (position
//! and velocity) off the same per-node scratch (acceleration) and votes
//! for its next timestep from the same velocity-over-acceleration
//! ratio. [`KinematicsCore`] bundles that machinery; concrete packages
//! embed one and delegate the [`Physics`](crate::Physics) accessors to
//! it.

use cadence_core::{
    ConfigurationError, FieldKind, NodeList, State, Vector, ACCELERATION, MASS, POSITION,
    VELOCITY,
};

use crate::boundary::Boundary;
use crate::physics::{enroll_fields, enroll_state_fields};

/// Common state, boundaries, and timestep bookkeeping for particle
/// packages.
pub struct KinematicsCore<const D: usize> {
    state: State<D>,
    boundaries: Vec<Box<dyn Boundary<D>>>,
    timestep_coefficient: f64,
    /// Minimum |v|²/|a|² observed by the last derivative evaluation.
    ratio2_min: f64,
    last_dt: f64,
}

impl<const D: usize> KinematicsCore<D> {
    /// Enroll the canonical particle fields (`mass`, `position`,
    /// `velocity`, `acceleration`) in the database and build a core
    /// integrating `position` and `velocity`.
    ///
    /// `timestep_coefficient` scales the √(|v|²/|a|²) timestep vote;
    /// gravity packages use 1e-4 (constant/point-source) or 1e-2
    /// (N-body and tree).
    pub fn enroll(
        nodes: &mut NodeList<D>,
        timestep_coefficient: f64,
    ) -> Result<Self, ConfigurationError> {
        enroll_fields(
            nodes,
            &[
                (MASS, FieldKind::Scalar),
                (POSITION, FieldKind::Vector),
                (VELOCITY, FieldKind::Vector),
                (ACCELERATION, FieldKind::Vector),
            ],
        )?;
        let mut state = State::new(nodes.len());
        enroll_state_fields(&mut state, nodes, &[POSITION, VELOCITY])?;
        Ok(Self {
            state,
            boundaries: Vec::new(),
            timestep_coefficient,
            ratio2_min: f64::INFINITY,
            last_dt: 0.0,
        })
    }

    /// The integrated state (position, velocity).
    pub fn state(&self) -> &State<D> {
        &self.state
    }

    /// Mutable access to the integrated state.
    pub fn state_mut(&mut self) -> &mut State<D> {
        &mut self.state
    }

    /// Attached boundaries.
    pub fn boundaries_mut(&mut self) -> &mut Vec<Box<dyn Boundary<D>>> {
        &mut self.boundaries
    }

    /// Attach a boundary; applied after any already attached.
    pub fn add_boundary(&mut self, boundary: Box<dyn Boundary<D>>) {
        self.boundaries.push(boundary);
    }

    /// Begin a derivative evaluation: clear the timestep candidate and
    /// record the stage offset as the most recent dt.
    pub fn begin_evaluation(&mut self, dt_offset: f64) {
        self.ratio2_min = f64::INFINITY;
        self.last_dt = dt_offset;
    }

    /// Fold one node's velocity/acceleration pair into the timestep
    /// candidate. Nodes with zero acceleration impose no constraint.
    pub fn note_node(&mut self, velocity: &Vector<D>, acceleration: &Vector<D>) {
        let a2 = acceleration.norm_squared();
        if a2 > 0.0 {
            self.ratio2_min = self.ratio2_min.min(velocity.norm_squared() / a2);
        }
    }

    /// Fold an externally-reduced minimum ratio (from a parallel loop)
    /// into the timestep candidate.
    pub fn note_ratio2(&mut self, ratio2: f64) {
        self.ratio2_min = self.ratio2_min.min(ratio2);
    }

    /// The timestep vote: `coefficient * sqrt(min |v|²/|a|²)`, or
    /// `None` when no node constrained the last evaluation.
    pub fn timestep_estimate(&self) -> Option<f64> {
        if self.ratio2_min.is_finite() {
            Some(self.timestep_coefficient * self.ratio2_min.sqrt())
        } else {
            None
        }
    }

    /// The dt offset passed to the most recent derivative evaluation.
    pub fn last_dt(&self) -> f64 {
        self.last_dt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn enroll_creates_canonical_fields() {
        let mut nodes: NodeList<3> = NodeList::new(3);
        let core = KinematicsCore::enroll(&mut nodes, 1e-4).unwrap();
        for name in [MASS, POSITION, VELOCITY, ACCELERATION] {
            assert!(nodes.has_field(name), "missing {name}");
        }
        assert_eq!(core.state().field_count(), 2);
    }

    #[test]
    fn timestep_estimate_tracks_the_worst_node() {
        let mut nodes: NodeList<3> = NodeList::new(2);
        let mut core = KinematicsCore::enroll(&mut nodes, 0.5).unwrap();
        core.begin_evaluation(0.0);
        core.note_node(
            &Vector::<3>::from([4.0, 0.0, 0.0]),
            &Vector::<3>::from([2.0, 0.0, 0.0]),
        );
        core.note_node(
            &Vector::<3>::from([1.0, 0.0, 0.0]),
            &Vector::<3>::from([10.0, 0.0, 0.0]),
        );
        // min ratio = (1/10)^2, estimate = 0.5 * 0.1
        assert_relative_eq!(core.timestep_estimate().unwrap(), 0.05, max_relative = 1e-12);
    }

    #[test]
    fn unaccelerated_nodes_cast_no_vote() {
        let mut nodes: NodeList<3> = NodeList::new(1);
        let mut core = KinematicsCore::enroll(&mut nodes, 1e-2).unwrap();
        core.begin_evaluation(0.1);
        core.note_node(&Vector::<3>::from([1.0, 0.0, 0.0]), &Vector::<3>::zeros());
        assert!(core.timestep_estimate().is_none());
        assert_relative_eq!(core.last_dt(), 0.1);
    }

    #[test]
    fn votes_reset_between_evaluations() {
        let mut nodes: NodeList<3> = NodeList::new(1);
        let mut core = KinematicsCore::enroll(&mut nodes, 1.0).unwrap();
        core.begin_evaluation(0.0);
        core.note_ratio2(4.0);
        assert_relative_eq!(core.timestep_estimate().unwrap(), 2.0);
        core.begin_evaluation(0.0);
        assert!(core.timestep_estimate().is_none());
    }
}
