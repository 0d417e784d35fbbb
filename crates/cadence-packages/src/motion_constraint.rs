//! Pinning constraint for selected nodes.

use cadence_core::{ConfigurationError, NodeList, State, Vector, POSITION, VELOCITY};
use cadence_physics::Boundary;

/// Pins selected nodes along fixed axes.
///
/// `direction` is an axis mask: for every component where it is
/// nonzero, the constrained nodes' positions are held at the values
/// captured at zero time and their velocities zeroed along that axis.
/// Components where the mask is zero are left free.
#[derive(Debug)]
pub struct MotionConstraint<const D: usize> {
    indices: Vec<usize>,
    direction: Vector<D>,
    /// Zero-time positions of the constrained nodes, parallel to
    /// `indices`. Empty until `zero_time_initialize`.
    pinned: Vec<Vector<D>>,
}

impl<const D: usize> MotionConstraint<D> {
    /// Constrain `indices` along the nonzero axes of `direction`.
    /// Indices are validated against the database up front.
    pub fn new(
        nodes: &NodeList<D>,
        indices: Vec<usize>,
        direction: Vector<D>,
    ) -> Result<Self, ConfigurationError> {
        for &index in &indices {
            if index >= nodes.len() {
                return Err(ConfigurationError::NodeIndexOutOfRange {
                    index,
                    len: nodes.len(),
                });
            }
        }
        Ok(Self {
            indices,
            direction,
            pinned: Vec::new(),
        })
    }
}

impl<const D: usize> Boundary<D> for MotionConstraint<D> {
    fn zero_time_initialize(&mut self, nodes: &NodeList<D>) {
        if let Some(positions) = nodes.positions() {
            self.pinned = self.indices.iter().map(|&i| positions[i]).collect();
        }
    }

    fn apply(&mut self, state: &mut State<D>, _nodes: &NodeList<D>) {
        if self.pinned.len() != self.indices.len() {
            return;
        }
        if let Some(positions) = state.vector_mut(POSITION) {
            for (slot, &index) in self.indices.iter().enumerate() {
                for d in 0..D {
                    if self.direction[d] != 0.0 {
                        positions[index][d] = self.pinned[slot][d];
                    }
                }
            }
        }
        if let Some(velocities) = state.vector_mut(VELOCITY) {
            for &index in &self.indices {
                for d in 0..D {
                    if self.direction[d] != 0.0 {
                        velocities[index][d] = 0.0;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::FieldKind;

    fn three_nodes() -> (NodeList<3>, State<3>) {
        let mut nodes: NodeList<3> = NodeList::new(3);
        nodes.enroll(POSITION, FieldKind::Vector).unwrap();
        nodes.enroll(VELOCITY, FieldKind::Vector).unwrap();
        for (i, x) in nodes.vector_mut(POSITION).unwrap().iter_mut().enumerate() {
            *x = Vector::<3>::from([i as f64, 10.0 * i as f64, 0.0]);
        }
        let mut state: State<3> = State::new(3);
        state.enroll_from(&nodes, POSITION).unwrap();
        state.enroll_from(&nodes, VELOCITY).unwrap();
        (nodes, state)
    }

    #[test]
    fn out_of_range_indices_are_rejected() {
        let (nodes, _) = three_nodes();
        match MotionConstraint::new(&nodes, vec![0, 7], Vector::<3>::from([1.0, 0.0, 0.0])) {
            Err(ConfigurationError::NodeIndexOutOfRange { index: 7, len: 3 }) => {}
            other => panic!("expected NodeIndexOutOfRange, got {other:?}"),
        }
    }

    #[test]
    fn pins_masked_axes_and_frees_the_rest() {
        let (nodes, mut state) = three_nodes();
        let mut constraint =
            MotionConstraint::new(&nodes, vec![1], Vector::<3>::from([1.0, 0.0, 0.0])).unwrap();
        constraint.zero_time_initialize(&nodes);

        // The integrator proposes a drifted state.
        state.vector_mut(POSITION).unwrap()[1] = Vector::<3>::from([99.0, 99.0, 99.0]);
        state.vector_mut(VELOCITY).unwrap()[1] = Vector::<3>::from([5.0, 5.0, 5.0]);
        constraint.apply(&mut state, &nodes);

        let pos = state.vector(POSITION).unwrap()[1];
        let vel = state.vector(VELOCITY).unwrap()[1];
        // x pinned back to its zero-time value, y and z free.
        assert_eq!(pos, Vector::<3>::from([1.0, 99.0, 99.0]));
        assert_eq!(vel, Vector::<3>::from([0.0, 5.0, 5.0]));
    }

    #[test]
    fn unconstrained_nodes_are_untouched() {
        let (nodes, mut state) = three_nodes();
        let mut constraint =
            MotionConstraint::new(&nodes, vec![0], Vector::<3>::from([1.0, 1.0, 1.0])).unwrap();
        constraint.zero_time_initialize(&nodes);
        state.vector_mut(POSITION).unwrap()[2] = Vector::<3>::from([7.0, 7.0, 7.0]);
        constraint.apply(&mut state, &nodes);
        assert_eq!(
            state.vector(POSITION).unwrap()[2],
            Vector::<3>::from([7.0, 7.0, 7.0])
        );
    }

    #[test]
    fn apply_before_initialization_is_a_no_op() {
        let (nodes, mut state) = three_nodes();
        let mut constraint =
            MotionConstraint::new(&nodes, vec![0], Vector::<3>::from([1.0, 0.0, 0.0])).unwrap();
        state.vector_mut(POSITION).unwrap()[0] = Vector::<3>::from([3.0, 3.0, 3.0]);
        constraint.apply(&mut state, &nodes);
        assert_eq!(
            state.vector(POSITION).unwrap()[0],
            Vector::<3>::from([3.0, 3.0, 3.0])
        );
    }
}
