//! Rigid sphere collider boundary.

use cadence_core::{NodeList, State, Vector, POSITION, VELOCITY};
use cadence_physics::Boundary;

/// Optional per-node radius field read by the collider. Nodes without
/// it are treated as points.
pub const RADIUS: &str = "radius";

/// A fixed rigid sphere that particles bounce off.
///
/// A node whose surface touches the sphere has its velocity reflected
/// across the contact normal, scaled by the restitution coefficient,
/// and its position moved back onto the contact surface.
pub struct SphereCollider<const D: usize> {
    center: Vector<D>,
    radius: f64,
    restitution: f64,
}

impl<const D: usize> SphereCollider<D> {
    /// A collider with the given restitution (1 = perfectly elastic).
    pub fn new(center: Vector<D>, radius: f64, restitution: f64) -> Self {
        if restitution > 1.0 {
            log::warn!("sphere collider restitution {restitution} > 1 adds energy");
        }
        Self {
            center,
            radius,
            restitution,
        }
    }

    /// A perfectly elastic collider.
    pub fn elastic(center: Vector<D>, radius: f64) -> Self {
        Self::new(center, radius, 1.0)
    }

    fn contact_normal(&self, position: &Vector<D>) -> Vector<D> {
        let disp = position - self.center;
        let dist = disp.norm();
        if dist > 0.0 {
            disp / dist
        } else {
            // Node exactly at the center; push along the first axis.
            let mut axis = Vector::<D>::zeros();
            if D > 0 {
                axis[0] = 1.0;
            }
            axis
        }
    }
}

impl<const D: usize> Boundary<D> for SphereCollider<D> {
    fn apply(&mut self, state: &mut State<D>, nodes: &NodeList<D>) {
        let n = state.len();
        let radii: Vec<f64> = match nodes.scalar(RADIUS) {
            Some(r) => r.to_vec(),
            None => vec![0.0; n],
        };

        let mut hits: Vec<(usize, Vector<D>, Vector<D>)> = Vec::new();
        {
            let (Some(positions), Some(velocities)) =
                (state.vector(POSITION), state.vector(VELOCITY))
            else {
                return;
            };
            for i in 0..n {
                let contact = self.radius + radii[i];
                if (positions[i] - self.center).norm() > contact {
                    continue;
                }
                let normal = self.contact_normal(&positions[i]);
                let v1 = velocities[i];
                let v2 = (v1 - normal * (2.0 * v1.dot(&normal))) * self.restitution;
                let surface = self.center + normal * contact;
                hits.push((i, surface, v2));
            }
        }

        if let Some(positions) = state.vector_mut(POSITION) {
            for &(i, surface, _) in &hits {
                positions[i] = surface;
            }
        }
        if let Some(velocities) = state.vector_mut(VELOCITY) {
            for &(i, _, v2) in &hits {
                velocities[i] = v2;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use cadence_core::FieldKind;

    fn falling_node(height: f64, radius_field: Option<f64>) -> (NodeList<3>, State<3>) {
        let mut nodes: NodeList<3> = NodeList::new(1);
        nodes.enroll(POSITION, FieldKind::Vector).unwrap();
        nodes.enroll(VELOCITY, FieldKind::Vector).unwrap();
        if let Some(r) = radius_field {
            nodes.enroll(RADIUS, FieldKind::Scalar).unwrap();
            nodes.scalar_mut(RADIUS).unwrap()[0] = r;
        }
        nodes.vector_mut(POSITION).unwrap()[0] = Vector::<3>::from([0.0, 0.0, height]);
        nodes.vector_mut(VELOCITY).unwrap()[0] = Vector::<3>::from([0.0, 0.0, -1.0]);
        let mut state: State<3> = State::new(1);
        state.enroll_from(&nodes, POSITION).unwrap();
        state.enroll_from(&nodes, VELOCITY).unwrap();
        (nodes, state)
    }

    #[test]
    fn penetrating_node_reflects_and_surfaces() {
        let (nodes, mut state) = falling_node(0.5, None);
        let mut collider = SphereCollider::elastic(Vector::<3>::zeros(), 1.0);
        collider.apply(&mut state, &nodes);
        let pos = state.vector(POSITION).unwrap()[0];
        let vel = state.vector(VELOCITY).unwrap()[0];
        assert_relative_eq!(pos[2], 1.0, max_relative = 1e-12);
        assert_relative_eq!(vel[2], 1.0, max_relative = 1e-12);
    }

    #[test]
    fn restitution_damps_the_bounce() {
        let (nodes, mut state) = falling_node(0.5, None);
        let mut collider = SphereCollider::new(Vector::<3>::zeros(), 1.0, 0.25);
        collider.apply(&mut state, &nodes);
        let vel = state.vector(VELOCITY).unwrap()[0];
        assert_relative_eq!(vel[2], 0.25, max_relative = 1e-12);
    }

    #[test]
    fn node_radius_widens_the_contact() {
        // Center at z = 1.3 clears a radius-1 sphere as a point but
        // touches it with a node radius of 0.5.
        let (nodes, mut state) = falling_node(1.3, Some(0.5));
        let mut collider = SphereCollider::elastic(Vector::<3>::zeros(), 1.0);
        collider.apply(&mut state, &nodes);
        let pos = state.vector(POSITION).unwrap()[0];
        assert_relative_eq!(pos[2], 1.5, max_relative = 1e-12);
    }

    #[test]
    fn clear_nodes_are_untouched() {
        let (nodes, mut state) = falling_node(5.0, None);
        let mut collider = SphereCollider::elastic(Vector::<3>::zeros(), 1.0);
        collider.apply(&mut state, &nodes);
        assert_eq!(
            state.vector(POSITION).unwrap()[0],
            Vector::<3>::from([0.0, 0.0, 5.0])
        );
        assert_eq!(
            state.vector(VELOCITY).unwrap()[0],
            Vector::<3>::from([0.0, 0.0, -1.0])
        );
    }

    #[test]
    fn oblique_impact_preserves_tangential_velocity() {
        let mut nodes: NodeList<3> = NodeList::new(1);
        nodes.enroll(POSITION, FieldKind::Vector).unwrap();
        nodes.enroll(VELOCITY, FieldKind::Vector).unwrap();
        nodes.vector_mut(POSITION).unwrap()[0] = Vector::<3>::from([0.0, 0.0, 0.9]);
        nodes.vector_mut(VELOCITY).unwrap()[0] = Vector::<3>::from([3.0, 0.0, -2.0]);
        let mut state: State<3> = State::new(1);
        state.enroll_from(&nodes, POSITION).unwrap();
        state.enroll_from(&nodes, VELOCITY).unwrap();
        let mut collider = SphereCollider::elastic(Vector::<3>::zeros(), 1.0);
        collider.apply(&mut state, &nodes);
        let vel = state.vector(VELOCITY).unwrap()[0];
        // Normal is +z at the impact point: x stays, z flips.
        assert_relative_eq!(vel[0], 3.0, max_relative = 1e-12);
        assert_relative_eq!(vel[2], 2.0, max_relative = 1e-12);
    }
}
