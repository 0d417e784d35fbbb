//! Barnes–Hut spatial tree for approximate N-body force evaluation.
//!
//! The tree is an arena of nodes in a contiguous `Vec`, with children
//! referenced by arena index rather than owning pointers. It is built
//! from scratch for each use — positions move every step, and a fresh
//! build is cheaper and simpler than incremental maintenance — and
//! queries take `&self`, so per-body force evaluations can run in
//! parallel over a shared tree.
//!
//! Force approximation: a cell whose angular size `2·half_size / d` is
//! below the opening angle `theta` is treated as a point mass at its
//! center of mass. Distances are Plummer-softened by `eps2` so that
//! close encounters and coincident positions stay finite.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

use cadence_core::Vector;
use smallvec::SmallVec;

/// Insertion gives up subdividing below this depth and accounts the
/// body in mass/center-of-mass only. Coincident positions would
/// otherwise subdivide forever.
const MAX_DEPTH: u32 = 64;

/// Child index table: `1 << D` slots, inline up to an octree.
type Children = SmallVec<[usize; 8]>;

#[derive(Clone, Debug)]
struct Node<const D: usize> {
    center: Vector<D>,
    half_size: f64,
    mass: f64,
    com: Vector<D>,
    /// Body index for a singleton leaf; `None` for internal nodes and
    /// never-occupied cells.
    body: Option<usize>,
    /// Arena indices of the `1 << D` children, empty until subdivided.
    children: Children,
}

impl<const D: usize> Node<D> {
    fn new(center: Vector<D>, half_size: f64) -> Self {
        Self {
            center,
            half_size,
            mass: 0.0,
            com: Vector::<D>::zeros(),
            body: None,
            children: Children::new(),
        }
    }

    fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Which child cell a position falls into: bit `d` set when the
    /// position is on the high side of axis `d`.
    fn child_slot(&self, p: &Vector<D>) -> usize {
        let mut idx = 0;
        for d in 0..D {
            if p[d] >= self.center[d] {
                idx |= 1 << d;
            }
        }
        idx
    }
}

/// A Barnes–Hut tree over a snapshot of positions and masses.
///
/// Built per use via [`SpatialTree::build`]; no instance survives a
/// timestep.
#[derive(Clone, Debug)]
pub struct SpatialTree<const D: usize> {
    nodes: Vec<Node<D>>,
}

impl<const D: usize> SpatialTree<D> {
    /// Build a tree over the given bodies. `positions` and `masses`
    /// must be the same length.
    ///
    /// The bounding region is centred on the mean position with a
    /// half-size of the largest body distance times a 1.1 margin, so
    /// every body is strictly inside the root cell.
    pub fn build(positions: &[Vector<D>], masses: &[f64]) -> Self {
        debug_assert_eq!(positions.len(), masses.len());
        let n = positions.len();
        if n == 0 {
            return Self { nodes: Vec::new() };
        }

        let mut center = Vector::<D>::zeros();
        for p in positions {
            center += p;
        }
        center /= n as f64;

        let mut max_r = 0.0f64;
        for p in positions {
            max_r = max_r.max((p - center).norm());
        }

        let mut tree = Self {
            nodes: vec![Node::new(center, max_r * 1.1)],
        };
        for i in 0..n {
            tree.insert(0, i, 0, positions, masses);
        }
        tree
    }

    /// True when the tree holds no bodies.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Total mass held by the tree.
    pub fn total_mass(&self) -> f64 {
        self.nodes.first().map_or(0.0, |root| root.mass)
    }

    /// Center of mass of all bodies, or `None` for an empty tree.
    pub fn center_of_mass(&self) -> Option<Vector<D>> {
        self.nodes.first().map(|root| root.com)
    }

    fn insert(
        &mut self,
        node: usize,
        body: usize,
        depth: u32,
        positions: &[Vector<D>],
        masses: &[f64],
    ) {
        let pos = positions[body];
        let m = masses[body];

        // Running center-of-mass update at every visited node.
        {
            let nd = &mut self.nodes[node];
            if nd.mass == 0.0 {
                nd.com = pos;
                nd.mass = m;
            } else {
                nd.com = (nd.com * nd.mass + pos * m) / (nd.mass + m);
                nd.mass += m;
            }
        }

        if depth >= MAX_DEPTH {
            // Accounted in mass/com above; softening absorbs the rest.
            return;
        }

        if self.nodes[node].body.is_none() && self.nodes[node].is_leaf() {
            self.nodes[node].body = Some(body);
            return;
        }

        if self.nodes[node].is_leaf() {
            self.subdivide(node);
            if let Some(occupant) = self.nodes[node].body.take() {
                let slot = self.nodes[node].child_slot(&positions[occupant]);
                let child = self.nodes[node].children[slot];
                self.insert(child, occupant, depth + 1, positions, masses);
            }
        }

        let slot = self.nodes[node].child_slot(&pos);
        let child = self.nodes[node].children[slot];
        self.insert(child, body, depth + 1, positions, masses);
    }

    /// Lazy subdivision: allocate the `1 << D` children of a leaf.
    fn subdivide(&mut self, node: usize) {
        let center = self.nodes[node].center;
        let half = self.nodes[node].half_size;
        let mut children = Children::with_capacity(1 << D);
        for slot in 0..(1 << D) {
            let mut child_center = center;
            for d in 0..D {
                let side = if (slot >> d) & 1 == 1 { 0.5 } else { -0.5 };
                child_center[d] += side * half;
            }
            children.push(self.nodes.len());
            self.nodes.push(Node::new(child_center, half * 0.5));
        }
        self.nodes[node].children = children;
    }

    /// Gravitational acceleration on body `body` at `position`.
    ///
    /// `theta` is the opening angle (0 degenerates to exact direct
    /// summation), `g` the gravitational constant, `eps2` the squared
    /// Plummer softening length. A single-body tree yields the zero
    /// vector.
    pub fn accel_on(
        &self,
        body: usize,
        position: &Vector<D>,
        theta: f64,
        g: f64,
        eps2: f64,
    ) -> Vector<D> {
        let mut acc = Vector::<D>::zeros();
        if !self.nodes.is_empty() {
            self.accumulate(0, body, position, theta, g, eps2, &mut acc);
        }
        acc
    }

    #[allow(clippy::too_many_arguments)]
    fn accumulate(
        &self,
        node: usize,
        body: usize,
        position: &Vector<D>,
        theta: f64,
        g: f64,
        eps2: f64,
        acc: &mut Vector<D>,
    ) {
        let nd = &self.nodes[node];
        if nd.mass == 0.0 || (nd.body == Some(body) && nd.is_leaf()) {
            return;
        }

        let disp = nd.com - position;
        let dist2 = disp.norm_squared() + eps2;
        let dist = dist2.sqrt();

        if nd.is_leaf() || 2.0 * nd.half_size / dist < theta {
            *acc += disp * (g * nd.mass / (dist2 * dist));
        } else {
            for &child in &nd.children {
                self.accumulate(child, body, position, theta, g, eps2, acc);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn v3(x: f64, y: f64, z: f64) -> Vector<3> {
        Vector::<3>::from([x, y, z])
    }

    #[test]
    fn empty_tree_yields_zero() {
        let tree: SpatialTree<3> = SpatialTree::build(&[], &[]);
        assert!(tree.is_empty());
        assert_eq!(
            tree.accel_on(0, &v3(1.0, 0.0, 0.0), 0.5, 1.0, 1e-6),
            Vector::<3>::zeros()
        );
    }

    #[test]
    fn single_body_feels_no_force() {
        let positions = [v3(1.0, 2.0, 3.0)];
        let masses = [5.0];
        let tree = SpatialTree::build(&positions, &masses);
        let acc = tree.accel_on(0, &positions[0], 0.5, 1.0, 1e-6);
        assert_eq!(acc, Vector::<3>::zeros());
    }

    #[test]
    fn root_aggregates_mass_and_com() {
        let positions = [v3(-1.0, 0.0, 0.0), v3(1.0, 0.0, 0.0)];
        let masses = [1.0, 3.0];
        let tree = SpatialTree::build(&positions, &masses);
        assert_relative_eq!(tree.total_mass(), 4.0);
        let com = tree.center_of_mass().unwrap();
        assert_relative_eq!(com[0], 0.5);
        assert_relative_eq!(com[1], 0.0);
    }

    #[test]
    fn two_bodies_attract_along_the_separation() {
        let positions = [v3(0.0, 0.0, 0.0), v3(2.0, 0.0, 0.0)];
        let masses = [1.0, 1.0];
        let tree = SpatialTree::build(&positions, &masses);
        let a0 = tree.accel_on(0, &positions[0], 0.5, 1.0, 0.0);
        // G m / r^2 = 1/4 toward +x.
        assert_relative_eq!(a0[0], 0.25, max_relative = 1e-12);
        assert_relative_eq!(a0[1], 0.0);
        let a1 = tree.accel_on(1, &positions[1], 0.5, 1.0, 0.0);
        assert_relative_eq!(a1[0], -0.25, max_relative = 1e-12);
    }

    #[test]
    fn coincident_bodies_do_not_recurse_forever() {
        let p = v3(1.0, 1.0, 1.0);
        let positions = [p, p, p];
        let masses = [1.0, 1.0, 1.0];
        let tree = SpatialTree::build(&positions, &masses);
        assert_relative_eq!(tree.total_mass(), 3.0);
        // Softening keeps the self-cluster force finite.
        let acc = tree.accel_on(0, &p, 0.5, 1.0, 1e-4);
        for d in 0..3 {
            assert!(acc[d].is_finite());
        }
    }

    proptest! {
        #[test]
        fn build_conserves_mass_and_center_of_mass(
            bodies in proptest::collection::vec(
                ([-10.0f64..10.0, -10.0f64..10.0, -10.0f64..10.0], 0.1f64..5.0),
                1..64,
            ),
        ) {
            let positions: Vec<Vector<3>> =
                bodies.iter().map(|&(p, _)| Vector::<3>::from(p)).collect();
            let masses: Vec<f64> = bodies.iter().map(|&(_, m)| m).collect();
            let tree = SpatialTree::build(&positions, &masses);

            // The running per-node updates must agree with the direct
            // mass-weighted mean at the root.
            let total: f64 = masses.iter().sum();
            prop_assert!((tree.total_mass() - total).abs() <= 1e-9 * total);

            let mut com = Vector::<3>::zeros();
            for (p, m) in positions.iter().zip(&masses) {
                com += p * *m;
            }
            com /= total;
            let got = tree.center_of_mass().unwrap();
            prop_assert!((got - com).norm() <= 1e-9 * (1.0 + com.norm()));
        }
    }

    #[test]
    fn works_in_two_dimensions() {
        let positions = [
            Vector::<2>::from([0.0, 0.0]),
            Vector::<2>::from([0.0, 3.0]),
        ];
        let masses = [2.0, 2.0];
        let tree = SpatialTree::build(&positions, &masses);
        let acc = tree.accel_on(0, &positions[0], 0.5, 1.0, 0.0);
        assert_relative_eq!(acc[1], 2.0 / 9.0, max_relative = 1e-12);
    }
}
