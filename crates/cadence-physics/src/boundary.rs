//! Boundary contract.
//!
//! Boundaries constrain the state a package proposes, after the substep
//! scheme has produced it and before it is written back to the node
//! database. They mutate field values only; they never add or remove
//! fields.

use cadence_core::{NodeList, State};

/// A constraint applied to a package's proposed state.
///
/// Boundaries are attached to a package and applied in attachment
/// order each cycle.
pub trait Boundary<const D: usize> {
    /// Called once before the first cycle. May capture reference
    /// snapshots from the node database (e.g. pinned positions).
    fn zero_time_initialize(&mut self, nodes: &NodeList<D>) {
        let _ = nodes;
    }

    /// Constrain the proposed state in place. Auxiliary per-node data
    /// (masses, radii) may be read from the node database.
    fn apply(&mut self, state: &mut State<D>, nodes: &NodeList<D>);
}
