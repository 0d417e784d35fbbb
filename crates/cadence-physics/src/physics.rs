//! The physics package contract.
//!
//! A package owns a private [`State`] of the fields it integrates and
//! implements [`Physics::evaluate_derivatives`], the re-entrant heart
//! of the protocol: the integrator calls it once per substep stage with
//! a stage-input state and a derivative state to fill. Everything else
//! (zero-time setup, per-cycle setup, finalize, boundaries) has default
//! implementations that concrete packages override only when they need
//! to.
//!
//! The node database is owned by the driver and lent into every call;
//! packages hold no references into it between calls.

use cadence_core::{
    ConfigurationError, FieldKind, NodeList, PhysicsError, State,
};

use crate::boundary::Boundary;

/// Demote an enrollment-style error discovered at runtime (a field
/// that went missing or changed kind after construction) to a package
/// error.
pub fn runtime_error(err: ConfigurationError) -> PhysicsError {
    match err {
        ConfigurationError::MissingField { name } => PhysicsError::MissingField { name },
        ConfigurationError::FieldKindConflict { name, existing, .. } => {
            PhysicsError::KindMismatch {
                name,
                expected: existing,
            }
        }
        other => PhysicsError::ExecutionFailed {
            reason: other.to_string(),
        },
    }
}

/// Create any of the named fields that do not exist yet, zero-filled.
/// Existing fields are left untouched; a kind conflict fails.
pub fn enroll_fields<const D: usize>(
    nodes: &mut NodeList<D>,
    fields: &[(&str, FieldKind)],
) -> Result<(), ConfigurationError> {
    for (name, kind) in fields {
        nodes.enroll(name, *kind)?;
    }
    Ok(())
}

/// Enroll the named node-database fields into a package's private
/// state, copying their current values.
pub fn enroll_state_fields<const D: usize>(
    state: &mut State<D>,
    nodes: &NodeList<D>,
    names: &[&str],
) -> Result<(), ConfigurationError> {
    for name in names {
        state.enroll_from(nodes, name)?;
    }
    Ok(())
}

/// The per-cycle protocol a physics package implements.
///
/// The integrator drives each package through, in order:
/// `zero_time_initialize` (cycle 0 only), `pre_step_initialize`, one or
/// more `evaluate_derivatives` calls depending on the substep scheme,
/// `apply_boundaries` on the proposed state, and `finalize_step`.
/// `estimate_timestep` is polled after the cycle for the next dt vote.
pub trait Physics<const D: usize> {
    /// Short name used in diagnostics and error reports.
    fn name(&self) -> &str;

    /// The package's private integrated state.
    fn state(&self) -> &State<D>;

    /// Mutable access to the private integrated state.
    fn state_mut(&mut self) -> &mut State<D>;

    /// The package's attached boundaries, in attachment order.
    fn boundaries_mut(&mut self) -> &mut Vec<Box<dyn Boundary<D>>>;

    /// Re-copy the private state's fields from the node database.
    fn refresh_state(&mut self, nodes: &NodeList<D>) -> Result<(), PhysicsError> {
        self.state_mut().refresh_from(nodes).map_err(runtime_error)
    }

    /// Called once, before the first cycle. The default refreshes the
    /// state and initializes attached boundaries; overriders that
    /// precompute fields should call [`Physics::initialize_boundaries`]
    /// themselves.
    fn zero_time_initialize(&mut self, nodes: &mut NodeList<D>) -> Result<(), PhysicsError> {
        self.refresh_state(nodes)?;
        self.initialize_boundaries(nodes);
        Ok(())
    }

    /// Give every attached boundary its zero-time look at the database.
    fn initialize_boundaries(&mut self, nodes: &NodeList<D>) {
        for boundary in self.boundaries_mut().iter_mut() {
            boundary.zero_time_initialize(nodes);
        }
    }

    /// Called once per cycle before integration, with the dt the cycle
    /// will use. The default refreshes the private state from the
    /// database; history-dependent packages (moving sources) advance
    /// their own bookkeeping here.
    fn pre_step_initialize(&mut self, nodes: &mut NodeList<D>, dt: f64) -> Result<(), PhysicsError> {
        let _ = dt;
        self.refresh_state(nodes)
    }

    /// Fill `deriv` with the time-derivative of each integrated field,
    /// given stage-input values `input` valid at `time + dt_offset`.
    ///
    /// Re-entrant within a cycle: Runge–Kutta schemes call this once
    /// per stage with different inputs and offsets. Side effects must
    /// be limited to the package's own scratch fields in the database
    /// (e.g. `acceleration`) and internal caches.
    fn evaluate_derivatives(
        &mut self,
        input: &State<D>,
        deriv: &mut State<D>,
        nodes: &mut NodeList<D>,
        time: f64,
        dt_offset: f64,
    ) -> Result<(), PhysicsError>;

    /// The package's preferred next timestep, or `None` to cast no
    /// vote. Polled after the cycle, so estimates may use quantities
    /// cached by the last derivative evaluation.
    fn estimate_timestep(&self) -> Option<f64> {
        None
    }

    /// Apply attached boundaries to the proposed state, in attachment
    /// order.
    fn apply_boundaries(&mut self, state: &mut State<D>, nodes: &NodeList<D>) {
        for boundary in self.boundaries_mut().iter_mut() {
            boundary.apply(state, nodes);
        }
    }

    /// Accept the proposed state: write it back to the node database,
    /// refresh the private state, then run [`Physics::final_checks`].
    fn finalize_step(
        &mut self,
        accepted: &State<D>,
        nodes: &mut NodeList<D>,
    ) -> Result<(), PhysicsError> {
        accepted.write_back(nodes).map_err(runtime_error)?;
        self.refresh_state(nodes)?;
        self.final_checks(nodes)
    }

    /// Post-finalize invariant maintenance (wrapping angles, derived
    /// display fields). The default does nothing.
    fn final_checks(&mut self, nodes: &mut NodeList<D>) -> Result<(), PhysicsError> {
        let _ = nodes;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::{Vector, POSITION, VELOCITY};

    struct Drift {
        state: State<3>,
        boundaries: Vec<Box<dyn Boundary<3>>>,
    }

    impl Drift {
        fn new(nodes: &mut NodeList<3>) -> Self {
            enroll_fields(
                nodes,
                &[(POSITION, FieldKind::Vector), (VELOCITY, FieldKind::Vector)],
            )
            .unwrap();
            let mut state = State::new(nodes.len());
            enroll_state_fields(&mut state, nodes, &[POSITION]).unwrap();
            Self {
                state,
                boundaries: Vec::new(),
            }
        }
    }

    impl Physics<3> for Drift {
        fn name(&self) -> &str {
            "drift"
        }
        fn state(&self) -> &State<3> {
            &self.state
        }
        fn state_mut(&mut self) -> &mut State<3> {
            &mut self.state
        }
        fn boundaries_mut(&mut self) -> &mut Vec<Box<dyn Boundary<3>>> {
            &mut self.boundaries
        }
        fn evaluate_derivatives(
            &mut self,
            _input: &State<3>,
            deriv: &mut State<3>,
            nodes: &mut NodeList<3>,
            _time: f64,
            _dt_offset: f64,
        ) -> Result<(), PhysicsError> {
            let velocities = nodes.velocities().ok_or_else(|| PhysicsError::MissingField {
                name: VELOCITY.to_string(),
            })?;
            let dxdt = deriv
                .vector_mut(POSITION)
                .ok_or_else(|| PhysicsError::MissingField {
                    name: POSITION.to_string(),
                })?;
            dxdt.copy_from_slice(&velocities);
            Ok(())
        }
    }

    struct Freeze;
    impl Boundary<3> for Freeze {
        fn apply(&mut self, state: &mut State<3>, _nodes: &NodeList<3>) {
            if let Some(xs) = state.vector_mut(POSITION) {
                for x in xs.iter_mut() {
                    *x = Vector::<3>::zeros();
                }
            }
        }
    }

    #[test]
    fn finalize_writes_back_and_refreshes() {
        let mut nodes: NodeList<3> = NodeList::new(2);
        let mut pkg = Drift::new(&mut nodes);
        let mut proposed = pkg.state().clone();
        proposed.vector_mut(POSITION).unwrap()[1] = Vector::<3>::from([1.0, 2.0, 3.0]);
        pkg.finalize_step(&proposed, &mut nodes).unwrap();
        assert_eq!(
            nodes.positions().unwrap()[1],
            Vector::<3>::from([1.0, 2.0, 3.0])
        );
        assert_eq!(
            pkg.state().vector(POSITION).unwrap()[1],
            Vector::<3>::from([1.0, 2.0, 3.0])
        );
    }

    #[test]
    fn boundaries_apply_in_attachment_order() {
        let mut nodes: NodeList<3> = NodeList::new(1);
        let mut pkg = Drift::new(&mut nodes);
        pkg.boundaries_mut().push(Box::new(Freeze));
        let mut proposed = pkg.state().clone();
        proposed.vector_mut(POSITION).unwrap()[0] = Vector::<3>::from([5.0, 5.0, 5.0]);
        pkg.apply_boundaries(&mut proposed, &nodes);
        assert_eq!(proposed.vector(POSITION).unwrap()[0], Vector::<3>::zeros());
    }

    #[test]
    fn evaluate_derivatives_reports_missing_fields() {
        let mut nodes: NodeList<3> = NodeList::new(1);
        let mut pkg = Drift::new(&mut nodes);
        let input = pkg.state().clone();
        let mut deriv = pkg.state().ghost();
        // Sabotage: a fresh database without the velocity field.
        let mut bare: NodeList<3> = NodeList::new(1);
        bare.enroll(POSITION, FieldKind::Vector).unwrap();
        match pkg.evaluate_derivatives(&input, &mut deriv, &mut bare, 0.0, 0.0) {
            Err(PhysicsError::MissingField { .. }) => {}
            other => panic!("expected MissingField, got {other:?}"),
        }
    }
}
