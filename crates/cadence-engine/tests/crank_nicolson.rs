//! Fixed-point behaviour of the Crank-Nicolson scheme on exponential
//! decay, where the discrete solution has a closed form.

use approx::assert_relative_eq;
use cadence_core::{FieldKind, NodeList, PhysicsError, State};
use cadence_engine::{Integrator, IntegratorConfig, SubstepScheme};
use cadence_physics::{Boundary, Physics};

const FIELD: &str = "y";

struct Decay {
    state: State<3>,
    boundaries: Vec<Box<dyn Boundary<3>>>,
    rate: f64,
}

impl Decay {
    fn new(nodes: &mut NodeList<3>, rate: f64) -> Self {
        nodes.enroll(FIELD, FieldKind::Scalar).unwrap();
        nodes.scalar_mut(FIELD).unwrap()[0] = 1.0;
        let mut state = State::new(nodes.len());
        state.enroll_from(nodes, FIELD).unwrap();
        Self {
            state,
            boundaries: Vec::new(),
            rate,
        }
    }
}

impl Physics<3> for Decay {
    fn name(&self) -> &str {
        "decay"
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
        input: &State<3>,
        deriv: &mut State<3>,
        _nodes: &mut NodeList<3>,
        _time: f64,
        _dt_offset: f64,
    ) -> Result<(), PhysicsError> {
        let y = input.scalar(FIELD).ok_or(PhysicsError::MissingField {
            name: FIELD.to_string(),
        })?;
        let dy = deriv.scalar_mut(FIELD).ok_or(PhysicsError::MissingField {
            name: FIELD.to_string(),
        })?;
        dy[0] = self.rate * y[0];
        Ok(())
    }
}

fn decay_integrator(rate: f64, dt: f64) -> (NodeList<3>, Integrator<3>) {
    let mut nodes: NodeList<3> = NodeList::new(1);
    let decay = Decay::new(&mut nodes, rate);
    let config = IntegratorConfig {
        scheme: SubstepScheme::crank_nicolson(),
        dt_min: dt,
        ..IntegratorConfig::default()
    };
    let integrator = Integrator::new(config, vec![Box::new(decay)]).unwrap();
    (nodes, integrator)
}

#[test]
fn one_step_matches_the_trapezoidal_closed_form() {
    let (rate, dt) = (-5.0, 0.01);
    let (mut nodes, mut integrator) = decay_integrator(rate, dt);
    let diag = integrator.step(&mut nodes).unwrap();

    assert_eq!(diag.convergence.len(), 1);
    assert!(diag.all_converged());
    assert!(diag.convergence[0].iterations >= 1);

    // y1 = (1 + r dt / 2) / (1 - r dt / 2)
    let expected = (1.0 + 0.5 * rate * dt) / (1.0 - 0.5 * rate * dt);
    assert_relative_eq!(nodes.scalar(FIELD).unwrap()[0], expected, max_relative = 1e-8);
}

#[test]
fn long_run_tracks_the_exponential() {
    let (rate, dt) = (-5.0, 0.01);
    let (mut nodes, mut integrator) = decay_integrator(rate, dt);
    for _ in 0..100 {
        let diag = integrator.step(&mut nodes).unwrap();
        assert!(diag.all_converged());
    }
    let exact = (rate * integrator.time()).exp();
    assert_relative_eq!(nodes.scalar(FIELD).unwrap()[0], exact, max_relative = 5e-3);
}

#[test]
fn exhausted_corrector_is_reported_not_fatal() {
    // |rate| dt / 2 = 1.25 > 1: the fixed-point map diverges and the
    // iteration cap is spent without converging.
    let (mut nodes, mut integrator) = decay_integrator(-50.0, 0.05);
    let diag = integrator.step(&mut nodes).unwrap();
    let report = &diag.convergence[0];
    assert!(!report.converged);
    assert_eq!(report.iterations, 10);
    assert!(report.residual > 0.0);
    assert!(!diag.all_converged());
    // Failed solves leave the timestep multiplier alone.
    assert_relative_eq!(integrator.dt_multiplier(), 1.0);
}

#[test]
fn quick_convergence_grows_the_timestep_multiplier() {
    let dt = 0.001;
    let (mut nodes, mut integrator) = decay_integrator(-5.0, dt);
    let diag = integrator.step(&mut nodes).unwrap();
    // |rate| dt / 2 = 0.0025 contracts hard: a handful of iterations.
    assert!(diag.convergence[0].converged);
    assert!(diag.convergence[0].iterations < 5);
    assert_relative_eq!(integrator.dt_multiplier(), 1.2, max_relative = 1e-12);
    // No package votes, so the next dt is the floor times the grown
    // multiplier.
    assert_relative_eq!(diag.next_dt, dt * 1.2, max_relative = 1e-12);
}
