//! Substep schemes.
//!
//! Each scheme advances one package's state by one timestep, calling
//! the package's derivative evaluation once per stage with the stage's
//! time offset. Derivatives are divergence-checked after every
//! evaluation; a non-finite or over-threshold value aborts the step.

use cadence_core::{FieldData, NodeList, State, StepError};
use cadence_physics::Physics;

// ── Scheme selection ───────────────────────────────────────────────

/// The substep scheme applied to every package each cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SubstepScheme {
    /// First-order explicit Euler. One derivative evaluation per step.
    ForwardEuler,
    /// Second-order Heun method: an Euler predictor and a trapezoidal
    /// corrector. Two evaluations per step.
    RungeKutta2,
    /// The classical fourth-order Runge-Kutta method. Four evaluations
    /// per step.
    RungeKutta4,
    /// Semi-implicit trapezoidal rule solved by fixed-point iteration
    /// from an Euler predictor.
    CrankNicolson {
        /// Corrector iteration cap. Exhausting it is reported, not
        /// fatal: the last iterate is accepted.
        max_iterations: usize,
        /// Absolute L2 convergence tolerance between iterates.
        tolerance: f64,
    },
}

impl SubstepScheme {
    /// Crank-Nicolson with the standard cap of 10 iterations and a
    /// tolerance of 1e-10.
    pub fn crank_nicolson() -> Self {
        Self::CrankNicolson {
            max_iterations: 10,
            tolerance: 1e-10,
        }
    }

    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ForwardEuler => "forward-euler",
            Self::RungeKutta2 => "runge-kutta-2",
            Self::RungeKutta4 => "runge-kutta-4",
            Self::CrankNicolson { .. } => "crank-nicolson",
        }
    }
}

// ── Solve bookkeeping ──────────────────────────────────────────────

/// Iteration bookkeeping from an implicit solve.
pub(crate) struct SolveStats {
    pub iterations: usize,
    pub converged: bool,
    pub residual: f64,
    /// Factor the integrator folds into its timestep multiplier:
    /// quick convergence earns a larger step, slow convergence a
    /// smaller one.
    pub dt_feedback: f64,
}

// ── Stage evaluation ───────────────────────────────────────────────

/// First element of `deriv` that is non-finite or beyond `threshold`,
/// as (field, node, value).
fn scan_divergence<const D: usize>(
    deriv: &State<D>,
    threshold: f64,
) -> Option<(String, usize, f64)> {
    let bad = |x: f64| !x.is_finite() || x.abs() > threshold;
    for field in deriv.fields() {
        match field.data() {
            FieldData::Scalar(values) => {
                for (node, &x) in values.iter().enumerate() {
                    if bad(x) {
                        return Some((field.name().to_string(), node, x));
                    }
                }
            }
            FieldData::Vector(values) => {
                for (node, v) in values.iter().enumerate() {
                    for &x in v.iter() {
                        if bad(x) {
                            return Some((field.name().to_string(), node, x));
                        }
                    }
                }
            }
            FieldData::Complex(values) => {
                for (node, z) in values.iter().enumerate() {
                    if bad(z.re) {
                        return Some((field.name().to_string(), node, z.re));
                    }
                    if bad(z.im) {
                        return Some((field.name().to_string(), node, z.im));
                    }
                }
            }
            // Int fields never enter a state.
            FieldData::Int(_) => {}
        }
    }
    None
}

/// One divergence-checked derivative evaluation.
fn evaluate<const D: usize>(
    package: &mut dyn Physics<D>,
    input: &State<D>,
    deriv: &mut State<D>,
    nodes: &mut NodeList<D>,
    time: f64,
    dt_offset: f64,
    threshold: f64,
) -> Result<(), StepError> {
    if let Err(reason) = package.evaluate_derivatives(input, deriv, nodes, time, dt_offset) {
        return Err(StepError::PackageFailed {
            package: package.name().to_string(),
            reason,
        });
    }
    if let Some((field, node, value)) = scan_divergence(deriv, threshold) {
        return Err(StepError::NumericalDivergence {
            package: package.name().to_string(),
            field,
            node,
            value,
        });
    }
    Ok(())
}

// ── Integration drivers ────────────────────────────────────────────

impl SubstepScheme {
    /// Advance `package` by `dt`, returning the proposed end-of-step
    /// state. The package's own state is left untouched; acceptance is
    /// the integrator's decision.
    pub(crate) fn integrate<const D: usize>(
        &self,
        package: &mut dyn Physics<D>,
        nodes: &mut NodeList<D>,
        time: f64,
        dt: f64,
        threshold: f64,
    ) -> Result<(State<D>, Option<SolveStats>), StepError> {
        match *self {
            Self::ForwardEuler => euler(package, nodes, time, dt, threshold).map(|s| (s, None)),
            Self::RungeKutta2 => rk2(package, nodes, time, dt, threshold).map(|s| (s, None)),
            Self::RungeKutta4 => rk4(package, nodes, time, dt, threshold).map(|s| (s, None)),
            Self::CrankNicolson {
                max_iterations,
                tolerance,
            } => crank_nicolson(package, nodes, time, dt, threshold, max_iterations, tolerance)
                .map(|(s, stats)| (s, Some(stats))),
        }
    }
}

fn euler<const D: usize>(
    package: &mut dyn Physics<D>,
    nodes: &mut NodeList<D>,
    time: f64,
    dt: f64,
    threshold: f64,
) -> Result<State<D>, StepError> {
    let initial = package.state().clone();
    let mut k1 = initial.ghost();
    evaluate(package, &initial, &mut k1, nodes, time, 0.0, threshold)?;
    let mut proposed = initial;
    proposed.scaled_add(dt, &k1);
    Ok(proposed)
}

fn rk2<const D: usize>(
    package: &mut dyn Physics<D>,
    nodes: &mut NodeList<D>,
    time: f64,
    dt: f64,
    threshold: f64,
) -> Result<State<D>, StepError> {
    let initial = package.state().clone();
    let mut k1 = initial.ghost();
    evaluate(package, &initial, &mut k1, nodes, time, 0.0, threshold)?;

    let mut interim = initial.clone();
    interim.scaled_add(dt, &k1);
    let mut k2 = initial.ghost();
    evaluate(package, &interim, &mut k2, nodes, time, dt, threshold)?;

    let mut proposed = initial;
    proposed.scaled_add(0.5 * dt, &k1);
    proposed.scaled_add(0.5 * dt, &k2);
    Ok(proposed)
}

fn rk4<const D: usize>(
    package: &mut dyn Physics<D>,
    nodes: &mut NodeList<D>,
    time: f64,
    dt: f64,
    threshold: f64,
) -> Result<State<D>, StepError> {
    let initial = package.state().clone();
    let half = 0.5 * dt;

    let mut k1 = initial.ghost();
    evaluate(package, &initial, &mut k1, nodes, time, 0.0, threshold)?;

    let mut interim = initial.clone();
    interim.scaled_add(half, &k1);
    let mut k2 = initial.ghost();
    evaluate(package, &interim, &mut k2, nodes, time, half, threshold)?;

    interim.assign(&initial);
    interim.scaled_add(half, &k2);
    let mut k3 = initial.ghost();
    evaluate(package, &interim, &mut k3, nodes, time, half, threshold)?;

    interim.assign(&initial);
    interim.scaled_add(dt, &k3);
    let mut k4 = initial.ghost();
    evaluate(package, &interim, &mut k4, nodes, time, dt, threshold)?;

    let sixth = dt / 6.0;
    let mut proposed = initial;
    proposed.scaled_add(sixth, &k1);
    proposed.scaled_add(2.0 * sixth, &k2);
    proposed.scaled_add(2.0 * sixth, &k3);
    proposed.scaled_add(sixth, &k4);
    Ok(proposed)
}

#[allow(clippy::too_many_arguments)]
fn crank_nicolson<const D: usize>(
    package: &mut dyn Physics<D>,
    nodes: &mut NodeList<D>,
    time: f64,
    dt: f64,
    threshold: f64,
    max_iterations: usize,
    tolerance: f64,
) -> Result<(State<D>, SolveStats), StepError> {
    let initial = package.state().clone();
    let mut k1 = initial.ghost();
    evaluate(package, &initial, &mut k1, nodes, time, 0.0, threshold)?;

    // Euler predictor seeds the fixed point.
    let mut predicted = initial.clone();
    predicted.scaled_add(dt, &k1);

    let mut k2 = initial.ghost();
    let mut stats = SolveStats {
        iterations: max_iterations,
        converged: false,
        residual: f64::INFINITY,
        dt_feedback: 1.0,
    };
    for iteration in 0..max_iterations {
        evaluate(package, &predicted, &mut k2, nodes, time, dt, threshold)?;
        let mut candidate = initial.clone();
        candidate.scaled_add(0.5 * dt, &k1);
        candidate.scaled_add(0.5 * dt, &k2);
        let residual = candidate.l2_distance(&predicted);
        predicted = candidate;
        stats.residual = residual;
        if residual < tolerance {
            stats.iterations = iteration + 1;
            stats.converged = true;
            break;
        }
    }

    if stats.converged {
        // Convergence speed steers the global timestep multiplier.
        let cap = max_iterations as f64;
        stats.dt_feedback = if (stats.iterations as f64) < 0.5 * cap {
            1.2
        } else if (stats.iterations as f64) > 0.8 * cap {
            0.8
        } else {
            1.0
        };
    }
    // Cap exhaustion is non-fatal: the last iterate stands and the
    // report carries the residual.
    Ok((predicted, stats))
}
