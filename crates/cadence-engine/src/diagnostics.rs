//! Per-step diagnostics reported by the integrator.

/// Outcome of one implicit solve for one package.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvergenceReport {
    /// Package the solve ran for.
    pub package: String,
    /// Corrector iterations consumed.
    pub iterations: usize,
    /// Whether the corrector met its tolerance within the iteration cap.
    pub converged: bool,
    /// L2 distance between the last two iterates.
    pub residual: f64,
}

/// Summary of a completed integration step.
///
/// Returned by [`Integrator::step`](crate::Integrator::step) so callers
/// can log or record progress without reaching into the integrator.
#[derive(Debug, Clone, PartialEq)]
pub struct StepDiagnostics {
    /// Cycle count after this step.
    pub cycle: u64,
    /// Simulation time after this step.
    pub time: f64,
    /// Timestep this step was taken with.
    pub dt: f64,
    /// Timestep voted for the next step.
    pub next_dt: f64,
    /// Package whose vote constrained the next timestep, if any voted.
    pub constraining_package: Option<String>,
    /// True when the vote fell below the floor and was clamped up.
    pub dt_clamped: bool,
    /// Implicit-solve outcomes, one per package when the scheme is
    /// iterative. Empty for explicit schemes.
    pub convergence: Vec<ConvergenceReport>,
}

impl StepDiagnostics {
    /// True when every implicit solve this step met its tolerance.
    pub fn all_converged(&self) -> bool {
        self.convergence.iter().all(|c| c.converged)
    }
}
