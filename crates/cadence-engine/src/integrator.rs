//! The integrator: drives packages through cycles and votes the
//! timestep.

use cadence_core::{ConfigurationError, NodeList, StepError};
use cadence_physics::Physics;

use crate::config::IntegratorConfig;
use crate::diagnostics::{ConvergenceReport, StepDiagnostics};
use crate::scheme::SubstepScheme;

/// Fraction of the gap to the voted timestep closed per cycle when the
/// vote would grow the step. Shrinks are taken immediately.
const EASE_UP_FRACTION: f64 = 0.2;

/// Drives a set of physics packages through integration cycles.
///
/// Each cycle runs every package through the configured substep scheme
/// in registration order, then polls the packages for timestep votes
/// and sets the next cycle's dt. The first cycle runs at the configured
/// floor.
pub struct Integrator<const D: usize> {
    packages: Vec<Box<dyn Physics<D>>>,
    scheme: SubstepScheme,
    dt_min: f64,
    dt_multiplier: f64,
    divergence_threshold: f64,
    time: f64,
    dt: f64,
    cycle: u64,
}

impl<const D: usize> Integrator<D> {
    /// Validate the configuration and build the integrator.
    pub fn new(
        config: IntegratorConfig,
        packages: Vec<Box<dyn Physics<D>>>,
    ) -> Result<Self, ConfigurationError> {
        config.validate()?;
        if packages.is_empty() {
            return Err(ConfigurationError::EmptyPackageList);
        }
        Ok(Self {
            packages,
            scheme: config.scheme,
            dt_min: config.dt_min,
            dt_multiplier: config.dt_multiplier,
            divergence_threshold: config.divergence_threshold,
            time: 0.0,
            dt: config.dt_min,
            cycle: 0,
        })
    }

    /// Current simulation time.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Completed cycle count.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// The timestep the next cycle will use.
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// The current timestep multiplier, as adjusted by implicit-solve
    /// feedback over the run.
    pub fn dt_multiplier(&self) -> f64 {
        self.dt_multiplier
    }

    /// Registered packages in execution order.
    pub fn packages(&self) -> &[Box<dyn Physics<D>>] {
        &self.packages
    }

    /// Run one integration cycle.
    ///
    /// On error the run should be abandoned: the database reflects the
    /// packages finalized before the failure.
    pub fn step(&mut self, nodes: &mut NodeList<D>) -> Result<StepDiagnostics, StepError> {
        if self.cycle == 0 {
            for package in &mut self.packages {
                package
                    .zero_time_initialize(nodes)
                    .map_err(|reason| StepError::PackageFailed {
                        package: package.name().to_string(),
                        reason,
                    })?;
            }
        }

        let scheme = self.scheme;
        let dt = self.dt;
        let threshold = self.divergence_threshold;
        let mut convergence = Vec::new();

        for package in &mut self.packages {
            package
                .pre_step_initialize(nodes, dt)
                .map_err(|reason| StepError::PackageFailed {
                    package: package.name().to_string(),
                    reason,
                })?;

            let (mut proposed, stats) =
                scheme.integrate(package.as_mut(), nodes, self.time, dt, threshold)?;
            package.apply_boundaries(&mut proposed, nodes);
            package
                .finalize_step(&proposed, nodes)
                .map_err(|reason| StepError::PackageFailed {
                    package: package.name().to_string(),
                    reason,
                })?;

            if let Some(stats) = stats {
                if !stats.converged {
                    log::warn!(
                        "package '{}' corrector exhausted {} iterations (residual {:.3e}); accepting last iterate",
                        package.name(),
                        stats.iterations,
                        stats.residual,
                    );
                }
                self.dt_multiplier *= stats.dt_feedback;
                convergence.push(ConvergenceReport {
                    package: package.name().to_string(),
                    iterations: stats.iterations,
                    converged: stats.converged,
                    residual: stats.residual,
                });
            }
        }

        self.time += dt;
        self.cycle += 1;
        let (constraining_package, dt_clamped) = self.vote_dt();

        Ok(StepDiagnostics {
            cycle: self.cycle,
            time: self.time,
            dt,
            next_dt: self.dt,
            constraining_package,
            dt_clamped,
            convergence,
        })
    }

    /// Poll every package for a timestep vote and set the next dt.
    ///
    /// The smallest vote wins. A shrinking dt snaps down immediately;
    /// a growing dt eases up by a fixed fraction of the gap per cycle.
    /// Packages casting no vote leave dt unchanged. The result is
    /// floored at `dt_min` and scaled by the multiplier.
    fn vote_dt(&mut self) -> (Option<String>, bool) {
        let mut smallest = f64::INFINITY;
        let mut constraining = None;
        for package in &self.packages {
            if let Some(estimate) = package.estimate_timestep() {
                log::debug!("package '{}' votes dt = {estimate:.6e}", package.name());
                if estimate < smallest {
                    smallest = estimate;
                    constraining = Some(package.name().to_string());
                }
            }
        }

        if smallest.is_finite() {
            self.dt = if self.dt < smallest {
                self.dt + EASE_UP_FRACTION * (smallest - self.dt)
            } else {
                smallest
            };
        }

        let clamped = self.dt < self.dt_min;
        if clamped {
            log::warn!(
                "voted dt {:.6e} fell below the floor {:.6e}; clamping",
                self.dt,
                self.dt_min,
            );
        }
        self.dt = self.dt.max(self.dt_min) * self.dt_multiplier;
        (constraining, clamped)
    }
}
