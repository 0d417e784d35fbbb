//! Integrator configuration and validation.

use cadence_core::ConfigurationError;

use crate::scheme::SubstepScheme;

/// Configuration for an [`Integrator`](crate::Integrator).
///
/// Validated once at construction; a validated configuration cannot
/// produce a configuration error later in the run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntegratorConfig {
    /// Substep scheme applied to every package.
    pub scheme: SubstepScheme,
    /// Floor below which the voted timestep is never allowed to fall.
    /// Also the timestep of the very first cycle.
    pub dt_min: f64,
    /// Multiplier applied to the voted timestep each cycle. Starts at
    /// the configured value and is adjusted over the run by implicit
    /// schemes reacting to their convergence behaviour.
    pub dt_multiplier: f64,
    /// Any derivative whose magnitude exceeds this is treated as a
    /// numerical divergence and aborts the step.
    pub divergence_threshold: f64,
}

impl Default for IntegratorConfig {
    fn default() -> Self {
        Self {
            scheme: SubstepScheme::RungeKutta4,
            dt_min: 1e-6,
            dt_multiplier: 1.0,
            divergence_threshold: 1e30,
        }
    }
}

impl IntegratorConfig {
    /// Check every parameter, returning the first violation found.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if !self.dt_min.is_finite() || self.dt_min <= 0.0 {
            return Err(ConfigurationError::InvalidDtFloor { value: self.dt_min });
        }
        if !self.dt_multiplier.is_finite() || self.dt_multiplier <= 0.0 {
            return Err(ConfigurationError::InvalidDtMultiplier {
                value: self.dt_multiplier,
            });
        }
        if !self.divergence_threshold.is_finite() || self.divergence_threshold <= 0.0 {
            return Err(ConfigurationError::InvalidDivergenceThreshold {
                value: self.divergence_threshold,
            });
        }
        if let SubstepScheme::CrankNicolson {
            max_iterations,
            tolerance,
        } = self.scheme
        {
            if max_iterations == 0 {
                return Err(ConfigurationError::InvalidScheme {
                    reason: "Crank-Nicolson iteration cap must be at least 1".to_string(),
                });
            }
            if !tolerance.is_finite() || tolerance <= 0.0 {
                return Err(ConfigurationError::InvalidScheme {
                    reason: format!("Crank-Nicolson tolerance {tolerance} must be a positive finite number"),
                });
            }
        }
        Ok(())
    }
}
