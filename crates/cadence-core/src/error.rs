//! Error types for the Cadence multiphysics engine.
//!
//! Organized by phase: [`ConfigurationError`] for construction and
//! enrollment failures (fail fast, before the first cycle),
//! [`PhysicsError`] for per-package runtime failures, and [`StepError`]
//! for fatal conditions surfaced from `Integrator::step()`.

use std::error::Error;
use std::fmt;

use crate::field::FieldKind;

// ── ConfigurationError ─────────────────────────────────────────────

/// Errors detected while wiring up a simulation: field enrollment,
/// state enrollment, and integrator configuration.
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigurationError {
    /// A field was enrolled twice under the same name with different
    /// element kinds.
    FieldKindConflict {
        /// Name of the conflicting field.
        name: String,
        /// Kind already registered under this name.
        existing: FieldKind,
        /// Kind requested by the second enrollment.
        requested: FieldKind,
    },
    /// A copy between fields of unequal length was attempted.
    FieldShapeMismatch {
        /// Name of the field being copied.
        name: String,
        /// Length of the destination.
        expected: usize,
        /// Length of the source.
        actual: usize,
    },
    /// A state enrollment named a field the node database does not carry.
    MissingField {
        /// The absent field name.
        name: String,
    },
    /// An integer field was enrolled into a state vector. Integer fields
    /// are bookkeeping labels; scaled addition on them is meaningless.
    NotIntegrable {
        /// Name of the rejected field.
        name: String,
    },
    /// A node index names a node outside the database.
    NodeIndexOutOfRange {
        /// The offending index.
        index: usize,
        /// Number of nodes in the database.
        len: usize,
    },
    /// The integrator was constructed with no physics packages.
    EmptyPackageList,
    /// The timestep floor is NaN, infinite, zero, or negative.
    InvalidDtFloor {
        /// The invalid value.
        value: f64,
    },
    /// The timestep multiplier is NaN, infinite, zero, or negative.
    InvalidDtMultiplier {
        /// The invalid value.
        value: f64,
    },
    /// The divergence magnitude threshold is NaN or non-positive.
    InvalidDivergenceThreshold {
        /// The invalid value.
        value: f64,
    },
    /// A substep scheme parameter is out of range.
    InvalidScheme {
        /// Description of which parameter was rejected.
        reason: String,
    },
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FieldKindConflict {
                name,
                existing,
                requested,
            } => {
                write!(
                    f,
                    "field '{name}' already enrolled as {existing}, re-enrolled as {requested}"
                )
            }
            Self::FieldShapeMismatch {
                name,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "field '{name}' length mismatch: expected {expected}, got {actual}"
                )
            }
            Self::MissingField { name } => {
                write!(f, "field '{name}' is not enrolled in the node database")
            }
            Self::NotIntegrable { name } => {
                write!(f, "integer field '{name}' cannot be enrolled in a state")
            }
            Self::NodeIndexOutOfRange { index, len } => {
                write!(f, "node index {index} out of range for {len} nodes")
            }
            Self::EmptyPackageList => write!(f, "integrator has no physics packages"),
            Self::InvalidDtFloor { value } => {
                write!(f, "dt_min must be finite and positive, got {value}")
            }
            Self::InvalidDtMultiplier { value } => {
                write!(f, "dt_multiplier must be finite and positive, got {value}")
            }
            Self::InvalidDivergenceThreshold { value } => {
                write!(
                    f,
                    "divergence_threshold must be finite and positive, got {value}"
                )
            }
            Self::InvalidScheme { reason } => write!(f, "invalid scheme: {reason}"),
        }
    }
}

impl Error for ConfigurationError {}

// ── PhysicsError ───────────────────────────────────────────────────

/// Errors from individual physics package execution.
///
/// Returned by package methods and wrapped in
/// [`StepError::PackageFailed`] by the integrator.
#[derive(Clone, Debug, PartialEq)]
pub enum PhysicsError {
    /// A field the package declared at enrollment is missing at runtime.
    MissingField {
        /// The absent field name.
        name: String,
    },
    /// A field exists but carries the wrong element kind.
    KindMismatch {
        /// Name of the offending field.
        name: String,
        /// Kind the package expected.
        expected: FieldKind,
    },
    /// The package's evaluation failed for another reason.
    ExecutionFailed {
        /// Human-readable description of the failure.
        reason: String,
    },
}

impl fmt::Display for PhysicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField { name } => write!(f, "missing field '{name}'"),
            Self::KindMismatch { name, expected } => {
                write!(f, "field '{name}' is not of kind {expected}")
            }
            Self::ExecutionFailed { reason } => write!(f, "execution failed: {reason}"),
        }
    }
}

impl Error for PhysicsError {}

// ── StepError ──────────────────────────────────────────────────────

/// Fatal errors from `Integrator::step()`. Any of these terminates the
/// run; the node database is left as of the last completed package.
#[derive(Clone, Debug, PartialEq)]
pub enum StepError {
    /// A physics package returned an error during the cycle.
    PackageFailed {
        /// Name of the failing package.
        package: String,
        /// The underlying package error.
        reason: PhysicsError,
    },
    /// A derivative evaluation produced a non-finite value or a value
    /// whose magnitude exceeds the configured divergence threshold.
    NumericalDivergence {
        /// Name of the package whose derivatives diverged.
        package: String,
        /// The field containing the offending value.
        field: String,
        /// Index of the first offending node.
        node: usize,
        /// The offending component value.
        value: f64,
    },
}

impl fmt::Display for StepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PackageFailed { package, reason } => {
                write!(f, "package '{package}' failed: {reason}")
            }
            Self::NumericalDivergence {
                package,
                field,
                node,
                value,
            } => {
                write!(
                    f,
                    "package '{package}' diverged: field '{field}' node {node} = {value}"
                )
            }
        }
    }
}

impl Error for StepError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::PackageFailed { reason, .. } => Some(reason),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_error_display() {
        let err = ConfigurationError::FieldKindConflict {
            name: "mass".to_string(),
            existing: FieldKind::Scalar,
            requested: FieldKind::Vector,
        };
        let msg = format!("{err}");
        assert!(msg.contains("mass"));
        assert!(msg.contains("scalar"));
        assert!(msg.contains("vector"));
    }

    #[test]
    fn step_error_sources_package_error() {
        let err = StepError::PackageFailed {
            package: "tree gravity".to_string(),
            reason: PhysicsError::MissingField {
                name: "position".to_string(),
            },
        };
        assert!(err.source().is_some());
        assert!(format!("{err}").contains("tree gravity"));
    }

    #[test]
    fn divergence_error_names_the_site() {
        let err = StepError::NumericalDivergence {
            package: "nbody gravity".to_string(),
            field: "velocity".to_string(),
            node: 17,
            value: f64::INFINITY,
        };
        let msg = format!("{err}");
        assert!(msg.contains("velocity"));
        assert!(msg.contains("17"));
        assert!(err.source().is_none());
    }
}
