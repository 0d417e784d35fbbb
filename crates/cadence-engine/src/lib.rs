//! Integration driver for the Cadence multiphysics engine.
//!
//! The [`Integrator`] owns a set of physics packages and drives them
//! through cycles: per-cycle setup, one of four substep schemes,
//! boundary application, finalize, and an asymmetric timestep vote.
//! Each completed cycle returns a [`StepDiagnostics`] record.
//!
//! ```
//! use cadence_core::{NodeList, Vector};
//! use cadence_engine::{Integrator, IntegratorConfig, SubstepScheme};
//! use cadence_packages::ConstantGravity;
//!
//! let mut nodes: NodeList<3> = NodeList::new(1);
//! let gravity = ConstantGravity::new(&mut nodes, Vector::<3>::from([0.0, 0.0, -9.81]))?;
//! let config = IntegratorConfig {
//!     scheme: SubstepScheme::RungeKutta4,
//!     dt_min: 1e-3,
//!     ..IntegratorConfig::default()
//! };
//! let mut integrator = Integrator::new(config, vec![Box::new(gravity)])?;
//! let diagnostics = integrator.step(&mut nodes)?;
//! assert_eq!(diagnostics.cycle, 1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

mod config;
mod diagnostics;
mod integrator;
mod scheme;

pub use config::IntegratorConfig;
pub use diagnostics::{ConvergenceReport, StepDiagnostics};
pub use integrator::Integrator;
pub use scheme::SubstepScheme;
