//! Kuramoto phase coupling.
//!
//! Kuramoto, Yoshiki (1975). In H. Araki (ed.), Lecture Notes in
//! Physics vol. 39, Springer-Verlag, p. 420. Each oscillator's phase
//! advances at its natural frequency plus an all-to-all 1/distance
//! coupling to every other oscillator.

use std::f64::consts::TAU;

use cadence_core::{
    ConfigurationError, FieldKind, NodeList, PhysicsError, State, POSITION,
};
use cadence_physics::{enroll_fields, enroll_state_fields, Boundary, Physics};
use rayon::prelude::*;

use crate::missing;

/// Oscillator phase field, radians in [0, 2π).
pub const PHASE: &str = "kphase";
/// Derived luminance field written by the final checks.
pub const STRENGTH: &str = "kstrength";
/// Natural frequency field, radians per unit time.
pub const OMEGA: &str = "komega";

/// Pairs closer than this couple as if at this separation.
const MIN_SEPARATION: f64 = 0.005;

/// Fraction of a full cycle any oscillator may advance in one step.
const PHASE_ADVANCE_FRACTION: f64 = 0.1;

/// Kuramoto oscillators carried on the simulation nodes.
///
/// Integrates `kphase` only; positions are read from the node database
/// and left to a kinematics package to evolve. The final checks wrap
/// phases back into [0, 2π) and derive `kstrength`: raw `sin(phase)`
/// when `light_fraction` is zero, otherwise a 0/1 lamp value lit while
/// `|sin(phase)|` exceeds `1 - light_fraction`.
pub struct PhaseCoupling<const D: usize> {
    state: State<D>,
    boundaries: Vec<Box<dyn Boundary<D>>>,
    coupling_constant: f64,
    light_fraction: f64,
    /// Largest |dφ/dt| seen by the last derivative evaluation.
    max_rate: f64,
}

impl<const D: usize> PhaseCoupling<D> {
    /// Enroll the oscillator fields and build the package.
    pub fn new(
        nodes: &mut NodeList<D>,
        coupling_constant: f64,
        light_fraction: f64,
    ) -> Result<Self, ConfigurationError> {
        enroll_fields(
            nodes,
            &[
                (PHASE, FieldKind::Scalar),
                (STRENGTH, FieldKind::Scalar),
                (OMEGA, FieldKind::Scalar),
                // Read-only here; a kinematics package evolves it.
                (POSITION, FieldKind::Vector),
            ],
        )?;
        let mut state = State::new(nodes.len());
        enroll_state_fields(&mut state, nodes, &[PHASE])?;
        Ok(Self {
            state,
            boundaries: Vec::new(),
            coupling_constant,
            light_fraction,
            max_rate: 0.0,
        })
    }

    /// Attach a boundary.
    pub fn add_boundary(&mut self, boundary: Box<dyn Boundary<D>>) {
        self.boundaries.push(boundary);
    }
}

fn mod2pi(x: f64) -> f64 {
    x.rem_euclid(TAU)
}

impl<const D: usize> Physics<D> for PhaseCoupling<D> {
    fn name(&self) -> &str {
        "phase_coupling"
    }

    fn state(&self) -> &State<D> {
        &self.state
    }

    fn state_mut(&mut self) -> &mut State<D> {
        &mut self.state
    }

    fn boundaries_mut(&mut self) -> &mut Vec<Box<dyn Boundary<D>>> {
        &mut self.boundaries
    }

    fn evaluate_derivatives(
        &mut self,
        input: &State<D>,
        deriv: &mut State<D>,
        nodes: &mut NodeList<D>,
        _time: f64,
        _dt_offset: f64,
    ) -> Result<(), PhysicsError> {
        let phases = input.scalar(PHASE).ok_or_else(|| missing(PHASE))?;
        let positions = nodes.vector(POSITION).ok_or_else(|| missing(POSITION))?;
        let omegas = nodes.scalar(OMEGA).ok_or_else(|| missing(OMEGA))?;

        let n = phases.len();
        let k = self.coupling_constant;
        let norm = n.saturating_sub(1).max(1) as f64;
        let rates: Vec<f64> = (0..n)
            .into_par_iter()
            .map(|i| {
                let mut rate = omegas[i];
                for j in 0..n {
                    if j == i {
                        continue;
                    }
                    let sep = (positions[i] - positions[j]).norm().max(MIN_SEPARATION);
                    rate += (k / sep) * (phases[j] - phases[i]).sin() / norm;
                }
                rate
            })
            .collect();

        self.max_rate = rates.iter().fold(0.0f64, |m, r| m.max(r.abs()));

        let dphase = deriv.scalar_mut(PHASE).ok_or_else(|| missing(PHASE))?;
        dphase.copy_from_slice(&rates);
        Ok(())
    }

    fn estimate_timestep(&self) -> Option<f64> {
        if self.max_rate > 0.0 {
            Some(PHASE_ADVANCE_FRACTION * TAU / self.max_rate)
        } else {
            None
        }
    }

    fn final_checks(&mut self, nodes: &mut NodeList<D>) -> Result<(), PhysicsError> {
        let light_fraction = self.light_fraction;
        let phases = nodes.scalar_mut(PHASE).ok_or_else(|| missing(PHASE))?;
        for p in phases.iter_mut() {
            *p = mod2pi(*p);
        }
        let strengths: Vec<f64> = phases
            .iter()
            .map(|&p| {
                if light_fraction == 0.0 {
                    p.sin()
                } else if p.sin().abs() > 1.0 - light_fraction {
                    1.0
                } else {
                    0.0
                }
            })
            .collect();
        let strength_field = nodes.scalar_mut(STRENGTH).ok_or_else(|| missing(STRENGTH))?;
        strength_field.copy_from_slice(&strengths);
        // Wrapping must flow back into the integrated state.
        self.refresh_state(nodes)
    }
}
