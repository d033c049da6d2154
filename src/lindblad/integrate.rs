// Copyright 2026 BiomeQuantum Contributors
// SPDX-License-Identifier: Apache-2.0

//! Sub-stepped explicit Euler integrator for the Lindblad equation.
//!
//! A tick of length `dt` is split into sub-steps no longer than `max_dt`.
//! Each sub-step evaluates H at its start time, refreshes gated rates from
//! the live state, takes one Euler step, then Hermitizes and renormalizes ρ.
//!
//! Explicit Euler is only stable while `max_dt · ‖generator‖` stays below
//! one; [`check_stability`] enforces this whenever H or {L_k} change.

use std::fmt;

use ndarray::Array2;
use num_complex::Complex64;
use tracing::error;

use super::dissipator::{effective_rates, lindblad_rhs};
use super::types::JumpOperator;
use crate::error::BuildError;
use crate::hamiltonian::HamiltonianModel;
use crate::linalg::{hermiticity_error, hermitize, trace_real};

/// Split `dt` into sub-steps each ≤ `max_dt` whose sequential sum is
/// exactly `dt`. Returns no steps for `dt == 0`.
///
/// Callers pass finite `dt ≥ 0` and finite `max_dt > 0`.
pub fn substep_schedule(dt: f64, max_dt: f64) -> Vec<f64> {
    if dt <= 0.0 {
        return Vec::new();
    }
    let mut count = ((dt / max_dt).ceil() as usize).max(1);
    loop {
        let step = (dt / count as f64).min(max_dt);
        let mut steps = Vec::with_capacity(count);
        let mut accumulated = 0.0;
        for _ in 1..count {
            steps.push(step);
            accumulated += step;
        }
        // accumulated ≥ dt/2 once count ≥ 2, so this subtraction is exact
        let last = dt - accumulated;
        if last <= max_dt {
            steps.push(last);
            return steps;
        }
        count += 1;
    }
}

/// One explicit Euler step: ρ + h · L(ρ).
pub fn euler_step(
    rho: &Array2<Complex64>,
    hamiltonian: &Array2<Complex64>,
    ops: &[JumpOperator],
    rates: &[f64],
    h: f64,
) -> Array2<Complex64> {
    let drho = lindblad_rhs(hamiltonian, ops, rates, rho);
    rho + &(drho * Complex64::new(h, 0.0))
}

/// Trace deviation below which [`stabilize`] leaves ρ unscaled.
pub const TRACE_TOLERANCE: f64 = 1e-12;

/// Force ρ Hermitian with unit trace. Returns the trace before
/// renormalization.
///
/// A Hermitian ρ whose trace is within [`TRACE_TOLERANCE`] of one is left
/// bit-for-bit unchanged.
pub fn stabilize(rho: &mut Array2<Complex64>) -> f64 {
    hermitize(rho);
    let tr = trace_real(rho);
    if tr.is_finite() && tr > 0.0 && (tr - 1.0).abs() > TRACE_TOLERANCE {
        rho.mapv_inplace(|z| z / tr);
    }
    tr
}

/// Trace or Hermiticity still off after stabilization.
#[derive(Debug, Clone, PartialEq)]
pub struct DriftFault {
    /// Simulation time at the end of the faulty sub-step
    pub time: f64,
    pub trace_error: f64,
    pub hermiticity_error: f64,
    /// Whether ρ contained NaN or infinite entries
    pub non_finite: bool,
}

impl fmt::Display for DriftFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.non_finite {
            return write!(f, "non-finite density matrix at t={:.6}", self.time);
        }
        write!(
            f,
            "drift at t={:.6}: |tr-1|={:.3e}, hermiticity={:.3e}",
            self.time, self.trace_error, self.hermiticity_error
        )
    }
}

impl DriftFault {
    /// Whether the faulty sub-step must be dropped in favour of the
    /// previous state.
    pub fn discards_step(&self) -> bool {
        self.non_finite || self.trace_error >= 1.0
    }
}

pub(crate) fn log_drift(fault: &DriftFault) {
    error!(
        time = fault.time,
        trace_error = fault.trace_error,
        hermiticity_error = fault.hermiticity_error,
        non_finite = fault.non_finite,
        "Density matrix drift after stabilization"
    );
}

/// Inspect a stabilized ρ for drift beyond `tolerance`.
pub fn check_drift(rho: &Array2<Complex64>, tolerance: f64, time: f64) -> Option<DriftFault> {
    let non_finite = rho.iter().any(|z| !(z.re.is_finite() && z.im.is_finite()));
    let trace_error = (trace_real(rho) - 1.0).abs();
    let herm = hermiticity_error(rho);
    if non_finite || trace_error > tolerance || herm > tolerance {
        Some(DriftFault {
            time,
            trace_error,
            hermiticity_error: herm,
            non_finite,
        })
    } else {
        None
    }
}

/// Largest generator norm relevant to explicit Euler stability:
/// max(‖H‖, ‖L_k‖, ‖L_k‖²).
pub fn stability_norm(hamiltonian_norm: f64, ops: &[JumpOperator]) -> f64 {
    ops.iter()
        .map(JumpOperator::norm_bound)
        .fold(hamiltonian_norm, |acc, l| acc.max(l).max(l * l))
}

/// Require `max_dt · stability_norm < 1`.
///
/// The bound includes `‖L_k‖²` as well as `‖H‖` and `‖L_k‖`, because the
/// dissipator scales with L†L. A channel of rate 4 (‖L‖ = 2) with
/// `max_dt = 0.3` is therefore rejected even though `0.3 · 2 < 1`.
pub fn check_stability(max_dt: f64, hamiltonian_norm: f64, ops: &[JumpOperator]) -> Result<(), BuildError> {
    let norm = stability_norm(hamiltonian_norm, ops);
    if max_dt * norm < 1.0 {
        Ok(())
    } else {
        Err(BuildError::UnstableTimestep { max_dt, norm })
    }
}

/// Outcome of [`evolve_density`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntegrationReport {
    pub substeps: usize,
    pub end_time: f64,
    pub faults: Vec<DriftFault>,
}

/// Parameters of one integration call.
#[derive(Debug, Clone, Copy)]
pub struct StepControl {
    pub start_time: f64,
    pub dt: f64,
    pub max_dt: f64,
    pub drift_tolerance: f64,
}

/// Evolve `rho` in place over one tick.
///
/// A sub-step whose stabilized ρ is non-finite or has lost its trace is
/// discarded and the previous state kept. Every fault is logged and
/// reported, never returned as an error.
pub fn evolve_density(
    rho: &mut Array2<Complex64>,
    model: &HamiltonianModel,
    ops: &[JumpOperator],
    control: StepControl,
) -> IntegrationReport {
    let n = model.num_qubits();
    let schedule = substep_schedule(control.dt, control.max_dt);
    let static_h = if model.is_time_dependent() {
        None
    } else {
        Some(model.at(control.start_time))
    };

    let mut report = IntegrationReport {
        substeps: schedule.len(),
        end_time: control.start_time,
        faults: Vec::new(),
    };
    let mut t = control.start_time;

    for h in schedule {
        let driven;
        let hamiltonian = match &static_h {
            Some(hs) => hs,
            None => {
                driven = model.at(t);
                &driven
            }
        };
        let rates = effective_rates(ops, rho, n);
        let mut next = euler_step(rho, hamiltonian, ops, &rates, h);
        t += h;

        stabilize(&mut next);

        if let Some(fault) = check_drift(&next, control.drift_tolerance, t) {
            log_drift(&fault);
            let keep_previous = fault.discards_step();
            report.faults.push(fault);
            if keep_previous {
                continue;
            }
        }
        *rho = next;
    }

    report.end_time = t;
    report
}
