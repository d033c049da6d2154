// Copyright 2026 BiomeQuantum Contributors
// SPDX-License-Identifier: Apache-2.0

//! Packed batch kernel.
//!
//! Each biome is packed once per batch call: the static Hamiltonian is
//! copied out of its model and every jump operator is reduced to the
//! nonzero entries of L, L† and L†L. The Euler right-hand side then runs
//! over those entry lists instead of dense products.
//!
//! Sub-step schedule, driver evaluation time, gate-rate evaluation and
//! stabilization are the scalar integrator's, so trajectories agree with
//! [`crate::lindblad::evolve_density`] to rounding.

use ndarray::Array2;
use num_complex::Complex64;

use crate::engine::QuantumEngine;
use crate::hamiltonian::HamiltonianModel;
use crate::linalg::qubit_bit;
use crate::lindblad::integrate::{check_drift, log_drift, stabilize, IntegrationReport};
use crate::lindblad::{substep_schedule, Gate, JumpOperator};

#[derive(Debug, Clone, Copy)]
struct Entry {
    row: usize,
    col: usize,
    value: Complex64,
}

fn nonzero_entries(m: &Array2<Complex64>) -> Vec<Entry> {
    m.indexed_iter()
        .filter(|(_, z)| **z != Complex64::new(0.0, 0.0))
        .map(|((row, col), &value)| Entry { row, col, value })
        .collect()
}

#[derive(Debug, Clone)]
struct PackedOperator {
    matrix: Vec<Entry>,
    adjoint: Vec<Entry>,
    adjoint_product: Vec<Entry>,
    rate: f64,
    gate: Option<Gate>,
}

impl PackedOperator {
    fn pack(op: &JumpOperator) -> Self {
        Self {
            matrix: nonzero_entries(&op.matrix),
            adjoint: nonzero_entries(op.adjoint()),
            adjoint_product: nonzero_entries(op.adjoint_product()),
            rate: op.rate,
            gate: op.gate,
        }
    }
}

/// One biome prepared for the packed kernel.
#[derive(Debug)]
pub(crate) struct PackedBiome<'a> {
    model: &'a HamiltonianModel,
    dim: usize,
    num_qubits: usize,
    static_h: Array2<Complex64>,
    ops: Vec<PackedOperator>,
    max_dt: f64,
    drift_tolerance: f64,
}

impl<'a> PackedBiome<'a> {
    pub(crate) fn pack(engine: &'a QuantumEngine) -> Self {
        let model = engine.hamiltonian();
        Self {
            model,
            dim: engine.dimension(),
            num_qubits: engine.num_qubits(),
            static_h: model.static_part().as_standard_layout().into_owned(),
            ops: engine.operators().iter().map(PackedOperator::pack).collect(),
            max_dt: engine.settings().max_dt,
            drift_tolerance: engine.settings().drift_tolerance,
        }
    }

    fn hamiltonian_at(&self, t: f64, h: &mut Array2<Complex64>) {
        h.assign(&self.static_h);
        if self.model.is_time_dependent() {
            for (i, v) in self.model.drive_diagonal(t).into_iter().enumerate() {
                h[[i, i]].re += v;
            }
        }
    }

    fn gate_population(&self, rho: &Array2<Complex64>, gate: &Gate) -> f64 {
        (0..self.dim)
            .filter(|&i| qubit_bit(i, gate.qubit, self.num_qubits) == gate.pole.bit())
            .map(|i| rho[[i, i]].re)
            .sum()
    }

    fn rates(&self, rho: &Array2<Complex64>) -> Vec<f64> {
        self.ops
            .iter()
            .map(|op| match &op.gate {
                None => op.rate,
                Some(gate) => op.rate * gate.factor(self.gate_population(rho, gate)),
            })
            .collect()
    }

    /// dρ/dt into `out`.
    fn rhs(&self, h: &Array2<Complex64>, rates: &[f64], rho: &Array2<Complex64>, out: &mut Array2<Complex64>) {
        let d = self.dim;
        let minus_i = Complex64::new(0.0, -1.0);
        for a in 0..d {
            for b in 0..d {
                let mut acc = Complex64::new(0.0, 0.0);
                for k in 0..d {
                    acc += h[[a, k]] * rho[[k, b]] - rho[[a, k]] * h[[k, b]];
                }
                out[[a, b]] = acc * minus_i;
            }
        }

        for (op, &gamma) in self.ops.iter().zip(rates) {
            if gamma == 0.0 {
                continue;
            }
            // γ L ρ L†
            for l in &op.matrix {
                for r in &op.adjoint {
                    out[[l.row, r.col]] += l.value * rho[[l.col, r.row]] * r.value * gamma;
                }
            }
            // −½γ (L†L ρ + ρ L†L)
            let half = 0.5 * gamma;
            for e in &op.adjoint_product {
                for k in 0..d {
                    out[[e.row, k]] -= e.value * rho[[e.col, k]] * half;
                    out[[k, e.col]] -= rho[[k, e.row]] * e.value * half;
                }
            }
        }
    }

    /// Advance `rho` by `dt` starting at `start_time`.
    pub(crate) fn advance(&self, rho: &mut Array2<Complex64>, start_time: f64, dt: f64) -> IntegrationReport {
        let schedule = substep_schedule(dt, self.max_dt);
        let mut report = IntegrationReport {
            substeps: schedule.len(),
            end_time: start_time,
            faults: Vec::new(),
        };
        let shape = (self.dim, self.dim);
        let mut h = Array2::zeros(shape);
        let mut drho = Array2::zeros(shape);
        let mut t = start_time;

        for step in schedule {
            self.hamiltonian_at(t, &mut h);
            let rates = self.rates(rho);
            self.rhs(&h, &rates, rho, &mut drho);
            let mut next = rho.clone();
            next.zip_mut_with(&drho, |r, dr| *r += *dr * step);
            t += step;

            stabilize(&mut next);

            if let Some(fault) = check_drift(&next, self.drift_tolerance, t) {
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
}
