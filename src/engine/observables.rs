// Copyright 2026 BiomeQuantum Contributors
// SPDX-License-Identifier: Apache-2.0

//! Read-only observables of a density matrix.
//!
//! These are free functions over ρ so the engine and the batch engine
//! derive identical snapshots.

use std::collections::BTreeMap;

use ndarray::Array2;
use num_complex::Complex64;
use serde::Serialize;

use crate::config::CorrelationThresholds;
use crate::linalg::{bit_population, partial_trace_keep, von_neumann_entropy};
use crate::register::{Pole, RegisterMap};

/// Population of `pole` on `qubit`.
pub fn pole_population(rho: &Array2<Complex64>, qubit: usize, pole: Pole, num_qubits: usize) -> f64 {
    bit_population(rho, qubit, pole.bit(), num_qubits)
}

/// Population of every register label.
pub fn populations(rho: &Array2<Complex64>, register: &RegisterMap) -> BTreeMap<String, f64> {
    let n = register.num_qubits();
    let mut out = BTreeMap::new();
    for (q, axis) in register.axes().iter().enumerate() {
        let north = pole_population(rho, q, Pole::North, n);
        out.insert(axis.north.clone(), north);
        out.insert(axis.south.clone(), pole_population(rho, q, Pole::South, n));
    }
    out
}

/// |⟨north|ρ_q|south⟩| of the reduced state of one qubit.
pub fn axis_coherence(rho: &Array2<Complex64>, qubit: usize, num_qubits: usize) -> f64 {
    partial_trace_keep(rho, &[qubit], num_qubits)[[0, 1]].norm()
}

/// Coherence |ρ_ab| between two labels.
///
/// Labels on one axis use the off-diagonal of that qubit's reduced state.
/// Labels on different axes use the reduced two-qubit element linking
/// "a occupied, b empty" with "a empty, b occupied", the pair of states an
/// excitation hop between a and b connects. A label has no coherence with
/// itself.
pub fn coherence(
    rho: &Array2<Complex64>,
    (qa, pa): (usize, Pole),
    (qb, pb): (usize, Pole),
    num_qubits: usize,
) -> f64 {
    if qa == qb {
        if pa == pb {
            return 0.0;
        }
        return axis_coherence(rho, qa, num_qubits);
    }
    let reduced = partial_trace_keep(rho, &[qa, qb], num_qubits);
    let row = (pa.bit() << 1) | pb.opposite().bit();
    let col = (pa.opposite().bit() << 1) | pb.bit();
    reduced[[row, col]].norm()
}

/// Bloch vector (x, y, z) of one qubit, with z = P(north) − P(south).
pub fn bloch_vector(rho: &Array2<Complex64>, qubit: usize, num_qubits: usize) -> [f64; 3] {
    let r = partial_trace_keep(rho, &[qubit], num_qubits);
    [2.0 * r[[0, 1]].re, -2.0 * r[[0, 1]].im, r[[0, 0]].re - r[[1, 1]].re]
}

/// Quantum mutual information I(A:B) = S(A) + S(B) − S(AB), in bits.
pub fn mutual_information(rho: &Array2<Complex64>, a: usize, b: usize, num_qubits: usize) -> f64 {
    let s_a = von_neumann_entropy(&partial_trace_keep(rho, &[a], num_qubits));
    let s_b = von_neumann_entropy(&partial_trace_keep(rho, &[b], num_qubits));
    let s_ab = von_neumann_entropy(&partial_trace_keep(rho, &[a, b], num_qubits));
    (s_a + s_b - s_ab).max(0.0)
}

/// Discrete correlation strength of a qubit pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationLevel {
    Uncorrelated,
    Weak,
    Moderate,
    Strong,
}

impl CorrelationLevel {
    pub fn classify(mutual_information: f64, thresholds: &CorrelationThresholds) -> Self {
        if mutual_information >= thresholds.strong {
            CorrelationLevel::Strong
        } else if mutual_information >= thresholds.moderate {
            CorrelationLevel::Moderate
        } else if mutual_information >= thresholds.weak {
            CorrelationLevel::Weak
        } else {
            CorrelationLevel::Uncorrelated
        }
    }
}

/// Correlation of one qubit pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairCorrelation {
    pub qubit_a: usize,
    pub qubit_b: usize,
    pub mutual_information: f64,
    pub level: CorrelationLevel,
}

/// Every unordered qubit pair, in (a, b) lexicographic order with a < b.
pub fn correlation_summary(
    rho: &Array2<Complex64>,
    num_qubits: usize,
    thresholds: &CorrelationThresholds,
) -> Vec<PairCorrelation> {
    let mut pairs = Vec::new();
    for a in 0..num_qubits {
        for b in (a + 1)..num_qubits {
            let mi = mutual_information(rho, a, b, num_qubits);
            pairs.push(PairCorrelation {
                qubit_a: a,
                qubit_b: b,
                mutual_information: mi,
                level: CorrelationLevel::classify(mi, thresholds),
            });
        }
    }
    pairs
}

/// Sampling weight per label, normalized to sum 1.
///
/// weight(L) = max(P(L), 0) + coherence_weight · axis_coherence(L's qubit).
/// Falls back to uniform weights when the raw sum is not a positive finite
/// number.
pub fn weight_map(
    rho: &Array2<Complex64>,
    register: &RegisterMap,
    coherence_weight: f64,
) -> BTreeMap<String, f64> {
    let n = register.num_qubits();
    let mut weights = BTreeMap::new();
    for (q, axis) in register.axes().iter().enumerate() {
        let bonus = coherence_weight * axis_coherence(rho, q, n);
        for pole in [Pole::North, Pole::South] {
            let w = pole_population(rho, q, pole, n).max(0.0) + bonus;
            weights.insert(axis.label(pole).to_string(), w);
        }
    }

    let total: f64 = weights.values().sum();
    if total.is_finite() && total > 0.0 && weights.values().all(|w| w.is_finite()) {
        weights.values_mut().for_each(|w| *w /= total);
    } else {
        let uniform = 1.0 / weights.len().max(1) as f64;
        weights.values_mut().for_each(|w| *w = uniform);
    }
    weights
}
