// Copyright 2026 BiomeQuantum Contributors
// SPDX-License-Identifier: Apache-2.0

//! Lindblad dissipator computation.
//!
//! Computes D[L](ρ) = γ (L ρ L† − ½{L†L, ρ}) for each jump operator, with γ
//! the operator's effective rate at evaluation time.
//!
//! Ref: Breuer & Petruccione, "The Theory of Open Quantum Systems" (2002), Ch. 3.

use ndarray::Array2;
use num_complex::Complex64;

use super::types::JumpOperator;

/// Dissipator of a single operator at rate `gamma`.
///
/// D[L](ρ) = γ (L ρ L† − ½ L†L ρ − ½ ρ L†L)
pub fn dissipator(op: &JumpOperator, gamma: f64, rho: &Array2<Complex64>) -> Array2<Complex64> {
    if gamma == 0.0 {
        return Array2::zeros(rho.raw_dim());
    }

    let l = &op.matrix;
    let l_dag_l = op.adjoint_product();
    let l_rho_ldag = l.dot(rho).dot(op.adjoint());
    let ldl_rho = l_dag_l.dot(rho);
    let rho_ldl = rho.dot(l_dag_l);

    let half = Complex64::new(0.5, 0.0);
    (&l_rho_ldag - &(&ldl_rho * half) - &(&rho_ldl * half)) * Complex64::new(gamma, 0.0)
}

/// Σ_k D[L_k](ρ) with `rates[k]` as the rate of `ops[k]`.
pub fn total_dissipator(
    ops: &[JumpOperator],
    rates: &[f64],
    rho: &Array2<Complex64>,
) -> Array2<Complex64> {
    let mut total = Array2::zeros(rho.raw_dim());
    for (op, &gamma) in ops.iter().zip(rates) {
        if gamma == 0.0 {
            continue;
        }
        total += &dissipator(op, gamma, rho);
    }
    total
}

/// Effective rate of every operator for the state `rho`.
pub fn effective_rates(ops: &[JumpOperator], rho: &Array2<Complex64>, num_qubits: usize) -> Vec<f64> {
    ops.iter().map(|op| op.effective_rate(rho, num_qubits)).collect()
}

/// Full Lindblad RHS: dρ/dt = -i[H, ρ] + Σ_k D[L_k](ρ).
pub fn lindblad_rhs(
    hamiltonian: &Array2<Complex64>,
    ops: &[JumpOperator],
    rates: &[f64],
    rho: &Array2<Complex64>,
) -> Array2<Complex64> {
    let i = Complex64::new(0.0, 1.0);

    // -i[H, ρ] = -i(Hρ - ρH)
    let h_rho = hamiltonian.dot(rho);
    let rho_h = rho.dot(hamiltonian);
    let commutator = (&h_rho - &rho_h) * (-i);

    commutator + total_dissipator(ops, rates, rho)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linalg::{trace, transition};
    use approx::assert_relative_eq;

    fn lowering() -> JumpOperator {
        // |0⟩⟨1|
        JumpOperator::new("decay", transition(0, 1), 1.0, None)
    }

    fn excited_state() -> Array2<Complex64> {
        let mut m = Array2::zeros((2, 2));
        m[[1, 1]] = Complex64::new(1.0, 0.0);
        m
    }

    fn ground_state() -> Array2<Complex64> {
        let mut m = Array2::zeros((2, 2));
        m[[0, 0]] = Complex64::new(1.0, 0.0);
        m
    }

    fn plus_state() -> Array2<Complex64> {
        Array2::from_elem((2, 2), Complex64::new(0.5, 0.0))
    }

    #[test]
    fn test_ground_state_is_fixed_point() {
        let d = dissipator(&lowering(), 3.0, &ground_state());
        for z in d.iter() {
            assert_relative_eq!(z.norm(), 0.0, epsilon = 1e-15);
        }
    }

    #[test]
    fn test_excited_state_decays_at_rate() {
        let gamma = 0.7;
        let d = dissipator(&lowering(), gamma, &excited_state());
        assert_relative_eq!(d[[0, 0]].re, gamma, epsilon = 1e-15);
        assert_relative_eq!(d[[1, 1]].re, -gamma, epsilon = 1e-15);
    }

    #[test]
    fn test_dissipator_is_traceless() {
        let d = dissipator(&lowering(), 2.0, &plus_state());
        let tr = trace(&d);
        assert_relative_eq!(tr.re, 0.0, epsilon = 1e-12);
        assert_relative_eq!(tr.im, 0.0, epsilon = 1e-12);
        // Coherence decays at γ/2
        assert_relative_eq!(d[[0, 1]].re, -0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_rate_operators_are_skipped() {
        let ops = vec![lowering()];
        let d = total_dissipator(&ops, &[0.0], &excited_state());
        assert!(d.iter().all(|z| z.norm() == 0.0));
    }

    #[test]
    fn test_rhs_unitary_part() {
        // H = σx, ρ = |0⟩⟨0|: -i[σx, ρ] has off-diagonals ±i
        let mut h = Array2::zeros((2, 2));
        h[[0, 1]] = Complex64::new(1.0, 0.0);
        h[[1, 0]] = Complex64::new(1.0, 0.0);
        let drho = lindblad_rhs(&h, &[], &[], &ground_state());
        assert_relative_eq!(drho[[0, 1]].im, 1.0, epsilon = 1e-15);
        assert_relative_eq!(drho[[1, 0]].im, -1.0, epsilon = 1e-15);
        assert_relative_eq!(drho[[0, 0]].norm(), 0.0, epsilon = 1e-15);
    }

    #[test]
    fn test_effective_rates_without_gates() {
        let ops = vec![lowering(), JumpOperator::new("pump", transition(1, 0), 0.25, None)];
        assert_eq!(effective_rates(&ops, &plus_state(), 1), vec![1.0, 0.25]);
    }
}
