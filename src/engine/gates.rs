// Copyright 2026 BiomeQuantum Contributors
// SPDX-License-Identifier: Apache-2.0

//! Standard gate matrices.
//!
//! Two-qubit gates are written in the basis |a b⟩ with the first qubit as
//! the most significant bit, matching [`QuantumEngine::apply_gate_2q`].
//!
//! [`QuantumEngine::apply_gate_2q`]: super::QuantumEngine::apply_gate_2q

use ndarray::{array, Array2};
use num_complex::Complex64;
use std::f64::consts::FRAC_1_SQRT_2;

fn c(re: f64, im: f64) -> Complex64 {
    Complex64::new(re, im)
}

pub fn identity() -> Array2<Complex64> {
    Array2::eye(2)
}

pub fn hadamard() -> Array2<Complex64> {
    let h = c(FRAC_1_SQRT_2, 0.0);
    array![[h, h], [h, -h]]
}

pub fn pauli_x() -> Array2<Complex64> {
    array![[c(0.0, 0.0), c(1.0, 0.0)], [c(1.0, 0.0), c(0.0, 0.0)]]
}

pub fn pauli_y() -> Array2<Complex64> {
    array![[c(0.0, 0.0), c(0.0, -1.0)], [c(0.0, 1.0), c(0.0, 0.0)]]
}

pub fn pauli_z() -> Array2<Complex64> {
    array![[c(1.0, 0.0), c(0.0, 0.0)], [c(0.0, 0.0), c(-1.0, 0.0)]]
}

/// diag(1, e^{iθ})
pub fn phase(theta: f64) -> Array2<Complex64> {
    array![
        [c(1.0, 0.0), c(0.0, 0.0)],
        [c(0.0, 0.0), Complex64::from_polar(1.0, theta)]
    ]
}

/// Controlled-NOT with the first qubit as control.
pub fn cnot() -> Array2<Complex64> {
    let mut m = Array2::zeros((4, 4));
    m[[0, 0]] = c(1.0, 0.0);
    m[[1, 1]] = c(1.0, 0.0);
    m[[2, 3]] = c(1.0, 0.0);
    m[[3, 2]] = c(1.0, 0.0);
    m
}

pub fn cz() -> Array2<Complex64> {
    let mut m = Array2::eye(4);
    m[[3, 3]] = c(-1.0, 0.0);
    m
}

pub fn swap() -> Array2<Complex64> {
    let mut m = Array2::zeros((4, 4));
    m[[0, 0]] = c(1.0, 0.0);
    m[[1, 2]] = c(1.0, 0.0);
    m[[2, 1]] = c(1.0, 0.0);
    m[[3, 3]] = c(1.0, 0.0);
    m
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linalg::dagger;
    use approx::assert_relative_eq;

    fn assert_unitary(u: &Array2<Complex64>) {
        let product = u.dot(&dagger(u));
        for ((i, j), z) in product.indexed_iter() {
            let expected = if i == j { 1.0 } else { 0.0 };
            assert_relative_eq!(z.re, expected, epsilon = 1e-12);
            assert_relative_eq!(z.im, 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_all_gates_unitary() {
        for u in [
            identity(),
            hadamard(),
            pauli_x(),
            pauli_y(),
            pauli_z(),
            phase(0.7),
            cnot(),
            cz(),
            swap(),
        ] {
            assert_unitary(&u);
        }
    }

    #[test]
    fn test_cnot_flips_target_when_control_set() {
        // |10⟩ → |11⟩
        assert_eq!(cnot()[[3, 2]], c(1.0, 0.0));
        assert_eq!(cnot()[[1, 1]], c(1.0, 0.0));
    }
}
