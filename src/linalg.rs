// Copyright 2026 BiomeQuantum Contributors
// SPDX-License-Identifier: Apache-2.0

//! Dense complex linear algebra for small registers.
//!
//! Basis convention: qubit 0 is the most significant bit of a basis index,
//! so the full space is `q0 ⊗ q1 ⊗ … ⊗ q(n-1)`. Bit value 0 is the north
//! pole, bit value 1 the south pole.

use nalgebra::DMatrix;
use ndarray::Array2;
use num_complex::Complex64;

/// Conjugate transpose (dagger) of a matrix.
pub fn dagger(m: &Array2<Complex64>) -> Array2<Complex64> {
    m.t().mapv(|z| z.conj())
}

/// Complex trace.
pub fn trace(m: &Array2<Complex64>) -> Complex64 {
    m.diag().iter().sum()
}

/// Real part of the trace.
pub fn trace_real(m: &Array2<Complex64>) -> f64 {
    trace(m).re
}

/// Purity Tr(ρ²).
///
/// For Hermitian ρ this equals Σ|ρ_ij|², which avoids the matrix product.
pub fn purity(rho: &Array2<Complex64>) -> f64 {
    rho.iter().map(|z| z.norm_sqr()).sum()
}

/// Replace `m` by (m + m†)/2.
pub fn hermitize(m: &mut Array2<Complex64>) {
    let d = m.nrows();
    for i in 0..d {
        m[[i, i]] = Complex64::new(m[[i, i]].re, 0.0);
        for j in (i + 1)..d {
            let avg = (m[[i, j]] + m[[j, i]].conj()) * 0.5;
            m[[i, j]] = avg;
            m[[j, i]] = avg.conj();
        }
    }
}

/// Mirror the upper triangle onto the lower one: `m[j,i] = conj(m[i,j])`,
/// with a real diagonal. The result is exactly Hermitian.
pub fn mirror_upper(m: &mut Array2<Complex64>) {
    let d = m.nrows();
    for i in 0..d {
        m[[i, i]] = Complex64::new(m[[i, i]].re, 0.0);
        for j in (i + 1)..d {
            m[[j, i]] = m[[i, j]].conj();
        }
    }
}

/// Largest |m_ij − conj(m_ji)| over all entries.
pub fn hermiticity_error(m: &Array2<Complex64>) -> f64 {
    let d = m.nrows();
    let mut worst: f64 = 0.0;
    for i in 0..d {
        for j in i..d {
            worst = worst.max((m[[i, j]] - m[[j, i]].conj()).norm());
        }
    }
    worst
}

/// Induced ∞-norm (maximum absolute row sum). Upper-bounds the spectral
/// norm for Hermitian matrices.
pub fn inf_norm(m: &Array2<Complex64>) -> f64 {
    m.rows()
        .into_iter()
        .map(|row| row.iter().map(|z| z.norm()).sum::<f64>())
        .fold(0.0, f64::max)
}

/// Bit value of `qubit` in basis index `index` of an `num_qubits` register.
#[inline]
pub fn qubit_bit(index: usize, qubit: usize, num_qubits: usize) -> usize {
    (index >> (num_qubits - 1 - qubit)) & 1
}

fn local_index(index: usize, qubits: &[usize], num_qubits: usize) -> usize {
    qubits
        .iter()
        .fold(0, |acc, &q| (acc << 1) | qubit_bit(index, q, num_qubits))
}

fn rest_mask(qubits: &[usize], num_qubits: usize) -> usize {
    let full = (1usize << num_qubits) - 1;
    qubits
        .iter()
        .fold(full, |mask, &q| mask & !(1usize << (num_qubits - 1 - q)))
}

/// Embed a k-local operator acting on `qubits` (in that tensor order) into
/// the full 2^n space, acting as identity on every other qubit.
///
/// `op` must be 2^k × 2^k and the qubits must be distinct and in range;
/// callers check both.
pub fn embed_operator(op: &Array2<Complex64>, qubits: &[usize], num_qubits: usize) -> Array2<Complex64> {
    let dim = 1usize << num_qubits;
    let mask = rest_mask(qubits, num_qubits);
    let mut full = Array2::zeros((dim, dim));
    for i in 0..dim {
        let li = local_index(i, qubits, num_qubits);
        for j in 0..dim {
            if (i & mask) != (j & mask) {
                continue;
            }
            let lj = local_index(j, qubits, num_qubits);
            full[[i, j]] = op[[li, lj]];
        }
    }
    full
}

/// Single-qubit transition |to⟩⟨from| for bit values `to`, `from`.
pub fn transition(to: usize, from: usize) -> Array2<Complex64> {
    let mut m = Array2::zeros((2, 2));
    m[[to, from]] = Complex64::new(1.0, 0.0);
    m
}

/// Probability that `qubit` reads `bit`: Σ ρ_ii over matching basis states.
pub fn bit_population(rho: &Array2<Complex64>, qubit: usize, bit: usize, num_qubits: usize) -> f64 {
    (0..rho.nrows())
        .filter(|&i| qubit_bit(i, qubit, num_qubits) == bit)
        .map(|i| rho[[i, i]].re)
        .sum()
}

/// Reduced density matrix over `keep` (in that order), tracing out the rest.
pub fn partial_trace_keep(rho: &Array2<Complex64>, keep: &[usize], num_qubits: usize) -> Array2<Complex64> {
    let dim = 1usize << num_qubits;
    let k = 1usize << keep.len();
    let mask = rest_mask(keep, num_qubits);
    let mut reduced = Array2::zeros((k, k));
    for i in 0..dim {
        let li = local_index(i, keep, num_qubits);
        for j in 0..dim {
            if (i & mask) != (j & mask) {
                continue;
            }
            let lj = local_index(j, keep, num_qubits);
            reduced[[li, lj]] += rho[[i, j]];
        }
    }
    reduced
}

/// Eigenvalues of a Hermitian matrix, ascending.
pub fn hermitian_eigenvalues(m: &Array2<Complex64>) -> Vec<f64> {
    let n = m.nrows();
    let dense = DMatrix::from_fn(n, n, |i, j| m[[i, j]]);
    let mut values: Vec<f64> = dense.symmetric_eigenvalues().iter().copied().collect();
    values.sort_by(|x, y| x.total_cmp(y));
    values
}

/// Von Neumann entropy S(ρ) = −Σ λ log₂ λ in bits.
pub fn von_neumann_entropy(rho: &Array2<Complex64>) -> f64 {
    let entropy: f64 = hermitian_eigenvalues(rho)
        .into_iter()
        .filter(|&l| l > 1e-15)
        .map(|l| -l * l.log2())
        .sum();
    entropy.max(0.0)
}
