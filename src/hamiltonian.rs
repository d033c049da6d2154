// Copyright 2026 BiomeQuantum Contributors
// SPDX-License-Identifier: Apache-2.0

//! Hamiltonian assembly from icons.
//!
//! H(t) = Σ_L (E_L + d_L(t)) P_L + Σ_{A→B} (c_AB T_AB + h.c.)
//!
//! where P_L projects L's qubit onto L's pole and T_AB moves an excitation
//! from B to A: |A⟩⟨B| when both labels share an axis, otherwise
//! |A⟩⟨¬A|_a ⊗ |¬B⟩⟨B|_b.
//!
//! Drivers that never change are folded into the static part; the others
//! are kept as [`DriveTerm`]s and evaluated by [`HamiltonianModel::at`].

use ndarray::Array2;
use num_complex::Complex64;

use crate::error::BuildError;
use crate::icon::{CachedDriver, Icon};
use crate::linalg::{embed_operator, inf_norm, mirror_upper, qubit_bit};
use crate::register::{Pole, RegisterMap};

/// Time-dependent diagonal term of one label.
#[derive(Debug, Clone, PartialEq)]
pub struct DriveTerm {
    pub label: String,
    pub qubit: usize,
    pub pole: Pole,
    pub driver: CachedDriver,
}

/// H(t) as a static Hermitian part plus driven diagonal terms.
#[derive(Debug, Clone, PartialEq)]
pub struct HamiltonianModel {
    num_qubits: usize,
    static_part: Array2<Complex64>,
    drive_terms: Vec<DriveTerm>,
}

impl HamiltonianModel {
    /// H = 0 on an n-qubit register.
    pub fn zero(num_qubits: usize) -> Self {
        let dim = 1usize << num_qubits;
        Self {
            num_qubits,
            static_part: Array2::zeros((dim, dim)),
            drive_terms: Vec::new(),
        }
    }

    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    pub fn dimension(&self) -> usize {
        self.static_part.nrows()
    }

    pub fn static_part(&self) -> &Array2<Complex64> {
        &self.static_part
    }

    pub fn drive_terms(&self) -> &[DriveTerm] {
        &self.drive_terms
    }

    /// Whether H must be re-evaluated every sub-step.
    pub fn is_time_dependent(&self) -> bool {
        !self.drive_terms.is_empty()
    }

    /// Diagonal contribution of every drive term at time `t`, per basis index.
    pub fn drive_diagonal(&self, t: f64) -> Vec<f64> {
        let dim = self.dimension();
        let mut diag = vec![0.0; dim];
        for term in &self.drive_terms {
            let v = term.driver.value(t);
            if v == 0.0 {
                continue;
            }
            for (i, d) in diag.iter_mut().enumerate() {
                if qubit_bit(i, term.qubit, self.num_qubits) == term.pole.bit() {
                    *d += v;
                }
            }
        }
        diag
    }

    /// Full H(t).
    pub fn at(&self, t: f64) -> Array2<Complex64> {
        let mut h = self.static_part.clone();
        if self.is_time_dependent() {
            for (i, v) in self.drive_diagonal(t).into_iter().enumerate() {
                h[[i, i]].re += v;
            }
        }
        h
    }

    /// Upper bound on ‖H(t)‖ over all t.
    pub fn norm_bound(&self) -> f64 {
        inf_norm(&self.static_part)
            + self
                .drive_terms
                .iter()
                .map(|t| t.driver.amplitude_bound())
                .sum::<f64>()
    }
}

/// Assembles [`HamiltonianModel`]s from icons.
pub struct HamiltonianBuilder;

impl HamiltonianBuilder {
    /// Build the Hamiltonian model. All-or-nothing: any malformed icon or
    /// unknown coupling target aborts the build.
    pub fn build(icons: &[Icon], register: &RegisterMap) -> Result<HamiltonianModel, BuildError> {
        let n = register.num_qubits();
        if n == 0 {
            return Err(BuildError::EmptyRegister);
        }
        let mut model = HamiltonianModel::zero(n);
        let h = &mut model.static_part;

        for icon in icons {
            icon.validate()?;
            let (qa, pa) = register
                .locate(&icon.label)
                .ok_or_else(|| BuildError::MalformedIcon {
                    label: icon.label.clone(),
                    message: "label is not in the register".into(),
                })?;

            let mut energy = icon.self_energy;
            match &icon.driver {
                Some(driver) if driver.is_time_dependent() => {
                    model.drive_terms.push(DriveTerm {
                        label: icon.label.clone(),
                        qubit: qa,
                        pole: pa,
                        driver: CachedDriver::new(driver.clone()),
                    });
                }
                Some(driver) => energy += driver.value(0.0),
                None => {}
            }
            if energy != 0.0 {
                for i in 0..h.nrows() {
                    if qubit_bit(i, qa, n) == pa.bit() {
                        h[[i, i]].re += energy;
                    }
                }
            }

            for (target, &c) in &icon.couplings {
                if c == Complex64::new(0.0, 0.0) {
                    continue;
                }
                let (qb, pb) =
                    register
                        .locate(target)
                        .ok_or_else(|| BuildError::UnknownCouplingTarget {
                            label: icon.label.clone(),
                            target: target.clone(),
                        })?;
                if target == &icon.label {
                    return Err(BuildError::MalformedIcon {
                        label: icon.label.clone(),
                        message: "icon couples to itself".into(),
                    });
                }
                let term = coupling_term(c, (qa, pa), (qb, pb), n);
                for ((i, j), z) in term.indexed_iter() {
                    if *z != Complex64::new(0.0, 0.0) {
                        h[[i, j]] += *z;
                        h[[j, i]] += z.conj();
                    }
                }
            }
        }

        mirror_upper(h);
        Ok(model)
    }

    /// Build and evaluate H at `time` in one call.
    pub fn build_at(
        icons: &[Icon],
        register: &RegisterMap,
        time: f64,
    ) -> Result<Array2<Complex64>, BuildError> {
        Ok(Self::build(icons, register)?.at(time))
    }
}

/// c · T_AB embedded in the full space (without its Hermitian conjugate).
fn coupling_term(
    c: Complex64,
    (qa, pa): (usize, Pole),
    (qb, pb): (usize, Pole),
    num_qubits: usize,
) -> Array2<Complex64> {
    if qa == qb {
        let mut local = Array2::zeros((2, 2));
        local[[pa.bit(), pb.bit()]] = c;
        embed_operator(&local, &[qa], num_qubits)
    } else {
        let row = (pa.bit() << 1) | pb.opposite().bit();
        let col = (pa.opposite().bit() << 1) | pb.bit();
        let mut local = Array2::zeros((4, 4));
        local[[row, col]] = c;
        embed_operator(&local, &[qa, qb], num_qubits)
    }
}
