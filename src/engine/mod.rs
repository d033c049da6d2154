// Copyright 2026 BiomeQuantum Contributors
// SPDX-License-Identifier: Apache-2.0

//! Per-biome quantum engine.
//!
//! A [`QuantumEngine`] owns one biome's density matrix together with its
//! Hamiltonian model and jump operators. Evolution, gates and measurements
//! all take `&mut self`, so point operations always land between sub-steps.
//!
//! Lifecycle: `Built → Evolving → … → Unloaded`. Gates and measurements move
//! the engine back to `Built`; every operation on an unloaded engine fails
//! with [`Error::Unloaded`].

pub mod gates;
pub mod observables;

use std::collections::BTreeMap;

use ndarray::Array2;
use num_complex::Complex64;
use rand::Rng;
use tracing::{debug, info};

use crate::config::{Config, CorrelationThresholds, InitialState};
use crate::error::{BuildError, Error, RegisterError, Result};
use crate::hamiltonian::HamiltonianModel;
use crate::linalg::{bit_population, dagger, embed_operator, hermitize, purity, qubit_bit};
use crate::lindblad::integrate::stabilize;
use crate::lindblad::{check_stability, evolve_density, JumpOperator, StepControl};
use crate::register::RegisterMap;
use crate::validation::{validate_density_matrix, validate_substep_count, validate_timestep};

pub use observables::{CorrelationLevel, PairCorrelation};

/// Probabilities at or below this are treated as zero by projections.
pub const PROBABILITY_EPSILON: f64 = 1e-12;

/// Settings injected into every engine.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    pub max_dt: f64,
    pub drift_tolerance: f64,
    /// Largest number of sub-steps one [`QuantumEngine::evolve`] may take
    pub max_substeps: usize,
    pub initial_state: InitialState,
    pub coherence_weight: f64,
    pub correlation: CorrelationThresholds,
}

impl EngineSettings {
    pub fn validate(&self) -> Result<()> {
        if !self.max_dt.is_finite() || self.max_dt <= 0.0 {
            return Err(Error::Config(format!(
                "max_dt must be finite and positive, got {}",
                self.max_dt
            )));
        }
        if !self.drift_tolerance.is_finite() || self.drift_tolerance <= 0.0 {
            return Err(Error::Config(format!(
                "drift_tolerance must be finite and positive, got {}",
                self.drift_tolerance
            )));
        }
        if self.max_substeps == 0 {
            return Err(Error::Config("max_substeps cannot be 0".into()));
        }
        Ok(())
    }
}

impl From<&Config> for EngineSettings {
    fn from(config: &Config) -> Self {
        Self {
            max_dt: config.evolution.max_dt,
            drift_tolerance: config.evolution.drift_tolerance,
            max_substeps: config.limits.max_substeps_per_call,
            initial_state: config.evolution.initial_state,
            coherence_weight: config.observables.coherence_weight,
            correlation: config.observables.correlation,
        }
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

/// Lifecycle state of an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Built,
    Evolving,
    Unloaded,
}

/// Summary of one [`QuantumEngine::evolve`] call.
#[derive(Debug, Clone, PartialEq)]
pub struct EvolveReport {
    pub substeps: usize,
    pub start_time: f64,
    pub end_time: f64,
    /// Drift faults logged during this call
    pub drift_faults: usize,
}

/// One biome's open quantum system.
#[derive(Debug, Clone)]
pub struct QuantumEngine {
    biome: String,
    register: RegisterMap,
    hamiltonian: HamiltonianModel,
    operators: Vec<JumpOperator>,
    settings: EngineSettings,
    rho: Option<Array2<Complex64>>,
    time: f64,
    state: EngineState,
    drift_faults: usize,
}

impl QuantumEngine {
    /// Assemble an engine and initialize ρ from `settings.initial_state`.
    ///
    /// Fails when an operator does not match the register dimension or when
    /// `settings.max_dt` violates the Euler stability bound.
    pub fn new(
        biome: impl Into<String>,
        register: RegisterMap,
        hamiltonian: HamiltonianModel,
        operators: Vec<JumpOperator>,
        settings: EngineSettings,
    ) -> Result<Self> {
        settings.validate()?;
        let dim = register.dimension();
        if register.num_qubits() == 0 {
            return Err(BuildError::EmptyRegister.into());
        }
        if hamiltonian.dimension() != dim {
            return Err(BuildError::DimensionMismatch {
                expected: dim,
                actual: hamiltonian.dimension(),
            }
            .into());
        }
        if let Some(op) = operators.iter().find(|op| op.dimension() != dim) {
            return Err(BuildError::DimensionMismatch {
                expected: dim,
                actual: op.dimension(),
            }
            .into());
        }
        check_stability(settings.max_dt, hamiltonian.norm_bound(), &operators)?;
        let rho = initial_density(settings.initial_state, dim)?;

        Ok(Self {
            biome: biome.into(),
            register,
            hamiltonian,
            operators,
            settings,
            rho: Some(rho),
            time: 0.0,
            state: EngineState::Built,
            drift_faults: 0,
        })
    }

    pub fn biome(&self) -> &str {
        &self.biome
    }

    pub fn register(&self) -> &RegisterMap {
        &self.register
    }

    pub fn hamiltonian(&self) -> &HamiltonianModel {
        &self.hamiltonian
    }

    pub fn operators(&self) -> &[JumpOperator] {
        &self.operators
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Elapsed simulation time.
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Drift faults logged over the engine's lifetime.
    pub fn drift_fault_count(&self) -> usize {
        self.drift_faults
    }

    pub fn num_qubits(&self) -> usize {
        self.register.num_qubits()
    }

    pub fn dimension(&self) -> usize {
        self.register.dimension()
    }

    pub fn is_unloaded(&self) -> bool {
        self.state == EngineState::Unloaded
    }

    /// Current density matrix.
    pub fn density_matrix(&self) -> Result<&Array2<Complex64>> {
        self.rho.as_ref().ok_or_else(|| Error::Unloaded(self.biome.clone()))
    }

    fn density_matrix_mut(&mut self) -> Result<&mut Array2<Complex64>> {
        match self.rho.as_mut() {
            Some(rho) => Ok(rho),
            None => Err(Error::Unloaded(self.biome.clone())),
        }
    }

    /// Integrate the master equation over `dt`.
    ///
    /// `dt == 0` is a no-op. Drift faults are logged and counted but never
    /// returned as errors.
    pub fn evolve(&mut self, dt: f64) -> Result<EvolveReport> {
        self.density_matrix()?;
        if let Err(e) = validate_timestep(dt, "dt") {
            return Err(Error::InvalidArgument(e.to_string()));
        }
        let start_time = self.time;
        if dt == 0.0 {
            return Ok(EvolveReport {
                substeps: 0,
                start_time,
                end_time: start_time,
                drift_faults: 0,
            });
        }
        validate_substep_count(dt, self.settings.max_dt, self.settings.max_substeps)?;

        let control = StepControl {
            start_time,
            dt,
            max_dt: self.settings.max_dt,
            drift_tolerance: self.settings.drift_tolerance,
        };
        let Some(rho) = self.rho.as_mut() else {
            return Err(Error::Unloaded(self.biome.clone()));
        };
        let report = evolve_density(rho, &self.hamiltonian, &self.operators, control);

        self.time = report.end_time;
        self.drift_faults += report.faults.len();
        self.state = EngineState::Evolving;

        Ok(EvolveReport {
            substeps: report.substeps,
            start_time,
            end_time: report.end_time,
            drift_faults: report.faults.len(),
        })
    }

    /// Install a state evolved elsewhere (batch engine) as if `evolve` ran.
    pub(crate) fn install_evolved(&mut self, rho: Array2<Complex64>, end_time: f64, faults: usize) -> Result<()> {
        *self.density_matrix_mut()? = rho;
        self.time = end_time;
        self.drift_faults += faults;
        self.state = EngineState::Evolving;
        Ok(())
    }

    /// Swap in a new Hamiltonian. ρ and the jump operators are untouched.
    pub fn replace_hamiltonian(&mut self, model: HamiltonianModel) -> Result<()> {
        self.density_matrix()?;
        if model.dimension() != self.dimension() {
            return Err(BuildError::DimensionMismatch {
                expected: self.dimension(),
                actual: model.dimension(),
            }
            .into());
        }
        check_stability(self.settings.max_dt, model.norm_bound(), &self.operators)?;
        debug!(
            biome = %self.biome,
            norm_bound = model.norm_bound(),
            driven = model.is_time_dependent(),
            "Replaced Hamiltonian"
        );
        self.hamiltonian = model;
        Ok(())
    }

    /// Replace ρ, e.g. from a saved snapshot. The state is Hermitized and
    /// renormalized before it is installed.
    pub fn restore_density(&mut self, rho: Array2<Complex64>, time: f64) -> Result<()> {
        self.density_matrix()?;
        validate_density_matrix(&rho, self.dimension())?;
        validate_timestep(time, "time")?;
        let mut rho = rho;
        stabilize(&mut rho);
        self.rho = Some(rho);
        self.time = time;
        self.state = EngineState::Built;
        Ok(())
    }

    /// Drop ρ. Every later operation fails with [`Error::Unloaded`].
    pub fn unload(&mut self) {
        if self.state != EngineState::Unloaded {
            info!(biome = %self.biome, time = self.time, "Unloading biome");
        }
        self.rho = None;
        self.state = EngineState::Unloaded;
    }

    /// ρ → UρU† with the 2×2 `u` acting on `qubit`. `u` is assumed unitary.
    pub fn apply_gate(&mut self, qubit: usize, u: &Array2<Complex64>) -> Result<()> {
        self.density_matrix()?;
        self.register.check_qubit(qubit)?;
        if u.dim() != (2, 2) {
            return Err(Error::InvalidArgument(format!(
                "single-qubit gate must be 2 × 2, got {} × {}",
                u.nrows(),
                u.ncols()
            )));
        }
        let full = embed_operator(u, &[qubit], self.num_qubits());
        self.conjugate(&full)
    }

    /// ρ → UρU† with the 4×4 `u` acting on `(qubit_a, qubit_b)`, `qubit_a`
    /// being the more significant factor. `u` is assumed unitary.
    pub fn apply_gate_2q(&mut self, qubit_a: usize, qubit_b: usize, u: &Array2<Complex64>) -> Result<()> {
        self.density_matrix()?;
        self.check_pair(qubit_a, qubit_b)?;
        if u.dim() != (4, 4) {
            return Err(Error::InvalidArgument(format!(
                "two-qubit gate must be 4 × 4, got {} × {}",
                u.nrows(),
                u.ncols()
            )));
        }
        let full = embed_operator(u, &[qubit_a, qubit_b], self.num_qubits());
        self.conjugate(&full)
    }

    fn conjugate(&mut self, full: &Array2<Complex64>) -> Result<()> {
        let rho = self.density_matrix_mut()?;
        let mut next = full.dot(&*rho).dot(&dagger(full));
        hermitize(&mut next);
        *rho = next;
        self.state = EngineState::Built;
        Ok(())
    }

    fn check_pair(&self, a: usize, b: usize) -> Result<()> {
        self.register.check_qubit(a)?;
        self.register.check_qubit(b)?;
        if a == b {
            return Err(RegisterError::DuplicateQubit(a).into());
        }
        Ok(())
    }

    /// Project `qubit` onto `outcome` (0 = north, 1 = south) and
    /// renormalize. Returns the outcome's prior probability.
    ///
    /// Fails without touching ρ when the outcome has zero probability.
    pub fn project_qubit(&mut self, qubit: usize, outcome: u8) -> Result<f64> {
        self.density_matrix()?;
        self.register.check_qubit(qubit)?;
        if outcome > 1 {
            return Err(Error::InvalidArgument(format!(
                "measurement outcome must be 0 or 1, got {outcome}"
            )));
        }
        let n = self.num_qubits();
        let bit = outcome as usize;
        let rho = self.density_matrix_mut()?;
        let p = bit_population(rho, qubit, bit, n);
        if !(p > PROBABILITY_EPSILON) {
            return Err(Error::ZeroProbability { qubit, outcome });
        }
        for ((i, j), z) in rho.indexed_iter_mut() {
            if qubit_bit(i, qubit, n) != bit || qubit_bit(j, qubit, n) != bit {
                *z = Complex64::new(0.0, 0.0);
            } else {
                *z /= p;
            }
        }
        self.state = EngineState::Built;
        Ok(p)
    }

    /// Sample an outcome with Born probabilities and project onto it.
    pub fn measure_qubit<R: Rng + ?Sized>(&mut self, qubit: usize, rng: &mut R) -> Result<u8> {
        self.register.check_qubit(qubit)?;
        let p_north = bit_population(self.density_matrix()?, qubit, 0, self.num_qubits());
        let mut outcome = if rng.gen::<f64>() < p_north { 0 } else { 1 };
        let p_outcome = if outcome == 0 { p_north } else { 1.0 - p_north };
        if p_outcome <= PROBABILITY_EPSILON {
            outcome = 1 - outcome;
        }
        self.project_qubit(qubit, outcome)?;
        debug!(biome = %self.biome, qubit, outcome, p_north, "Measured qubit");
        Ok(outcome)
    }

    /// Hadamard on `qubit_a`, then CNOT(`qubit_a` → `qubit_b`).
    pub fn entangle(&mut self, qubit_a: usize, qubit_b: usize) -> Result<()> {
        self.density_matrix()?;
        self.check_pair(qubit_a, qubit_b)?;
        self.apply_gate(qubit_a, &gates::hadamard())?;
        self.apply_gate_2q(qubit_a, qubit_b, &gates::cnot())
    }

    /// Population of `label`'s pole.
    pub fn get_population(&self, label: &str) -> Result<f64> {
        let rho = self.density_matrix()?;
        let (qubit, pole) = self.register.require(label)?;
        Ok(observables::pole_population(rho, qubit, pole, self.num_qubits()))
    }

    /// Population of every label.
    pub fn populations(&self) -> Result<BTreeMap<String, f64>> {
        Ok(observables::populations(self.density_matrix()?, &self.register))
    }

    /// Tr(ρ²).
    pub fn get_purity(&self) -> Result<f64> {
        Ok(purity(self.density_matrix()?))
    }

    /// Coherence between two labels; see [`observables::coherence`].
    pub fn get_coherence(&self, a: &str, b: &str) -> Result<f64> {
        let rho = self.density_matrix()?;
        let la = self.register.require(a)?;
        let lb = self.register.require(b)?;
        Ok(observables::coherence(rho, la, lb, self.num_qubits()))
    }

    pub fn bloch_vector(&self, qubit: usize) -> Result<[f64; 3]> {
        let rho = self.density_matrix()?;
        self.register.check_qubit(qubit)?;
        Ok(observables::bloch_vector(rho, qubit, self.num_qubits()))
    }

    /// Mutual information between two qubits, in bits.
    pub fn mutual_information(&self, qubit_a: usize, qubit_b: usize) -> Result<f64> {
        let rho = self.density_matrix()?;
        self.check_pair(qubit_a, qubit_b)?;
        Ok(observables::mutual_information(rho, qubit_a, qubit_b, self.num_qubits()))
    }

    /// Mutual information and correlation level for every qubit pair.
    pub fn correlation_summary(&self) -> Result<Vec<PairCorrelation>> {
        Ok(observables::correlation_summary(
            self.density_matrix()?,
            self.num_qubits(),
            &self.settings.correlation,
        ))
    }

    /// Normalized, non-negative sampling weight per label.
    pub fn weight_map(&self) -> Result<BTreeMap<String, f64>> {
        Ok(observables::weight_map(
            self.density_matrix()?,
            &self.register,
            self.settings.coherence_weight,
        ))
    }
}

fn initial_density(state: InitialState, dim: usize) -> Result<Array2<Complex64>> {
    match state {
        InitialState::Basis(index) => {
            if index >= dim {
                return Err(Error::InvalidArgument(format!(
                    "initial basis state {} is outside dimension {}",
                    index, dim
                )));
            }
            let mut rho = Array2::zeros((dim, dim));
            rho[[index, index]] = Complex64::new(1.0, 0.0);
            Ok(rho)
        }
        InitialState::Uniform => Ok(Array2::from_elem((dim, dim), Complex64::new(1.0 / dim as f64, 0.0))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use crate::linalg::{hermiticity_error, trace_real};
    use crate::lindblad::ChannelSpec;
    use crate::test_utils::{bare_engine, coupled_engine, two_axis_register};
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_new_starts_in_basis_zero() {
        let engine = bare_engine(&[]);
        assert_eq!(engine.state(), EngineState::Built);
        assert_eq!(engine.time(), 0.0);
        assert_relative_eq!(engine.get_population("🌾").unwrap(), 1.0);
        assert_relative_eq!(engine.get_population("🐇").unwrap(), 1.0);
        assert_relative_eq!(engine.get_purity().unwrap(), 1.0);
    }

    #[test]
    fn test_uniform_initial_state() {
        let settings = EngineSettings {
            initial_state: InitialState::Uniform,
            ..EngineSettings::default()
        };
        let register = two_axis_register();
        let engine = QuantumEngine::new("meadow", register, HamiltonianModel::zero(2), vec![], settings).unwrap();
        assert_relative_eq!(engine.get_population("🐺").unwrap(), 0.5, epsilon = 1e-12);
        assert_relative_eq!(engine.get_coherence("🌾", "🍂").unwrap(), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_basis_state_out_of_range() {
        let settings = EngineSettings {
            initial_state: InitialState::Basis(4),
            ..EngineSettings::default()
        };
        let result = QuantumEngine::new("meadow", two_axis_register(), HamiltonianModel::zero(2), vec![], settings);
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let result = QuantumEngine::new(
            "meadow",
            two_axis_register(),
            HamiltonianModel::zero(1),
            vec![],
            EngineSettings::default(),
        );
        assert!(matches!(
            result,
            Err(Error::Build(BuildError::DimensionMismatch { expected: 4, actual: 2 }))
        ));
    }

    #[test]
    fn test_unstable_timestep_rejected() {
        let fast = crate::lindblad::JumpOperator::new("fast", Array2::eye(4), 1e4, None);
        let result = QuantumEngine::new(
            "meadow",
            two_axis_register(),
            HamiltonianModel::zero(2),
            vec![fast],
            EngineSettings::default(),
        );
        assert!(matches!(
            result,
            Err(Error::Build(BuildError::UnstableTimestep { .. }))
        ));
    }

    #[test]
    fn test_evolve_zero_is_noop() {
        let mut engine = coupled_engine();
        let before = engine.density_matrix().unwrap().clone();
        let report = engine.evolve(0.0).unwrap();
        assert_eq!(report.substeps, 0);
        assert_eq!(engine.density_matrix().unwrap(), &before);
        assert_eq!(engine.state(), EngineState::Built);
    }

    #[test]
    fn test_evolve_rejects_bad_dt() {
        let mut engine = coupled_engine();
        assert!(matches!(engine.evolve(-0.1), Err(Error::InvalidArgument(_))));
        assert!(matches!(engine.evolve(f64::NAN), Err(Error::InvalidArgument(_))));
        assert_eq!(engine.time(), 0.0);
    }

    #[test]
    fn test_evolve_rejects_oversized_tick() {
        let mut engine = coupled_engine();
        let before = engine.density_matrix().unwrap().clone();
        assert!(matches!(
            engine.evolve(1e12),
            Err(Error::Validation(ValidationError::ResourceLimit { .. }))
        ));
        assert_eq!(engine.density_matrix().unwrap(), &before);
        assert_eq!(engine.time(), 0.0);
        assert_eq!(engine.state(), EngineState::Built);
    }

    #[test]
    fn test_evolve_keeps_trace_and_hermiticity() {
        let mut engine = coupled_engine();
        for _ in 0..20 {
            let report = engine.evolve(0.13).unwrap();
            assert_eq!(report.drift_faults, 0);
            let rho = engine.density_matrix().unwrap();
            assert_relative_eq!(trace_real(rho), 1.0, epsilon = 1e-12);
            assert!(hermiticity_error(rho) < 1e-12);
        }
        assert_eq!(engine.state(), EngineState::Evolving);
        assert_relative_eq!(engine.time(), 2.6, epsilon = 1e-12);
    }

    #[test]
    fn test_hadamard_populations_constant_without_dynamics() {
        let mut engine = bare_engine(&[]);
        engine.apply_gate(0, &gates::hadamard()).unwrap();
        // |+⟩ on q0 with q1 at north: ρ[|00⟩, |10⟩] = 1/2
        assert_relative_eq!(engine.density_matrix().unwrap()[[0, 2]].re, 0.5, epsilon = 1e-12);
        assert_relative_eq!(engine.get_coherence("🌾", "🍂").unwrap(), 0.5, epsilon = 1e-12);
        for _ in 0..5 {
            engine.evolve(0.1).unwrap();
            assert_relative_eq!(engine.get_population("🌾").unwrap(), 0.5, epsilon = 1e-12);
            assert_relative_eq!(engine.get_population("🍂").unwrap(), 0.5, epsilon = 1e-12);
            let rho = engine.density_matrix().unwrap();
            assert_relative_eq!(rho[[0, 2]].re, 0.5, epsilon = 1e-12);
            assert_relative_eq!(rho[[0, 2]].im, 0.0, epsilon = 1e-12);
            assert_relative_eq!(engine.get_coherence("🌾", "🍂").unwrap(), 0.5, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_gate_validation_leaves_state_untouched() {
        let mut engine = bare_engine(&[]);
        let before = engine.density_matrix().unwrap().clone();
        assert!(matches!(
            engine.apply_gate(2, &gates::pauli_x()),
            Err(Error::InvalidRegister(RegisterError::QubitOutOfRange { qubit: 2, num_qubits: 2 }))
        ));
        assert!(matches!(engine.apply_gate(0, &gates::cnot()), Err(Error::InvalidArgument(_))));
        assert!(matches!(
            engine.apply_gate_2q(1, 1, &gates::cnot()),
            Err(Error::InvalidRegister(RegisterError::DuplicateQubit(1)))
        ));
        assert_eq!(engine.density_matrix().unwrap(), &before);
    }

    #[test]
    fn test_pauli_x_flips_axis() {
        let mut engine = bare_engine(&[]);
        engine.apply_gate(1, &gates::pauli_x()).unwrap();
        assert_relative_eq!(engine.get_population("🐺").unwrap(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(engine.get_population("🌾").unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_project_returns_prior_probability() {
        let mut engine = bare_engine(&[]);
        engine.apply_gate(0, &gates::hadamard()).unwrap();
        let p = engine.project_qubit(0, 1).unwrap();
        assert_relative_eq!(p, 0.5, epsilon = 1e-12);
        assert_relative_eq!(engine.get_population("🍂").unwrap(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(engine.get_purity().unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_project_zero_probability_fails_without_mutation() {
        let mut engine = bare_engine(&[]);
        let before = engine.density_matrix().unwrap().clone();
        assert!(matches!(
            engine.project_qubit(0, 1),
            Err(Error::ZeroProbability { qubit: 0, outcome: 1 })
        ));
        assert!(matches!(engine.project_qubit(0, 2), Err(Error::InvalidArgument(_))));
        assert_eq!(engine.density_matrix().unwrap(), &before);
    }

    #[test]
    fn test_measure_is_repeatable() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut engine = bare_engine(&[]);
        engine.entangle(0, 1).unwrap();
        let first = engine.measure_qubit(0, &mut rng).unwrap();
        // Bell correlations: the partner qubit now agrees deterministically
        let partner = engine.measure_qubit(1, &mut rng).unwrap();
        assert_eq!(first, partner);
        for _ in 0..10 {
            assert_eq!(engine.measure_qubit(0, &mut rng).unwrap(), first);
        }
    }

    #[test]
    fn test_measure_certain_outcome() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut engine = bare_engine(&[]);
        for _ in 0..20 {
            assert_eq!(engine.measure_qubit(1, &mut rng).unwrap(), 0);
        }
    }

    #[test]
    fn test_entangle_makes_bell_pair() {
        let mut engine = bare_engine(&[]);
        engine.entangle(0, 1).unwrap();
        assert_relative_eq!(engine.mutual_information(0, 1).unwrap(), 2.0, epsilon = 1e-8);
        let summary = engine.correlation_summary().unwrap();
        assert_eq!(summary[0].level, CorrelationLevel::Strong);
        assert_relative_eq!(engine.get_coherence("🌾", "🐺").unwrap(), 0.5, epsilon = 1e-12);
        let [x, y, z] = engine.bloch_vector(0).unwrap();
        assert_relative_eq!(x * x + y * y + z * z, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_unknown_label_is_register_error() {
        let engine = bare_engine(&[]);
        assert!(matches!(
            engine.get_population("🦊"),
            Err(Error::InvalidRegister(RegisterError::UnknownLabel(_)))
        ));
    }

    #[test]
    fn test_weight_map_sums_to_one() {
        let mut engine = coupled_engine();
        engine.evolve(0.5).unwrap();
        let weights = engine.weight_map().unwrap();
        assert_eq!(weights.len(), 4);
        assert!(weights.values().all(|&w| w >= 0.0));
        assert_relative_eq!(weights.values().sum::<f64>(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_unloaded_engine_rejects_everything() {
        let mut engine = coupled_engine();
        engine.unload();
        assert!(engine.is_unloaded());
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        assert!(matches!(engine.evolve(0.1), Err(Error::Unloaded(_))));
        assert!(matches!(engine.apply_gate(0, &gates::hadamard()), Err(Error::Unloaded(_))));
        assert!(matches!(engine.project_qubit(0, 0), Err(Error::Unloaded(_))));
        assert!(matches!(engine.measure_qubit(0, &mut rng), Err(Error::Unloaded(_))));
        assert!(matches!(engine.entangle(0, 1), Err(Error::Unloaded(_))));
        assert!(matches!(engine.get_purity(), Err(Error::Unloaded(_))));
        assert!(matches!(engine.weight_map(), Err(Error::Unloaded(_))));
        assert!(matches!(
            engine.replace_hamiltonian(HamiltonianModel::zero(2)),
            Err(Error::Unloaded(_))
        ));
    }

    #[test]
    fn test_replace_hamiltonian_checks() {
        let mut engine = bare_engine(&[ChannelSpec::drain("🌾", "🍂", 0.5)]);
        assert!(matches!(
            engine.replace_hamiltonian(HamiltonianModel::zero(3)),
            Err(Error::Build(BuildError::DimensionMismatch { .. }))
        ));
        let before = engine.density_matrix().unwrap().clone();
        engine.replace_hamiltonian(HamiltonianModel::zero(2)).unwrap();
        assert_eq!(engine.density_matrix().unwrap(), &before);
        assert_eq!(engine.operators().len(), 1);
    }

    #[test]
    fn test_restore_density_normalizes() {
        let mut engine = bare_engine(&[]);
        let mut rho = Array2::zeros((4, 4));
        rho[[3, 3]] = Complex64::new(2.0, 0.0);
        engine.restore_density(rho, 4.5).unwrap();
        assert_relative_eq!(engine.get_population("🐺").unwrap(), 1.0, epsilon = 1e-12);
        assert_eq!(engine.time(), 4.5);

        let bad = Array2::zeros((2, 2));
        assert!(matches!(engine.restore_density(bad, 0.0), Err(Error::Validation(_))));
    }
}
