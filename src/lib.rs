// Copyright 2026 BiomeQuantum Contributors
// SPDX-License-Identifier: Apache-2.0

//! BiomeQuantum simulation core
//!
//! Simulates many independent open quantum systems ("biomes"). Each biome is
//! a small multi-qubit register whose density matrix evolves under a Lindblad
//! master equation with a faction-derived Hamiltonian and declaratively
//! specified jump operators.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │          BatchEvolutionEngine                │
//! │   packed kernel  │  scalar fallback          │
//! ├──────────────────┴──────────────────────────┤
//! │     QuantumEngine (ρ, evolve, gates, obs)    │
//! ├──────────────────────┬──────────────────────┤
//! │  HamiltonianBuilder  │  LindbladBuilder     │
//! │  (icons, drivers)    │  (pump/drain/gated)  │
//! ├──────────────────────┴──────────────────────┤
//! │        RegisterMap  ·  linalg                │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`register`]: label ↔ qubit mapping
//! - [`icon`]: faction records, standings and icon construction
//! - [`hamiltonian`]: H(t) assembly
//! - [`lindblad`]: jump operators, dissipator and the sub-stepped integrator
//! - [`engine`]: per-biome state, gates, measurement and observables
//! - [`biome`]: biome assembly against an injected context
//! - [`batch`]: multi-biome lookahead
//! - [`persistence`]: ρ snapshots
//! - [`config`]: configuration management
//! - [`validation`]: input validation utilities
//! - [`error`]: error types

pub mod batch;
pub mod biome;
pub mod config;
pub mod engine;
pub mod error;
pub mod hamiltonian;
pub mod icon;
pub mod linalg;
pub mod lindblad;
pub mod persistence;
pub mod register;
pub mod validation;

pub use batch::{BatchEvolutionEngine, BiomeTrajectory};
pub use biome::{BiomeBuilder, BiomeDefinition, BuiltBiome, SimulationContext};
pub use config::Config;
pub use engine::{EngineSettings, QuantumEngine};
pub use error::{Error, Result};
pub use register::RegisterMap;

#[cfg(test)]
pub mod test_utils;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Python extension module entry point.
#[cfg(feature = "python")]
#[pyo3::pymodule]
fn biome_quantum(m: &pyo3::Bound<'_, pyo3::types::PyModule>) -> pyo3::PyResult<()> {
    use pyo3::types::PyModuleMethods;
    m.add("__version__", VERSION)?;
    batch::pyo3_bindings::python::register_batch_module(m)
}
