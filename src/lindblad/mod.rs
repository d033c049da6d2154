// Copyright 2026 BiomeQuantum Contributors
// SPDX-License-Identifier: Apache-2.0

//! Dissipative dynamics for biome registers.
//!
//! Implements the Gorini–Kossakowski–Sudarshan–Lindblad (GKSL) master equation:
//!
//!   dρ/dt = -i[H(t), ρ] + Σ_k γ_k(ρ) (L_k ρ L_k† − ½{L_k†L_k, ρ})
//!
//! This module provides:
//! - [`LindbladSpec`]: declarative pump, drain and gated channels
//! - [`LindbladBuilder`]: compiles a spec into [`JumpOperator`]s on a register
//! - A sub-stepped explicit Euler integrator with Hermitize/renormalize
//!   stabilization and drift reporting
//!
//! Gated channels scale their rate by the live population of a gate label,
//! re-read at the start of every sub-step. This makes the generator
//! state-dependent, so the scheme is a first-order approximation of the
//! exact nonlinear dynamics.
//!
//! # Example
//!
//! ```ignore
//! use biome_quantum::lindblad::{ChannelSpec, LindbladBuilder, LindbladSpec};
//! use biome_quantum::register::RegisterMap;
//!
//! let register = RegisterMap::from_pairs(&[("🌾", "🍂"), ("🐇", "🐺")])?;
//! let spec = LindbladSpec::new()
//!     .with(ChannelSpec::pump("🌾", 0.05))
//!     .with(ChannelSpec::gated("🐇", "🐺", 0.2, "🌾").with_threshold(0.3));
//! let build = LindbladBuilder::build(&spec, &register);
//! assert!(build.warnings.is_empty());
//! ```
//!
//! # References
//!
//! - Lindblad, G. (1976). Commun. Math. Phys. 48, 119.
//!   DOI: 10.1007/BF01608499
//! - Breuer, H.-P. & Petruccione, F. (2002). "The Theory of Open Quantum Systems." Oxford.

pub mod builder;
pub mod dissipator;
pub mod integrate;
pub mod types;

pub use builder::LindbladBuilder;
pub use integrate::{
    check_stability, evolve_density, substep_schedule, DriftFault, IntegrationReport, StepControl,
};
pub use types::{ChannelKind, ChannelSpec, ChannelWarning, Gate, JumpOperator, LindbladBuild, LindbladSpec};
