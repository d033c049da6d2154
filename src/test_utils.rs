// Copyright 2026 BiomeQuantum Contributors
// SPDX-License-Identifier: Apache-2.0

//! Shared fixtures for the in-crate test suites.

use std::collections::BTreeMap;
use std::sync::Arc;

use num_complex::Complex64;

use crate::biome::{BiomeBuilder, SimulationContext};
use crate::engine::{EngineSettings, QuantumEngine};
use crate::hamiltonian::HamiltonianModel;
use crate::icon::{Driver, FactionCatalog, FactionRecord, FactionStandings};
use crate::lindblad::{ChannelSpec, LindbladBuilder, LindbladSpec};
use crate::register::RegisterMap;

/// Two axes: grain (🌾 north, 🍂 south) and prey (🐇 north, 🐺 south).
pub const MEADOW_PAIRS: &[(&str, &str)] = &[("🌾", "🍂"), ("🐇", "🐺")];

pub fn two_axis_register() -> RegisterMap {
    RegisterMap::from_pairs(MEADOW_PAIRS).expect("fixture register is valid")
}

fn record(faction: &str, label: &str, self_energy: f64) -> FactionRecord {
    FactionRecord {
        faction: faction.into(),
        label: label.into(),
        self_energy,
        couplings: BTreeMap::new(),
        weight: 1.0,
        driver: None,
    }
}

/// Farmers favour grain, wolves favour predators; one driven record.
pub fn sample_catalog() -> FactionCatalog {
    let mut farmers = record("farmers", "🌾", 0.4);
    farmers.couplings.insert("🍂".into(), Complex64::new(0.15, 0.0));

    let mut wolves = record("wolves", "🐺", 0.3);
    wolves.couplings.insert("🌾".into(), Complex64::new(0.05, 0.02));

    let mut tides = record("tides", "🐇", 0.1);
    tides.driver = Some(Driver::Sinusoidal {
        frequency: 0.5,
        amplitude: 0.2,
        phase: 0.0,
    });

    FactionCatalog::new(vec![farmers, wolves, tides, record("wolves", "🍂", -0.2)])
}

/// One channel of each kind.
pub fn sample_lindblad() -> LindbladSpec {
    LindbladSpec::new()
        .with(ChannelSpec::pump("🌾", 0.05))
        .with(ChannelSpec::drain("🐇", "🐺", 0.1))
        .with(ChannelSpec::gated("🌾", "🍂", 0.2, "🐺").with_threshold(0.1))
}

pub fn test_context() -> Arc<SimulationContext> {
    Arc::new(SimulationContext {
        factions: sample_catalog(),
        ..SimulationContext::default()
    })
}

/// Engine on [`two_axis_register`] with H = 0 and the given channels.
pub fn bare_engine(channels: &[ChannelSpec]) -> QuantumEngine {
    let register = two_axis_register();
    let spec = LindbladSpec {
        channels: channels.to_vec(),
    };
    let build = LindbladBuilder::build(&spec, &register);
    QuantumEngine::new(
        "meadow",
        register,
        HamiltonianModel::zero(2),
        build.operators,
        EngineSettings::default(),
    )
    .expect("fixture engine is valid")
}

/// The sample meadow: catalog Hamiltonian plus [`sample_lindblad`].
pub fn coupled_engine() -> QuantumEngine {
    BiomeBuilder::new(test_context())
        .build_biome_quantum_system("meadow", MEADOW_PAIRS, &FactionStandings::new(), &sample_lindblad())
        .expect("fixture biome is valid")
        .engine
}
