// Copyright 2026 BiomeQuantum Contributors
// SPDX-License-Identifier: Apache-2.0

//! Biome assembly.
//!
//! A [`BiomeBuilder`] turns a list of emoji axes, the current faction
//! standings and a [`LindbladSpec`] into a ready [`QuantumEngine`]. The
//! simulation-wide inputs (engine settings, faction catalog, resource
//! limits) arrive through an injected [`SimulationContext`].
//!
//! Boot builds and standings rebuilds share [`build_icons`] and
//! [`HamiltonianBuilder::build`], so a rebuild with unchanged standings
//! reproduces the boot Hamiltonian exactly.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{Config, ResourceLimits, MAX_SUPPORTED_QUBITS};
use crate::engine::{EngineSettings, QuantumEngine};
use crate::error::{BuildError, Result};
use crate::hamiltonian::HamiltonianBuilder;
use crate::icon::{build_icons, FactionCatalog, FactionStandings, Icon};
use crate::lindblad::{ChannelWarning, LindbladBuilder, LindbladSpec};
use crate::register::RegisterMap;

/// Shared, read-only inputs of every biome build.
#[derive(Debug, Clone, Default)]
pub struct SimulationContext {
    pub settings: EngineSettings,
    pub factions: FactionCatalog,
    pub limits: ResourceLimits,
}

impl SimulationContext {
    pub fn new(settings: EngineSettings, factions: FactionCatalog, limits: ResourceLimits) -> Self {
        Self {
            settings,
            factions,
            limits,
        }
    }

    /// Context from a loaded configuration and faction catalog.
    pub fn from_config(config: &Config, factions: FactionCatalog) -> Self {
        Self::new(EngineSettings::from(config), factions, config.limits.clone())
    }
}

/// Serialized biome description.
///
/// ```yaml
/// name: meadow
/// emoji_pairs:
///   - ["🌾", "🍂"]
///   - ["🐇", "🐺"]
/// lindblad:
///   channels:
///     - { kind: pump, target: "🌾", rate: 0.05 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiomeDefinition {
    pub name: String,
    pub emoji_pairs: Vec<(String, String)>,
    #[serde(default)]
    pub lindblad: LindbladSpec,
}

impl BiomeDefinition {
    /// Load a definition from YAML (or JSON).
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&content)?)
    }
}

/// Result of a successful biome build.
#[derive(Debug, Clone)]
pub struct BuiltBiome {
    pub engine: QuantumEngine,
    /// Icons the Hamiltonian was assembled from, for inspection only
    pub icons: Vec<Icon>,
    /// Lindblad channels that were skipped
    pub warnings: Vec<ChannelWarning>,
}

/// Builds biomes against an injected [`SimulationContext`].
#[derive(Debug, Clone)]
pub struct BiomeBuilder {
    context: Arc<SimulationContext>,
}

impl BiomeBuilder {
    pub fn new(context: Arc<SimulationContext>) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &SimulationContext {
        &self.context
    }

    /// Build a complete biome.
    ///
    /// Fails with [`BuildError::EmptyRegister`] for an empty pair list and
    /// [`BuildError::TooManyQubits`] above `limits.max_qubits`. Skipped
    /// Lindblad channels do not fail the build.
    pub fn build_biome_quantum_system<S: AsRef<str>>(
        &self,
        name: &str,
        emoji_pairs: &[(S, S)],
        standings: &FactionStandings,
        lindblad: &LindbladSpec,
    ) -> Result<BuiltBiome> {
        if emoji_pairs.is_empty() {
            return Err(BuildError::EmptyRegister.into());
        }
        let limit = self.context.limits.max_qubits.min(MAX_SUPPORTED_QUBITS);
        if emoji_pairs.len() > limit {
            return Err(BuildError::TooManyQubits {
                requested: emoji_pairs.len(),
                limit,
            }
            .into());
        }

        let register = RegisterMap::from_pairs(emoji_pairs)?;
        let icons = self.rebuild_icons_for_standings(&register, standings)?;
        let hamiltonian = HamiltonianBuilder::build(&icons, &register)?;
        let lindblad = LindbladBuilder::build(lindblad, &register);

        info!(
            biome = %name,
            qubits = register.num_qubits(),
            operators = lindblad.operators.len(),
            skipped_channels = lindblad.warnings.len(),
            driven = hamiltonian.is_time_dependent(),
            "Built biome"
        );

        let engine = QuantumEngine::new(
            name,
            register,
            hamiltonian,
            lindblad.operators,
            self.context.settings.clone(),
        )?;

        Ok(BuiltBiome {
            engine,
            icons,
            warnings: lindblad.warnings,
        })
    }

    /// Build from a deserialized [`BiomeDefinition`].
    pub fn build_from_definition(
        &self,
        definition: &BiomeDefinition,
        standings: &FactionStandings,
    ) -> Result<BuiltBiome> {
        self.build_biome_quantum_system(
            &definition.name,
            &definition.emoji_pairs,
            standings,
            &definition.lindblad,
        )
    }

    /// Icons for `register` under `standings`.
    pub fn rebuild_icons_for_standings(
        &self,
        register: &RegisterMap,
        standings: &FactionStandings,
    ) -> Result<Vec<Icon>> {
        Ok(build_icons(&self.context.factions, register, standings)?)
    }

    /// Recompute icons and H for new standings and swap H into `engine`.
    ///
    /// ρ and the jump operators are left untouched. On failure the engine
    /// keeps its previous Hamiltonian.
    pub fn rebuild_hamiltonian(
        &self,
        engine: &mut QuantumEngine,
        standings: &FactionStandings,
    ) -> Result<Vec<Icon>> {
        let icons = self.rebuild_icons_for_standings(engine.register(), standings)?;
        let model = HamiltonianBuilder::build(&icons, engine.register())?;
        engine.replace_hamiltonian(model)?;
        debug!(biome = %engine.biome(), icons = icons.len(), "Rebuilt Hamiltonian for standings");
        Ok(icons)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::linalg::{hermiticity_error, trace_real};
    use crate::lindblad::ChannelSpec;
    use crate::test_utils::{sample_catalog, sample_lindblad, test_context, MEADOW_PAIRS};
    use approx::assert_relative_eq;

    fn builder() -> BiomeBuilder {
        BiomeBuilder::new(test_context())
    }

    #[test]
    fn test_build_sample_biome() {
        let built = builder()
            .build_biome_quantum_system("meadow", MEADOW_PAIRS, &FactionStandings::new(), &sample_lindblad())
            .unwrap();
        assert_eq!(built.engine.num_qubits(), 2);
        assert_eq!(built.icons.len(), 4);
        assert_eq!(built.engine.operators().len(), 3);
        assert!(built.warnings.is_empty());
        assert_eq!(hermiticity_error(built.engine.hamiltonian().static_part()), 0.0);
    }

    #[test]
    fn test_empty_pairs_rejected() {
        let pairs: [(&str, &str); 0] = [];
        let result = builder().build_biome_quantum_system(
            "void",
            &pairs,
            &FactionStandings::new(),
            &LindbladSpec::new(),
        );
        assert!(matches!(result, Err(Error::Build(BuildError::EmptyRegister))));
    }

    #[test]
    fn test_too_many_qubits_rejected() {
        let context = SimulationContext {
            limits: ResourceLimits {
                max_qubits: 1,
                ..ResourceLimits::default()
            },
            ..SimulationContext::default()
        };
        let result = BiomeBuilder::new(Arc::new(context)).build_biome_quantum_system(
            "meadow",
            MEADOW_PAIRS,
            &FactionStandings::new(),
            &LindbladSpec::new(),
        );
        assert!(matches!(
            result,
            Err(Error::Build(BuildError::TooManyQubits { requested: 2, limit: 1 }))
        ));
    }

    #[test]
    fn test_duplicate_label_rejected() {
        let result = builder().build_biome_quantum_system(
            "meadow",
            &[("🌾", "🍂"), ("🍂", "🐺")],
            &FactionStandings::new(),
            &LindbladSpec::new(),
        );
        assert!(matches!(result, Err(Error::Build(BuildError::DuplicateLabel(_)))));
    }

    #[test]
    fn test_skipped_channels_are_reported() {
        let spec = sample_lindblad().with(ChannelSpec::drain("🦊", "🌾", 0.1));
        let built = builder()
            .build_biome_quantum_system("meadow", MEADOW_PAIRS, &FactionStandings::new(), &spec)
            .unwrap();
        assert_eq!(built.engine.operators().len(), 3);
        assert_eq!(built.warnings.len(), 1);
        assert_eq!(built.warnings[0].index, 3);
    }

    #[test]
    fn test_rebuild_keeps_operators_and_state() {
        let b = builder();
        let mut built = b
            .build_biome_quantum_system("meadow", MEADOW_PAIRS, &FactionStandings::new(), &sample_lindblad())
            .unwrap();
        built.engine.evolve(0.3).unwrap();
        let ops_before = built.engine.operators().to_vec();
        let rho_before = built.engine.density_matrix().unwrap().clone();
        let h_before = built.engine.hamiltonian().clone();

        let standings = FactionStandings::new().with("farmers", 3.0).with("wolves", 0.2);
        let icons = b.rebuild_hamiltonian(&mut built.engine, &standings).unwrap();

        assert_eq!(icons.len(), 4);
        assert_eq!(built.engine.operators(), ops_before.as_slice());
        assert_eq!(built.engine.density_matrix().unwrap(), &rho_before);
        assert_ne!(built.engine.hamiltonian(), &h_before);
        assert_eq!(hermiticity_error(built.engine.hamiltonian().static_part()), 0.0);
    }

    #[test]
    fn test_rebuild_with_same_standings_matches_boot() {
        let b = builder();
        let standings = FactionStandings::new().with("farmers", 1.7);
        let mut built = b
            .build_biome_quantum_system("meadow", MEADOW_PAIRS, &standings, &sample_lindblad())
            .unwrap();
        let boot = built.engine.hamiltonian().clone();
        let icons = b.rebuild_hamiltonian(&mut built.engine, &standings).unwrap();
        assert_eq!(built.engine.hamiltonian(), &boot);
        assert_eq!(icons, built.icons);
    }

    #[test]
    fn test_failed_rebuild_keeps_hamiltonian() {
        let b = builder();
        let mut built = b
            .build_biome_quantum_system("meadow", MEADOW_PAIRS, &FactionStandings::new(), &sample_lindblad())
            .unwrap();
        let before = built.engine.hamiltonian().clone();
        let standings = FactionStandings::new().with("farmers", f64::NAN);
        assert!(b.rebuild_hamiltonian(&mut built.engine, &standings).is_err());
        assert_eq!(built.engine.hamiltonian(), &before);
    }

    #[test]
    fn test_drain_matches_exponential_decay() {
        let gamma = 0.5;
        let context = SimulationContext {
            settings: EngineSettings {
                max_dt: 1e-3,
                ..EngineSettings::default()
            },
            ..SimulationContext::default()
        };
        let spec = LindbladSpec::new().with(ChannelSpec::drain("🌾", "🍂", gamma));
        let mut built = BiomeBuilder::new(Arc::new(context))
            .build_biome_quantum_system("field", &[("🌾", "🍂")], &FactionStandings::new(), &spec)
            .unwrap();

        for step in 1..=10 {
            built.engine.evolve(0.1).unwrap();
            let t = 0.1 * step as f64;
            let p = built.engine.get_population("🌾").unwrap();
            assert_relative_eq!(p, (-gamma * t).exp(), epsilon = 1e-3);
        }
    }

    #[test]
    fn test_evolution_preserves_trace_and_hermiticity() {
        let mut built = builder()
            .build_biome_quantum_system("meadow", MEADOW_PAIRS, &FactionStandings::new(), &sample_lindblad())
            .unwrap();
        for _ in 0..25 {
            built.engine.evolve(0.2).unwrap();
            let rho = built.engine.density_matrix().unwrap();
            assert_relative_eq!(trace_real(rho), 1.0, epsilon = 1e-12);
            assert!(hermiticity_error(rho) < 1e-12);
        }
        assert_eq!(built.engine.drift_fault_count(), 0);
    }

    #[test]
    fn test_build_from_yaml_definition() {
        let yaml = r#"
name: meadow
emoji_pairs:
  - ["🌾", "🍂"]
  - ["🐇", "🐺"]
lindblad:
  channels:
    - { kind: pump, target: "🌾", rate: 0.05 }
    - { kind: gated, source: "🐇", target: "🐺", rate: 0.2, gate_label: "🌾", threshold: 0.3 }
"#;
        let definition: BiomeDefinition = serde_yaml::from_str(yaml).unwrap();
        let context = SimulationContext {
            factions: sample_catalog(),
            ..SimulationContext::default()
        };
        let built = BiomeBuilder::new(Arc::new(context))
            .build_from_definition(&definition, &FactionStandings::new())
            .unwrap();
        assert_eq!(built.engine.biome(), "meadow");
        assert_eq!(built.engine.operators().len(), 2);
        assert!(built.engine.operators()[1].gate.is_some());
    }

    #[test]
    fn test_demo_files_build() {
        let demos = Path::new(env!("CARGO_MANIFEST_DIR")).join("demos");
        let config = Config::load(Some(&demos.join("quantum.yaml"))).unwrap();
        config.validate().unwrap();
        let factions = FactionCatalog::load(&demos.join("factions.yaml")).unwrap();
        let standings = FactionStandings::load(&demos.join("standings.yaml")).unwrap();
        let builder = BiomeBuilder::new(Arc::new(SimulationContext::from_config(&config, factions)));

        for name in ["meadow.yaml", "marsh.yaml"] {
            let definition = BiomeDefinition::load(&demos.join(name)).unwrap();
            let mut built = builder.build_from_definition(&definition, &standings).unwrap();
            assert!(built.warnings.is_empty(), "{name}: {:?}", built.warnings);
            built.engine.evolve(0.5).unwrap();
            assert_relative_eq!(trace_real(built.engine.density_matrix().unwrap()), 1.0, epsilon = 1e-12);
        }
    }
}
