// Copyright 2026 BiomeQuantum Contributors
// SPDX-License-Identifier: Apache-2.0

//! Configuration management for the simulation core.
//!
//! Configuration is loaded from multiple sources with the following priority
//! (later sources override earlier ones):
//!
//! 1. Built-in defaults
//! 2. quantum.yaml file
//! 3. Environment variables (BIOME_QUANTUM_*)
//! 4. CLI arguments

use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

use crate::error::{Error, Result};

/// Largest register the dense engine accepts regardless of configuration.
pub const MAX_SUPPORTED_QUBITS: usize = 10;

/// Main configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Integrator settings
    #[serde(default)]
    pub evolution: EvolutionConfig,

    /// Batch engine settings
    #[serde(default)]
    pub batch: BatchConfig,

    /// Resource limits
    #[serde(default)]
    pub limits: ResourceLimits,

    /// Observable derivation settings
    #[serde(default)]
    pub observables: ObservablesConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from file and environment.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut config = Config::default();

        if let Some(path) = config_path {
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                config = serde_yaml::from_str(&content)?;
            }
        } else {
            for path in &["quantum.yaml", "quantum.yml"] {
                let path = Path::new(path);
                if path.exists() {
                    let content = std::fs::read_to_string(path)?;
                    config = serde_yaml::from_str(&content)?;
                    break;
                }
            }
        }

        config.apply_env_overrides();

        Ok(config)
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = env::var("BIOME_QUANTUM_MAX_DT") {
            if let Ok(max_dt) = val.parse() {
                self.evolution.max_dt = max_dt;
            }
        }
        if let Ok(val) = env::var("BIOME_QUANTUM_DRIFT_TOLERANCE") {
            if let Ok(tol) = val.parse() {
                self.evolution.drift_tolerance = tol;
            }
        }
        if let Ok(val) = env::var("BIOME_QUANTUM_LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = env::var("BIOME_QUANTUM_PREFER_NATIVE") {
            self.batch.prefer_native = val.to_lowercase() == "true" || val == "1";
        }
        if let Ok(val) = env::var("BIOME_QUANTUM_MAX_QUBITS") {
            if let Ok(n) = val.parse() {
                self.limits.max_qubits = n;
            }
        }
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<()> {
        let evo = &self.evolution;
        if !evo.max_dt.is_finite() || evo.max_dt <= 0.0 {
            return Err(Error::Config(format!(
                "evolution.max_dt must be finite and positive, got {}",
                evo.max_dt
            )));
        }
        if !evo.drift_tolerance.is_finite() || evo.drift_tolerance <= 0.0 {
            return Err(Error::Config(format!(
                "evolution.drift_tolerance must be finite and positive, got {}",
                evo.drift_tolerance
            )));
        }
        if self.limits.max_qubits == 0 || self.limits.max_qubits > MAX_SUPPORTED_QUBITS {
            return Err(Error::Config(format!(
                "limits.max_qubits must be in 1..={}, got {}",
                MAX_SUPPORTED_QUBITS, self.limits.max_qubits
            )));
        }
        if self.limits.max_substeps_per_call == 0 {
            return Err(Error::Config("limits.max_substeps_per_call cannot be 0".into()));
        }
        if self.batch.lookahead_steps == 0 {
            return Err(Error::Config("batch.lookahead_steps cannot be 0".into()));
        }
        if self.batch.lookahead_steps > self.limits.max_lookahead_steps {
            return Err(Error::Config(format!(
                "batch.lookahead_steps ({}) exceeds limits.max_lookahead_steps ({})",
                self.batch.lookahead_steps, self.limits.max_lookahead_steps
            )));
        }
        let obs = &self.observables;
        if !obs.coherence_weight.is_finite() || obs.coherence_weight < 0.0 {
            return Err(Error::Config(format!(
                "observables.coherence_weight must be finite and non-negative, got {}",
                obs.coherence_weight
            )));
        }
        let c = &obs.correlation;
        let ordered = 0.0 <= c.weak && c.weak <= c.moderate && c.moderate <= c.strong;
        if !ordered || !c.strong.is_finite() {
            return Err(Error::Config(
                "correlation thresholds must satisfy 0 ≤ weak ≤ moderate ≤ strong".into(),
            ));
        }
        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(Error::Config(format!(
                "logging.format must be 'pretty' or 'json', got '{}'",
                self.logging.format
            )));
        }
        Ok(())
    }
}

/// Initial density matrix of a freshly built biome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitialState {
    /// Pure basis state |index⟩ (0 is every qubit at its north pole)
    Basis(usize),
    /// |+⟩^⊗n, equal amplitude on every basis state
    Uniform,
}

impl Default for InitialState {
    fn default() -> Self {
        InitialState::Basis(0)
    }
}

/// Integrator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvolutionConfig {
    /// Largest sub-step in simulation seconds
    #[serde(default = "default_max_dt")]
    pub max_dt: f64,

    /// Tolerated |Tr ρ − 1| and Hermiticity error after stabilization
    #[serde(default = "default_drift_tolerance")]
    pub drift_tolerance: f64,

    /// Initial state of new biomes
    #[serde(default)]
    pub initial_state: InitialState,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            max_dt: default_max_dt(),
            drift_tolerance: default_drift_tolerance(),
            initial_state: InitialState::default(),
        }
    }
}

fn default_max_dt() -> f64 {
    0.02
}

fn default_drift_tolerance() -> f64 {
    1e-6
}

/// Batch engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Use the packed kernel when it is compiled in
    #[serde(default = "default_true")]
    pub prefer_native: bool,

    /// Default number of lookahead steps
    #[serde(default = "default_lookahead_steps")]
    pub lookahead_steps: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            prefer_native: true,
            lookahead_steps: default_lookahead_steps(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_lookahead_steps() -> usize {
    5
}

/// Resource limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceLimits {
    /// Maximum qubits per biome
    #[serde(default = "default_max_qubits")]
    pub max_qubits: usize,

    /// Maximum steps per lookahead call
    #[serde(default = "default_max_lookahead_steps")]
    pub max_lookahead_steps: usize,

    /// Maximum biomes per batch call
    #[serde(default = "default_max_batch_biomes")]
    pub max_batch_biomes: usize,

    /// Maximum integrator sub-steps for a single tick
    #[serde(default = "default_max_substeps_per_call")]
    pub max_substeps_per_call: usize,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            max_qubits: default_max_qubits(),
            max_lookahead_steps: default_max_lookahead_steps(),
            max_batch_biomes: default_max_batch_biomes(),
            max_substeps_per_call: default_max_substeps_per_call(),
        }
    }
}

fn default_max_qubits() -> usize {
    6
}

fn default_max_lookahead_steps() -> usize {
    1_000
}

fn default_max_batch_biomes() -> usize {
    256
}

fn default_max_substeps_per_call() -> usize {
    1_000_000
}

/// Observable derivation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservablesConfig {
    /// Weight of an axis' coherence in the gameplay weight map
    #[serde(default = "default_coherence_weight")]
    pub coherence_weight: f64,

    /// Mutual-information thresholds (bits) for correlation levels
    #[serde(default)]
    pub correlation: CorrelationThresholds,
}

impl Default for ObservablesConfig {
    fn default() -> Self {
        Self {
            coherence_weight: default_coherence_weight(),
            correlation: CorrelationThresholds::default(),
        }
    }
}

fn default_coherence_weight() -> f64 {
    0.5
}

/// Lower bounds, in bits of mutual information, of each correlation level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorrelationThresholds {
    #[serde(default = "default_weak")]
    pub weak: f64,
    #[serde(default = "default_moderate")]
    pub moderate: f64,
    #[serde(default = "default_strong")]
    pub strong: f64,
}

impl Default for CorrelationThresholds {
    fn default() -> Self {
        Self {
            weak: default_weak(),
            moderate: default_moderate(),
            strong: default_strong(),
        }
    }
}

fn default_weak() -> f64 {
    0.05
}

fn default_moderate() -> f64 {
    0.3
}

fn default_strong() -> f64 {
    1.0
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (json, pretty)
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "pretty".into()
}
