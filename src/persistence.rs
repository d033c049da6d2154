// Copyright 2026 BiomeQuantum Contributors
// SPDX-License-Identifier: Apache-2.0

//! Density-matrix snapshots.
//!
//! A snapshot stores ρ row-major as `[re, im]` pairs together with the
//! biome name and simulation time. Restoring validates the dimension, then
//! Hermitizes and renormalizes before the state is installed.

use std::path::Path;

use ndarray::Array2;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::engine::QuantumEngine;
use crate::error::{Result, ValidationError};

/// Serialized ρ of one biome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DensitySnapshot {
    pub biome: String,
    pub dim: usize,
    pub time: f64,
    pub entries: Vec<[f64; 2]>,
}

impl DensitySnapshot {
    /// Snapshot the engine's current state.
    pub fn capture(engine: &QuantumEngine) -> Result<Self> {
        let rho = engine.density_matrix()?;
        Ok(Self {
            biome: engine.biome().to_string(),
            dim: rho.nrows(),
            time: engine.time(),
            entries: rho.iter().map(|z| [z.re, z.im]).collect(),
        })
    }

    /// Rebuild the dim × dim matrix.
    pub fn to_matrix(&self) -> Result<Array2<Complex64>> {
        let expected = self.dim * self.dim;
        if self.entries.len() != expected {
            return Err(ValidationError::Field {
                field: "entries".into(),
                message: format!(
                    "{} entries do not fill a {} × {} matrix",
                    self.entries.len(),
                    self.dim,
                    self.dim
                ),
            }
            .into());
        }
        let entries = self.entries.iter().map(|&[re, im]| Complex64::new(re, im)).collect();
        Array2::from_shape_vec((self.dim, self.dim), entries).map_err(|e| {
            ValidationError::Field {
                field: "entries".into(),
                message: e.to_string(),
            }
            .into()
        })
    }

    /// Install this snapshot into `engine`.
    pub fn restore(&self, engine: &mut QuantumEngine) -> Result<()> {
        if self.biome != engine.biome() {
            warn!(
                snapshot = %self.biome,
                biome = %engine.biome(),
                "Restoring snapshot taken from a different biome"
            );
        }
        engine.restore_density(self.to_matrix()?, self.time)?;
        debug!(biome = %engine.biome(), time = self.time, "Restored density matrix");
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}
