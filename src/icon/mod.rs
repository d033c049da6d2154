// Copyright 2026 BiomeQuantum Contributors
// SPDX-License-Identifier: Apache-2.0

//! Icons: per-label Hamiltonian parameters assembled from faction data.
//!
//! An [`Icon`] holds only reversible physics (self-energy, couplings and an
//! optional driver). Dissipation lives in [`crate::lindblad`] and is never
//! derived from faction data.
//!
//! Each faction contributes [`FactionRecord`]s. The effective weight of a
//! record is `record.weight × standing(faction)`; the icon for a label is
//! the weighted sum of every record naming that label.

pub mod driver;

use std::collections::BTreeMap;
use std::path::Path;

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::error::{BuildError, Result};
use crate::register::RegisterMap;

pub use driver::{CachedDriver, Driver};

/// Standing of a faction absent from [`FactionStandings`].
pub const NEUTRAL_STANDING: f64 = 1.0;

/// One faction's contribution to one label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactionRecord {
    /// Contributing faction
    pub faction: String,
    /// Label the contribution applies to
    pub label: String,
    /// Self-energy contribution
    pub self_energy: f64,
    /// Coupling amplitudes to other labels, serialized as `[re, im]`
    #[serde(default)]
    pub couplings: BTreeMap<String, Complex64>,
    /// Relative weight of this record (≥ 0)
    #[serde(default = "default_weight")]
    pub weight: f64,
    /// Optional time-dependent driver
    #[serde(default)]
    pub driver: Option<Driver>,
}

fn default_weight() -> f64 {
    1.0
}

impl FactionRecord {
    /// Check the record's numeric fields.
    pub fn validate(&self) -> std::result::Result<(), BuildError> {
        let malformed = |message: String| BuildError::MalformedIcon {
            label: self.label.clone(),
            message,
        };
        if !self.self_energy.is_finite() {
            return Err(malformed(format!(
                "faction '{}' gives a non-finite self_energy",
                self.faction
            )));
        }
        if !self.weight.is_finite() || self.weight < 0.0 {
            return Err(malformed(format!(
                "faction '{}' has invalid weight {}",
                self.faction, self.weight
            )));
        }
        for (target, c) in &self.couplings {
            if !(c.re.is_finite() && c.im.is_finite()) {
                return Err(malformed(format!("coupling to '{target}' is not finite")));
            }
        }
        if let Some(driver) = &self.driver {
            driver.validate().map_err(malformed)?;
        }
        Ok(())
    }
}

/// All faction records known to the simulation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FactionCatalog {
    #[serde(default)]
    pub records: Vec<FactionRecord>,
}

impl FactionCatalog {
    pub fn new(records: Vec<FactionRecord>) -> Self {
        Self { records }
    }

    /// Load a catalog from a YAML (or JSON, which is valid YAML) file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&content)?)
    }

    /// Records naming `label`.
    pub fn records_for<'a>(&'a self, label: &'a str) -> impl Iterator<Item = &'a FactionRecord> + 'a {
        self.records.iter().filter(move |r| r.label == label)
    }
}

/// Current faction standings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FactionStandings(BTreeMap<String, f64>);

impl FactionStandings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Standing of `faction`, or [`NEUTRAL_STANDING`] when unknown.
    pub fn standing(&self, faction: &str) -> f64 {
        self.0.get(faction).copied().unwrap_or(NEUTRAL_STANDING)
    }

    pub fn set(&mut self, faction: impl Into<String>, standing: f64) {
        self.0.insert(faction.into(), standing);
    }

    pub fn with(mut self, faction: impl Into<String>, standing: f64) -> Self {
        self.set(faction, standing);
        self
    }

    /// Load standings from a YAML map `faction: standing`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&content)?)
    }
}

/// Hamiltonian parameters of one label.
#[derive(Debug, Clone, PartialEq)]
pub struct Icon {
    pub label: String,
    pub self_energy: f64,
    pub couplings: BTreeMap<String, Complex64>,
    pub driver: Option<Driver>,
}

impl Icon {
    /// Icon with no energy, couplings or driver.
    pub fn bare(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            self_energy: 0.0,
            couplings: BTreeMap::new(),
            driver: None,
        }
    }

    /// Check the icon's numeric content.
    pub fn validate(&self) -> std::result::Result<(), BuildError> {
        let malformed = |message: String| BuildError::MalformedIcon {
            label: self.label.clone(),
            message,
        };
        if !self.self_energy.is_finite() {
            return Err(malformed("self_energy is not finite".into()));
        }
        for (target, c) in &self.couplings {
            if !(c.re.is_finite() && c.im.is_finite()) {
                return Err(malformed(format!("coupling to '{target}' is not finite")));
            }
        }
        if let Some(driver) = &self.driver {
            driver.validate().map_err(malformed)?;
        }
        Ok(())
    }
}

/// Build one icon per register label from the weighted faction records.
///
/// This is the only icon constructor; boot-time builds and standings
/// rebuilds both go through it.
pub fn build_icons(
    catalog: &FactionCatalog,
    register: &RegisterMap,
    standings: &FactionStandings,
) -> std::result::Result<Vec<Icon>, BuildError> {
    let mut icons = Vec::with_capacity(2 * register.num_qubits());

    for label in register.labels() {
        let mut icon = Icon::bare(label);
        let mut strongest_driver: Option<(f64, Driver)> = None;

        for record in catalog.records_for(label) {
            record.validate()?;
            let standing = standings.standing(&record.faction);
            if !standing.is_finite() {
                return Err(BuildError::MalformedIcon {
                    label: label.to_string(),
                    message: format!("standing of '{}' is not finite", record.faction),
                });
            }
            let w = record.weight * standing;

            icon.self_energy += w * record.self_energy;
            for (target, c) in &record.couplings {
                *icon
                    .couplings
                    .entry(target.clone())
                    .or_insert(Complex64::new(0.0, 0.0)) += *c * w;
            }
            if let Some(driver) = &record.driver {
                let replace = strongest_driver
                    .as_ref()
                    .map_or(true, |(best, _)| w.abs() > *best);
                if replace {
                    strongest_driver = Some((w.abs(), driver.scaled(w)));
                }
            }
        }

        icon.driver = strongest_driver.map(|(_, d)| d);
        icon.validate()?;
        icons.push(icon);
    }

    Ok(icons)
}
