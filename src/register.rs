// Copyright 2026 BiomeQuantum Contributors
// SPDX-License-Identifier: Apache-2.0

//! Bijective mapping between labelled two-pole axes and qubit indices.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{BuildError, RegisterError};

/// Pole of a qubit axis. North is basis bit 0, south is basis bit 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pole {
    North,
    South,
}

impl Pole {
    /// Basis bit value of this pole.
    pub fn bit(self) -> usize {
        match self {
            Pole::North => 0,
            Pole::South => 1,
        }
    }

    /// The other pole of the same axis.
    pub fn opposite(self) -> Pole {
        match self {
            Pole::North => Pole::South,
            Pole::South => Pole::North,
        }
    }
}

/// One qubit axis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Axis {
    pub north: String,
    pub south: String,
}

impl Axis {
    /// Label sitting at `pole`.
    pub fn label(&self, pole: Pole) -> &str {
        match pole {
            Pole::North => &self.north,
            Pole::South => &self.south,
        }
    }
}

/// Register layout of one biome. Axes can only be added, never removed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegisterMap {
    axes: Vec<Axis>,
    index: HashMap<String, (usize, Pole)>,
}

impl RegisterMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a register from `(north, south)` pairs in qubit order.
    pub fn from_pairs<S: AsRef<str>>(pairs: &[(S, S)]) -> Result<Self, BuildError> {
        if pairs.is_empty() {
            return Err(BuildError::EmptyRegister);
        }
        let mut map = Self::new();
        for (north, south) in pairs {
            map.allocate_axis(north.as_ref(), south.as_ref())?;
        }
        Ok(map)
    }

    /// Allocate the next qubit for a `(north, south)` axis.
    pub fn allocate_axis(&mut self, north: &str, south: &str) -> Result<usize, BuildError> {
        if north == south {
            return Err(BuildError::SameLabelAxis(north.to_string()));
        }
        for label in [north, south] {
            if self.index.contains_key(label) {
                return Err(BuildError::DuplicateLabel(label.to_string()));
            }
        }
        let qubit = self.axes.len();
        self.index.insert(north.to_string(), (qubit, Pole::North));
        self.index.insert(south.to_string(), (qubit, Pole::South));
        self.axes.push(Axis {
            north: north.to_string(),
            south: south.to_string(),
        });
        Ok(qubit)
    }

    /// Qubit index carrying `label`.
    pub fn qubit(&self, label: &str) -> Option<usize> {
        self.index.get(label).map(|&(q, _)| q)
    }

    /// Qubit index and pole of `label`.
    pub fn locate(&self, label: &str) -> Option<(usize, Pole)> {
        self.index.get(label).copied()
    }

    /// Like [`locate`](Self::locate) but reports unknown labels as errors.
    pub fn require(&self, label: &str) -> Result<(usize, Pole), RegisterError> {
        self.locate(label)
            .ok_or_else(|| RegisterError::UnknownLabel(label.to_string()))
    }

    pub fn axis(&self, qubit: usize) -> Option<&Axis> {
        self.axes.get(qubit)
    }

    pub fn axes(&self) -> &[Axis] {
        &self.axes
    }

    pub fn contains(&self, label: &str) -> bool {
        self.index.contains_key(label)
    }

    pub fn num_qubits(&self) -> usize {
        self.axes.len()
    }

    /// Hilbert-space dimension 2^n.
    pub fn dimension(&self) -> usize {
        1usize << self.axes.len()
    }

    /// All labels in qubit order, north before south.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.axes
            .iter()
            .flat_map(|a| [a.north.as_str(), a.south.as_str()])
    }

    /// Reject qubit indices outside the register.
    pub fn check_qubit(&self, qubit: usize) -> Result<(), RegisterError> {
        if qubit >= self.num_qubits() {
            return Err(RegisterError::QubitOutOfRange {
                qubit,
                num_qubits: self.num_qubits(),
            });
        }
        Ok(())
    }
}
