// Copyright 2026 BiomeQuantum Contributors
// SPDX-License-Identifier: Apache-2.0

//! Dissipative channel declarations and compiled jump operators.

use std::fmt;

use ndarray::Array2;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::linalg::{bit_population, dagger, inf_norm};
use crate::register::Pole;

/// Kind of a declared dissipative channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    /// Raise toward `target` from the implicit reservoir.
    Pump,
    /// Move population from `source` to `target`.
    Drain,
    /// Drain whose rate follows the population of `gate_label`.
    Gated,
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelKind::Pump => write!(f, "pump"),
            ChannelKind::Drain => write!(f, "drain"),
            ChannelKind::Gated => write!(f, "gated"),
        }
    }
}

/// One declared channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelSpec {
    pub kind: ChannelKind,
    /// Ignored for pumps.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub target: String,
    /// Rate γ ≥ 0; the operator is scaled by √γ.
    pub rate: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gate_label: Option<String>,
    /// Gate population below which the channel is off. Default 0.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
    /// Exponent applied to the gate population. Default 1.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power: Option<f64>,
}

impl ChannelSpec {
    pub fn pump(target: impl Into<String>, rate: f64) -> Self {
        Self {
            kind: ChannelKind::Pump,
            source: None,
            target: target.into(),
            rate,
            gate_label: None,
            threshold: None,
            power: None,
        }
    }

    pub fn drain(source: impl Into<String>, target: impl Into<String>, rate: f64) -> Self {
        Self {
            kind: ChannelKind::Drain,
            source: Some(source.into()),
            ..Self::pump(target, rate)
        }
    }

    pub fn gated(
        source: impl Into<String>,
        target: impl Into<String>,
        rate: f64,
        gate_label: impl Into<String>,
    ) -> Self {
        Self {
            kind: ChannelKind::Gated,
            gate_label: Some(gate_label.into()),
            ..Self::drain(source, target, rate)
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = Some(threshold);
        self
    }

    pub fn with_power(mut self, power: f64) -> Self {
        self.power = Some(power);
        self
    }

    /// Short human-readable form, e.g. `drain 🌾→🍂`.
    pub fn describe(&self) -> String {
        match (&self.kind, &self.source) {
            (ChannelKind::Pump, _) | (_, None) => format!("{} →{}", self.kind, self.target),
            (_, Some(source)) => format!("{} {}→{}", self.kind, source, self.target),
        }
    }
}

/// Declarative dissipation of one biome. Fixed for the biome's lifetime.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LindbladSpec {
    #[serde(default)]
    pub channels: Vec<ChannelSpec>,
}

impl LindbladSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, channel: ChannelSpec) -> Self {
        self.channels.push(channel);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

/// Population gate of a [`JumpOperator`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gate {
    pub qubit: usize,
    pub pole: Pole,
    pub threshold: f64,
    pub power: f64,
}

impl Gate {
    /// Rate multiplier for gate population `p`: `p^power` at or above the
    /// threshold, zero below it.
    pub fn factor(&self, p: f64) -> f64 {
        if p >= self.threshold {
            p.clamp(0.0, 1.0).powf(self.power)
        } else {
            0.0
        }
    }
}

/// A compiled jump operator.
///
/// `matrix` is the unit-rate operator; the physical L_k is `√rate · matrix`.
/// L† and L†L of the unit-rate operator are computed once at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct JumpOperator {
    pub label: String,
    pub matrix: Array2<Complex64>,
    pub rate: f64,
    pub gate: Option<Gate>,
    adjoint: Array2<Complex64>,
    adjoint_product: Array2<Complex64>,
}

impl JumpOperator {
    pub fn new(label: impl Into<String>, matrix: Array2<Complex64>, rate: f64, gate: Option<Gate>) -> Self {
        let adjoint = dagger(&matrix);
        let adjoint_product = adjoint.dot(&matrix);
        Self {
            label: label.into(),
            matrix,
            rate,
            gate,
            adjoint,
            adjoint_product,
        }
    }

    /// L† of the unit-rate operator.
    pub fn adjoint(&self) -> &Array2<Complex64> {
        &self.adjoint
    }

    /// L†L of the unit-rate operator.
    pub fn adjoint_product(&self) -> &Array2<Complex64> {
        &self.adjoint_product
    }

    pub fn dimension(&self) -> usize {
        self.matrix.nrows()
    }

    /// Physical operator √rate · matrix.
    pub fn scaled(&self) -> Array2<Complex64> {
        self.matrix.mapv(|z| z * self.rate.sqrt())
    }

    /// Rate in effect for the state `rho`.
    pub fn effective_rate(&self, rho: &Array2<Complex64>, num_qubits: usize) -> f64 {
        match &self.gate {
            None => self.rate,
            Some(gate) => {
                let p = bit_population(rho, gate.qubit, gate.pole.bit(), num_qubits);
                self.rate * gate.factor(p)
            }
        }
    }

    /// Bound on ‖√γ L‖ over every reachable effective rate γ.
    pub fn norm_bound(&self) -> f64 {
        self.rate.sqrt() * inf_norm(&self.matrix)
    }
}

/// A declared channel that was skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelWarning {
    /// Position of the channel in its [`LindbladSpec`].
    pub index: usize,
    pub channel: String,
    pub reason: String,
}

impl fmt::Display for ChannelWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "channel #{} ({}) skipped: {}", self.index, self.channel, self.reason)
    }
}

/// Output of [`LindbladBuilder::build`](super::LindbladBuilder::build).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LindbladBuild {
    pub operators: Vec<JumpOperator>,
    pub warnings: Vec<ChannelWarning>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linalg::transition;
    use approx::assert_relative_eq;

    #[test]
    fn test_gate_factor_threshold_and_power() {
        let gate = Gate {
            qubit: 0,
            pole: Pole::North,
            threshold: 0.3,
            power: 2.0,
        };
        assert_eq!(gate.factor(0.29), 0.0);
        assert_relative_eq!(gate.factor(0.3), 0.09, epsilon = 1e-12);
        assert_relative_eq!(gate.factor(1.0), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_default_gate_is_linear() {
        let gate = Gate {
            qubit: 0,
            pole: Pole::South,
            threshold: 0.0,
            power: 1.0,
        };
        assert_relative_eq!(gate.factor(0.4), 0.4, epsilon = 1e-12);
        assert_eq!(gate.factor(0.0), 0.0);
    }

    #[test]
    fn test_jump_operator_caches_products() {
        let op = JumpOperator::new("drain", transition(1, 0), 4.0, None);
        // |1⟩⟨0|† |1⟩⟨0| = |0⟩⟨0|
        assert_eq!(op.adjoint_product()[[0, 0]], Complex64::new(1.0, 0.0));
        assert_eq!(op.adjoint()[[0, 1]], Complex64::new(1.0, 0.0));
        assert_eq!(op.scaled()[[1, 0]], Complex64::new(2.0, 0.0));
        assert_relative_eq!(op.norm_bound(), 2.0);
    }

    #[test]
    fn test_effective_rate_follows_gate_population() {
        let gate = Gate {
            qubit: 0,
            pole: Pole::South,
            threshold: 0.0,
            power: 1.0,
        };
        let op = JumpOperator::new("gated", transition(1, 0), 2.0, Some(gate));
        let mut rho = Array2::zeros((2, 2));
        rho[[0, 0]] = Complex64::new(0.75, 0.0);
        rho[[1, 1]] = Complex64::new(0.25, 0.0);
        assert_relative_eq!(op.effective_rate(&rho, 1), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_spec_from_yaml_defaults() {
        let yaml = r#"
channels:
  - kind: pump
    target: "🌾"
    rate: 0.1
  - kind: gated
    source: "🌾"
    target: "🍂"
    rate: 0.2
    gate_label: "🐺"
"#;
        let spec: LindbladSpec = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(spec.channels.len(), 2);
        assert_eq!(spec.channels[0], ChannelSpec::pump("🌾", 0.1));
        assert_eq!(spec.channels[1].threshold, None);
        assert_eq!(spec.channels[1].describe(), "gated 🌾→🍂");
    }
}
