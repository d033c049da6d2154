// Copyright 2026 BiomeQuantum Contributors
// SPDX-License-Identifier: Apache-2.0

//! Compile a [`LindbladSpec`] into jump operators on a register.
//!
//! Operators depend only on the channel list and the register layout, never on
//! faction data, so rebuilding H leaves them untouched.

use ndarray::Array2;
use num_complex::Complex64;
use tracing::{debug, warn};

use super::types::{ChannelKind, ChannelSpec, ChannelWarning, Gate, JumpOperator, LindbladBuild, LindbladSpec};
use crate::linalg::{embed_operator, transition};
use crate::register::{Pole, RegisterMap};

/// Compiles [`LindbladSpec`]s.
pub struct LindbladBuilder;

impl LindbladBuilder {
    /// Build one jump operator per valid channel.
    ///
    /// Invalid channels never fail the build: each is skipped and reported
    /// as a [`ChannelWarning`].
    pub fn build(spec: &LindbladSpec, register: &RegisterMap) -> LindbladBuild {
        let mut build = LindbladBuild::default();

        for (index, channel) in spec.channels.iter().enumerate() {
            match compile_channel(channel, register) {
                Ok(op) => build.operators.push(op),
                Err(reason) => {
                    let warning = ChannelWarning {
                        index,
                        channel: channel.describe(),
                        reason,
                    };
                    warn!(
                        index,
                        channel = %warning.channel,
                        reason = %warning.reason,
                        "Skipping Lindblad channel"
                    );
                    build.warnings.push(warning);
                }
            }
        }

        debug!(
            operators = build.operators.len(),
            skipped = build.warnings.len(),
            "Compiled Lindblad spec"
        );
        build
    }
}

fn compile_channel(channel: &ChannelSpec, register: &RegisterMap) -> Result<JumpOperator, String> {
    if !channel.rate.is_finite() || channel.rate < 0.0 {
        return Err(format!("rate must be finite and non-negative, got {}", channel.rate));
    }
    let n = register.num_qubits();
    let (qt, pt) = locate(register, &channel.target)?;

    let (matrix, gate) = match channel.kind {
        ChannelKind::Pump => {
            let raise = transition(pt.bit(), pt.opposite().bit());
            (embed_operator(&raise, &[qt], n), None)
        }
        ChannelKind::Drain | ChannelKind::Gated => {
            let source = channel
                .source
                .as_deref()
                .ok_or_else(|| format!("{} channel has no source", channel.kind))?;
            if source == channel.target {
                return Err("source and target are the same label".into());
            }
            let (qs, ps) = locate(register, source)?;
            let matrix = drain_operator((qs, ps), (qt, pt), n);
            let gate = match channel.kind {
                ChannelKind::Gated => Some(compile_gate(channel, register)?),
                _ => None,
            };
            (matrix, gate)
        }
    };

    Ok(JumpOperator::new(channel.describe(), matrix, channel.rate, gate))
}

fn compile_gate(channel: &ChannelSpec, register: &RegisterMap) -> Result<Gate, String> {
    let label = channel
        .gate_label
        .as_deref()
        .ok_or_else(|| "gated channel has no gate_label".to_string())?;
    let (qubit, pole) = locate(register, label)?;
    let threshold = channel.threshold.unwrap_or(0.0);
    let power = channel.power.unwrap_or(1.0);
    if !threshold.is_finite() {
        return Err(format!("gate threshold must be finite, got {threshold}"));
    }
    if !power.is_finite() || power < 0.0 {
        return Err(format!("gate power must be finite and non-negative, got {power}"));
    }
    Ok(Gate {
        qubit,
        pole,
        threshold,
        power,
    })
}

fn locate(register: &RegisterMap, label: &str) -> Result<(usize, Pole), String> {
    register
        .locate(label)
        .ok_or_else(|| format!("unknown label '{label}'"))
}

/// Unit-rate drain from `source` to `target`.
///
/// Same axis: |t⟩⟨s|. Different axes: |¬s⟩⟨s|_a ⊗ |t⟩⟨¬t|_b, which empties
/// the source pole while filling the target pole.
fn drain_operator(
    (qs, ps): (usize, Pole),
    (qt, pt): (usize, Pole),
    num_qubits: usize,
) -> Array2<Complex64> {
    if qs == qt {
        embed_operator(&transition(pt.bit(), ps.bit()), &[qt], num_qubits)
    } else {
        let row = (ps.opposite().bit() << 1) | pt.bit();
        let col = (ps.bit() << 1) | pt.opposite().bit();
        let mut local = Array2::zeros((4, 4));
        local[[row, col]] = Complex64::new(1.0, 0.0);
        embed_operator(&local, &[qs, qt], num_qubits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register() -> RegisterMap {
        RegisterMap::from_pairs(&[("🌾", "🍂"), ("🐇", "🐺")]).unwrap()
    }

    fn one() -> Complex64 {
        Complex64::new(1.0, 0.0)
    }

    #[test]
    fn test_pump_raises_toward_target() {
        let spec = LindbladSpec::new().with(ChannelSpec::pump("🍂", 0.5));
        let build = LindbladBuilder::build(&spec, &RegisterMap::from_pairs(&[("🌾", "🍂")]).unwrap());
        assert!(build.warnings.is_empty());
        let op = &build.operators[0];
        // |🍂⟩⟨🌾| = |1⟩⟨0|
        assert_eq!(op.matrix[[1, 0]], one());
        assert_eq!(op.matrix.iter().filter(|z| z.norm() > 0.0).count(), 1);
        assert_eq!(op.rate, 0.5);
        assert!(op.gate.is_none());
    }

    #[test]
    fn test_pump_ignores_source() {
        let mut channel = ChannelSpec::pump("🌾", 0.5);
        channel.source = Some("🐺".into());
        let reg = RegisterMap::from_pairs(&[("🌾", "🍂")]).unwrap();
        let build = LindbladBuilder::build(&LindbladSpec::new().with(channel), &reg);
        assert!(build.warnings.is_empty());
        assert_eq!(build.operators[0].matrix[[0, 1]], one());
    }

    #[test]
    fn test_same_axis_drain() {
        let spec = LindbladSpec::new().with(ChannelSpec::drain("🌾", "🍂", 1.0));
        let build = LindbladBuilder::build(&spec, &register());
        let op = &build.operators[0];
        // |🍂⟩⟨🌾| on q0, identity on q1: |1x⟩⟨0x|
        assert_eq!(op.matrix[[2, 0]], one());
        assert_eq!(op.matrix[[3, 1]], one());
        assert_eq!(op.matrix.iter().filter(|z| z.norm() > 0.0).count(), 2);
    }

    #[test]
    fn test_cross_axis_drain_moves_excitation() {
        // 🍂 (q0 south) → 🐇 (q1 north): |🌾⟩⟨🍂|_0 ⊗ |🐇⟩⟨🐺|_1 = |00⟩⟨11|
        let spec = LindbladSpec::new().with(ChannelSpec::drain("🍂", "🐇", 1.0));
        let build = LindbladBuilder::build(&spec, &register());
        let op = &build.operators[0];
        assert_eq!(op.matrix[[0, 3]], one());
        assert_eq!(op.matrix.iter().filter(|z| z.norm() > 0.0).count(), 1);
    }

    #[test]
    fn test_gated_defaults() {
        let spec = LindbladSpec::new().with(ChannelSpec::gated("🌾", "🍂", 0.2, "🐺"));
        let build = LindbladBuilder::build(&spec, &register());
        let gate = build.operators[0].gate.unwrap();
        assert_eq!(gate.qubit, 1);
        assert_eq!(gate.pole, Pole::South);
        assert_eq!(gate.threshold, 0.0);
        assert_eq!(gate.power, 1.0);
    }

    #[test]
    fn test_invalid_channels_become_warnings() {
        let mut no_gate = ChannelSpec::gated("🌾", "🍂", 0.2, "🐺");
        no_gate.gate_label = None;
        let mut no_source = ChannelSpec::drain("🌾", "🍂", 0.2);
        no_source.source = None;
        let spec = LindbladSpec::new()
            .with(ChannelSpec::drain("🌾", "🦊", 1.0))
            .with(ChannelSpec::pump("🌾", -1.0))
            .with(ChannelSpec::drain("🌾", "🌾", 1.0))
            .with(no_gate)
            .with(no_source)
            .with(ChannelSpec::gated("🌾", "🍂", 0.2, "🐺").with_power(-1.0))
            .with(ChannelSpec::pump("🐇", f64::NAN))
            .with(ChannelSpec::pump("🐇", 0.1));

        let build = LindbladBuilder::build(&spec, &register());
        assert_eq!(build.operators.len(), 1);
        assert_eq!(build.warnings.len(), 7);
        assert_eq!(build.warnings[0].index, 0);
        assert!(build.warnings[0].reason.contains("🦊"));
        assert!(build.warnings[0].to_string().contains("skipped"));
    }

    #[test]
    fn test_build_is_deterministic() {
        let spec = LindbladSpec::new()
            .with(ChannelSpec::pump("🌾", 0.1))
            .with(ChannelSpec::drain("🐇", "🍂", 0.3))
            .with(ChannelSpec::gated("🌾", "🐺", 0.2, "🐇").with_threshold(0.4));
        let a = LindbladBuilder::build(&spec, &register());
        let b = LindbladBuilder::build(&spec, &register());
        assert_eq!(a, b);
    }
}
