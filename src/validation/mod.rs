// Copyright 2026 BiomeQuantum Contributors
// SPDX-License-Identifier: Apache-2.0

//! Input validation for externally supplied states and batch requests.

use ndarray::Array2;
use num_complex::Complex64;

use crate::config::ResourceLimits;
use crate::error::{Result, ValidationError};
use crate::linalg::trace_real;

/// Validate a time increment: finite and non-negative.
pub fn validate_timestep(dt: f64, field: &str) -> Result<()> {
    if dt.is_nan() {
        return Err(ValidationError::Field {
            field: field.into(),
            message: "is NaN".into(),
        }
        .into());
    }
    if dt.is_infinite() {
        return Err(ValidationError::Field {
            field: field.into(),
            message: "is infinite".into(),
        }
        .into());
    }
    if dt < 0.0 {
        return Err(ValidationError::Field {
            field: field.into(),
            message: format!("must be non-negative, got {}", dt),
        }
        .into());
    }
    Ok(())
}

/// Validate a flat `[re, im, re, im, …]` row-major matrix buffer of
/// dimension `dim`.
pub fn validate_flat_matrix(flat: &[f64], dim: usize, field: &str) -> Result<()> {
    let expected = 2 * dim * dim;
    if flat.len() != expected {
        return Err(ValidationError::Field {
            field: field.into(),
            message: format!(
                "length {} does not match 2·dim² = {} for dim {}",
                flat.len(),
                expected,
                dim
            ),
        }
        .into());
    }

    for (i, val) in flat.iter().enumerate() {
        if val.is_nan() {
            return Err(ValidationError::Field {
                field: field.into(),
                message: format!("contains NaN at index {}", i),
            }
            .into());
        }
        if val.is_infinite() {
            return Err(ValidationError::Field {
                field: field.into(),
                message: format!("contains Inf at index {}", i),
            }
            .into());
        }
    }

    Ok(())
}

/// Validate a density matrix supplied from outside the engine.
///
/// Checks shape, finiteness and a positive trace. Hermiticity and unit
/// trace are restored by the caller rather than required here.
pub fn validate_density_matrix(rho: &Array2<Complex64>, dim: usize) -> Result<()> {
    if rho.nrows() != rho.ncols() {
        return Err(ValidationError::Field {
            field: "rho".into(),
            message: format!("must be square, got {} × {}", rho.nrows(), rho.ncols()),
        }
        .into());
    }
    if rho.nrows() != dim {
        return Err(ValidationError::Field {
            field: "rho".into(),
            message: format!("dimension {} does not match register dimension {}", rho.nrows(), dim),
        }
        .into());
    }
    if let Some(((i, j), _)) = rho
        .indexed_iter()
        .find(|(_, z)| !(z.re.is_finite() && z.im.is_finite()))
    {
        return Err(ValidationError::Field {
            field: "rho".into(),
            message: format!("non-finite entry at ({}, {})", i, j),
        }
        .into());
    }
    let tr = trace_real(rho);
    if tr <= 0.0 {
        return Err(ValidationError::PhysicsConstraint(format!(
            "density matrix trace must be positive, got {}",
            tr
        ))
        .into());
    }
    Ok(())
}

/// Validate a batch request against the resource limits.
pub fn validate_batch_request(num_biomes: usize, steps: usize, limits: &ResourceLimits) -> Result<()> {
    if num_biomes > limits.max_batch_biomes {
        return Err(ValidationError::ResourceLimit {
            resource: "batch_biomes".into(),
            limit: limits.max_batch_biomes as u64,
            requested: num_biomes as u64,
        }
        .into());
    }

    if steps > limits.max_lookahead_steps {
        return Err(ValidationError::ResourceLimit {
            resource: "lookahead_steps".into(),
            limit: limits.max_lookahead_steps as u64,
            requested: steps as u64,
        }
        .into());
    }

    Ok(())
}

/// Reject a tick that would need more than `limit` sub-steps of `max_dt`.
///
/// `dt` and `max_dt` are assumed already validated.
pub fn validate_substep_count(dt: f64, max_dt: f64, limit: usize) -> Result<()> {
    let requested = (dt / max_dt).ceil();
    if requested > limit as f64 {
        return Err(ValidationError::ResourceLimit {
            resource: "substeps".into(),
            limit: limit as u64,
            requested: requested as u64,
        }
        .into());
    }
    Ok(())
}
