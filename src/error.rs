// Copyright 2026 BiomeQuantum Contributors
// SPDX-License-Identifier: Apache-2.0

//! Error types for the biome simulation core.
//!
//! Recoverable conditions (skipped Lindblad channels, an unavailable packed
//! batch kernel) are not errors and never appear here. Numerical drift is
//! logged by the engine and counted in its diagnostics instead.

use std::fmt;

/// Result type alias for simulation operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type.
#[derive(Debug)]
pub enum Error {
    /// Configuration error
    Config(String),
    /// Biome, Hamiltonian or engine construction failed
    Build(BuildError),
    /// Gate or measurement addressed a qubit or label outside the register
    InvalidRegister(RegisterError),
    /// Input validation failed
    Validation(ValidationError),
    /// Argument outside its legal domain (negative dt, wrong gate shape, ...)
    InvalidArgument(String),
    /// Projection onto an outcome with zero probability
    ZeroProbability { qubit: usize, outcome: u8 },
    /// Operation on an unloaded engine
    Unloaded(String),
    /// IO error
    Io(std::io::Error),
    /// Serialization error
    Serialization(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(msg) => write!(f, "Configuration error: {}", msg),
            Error::Build(e) => write!(f, "Build error: {}", e),
            Error::InvalidRegister(e) => write!(f, "Invalid register: {}", e),
            Error::Validation(e) => write!(f, "Validation error: {}", e),
            Error::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            Error::ZeroProbability { qubit, outcome } => write!(
                f,
                "Outcome {} on qubit {} has zero probability",
                outcome, qubit
            ),
            Error::Unloaded(name) => write!(f, "Biome '{}' is unloaded", name),
            Error::Io(e) => write!(f, "IO error: {}", e),
            Error::Serialization(msg) => write!(f, "Serialization error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Build(e) => Some(e),
            Error::InvalidRegister(e) => Some(e),
            Error::Validation(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<BuildError> for Error {
    fn from(e: BuildError) -> Self {
        Error::Build(e)
    }
}

impl From<RegisterError> for Error {
    fn from(e: RegisterError) -> Self {
        Error::InvalidRegister(e)
    }
}

impl From<ValidationError> for Error {
    fn from(e: ValidationError) -> Self {
        Error::Validation(e)
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(e: serde_yaml::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

/// Build-time failures. A build that fails leaves no partial state behind.
#[derive(Debug, Clone, PartialEq)]
pub enum BuildError {
    /// No axes were supplied for the biome
    EmptyRegister,
    /// Label already allocated to another axis
    DuplicateLabel(String),
    /// Axis with identical north and south labels
    SameLabelAxis(String),
    /// Icon data is malformed
    MalformedIcon { label: String, message: String },
    /// Icon couples to a label that is not in the register
    UnknownCouplingTarget { label: String, target: String },
    /// Operator dimension disagrees with the register
    DimensionMismatch { expected: usize, actual: usize },
    /// Register larger than the configured limit
    TooManyQubits { requested: usize, limit: usize },
    /// max_dt too large for the operator norms
    UnstableTimestep { max_dt: f64, norm: f64 },
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::EmptyRegister => write!(f, "biome has no qubit axes"),
            BuildError::DuplicateLabel(label) => {
                write!(f, "label '{}' is already allocated", label)
            }
            BuildError::SameLabelAxis(label) => {
                write!(f, "axis uses '{}' for both poles", label)
            }
            BuildError::MalformedIcon { label, message } => {
                write!(f, "malformed icon '{}': {}", label, message)
            }
            BuildError::UnknownCouplingTarget { label, target } => write!(
                f,
                "icon '{}' couples to '{}', which is not in the register",
                label, target
            ),
            BuildError::DimensionMismatch { expected, actual } => write!(
                f,
                "dimension mismatch: expected {}, got {}",
                expected, actual
            ),
            BuildError::TooManyQubits { requested, limit } => write!(
                f,
                "register needs {} qubits, limit is {}",
                requested, limit
            ),
            BuildError::UnstableTimestep { max_dt, norm } => write!(
                f,
                "max_dt {} with operator norm {:.4} violates max_dt·‖A‖ < 1",
                max_dt, norm
            ),
        }
    }
}

impl std::error::Error for BuildError {}

/// Register addressing errors. The rejected operation never mutates state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterError {
    /// Qubit index outside the register
    QubitOutOfRange { qubit: usize, num_qubits: usize },
    /// Label not present in the register
    UnknownLabel(String),
    /// Two-qubit operation addressed the same qubit twice
    DuplicateQubit(usize),
}

impl fmt::Display for RegisterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegisterError::QubitOutOfRange { qubit, num_qubits } => write!(
                f,
                "qubit {} out of range for {}-qubit register",
                qubit, num_qubits
            ),
            RegisterError::UnknownLabel(label) => write!(f, "unknown label '{}'", label),
            RegisterError::DuplicateQubit(q) => {
                write!(f, "qubit {} used twice in one operation", q)
            }
        }
    }
}

impl std::error::Error for RegisterError {}

/// Validation errors.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Field validation failed
    Field { field: String, message: String },
    /// Physics constraint violated
    PhysicsConstraint(String),
    /// Resource limit exceeded
    ResourceLimit {
        resource: String,
        limit: u64,
        requested: u64,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::Field { field, message } => {
                write!(f, "Field '{}': {}", field, message)
            }
            ValidationError::PhysicsConstraint(msg) => {
                write!(f, "Physics constraint violated: {}", msg)
            }
            ValidationError::ResourceLimit {
                resource,
                limit,
                requested,
            } => {
                write!(
                    f,
                    "Resource limit exceeded for {}: limit={}, requested={}",
                    resource, limit, requested
                )
            }
        }
    }
}

impl std::error::Error for ValidationError {}
