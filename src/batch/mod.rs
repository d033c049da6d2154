// Copyright 2026 BiomeQuantum Contributors
// SPDX-License-Identifier: Apache-2.0

//! Batch evolution of many biomes over many lookahead steps.
//!
//! The batch engine picks one backend when it is constructed:
//!
//! - [`BackendKind::Packed`]: the sparse packed kernel, compiled in with the
//!   default `native` feature
//! - [`BackendKind::Scalar`]: the per-biome integrator used by
//!   [`QuantumEngine::evolve`]
//!
//! Both produce the same trajectories within 1e-9, so falling back is never
//! an error. The fallback reason is logged at debug level.

#[cfg(feature = "native")]
mod packed;
pub mod pyo3_bindings;

use std::collections::BTreeMap;

use ndarray::Array2;
use num_complex::Complex64;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::{BatchConfig, Config, ResourceLimits};
use crate::engine::observables;
use crate::engine::{PairCorrelation, QuantumEngine};
use crate::error::{Error, Result};
use crate::linalg::purity;
use crate::lindblad::integrate::IntegrationReport;
use crate::lindblad::{evolve_density, StepControl};
use crate::validation::{validate_batch_request, validate_substep_count, validate_timestep};

/// Backend selected by a [`BatchEvolutionEngine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendKind {
    Packed,
    /// Per-biome integrator, with the reason the packed kernel is not used
    Scalar { reason: String },
}

impl BackendKind {
    fn select(prefer_native: bool) -> Self {
        if !prefer_native {
            return BackendKind::Scalar {
                reason: "disabled by batch.prefer_native".into(),
            };
        }
        if cfg!(feature = "native") {
            BackendKind::Packed
        } else {
            BackendKind::Scalar {
                reason: "packed kernel not compiled in (feature `native`)".into(),
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BackendKind::Packed => "packed",
            BackendKind::Scalar { .. } => "scalar",
        }
    }
}

/// State of one biome after one lookahead step.
#[derive(Debug, Clone, Serialize)]
pub struct StepSnapshot {
    pub time: f64,
    #[serde(skip)]
    pub rho: Array2<Complex64>,
    pub purity: f64,
    pub populations: BTreeMap<String, f64>,
}

/// Lookahead trajectory of one biome.
#[derive(Debug, Clone, Serialize)]
pub struct BiomeTrajectory {
    pub biome: String,
    pub steps: Vec<StepSnapshot>,
    /// Pairwise correlations of the final step
    pub correlations: Vec<PairCorrelation>,
    /// Bloch vector of every qubit at the final step
    pub bloch_vectors: Vec<[f64; 3]>,
    pub substeps: usize,
    pub drift_faults: usize,
}

impl BiomeTrajectory {
    /// Last snapshot, if any step was taken.
    pub fn last(&self) -> Option<&StepSnapshot> {
        self.steps.last()
    }
}

/// Evolves many biomes in one call.
#[derive(Debug, Clone)]
pub struct BatchEvolutionEngine {
    backend: BackendKind,
    limits: ResourceLimits,
    default_steps: usize,
}

impl BatchEvolutionEngine {
    pub fn new(batch: &BatchConfig, limits: ResourceLimits) -> Self {
        let backend = BackendKind::select(batch.prefer_native);
        match &backend {
            BackendKind::Packed => debug!("Batch engine using packed kernel"),
            BackendKind::Scalar { reason } => {
                debug!(reason = %reason, "Batch engine falling back to scalar integrator")
            }
        }
        Self {
            backend,
            limits,
            default_steps: batch.lookahead_steps,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.batch, config.limits.clone())
    }

    pub fn backend(&self) -> &BackendKind {
        &self.backend
    }

    /// Configured number of lookahead steps.
    pub fn default_steps(&self) -> usize {
        self.default_steps
    }

    /// Preview `steps` ticks of length `dt` for every engine without
    /// touching them.
    pub fn evolve_lookahead(
        &self,
        engines: &[&QuantumEngine],
        steps: usize,
        dt: f64,
    ) -> Result<Vec<BiomeTrajectory>> {
        self.check_request(engines, steps, dt)?;
        let trajectories = engines
            .iter()
            .map(|engine| self.trajectory(engine, steps, dt))
            .collect::<Result<Vec<_>>>()?;
        info!(
            biomes = engines.len(),
            steps,
            dt,
            backend = self.backend.name(),
            "Lookahead complete"
        );
        Ok(trajectories)
    }

    /// Advance every engine by `steps` ticks of `dt` and return the
    /// trajectories. Either every engine advances or none does.
    pub fn evolve_all(
        &self,
        engines: &mut [QuantumEngine],
        steps: usize,
        dt: f64,
    ) -> Result<Vec<BiomeTrajectory>> {
        let trajectories = {
            let views: Vec<&QuantumEngine> = engines.iter().collect();
            self.evolve_lookahead(&views, steps, dt)?
        };
        for (engine, trajectory) in engines.iter_mut().zip(&trajectories) {
            if let Some(last) = trajectory.last() {
                engine.install_evolved(last.rho.clone(), last.time, trajectory.drift_faults)?;
            }
        }
        Ok(trajectories)
    }

    fn check_request(&self, engines: &[&QuantumEngine], steps: usize, dt: f64) -> Result<()> {
        validate_batch_request(engines.len(), steps, &self.limits)?;
        if let Err(e) = validate_timestep(dt, "dt") {
            return Err(Error::InvalidArgument(e.to_string()));
        }
        for engine in engines {
            engine.density_matrix()?;
            let settings = engine.settings();
            let limit = settings.max_substeps.min(self.limits.max_substeps_per_call);
            validate_substep_count(dt, settings.max_dt, limit)?;
        }
        Ok(())
    }

    fn trajectory(&self, engine: &QuantumEngine, steps: usize, dt: f64) -> Result<BiomeTrajectory> {
        let mut rho = engine.density_matrix()?.clone();
        let mut time = engine.time();
        let mut stepper = self.stepper(engine);

        let mut trajectory = BiomeTrajectory {
            biome: engine.biome().to_string(),
            steps: Vec::with_capacity(steps),
            correlations: Vec::new(),
            bloch_vectors: Vec::new(),
            substeps: 0,
            drift_faults: 0,
        };

        for _ in 0..steps {
            let report = stepper(&mut rho, time, dt);
            time = report.end_time;
            trajectory.substeps += report.substeps;
            trajectory.drift_faults += report.faults.len();
            trajectory.steps.push(StepSnapshot {
                time,
                purity: purity(&rho),
                populations: observables::populations(&rho, engine.register()),
                rho: rho.clone(),
            });
        }

        let n = engine.num_qubits();
        trajectory.correlations =
            observables::correlation_summary(&rho, n, &engine.settings().correlation);
        trajectory.bloch_vectors = (0..n).map(|q| observables::bloch_vector(&rho, q, n)).collect();
        Ok(trajectory)
    }

    fn stepper<'a>(
        &self,
        engine: &'a QuantumEngine,
    ) -> Box<dyn FnMut(&mut Array2<Complex64>, f64, f64) -> IntegrationReport + 'a> {
        match &self.backend {
            #[cfg(feature = "native")]
            BackendKind::Packed => {
                let packed = packed::PackedBiome::pack(engine);
                Box::new(move |rho, start_time, dt| packed.advance(rho, start_time, dt))
            }
            _ => {
                let settings = engine.settings();
                Box::new(move |rho, start_time, dt| {
                    let control = StepControl {
                        start_time,
                        dt,
                        max_dt: settings.max_dt,
                        drift_tolerance: settings.drift_tolerance,
                    };
                    evolve_density(rho, engine.hamiltonian(), engine.operators(), control)
                })
            }
        }
    }
}
