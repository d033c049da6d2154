// Copyright 2026 BiomeQuantum Contributors
// SPDX-License-Identifier: Apache-2.0

//! PyO3 bindings for biome construction and batch evolution.
//!
//! Matrices cross the boundary as flat `[re, im, re, im, ...]` row-major
//! lists. Definitions, standings and catalogs are passed as JSON strings.
//!
//! Usage from Python:
//! ```python
//! from biome_quantum.batch import BiomeSimulation
//!
//! sim = BiomeSimulation(open("factions.json").read())
//! meadow = sim.add_biome(open("meadow.json").read())
//! sim.evolve(meadow, 0.5)
//! print(sim.population(meadow, "🌾"), sim.purity(meadow))
//! preview = sim.lookahead_json(steps=5, dt=0.1)
//! ```

#[cfg(feature = "python")]
pub mod python {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use ndarray::Array2;
    use num_complex::Complex64;
    use pyo3::exceptions::{PyIndexError, PyValueError};
    use pyo3::prelude::*;

    use crate::batch::BatchEvolutionEngine;
    use crate::biome::{BiomeBuilder, BiomeDefinition, SimulationContext};
    use crate::config::Config;
    use crate::engine::QuantumEngine;
    use crate::error::Error;
    use crate::icon::{FactionCatalog, FactionStandings};
    use crate::validation::validate_flat_matrix;

    fn to_py_err(e: Error) -> PyErr {
        PyValueError::new_err(e.to_string())
    }

    /// A set of biomes sharing one simulation context.
    #[pyclass(name = "BiomeSimulation")]
    pub struct PyBiomeSimulation {
        builder: BiomeBuilder,
        batch: BatchEvolutionEngine,
        engines: Vec<QuantumEngine>,
    }

    impl PyBiomeSimulation {
        fn engine(&self, index: usize) -> PyResult<&QuantumEngine> {
            self.engines
                .get(index)
                .ok_or_else(|| PyIndexError::new_err(format!("no biome at index {}", index)))
        }

        fn engine_mut(&mut self, index: usize) -> PyResult<&mut QuantumEngine> {
            self.engines
                .get_mut(index)
                .ok_or_else(|| PyIndexError::new_err(format!("no biome at index {}", index)))
        }
    }

    #[pymethods]
    impl PyBiomeSimulation {
        /// Create a simulation.
        ///
        /// Args:
        ///     factions_json: Faction catalog as JSON (`{"records": [...]}`).
        ///     config_yaml: Optional configuration document; defaults otherwise.
        #[new]
        #[pyo3(signature = (factions_json, config_yaml=None))]
        fn new(factions_json: &str, config_yaml: Option<&str>) -> PyResult<Self> {
            let factions: FactionCatalog =
                serde_json::from_str(factions_json).map_err(|e| to_py_err(e.into()))?;
            let config: Config = match config_yaml {
                Some(doc) => serde_yaml::from_str(doc).map_err(|e| to_py_err(e.into()))?,
                None => Config::default(),
            };
            config.validate().map_err(to_py_err)?;

            let context = SimulationContext::from_config(&config, factions);
            Ok(Self {
                builder: BiomeBuilder::new(Arc::new(context)),
                batch: BatchEvolutionEngine::from_config(&config),
                engines: Vec::new(),
            })
        }

        /// Build a biome from a JSON definition and return its index.
        #[pyo3(signature = (definition_json, standings_json=None))]
        fn add_biome(&mut self, definition_json: &str, standings_json: Option<&str>) -> PyResult<usize> {
            let definition: BiomeDefinition =
                serde_json::from_str(definition_json).map_err(|e| to_py_err(e.into()))?;
            let standings = parse_standings(standings_json)?;
            let built = self
                .builder
                .build_from_definition(&definition, &standings)
                .map_err(to_py_err)?;
            self.engines.push(built.engine);
            Ok(self.engines.len() - 1)
        }

        /// Recompute one biome's Hamiltonian for new standings.
        fn update_standings(&mut self, index: usize, standings_json: &str) -> PyResult<()> {
            let standings = parse_standings(Some(standings_json))?;
            let builder = self.builder.clone();
            let engine = self.engine_mut(index)?;
            builder
                .rebuild_hamiltonian(engine, &standings)
                .map_err(to_py_err)?;
            Ok(())
        }

        fn evolve(&mut self, index: usize, dt: f64) -> PyResult<usize> {
            let report = self.engine_mut(index)?.evolve(dt).map_err(to_py_err)?;
            Ok(report.substeps)
        }

        /// Advance every biome and return the trajectories as JSON.
        fn evolve_all_json(&mut self, steps: usize, dt: f64) -> PyResult<String> {
            let trajectories = self
                .batch
                .evolve_all(&mut self.engines, steps, dt)
                .map_err(to_py_err)?;
            serde_json::to_string(&trajectories).map_err(|e| to_py_err(e.into()))
        }

        /// Preview every loaded biome without advancing it.
        #[pyo3(signature = (steps=None, dt=0.1))]
        fn lookahead_json(&self, steps: Option<usize>, dt: f64) -> PyResult<String> {
            let steps = steps.unwrap_or_else(|| self.batch.default_steps());
            let views: Vec<&QuantumEngine> = self.engines.iter().filter(|e| !e.is_unloaded()).collect();
            let trajectories = self
                .batch
                .evolve_lookahead(&views, steps, dt)
                .map_err(to_py_err)?;
            serde_json::to_string(&trajectories).map_err(|e| to_py_err(e.into()))
        }

        fn population(&self, index: usize, label: &str) -> PyResult<f64> {
            self.engine(index)?.get_population(label).map_err(to_py_err)
        }

        fn purity(&self, index: usize) -> PyResult<f64> {
            self.engine(index)?.get_purity().map_err(to_py_err)
        }

        fn coherence(&self, index: usize, a: &str, b: &str) -> PyResult<f64> {
            self.engine(index)?.get_coherence(a, b).map_err(to_py_err)
        }

        fn weight_map(&self, index: usize) -> PyResult<BTreeMap<String, f64>> {
            self.engine(index)?.weight_map().map_err(to_py_err)
        }

        fn correlation_summary_json(&self, index: usize) -> PyResult<String> {
            let summary = self.engine(index)?.correlation_summary().map_err(to_py_err)?;
            serde_json::to_string(&summary).map_err(|e| to_py_err(e.into()))
        }

        /// Density matrix as flat [re, im, ...] (row-major).
        fn density_matrix(&self, index: usize) -> PyResult<Vec<f64>> {
            let rho = self.engine(index)?.density_matrix().map_err(to_py_err)?;
            Ok(complex_matrix_to_flat(rho))
        }

        /// Install a density matrix given as flat [re, im, ...] (row-major).
        fn restore_density(&mut self, index: usize, rho_flat: Vec<f64>, time: f64) -> PyResult<()> {
            let engine = self.engine_mut(index)?;
            let dim = engine.dimension();
            validate_flat_matrix(&rho_flat, dim, "rho").map_err(to_py_err)?;
            let rho = flat_to_complex_matrix(&rho_flat, dim);
            engine.restore_density(rho, time).map_err(to_py_err)
        }

        fn unload(&mut self, index: usize) -> PyResult<()> {
            self.engine_mut(index)?.unload();
            Ok(())
        }

        fn __len__(&self) -> usize {
            self.engines.len()
        }

        /// Name of the active batch backend.
        #[getter]
        fn backend(&self) -> &'static str {
            self.batch.backend().name()
        }
    }

    fn parse_standings(json: Option<&str>) -> PyResult<FactionStandings> {
        match json {
            Some(doc) => serde_json::from_str(doc).map_err(|e| to_py_err(e.into())),
            None => Ok(FactionStandings::new()),
        }
    }

    /// Flat [re, im, re, im, ...] to a dim×dim complex matrix. Length is
    /// checked by the caller.
    fn flat_to_complex_matrix(data: &[f64], dim: usize) -> Array2<Complex64> {
        Array2::from_shape_fn((dim, dim), |(i, j)| {
            let idx = (i * dim + j) * 2;
            Complex64::new(data[idx], data[idx + 1])
        })
    }

    /// dim×dim complex matrix to flat [re, im, re, im, ...].
    fn complex_matrix_to_flat(mat: &Array2<Complex64>) -> Vec<f64> {
        mat.iter().flat_map(|z| [z.re, z.im]).collect()
    }

    /// Register the batch submodule with the parent Python module.
    pub fn register_batch_module(parent: &Bound<'_, PyModule>) -> PyResult<()> {
        let m = PyModule::new(parent.py(), "batch")?;
        m.add_class::<PyBiomeSimulation>()?;
        parent.add_submodule(&m)?;
        Ok(())
    }
}
