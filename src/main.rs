// Copyright 2026 BiomeQuantum Contributors
// SPDX-License-Identifier: Apache-2.0

//! BiomeQuantum runner
//!
//! Builds biomes from definition files, evolves them and prints their
//! observables.
//!
//! # Usage
//!
//! ```bash
//! # Evolve one biome for 20 ticks of 0.1
//! biome-quantum run --biome demos/meadow.yaml --factions demos/factions.yaml --steps 20
//!
//! # Preview several biomes with the batch engine
//! biome-quantum lookahead --biome demos/meadow.yaml --biome demos/marsh.yaml \
//!     --factions demos/factions.yaml
//!
//! # Show effective configuration
//! biome-quantum config
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use biome_quantum::{
    icon::{FactionCatalog, FactionStandings},
    persistence::DensitySnapshot,
    BatchEvolutionEngine, BiomeBuilder, BiomeDefinition, Config, QuantumEngine, Result,
    SimulationContext, VERSION,
};

/// BiomeQuantum simulation runner
#[derive(Parser)]
#[command(name = "biome-quantum")]
#[command(author = "BiomeQuantum Contributors")]
#[command(version = VERSION)]
#[command(about = "Lindblad simulation of multi-biome open quantum systems")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); overrides the config
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evolve one biome and print its observables
    Run {
        /// Biome definition (YAML or JSON)
        #[arg(short, long)]
        biome: PathBuf,

        /// Faction catalog (YAML or JSON)
        #[arg(short, long)]
        factions: PathBuf,

        /// Faction standings (YAML map faction: standing)
        #[arg(short, long)]
        standings: Option<PathBuf>,

        /// Number of ticks
        #[arg(long, default_value_t = 10)]
        steps: usize,

        /// Tick length
        #[arg(long, default_value_t = 0.1)]
        dt: f64,

        /// Start from a saved density-matrix snapshot
        #[arg(long)]
        restore: Option<PathBuf>,

        /// Save the final density matrix
        #[arg(long)]
        save: Option<PathBuf>,
    },

    /// Preview several biomes with the batch engine
    Lookahead {
        /// Biome definitions (repeatable)
        #[arg(short, long, required = true)]
        biome: Vec<PathBuf>,

        /// Faction catalog (YAML or JSON)
        #[arg(short, long)]
        factions: PathBuf,

        /// Faction standings (YAML map faction: standing)
        #[arg(short, long)]
        standings: Option<PathBuf>,

        /// Lookahead steps (defaults to batch.lookahead_steps)
        #[arg(long)]
        steps: Option<usize>,

        /// Tick length
        #[arg(long, default_value_t = 0.1)]
        dt: f64,
    },

    /// Show effective configuration
    Config,

    /// Validate configuration file
    Validate,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_deref())?;

    let level = cli.log_level.as_deref().unwrap_or(&config.logging.level);
    init_logging(level, &config.logging.format);

    match cli.command {
        Commands::Run {
            biome,
            factions,
            standings,
            steps,
            dt,
            restore,
            save,
        } => {
            config.validate()?;
            let builder = load_builder(&config, &factions)?;
            let standings = load_standings(standings.as_deref())?;
            let definition = BiomeDefinition::load(&biome)?;

            let built = builder.build_from_definition(&definition, &standings)?;
            for warning in &built.warnings {
                println!("skipped channel: {}", warning);
            }
            let mut engine = built.engine;

            if let Some(path) = restore {
                DensitySnapshot::load(&path)?.restore(&mut engine)?;
            }

            info!(
                version = VERSION,
                biome = %engine.biome(),
                qubits = engine.num_qubits(),
                steps,
                dt,
                "Running biome"
            );

            println!("{:>10}  {:>8}  populations", "time", "purity");
            for _ in 0..steps {
                engine.evolve(dt)?;
                print_step(&engine)?;
            }
            print_summary(&engine)?;

            if let Some(path) = save {
                DensitySnapshot::capture(&engine)?.save(&path)?;
                println!("saved density matrix to {}", path.display());
            }
        }

        Commands::Lookahead {
            biome,
            factions,
            standings,
            steps,
            dt,
        } => {
            config.validate()?;
            let builder = load_builder(&config, &factions)?;
            let standings = load_standings(standings.as_deref())?;

            let engines = biome
                .iter()
                .map(|path| {
                    let definition = BiomeDefinition::load(path)?;
                    Ok(builder.build_from_definition(&definition, &standings)?.engine)
                })
                .collect::<Result<Vec<QuantumEngine>>>()?;

            let batch = BatchEvolutionEngine::from_config(&config);
            let steps = steps.unwrap_or_else(|| batch.default_steps());
            let views: Vec<&QuantumEngine> = engines.iter().collect();
            let trajectories = batch.evolve_lookahead(&views, steps, dt)?;

            println!("{}", serde_json::to_string_pretty(&trajectories)?);
        }

        Commands::Config => {
            // Show effective configuration
            println!("{}", serde_yaml::to_string(&config)?);
        }

        Commands::Validate => match config.validate() {
            Ok(()) => {
                println!("Configuration is valid");
            }
            Err(e) => {
                eprintln!("Configuration error: {}", e);
                std::process::exit(1);
            }
        },
    }

    Ok(())
}

/// Initialize logging with tracing.
fn init_logging(level: &str, format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);

    if format == "json" {
        registry.with(fmt::layer().json().with_target(true)).init();
    } else {
        registry.with(fmt::layer().with_target(true)).init();
    }
}

fn load_builder(config: &Config, factions: &Path) -> Result<BiomeBuilder> {
    let catalog = FactionCatalog::load(factions)?;
    info!(records = catalog.records.len(), path = %factions.display(), "Loaded faction catalog");
    Ok(BiomeBuilder::new(Arc::new(SimulationContext::from_config(
        config, catalog,
    ))))
}

fn load_standings(path: Option<&Path>) -> Result<FactionStandings> {
    match path {
        Some(path) => FactionStandings::load(path),
        None => Ok(FactionStandings::new()),
    }
}

fn print_step(engine: &QuantumEngine) -> Result<()> {
    let populations = engine
        .populations()?
        .into_iter()
        .map(|(label, p)| format!("{}={:.4}", label, p))
        .collect::<Vec<_>>()
        .join(" ");
    println!(
        "{:>10.4}  {:>8.5}  {}",
        engine.time(),
        engine.get_purity()?,
        populations
    );
    Ok(())
}

fn print_summary(engine: &QuantumEngine) -> Result<()> {
    println!();
    println!("correlations:");
    for pair in engine.correlation_summary()? {
        println!(
            "  q{}–q{}: I = {:.4} bits ({:?})",
            pair.qubit_a, pair.qubit_b, pair.mutual_information, pair.level
        );
    }
    println!("weights:");
    for (label, w) in engine.weight_map()? {
        println!("  {}: {:.4}", label, w);
    }
    if engine.drift_fault_count() > 0 {
        println!("drift faults: {}", engine.drift_fault_count());
    }
    Ok(())
}
