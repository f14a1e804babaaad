// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # accel-mnist
//!
//! Command-line interface for the compiled digit inference sample.
//!
//! ## Usage
//! ```bash
//! # Build the engine and run the ten verified inference passes
//! accel-mnist run --datadir data/mnist
//!
//! # Same, with quantized-integer kernels on partition 0
//! accel-mnist run --datadir data/mnist --int8 --partition 0
//!
//! # Print the model graph and the compiled binding table
//! accel-mnist inspect --datadir data/mnist
//! ```

mod commands;

use clap::{Parser, Subcommand};
use pipeline::SampleConfig;

#[derive(Parser)]
#[command(
    name = "accel-mnist",
    about = "Compiled digit inference sample for a hardware accelerator",
    version,
    author
)]
struct Cli {
    /// Path to a TOML configuration file (overrides other arguments).
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,

    /// Enable verbose logging (repeat for more: -v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile the model and run the ten verified inference passes.
    Run {
        /// Data directory to search; may be given multiple times.
        #[arg(short = 'd', long = "datadir")]
        datadir: Vec<std::path::PathBuf>,

        /// Run in Int8 mode.
        #[arg(long)]
        int8: bool,

        /// Run in FP16 mode.
        #[arg(long)]
        fp16: bool,

        /// Accelerator partition for partition-capable kernels.
        #[arg(long)]
        partition: Option<usize>,

        /// Per-kernel workspace budget (e.g. "16M").
        #[arg(long, default_value = "16M")]
        workspace: String,
    },

    /// Print the model graph, weight sizes, and the engine binding table.
    Inspect {
        /// Data directory to search; may be given multiple times.
        #[arg(short = 'd', long = "datadir")]
        datadir: Vec<std::path::PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    commands::init_tracing(cli.verbose);

    // A config file wins over individual flags; flags fill a default
    // config otherwise.
    let base = match &cli.config {
        Some(path) => SampleConfig::from_file(path)
            .map_err(|e| anyhow::anyhow!("cannot load config: {e}"))?,
        None => SampleConfig::default(),
    };

    match cli.command {
        Commands::Run {
            datadir,
            int8,
            fp16,
            partition,
            workspace,
        } => {
            let mut config = base;
            if cli.config.is_none() {
                if !datadir.is_empty() {
                    config.data_dirs = datadir;
                }
                config.int8 = int8;
                config.fp16 = fp16;
                config.partition = partition;
                config.workspace = workspace;
            }
            commands::run::execute(config)
        }
        Commands::Inspect { datadir } => {
            let mut config = base;
            if cli.config.is_none() && !datadir.is_empty() {
                config.data_dirs = datadir;
            }
            commands::inspect::execute(config)
        }
    }
}
