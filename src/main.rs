// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use anyhow::Context;
use clap::{Parser, Subcommand};
use metadata_ingestion::config::load_and_validate_config;
use metadata_ingestion::observability::init_logging;
use metadata_ingestion::observability::messages::workflow::StopRequested;
use metadata_ingestion::observability::messages::StructuredLog;
use metadata_ingestion::sources::SourceFactory;
use metadata_ingestion::workflow::IngestionWorkflow;
use std::path::PathBuf;

/// Metadata ingestion workflows driven by a config file.
#[derive(Parser, Debug)]
#[command(name = "metadata", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the ingestion workflow described by a config file
    Ingest {
        /// Workflow config (.yaml, .yml, .json or .toml)
        #[arg(short, long, value_name = "FILE")]
        config: PathBuf,
    },
    /// List the source types this binary can run
    Sources,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    match Cli::parse().command {
        Command::Ingest { config } => {
            let exit_code = ingest(config).await?;
            std::process::exit(exit_code);
        }
        Command::Sources => {
            for source_type in SourceFactory::list_available_sources() {
                println!("{}", source_type);
            }
            Ok(())
        }
    }
}

async fn ingest(path: PathBuf) -> anyhow::Result<i32> {
    let config = load_and_validate_config(&path)
        .with_context(|| format!("loading workflow config {}", path.display()))?;
    init_logging(config.workflow_config.logger_level)?;

    let mut workflow = IngestionWorkflow::from_config(&config)?;

    let stop_signal = workflow.stop_signal();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            StopRequested { reason: "ctrl-c" }.log();
            stop_signal.stop();
        }
    });

    // The topology walk blocks; the ctrl-c task runs on another worker.
    let executed = tokio::task::block_in_place(|| workflow.execute());
    interrupt.abort();

    let stopped = workflow.stop();
    executed?;
    stopped?;

    workflow.print_status();
    Ok(workflow.exit_code())
}
