//! AutoML Studio - Main Entry Point
//!
//! Serves the train / save / load / predict demo, or runs it from the terminal.

use clap::Parser;
use automl_studio::cli::{Cli, Commands, cmd_demo, cmd_inspect, cmd_serve};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "automl_studio=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Serve { port, host, model_dir }) => {
            cmd_serve(&host, port, model_dir).await?;
        }
        Some(Commands::Demo { model_dir, seed, model, max_runtime_secs, nfolds }) => {
            tokio::task::spawn_blocking(move || cmd_demo(&model_dir, seed, &model, max_runtime_secs, nfolds))
                .await??;
        }
        Some(Commands::Inspect { model }) => {
            cmd_inspect(&model)?;
        }
        None => {
            cmd_serve("0.0.0.0", 8080, None).await?;
        }
    }

    Ok(())
}
