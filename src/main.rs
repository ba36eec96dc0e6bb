//! acage - CLI entry point.
//!
//! Runs an autonomous coding agent inside a locked-down Docker container.
//! The current directory is exposed as `/workspace` with ignore/readonly
//! overlay mounts applied per the merged configuration.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use acage::runtime::manager::RuntimeManager;
use acage::setup;

/// Run an autonomous coding agent in an isolated container.
///
/// The current working directory is mounted read-write at /workspace.
/// Paths matching `ignore` patterns are hidden behind empty placeholders,
/// paths matching `readonly` patterns are exposed read-only. Patterns come
/// from ~/.acage/config.yaml merged with the workspace's .acage.yaml.
///
/// # Examples
///
/// Start the agent in the current directory:
///     acage
///
/// Forward a command to the container:
///     acage claude --continue
///
/// Remove the image and home volume:
///     acage --reset iv
#[derive(Parser, Debug)]
#[command(name = "acage")]
#[command(about = "Run an autonomous coding agent in an isolated container")]
#[command(version)]
pub struct Cli {
    /// Skip checking the support repo for updates
    #[arg(long)]
    no_update: bool,

    /// Remove persisted state and exit
    ///
    /// Takes an optional component string: c=containers, i=image,
    /// v=home volume, d=~/.acage. With no string, removes everything.
    /// Prompts for confirmation before touching anything.
    #[arg(long, value_name = "COMPONENTS", num_args = 0..=1, default_missing_value = "")]
    reset: Option<String>,

    /// Enable debug logging
    #[arg(long, short = 'd')]
    debug: bool,

    /// Command forwarded to the container (defaults to the image's entrypoint)
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    initialize_logging(cli.debug)?;

    if let Some(components) = cli.reset {
        return setup::reset(&components).await;
    }

    let manager = RuntimeManager::new(cli.no_update);
    manager.run(&cli.command).await
}

/// Sets up the tracing subscriber on stderr.
///
/// `--debug` lowers the default level to debug; `RUST_LOG` overrides both.
fn initialize_logging(debug: bool) -> Result<()> {
    let log_level = if debug { "debug" } else { "info" };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .init();

    Ok(())
}
