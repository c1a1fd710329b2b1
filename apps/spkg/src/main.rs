//! spkg - managed-prefix package installer
//!
//! CLI that runs a single package's install procedure against the
//! installation prefix named by `SPKG_LOCAL`: apply compatibility
//! patches, purge stale artifacts, delegate to the package's own
//! installer. Exit code 0 on success, 1 on any failure.

mod cli;
mod display;
mod error;

use crate::cli::{Cli, Commands};
use crate::display::OutputRenderer;
use crate::error::CliError;
use clap::Parser;
use spkg_config::{Config, InstallPrefix};
use spkg_install::{Installer, PackageSource};
use std::process;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.debug);

    if let Err(e) = run(cli).await {
        error!("application error: {}", e);
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

/// Main application logic
async fn run(cli: Cli) -> Result<(), CliError> {
    info!("starting spkg v{}", env!("CARGO_PKG_VERSION"));

    let mut config = Config::load_or_default(cli.global.config.as_deref()).await?;
    config.merge_env()?;

    let renderer = OutputRenderer::new(cli.global.json);

    match cli.command {
        Commands::Install { package } => {
            // Resolve the prefix before touching anything; its absence
            // must abort ahead of purge and delegation.
            let prefix = InstallPrefix::from_env()?;
            let package = PackageSource::discover(&package)?;
            let report = Installer::new(config, prefix).install(&package).await?;
            renderer.render_install(&report);
        }
        Commands::Patch {
            patch,
            source,
            strip,
        } => {
            let outcome = spkg_patch::apply_patch_file(&patch, &source, strip).await?;
            renderer.render_patch(&outcome);
        }
    }

    info!("command completed successfully");
    Ok(())
}

/// Initialize tracing to stderr; `--debug` lowers the filter to debug,
/// `RUST_LOG` overrides both.
fn init_tracing(debug: bool) {
    use tracing_subscriber::EnvFilter;

    let default_filter = if debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
