//! Command line interface definition

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// spkg - managed-prefix package installer
#[derive(Parser)]
#[command(name = "spkg")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Install packages into the SPKG_LOCAL prefix")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Global arguments available for all commands
#[derive(Parser)]
pub struct GlobalArgs {
    /// Output the result in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Use alternate config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Run the install procedure for a package directory
    #[command(alias = "i")]
    Install {
        /// Package directory containing src/ and optional patches/
        package: PathBuf,
    },

    /// Apply a unified diff to a source tree
    Patch {
        /// Path to the .patch file
        patch: PathBuf,

        /// Source tree to patch
        source: PathBuf,

        /// Strip this many leading path components from patch targets
        #[arg(short = 'p', long, default_value_t = 1)]
        strip: usize,
    },
}
