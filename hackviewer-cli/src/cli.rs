use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "hvcli",
    about = "Hackviewer hero model viewer CLI",
    version,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Write a hackviewer.toml with the default viewer settings
    Init {
        /// Directory to initialize
        #[arg(default_value = ".")]
        dir: PathBuf,
    },
    /// Load a .glb model the way the viewer does and report how it is fitted
    Inspect {
        /// Path to the .glb model
        model: PathBuf,
        /// Optional PNG/JPEG texture to decode alongside
        #[arg(long)]
        texture: Option<PathBuf>,
    },
    /// Build the WASM runtime with wasm-pack
    Build {
        /// Build with optimizations
        #[arg(long)]
        release: bool,
    },
}
