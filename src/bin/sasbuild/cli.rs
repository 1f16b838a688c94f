//! CLI definitions using clap.

use clap::{Args, Parser, Subcommand};

/// sasbuild - dependency resolution and bundling for SAS projects
#[derive(Parser)]
#[command(name = "sasbuild")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compile every service and job of a target
    Compile(CompileArgs),

    /// Compile a target and write its deployable bundle
    Build(BuildArgs),

    /// Remove build output
    Clean(CleanArgs),
}

#[derive(Args)]
pub struct CompileArgs {
    /// Target to compile (defaults to the configured or only target)
    #[arg(short, long)]
    pub target: Option<String>,

    /// Number of parallel jobs
    #[arg(short, long)]
    pub jobs: Option<usize>,
}

#[derive(Args)]
pub struct BuildArgs {
    /// Target to build (defaults to the configured or only target)
    #[arg(short, long)]
    pub target: Option<String>,

    /// Number of parallel jobs
    #[arg(short, long)]
    pub jobs: Option<usize>,
}

#[derive(Args)]
pub struct CleanArgs {
    /// Only remove the output of this target
    #[arg(short, long)]
    pub target: Option<String>,
}
