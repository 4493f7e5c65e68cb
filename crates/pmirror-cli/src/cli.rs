use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "pmirror",
    about = "Publish plugin protocol definitions as versioned, immutable module releases",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Config file (default: ./pmirror.toml if present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Initialize an empty release repository
    Init(InitArgs),
    /// List protocol versions found upstream
    Catalog(CatalogArgs),
    /// Publish every upstream protocol version that has no release yet
    Sync(SyncArgs),
    /// List published releases
    Releases(ReleasesArgs),
}

#[derive(Args)]
pub struct InitArgs {
    pub target: PathBuf,
}

#[derive(Args, Clone, Debug)]
pub struct UpstreamArgs {
    /// Local upstream repository
    #[arg(long)]
    pub upstream: PathBuf,
    /// Read this revision instead of the latest stable release tag
    #[arg(long)]
    pub rev: Option<String>,
    /// Treat the upstream as a plain directory rather than a git repository
    #[arg(long, conflicts_with = "rev")]
    pub plain: bool,
    /// Directory holding the protocol files (overrides `proto_dir`)
    #[arg(long)]
    pub proto_dir: Option<String>,
}

#[derive(Args)]
pub struct CatalogArgs {
    #[command(flatten)]
    pub upstream: UpstreamArgs,
}

#[derive(Args)]
pub struct SyncArgs {
    #[command(flatten)]
    pub upstream: UpstreamArgs,
    /// Release repository (created by `pmirror init`)
    #[arg(long)]
    pub target: PathBuf,
    /// Report what would be released without building anything
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args)]
pub struct ReleasesArgs {
    #[arg(long)]
    pub target: PathBuf,
}
