use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "edmio",
    about = "Inspect, stream, and generate columnar event files",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show version, event count, and collections of a file
    Info(InfoArgs),
    /// Stream events through an event source and print their contents
    Dump(DumpArgs),
    /// Write a synthetic sample file
    Generate(GenerateArgs),
}

#[derive(Args)]
pub struct InfoArgs {
    pub file: PathBuf,
}

#[derive(Args)]
pub struct DumpArgs {
    pub file: PathBuf,
    /// Only read these collections (comma-separated, `*` globs allowed)
    #[arg(long, value_delimiter = ',')]
    pub include: Vec<String>,
    /// Never read these collections; applied after --include
    #[arg(long, value_delimiter = ',')]
    pub exclude: Vec<String>,
    /// Stop after this many events
    #[arg(short = 'n', long)]
    pub limit: Option<u64>,
    /// Start over at the first event when the file ends (requires --limit)
    #[arg(long)]
    pub recycle: bool,
    /// Print the first N records of every collection
    #[arg(long, default_value_t = 0)]
    pub records: usize,
    /// Source configuration file (TOML); flags override it
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Args)]
pub struct GenerateArgs {
    pub file: PathBuf,
    #[arg(long, default_value_t = 10)]
    pub events: u64,
    /// Particles per event
    #[arg(long, default_value_t = 5)]
    pub particles: u32,
    /// Tracker hits per event
    #[arg(long, default_value_t = 20)]
    pub hits: u32,
    #[arg(long, default_value_t = 1)]
    pub run: i32,
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}
