//! CLI argument parsing for metadata resolution.
//!
//! The CLI stays thin: every command resolves the same document through the
//! library and only differs in what it prints.
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "artprov",
    version,
    about = "Resolve provenance metadata for NFT-bound artworks",
    after_help = "Examples:\n  artprov resolve ./gallery --out metadata.json\n  artprov resolve meta.toml extra.toml --flatten\n  artprov artworks ./gallery\n  artprov check ./gallery --json",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Resolve(ResolveArgs),
    Artworks(ArtworksArgs),
    Check(CheckArgs),
}

/// Metadata sources shared by every command.
#[derive(Args, Debug)]
pub struct SourceArgs {
    /// TOML metadata files, or directories containing them
    #[arg(value_name = "SOURCES", required = true)]
    pub sources: Vec<PathBuf>,

    /// Log resolution decisions to stderr
    #[arg(long, short)]
    pub verbose: bool,
}

#[derive(Parser, Debug)]
#[command(about = "Resolve metadata sources into a JSON document")]
pub struct ResolveArgs {
    #[command(flatten)]
    pub input: SourceArgs,

    /// Write the document here instead of stdout
    #[arg(long, value_name = "PATH")]
    pub out: Option<PathBuf>,

    /// Emit one merged attribute map per artwork
    #[arg(long)]
    pub flatten: bool,
}

#[derive(Parser, Debug)]
#[command(about = "List the artworks named by metadata sources")]
pub struct ArtworksArgs {
    #[command(flatten)]
    pub input: SourceArgs,
}

#[derive(Parser, Debug)]
#[command(about = "Report license and certificate state per artwork")]
pub struct CheckArgs {
    #[command(flatten)]
    pub input: SourceArgs,

    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,
}

impl Command {
    pub fn input(&self) -> &SourceArgs {
        match self {
            Command::Resolve(args) => &args.input,
            Command::Artworks(args) => &args.input,
            Command::Check(args) => &args.input,
        }
    }
}
