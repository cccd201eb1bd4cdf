//! CLI (C16): `discover`, `sync`, `show`, `validate`, `list` commands on
//! top of the library crate, with `--json` machine-readable output where
//! the corresponding human table would otherwise print.

mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "autodiscovery", version, about = "Discover and mirror the current release of tracked data sources")]
pub struct Cli {
    /// Print tracing at info level even without RUST_LOG set.
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run discovery for a single source key.
    Discover {
        key: String,
        #[arg(long)]
        mirror: bool,
        #[arg(long = "no-mirror")]
        no_mirror: bool,
        #[arg(long)]
        fast: bool,
        #[arg(long)]
        json: bool,
    },
    /// Run discovery across many keys, optionally concurrently.
    Sync {
        #[arg(long)]
        all: bool,
        #[arg(long)]
        key: Vec<String>,
        #[arg(long)]
        fast: bool,
        #[arg(long)]
        json: bool,
    },
    /// Re-check an existing registry entry's reachability and status.
    Validate { key: String },
    /// Print one registry entry, or the whole registry if no key is given.
    Show {
        key: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// List every known source key.
    List,
}

/// Checks `--verbose`/`-v` ahead of full argument parsing so logging can be
/// initialized before `clap` runs (matches the teacher's startup ordering).
pub fn is_verbose() -> bool {
    std::env::args().any(|a| a == "--verbose" || a == "-v")
}

pub use commands::run;
