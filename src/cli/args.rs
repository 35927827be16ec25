//! Command-line arguments and subcommands, declared with `clap` derive.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

use crate::tokens::TokenFormat;

#[derive(Debug, Parser)]
#[command(
    name = "descent",
    version,
    about = "Backtracking recursive-descent recognizer for context-free grammars."
)]
pub struct DescentArgs {
    /// More log output on stderr (-v info, -vv debug, -vvv trace). RUST_LOG wins when set.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// YAML parser configuration.
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Decide whether a token sequence is derivable and print its parse tree.
    Parse {
        /// Grammar description file.
        grammar: PathBuf,
        /// Token file.
        tokens: PathBuf,
        /// How the token file is laid out.
        #[arg(long, value_enum, default_value_t = TokenFormat::Lines)]
        format: TokenFormat,
        /// Write the transition-by-transition trace to this file.
        #[arg(long, value_name = "FILE")]
        trace: Option<PathBuf>,
        /// Print the outcome as JSON.
        #[arg(long)]
        json: bool,
        /// Override the configured step budget (0 disables the guard).
        #[arg(long, value_name = "N")]
        max_steps: Option<usize>,
    },
    /// Show a grammar, or the alternatives of one nonterminal.
    Grammar {
        /// Grammar description file.
        grammar: PathBuf,
        #[arg(long, value_name = "NONTERMINAL")]
        productions_for: Option<String>,
    },
    /// Validate a grammar and list errors, warnings and suggestions.
    Check {
        /// Grammar description file.
        grammar: PathBuf,
    },
}
