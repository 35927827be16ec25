//! The Descent command-line interface.
//!
//! Parses arguments, installs logging, and dispatches to one handler per
//! subcommand. Handlers return the process exit code; errors are rendered
//! with miette.

use std::path::Path;
use std::process::ExitCode;

use clap::Parser as _;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use crate::cli::args::{Command, DescentArgs};
use crate::config::ParserConfig;
use crate::errors::{print_error, DescentError};
use crate::grammar::loader::{load_grammar_file, read_grammar_file};
use crate::parser::{Parser, WriterTrace};
use crate::tokens::{TokenFormat, TokenSequence};

pub mod args;
pub mod output;

/// The main entry point for the CLI.
pub fn run() -> ExitCode {
    let args = DescentArgs::parse();
    init_logging(args.verbose);

    let result = load_config(args.config.as_deref()).and_then(|config| match args.command {
        Command::Parse {
            grammar,
            tokens,
            format,
            trace,
            json,
            max_steps,
        } => {
            let config = match max_steps {
                Some(limit) => config.with_max_steps(limit),
                None => config,
            };
            handle_parse(&grammar, &tokens, format, trace.as_deref(), json, config)
        }
        Command::Grammar {
            grammar,
            productions_for,
        } => handle_grammar(&grammar, productions_for.as_deref(), &config),
        Command::Check { grammar } => handle_check(&grammar, &config),
    });

    match result {
        Ok(code) => code,
        Err(error) => {
            print_error(error);
            ExitCode::FAILURE
        }
    }
}

/// `RUST_LOG` wins; otherwise the `-v` count picks the level.
fn init_logging(verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        })
    });

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_config(path: Option<&Path>) -> Result<ParserConfig, DescentError> {
    match path {
        Some(path) => {
            info!(config = %path.display(), "loading configuration");
            ParserConfig::from_yaml_file(path)
        }
        None => Ok(ParserConfig::default()),
    }
}

fn stdout_error(error: std::io::Error) -> DescentError {
    DescentError::io("stdout", error)
}

/// Handles the `parse` subcommand.
fn handle_parse(
    grammar_path: &Path,
    tokens_path: &Path,
    format: TokenFormat,
    trace_path: Option<&Path>,
    json: bool,
    config: ParserConfig,
) -> Result<ExitCode, DescentError> {
    let grammar = load_grammar_file(grammar_path, &config)?;
    let tokens = TokenSequence::load(tokens_path, format)?;
    info!(
        grammar = %grammar_path.display(),
        tokens = tokens.len(),
        "parsing"
    );

    let parser = Parser::new(&grammar).with_config(config);
    let outcome = match trace_path {
        Some(path) => {
            let mut sink = WriterTrace::create(path)?;
            parser.parse_with_trace(&tokens, &mut sink)?
        }
        None => parser.parse(&tokens)?,
    };

    let mut out = output::stdout();
    if json {
        output::print_outcome_json(&mut out, &outcome, &tokens).map_err(stdout_error)?;
    } else {
        output::print_outcome(&mut out, &outcome, &tokens).map_err(stdout_error)?;
    }
    Ok(ExitCode::SUCCESS)
}

/// Handles the `grammar` subcommand.
fn handle_grammar(
    path: &Path,
    nonterminal: Option<&str>,
    config: &ParserConfig,
) -> Result<ExitCode, DescentError> {
    let grammar = load_grammar_file(path, config)?;
    let mut out = output::stdout();
    match nonterminal {
        Some(name) => {
            let alternatives = grammar.productions_for_name(name)?;
            output::print_alternatives(&mut out, &grammar, alternatives)
        }
        None => output::print_grammar(&mut out, &grammar),
    }
    .map_err(stdout_error)?;
    Ok(ExitCode::SUCCESS)
}

/// Handles the `check` subcommand. Exits with failure when there are errors.
fn handle_check(path: &Path, config: &ParserConfig) -> Result<ExitCode, DescentError> {
    let draft = read_grammar_file(path, config)?;
    let report = draft.validate();
    output::print_validation(&mut output::stdout(), &report).map_err(stdout_error)?;

    Ok(if report.is_valid() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
