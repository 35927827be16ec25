//! Handles all user-facing output for the CLI.
//!
//! Every printer writes to a [`WriteColor`], so the same code drives the
//! terminal and in-memory buffers in tests. Colour is only used when stdout
//! is a terminal.

use std::io::{self, IsTerminal, Write};

use serde::Serialize;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::grammar::{Grammar, Production, ValidationResult};
use crate::parser::ParseOutcome;
use crate::tokens::TokenSequence;
use crate::tree::ParseTree;

/// Stdout stream, coloured only for terminals.
pub fn stdout() -> StandardStream {
    let choice = if io::stdout().is_terminal() {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };
    StandardStream::stdout(choice)
}

// ============================================================================
// PARSE RESULTS
// ============================================================================

/// Prints the verdict line, then the tree table and outline when accepted.
pub fn print_outcome(
    out: &mut impl WriteColor,
    outcome: &ParseOutcome,
    tokens: &TokenSequence,
) -> io::Result<()> {
    let color = if outcome.is_accepted() {
        Color::Green
    } else {
        Color::Red
    };
    out.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true))?;
    writeln!(out, "{}", outcome.verdict().describe(tokens))?;
    out.reset()?;

    match outcome.derivation().map(|d| &d.tree) {
        Some(Ok(tree)) => {
            writeln!(out)?;
            print_tree(out, tree)?;
        }
        Some(Err(reason)) => {
            out.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)))?;
            writeln!(out, "No parse tree: {}", reason)?;
            out.reset()?;
        }
        None => {}
    }
    Ok(())
}

pub fn print_tree(out: &mut impl WriteColor, tree: &ParseTree) -> io::Result<()> {
    heading(out, "Parse tree")?;
    write!(out, "{}", tree.render_table())?;
    writeln!(out)?;
    writeln!(out, "{}", tree)
}

#[derive(Serialize)]
struct OutcomeReport<'a> {
    tokens: &'a TokenSequence,
    accepted: bool,
    steps: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    furthest: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tree: Option<&'a ParseTree>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tree_error: Option<String>,
}

/// Prints the outcome as one pretty JSON document.
pub fn print_outcome_json(
    out: &mut impl Write,
    outcome: &ParseOutcome,
    tokens: &TokenSequence,
) -> io::Result<()> {
    let report = OutcomeReport {
        tokens,
        accepted: outcome.is_accepted(),
        steps: outcome.steps(),
        furthest: outcome.rejection().map(|r| r.furthest),
        tree: outcome.tree(),
        tree_error: outcome
            .derivation()
            .and_then(|d| d.tree.as_ref().err())
            .map(ToString::to_string),
    };
    serde_json::to_writer_pretty(&mut *out, &report)?;
    writeln!(out)
}

// ============================================================================
// GRAMMAR
// ============================================================================

pub fn print_grammar(out: &mut impl WriteColor, grammar: &Grammar) -> io::Result<()> {
    write!(out, "{}", grammar)
}

/// Prints alternatives as `X -> body [i]`, one per line.
pub fn print_alternatives(
    out: &mut impl WriteColor,
    grammar: &Grammar,
    alternatives: &[Production],
) -> io::Result<()> {
    for production in alternatives {
        writeln!(
            out,
            "{} -> {} [{}]",
            grammar.name(production.head),
            grammar.render_body(&production.body),
            production.index
        )?;
    }
    Ok(())
}

/// Prints a validation report grouped by severity.
pub fn print_validation(out: &mut impl WriteColor, result: &ValidationResult) -> io::Result<()> {
    let sections = [
        ("error", Color::Red, &result.errors),
        ("warning", Color::Yellow, &result.warnings),
        ("suggestion", Color::Cyan, &result.suggestions),
    ];
    for (label, color, messages) in sections {
        for message in messages {
            out.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true))?;
            write!(out, "{}", label)?;
            out.reset()?;
            writeln!(out, ": {}", message)?;
        }
    }

    if result.is_valid() {
        out.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
        writeln!(out, "grammar is valid")?;
        out.reset()?;
    }
    Ok(())
}

fn heading(out: &mut impl WriteColor, title: &str) -> io::Result<()> {
    out.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)).set_bold(true))?;
    writeln!(out, "{}", title)?;
    out.reset()
}
