//! Grammar Loader
//!
//! Reads the textual grammar description into a [`GrammarBuilder`]. The line
//! structure is described by `grammar.pest`; everything semantic (declared
//! sets, dangling symbols) is left to the validators run by `build`.

use std::path::Path;

use pest::{error::InputLocation, iterators::Pair, Parser};
use pest_derive::Parser;
use tracing::debug;

use super::{Grammar, GrammarBuilder};
use crate::config::ParserConfig;
use crate::errors::{to_source_span, DescentError, ErrorReporting, SourceContext};

#[derive(Parser)]
#[grammar = "grammar/grammar.pest"]
struct GrammarFileParser;

// ============================================================================
// PUBLIC API
// ============================================================================

/// Parses grammar text into a builder without validating it.
pub fn parse_grammar_str(
    text: &str,
    source: &SourceContext,
    config: &ParserConfig,
) -> Result<GrammarBuilder, DescentError> {
    let mut pairs = GrammarFileParser::parse(Rule::file, text)
        .map_err(|e| convert_parse_error(e, source))?;

    let Some(file) = pairs.next() else {
        return Err(source.grammar_syntax("empty grammar description", to_source_span(0..0)));
    };

    let mut builder = Grammar::builder();
    for pair in file.into_inner() {
        match pair.as_rule() {
            Rule::nonterminal_decl => {
                builder = builder.with_nonterminals(symbol_list(pair));
            }
            Rule::terminal_decl => {
                builder = builder.with_terminals(symbol_list(pair));
            }
            Rule::start_decl => {
                if let Some(symbol) = pair.into_inner().next() {
                    builder.set_start(symbol_text(symbol).0);
                }
            }
            Rule::production => add_production(&mut builder, pair, config),
            _ => {}
        }
    }

    debug!(
        target: "descent::grammar",
        source = %source.name,
        alternatives = builder.rules.len(),
        "grammar description parsed"
    );
    Ok(builder)
}

/// Parses and builds a grammar from text.
pub fn load_grammar_str(
    text: &str,
    name: &str,
    config: &ParserConfig,
) -> Result<Grammar, DescentError> {
    let source = SourceContext::from_file(name, text);
    parse_grammar_str(text, &source, config)?.build()
}

/// Reads a grammar file into a builder without validating it.
pub fn read_grammar_file(
    path: impl AsRef<Path>,
    config: &ParserConfig,
) -> Result<GrammarBuilder, DescentError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|e| DescentError::io(path, e))?;
    let source = SourceContext::from_file(path.display().to_string(), text.as_str());
    parse_grammar_str(&text, &source, config)
}

/// Reads, validates and builds a grammar file.
pub fn load_grammar_file(
    path: impl AsRef<Path>,
    config: &ParserConfig,
) -> Result<Grammar, DescentError> {
    read_grammar_file(path, config)?.build()
}

// ============================================================================
// PAIR WALKERS
// ============================================================================

fn symbol_list(decl: Pair<Rule>) -> Vec<String> {
    decl.into_inner()
        .filter(|p| p.as_rule() == Rule::symbol_list)
        .flat_map(|list| list.into_inner())
        .map(|symbol| symbol_text(symbol).0)
        .collect()
}

/// Returns the symbol's text and whether it was quoted.
fn symbol_text(symbol: Pair<Rule>) -> (String, bool) {
    match symbol.into_inner().next() {
        Some(inner) if inner.as_rule() == Rule::quoted => {
            let text = inner
                .into_inner()
                .next()
                .map(|p| p.as_str())
                .unwrap_or_default();
            (text.to_string(), true)
        }
        Some(inner) => (inner.as_str().to_string(), false),
        None => (String::new(), false),
    }
}

fn add_production(builder: &mut GrammarBuilder, pair: Pair<Rule>, config: &ParserConfig) {
    let mut inner = pair.into_inner();
    let Some(head) = inner.next() else {
        return;
    };
    let head = symbol_text(head).0;

    for alternative in inner {
        // An unquoted empty marker contributes nothing to the body.
        let body: Vec<String> = alternative
            .into_inner()
            .map(symbol_text)
            .filter(|(text, quoted)| *quoted || !config.is_empty_marker(text))
            .map(|(text, _)| text)
            .collect();
        builder.add_rule(head.clone(), body);
    }
}

// ============================================================================
// ERROR CONVERSION
// ============================================================================

fn convert_parse_error(error: pest::error::Error<Rule>, source: &SourceContext) -> DescentError {
    let span = match error.location {
        InputLocation::Pos(pos) => pos..pos,
        InputLocation::Span((start, end)) => start..end,
    };
    let error = error.renamed_rules(|rule| match rule {
        Rule::nonterminal_decl => "nonterminal declaration `N = { ... }`".into(),
        Rule::terminal_decl => "terminal declaration `E = { ... }`".into(),
        Rule::start_decl => "start declaration `S = ...`".into(),
        Rule::production => "production `X -> ... | ...`".into(),
        Rule::symbol | Rule::bare | Rule::quoted => "symbol".into(),
        other => format!("{:?}", other),
    });
    let message = error.variant.message().into_owned();
    source
        .grammar_syntax(&message, to_source_span(span))
        .with_help("expected N, E and S declaration lines followed by `X -> a $ B | c` productions")
}
