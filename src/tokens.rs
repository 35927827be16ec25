//! Token sequence input.
//!
//! The automaton only consumes literal token text. Tokens come one per line,
//! whitespace-separated, or from a scanner's program internal form (PIF),
//! where each line carries the token literal in single quotes followed by
//! classification and position-table fields that are ignored here.

use std::fmt;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::errors::{to_source_span, DescentError, ErrorReporting, SourceContext};

/// Where the token text comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum TokenFormat {
    /// One token per line.
    #[default]
    Lines,
    /// Scanner output: the first single-quoted literal of each line.
    Pif,
    /// Whitespace-separated tokens.
    Words,
}

/// The fixed input of one parse run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TokenSequence {
    tokens: Vec<String>,
}

impl TokenSequence {
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tokens: tokens.into_iter().map(Into::into).collect(),
        }
    }

    /// One token per non-blank line, trimmed.
    pub fn from_lines(text: &str) -> Self {
        Self::new(text.lines().map(str::trim).filter(|line| !line.is_empty()))
    }

    pub fn from_words(text: &str) -> Self {
        Self::new(text.split_whitespace())
    }

    /// Extracts token literals from PIF text.
    pub fn from_pif(text: &str, source: &SourceContext) -> Result<Self, DescentError> {
        let mut tokens = Vec::new();
        let mut offset = 0;

        for (number, line) in text.split_inclusive('\n').enumerate() {
            let span = offset..offset + line.trim_end().len();
            offset += line.len();

            if line.trim().is_empty() {
                continue;
            }
            let Some(captures) = PIF_LITERAL.captures(line) else {
                return Err(source.invalid_tokens(
                    &format!("line {} has no quoted token literal", number + 1),
                    to_source_span(span),
                ));
            };
            tokens.push(captures[1].to_string());
        }

        Ok(Self { tokens })
    }

    /// Parses `text` in the given format.
    pub fn parse(text: &str, format: TokenFormat, name: &str) -> Result<Self, DescentError> {
        match format {
            TokenFormat::Lines => Ok(Self::from_lines(text)),
            TokenFormat::Words => Ok(Self::from_words(text)),
            TokenFormat::Pif => Self::from_pif(text, &SourceContext::from_file(name, text)),
        }
    }

    /// Reads a token file in the given format.
    pub fn load(path: impl AsRef<Path>, format: TokenFormat) -> Result<Self, DescentError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| DescentError::io(path, e))?;
        Self::parse(&text, format, &path.display().to_string())
    }

    pub fn as_slice(&self) -> &[String] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(String::as_str)
    }
}

impl fmt::Display for TokenSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.tokens.join(", "))
    }
}

impl<S: Into<String>> FromIterator<S> for TokenSequence {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}

static PIF_LITERAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"'([^'\n]*)'").unwrap());
