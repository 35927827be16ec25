//! Descent Error Handling - Unified API
//!
//! Every failure the library can report is a [`DescentError`]: a kind (what
//! went wrong), optional source information (where), and diagnostic info (how
//! to help). Rejection of a token sequence is *not* an error; it travels on
//! the `Ok` channel as [`crate::parser::ParseOutcome::Rejected`].

use miette::{Diagnostic, LabeledSpan, NamedSource, SourceSpan};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

// ============================================================================
// SOURCE CONTEXT - Error reporting infrastructure
// ============================================================================

/// Named text that an error can point into (a grammar file, a token file).
#[derive(Debug, Clone)]
pub struct SourceContext {
    pub name: String,
    pub content: String,
}

impl SourceContext {
    /// Create a source context from real file content
    pub fn from_file(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Convert to NamedSource for use with miette error reporting
    pub fn to_named_source(&self) -> Arc<NamedSource<String>> {
        Arc::new(NamedSource::new(self.name.clone(), self.content.clone()))
    }
}

// ============================================================================
// ERROR TYPES
// ============================================================================

/// The single error type of the crate.
#[derive(Debug)]
pub struct DescentError {
    /// What went wrong
    pub kind: ErrorKind,
    /// Where it happened, when the failure is tied to source text
    pub source_info: Option<SourceInfo>,
    /// How to help
    pub diagnostic_info: DiagnosticInfo,
}

/// All failure modes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorKind {
    // Grammar construction
    #[error("grammar syntax error: {message}")]
    GrammarSyntax { message: String },
    #[error("invalid grammar: {}", violations.join("; "))]
    InvalidGrammar { violations: Vec<String> },

    // Contract violations: the driver asked for something that does not exist
    #[error("'{symbol}' is not a nonterminal with productions")]
    UndefinedNonterminal { symbol: String },
    #[error("nonterminal '{nonterminal}' has no production with index {index}")]
    NoSuchProduction { nonterminal: String, index: usize },

    // Runtime guards
    #[error("parse aborted after {limit} steps without reaching a verdict")]
    StepLimitExceeded { limit: usize },
    #[error("derivation trace is malformed: {reason}")]
    MalformedTrace { reason: String },
    #[error("parse tree is deeper than the configured limit of {limit}")]
    TreeDepthExceeded { limit: usize },

    // Inputs and environment
    #[error("invalid token input: {message}")]
    InvalidTokenInput { message: String },
    #[error("cannot access '{path}': {message}")]
    Io { path: String, message: String },
    #[error("configuration error: {message}")]
    Config { message: String },
}

/// Context-specific source information
#[derive(Debug, Clone)]
pub struct SourceInfo {
    pub source: Arc<NamedSource<String>>,
    pub primary_span: SourceSpan,
    pub phase: String,
}

/// Diagnostic enhancement data
#[derive(Debug, Clone, Default)]
pub struct DiagnosticInfo {
    pub help: Option<String>,
    pub error_code: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Grammar,
    Contract,
    Runtime,
    Input,
}

impl ErrorKind {
    /// Get the error category for test assertions
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::GrammarSyntax { .. } | Self::InvalidGrammar { .. } => ErrorCategory::Grammar,

            Self::UndefinedNonterminal { .. } | Self::NoSuchProduction { .. } => {
                ErrorCategory::Contract
            }

            Self::StepLimitExceeded { .. }
            | Self::MalformedTrace { .. }
            | Self::TreeDepthExceeded { .. } => ErrorCategory::Runtime,

            Self::InvalidTokenInput { .. } | Self::Io { .. } | Self::Config { .. } => {
                ErrorCategory::Input
            }
        }
    }

    /// Get error code suffix for diagnostic codes
    pub const fn code_suffix(&self) -> &'static str {
        match self {
            Self::GrammarSyntax { .. } => "syntax",
            Self::InvalidGrammar { .. } => "invalid_grammar",
            Self::UndefinedNonterminal { .. } => "undefined_nonterminal",
            Self::NoSuchProduction { .. } => "no_such_production",
            Self::StepLimitExceeded { .. } => "step_limit",
            Self::MalformedTrace { .. } => "malformed_trace",
            Self::TreeDepthExceeded { .. } => "tree_depth",
            Self::InvalidTokenInput { .. } => "invalid_tokens",
            Self::Io { .. } => "io",
            Self::Config { .. } => "config",
        }
    }

    fn phase(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Grammar => "grammar",
            ErrorCategory::Contract => "contract",
            ErrorCategory::Runtime => "parser",
            ErrorCategory::Input => "input",
        }
    }

    fn default_help(&self) -> Option<String> {
        match self {
            Self::UndefinedNonterminal { .. } | Self::NoSuchProduction { .. } => Some(
                "This is a driver bug, not a parse failure. Only query symbols the grammar declares."
                    .into(),
            ),
            Self::StepLimitExceeded { .. } => Some(
                "The grammar is probably left-recursive. Raise `max_steps` or rewrite the recursion."
                    .into(),
            ),
            Self::InvalidGrammar { .. } => {
                Some("Run `descent check` for the full validation report.".into())
            }
            _ => None,
        }
    }
}

// ============================================================================
// CONSTRUCTION
// ============================================================================

impl From<ErrorKind> for DescentError {
    fn from(kind: ErrorKind) -> Self {
        let error_code = format!("descent::{}::{}", kind.phase(), kind.code_suffix());
        let help = kind.default_help();
        DescentError {
            kind,
            source_info: None,
            diagnostic_info: DiagnosticInfo { help, error_code },
        }
    }
}

impl DescentError {
    /// Attach (or replace) a help message.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.diagnostic_info.help = Some(help.into());
        self
    }

    /// Build an I/O error for a path.
    pub fn io(path: impl AsRef<std::path::Path>, err: std::io::Error) -> Self {
        ErrorKind::Io {
            path: path.as_ref().display().to_string(),
            message: err.to_string(),
        }
        .into()
    }

    pub fn category(&self) -> ErrorCategory {
        self.kind.category()
    }
}

/// Context-aware error creation for code that holds source text.
pub trait ErrorReporting {
    /// Create an error pointing into this context's source.
    fn report(&self, kind: ErrorKind, span: SourceSpan) -> DescentError;

    fn grammar_syntax(&self, message: &str, span: SourceSpan) -> DescentError {
        self.report(
            ErrorKind::GrammarSyntax {
                message: message.into(),
            },
            span,
        )
    }

    fn invalid_tokens(&self, message: &str, span: SourceSpan) -> DescentError {
        self.report(
            ErrorKind::InvalidTokenInput {
                message: message.into(),
            },
            span,
        )
    }
}

impl ErrorReporting for SourceContext {
    fn report(&self, kind: ErrorKind, span: SourceSpan) -> DescentError {
        let mut error = DescentError::from(kind);
        error.source_info = Some(SourceInfo {
            source: self.to_named_source(),
            primary_span: span,
            phase: error.kind.phase().into(),
        });
        error
    }
}

// ============================================================================
// TRAIT IMPLEMENTATIONS
// ============================================================================

impl std::error::Error for DescentError {}

impl fmt::Display for DescentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.kind, f)
    }
}

impl Diagnostic for DescentError {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(&self.diagnostic_info.error_code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.diagnostic_info
            .help
            .as_ref()
            .map(|h| Box::new(h) as Box<dyn fmt::Display + 'a>)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let info = self.source_info.as_ref()?;
        let labels = vec![LabeledSpan::new_with_span(
            Some(self.primary_label().into()),
            info.primary_span,
        )];
        Some(Box::new(labels.into_iter()))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        self.source_info
            .as_ref()
            .map(|info| &*info.source as &dyn miette::SourceCode)
    }
}

impl DescentError {
    fn primary_label(&self) -> &'static str {
        match &self.kind {
            ErrorKind::GrammarSyntax { .. } => "unexpected input here",
            ErrorKind::InvalidGrammar { .. } => "invalid declaration",
            ErrorKind::InvalidTokenInput { .. } => "no token on this line",
            _ => "here",
        }
    }
}

// ============================================================================
// ERROR FORMATTING UTILITIES
// ============================================================================

/// Converts a byte range into a miette span.
pub fn to_source_span(range: std::ops::Range<usize>) -> SourceSpan {
    SourceSpan::from(range)
}

/// Prints a DescentError with full miette diagnostics
pub fn print_error(error: DescentError) {
    use miette::Report;
    let report = Report::new(error);
    eprintln!("{report:?}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_code_follows_phase_and_suffix() {
        let err = DescentError::from(ErrorKind::UndefinedNonterminal { symbol: "X".into() });
        assert_eq!(
            err.diagnostic_info.error_code,
            "descent::contract::undefined_nonterminal"
        );
        assert_eq!(err.category(), ErrorCategory::Contract);
        assert!(err.diagnostic_info.help.is_some());
    }

    #[test]
    fn invalid_grammar_lists_every_violation() {
        let err = DescentError::from(ErrorKind::InvalidGrammar {
            violations: vec!["first".into(), "second".into()],
        });
        assert_eq!(err.to_string(), "invalid grammar: first; second");
    }

    #[test]
    fn source_context_attaches_labels() {
        let ctx = SourceContext::from_file("g.txt", "N = S\nbroken");
        let err = ctx.grammar_syntax("expected terminals", to_source_span(6..12));
        assert!(err.source_code().is_some());
        let labels: Vec<_> = err.labels().unwrap().collect();
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].offset(), 6);
    }
}
