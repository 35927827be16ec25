//! Derivation traces.
//!
//! Every transition is reported to a [`TraceSink`] together with the
//! configuration it was applied to. A text sink reproduces the block format
//! below; a buffering sink keeps owned records for inspection or JSON output.
//!
//! ```text
//! --------------
//! expand
//! State: q Index: 0
//! Working stack: []
//! Input stack: [S]
//! ```

use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use super::stack::{Configuration, ParserState};
use crate::errors::DescentError;
use crate::grammar::Grammar;
use crate::tokens::TokenSequence;

const SEPARATOR: &str = "--------------";

/// The six automaton moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    Expand,
    Advance,
    MomentaryInsuccess,
    Back,
    AnotherTry,
    Success,
}

impl Transition {
    pub const fn name(self) -> &'static str {
        match self {
            Transition::Expand => "expand",
            Transition::Advance => "advance",
            Transition::MomentaryInsuccess => "momentary insuccess",
            Transition::Back => "back",
            Transition::AnotherTry => "another try",
            Transition::Success => "success",
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Final outcome reported to a sink once the automaton stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "lowercase")]
pub enum Verdict {
    Accepted,
    Rejected { furthest: usize },
}

impl Verdict {
    /// The closing trace line for `tokens`.
    pub fn describe(&self, tokens: &TokenSequence) -> String {
        match self {
            Verdict::Accepted => format!("Sequence {} is accepted!", tokens),
            Verdict::Rejected { furthest } => {
                format!("Sequence {} is rejected at index {}!", tokens, furthest)
            }
        }
    }
}

/// A transition about to be applied, borrowing the live configuration.
#[derive(Clone, Copy)]
pub struct TraceRecord<'a> {
    pub transition: Transition,
    pub configuration: &'a Configuration,
    grammar: &'a Grammar,
}

impl<'a> TraceRecord<'a> {
    pub fn new(
        grammar: &'a Grammar,
        transition: Transition,
        configuration: &'a Configuration,
    ) -> Self {
        Self {
            transition,
            configuration,
            grammar,
        }
    }

    pub fn to_owned_record(&self) -> OwnedTraceRecord {
        OwnedTraceRecord {
            transition: self.transition,
            state: self.configuration.state,
            position: self.configuration.position,
            working: self
                .configuration
                .working
                .iter()
                .map(|entry| entry.render(self.grammar))
                .collect(),
            input: self
                .configuration
                .input()
                .map(|symbol| self.grammar.symbol_name(symbol).to_string())
                .collect(),
        }
    }
}

impl fmt::Display for TraceRecord<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", SEPARATOR)?;
        writeln!(f, "{}", self.transition)?;
        writeln!(
            f,
            "State: {} Index: {}",
            self.configuration.state, self.configuration.position
        )?;
        writeln!(
            f,
            "Working stack: {}",
            self.configuration.render_working(self.grammar)
        )?;
        write!(
            f,
            "Input stack: {}",
            self.configuration.render_input(self.grammar)
        )
    }
}

/// A trace record with symbol names resolved, detached from the automaton.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OwnedTraceRecord {
    pub transition: Transition,
    pub state: ParserState,
    pub position: usize,
    pub working: Vec<String>,
    pub input: Vec<String>,
}

// ============================================================================
// SINKS
// ============================================================================

/// Receives the derivation trace of one run.
pub trait TraceSink {
    /// Sinks that return `false` are skipped without building records.
    fn enabled(&self) -> bool {
        true
    }

    fn record(&mut self, record: &TraceRecord<'_>) -> io::Result<()>;

    fn finish(&mut self, verdict: &Verdict, tokens: &TokenSequence) -> io::Result<()>;
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTrace;

impl TraceSink for NullTrace {
    fn enabled(&self) -> bool {
        false
    }

    fn record(&mut self, _record: &TraceRecord<'_>) -> io::Result<()> {
        Ok(())
    }

    fn finish(&mut self, _verdict: &Verdict, _tokens: &TokenSequence) -> io::Result<()> {
        Ok(())
    }
}

/// Collects owned records in memory.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TraceBuffer {
    pub records: Vec<OwnedTraceRecord>,
    pub verdict: Option<Verdict>,
}

impl TraceBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transitions(&self) -> impl Iterator<Item = Transition> + '_ {
        self.records.iter().map(|r| r.transition)
    }
}

impl TraceSink for TraceBuffer {
    fn record(&mut self, record: &TraceRecord<'_>) -> io::Result<()> {
        self.records.push(record.to_owned_record());
        Ok(())
    }

    fn finish(&mut self, verdict: &Verdict, _tokens: &TokenSequence) -> io::Result<()> {
        self.verdict = Some(*verdict);
        Ok(())
    }
}

/// Writes text blocks to any writer, ending with the verdict line.
pub struct WriterTrace<W: Write> {
    writer: W,
}

impl<W: Write> WriterTrace<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl WriterTrace<BufWriter<File>> {
    /// Creates (or truncates) a trace file.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, DescentError> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| DescentError::io(path, e))?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> TraceSink for WriterTrace<W> {
    fn record(&mut self, record: &TraceRecord<'_>) -> io::Result<()> {
        writeln!(self.writer, "{}", record)
    }

    fn finish(&mut self, verdict: &Verdict, tokens: &TokenSequence) -> io::Result<()> {
        writeln!(self.writer, "{}", SEPARATOR)?;
        writeln!(self.writer, "{}", verdict.describe(tokens))?;
        self.writer.flush()
    }
}
