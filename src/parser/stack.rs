//! Automaton state: the four parsing states, working-stack entries, and the
//! configuration (state, position, both stacks) mutated by the transitions.

use std::fmt;

use serde::Serialize;

use crate::errors::{DescentError, ErrorKind};
use crate::grammar::{Grammar, ProductionIndex, Symbol, SymbolId};

/// Parsing state. Success and error are absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParserState {
    /// `q`
    Normal,
    /// `b`
    Backtrack,
    /// `f`
    Success,
    /// `e`
    Error,
}

impl ParserState {
    /// Single-letter name used in traces.
    pub const fn letter(self) -> char {
        match self {
            ParserState::Normal => 'q',
            ParserState::Backtrack => 'b',
            ParserState::Success => 'f',
            ParserState::Error => 'e',
        }
    }

    pub const fn is_final(self) -> bool {
        matches!(self, ParserState::Success | ParserState::Error)
    }
}

impl fmt::Display for ParserState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// One entry of the working stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StackEntry {
    /// A matched terminal.
    Terminal(SymbolId),
    /// An expansion choice still in effect.
    Expansion {
        nonterminal: SymbolId,
        production: ProductionIndex,
    },
}

impl StackEntry {
    /// The grammar symbol this entry stands for.
    pub fn symbol(self) -> Symbol {
        match self {
            StackEntry::Terminal(id) => Symbol::Terminal(id),
            StackEntry::Expansion { nonterminal, .. } => Symbol::Nonterminal(nonterminal),
        }
    }

    pub fn render(self, grammar: &Grammar) -> String {
        match self {
            StackEntry::Terminal(id) => grammar.name(id).to_string(),
            StackEntry::Expansion {
                nonterminal,
                production,
            } => format!("({}, {})", grammar.name(nonterminal), production),
        }
    }
}

/// Snapshot-able automaton configuration.
///
/// The input stack is stored back to front: its last element is the front
/// (the next symbol to process), so prepending a body is a push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    pub state: ParserState,
    pub position: usize,
    pub working: Vec<StackEntry>,
    input: Vec<Symbol>,
}

impl Configuration {
    /// `input = [start]`, empty working stack, position 0, normal state.
    pub fn initial(start: SymbolId) -> Self {
        Self {
            state: ParserState::Normal,
            position: 0,
            working: Vec::new(),
            input: vec![Symbol::Nonterminal(start)],
        }
    }

    /// Builds an arbitrary configuration; `input` is given front first.
    pub fn from_parts(
        state: ParserState,
        position: usize,
        working: Vec<StackEntry>,
        input: impl IntoIterator<Item = Symbol>,
    ) -> Self {
        let mut input: Vec<Symbol> = input.into_iter().collect();
        input.reverse();
        Self {
            state,
            position,
            working,
            input,
        }
    }

    pub fn input_front(&self) -> Option<Symbol> {
        self.input.last().copied()
    }

    pub fn input_is_empty(&self) -> bool {
        self.input.is_empty()
    }

    pub fn input_len(&self) -> usize {
        self.input.len()
    }

    /// Input symbols, front first.
    pub fn input(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.input.iter().rev().copied()
    }

    pub(crate) fn pop_front(&mut self) -> Option<Symbol> {
        self.input.pop()
    }

    /// Prepends `symbols` so that `symbols[0]` becomes the front.
    pub(crate) fn push_front(&mut self, symbols: &[Symbol]) {
        self.input.extend(symbols.iter().rev());
    }

    /// Removes the `count` front symbols.
    pub(crate) fn drop_front(&mut self, count: usize) -> Result<(), DescentError> {
        let Some(keep) = self.input.len().checked_sub(count) else {
            return Err(ErrorKind::MalformedTrace {
                reason: format!(
                    "cannot remove {} expanded symbols from an input stack of {}",
                    count,
                    self.input.len()
                ),
            }
            .into());
        };
        self.input.truncate(keep);
        Ok(())
    }

    pub fn render_working(&self, grammar: &Grammar) -> String {
        let entries: Vec<_> = self.working.iter().map(|e| e.render(grammar)).collect();
        format!("[{}]", entries.join(", "))
    }

    pub fn render_input(&self, grammar: &Grammar) -> String {
        let symbols: Vec<_> = self.input().map(|s| grammar.symbol_name(s)).collect();
        format!("[{}]", symbols.join(", "))
    }
}
