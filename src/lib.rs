//! Descent: a backtracking recursive-descent recognizer for context-free
//! grammars.
//!
//! Load a [`Grammar`], run a [`Parser`] over a [`TokenSequence`], and read the
//! [`ParseOutcome`]: an accepted derivation carries its [`ParseTree`], a
//! rejection carries the furthest index reached.
//!
//! ```
//! use descent::{load_grammar_str, ParserConfig, Parser, TokenSequence};
//!
//! let text = "N = { S, A }\nE = { a, b }\nS = S\nS -> a $ A\nA -> b $ A | b\n";
//! let grammar = load_grammar_str(text, "g1", &ParserConfig::default()).unwrap();
//! let outcome = Parser::new(&grammar).parse(&TokenSequence::new(["a", "b"])).unwrap();
//! assert!(outcome.is_accepted());
//! ```

pub mod cli;
pub mod config;
pub mod errors;
pub mod grammar;
pub mod parser;
pub mod tokens;
pub mod tree;

pub use crate::config::ParserConfig;
pub use crate::errors::{DescentError, ErrorCategory, ErrorKind};
pub use crate::grammar::loader::{load_grammar_file, load_grammar_str};
pub use crate::grammar::{Grammar, GrammarBuilder, Production, ProductionIndex, Symbol, SymbolId};
pub use crate::parser::{
    Automaton, Derivation, ParseOutcome, Parser, ParserState, Rejection, StackEntry, TraceSink,
    Transition,
};
pub use crate::tokens::{TokenFormat, TokenSequence};
pub use crate::tree::{Node, ParseTree};
