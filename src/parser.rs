//! Backtracking recursive-descent automaton.
//!
//! The automaton walks a configuration `(state, position, working, input)`
//! through six transitions until it reaches success or error. Alternatives
//! are tried in declaration order; on failure the most recent choice is
//! revised first, so the first derivation found in that order is the one
//! reported.
//!
//! [`Parser`] is the convenient driver. [`Automaton`] exposes the individual
//! transitions for stepping, testing and tracing.

pub mod stack;
pub mod trace;

use tracing::{debug, trace, warn};

use crate::config::ParserConfig;
use crate::errors::{DescentError, ErrorKind};
use crate::grammar::{Grammar, Symbol, SymbolId};
use crate::tokens::TokenSequence;
use crate::tree::ParseTree;
pub use stack::{Configuration, ParserState, StackEntry};
pub use trace::{
    NullTrace, OwnedTraceRecord, TraceBuffer, TraceRecord, TraceSink, Transition, Verdict,
    WriterTrace,
};

// ============================================================================
// OUTCOMES
// ============================================================================

/// Result of a finished run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    Accepted(Derivation),
    Rejected(Rejection),
}

/// An accepted run: the final working stack and the tree rebuilt from it.
///
/// Acceptance does not depend on the rebuild. When the tree cannot be built
/// (it nests deeper than `max_tree_depth`, or the stack is malformed) the
/// run is still accepted and `tree` holds the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Derivation {
    pub working_stack: Vec<StackEntry>,
    pub tree: Result<ParseTree, ErrorKind>,
    pub steps: usize,
}

/// A rejected run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rejection {
    /// Position at which the error state was entered. Always 0: rejection is
    /// only declared once every choice for the start symbol is exhausted.
    pub position: usize,
    /// Furthest position any advance reached.
    pub furthest: usize,
    pub steps: usize,
}

impl ParseOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ParseOutcome::Accepted(_))
    }

    pub fn derivation(&self) -> Option<&Derivation> {
        match self {
            ParseOutcome::Accepted(derivation) => Some(derivation),
            ParseOutcome::Rejected(_) => None,
        }
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            ParseOutcome::Accepted(_) => None,
            ParseOutcome::Rejected(rejection) => Some(rejection),
        }
    }

    pub fn tree(&self) -> Option<&ParseTree> {
        self.derivation().and_then(|d| d.tree.as_ref().ok())
    }

    pub fn steps(&self) -> usize {
        match self {
            ParseOutcome::Accepted(d) => d.steps,
            ParseOutcome::Rejected(r) => r.steps,
        }
    }

    pub fn verdict(&self) -> Verdict {
        match self {
            ParseOutcome::Accepted(_) => Verdict::Accepted,
            ParseOutcome::Rejected(r) => Verdict::Rejected {
                furthest: r.furthest,
            },
        }
    }
}

// ============================================================================
// DRIVER
// ============================================================================

/// Runs the automaton over token sequences for one grammar.
#[derive(Debug, Clone)]
pub struct Parser<'g> {
    grammar: &'g Grammar,
    config: ParserConfig,
}

impl<'g> Parser<'g> {
    pub fn new(grammar: &'g Grammar) -> Self {
        Self {
            grammar,
            config: ParserConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ParserConfig) -> Self {
        self.config = config;
        self
    }

    pub fn grammar(&self) -> &'g Grammar {
        self.grammar
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// A fresh automaton in the initial configuration for `tokens`.
    pub fn automaton(&self, tokens: &TokenSequence) -> Automaton<'g> {
        Automaton::new(self.grammar, tokens)
    }

    pub fn parse(&self, tokens: &TokenSequence) -> Result<ParseOutcome, DescentError> {
        self.parse_with_trace(tokens, &mut NullTrace)
    }

    /// Parses `tokens`, reporting every transition and the verdict to `sink`.
    pub fn parse_with_trace(
        &self,
        tokens: &TokenSequence,
        sink: &mut dyn TraceSink,
    ) -> Result<ParseOutcome, DescentError> {
        let mut automaton = self.automaton(tokens);
        automaton.run(sink, self.config.max_steps)?;
        let outcome = automaton.into_outcome(self.config.max_tree_depth)?;

        sink.finish(&outcome.verdict(), tokens)
            .map_err(|e| DescentError::io("trace", e))?;

        debug!(
            target: "descent::parser",
            tokens = tokens.len(),
            steps = outcome.steps(),
            accepted = outcome.is_accepted(),
            "parse finished"
        );
        Ok(outcome)
    }
}

// ============================================================================
// AUTOMATON
// ============================================================================

/// The parsing automaton over one grammar and one token sequence.
#[derive(Debug, Clone)]
pub struct Automaton<'g> {
    grammar: &'g Grammar,
    /// Tokens resolved to terminals; `None` for text that names no terminal.
    tokens: Vec<Option<SymbolId>>,
    config: Configuration,
    furthest: usize,
    steps: usize,
}

impl<'g> Automaton<'g> {
    pub fn new(grammar: &'g Grammar, tokens: &TokenSequence) -> Self {
        Self::with_configuration(grammar, tokens, Configuration::initial(grammar.start()))
    }

    /// Starts from an arbitrary configuration.
    pub fn with_configuration(
        grammar: &'g Grammar,
        tokens: &TokenSequence,
        config: Configuration,
    ) -> Self {
        let tokens: Vec<_> = tokens
            .iter()
            .map(|text| match grammar.symbol(text) {
                Some(Symbol::Terminal(id)) => Some(id),
                _ => None,
            })
            .collect();
        let unknown = tokens.iter().filter(|t| t.is_none()).count();
        if unknown > 0 {
            debug!(
                target: "descent::parser",
                unknown,
                "tokens that name no terminal can never be matched"
            );
        }

        let furthest = config.position;
        Self {
            grammar,
            tokens,
            config,
            furthest,
            steps: 0,
        }
    }

    pub fn configuration(&self) -> &Configuration {
        &self.config
    }

    pub fn state(&self) -> ParserState {
        self.config.state
    }

    pub fn position(&self) -> usize {
        self.config.position
    }

    pub fn furthest(&self) -> usize {
        self.furthest
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    /// The transition the driver would apply next, or `None` once the state
    /// is final.
    pub fn next_transition(&self) -> Option<Transition> {
        let config = &self.config;
        match config.state {
            ParserState::Success | ParserState::Error => None,
            ParserState::Normal => Some(match config.input_front() {
                None if config.position == self.tokens.len() => Transition::Success,
                None => Transition::MomentaryInsuccess,
                Some(Symbol::Nonterminal(_)) => Transition::Expand,
                Some(Symbol::Terminal(id)) if self.current_token() == Some(id) => {
                    Transition::Advance
                }
                Some(Symbol::Terminal(_)) => Transition::MomentaryInsuccess,
            }),
            ParserState::Backtrack => Some(match config.working.last() {
                Some(StackEntry::Terminal(_)) => Transition::Back,
                Some(StackEntry::Expansion { .. }) | None => Transition::AnotherTry,
            }),
        }
    }

    /// Decides and applies one transition.
    pub fn step(&mut self) -> Result<Option<Transition>, DescentError> {
        let Some(transition) = self.next_transition() else {
            return Ok(None);
        };
        self.apply(transition)?;
        Ok(Some(transition))
    }

    /// Applies `transition` regardless of whether the driver would pick it.
    pub fn apply(&mut self, transition: Transition) -> Result<(), DescentError> {
        trace!(
            target: "descent::parser",
            transition = transition.name(),
            state = %self.config.state,
            position = self.config.position,
            working = self.config.working.len(),
            input = self.config.input_len(),
            "apply"
        );
        match transition {
            Transition::Expand => self.expand()?,
            Transition::Advance => self.advance()?,
            Transition::MomentaryInsuccess => self.momentary_insuccess(),
            Transition::Back => self.back()?,
            Transition::AnotherTry => self.another_try()?,
            Transition::Success => self.success(),
        }
        self.steps += 1;
        Ok(())
    }

    /// Drives the automaton to a final state. `max_steps == 0` disables the
    /// step guard.
    pub fn run(
        &mut self,
        sink: &mut dyn TraceSink,
        max_steps: usize,
    ) -> Result<ParserState, DescentError> {
        while let Some(transition) = self.next_transition() {
            if max_steps != 0 && self.steps >= max_steps {
                warn!(
                    target: "descent::parser",
                    limit = max_steps,
                    position = self.config.position,
                    "step limit reached"
                );
                return Err(ErrorKind::StepLimitExceeded { limit: max_steps }.into());
            }
            if sink.enabled() {
                sink.record(&TraceRecord::new(self.grammar, transition, &self.config))
                    .map_err(|e| DescentError::io("trace", e))?;
            }
            self.apply(transition)?;
        }
        Ok(self.config.state)
    }

    /// Converts a finished run into its outcome.
    pub fn into_outcome(self, max_tree_depth: usize) -> Result<ParseOutcome, DescentError> {
        match self.config.state {
            ParserState::Success => {
                let tree =
                    ParseTree::from_working_stack(self.grammar, &self.config.working, max_tree_depth)
                        .map_err(|e| e.kind);
                if let Err(reason) = &tree {
                    warn!(target: "descent::parser", %reason, "accepted without a parse tree");
                }
                Ok(ParseOutcome::Accepted(Derivation {
                    working_stack: self.config.working,
                    tree,
                    steps: self.steps,
                }))
            }
            ParserState::Error => Ok(ParseOutcome::Rejected(Rejection {
                position: self.config.position,
                furthest: self.furthest,
                steps: self.steps,
            })),
            state => Err(stack_violation(format!(
                "run has not finished (state {})",
                state
            ))),
        }
    }

    // ------------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------------

    /// Replaces the front nonterminal by the body of its first alternative.
    pub fn expand(&mut self) -> Result<(), DescentError> {
        let front = self
            .config
            .input_front()
            .ok_or_else(|| stack_violation("expand on an empty input stack"))?;
        let Symbol::Nonterminal(nonterminal) = front else {
            return Err(ErrorKind::UndefinedNonterminal {
                symbol: self.grammar.symbol_name(front).into(),
            }
            .into());
        };
        let first = self
            .grammar
            .productions_for(nonterminal)?
            .first()
            .ok_or_else(|| {
                DescentError::from(ErrorKind::UndefinedNonterminal {
                    symbol: self.grammar.name(nonterminal).into(),
                })
            })?;

        self.config.pop_front();
        self.config.working.push(StackEntry::Expansion {
            nonterminal,
            production: first.index,
        });
        self.config.push_front(&first.body);
        Ok(())
    }

    /// Moves the front terminal onto the working stack.
    pub fn advance(&mut self) -> Result<(), DescentError> {
        let Some(Symbol::Terminal(terminal)) = self.config.input_front() else {
            return Err(stack_violation("advance needs a terminal at the input front"));
        };
        self.config.pop_front();
        self.config.working.push(StackEntry::Terminal(terminal));
        self.config.position += 1;
        self.furthest = self.furthest.max(self.config.position);
        Ok(())
    }

    pub fn momentary_insuccess(&mut self) {
        self.config.state = ParserState::Backtrack;
    }

    /// Returns the most recently matched terminal to the input.
    pub fn back(&mut self) -> Result<(), DescentError> {
        let Some(StackEntry::Terminal(terminal)) = self.config.working.last().copied() else {
            return Err(stack_violation("back needs a terminal on top of the working stack"));
        };
        let position = self
            .config
            .position
            .checked_sub(1)
            .ok_or_else(|| stack_violation("back at position 0"))?;

        self.config.working.pop();
        self.config.push_front(&[Symbol::Terminal(terminal)]);
        self.config.position = position;
        Ok(())
    }

    /// Revises the most recent expansion: tries the next alternative, gives
    /// the nonterminal back to the input when none is left, or stops with an
    /// error once the start symbol is exhausted at position 0.
    pub fn another_try(&mut self) -> Result<(), DescentError> {
        let Some(top) = self.config.working.last().copied() else {
            self.config.state = ParserState::Error;
            return Ok(());
        };
        let StackEntry::Expansion {
            nonterminal,
            production,
        } = top
        else {
            return Err(stack_violation(
                "another try needs an expansion on top of the working stack",
            ));
        };
        let current_len = self.grammar.alternative_at(nonterminal, production)?.body.len();

        if self.grammar.has_next_alternative(nonterminal, production)? {
            let next = self
                .grammar
                .next_alternative(nonterminal, production)?
                .ok_or_else(|| {
                    DescentError::from(ErrorKind::NoSuchProduction {
                        nonterminal: self.grammar.name(nonterminal).into(),
                        index: production.get() + 1,
                    })
                })?;
            self.config.drop_front(current_len)?;
            self.config.working.pop();
            self.config.working.push(StackEntry::Expansion {
                nonterminal,
                production: next.index,
            });
            self.config.push_front(&next.body);
            self.config.state = ParserState::Normal;
        } else if self.config.position == 0 && nonterminal == self.grammar.start() {
            self.config.working.pop();
            self.config.state = ParserState::Error;
        } else {
            self.config.drop_front(current_len)?;
            self.config.working.pop();
            self.config.push_front(&[Symbol::Nonterminal(nonterminal)]);
        }
        Ok(())
    }

    pub fn success(&mut self) {
        self.config.state = ParserState::Success;
    }

    fn current_token(&self) -> Option<SymbolId> {
        self.tokens.get(self.config.position).copied().flatten()
    }
}

fn stack_violation(reason: impl Into<String>) -> DescentError {
    ErrorKind::MalformedTrace {
        reason: reason.into(),
    }
    .into()
}
