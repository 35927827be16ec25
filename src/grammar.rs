//! Grammar model.
//!
//! An indexed, immutable representation of a context-free grammar. Every
//! production carries a global [`ProductionIndex`] assigned in declaration
//! order; the alternatives of one nonterminal are kept in that same order,
//! which is the tie-break the automaton relies on.

pub mod loader;
pub mod validators;

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use tracing::{debug, warn};

use crate::errors::{DescentError, ErrorKind};
pub use validators::{ValidationReporter, ValidationResult};

// =============================================================================
// SYMBOLS AND PRODUCTIONS
// =============================================================================

/// Interned symbol name. Only meaningful together with the [`Grammar`] that
/// produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SymbolId(u32);

impl SymbolId {
    fn from_usize(index: usize) -> Result<Self, DescentError> {
        u32::try_from(index).map(SymbolId).map_err(|_| {
            ErrorKind::InvalidGrammar {
                violations: vec![format!(
                    "too many symbols: at most {} can be declared",
                    u64::from(u32::MAX) + 1
                )],
            }
            .into()
        })
    }

    fn as_usize(self) -> usize {
        self.0 as usize
    }
}

/// A symbol of a production body.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Symbol {
    Terminal(SymbolId),
    Nonterminal(SymbolId),
}

impl Symbol {
    pub fn id(self) -> SymbolId {
        match self {
            Symbol::Terminal(id) | Symbol::Nonterminal(id) => id,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Symbol::Terminal(_))
    }
}

/// List of [`Symbol`]s a nonterminal maps to. Empty for the empty alternative.
pub type Body = Vec<Symbol>;

/// Global, 1-based production number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ProductionIndex(usize);

impl ProductionIndex {
    pub fn new(index: usize) -> Self {
        ProductionIndex(index)
    }

    pub fn get(self) -> usize {
        self.0
    }
}

impl fmt::Display for ProductionIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One alternative of a nonterminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Production {
    pub head: SymbolId,
    pub body: Body,
    pub index: ProductionIndex,
}

// =============================================================================
// GRAMMAR
// =============================================================================

/// Represents a [context-free grammar](https://en.wikipedia.org/wiki/Context-free_grammar).
#[derive(Debug, Clone)]
pub struct Grammar {
    /// Symbol names, indexed by [`SymbolId`].
    names: Vec<String>,
    lookup: HashMap<String, Symbol>,
    nonterminals: Vec<SymbolId>,
    terminals: Vec<SymbolId>,
    start: SymbolId,
    /// Alternatives per nonterminal, in declaration order.
    alternatives: HashMap<SymbolId, Vec<Production>>,
    /// `(head, position in head's alternatives)` for index `i` at slot `i - 1`.
    by_index: Vec<(SymbolId, usize)>,
}

impl Grammar {
    /// Creates a new `GrammarBuilder`.
    pub fn builder() -> GrammarBuilder {
        GrammarBuilder::new()
    }

    pub fn start(&self) -> SymbolId {
        self.start
    }

    /// Nonterminals in declaration order.
    pub fn nonterminals(&self) -> &[SymbolId] {
        &self.nonterminals
    }

    /// Terminals in declaration order.
    pub fn terminals(&self) -> &[SymbolId] {
        &self.terminals
    }

    pub fn name(&self, id: SymbolId) -> &str {
        &self.names[id.as_usize()]
    }

    /// Resolves a symbol by its textual name.
    pub fn symbol(&self, name: &str) -> Option<Symbol> {
        self.lookup.get(name).copied()
    }

    pub fn is_terminal(&self, name: &str) -> bool {
        matches!(self.symbol(name), Some(Symbol::Terminal(_)))
    }

    pub fn is_nonterminal(&self, name: &str) -> bool {
        matches!(self.symbol(name), Some(Symbol::Nonterminal(_)))
    }

    /// Total number of productions.
    pub fn production_count(&self) -> usize {
        self.by_index.len()
    }

    /// Alternatives of `nonterminal`, lowest index first.
    pub fn productions_for(&self, nonterminal: SymbolId) -> Result<&[Production], DescentError> {
        self.alternatives
            .get(&nonterminal)
            .map(Vec::as_slice)
            .ok_or_else(|| self.undefined(nonterminal))
    }

    /// Alternatives of the nonterminal called `name`.
    pub fn productions_for_name(&self, name: &str) -> Result<&[Production], DescentError> {
        match self.symbol(name) {
            Some(Symbol::Nonterminal(id)) => self.productions_for(id),
            _ => Err(ErrorKind::UndefinedNonterminal {
                symbol: name.into(),
            }
            .into()),
        }
    }

    /// `true` iff `index` is not the last alternative recorded for
    /// `nonterminal`. Only the final alternative's index is compared.
    pub fn has_next_alternative(
        &self,
        nonterminal: SymbolId,
        index: ProductionIndex,
    ) -> Result<bool, DescentError> {
        let alternatives = self.productions_for(nonterminal)?;
        Ok(alternatives
            .last()
            .is_some_and(|last| last.index != index))
    }

    /// The alternative of `nonterminal` numbered exactly `index`.
    pub fn alternative_at(
        &self,
        nonterminal: SymbolId,
        index: ProductionIndex,
    ) -> Result<&Production, DescentError> {
        self.productions_for(nonterminal)?
            .iter()
            .find(|p| p.index == index)
            .ok_or_else(|| self.no_such_production(nonterminal, index))
    }

    /// The alternative declared right after `index` for `nonterminal`.
    pub fn next_alternative(
        &self,
        nonterminal: SymbolId,
        index: ProductionIndex,
    ) -> Result<Option<&Production>, DescentError> {
        let alternatives = self.productions_for(nonterminal)?;
        let position = alternatives
            .iter()
            .position(|p| p.index == index)
            .ok_or_else(|| self.no_such_production(nonterminal, index))?;
        Ok(alternatives.get(position + 1))
    }

    /// Global lookup of a production by its index.
    pub fn production(&self, index: ProductionIndex) -> Result<&Production, DescentError> {
        let slot = index
            .get()
            .checked_sub(1)
            .and_then(|slot| self.by_index.get(slot));
        match slot {
            Some(&(head, position)) => Ok(&self.alternatives[&head][position]),
            None => Err(ErrorKind::NoSuchProduction {
                nonterminal: "*".into(),
                index: index.get(),
            }
            .into()),
        }
    }

    /// Name of any body symbol.
    pub fn symbol_name(&self, symbol: Symbol) -> &str {
        self.name(symbol.id())
    }

    /// Renders a body with spaces; the empty body renders as `ε`.
    pub fn render_body(&self, body: &[Symbol]) -> String {
        if body.is_empty() {
            return "ε".into();
        }
        body.iter()
            .map(|s| self.symbol_name(*s))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn undefined(&self, id: SymbolId) -> DescentError {
        let symbol = self
            .names
            .get(id.as_usize())
            .cloned()
            .unwrap_or_else(|| format!("#{}", id.0));
        ErrorKind::UndefinedNonterminal { symbol }.into()
    }

    fn no_such_production(&self, nonterminal: SymbolId, index: ProductionIndex) -> DescentError {
        ErrorKind::NoSuchProduction {
            nonterminal: self.name(nonterminal).into(),
            index: index.get(),
        }
        .into()
    }
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |ids: &[SymbolId]| {
            ids.iter()
                .map(|id| self.name(*id))
                .collect::<Vec<_>>()
                .join(", ")
        };
        writeln!(f, "N = {{ {} }}", join(&self.nonterminals))?;
        writeln!(f, "E = {{ {} }}", join(&self.terminals))?;
        writeln!(f, "S = {}", self.name(self.start))?;
        writeln!(f, "P =")?;
        for &(head, position) in &self.by_index {
            let production = &self.alternatives[&head][position];
            writeln!(
                f,
                "  {} -> {} [{}]",
                self.name(head),
                self.render_body(&production.body),
                production.index
            )?;
        }
        Ok(())
    }
}

// =============================================================================
// BUILDER
// =============================================================================

/// Builder struct for the [`Grammar`].
///
/// Works on symbol names; `build` validates the declarations and interns them.
#[derive(Debug, Clone, Default)]
pub struct GrammarBuilder {
    pub(crate) nonterminals: Vec<String>,
    pub(crate) terminals: Vec<String>,
    pub(crate) start: Option<String>,
    /// One entry per alternative, in declaration order.
    pub(crate) rules: Vec<(String, Vec<String>)>,
}

impl GrammarBuilder {
    fn new() -> Self {
        Self::default()
    }

    /// Declares nonterminals.
    pub fn with_nonterminals<I, S>(mut self, symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.nonterminals.extend(symbols.into_iter().map(Into::into));
        self
    }

    /// Declares terminals.
    pub fn with_terminals<I, S>(mut self, symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.terminals.extend(symbols.into_iter().map(Into::into));
        self
    }

    /// Sets the start symbol.
    pub fn with_start(mut self, symbol: impl Into<String>) -> Self {
        self.set_start(symbol);
        self
    }

    /// Adds one alternative. An empty body is the empty alternative.
    pub fn with_rule<I, S>(mut self, head: impl Into<String>, body: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add_rule(head, body);
        self
    }

    /// Adds several alternatives of one head, in order.
    pub fn with_rules<B, I, S>(mut self, head: impl Into<String>, bodies: B) -> Self
    where
        B: IntoIterator<Item = I>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let head = head.into();
        for body in bodies {
            self.add_rule(head.clone(), body);
        }
        self
    }

    pub fn set_start(&mut self, symbol: impl Into<String>) {
        self.start = Some(symbol.into());
    }

    pub fn add_rule<I, S>(&mut self, head: impl Into<String>, body: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rules
            .push((head.into(), body.into_iter().map(Into::into).collect()));
    }

    /// Runs every load-time check without building.
    pub fn validate(&self) -> ValidationResult {
        validators::validate(self)
    }

    /// Validates and builds the [`Grammar`]. Any validation error aborts with
    /// `InvalidGrammar`; warnings are logged.
    pub fn build(self) -> Result<Grammar, DescentError> {
        let report = self.validate();
        if !report.is_valid() {
            return Err(ErrorKind::InvalidGrammar {
                violations: report.errors,
            }
            .into());
        }
        for warning in &report.warnings {
            warn!(target: "descent::grammar", "{}", warning);
        }

        let mut names = Vec::new();
        let mut lookup = HashMap::new();
        let mut intern = |name: &str, terminal: bool| {
            let id = SymbolId::from_usize(names.len())?;
            names.push(name.to_string());
            let symbol = if terminal {
                Symbol::Terminal(id)
            } else {
                Symbol::Nonterminal(id)
            };
            lookup.insert(name.to_string(), symbol);
            Ok::<_, DescentError>(id)
        };
        let nonterminals = self
            .nonterminals
            .iter()
            .map(|n| intern(n, false))
            .collect::<Result<Vec<_>, _>>()?;
        let terminals = self
            .terminals
            .iter()
            .map(|t| intern(t, true))
            .collect::<Result<Vec<_>, _>>()?;

        let resolve = |name: &str| {
            lookup.get(name).copied().ok_or_else(|| {
                DescentError::from(ErrorKind::InvalidGrammar {
                    violations: vec![format!("symbol '{}' is not declared", name)],
                })
            })
        };

        let mut alternatives: HashMap<SymbolId, Vec<Production>> = HashMap::new();
        let mut by_index = Vec::with_capacity(self.rules.len());
        for (position, (head, body)) in self.rules.iter().enumerate() {
            let head = resolve(head)?.id();
            let body = body
                .iter()
                .map(|s| resolve(s))
                .collect::<Result<Body, _>>()?;
            let list = alternatives.entry(head).or_default();
            by_index.push((head, list.len()));
            list.push(Production {
                head,
                body,
                index: ProductionIndex::new(position + 1),
            });
        }

        let start = match self.start.as_deref().map(resolve) {
            Some(Ok(symbol)) => symbol.id(),
            Some(Err(err)) => return Err(err),
            None => {
                return Err(ErrorKind::InvalidGrammar {
                    violations: vec!["start symbol not set".into()],
                }
                .into())
            }
        };

        debug!(
            target: "descent::grammar",
            nonterminals = nonterminals.len(),
            terminals = terminals.len(),
            productions = by_index.len(),
            "grammar built"
        );

        Ok(Grammar {
            names,
            lookup,
            nonterminals,
            terminals,
            start,
            alternatives,
            by_index,
        })
    }
}
