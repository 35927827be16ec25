use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;

use super::GrammarBuilder;

// =====================
// Core Data Structures
// =====================

/// Findings of a validation pass. Only `errors` make a grammar unusable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub suggestions: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty() && self.suggestions.is_empty()
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (title, items) in [
            ("error", &self.errors),
            ("warning", &self.warnings),
            ("suggestion", &self.suggestions),
        ] {
            for item in items {
                writeln!(f, "{}: {}", title, item)?;
            }
        }
        Ok(())
    }
}

// =====================
// Traits
// =====================

pub trait ValidationReporter {
    fn report_error(&mut self, message: impl Into<String>);
    fn report_warning(&mut self, message: impl Into<String>);
    fn report_suggestion(&mut self, message: impl Into<String>);
}

impl ValidationReporter for ValidationResult {
    fn report_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }
    fn report_warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }
    fn report_suggestion(&mut self, message: impl Into<String>) {
        self.suggestions.push(message.into());
    }
}

// =====================
// Public API
// =====================

/// Runs every check against the builder's declarations.
pub fn validate(draft: &GrammarBuilder) -> ValidationResult {
    let mut result = ValidationResult::new();

    GrammarValidators::check_symbol_names(draft, &mut result);
    GrammarValidators::check_duplicate_declarations(draft, &mut result);
    GrammarValidators::check_disjoint_sets(draft, &mut result);
    GrammarValidators::check_start_symbol(draft, &mut result);
    GrammarValidators::check_rule_heads(draft, &mut result);
    GrammarValidators::check_body_symbols(draft, &mut result);
    GrammarValidators::check_rule_coverage(draft, &mut result);
    GrammarValidators::check_reachability(draft, &mut result);
    GrammarValidators::check_left_recursion(draft, &mut result);
    GrammarValidators::check_unused_terminals(draft, &mut result);

    result
}

/// Validates grammar declarations for structural correctness issues.
/// Each validator focuses on a single concern.
pub struct GrammarValidators;

impl GrammarValidators {
    /// Symbol names must be non-empty.
    pub fn check_symbol_names(draft: &GrammarBuilder, result: &mut ValidationResult) {
        let declared = draft.nonterminals.iter().chain(&draft.terminals);
        if declared.into_iter().any(|name| name.trim().is_empty()) {
            result.report_error("empty symbol name in declarations");
        }
    }

    /// A symbol may be declared only once per set.
    pub fn check_duplicate_declarations(draft: &GrammarBuilder, result: &mut ValidationResult) {
        for (kind, symbols) in [
            ("nonterminal", &draft.nonterminals),
            ("terminal", &draft.terminals),
        ] {
            let mut seen = HashSet::new();
            for symbol in symbols {
                if !seen.insert(symbol) {
                    result.report_error(format!("{} '{}' is declared twice", kind, symbol));
                }
            }
        }
    }

    /// Terminals and nonterminals must be disjoint.
    pub fn check_disjoint_sets(draft: &GrammarBuilder, result: &mut ValidationResult) {
        let terminals: HashSet<&String> = draft.terminals.iter().collect();
        for symbol in &draft.nonterminals {
            if terminals.contains(symbol) {
                result.report_error(format!(
                    "'{}' is declared both as a nonterminal and as a terminal",
                    symbol
                ));
            }
        }
    }

    /// The start symbol must be a declared nonterminal with at least one production.
    pub fn check_start_symbol(draft: &GrammarBuilder, result: &mut ValidationResult) {
        let Some(start) = &draft.start else {
            result.report_error("start symbol not set");
            return;
        };

        if !draft.nonterminals.contains(start) {
            result.report_error(format!("start symbol '{}' is not a declared nonterminal", start));
            return;
        }

        if !draft.rules.iter().any(|(head, _)| head == start) {
            result.report_error(format!("start symbol '{}' has no productions", start));
        }
    }

    /// Every production head must be a declared nonterminal.
    pub fn check_rule_heads(draft: &GrammarBuilder, result: &mut ValidationResult) {
        let mut reported = HashSet::new();
        for (head, _) in &draft.rules {
            if draft.nonterminals.contains(head) || !reported.insert(head) {
                continue;
            }
            if draft.terminals.contains(head) {
                result.report_error(format!("terminal '{}' cannot be a production head", head));
            } else {
                result.report_error(format!("production head '{}' is not declared", head));
            }
        }
    }

    /// Every body symbol must be declared.
    pub fn check_body_symbols(draft: &GrammarBuilder, result: &mut ValidationResult) {
        let declared: HashSet<&String> =
            draft.nonterminals.iter().chain(&draft.terminals).collect();
        let mut reported = HashSet::new();

        for (head, body) in &draft.rules {
            for symbol in body {
                if declared.contains(symbol) || !reported.insert(symbol) {
                    continue;
                }
                result.report_error(format!(
                    "production of '{}' uses undeclared symbol '{}'",
                    head, symbol
                ));
            }
        }
    }

    /// A nonterminal used in a body needs productions of its own; an unused
    /// one without productions is only suspicious.
    pub fn check_rule_coverage(draft: &GrammarBuilder, result: &mut ValidationResult) {
        let heads: HashSet<&String> = draft.rules.iter().map(|(head, _)| head).collect();
        let used: HashSet<&String> = draft.rules.iter().flat_map(|(_, body)| body).collect();

        for nonterminal in &draft.nonterminals {
            if heads.contains(nonterminal) || draft.start.as_ref() == Some(nonterminal) {
                continue;
            }
            if used.contains(nonterminal) {
                result.report_error(format!(
                    "nonterminal '{}' is used but has no productions",
                    nonterminal
                ));
            } else {
                result.report_warning(format!(
                    "nonterminal '{}' is declared but has no productions",
                    nonterminal
                ));
            }
        }
    }

    /// Nonterminals the start symbol can never derive.
    pub fn check_reachability(draft: &GrammarBuilder, result: &mut ValidationResult) {
        let Some(start) = &draft.start else {
            return;
        };

        let mut edges: HashMap<&String, Vec<&String>> = HashMap::new();
        for (head, body) in &draft.rules {
            edges.entry(head).or_default().extend(body.iter());
        }

        let mut reached = HashSet::from([start]);
        let mut pending = VecDeque::from([start]);
        while let Some(symbol) = pending.pop_front() {
            for next in edges.get(symbol).into_iter().flatten() {
                if reached.insert(*next) {
                    pending.push_back(*next);
                }
            }
        }

        for nonterminal in &draft.nonterminals {
            if reached.contains(nonterminal) {
                continue;
            }
            result.report_warning(format!(
                "nonterminal '{}' is unreachable from '{}'",
                nonterminal, start
            ));
        }
    }

    /// Directly left-recursive alternatives never terminate without the step guard.
    pub fn check_left_recursion(draft: &GrammarBuilder, result: &mut ValidationResult) {
        for (head, body) in &draft.rules {
            if body.first() != Some(head) {
                continue;
            }
            result.report_warning(format!(
                "alternative '{} -> {}' is left-recursive; parsing relies on the step limit",
                head,
                body.join(" ")
            ));
        }
    }

    /// Terminals that no production mentions.
    pub fn check_unused_terminals(draft: &GrammarBuilder, result: &mut ValidationResult) {
        let used: HashSet<&String> = draft.rules.iter().flat_map(|(_, body)| body).collect();

        for terminal in &draft.terminals {
            if used.contains(terminal) {
                continue;
            }
            result.report_suggestion(format!(
                "terminal '{}' is never used by any production",
                terminal
            ));
        }
    }
}
