//! Shared grammars and helpers for the integration tests.

#![allow(dead_code)]

use descent::{load_grammar_str, Grammar, ParseOutcome, Parser, ParserConfig, TokenSequence};

/// S -> a A [1], A -> b A [2] | b [3]
pub const G1: &str = "\
N = { S, A }
E = { a, b }
S = S
P =
S -> a $ A
A -> b $ A | b
";

/// Arithmetic expressions without left recursion; the tails end in the empty
/// alternative.
///
/// expr -> term expr_tail [1]
/// expr_tail -> + term expr_tail [2] | epsilon [3]
/// term -> factor term_tail [4]
/// term_tail -> * factor term_tail [5] | epsilon [6]
/// factor -> ( expr ) [7] | id [8]
pub const EXPRESSIONS: &str = "\
N = { expr, expr_tail, term, term_tail, factor }
E = { +, *, (, ), id }
S = expr
P =
expr -> term $ expr_tail
expr_tail -> + $ term $ expr_tail | epsilon
term -> factor $ term_tail
term_tail -> * $ factor $ term_tail | epsilon
factor -> ( $ expr $ ) | id
";

/// Two alternatives derive `[a, b]`; the lower-indexed one must win.
///
/// S -> A b [1] | a B [2], A -> a [3], B -> b [4]
pub const AMBIGUOUS: &str = "\
N = { S, A, B }
E = { a, b }
S = S
S -> A $ b | a $ B
A -> a
B -> b
";

/// S -> a S b [1] | ε [2]
pub const BALANCED: &str = "\
N = { S }
E = { a, b }
S = S
S -> a S b | epsilon
";

pub fn grammar(text: &str) -> Grammar {
    load_grammar_str(text, "fixture", &ParserConfig::default()).unwrap()
}

pub fn tokens(text: &str) -> TokenSequence {
    TokenSequence::from_words(text)
}

pub fn parse(grammar: &Grammar, text: &str) -> ParseOutcome {
    Parser::new(grammar).parse(&tokens(text)).unwrap()
}

/// `(symbol, production, parent, next_sibling)` rows of an accepted tree.
pub fn rows(outcome: &ParseOutcome) -> Vec<(String, Option<usize>, Option<usize>, Option<usize>)> {
    outcome
        .tree()
        .expect("accepted")
        .nodes()
        .iter()
        .map(|n| {
            (
                n.symbol.clone(),
                n.production.map(|p| p.get()),
                n.parent,
                n.next_sibling,
            )
        })
        .collect()
}

pub fn row(
    symbol: &str,
    production: Option<usize>,
    parent: Option<usize>,
    next_sibling: Option<usize>,
) -> (String, Option<usize>, Option<usize>, Option<usize>) {
    (symbol.to_string(), production, parent, next_sibling)
}
