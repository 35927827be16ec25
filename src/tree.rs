//! Parse tree reconstruction.
//!
//! An accepted working stack lists the derivation in preorder: each
//! expansion entry is followed by the subtrees of its body symbols, left to
//! right. The tree keeps one node per entry, in the same order, linked by
//! parent and right-sibling indices. Node 0 is the root.

use std::fmt;

use serde::Serialize;

use crate::errors::{DescentError, ErrorKind};
use crate::grammar::{Grammar, ProductionIndex};
use crate::parser::StackEntry;

/// One node of the parse tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Node {
    pub symbol: String,
    /// The production applied at this node; `None` for terminals.
    pub production: Option<ProductionIndex>,
    pub parent: Option<usize>,
    pub next_sibling: Option<usize>,
}

impl Node {
    pub fn is_terminal(&self) -> bool {
        self.production.is_none()
    }
}

/// Parent/sibling table built from an accepted working stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseTree {
    nodes: Vec<Node>,
}

impl ParseTree {
    /// Rebuilds the tree of an accepted derivation.
    ///
    /// Fails with `MalformedTrace` when the stack is not a complete preorder
    /// derivation from the start symbol, and with `TreeDepthExceeded` when
    /// nesting goes deeper than `max_depth`.
    pub fn from_working_stack(
        grammar: &Grammar,
        stack: &[StackEntry],
        max_depth: usize,
    ) -> Result<Self, DescentError> {
        match stack.first() {
            Some(StackEntry::Expansion { nonterminal, .. }) if *nonterminal == grammar.start() => {}
            Some(_) => {
                return Err(malformed("the derivation does not start with the start symbol"));
            }
            None => return Err(malformed("the working stack is empty")),
        }

        let mut nodes: Vec<Node> = stack
            .iter()
            .map(|entry| match *entry {
                StackEntry::Terminal(id) => Node {
                    symbol: grammar.name(id).to_string(),
                    production: None,
                    parent: None,
                    next_sibling: None,
                },
                StackEntry::Expansion {
                    nonterminal,
                    production,
                } => Node {
                    symbol: grammar.name(nonterminal).to_string(),
                    production: Some(production),
                    parent: None,
                    next_sibling: None,
                },
            })
            .collect();

        let spans = subtree_spans(grammar, stack)?;
        if spans[0] != stack.len() {
            return Err(malformed(format!(
                "the root derivation covers {} of {} entries",
                spans[0],
                stack.len()
            )));
        }

        // Parents precede their children, so a node's depth is known by the
        // time its own children are linked.
        let mut depths = vec![0usize; stack.len()];
        for (index, entry) in stack.iter().enumerate() {
            let StackEntry::Expansion {
                nonterminal,
                production,
            } = *entry
            else {
                continue;
            };
            let body = &grammar.alternative_at(nonterminal, production)?.body;
            let child_depth = depths[index] + 1;
            if !body.is_empty() && child_depth > max_depth {
                return Err(ErrorKind::TreeDepthExceeded { limit: max_depth }.into());
            }

            let mut cursor = index + 1;
            let mut previous: Option<usize> = None;
            for expected in body {
                let child = stack.get(cursor).copied().ok_or_else(|| {
                    malformed(format!("entry {} has too few children", index))
                })?;
                if child.symbol() != *expected {
                    return Err(malformed(format!(
                        "entry {} is `{}` but production {} expects `{}`",
                        cursor,
                        child.render(grammar),
                        production,
                        grammar.symbol_name(*expected)
                    )));
                }
                match nodes[cursor].parent {
                    None => nodes[cursor].parent = Some(index),
                    Some(other) if other != index => {
                        return Err(malformed(format!(
                            "entry {} is claimed by both {} and {}",
                            cursor, other, index
                        )));
                    }
                    Some(_) => {}
                }
                depths[cursor] = child_depth;
                if let Some(previous) = previous {
                    nodes[previous].next_sibling = Some(cursor);
                }
                previous = Some(cursor);
                cursor += spans[cursor];
            }
        }

        if let Some(orphan) = nodes.iter().skip(1).position(|n| n.parent.is_none()) {
            return Err(malformed(format!("entry {} has no parent", orphan + 1)));
        }

        Ok(Self { nodes })
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, index: usize) -> Option<&Node> {
        self.nodes.get(index)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn root(&self) -> Option<usize> {
        (!self.nodes.is_empty()).then_some(0)
    }

    /// In preorder a node's first child, when it has one, comes right after it.
    pub fn first_child(&self, index: usize) -> Option<usize> {
        let candidate = index + 1;
        self.nodes
            .get(candidate)
            .filter(|node| node.parent == Some(index))
            .map(|_| candidate)
    }

    /// Children of `index`, left to right.
    pub fn children(&self, index: usize) -> Children<'_> {
        Children {
            tree: self,
            next: self.first_child(index),
        }
    }

    /// Number of edges from the root to `index`.
    pub fn depth(&self, index: usize) -> usize {
        let mut depth = 0;
        let mut current = self.nodes.get(index).and_then(|n| n.parent);
        while let Some(parent) = current {
            depth += 1;
            current = self.nodes[parent].parent;
        }
        depth
    }

    /// The leaves, left to right. For an accepted parse these spell the input.
    pub fn yield_symbols(&self) -> Vec<&str> {
        self.nodes
            .iter()
            .filter(|n| n.is_terminal())
            .map(|n| n.symbol.as_str())
            .collect()
    }

    /// Tabular form: one row per node with its production, parent and sibling.
    pub fn render_table(&self) -> String {
        fn cell(value: Option<usize>) -> String {
            value.map_or_else(|| "-".to_string(), |v| v.to_string())
        }

        let width = self
            .nodes
            .iter()
            .map(|n| n.symbol.chars().count())
            .max()
            .unwrap_or(0)
            .max("symbol".len());

        let mut out = format!(
            "{:>5}  {:<width$}  {:>10}  {:>6}  {:>7}\n",
            "index", "symbol", "production", "parent", "sibling"
        );
        for (index, node) in self.nodes.iter().enumerate() {
            out.push_str(&format!(
                "{:>5}  {:<width$}  {:>10}  {:>6}  {:>7}\n",
                index,
                node.symbol,
                cell(node.production.map(ProductionIndex::get)),
                cell(node.parent),
                cell(node.next_sibling),
            ));
        }
        out
    }
}

/// Outline form, one node per line:
///
/// ```text
/// S [1]
/// ├── a
/// └── A [3]
///     └── b
/// ```
impl fmt::Display for ParseTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // `last[k]` tells whether the open ancestor at depth k + 1 is the last
        // of its siblings. In preorder the most recent node at each depth is
        // an ancestor of the current one.
        let mut last: Vec<bool> = Vec::new();
        let mut depths = vec![0usize; self.nodes.len()];
        for (index, node) in self.nodes.iter().enumerate() {
            if let Some(parent) = node.parent {
                let depth = depths[parent] + 1;
                depths[index] = depth;
                last.truncate(depth - 1);
                for &done in &last {
                    f.write_str(if done { "    " } else { "│   " })?;
                }
                let is_last = node.next_sibling.is_none();
                f.write_str(if is_last { "└── " } else { "├── " })?;
                last.push(is_last);
            }

            match node.production {
                Some(production) => write!(f, "{} [{}]", node.symbol, production)?,
                None => f.write_str(&node.symbol)?,
            }
            if index + 1 < self.nodes.len() {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

/// Iterator over a node's children via the sibling links.
#[derive(Debug, Clone)]
pub struct Children<'t> {
    tree: &'t ParseTree,
    next: Option<usize>,
}

impl Iterator for Children<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let current = self.next?;
        self.next = self.tree.nodes[current].next_sibling;
        Some(current)
    }
}

/// Size of the subtree rooted at every entry (the node plus all its
/// descendants), found in one right-to-left pass.
fn subtree_spans(grammar: &Grammar, stack: &[StackEntry]) -> Result<Vec<usize>, DescentError> {
    let mut spans = vec![0; stack.len()];
    // Spans of the complete subtrees right of the cursor; the nearest on top.
    let mut pending: Vec<usize> = Vec::new();
    for (index, entry) in stack.iter().enumerate().rev() {
        let span = match *entry {
            StackEntry::Terminal(_) => 1,
            StackEntry::Expansion {
                nonterminal,
                production,
            } => {
                let arity = grammar.alternative_at(nonterminal, production)?.body.len();
                let Some(split) = pending.len().checked_sub(arity) else {
                    return Err(malformed(format!("entry {} has too few children", index)));
                };
                1 + pending.drain(split..).sum::<usize>()
            }
        };
        spans[index] = span;
        pending.push(span);
    }
    Ok(spans)
}

fn malformed(reason: impl Into<String>) -> DescentError {
    ErrorKind::MalformedTrace {
        reason: reason.into(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_MAX_TREE_DEPTH;

    /// S -> a A [1], A -> b A [2], A -> b [3]
    fn grammar() -> Grammar {
        Grammar::builder()
            .with_nonterminals(["S", "A"])
            .with_terminals(["a", "b"])
            .with_start("S")
            .with_rule("S", ["a", "A"])
            .with_rules("A", [vec!["b", "A"], vec!["b"]])
            .build()
            .unwrap()
    }

    fn entry(grammar: &Grammar, text: &str) -> StackEntry {
        match text.split_once(':') {
            Some((name, index)) => StackEntry::Expansion {
                nonterminal: grammar.symbol(name).unwrap().id(),
                production: ProductionIndex::new(index.parse().unwrap()),
            },
            None => StackEntry::Terminal(grammar.symbol(text).unwrap().id()),
        }
    }

    fn stack(grammar: &Grammar, entries: &[&str]) -> Vec<StackEntry> {
        entries.iter().map(|e| entry(grammar, e)).collect()
    }

    fn build(grammar: &Grammar, entries: &[&str]) -> Result<ParseTree, DescentError> {
        ParseTree::from_working_stack(grammar, &stack(grammar, entries), DEFAULT_MAX_TREE_DEPTH)
    }

    #[test]
    fn two_token_derivation() {
        let g = grammar();
        let tree = build(&g, &["S:1", "a", "A:3", "b"]).unwrap();

        let parents: Vec<_> = tree.nodes().iter().map(|n| n.parent).collect();
        let siblings: Vec<_> = tree.nodes().iter().map(|n| n.next_sibling).collect();
        assert_eq!(parents, [None, Some(0), Some(0), Some(2)]);
        assert_eq!(siblings, [None, Some(2), None, None]);
        assert_eq!(tree.children(0).collect::<Vec<_>>(), [1, 2]);
        assert_eq!(tree.first_child(1), None);
        assert_eq!(tree.yield_symbols(), ["a", "b"]);
    }

    #[test]
    fn outline_draws_guides() {
        let g = grammar();
        let tree = build(&g, &["S:1", "a", "A:2", "b", "A:3", "b"]).unwrap();
        assert_eq!(
            tree.to_string(),
            "S [1]\n├── a\n└── A [2]\n    ├── b\n    └── A [3]\n        └── b"
        );
        assert_eq!(tree.depth(5), 3);
    }

    #[test]
    fn table_lists_every_node() {
        let g = grammar();
        let tree = build(&g, &["S:1", "a", "A:3", "b"]).unwrap();
        let table = tree.render_table();
        assert_eq!(table.lines().count(), 5);
        assert!(table.lines().nth(3).unwrap().contains('3'));
    }

    #[test]
    fn truncated_stack_is_malformed() {
        let g = grammar();
        let err = build(&g, &["S:1", "a", "A:3"]).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::MalformedTrace { .. }));
    }

    #[test]
    fn trailing_entries_are_malformed() {
        let g = grammar();
        let err = build(&g, &["S:1", "a", "A:3", "b", "b"]).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::MalformedTrace { .. }));
    }

    #[test]
    fn mismatched_child_is_malformed() {
        let g = grammar();
        let err = build(&g, &["S:1", "b", "A:3", "b"]).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::MalformedTrace { .. }));
    }

    #[test]
    fn non_start_root_is_malformed() {
        let g = grammar();
        let err = build(&g, &["A:3", "b"]).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::MalformedTrace { .. }));
    }

    #[test]
    fn depth_limit_is_enforced() {
        let g = grammar();
        let entries = stack(&g, &["S:1", "a", "A:2", "b", "A:2", "b", "A:3", "b"]);
        assert!(ParseTree::from_working_stack(&g, &entries, 4).is_ok());
        let err = ParseTree::from_working_stack(&g, &entries, 3).unwrap_err();
        assert_eq!(err.kind, ErrorKind::TreeDepthExceeded { limit: 3 });
    }

    /// `S -> a A`, then `links` times `A -> b A`, closed by `A -> b`.
    fn chain(g: &Grammar, links: usize) -> Vec<StackEntry> {
        let mut entries = vec!["S:1", "a"];
        for _ in 0..links {
            entries.extend(["A:2", "b"]);
        }
        entries.extend(["A:3", "b"]);
        stack(g, &entries)
    }

    #[test]
    fn chain_at_default_depth_is_rebuilt() {
        let g = grammar();
        // The final `b` sits at depth links + 2.
        let entries = chain(&g, DEFAULT_MAX_TREE_DEPTH - 2);
        let tree = ParseTree::from_working_stack(&g, &entries, DEFAULT_MAX_TREE_DEPTH).unwrap();
        assert_eq!(tree.len(), entries.len());
        assert_eq!(tree.depth(entries.len() - 1), DEFAULT_MAX_TREE_DEPTH);
        assert_eq!(tree.yield_symbols().len(), DEFAULT_MAX_TREE_DEPTH);

        let deeper = chain(&g, DEFAULT_MAX_TREE_DEPTH - 1);
        let err = ParseTree::from_working_stack(&g, &deeper, DEFAULT_MAX_TREE_DEPTH).unwrap_err();
        assert_eq!(
            err.kind,
            ErrorKind::TreeDepthExceeded {
                limit: DEFAULT_MAX_TREE_DEPTH
            }
        );
    }

    #[test]
    fn deep_outline_indents_once_per_level() {
        let g = grammar();
        let entries = chain(&g, 2_000);
        let tree = ParseTree::from_working_stack(&g, &entries, DEFAULT_MAX_TREE_DEPTH).unwrap();
        let outline = tree.to_string();
        let last = outline.lines().last().unwrap();
        assert_eq!(last, format!("{}└── b", "    ".repeat(2_001)));
        assert_eq!(outline.lines().count(), tree.len());
    }
}
