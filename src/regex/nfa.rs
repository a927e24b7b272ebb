//! Stage 4: operator tree → NFA, Thompson construction.

use crate::automaton::{Automaton, NodeId, Symbol};
use crate::miner::Dir;
use crate::regex::parser::{OpTree, Quantifier};

/// Builds the NFA fragment for `op`, returning its `(entry, exit)` node
/// pair. Anchors (`^`, `$`) compile to zero-width `Symbol::Boundary` edges,
/// resolved at match time against `can_move` rather than consumed like a
/// character (single-line semantics only, as the original resolves them).
pub fn build(op: &OpTree, a: &mut Automaton) -> (NodeId, NodeId) {
    match op {
        OpTree::Literal(c) => {
            let entry = a.add_node(false, false);
            let exit = a.add_node(false, false);
            a.add_edge(entry, Some(Symbol::Char(*c)), exit);
            (entry, exit)
        }
        OpTree::Set(class) => {
            let entry = a.add_node(false, false);
            let exit = a.add_node(false, false);
            a.add_edge(entry, Some(Symbol::Class(class.clone())), exit);
            (entry, exit)
        }
        OpTree::LineBegin => {
            let entry = a.add_node(false, false);
            let exit = a.add_node(false, false);
            a.add_edge(entry, Some(Symbol::Boundary(Dir::Left)), exit);
            (entry, exit)
        }
        OpTree::LineEnd => {
            let entry = a.add_node(false, false);
            let exit = a.add_node(false, false);
            a.add_edge(entry, Some(Symbol::Boundary(Dir::Right)), exit);
            (entry, exit)
        }
        OpTree::Concat(children) => {
            assert!(!children.is_empty());
            let mut iter = children.iter();
            let (first_entry, mut prev_exit) = build(iter.next().unwrap(), a);
            for child in iter {
                let (entry, exit) = build(child, a);
                a.add_edge(prev_exit, None, entry);
                prev_exit = exit;
            }
            (first_entry, prev_exit)
        }
        OpTree::Alternation(children) => {
            let entry = a.add_node(false, false);
            let exit = a.add_node(false, false);
            for child in children {
                let (child_entry, child_exit) = build(child, a);
                a.add_edge(entry, None, child_entry);
                a.add_edge(child_exit, None, exit);
            }
            (entry, exit)
        }
        OpTree::Closure(operand, quantifier) => {
            let entry = a.add_node(false, false);
            let exit = a.add_node(false, false);
            let (child_entry, child_exit) = build(operand, a);
            a.add_edge(entry, None, child_entry);
            a.add_edge(child_exit, None, exit);
            if !matches!(quantifier, Quantifier::Plus) {
                a.add_edge(entry, None, exit);
            }
            if !matches!(quantifier, Quantifier::Question) {
                a.add_edge(child_exit, None, child_entry);
            }
            (entry, exit)
        }
    }
}

/// Builds a complete NFA for `op`, with a distinguished starting and final
/// node.
pub fn compile_nfa(op: &OpTree) -> Automaton {
    let mut a = Automaton::new();
    let (entry, exit) = build(op, &mut a);
    // Re-derive start/final flags: `build` allocates plain nodes, so mark
    // the overall fragment's boundary nodes after the fact.
    a.mark_starting(entry);
    a.mark_final(exit);
    a
}
