//! Finite automaton graph (component E): a directed multigraph of nodes and
//! edges with stable IDs, used as the shared NFA/DFA representation for the
//! regex compiler.

use std::collections::BTreeSet;

use foldhash::HashMap;

use crate::miner::Dir;

pub type NodeId = u32;
pub type EdgeId = u32;

/// An edge's consumed symbol. `None` denotes an ε-edge (component E);
/// regex edges additionally carry either a literal codepoint, a character
/// class (component F's set/range predicates), or a zero-width line
/// boundary assertion (`^`/`$`). A `Boundary` edge consumes no input: it is
/// taken only when the cursor cannot move further in the given direction,
/// i.e. at start-/end-of-stream (single-line semantics, matching the
/// `!can_move(Left)` / `!can_move(Right)` checks the original resolves
/// `^`/`$` to).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Symbol {
    Char(char),
    Class(CharClass),
    Boundary(Dir),
}

impl Symbol {
    pub fn matches(&self, c: char) -> bool {
        match self {
            Symbol::Char(lit) => *lit == c,
            Symbol::Class(class) => class.matches(c),
            Symbol::Boundary(_) => false,
        }
    }

    pub fn as_boundary(&self) -> Option<Dir> {
        match self {
            Symbol::Boundary(dir) => Some(*dir),
            _ => None,
        }
    }
}

/// A set of codepoint ranges, optionally negated — the regex `[...]` /
/// `[^...]` construct and the stock classes (`\s\S\w\W\d\D`, `.`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CharClass {
    ranges: Vec<(char, char)>,
    negated: bool,
}

impl CharClass {
    pub fn new(mut ranges: Vec<(char, char)>, negated: bool) -> CharClass {
        ranges.sort();
        CharClass { ranges, negated }
    }

    pub fn single(c: char) -> CharClass {
        CharClass::new(vec![(c, c)], false)
    }

    pub fn matches(&self, c: char) -> bool {
        let in_ranges = self.ranges.iter().any(|&(lo, hi)| lo <= c && c <= hi);
        in_ranges != self.negated
    }

    pub fn negated(&self) -> bool {
        self.negated
    }

    pub fn into_ranges(self) -> Vec<(char, char)> {
        self.ranges
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub is_starting: bool,
    pub is_final: bool,
    pub edges: Vec<EdgeId>,
}

#[derive(Debug, Clone)]
pub struct Edge {
    pub id: EdgeId,
    pub symbol: Option<Symbol>,
    pub from: NodeId,
    pub to: NodeId,
}

/// Growable node/edge arrays indexed by stable ID.
#[derive(Debug, Default, Clone)]
pub struct Automaton {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
}

impl Automaton {
    pub fn new() -> Automaton {
        Automaton::default()
    }

    pub fn add_node(&mut self, is_starting: bool, is_final: bool) -> NodeId {
        let id = self.nodes.len() as NodeId;
        self.nodes.push(Node { id, is_starting, is_final, edges: Vec::new() });
        id
    }

    pub fn add_edge(&mut self, from: NodeId, symbol: Option<Symbol>, to: NodeId) -> EdgeId {
        let id = self.edges.len() as EdgeId;
        self.edges.push(Edge { id, symbol, from, to });
        self.nodes[from as usize].edges.push(id);
        id
    }

    pub fn mark_starting(&mut self, id: NodeId) {
        self.nodes[id as usize].is_starting = true;
    }

    pub fn mark_final(&mut self, id: NodeId) {
        self.nodes[id as usize].is_final = true;
    }

    pub fn get_node(&self, id: NodeId) -> &Node {
        &self.nodes[id as usize]
    }

    pub fn get_edge(&self, id: EdgeId) -> &Edge {
        &self.edges[id as usize]
    }

    pub fn starting_nodes(&self) -> Vec<NodeId> {
        self.nodes.iter().filter(|n| n.is_starting).map(|n| n.id).collect()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// ε-closure: every node transitively reachable from `ids` through
    /// ε-edges, including `ids` themselves.
    pub fn epsilon_closure(&self, ids: &[NodeId]) -> BTreeSet<NodeId> {
        let mut closure: BTreeSet<NodeId> = ids.iter().copied().collect();
        let mut stack: Vec<NodeId> = ids.to_vec();
        while let Some(n) = stack.pop() {
            for &eid in &self.nodes[n as usize].edges {
                let edge = &self.edges[eid as usize];
                if edge.symbol.is_none() && closure.insert(edge.to) {
                    stack.push(edge.to);
                }
            }
        }
        closure
    }

    fn outgoing_symbols(&self, subset: &BTreeSet<NodeId>) -> Vec<Symbol> {
        let mut seen = Vec::new();
        for &n in subset {
            for &eid in &self.nodes[n as usize].edges {
                let edge = &self.edges[eid as usize];
                if let Some(sym) = &edge.symbol {
                    if !seen.contains(sym) {
                        seen.push(sym.clone());
                    }
                }
            }
        }
        seen
    }

    fn move_on(&self, subset: &BTreeSet<NodeId>, symbol: &Symbol) -> Vec<NodeId> {
        let mut out = Vec::new();
        for &n in subset {
            for &eid in &self.nodes[n as usize].edges {
                let edge = &self.edges[eid as usize];
                if edge.symbol.as_ref() == Some(symbol) {
                    out.push(edge.to);
                }
            }
        }
        out
    }

    /// Subset construction: builds a DFA equivalent to this (treated as an)
    /// NFA. Each DFA node corresponds to a subset of NFA node IDs; a DFA
    /// node is final iff any constituent NFA node is final.
    pub fn subset_construction(&self) -> Automaton {
        let mut dfa = Automaton::new();
        let mut subset_to_dfa: HashMap<BTreeSet<NodeId>, NodeId> = HashMap::default();

        let start_subset = self.epsilon_closure(&self.starting_nodes());
        let start_final = start_subset.iter().any(|&n| self.nodes[n as usize].is_final);
        let start_dfa = dfa.add_node(true, start_final);
        subset_to_dfa.insert(start_subset.clone(), start_dfa);

        let mut worklist = vec![start_subset];
        while let Some(subset) = worklist.pop() {
            let from_dfa = subset_to_dfa[&subset];
            for symbol in self.outgoing_symbols(&subset) {
                let moved = self.move_on(&subset, &symbol);
                let target_subset = self.epsilon_closure(&moved);
                if target_subset.is_empty() {
                    continue;
                }
                let to_dfa = *subset_to_dfa.entry(target_subset.clone()).or_insert_with(|| {
                    let is_final = target_subset.iter().any(|&n| self.nodes[n as usize].is_final);
                    let id = dfa.add_node(false, is_final);
                    worklist.push(target_subset.clone());
                    id
                });
                dfa.add_edge(from_dfa, Some(symbol), to_dfa);
            }
        }
        dfa
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epsilon_closure_transitive() {
        let mut a = Automaton::new();
        let n0 = a.add_node(true, false);
        let n1 = a.add_node(false, false);
        let n2 = a.add_node(false, true);
        a.add_edge(n0, None, n1);
        a.add_edge(n1, None, n2);
        let closure = a.epsilon_closure(&[n0]);
        assert!(closure.contains(&n0) && closure.contains(&n1) && closure.contains(&n2));
    }

    #[test]
    fn subset_construction_on_simple_literal() {
        // NFA accepting "ab".
        let mut nfa = Automaton::new();
        let n0 = nfa.add_node(true, false);
        let n1 = nfa.add_node(false, false);
        let n2 = nfa.add_node(false, true);
        nfa.add_edge(n0, Some(Symbol::Char('a')), n1);
        nfa.add_edge(n1, Some(Symbol::Char('b')), n2);

        let dfa = nfa.subset_construction();
        assert_eq!(dfa.node_count(), 3);
        let start = dfa.starting_nodes()[0];
        let edge = dfa.get_edge(dfa.get_node(start).edges[0]);
        assert_eq!(edge.symbol, Some(Symbol::Char('a')));
    }
}
