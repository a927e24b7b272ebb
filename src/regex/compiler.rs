//! Stages 5-6 and the public regex-module surface: NFA → DFA (reusing
//! [`Automaton::subset_construction`]) and an interpreted matcher over the
//! resulting DFA (§9's redesign flag in place of generated-and-compiled
//! native code).

use std::env;
use std::sync::Arc;

use crate::automaton::{Automaton, NodeId, Symbol};
use crate::error::NextractError;
use crate::miner::{Dir, Matcher, MatcherFn, Miner};
use crate::regex::{lexer, nfa, parser};

/// Mirrors the three environment variables the original regex module reads.
/// Unused by the in-memory interpreter; kept for interface parity (§6).
#[derive(Debug, Clone)]
pub struct RegexBuildConfig {
    pub cc: String,
    pub build_path: String,
    pub header_files: String,
}

impl RegexBuildConfig {
    pub fn from_env() -> RegexBuildConfig {
        RegexBuildConfig {
            cc: env::var("CC").unwrap_or_else(|_| "gcc".to_string()),
            build_path: env::var("REGEX_BUILD_PATH").unwrap_or_else(|_| "/tmp/".to_string()),
            header_files: env::var("REGEX_HEADER_FILES").unwrap_or_else(|_| "./src/".to_string()),
        }
    }
}

/// A compiled regular expression: source text, naming, label, and the
/// interpreted DFA artifact.
pub struct RegexArtifact {
    pub re_expr: String,
    pub naming: String,
    pub label: Arc<str>,
    pub dfa: Automaton,
    pub errors: Vec<NextractError>,
    pub state: bool,
}

impl RegexArtifact {
    /// Runs the full pipeline: lex tree → operator tree → NFA → DFA. On any
    /// syntax or construction error, `state` is `false` and `errors` is
    /// non-empty; `dfa` is then an empty automaton, never consulted.
    #[tracing::instrument(skip(re_expr))]
    pub fn compile(re_expr: &str, naming: &str, label: &str) -> RegexArtifact {
        let mut errors = Vec::new();
        let dfa = match lexer::lex(re_expr).and_then(|atoms| parser::parse(&atoms)) {
            Ok(op_tree) => {
                let nfa_automaton = nfa::compile_nfa(&op_tree);
                let dfa = nfa_automaton.subset_construction();
                tracing::debug!(nfa_nodes = nfa_automaton.node_count(), dfa_nodes = dfa.node_count(), "compiled regex");
                dfa
            }
            Err(e) => {
                tracing::debug!(error = %e, "regex compile failed");
                errors.push(e);
                Automaton::new()
            }
        };
        let state = errors.is_empty();
        RegexArtifact {
            re_expr: re_expr.to_string(),
            naming: naming.to_string(),
            label: Arc::from(label),
            dfa,
            errors,
            state,
        }
    }
}

/// Follows every zero-width `Boundary` edge out of `state` whose condition
/// currently holds (`!can_move(dir)`, i.e. start-/end-of-stream), updating
/// `last_final` as each intermediate state is entered. A visited-state guard
/// stops a pathological cycle of boundary-only edges from looping forever.
fn resolve_boundaries(
    dfa: &Automaton,
    m: &Miner,
    mut state: NodeId,
    last_final: &mut Option<crate::stream::Mark>,
) -> NodeId {
    let mut visited = std::collections::BTreeSet::new();
    loop {
        if !visited.insert(state) {
            break;
        }
        let mut next = None;
        for &eid in &dfa.get_node(state).edges {
            let edge = dfa.get_edge(eid);
            if let Some(dir) = edge.symbol.as_ref().and_then(Symbol::as_boundary) {
                let satisfied = match dir {
                    Dir::Left => !m.can_move(Dir::Left),
                    Dir::Right => !m.can_move(Dir::Right),
                    Dir::Stay => true,
                };
                if satisfied {
                    next = Some(edge.to);
                    break;
                }
            }
        }
        match next {
            Some(n) => {
                state = n;
                if dfa.get_node(state).is_final {
                    *last_final = Some(m.mark_pos());
                }
            }
            None => break,
        }
    }
    state
}

impl Matcher for RegexArtifact {
    /// The matcher described in 4.F.6: save a mark, mark the start, drive
    /// the DFA forward greedily tracking the last final state reached, then
    /// either emit an occurrence up to that point or restore the saved
    /// position. `^`/`$` are resolved as zero-width boundary transitions
    /// before the first character read and after every consumed character,
    /// rather than consumed like a character class.
    fn matcher_fn(&self) -> Arc<MatcherFn> {
        let dfa = Arc::new(self.dfa.clone());
        Arc::new(move |m: &mut Miner| {
            let saved = m.mark_pos();
            let Some(start_state) = dfa.starting_nodes().first().copied() else {
                return None;
            };
            if !m.mark_start() {
                return None;
            }
            let mut state = start_state;
            let mut last_final = if dfa.get_node(state).is_final { Some(m.mark_pos()) } else { None };
            state = resolve_boundaries(&dfa, m, state, &mut last_final);
            loop {
                let Some((ch, _)) = m.get_next() else { break };
                let mut next = None;
                for &eid in &dfa.get_node(state).edges {
                    let edge = dfa.get_edge(eid);
                    if let Some(sym) = &edge.symbol {
                        if sym.matches(ch) {
                            next = Some(edge.to);
                            break;
                        }
                    }
                }
                match next {
                    Some(n) => {
                        m.step(Dir::Right);
                        state = n;
                        if dfa.get_node(state).is_final {
                            last_final = Some(m.mark_pos());
                        }
                        state = resolve_boundaries(&dfa, m, state, &mut last_final);
                    }
                    None => break,
                }
            }
            if let Some(end_mark) = last_final {
                m.reset_pos(end_mark);
                if m.mark_end() {
                    return m.make_occurrence(1.0);
                }
            }
            m.reset_pos(saved);
            None
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::Cursor;

    #[test]
    fn concat_and_grouped_literal_are_equivalent() {
        let a = RegexArtifact::compile("(ab)", "a", "lbl");
        let b = RegexArtifact::compile("ab", "b", "lbl");
        assert!(a.state && b.state);
        let cursor = Cursor::open_buffer(b"ab");
        let mut ma = Miner::new("a", cursor.clone(), a.matcher_fn(), false);
        let mut mb = Miner::new("b", cursor, b.matcher_fn(), false);
        let oa = ma.run().unwrap();
        let ob = mb.run().unwrap();
        assert_eq!(oa.as_str(), ob.as_str());
    }

    #[test]
    fn quantifier_exact_n() {
        let artifact = RegexArtifact::compile("a{3}", "n3", "lbl");
        assert!(artifact.state);
        let cursor = Cursor::open_buffer(b"aaaa");
        let mut miner = Miner::new("n3", cursor, artifact.matcher_fn(), false);
        let occ = miner.run().unwrap();
        assert_eq!(occ.len, 3);
    }

    #[test]
    fn unbalanced_parens_is_an_error() {
        let artifact = RegexArtifact::compile("(abc", "bad", "lbl");
        assert!(!artifact.state);
        assert!(!artifact.errors.is_empty());
    }

    #[test]
    fn empty_bracket_is_an_error() {
        let artifact = RegexArtifact::compile("a[]b", "bad2", "lbl");
        assert!(!artifact.state);
    }

    #[test]
    fn inverted_range_is_an_error() {
        let artifact = RegexArtifact::compile("[z-a]", "bad3", "lbl");
        assert!(!artifact.state);
    }

    #[test]
    fn line_begin_anchor_rejects_mid_string_match() {
        let artifact = RegexArtifact::compile("^bc", "anchor", "lbl");
        assert!(artifact.state);
        let mut at_start = Miner::new("s", Cursor::open_buffer(b"bcdef"), artifact.matcher_fn(), false);
        assert_eq!(at_start.run().unwrap().as_str(), "bc");

        let mut mid_string = Miner::new("m", Cursor::open_buffer(b"abcdef"), artifact.matcher_fn(), false);
        mid_string.cursor.move_by(1);
        assert!(mid_string.run().is_none());
    }

    #[test]
    fn line_end_anchor_requires_end_of_stream() {
        let artifact = RegexArtifact::compile("bc$", "anchor2", "lbl");
        assert!(artifact.state);
        let mut at_end = Miner::new("e", Cursor::open_buffer(b"abc"), artifact.matcher_fn(), false);
        at_end.cursor.move_by(1);
        assert_eq!(at_end.run().unwrap().as_str(), "bc");

        let mut mid_string = Miner::new("m2", Cursor::open_buffer(b"abcdef"), artifact.matcher_fn(), false);
        mid_string.cursor.move_by(1);
        assert!(mid_string.run().is_none());
    }

    #[test]
    fn email_like_pattern_compiles() {
        let artifact = RegexArtifact::compile(
            r"[^@ \t\r\n]+@[^@ \t\r\n]+\.[^@ \t\r\n]+",
            "email",
            "email",
        );
        assert!(artifact.state, "errors: {:?}", artifact.errors);
    }
}
