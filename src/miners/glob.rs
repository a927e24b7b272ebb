//! A glob-pattern miner: `?` matches one non-delimiter codepoint, `*`
//! matches a run of them, and `[...]` matches a single-character class.
//!
//! Matching within a token run is literal and case-insensitive; `*` is
//! resolved by backtracking over successively longer matched runs and
//! recursively trying the remainder of the pattern, mirroring the
//! continuation-passing shape of the original recursive glob matcher
//! rather than compiling to an automaton.

use std::sync::Arc;

use crate::error::{NextractError, Result};
use crate::miner::{Matcher, MatcherFn, Miner, Occurrence};

#[derive(Debug, Clone)]
enum Token {
    Literal(char),
    Any,
    Star,
    Class { ranges: Vec<(char, char)>, negated: bool },
}

fn parse_glob(glob: &str) -> Result<Vec<Token>> {
    let mut brackets = 0i32;
    let mut escape = false;
    for c in glob.chars() {
        if escape {
            escape = false;
            continue;
        }
        match c {
            '\\' => escape = true,
            '[' => brackets += 1,
            ']' => {
                brackets -= 1;
                if brackets < 0 {
                    return Err(NextractError::RegexSyntaxCharset);
                }
            }
            _ => {}
        }
    }
    if brackets != 0 {
        return Err(NextractError::RegexSyntaxCharset);
    }

    let chars: Vec<char> = glob.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '*' => {
                tokens.push(Token::Star);
                i += 1;
            }
            '?' => {
                tokens.push(Token::Any);
                i += 1;
            }
            '\\' => {
                i += 1;
                if i >= chars.len() {
                    return Err(NextractError::RegexSyntaxCharset);
                }
                tokens.push(Token::Literal(chars[i]));
                i += 1;
            }
            '[' => {
                i += 1;
                let negated = i < chars.len() && (chars[i] == '^' || chars[i] == '!');
                if negated {
                    i += 1;
                }
                let mut ranges = Vec::new();
                while i < chars.len() && chars[i] != ']' {
                    let lo = chars[i];
                    if i + 2 < chars.len() && chars[i + 1] == '-' && chars[i + 2] != ']' {
                        ranges.push((lo, chars[i + 2]));
                        i += 3;
                    } else {
                        ranges.push((lo, lo));
                        i += 1;
                    }
                }
                if i >= chars.len() {
                    return Err(NextractError::RegexSyntaxCharset);
                }
                i += 1; // consume ']'
                tokens.push(Token::Class { ranges, negated });
            }
            c => {
                tokens.push(Token::Literal(c));
                i += 1;
            }
        }
    }
    Ok(tokens)
}

fn class_matches(ranges: &[(char, char)], negated: bool, c: char) -> bool {
    let lower = c.to_lowercase().next().unwrap_or(c);
    let in_ranges = ranges.iter().any(|&(lo, hi)| {
        let (lo, hi) = (lo.to_lowercase().next().unwrap_or(lo), hi.to_lowercase().next().unwrap_or(hi));
        lo <= lower && lower <= hi
    });
    in_ranges != negated
}

/// Attempts to match `tokens[idx..]` starting at the miner's current
/// position. Backtracks through `Star` by trying progressively longer
/// matched runs. On success the cursor sits just past the match; on
/// failure the cursor is restored to its entry position.
fn try_match(miner: &mut Miner, tokens: &[Token], idx: usize) -> bool {
    if idx >= tokens.len() {
        return true;
    }
    let saved = miner.mark_pos();
    let ok = match &tokens[idx] {
        Token::Literal(c) => {
            let lc = c.to_lowercase().next().unwrap_or(*c);
            let uc = c.to_uppercase().next().unwrap_or(*c);
            (miner.match_one(&[lc, uc], crate::miner::Dir::Right)) && try_match(miner, tokens, idx + 1)
        }
        Token::Any => {
            miner.match_fn(|b| !crate::predicates::is_delimiter(b), crate::miner::Dir::Right)
                && try_match(miner, tokens, idx + 1)
        }
        Token::Class { ranges, negated } => {
            let (ranges, negated) = (ranges.clone(), *negated);
            miner.match_fn(move |b| class_matches(&ranges, negated, crate::predicates::decode_codepoint(b).0), crate::miner::Dir::Right)
                && try_match(miner, tokens, idx + 1)
        }
        Token::Star => {
            // Try the shortest run first (zero chars), then extend.
            loop {
                let here = miner.mark_pos();
                if try_match(miner, tokens, idx + 1) {
                    break true;
                }
                miner.reset_pos(here);
                if !miner.match_fn(|b| !crate::predicates::is_delimiter(b), crate::miner::Dir::Right) {
                    break false;
                }
            }
        }
    };
    if !ok {
        miner.reset_pos(saved);
    }
    ok
}

/// A compiled glob pattern bound to a label, producing a [`Matcher`].
pub struct GlobMiner {
    tokens: Vec<Token>,
}

impl GlobMiner {
    pub fn compile(glob: &str) -> Result<GlobMiner> {
        Ok(GlobMiner { tokens: parse_glob(glob)? })
    }
}

impl Matcher for GlobMiner {
    fn matcher_fn(&self) -> Arc<MatcherFn> {
        let tokens = self.tokens.clone();
        Arc::new(move |m: &mut Miner| -> Option<Occurrence> {
            if !m.can_move(crate::miner::Dir::Right) {
                return None;
            }
            if !m.mark_start() {
                return None;
            }
            let entry = m.mark_pos();
            if try_match(m, &tokens, 0) {
                // Mark the end before checking the trailing boundary: the
                // delimiter check may itself consume a character, and that
                // consumption must not grow the occurrence's span.
                if m.mark_end() {
                    let at_boundary = m.match_delimiter(crate::miner::Dir::Right) || !m.can_move(crate::miner::Dir::Right);
                    if at_boundary {
                        if let Some(occ) = m.make_occurrence(1.0) {
                            return Some(occ);
                        }
                    }
                }
            }
            m.reset_pos(entry);
            None
        })
    }
}
