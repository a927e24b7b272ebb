//! The miner framework (component C): cursor-bound matching primitives, the
//! mark/reset protocol, and occurrence construction.

use std::sync::Arc;

use crate::predicates::{decode_codepoint, is_delimiter};
use crate::stream::{Cursor, Mark};

/// Movement direction for a matching primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dir {
    Left = -1,
    Stay = 0,
    Right = 1,
}

/// A labelled span of the input emitted by a miner. Owned rather than
/// borrowed: occurrences cross the worker-pool boundary back to the caller,
/// so each carries its own copy of the matched bytes and a cheaply-cloned
/// label (see §9's occurrence-ownership design note).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Occurrence {
    pub bytes: Vec<u8>,
    pub pos: u64,
    pub upos: u64,
    pub len: u32,
    pub ulen: u32,
    pub label: Arc<str>,
    pub prob: f32,
}

impl Occurrence {
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.bytes).expect("occurrence bytes are valid UTF-8")
    }

    pub fn byte_end(&self) -> u64 {
        self.pos + self.len as u64
    }

    /// True iff `self`'s span lies within `other`'s span and the two are
    /// not identical. Used by the extractor's enclosed-occurrence filter.
    pub fn is_enclosed_in(&self, other: &Occurrence) -> bool {
        let same_span = self.pos == other.pos && self.len == other.len;
        other.pos <= self.pos && self.byte_end() <= other.byte_end() && !same_span
    }
}

/// Matcher function bound to a miner. Returns the occurrence produced, or
/// `None` if the matcher declined at the current position.
pub type MatcherFn = dyn Fn(&mut Miner) -> Option<Occurrence> + Send + Sync;

/// A capability interface for anything that can produce a miner's matcher
/// closure — a hand-written miner, a regex artifact, or a PATRICIA-backed
/// lookup miner (§9's "small capability interface per subsystem").
pub trait Matcher {
    fn matcher_fn(&self) -> Arc<MatcherFn>;
}

/// A named pattern recognizer bound to a private cursor.
pub struct Miner {
    pub label: Arc<str>,
    pub cursor: Cursor,
    matcher: Arc<MatcherFn>,
    start: Option<Mark>,
    end: Option<Mark>,
    /// Byte offset one past the end of the last occurrence this miner
    /// emitted; used to reject overlapping emission.
    pub end_last: u64,
    /// Byte offset the orchestrator treats as "already scanned" for this
    /// miner, independent of whether an occurrence was produced.
    pub pos_last: usize,
    pub allow_empty: bool,
}

impl Miner {
    pub fn new(label: impl Into<Arc<str>>, cursor: Cursor, matcher: Arc<MatcherFn>, allow_empty: bool) -> Miner {
        Miner {
            label: label.into(),
            cursor,
            matcher,
            start: None,
            end: None,
            end_last: 0,
            pos_last: 0,
            allow_empty,
        }
    }

    pub fn can_move(&self, dir: Dir) -> bool {
        match dir {
            Dir::Left => self.cursor.pos() > self.cursor.start(),
            Dir::Right => self.cursor.pos() < self.cursor.end(),
            Dir::Stay => true,
        }
    }

    /// Advances one codepoint in `dir`. Returns whether the move succeeded.
    pub fn step(&mut self, dir: Dir) -> bool {
        match dir {
            Dir::Stay => true,
            Dir::Left => {
                if self.can_move(Dir::Left) {
                    self.cursor.prev_char();
                    true
                } else {
                    false
                }
            }
            Dir::Right => {
                if self.can_move(Dir::Right) {
                    self.cursor.next_char();
                    true
                } else {
                    false
                }
            }
        }
    }

    pub fn get_next(&self) -> Option<(char, usize)> {
        self.cursor.current_codepoint()
    }

    pub fn match_literal(&mut self, literal: char, dir: Dir) -> bool {
        self.match_fn(|b| decode_codepoint(b).0 == literal, dir)
    }

    pub fn match_fn(&mut self, pred: impl Fn(&[u8]) -> bool, dir: Dir) -> bool {
        match self.get_next() {
            Some(_) if pred(self.cursor.remaining()) => self.step(dir),
            _ => false,
        }
    }

    /// Greedy 1+ repetitions. `true` iff at least one match occurred.
    pub fn match_fn_plus(&mut self, pred: impl Fn(&[u8]) -> bool, dir: Dir) -> bool {
        if !self.match_fn(&pred, dir) {
            return false;
        }
        while self.match_fn(&pred, dir) {}
        true
    }

    /// Greedy 0+ repetitions. Always succeeds.
    pub fn match_fn_star(&mut self, pred: impl Fn(&[u8]) -> bool, dir: Dir) -> bool {
        while self.match_fn(&pred, dir) {}
        true
    }

    /// Exactly `n` repetitions, atomically: the cursor is rolled back to its
    /// pre-call position on any failure.
    pub fn match_fn_times(&mut self, pred: impl Fn(&[u8]) -> bool, dir: Dir, n: usize) -> bool {
        let saved = self.cursor.mark();
        for _ in 0..n {
            if !self.match_fn(&pred, dir) {
                self.cursor.goto_mark(saved);
                return false;
            }
        }
        true
    }

    /// Codepoint-by-codepoint forward match of `s`, atomic. Left matching is
    /// reserved by the original contract and not implemented here.
    pub fn match_string(&mut self, s: &str) -> bool {
        let saved = self.cursor.mark();
        for ch in s.chars() {
            if !self.match_literal(ch, Dir::Right) {
                self.cursor.goto_mark(saved);
                return false;
            }
        }
        true
    }

    /// Matches any single codepoint from `chars`.
    pub fn match_one(&mut self, chars: &[char], dir: Dir) -> bool {
        self.match_fn(|b| chars.contains(&decode_codepoint(b).0), dir)
    }

    pub fn match_delimiter(&mut self, dir: Dir) -> bool {
        self.match_fn(is_delimiter, dir)
    }

    /// Records the current position as the span start. Fails (and leaves
    /// no mark) if the position precedes the last emitted occurrence's end.
    pub fn mark_start(&mut self) -> bool {
        if (self.cursor.pos() as u64) < self.end_last {
            return false;
        }
        self.start = Some(self.cursor.mark());
        true
    }

    /// Records the current position as the span end. Same rejection rule as
    /// `mark_start`.
    pub fn mark_end(&mut self) -> bool {
        if (self.cursor.pos() as u64) < self.end_last {
            return false;
        }
        self.end = Some(self.cursor.mark());
        true
    }

    pub fn mark_pos(&self) -> Mark {
        self.cursor.mark()
    }

    pub fn reset_pos(&mut self, m: Mark) {
        self.cursor.goto_mark(m);
    }

    /// Builds an occurrence from the recorded start/end marks.
    ///
    /// Requires both marks set, `start ≤ end`, and rejects empty spans
    /// unless `allow_empty`. Updates `end_last` on success.
    pub fn make_occurrence(&mut self, prob: f32) -> Option<Occurrence> {
        let start = self.start?;
        let end = self.end?;
        if start.pos > end.pos {
            return None;
        }
        if start.pos == end.pos && !self.allow_empty {
            return None;
        }
        if (start.pos as u64) < self.end_last || (end.pos as u64) < self.end_last {
            return None;
        }
        let bytes = self.cursor.as_bytes()[start.pos..end.pos].to_vec();
        let len = (end.pos - start.pos) as u32;
        let ulen = (end.codepoint_offset - start.codepoint_offset) as u32;
        self.end_last = end.pos as u64;
        Some(Occurrence {
            bytes,
            pos: start.pos as u64,
            upos: start.codepoint_offset,
            len,
            ulen,
            label: self.label.clone(),
            prob,
        })
    }

    /// Runs the bound matcher once. Regardless of outcome, clears the
    /// in-progress marks and updates `pos_last` so the orchestrator can
    /// skip already-scanned territory on the next batch.
    pub fn run(&mut self) -> Option<Occurrence> {
        let matcher = Arc::clone(&self.matcher);
        let result = matcher(self);
        let end_val = self.end.map(|m| m.pos as u64).unwrap_or(self.cursor.pos() as u64);
        self.pos_last = std::cmp::max(self.pos_last, std::cmp::max(end_val, self.cursor.pos() as u64) as usize);
        self.start = None;
        self.end = None;
        result
    }
}
