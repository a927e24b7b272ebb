//! The stream cursor (component B): a byte region plus a codepoint-granular,
//! bidirectionally navigable position.
//!
//! The region is reference-counted (`StreamRegion`) rather than borrowed with
//! a lifetime parameter: miners run on worker threads and each carries its
//! own cursor synchronized from the extractor's, which needs a `'static`,
//! `Send + Sync` handle to the bytes. `open_buffer` therefore copies its
//! input once into an `Arc<[u8]>`; the caller's original slice is untouched
//! and remains usable.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use bitflags::bitflags;
use memmap2::Mmap;

use crate::predicates::decode_codepoint;

bitflags! {
    /// Public stream state bitset. Unlisted bits are reserved.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct StreamFlags: u32 {
        const BOF        = 1 << 0;
        const EOF        = 1 << 1;
        const INITED     = 1 << 2;
        const FAILED      = 1 << 3;
        const PROCESSING = 1 << 4;
        const DONE       = 1 << 5;
        const MMAP       = 1 << 6;
        const MALLOC     = 1 << 7;
    }
}

#[derive(Clone)]
enum StreamRegion {
    Mmap(Arc<Mmap>),
    Buffer(Arc<[u8]>),
}

impl StreamRegion {
    fn as_slice(&self) -> &[u8] {
        match self {
            StreamRegion::Mmap(m) => &m[..],
            StreamRegion::Buffer(b) => &b[..],
        }
    }
}

/// A snapshot of a cursor's position. Pure value; never owns memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mark {
    pub pos: usize,
    pub codepoint_offset: u64,
    pub flags: StreamFlags,
}

/// A byte region with a codepoint cursor over it.
pub struct Cursor {
    region: StreamRegion,
    start: usize,
    end: usize,
    pos: usize,
    codepoint_offset: u64,
    flags: StreamFlags,
}

impl Clone for Cursor {
    fn clone(&self) -> Self {
        Cursor {
            region: self.region.clone(),
            start: self.start,
            end: self.end,
            pos: self.pos,
            codepoint_offset: self.codepoint_offset,
            flags: self.flags,
        }
    }
}

impl Cursor {
    fn from_region(region: StreamRegion, extra: StreamFlags) -> Cursor {
        let end = region.as_slice().len();
        let mut c = Cursor {
            region,
            start: 0,
            end,
            pos: 0,
            codepoint_offset: 0,
            flags: StreamFlags::INITED | extra,
        };
        c.normalize_flags();
        c
    }

    fn failed() -> Cursor {
        Cursor {
            region: StreamRegion::Buffer(Arc::from(&[][..])),
            start: 0,
            end: 0,
            pos: 0,
            codepoint_offset: 0,
            flags: StreamFlags::FAILED,
        }
    }

    /// Maps `path` read-only. Zero-size files are treated as an
    /// already-exhausted stream (BOF and EOF both set). I/O failures are
    /// latched as `FAILED` rather than returned as an error, matching the
    /// "unusable but destroyable" contract — callers check `flags()`.
    pub fn open_file<P: AsRef<Path>>(path: P) -> Cursor {
        let file = match File::open(path.as_ref()) {
            Ok(f) => f,
            Err(_) => return Cursor::failed(),
        };
        let len = match file.metadata() {
            Ok(m) => m.len(),
            Err(_) => return Cursor::failed(),
        };
        if len == 0 {
            return Cursor::from_region(StreamRegion::Buffer(Arc::from(&[][..])), StreamFlags::MALLOC);
        }
        match unsafe { Mmap::map(&file) } {
            Ok(mmap) => Cursor::from_region(StreamRegion::Mmap(Arc::new(mmap)), StreamFlags::MMAP),
            Err(_) => Cursor::failed(),
        }
    }

    /// Wraps `bytes` as the stream region. See the module doc for the
    /// ownership adaptation this makes relative to the original contract.
    pub fn open_buffer(bytes: &[u8]) -> Cursor {
        Cursor::from_region(StreamRegion::Buffer(Arc::from(bytes)), StreamFlags::MALLOC)
    }

    pub fn is_failed(&self) -> bool {
        self.flags.contains(StreamFlags::FAILED)
    }

    pub fn flags(&self) -> StreamFlags {
        self.flags
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn codepoint_offset(&self) -> u64 {
        self.codepoint_offset
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.region.as_slice()
    }

    /// The unconsumed tail from `pos` to `end`.
    pub fn remaining(&self) -> &[u8] {
        &self.region.as_slice()[self.pos..self.end]
    }

    /// Decodes the codepoint at `pos`, or `None` at `end`.
    pub fn current_codepoint(&self) -> Option<(char, usize)> {
        if self.pos >= self.end {
            None
        } else {
            Some(decode_codepoint(&self.region.as_slice()[self.pos..]))
        }
    }

    fn normalize_flags(&mut self) {
        self.flags.remove(StreamFlags::BOF | StreamFlags::EOF);
        if self.pos <= self.start {
            self.pos = self.start;
            self.flags.insert(StreamFlags::BOF);
        }
        if self.pos >= self.end {
            self.pos = self.end;
            self.flags.insert(StreamFlags::EOF);
        }
    }

    /// Returns the byte offset before advancing. No-op at EOF.
    pub fn next_char(&mut self) -> usize {
        let before = self.pos;
        if self.pos < self.end {
            let (_, len) = decode_codepoint(&self.region.as_slice()[self.pos..]);
            self.pos += len;
            self.codepoint_offset += 1;
            self.normalize_flags();
        }
        before
    }

    /// Returns the byte offset before stepping back. No-op at BOF.
    ///
    /// Skips backward past continuation bytes (`10xxxxxx`) until a leading
    /// byte is found.
    pub fn prev_char(&mut self) -> usize {
        let before = self.pos;
        if self.pos > self.start {
            let bytes = self.region.as_slice();
            let mut p = self.pos - 1;
            while p > self.start && bytes[p] & 0b1100_0000 == 0b1000_0000 {
                p -= 1;
            }
            self.pos = p;
            self.codepoint_offset -= 1;
            self.normalize_flags();
        }
        before
    }

    /// Moves `n.abs()` codepoints in the sign direction of `n`, clamped to
    /// `[start, end]`. Returns the signed number of codepoints actually
    /// traversed.
    pub fn move_by(&mut self, n: i64) -> i64 {
        let mut moved = 0i64;
        if n > 0 {
            for _ in 0..n {
                if self.pos >= self.end {
                    break;
                }
                self.next_char();
                moved += 1;
            }
        } else {
            for _ in 0..(-n) {
                if self.pos <= self.start {
                    break;
                }
                self.prev_char();
                moved -= 1;
            }
        }
        moved
    }

    /// Copies `pos`, `codepoint_offset`, and `flags` from `other`.
    pub fn sync(&mut self, other: &Cursor) {
        self.pos = other.pos;
        self.codepoint_offset = other.codepoint_offset;
        self.flags = other.flags;
    }

    pub fn mark(&self) -> Mark {
        Mark {
            pos: self.pos,
            codepoint_offset: self.codepoint_offset,
            flags: self.flags,
        }
    }

    pub fn goto_mark(&mut self, m: Mark) {
        self.pos = m.pos;
        self.codepoint_offset = m.codepoint_offset;
        self.flags = m.flags;
    }
}
