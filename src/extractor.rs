//! The extractor orchestrator (component G): a fixed-size worker pool that
//! runs every registered miner over shared batches of the stream, filters
//! enclosed occurrences, and optionally sorts the result.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use bitflags::bitflags;
use crossbeam_channel::unbounded;

use crate::error::{NextractError, Result};
use crate::loader::MinerLoader;
use crate::miner::{Miner, Occurrence};
use crate::stream::Cursor;

bitflags! {
    /// Behavior toggles, set with `set_flags`/unset with `unset_flags`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ExtractorFlags: u32 {
        /// Drop occurrences fully enclosed by a longer one from the same batch.
        const NO_ENCLOSED_OCCURRENCES = 1 << 0;
        /// Sort the batch's occurrences by `(pos, len)` before returning.
        const SORT_RESULTS = 1 << 1;
    }
}

/// Destructively removes occurrences enclosed by a longer occurrence in the
/// same batch. Identical spans (same `pos` and `len`, different labels) are
/// both kept.
fn filter_longest_occurrences(mut occurrences: Vec<Occurrence>) -> Vec<Occurrence> {
    let n = occurrences.len();
    let mut dead = vec![false; n];
    for a in 0..n {
        if dead[a] {
            continue;
        }
        for b in (a + 1)..n {
            if dead[b] {
                continue;
            }
            let (oa, ob) = (&occurrences[a], &occurrences[b]);
            if oa.pos == ob.pos && oa.len == ob.len {
                continue;
            }
            let aend = oa.byte_end();
            let bend = ob.byte_end();
            if oa.pos <= ob.pos && bend <= aend {
                dead[b] = true;
            }
            if ob.pos <= oa.pos && aend <= bend {
                dead[a] = true;
            }
        }
    }
    let mut kept = Vec::with_capacity(n);
    for (occ, is_dead) in occurrences.drain(..).zip(dead) {
        if !is_dead {
            kept.push(occ);
        }
    }
    kept
}

/// Runs one miner's share of a batch: the same pos/end_last gated loop and
/// Δ−1 budget deduction as the original worker-thread body.
fn run_miner_batch(
    miner: &mut Miner,
    batch: usize,
    no_enclosed: bool,
    last_max: &AtomicU64,
    pout: &Mutex<Vec<Occurrence>>,
) {
    let mut budget = batch as i64;
    while !miner.cursor.flags().contains(crate::stream::StreamFlags::EOF) && budget > 0 {
        let pos = miner.cursor.pos() as u64;
        if pos >= std::cmp::max(miner.pos_last as u64, miner.end_last) {
            let mark = miner.mark_pos();
            if let Some(occ) = miner.run() {
                let last_pos = occ.byte_end();
                let skip = no_enclosed && {
                    let watermark = last_max.load(Ordering::Relaxed);
                    watermark > 0 && last_pos <= watermark
                };
                if !skip {
                    pout.lock().unwrap().push(occ);
                }
            }
            let advanced = miner.cursor.codepoint_offset() as i64 - mark.codepoint_offset as i64;
            if advanced > 0 {
                budget -= advanced - 1;
                miner.cursor.prev_char();
            } else {
                miner.cursor.goto_mark(mark);
            }
        }
        budget -= miner.cursor.move_by(1);
    }
}

/// The worker-pool orchestrator. Owns the registered miners between calls
/// to [`Extractor::next`]; each call hands every miner to the pool for one
/// batch and collects the occurrences they produce.
pub struct Extractor {
    miners: Vec<Miner>,
    flags: ExtractorFlags,
    threads_count: usize,
    stream: Option<Cursor>,
    last_max: u64,
    last_error: Option<String>,
    loader: MinerLoader,
}

impl Extractor {
    pub fn new(threads_count: usize, miners: Vec<Miner>) -> Extractor {
        Extractor {
            miners,
            flags: ExtractorFlags::empty(),
            threads_count: threads_count.max(1),
            stream: None,
            last_max: 0,
            last_error: None,
            loader: MinerLoader::new(),
        }
    }

    pub fn set_flags(&mut self, flags: ExtractorFlags) {
        self.flags.insert(flags);
    }

    pub fn unset_flags(&mut self, flags: ExtractorFlags) {
        self.flags.remove(flags);
    }

    pub fn flags(&self) -> ExtractorFlags {
        self.flags
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn set_last_error(&mut self, err: impl Into<String>) {
        self.last_error = Some(err.into());
    }

    /// Adopts `cursor` as the shared stream and syncs every registered
    /// miner's own cursor to it. Fails (recording `last_error`) if the
    /// cursor is already in a failed state.
    pub fn set_stream(&mut self, cursor: Cursor) -> bool {
        self.unset_stream();
        if cursor.is_failed() {
            self.set_last_error("stream is in a failed state");
            return false;
        }
        // Each miner gets its own clone of the region so worker threads can
        // advance it independently; `next()` re-syncs only position/flags
        // from `self.stream` before each batch.
        for miner in &mut self.miners {
            miner.cursor = cursor.clone();
        }
        self.last_max = 0;
        self.stream = Some(cursor);
        true
    }

    pub fn unset_stream(&mut self) {
        self.stream = None;
        self.last_max = 0;
    }

    /// Whether the shared driving stream has been fully consumed.
    /// `next()` keeps returning batches (possibly empty ones) until this
    /// is true.
    pub fn is_exhausted(&self) -> bool {
        match &self.stream {
            Some(s) => s.flags().contains(crate::stream::StreamFlags::EOF),
            None => true,
        }
    }

    /// Loads a miner factory from a shared library and instantiates it
    /// immediately, adding the result to the pool.
    pub fn add_miner_so(&mut self, so_path: &str, symbol: &str, params: *const u8) -> Result<()> {
        let loaded = self.loader.load(so_path, symbol)?;
        let miner = loaded.instantiate(params)?;
        self.miners.push(miner);
        Ok(())
    }

    pub fn miners_count(&self) -> usize {
        self.miners.len()
    }

    /// Runs every miner over the next `batch` codepoints of the shared
    /// stream and returns the occurrences produced, filtered and sorted
    /// per the current flags.
    #[tracing::instrument(skip(self), fields(miners = self.miners.len()))]
    pub fn next(&mut self, batch: usize) -> Result<Vec<Occurrence>> {
        if self.stream.is_none() {
            return Err(NextractError::StreamFailedState);
        }

        let threads_count = self.threads_count.min(self.miners.len().max(1));
        let no_enclosed = self.flags.contains(ExtractorFlags::NO_ENCLOSED_OCCURRENCES);
        let sort_results = self.flags.contains(ExtractorFlags::SORT_RESULTS);

        let shared = self.stream.as_ref().expect("checked above");
        for miner in &mut self.miners {
            miner.cursor.sync(shared);
        }

        let (job_tx, job_rx) = unbounded::<(usize, Miner)>();
        for (idx, miner) in self.miners.drain(..).enumerate() {
            job_tx.send((idx, miner)).expect("receiver outlives sender");
        }
        drop(job_tx);

        // Advances the watermark position the next batch's miners will sync
        // to, independent of how far each miner's own run actually got.
        self.stream.as_mut().expect("checked above").move_by(batch as i64);

        let finished = Mutex::new(Vec::with_capacity(self.miners.len()));
        let pout = Mutex::new(Vec::new());
        let last_max = AtomicU64::new(self.last_max);

        std::thread::scope(|scope| {
            for _ in 0..threads_count {
                let job_rx = job_rx.clone();
                let finished = &finished;
                let pout = &pout;
                let last_max = &last_max;
                scope.spawn(move || {
                    while let Ok((idx, mut miner)) = job_rx.recv() {
                        run_miner_batch(&mut miner, batch, no_enclosed, last_max, pout);
                        finished.lock().unwrap().push((idx, miner));
                    }
                });
            }
        });

        let mut finished = finished.into_inner().unwrap();
        finished.sort_by_key(|(idx, _)| *idx);
        self.miners = finished.into_iter().map(|(_, m)| m).collect();

        let mut out = pout.into_inner().unwrap();

        if no_enclosed {
            out = filter_longest_occurrences(out);
            let mut watermark = last_max.load(Ordering::Relaxed);
            for occ in &out {
                watermark = std::cmp::max(watermark, occ.byte_end());
            }
            self.last_max = watermark;
        }

        if sort_results {
            out.sort_by(|a, b| a.pos.cmp(&b.pos).then(a.len.cmp(&b.len)));
        }

        tracing::debug!(occurrences = out.len(), threads_count, "batch done");
        Ok(out)
    }
}
