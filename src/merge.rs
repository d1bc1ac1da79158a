//! The parallel rank-array construction pipeline.
//!
//! Workers backward-search blocks of `B`'s sequences against `A`, emitting
//! `(a_pos, length)` insertion runs into per-worker buffers. Full buffers
//! cascade through a small array of shared in-memory merge slots and spill
//! to disk when every slot is taken. A single flush pass after the workers
//! join merges the remaining slots and spills the result, leaving a set of
//! sorted files for the multi-way merge in `rank_array`.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use parking_lot::Mutex;
use tracing::debug;

use crate::codec::SIGMA;
use crate::error::Result;
use crate::fmi::{range_is_empty, range_length, Fmi, SaRange};
use crate::rank_array::{temp_file_name, RankArray};
use crate::rl_array::RlArray;

const MEGABYTE: usize = 1 << 20;

/// Bytes per `(a_pos, length)` pair in the unsorted run buffer.
const RUN_BYTES: usize = 16;

const SPILL_PREFIX: &str = "bwt_merge";

/// Tuning knobs for the merge. All sizes are sanitized to sane minimums
/// before use.
#[derive(Clone, Debug)]
pub struct MergeParameters {
    /// Worker thread count.
    pub threads: usize,
    /// Number of sequence blocks handed out to the workers; at least
    /// `threads` after sanitization.
    pub seq_blocks: usize,
    /// Per-worker run buffer capacity, in runs.
    pub run_buffer_size: usize,
    /// Per-worker in-memory buffer limit, in bytes.
    pub thread_buffer_size: usize,
    /// Number of shared merge-buffer slots.
    pub merge_buffers: usize,
    /// Range size below which backward search steps per position instead
    /// of batching rank queries.
    pub short_range: u64,
    /// Where rank-array spill files are created.
    pub temp_dir: PathBuf,
}

impl Default for MergeParameters {
    fn default() -> Self {
        let threads = thread::available_parallelism().map_or(1, |n| n.get());
        MergeParameters {
            threads,
            seq_blocks: 4 * threads,
            run_buffer_size: 8 * MEGABYTE / RUN_BYTES,
            thread_buffer_size: 256 * MEGABYTE,
            merge_buffers: 6,
            short_range: 3,
            temp_dir: PathBuf::from("."),
        }
    }
}

impl MergeParameters {
    /// Clamps every knob to a usable value.
    pub fn sanitized(&self) -> Self {
        let threads = self.threads.max(1);
        MergeParameters {
            threads,
            seq_blocks: self.seq_blocks.max(threads),
            run_buffer_size: self.run_buffer_size.max(1),
            thread_buffer_size: self.thread_buffer_size.max(1),
            merge_buffers: self.merge_buffers.max(1),
            short_range: self.short_range.max(1),
            temp_dir: self.temp_dir.clone(),
        }
    }

    /// Run buffer capacity from a size in megabytes.
    pub fn run_buffer_from_mb(mb: usize) -> usize {
        (mb * MEGABYTE / RUN_BYTES).max(1)
    }

    /// Thread buffer limit from a size in megabytes.
    pub fn thread_buffer_from_mb(mb: usize) -> usize {
        (mb * MEGABYTE).max(1)
    }
}

/// Splits a closed range into at most `blocks` near-even closed ranges.
pub fn get_bounds(range: SaRange, blocks: u64) -> Vec<SaRange> {
    if range_is_empty(range) {
        return Vec::new();
    }
    let blocks = blocks.clamp(1, range_length(range));
    let mut bounds = Vec::with_capacity(blocks as usize);
    let mut start = range.0;
    for block in 0..blocks {
        let first = start;
        if start <= range.1 {
            start += ((range.1 + 1 - start) / (blocks - block)).max(1);
        }
        bounds.push((first, start - 1));
    }
    bounds
}

/// The shared stage of the cascade: `merge_buffers` slots under one lock,
/// and the growing spill-file list under another.
struct MergeBuffers<'a> {
    params: &'a MergeParameters,
    slots: Mutex<Vec<Option<RlArray>>>,
    spills: Mutex<RankArray>,
}

impl<'a> MergeBuffers<'a> {
    fn new(params: &'a MergeParameters) -> Self {
        let mut slots = Vec::with_capacity(params.merge_buffers);
        slots.resize_with(params.merge_buffers, || None);
        MergeBuffers {
            params,
            slots: Mutex::new(slots),
            spills: Mutex::new(RankArray::new()),
        }
    }

    /// Claims the first empty slot for `buffer`, merging occupied slots
    /// into it along the way; spills when every slot was taken.
    fn insert(&self, buffer: RlArray) -> Result<()> {
        let mut buffer = buffer;
        for slot in 0..self.params.merge_buffers {
            let occupant = {
                let mut slots = self.slots.lock();
                match slots[slot].take() {
                    None => {
                        slots[slot] = Some(buffer);
                        return Ok(());
                    }
                    Some(occupant) => occupant,
                }
            };
            buffer = RlArray::merge(buffer, occupant);
        }
        self.spill(buffer)
    }

    fn spill(&self, buffer: RlArray) -> Result<()> {
        let path = {
            let mut spills = self.spills.lock();
            let path = temp_file_name(&self.params.temp_dir, SPILL_PREFIX);
            spills.push(path.clone(), buffer.len(), buffer.values());
            path
        };
        debug!(
            path = %path.display(),
            runs = buffer.len(),
            values = buffer.values(),
            "spilling rank array buffer"
        );
        let mut out = BufWriter::new(File::create(&path)?);
        buffer.write_to(&mut out)?;
        out.flush()?;
        Ok(())
    }

    /// Single-threaded cascade of the remaining slots, lowest first, then
    /// one final spill.
    fn flush(&mut self) -> Result<()> {
        let slots = std::mem::take(self.slots.get_mut());
        let mut merged: Option<RlArray> = None;
        for slot in slots {
            if let Some(buffer) = slot {
                merged = Some(match merged {
                    None => buffer,
                    Some(previous) => RlArray::merge(buffer, previous),
                });
            }
        }
        match merged {
            Some(buffer) if !buffer.is_empty() => self.spill(buffer),
            _ => Ok(()),
        }
    }

    fn into_rank_array(self) -> RankArray {
        self.spills.into_inner()
    }
}

/// Builds the rank array of `b` against `a`: for every suffix of `b`'s
/// collection, the position in `a`'s suffix array where it inserts.
pub fn build_rank_array(a: &Fmi, b: &Fmi, params: &MergeParameters) -> Result<RankArray> {
    if b.sequences() == 0 {
        return Ok(RankArray::new());
    }
    let bounds = get_bounds((0, b.sequences() - 1), params.seq_blocks as u64);
    let mut buffers = MergeBuffers::new(params);
    let next_block = AtomicUsize::new(0);

    thread::scope(|scope| -> Result<()> {
        let mut workers = Vec::with_capacity(params.threads);
        for _ in 0..params.threads {
            workers.push(scope.spawn(|| worker(a, b, params, &buffers, &bounds, &next_block)));
        }
        for handle in workers {
            match handle.join() {
                Ok(result) => result?,
                Err(panic) => std::panic::resume_unwind(panic),
            }
        }
        Ok(())
    })?;

    buffers.flush()?;
    Ok(buffers.into_rank_array())
}

struct WorkerState {
    run_buffer: Vec<(u64, u64)>,
    thread_buffer: RlArray,
}

impl WorkerState {
    fn push_run(
        &mut self,
        a_pos: u64,
        length: u64,
        params: &MergeParameters,
        buffers: &MergeBuffers,
    ) -> Result<()> {
        self.run_buffer.push((a_pos, length));
        if self.run_buffer.len() >= params.run_buffer_size {
            self.flush_runs();
            if self.thread_buffer.bytes() >= params.thread_buffer_size as u64 {
                buffers.insert(std::mem::take(&mut self.thread_buffer))?;
            }
        }
        Ok(())
    }

    fn flush_runs(&mut self) {
        let sorted = RlArray::from_runs(&mut self.run_buffer);
        self.run_buffer.clear();
        self.thread_buffer = RlArray::merge(std::mem::take(&mut self.thread_buffer), sorted);
    }
}

/// Claims sequence blocks until the shared index runs out.
fn worker(
    a: &Fmi,
    b: &Fmi,
    params: &MergeParameters,
    buffers: &MergeBuffers,
    bounds: &[SaRange],
    next_block: &AtomicUsize,
) -> Result<()> {
    let mut state = WorkerState {
        run_buffer: Vec::with_capacity(params.run_buffer_size),
        thread_buffer: RlArray::new(),
    };
    loop {
        let block = next_block.fetch_add(1, Ordering::SeqCst);
        if block >= bounds.len() {
            break;
        }
        traverse(a, b, bounds[block], params, buffers, &mut state)?;
    }
    if !state.run_buffer.is_empty() {
        state.flush_runs();
    }
    if !state.thread_buffer.is_empty() {
        buffers.insert(state.thread_buffer)?;
    }
    Ok(())
}

/// Depth-first backward traversal of one block of `b`'s sequences.
///
/// A stack frame `(a_pos, range)` groups suffixes of `b` that are equal as
/// strings: `range` is their suffix-array range in `b`, and `a_pos` is the
/// number of suffixes of `a` that sort before them. Endmarker suffixes of
/// a block seed the stack at `a.sequences()`, since they sort after `a`'s
/// endmarkers and before everything else. Each frame emits one rank-array
/// run and extends the group one symbol to the left; frames reaching an
/// endmarker stop, so the traversal visits every suffix of the block
/// exactly once.
fn traverse(
    a: &Fmi,
    b: &Fmi,
    seqs: SaRange,
    params: &MergeParameters,
    buffers: &MergeBuffers,
    state: &mut WorkerState,
) -> Result<()> {
    let mut stack: Vec<(u64, SaRange)> = vec![(a.sequences(), seqs)];
    let mut a_steps = [0u64; SIGMA];
    let mut b_low = [0u64; SIGMA];
    let mut b_high = [0u64; SIGMA];

    while let Some((a_pos, range)) = stack.pop() {
        state.push_run(a_pos, range_length(range), params, buffers)?;

        if range.0 == range.1 {
            let (prev, comp) = b.lf(range.0);
            if comp != 0 {
                stack.push((a.lf_comp(a_pos, comp), (prev, prev)));
            }
        } else if range_length(range) <= params.short_range {
            b.lf_range_all(range, &mut b_low, &mut b_high);
            for comp in 1..SIGMA {
                let sub = (b_low[comp], b_high[comp]);
                if !range_is_empty(sub) {
                    stack.push((a.lf_comp(a_pos, comp as u8), sub));
                }
            }
        } else {
            a.lf_all(a_pos, &mut a_steps);
            b.lf_range_all(range, &mut b_low, &mut b_high);
            for comp in 1..SIGMA {
                let sub = (b_low[comp], b_high[comp]);
                if !range_is_empty(sub) {
                    stack.push((a_steps[comp], sub));
                }
            }
        }
    }
    Ok(())
}
