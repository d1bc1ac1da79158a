//! The run-length encoded BWT with block-sampled rank/select support.
//!
//! The symbol stream lives in a `BlockArray` as runs that never cross a
//! 64-byte encoding block. Per block, a `CumulativeArray` for each comp
//! value samples the symbol counts, and a sparse bitmap marks the last
//! sequence position the block covers. Every query locates a block in
//! O(1)-ish time and finishes with a bounded scan of that block.

use std::sync::mpsc;
use std::thread;

use tracing::{debug, info};

use crate::bits::SparseVector;
use crate::block_array::BlockArray;
use crate::codec::{Run, RunBuffer, ENCODING_BLOCK, SIGMA};
use crate::cumulative::CumulativeArray;
use crate::error::Result;
use crate::rank_array::RankArray;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

#[inline]
fn fnv1a_byte(byte: u8, seed: u64) -> u64 {
    (seed ^ u64::from(byte)).wrapping_mul(FNV_PRIME)
}

/// Per-comp rank results, indexed by comp value.
pub type Ranks = [u64; SIGMA];

#[derive(Debug, Default)]
pub struct Bwt {
    data: BlockArray,
    samples: Vec<CumulativeArray>,
    boundaries: SparseVector,
}

impl Bwt {
    /// Builds the rank/select support for an encoded run stream.
    pub fn new(data: BlockArray) -> Self {
        // First pass: the last sequence position covered by each block.
        let bytes = data.len();
        let mut block_ends = Vec::new();
        let mut seq_pos = 0u64;
        let mut rle_pos = 0u64;
        while rle_pos < bytes {
            let (_, length) = Run::read(&data, &mut rle_pos);
            seq_pos += length;
            if rle_pos >= bytes || rle_pos % ENCODING_BLOCK == 0 {
                block_ends.push(seq_pos - 1);
            }
        }
        let size = seq_pos;
        let blocks = block_ends.len();
        let boundaries = SparseVector::new(block_ends, size, blocks as u64);

        // Second pass: per-comp symbol counts within each block.
        let mut counts = vec![vec![0u64; blocks]; SIGMA];
        for block in 0..blocks as u64 {
            let mut rle_pos = block * ENCODING_BLOCK;
            let limit = bytes.min((block + 1) * ENCODING_BLOCK);
            while rle_pos < limit {
                let (comp, length) = Run::read(&data, &mut rle_pos);
                counts[comp as usize][block as usize] += length;
            }
        }
        let samples = counts
            .iter()
            .map(|c| CumulativeArray::new(c))
            .collect();

        debug!(size, blocks, bytes, "built BWT support");
        Bwt {
            data,
            samples,
            boundaries,
        }
    }

    /// Total number of positions.
    pub fn len(&self) -> u64 {
        self.boundaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of sequences, i.e. endmarkers.
    pub fn sequences(&self) -> u64 {
        self.samples[0].sum()
    }

    /// Size of the encoded stream in bytes.
    pub fn bytes(&self) -> u64 {
        self.data.len()
    }

    /// Number of occurrences of `comp`.
    pub fn count(&self, comp: u8) -> u64 {
        self.samples[comp as usize].sum()
    }

    /// The encoded run stream.
    pub fn data(&self) -> &BlockArray {
        &self.data
    }

    /// First sequence position covered by `block`.
    #[inline]
    fn block_start(&self, block: u64) -> u64 {
        if block == 0 {
            0
        } else {
            self.boundaries.select1(block) + 1
        }
    }

    /// Number of occurrences of `comp` in `[0, i)`.
    pub fn rank(&self, i: u64, comp: u8) -> u64 {
        if comp as usize >= SIGMA {
            return 0;
        }
        let i = i.min(self.len());
        if i == 0 {
            return 0;
        }
        let block = self.boundaries.rank1(i);
        let mut result = self.samples[comp as usize].sum_to(block);
        let mut seq_pos = self.block_start(block);
        let mut rle_pos = block * ENCODING_BLOCK;
        while seq_pos < i {
            let (c, length) = Run::read(&self.data, &mut rle_pos);
            if c == comp {
                result += length.min(i - seq_pos);
            }
            seq_pos += length;
        }
        result
    }

    /// Position of the i-th occurrence of `comp`, 1-indexed; `len()` if
    /// there are fewer than `i` occurrences.
    pub fn select(&self, i: u64, comp: u8) -> u64 {
        debug_assert!(i >= 1);
        if comp as usize >= SIGMA || i > self.count(comp) {
            return self.len();
        }
        let block = self.samples[comp as usize].inverse(i - 1);
        let mut found = self.samples[comp as usize].sum_to(block);
        let mut seq_pos = self.block_start(block);
        let mut rle_pos = block * ENCODING_BLOCK;
        loop {
            let (c, length) = Run::read(&self.data, &mut rle_pos);
            if c == comp {
                if found + length >= i {
                    return seq_pos + (i - found) - 1;
                }
                found += length;
            }
            seq_pos += length;
        }
    }

    /// The comp value at position `i`.
    pub fn at(&self, i: u64) -> u8 {
        assert!(i < self.len(), "BWT access out of bounds");
        let block = self.boundaries.rank1(i);
        let mut seq_pos = self.block_start(block);
        let mut rle_pos = block * ENCODING_BLOCK;
        loop {
            let (comp, length) = Run::read(&self.data, &mut rle_pos);
            seq_pos += length;
            if seq_pos > i {
                return comp;
            }
        }
    }

    /// `(rank(i, at(i)), at(i))` in one scan.
    pub fn inverse_select(&self, i: u64) -> (u64, u8) {
        assert!(i < self.len(), "BWT access out of bounds");
        let block = self.boundaries.rank1(i);
        let mut counted = [0u64; SIGMA];
        let mut seq_pos = self.block_start(block);
        let mut rle_pos = block * ENCODING_BLOCK;
        loop {
            let (comp, length) = Run::read(&self.data, &mut rle_pos);
            if seq_pos + length > i {
                let rank = self.samples[comp as usize].sum_to(block)
                    + counted[comp as usize]
                    + (i - seq_pos);
                return (rank, comp);
            }
            counted[comp as usize] += length;
            seq_pos += length;
        }
    }

    /// `rank(i, c)` for every comp value in one scan.
    pub fn ranks(&self, i: u64, results: &mut Ranks) {
        let i = i.min(self.len());
        let block = self.boundaries.rank1(i);
        for (comp, result) in results.iter_mut().enumerate() {
            *result = self.samples[comp].sum_to(block);
        }
        let mut seq_pos = self.block_start(block);
        let mut rle_pos = block * ENCODING_BLOCK;
        while seq_pos < i {
            let (comp, length) = Run::read(&self.data, &mut rle_pos);
            results[comp as usize] += length.min(i - seq_pos);
            seq_pos += length;
        }
    }

    /// `rank(range.0, c)` and `rank(range.1 + 1, c)` for every comp value
    /// in a single scan over the closed range.
    pub fn range_ranks(&self, range: (u64, u64), low: &mut Ranks, high: &mut Ranks) {
        let start = range.0.min(self.len());
        let end = (range.1 + 1).min(self.len());
        let block = self.boundaries.rank1(start);
        let mut counts = [0u64; SIGMA];
        for (comp, count) in counts.iter_mut().enumerate() {
            *count = self.samples[comp].sum_to(block);
        }
        let mut seq_pos = self.block_start(block);
        let mut rle_pos = block * ENCODING_BLOCK;
        let mut low_recorded = false;
        loop {
            if !low_recorded && seq_pos >= start {
                *low = counts;
                low_recorded = true;
            }
            if seq_pos >= end {
                break;
            }
            let (comp, length) = Run::read(&self.data, &mut rle_pos);
            if !low_recorded && seq_pos + length >= start {
                counts[comp as usize] += start - seq_pos;
                *low = counts;
                low_recorded = true;
                counts[comp as usize] += (seq_pos + length).min(end) - start;
            } else {
                counts[comp as usize] += length.min(end - seq_pos);
            }
            seq_pos += length;
        }
        if !low_recorded {
            *low = counts;
        }
        *high = counts;
    }

    /// Writes the comp values of the closed range into `buffer`.
    pub fn extract(&self, range: (u64, u64), buffer: &mut Vec<u8>) {
        buffer.clear();
        if range.0 > range.1 || range.1 >= self.len() {
            return;
        }
        let block = self.boundaries.rank1(range.0);
        let mut seq_pos = self.block_start(block);
        let mut rle_pos = block * ENCODING_BLOCK;
        let mut run;
        // Find the run covering the first position.
        loop {
            run = Run::read(&self.data, &mut rle_pos);
            if seq_pos + run.1 > range.0 {
                break;
            }
            seq_pos += run.1;
        }
        let mut remaining_in_run = seq_pos + run.1 - range.0;
        for _ in range.0..=range.1 {
            if remaining_in_run == 0 {
                run = Run::read(&self.data, &mut rle_pos);
                remaining_in_run = run.1;
            }
            buffer.push(run.0);
            remaining_in_run -= 1;
        }
    }

    /// Per-comp symbol totals by a full scan of the run stream.
    pub fn character_counts(&self) -> Vec<u64> {
        let mut counts = vec![0u64; SIGMA];
        let mut rle_pos = 0;
        while rle_pos < self.data.len() {
            let (comp, length) = Run::read(&self.data, &mut rle_pos);
            counts[comp as usize] += length;
        }
        counts
    }

    /// FNV-1a over the decoded symbol stream.
    pub fn hash(&self) -> u64 {
        let mut result = FNV_OFFSET_BASIS;
        let mut rle_pos = 0;
        while rle_pos < self.data.len() {
            let (comp, length) = Run::read(&self.data, &mut rle_pos);
            for _ in 0..length {
                result = fnv1a_byte(comp, result);
            }
        }
        result
    }

    /// Interleaves two BWTs under the rank array: for each rank-array run
    /// `(a_pos, length)`, the output takes symbols from `a` until `a_pos`
    /// positions of it have been emitted, then `length` symbols from `b`.
    ///
    /// Both inputs are consumed; their pages are released as the cursors
    /// advance. The rank array is drained by a producer thread and handed
    /// over in bounded batches.
    pub fn interleave(a: Bwt, b: Bwt, rank_array: RankArray, batch_size: usize) -> Result<Bwt> {
        let Bwt { data: a_data, .. } = a;
        let Bwt { data: b_data, .. } = b;
        let batch_size = batch_size.max(1);

        let (sender, receiver) = mpsc::sync_channel::<Vec<(u64, u64)>>(1);
        let producer = thread::spawn(move || -> Result<()> {
            let mut reader = rank_array.open()?;
            let mut batch = Vec::with_capacity(batch_size);
            while let Some(run) = reader.next_run()? {
                batch.push(run);
                if batch.len() >= batch_size {
                    if sender.send(batch).is_err() {
                        return Ok(()); // The consumer is gone; it has failed already.
                    }
                    batch = Vec::with_capacity(batch_size);
                }
            }
            let _ = sender.send(batch);
            Ok(())
        });

        let result = Self::splice(a_data, b_data, receiver);
        match producer.join() {
            Ok(producer_result) => producer_result?,
            Err(panic) => std::panic::resume_unwind(panic),
        }
        let data = result;

        info!(bytes = data.len(), "interleaved BWT streams");
        Ok(Bwt::new(data))
    }

    fn splice(
        mut a_data: BlockArray,
        mut b_data: BlockArray,
        batches: mpsc::Receiver<Vec<(u64, u64)>>,
    ) -> BlockArray {
        let mut output = BlockArray::new();
        let mut buffer = RunBuffer::new();

        let mut a_rle = 0u64;
        let mut b_rle = 0u64;
        let mut a_seq = 0u64;
        let mut a_run = (0u8, 0u64);
        let mut b_run = (0u8, 0u64);
        if !a_data.is_empty() {
            a_run = Run::read(&a_data, &mut a_rle);
            a_data.clear_until(a_rle);
        }
        if !b_data.is_empty() {
            b_run = Run::read(&b_data, &mut b_rle);
            b_data.clear_until(b_rle);
        }

        for batch in batches {
            for (a_pos, mut todo) in batch {
                while a_seq < a_pos {
                    assert!(a_run.1 > 0, "rank array value exceeds the size of input A");
                    let take = (a_pos - a_seq).min(a_run.1);
                    if buffer.add(u64::from(a_run.0), take) {
                        Run::write(&mut output, buffer.run.0 as u8, buffer.run.1);
                    }
                    a_run.1 -= take;
                    a_seq += take;
                    if a_run.1 == 0 && a_rle < a_data.len() {
                        a_run = Run::read(&a_data, &mut a_rle);
                        a_data.clear_until(a_rle);
                    }
                }
                while todo > 0 {
                    assert!(b_run.1 > 0, "rank array does not cover input B");
                    let take = todo.min(b_run.1);
                    if buffer.add(u64::from(b_run.0), take) {
                        Run::write(&mut output, buffer.run.0 as u8, buffer.run.1);
                    }
                    b_run.1 -= take;
                    todo -= take;
                    if b_run.1 == 0 && b_rle < b_data.len() {
                        b_run = Run::read(&b_data, &mut b_rle);
                        b_data.clear_until(b_rle);
                    }
                }
            }
        }

        // Everything after the last insertion point comes from A.
        while a_run.1 > 0 {
            if buffer.add(u64::from(a_run.0), a_run.1) {
                Run::write(&mut output, buffer.run.0 as u8, buffer.run.1);
            }
            if a_rle < a_data.len() {
                a_run = Run::read(&a_data, &mut a_rle);
                a_data.clear_until(a_rle);
            } else {
                a_run.1 = 0;
            }
        }
        buffer.flush();
        if buffer.run.1 > 0 {
            Run::write(&mut output, buffer.run.0 as u8, buffer.run.1);
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Encodes a comp sequence as a run stream.
    fn encode(comps: &[u8]) -> BlockArray {
        let mut data = BlockArray::new();
        let mut buffer = RunBuffer::new();
        for &comp in comps {
            if buffer.add(u64::from(comp), 1) {
                Run::write(&mut data, buffer.run.0 as u8, buffer.run.1);
            }
        }
        buffer.flush();
        if buffer.run.1 > 0 {
            Run::write(&mut data, buffer.run.0 as u8, buffer.run.1);
        }
        data
    }

    fn test_sequence() -> Vec<u8> {
        // Mixed short and long runs spanning several encoding blocks.
        let mut comps = Vec::new();
        for i in 0..40u64 {
            let comp = (i % SIGMA as u64) as u8;
            let length = 1 + (i * i) % 97;
            comps.extend(std::iter::repeat(comp).take(length as usize));
        }
        comps
    }

    #[test]
    fn rank_sums_to_position() {
        let comps = test_sequence();
        let bwt = Bwt::new(encode(&comps));
        assert_eq!(bwt.len(), comps.len() as u64);
        for i in (0..=comps.len() as u64).step_by(53) {
            let total: u64 = (0..SIGMA as u8).map(|c| bwt.rank(i, c)).sum();
            assert_eq!(total, i, "rank sum at {}", i);
        }
    }

    #[test]
    fn rank_select_access_agree() {
        let comps = test_sequence();
        let bwt = Bwt::new(encode(&comps));

        let mut seen = [0u64; SIGMA];
        for (i, &comp) in comps.iter().enumerate() {
            let i = i as u64;
            assert_eq!(bwt.at(i), comp, "at({})", i);
            assert_eq!(bwt.rank(i, comp), seen[comp as usize], "rank({}, {})", i, comp);
            assert_eq!(bwt.inverse_select(i), (seen[comp as usize], comp));
            seen[comp as usize] += 1;
            assert_eq!(bwt.select(seen[comp as usize], comp), i);
        }
        for comp in 0..SIGMA as u8 {
            assert_eq!(bwt.count(comp), seen[comp as usize]);
            assert_eq!(bwt.select(seen[comp as usize] + 1, comp), bwt.len());
        }
    }

    #[test]
    fn ranks_and_range_ranks() {
        let comps = test_sequence();
        let bwt = Bwt::new(encode(&comps));
        let n = comps.len() as u64;

        let mut results = [0u64; SIGMA];
        for i in (0..=n).step_by(97) {
            bwt.ranks(i, &mut results);
            for comp in 0..SIGMA as u8 {
                assert_eq!(results[comp as usize], bwt.rank(i, comp));
            }
        }

        let mut low = [0u64; SIGMA];
        let mut high = [0u64; SIGMA];
        for start in (0..n).step_by(241) {
            let end = (start + 67).min(n - 1);
            bwt.range_ranks((start, end), &mut low, &mut high);
            for comp in 0..SIGMA as u8 {
                assert_eq!(low[comp as usize], bwt.rank(start, comp), "low at {}", start);
                assert_eq!(high[comp as usize], bwt.rank(end + 1, comp), "high at {}", end);
            }
        }
    }

    #[test]
    fn extract_round_trip() {
        let comps = test_sequence();
        let bwt = Bwt::new(encode(&comps));
        let n = comps.len() as u64;

        let mut buffer = Vec::new();
        bwt.extract((0, n - 1), &mut buffer);
        assert_eq!(buffer, comps);

        bwt.extract((100, 300), &mut buffer);
        assert_eq!(buffer, &comps[100..=300]);

        bwt.extract((5, 4), &mut buffer);
        assert!(buffer.is_empty());
    }

    #[test]
    fn character_counts_and_hash() {
        let comps = test_sequence();
        let bwt = Bwt::new(encode(&comps));
        let counts = bwt.character_counts();
        for comp in 0..SIGMA as u8 {
            assert_eq!(counts[comp as usize], bwt.count(comp));
        }

        let mut expected = FNV_OFFSET_BASIS;
        for &comp in &comps {
            expected = fnv1a_byte(comp, expected);
        }
        assert_eq!(bwt.hash(), expected);
    }

    #[test]
    fn empty_bwt() {
        let bwt = Bwt::new(BlockArray::new());
        assert_eq!(bwt.len(), 0);
        assert_eq!(bwt.sequences(), 0);
        assert_eq!(bwt.rank(10, 1), 0);
        assert_eq!(bwt.select(1, 1), 0);
    }
}
