//! The FM-index view: a BWT paired with its alphabet.
//!
//! LF-mapping and backward search are the only operations the merge needs
//! from the inputs; both are read-only and safe to share across worker
//! threads.

use std::path::Path;
use std::time::Instant;

use tracing::info;

use crate::alphabet::Alphabet;
use crate::block_array::BlockArray;
use crate::bwt::{Bwt, Ranks};
use crate::error::{Error, Result};
use crate::formats::{FormatKind, NativeHeader};
use crate::merge::{self, MergeParameters};

/// A closed suffix-array range `[first, second]`. Empty ranges have
/// `first > second` under wrapping comparison, so `(0, u64::MAX)` is the
/// canonical empty result of an unsuccessful search.
pub type SaRange = (u64, u64);

#[inline]
pub fn range_is_empty(range: SaRange) -> bool {
    range.0.wrapping_add(1) > range.1.wrapping_add(1)
}

#[inline]
pub fn range_length(range: SaRange) -> u64 {
    range.1.wrapping_add(1).wrapping_sub(range.0)
}

#[derive(Debug, Default)]
pub struct Fmi {
    pub bwt: Bwt,
    pub alpha: Alphabet,
}

impl Fmi {
    pub fn new(bwt: Bwt, alpha: Alphabet) -> Self {
        debug_assert_eq!(bwt.len(), alpha.size());
        Fmi { bwt, alpha }
    }

    /// Assembles an index from a decoded run stream, its per-comp counts,
    /// and the alphabet tables of `order`.
    pub fn from_parts(
        data: BlockArray,
        counts: &[u64],
        order: crate::alphabet::AlphabeticOrder,
    ) -> Self {
        let bwt = Bwt::new(data);
        let alpha = Alphabet::with_counts(counts, order);
        Fmi::new(bwt, alpha)
    }

    /// Reads an index from a file in the given format.
    pub fn load(path: &Path, format: FormatKind) -> Result<Self> {
        let (data, counts, order) = format.load(path)?;
        Ok(Fmi::from_parts(data, &counts, order))
    }

    /// Writes the index to a file in the given format.
    pub fn save(&self, path: &Path, format: FormatKind) -> Result<()> {
        if !self.alpha.compatible(format.order()) {
            return Err(Error::IncompatibleAlphabet {
                order: self.alpha.identify().name(),
                format: format.tag(),
            });
        }
        let mut header = NativeHeader::new(self.sequences(), self.len());
        header.set_order(self.alpha.identify());
        format.save(path, self.bwt.data(), &header)
    }

    pub fn len(&self) -> u64 {
        self.bwt.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn sequences(&self) -> u64 {
        self.alpha.c[1]
    }

    /// `(LF(i), BWT[i])`.
    pub fn lf(&self, i: u64) -> (u64, u8) {
        let (rank, comp) = self.bwt.inverse_select(i);
        (self.alpha.c[comp as usize] + rank, comp)
    }

    /// `LF(i, comp) = C[comp] + rank(i, comp)`.
    pub fn lf_comp(&self, i: u64, comp: u8) -> u64 {
        self.alpha.c[comp as usize] + self.bwt.rank(i, comp)
    }

    /// Maps a range one backward-search step for `comp`.
    pub fn lf_range(&self, range: SaRange, comp: u8) -> SaRange {
        (
            self.lf_comp(range.0, comp),
            self.lf_comp(range.1 + 1, comp).wrapping_sub(1),
        )
    }

    /// Batched `LF(i, c)` for every comp value.
    pub fn lf_all(&self, i: u64, results: &mut Ranks) {
        self.bwt.ranks(i, results);
        for (comp, result) in results.iter_mut().enumerate() {
            *result += self.alpha.c[comp];
        }
    }

    /// Batched `lf_range` for every comp value: the result for comp `c`
    /// is `(low[c], high[c])` as a closed range.
    pub fn lf_range_all(&self, range: SaRange, low: &mut Ranks, high: &mut Ranks) {
        self.bwt.range_ranks(range, low, high);
        for comp in 0..low.len() {
            low[comp] += self.alpha.c[comp];
            high[comp] = (self.alpha.c[comp] + high[comp]).wrapping_sub(1);
        }
    }

    /// The inverse of LF.
    pub fn psi(&self, i: u64) -> u64 {
        let comp = self.alpha.find_comp(i);
        self.bwt.select(i + 1 - self.alpha.c[comp as usize], comp)
    }

    /// Backward search for a character pattern; empty patterns match the
    /// whole index.
    pub fn find(&self, pattern: &[u8]) -> SaRange {
        if pattern.is_empty() {
            return (0, self.len().wrapping_sub(1));
        }
        let mut chars = pattern.iter().rev();
        let last = self.alpha.char2comp[*chars.next().unwrap() as usize];
        let mut range = self.alpha.comp_range(last);
        for &ch in chars {
            if range_is_empty(range) {
                break;
            }
            range = self.lf_range(range, self.alpha.char2comp[ch as usize]);
        }
        range
    }

    /// Number of occurrences of a pattern.
    pub fn count(&self, pattern: &[u8]) -> u64 {
        let range = self.find(pattern);
        if range_is_empty(range) {
            0
        } else {
            range_length(range)
        }
    }

    /// Recovers sequence `seq` (without its endmarker) by walking LF from
    /// the endmarker position.
    pub fn extract_sequence(&self, seq: u64, out: &mut Vec<u8>) {
        out.clear();
        assert!(seq < self.sequences(), "sequence id out of range");
        let mut pos = seq;
        loop {
            let (prev, comp) = self.lf(pos);
            if comp == 0 {
                break;
            }
            out.push(self.alpha.comp2char[comp as usize]);
            pos = prev;
        }
        out.reverse();
    }

    /// Merges two indexes over the same alphabet into the index of the
    /// union collection, with `a`'s sequences before `b`'s. Both inputs
    /// are consumed; the merge runs within the memory budget implied by
    /// `params`, spilling the rank array under `params.temp_dir`.
    pub fn merge(a: Fmi, b: Fmi, params: &MergeParameters) -> Result<Fmi> {
        if !a.alpha.same_mapping(&b.alpha) {
            return Err(Error::AlphabetMismatch);
        }
        let params = params.sanitized();
        let start = Instant::now();
        info!(
            a_size = a.len(),
            b_size = b.len(),
            threads = params.threads,
            "merging BWTs"
        );

        let rank_array = merge::build_rank_array(&a, &b, &params)?;
        assert_eq!(
            rank_array.value_count(),
            b.len(),
            "rank array does not cover input B"
        );
        info!(
            spill_files = rank_array.len(),
            elapsed_s = start.elapsed().as_secs_f64(),
            "rank array built"
        );

        let alpha = Alphabet::merged(&a.alpha, &b.alpha)?;
        let expected = a.len() + b.len();
        let bwt = Bwt::interleave(a.bwt, b.bwt, rank_array, params.run_buffer_size)?;
        assert_eq!(bwt.len(), expected, "merged BWT has the wrong length");
        assert_eq!(
            bwt.sequences(),
            alpha.c[1],
            "merged BWT has the wrong number of endmarkers"
        );
        info!(
            size = bwt.len(),
            elapsed_s = start.elapsed().as_secs_f64(),
            "merge finished"
        );
        Ok(Fmi::new(bwt, alpha))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::AlphabeticOrder;
    use crate::formats::PlainFormat;

    /// `{"AC$", "AG$"}` gives the BWT `CG$$AA` (see the merge tests for
    /// the derivation).
    fn two_sequence_index() -> Fmi {
        let (data, counts) = PlainFormat::decode(b"CG$$AA", &Alphabet::dna_default());
        Fmi::from_parts(data, &counts, AlphabeticOrder::Default)
    }

    #[test]
    fn lf_and_find() {
        let fmi = two_sequence_index();
        assert_eq!(fmi.len(), 6);
        assert_eq!(fmi.sequences(), 2);

        assert_eq!(fmi.count(b"A"), 2);
        assert_eq!(fmi.count(b"AC"), 1);
        assert_eq!(fmi.count(b"AG"), 1);
        assert_eq!(fmi.count(b"C"), 1);
        assert_eq!(fmi.count(b"T"), 0);
        assert_eq!(fmi.count(b"CA"), 0);
        assert_eq!(fmi.count(b""), 6);

        // psi inverts LF away from the endmarker band.
        for i in 0..fmi.len() {
            let (prev, comp) = fmi.lf(i);
            if comp != 0 {
                assert_eq!(fmi.psi(prev), i, "psi(lf({}))", i);
            }
        }
    }

    #[test]
    fn extraction_recovers_sequences() {
        let fmi = two_sequence_index();
        let mut out = Vec::new();
        fmi.extract_sequence(0, &mut out);
        assert_eq!(out, b"AC");
        fmi.extract_sequence(1, &mut out);
        assert_eq!(out, b"AG");
    }

    #[test]
    fn mismatched_alphabets_are_rejected() {
        let a = two_sequence_index();
        let mut b = two_sequence_index();
        b.alpha = Alphabet::with_counts(&b.alpha.counts(), AlphabeticOrder::Sorted);
        let result = Fmi::merge(a, b, &MergeParameters::default());
        assert!(matches!(result, Err(Error::AlphabetMismatch)));
    }
}
