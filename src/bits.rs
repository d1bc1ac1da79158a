//! Bit-level building blocks for the succinct structures.
//!
//! `BitVector` is a plain word-packed bitmap with a cumulative-popcount
//! directory giving rank in O(1) block lookups and select by binary search
//! over the directory. `SparseVector` layers an Elias-Fano encoding of a
//! strictly increasing position sequence on top of it, which is what the
//! BWT block boundaries and the cumulative count arrays are stored in.

/// Words per rank directory block (512 bits).
const RANK_WORDS: usize = 8;

/// A fixed bitmap with rank/select support.
///
/// The directory stores the cumulative popcount at every 8-word boundary,
/// so a rank query is one directory lookup plus at most 8 popcounts.
#[derive(Clone, Debug, Default)]
pub struct BitVector {
    words: Vec<u64>,
    len: u64,
    /// `directory[j]` = number of ones in `words[0..j * RANK_WORDS]`.
    directory: Vec<u64>,
    ones: u64,
}

impl BitVector {
    /// Builds the vector and its rank directory from raw words.
    ///
    /// Bits at positions `>= len` must be zero.
    pub fn from_parts(words: Vec<u64>, len: u64) -> Self {
        debug_assert!(words.len() as u64 * 64 >= len);
        let blocks = words.len().div_ceil(RANK_WORDS);
        let mut directory = Vec::with_capacity(blocks + 1);
        let mut ones = 0u64;
        directory.push(0);
        for chunk in words.chunks(RANK_WORDS) {
            for word in chunk {
                ones += u64::from(word.count_ones());
            }
            directory.push(ones);
        }
        BitVector {
            words,
            len,
            directory,
            ones,
        }
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn count_ones(&self) -> u64 {
        self.ones
    }

    pub fn get(&self, i: u64) -> bool {
        debug_assert!(i < self.len);
        (self.words[(i / 64) as usize] >> (i % 64)) & 1 == 1
    }

    /// Number of set bits in `[0, i)`.
    pub fn rank1(&self, i: u64) -> u64 {
        let i = i.min(self.len);
        let word = (i / 64) as usize;
        let block = word / RANK_WORDS;
        let mut result = self.directory[block];
        for w in (block * RANK_WORDS)..word {
            result += u64::from(self.words[w].count_ones());
        }
        let tail = i % 64;
        if tail > 0 {
            result += u64::from((self.words[word] & ((1u64 << tail) - 1)).count_ones());
        }
        result
    }

    /// Position of the k-th set bit, 1-indexed. `k` must be in `[1, count_ones()]`.
    pub fn select1(&self, k: u64) -> u64 {
        debug_assert!(k >= 1 && k <= self.ones);
        let block = self.directory.partition_point(|&ones| ones < k) - 1;
        let mut remaining = k - self.directory[block];
        for w in (block * RANK_WORDS)..self.words.len() {
            let ones = u64::from(self.words[w].count_ones());
            if ones >= remaining {
                return w as u64 * 64 + select_in_word(self.words[w], remaining);
            }
            remaining -= ones;
        }
        unreachable!("select1 past the end of the bitmap");
    }

    /// Position of the k-th zero bit, 1-indexed. `k` must be in `[1, len - count_ones()]`.
    pub fn select0(&self, k: u64) -> u64 {
        debug_assert!(k >= 1 && k <= self.len - self.ones);
        // Largest directory block with fewer than k zeros before it.
        let mut lo = 0usize;
        let mut hi = self.directory.len() - 1;
        while lo < hi {
            let mid = (lo + hi + 1) / 2;
            let zeros = (mid * RANK_WORDS * 64) as u64 - self.directory[mid];
            if zeros < k {
                lo = mid;
            } else {
                hi = mid - 1;
            }
        }
        let block = lo;
        let mut remaining = k - ((block * RANK_WORDS * 64) as u64 - self.directory[block]);
        for w in (block * RANK_WORDS)..self.words.len() {
            let zeros = u64::from(self.words[w].count_zeros());
            if zeros >= remaining {
                return w as u64 * 64 + select_in_word(!self.words[w], remaining);
            }
            remaining -= zeros;
        }
        unreachable!("select0 past the end of the bitmap");
    }
}

/// Offset of the k-th set bit inside a word, 1-indexed.
#[inline]
fn select_in_word(word: u64, k: u64) -> u64 {
    debug_assert!(k >= 1 && k <= u64::from(word.count_ones()));
    let mut w = word;
    let mut remaining = k;
    loop {
        let bit = u64::from(w.trailing_zeros());
        if remaining == 1 {
            return bit;
        }
        w &= w - 1;
        remaining -= 1;
    }
}

/// A packed array of fixed-width unsigned integers.
#[derive(Clone, Debug, Default)]
pub struct IntArray {
    data: Vec<u64>,
    width: u32,
    len: u64,
}

impl IntArray {
    pub fn with_capacity(width: u32, capacity: u64) -> Self {
        debug_assert!(width <= 64);
        let words = if width == 0 {
            0
        } else {
            (capacity * u64::from(width)).div_ceil(64) as usize
        };
        IntArray {
            data: Vec::with_capacity(words),
            width,
            len: 0,
        }
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn push(&mut self, value: u64) {
        if self.width == 0 {
            self.len += 1;
            return;
        }
        debug_assert!(self.width == 64 || value < (1u64 << self.width));
        let bit = self.len * u64::from(self.width);
        let word = (bit / 64) as usize;
        let offset = (bit % 64) as u32;
        if word >= self.data.len() {
            self.data.push(0);
        }
        self.data[word] |= value << offset;
        if offset + self.width > 64 {
            self.data.push(value >> (64 - offset));
        }
        self.len += 1;
    }

    pub fn get(&self, i: u64) -> u64 {
        debug_assert!(i < self.len);
        if self.width == 0 {
            return 0;
        }
        let bit = i * u64::from(self.width);
        let word = (bit / 64) as usize;
        let offset = (bit % 64) as u32;
        let mut value = self.data[word] >> offset;
        if offset + self.width > 64 {
            value |= self.data[word + 1] << (64 - offset);
        }
        if self.width < 64 {
            value &= (1u64 << self.width) - 1;
        }
        value
    }
}

/// Elias-Fano encoding of a strictly increasing sequence of positions,
/// viewed as a bitmap of length `universe` with `count` set bits.
///
/// Supports rank/select over the virtual bitmap, including `select0`,
/// which the cumulative arrays use to invert prefix sums.
#[derive(Clone, Debug, Default)]
pub struct SparseVector {
    len: u64,
    ones: u64,
    low_width: u32,
    low: IntArray,
    high: BitVector,
}

impl SparseVector {
    /// Builds from the set-bit positions, which must be strictly increasing
    /// and below `universe`. The positions are consumed in a single pass.
    pub fn new(values: impl IntoIterator<Item = u64>, universe: u64, count: u64) -> Self {
        if count == 0 {
            return SparseVector {
                len: universe,
                ..SparseVector::default()
            };
        }
        let low_width = if universe / count >= 2 {
            63 - (universe / count).leading_zeros()
        } else {
            0
        };
        let high_len = (universe >> low_width) + count + 1;
        let mut high_words = vec![0u64; high_len.div_ceil(64) as usize];
        let mut low = IntArray::with_capacity(low_width, count);
        let mut index = 0u64;
        let mut prev = 0u64;
        for value in values {
            debug_assert!(value < universe);
            debug_assert!(index == 0 || value > prev);
            prev = value;
            if low_width > 0 {
                low.push(value & ((1u64 << low_width) - 1));
            } else {
                low.push(0);
            }
            let pos = (value >> low_width) + index;
            high_words[(pos / 64) as usize] |= 1u64 << (pos % 64);
            index += 1;
        }
        assert_eq!(index, count, "SparseVector: wrong number of positions");
        SparseVector {
            len: universe,
            ones: count,
            low_width,
            low,
            high: BitVector::from_parts(high_words, high_len),
        }
    }

    /// Length of the virtual bitmap.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn count_ones(&self) -> u64 {
        self.ones
    }

    /// The position of element `e`, 0-indexed.
    pub fn value(&self, e: u64) -> u64 {
        debug_assert!(e < self.ones);
        let pos = self.high.select1(e + 1);
        ((pos - e) << self.low_width) | self.low.get(e)
    }

    /// Number of set bits in `[0, i)`.
    pub fn rank1(&self, i: u64) -> u64 {
        if self.ones == 0 || i == 0 {
            return 0;
        }
        if i >= self.len {
            return self.ones;
        }
        let bucket = i >> self.low_width;
        let low_i = i & low_mask(self.low_width);
        let (mut pos, mut e) = if bucket == 0 {
            (0, 0)
        } else {
            let z = self.high.select0(bucket);
            (z + 1, z + 1 - bucket)
        };
        while pos < self.high.len() && self.high.get(pos) {
            if self.low.get(e) >= low_i {
                break;
            }
            pos += 1;
            e += 1;
        }
        e
    }

    /// Position of the k-th set bit, 1-indexed.
    pub fn select1(&self, k: u64) -> u64 {
        self.value(k - 1)
    }

    /// Position of the k-th zero bit of the virtual bitmap, 1-indexed.
    pub fn select0(&self, k: u64) -> u64 {
        debug_assert!(k >= 1 && k <= self.len - self.ones);
        // The k-th zero has e set bits before it, where e is the first
        // element whose position minus its index reaches k.
        let mut lo = 0u64;
        let mut hi = self.ones;
        while lo < hi {
            let mid = (lo + hi) / 2;
            if self.value(mid) - mid >= k {
                hi = mid;
            } else {
                lo = mid + 1;
            }
        }
        k - 1 + lo
    }

    pub fn get(&self, i: u64) -> bool {
        debug_assert!(i < self.len);
        if self.ones == 0 {
            return false;
        }
        let bucket = i >> self.low_width;
        let low_i = i & low_mask(self.low_width);
        let (mut pos, mut e) = if bucket == 0 {
            (0, 0)
        } else {
            let z = self.high.select0(bucket);
            (z + 1, z + 1 - bucket)
        };
        while pos < self.high.len() && self.high.get(pos) {
            let low = self.low.get(e);
            if low == low_i {
                return true;
            }
            if low > low_i {
                return false;
            }
            pos += 1;
            e += 1;
        }
        false
    }
}

#[inline]
fn low_mask(width: u32) -> u64 {
    if width == 0 {
        0
    } else {
        (1u64 << width) - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::prelude::*;
    use rand_chacha::ChaCha8Rng;

    fn random_positions(seed: u64, universe: u64, count: usize) -> Vec<u64> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut set = std::collections::BTreeSet::new();
        while set.len() < count {
            set.insert(rng.gen_range(0..universe));
        }
        set.into_iter().collect()
    }

    #[test]
    fn bitvector_rank_select() {
        let positions = random_positions(42, 10_000, 600);
        let mut words = vec![0u64; 10_000usize.div_ceil(64)];
        for &p in &positions {
            words[(p / 64) as usize] |= 1 << (p % 64);
        }
        let bv = BitVector::from_parts(words, 10_000);

        assert_eq!(bv.count_ones(), 600);
        let mut ones = 0;
        for i in 0..10_000u64 {
            assert_eq!(bv.rank1(i), ones, "rank1({})", i);
            if bv.get(i) {
                ones += 1;
                assert_eq!(bv.select1(ones), i);
            }
        }
        // Zeros round-trip through select0.
        let mut zeros = 0;
        for i in 0..10_000u64 {
            if !bv.get(i) {
                zeros += 1;
                assert_eq!(bv.select0(zeros), i, "select0({})", zeros);
            }
        }
    }

    #[test]
    fn int_array_round_trip() {
        for width in [1u32, 5, 7, 13, 31, 33, 63, 64] {
            let mut rng = ChaCha8Rng::seed_from_u64(u64::from(width));
            let values: Vec<u64> = (0..500)
                .map(|_| {
                    if width == 64 {
                        rng.gen()
                    } else {
                        rng.gen_range(0..(1u64 << width))
                    }
                })
                .collect();
            let mut array = IntArray::with_capacity(width, values.len() as u64);
            for &v in &values {
                array.push(v);
            }
            for (i, &v) in values.iter().enumerate() {
                assert_eq!(array.get(i as u64), v, "width {} index {}", width, i);
            }
        }
    }

    #[test]
    fn sparse_vector_matches_model() {
        let universe = 100_000u64;
        let positions = random_positions(7, universe, 1_500);
        let sv = SparseVector::new(positions.iter().copied(), universe, positions.len() as u64);

        for (e, &p) in positions.iter().enumerate() {
            assert_eq!(sv.value(e as u64), p);
            assert!(sv.get(p));
        }
        // Spot-check rank against the sorted positions.
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        for _ in 0..2_000 {
            let i = rng.gen_range(0..=universe);
            let expected = positions.partition_point(|&p| p < i) as u64;
            assert_eq!(sv.rank1(i), expected, "rank1({})", i);
        }
        // select0 agrees with rank.
        let zeros = universe - positions.len() as u64;
        for _ in 0..2_000 {
            let k = rng.gen_range(1..=zeros);
            let p = sv.select0(k);
            assert!(!sv.get(p));
            assert_eq!(p - sv.rank1(p), k - 1);
        }
    }

    #[test]
    fn sparse_vector_dense_and_empty() {
        let sv = SparseVector::new(0..100, 100, 100);
        for i in 0..100 {
            assert!(sv.get(i));
            assert_eq!(sv.rank1(i), i);
        }

        let empty = SparseVector::new(std::iter::empty(), 0, 0);
        assert_eq!(empty.len(), 0);
        assert_eq!(empty.count_ones(), 0);
        assert_eq!(empty.rank1(10), 0);
    }
}
