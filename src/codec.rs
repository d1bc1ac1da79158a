//! Byte-level codecs for the run-length encoded BWT stream.
//!
//! Runs are `(comp, length)` pairs. The first byte of a run packs the comp
//! value with a capped length; longer runs continue with a variable-byte
//! integer. A run's encoding never crosses a 64-byte block boundary, so a
//! reader can start decoding at any block start without scanning the
//! preceding stream.

use crate::block_array::BlockArray;

/// Alphabet size, endmarker included.
pub const SIGMA: usize = 6;

/// Longest run length a single basic byte can carry.
pub const MAX_RUN: u64 = (256 / SIGMA) as u64;

/// Size of an encoding block in bytes.
pub const ENCODING_BLOCK: u64 = 64;

/// Variable-byte unsigned integers: 7 data bits per byte, LSB first,
/// bit 7 set while the encoding continues.
pub mod byte_code {
    use super::BlockArray;
    use std::io::Read;

    pub const DATA_BITS: u64 = 7;
    pub const DATA_MASK: u8 = 0x7f;
    pub const NEXT_BYTE: u8 = 0x80;

    pub fn write(array: &mut BlockArray, mut value: u64) {
        while value > u64::from(DATA_MASK) {
            array.push((value as u8 & DATA_MASK) | NEXT_BYTE);
            value >>= DATA_BITS;
        }
        array.push(value as u8);
    }

    /// Decodes the value at `pos` and advances `pos` past it.
    pub fn read(array: &BlockArray, pos: &mut u64) -> u64 {
        let mut offset = 0;
        let mut result = u64::from(array.get(*pos) & DATA_MASK);
        while array.get(*pos) & NEXT_BYTE != 0 {
            *pos += 1;
            offset += DATA_BITS;
            result += u64::from(array.get(*pos) & DATA_MASK) << offset;
        }
        *pos += 1;
        result
    }

    /// Decodes one value from a byte stream.
    pub fn read_from<R: Read>(input: &mut R) -> std::io::Result<u64> {
        let mut offset = 0;
        let mut result = 0u64;
        loop {
            let mut byte = [0u8; 1];
            input.read_exact(&mut byte)?;
            result += u64::from(byte[0] & DATA_MASK) << offset;
            if byte[0] & NEXT_BYTE == 0 {
                return Ok(result);
            }
            offset += DATA_BITS;
        }
    }
}

/// The run codec over a `BlockArray`.
pub struct Run;

impl Run {
    #[inline]
    pub fn encode_basic(comp: u8, length: u64) -> u8 {
        debug_assert!((comp as usize) < SIGMA && length >= 1 && length <= MAX_RUN);
        comp + (SIGMA as u64 * (length - 1)) as u8
    }

    #[inline]
    pub fn decode_basic(code: u8) -> (u8, u64) {
        (
            (code as usize % SIGMA) as u8,
            u64::from(code) / SIGMA as u64 + 1,
        )
    }

    /// Decodes the run at `pos` and advances `pos` past it.
    pub fn read(array: &BlockArray, pos: &mut u64) -> (u8, u64) {
        let (comp, mut length) = Self::decode_basic(array.get(*pos));
        *pos += 1;
        if length >= MAX_RUN {
            length += byte_code::read(array, pos);
        }
        (comp, length)
    }

    /// Appends the run, splitting it so that no encoding crosses a 64-byte
    /// block boundary.
    pub fn write(array: &mut BlockArray, comp: u8, mut length: u64) {
        while length > 0 {
            if length < MAX_RUN {
                array.push(Self::encode_basic(comp, length));
                return;
            }

            let mut bytes_remaining = ENCODING_BLOCK - array.len() % ENCODING_BLOCK;
            let basic = if bytes_remaining > 1 {
                MAX_RUN
            } else {
                MAX_RUN - 1
            };
            array.push(Self::encode_basic(comp, basic));
            length -= basic;
            bytes_remaining -= 1;

            if bytes_remaining > 0 {
                let capacity = byte_code::DATA_BITS * bytes_remaining;
                let extension = if capacity < 64 && bit_length(length) > capacity {
                    (1u64 << capacity) - 1
                } else {
                    length
                };
                byte_code::write(array, extension);
                length -= extension;
            }
        }
    }
}

#[inline]
pub(crate) fn bit_length(value: u64) -> u64 {
    64 - u64::from(value.leading_zeros())
}

/// Coalesces a sequence of values or runs into maximal runs.
///
/// ```ignore
/// let mut buffer = RunBuffer::new();
/// while ... {
///     if buffer.add(value, count) { emit(buffer.run); }
/// }
/// buffer.flush();
/// emit(buffer.run);
/// ```
#[derive(Debug, Default)]
pub struct RunBuffer {
    value: u64,
    length: u64,
    pub run: (u64, u64),
}

impl RunBuffer {
    pub fn new() -> Self {
        RunBuffer::default()
    }

    /// Extends the pending run. Returns `true` when a completed run is
    /// available in `self.run`.
    #[inline]
    pub fn add(&mut self, value: u64, count: u64) -> bool {
        if value == self.value {
            self.length += count;
            false
        } else {
            self.flush();
            self.value = value;
            self.length = count;
            self.run.1 > 0
        }
    }

    /// Makes the pending run available in `self.run`.
    #[inline]
    pub fn flush(&mut self) {
        self.run = (self.value, self.length);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::prelude::*;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn byte_code_round_trip() {
        let values = [0u64, 1, 127, 128, 300, 16_383, 16_384, u64::MAX];
        let mut array = BlockArray::new();
        for &v in &values {
            byte_code::write(&mut array, v);
        }
        let mut pos = 0;
        for &v in &values {
            assert_eq!(byte_code::read(&array, &mut pos), v);
        }
        assert_eq!(pos, array.len());

        let mut bytes = Vec::new();
        array.write_to(&mut bytes).unwrap();
        let mut input = bytes.as_slice();
        for &v in &values {
            assert_eq!(byte_code::read_from(&mut input).unwrap(), v);
        }
    }

    fn random_runs(seed: u64, count: usize) -> Vec<(u8, u64)> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        (0..count)
            .map(|_| {
                let comp = rng.gen_range(0..SIGMA as u8);
                let length = match rng.gen_range(0..4) {
                    0 => rng.gen_range(1..MAX_RUN),
                    1 => rng.gen_range(MAX_RUN..200),
                    2 => rng.gen_range(200..10_000),
                    _ => rng.gen_range(10_000..1_000_000),
                };
                (comp, length)
            })
            .collect()
    }

    #[test]
    fn run_codec_round_trip() {
        let runs = random_runs(1, 2_000);
        let mut array = BlockArray::new();
        for &(comp, length) in &runs {
            Run::write(&mut array, comp, length);
        }

        // Decoding yields the same symbols, though long runs may be split.
        let mut pos = 0;
        let mut decoded = Vec::new();
        while pos < array.len() {
            let (comp, length) = Run::read(&array, &mut pos);
            match decoded.last_mut() {
                Some((c, l)) if *c == comp => *l += length,
                _ => decoded.push((comp, length)),
            }
        }
        let mut expected: Vec<(u8, u64)> = Vec::new();
        for &(comp, length) in &runs {
            match expected.last_mut() {
                Some((c, l)) if *c == comp => *l += length,
                _ => expected.push((comp, length)),
            }
        }
        assert_eq!(decoded, expected);
    }

    #[test]
    fn runs_never_cross_block_boundaries() {
        let runs = random_runs(2, 2_000);
        let mut array = BlockArray::new();
        for &(comp, length) in &runs {
            Run::write(&mut array, comp, length);
        }
        // Starting a scan at any block boundary stays consistent: every run
        // decoded from a boundary start must end within the stream, and runs
        // read sequentially from one boundary land exactly on later ones.
        let total: u64 = runs.iter().map(|&(_, l)| l).sum();
        let mut pos = 0;
        let mut symbols = 0;
        let mut boundaries_seen = 0;
        while pos < array.len() {
            if pos % ENCODING_BLOCK == 0 {
                boundaries_seen += 1;
            }
            let before = pos;
            let (_, length) = Run::read(&array, &mut pos);
            assert_eq!(
                before / ENCODING_BLOCK,
                (pos - 1) / ENCODING_BLOCK,
                "run encoding crossed a block boundary"
            );
            symbols += length;
        }
        assert_eq!(symbols, total);
        assert_eq!(boundaries_seen as u64, array.len().div_ceil(ENCODING_BLOCK));
    }

    #[test]
    fn run_buffer_coalesces() {
        let mut buffer = RunBuffer::new();
        let mut out = Vec::new();
        for &(v, n) in &[(1u64, 2u64), (1, 3), (2, 1), (2, 4), (0, 1), (0, 1)] {
            if buffer.add(v, n) {
                out.push(buffer.run);
            }
        }
        buffer.flush();
        out.push(buffer.run);
        assert_eq!(out, vec![(1, 5), (2, 5), (0, 2)]);
    }
}
