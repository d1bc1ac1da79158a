//! Run-length encoded sorted integer sequences.
//!
//! The rank array is built out of these: each one stores a non-decreasing
//! sequence of `u64` values as `(gap, length)` run pairs in variable-byte
//! encoding. Merging two arrays streams both and releases their pages as
//! the cursors advance, so a cascade of merges stays within its budget.

use std::io::Write;

use crate::block_array::BlockArray;
use crate::codec::byte_code;

#[derive(Debug, Default)]
pub struct RlArray {
    data: BlockArray,
    run_count: u64,
    value_count: u64,
}

impl RlArray {
    pub fn new() -> Self {
        RlArray::default()
    }

    /// Number of runs.
    pub fn len(&self) -> u64 {
        self.run_count
    }

    pub fn is_empty(&self) -> bool {
        self.run_count == 0
    }

    /// Number of encoded values.
    pub fn values(&self) -> u64 {
        self.value_count
    }

    /// Size of the encoding in bytes.
    pub fn bytes(&self) -> u64 {
        self.data.len()
    }

    /// Builds from an unsorted value sequence. The vector is sorted in
    /// place and left sorted.
    pub fn from_values(values: &mut Vec<u64>) -> Self {
        let mut array = RlArray::new();
        if values.is_empty() {
            return array;
        }
        values.sort_unstable();
        let mut prev = 0;
        let mut current = values[0];
        let mut length = 1;
        for &value in &values[1..] {
            if value == current {
                length += 1;
            } else {
                array.add_run(current, &mut prev, length);
                current = value;
                length = 1;
            }
        }
        array.add_run(current, &mut prev, length);
        array
    }

    /// Builds from unsorted `(value, length)` runs. Equal values are kept
    /// as adjacent runs rather than coalesced.
    pub fn from_runs(runs: &mut Vec<(u64, u64)>) -> Self {
        let mut array = RlArray::new();
        runs.sort_unstable();
        let mut prev = 0;
        for &(value, length) in runs.iter() {
            array.add_run(value, &mut prev, length);
        }
        array
    }

    /// Merges two arrays, coalescing runs with equal values. Both inputs
    /// are consumed and their pages released as the merge advances.
    pub fn merge(a: RlArray, b: RlArray) -> RlArray {
        if a.is_empty() {
            return b;
        }
        if b.is_empty() {
            return a;
        }
        let mut array = RlArray::new();
        let mut prev = 0;
        let mut a_iter = DrainIter::new(a);
        let mut b_iter = DrainIter::new(b);
        while !a_iter.done() && !b_iter.done() {
            let (a_value, a_length) = a_iter.run;
            let (b_value, b_length) = b_iter.run;
            if a_value < b_value {
                array.add_run(a_value, &mut prev, a_length);
                a_iter.advance();
            } else if b_value < a_value {
                array.add_run(b_value, &mut prev, b_length);
                b_iter.advance();
            } else {
                array.add_run(a_value, &mut prev, a_length + b_length);
                a_iter.advance();
                b_iter.advance();
            }
        }
        while !a_iter.done() {
            array.add_run(a_iter.run.0, &mut prev, a_iter.run.1);
            a_iter.advance();
        }
        while !b_iter.done() {
            array.add_run(b_iter.run.0, &mut prev, b_iter.run.1);
            b_iter.advance();
        }
        array
    }

    fn add_run(&mut self, value: u64, prev: &mut u64, length: u64) {
        debug_assert!(value >= *prev || self.run_count == 0);
        byte_code::write(&mut self.data, value - *prev);
        *prev = value;
        byte_code::write(&mut self.data, length);
        self.run_count += 1;
        self.value_count += length;
    }

    /// A non-destructive run iterator.
    pub fn iter(&self) -> RlIter<'_> {
        RlIter {
            array: self,
            pos: 0,
            ptr: 0,
            value: 0,
        }
    }

    /// Writes the raw encoding; the run and value counts travel separately.
    pub fn write_to<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        self.data.write_to(out)
    }

    pub fn clear(&mut self) {
        self.data.clear();
        self.run_count = 0;
        self.value_count = 0;
    }
}

/// Destructive cursor used by `merge`: pages are released as it reads.
struct DrainIter {
    array: RlArray,
    pos: u64,
    ptr: u64,
    pub run: (u64, u64),
}

impl DrainIter {
    fn new(array: RlArray) -> Self {
        let mut iter = DrainIter {
            array,
            pos: 0,
            ptr: 0,
            run: (0, 0),
        };
        iter.read();
        iter
    }

    fn done(&self) -> bool {
        self.pos >= self.array.run_count
    }

    fn advance(&mut self) {
        self.pos += 1;
        self.read();
    }

    fn read(&mut self) {
        if self.done() {
            return;
        }
        self.run.0 += byte_code::read(&self.array.data, &mut self.ptr);
        self.run.1 = byte_code::read(&self.array.data, &mut self.ptr);
        self.array.data.clear_until(self.ptr);
    }
}

/// Borrowing run iterator.
pub struct RlIter<'a> {
    array: &'a RlArray,
    pos: u64,
    ptr: u64,
    value: u64,
}

impl Iterator for RlIter<'_> {
    type Item = (u64, u64);

    fn next(&mut self) -> Option<(u64, u64)> {
        if self.pos >= self.array.run_count {
            return None;
        }
        self.pos += 1;
        self.value += byte_code::read(&self.array.data, &mut self.ptr);
        let length = byte_code::read(&self.array.data, &mut self.ptr);
        Some((self.value, length))
    }
}
