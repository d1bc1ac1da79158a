//! A growable byte buffer chunked into fixed-size pages.
//!
//! The BWT run streams live in these. Pages can be released from the front
//! while a forward-only cursor consumes the stream, which is what keeps the
//! merge inside its memory budget: the inputs are freed as they are read.

use std::io::{Read, Write};

/// Page size in bytes.
pub const PAGE_SIZE: u64 = 1 << 20;

#[derive(Debug, Default)]
pub struct BlockArray {
    pages: Vec<Option<Box<[u8]>>>,
    len: u64,
    /// Pages below this index have been released by `clear_until`.
    cleared: usize,
}

impl BlockArray {
    pub fn new() -> Self {
        BlockArray::default()
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn pages(&self) -> usize {
        self.pages.len()
    }

    #[inline]
    fn page(i: u64) -> usize {
        (i / PAGE_SIZE) as usize
    }

    #[inline]
    fn offset(i: u64) -> usize {
        (i % PAGE_SIZE) as usize
    }

    #[inline]
    pub fn get(&self, i: u64) -> u8 {
        debug_assert!(i < self.len);
        let page = self.pages[Self::page(i)]
            .as_deref()
            .expect("BlockArray: read from a released page");
        page[Self::offset(i)]
    }

    #[inline]
    pub fn set(&mut self, i: u64, value: u8) {
        debug_assert!(i < self.len);
        let page = self.pages[Self::page(i)]
            .as_deref_mut()
            .expect("BlockArray: write to a released page");
        page[Self::offset(i)] = value;
    }

    #[inline]
    pub fn push(&mut self, value: u8) {
        if Self::offset(self.len) == 0 {
            self.pages
                .push(Some(vec![0u8; PAGE_SIZE as usize].into_boxed_slice()));
        }
        self.set_unchecked(self.len, value);
        self.len += 1;
    }

    #[inline]
    fn set_unchecked(&mut self, i: u64, value: u8) {
        if let Some(page) = self.pages[Self::page(i)].as_deref_mut() {
            page[Self::offset(i)] = value;
        }
    }

    /// Releases every page strictly before the page containing `i`.
    /// Reads below the released prefix are no longer permitted.
    pub fn clear_until(&mut self, i: u64) {
        let limit = Self::page(i).min(self.pages.len());
        while self.cleared < limit {
            self.pages[self.cleared] = None;
            self.cleared += 1;
        }
    }

    pub fn clear(&mut self) {
        self.pages.clear();
        self.len = 0;
        self.cleared = 0;
    }

    /// Writes the raw byte stream, without padding.
    pub fn write_to<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        let mut remaining = self.len;
        for page in &self.pages {
            if remaining == 0 {
                break;
            }
            let page = page
                .as_deref()
                .expect("BlockArray: serializing a released page");
            let chunk = remaining.min(PAGE_SIZE) as usize;
            out.write_all(&page[..chunk])?;
            remaining -= chunk as u64;
        }
        Ok(())
    }

    /// Reads `len` raw bytes into a fresh array.
    pub fn read_from<R: Read>(input: &mut R, len: u64) -> std::io::Result<Self> {
        let mut array = BlockArray::new();
        let mut remaining = len;
        while remaining > 0 {
            let chunk = remaining.min(PAGE_SIZE) as usize;
            let mut page = vec![0u8; PAGE_SIZE as usize].into_boxed_slice();
            input.read_exact(&mut page[..chunk])?;
            array.pages.push(Some(page));
            array.len += chunk as u64;
            remaining -= chunk as u64;
        }
        Ok(array)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_and_read_across_pages() {
        let mut array = BlockArray::new();
        let n = PAGE_SIZE * 2 + 17;
        for i in 0..n {
            array.push((i % 251) as u8);
        }
        assert_eq!(array.len(), n);
        assert_eq!(array.pages(), 3);
        for i in (0..n).step_by(4097) {
            assert_eq!(array.get(i), (i % 251) as u8);
        }
    }

    #[test]
    fn clear_until_releases_whole_pages_only() {
        let mut array = BlockArray::new();
        for i in 0..(PAGE_SIZE * 3) {
            array.push(i as u8);
        }
        // Mid-page: nothing before the previous page boundary survives.
        array.clear_until(PAGE_SIZE + 5);
        assert_eq!(array.get(PAGE_SIZE + 4), (PAGE_SIZE + 4) as u8);
        array.clear_until(PAGE_SIZE * 2 + 1);
        assert_eq!(array.get(PAGE_SIZE * 2), 0);
        assert_eq!(array.len(), PAGE_SIZE * 3);
    }

    #[test]
    fn clear_until_frees_every_earlier_page() {
        let mut array = BlockArray::new();
        for i in 0..(PAGE_SIZE * 4) {
            array.push(i as u8);
        }
        // Jumping the cursor three pages forward in one call releases all
        // of them, not just the one before the cursor's page.
        array.clear_until(PAGE_SIZE * 3 + 10);
        for page in 0..3 {
            assert!(array.pages[page].is_none(), "page {} still held", page);
        }
        assert_eq!(array.get(PAGE_SIZE * 3), 0);
        assert_eq!(array.len(), PAGE_SIZE * 4);
    }

    #[test]
    fn round_trip_io() {
        let mut array = BlockArray::new();
        for i in 0..100_000u64 {
            array.push((i * 7 % 256) as u8);
        }
        let mut bytes = Vec::new();
        array.write_to(&mut bytes).unwrap();
        assert_eq!(bytes.len(), 100_000);
        let copy = BlockArray::read_from(&mut bytes.as_slice(), 100_000).unwrap();
        for i in (0..100_000).step_by(997) {
            assert_eq!(copy.get(i), array.get(i));
        }
    }
}
