//! The on-disk rank array: a set of spilled `RlArray` files merged on the
//! fly through a min-heap of streaming iterators.
//!
//! Files are created under a configured temporary directory and removed
//! when the `RankArray` is dropped, on success and failure alike. Runs
//! with equal values coming from different files are emitted back to back
//! without coalescing; the interleaver tolerates adjacent equal values.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use tracing::{debug, warn};

use crate::codec::byte_code;
use crate::error::Result;

/// Monotonic per-process counter for spill file names.
static FILE_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Composes `<dir>/<name_part>_<host>_<pid>_<counter>`. The counter never
/// repeats within a process, so concurrent allocations cannot collide.
pub fn temp_file_name(dir: &Path, name_part: &str) -> PathBuf {
    let host = std::env::var("HOSTNAME").unwrap_or_else(|_| String::from("localhost"));
    let id = FILE_COUNTER.fetch_add(1, AtomicOrdering::Relaxed);
    dir.join(format!(
        "{}_{}_{}_{}",
        name_part,
        host,
        std::process::id(),
        id
    ))
}

#[derive(Debug)]
struct SpillFile {
    path: PathBuf,
    run_count: u64,
    value_count: u64,
}

/// The spilled rank array. Owns its files for its whole lifetime.
#[derive(Debug, Default)]
pub struct RankArray {
    files: Vec<SpillFile>,
}

impl RankArray {
    pub fn new() -> Self {
        RankArray::default()
    }

    /// Records a spill file written by the merge-buffer cascade.
    pub fn push(&mut self, path: PathBuf, run_count: u64, value_count: u64) {
        self.files.push(SpillFile {
            path,
            run_count,
            value_count,
        });
    }

    /// Number of spill files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Total number of encoded values across all files.
    pub fn value_count(&self) -> u64 {
        self.files.iter().map(|f| f.value_count).sum()
    }

    /// Opens every file and builds the merge heap. The reader owns the
    /// spill files and removes them when dropped.
    pub fn open(self) -> Result<RankArrayReader> {
        let mut heap = BinaryHeap::with_capacity(self.files.len());
        for file in &self.files {
            if let Some(iter) = FileRunIterator::open(&file.path, file.run_count)? {
                heap.push(iter);
            }
        }
        debug!(files = self.files.len(), "opened rank array");
        Ok(RankArrayReader { heap, files: self })
    }
}

impl Drop for RankArray {
    fn drop(&mut self) {
        for file in &self.files {
            if let Err(error) = std::fs::remove_file(&file.path) {
                warn!(path = %file.path.display(), %error, "failed to remove spill file");
            }
        }
    }
}

/// A streaming cursor over one spill file, positioned on its current run.
struct FileRunIterator {
    input: BufReader<File>,
    remaining: u64,
    value: u64,
    length: u64,
}

impl FileRunIterator {
    /// Returns `None` for an empty file.
    fn open(path: &Path, run_count: u64) -> Result<Option<Self>> {
        if run_count == 0 {
            return Ok(None);
        }
        let mut iter = FileRunIterator {
            input: BufReader::new(File::open(path)?),
            remaining: run_count,
            value: 0,
            length: 0,
        };
        iter.advance()?;
        Ok(Some(iter))
    }

    /// Moves to the next run; `false` when the stream is exhausted.
    fn advance(&mut self) -> Result<bool> {
        if self.remaining == 0 {
            return Ok(false);
        }
        self.remaining -= 1;
        self.value += byte_code::read_from(&mut self.input)?;
        self.length = byte_code::read_from(&mut self.input)?;
        Ok(true)
    }
}

// The heap is keyed on the current value only; reversed so that
// `BinaryHeap` pops the minimum.
impl PartialEq for FileRunIterator {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for FileRunIterator {}

impl PartialOrd for FileRunIterator {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FileRunIterator {
    fn cmp(&self, other: &Self) -> Ordering {
        other.value.cmp(&self.value)
    }
}

/// Multi-way merge over the spill files, in non-decreasing value order.
pub struct RankArrayReader {
    heap: BinaryHeap<FileRunIterator>,
    // Kept only for its Drop: the files outlive every open handle.
    #[allow(dead_code)]
    files: RankArray,
}

impl RankArrayReader {
    /// The next run in sorted order, or `None` at the end.
    pub fn next_run(&mut self) -> Result<Option<(u64, u64)>> {
        let Some(mut iter) = self.heap.pop() else {
            return Ok(None);
        };
        let run = (iter.value, iter.length);
        if iter.advance()? {
            self.heap.push(iter);
        }
        Ok(Some(run))
    }
}
