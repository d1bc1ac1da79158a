//! Space-efficient merging of run-length encoded multi-string BWTs.
//!
//! Given the BWTs of two collections of sequences over the same small
//! alphabet, [`Fmi::merge`] produces the BWT of the union collection
//! without ever reconstructing the texts. The merge runs in two stages:
//! a parallel backward search of the second input against the first
//! builds the on-disk rank array, and a producer/consumer pair then
//! splices the two run streams under the rank-array order. Inputs are
//! consumed as they are read and the rank array spills to disk, keeping
//! the whole operation under a configurable memory ceiling.

mod alphabet;
mod bits;
mod block_array;
mod bwt;
mod codec;
mod cumulative;
mod error;
mod fmi;
mod formats;
mod merge;
mod rank_array;
mod rl_array;

pub use alphabet::{Alphabet, AlphabeticOrder};
pub use bits::{BitVector, IntArray, SparseVector};
pub use block_array::BlockArray;
pub use bwt::{Bwt, Ranks};
pub use codec::{byte_code, Run, RunBuffer, ENCODING_BLOCK, MAX_RUN, SIGMA};
pub use cumulative::CumulativeArray;
pub use error::{Error, HeaderError, Result};
pub use fmi::{range_is_empty, range_length, Fmi, SaRange};
pub use formats::{
    FormatKind, IntVectorFormat, NativeFormat, NativeHeader, PlainFormat, RopeFormat, RopeHeader,
    SgaFormat, SgaHeader,
};
pub use merge::{build_rank_array, get_bounds, MergeParameters};
pub use rank_array::{temp_file_name, RankArray, RankArrayReader};
pub use rl_array::{RlArray, RlIter};
