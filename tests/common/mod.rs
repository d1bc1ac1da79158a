//! Shared helpers: a naive reference BWT builder for small collections
//! and seeded random sequence generators.

use bwt_merge::{Alphabet, AlphabeticOrder, Fmi, MergeParameters, PlainFormat};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

/// BWT of a collection of sequences, built by brute force. Each sequence
/// gets its own endmarker; equal suffixes are ordered by sequence id.
pub fn naive_bwt(seqs: &[&[u8]]) -> Vec<u8> {
    let alpha = Alphabet::dna_default();
    let mut suffixes: Vec<(Vec<u8>, usize, usize)> = Vec::new();
    for (id, seq) in seqs.iter().enumerate() {
        let comps: Vec<u8> = seq.iter().map(|&ch| alpha.char2comp[ch as usize]).collect();
        for pos in 0..=comps.len() {
            let mut key = comps[pos..].to_vec();
            key.push(0);
            suffixes.push((key, id, pos));
        }
    }
    suffixes.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));
    suffixes
        .iter()
        .map(|(_, id, pos)| if *pos == 0 { b'$' } else { seqs[*id][*pos - 1] })
        .collect()
}

/// An FM-index over the naive BWT of the collection.
pub fn build_fmi(seqs: &[&[u8]]) -> Fmi {
    fmi_of_bwt(&naive_bwt(seqs))
}

/// An FM-index over an explicit BWT string.
pub fn fmi_of_bwt(bwt: &[u8]) -> Fmi {
    let (data, counts) = PlainFormat::decode(bwt, &Alphabet::dna_default());
    Fmi::from_parts(data, &counts, AlphabeticOrder::Default)
}

/// Random sequences over ACGT with an occasional N.
pub fn random_collection(seed: u64, count: usize, min_len: usize, max_len: usize) -> Vec<Vec<u8>> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let len = rng.gen_range(min_len..=max_len);
            (0..len)
                .map(|_| match rng.gen_range(0..20) {
                    0 => b'N',
                    n => b"ACGT"[n % 4],
                })
                .collect()
        })
        .collect()
}

/// Small merge parameters pointed at the system temp directory.
pub fn test_params() -> MergeParameters {
    MergeParameters {
        threads: 2,
        temp_dir: std::env::temp_dir(),
        ..MergeParameters::default()
    }
    .sanitized()
}
