//! K-mer extraction from raw reads.

use std::collections::HashSet;

/// Iterate over every window of `k` characters in `read`, left to right.
///
/// Reads shorter than `k` yield nothing, as does `k == 0`.
pub fn kmers(read: &str, k: usize) -> impl Iterator<Item = &str> + '_ {
    let bounds: Vec<usize> = read
        .char_indices()
        .map(|(idx, _)| idx)
        .chain(std::iter::once(read.len()))
        .collect();
    let count = if k == 0 {
        0
    } else {
        bounds.len().saturating_sub(k)
    };
    (0..count).map(move |start| &read[bounds[start]..bounds[start + k]])
}

/// Break every read into overlapping k-mers, keeping duplicates in input order.
pub fn extract_kmers(reads: &[String], k: usize) -> Vec<String> {
    reads
        .iter()
        .flat_map(|read| kmers(read, k))
        .map(str::to_owned)
        .collect()
}

/// Like [`extract_kmers`] but only keeps the first occurrence of each k-mer.
pub fn extract_distinct_kmers(reads: &[String], k: usize) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut out = Vec::new();
    for read in reads {
        for kmer in kmers(read, k) {
            if seen.insert(kmer) {
                out.push(kmer.to_owned());
            }
        }
    }
    out
}
