//! Hash & Signature Layer (§4.1).
//!
//! Two fingerprints back the rest of the pipeline: a 64-bit content hash
//! for exact-match detection, memoized in a per-invocation cache, and a
//! 32-bit SimHash-like signature whose Hamming distance approximates line
//! similarity cheaply enough to serve as the Tier-1 prefilter (§4.2) and
//! as the per-line fingerprint shingled for move detection (§4.6).

use std::collections::HashMap;

/// Content-hash cache scoped to one pipeline invocation (§3 lifecycles).
///
/// Owned by the orchestrator and cleared at `finalize` — see
/// `pipeline::DiffPipeline::run`.
#[derive(Debug, Default)]
pub struct HashCache {
    entries: HashMap<String, u64>,
}

impl HashCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deterministic 64-bit content hash of a line's exact bytes, memoized
    /// by content since lines have no stable identity across sides.
    pub fn hash(&mut self, line: &str) -> u64 {
        if let Some(&h) = self.entries.get(line) {
            return h;
        }
        let h = content_hash(line);
        self.entries.insert(line.to_string(), h);
        h
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Deterministic 64-bit content hash. Blake3 is already a pipeline
/// dependency and plenty fast for per-line hashing; no collision recovery
/// is needed here (§4.1) since callers confirm byte equality before
/// committing to "identical".
pub fn content_hash(line: &str) -> u64 {
    let digest = blake3::hash(line.as_bytes());
    let bytes = digest.as_bytes();
    u64::from_le_bytes(bytes[0..8].try_into().unwrap())
}

/// Tokenize a line into word-like atoms: runs of alphanumeric characters
/// and underscores.
fn tokenize(line: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let bytes = line.as_bytes();
    let mut start = None;
    for (i, ch) in line.char_indices() {
        let is_atom = ch.is_alphanumeric() || ch == '_';
        match (is_atom, start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                tokens.push(&line[s..i]);
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        tokens.push(&line[s..bytes.len().min(line.len())]);
    }
    tokens
}

/// 32-bit SimHash-like signature of a line's weighted tokens (§4.1).
///
/// Each distinct token is weighted by `occurrence_count * token.len()`;
/// for each of the 32 bit positions the weighted votes of every token
/// whose hash has that bit set accumulate positively, the rest
/// negatively, and the output bit is 1 if the accumulator is positive.
pub fn signature(line: &str) -> u32 {
    let tokens = tokenize(line);
    if tokens.is_empty() {
        return 0;
    }

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for t in &tokens {
        *counts.entry(t).or_insert(0) += 1;
    }

    let mut acc = [0i64; 32];
    for (token, count) in counts {
        let weight = (count * token.len()) as i64;
        let h = content_hash(token) as u32;
        for (bit, slot) in acc.iter_mut().enumerate() {
            if (h >> bit) & 1 == 1 {
                *slot += weight;
            } else {
                *slot -= weight;
            }
        }
    }

    let mut result: u32 = 0;
    for (bit, &v) in acc.iter().enumerate() {
        if v > 0 {
            result |= 1 << bit;
        }
    }
    result
}

/// Hamming distance between two 32-bit signatures.
pub fn hamming_distance(a: u32, b: u32) -> u32 {
    (a ^ b).count_ones()
}

/// Signature similarity: `1 - popcount(a XOR b) / 32` (§4.1, Tier 1).
pub fn signature_similarity(a: u32, b: u32) -> f64 {
    1.0 - (hamming_distance(a, b) as f64 / 32.0)
}
