//! Block-Move Detector (§4.6).
//!
//! Shingles windows of still-unclaimed removed/added lines, LSH-buckets
//! their window signatures, scores candidate window pairs by mean
//! Tier-2 similarity, and greedily commits the best non-overlapping
//! matches — the same greedy, matched-bitmap commit loop as the pack's
//! `rename.rs` (`detect_renames`: best-score-wins, matched arrays guard
//! against double-claiming), generalized from whole-file renames to
//! line-range moves. LSH banding over the window signature follows the
//! band/bucket structure in the pack's `valknut` LSH module.
//!
//! Per §9 "block-move window extension", the deterministic rule adopted
//! here is: *discover* candidate windows at every size `w` in `3..=10`,
//! then *extend* the single best-scoring discovered window greedily
//! while the next line pair still exceeds `moveThreshold`. Discovery and
//! extension are kept as separate passes rather than interleaved.

use crate::hash::signature;
use crate::similarity::{similarity, SimilarityParams};
use crate::types::MoveGroup;
use std::collections::HashMap;

const MIN_WINDOW: usize = 3;
const MAX_WINDOW: usize = 10;

/// A pending line available for move matching: its text and its position
/// within the pool passed to `detect_moves` (not its original side
/// index — the caller maps pool positions back to classified entries).
#[derive(Debug, Clone)]
pub struct PoolLine<'a> {
    pub text: &'a str,
}

fn window_signature(lines: &[PoolLine], start: usize, w: usize) -> u32 {
    lines[start..start + w]
        .iter()
        .fold(0u32, |acc, l| acc ^ signature(l.text))
}

/// Split a 32-bit signature into `bands` equal (as possible) contiguous
/// bit-groups and return the `band_idx`-th group as a bucket key.
fn band_key(sig: u32, band_idx: usize, bands: usize) -> u32 {
    let bits_per_band = 32 / bands.max(1);
    let shift = band_idx * bits_per_band;
    let width = if band_idx == bands - 1 {
        32 - shift
    } else {
        bits_per_band
    };
    let mask = if width >= 32 {
        u32::MAX
    } else {
        (1u32 << width) - 1
    };
    (sig >> shift) & mask
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    removed_start: usize,
    added_start: usize,
    w: usize,
    score: f64,
}

/// Candidate discovery: LSH-bucket windows of every size `3..=10` on both
/// sides, then score same-bucket cross-side pairs by mean Tier-2
/// similarity, keeping only those at or above `move_threshold`.
fn discover_candidates(
    removed: &[PoolLine],
    added: &[PoolLine],
    lsh_bands: usize,
    move_threshold: f64,
    sim_params: &SimilarityParams,
) -> Vec<Candidate> {
    let mut candidates = Vec::new();

    for w in MIN_WINDOW..=MAX_WINDOW {
        if removed.len() < w || added.len() < w {
            continue;
        }

        // bucket key -> added window starts sharing that bucket, per band.
        let mut buckets: HashMap<(usize, u32), Vec<usize>> = HashMap::new();
        for start in 0..=(added.len() - w) {
            let sig = window_signature(added, start, w);
            for band in 0..lsh_bands {
                buckets
                    .entry((band, band_key(sig, band, lsh_bands)))
                    .or_default()
                    .push(start);
            }
        }

        let mut seen_pairs: std::collections::HashSet<(usize, usize)> =
            std::collections::HashSet::new();
        for r_start in 0..=(removed.len() - w) {
            let r_sig = window_signature(removed, r_start, w);
            for band in 0..lsh_bands {
                let key = (band, band_key(r_sig, band, lsh_bands));
                if let Some(added_starts) = buckets.get(&key) {
                    for &a_start in added_starts {
                        if !seen_pairs.insert((r_start, a_start)) {
                            continue;
                        }
                        let score =
                            mean_similarity(removed, added, r_start, a_start, w, sim_params);
                        if score >= move_threshold {
                            candidates.push(Candidate {
                                removed_start: r_start,
                                added_start: a_start,
                                w,
                                score,
                            });
                        }
                    }
                }
            }
        }
    }

    candidates
}

fn mean_similarity(
    removed: &[PoolLine],
    added: &[PoolLine],
    r_start: usize,
    a_start: usize,
    w: usize,
    params: &SimilarityParams,
) -> f64 {
    let mut total = 0.0;
    for k in 0..w {
        total += similarity(
            removed[r_start + k].text,
            added[a_start + k].text,
            params,
            None,
        );
    }
    total / w as f64
}

/// Detect contiguous block moves across two pools of still-unclaimed
/// lines (§4.6). Returns committed move groups with pool-position ranges
/// (inclusive) plus the per-line similarity used to decide purity.
pub fn detect_moves(
    removed: &[PoolLine],
    added: &[PoolLine],
    lsh_bands: usize,
    move_threshold: f64,
    sim_params: &SimilarityParams,
) -> Vec<MoveGroup> {
    if removed.is_empty() || added.is_empty() {
        return Vec::new();
    }

    let mut candidates = discover_candidates(removed, added, lsh_bands, move_threshold, sim_params);
    // Descending length, then descending score (§4.6 step 4).
    candidates.sort_by(|a, b| b.w.cmp(&a.w).then(b.score.partial_cmp(&a.score).unwrap()));

    let mut removed_claimed = vec![false; removed.len()];
    let mut added_claimed = vec![false; added.len()];
    let mut groups = Vec::new();
    let mut next_move_id = 0u64;

    for cand in candidates {
        let r_range = cand.removed_start..cand.removed_start + cand.w;
        let a_range = cand.added_start..cand.added_start + cand.w;
        if r_range.clone().any(|i| removed_claimed[i]) || a_range.clone().any(|i| added_claimed[i])
        {
            continue;
        }

        // Extend greedily while the next line pair still exceeds the
        // move threshold and both sides have unclaimed room (§9 rule).
        let mut r_end = cand.removed_start + cand.w; // exclusive
        let mut a_end = cand.added_start + cand.w;
        let mut sims: Vec<f64> = (0..cand.w)
            .map(|k| {
                similarity(
                    removed[cand.removed_start + k].text,
                    added[cand.added_start + k].text,
                    sim_params,
                    None,
                )
            })
            .collect();

        while r_end < removed.len()
            && a_end < added.len()
            && !removed_claimed[r_end]
            && !added_claimed[a_end]
        {
            let s = similarity(removed[r_end].text, added[a_end].text, sim_params, None);
            if s < move_threshold {
                break;
            }
            sims.push(s);
            r_end += 1;
            a_end += 1;
        }

        removed_claimed[cand.removed_start..r_end].fill(true);
        added_claimed[cand.added_start..a_end].fill(true);

        let avg = sims.iter().sum::<f64>() / sims.len() as f64;
        let pure = sims.iter().all(|&s| s >= 1.0 - 1e-9);

        groups.push(MoveGroup {
            removed_range: (cand.removed_start, r_end - 1),
            added_range: (cand.added_start, a_end - 1),
            avg_similarity: avg,
            pure,
            move_id: next_move_id,
        });
        next_move_id += 1;
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool<'a>(lines: &'a [&'a str]) -> Vec<PoolLine<'a>> {
        lines.iter().map(|&text| PoolLine { text }).collect()
    }

    #[test]
    fn detects_pure_block_move() {
        // The entire removed pool (3 lines, at the window minimum) reappears
        // verbatim one position later on the added side.
        let removed = pool(&["alpha", "beta", "gamma"]);
        let added = pool(&["prefix", "alpha", "beta", "gamma"]);
        let params = SimilarityParams::default();
        let groups = detect_moves(&removed, &added, 4, 0.70, &params);
        assert!(!groups.is_empty());
        let claimed_removed: usize = groups
            .iter()
            .map(|g| g.removed_range.1 - g.removed_range.0 + 1)
            .sum();
        assert_eq!(claimed_removed, 3);
        assert!(groups.iter().all(|g| g.pure));
    }

    #[test]
    fn no_candidates_below_window_minimum() {
        let removed = pool(&["A", "B"]);
        let added = pool(&["B", "A"]);
        let params = SimilarityParams::default();
        let groups = detect_moves(&removed, &added, 4, 0.70, &params);
        assert!(groups.is_empty());
    }

    #[test]
    fn empty_pools_yield_no_moves() {
        let params = SimilarityParams::default();
        assert!(detect_moves(&[], &[], 4, 0.70, &params).is_empty());
    }

    #[test]
    fn band_key_covers_full_range() {
        // every bit should land in exactly one band across all bands
        for bands in [1usize, 2, 4, 8] {
            let mut union = 0u32;
            for b in 0..bands {
                let bits_per_band = 32 / bands;
                let shift = b * bits_per_band;
                let width = if b == bands - 1 {
                    32 - shift
                } else {
                    bits_per_band
                };
                let mask = if width >= 32 {
                    u32::MAX
                } else {
                    (1u32 << width) - 1
                };
                union |= mask << shift;
            }
            assert_eq!(union, u32::MAX, "bands={bands}");
        }
    }
}
