//! Pairing Engine (§4.4).
//!
//! Builds the removed x added similarity matrix for a change block (rows
//! computed in parallel with `rayon`, mirroring `compute_fingerprints`'s
//! `par_iter_mut`) and resolves it into pairings with a greedy
//! largest-cell-first strategy and a fixed tie-break order, the same
//! matched/unmatched bookkeeping shape as `match_files.rs`'s
//! `find_similarity_matches`/`all_vs_all_match`.

use crate::similarity::{similarity, SimilarityParams};
use crate::types::{ChangeBlock, Pairing, PairingType, SimilarityMatrix};
use rayon::prelude::*;

/// Build the dense similarity matrix for one change block (§3
/// `SimilarityMatrix`, §4.4 step 1).
pub fn build_matrix(block: &ChangeBlock, params: &SimilarityParams) -> SimilarityMatrix {
    let rows = block.removed.len();
    let cols = block.added.len();
    let mut matrix = SimilarityMatrix::new(rows, cols);
    if rows == 0 || cols == 0 {
        return matrix;
    }

    let row_scores: Vec<Vec<f64>> = block
        .removed
        .par_iter()
        .map(|r| {
            block
                .added
                .iter()
                .map(|a| similarity(&r.line, &a.line, params, None))
                .collect()
        })
        .collect();

    for (i, row) in row_scores.into_iter().enumerate() {
        for (j, v) in row.into_iter().enumerate() {
            matrix.set(i, j, v);
        }
    }
    matrix
}

/// Resolve a similarity matrix into pairings under `modified_threshold`
/// (§4.4 step 2). Repeatedly selects the globally largest remaining cell
/// meeting the threshold, breaking ties by diagonal preference
/// (`|i - j|`), then smaller `i`, then smaller `j`; the chosen row and
/// column are struck out.
///
/// Returns `(pairings, unpaired_removed, unpaired_added)`.
pub fn resolve_pairings(
    matrix: &SimilarityMatrix,
    modified_threshold: f64,
) -> (Vec<Pairing>, Vec<usize>, Vec<usize>) {
    let rows = matrix.rows;
    let cols = matrix.cols;
    let mut row_used = vec![false; rows];
    let mut col_used = vec![false; cols];
    let mut pairings = Vec::new();

    loop {
        let mut best: Option<(usize, usize, f64)> = None;
        #[allow(clippy::needless_range_loop)]
        for i in 0..rows {
            if row_used[i] {
                continue;
            }
            for j in 0..cols {
                if col_used[j] {
                    continue;
                }
                let v = matrix.get(i, j);
                if v < modified_threshold {
                    continue;
                }
                best = Some(match best {
                    None => (i, j, v),
                    Some((bi, bj, bv)) => {
                        if is_better(i, j, v, bi, bj, bv) {
                            (i, j, v)
                        } else {
                            (bi, bj, bv)
                        }
                    }
                });
            }
        }

        match best {
            Some((i, j, v)) => {
                row_used[i] = true;
                col_used[j] = true;
                pairings.push(Pairing {
                    removed_idx: i,
                    added_idx: j,
                    similarity: v,
                    pairing_type: PairingType::Modified,
                });
            }
            None => break,
        }
    }

    let unpaired_removed: Vec<usize> = (0..rows).filter(|&i| !row_used[i]).collect();
    let unpaired_added: Vec<usize> = (0..cols).filter(|&j| !col_used[j]).collect();

    pairings.sort_by_key(|p| p.removed_idx);
    (pairings, unpaired_removed, unpaired_added)
}

/// Tie-break: higher similarity wins; ties prefer the smaller `|i - j|`
/// (diagonal preference), then the smaller `i`, then the smaller `j`
/// (§4.4 step 2, frozen per §9 "Greedy matching ties").
#[allow(clippy::too_many_arguments)]
fn is_better(i: usize, j: usize, v: f64, bi: usize, bj: usize, bv: f64) -> bool {
    if v != bv {
        return v > bv;
    }
    let diag = i.abs_diff(j);
    let bdiag = bi.abs_diff(bj);
    if diag != bdiag {
        return diag < bdiag;
    }
    if i != bi {
        return i < bi;
    }
    j < bj
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix_from(rows: usize, cols: usize, cells: &[(usize, usize, f64)]) -> SimilarityMatrix {
        let mut m = SimilarityMatrix::new(rows, cols);
        for &(i, j, v) in cells {
            m.set(i, j, v);
        }
        m
    }

    #[test]
    fn empty_block_emits_no_pairings() {
        let m = SimilarityMatrix::new(0, 0);
        let (pairings, unpaired_r, unpaired_a) = resolve_pairings(&m, 0.6);
        assert!(pairings.is_empty());
        assert!(unpaired_r.is_empty());
        assert!(unpaired_a.is_empty());
    }

    #[test]
    fn all_removed_or_all_added_yields_only_isolated_entries() {
        let m = SimilarityMatrix::new(3, 0);
        let (pairings, unpaired_r, unpaired_a) = resolve_pairings(&m, 0.6);
        assert!(pairings.is_empty());
        assert_eq!(unpaired_r, vec![0, 1, 2]);
        assert!(unpaired_a.is_empty());
    }

    #[test]
    fn greedy_picks_globally_largest_cell_first() {
        let m = matrix_from(
            2,
            2,
            &[(0, 0, 0.9), (0, 1, 0.95), (1, 0, 0.7), (1, 1, 0.65)],
        );
        let (pairings, _, _) = resolve_pairings(&m, 0.6);
        assert_eq!(pairings.len(), 2);
        let p0 = pairings.iter().find(|p| p.removed_idx == 0).unwrap();
        assert_eq!(p0.added_idx, 1);
        let p1 = pairings.iter().find(|p| p.removed_idx == 1).unwrap();
        assert_eq!(p1.added_idx, 0);
    }

    #[test]
    fn tie_break_prefers_diagonal() {
        // (0,0) and (1,1) both score 0.8; (0,1) and (1,0) would be off-diagonal.
        let m = matrix_from(2, 2, &[(0, 0, 0.8), (0, 1, 0.8), (1, 0, 0.8), (1, 1, 0.8)]);
        let (pairings, _, _) = resolve_pairings(&m, 0.6);
        // First pick must be the smallest |i-j| == 0 cell with smallest i,j -> (0,0)
        assert_eq!(pairings[0].removed_idx, 0);
        assert_eq!(pairings[0].added_idx, 0);
    }

    #[test]
    fn cells_below_threshold_are_left_unpaired() {
        let m = matrix_from(1, 1, &[(0, 0, 0.5)]);
        let (pairings, unpaired_r, unpaired_a) = resolve_pairings(&m, 0.6);
        assert!(pairings.is_empty());
        assert_eq!(unpaired_r, vec![0]);
        assert_eq!(unpaired_a, vec![0]);
    }
}
