//! Similarity Kernel (§4.2).
//!
//! Four-tier `similarity(a, b) -> [0,1]`, short-circuiting from cheapest
//! to most expensive the same way `calculate_lcs_similarity`'s own
//! algorithm dispatch bails out of expensive DP for oversized inputs
//! (its `n > 5000` fallback).

use crate::hash::{content_hash, signature, signature_similarity};

/// An optional structural signature for Tier 3 (AST-structure similarity).
/// When a caller has no parser available, Tier 3 is simply skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AstNode {
    Leaf {
        truncated: bool,
    },
    Node {
        root_type: String,
        children: Vec<AstNode>,
    },
}

/// Clamp a similarity score into `[0, 1]`, treating NaN as 0 (§4.2 numeric
/// policy).
fn clamp01(x: f64) -> f64 {
    if x.is_nan() {
        0.0
    } else {
        x.clamp(0.0, 1.0)
    }
}

/// Tier 0: hash equality. Returns `Some(1.0)` only on true byte equality
/// (content hash is just a fast pre-check, not trusted alone).
fn tier0_hash(a: &str, b: &str) -> Option<f64> {
    if content_hash(a) == content_hash(b) && a == b {
        Some(1.0)
    } else {
        None
    }
}

/// Tier 1: signature prefilter. Short-circuits with the signature
/// similarity itself when it is below `fast_threshold` — the lines are
/// different enough that the expensive tiers would just confirm it.
fn tier1_signature(a: &str, b: &str, fast_threshold: f64) -> Option<f64> {
    let sim = signature_similarity(signature(a), signature(b));
    if sim < fast_threshold {
        Some(clamp01(sim))
    } else {
        None
    }
}

/// Lexer-style word tokenization: runs of identifier characters stay
/// together, every other non-whitespace character is its own token.
/// Plain whitespace splitting is too coarse for code (`"data):"` would be
/// one token), collapsing unrelated punctuation changes into a single
/// mismatched blob.
fn tokenize_words(line: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = None;
    for (i, ch) in line.char_indices() {
        if ch.is_whitespace() {
            if let Some(s) = start.take() {
                out.push(&line[s..i]);
            }
            continue;
        }
        let is_ident = ch.is_alphanumeric() || ch == '_';
        match (is_ident, start) {
            (true, None) => start = Some(i),
            (false, None) => out.push(&line[i..i + ch.len_utf8()]),
            (true, Some(_)) => {}
            (false, Some(s)) => {
                out.push(&line[s..i]);
                out.push(&line[i..i + ch.len_utf8()]);
                start = None;
            }
        }
    }
    if let Some(s) = start {
        out.push(&line[s..]);
    }
    out
}

fn tokenize_atoms(line: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = None;
    for (i, ch) in line.char_indices() {
        let is_atom = ch.is_alphanumeric() || ch == '_';
        match (is_atom, start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                out.push(&line[s..i]);
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        out.push(&line[s..]);
    }
    out
}

/// Longest common subsequence length over a generic token slice.
fn lcs_len<T: PartialEq>(a: &[T], b: &[T]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let n = a.len();
    let m = b.len();
    let mut prev = vec![0usize; m + 1];
    let mut curr = vec![0usize; m + 1];
    for i in 1..=n {
        for j in 1..=m {
            if a[i - 1] == b[j - 1] {
                curr[j] = prev[j - 1] + 1;
            } else {
                curr[j] = prev[j].max(curr[j - 1]);
            }
        }
        std::mem::swap(&mut prev, &mut curr);
        curr.iter_mut().for_each(|v| *v = 0);
    }
    prev[m]
}

fn lcs_similarity<T: PartialEq>(a: &[T], b: &[T]) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let longer = a.len().max(b.len());
    if longer == 0 {
        return 1.0;
    }
    // Exact O(n*m) LCS is cheap for single lines but not for pathological
    // inputs; fall back to a fast string metric the way `calculate_lcs_similarity`
    // bails out to `TextDiff::ratio()` above 5000 lines.
    if a.len() > 2000 || b.len() > 2000 {
        return 0.0;
    }
    lcs_len(a, b) as f64 / longer as f64
}

/// Tier 2: enhanced token+word similarity, `0.7*token + 0.3*word`.
fn tier2_enhanced(a: &str, b: &str) -> f64 {
    // Oversized single lines (e.g. minified JS) would make the O(n*m) LCS
    // DP expensive; strsim's Levenshtein ratio is the same fallback tool
    // `calculate_token_smith_waterman` reaches for in that situation.
    const LONG_LINE: usize = 4000;
    if a.len() > LONG_LINE || b.len() > LONG_LINE {
        return clamp01(strsim::normalized_levenshtein(a, b));
    }

    let token_sim = lcs_similarity(&tokenize_atoms(a), &tokenize_atoms(b));
    let word_sim = lcs_similarity(&tokenize_words(a), &tokenize_words(b));
    clamp01(0.7 * token_sim + 0.3 * word_sim)
}

/// Tier 3: AST-structure similarity (optional). Root-type match is 40% of
/// the score; greedy-ordered child matching (pairs scoring > 0.7 consumed)
/// is the remaining 60%.
fn tier3_ast(a: &AstNode, b: &AstNode) -> f64 {
    match (a, b) {
        (AstNode::Leaf { truncated: ta }, AstNode::Leaf { truncated: tb }) => {
            if *ta && *tb {
                1.0
            } else if *ta || *tb {
                0.5
            } else {
                1.0
            }
        }
        (AstNode::Leaf { .. }, AstNode::Node { .. })
        | (AstNode::Node { .. }, AstNode::Leaf { .. }) => 0.0,
        (
            AstNode::Node {
                root_type: ra,
                children: ca,
            },
            AstNode::Node {
                root_type: rb,
                children: cb,
            },
        ) => {
            let root_score = if ra == rb { 1.0 } else { 0.0 };
            let child_score = greedy_child_match(ca, cb);
            clamp01(0.4 * root_score + 0.6 * child_score)
        }
    }
}

fn greedy_child_match(a: &[AstNode], b: &[AstNode]) -> f64 {
    let denom = a.len().max(b.len());
    if denom == 0 {
        return 1.0;
    }
    let mut used_b = vec![false; b.len()];
    let mut matches = 0.0f64;
    for child_a in a {
        let mut best: Option<(usize, f64)> = None;
        for (j, child_b) in b.iter().enumerate() {
            if used_b[j] {
                continue;
            }
            let s = tier3_ast(child_a, child_b);
            if s > 0.7 && best.map(|(_, bs)| s > bs).unwrap_or(true) {
                best = Some((j, s));
            }
        }
        if let Some((j, s)) = best {
            used_b[j] = true;
            matches += s;
        }
    }
    matches / denom as f64
}

/// Parameters the Similarity Kernel needs from `Config` (kept narrow so
/// callers outside `pipeline` can use the kernel standalone, e.g. in
/// move-detection scoring).
#[derive(Debug, Clone, Copy)]
pub struct SimilarityParams {
    pub fast_threshold: f64,
    pub enable_ast: bool,
    pub tier3_weight: f64,
}

impl Default for SimilarityParams {
    fn default() -> Self {
        Self {
            fast_threshold: 0.30,
            enable_ast: true,
            tier3_weight: 1.0,
        }
    }
}

/// Four-tier similarity (§4.2). `ast` is `None` when no structural parser
/// is available for one or both lines, disabling Tier 3 regardless of
/// `params.enable_ast`.
pub fn similarity(
    a: &str,
    b: &str,
    params: &SimilarityParams,
    ast: Option<(&AstNode, &AstNode)>,
) -> f64 {
    if let Some(s) = tier0_hash(a, b) {
        return s;
    }
    if let Some(s) = tier1_signature(a, b, params.fast_threshold) {
        return s;
    }
    let tier2 = tier2_enhanced(a, b);

    if params.enable_ast {
        if let Some((ast_a, ast_b)) = ast {
            let tier3 = tier3_ast(ast_a, ast_b);
            return clamp01(tier2.max(tier3 * params.tier3_weight));
        }
    }
    clamp01(tier2)
}
