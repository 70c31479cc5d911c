//! Slider Corrector (§4.7).
//!
//! A change block is "shiftable" when its boundary duplicates an adjacent
//! unchanged line — the same line could equally be drawn inside or
//! outside the block without changing which lines are reported as
//! removed/added overall, only where the boundary falls. When a block is
//! shiftable, a contextual score (indentation depth, brace balance,
//! trailing delimiter), weighted per language, picks the boundary a
//! human would actually draw. The shift commits only when the contextual
//! gain clears `correction_threshold`; a single pass, no oscillation.

use crate::config::LanguageWeights;
use crate::similarity::{similarity, SimilarityParams};
use crate::types::{ChangeBlock, IndexedLine};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftDirection {
    None,
    Left,
    Right,
}

fn leading_indent(line: &str) -> usize {
    line.chars().take_while(|c| *c == ' ' || *c == '\t').count()
}

fn brace_balance(line: &str) -> i32 {
    let mut balance = 0i32;
    for c in line.chars() {
        match c {
            '{' | '(' | '[' => balance += 1,
            '}' | ')' | ']' => balance -= 1,
            _ => {}
        }
    }
    balance
}

fn trailing_delimiter(line: &str) -> Option<char> {
    line.trim_end().chars().last()
}

/// How "natural" a line is as a hunk boundary: blank lines and lines at
/// low indentation make better split points than lines deep inside a
/// nested block.
fn indent_score(line: Option<&str>) -> f64 {
    match line {
        None => 1.0,
        Some(l) if l.trim().is_empty() => 1.0,
        Some(l) => 1.0 / (1.0 + leading_indent(l) as f64),
    }
}

/// A boundary right after a line that closes more than it opens (a
/// dedent, e.g. a lone `}`) is a conventional place to end a hunk.
fn brace_score(line: Option<&str>) -> f64 {
    match line {
        None => 1.0,
        Some(l) if brace_balance(l) < 0 => 1.0,
        Some(l) if brace_balance(l) == 0 => 0.5,
        Some(_) => 0.0,
    }
}

/// A boundary after a line ending in a statement/block delimiter is
/// preferred over one that splits mid-expression.
fn delimiter_score(line: Option<&str>) -> f64 {
    match line.and_then(trailing_delimiter) {
        None => 1.0,
        Some(';') | Some('}') | Some(',') | Some(':') => 1.0,
        Some(_) => 0.3,
    }
}

fn boundary_score(line: Option<&str>, weights: &LanguageWeights) -> f64 {
    weights.indent_weight * indent_score(line)
        + weights.brace_weight * brace_score(line)
        + weights.delimiter_weight * delimiter_score(line)
}

/// The side of a block used to test shift ambiguity: prefer the removed
/// side, falling back to added when the block is pure-addition.
fn probe_lines(block: &ChangeBlock) -> &[IndexedLine] {
    if !block.removed.is_empty() {
        &block.removed
    } else {
        &block.added
    }
}

fn shiftable_right(block: &ChangeBlock, context_after: Option<&str>) -> bool {
    match (probe_lines(block).first(), context_after) {
        (Some(first), Some(after)) => first.line == after,
        _ => false,
    }
}

fn shiftable_left(block: &ChangeBlock, context_before: Option<&str>) -> bool {
    match (probe_lines(block).last(), context_before) {
        (Some(last), Some(before)) => last.line == before,
        _ => false,
    }
}

/// Ambiguity test (§4.7 step 1): is there a nearby alternative pairing
/// whose similarity is close enough to the current pairing's that the
/// boundary is genuinely ambiguous, rather than the current pairing
/// simply being wrong? Compares the removed-side trailing edge against
/// `context_after` and the added-side leading edge against
/// `context_before` — the two alternative pairings a one-line shift would
/// produce — and passes only when the better of the two is no more than
/// `ambiguity_threshold` above `current_similarity` while itself clearing
/// `modified_threshold`. A dramatically better alternative means the
/// current pairing is mis-paired, not boundary-ambiguous, so it is
/// deliberately excluded here.
fn is_ambiguous(
    block: &ChangeBlock,
    context_before: Option<&str>,
    context_after: Option<&str>,
    ambiguity_threshold: f64,
    modified_threshold: f64,
    current_similarity: f64,
    sim_params: &SimilarityParams,
) -> bool {
    let removed_edge = block.removed.last().map(|l| l.line.as_str());
    let added_edge = block.added.first().map(|l| l.line.as_str());

    let s_minus1 = match (context_before, added_edge) {
        (Some(before), Some(edge)) => similarity(before, edge, sim_params, None),
        _ => 0.0,
    };
    let s_plus1 = match (removed_edge, context_after) {
        (Some(edge), Some(after)) => similarity(edge, after, sim_params, None),
        _ => 0.0,
    };
    let best = s_minus1.max(s_plus1);

    (best - current_similarity) < ambiguity_threshold && best >= modified_threshold
}

/// Decide whether (and which way) to shift a block's boundary (§4.7).
///
/// `context_before`/`context_after` are the unchanged lines immediately
/// surrounding the block, if any. Returns `ShiftDirection::None` when the
/// block is unambiguous (either structurally, or per the §4.7 step 1
/// similarity ambiguity test) or the contextual gain doesn't clear
/// `correction_threshold`.
#[allow(clippy::too_many_arguments)]
pub fn correct_slider(
    block: &ChangeBlock,
    context_before: Option<&str>,
    context_after: Option<&str>,
    weights: &LanguageWeights,
    correction_threshold: f64,
    ambiguity_threshold: f64,
    modified_threshold: f64,
    current_similarity: f64,
    sim_params: &SimilarityParams,
) -> ShiftDirection {
    let can_left = shiftable_left(block, context_before);
    let can_right = shiftable_right(block, context_after);
    if !can_left && !can_right {
        return ShiftDirection::None;
    }

    if !is_ambiguous(
        block,
        context_before,
        context_after,
        ambiguity_threshold,
        modified_threshold,
        current_similarity,
        sim_params,
    ) {
        return ShiftDirection::None;
    }

    let current =
        boundary_score(context_before, weights).max(boundary_score(context_after, weights));

    let mut best = ShiftDirection::None;
    let mut best_gain = correction_threshold;

    if can_left {
        // Shifting left moves `context_before` inside the block and the
        // block's former second-to-last probe line becomes the new edge.
        let probe = probe_lines(block);
        let new_edge = probe
            .get(probe.len().saturating_sub(2))
            .map(|l| l.line.as_str());
        let gain = boundary_score(new_edge, weights) - current;
        if gain > best_gain {
            best_gain = gain;
            best = ShiftDirection::Left;
        }
    }
    if can_right {
        let probe = probe_lines(block);
        let new_edge = probe.get(1).map(|l| l.line.as_str());
        let gain = boundary_score(new_edge, weights) - current;
        if gain > best_gain {
            best = ShiftDirection::Right;
        }
    }

    best
}
