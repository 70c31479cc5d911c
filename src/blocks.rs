//! Change-Block Identifier (§4.3).
//!
//! A single left-to-right pass over the raw edit script, grouping
//! removed/added runs into maximal alternating blocks bounded by
//! unchanged entries — the same shape as `compare_text_files`'s own
//! `ChangeTag` iteration, generalized from statistics collection to
//! structural grouping.

use crate::types::{ChangeBlock, IndexedLine, RawEntry, RawKind};

/// Split a raw entry's `value` into individual lines, discarding a single
/// trailing empty string produced by a terminating newline (§4.3).
fn split_lines(value: &str) -> Vec<String> {
    if value.is_empty() {
        return Vec::new();
    }
    let mut lines: Vec<String> = value.split('\n').map(|s| s.to_string()).collect();
    if lines.last().map(|s| s.is_empty()).unwrap_or(false) {
        lines.pop();
    }
    lines
}

struct Cursor {
    old_idx: usize,
    new_idx: usize,
    emitted: usize,
}

/// One emitted element: either a passthrough unchanged run or a change
/// block, in original script order.
pub enum Segment {
    Unchanged(Vec<String>),
    Block(ChangeBlock),
}

/// Group the raw edit script into change blocks interleaved with
/// unchanged passthrough runs (§4.3).
pub fn identify_blocks(script: &[RawEntry]) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut cursor = Cursor {
        old_idx: 0,
        new_idx: 0,
        emitted: 0,
    };

    let mut i = 0;
    while i < script.len() {
        let entry = &script[i];
        if entry.kind == RawKind::Unchanged {
            let lines = split_lines(&entry.value);
            cursor.old_idx += lines.len();
            cursor.new_idx += lines.len();
            cursor.emitted += lines.len();
            segments.push(Segment::Unchanged(lines));
            i += 1;
            continue;
        }

        let start_offset = cursor.emitted;
        let mut removed = Vec::new();
        let mut added = Vec::new();
        while i < script.len() && script[i].kind != RawKind::Unchanged {
            match script[i].kind {
                RawKind::Removed => {
                    for line in split_lines(&script[i].value) {
                        removed.push(IndexedLine {
                            line,
                            index: cursor.old_idx,
                        });
                        cursor.old_idx += 1;
                    }
                }
                RawKind::Added => {
                    for line in split_lines(&script[i].value) {
                        added.push(IndexedLine {
                            line,
                            index: cursor.new_idx,
                        });
                        cursor.new_idx += 1;
                    }
                }
                RawKind::Unchanged => unreachable!(),
            }
            i += 1;
        }
        cursor.emitted += removed.len() + added.len();
        let block = ChangeBlock {
            removed,
            added,
            start_offset,
        };
        if !block.is_empty() {
            segments.push(Segment::Block(block));
        }
    }

    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RawKind;

    fn entry(kind: RawKind, value: &str) -> RawEntry {
        RawEntry {
            kind,
            value: value.to_string(),
            count: 1,
        }
    }

    #[test]
    fn single_unchanged_run_has_no_blocks() {
        let script = vec![entry(RawKind::Unchanged, "a\nb\nc\n")];
        let segs = identify_blocks(&script);
        assert_eq!(segs.len(), 1);
        assert!(matches!(segs[0], Segment::Unchanged(_)));
    }

    #[test]
    fn alternating_removed_added_forms_one_block() {
        let script = vec![
            entry(RawKind::Unchanged, "a\n"),
            entry(RawKind::Removed, "b\n"),
            entry(RawKind::Added, "b2\n"),
            entry(RawKind::Unchanged, "c\n"),
        ];
        let segs = identify_blocks(&script);
        assert_eq!(segs.len(), 3);
        match &segs[1] {
            Segment::Block(b) => {
                assert_eq!(b.removed.len(), 1);
                assert_eq!(b.added.len(), 1);
                assert_eq!(b.removed[0].index, 1);
                assert_eq!(b.added[0].index, 1);
                assert_eq!(b.start_offset, 1);
            }
            _ => panic!("expected block"),
        }
    }

    #[test]
    fn block_at_script_boundaries() {
        let script = vec![entry(RawKind::Added, "x\ny\n")];
        let segs = identify_blocks(&script);
        assert_eq!(segs.len(), 1);
        match &segs[0] {
            Segment::Block(b) => {
                assert_eq!(b.added.len(), 2);
                assert_eq!(b.removed.len(), 0);
            }
            _ => panic!("expected block"),
        }
    }

    #[test]
    fn trailing_newline_does_not_produce_empty_line() {
        let script = vec![entry(RawKind::Removed, "only\n")];
        let segs = identify_blocks(&script);
        match &segs[0] {
            Segment::Block(b) => assert_eq!(b.removed.len(), 1),
            _ => panic!("expected block"),
        }
    }
}
