//! Nested Sub-Diff (§4.5).
//!
//! Region detection is a small left-to-right state machine, written in
//! the same terse, state-driven style as the rest of this crate;
//! per-region diffing delegates to the `wordDiff`/`charDiff` primitives
//! (§6.1).

use crate::primitives::{EditOp, Primitives};
use crate::types::{Region, RegionKind, Span, SpanLevel};

#[derive(Clone, Copy, PartialEq, Eq)]
enum StringQuote {
    Single,
    Double,
    Backtick,
}

/// Scan a single line into non-overlapping regions that jointly cover it
/// (§4.5 step 1, §3 `Region` invariant).
pub fn detect_regions(line: &str, language: &str) -> Vec<Region> {
    let line_comment_marker = line_comment_marker(language);
    let supports_block_comment = supports_block_comment(language);

    let bytes = line.as_bytes();
    let mut regions = Vec::new();
    let mut code_start = 0usize;
    let mut i = 0usize;
    let mut in_string: Option<StringQuote> = None;
    let mut string_start = 0usize;

    while i < bytes.len() {
        if let Some(q) = in_string {
            if bytes[i] == b'\\' && i + 1 < bytes.len() {
                i += 2;
                continue;
            }
            let closes = matches!(
                (q, bytes[i]),
                (StringQuote::Single, b'\'')
                    | (StringQuote::Double, b'"')
                    | (StringQuote::Backtick, b'`')
            );
            if closes {
                if code_start < string_start {
                    regions.push(Region {
                        kind: RegionKind::Code,
                        start: code_start,
                        end: string_start,
                    });
                }
                regions.push(Region {
                    kind: RegionKind::String,
                    start: string_start,
                    end: i + 1,
                });
                code_start = i + 1;
                in_string = None;
            }
            i += 1;
            continue;
        }

        if let Some(marker) = line_comment_marker {
            if line[i..].starts_with(marker) {
                if code_start < i {
                    regions.push(Region {
                        kind: RegionKind::Code,
                        start: code_start,
                        end: i,
                    });
                }
                regions.push(Region {
                    kind: RegionKind::LineComment,
                    start: i,
                    end: bytes.len(),
                });
                return regions;
            }
        }

        if supports_block_comment && line[i..].starts_with("/*") {
            if code_start < i {
                regions.push(Region {
                    kind: RegionKind::Code,
                    start: code_start,
                    end: i,
                });
            }
            let end = line[i..]
                .find("*/")
                .map(|p| i + p + 2)
                .unwrap_or(bytes.len());
            regions.push(Region {
                kind: RegionKind::BlockComment,
                start: i,
                end,
            });
            code_start = end;
            i = end;
            continue;
        }

        match bytes[i] {
            b'\'' => {
                in_string = Some(StringQuote::Single);
                string_start = i;
            }
            b'"' => {
                in_string = Some(StringQuote::Double);
                string_start = i;
            }
            b'`' => {
                in_string = Some(StringQuote::Backtick);
                string_start = i;
            }
            _ => {}
        }
        i += 1;
    }

    if let Some(_unclosed) = in_string {
        // Unterminated string literal: treat the remainder as code rather
        // than silently dropping content (§7 per-region errors fall back
        // to whole-line handling).
        if code_start < bytes.len() {
            regions.push(Region {
                kind: RegionKind::Code,
                start: code_start,
                end: bytes.len(),
            });
        }
        return regions;
    }

    if code_start < bytes.len() {
        regions.push(Region {
            kind: RegionKind::Code,
            start: code_start,
            end: bytes.len(),
        });
    }
    if regions.is_empty() {
        regions.push(Region {
            kind: RegionKind::Code,
            start: 0,
            end: bytes.len(),
        });
    }
    regions
}

fn line_comment_marker(language: &str) -> Option<&'static str> {
    Some(match language {
        "python" | "bash" | "yaml" => "#",
        "javascript" | "typescript" | "rust" | "go" | "java" | "c" | "cpp" => "//",
        _ => return None,
    })
}

fn supports_block_comment(language: &str) -> bool {
    matches!(
        language,
        "javascript" | "typescript" | "rust" | "go" | "java" | "c" | "cpp" | "css"
    )
}

fn region_text<'a>(line: &'a str, r: &Region) -> &'a str {
    &line[r.start..r.end]
}

/// Convert primitive edit ops into `Span`s tagged with region/level.
fn ops_to_spans(ops: Vec<EditOp>, region_kind: RegionKind, level: SpanLevel) -> Vec<Span> {
    ops.into_iter()
        .map(|op| Span {
            text: op.text,
            kind: op.kind,
            region_kind,
            level,
        })
        .collect()
}

/// Region-aware nested sub-diff of a modified pair (§4.5 steps 2-4).
///
/// If both sides decompose into the same sequence of region kinds, each
/// region is diffed against its counterpart (string/comment regions at
/// word level, code regions at character level); otherwise the whole line
/// is diffed as code. Returns `(word_spans, char_spans, degraded)` — a
/// span vec may be empty if the corresponding mode toggle is off;
/// `degraded` is true if a primitive call failed and that region's spans
/// were skipped rather than computed (§7 propagation policy).
pub fn nested_sub_diff(
    removed_line: &str,
    added_line: &str,
    language: &str,
    primitives: &dyn Primitives,
    want_words: bool,
    want_chars: bool,
) -> (Vec<Span>, Vec<Span>, bool) {
    if !want_words && !want_chars {
        return (Vec::new(), Vec::new(), false);
    }

    let regions_a = detect_regions(removed_line, language);
    let regions_b = detect_regions(added_line, language);

    let aligned = regions_a.len() == regions_b.len()
        && regions_a
            .iter()
            .zip(regions_b.iter())
            .all(|(a, b)| a.kind == b.kind);

    let mut word_spans = Vec::new();
    let mut char_spans = Vec::new();
    let mut degraded = false;

    if aligned {
        for (ra, rb) in regions_a.iter().zip(regions_b.iter()) {
            let ta = region_text(removed_line, ra);
            let tb = region_text(added_line, rb);
            match ra.kind {
                RegionKind::String | RegionKind::LineComment | RegionKind::BlockComment => {
                    if want_words {
                        match primitives.word_diff(ta, tb) {
                            Ok(ops) => {
                                word_spans.extend(ops_to_spans(ops, ra.kind, SpanLevel::Word))
                            }
                            Err(e) => {
                                log::warn!("word_diff failed on region, degrading: {e}");
                                degraded = true;
                            }
                        }
                    }
                }
                RegionKind::Code => {
                    if want_chars {
                        match primitives.char_diff(ta, tb) {
                            Ok(ops) => {
                                char_spans.extend(ops_to_spans(ops, ra.kind, SpanLevel::Char))
                            }
                            Err(e) => {
                                log::warn!("char_diff failed on region, degrading: {e}");
                                degraded = true;
                            }
                        }
                    }
                }
            }
        }
    } else {
        if want_chars {
            match primitives.char_diff(removed_line, added_line) {
                Ok(ops) => char_spans.extend(ops_to_spans(ops, RegionKind::Code, SpanLevel::Char)),
                Err(e) => {
                    log::warn!("char_diff failed on whole line, degrading: {e}");
                    degraded = true;
                }
            }
        }
        if want_words {
            match primitives.word_diff(removed_line, added_line) {
                Ok(ops) => word_spans.extend(ops_to_spans(ops, RegionKind::Code, SpanLevel::Word)),
                Err(e) => {
                    log::warn!("word_diff failed on whole line, degrading: {e}");
                    degraded = true;
                }
            }
        }
    }

    (word_spans, char_spans, degraded)
}

/// Fast-mode sub-diff (§4.8): a single direct edit-script call per level,
/// bypassing region detection and AST signatures entirely. The whole line
/// is treated as one code region.
pub fn direct_sub_diff(
    removed_line: &str,
    added_line: &str,
    primitives: &dyn Primitives,
    want_words: bool,
    want_chars: bool,
) -> (Vec<Span>, Vec<Span>, bool) {
    let mut word_spans = Vec::new();
    let mut char_spans = Vec::new();
    let mut degraded = false;

    if want_words {
        match primitives.word_diff(removed_line, added_line) {
            Ok(ops) => word_spans.extend(ops_to_spans(ops, RegionKind::Code, SpanLevel::Word)),
            Err(e) => {
                log::warn!("word_diff failed in fast mode, degrading: {e}");
                degraded = true;
            }
        }
    }
    if want_chars {
        match primitives.char_diff(removed_line, added_line) {
            Ok(ops) => char_spans.extend(ops_to_spans(ops, RegionKind::Code, SpanLevel::Char)),
            Err(e) => {
                log::warn!("char_diff failed in fast mode, degrading: {e}");
                degraded = true;
            }
        }
    }

    (word_spans, char_spans, degraded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::DefaultPrimitives;

    #[test]
    fn regions_cover_whole_line() {
        let line = r#"x = "hello" # trailing"#;
        let regions = detect_regions(line, "python");
        assert_eq!(regions[0].start, 0);
        assert_eq!(regions.last().unwrap().end, line.len());
        for w in regions.windows(2) {
            assert_eq!(w[0].end, w[1].start);
        }
    }

    #[test]
    fn detects_string_region() {
        let line = r#"print("hi")"#;
        let regions = detect_regions(line, "python");
        assert!(regions.iter().any(|r| r.kind == RegionKind::String));
    }

    #[test]
    fn detects_line_comment() {
        let line = "x = 1 // set x";
        let regions = detect_regions(line, "rust");
        let comment = regions
            .iter()
            .find(|r| r.kind == RegionKind::LineComment)
            .unwrap();
        assert_eq!(&line[comment.start..comment.end], "// set x");
    }

    #[test]
    fn detects_block_comment() {
        let line = "a /* note */ b";
        let regions = detect_regions(line, "rust");
        assert!(regions.iter().any(|r| r.kind == RegionKind::BlockComment));
        assert_eq!(
            regions
                .iter()
                .filter(|r| r.kind == RegionKind::Code)
                .count(),
            2
        );
    }

    #[test]
    fn unterminated_string_falls_back_to_code() {
        let line = "x = \"unterminated";
        let regions = detect_regions(line, "python");
        assert!(regions.iter().all(|r| r.kind == RegionKind::Code));
    }

    #[test]
    fn mismatched_region_shapes_diff_whole_line_as_code() {
        let (_, chars, _) = nested_sub_diff(
            "x = 1",
            "x = \"1\"",
            "python",
            &DefaultPrimitives,
            false,
            true,
        );
        assert!(chars.iter().all(|s| s.region_kind == RegionKind::Code));
    }

    #[test]
    fn mode_toggles_suppress_levels() {
        let (words, chars, degraded) =
            nested_sub_diff("a = 1", "a = 2", "python", &DefaultPrimitives, false, false);
        assert!(words.is_empty());
        assert!(chars.is_empty());
        assert!(!degraded);
    }

    #[test]
    fn direct_sub_diff_skips_region_detection() {
        let (words, chars, degraded) = direct_sub_diff(
            r#"x = "old""#,
            r#"x = "new""#,
            &DefaultPrimitives,
            true,
            true,
        );
        assert!(!degraded);
        assert!(chars.iter().all(|s| s.region_kind == RegionKind::Code));
        assert!(words.iter().all(|s| s.region_kind == RegionKind::Code));
    }
}
