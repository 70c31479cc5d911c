//! External collaborators (§6.1).
//!
//! The line/word/character edit-script producers and the file-type
//! detector are primitives the core *consumes*, not something it
//! implements. A complete, runnable crate still needs a working
//! implementation of each, so this module provides the default one (built
//! on `similar::TextDiff`, the same Myers engine used for the line diff
//! elsewhere in this crate) behind the `Primitives` trait, so a caller
//! embedding this engine can substitute their own.

use crate::error::DiffError;
use crate::types::{RawEntry, RawKind, SpanKind};
use similar::{Algorithm, ChangeTag, TextDiff};

/// One element of a word/char-level edit script (§6.1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditOp {
    pub text: String,
    pub kind: SpanKind,
}

/// The four external collaborators §6.1 assumes are available.
///
/// `line_diff`/`word_diff`/`char_diff` are fallible: a caller-supplied
/// implementation may wrap an external engine that can fail (OOM, a
/// subprocess crash, a malformed grammar). A failure here is not fatal
/// to the whole run — the orchestrator catches it and degrades per §7
/// (`LimitReason::PrimitiveFailure`) rather than propagating the error.
/// `detect_file_type` has no such failure mode (pure string matching),
/// so it stays infallible.
pub trait Primitives: Send + Sync {
    fn line_diff(&self, old_text: &str, new_text: &str) -> Result<Vec<RawEntry>, DiffError>;
    fn word_diff(&self, a: &str, b: &str) -> Result<Vec<EditOp>, DiffError>;
    fn char_diff(&self, a: &str, b: &str) -> Result<Vec<EditOp>, DiffError>;
    fn detect_file_type(&self, content: &str, filename: Option<&str>) -> &'static str;
}

/// Default `Primitives` implementation over `similar::TextDiff`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultPrimitives;

impl Primitives for DefaultPrimitives {
    fn line_diff(&self, old_text: &str, new_text: &str) -> Result<Vec<RawEntry>, DiffError> {
        let old_lines = split_keep_newline(old_text);
        let new_lines = split_keep_newline(new_text);
        let old_refs: Vec<&str> = old_lines.iter().map(String::as_str).collect();
        let new_refs: Vec<&str> = new_lines.iter().map(String::as_str).collect();
        let diff = TextDiff::configure()
            .algorithm(Algorithm::Myers)
            .diff_slices(&old_refs, &new_refs);

        let mut entries = Vec::new();
        for change in diff.iter_all_changes() {
            let kind = match change.tag() {
                ChangeTag::Equal => RawKind::Unchanged,
                ChangeTag::Delete => RawKind::Removed,
                ChangeTag::Insert => RawKind::Added,
            };
            // Merge consecutive entries of the same kind into one RawEntry,
            // matching the §6.1 contract that unchanged/added/removed runs
            // may carry more than one line.
            if let Some(last) = entries.last_mut() {
                let (last_kind, last_value, last_count): &mut (RawKind, String, usize) = last;
                if *last_kind == kind {
                    last_value.push_str(change.value());
                    *last_count += 1;
                    continue;
                }
            }
            entries.push((kind, change.value().to_string(), 1usize));
        }

        Ok(entries
            .into_iter()
            .map(|(kind, value, count)| RawEntry { kind, value, count })
            .collect())
    }

    fn word_diff(&self, a: &str, b: &str) -> Result<Vec<EditOp>, DiffError> {
        let wa: Vec<&str> = a.split_inclusive(' ').collect();
        let wb: Vec<&str> = b.split_inclusive(' ').collect();
        Ok(diff_tokens(&wa, &wb))
    }

    fn char_diff(&self, a: &str, b: &str) -> Result<Vec<EditOp>, DiffError> {
        let ca: Vec<&str> = a.graphemes_fallback();
        let cb: Vec<&str> = b.graphemes_fallback();
        Ok(diff_tokens(&ca, &cb))
    }

    fn detect_file_type(&self, content: &str, filename: Option<&str>) -> &'static str {
        detect_language(content, filename)
    }
}

fn diff_tokens(a: &[&str], b: &[&str]) -> Vec<EditOp> {
    let diff = TextDiff::configure()
        .algorithm(Algorithm::Myers)
        .diff_slices(a, b);
    diff.iter_all_changes()
        .map(|change| EditOp {
            text: change.value().to_string(),
            kind: match change.tag() {
                ChangeTag::Equal => SpanKind::Equal,
                ChangeTag::Delete => SpanKind::Removed,
                ChangeTag::Insert => SpanKind::Added,
            },
        })
        .collect()
}

/// Splits text into lines, keeping the trailing newline attached to each
/// line the way the §6.1 contract expects (so reassembly is exact).
fn split_keep_newline(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    let mut lines = Vec::new();
    let mut start = 0;
    let bytes = text.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        if b == b'\n' {
            lines.push(text[start..=i].to_string());
            start = i + 1;
        }
    }
    if start < text.len() {
        lines.push(text[start..].to_string());
    }
    lines
}

trait GraphemesFallback {
    fn graphemes_fallback(&self) -> Vec<&str>;
}

impl GraphemesFallback for str {
    /// Character-level split. True grapheme-cluster segmentation would
    /// need an extra dependency; `char` boundaries are sufficient here
    /// since code/string/comment regions are being diffed, not arbitrary
    /// prose.
    fn graphemes_fallback(&self) -> Vec<&str> {
        let mut out = Vec::with_capacity(self.len());
        let mut iter = self.char_indices().peekable();
        while let Some((i, c)) = iter.next() {
            let end = iter.peek().map(|&(j, _)| j).unwrap_or(self.len());
            out.push(&self[i..end]);
            let _ = c;
        }
        out
    }
}

/// Pure file-type detector (§6.1 contract).
///
/// Precedence for the Open Question in §9 ("Arista vs Cisco detection
/// precedence"): Cisco IOS is checked before Arista EOS. Arista's EOS
/// dialect is a near-superset of IOS syntax plus its own keywords
/// (`vlan internal order`, `management api http-commands`); checking IOS
/// first means a config that only uses the shared subset is tagged Cisco,
/// matching the precedence the original tool used. A config is only
/// tagged Arista when an EOS-only keyword is present. This is a
/// deliberate, documented choice (see DESIGN.md), not an oversight.
fn detect_language(content: &str, filename: Option<&str>) -> &'static str {
    if let Some(name) = filename {
        if let Some(ext) = name.rsplit('.').next() {
            if let Some(tag) = by_extension(ext) {
                return tag;
            }
        }
    }
    by_content(content)
}

fn by_extension(ext: &str) -> Option<&'static str> {
    Some(match ext.to_ascii_lowercase().as_str() {
        "py" => "python",
        "js" | "mjs" | "cjs" => "javascript",
        "ts" | "tsx" => "typescript",
        "json" => "json",
        "yaml" | "yml" => "yaml",
        "xml" => "xml",
        "html" | "htm" => "html",
        "css" => "css",
        "go" => "go",
        "rs" => "rust",
        "java" => "java",
        "c" | "h" => "c",
        "cpp" | "cc" | "cxx" | "hpp" => "cpp",
        "sh" | "bash" => "bash",
        "md" | "markdown" => "markdown",
        _ => return None,
    })
}

fn by_content(content: &str) -> &'static str {
    let trimmed = content.trim_start();
    if trimmed.starts_with("#!") {
        if trimmed.contains("python") {
            return "python";
        }
        if trimmed.contains("bash") || trimmed.contains("/sh") {
            return "bash";
        }
    }
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return "json";
    }
    if trimmed.starts_with("<?xml") || trimmed.starts_with("<html") {
        return if trimmed.starts_with("<?xml") {
            "xml"
        } else {
            "html"
        };
    }
    if content.contains("interface Vlan") || content.contains("ip route") {
        // Cisco IOS checked first (see doc comment on `detect_language`).
        if content.contains("vlan internal order")
            || content.contains("management api http-commands")
        {
            return "arista-eos";
        }
        return "cisco-ios";
    }
    if content.contains("set system") || content.contains("set interfaces") {
        return "juniper-junos";
    }
    if content.contains("def ") && content.contains(':') {
        return "python";
    }
    if content.contains("fn ") && content.contains("->") {
        return "rust";
    }
    "text"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_diff_reproduces_inputs() {
        let old = "a\nb\nc\n";
        let new = "a\nx\nc\n";
        let entries = DefaultPrimitives.line_diff(old, new).unwrap();
        let reconstructed_old: String = entries
            .iter()
            .filter(|e| e.kind != RawKind::Added)
            .map(|e| e.value.as_str())
            .collect();
        let reconstructed_new: String = entries
            .iter()
            .filter(|e| e.kind != RawKind::Removed)
            .map(|e| e.value.as_str())
            .collect();
        assert_eq!(reconstructed_old, old);
        assert_eq!(reconstructed_new, new);
    }

    #[test]
    fn detects_extension_first() {
        assert_eq!(
            DefaultPrimitives.detect_file_type("x = 1", Some("a.py")),
            "python"
        );
        assert_eq!(DefaultPrimitives.detect_file_type("", Some("a.rs")), "rust");
    }

    #[test]
    fn cisco_precedence_over_arista() {
        let cfg = "interface Vlan10\n ip address 10.0.0.1 255.255.255.0\nip route 0.0.0.0 0.0.0.0 10.0.0.1\n";
        assert_eq!(DefaultPrimitives.detect_file_type(cfg, None), "cisco-ios");
    }

    #[test]
    fn arista_only_keyword_overrides() {
        let cfg = "interface Vlan10\nip route 0.0.0.0 0.0.0.0 10.0.0.1\nmanagement api http-commands\n   no shutdown\n";
        assert_eq!(DefaultPrimitives.detect_file_type(cfg, None), "arista-eos");
    }

    #[test]
    fn word_diff_basic() {
        let ops = DefaultPrimitives
            .word_diff("the cat sat", "the dog sat")
            .unwrap();
        let added: Vec<_> = ops.iter().filter(|o| o.kind == SpanKind::Added).collect();
        let removed: Vec<_> = ops.iter().filter(|o| o.kind == SpanKind::Removed).collect();
        assert_eq!(added.len(), 1);
        assert_eq!(removed.len(), 1);
    }
}
