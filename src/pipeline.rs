//! Orchestrator (§4.9).
//!
//! Drives the full enrichment pipeline end to end: line diff, block
//! identification, pairing, region-aware nested sub-diff, move
//! detection, slider correction, and fast-mode degradation, assembling
//! the final `DiffResult` and its `Stats`/`LimitInfo`. The state machine
//! (`init -> line_diff -> classify -> move_detect -> slider_correct ->
//! finalize`) mirrors `ComparisonEngine::run`'s staged pipeline shape.

use crate::blocks::{identify_blocks, Segment};
use crate::config::{Config, ModeToggles};
use crate::error::DiffError;
use crate::hash::HashCache;
use crate::moves::{detect_moves, PoolLine};
use crate::pairing::{build_matrix, resolve_pairings};
use crate::primitives::Primitives;
use crate::regions::{direct_sub_diff, nested_sub_diff};
use crate::similarity::SimilarityParams;
use crate::slider::{correct_slider, ShiftDirection};
use crate::types::{
    ChangeBlock, ClassifiedEntry, DiffResult, IndexedLine, LimitInfo, LimitReason, ModifiedDetail,
    PairingType, Stats,
};
use log::{debug, info, warn};

/// Options narrowing a single pipeline invocation beyond `Config`
/// defaults (language detection result, cooperative cancellation,
/// per-call sub-diff level toggles per §6.2).
pub struct RunOptions<'a> {
    pub language: &'a str,
    pub filename_old: Option<&'a str>,
    pub filename_new: Option<&'a str>,
    pub cancel: Option<&'a dyn Fn() -> bool>,
    pub mode_toggles: ModeToggles,
}

impl<'a> Default for RunOptions<'a> {
    fn default() -> Self {
        Self {
            language: "text",
            filename_old: None,
            filename_new: None,
            cancel: None,
            mode_toggles: ModeToggles::default(),
        }
    }
}

pub struct DiffPipeline<'a> {
    config: &'a Config,
}

impl<'a> DiffPipeline<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Run the full pipeline over two whole-file texts (§4.9, §6.2).
    pub fn run(
        &self,
        old_text: &str,
        new_text: &str,
        primitives: &dyn Primitives,
        options: &RunOptions,
    ) -> Result<DiffResult, DiffError> {
        if old_text.is_empty() && new_text.is_empty() {
            return Ok(DiffResult {
                results: Vec::new(),
                stats: Stats::default(),
                limit_info: LimitInfo::default(),
                cancelled: false,
            });
        }

        // -- init --
        let mut cache = HashCache::new();
        let language = if options.language == "text" {
            primitives.detect_file_type(old_text, options.filename_old.or(options.filename_new))
        } else {
            options.language
        };
        let weights = self.config.weights_for(language);
        let sim_params = SimilarityParams {
            fast_threshold: self.config.fast_threshold,
            enable_ast: self.config.enable_ast,
            tier3_weight: 1.0,
        };

        let total_lines = old_text
            .matches('\n')
            .count()
            .max(new_text.matches('\n').count());
        let fast_mode_by_lines =
            self.config.enable_fast_mode && total_lines > self.config.max_lines;

        // -- line_diff --
        let script = match primitives.line_diff(old_text, new_text) {
            Ok(script) => script,
            Err(e) => {
                // §7 propagation policy: a primitive failure degrades the
                // run rather than aborting it. With no edit script to pair
                // against, the only available fallback is to treat every
                // old line as removed and every new line as added.
                warn!("line_diff primitive failed, degrading to raw add/remove: {e}");
                let removed_lines: Vec<String> = old_text.lines().map(str::to_string).collect();
                let added_lines: Vec<String> = new_text.lines().map(str::to_string).collect();
                let stats = Stats {
                    removed: removed_lines.len(),
                    added: added_lines.len(),
                    ..Stats::default()
                };
                let mut results = Vec::new();
                for line in removed_lines {
                    results.push(ClassifiedEntry::removed(line));
                }
                for line in added_lines {
                    results.push(ClassifiedEntry::added(line));
                }
                return Ok(DiffResult {
                    results,
                    stats,
                    limit_info: LimitInfo {
                        exceeded: true,
                        fast_mode: true,
                        reason: Some(LimitReason::PrimitiveFailure),
                    },
                    cancelled: false,
                });
            }
        };
        let segments = identify_blocks(&script);

        let fast_mode_by_graph = self.config.enable_fast_mode
            && segments.iter().any(|s| match s {
                Segment::Block(b) => {
                    b.removed.len() * b.added.len() > self.config.max_graph_vertices
                }
                Segment::Unchanged(_) => false,
            });

        let fast_mode = fast_mode_by_lines || fast_mode_by_graph;
        let limit_reason = if fast_mode_by_lines {
            Some(LimitReason::LineCount)
        } else if fast_mode_by_graph {
            Some(LimitReason::GraphSize)
        } else {
            None
        };

        if fast_mode {
            info!(
                "fast mode engaged ({:?}): skipping pairing, moves, and slider correction",
                limit_reason
            );
        }

        // -- classify --
        let mut results = Vec::new();
        let mut stats = Stats::default();
        // Pool of still-isolated removed/added lines, collected across all
        // blocks, available to the move detector (§4.6 operates across
        // block boundaries, not within a single block).
        let mut removed_pool: Vec<(usize, IndexedLine)> = Vec::new(); // (result index, line)
        let mut added_pool: Vec<(usize, IndexedLine)> = Vec::new();
        let mut primitive_degraded = false;

        for segment in segments {
            if let Some(cancel) = options.cancel {
                if cancel() {
                    return Ok(DiffResult {
                        results,
                        stats,
                        limit_info: LimitInfo {
                            exceeded: fast_mode,
                            fast_mode,
                            reason: limit_reason,
                        },
                        cancelled: true,
                    });
                }
            }

            match segment {
                Segment::Unchanged(lines) => {
                    for line in lines {
                        results.push(ClassifiedEntry::unchanged(line));
                    }
                }
                Segment::Block(block) => {
                    self.classify_block(
                        block,
                        fast_mode,
                        language,
                        primitives,
                        &sim_params,
                        &mut cache,
                        &mut results,
                        &mut stats,
                        &mut removed_pool,
                        &mut added_pool,
                        &options.mode_toggles,
                        &mut primitive_degraded,
                    );
                }
            }
        }

        // -- move_detect --
        if !fast_mode
            && total_lines >= self.config.min_lines_for_move_detection
            && total_lines <= self.config.max_lines_for_move_detection
            && !removed_pool.is_empty()
            && !added_pool.is_empty()
        {
            self.run_move_detection(
                &removed_pool,
                &added_pool,
                &sim_params,
                &mut results,
                &mut stats,
            );
        }

        // -- slider_correct --
        if !fast_mode && self.config.correct_sliders {
            self.run_slider_correction(&mut results, &weights, &sim_params, &mut stats);
        }

        debug!("pipeline finished: {} entries, {:?}", results.len(), stats);

        // -- finalize --
        cache.clear();

        Ok(DiffResult {
            results,
            stats,
            limit_info: LimitInfo {
                exceeded: fast_mode || primitive_degraded,
                fast_mode,
                reason: limit_reason.or(if primitive_degraded {
                    Some(LimitReason::PrimitiveFailure)
                } else {
                    None
                }),
            },
            cancelled: false,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn classify_block(
        &self,
        block: ChangeBlock,
        fast_mode: bool,
        language: &str,
        primitives: &dyn Primitives,
        sim_params: &SimilarityParams,
        cache: &mut HashCache,
        results: &mut Vec<ClassifiedEntry>,
        stats: &mut Stats,
        removed_pool: &mut Vec<(usize, IndexedLine)>,
        added_pool: &mut Vec<(usize, IndexedLine)>,
        mode_toggles: &ModeToggles,
        primitive_degraded: &mut bool,
    ) {
        if !mode_toggles.lines {
            // Lines toggle off: report every line in the block as a raw
            // add/remove, bypassing pairing entirely (§6.2 `modeToggles`).
            for r in &block.removed {
                removed_pool.push((results.len(), r.clone()));
                results.push(ClassifiedEntry::removed(r.line.clone()));
                stats.removed += 1;
            }
            for a in &block.added {
                added_pool.push((results.len(), a.clone()));
                results.push(ClassifiedEntry::added(a.line.clone()));
                stats.added += 1;
            }
            return;
        }

        if fast_mode {
            // Equal block-offset pairing only: zip removed/added positionally,
            // leftovers fall back to isolated removed/added (§4.8). Sub-diffs
            // still run via a single direct edit-script call per level, with
            // no region detection or AST signatures.
            let n = block.removed.len().min(block.added.len());
            for i in 0..n {
                let r = &block.removed[i];
                let a = &block.added[i];
                let _ = cache.hash(&r.line);
                let (word_spans, char_spans, degraded) = direct_sub_diff(
                    &r.line,
                    &a.line,
                    primitives,
                    mode_toggles.words,
                    mode_toggles.chars,
                );
                *primitive_degraded = *primitive_degraded || degraded;
                let entry = ClassifiedEntry {
                    classification: crate::types::Classification::Modified,
                    value: None,
                    modified: Some(ModifiedDetail {
                        removed_line: r.line.clone(),
                        added_line: a.line.clone(),
                        similarity: 0.0,
                        word_diff: Some(word_spans),
                        char_diff: Some(char_spans),
                    }),
                    move_id: None,
                    slider_corrected: false,
                };
                results.push(entry);
                stats.modified += 1;
            }
            for r in &block.removed[n..] {
                results.push(ClassifiedEntry::removed(r.line.clone()));
                stats.removed += 1;
            }
            for a in &block.added[n..] {
                results.push(ClassifiedEntry::added(a.line.clone()));
                stats.added += 1;
            }
            return;
        }

        let matrix = build_matrix(&block, sim_params);
        let (pairings, unpaired_removed, unpaired_added) =
            resolve_pairings(&matrix, self.config.modified_threshold);

        let want_words = mode_toggles.words;
        let want_chars = mode_toggles.chars;

        for pairing in &pairings {
            let r = &block.removed[pairing.removed_idx];
            let a = &block.added[pairing.added_idx];
            let (word_spans, char_spans, degraded) = nested_sub_diff(
                &r.line, &a.line, language, primitives, want_words, want_chars,
            );
            *primitive_degraded = *primitive_degraded || degraded;
            let entry = ClassifiedEntry {
                classification: crate::types::Classification::Modified,
                value: None,
                modified: Some(ModifiedDetail {
                    removed_line: r.line.clone(),
                    added_line: a.line.clone(),
                    similarity: pairing.similarity,
                    word_diff: Some(word_spans),
                    char_diff: Some(char_spans),
                }),
                move_id: None,
                slider_corrected: false,
            };
            // A pre-paired Modified entry's lines are pooled on both sides
            // too, at the same result index: the move detector (§4.6 step
            // 5) may still reclassify this line as moved/moved-modified if
            // it turns out to better match a line elsewhere in the diff. If
            // its removed-side and added-side lines end up claimed by two
            // *different* move groups rather than the same one, both
            // target this same slot and the later-processed group's
            // overwrite wins — an accepted limitation, not a crash.
            let slot = results.len();
            removed_pool.push((slot, r.clone()));
            added_pool.push((slot, a.clone()));
            results.push(entry);
            stats.modified += 1;
            debug_assert!(matches!(pairing.pairing_type, PairingType::Modified));
        }

        for &idx in &unpaired_removed {
            let line = &block.removed[idx];
            removed_pool.push((results.len(), line.clone()));
            results.push(ClassifiedEntry::removed(line.line.clone()));
            stats.removed += 1;
        }
        for a in unpaired_added.iter().map(|&i| &block.added[i]) {
            added_pool.push((results.len(), a.clone()));
            results.push(ClassifiedEntry::added(a.line.clone()));
            stats.added += 1;
        }
    }

    fn run_move_detection(
        &self,
        removed_pool: &[(usize, IndexedLine)],
        added_pool: &[(usize, IndexedLine)],
        sim_params: &SimilarityParams,
        results: &mut [ClassifiedEntry],
        stats: &mut Stats,
    ) {
        let removed_lines: Vec<PoolLine> = removed_pool
            .iter()
            .map(|(_, l)| PoolLine {
                text: l.line.as_str(),
            })
            .collect();
        let added_lines: Vec<PoolLine> = added_pool
            .iter()
            .map(|(_, l)| PoolLine {
                text: l.line.as_str(),
            })
            .collect();

        let groups = detect_moves(
            &removed_lines,
            &added_lines,
            self.config.lsh_bands,
            self.config.move_threshold,
            sim_params,
        );

        for group in groups {
            let (rs, re) = group.removed_range;
            let (asr, aer) = group.added_range;
            for (offset, pool_pos) in (rs..=re).enumerate() {
                let result_idx = removed_pool[pool_pos].0;
                let added_pos = asr + offset;
                if added_pos > aer {
                    break;
                }
                let added_result_idx = added_pool[added_pos].0;
                let removed_line = removed_pool[pool_pos].1.line.clone();
                let added_line = added_pool[added_pos].1.line.clone();
                // A pre-paired Modified entry pools its removed and added
                // lines at the same result index (see `classify_block`); a
                // move group claiming both halves of that one entry must
                // overwrite a single slot, not two.
                let same_slot = result_idx == added_result_idx;

                if removed_line == added_line {
                    results[result_idx] = ClassifiedEntry {
                        classification: crate::types::Classification::Moved,
                        value: Some(removed_line),
                        modified: None,
                        move_id: Some(group.move_id),
                        slider_corrected: false,
                    };
                } else {
                    results[result_idx] = ClassifiedEntry {
                        classification: crate::types::Classification::MovedModified,
                        value: None,
                        modified: Some(ModifiedDetail {
                            removed_line,
                            added_line,
                            similarity: group.avg_similarity,
                            word_diff: None,
                            char_diff: None,
                        }),
                        move_id: Some(group.move_id),
                        slider_corrected: false,
                    };
                }
                stats.moved += 1;
                if same_slot {
                    stats.modified = stats.modified.saturating_sub(1);
                } else {
                    // Suppress the duplicate added-side entry: a move
                    // reports once, on the removed side, per §3.
                    results[added_result_idx].classification =
                        crate::types::Classification::Unchanged;
                    results[added_result_idx].value = Some(String::new());
                    stats.added = stats.added.saturating_sub(1);
                    stats.removed = stats.removed.saturating_sub(1);
                }
            }
        }
    }

    fn run_slider_correction(
        &self,
        results: &mut [ClassifiedEntry],
        weights: &crate::config::LanguageWeights,
        sim_params: &SimilarityParams,
        stats: &mut Stats,
    ) {
        // Slider correction operates on modified-entry boundaries against
        // their unchanged neighbors (§4.7 step 4: "swap the modified pair
        // with its neighbor"). The swap only commits when it is provably
        // content-preserving (see `swap_if_content_safe`); otherwise the
        // entry is flagged without reordering, a documented degradation
        // rather than a violation of §8 content preservation.
        for i in 0..results.len() {
            if results[i].classification != crate::types::Classification::Modified {
                continue;
            }
            let before = if i > 0 {
                results[i - 1].old_line()
            } else {
                None
            };
            let after = if i + 1 < results.len() {
                results[i + 1].old_line()
            } else {
                None
            };
            let Some(modified) = &results[i].modified else {
                continue;
            };
            let current_similarity = modified.similarity;
            let probe_block = ChangeBlock {
                removed: vec![IndexedLine {
                    line: modified.removed_line.clone(),
                    index: 0,
                }],
                added: vec![IndexedLine {
                    line: modified.added_line.clone(),
                    index: 0,
                }],
                start_offset: 0,
            };
            let direction = correct_slider(
                &probe_block,
                before,
                after,
                weights,
                self.config.correction_threshold,
                self.config.ambiguity_threshold,
                self.config.modified_threshold,
                current_similarity,
                sim_params,
            );
            match direction {
                ShiftDirection::None => {}
                ShiftDirection::Left if i > 0 => {
                    let swapped = swap_if_content_safe(results, i, i - 1);
                    let flagged = if swapped { i - 1 } else { i };
                    results[flagged].slider_corrected = true;
                    stats.slider_corrections += 1;
                }
                ShiftDirection::Right if i + 1 < results.len() => {
                    let swapped = swap_if_content_safe(results, i, i + 1);
                    let flagged = if swapped { i + 1 } else { i };
                    results[flagged].slider_corrected = true;
                    stats.slider_corrections += 1;
                }
                ShiftDirection::Left | ShiftDirection::Right => {
                    // Shift direction points past the boundary of the
                    // result vector (shouldn't happen given `correct_slider`
                    // only shifts into context that was proven to exist,
                    // but guarded rather than indexed unchecked).
                    results[i].slider_corrected = true;
                    stats.slider_corrections += 1;
                }
            }
        }
    }
}

/// Swap `results[i]` and `results[j]` only if doing so preserves both the
/// old-side and new-side reconstructions (§8 "Content preservation").
///
/// A plain position swap changes the order in which each entry's
/// `old_line()`/`new_line()` contribute to the reconstructed text. That is
/// safe only when both entries contribute the same old line and the same
/// new line at each other's position — in practice, an `Unchanged` entry
/// paired with a `Modified` entry whose own removed/added text differs
/// does *not* satisfy this, because swapping would reorder the new-side
/// contribution relative to the true file order. Returns whether the swap
/// was performed.
fn swap_if_content_safe(results: &mut [ClassifiedEntry], i: usize, j: usize) -> bool {
    let old_i = results[i].old_line();
    let old_j = results[j].old_line();
    let new_i = results[i].new_line();
    let new_j = results[j].new_line();
    if old_i == old_j && new_i == new_j {
        results.swap(i, j);
        true
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::DefaultPrimitives;

    fn run(old: &str, new: &str) -> DiffResult {
        let config = Config::default();
        let pipeline = DiffPipeline::new(&config);
        pipeline
            .run(old, new, &DefaultPrimitives, &RunOptions::default())
            .unwrap()
    }

    #[test]
    fn identical_inputs_produce_only_unchanged_entries() {
        let text = "a\nb\nc\n";
        let result = run(text, text);
        assert!(result
            .results
            .iter()
            .all(|e| e.classification == crate::types::Classification::Unchanged));
        assert_eq!(result.stats.modified, 0);
    }

    #[test]
    fn single_modification_is_classified_modified() {
        let old = "a\nhello world foo\nc\n";
        let new = "a\nhello world bar\nc\n";
        let result = run(old, new);
        assert_eq!(result.stats.modified, 1);
        assert_eq!(result.stats.added, 0);
        assert_eq!(result.stats.removed, 0);
    }

    #[test]
    fn function_signature_change_is_modified_not_remove_add() {
        let old = "def process_data(data):\n    pass\n";
        let new = "def process_data(input_data):\n    pass\n";
        let result = run(old, new);
        assert_eq!(result.stats.modified, 1);
    }

    #[test]
    fn content_preservation_holds() {
        let old = "a\nb\nc\nd\n";
        let new = "a\nx\nc\ny\n";
        let result = run(old, new);
        let reconstructed_old: String = result
            .results
            .iter()
            .filter_map(|e| e.old_line())
            .map(|l| format!("{l}\n"))
            .collect();
        let reconstructed_new: String = result
            .results
            .iter()
            .filter_map(|e| e.new_line())
            .map(|l| format!("{l}\n"))
            .collect();
        assert_eq!(reconstructed_old, old);
        assert_eq!(reconstructed_new, new);
    }

    #[test]
    fn fast_mode_triggers_on_line_count() {
        let config = Config {
            max_lines: 2,
            ..Config::default()
        };
        let pipeline = DiffPipeline::new(&config);
        let old = "a\nb\nc\nd\ne\n";
        let new = "a\nB\nC\nD\ne\n";
        let result = pipeline
            .run(old, new, &DefaultPrimitives, &RunOptions::default())
            .unwrap();
        assert!(result.limit_info.fast_mode);
        assert_eq!(result.limit_info.reason, Some(LimitReason::LineCount));
    }

    #[test]
    fn empty_inputs_are_identical() {
        let result = run("", "");
        assert!(result.results.is_empty());
        assert!(!result.cancelled);
    }

    #[test]
    fn cancellation_flag_stops_early() {
        let config = Config::default();
        let pipeline = DiffPipeline::new(&config);
        let always_cancel = || true;
        let options = RunOptions {
            cancel: Some(&always_cancel),
            ..RunOptions::default()
        };
        let result = pipeline
            .run("a\nb\n", "a\nB\n", &DefaultPrimitives, &options)
            .unwrap();
        assert!(result.cancelled);
    }

    #[test]
    fn pure_block_move_is_classified_moved() {
        // The "b1/b2/b3" run and the "a1/a2/a3" run swap places; each
        // individually reappears verbatim, so the swap should surface
        // as block moves rather than six independent add/remove lines.
        let old = "p1\np2\np3\np4\na1\na2\na3\nb1\nb2\nb3\n";
        let new = "p1\np2\np3\np4\nb1\nb2\nb3\na1\na2\na3\n";
        let result = run(old, new);
        assert!(result.stats.moved >= 3);
        assert!(result
            .results
            .iter()
            .any(|e| e.classification == crate::types::Classification::Moved));
    }

    #[test]
    fn slider_correction_shifts_ambiguous_boundary() {
        // The modified line's removed-side text duplicates the unchanged
        // line immediately after it, making the boundary ambiguous; a low
        // correction threshold lets the pipeline commit the shift.
        let old = "a\ndef handler(x):\ndef handler(x):\nc\n";
        let new = "a\ndef handler(y):\ndef handler(x):\nc\n";
        let config = Config {
            correction_threshold: 0.1,
            // The alternative pairing here is an exact duplicate match
            // (similarity 1.0) against a modified-pair similarity of
            // roughly 0.85 — a difference of ~0.15 that the default
            // ambiguity_threshold (0.05) would reject as "too clearly
            // better" rather than "ambiguous". Widened here so this test
            // can isolate correction_threshold/swap mechanics; the
            // ambiguity gate itself is covered in `slider.rs`.
            ambiguity_threshold: 1.0,
            ..Config::default()
        };
        let pipeline = DiffPipeline::new(&config);
        let options = RunOptions {
            language: "plaintext",
            ..RunOptions::default()
        };
        let result = pipeline
            .run(old, new, &DefaultPrimitives, &options)
            .unwrap();
        assert_eq!(result.stats.modified, 1);
        assert_eq!(result.stats.slider_corrections, 1);
        assert!(result.results.iter().any(|e| e.slider_corrected));
    }

    #[test]
    fn swap_if_content_safe_reorders_matching_pair() {
        let mut results = vec![
            ClassifiedEntry::unchanged("shared"),
            ClassifiedEntry::added("shared"),
        ];
        // Contrived: an Added entry whose value happens to equal the
        // Unchanged neighbor's old/new contribution on one side only would
        // normally fail the safety check; construct a pair that genuinely
        // satisfies it (equal old_line and equal new_line) by using two
        // Unchanged entries with the same text.
        results[1] = ClassifiedEntry::unchanged("shared");
        assert!(swap_if_content_safe(&mut results, 0, 1));
    }

    #[test]
    fn swap_if_content_safe_declines_unsafe_pair() {
        let mut results = vec![
            ClassifiedEntry::unchanged("before"),
            ClassifiedEntry::modified("removed_text".into(), "added_text".into(), 0.8),
        ];
        assert!(!swap_if_content_safe(&mut results, 0, 1));
        // Declining must leave both entries untouched.
        assert_eq!(results[0].old_line(), Some("before"));
        assert_eq!(results[1].old_line(), Some("removed_text"));
    }

    struct ErroringPrimitives;

    impl Primitives for ErroringPrimitives {
        fn line_diff(
            &self,
            _old_text: &str,
            _new_text: &str,
        ) -> Result<Vec<crate::types::RawEntry>, DiffError> {
            Err(DiffError::PrimitiveFailure("line_diff unavailable".into()))
        }
        fn word_diff(
            &self,
            _a: &str,
            _b: &str,
        ) -> Result<Vec<crate::primitives::EditOp>, DiffError> {
            Err(DiffError::PrimitiveFailure("word_diff unavailable".into()))
        }
        fn char_diff(
            &self,
            _a: &str,
            _b: &str,
        ) -> Result<Vec<crate::primitives::EditOp>, DiffError> {
            Err(DiffError::PrimitiveFailure("char_diff unavailable".into()))
        }
        fn detect_file_type(&self, _content: &str, _filename: Option<&str>) -> &'static str {
            "text"
        }
    }

    #[test]
    fn line_diff_failure_degrades_to_raw_add_remove() {
        let config = Config::default();
        let pipeline = DiffPipeline::new(&config);
        let old = "a\nb\nc\n";
        let new = "a\nx\nc\n";
        let result = pipeline
            .run(old, new, &ErroringPrimitives, &RunOptions::default())
            .unwrap();
        assert_eq!(result.stats.removed, 3);
        assert_eq!(result.stats.added, 3);
        assert!(result.results.iter().all(|e| e.classification
            == crate::types::Classification::Removed
            || e.classification == crate::types::Classification::Added));
        assert!(result.limit_info.exceeded);
        assert_eq!(
            result.limit_info.reason,
            Some(LimitReason::PrimitiveFailure)
        );
        let reconstructed_old: String = result
            .results
            .iter()
            .filter_map(|e| e.old_line())
            .map(|l| format!("{l}\n"))
            .collect();
        let reconstructed_new: String = result
            .results
            .iter()
            .filter_map(|e| e.new_line())
            .map(|l| format!("{l}\n"))
            .collect();
        assert_eq!(reconstructed_old, old);
        assert_eq!(reconstructed_new, new);
    }

    #[test]
    fn separate_runs_do_not_share_cache_state() {
        let config = Config::default();
        let pipeline = DiffPipeline::new(&config);
        let first = pipeline
            .run(
                "a\nhello world foo\n",
                "a\nhello world bar\n",
                &DefaultPrimitives,
                &RunOptions::default(),
            )
            .unwrap();
        let second = pipeline
            .run(
                "x\ny\nz\n",
                "x\ny\nz\n",
                &DefaultPrimitives,
                &RunOptions::default(),
            )
            .unwrap();
        assert_eq!(first.stats.modified, 1);
        assert_eq!(second.stats.modified, 0);
        assert!(second
            .results
            .iter()
            .all(|e| e.classification == crate::types::Classification::Unchanged));
    }
}
