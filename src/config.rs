//! Pipeline configuration (§3, §6.3).
//!
//! `Config` mirrors the shape of `CompareConfig`: a plain `serde`-derived
//! struct with a `Default` impl encoding the documented defaults,
//! overlaid by CLI flags at the binary boundary.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use sysinfo::{RefreshKind, System};

/// Per-language weighting for the Slider Corrector (§4.7 step 2).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LanguageWeights {
    pub indent_weight: f64,
    pub brace_weight: f64,
    pub delimiter_weight: f64,
}

impl LanguageWeights {
    pub const fn new(indent_weight: f64, brace_weight: f64, delimiter_weight: f64) -> Self {
        Self {
            indent_weight,
            brace_weight,
            delimiter_weight,
        }
    }
}

impl Default for LanguageWeights {
    fn default() -> Self {
        // Balanced default for languages without a specific preference.
        Self::new(0.34, 0.33, 0.33)
    }
}

/// Which sub-diff levels to compute (§4.5 step 4, §6.2 `modeToggles`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ModeToggles {
    pub lines: bool,
    pub words: bool,
    pub chars: bool,
}

impl Default for ModeToggles {
    fn default() -> Self {
        Self {
            lines: true,
            words: true,
            chars: true,
        }
    }
}

/// Pipeline configuration (§3 `Config`, §6.3 defaults table).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub max_lines: usize,
    pub max_graph_vertices: usize,
    pub enable_fast_mode: bool,
    pub modified_threshold: f64,
    pub fast_threshold: f64,
    pub normalize_delimiters: bool,
    pub correct_sliders: bool,
    pub enable_ast: bool,
    pub lsh_bands: usize,
    pub move_threshold: f64,
    pub min_lines_for_move_detection: usize,
    pub max_lines_for_move_detection: usize,
    pub ambiguity_threshold: f64,
    pub correction_threshold: f64,
    pub language_preferences: HashMap<String, LanguageWeights>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_lines: 50_000,
            max_graph_vertices: default_max_graph_vertices(),
            enable_fast_mode: true,
            modified_threshold: 0.60,
            fast_threshold: 0.30,
            normalize_delimiters: false,
            correct_sliders: true,
            enable_ast: true,
            lsh_bands: 4,
            move_threshold: 0.70,
            min_lines_for_move_detection: 10,
            max_lines_for_move_detection: 50_000,
            ambiguity_threshold: 0.05,
            correction_threshold: 0.80,
            language_preferences: default_language_preferences(),
        }
    }
}

impl Config {
    pub fn weights_for(&self, language_tag: &str) -> LanguageWeights {
        self.language_preferences
            .get(language_tag)
            .copied()
            .unwrap_or_default()
    }
}

/// Size `maxGraphVertices` off total system memory the same way
/// fingerprinting cutoffs elsewhere size off a fraction of RAM, capped to
/// keep a single block's dense similarity matrix bounded on small
/// machines.
fn default_max_graph_vertices() -> usize {
    let sys = System::new_with_specifics(RefreshKind::new().with_memory(Default::default()));
    let total_mem_bytes = sys.total_memory();
    // Budget roughly 64 bytes of transient scoring overhead per matrix cell.
    let budget_cells = (total_mem_bytes / 20) / 64;
    (budget_cells as usize).clamp(10_000, 500_000)
}

fn default_language_preferences() -> HashMap<String, LanguageWeights> {
    let mut m = HashMap::new();
    m.insert("python".to_string(), LanguageWeights::new(0.5, 0.0, 0.5));
    m.insert(
        "javascript".to_string(),
        LanguageWeights::new(0.4, 0.3, 0.3),
    );
    m.insert(
        "typescript".to_string(),
        LanguageWeights::new(0.4, 0.3, 0.3),
    );
    m.insert("yaml".to_string(), LanguageWeights::new(0.6, 0.0, 0.4));
    m.insert("rust".to_string(), LanguageWeights::new(0.2, 0.5, 0.3));
    m.insert("go".to_string(), LanguageWeights::new(0.2, 0.5, 0.3));
    m
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_table_6_3() {
        let c = Config::default();
        assert_eq!(c.max_lines, 50_000);
        assert!(c.enable_fast_mode);
        assert_eq!(c.modified_threshold, 0.60);
        assert_eq!(c.fast_threshold, 0.30);
        assert!(c.enable_ast);
        assert!(!c.normalize_delimiters);
        assert!(c.correct_sliders);
        assert_eq!(c.lsh_bands, 4);
        assert_eq!(c.move_threshold, 0.70);
        assert_eq!(c.min_lines_for_move_detection, 10);
        assert_eq!(c.max_lines_for_move_detection, 50_000);
        assert_eq!(c.ambiguity_threshold, 0.05);
        assert_eq!(c.correction_threshold, 0.80);
    }

    #[test]
    fn unknown_language_falls_back_to_balanced_weights() {
        let c = Config::default();
        let w = c.weights_for("cobol");
        assert!((w.indent_weight - 0.34).abs() < 1e-9);
    }

    #[test]
    fn python_weights_have_no_brace_term() {
        let c = Config::default();
        let w = c.weights_for("python");
        assert_eq!(w.brace_weight, 0.0);
    }
}
