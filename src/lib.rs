//! DiffWeave - semantic line-diff enrichment engine
//!
//! Takes the raw line-level edit script between two documents and
//! recovers the structure a human would actually describe: which
//! removed/added pairs are really one edited line, which runs of lines
//! moved wholesale, and where the diff boundary should really sit around
//! ambiguous indentation/brace context. Nested word/char sub-diffs are
//! computed region-aware, so edits inside strings or comments are never
//! conflated with surrounding code.

pub mod blocks;
pub mod config;
pub mod error;
pub mod hash;
pub mod moves;
pub mod pairing;
pub mod pipeline;
pub mod primitives;
pub mod regions;
pub mod similarity;
pub mod slider;
pub mod types;

pub use config::Config;
pub use error::DiffError;
pub use pipeline::{DiffPipeline, RunOptions};
pub use primitives::{DefaultPrimitives, Primitives};
pub use types::DiffResult;

/// Convenience entry point: run the full pipeline with default
/// primitives and language auto-detection (§6.2).
pub fn run_diff_pipeline(
    config: &Config,
    old_text: &str,
    new_text: &str,
) -> Result<DiffResult, DiffError> {
    let pipeline = DiffPipeline::new(config);
    pipeline.run(
        old_text,
        new_text,
        &DefaultPrimitives,
        &RunOptions::default(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_point_runs_with_defaults() {
        let config = Config::default();
        let result =
            run_diff_pipeline(&config, "x\nhello world foo\n", "x\nhello world bar\n").unwrap();
        assert_eq!(result.stats.modified, 1);
    }
}
