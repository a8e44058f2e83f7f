mod corpus;
mod engine;
mod error;
mod scan;
mod tokenize;
mod types;
mod util;

use std::path::PathBuf;

use tracing::debug;

pub use corpus::{CorpusBuilder, SourceUnit, TextId, Token, TokenCorpus, UnitIndex};
pub use engine::{
    Engine, InMemorySources, NoProgress, PhaseListener, SourceSlices, find_duplicates,
};
pub use error::{CpdError, Result};
pub use scan::{LoadedSources, SourceFile, load_sources};
pub use tokenize::{SourceToken, tokenize_source};
pub use types::{
    CpdOptions, DEFAULT_MAX_FILE_SIZE_BYTES, DEFAULT_MIN_TILE_SIZE, DuplicationReport,
    EngineStats, Match, Occurrence, Phase, ScanOptions, ScanOutcome, ScanStats, TokenizerOptions,
    default_ignore_dirs,
};

/// Loads every eligible file under `roots`, tokenizes it and runs the engine.
pub fn find_duplicates_in_roots(
    roots: &[PathBuf],
    scan_options: &ScanOptions,
    tokenizer_options: &TokenizerOptions,
    options: &CpdOptions,
) -> Result<ScanOutcome<DuplicationReport>> {
    find_duplicates_in_roots_with_progress(
        roots,
        scan_options,
        tokenizer_options,
        &Engine::new(options.clone()),
        &mut NoProgress,
    )
}

/// Like [`find_duplicates_in_roots`], with a caller-configured [`Engine`]
/// (for cancellation) and a phase listener.
pub fn find_duplicates_in_roots_with_progress(
    roots: &[PathBuf],
    scan_options: &ScanOptions,
    tokenizer_options: &TokenizerOptions,
    engine: &Engine,
    listener: &mut dyn PhaseListener,
) -> Result<ScanOutcome<DuplicationReport>> {
    engine.options().validate()?;

    let loaded = load_sources(roots, scan_options)?;
    let corpus = loaded.result.to_corpus(tokenizer_options)?;
    debug!(
        units = corpus.units().len(),
        tokens = corpus.real_token_count(),
        "corpus built"
    );

    let report = engine.run(&corpus, &loaded.result, listener)?;
    Ok(ScanOutcome {
        result: report,
        stats: loaded.stats,
    })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn finds_duplicates_across_files_on_disk() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let root = dir.path().join("proj");
        fs::create_dir_all(&root)?;
        let body = "fn sum(xs: &[i32]) -> i32 {\n    let mut total = 0;\n    for x in xs {\n        total += x;\n    }\n    total\n}\n";
        fs::write(root.join("a.rs"), format!("// first\n{body}"))?;
        fs::write(root.join("b.rs"), body)?;
        fs::write(root.join("c.rs"), "fn other() {}\n")?;

        let outcome = find_duplicates_in_roots(
            &[root],
            &ScanOptions::default(),
            &TokenizerOptions::default(),
            &CpdOptions::with_min_tile_size(10),
        )?;
        assert_eq!(outcome.stats.scanned_files, 3);

        let report = outcome.result;
        assert_eq!(report.matches.len(), 1);
        let m = &report.matches[0];
        let spans: Vec<(&str, u32, u32)> = m
            .occurrences
            .iter()
            .map(|o| (o.unit_id.as_str(), o.start_line, o.end_line))
            .collect();
        assert_eq!(spans, vec![("proj/a.rs", 2, 8), ("proj/b.rs", 1, 7)]);
        assert!(m.source_slice.starts_with("fn sum"));
        assert_eq!(report.stats.units, 3);
        Ok(())
    }

    #[test]
    fn ignoring_identifiers_finds_renamed_copies() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let root = dir.path().join("proj");
        fs::create_dir_all(&root)?;
        fs::write(root.join("a.c"), "int area(int w, int h) { return w * h; }\n")?;
        fs::write(root.join("b.c"), "int size(int a, int b) { return a * b; }\n")?;

        let options = CpdOptions::with_min_tile_size(8);
        let plain = find_duplicates_in_roots(
            std::slice::from_ref(&root),
            &ScanOptions::default(),
            &TokenizerOptions::default(),
            &options,
        )?;
        assert!(plain.result.matches.is_empty());

        let renamed = find_duplicates_in_roots(
            &[root],
            &ScanOptions::default(),
            &TokenizerOptions {
                ignore_identifiers: true,
                ignore_literals: false,
            },
            &options,
        )?;
        assert_eq!(renamed.result.matches.len(), 1);
        assert_eq!(renamed.result.matches[0].token_count, 16);
        Ok(())
    }

    #[test]
    fn invalid_tile_size_fails_before_scanning() {
        let result = find_duplicates_in_roots(
            &[PathBuf::from("/definitely/not/here")],
            &ScanOptions::default(),
            &TokenizerOptions::default(),
            &CpdOptions::with_min_tile_size(0),
        );
        assert!(matches!(result, Err(CpdError::InvalidTileSize(0))));
    }
}
