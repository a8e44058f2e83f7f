use std::collections::HashSet;

use crate::error::{CpdError, Result};

pub const DEFAULT_MIN_TILE_SIZE: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CpdOptions {
    /// Minimum duplicate length in tokens (`W`).
    pub min_tile_size: usize,
}

impl Default for CpdOptions {
    fn default() -> Self {
        Self {
            min_tile_size: DEFAULT_MIN_TILE_SIZE,
        }
    }
}

impl CpdOptions {
    pub fn with_min_tile_size(min_tile_size: usize) -> Self {
        Self { min_tile_size }
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_tile_size == 0 {
            return Err(CpdError::InvalidTileSize(self.min_tile_size));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenizerOptions {
    pub ignore_identifiers: bool,
    pub ignore_literals: bool,
}

#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub ignore_dirs: HashSet<String>,
    /// Lowercase extensions without the dot; empty accepts every file.
    pub extensions: HashSet<String>,
    pub max_file_size: Option<u64>,
    pub max_files: Option<usize>,
    pub max_total_bytes: Option<u64>,
    pub respect_gitignore: bool,
    pub follow_symlinks: bool,
}

pub const DEFAULT_MAX_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024;

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            ignore_dirs: default_ignore_dirs(),
            extensions: HashSet::new(),
            max_file_size: Some(DEFAULT_MAX_FILE_SIZE_BYTES),
            max_files: None,
            max_total_bytes: None,
            respect_gitignore: true,
            follow_symlinks: false,
        }
    }
}

pub fn default_ignore_dirs() -> HashSet<String> {
    [
        ".git",
        ".hg",
        ".svn",
        "node_modules",
        "target",
        "dist",
        "build",
        "out",
        ".next",
        ".turbo",
        ".cache",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScanStats {
    pub candidate_files: u64,
    pub scanned_files: u64,
    pub scanned_bytes: u64,
    pub skipped_not_found: u64,
    pub skipped_permission_denied: u64,
    pub skipped_too_large: u64,
    pub skipped_binary: u64,
    pub skipped_not_utf8: u64,
    pub skipped_outside_root: u64,
    pub skipped_walk_errors: u64,
    pub skipped_budget_max_files: u64,
    pub skipped_budget_max_total_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOutcome<T> {
    pub result: T,
    pub stats: ScanStats,
}

/// Pipeline phases reported to a [`crate::PhaseListener`], in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    TokenizingComplete,
    Hashing,
    Matching,
    Consolidating,
    Done,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EngineStats {
    pub units: u64,
    pub tokens: u64,
    pub candidate_groups: u64,
    pub candidate_pairs: u64,
    pub rejected_too_close: u64,
    pub rejected_previous_duplicate: u64,
    pub rejected_too_short: u64,
    pub rejected_overlap: u64,
    pub reconciler_dropped: u64,
    pub reconciler_evicted: u64,
    pub pairwise_matches: u64,
    pub merged_matches: u64,
    pub pruned_occurrences: u64,
    pub matches: u64,
    pub duplicated_lines: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    /// Sequence index of the first token of this instance.
    pub anchor: usize,
    pub unit_id: String,
    pub start_line: u32,
    pub end_line: u32,
    pub line_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    pub token_count: usize,
    /// FNV-1a over the duplicated text ids; equal for equal content within a run.
    pub content_hash: u64,
    /// Sorted by anchor.
    pub occurrences: Vec<Occurrence>,
    /// Source lines of the first occurrence.
    pub source_slice: String,
}

impl Match {
    pub fn anchors(&self) -> Vec<usize> {
        self.occurrences.iter().map(|o| o.anchor).collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DuplicationReport {
    pub matches: Vec<Match>,
    pub stats: EngineStats,
}
