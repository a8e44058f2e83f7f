use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::corpus::{CorpusBuilder, TokenCorpus};
use crate::engine::SourceSlices;
use crate::error::{CpdError, Result};
use crate::tokenize::tokenize_source;
use crate::types::{ScanOptions, ScanOutcome, ScanStats, TokenizerOptions};
use crate::util::slice_lines;

mod read;
mod walker;


use read::{make_rel_path, read_source_text};
use walker::root_files;

fn should_stop_due_to_max_files(options: &ScanOptions, stats: &mut ScanStats) -> bool {
    let Some(max_files) = options.max_files else {
        return false;
    };
    if stats.scanned_files < max_files as u64 {
        return false;
    }
    stats.skipped_budget_max_files = stats.skipped_budget_max_files.saturating_add(1);
    true
}

pub(crate) fn validate_roots(roots: &[PathBuf]) -> io::Result<()> {
    for root in roots {
        let meta = fs::metadata(root)
            .map_err(|err| io::Error::new(err.kind(), format!("root {}: {err}", root.display())))?;
        if !meta.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("root {} is not a directory", root.display()),
            ));
        }
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub(crate) struct Repo {
    pub(crate) root: PathBuf,
    pub(crate) label: String,
}

fn repo_label(root: &Path, id: usize) -> String {
    root.file_name()
        .and_then(|s| s.to_str())
        .map(|s| s.to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| format!("repo{id}"))
}

/// Labels are unique across roots so unit ids never collide.
fn repos_for_roots(roots: &[PathBuf]) -> Vec<Repo> {
    let mut used = HashSet::new();
    roots
        .iter()
        .enumerate()
        .map(|(id, root)| {
            let base = repo_label(root, id);
            let mut label = base.clone();
            let mut suffix = id;
            while !used.insert(label.clone()) {
                label = format!("{base}-{suffix}");
                suffix += 1;
            }
            Repo {
                root: root.clone(),
                label,
            }
        })
        .collect()
}

fn extension_allowed(extensions: &HashSet<String>, path: &Path) -> bool {
    if extensions.is_empty() {
        return true;
    }
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.contains(&ext.to_ascii_lowercase()))
}

/// One loaded text file; `unit_id` is `<root label>/<relative path>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub unit_id: String,
    pub path: PathBuf,
    pub text: String,
}

/// Source files read from disk, in walk order. Also serves the report's
/// source slices.
#[derive(Debug, Clone, Default)]
pub struct LoadedSources {
    files: Vec<SourceFile>,
    by_id: HashMap<String, usize>,
}

impl LoadedSources {
    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn get(&self, unit_id: &str) -> Option<&SourceFile> {
        self.by_id.get(unit_id).map(|&idx| &self.files[idx])
    }

    fn push(&mut self, file: SourceFile) {
        self.by_id.insert(file.unit_id.clone(), self.files.len());
        self.files.push(file);
    }

    /// Tokenizes every file into one corpus, one unit per file.
    pub fn to_corpus(&self, options: &TokenizerOptions) -> Result<TokenCorpus> {
        let mut builder = CorpusBuilder::new();
        for file in &self.files {
            let tokens = tokenize_source(&file.text, options);
            builder.add_unit(
                file.unit_id.clone(),
                tokens.into_iter().map(|t| (t.text, t.line)),
            )?;
        }
        builder.freeze()
    }
}

impl SourceSlices for LoadedSources {
    fn source_lines(&self, unit_id: &str, start_line: u32, end_line: u32) -> Result<String> {
        let file = self
            .get(unit_id)
            .ok_or_else(|| CpdError::UnknownUnit(unit_id.to_string()))?;
        slice_lines(&file.text, start_line, end_line).ok_or_else(|| CpdError::MissingLines {
            unit: unit_id.to_string(),
            start_line,
            end_line,
        })
    }
}

fn load_root(
    repo: &Repo,
    options: &ScanOptions,
    stats: &mut ScanStats,
    sources: &mut LoadedSources,
) -> io::Result<ControlFlow<()>> {
    if options.max_files == Some(0) {
        stats.skipped_budget_max_files = stats.skipped_budget_max_files.saturating_add(1);
        return Ok(ControlFlow::Break(()));
    }
    let canonical_root = if options.follow_symlinks {
        Some(repo.root.canonicalize()?)
    } else {
        None
    };

    let mut files = root_files(&repo.root, canonical_root.as_deref(), options);
    while let Some(item) = files.next() {
        let abs_path = match item {
            Ok(path) => path,
            Err(skip) => {
                skip.record(stats);
                continue;
            }
        };
        if !extension_allowed(&options.extensions, &abs_path) {
            continue;
        }
        stats.candidate_files = stats.candidate_files.saturating_add(1);

        if let Some(text) = read_source_text(&abs_path, canonical_root.as_deref(), options, stats)?
        {
            let rel_path = make_rel_path(&repo.root, &abs_path);
            sources.push(SourceFile {
                unit_id: format!("{}/{rel_path}", repo.label),
                path: abs_path,
                text,
            });
        }

        if should_stop_due_to_max_files(options, stats) {
            for skip in files.pending_skips() {
                skip.record(stats);
            }
            return Ok(ControlFlow::Break(()));
        }
    }
    Ok(ControlFlow::Continue(()))
}

/// Walks `roots` and reads every eligible text file.
pub fn load_sources(
    roots: &[PathBuf],
    options: &ScanOptions,
) -> Result<ScanOutcome<LoadedSources>> {
    validate_roots(roots)?;
    let repos = repos_for_roots(roots);

    let mut stats = ScanStats::default();
    let mut sources = LoadedSources::default();

    for repo in &repos {
        if load_root(repo, options, &mut stats, &mut sources)?.is_break() {
            debug!(root = %repo.root.display(), "scan budget exhausted");
            break;
        }
    }

    debug!(
        files = sources.len(),
        candidates = stats.candidate_files,
        bytes = stats.scanned_bytes,
        "sources loaded"
    );
    Ok(ScanOutcome {
        result: sources,
        stats,
    })
}
