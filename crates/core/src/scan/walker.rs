use std::collections::HashSet;
use std::io;
use std::iter::Fuse;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};

use ignore::{DirEntry, Walk, WalkBuilder};
use tracing::trace;

use crate::types::{ScanOptions, ScanStats};

/// Why a path never reached the reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Skip {
    NotFound,
    PermissionDenied,
    OutsideRoot,
    WalkError,
}

impl Skip {
    pub(crate) fn from_io(err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Skip::NotFound,
            io::ErrorKind::PermissionDenied => Skip::PermissionDenied,
            _ => Skip::WalkError,
        }
    }

    fn from_walk(err: &ignore::Error) -> Self {
        err.io_error().map_or(Skip::WalkError, Skip::from_io)
    }

    pub(crate) fn record(self, stats: &mut ScanStats) {
        let counter = match self {
            Skip::NotFound => &mut stats.skipped_not_found,
            Skip::PermissionDenied => &mut stats.skipped_permission_denied,
            Skip::OutsideRoot => &mut stats.skipped_outside_root,
            Skip::WalkError => &mut stats.skipped_walk_errors,
        };
        *counter = counter.saturating_add(1);
    }
}

pub(crate) fn is_ignored_dir(ignore_dirs: &HashSet<String>, name: &str) -> bool {
    if cfg!(windows) {
        ignore_dirs.iter().any(|d| d.eq_ignore_ascii_case(name))
    } else {
        ignore_dirs.contains(name)
    }
}

/// Prunes ignored directories and symlinks. The walk may run the filter on
/// another thread, so its skips travel back over a channel.
struct DirFilter {
    ignore_dirs: HashSet<String>,
    /// Set only when symlinks are followed.
    canonical_root: Option<PathBuf>,
    skips: Sender<Skip>,
}

impl DirFilter {
    fn keep(&self, entry: &DirEntry) -> bool {
        if entry.depth() == 0 {
            return true;
        }
        if entry.path_is_symlink() && self.canonical_root.is_none() {
            return false;
        }
        if !entry.file_type().is_some_and(|ft| ft.is_dir()) {
            return true;
        }
        if entry
            .file_name()
            .to_str()
            .is_some_and(|name| is_ignored_dir(&self.ignore_dirs, name))
        {
            return false;
        }

        match (&self.canonical_root, entry.path_is_symlink()) {
            (Some(root), true) => match entry.path().canonicalize() {
                Ok(resolved) if resolved.starts_with(root) => true,
                Ok(_) => self.skip(Skip::OutsideRoot),
                Err(err) => self.skip(Skip::from_io(&err)),
            },
            _ => true,
        }
    }

    fn skip(&self, skip: Skip) -> bool {
        // The receiver outlives the walk.
        let _ = self.skips.send(skip);
        false
    }
}

/// Regular files under one root in file-name order, interleaved with the
/// reasons other paths were left out.
pub(crate) struct RootFiles {
    walk: Fuse<Walk>,
    skips: Receiver<Skip>,
}

impl RootFiles {
    /// Skips the directory filter recorded that have not been yielded yet.
    pub(crate) fn pending_skips(&self) -> impl Iterator<Item = Skip> + '_ {
        self.skips.try_iter()
    }
}

impl Iterator for RootFiles {
    type Item = Result<PathBuf, Skip>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Ok(skip) = self.skips.try_recv() {
                return Some(Err(skip));
            }
            let Some(result) = self.walk.next() else {
                return self.skips.try_recv().ok().map(Err);
            };
            match result {
                Ok(entry) => {
                    if entry.depth() > 0 && entry.file_type().is_some_and(|ft| ft.is_file()) {
                        return Some(Ok(entry.into_path()));
                    }
                }
                Err(err) => {
                    trace!(error = %err, "walk error");
                    return Some(Err(Skip::from_walk(&err)));
                }
            }
        }
    }
}

/// `canonical_root` must be given exactly when `options.follow_symlinks`.
pub(crate) fn root_files(
    root: &Path,
    canonical_root: Option<&Path>,
    options: &ScanOptions,
) -> RootFiles {
    let respect_gitignore = options.respect_gitignore;
    let is_git_repo = root.join(".git").exists();
    let (sender, receiver) = mpsc::channel();
    let filter = DirFilter {
        ignore_dirs: options.ignore_dirs.clone(),
        canonical_root: canonical_root.map(Path::to_path_buf),
        skips: sender,
    };

    let walk = WalkBuilder::new(root)
        .hidden(false)
        .follow_links(options.follow_symlinks)
        .ignore(false)
        .git_ignore(respect_gitignore)
        .git_global(respect_gitignore && is_git_repo)
        .git_exclude(respect_gitignore && is_git_repo)
        .parents(false)
        .require_git(false)
        .sort_by_file_name(|a, b| a.cmp(b))
        .filter_entry(move |entry| filter.keep(entry))
        .build();

    RootFiles {
        walk: walk.fuse(),
        skips: receiver,
    }
}
