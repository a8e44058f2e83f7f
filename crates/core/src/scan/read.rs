use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::types::{ScanOptions, ScanStats};

use super::walker::Skip;

pub(crate) fn make_rel_path(root: &Path, abs_path: &Path) -> String {
    match abs_path.strip_prefix(root) {
        Ok(rel) => rel.to_string_lossy().replace('\\', "/"),
        Err(_) => abs_path.to_string_lossy().replace('\\', "/"),
    }
}

fn resolve_read_path(
    abs_path: &Path,
    canonical_root: Option<&Path>,
    follow_symlinks: bool,
    stats: &mut ScanStats,
) -> io::Result<Option<PathBuf>> {
    if !follow_symlinks {
        return Ok(Some(abs_path.to_path_buf()));
    }

    let Some(canonical_root) = canonical_root else {
        return Err(io::Error::other(
            "resolve_read_path requires canonical_root when follow_symlinks=true",
        ));
    };

    let resolved = match abs_path.canonicalize() {
        Ok(p) => p,
        Err(err) => {
            Skip::from_io(&err).record(stats);
            return Ok(None);
        }
    };

    if !resolved.starts_with(canonical_root) {
        Skip::OutsideRoot.record(stats);
        return Ok(None);
    }

    Ok(Some(resolved))
}

/// Reads one file as UTF-8 text, honouring the size and byte budgets.
///
/// Returns `Ok(None)` for files that are skipped (too large, binary, not
/// UTF-8, vanished, unreadable); the reason is counted in `stats`.
pub(crate) fn read_source_text(
    abs_path: &Path,
    canonical_root: Option<&Path>,
    options: &ScanOptions,
    stats: &mut ScanStats,
) -> io::Result<Option<String>> {
    if let Some(max_files) = options.max_files
        && stats.scanned_files >= max_files as u64
    {
        return Ok(None);
    }

    let Some(read_path) =
        resolve_read_path(abs_path, canonical_root, options.follow_symlinks, stats)?
    else {
        return Ok(None);
    };

    let metadata = match fs::symlink_metadata(&read_path) {
        Ok(m) => {
            if m.file_type().is_symlink() {
                stats.skipped_walk_errors = stats.skipped_walk_errors.saturating_add(1);
                return Ok(None);
            }
            m
        }
        Err(err) => {
            Skip::from_io(&err).record(stats);
            return Ok(None);
        }
    };

    if let Some(max_file_size) = options.max_file_size
        && metadata.len() > max_file_size
    {
        debug!(path = %read_path.display(), size = metadata.len(), "skipping large file");
        stats.skipped_too_large = stats.skipped_too_large.saturating_add(1);
        return Ok(None);
    }

    if let Some(max_total_bytes) = options.max_total_bytes
        && stats.scanned_bytes.saturating_add(metadata.len()) > max_total_bytes
    {
        stats.skipped_budget_max_total_bytes =
            stats.skipped_budget_max_total_bytes.saturating_add(1);
        return Ok(None);
    }

    let mut file = match fs::File::open(&read_path) {
        Ok(f) => f,
        Err(err) => {
            Skip::from_io(&err).record(stats);
            return Ok(None);
        }
    };

    let metadata_len = metadata.len();
    let max_file_size = options.max_file_size;

    let mut bytes: Vec<u8> = Vec::with_capacity(metadata_len.min(1024 * 1024) as usize);
    let mut total_read: u64 = 0;
    let mut buf = [0u8; 16 * 1024];
    loop {
        let mut limit = buf.len() as u64;

        // The file may grow between stat and read.
        if let Some(max_file_size) = max_file_size {
            let remaining = max_file_size.saturating_add(1).saturating_sub(total_read);
            if remaining == 0 {
                stats.scanned_files = stats.scanned_files.saturating_add(1);
                stats.scanned_bytes = stats.scanned_bytes.saturating_add(total_read);
                stats.skipped_too_large = stats.skipped_too_large.saturating_add(1);
                return Ok(None);
            }
            limit = limit.min(remaining);
        }

        let n = match file.read(&mut buf[..limit as usize]) {
            Ok(n) => n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(_) => {
                stats.skipped_walk_errors = stats.skipped_walk_errors.saturating_add(1);
                return Ok(None);
            }
        };
        if n == 0 {
            break;
        }

        let new_total_read = total_read.saturating_add(n as u64);
        if buf[..n].contains(&0) {
            debug!(path = %read_path.display(), "skipping binary file");
            stats.scanned_files = stats.scanned_files.saturating_add(1);
            stats.scanned_bytes = stats.scanned_bytes.saturating_add(new_total_read);
            stats.skipped_binary = stats.skipped_binary.saturating_add(1);
            return Ok(None);
        }

        if let Some(max_file_size) = max_file_size
            && new_total_read > max_file_size
        {
            stats.scanned_files = stats.scanned_files.saturating_add(1);
            stats.scanned_bytes = stats.scanned_bytes.saturating_add(new_total_read);
            stats.skipped_too_large = stats.skipped_too_large.saturating_add(1);
            return Ok(None);
        }

        bytes.extend_from_slice(&buf[..n]);
        total_read = new_total_read;
    }

    stats.scanned_files = stats.scanned_files.saturating_add(1);
    stats.scanned_bytes = stats.scanned_bytes.saturating_add(total_read);

    match String::from_utf8(bytes) {
        Ok(text) => Ok(Some(text)),
        Err(_) => {
            debug!(path = %read_path.display(), "skipping non UTF-8 file");
            stats.skipped_not_utf8 = stats.skipped_not_utf8.saturating_add(1);
            Ok(None)
        }
    }
}
