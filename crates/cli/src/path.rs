use std::env;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Absolute, lexically normalized roots; no roots means the current directory.
pub(crate) fn resolve_roots(raw: &[PathBuf]) -> io::Result<Vec<PathBuf>> {
    if raw.is_empty() {
        return Ok(vec![resolve_root(Path::new("."))?]);
    }
    raw.iter().map(|p| resolve_root(p)).collect()
}

fn resolve_root(p: &Path) -> io::Result<PathBuf> {
    let base = if p.is_absolute() {
        PathBuf::new()
    } else {
        env::current_dir()?
    };
    let normalized = normalize_path(&base.join(p));
    // Missing roots are reported by the scanner with the path the user gave.
    Ok(fs::canonicalize(&normalized).unwrap_or(normalized))
}

fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() && !out.has_root() {
                    out.push(component.as_os_str());
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_dot_segments() {
        assert_eq!(
            normalize_path(Path::new("/a/./b/../c")),
            PathBuf::from("/a/c")
        );
        assert_eq!(normalize_path(Path::new("/..")), PathBuf::from("/"));
    }

    #[test]
    fn empty_roots_default_to_current_dir() -> io::Result<()> {
        let roots = resolve_roots(&[])?;
        assert_eq!(roots.len(), 1);
        assert!(roots[0].is_absolute());
        Ok(())
    }
}
