use std::collections::HashSet;
use std::path::PathBuf;

use clap::Parser;
use tile_cpd_core::{
    CpdOptions, DEFAULT_MAX_FILE_SIZE_BYTES, DEFAULT_MIN_TILE_SIZE, ScanOptions, TokenizerOptions,
};

/// Token-level copy/paste detector.
///
/// Reports every run of at least `--min-tokens` identical tokens that occurs
/// in two or more places across the scanned source files.
#[derive(Debug, Parser)]
#[command(name = "tile-cpd")]
#[command(author, version, about, long_about = None)]
pub(crate) struct Cli {
    /// Directories to scan (default: current directory)
    #[arg(value_name = "ROOT")]
    pub(crate) roots: Vec<PathBuf>,

    /// Minimum duplicate length in tokens
    #[arg(
        long,
        value_name = "N",
        default_value_t = DEFAULT_MIN_TILE_SIZE as u64,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub(crate) min_tokens: u64,

    /// Output JSON
    #[arg(long)]
    pub(crate) json: bool,

    /// Include scan and engine stats (JSON) or print them to stderr
    #[arg(long)]
    pub(crate) stats: bool,

    /// Exit with status 1 if the scan was incomplete
    #[arg(long)]
    pub(crate) strict: bool,

    /// Exit with status 4 when any duplicate is found
    #[arg(long)]
    pub(crate) fail_on_duplicates: bool,

    /// Compare identifiers by kind only, so renamed copies match
    #[arg(long)]
    pub(crate) ignore_identifiers: bool,

    /// Compare string and number literals by kind only
    #[arg(long)]
    pub(crate) ignore_literals: bool,

    /// Only scan files with this extension (repeatable)
    #[arg(long = "ext", value_name = "EXT")]
    pub(crate) extensions: Vec<String>,

    /// Add an ignored directory name (repeatable)
    #[arg(long = "ignore-dir", value_name = "NAME")]
    pub(crate) ignore_dirs: Vec<String>,

    /// Do not respect .gitignore rules
    #[arg(long)]
    pub(crate) no_gitignore: bool,

    /// Follow symlinks that stay inside the root
    #[arg(long)]
    pub(crate) follow_symlinks: bool,

    /// Skip files larger than n bytes
    #[arg(long, value_name = "N", default_value_t = DEFAULT_MAX_FILE_SIZE_BYTES)]
    pub(crate) max_file_size: u64,

    /// Stop after scanning n files
    #[arg(long, value_name = "N")]
    pub(crate) max_files: Option<usize>,

    /// Skip files that would exceed the total scanned bytes
    #[arg(long, value_name = "N")]
    pub(crate) max_total_bytes: Option<u64>,

    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub(crate) verbose: u8,
}

impl Cli {
    pub(crate) fn scan_options(&self) -> ScanOptions {
        let mut options = ScanOptions {
            respect_gitignore: !self.no_gitignore,
            follow_symlinks: self.follow_symlinks,
            max_file_size: Some(self.max_file_size),
            max_files: self.max_files,
            max_total_bytes: self.max_total_bytes,
            ..ScanOptions::default()
        };
        options
            .ignore_dirs
            .extend(self.ignore_dirs.iter().cloned());
        options.extensions = normalize_extensions(&self.extensions);
        options
    }

    pub(crate) fn tokenizer_options(&self) -> TokenizerOptions {
        TokenizerOptions {
            ignore_identifiers: self.ignore_identifiers,
            ignore_literals: self.ignore_literals,
        }
    }

    pub(crate) fn cpd_options(&self) -> CpdOptions {
        CpdOptions::with_min_tile_size(usize::try_from(self.min_tokens).unwrap_or(usize::MAX))
    }

    pub(crate) fn log_directive(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        }
    }
}

fn normalize_extensions(raw: &[String]) -> HashSet<String> {
    raw.iter()
        .flat_map(|value| value.split(','))
        .map(|ext| ext.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Cli {
        let mut full = vec!["tile-cpd"];
        full.extend_from_slice(argv);
        Cli::try_parse_from(full).expect("valid args")
    }

    #[test]
    fn defaults() {
        let cli = parse(&[]);
        assert!(cli.roots.is_empty());
        assert_eq!(cli.cpd_options(), CpdOptions::default());
        let scan = cli.scan_options();
        assert!(scan.respect_gitignore);
        assert_eq!(scan.max_file_size, Some(DEFAULT_MAX_FILE_SIZE_BYTES));
        assert!(scan.extensions.is_empty());
        assert_eq!(cli.log_directive(), "warn");
    }

    #[test]
    fn maps_flags_onto_options() {
        let cli = parse(&[
            "--min-tokens",
            "25",
            "--ext",
            ".RS",
            "--ext",
            "c,h",
            "--ignore-dir",
            "vendor",
            "--no-gitignore",
            "--max-files",
            "10",
            "--ignore-literals",
            "-vv",
            "src",
            "lib",
        ]);
        assert_eq!(cli.roots, vec![PathBuf::from("src"), PathBuf::from("lib")]);
        assert_eq!(cli.cpd_options().min_tile_size, 25);

        let scan = cli.scan_options();
        let mut exts: Vec<&str> = scan.extensions.iter().map(String::as_str).collect();
        exts.sort_unstable();
        assert_eq!(exts, vec!["c", "h", "rs"]);
        assert!(scan.ignore_dirs.contains("vendor"));
        assert!(scan.ignore_dirs.contains("node_modules"));
        assert!(!scan.respect_gitignore);
        assert_eq!(scan.max_files, Some(10));

        let tokenizer = cli.tokenizer_options();
        assert!(tokenizer.ignore_literals);
        assert!(!tokenizer.ignore_identifiers);
        assert_eq!(cli.log_directive(), "trace");
    }

    #[test]
    fn rejects_zero_min_tokens() {
        assert!(Cli::try_parse_from(["tile-cpd", "--min-tokens", "0"]).is_err());
    }
}
