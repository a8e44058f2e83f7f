mod args;
mod json;
mod path;
mod text;

use std::io;

use anyhow::Context;
use clap::Parser;
use tile_cpd_core::find_duplicates_in_roots;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::args::Cli;
use crate::json::{map_matches, map_report_with_stats, write_json};
use crate::path::resolve_roots;
use crate::text::{format_engine_stats, format_matches, format_scan_stats, has_fatal_skips};

const EXIT_INCOMPLETE_SCAN: i32 = 1;
const EXIT_DUPLICATES_FOUND: i32 = 4;

fn init_tracing(default_directive: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.log_directive());

    match run(&cli) {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(err) => {
            eprintln!("Error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<i32> {
    let roots = resolve_roots(&cli.roots).context("resolving roots")?;
    debug!(roots = roots.len(), min_tokens = cli.min_tokens, "starting scan");
    let outcome = find_duplicates_in_roots(
        &roots,
        &cli.scan_options(),
        &cli.tokenizer_options(),
        &cli.cpd_options(),
    )
    .context("duplication analysis failed")?;
    let report = &outcome.result;

    if cli.json {
        if cli.stats {
            write_json(&map_report_with_stats(report, &outcome.stats))?;
        } else {
            write_json(&map_matches(&report.matches))?;
        }
    } else {
        print!("{}", format_matches(&report.matches));
        if cli.stats {
            eprint!("{}", format_scan_stats(&outcome.stats));
            eprint!("{}", format_engine_stats(&report.stats));
        }
    }

    if cli.strict && has_fatal_skips(&outcome.stats) {
        if !cli.stats || cli.json {
            eprint!("{}", format_scan_stats(&outcome.stats));
        }
        return Ok(EXIT_INCOMPLETE_SCAN);
    }
    if cli.fail_on_duplicates && !report.matches.is_empty() {
        return Ok(EXIT_DUPLICATES_FOUND);
    }
    Ok(0)
}
