use tile_cpd_core::{EngineStats, Match, ScanStats};

pub(crate) fn has_fatal_skips(stats: &ScanStats) -> bool {
    stats.skipped_permission_denied > 0
        || stats.skipped_walk_errors > 0
        || stats.skipped_budget_max_files > 0
        || stats.skipped_budget_max_total_bytes > 0
}

pub(crate) fn format_scan_stats(stats: &ScanStats) -> String {
    let mut out = String::new();
    out.push_str("== scan stats ==\n");
    out.push_str(&format!(
        "candidates={} scanned={} bytes={}\n",
        stats.candidate_files, stats.scanned_files, stats.scanned_bytes
    ));

    let mut skips: Vec<(&str, u64)> = vec![
        ("not_found", stats.skipped_not_found),
        ("permission_denied", stats.skipped_permission_denied),
        ("too_large", stats.skipped_too_large),
        ("binary", stats.skipped_binary),
        ("not_utf8", stats.skipped_not_utf8),
        ("outside_root", stats.skipped_outside_root),
        ("walk_errors", stats.skipped_walk_errors),
        ("budget_max_files", stats.skipped_budget_max_files),
        (
            "budget_max_total_bytes",
            stats.skipped_budget_max_total_bytes,
        ),
    ];
    skips.retain(|(_, v)| *v > 0);
    if !skips.is_empty() {
        out.push_str("skipped:\n");
        for (k, v) in skips {
            out.push_str(&format!("- {k}={v}\n"));
        }
    }
    out.push('\n');
    out
}

pub(crate) fn format_engine_stats(stats: &EngineStats) -> String {
    let mut out = String::new();
    out.push_str("== engine stats ==\n");
    out.push_str(&format!(
        "units={} tokens={} groups={} pairs={}\n",
        stats.units, stats.tokens, stats.candidate_groups, stats.candidate_pairs
    ));
    out.push_str(&format!(
        "rejected: too_close={} previous_duplicate={} too_short={} overlap={}\n",
        stats.rejected_too_close,
        stats.rejected_previous_duplicate,
        stats.rejected_too_short,
        stats.rejected_overlap
    ));
    out.push_str(&format!(
        "reconciler: dropped={} evicted={} kept={}\n",
        stats.reconciler_dropped, stats.reconciler_evicted, stats.pairwise_matches
    ));
    out.push_str(&format!(
        "matches={} merged={} pruned={} duplicated_lines={}\n",
        stats.matches, stats.merged_matches, stats.pruned_occurrences, stats.duplicated_lines
    ));
    out.push('\n');
    out
}

pub(crate) fn format_matches(matches: &[Match]) -> String {
    let mut out = String::new();
    out.push_str(&format!("duplicates: {}\n", matches.len()));

    for m in matches {
        out.push('\n');
        let line_count = m.occurrences.first().map_or(0, |o| o.line_count);
        out.push_str(&format!(
            "Found a {line_count} line ({} tokens) duplication in {} places:\n",
            m.token_count,
            m.occurrences.len()
        ));
        for occ in &m.occurrences {
            out.push_str(&format!(
                "- {}:{}-{}\n",
                occ.unit_id, occ.start_line, occ.end_line
            ));
        }
        for line in m.source_slice.lines() {
            out.push_str("  | ");
            out.push_str(line);
            out.push('\n');
        }
    }

    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use tile_cpd_core::Occurrence;

    use super::*;

    fn occurrence(anchor: usize, unit_id: &str, start_line: u32, end_line: u32) -> Occurrence {
        Occurrence {
            anchor,
            unit_id: unit_id.to_string(),
            start_line,
            end_line,
            line_count: end_line - start_line + 1,
        }
    }

    #[test]
    fn formats_matches_with_locations_and_source() {
        let matches = vec![Match {
            token_count: 42,
            content_hash: 7,
            occurrences: vec![
                occurrence(0, "proj/a.c", 3, 4),
                occurrence(90, "proj/b.c", 10, 11),
            ],
            source_slice: "int x = 1;\nreturn x;".to_string(),
        }];

        let text = format_matches(&matches);
        assert_eq!(
            text,
            "duplicates: 1\n\
             \n\
             Found a 2 line (42 tokens) duplication in 2 places:\n\
             - proj/a.c:3-4\n\
             - proj/b.c:10-11\n\
             \x20 | int x = 1;\n\
             \x20 | return x;\n\
             \n"
        );
    }

    #[test]
    fn empty_report_still_has_a_header() {
        assert_eq!(format_matches(&[]), "duplicates: 0\n\n");
    }

    #[test]
    fn scan_stats_list_only_nonzero_skips() {
        let stats = ScanStats {
            candidate_files: 4,
            scanned_files: 3,
            scanned_bytes: 120,
            skipped_not_utf8: 1,
            ..ScanStats::default()
        };
        let text = format_scan_stats(&stats);
        assert!(text.contains("candidates=4 scanned=3 bytes=120\n"));
        assert!(text.contains("- not_utf8=1\n"));
        assert!(!text.contains("binary"));
        assert!(!has_fatal_skips(&stats));
    }

    #[test]
    fn budget_skips_are_fatal_in_strict_mode() {
        let stats = ScanStats {
            skipped_budget_max_files: 1,
            ..ScanStats::default()
        };
        assert!(has_fatal_skips(&stats));
    }

    #[test]
    fn engine_stats_summarize_the_run() {
        let stats = EngineStats {
            units: 2,
            tokens: 50,
            matches: 1,
            duplicated_lines: 8,
            ..EngineStats::default()
        };
        let text = format_engine_stats(&stats);
        assert!(text.starts_with("== engine stats ==\nunits=2 tokens=50 "));
        assert!(text.contains("matches=1 merged=0 pruned=0 duplicated_lines=8\n"));
    }
}
