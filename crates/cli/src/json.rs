use std::io;

use serde::Serialize;
use tile_cpd_core::{DuplicationReport, EngineStats, Match, Occurrence, ScanStats};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct JsonScanStats {
    pub(crate) candidate_files: u64,
    pub(crate) scanned_files: u64,
    pub(crate) scanned_bytes: u64,
    pub(crate) skipped_not_found: u64,
    pub(crate) skipped_permission_denied: u64,
    pub(crate) skipped_too_large: u64,
    pub(crate) skipped_binary: u64,
    pub(crate) skipped_not_utf8: u64,
    pub(crate) skipped_outside_root: u64,
    pub(crate) skipped_walk_errors: u64,
    pub(crate) skipped_budget_max_files: u64,
    pub(crate) skipped_budget_max_total_bytes: u64,
}

impl From<&ScanStats> for JsonScanStats {
    fn from(stats: &ScanStats) -> Self {
        Self {
            candidate_files: stats.candidate_files,
            scanned_files: stats.scanned_files,
            scanned_bytes: stats.scanned_bytes,
            skipped_not_found: stats.skipped_not_found,
            skipped_permission_denied: stats.skipped_permission_denied,
            skipped_too_large: stats.skipped_too_large,
            skipped_binary: stats.skipped_binary,
            skipped_not_utf8: stats.skipped_not_utf8,
            skipped_outside_root: stats.skipped_outside_root,
            skipped_walk_errors: stats.skipped_walk_errors,
            skipped_budget_max_files: stats.skipped_budget_max_files,
            skipped_budget_max_total_bytes: stats.skipped_budget_max_total_bytes,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct JsonEngineStats {
    pub(crate) units: u64,
    pub(crate) tokens: u64,
    pub(crate) candidate_groups: u64,
    pub(crate) candidate_pairs: u64,
    pub(crate) rejected_too_close: u64,
    pub(crate) rejected_previous_duplicate: u64,
    pub(crate) rejected_too_short: u64,
    pub(crate) rejected_overlap: u64,
    pub(crate) reconciler_dropped: u64,
    pub(crate) reconciler_evicted: u64,
    pub(crate) pairwise_matches: u64,
    pub(crate) merged_matches: u64,
    pub(crate) pruned_occurrences: u64,
    pub(crate) matches: u64,
    pub(crate) duplicated_lines: u64,
}

impl From<&EngineStats> for JsonEngineStats {
    fn from(stats: &EngineStats) -> Self {
        Self {
            units: stats.units,
            tokens: stats.tokens,
            candidate_groups: stats.candidate_groups,
            candidate_pairs: stats.candidate_pairs,
            rejected_too_close: stats.rejected_too_close,
            rejected_previous_duplicate: stats.rejected_previous_duplicate,
            rejected_too_short: stats.rejected_too_short,
            rejected_overlap: stats.rejected_overlap,
            reconciler_dropped: stats.reconciler_dropped,
            reconciler_evicted: stats.reconciler_evicted,
            pairwise_matches: stats.pairwise_matches,
            merged_matches: stats.merged_matches,
            pruned_occurrences: stats.pruned_occurrences,
            matches: stats.matches,
            duplicated_lines: stats.duplicated_lines,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct JsonOccurrence {
    pub(crate) unit: String,
    pub(crate) start_line: u32,
    pub(crate) end_line: u32,
    pub(crate) line_count: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct JsonMatch {
    pub(crate) hash: String,
    pub(crate) token_count: usize,
    pub(crate) line_count: u32,
    pub(crate) occurrences: Vec<JsonOccurrence>,
    pub(crate) source: String,
}

fn map_occurrence(occ: &Occurrence) -> JsonOccurrence {
    JsonOccurrence {
        unit: occ.unit_id.clone(),
        start_line: occ.start_line,
        end_line: occ.end_line,
        line_count: occ.line_count,
    }
}

pub(crate) fn map_matches(matches: &[Match]) -> Vec<JsonMatch> {
    matches
        .iter()
        .map(|m| JsonMatch {
            hash: format!("{:016x}", m.content_hash),
            token_count: m.token_count,
            line_count: m.occurrences.first().map_or(0, |o| o.line_count),
            occurrences: m.occurrences.iter().map(map_occurrence).collect(),
            source: m.source_slice.clone(),
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct JsonReportWithStats {
    pub(crate) matches: Vec<JsonMatch>,
    pub(crate) scan_stats: JsonScanStats,
    pub(crate) engine_stats: JsonEngineStats,
}

pub(crate) fn map_report_with_stats(
    report: &DuplicationReport,
    scan_stats: &ScanStats,
) -> JsonReportWithStats {
    JsonReportWithStats {
        matches: map_matches(&report.matches),
        scan_stats: scan_stats.into(),
        engine_stats: (&report.stats).into(),
    }
}

pub(crate) fn write_json<T: Serialize>(value: &T) -> io::Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| io::Error::other(format!("json encode: {e}")))?;
    println!("{json}");
    Ok(())
}
