mod consolidate;
mod enrich;
mod grouper;
mod hasher;
mod reconcile;
mod verify;


use std::cmp::Reverse;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, trace};

use crate::corpus::TokenCorpus;
use crate::error::{CpdError, Result};
use crate::types::{CpdOptions, DuplicationReport, EngineStats, Phase};

pub use enrich::{InMemorySources, SourceSlices};

use consolidate::consolidate;
use enrich::enrich;
use grouper::group_candidates;
use hasher::hash_windows;
use reconcile::{Offer, PairMatch, UnitPairReconciler};
use verify::{PairVerdict, verify_pair};

/// Observes phase transitions of a run. It cannot influence the run.
pub trait PhaseListener {
    fn on_phase(&mut self, phase: Phase);
}

impl<F: FnMut(Phase)> PhaseListener for F {
    fn on_phase(&mut self, phase: Phase) {
        self(phase)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl PhaseListener for NoProgress {
    fn on_phase(&mut self, _phase: Phase) {}
}

#[derive(Debug, Clone, Default)]
pub struct Engine {
    options: CpdOptions,
    cancel: Option<Arc<AtomicBool>>,
}

impl Engine {
    pub fn new(options: CpdOptions) -> Self {
        Self {
            options,
            cancel: None,
        }
    }

    /// The flag is polled between stages and between candidate groups; once
    /// set, the run fails with [`CpdError::Cancelled`].
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn options(&self) -> &CpdOptions {
        &self.options
    }

    fn check_cancelled(&self) -> Result<()> {
        match &self.cancel {
            Some(flag) if flag.load(Ordering::Relaxed) => Err(CpdError::Cancelled),
            _ => Ok(()),
        }
    }

    pub fn run(
        &self,
        corpus: &TokenCorpus,
        sources: &dyn SourceSlices,
        listener: &mut dyn PhaseListener,
    ) -> Result<DuplicationReport> {
        self.options.validate()?;
        let min_tile_size = self.options.min_tile_size;

        let mut stats = EngineStats {
            units: corpus.units().len() as u64,
            tokens: corpus.real_token_count() as u64,
            ..EngineStats::default()
        };
        listener.on_phase(Phase::TokenizingComplete);
        debug!(
            units = stats.units,
            tokens = stats.tokens,
            distinct_texts = corpus.distinct_texts(),
            min_tile_size,
            "corpus ready"
        );

        self.check_cancelled()?;
        listener.on_phase(Phase::Hashing);
        let groups = group_candidates(&hash_windows(corpus, min_tile_size));
        stats.candidate_groups = groups.len() as u64;
        debug!(groups = stats.candidate_groups, "candidate groups built");

        self.check_cancelled()?;
        listener.on_phase(Phase::Matching);
        let mut accepted = Vec::new();
        for positions in &groups {
            self.check_cancelled()?;
            self.verify_group(corpus, positions, &mut accepted, &mut stats);
        }
        drop(groups);

        self.check_cancelled()?;
        let pairs = reconcile_pairs(corpus, accepted, &mut stats);
        stats.pairwise_matches = pairs.len() as u64;
        debug!(
            candidate_pairs = stats.candidate_pairs,
            pairwise_matches = stats.pairwise_matches,
            rejected_too_short = stats.rejected_too_short,
            rejected_overlap = stats.rejected_overlap,
            "pairwise matching done"
        );

        self.check_cancelled()?;
        listener.on_phase(Phase::Consolidating);
        let consolidation = consolidate(corpus, pairs);
        stats.merged_matches = consolidation.merged;
        stats.pruned_occurrences = consolidation.pruned;

        let mut matches = enrich(corpus, consolidation.groups, sources)?;
        matches.sort_by(|a, b| {
            b.token_count
                .cmp(&a.token_count)
                .then_with(|| b.occurrences.len().cmp(&a.occurrences.len()))
                .then_with(|| a.occurrences[0].anchor.cmp(&b.occurrences[0].anchor))
        });
        stats.matches = matches.len() as u64;
        stats.duplicated_lines = matches
            .iter()
            .flat_map(|m| m.occurrences.iter())
            .map(|o| u64::from(o.line_count))
            .sum();
        debug!(
            matches = stats.matches,
            merged = stats.merged_matches,
            pruned = stats.pruned_occurrences,
            "consolidation done"
        );

        listener.on_phase(Phase::Done);
        Ok(DuplicationReport { matches, stats })
    }

    fn verify_group(
        &self,
        corpus: &TokenCorpus,
        positions: &[usize],
        accepted: &mut Vec<PairMatch>,
        stats: &mut EngineStats,
    ) {
        let min_tile_size = self.options.min_tile_size;
        for (i, &first) in positions.iter().enumerate() {
            for &second in &positions[i + 1..] {
                stats.candidate_pairs += 1;
                match verify_pair(corpus, first, second, min_tile_size) {
                    PairVerdict::Accepted(token_count) => accepted.push(PairMatch {
                        first,
                        second,
                        token_count,
                    }),
                    PairVerdict::TooClose => stats.rejected_too_close += 1,
                    PairVerdict::PreviousDuplicate => stats.rejected_previous_duplicate += 1,
                    PairVerdict::TooShort => {
                        trace!(first, second, "hash collision or short run rejected");
                        stats.rejected_too_short += 1;
                    }
                    PairVerdict::Overlap => stats.rejected_overlap += 1,
                }
            }
        }
    }
}

/// Offers verified pairs longest first, then by anchors. The order depends
/// only on the pairs themselves, so the pairs of at least `w` tokens that
/// survive are the same for every tile size up to `w`.
fn reconcile_pairs(
    corpus: &TokenCorpus,
    mut accepted: Vec<PairMatch>,
    stats: &mut EngineStats,
) -> Vec<PairMatch> {
    accepted.sort_unstable_by_key(|m| (Reverse(m.token_count), m.first, m.second));
    let mut reconciler = UnitPairReconciler::default();
    for candidate in accepted {
        match reconciler.offer(corpus, candidate) {
            Offer::Inserted { evicted } => {
                stats.reconciler_evicted += evicted as u64;
            }
            Offer::Dropped => stats.reconciler_dropped += 1,
        }
    }
    reconciler.into_matches()
}

/// Runs the whole pipeline over one frozen corpus.
pub fn find_duplicates(
    corpus: &TokenCorpus,
    options: &CpdOptions,
    sources: &dyn SourceSlices,
    listener: &mut dyn PhaseListener,
) -> Result<DuplicationReport> {
    Engine::new(options.clone()).run(corpus, sources, listener)
}
