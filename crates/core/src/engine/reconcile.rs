use std::collections::HashMap;
use std::ops::Range;

use crate::corpus::{TokenCorpus, UnitIndex};

/// A verified duplicate between two anchors, `first < second`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PairMatch {
    pub(crate) first: usize,
    pub(crate) second: usize,
    pub(crate) token_count: usize,
}

impl PairMatch {
    fn first_range(&self) -> Range<usize> {
        self.first..self.first + self.token_count
    }

    fn second_range(&self) -> Range<usize> {
        self.second..self.second + self.token_count
    }

    fn conflicts_with(&self, other: &PairMatch) -> bool {
        ranges_intersect(&self.first_range(), &other.first_range())
            || ranges_intersect(&self.second_range(), &other.second_range())
    }
}

fn ranges_intersect(a: &Range<usize>, b: &Range<usize>) -> bool {
    a.start < b.end && b.start < a.end
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Offer {
    Inserted { evicted: usize },
    Dropped,
}

/// Keeps, per ordered pair of source units, a set of pairwise matches whose
/// ranges never overlap on either unit. Longer matches win; ties keep the
/// match that was offered first.
#[derive(Debug, Default)]
pub(crate) struct UnitPairReconciler {
    buckets: HashMap<(UnitIndex, UnitIndex), Vec<PairMatch>>,
}

impl UnitPairReconciler {
    pub(crate) fn offer(&mut self, corpus: &TokenCorpus, candidate: PairMatch) -> Offer {
        let (Some(unit_a), Some(unit_b)) =
            (corpus.unit_of(candidate.first), corpus.unit_of(candidate.second))
        else {
            return Offer::Dropped;
        };

        let bucket = self.buckets.entry((unit_a, unit_b)).or_default();
        let mut conflicting = Vec::new();
        for (idx, existing) in bucket.iter().enumerate() {
            if !existing.conflicts_with(&candidate) {
                continue;
            }
            if existing.token_count >= candidate.token_count {
                return Offer::Dropped;
            }
            conflicting.push(idx);
        }

        for &idx in conflicting.iter().rev() {
            bucket.swap_remove(idx);
        }
        bucket.push(candidate);
        Offer::Inserted {
            evicted: conflicting.len(),
        }
    }

    /// All surviving matches, ordered by anchors.
    pub(crate) fn into_matches(self) -> Vec<PairMatch> {
        let mut out: Vec<PairMatch> = self.buckets.into_values().flatten().collect();
        out.sort_unstable_by_key(|m| (m.first, m.second));
        out
    }
}
