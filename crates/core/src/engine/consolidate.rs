use std::cmp::Reverse;
use std::collections::{BTreeSet, HashSet};

use crate::corpus::TokenCorpus;

use super::reconcile::PairMatch;
use super::verify::count_duplicate_tokens;

/// One duplicated fragment with every anchor it was found at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MatchGroup {
    pub(crate) token_count: usize,
    pub(crate) anchors: BTreeSet<usize>,
}

#[derive(Debug, Default)]
pub(crate) struct Consolidation {
    pub(crate) groups: Vec<MatchGroup>,
    pub(crate) merged: u64,
    pub(crate) pruned: u64,
}

fn exact_duplicates(corpus: &TokenCorpus, a: usize, b: usize, token_count: usize) -> bool {
    a == b || count_duplicate_tokens(corpus, a.min(b), a.max(b)) >= token_count
}

fn shares_content(corpus: &TokenCorpus, group: &MatchGroup, other: &MatchGroup) -> bool {
    other.anchors.iter().any(|&b| {
        group
            .anchors
            .iter()
            .any(|&a| exact_duplicates(corpus, a, b, group.token_count))
    })
}

/// Keeps the largest set of anchors that are pairwise exact duplicates of
/// `reference` and pairwise non-overlapping, scanning anchors in ascending
/// order. Returns how many anchors were removed.
fn prune_inconsistent(corpus: &TokenCorpus, group: &mut MatchGroup, reference: usize) -> u64 {
    let token_count = group.token_count;
    let mut kept = BTreeSet::new();
    let mut next_free = 0usize;
    for &anchor in &group.anchors {
        if anchor < next_free {
            continue;
        }
        if !exact_duplicates(corpus, reference, anchor, token_count) {
            continue;
        }
        kept.insert(anchor);
        next_free = anchor + token_count;
    }

    let removed = (group.anchors.len() - kept.len()) as u64;
    if kept.len() >= 2 {
        group.anchors = kept;
        removed
    } else {
        0
    }
}

/// Merges pairwise matches of equal length that describe the same fragment
/// into multi-occurrence groups.
pub(crate) fn consolidate(corpus: &TokenCorpus, mut pairs: Vec<PairMatch>) -> Consolidation {
    pairs.sort_unstable_by_key(|m| (Reverse(m.token_count), Reverse(m.first), Reverse(m.second)));

    let mut pending: Vec<Option<(MatchGroup, usize)>> = pairs
        .into_iter()
        .map(|m| {
            let group = MatchGroup {
                token_count: m.token_count,
                anchors: BTreeSet::from([m.first, m.second]),
            };
            Some((group, m.first))
        })
        .collect();

    let mut out = Consolidation::default();
    let mut seen: HashSet<BTreeSet<usize>> = HashSet::new();

    for i in 0..pending.len() {
        let Some((mut group, reference)) = pending[i].take() else {
            continue;
        };

        let mut absorbed = false;
        for slot in pending.iter_mut().skip(i + 1) {
            let Some((other, _)) = slot.as_ref() else {
                continue;
            };
            if other.token_count != group.token_count {
                break;
            }
            if !shares_content(corpus, &group, other) {
                continue;
            }
            if let Some((other, _)) = slot.take() {
                group.anchors.extend(other.anchors);
                absorbed = true;
                out.merged += 1;
            }
        }

        if absorbed {
            out.pruned += prune_inconsistent(corpus, &mut group, reference);
        }
        if seen.insert(group.anchors.clone()) {
            out.groups.push(group);
        }
    }

    out
}
