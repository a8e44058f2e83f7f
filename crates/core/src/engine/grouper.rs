use std::collections::HashMap;

use super::hasher::WindowHashes;

/// Buckets full-window positions by hash. Singletons are dropped and the
/// remaining groups are ordered by their first position, each group holding
/// its positions in ascending order.
pub(crate) fn group_candidates(hashes: &WindowHashes) -> Vec<Vec<usize>> {
    let mut by_hash: HashMap<u64, Vec<usize>> = HashMap::new();
    for pos in 0..hashes.len() {
        if !hashes.has_full_window(pos) {
            continue;
        }
        by_hash.entry(hashes.hash(pos)).or_default().push(pos);
    }

    let mut groups: Vec<Vec<usize>> = by_hash
        .into_values()
        .filter(|positions| positions.len() > 1)
        .collect();
    groups.sort_unstable_by_key(|positions| positions[0]);
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::CorpusBuilder;
    use crate::engine::hasher::hash_windows;
    use crate::error::Result;

    #[test]
    fn groups_equal_windows_and_skips_boundary_positions() -> Result<()> {
        let mut builder = CorpusBuilder::new();
        builder.add_unit("a", "a b c a b".split(' ').map(|t| (t, 1)))?;
        builder.add_unit("b", "a b".split(' ').map(|t| (t, 1)))?;
        let corpus = builder.freeze()?;

        let groups = group_candidates(&hash_windows(&corpus, 2));
        // positions 4 and 7 start "b" followed by a marker and are never grouped.
        assert_eq!(groups, vec![vec![0, 3, 6]]);
        Ok(())
    }
}
