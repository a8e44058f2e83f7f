use crate::corpus::TokenCorpus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PairVerdict {
    /// Exact shared run length starting at both anchors.
    Accepted(usize),
    TooClose,
    PreviousDuplicate,
    TooShort,
    Overlap,
}

fn tokens_differ(corpus: &TokenCorpus, a: usize, b: usize) -> bool {
    corpus.is_end_of_unit(a) || corpus.is_end_of_unit(b) || corpus.text_id(a) != corpus.text_id(b)
}

/// Length of the exact token run shared by positions `a` and `b`, stopping
/// at the first mismatch or end-of-unit marker on either side.
pub(crate) fn count_duplicate_tokens(corpus: &TokenCorpus, a: usize, b: usize) -> usize {
    let mut k = 0;
    while !tokens_differ(corpus, a + k, b + k) {
        k += 1;
    }
    k
}

/// Decides whether `a < b` (same hash group) start a reportable pairwise
/// duplicate of at least `min_tile_size` tokens.
pub(crate) fn verify_pair(
    corpus: &TokenCorpus,
    a: usize,
    b: usize,
    min_tile_size: usize,
) -> PairVerdict {
    debug_assert!(a < b, "candidate anchors must be ordered");
    if b - a < min_tile_size {
        return PairVerdict::TooClose;
    }
    // Covered by the match anchored one token earlier.
    if a > 0 && !tokens_differ(corpus, a - 1, b - 1) {
        return PairVerdict::PreviousDuplicate;
    }

    let dupes = count_duplicate_tokens(corpus, a, b);
    if dupes < min_tile_size {
        return PairVerdict::TooShort;
    }
    if a + dupes > b {
        return PairVerdict::Overlap;
    }
    PairVerdict::Accepted(dupes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::CorpusBuilder;
    use crate::error::Result;

    fn corpus(units: &[&str]) -> Result<TokenCorpus> {
        let mut builder = CorpusBuilder::new();
        for (idx, unit) in units.iter().enumerate() {
            builder.add_unit(format!("u{idx}"), unit.split(' ').map(|t| (t, 1)))?;
        }
        builder.freeze()
    }

    #[test]
    fn counts_until_mismatch_or_marker() -> Result<()> {
        let corpus = corpus(&["a b c d x", "a b c d"])?;
        assert_eq!(count_duplicate_tokens(&corpus, 0, 6), 4);
        assert_eq!(count_duplicate_tokens(&corpus, 1, 7), 3);
        assert_eq!(count_duplicate_tokens(&corpus, 0, 1), 0);
        Ok(())
    }

    #[test]
    fn never_counts_markers_as_equal() -> Result<()> {
        let corpus = corpus(&["a b", "a b"])?;
        assert_eq!(count_duplicate_tokens(&corpus, 0, 3), 2);
        assert_eq!(count_duplicate_tokens(&corpus, 2, 5), 0);
        Ok(())
    }

    #[test]
    fn rejects_hash_collisions_with_different_tokens() -> Result<()> {
        let corpus = corpus(&["a b c", "a b d"])?;
        assert_eq!(verify_pair(&corpus, 0, 4, 3), PairVerdict::TooShort);
        Ok(())
    }

    #[test]
    fn rejects_continuations_of_an_earlier_match() -> Result<()> {
        let corpus = corpus(&["a b c d", "a b c d"])?;
        assert_eq!(verify_pair(&corpus, 0, 5, 2), PairVerdict::Accepted(4));
        assert_eq!(verify_pair(&corpus, 1, 6, 2), PairVerdict::PreviousDuplicate);
        Ok(())
    }

    #[test]
    fn rejects_close_and_self_overlapping_pairs() -> Result<()> {
        let corpus = corpus(&["a b a b a b"])?;
        assert_eq!(verify_pair(&corpus, 0, 1, 2), PairVerdict::TooClose);
        assert_eq!(verify_pair(&corpus, 0, 2, 2), PairVerdict::Overlap);
        assert_eq!(verify_pair(&corpus, 0, 4, 2), PairVerdict::Accepted(2));
        Ok(())
    }
}
