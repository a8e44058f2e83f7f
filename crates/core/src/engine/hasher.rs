use crate::corpus::TokenCorpus;

const BASE: u64 = 911382323;

/// Per-position window hashes, parallel to the corpus token vector.
#[derive(Debug)]
pub(crate) struct WindowHashes {
    hashes: Vec<u64>,
    /// `true` when a full `W`-token window starts at the position without
    /// reaching the unit's end-of-unit marker.
    full_window: Vec<bool>,
}

impl WindowHashes {
    pub(crate) fn hash(&self, index: usize) -> u64 {
        self.hashes[index]
    }

    pub(crate) fn has_full_window(&self, index: usize) -> bool {
        self.full_window[index]
    }

    pub(crate) fn len(&self) -> usize {
        self.hashes.len()
    }
}

fn wrapping_pow(mut base: u64, mut exp: usize) -> u64 {
    let mut acc = 1u64;
    while exp > 0 {
        if exp & 1 == 1 {
            acc = acc.wrapping_mul(base);
        }
        base = base.wrapping_mul(base);
        exp >>= 1;
    }
    acc
}

/// Single backward pass computing `h(i) = sum_{k<W} id(i+k) * BASE^k`.
///
/// Markers have id 0, so they drop out of any window they fall into. The
/// `W-1` positions right before a marker get a partial hash over the tokens
/// left in their unit and are flagged as not starting a full window.
pub(crate) fn hash_windows(corpus: &TokenCorpus, min_tile_size: usize) -> WindowHashes {
    let len = corpus.len();
    let mut hashes = vec![0u64; len];
    let mut full_window = vec![false; len];

    let pow = wrapping_pow(BASE, min_tile_size);

    let mut hash = 0u64;
    let mut i = len;
    while i > 0 {
        i -= 1;
        if !corpus.is_end_of_unit(i) {
            let tail = u64::from(corpus.text_id(i + min_tile_size).get());
            hash = hash
                .wrapping_mul(BASE)
                .wrapping_add(u64::from(corpus.text_id(i).get()))
                .wrapping_sub(pow.wrapping_mul(tail));
            hashes[i] = hash;
            full_window[i] = true;
            continue;
        }

        hash = 0;
        let floor = i.saturating_sub(min_tile_size - 1);
        while i > floor {
            let prev = i - 1;
            if corpus.is_end_of_unit(prev) {
                break;
            }
            hash = hash
                .wrapping_mul(BASE)
                .wrapping_add(u64::from(corpus.text_id(prev).get()));
            hashes[prev] = hash;
            i = prev;
        }
    }

    WindowHashes {
        hashes,
        full_window,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::CorpusBuilder;
    use crate::error::Result;

    fn direct_hash(corpus: &TokenCorpus, start: usize, w: usize) -> u64 {
        let mut hash = 0u64;
        let mut pow = 1u64;
        for k in 0..w {
            let idx = start + k;
            if corpus.is_end_of_unit(idx) {
                break;
            }
            hash = hash.wrapping_add(u64::from(corpus.text_id(idx).get()).wrapping_mul(pow));
            pow = pow.wrapping_mul(BASE);
        }
        hash
    }

    #[test]
    fn rolling_hash_matches_direct_window_hash() -> Result<()> {
        let mut builder = CorpusBuilder::new();
        builder.add_unit("a", "a b c d a b c d e".split(' ').map(|t| (t, 1)))?;
        builder.add_unit("b", "x a b c".split(' ').map(|t| (t, 1)))?;
        builder.add_unit("c", [("q", 1)])?;
        let corpus = builder.freeze()?;

        let w = 3;
        let hashes = hash_windows(&corpus, w);
        for i in 0..corpus.len() {
            if corpus.is_end_of_unit(i) {
                continue;
            }
            assert_eq!(hashes.hash(i), direct_hash(&corpus, i, w), "position {i}");
        }
        Ok(())
    }

    #[test]
    fn flags_positions_near_the_marker() -> Result<()> {
        let mut builder = CorpusBuilder::new();
        builder.add_unit("a", "a b c d e".split(' ').map(|t| (t, 1)))?;
        builder.add_unit("b", [("a", 1)])?;
        let corpus = builder.freeze()?;

        let hashes = hash_windows(&corpus, 3);
        let full: Vec<bool> = (0..hashes.len()).map(|i| hashes.has_full_window(i)).collect();
        assert_eq!(
            full,
            vec![true, true, true, false, false, false, false, false]
        );
        Ok(())
    }

    #[test]
    fn equal_windows_hash_equal() -> Result<()> {
        let mut builder = CorpusBuilder::new();
        builder.add_unit("a", "p q r s".split(' ').map(|t| (t, 1)))?;
        builder.add_unit("b", "z p q r".split(' ').map(|t| (t, 1)))?;
        let corpus = builder.freeze()?;

        let hashes = hash_windows(&corpus, 3);
        assert_eq!(hashes.hash(0), hashes.hash(6));
        assert_ne!(hashes.hash(0), hashes.hash(1));
        Ok(())
    }
}
