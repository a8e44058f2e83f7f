pub(crate) fn fnv1a64_u32(values: &[u32]) -> u64 {
    const FNV_OFFSET_BASIS: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;

    let mut hash = FNV_OFFSET_BASIS;
    for &value in values {
        for b in value.to_le_bytes() {
            hash ^= u64::from(b);
            hash = hash.wrapping_mul(FNV_PRIME);
        }
    }
    hash
}

/// Lines `start_line..=end_line` (1-based) of `text` joined by `\n`, or
/// `None` when the range is empty or starts past the last line.
pub(crate) fn slice_lines(text: &str, start_line: u32, end_line: u32) -> Option<String> {
    if start_line == 0 || end_line < start_line {
        return None;
    }

    let mut out = String::new();
    let mut found = false;
    for (idx, line) in text.lines().enumerate() {
        let line_no = (idx as u32) + 1;
        if line_no < start_line {
            continue;
        }
        if line_no > end_line {
            break;
        }
        if found {
            out.push('\n');
        }
        out.push_str(line);
        found = true;
    }
    found.then_some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slices_inclusive_line_ranges() {
        let text = "one\ntwo\r\nthree\nfour";
        assert_eq!(slice_lines(text, 2, 3).as_deref(), Some("two\nthree"));
        assert_eq!(slice_lines(text, 4, 9).as_deref(), Some("four"));
        assert_eq!(slice_lines(text, 5, 6), None);
        assert_eq!(slice_lines(text, 0, 1), None);
    }

    #[test]
    fn fnv_depends_on_order() {
        assert_ne!(fnv1a64_u32(&[1, 2]), fnv1a64_u32(&[2, 1]));
        assert_eq!(fnv1a64_u32(&[]), 0xcbf29ce484222325);
    }
}
