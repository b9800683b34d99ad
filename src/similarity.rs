//! Ratcliff/Obershelp string similarity
//!
//! Finds the longest common block of two strings, then recurses on the
//! unmatched pieces to the left and right of it. The ratio is
//! `2 * matched / (len(a) + len(b))`, so identical strings score 1.0 and
//! strings with no character in common score 0.0.

/// Similarity ratio of two strings in `[0.0, 1.0]`
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }

    2.0 * matching_characters(&a, &b) as f64 / total as f64
}

/// Total size of all matching blocks between `a` and `b`
fn matching_characters(a: &[char], b: &[char]) -> usize {
    let mut pending = vec![(0, a.len(), 0, b.len())];
    let mut matched = 0;

    while let Some((alo, ahi, blo, bhi)) = pending.pop() {
        let (i, j, size) = longest_match(a, b, alo, ahi, blo, bhi);
        if size == 0 {
            continue;
        }
        matched += size;

        if alo < i && blo < j {
            pending.push((alo, i, blo, j));
        }
        if i + size < ahi && j + size < bhi {
            pending.push((i + size, ahi, j + size, bhi));
        }
    }

    matched
}

/// Longest common block of `a[alo..ahi]` and `b[blo..bhi]`
///
/// Returns `(start_in_a, start_in_b, size)`. Among equally long blocks the
/// one starting earliest in `a` wins, then earliest in `b`.
fn longest_match(
    a: &[char],
    b: &[char],
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let mut best = (alo, blo, 0);
    // run[j - blo + 1] = length of the block ending at (i, j)
    let mut previous = vec![0usize; bhi - blo + 1];

    for i in alo..ahi {
        let mut current = vec![0usize; bhi - blo + 1];
        for j in blo..bhi {
            if a[i] == b[j] {
                let size = previous[j - blo] + 1;
                current[j - blo + 1] = size;
                if size > best.2 {
                    best = (i + 1 - size, j + 1 - size, size);
                }
            }
        }
        previous = current;
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_identical_strings() {
        assert!(close(ratio("EGG WAFFLE", "EGG WAFFLE"), 1.0));
        assert!(close(ratio("", ""), 1.0));
    }

    #[test]
    fn test_disjoint_strings() {
        assert!(close(ratio("XYZ", "EGG TART"), 0.0));
        assert!(close(ratio("", "CHESTNUT"), 0.0));
    }

    #[test]
    fn test_missing_space_still_close() {
        // FISH + BALL = 8 matched out of 8 + 9 characters
        assert!(close(ratio("FISHBALL", "FISH BALL"), 16.0 / 17.0));
    }

    #[test]
    fn test_known_ratios() {
        assert!(close(ratio("ABCD", "BCDE"), 0.75));
        assert!(close(ratio("ABXCD", "ABCD"), 8.0 / 9.0));
    }

    #[test]
    fn test_blocks_are_not_crossed() {
        // "AB" and "BA" share one character but only one block can match
        assert!(close(ratio("AB", "BA"), 0.5));
    }

    #[test]
    fn test_unrelated_answers_stay_below_threshold() {
        assert!(ratio("EGG TART", "EGG WAFFLE") < 0.7);
        assert!(ratio("SIU MAI", "STINKY TOFU") < 0.7);
    }
}
