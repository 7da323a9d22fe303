//! "did you mean ...?" hints for unknown names.

fn edit_distance(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut row: Vec<usize> = (0..=b.len()).collect();

    for (i, ca) in a.chars().enumerate() {
        let mut diag = row[0];
        row[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let above = row[j + 1];
            row[j + 1] = if ca == *cb {
                diag
            } else {
                1 + diag.min(above).min(row[j])
            };
            diag = above;
        }
    }
    row[b.len()]
}

/// Closest candidate to `input`, if any is within `max(1, min(2, len/2))`
/// edits. Ties go to the lexicographically smallest name.
pub fn suggest<'c>(input: &str, candidates: impl IntoIterator<Item = &'c str>) -> Option<String> {
    let threshold = (input.chars().count() / 2).clamp(1, 2);
    candidates
        .into_iter()
        .filter(|c| *c != input)
        .map(|c| (edit_distance(input, c), c))
        .filter(|(d, _)| *d <= threshold)
        .min()
        .map(|(_, c)| c.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_counts_single_edits() {
        assert_eq!(edit_distance("kitten", "sitting"), 3);
        assert_eq!(edit_distance("", "abc"), 3);
        assert_eq!(edit_distance("same", "same"), 0);
    }

    #[test]
    fn picks_nearest_then_smallest() {
        assert_eq!(suggest("totl", ["total", "tota", "other"]), Some("tota".to_string()));
        assert_eq!(suggest("ab", ["ac", "aa"]), Some("aa".to_string()));
    }

    #[test]
    fn far_names_are_not_suggested() {
        assert_eq!(suggest("does_not_exist", ["greet", "sum"]), None);
        assert_eq!(suggest("x", std::iter::empty()), None);
    }
}
