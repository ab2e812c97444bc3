//! Command selection: operator text → candidate indices.

/// Map an operator's selection onto 1-based indices into a list of `count`
/// candidates.
///
/// `all`/`a` (any case) selects everything; an empty string selects nothing.
/// Otherwise the text is a comma-separated list of indices. Tokens that are
/// not integers or fall outside `1..=count` contribute nothing. The result
/// is deduplicated and ascending.
pub fn parse_selection(count: usize, selection: &str) -> Vec<usize> {
    let selection = selection.trim();
    if selection.eq_ignore_ascii_case("all") || selection.eq_ignore_ascii_case("a") {
        return (1..=count).collect();
    }

    let mut indices: Vec<usize> = selection
        .split(',')
        .filter_map(|token| token.trim().parse::<i64>().ok())
        .filter_map(|n| usize::try_from(n).ok())
        .filter(|n| (1..=count).contains(n))
        .collect();
    indices.sort_unstable();
    indices.dedup();
    indices
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_selects_everything() {
        assert_eq!(parse_selection(3, "all"), vec![1, 2, 3]);
        assert_eq!(parse_selection(3, " ALL "), vec![1, 2, 3]);
        assert_eq!(parse_selection(2, "a"), vec![1, 2]);
        assert_eq!(parse_selection(0, "all"), Vec::<usize>::new());
    }

    #[test]
    fn empty_selects_nothing() {
        assert!(parse_selection(5, "").is_empty());
        assert!(parse_selection(5, "   ").is_empty());
    }

    #[test]
    fn drops_invalid_tokens_dedups_and_sorts() {
        assert_eq!(parse_selection(3, "5,1,1,x,2"), vec![1, 2]);
    }

    #[test]
    fn tolerates_whitespace_and_empty_tokens() {
        assert_eq!(parse_selection(4, " 3 , ,1,, 4 "), vec![1, 3, 4]);
    }

    #[test]
    fn rejects_zero_and_negative() {
        assert_eq!(parse_selection(3, "0,-1,3"), vec![3]);
    }

    #[test]
    fn ranges_are_not_expanded() {
        assert_eq!(parse_selection(5, "1-3,5"), vec![5]);
    }

    #[test]
    fn overflowing_numbers_are_ignored() {
        assert_eq!(parse_selection(2, "99999999999999999999999,2"), vec![2]);
    }
}
