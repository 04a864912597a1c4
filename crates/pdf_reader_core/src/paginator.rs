//! crates/pdf_reader_core/src/paginator.rs
//!
//! Splits extracted text into fixed-size word pages and computes the valid
//! moves between them.

/// Words per page unless configured otherwise.
pub const DEFAULT_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NavigationError {
    #[error("page index {index} is outside a document of {page_count} pages")]
    OutOfRange { index: usize, page_count: usize },
    #[error("invalid page number: {0:?}")]
    InvalidPageNumber(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Previous,
    Next,
}

/// Splits `text` on whitespace and regroups the words into pages of `page_size` words.
///
/// The result is never empty: text without any words yields a single empty page.
/// A `page_size` of zero is treated as one.
pub fn paginate(text: &str, page_size: usize) -> Vec<String> {
    let page_size = page_size.max(1);
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return vec![String::new()];
    }
    words.chunks(page_size).map(|chunk| chunk.join(" ")).collect()
}

/// Moves one page in `direction`, refusing to leave `[0, page_count - 1]`.
pub fn navigate(page_count: usize, current: usize, direction: Direction) -> Result<usize, NavigationError> {
    let out_of_range = |index| NavigationError::OutOfRange { index, page_count };
    if current >= page_count {
        return Err(out_of_range(current));
    }
    match direction {
        Direction::Previous => current.checked_sub(1).ok_or_else(|| out_of_range(current)),
        Direction::Next => {
            let next = current + 1;
            if next < page_count {
                Ok(next)
            } else {
                Err(out_of_range(next))
            }
        }
    }
}

/// Converts a one-based page number into a page index.
pub fn goto_page(page_count: usize, requested: usize) -> Result<usize, NavigationError> {
    if (1..=page_count).contains(&requested) {
        Ok(requested - 1)
    } else {
        Err(NavigationError::InvalidPageNumber(requested.to_string()))
    }
}

/// Parses a page number typed by the user and converts it into a page index.
pub fn parse_page_number(input: &str, page_count: usize) -> Result<usize, NavigationError> {
    let trimmed = input.trim();
    let requested = trimmed
        .parse::<usize>()
        .map_err(|_| NavigationError::InvalidPageNumber(trimmed.to_string()))?;
    goto_page(page_count, requested)
}

pub fn has_previous(index: usize) -> bool {
    index > 0
}

pub fn has_next(index: usize, page_count: usize) -> bool {
    index + 1 < page_count
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(n: usize) -> String {
        (0..n).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn empty_text_yields_single_empty_page() {
        assert_eq!(paginate("", 100), vec![String::new()]);
        assert_eq!(paginate(" \n\t ", 100), vec![String::new()]);
    }

    #[test]
    fn pages_are_rejoined_with_single_spaces() {
        let pages = paginate("one  two\nthree\x0Cfour", 3);
        assert_eq!(pages, vec!["one two three".to_string(), "four".to_string()]);
    }

    #[test]
    fn zero_page_size_is_treated_as_one() {
        assert_eq!(paginate("a b", 0).len(), 2);
    }

    #[test]
    fn page_count_is_ceiling_of_word_count() {
        for (n, size, expected) in [(1, 100, 1), (100, 100, 1), (101, 100, 2), (250, 100, 3), (7, 2, 4)] {
            assert_eq!(paginate(&words(n), size).len(), expected, "{n} words / {size}");
        }
    }

    #[test]
    fn tokens_survive_pagination_in_order() {
        let text = "  Lorem ipsum\tdolor sit\n\namet, consectetur adipiscing elit  ";
        let pages = paginate(text, 3);
        let rejoined: Vec<&str> = pages.iter().flat_map(|p| p.split_whitespace()).collect();
        let original: Vec<&str> = text.split_whitespace().collect();
        assert_eq!(rejoined, original);
    }

    #[test]
    fn navigate_moves_within_bounds() {
        assert_eq!(navigate(3, 1, Direction::Previous), Ok(0));
        assert_eq!(navigate(3, 1, Direction::Next), Ok(2));
    }

    #[test]
    fn navigate_rejects_crossing_a_boundary() {
        assert!(matches!(
            navigate(3, 0, Direction::Previous),
            Err(NavigationError::OutOfRange { .. })
        ));
        assert_eq!(
            navigate(3, 2, Direction::Next),
            Err(NavigationError::OutOfRange { index: 3, page_count: 3 })
        );
        assert!(navigate(1, 0, Direction::Next).is_err());
    }

    #[test]
    fn navigate_rejects_a_stale_index() {
        assert_eq!(
            navigate(2, 5, Direction::Previous),
            Err(NavigationError::OutOfRange { index: 5, page_count: 2 })
        );
    }

    #[test]
    fn previous_then_next_round_trips_on_interior_pages() {
        let count = 10;
        for index in 1..count - 1 {
            let back = navigate(count, index, Direction::Previous).unwrap();
            assert_eq!(navigate(count, back, Direction::Next), Ok(index));
        }
    }

    #[test]
    fn goto_page_validates_one_based_numbers() {
        assert_eq!(goto_page(3, 1), Ok(0));
        assert_eq!(goto_page(3, 3), Ok(2));
        assert!(goto_page(3, 0).is_err());
        assert!(goto_page(3, 4).is_err());
    }

    #[test]
    fn parse_page_number_rejects_non_numeric_input() {
        assert_eq!(parse_page_number(" 2 \n", 3), Ok(1));
        assert_eq!(
            parse_page_number("two", 3),
            Err(NavigationError::InvalidPageNumber("two".to_string()))
        );
        assert!(parse_page_number("-1", 3).is_err());
        assert!(parse_page_number("", 3).is_err());
    }

    #[test]
    fn boundary_predicates() {
        assert!(!has_previous(0));
        assert!(has_previous(1));
        assert!(has_next(0, 2));
        assert!(!has_next(1, 2));
        assert!(!has_next(0, 1));
    }
}
