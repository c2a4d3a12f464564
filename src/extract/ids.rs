//! Numeric id recovery from handler text.
//!
//! Wikidot embeds user and revision ids in inline `onclick` handlers like
//! `WIKIDOT.page.listeners.userInfo(716422); return false;` and
//! `showVersion(15462778)`. The first run of digits in the handler text is
//! the id.

use std::sync::LazyLock;

use regex::Regex;

static DIGIT_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());

/// First run of digits in `text`, if any.
///
/// Also used for table cells whose text carries trailing punctuation
/// (`"37."` parses as 37).
pub fn first_number(text: &str) -> Option<i64> {
    DIGIT_RUN.find(text)?.as_str().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_number_from_user_info_handler() {
        assert_eq!(
            first_number("WIKIDOT.page.listeners.userInfo(716422); return false;"),
            Some(716422)
        );
    }

    #[test]
    fn test_first_number_from_show_version_handler() {
        assert_eq!(first_number("showVersion(15462778)"), Some(15462778));
    }

    #[test]
    fn test_first_number_from_cell_text() {
        assert_eq!(first_number("37."), Some(37));
        assert_eq!(first_number(" 0 "), Some(0));
    }

    #[test]
    fn test_first_number_absent() {
        assert_eq!(first_number("return false;"), None);
        assert_eq!(first_number(""), None);
    }

    #[test]
    fn test_first_number_takes_first_run() {
        assert_eq!(first_number("resize(640, 480)"), Some(640));
    }
}
