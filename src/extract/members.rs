//! Member-list extraction.
//!
//! The membership module renders one page of `.printuser` rows plus a
//! pager. Page count comes from the pager's second-to-last entry; each
//! row's last user link carries the username as text and the uid in its
//! `onclick` handler.

use std::sync::LazyLock;

use scraper::{Html, Selector};

use super::ids::first_number;
use crate::error::ExtractionError;
use crate::models::MemberEntry;

static PAGER_LAST_TARGET: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".pager .target:nth-last-child(2)").unwrap());
static PRINTUSER: LazyLock<Selector> = LazyLock::new(|| Selector::parse(".printuser").unwrap());
static ANCHOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a").unwrap());

/// Total page count from the listing's pager.
///
/// A missing pager means the listing fits on one page. A pager whose count
/// text is not a number is a hard error; guessing would truncate the
/// member list silently.
pub fn parse_total_pages(document: &Html) -> Result<usize, ExtractionError> {
    let Some(target) = document.select(&PAGER_LAST_TARGET).next() else {
        return Ok(1);
    };

    let text = target.text().collect::<String>();
    let trimmed = text.trim();
    trimmed
        .parse()
        .map_err(|_| ExtractionError::Pager(trimmed.to_string()))
}

/// Extract all member rows from one listing page, in source order. No
/// de-duplication, no sorting.
pub fn parse_member_rows(document: &Html) -> Result<Vec<MemberEntry>, ExtractionError> {
    let mut members = Vec::new();

    for container in document.select(&PRINTUSER) {
        // The last link holds the username; earlier links wrap the avatar.
        let link = container
            .select(&ANCHOR)
            .last()
            .ok_or_else(|| ExtractionError::MemberRow("row without user link".to_string()))?;

        let username = link.text().collect::<String>().trim().to_string();
        if username.is_empty() {
            return Err(ExtractionError::MemberRow(
                "user link without username text".to_string(),
            ));
        }

        let uid = link
            .value()
            .attr("onclick")
            .and_then(first_number)
            .ok_or_else(|| {
                ExtractionError::MemberRow(format!("no uid in handler for {username:?}"))
            })?;

        members.push(MemberEntry { username, uid });
    }

    Ok(members)
}
