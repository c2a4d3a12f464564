//! Page-id resolution from raw page HTML.
//!
//! Every rendered Wikidot page carries its numeric id in an inline script:
//! `WIKIREQUEST.info.pageId = 5195203;`.

use std::sync::LazyLock;

use regex::Regex;

static PAGE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"WIKIREQUEST\.info\.pageId = (\d+);").unwrap());

/// Scrape the page id out of raw HTML. `None` when the variable is absent;
/// callers that need the id for a follow-up module call must treat that as
/// a hard error.
pub fn find_page_id(html: &str) -> Option<i64> {
    PAGE_ID
        .captures(html)?
        .get(1)
        .and_then(|m| m.as_str().parse().ok())
}
