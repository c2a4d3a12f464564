//! Vote-list extraction.
//!
//! The ratings module renders one `span.printuser` per voter followed by a
//! class-less span holding the vote glyph. Extraction walks row by row,
//! pairing each voter with the glyph from its own row; the two are never
//! collected in separate passes, so positional misalignment cannot happen.
//! A row missing either half is a hard error.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use super::ids::first_number;
use crate::error::ExtractionError;
use crate::models::VoteEntry;

static VOTER: LazyLock<Selector> = LazyLock::new(|| Selector::parse("span.printuser").unwrap());
static ANCHOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a").unwrap());

/// Extract `(uid, vote)` pairs in source order.
pub fn parse_vote_rows(document: &Html) -> Result<Vec<VoteEntry>, ExtractionError> {
    let mut votes = Vec::new();

    for voter in document.select(&VOTER) {
        let uid = voter
            .select(&ANCHOR)
            .filter_map(|a| a.value().attr("onclick"))
            .find_map(first_number)
            .ok_or_else(|| ExtractionError::VoteRow("voter without uid handler".to_string()))?;

        let vote = row_glyph(&voter)
            .ok_or_else(|| ExtractionError::VoteRow(format!("no vote glyph for uid {uid}")))?;

        if !is_vote_glyph(&vote) {
            return Err(ExtractionError::VoteRow(format!(
                "unexpected vote glyph {vote:?} for uid {uid}"
            )));
        }

        votes.push(VoteEntry { uid, vote });
    }

    Ok(votes)
}

/// The glyph span of the voter's own row: the next class-less span
/// sibling. Hitting another voter first means this row has no glyph.
fn row_glyph(voter: &ElementRef) -> Option<String> {
    for sibling in voter.next_siblings() {
        let Some(element) = ElementRef::wrap(sibling) else {
            continue;
        };
        if element.value().name() != "span" {
            continue;
        }
        if element.value().classes().any(|class| class == "printuser") {
            return None;
        }
        if element.value().attr("class").is_none() {
            let text = element.text().collect::<String>().trim().to_string();
            return (!text.is_empty()).then_some(text);
        }
    }
    None
}

/// The glyph alphabet: `+`, `-`, or a short numeric rating on deployments
/// with five-star style widgets.
fn is_vote_glyph(text: &str) -> bool {
    matches!(text, "+" | "-")
        || (text.len() <= 2 && !text.is_empty() && text.chars().all(|c| c.is_ascii_digit()))
}
