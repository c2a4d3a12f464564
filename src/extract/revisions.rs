//! Revision-history extraction.
//!
//! The history module renders a `.page-history` table, newest revision
//! first. Column 1 holds the revision number, column 6 the date, column 7
//! the edit description; the revision id hides in a `showVersion(<id>)`
//! handler and the author uid in the user link's handler. Rows with no
//! recoverable revision id are skipped with a warning; the returned list
//! is sorted ascending by revision number.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use tracing::warn;

use super::dates::parse_odate;
use super::ids::first_number;
use crate::error::ExtractionError;
use crate::models::{RevisionMeta, UNKNOWN_AUTHOR};

static HISTORY_ROW: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".page-history tr").unwrap());
static CELL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td").unwrap());
static USER_LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".printuser a").unwrap());
static ANCHOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a").unwrap());
static PAGE_SOURCE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".page-source").unwrap());

const NUMBER_CELL: usize = 0;
const DATE_CELL: usize = 5;
const DESCRIPTION_CELL: usize = 6;

/// Extract revision rows, skipping the header row and any row that cannot
/// yield a complete record.
pub fn parse_revision_rows(document: &Html) -> Vec<RevisionMeta> {
    let mut revisions = Vec::new();

    for row in document.select(&HISTORY_ROW).skip(1) {
        match parse_row(&row) {
            Ok(meta) => revisions.push(meta),
            Err(reason) => warn!("skipping revision row: {}", reason),
        }
    }

    revisions.sort_by_key(|revision| revision.number);
    revisions
}

fn parse_row(row: &ElementRef) -> Result<RevisionMeta, String> {
    let cells: Vec<ElementRef> = row.select(&CELL).collect();
    if cells.len() <= DESCRIPTION_CELL {
        return Err(format!("expected 7 cells, found {}", cells.len()));
    }

    let number_text = cells[NUMBER_CELL].text().collect::<String>();
    let number =
        first_number(&number_text).ok_or_else(|| format!("no revision number in {number_text:?}"))?;

    let id = row
        .select(&ANCHOR)
        .filter_map(|a| a.value().attr("onclick"))
        .find(|handler| handler.contains("showVersion"))
        .and_then(first_number)
        .ok_or_else(|| format!("no showVersion handler on revision {number}"))?;

    let uid = row
        .select(&USER_LINK)
        .filter_map(|a| a.value().attr("onclick"))
        .find_map(first_number)
        .unwrap_or(UNKNOWN_AUTHOR);

    let date_text = cells[DATE_CELL].text().collect::<String>();
    let date = parse_odate(&date_text)
        .ok_or_else(|| format!("unparseable date {date_text:?} on revision {number}"))?;

    let description = cells[DESCRIPTION_CELL]
        .text()
        .collect::<String>()
        .trim()
        .to_string();

    Ok(RevisionMeta {
        number,
        id,
        uid,
        date,
        description,
    })
}

/// Extract one revision's wiki source from the page-source module: the
/// text of the source container, percent-unescaped, verbatim.
pub fn parse_revision_source(document: &Html) -> Result<String, ExtractionError> {
    let container = document
        .select(&PAGE_SOURCE)
        .next()
        .ok_or(ExtractionError::MissingNode(".page-source"))?;

    let text = container.text().collect::<String>();
    Ok(percent_unescape(&text))
}

fn percent_unescape(text: &str) -> String {
    urlencoding::decode(text)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| text.to_string())
}
