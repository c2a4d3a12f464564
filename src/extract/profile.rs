//! User-profile extraction.
//!
//! Two sources render a profile: the `users/UserInfoWinModule` card
//! (fetched by uid via the module connector) and the public
//! `user:info/<slug>` page (fetched directly by username). A profile whose
//! heading renders empty is a deleted account; that is the only
//! distinction the platform exposes.

use std::sync::LazyLock;

use scraper::{Html, Selector};

use super::dates::parse_odate;
use super::ids::first_number;
use crate::error::ExtractionError;
use crate::models::{UserInfo, UserProfile};

static HEADING: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h1").unwrap());
static ABOUT: LazyLock<Selector> = LazyLock::new(|| Selector::parse(".table tr em").unwrap());
static CARD_DATES: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".table tr .odate").unwrap());
static PAGE_DATE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".profile-box dd .odate").unwrap());
static DANGER_BUTTON: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("#page-content .btn-danger.pull-right").unwrap());

fn heading_text(document: &Html) -> String {
    document
        .select(&HEADING)
        .next()
        .map(|h| h.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

/// Extract a profile from the profile-card module.
///
/// The card does not echo the uid anywhere scrapeable, so the caller
/// passes through the uid it asked for. Active cards carry the about text
/// and two dates: index 0 is the site-wide join date, index 1 the
/// membership date of the wiki the card was fetched from.
pub fn parse_profile_card(document: &Html, uid: i64) -> Result<UserProfile, ExtractionError> {
    let username = heading_text(document);
    if username.is_empty() {
        return Ok(UserProfile::Deleted { uid });
    }

    let about = document
        .select(&ABOUT)
        .next()
        .map(|em| em.text().collect::<String>().trim().to_string())
        .filter(|text| !text.is_empty());

    let dates: Vec<String> = document
        .select(&CARD_DATES)
        .map(|el| el.text().collect::<String>())
        .collect();
    if dates.len() < 2 {
        return Err(ExtractionError::MissingNode(".table tr .odate"));
    }

    let user_since =
        parse_odate(&dates[0]).ok_or_else(|| ExtractionError::Date(dates[0].clone()))?;
    let member_since =
        parse_odate(&dates[1]).ok_or_else(|| ExtractionError::Date(dates[1].clone()))?;

    Ok(UserProfile::Active(UserInfo {
        uid,
        username,
        about,
        user_since: Some(user_since),
        member_since: Some(member_since),
    }))
}

/// Extract a profile from the public profile page.
///
/// The uid hides in the handler of the danger-styled contact button; a
/// page without a recoverable uid is an inconsistent state surfaced as a
/// hard error, not a partial record.
pub fn parse_profile_page(document: &Html) -> Result<UserProfile, ExtractionError> {
    let username = heading_text(document);

    let uid = document
        .select(&DANGER_BUTTON)
        .filter_map(|el| el.value().attr("onclick"))
        .find_map(first_number)
        .ok_or_else(|| ExtractionError::UidUnresolved {
            username: username.clone(),
        })?;

    if username.is_empty() {
        return Ok(UserProfile::Deleted { uid });
    }

    // The public page renders only the join date; about text and
    // membership dates live on the per-wiki card.
    let user_since = document
        .select(&PAGE_DATE)
        .next()
        .map(|el| el.text().collect::<String>())
        .and_then(|text| parse_odate(&text));

    Ok(UserProfile::Active(UserInfo {
        uid,
        username,
        about: None,
        user_since,
        member_since: None,
    }))
}

/// Canonical profile-page slug: lowercase, whitespace runs become hyphens.
pub fn username_slug(username: &str) -> String {
    username
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACTIVE_CARD: &str = r#"
        <div class="content modal-body">
          <h1>Resure</h1>
          <div class="table">
            <table>
              <tr><td>About:</td><td><em>Writes things.</em></td></tr>
              <tr><td>User since:</td><td><span class="odate">10 Aug 2008 10:14</span></td></tr>
              <tr><td>Member of this site:</td><td><span class="odate">27 Jun 2010 17:04</span></td></tr>
            </table>
          </div>
        </div>
    "#;

    #[test]
    fn test_active_card_populates_all_fields() {
        let document = Html::parse_fragment(ACTIVE_CARD);
        let profile = parse_profile_card(&document, 716422).unwrap();

        let UserProfile::Active(info) = profile else {
            panic!("expected active profile");
        };
        assert_eq!(info.uid, 716422);
        assert_eq!(info.username, "Resure");
        assert_eq!(info.about.as_deref(), Some("Writes things."));
        assert_eq!(
            info.user_since.unwrap().to_rfc3339(),
            "2008-08-10T10:14:00+00:00"
        );
        assert_eq!(
            info.member_since.unwrap().to_rfc3339(),
            "2010-06-27T17:04:00+00:00"
        );
    }

    #[test]
    fn test_empty_heading_means_deleted() {
        let document = Html::parse_fragment("<div><h1></h1></div>");
        let profile = parse_profile_card(&document, 12345).unwrap();
        assert_eq!(profile, UserProfile::Deleted { uid: 12345 });
    }

    #[test]
    fn test_missing_heading_means_deleted() {
        let document = Html::parse_fragment("<div></div>");
        let profile = parse_profile_card(&document, 12345).unwrap();
        assert!(profile.is_deleted());
        assert_eq!(profile.uid(), 12345);
    }

    #[test]
    fn test_active_card_without_dates_is_an_error() {
        let document = Html::parse_fragment("<div><h1>Resure</h1></div>");
        assert!(matches!(
            parse_profile_card(&document, 716422),
            Err(ExtractionError::MissingNode(_))
        ));
    }

    const PROFILE_PAGE: &str = r#"
        <div id="page-content">
          <h1>Resure</h1>
          <div class="profile-box">
            <dl>
              <dt>User since:</dt>
              <dd><span class="odate">10 Aug 2008 10:14</span></dd>
            </dl>
          </div>
          <a class="btn btn-danger pull-right"
             onclick="WIKIDOT.page.listeners.flagUser(716422); return false;">Report user</a>
        </div>
    "#;

    #[test]
    fn test_profile_page_recovers_uid_from_button() {
        let document = Html::parse_document(PROFILE_PAGE);
        let profile = parse_profile_page(&document).unwrap();

        let UserProfile::Active(info) = profile else {
            panic!("expected active profile");
        };
        assert_eq!(info.uid, 716422);
        assert_eq!(info.username, "Resure");
        assert!(info.about.is_none());
        assert!(info.member_since.is_none());
        assert_eq!(
            info.user_since.unwrap().to_rfc3339(),
            "2008-08-10T10:14:00+00:00"
        );
    }

    #[test]
    fn test_profile_page_without_uid_fails() {
        let document =
            Html::parse_document(r#"<div id="page-content"><h1>Resure</h1></div>"#);
        assert!(matches!(
            parse_profile_page(&document),
            Err(ExtractionError::UidUnresolved { username }) if username == "Resure"
        ));
    }

    #[test]
    fn test_username_slug_normalization() {
        assert_eq!(username_slug("Dr Gears"), "dr-gears");
        assert_eq!(username_slug("  Some   User  "), "some-user");
        assert_eq!(username_slug("Resure"), "resure");
    }
}
