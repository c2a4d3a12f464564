//! Typed records produced by the extraction layer.
//!
//! Every record is a transient, request-scoped value: constructed fresh from
//! a fetched document or RPC payload and handed to the caller. Nothing is
//! cached or mutated after construction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Page metadata and content, produced verbatim from the `pages.get_one`
/// RPC call. Timestamps are kept as the strings the API returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    pub fullname: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub created_by: String,
    #[serde(default)]
    pub updated_at: String,
    #[serde(default)]
    pub updated_by: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub title_shown: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub rating: i64,
    /// Revision count, not the revision list.
    #[serde(default)]
    pub revisions: i64,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub html: String,
    #[serde(default)]
    pub children: i64,
    #[serde(default)]
    pub comments: i64,
    #[serde(default)]
    pub commented_at: Option<String>,
    #[serde(default)]
    pub commented_by: Option<String>,
}

/// A user profile as scraped from the profile card module or the public
/// profile page.
///
/// A profile is either active or deleted; the variant is decided by whether
/// the page renders a username heading. There is no third state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum UserProfile {
    Active(UserInfo),
    Deleted { uid: i64 },
}

impl UserProfile {
    /// Numeric user id, present in both states.
    pub fn uid(&self) -> i64 {
        match self {
            UserProfile::Active(info) => info.uid,
            UserProfile::Deleted { uid } => *uid,
        }
    }

    pub fn is_deleted(&self) -> bool {
        matches!(self, UserProfile::Deleted { .. })
    }
}

/// Fields of an active user profile.
///
/// The profile-card module populates all fields; the by-username profile
/// page carries no about text and no membership date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserInfo {
    pub uid: i64,
    pub username: String,
    pub about: Option<String>,
    pub user_since: Option<DateTime<Utc>>,
    pub member_since: Option<DateTime<Utc>>,
}

/// One row of a site's member listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberEntry {
    pub username: String,
    pub uid: i64,
}

/// One row of a page's revision-history table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevisionMeta {
    /// Revision number shown in the table; 0 is the earliest revision.
    pub number: i64,
    /// Internal revision id, usable with the page-source module.
    pub id: i64,
    /// Author uid, or [`UNKNOWN_AUTHOR`] when the author link carries no id.
    pub uid: i64,
    pub date: DateTime<Utc>,
    pub description: String,
}

/// Sentinel uid for revision rows whose author link is unrecoverable.
pub const UNKNOWN_AUTHOR: i64 = -1;

/// One voter's rating of a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoteEntry {
    pub uid: i64,
    /// Vote glyph as rendered by the site: `+`, `-`, or a short numeric
    /// glyph on deployments with numeric ratings.
    pub vote: String,
}

/// A forum post attached to a page, fetched via `posts.get`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentRecord {
    pub id: i64,
    #[serde(default)]
    pub fullname: String,
    /// Parent post id, absent for top-level comments.
    #[serde(default, deserialize_with = "deserialize_reply_to")]
    pub reply_to: Option<i64>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub html: String,
    #[serde(default)]
    pub created_by: String,
    #[serde(default)]
    pub created_at: String,
}

/// The API is loose about how "no parent" is represented; accept null, an
/// integer, or a digit string.
fn deserialize_reply_to<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_page_record_tolerates_missing_fields() {
        let page: PageRecord = serde_json::from_value(json!({
            "fullname": "scp-173",
            "title": "SCP-173",
            "rating": 1437,
            "tags": ["euclid", "scp"],
        }))
        .unwrap();
        assert_eq!(page.fullname, "scp-173");
        assert_eq!(page.rating, 1437);
        assert_eq!(page.tags, vec!["euclid", "scp"]);
        assert!(page.content.is_empty());
        assert!(page.commented_at.is_none());
    }

    #[test]
    fn test_reply_to_accepts_int_string_and_null() {
        let with_int: CommentRecord =
            serde_json::from_value(json!({"id": 1, "reply_to": 42})).unwrap();
        assert_eq!(with_int.reply_to, Some(42));

        let with_string: CommentRecord =
            serde_json::from_value(json!({"id": 2, "reply_to": "42"})).unwrap();
        assert_eq!(with_string.reply_to, Some(42));

        let with_null: CommentRecord =
            serde_json::from_value(json!({"id": 3, "reply_to": null})).unwrap();
        assert_eq!(with_null.reply_to, None);

        let absent: CommentRecord = serde_json::from_value(json!({"id": 4})).unwrap();
        assert_eq!(absent.reply_to, None);
    }

    #[test]
    fn test_user_profile_uid_in_both_states() {
        let deleted = UserProfile::Deleted { uid: 716422 };
        assert_eq!(deleted.uid(), 716422);
        assert!(deleted.is_deleted());

        let active = UserProfile::Active(UserInfo {
            uid: 716422,
            username: "Resure".to_string(),
            about: None,
            user_since: None,
            member_since: None,
        });
        assert_eq!(active.uid(), 716422);
        assert!(!active.is_deleted());
    }
}
