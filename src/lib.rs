//! wikidot-kit - client library for the Wikidot wiki platform.
//!
//! Wraps two very different interfaces behind one facade: the structured
//! XML-RPC API (page listings, page metadata, comments) and the internal
//! AJAX module connector, which returns server-rendered HTML fragments
//! that are scraped with CSS selectors (member lists, user profiles, vote
//! tallies, revision history). A third, minor path fetches raw page HTML
//! to recover the numeric page id from an inline script variable.
//!
//! ```no_run
//! use wikidot_kit::WikidotKit;
//!
//! # async fn run() -> Result<(), wikidot_kit::Error> {
//! let kit = WikidotKit::new("api-token")?;
//! let page = kit.fetch_page("scp-ru", "scp-173").await?;
//! println!("{}: rating {}", page.title, page.rating);
//! let votes = kit.fetch_page_votes("http://scpfoundation.net", "scp-173").await?;
//! println!("{} votes", votes.len());
//! # Ok(())
//! # }
//! ```
//!
//! RPC operations address a wiki by site slug; scraping operations address
//! it by base URL. The two schemes are intentionally separate parameters
//! because the underlying transports require different shapes.

pub mod error;
pub mod extract;
pub mod models;
pub mod rate_limit;
pub mod transport;

mod kit;

pub use error::{Error, ExtractionError, TransportError};
pub use kit::{KitConfig, WikidotKit};
pub use models::{
    CommentRecord, MemberEntry, PageRecord, RevisionMeta, UserInfo, UserProfile, VoteEntry,
    UNKNOWN_AUTHOR,
};
pub use rate_limit::{RateLimitConfig, RateLimiter};

/// Client identifier sent as the HTTP user agent and as the RPC basic-auth
/// user.
pub(crate) const CLIENT_IDENT: &str = concat!("wikidot-kit/", env!("CARGO_PKG_VERSION"));
