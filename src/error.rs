//! Error types for wikidot-kit.

use thiserror::Error;

/// Top-level error for all public operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Local configuration problem, fatal at construction.
    #[error("configuration error: {0}")]
    Config(String),

    /// Network or protocol failure on one of the three transports.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Remote fault reported by the XML-RPC endpoint.
    #[error("rpc fault {code}: {message}")]
    Rpc { code: i32, message: String },

    /// Expected response shape was absent.
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Transport(TransportError::Http(err))
    }
}

/// Failures at the HTTP layer. Never retried here; callers add their own
/// retry or timeout policy on top.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status} from {url}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },

    /// The AJAX module connector returned something other than the
    /// `{status: "ok", body: ...}` JSON envelope.
    #[error("malformed module response: {0}")]
    Envelope(String),

    /// The XML-RPC endpoint returned XML that does not parse as a
    /// `methodResponse`.
    #[error("malformed rpc response: {0}")]
    Xml(String),
}

/// Failures while converting a fetched document or RPC payload into typed
/// records.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// No `WIKIREQUEST.info.pageId` variable in the page HTML.
    #[error("page id not found in {url}")]
    PageIdUnresolved { url: String },

    /// A profile page rendered a username but no numeric user id.
    #[error("cannot extract uid for user {username}")]
    UidUnresolved { username: String },

    /// An element the extractor depends on is missing entirely.
    #[error("expected element not found: {0}")]
    MissingNode(&'static str),

    /// The member-list pager exists but its page count is not a number.
    #[error("unreadable pager page count: {0:?}")]
    Pager(String),

    /// A member row without a username or a recoverable uid.
    #[error("malformed member row: {0}")]
    MemberRow(String),

    /// A vote row without a recoverable uid or a vote glyph.
    #[error("malformed vote row: {0}")]
    VoteRow(String),

    /// A rendered date that does not parse.
    #[error("unparseable date: {0:?}")]
    Date(String),

    /// An RPC payload that does not match the expected record shape.
    #[error("unexpected rpc payload: {0}")]
    Payload(String),
}
