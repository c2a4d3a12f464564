//! High-level facade over the transports and the extraction layer.

use std::time::Duration;

use scraper::Html;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::error::{Error, ExtractionError};
use crate::extract::{comments, members, page_id, profile, revisions, votes};
use crate::models::{CommentRecord, MemberEntry, PageRecord, RevisionMeta, UserProfile, VoteEntry};
use crate::rate_limit::{RateLimitConfig, RateLimiter};
use crate::transport::{AjaxConnector, RawPageFetcher, RpcGateway};
use crate::CLIENT_IDENT;

/// Base URL of the central wikidot.com site; profile pages live here.
const WIKIDOT_ENDPOINT: &str = "https://www.wikidot.com";

/// Hard API ceiling on ids per `posts.get` call.
const COMMENT_BATCH_SIZE: usize = 10;

/// Rows requested from the history module; its per-page cap.
const REVISIONS_PER_PAGE: u32 = 3000;

/// Client configuration. Defaults suit interactive use; long-running bulk
/// jobs should enable rate limiting.
#[derive(Debug, Clone)]
pub struct KitConfig {
    /// Per-request timeout applied to every transport.
    pub timeout: Duration,
    pub user_agent: String,
    /// When set, RPC calls go through a bounded-concurrency limiter.
    pub rate_limit: Option<RateLimitConfig>,
}

impl Default for KitConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: CLIENT_IDENT.to_string(),
            rate_limit: None,
        }
    }
}

impl KitConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_rate_limit(mut self, config: RateLimitConfig) -> Self {
        self.rate_limit = Some(config);
        self
    }
}

/// Client for one Wikidot installation's API and module connector.
///
/// Operations take either a site slug (RPC: `"scp-ru"`) or a wiki base URL
/// (scraping: `"http://scpfoundation.net"`); the two addressing modes are
/// deliberately distinct because the underlying transports are.
#[derive(Clone)]
pub struct WikidotKit {
    ajax: AjaxConnector,
    raw: RawPageFetcher,
    rpc: RpcGateway,
}

impl WikidotKit {
    /// Create a client with default configuration.
    pub fn new(token: &str) -> Result<Self, Error> {
        Self::with_config(token, KitConfig::default())
    }

    /// Create a client with explicit configuration.
    pub fn with_config(token: &str, config: KitConfig) -> Result<Self, Error> {
        if token.trim().is_empty() {
            return Err(Error::Config("auth token is required".to_string()));
        }

        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(|e| Error::Config(e.to_string()))?;

        let limiter = config.rate_limit.map(RateLimiter::new);

        Ok(Self {
            ajax: AjaxConnector::new(client.clone()),
            raw: RawPageFetcher::new(client.clone()),
            rpc: RpcGateway::new(client, token.to_string(), limiter),
        })
    }

    // -- RPC-backed operations ---------------------------------------------

    /// List every page fullname on a site.
    pub async fn fetch_pages_list(&self, wiki: &str) -> Result<Vec<String>, Error> {
        info!("fetching pages list for {}", wiki);
        let payload = self.rpc.call("pages.select", json!({ "site": wiki })).await?;
        serde_json::from_value(payload)
            .map_err(|e| ExtractionError::Payload(e.to_string()))
            .inspect_err(|e| warn!("pages list payload: {}", e))
            .map_err(Error::from)
    }

    /// Fetch one page's metadata and content.
    pub async fn fetch_page(&self, wiki: &str, name: &str) -> Result<PageRecord, Error> {
        info!("fetching page {}/{}", wiki, name);
        let payload = self
            .rpc
            .call("pages.get_one", json!({ "site": wiki, "page": name }))
            .await?;
        serde_json::from_value(payload)
            .map_err(|e| ExtractionError::Payload(e.to_string()))
            .inspect_err(|e| warn!("page payload: {}", e))
            .map_err(Error::from)
    }

    /// Fetch all comments on a page: one id-selection call, then full
    /// records in batches of at most [`COMMENT_BATCH_SIZE`] ids, issued
    /// sequentially and concatenated in request order.
    pub async fn fetch_page_comments(
        &self,
        wiki: &str,
        name: &str,
    ) -> Result<Vec<CommentRecord>, Error> {
        info!("fetching comments for {}/{}", wiki, name);
        let payload = self
            .rpc
            .call("posts.select", json!({ "site": wiki, "page": name }))
            .await?;
        let ids = comments::comment_ids(&payload)
            .inspect_err(|e| warn!("comment id payload: {}", e))?;
        debug!("page {}/{} has {} comments", wiki, name, ids.len());

        let mut all = Vec::with_capacity(ids.len());
        for batch in ids.chunks(COMMENT_BATCH_SIZE) {
            let posts: Vec<String> = batch.iter().map(|id| id.to_string()).collect();
            let payload = self
                .rpc
                .call("posts.get", json!({ "site": wiki, "posts": posts }))
                .await?;
            all.extend(
                comments::flatten_comment_batch(payload)
                    .inspect_err(|e| warn!("comment batch payload: {}", e))?,
            );
        }
        Ok(all)
    }

    // -- Scraping-backed operations ----------------------------------------

    /// Fetch the full member list, page by page, concatenated in page
    /// order. Pages are fetched strictly sequentially; the module endpoint
    /// is sensitive to request bursts.
    pub async fn fetch_members_list(&self, wiki_url: &str) -> Result<Vec<MemberEntry>, Error> {
        info!("fetching members list for {}", wiki_url);

        let fragment = self
            .ajax
            .call(
                wiki_url,
                &json!({ "moduleName": "membership/MembersListModule" }),
            )
            .await?;
        let total_pages = {
            let document = Html::parse_fragment(&fragment);
            members::parse_total_pages(&document)
                .inspect_err(|e| warn!("members pager: {}", e))?
        };
        debug!("members list for {} spans {} pages", wiki_url, total_pages);

        let mut all = Vec::new();
        for page in 0..total_pages {
            let fragment = self
                .ajax
                .call(
                    wiki_url,
                    &json!({
                        "moduleName": "membership/MembersListModule",
                        "page": page,
                    }),
                )
                .await?;
            let page_members = {
                let document = Html::parse_fragment(&fragment);
                members::parse_member_rows(&document)
                    .inspect_err(|e| warn!("members page {}: {}", page, e))?
            };
            all.extend(page_members);
        }

        info!("members list for {} complete: {} entries", wiki_url, all.len());
        Ok(all)
    }

    /// Fetch a user's profile card from a wiki by uid.
    pub async fn fetch_user_profile(
        &self,
        wiki_url: &str,
        uid: i64,
    ) -> Result<UserProfile, Error> {
        info!("fetching user profile {} via {}", uid, wiki_url);
        let fragment = self
            .ajax
            .call(
                wiki_url,
                &json!({
                    "moduleName": "users/UserInfoWinModule",
                    "user_id": uid,
                }),
            )
            .await?;
        let profile = {
            let document = Html::parse_fragment(&fragment);
            profile::parse_profile_card(&document, uid)
                .inspect_err(|e| warn!("profile card for uid {}: {}", uid, e))?
        };
        Ok(profile)
    }

    /// Fetch a user's profile from wikidot.com by username. Bypasses the
    /// module connector: the public profile page is addressed by slug.
    pub async fn fetch_user_profile_by_username(
        &self,
        username: &str,
    ) -> Result<UserProfile, Error> {
        let slug = profile::username_slug(username);
        info!("fetching user profile for {:?} as {}", username, slug);

        let html = self
            .raw
            .fetch(&format!("{WIKIDOT_ENDPOINT}/user:info/{slug}"))
            .await?;
        let parsed = {
            let document = Html::parse_document(&html);
            profile::parse_profile_page(&document)
                .inspect_err(|e| warn!("profile page for {}: {}", slug, e))?
        };
        Ok(parsed)
    }

    /// Scrape a page's numeric id out of its rendered HTML. `None` when
    /// the page does not embed one (e.g. a 404 page).
    pub async fn resolve_page_id(&self, page_url: &str) -> Result<Option<i64>, Error> {
        debug!("resolving page id for {}", page_url);
        let html = self.raw.fetch(page_url).await?;
        Ok(page_id::find_page_id(&html))
    }

    async fn require_page_id(&self, wiki_url: &str, page_name: &str) -> Result<i64, Error> {
        let page_url = format!("{wiki_url}/{page_name}");
        match self.resolve_page_id(&page_url).await? {
            Some(id) => Ok(id),
            None => {
                warn!("page id cannot be resolved for {}", page_url);
                Err(ExtractionError::PageIdUnresolved { url: page_url }.into())
            }
        }
    }

    /// Fetch who voted on a page and how.
    pub async fn fetch_page_votes(
        &self,
        wiki_url: &str,
        page_name: &str,
    ) -> Result<Vec<VoteEntry>, Error> {
        info!("fetching votes for {}/{}", wiki_url, page_name);
        let page_id = self.require_page_id(wiki_url, page_name).await?;

        let fragment = self
            .ajax
            .call(
                wiki_url,
                &json!({
                    "moduleName": "pagerate/WhoRatedPageModule",
                    "pageId": page_id,
                }),
            )
            .await?;
        let parsed = {
            let document = Html::parse_fragment(&fragment);
            votes::parse_vote_rows(&document)
                .inspect_err(|e| warn!("votes for {}/{}: {}", wiki_url, page_name, e))?
        };
        Ok(parsed)
    }

    /// Fetch a page's revision history, ascending by revision number.
    pub async fn fetch_page_revisions_list(
        &self,
        wiki_url: &str,
        page_name: &str,
    ) -> Result<Vec<RevisionMeta>, Error> {
        info!("fetching revisions for {}/{}", wiki_url, page_name);
        let page_id = self.require_page_id(wiki_url, page_name).await?;

        let fragment = self
            .ajax
            .call(
                wiki_url,
                &json!({
                    "moduleName": "history/PageRevisionListModule",
                    "page_id": page_id,
                    "options": { "source": true },
                    "perpage": REVISIONS_PER_PAGE,
                }),
            )
            .await?;
        let parsed = {
            let document = Html::parse_fragment(&fragment);
            revisions::parse_revision_rows(&document)
        };
        Ok(parsed)
    }

    /// Fetch one revision's wiki source text.
    pub async fn fetch_page_revision_content(
        &self,
        wiki_url: &str,
        revision_id: i64,
    ) -> Result<String, Error> {
        info!("fetching revision {} source via {}", revision_id, wiki_url);
        let fragment = self
            .ajax
            .call(
                wiki_url,
                &json!({
                    "moduleName": "history/PageSourceModule",
                    "revision_id": revision_id,
                }),
            )
            .await?;
        let source = {
            let document = Html::parse_fragment(&fragment);
            revisions::parse_revision_source(&document)
                .inspect_err(|e| warn!("revision {} source: {}", revision_id, e))?
        };
        Ok(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_token_is_a_config_error() {
        assert!(matches!(WikidotKit::new(""), Err(Error::Config(_))));
        assert!(matches!(WikidotKit::new("   "), Err(Error::Config(_))));
    }

    #[test]
    fn test_construction_with_token_succeeds() {
        assert!(WikidotKit::new("secret-token").is_ok());
    }

    #[test]
    fn test_default_config() {
        let config = KitConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.user_agent.starts_with("wikidot-kit/"));
        assert!(config.rate_limit.is_none());
    }

    #[test]
    fn test_rate_limited_construction() {
        let config = KitConfig::default()
            .with_timeout(Duration::from_secs(5))
            .with_user_agent("test-agent/1.0")
            .with_rate_limit(RateLimitConfig::default());
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.user_agent, "test-agent/1.0");
        assert!(config.rate_limit.is_some());
        assert!(WikidotKit::with_config("secret-token", config).is_ok());
    }
}
