//! Raw page fetcher.
//!
//! Plain GET returning page HTML as text. Only used to scrape the inline
//! `WIKIREQUEST.info.pageId` script variable and the public user-profile
//! page, both of which bypass the module connector.

use tracing::debug;

use crate::error::TransportError;

#[derive(Clone)]
pub struct RawPageFetcher {
    client: reqwest::Client,
}

impl RawPageFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Fetch a page URL and return its raw HTML.
    pub async fn fetch(&self, page_url: &str) -> Result<String, TransportError> {
        debug!("raw fetch {}", page_url);

        let response = self.client.get(page_url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                status,
                url: page_url.to_string(),
            });
        }

        Ok(response.text().await?)
    }
}
