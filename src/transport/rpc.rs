//! XML-RPC gateway to the central Wikidot API.

use serde_json::Value;
use tracing::{debug, warn};

use super::xmlrpc::{self, RpcResponse};
use crate::error::{Error, TransportError};
use crate::rate_limit::RateLimiter;
use crate::CLIENT_IDENT;

/// Endpoint for all structured API calls, regardless of target site.
const RPC_ENDPOINT: &str = "https://www.wikidot.com/xml-rpc-api.php";

/// One XML-RPC call per invocation, HTTP Basic auth, optional rate
/// limiting. Site scoping is the caller's job: every argument struct is
/// expected to carry `site`.
#[derive(Clone)]
pub struct RpcGateway {
    client: reqwest::Client,
    token: String,
    limiter: Option<RateLimiter>,
}

impl RpcGateway {
    pub fn new(client: reqwest::Client, token: String, limiter: Option<RateLimiter>) -> Self {
        Self {
            client,
            token,
            limiter,
        }
    }

    /// Invoke `method` with a single struct argument.
    pub async fn call(&self, method: &str, args: Value) -> Result<Value, Error> {
        debug!("rpc call {} args {}", method, args);

        // Slot is held until the response is in.
        let _permit = match &self.limiter {
            Some(limiter) => Some(limiter.acquire().await),
            None => None,
        };

        let body = xmlrpc::encode_method_call(method, &args)?;

        let response = self
            .client
            .post(RPC_ENDPOINT)
            .basic_auth(CLIENT_IDENT, Some(&self.token))
            .header("Content-Type", "text/xml; charset=utf-8")
            .body(body)
            .send()
            .await
            .map_err(TransportError::Http)?;

        let status = response.status();
        if !status.is_success() {
            warn!("rpc call {} failed with status {}", method, status);
            return Err(TransportError::Status {
                status,
                url: RPC_ENDPOINT.to_string(),
            }
            .into());
        }

        let text = response.text().await.map_err(TransportError::Http)?;

        match xmlrpc::decode_method_response(&text)? {
            RpcResponse::Success(value) => Ok(value),
            RpcResponse::Fault { code, message } => {
                warn!("rpc call {} fault {}: {}", method, code, message);
                Err(Error::Rpc { code, message })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_ident_carries_version() {
        assert!(CLIENT_IDENT.starts_with("wikidot-kit/"));
        assert!(CLIENT_IDENT.len() > "wikidot-kit/".len());
    }
}
