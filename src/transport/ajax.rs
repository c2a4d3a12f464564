//! AJAX module-connector transport.
//!
//! Wikidot's `ajax-module-connector.php` endpoint renders HTML fragments
//! server-side, keyed by an internal module name. Each call is one POST
//! carrying an anti-CSRF token as both cookie and form field; the response
//! is a JSON envelope with the fragment under `body`.

use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::TransportError;

/// JSON envelope wrapping every module response.
#[derive(Debug, Deserialize)]
struct ModuleEnvelope {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    body: Option<String>,
}

/// Connector for a wiki's AJAX module endpoint.
///
/// One random `wikidot_token7` is generated per connector instance and
/// reused for every call it makes.
#[derive(Clone)]
pub struct AjaxConnector {
    client: reqwest::Client,
    token7: String,
}

impl AjaxConnector {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            token7: generate_token7(),
        }
    }

    /// Call a module and return the rendered HTML fragment.
    ///
    /// `params` is a JSON object; `moduleName` selects the module and the
    /// remaining fields are module-specific. Nested objects are flattened
    /// into bracket notation (`options[source]=true`) on the wire.
    pub async fn call(&self, wiki_base_url: &str, params: &Value) -> Result<String, TransportError> {
        let connector_url = format!(
            "{}/ajax-module-connector.php",
            wiki_base_url.trim_end_matches('/')
        );
        debug!("ajax call {} params {}", connector_url, params);

        let mut form: Vec<(String, String)> = vec![
            ("wikidot_token7".to_string(), self.token7.clone()),
            ("callbackIndex".to_string(), "1".to_string()),
        ];
        flatten_params(None, params, &mut form);

        let response = self
            .client
            .post(&connector_url)
            .header("Cookie", format!("wikidot_token7={}", self.token7))
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!("ajax call to {} failed with status {}", connector_url, status);
            return Err(TransportError::Status {
                status,
                url: connector_url,
            });
        }

        let envelope: ModuleEnvelope = response
            .json()
            .await
            .map_err(|e| TransportError::Envelope(e.to_string()))?;

        match envelope.status.as_deref() {
            Some("ok") | None => {}
            Some(other) => {
                warn!("module connector returned status {:?}", other);
                return Err(TransportError::Envelope(format!(
                    "module status {other:?}"
                )));
            }
        }

        envelope
            .body
            .ok_or_else(|| TransportError::Envelope("missing body field".to_string()))
    }
}

/// Random lowercase alphanumeric token, one per connector.
fn generate_token7() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect::<String>()
        .to_lowercase()
}

/// Flatten a JSON object into form fields, nesting keys with brackets the
/// way the connector expects (`options[source]`, `list[0]`).
fn flatten_params(prefix: Option<&str>, value: &Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => {
            for (key, nested) in map {
                let full_key = match prefix {
                    Some(p) => format!("{p}[{key}]"),
                    None => key.clone(),
                };
                flatten_params(Some(&full_key), nested, out);
            }
        }
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                let full_key = match prefix {
                    Some(p) => format!("{p}[{index}]"),
                    None => index.to_string(),
                };
                flatten_params(Some(&full_key), item, out);
            }
        }
        scalar => {
            let key = prefix.unwrap_or_default().to_string();
            out.push((key, scalar_to_form_value(scalar)));
        }
    }
}

fn scalar_to_form_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Null => String::new(),
        // Containers are handled by flatten_params.
        other => other.to_string(),
    }
}
