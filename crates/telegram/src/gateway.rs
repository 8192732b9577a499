//! JSON client for the HTTP session gateway.
//!
//! Every call is a `POST {base}/{method}` with a JSON body. Replies use the
//! Bot API envelope:
//!
//! ```json
//! {"ok": true, "result": {...}}
//! {"ok": false, "error_code": 420, "description": "FLOOD_WAIT_30",
//!  "parameters": {"retry_after": 30}}
//! ```

use std::time::Duration;

use {
    serde::{Deserialize, Serialize, de::DeserializeOwned},
    tracing::debug,
};

use crate::error::{Context, Error, Result};

#[derive(Debug, Deserialize)]
struct Envelope {
    ok: bool,
    #[serde(default)]
    result: Option<serde_json::Value>,
    #[serde(default)]
    error_code: Option<i32>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    parameters: Option<ResponseParameters>,
}

#[derive(Debug, Deserialize)]
struct ResponseParameters {
    #[serde(default)]
    retry_after: Option<u64>,
}

/// Thin JSON-over-HTTP client for the session gateway.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    http: reqwest::Client,
    base_url: String,
}

impl GatewayClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Invoke `method` and decode the `result` field.
    pub async fn call<P, R>(&self, method: &str, params: &P) -> Result<R>
    where
        P: Serialize + Sync,
        R: DeserializeOwned,
    {
        let url = format!("{}/{method}", self.base_url);
        debug!(method, "gateway call");
        let response = self.http.post(&url).json(params).send().await?;
        let status = response.status();
        let body = response.text().await?;
        let envelope: Envelope = serde_json::from_str(&body)
            .with_context(|| format!("{method}: unreadable reply (HTTP {status})"))?;

        if !envelope.ok {
            return Err(Error::Gateway {
                code: envelope
                    .error_code
                    .unwrap_or_else(|| i32::from(status.as_u16())),
                description: envelope.description.unwrap_or_default(),
                retry_after: envelope.parameters.and_then(|p| p.retry_after),
            });
        }
        let result = envelope.result.unwrap_or(serde_json::Value::Null);
        serde_json::from_value(result).with_context(|| format!("{method}: unexpected result"))
    }
}
