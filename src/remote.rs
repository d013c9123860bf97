use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

/// Characters `encodeURI` leaves untouched besides ASCII alphanumerics.
const URI_UNESCAPED: &str = ";,/?:@&=+$-_.!~*'()#";

/// Uniform outcome of a backend call: either data or a user-facing message.
///
/// On the wire this is `{data, errMessage}` where `errMessage` is `false`
/// for a successful call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "FetchResultWire", from = "FetchResultWire")]
pub struct FetchResult {
    pub data: Option<Value>,
    pub err_message: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct FetchResultWire {
    #[serde(default)]
    data: Option<Value>,
    #[serde(rename = "errMessage", default = "no_error")]
    err_message: ErrMessage,
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum ErrMessage {
    Message(String),
    Flag(bool),
}

fn no_error() -> ErrMessage {
    ErrMessage::Flag(false)
}

impl From<FetchResult> for FetchResultWire {
    fn from(result: FetchResult) -> Self {
        Self {
            data: result.data,
            err_message: match result.err_message {
                Some(msg) => ErrMessage::Message(msg),
                None => ErrMessage::Flag(false),
            },
        }
    }
}

impl From<FetchResultWire> for FetchResult {
    fn from(wire: FetchResultWire) -> Self {
        Self {
            data: wire.data,
            err_message: match wire.err_message {
                ErrMessage::Message(msg) if !msg.is_empty() => Some(msg),
                _ => None,
            },
        }
    }
}

impl FetchResult {
    pub fn ok(data: Option<Value>) -> Self {
        Self {
            data,
            err_message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            data: None,
            err_message: Some(message.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.err_message.is_none()
    }

    /// Normalize a backend `{data, message}` envelope.
    ///
    /// Falsy `data` becomes `None`; a falsy `message` means success.
    pub fn from_envelope(envelope: &Value) -> Self {
        let data = envelope.get("data").filter(|v| is_truthy(v)).cloned();
        let err_message = envelope
            .get("message")
            .filter(|v| is_truthy(v))
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            });
        Self { data, err_message }
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Percent-encode a full URL the way `encodeURI` does: reserved URL
/// characters survive, everything else (including `%`) is escaped.
pub fn encode_uri(url: &str) -> String {
    let mut out = String::with_capacity(url.len());
    let mut buf = [0u8; 4];
    for ch in url.chars() {
        if ch.is_ascii_alphanumeric() || URI_UNESCAPED.contains(ch) {
            out.push(ch);
        } else {
            out.push_str(&urlencoding::encode(ch.encode_utf8(&mut buf)));
        }
    }
    out
}

fn json_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    // The backend picks its response format from Accept.
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers
}

/// Method, body and optional header override for one backend call.
#[derive(Debug, Clone, Default)]
pub struct RequestInit {
    pub method: Method,
    pub body: Option<Value>,
    /// Replaces the JSON default headers entirely when set.
    pub headers: Option<HeaderMap>,
}

impl RequestInit {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn post() -> Self {
        Self {
            method: Method::POST,
            ..Self::default()
        }
    }

    pub fn delete() -> Self {
        Self {
            method: Method::DELETE,
            ..Self::default()
        }
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = Some(headers);
        self
    }
}

pub struct RemoteClient {
    client: reqwest::Client,
    network_error: String,
}

impl RemoteClient {
    pub fn new(timeout: Duration, network_error: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            client,
            network_error: network_error.into(),
        })
    }

    /// Single-attempt call that never fails: transport and parse errors
    /// collapse into the configured network-error message.
    pub async fn fetch_json(&self, url: &str, init: RequestInit) -> FetchResult {
        let method = init.method.clone();
        match self.send(url, init).await {
            Ok(envelope) => {
                let result = FetchResult::from_envelope(&envelope);
                debug!(%method, url, ok = result.is_ok(), "backend responded");
                result
            }
            Err(e) => {
                warn!(%method, url, error = %format!("{:#}", e), "backend request failed");
                FetchResult::error(self.network_error.clone())
            }
        }
    }

    async fn send(&self, url: &str, init: RequestInit) -> Result<Value> {
        let encoded = encode_uri(url);
        let headers = init.headers.unwrap_or_else(json_headers);

        let mut req = self.client.request(init.method, &encoded).headers(headers);
        if let Some(body) = init.body {
            let payload = serde_json::to_vec(&body).context("serialize request body")?;
            req = req.body(payload);
        }

        let resp = req.send().await.context("request failed")?;
        let text = resp.text().await.context("Failed to read response body")?;
        serde_json::from_str(&text).context("Failed to parse response JSON")
    }
}
