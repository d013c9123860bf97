//! Native-messaging transport between the browser extension and the
//! coordinator. The extension forwards routed messages and tab events, and
//! answers the host calls the coordinator makes back into the browser.

pub mod frame;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::{debug, info, warn};

use crate::actions::Response;
use crate::remote::FetchResult;
use crate::article::badge::Badge;
use crate::host::{BrowserHost, ContentMessage, HostEvent, PageMetadata, Tab};
use crate::state::Coordinator;

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
enum Inbound {
    Request {
        id: u64,
        message: Value,
    },
    Event {
        event: String,
        #[serde(rename = "tabId", default)]
        tab_id: Option<i64>,
    },
    Reply {
        id: u64,
        #[serde(default)]
        result: Value,
        #[serde(default)]
        error: Option<String>,
    },
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
enum Outbound {
    Response { id: u64, result: Option<Response> },
    Call { id: u64, method: String, params: Value },
}

type PendingReply = oneshot::Sender<std::result::Result<Value, String>>;

/// `BrowserHost` backed by calls over the native-messaging channel.
pub struct StdioHost {
    outgoing: mpsc::UnboundedSender<Value>,
    pending: Mutex<HashMap<u64, PendingReply>>,
    next_id: AtomicU64,
}

impl StdioHost {
    pub fn new(outgoing: mpsc::UnboundedSender<Value>) -> Self {
        Self {
            outgoing,
            pending: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(id, tx);

        let frame = serde_json::to_value(Outbound::Call {
            id,
            method: method.to_string(),
            params,
        })
        .context("serialize host call")?;
        if self.outgoing.send(frame).is_err() {
            self.pending.lock().await.remove(&id);
            bail!("bridge writer closed");
        }

        match rx.await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(message)) => Err(anyhow!("{} failed: {}", method, message)),
            Err(_) => Err(anyhow!("bridge closed before {} replied", method)),
        }
    }

    async fn complete(&self, id: u64, reply: std::result::Result<Value, String>) {
        match self.pending.lock().await.remove(&id) {
            Some(tx) => {
                let _ = tx.send(reply);
            }
            None => warn!(id, "reply for unknown host call"),
        }
    }

    /// Drop every outstanding call; their callers see a closed bridge.
    async fn fail_pending(&self) {
        let mut pending = self.pending.lock().await;
        if !pending.is_empty() {
            warn!(count = pending.len(), "abandoning pending host calls");
        }
        pending.clear();
    }
}

#[async_trait]
impl BrowserHost for StdioHost {
    async fn active_tab(&self) -> Result<Option<Tab>> {
        let value = self.call("activeTab", json!({})).await?;
        if value.is_null() {
            return Ok(None);
        }
        let tab = serde_json::from_value(value).context("malformed activeTab reply")?;
        Ok(Some(tab))
    }

    async fn query_page_metadata(&self, tab_id: i64) -> Result<PageMetadata> {
        let params = json!({
            "tabId": tab_id,
            "message": ContentMessage::QueryPageMetadata,
        });
        let value = self.call("queryPageMetadata", params).await?;
        serde_json::from_value(value).context("malformed page metadata")
    }

    async fn set_badge(&self, badge: &Badge) -> Result<()> {
        let params = serde_json::to_value(badge).context("serialize badge")?;
        self.call("setBadge", params).await?;
        Ok(())
    }
}

/// Encode a reply for `id`. A result too large for one frame is replaced
/// by an error reply so the caller is never left waiting.
fn response_frame(id: u64, result: Option<Response>, fallback: &str) -> Option<Value> {
    let encoded = serde_json::to_value(Outbound::Response { id, result })
        .map_err(anyhow::Error::from)
        .and_then(|frame| frame::encode_frame(&frame).map(|_| frame));
    match encoded {
        Ok(frame) => Some(frame),
        Err(e) => {
            warn!(id, error = %format!("{:#}", e), "response not deliverable, replying with error");
            let result = Some(Response::Fetch(FetchResult::error(fallback)));
            serde_json::to_value(Outbound::Response { id, result })
                .map_err(|e| warn!(id, error = %e, "failed to encode error response"))
                .ok()
        }
    }
}

/// Drain outgoing frames to the writer until every sender is gone.
pub async fn write_loop<W: AsyncWrite + Unpin>(
    mut writer: W,
    mut outgoing: mpsc::UnboundedReceiver<Value>,
) -> Result<()> {
    while let Some(value) = outgoing.recv().await {
        let bytes = match frame::encode_frame(&value) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(error = %format!("{:#}", e), "dropping outgoing frame");
                continue;
            }
        };
        writer.write_all(&bytes).await.context("Failed to write frame")?;
        writer.flush().await.context("Failed to flush frame")?;
    }
    Ok(())
}

pub struct Bridge {
    pub coordinator: Arc<Coordinator>,
    pub host: Arc<StdioHost>,
    pub outgoing: mpsc::UnboundedSender<Value>,
    pub events: mpsc::Sender<HostEvent>,
}

impl Bridge {
    /// Read inbound frames until the extension disconnects. Requests are
    /// handled concurrently.
    pub async fn serve<R: AsyncRead + Unpin>(&self, mut reader: R) -> Result<()> {
        let result = loop {
            let value = match frame::read_frame(&mut reader).await {
                Ok(Some(value)) => value,
                Ok(None) => break Ok(()),
                Err(e) => break Err(e),
            };
            match serde_json::from_value::<Inbound>(value) {
                Ok(inbound) => self.route(inbound).await,
                Err(e) => debug!(error = %e, "ignoring unrecognized frame"),
            }
        };
        info!("extension disconnected");
        self.host.fail_pending().await;
        result
    }

    async fn route(&self, inbound: Inbound) {
        match inbound {
            Inbound::Request { id, message } => {
                let coordinator = self.coordinator.clone();
                let outgoing = self.outgoing.clone();
                tokio::spawn(async move {
                    let result = coordinator.handle_message(message).await;
                    let fallback = &coordinator.config.messages.network_error;
                    if let Some(frame) = response_frame(id, result, fallback) {
                        let _ = outgoing.send(frame);
                    }
                });
            }
            Inbound::Event { event, tab_id } => match (event.as_str(), tab_id) {
                // A full queue already holds a refresh that will see this tab,
                // so the read loop never waits on the subscriber.
                ("tabActivated", Some(tab_id)) => {
                    match self.events.try_send(HostEvent::TabActivated { tab_id }) {
                        Ok(()) => {}
                        Err(TrySendError::Full(_)) => {
                            debug!(tab_id, "badge refresh already queued, coalescing")
                        }
                        Err(TrySendError::Closed(_)) => warn!("event subscriber gone"),
                    }
                }
                _ => debug!(event = %event, "ignoring host event"),
            },
            Inbound::Reply { id, result, error } => {
                let reply = match error {
                    Some(message) => Err(message),
                    None => Ok(result),
                };
                self.host.complete(id, reply).await;
            }
        }
    }
}
