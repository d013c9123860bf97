mod collections;
mod words;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::article::ArticleState;
use crate::cache::types::{Meets, Scene};
use crate::host::HostEvent;
use crate::remote::FetchResult;
use crate::state::Coordinator;

/// Messages routed to the coordinator by content scripts and the popup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Request {
    Query { word: String },
    GetMeets,
    AddScene { scene: Scene },
    ForgetScene { id: i64 },
    ToggleKnown { id: i64 },
    GetArticleStatePopup,
    AddCollection,
    DeleteCollection { id: i64 },
    UpdateBadge,
}

const ACTIONS: [&str; 9] = [
    "query",
    "getMeets",
    "addScene",
    "forgetScene",
    "toggleKnown",
    "getArticleStatePopup",
    "addCollection",
    "deleteCollection",
    "updateBadge",
];

/// Outcome of reading a raw message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parsed {
    Request(Request),
    /// A known action whose payload does not fit it.
    Malformed { action: &'static str },
    /// No handler exists for this message.
    Unrecognized,
}

impl Request {
    pub fn parse(message: Value) -> Parsed {
        let action = message
            .get("action")
            .and_then(Value::as_str)
            .and_then(|name| ACTIONS.iter().copied().find(|known| *known == name));
        let Some(action) = action else {
            debug!("ignoring unrecognized message");
            return Parsed::Unrecognized;
        };
        match serde_json::from_value(message) {
            Ok(request) => Parsed::Request(request),
            Err(e) => {
                warn!(action, error = %e, "malformed payload");
                Parsed::Malformed { action }
            }
        }
    }

    pub fn action(&self) -> &'static str {
        match self {
            Request::Query { .. } => "query",
            Request::GetMeets => "getMeets",
            Request::AddScene { .. } => "addScene",
            Request::ForgetScene { .. } => "forgetScene",
            Request::ToggleKnown { .. } => "toggleKnown",
            Request::GetArticleStatePopup => "getArticleStatePopup",
            Request::AddCollection => "addCollection",
            Request::DeleteCollection { .. } => "deleteCollection",
            Request::UpdateBadge => "updateBadge",
        }
    }
}

/// Action-specific reply. `BadgeUpdated` serializes as `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Response {
    Fetch(FetchResult),
    Meets(Arc<Meets>),
    ArticleState(ArticleState),
    BadgeUpdated,
}

impl Coordinator {
    pub async fn dispatch(&self, request: Request) -> Response {
        debug!(action = request.action(), "dispatching");
        match request {
            Request::Query { word } => Response::Fetch(self.query_word(&word).await),
            Request::GetMeets => Response::Meets(self.get_meets().await),
            Request::AddScene { scene } => Response::Fetch(self.add_scene(&scene).await),
            Request::ForgetScene { id } => Response::Fetch(self.forget_scene(id).await),
            Request::ToggleKnown { id } => Response::Fetch(self.toggle_known(id).await),
            Request::GetArticleStatePopup => {
                Response::ArticleState(self.get_article_state_popup().await)
            }
            Request::AddCollection => Response::Fetch(self.add_collection().await),
            Request::DeleteCollection { id } => {
                Response::Fetch(self.delete_collection(id).await)
            }
            Request::UpdateBadge => {
                self.update_badge().await;
                Response::BadgeUpdated
            }
        }
    }

    /// Entry point for raw messages. `None` means no handler exists.
    pub async fn handle_message(&self, message: Value) -> Option<Response> {
        match Request::parse(message) {
            Parsed::Request(request) => Some(self.dispatch(request).await),
            Parsed::Malformed { .. } => Some(Response::Fetch(FetchResult::error(
                self.config.messages.unsupported_input.clone(),
            ))),
            Parsed::Unrecognized => None,
        }
    }

    /// Refresh the badge on every tab activation until the source closes.
    pub async fn run_events(self: Arc<Self>, mut events: mpsc::Receiver<HostEvent>) {
        while let Some(event) = events.recv().await {
            match event {
                HostEvent::TabActivated { tab_id } => {
                    debug!(tab_id, "tab activated");
                    self.update_badge().await;
                }
            }
        }
        info!("host event source closed");
    }
}
