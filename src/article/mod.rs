pub mod anchor;
pub mod badge;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cache::RemoteCache;
use crate::host::BrowserHost;

use anchor::strip_anchor;

/// Whether the active page is in the collection.
///
/// Serialized as `{inCollection: false}` or `{inCollection: true, id}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "ArticleStateWire", from = "ArticleStateWire")]
pub enum ArticleState {
    NotInCollection,
    InCollection { id: i64 },
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArticleStateWire {
    in_collection: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<i64>,
}

impl From<ArticleState> for ArticleStateWire {
    fn from(state: ArticleState) -> Self {
        Self {
            in_collection: state.in_collection(),
            id: state.id(),
        }
    }
}

impl From<ArticleStateWire> for ArticleState {
    fn from(wire: ArticleStateWire) -> Self {
        if wire.in_collection {
            ArticleState::from_lookup(wire.id)
        } else {
            ArticleState::NotInCollection
        }
    }
}

impl ArticleState {
    /// Only a positive collection id counts as membership.
    pub fn from_lookup(id: Option<i64>) -> Self {
        match id {
            Some(id) if id > 0 => ArticleState::InCollection { id },
            _ => ArticleState::NotInCollection,
        }
    }

    pub fn in_collection(&self) -> bool {
        matches!(self, ArticleState::InCollection { .. })
    }

    pub fn id(&self) -> Option<i64> {
        match self {
            ArticleState::InCollection { id } => Some(*id),
            ArticleState::NotInCollection => None,
        }
    }
}

/// Identity of the active page: canonical values first, tab values second.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivePage {
    pub url: Option<String>,
    pub title: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Resolve the active tab's canonical URL and title through its content script.
pub async fn resolve_active_page(host: &dyn BrowserHost) -> Result<ActivePage> {
    let tab = host
        .active_tab()
        .await
        .context("Failed to query active tab")?
        .context("no active tab")?;
    let metadata = host
        .query_page_metadata(tab.id)
        .await
        .with_context(|| format!("content script unreachable in tab {}", tab.id))?;

    let url = match non_empty(metadata.url) {
        Some(canonical) => {
            debug!(url = %canonical, "using canonical url");
            Some(canonical)
        }
        None => {
            let stripped = strip_anchor(tab.url.as_deref()).map(str::to_string);
            debug!(url = ?stripped, "using tab url");
            stripped
        }
    };
    let title = non_empty(metadata.title).or_else(|| non_empty(tab.title));

    Ok(ActivePage { url, title })
}

/// Look the active page up in the collection. Any failure reads as
/// "not in collection".
pub async fn article_state(
    host: &dyn BrowserHost,
    collections: &RemoteCache<i64>,
) -> ArticleState {
    match try_article_state(host, collections).await {
        Ok(state) => state,
        Err(e) => {
            warn!(error = %format!("{:#}", e), "article state unresolved");
            ArticleState::NotInCollection
        }
    }
}

async fn try_article_state(
    host: &dyn BrowserHost,
    collections: &RemoteCache<i64>,
) -> Result<ArticleState> {
    let page = resolve_active_page(host).await?;
    let Some(url) = page.url else {
        return Ok(ArticleState::NotInCollection);
    };
    let entries = collections.get().await;
    Ok(ArticleState::from_lookup(entries.get(&url).copied()))
}
