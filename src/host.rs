use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::article::badge::Badge;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tab {
    pub id: i64,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

/// Page identity reported by the content script.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMetadata {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

/// Messages the coordinator sends to a tab's content script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ContentMessage {
    QueryPageMetadata,
}

/// Browser-level events the coordinator subscribes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    TabActivated { tab_id: i64 },
}

/// The browser primitives the coordinator depends on.
#[async_trait]
pub trait BrowserHost: Send + Sync {
    /// The active tab of the focused window, if any.
    async fn active_tab(&self) -> Result<Option<Tab>>;

    /// Ask the tab's content script for its metadata. Fails when no
    /// content script is injected.
    async fn query_page_metadata(&self, tab_id: i64) -> Result<PageMetadata>;

    async fn set_badge(&self, badge: &Badge) -> Result<()>;
}
