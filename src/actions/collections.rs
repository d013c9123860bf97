use serde_json::json;
use tracing::{info, warn};

use crate::article::badge::Badge;
use crate::article::{self, ArticleState};
use crate::cache::types::CollectionEntry;
use crate::remote::{FetchResult, RequestInit};
use crate::state::Coordinator;

impl Coordinator {
    /// Popup opened: treat the collection as possibly changed elsewhere.
    pub async fn get_article_state_popup(&self) -> ArticleState {
        self.collections.invalidate().await;
        self.update_badge().await;
        self.article_state().await
    }

    pub async fn article_state(&self) -> ArticleState {
        article::article_state(self.host.as_ref(), &self.collections).await
    }

    /// Collect the active page. Does not touch the collections cache; the
    /// next popup open refetches it.
    pub async fn add_collection(&self) -> FetchResult {
        let page = match article::resolve_active_page(self.host.as_ref()).await {
            Ok(page) => page,
            Err(e) => {
                warn!(error = %format!("{:#}", e), "cannot collect active page");
                return FetchResult::error(self.config.messages.unsupported_input.clone());
            }
        };

        info!(url = ?page.url, title = ?page.title, "adding collection");
        let entry = CollectionEntry {
            url: page.url,
            title: page.title,
        };
        let body = match serde_json::to_value(&entry) {
            Ok(body) => body,
            Err(e) => {
                warn!(error = %e, "cannot encode collection entry");
                return FetchResult::error(self.config.messages.unsupported_input.clone());
            }
        };
        self.remote
            .fetch_json(&self.config.endpoints.collection, RequestInit::post().json(body))
            .await
    }

    pub async fn delete_collection(&self, id: i64) -> FetchResult {
        info!(collection_id = id, "deleting collection");
        self.remote
            .fetch_json(
                &self.config.endpoints.collection,
                RequestInit::delete().json(json!({ "id": id })),
            )
            .await
    }

    /// Reflect the active page's membership on the toolbar badge.
    pub async fn update_badge(&self) {
        let state = self.article_state().await;
        let badge = Badge::for_state(&state, &self.config.badge);
        if let Err(e) = self.host.set_badge(&badge).await {
            warn!(error = %format!("{:#}", e), "failed to set badge");
        }
    }
}
