use std::sync::Arc;

use serde_json::json;
use tracing::info;

use crate::cache::types::{Meets, Scene};
use crate::remote::{FetchResult, RequestInit};
use crate::state::Coordinator;

impl Coordinator {
    /// Look a word up. The backend records a meet on every query, so the
    /// meets cache is stale from here on.
    pub async fn query_word(&self, word: &str) -> FetchResult {
        self.meets.invalidate().await;
        let url = format!("{}{}", self.config.endpoints.query, word);
        self.remote.fetch_json(&url, RequestInit::post()).await
    }

    pub async fn get_meets(&self) -> Arc<Meets> {
        self.meets.get().await
    }

    pub async fn add_scene(&self, scene: &Scene) -> FetchResult {
        info!(word_id = scene.id, url = %scene.url, "adding scene");
        let body = json!({
            "id": scene.id,
            "url": scene.url,
            "text": scene.text,
        });
        self.remote
            .fetch_json(&self.config.endpoints.add_scene, RequestInit::post().json(body))
            .await
    }

    pub async fn forget_scene(&self, id: i64) -> FetchResult {
        info!(scene_id = id, "forgetting scene");
        let url = format!("{}{}", self.config.endpoints.forget_scene, id);
        self.remote.fetch_json(&url, RequestInit::delete()).await
    }

    pub async fn toggle_known(&self, id: i64) -> FetchResult {
        info!(word_id = id, "toggling known");
        let url = format!("{}{}", self.config.endpoints.know, id);
        self.remote.fetch_json(&url, RequestInit::post()).await
    }
}
