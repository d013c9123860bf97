use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use crate::cache::RemoteCache;
use crate::host::BrowserHost;
use crate::remote::RemoteClient;

const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Remote endpoints. Prefix endpoints get a word or id appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub meets: String,
    pub query: String,
    pub add_scene: String,
    pub forget_scene: String,
    pub know: String,
    pub collections: String,
    pub collection: String,
}

impl Endpoints {
    pub fn with_base(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            meets: format!("{}/api/meets", base),
            query: format!("{}/api/query/", base),
            add_scene: format!("{}/api/scenes", base),
            forget_scene: format!("{}/api/scenes/", base),
            know: format!("{}/api/words/known/", base),
            collections: format!("{}/api/collections", base),
            collection: format!("{}/api/collection", base),
        }
    }

    pub fn from_env() -> Self {
        let base = dotenv::var("WORDTRAIL_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let mut endpoints = Self::with_base(&base);

        let overrides: [(&str, &mut String); 7] = [
            ("WORDTRAIL_MEETS_URL", &mut endpoints.meets),
            ("WORDTRAIL_QUERY_URL", &mut endpoints.query),
            ("WORDTRAIL_ADD_SCENE_URL", &mut endpoints.add_scene),
            ("WORDTRAIL_FORGET_SCENE_URL", &mut endpoints.forget_scene),
            ("WORDTRAIL_KNOW_URL", &mut endpoints.know),
            ("WORDTRAIL_COLLECTIONS_URL", &mut endpoints.collections),
            ("WORDTRAIL_COLLECTION_URL", &mut endpoints.collection),
        ];
        for (key, slot) in overrides {
            if let Ok(value) = dotenv::var(key) {
                if !value.is_empty() {
                    *slot = value;
                }
            }
        }
        endpoints
    }
}

/// User-facing strings returned in `errMessage`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Messages {
    pub network_error: String,
    pub unsupported_input: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            network_error: "网络连接错误".to_string(),
            unsupported_input: "不支持的输入".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BadgeStyle {
    pub glyph: String,
    pub color: String,
}

impl Default for BadgeStyle {
    fn default() -> Self {
        Self {
            glyph: " ✓".to_string(),
            color: "cyan".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub endpoints: Endpoints,
    pub messages: Messages,
    pub badge: BadgeStyle,
    pub timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }
}

impl Config {
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            endpoints: Endpoints::with_base(base_url),
            messages: Messages::default(),
            badge: BadgeStyle::default(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn from_env() -> Self {
        let mut config = Self {
            endpoints: Endpoints::from_env(),
            ..Self::default()
        };
        if let Ok(msg) = dotenv::var("WORDTRAIL_MSG_NETWORK") {
            config.messages.network_error = msg;
        }
        if let Ok(msg) = dotenv::var("WORDTRAIL_MSG_UNSUPPORTED") {
            config.messages.unsupported_input = msg;
        }
        if let Some(secs) = dotenv::var("WORDTRAIL_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.trim().parse::<u64>().ok())
        {
            config.timeout = Duration::from_secs(secs);
        }
        config
    }
}

/// Process-lifetime state shared by every message handler.
pub struct Coordinator {
    pub config: Config,
    pub remote: Arc<RemoteClient>,
    pub meets: RemoteCache<u64>,
    pub collections: RemoteCache<i64>,
    pub host: Arc<dyn BrowserHost>,
}

impl Coordinator {
    pub fn new(config: Config, host: Arc<dyn BrowserHost>) -> Result<Self> {
        let remote = Arc::new(RemoteClient::new(
            config.timeout,
            config.messages.network_error.clone(),
        )?);
        Ok(Self::with_remote(config, remote, host))
    }

    pub fn with_remote(
        config: Config,
        remote: Arc<RemoteClient>,
        host: Arc<dyn BrowserHost>,
    ) -> Self {
        let meets = RemoteCache::new("meets", &config.endpoints.meets, remote.clone());
        let collections =
            RemoteCache::new("collections", &config.endpoints.collections, remote.clone());
        Self {
            config,
            remote,
            meets,
            collections,
            host,
        }
    }
}
