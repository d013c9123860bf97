#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use wordtrail::article::badge::Badge;
use wordtrail::host::{BrowserHost, PageMetadata, Tab};
use wordtrail::state::{Config, Coordinator};

/// Scripted browser: one active tab, an optional content script, and a
/// record of every badge written.
#[derive(Default)]
pub struct FakeHost {
    pub tab: Mutex<Option<Tab>>,
    /// `None` simulates a tab without an injected content script.
    pub metadata: Mutex<Option<PageMetadata>>,
    pub badges: Mutex<Vec<Badge>>,
}

impl FakeHost {
    pub fn with_tab(url: &str, title: &str) -> Self {
        let host = Self::default();
        *host.tab.lock().unwrap() = Some(Tab {
            id: 1,
            url: Some(url.to_string()),
            title: Some(title.to_string()),
        });
        *host.metadata.lock().unwrap() = Some(PageMetadata::default());
        host
    }

    pub fn set_canonical(&self, url: Option<&str>, title: Option<&str>) {
        *self.metadata.lock().unwrap() = Some(PageMetadata {
            url: url.map(str::to_string),
            title: title.map(str::to_string),
        });
    }

    pub fn drop_content_script(&self) {
        *self.metadata.lock().unwrap() = None;
    }

    pub fn badges(&self) -> Vec<Badge> {
        self.badges.lock().unwrap().clone()
    }
}

#[async_trait]
impl BrowserHost for FakeHost {
    async fn active_tab(&self) -> Result<Option<Tab>> {
        Ok(self.tab.lock().unwrap().clone())
    }

    async fn query_page_metadata(&self, tab_id: i64) -> Result<PageMetadata> {
        self.metadata
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| anyhow!("no content script in tab {}", tab_id))
    }

    async fn set_badge(&self, badge: &Badge) -> Result<()> {
        self.badges.lock().unwrap().push(badge.clone());
        Ok(())
    }
}

pub fn coordinator(base_url: &str, host: Arc<FakeHost>) -> Coordinator {
    Coordinator::new(Config::with_base_url(base_url), host).unwrap()
}

/// A base URL nothing listens on.
pub const DEAD_BACKEND: &str = "http://127.0.0.1:9";
