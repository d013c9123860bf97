use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Word -> number of recorded sightings.
pub type Meets = HashMap<String, u64>;

/// Normalized page URL -> collection entry id.
pub type Collections = HashMap<String, i64>;

/// A word sighting submitted from a page. `id` is the word's id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scene {
    pub id: i64,
    pub url: String,
    pub text: String,
}

/// Body for adding the active page to the collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}
