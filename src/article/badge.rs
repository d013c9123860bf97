use serde::{Deserialize, Serialize};

use super::ArticleState;
use crate::state::BadgeStyle;

/// Toolbar badge. An empty `text` clears it; `color: None` leaves the
/// background untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Badge {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Badge {
    pub fn for_state(state: &ArticleState, style: &BadgeStyle) -> Self {
        if state.in_collection() {
            Self {
                text: style.glyph.clone(),
                color: Some(style.color.clone()),
            }
        } else {
            Self::cleared()
        }
    }

    pub fn cleared() -> Self {
        Self {
            text: String::new(),
            color: None,
        }
    }
}
