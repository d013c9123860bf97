//! Background coordinator for the vocabulary-tracking browser extension.
//!
//! Routes messages from content scripts and the popup to the backend, keeps
//! the meets and collections caches, and keeps the toolbar badge in sync with
//! the active page.

pub mod actions;
pub mod article;
pub mod bridge;
pub mod cache;
pub mod host;
pub mod remote;
pub mod state;
