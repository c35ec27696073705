//! One pipeline, seven instantiations.
//!
//! Every root collection moves through the identical fetch → normalize →
//! sort → clear-and-replace sequence; the trait binds the per-entity pieces
//! (remote collection name, cache key, normalizer, client-side ordering) so
//! the sync service carries a single generic implementation instead of seven
//! copies. Comments are the exception: a sub-collection scoped by app id,
//! handled by dedicated methods on the service.

use serde_json::Value;

use crate::db::Record;
use crate::models::{AppEntry, BlogPost, BookmarkFolder, BookmarkLink, Note, Subscriber, Tester};

use super::normalize;

pub trait Collection: Record {
    /// Remote collection name.
    const COLLECTION: &'static str;
    /// Staleness-metadata key.
    const CACHE_KEY: &'static str;

    fn normalize(id: &str, fields: &Value) -> Self;

    /// Ordering applied after a remote fetch, where the store's native
    /// ordering is insufficient.
    fn sort(items: &mut [Self])
    where
        Self: Sized;
}

impl Collection for AppEntry {
    const COLLECTION: &'static str = "apps";
    const CACHE_KEY: &'static str = "apps";

    fn normalize(id: &str, fields: &Value) -> Self {
        normalize::map_app(id, fields)
    }

    fn sort(items: &mut [Self]) {
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    }
}

impl Collection for Tester {
    const COLLECTION: &'static str = "testers";
    const CACHE_KEY: &'static str = "testers";

    fn normalize(id: &str, fields: &Value) -> Self {
        normalize::map_tester(id, fields)
    }

    fn sort(items: &mut [Self]) {
        items.sort_by(|a, b| b.joined_at.cmp(&a.joined_at));
    }
}

impl Collection for Subscriber {
    const COLLECTION: &'static str = "subscribers";
    const CACHE_KEY: &'static str = "subscribers";

    fn normalize(id: &str, fields: &Value) -> Self {
        normalize::map_subscriber(id, fields)
    }

    fn sort(items: &mut [Self]) {
        items.sort_by(|a, b| b.joined_at.cmp(&a.joined_at));
    }
}

impl Collection for BlogPost {
    const COLLECTION: &'static str = "blogs";
    const CACHE_KEY: &'static str = "blogs";

    fn normalize(id: &str, fields: &Value) -> Self {
        normalize::map_blog_post(id, fields)
    }

    fn sort(items: &mut [Self]) {
        items.sort_by(|a, b| b.date.cmp(&a.date));
    }
}

impl Collection for Note {
    const COLLECTION: &'static str = "notes";
    const CACHE_KEY: &'static str = "notes";

    fn normalize(id: &str, fields: &Value) -> Self {
        normalize::map_note(id, fields)
    }

    fn sort(items: &mut [Self]) {
        // Pinned first, most recently touched within each group.
        items.sort_by(|a, b| {
            b.is_pinned
                .cmp(&a.is_pinned)
                .then(b.updated_at.cmp(&a.updated_at))
        });
    }
}

impl Collection for BookmarkFolder {
    const COLLECTION: &'static str = "bookmark_folders";
    const CACHE_KEY: &'static str = "bookmark_folders";

    fn normalize(id: &str, fields: &Value) -> Self {
        normalize::map_bookmark_folder(id, fields)
    }

    fn sort(items: &mut [Self]) {
        items.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
    }
}

impl Collection for BookmarkLink {
    const COLLECTION: &'static str = "bookmark_links";
    const CACHE_KEY: &'static str = "bookmark_links";

    fn normalize(id: &str, fields: &Value) -> Self {
        normalize::map_bookmark_link(id, fields)
    }

    fn sort(items: &mut [Self]) {
        items.sort_by(|a, b| a.title.to_lowercase().cmp(&b.title.to_lowercase()));
    }
}
