use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Folders form a tree via the nullable parent reference. Deleting a folder
/// must cascade to every descendant folder and link; the store does not
/// enforce this, the sync service does it by explicit recursive fan-out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkFolder {
    pub id: String,
    pub name: String,
    pub parent_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkLink {
    pub id: String,
    pub title: String,
    pub url: String,
    /// None places the link at the root.
    pub folder_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewBookmarkFolder {
    pub name: String,
    pub parent_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewBookmarkLink {
    pub title: String,
    pub url: String,
    pub folder_id: Option<String>,
}
