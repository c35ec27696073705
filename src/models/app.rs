use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A published or in-testing app shown in the promo gallery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppEntry {
    pub id: String,
    pub slug: String,
    pub app_name: String,
    pub status: AppStatus,
    pub play_store_url: String,
    pub apk_url: Option<String>,
    pub icon: Option<String>,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppStatus {
    #[default]
    Production,
    Testing,
}

impl AppStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppStatus::Production => "production",
            AppStatus::Testing => "testing",
        }
    }

    /// Anything unrecognized degrades to the default rather than erroring.
    pub fn parse(s: &str) -> Self {
        match s {
            "testing" => AppStatus::Testing,
            _ => AppStatus::Production,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewApp {
    pub app_name: String,
    pub status: AppStatus,
    pub play_store_url: String,
    pub apk_url: Option<String>,
    pub icon: Option<String>,
    pub description: String,
}

/// A visitor comment scoped to one app. Lifecycle is tied to the parent:
/// deleting the app cascades to its comments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: CommentId,
    pub app_id: String,
    pub user_id: String,
    pub display_name: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// Comment posting writes an optimistic local row before the remote call
/// resolves. The id carries that state explicitly so pending rows can be
/// reconciled instead of relying on snapshot overwrite timing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "id", rename_all = "lowercase")]
pub enum CommentId {
    Pending(String),
    Confirmed(String),
}

impl CommentId {
    pub fn as_str(&self) -> &str {
        match self {
            CommentId::Pending(id) | CommentId::Confirmed(id) => id,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, CommentId::Pending(_))
    }
}
