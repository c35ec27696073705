use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub date: DateTime<Utc>,
    /// Ordered list, semantically a set.
    pub categories: Vec<String>,
    /// Rendered post body (HTML).
    pub description: String,
    /// Plain-text teaser; derived from the body when the document omits it.
    pub excerpt: String,
    pub status: PostStatus,
    pub author: Option<String>,
    pub thumbnail_color: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    #[default]
    Published,
    Draft,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Published => "published",
            PostStatus::Draft => "draft",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "draft" => PostStatus::Draft,
            _ => PostStatus::Published,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewBlogPost {
    pub title: String,
    pub date: DateTime<Utc>,
    pub categories: Vec<String>,
    pub description: String,
    pub excerpt: Option<String>,
    pub status: PostStatus,
    pub author: Option<String>,
    pub thumbnail_color: Option<String>,
}
