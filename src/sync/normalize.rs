//! Pure document normalizers.
//!
//! Remote documents have no trustworthy shape: fields go missing, timestamps
//! arrive as RFC3339 strings, epoch numbers, or `{seconds, nanoseconds}`
//! objects, depending on which client wrote them. Every function here is
//! total (malformed input degrades to a type-safe default, never an error)
//! and idempotent, so re-normalizing already-normalized data is a no-op.

use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde_json::Value;

use crate::db::parse_datetime;
use crate::models::{
    AppEntry, AppStatus, BlogPost, BookmarkFolder, BookmarkLink, Comment, CommentId, Note,
    PostStatus, Subscriber, Tester,
};

const EXCERPT_MAX_CHARS: usize = 200;

pub fn map_app(id: &str, fields: &Value) -> AppEntry {
    let app_name = string_or(fields, "appName", "Untitled");
    let slug = match non_empty_string(fields, "slug") {
        Some(slug) => slug,
        None => slugify(&app_name),
    };

    AppEntry {
        id: id.to_string(),
        slug,
        app_name,
        status: AppStatus::parse(&string_or(fields, "status", "")),
        play_store_url: string_or(fields, "playStoreUrl", ""),
        apk_url: non_empty_string(fields, "apkUrl"),
        icon: non_empty_string(fields, "icon"),
        description: string_or(fields, "description", ""),
        created_at: timestamp_or_epoch(fields, "createdAt"),
        updated_at: timestamp_or_epoch(fields, "updatedAt"),
    }
}

pub fn map_blog_post(id: &str, fields: &Value) -> BlogPost {
    let title = string_or(fields, "title", "Untitled");
    let slug = match non_empty_string(fields, "slug") {
        Some(slug) => slug,
        None => slugify(&title),
    };
    let description = string_or(fields, "description", "");
    let excerpt = match non_empty_string(fields, "excerpt") {
        Some(excerpt) => excerpt,
        None => excerpt_from_html(&description),
    };

    BlogPost {
        id: id.to_string(),
        slug,
        title,
        date: timestamp_or_epoch(fields, "date"),
        categories: string_list(fields, "categories"),
        description,
        excerpt,
        status: PostStatus::parse(&string_or(fields, "status", "")),
        author: non_empty_string(fields, "author"),
        thumbnail_color: non_empty_string(fields, "thumbnailColor"),
        created_at: timestamp_or_epoch(fields, "createdAt"),
        updated_at: timestamp_or_epoch(fields, "updatedAt"),
    }
}

pub fn map_note(id: &str, fields: &Value) -> Note {
    Note {
        id: id.to_string(),
        title: string_or(fields, "title", "Untitled"),
        content: string_or(fields, "content", ""),
        tags: string_list(fields, "tags"),
        is_pinned: bool_field(fields, "isPinned"),
        created_at: timestamp_or_epoch(fields, "createdAt"),
        updated_at: timestamp_or_epoch(fields, "updatedAt"),
    }
}

pub fn map_tester(uid: &str, fields: &Value) -> Tester {
    Tester {
        uid: uid.to_string(),
        email: string_or(fields, "email", ""),
        display_name: string_or(fields, "displayName", ""),
        joined_at: timestamp_or_epoch(fields, "joinedAt"),
        play_store_email: non_empty_string(fields, "playStoreEmail"),
        app_id: non_empty_string(fields, "appId"),
    }
}

pub fn map_subscriber(uid: &str, fields: &Value) -> Subscriber {
    Subscriber {
        uid: uid.to_string(),
        email: string_or(fields, "email", ""),
        joined_at: timestamp_or_epoch(fields, "joinedAt"),
    }
}

pub fn map_bookmark_folder(id: &str, fields: &Value) -> BookmarkFolder {
    BookmarkFolder {
        id: id.to_string(),
        name: string_or(fields, "name", "Untitled"),
        parent_id: non_empty_string(fields, "parentId"),
        created_at: timestamp_or_epoch(fields, "createdAt"),
        updated_at: timestamp_or_epoch(fields, "updatedAt"),
    }
}

pub fn map_bookmark_link(id: &str, fields: &Value) -> BookmarkLink {
    BookmarkLink {
        id: id.to_string(),
        title: string_or(fields, "title", "Untitled"),
        url: string_or(fields, "url", ""),
        folder_id: non_empty_string(fields, "folderId"),
        created_at: timestamp_or_epoch(fields, "createdAt"),
        updated_at: timestamp_or_epoch(fields, "updatedAt"),
    }
}

/// Comments arriving from the remote store are authoritative by definition.
pub fn map_comment(id: &str, app_id: &str, fields: &Value) -> Comment {
    Comment {
        id: CommentId::Confirmed(id.to_string()),
        app_id: app_id.to_string(),
        user_id: string_or(fields, "userId", ""),
        display_name: string_or(fields, "displayName", "Anonymous"),
        content: string_or(fields, "content", ""),
        timestamp: timestamp_or_epoch(fields, "timestamp"),
    }
}

/// Lowercased, non-alphanumeric runs collapsed to a dash. Slugs are lookup
/// keys, not unique identifiers; first match wins on lookup.
pub fn slugify(title: &str) -> String {
    static NON_ALNUM: OnceLock<Regex> = OnceLock::new();
    let re = NON_ALNUM.get_or_init(|| Regex::new("[^a-z0-9]+").unwrap());

    re.replace_all(&title.to_lowercase(), "-")
        .trim_matches('-')
        .to_string()
}

/// Plain-text teaser from an HTML body, truncated on a char boundary.
pub fn excerpt_from_html(html: &str) -> String {
    if html.is_empty() {
        return String::new();
    }

    let text = html2text::from_read(html.as_bytes(), 80)
        .unwrap_or_default()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    if text.chars().count() <= EXCERPT_MAX_CHARS {
        return text;
    }
    let truncated: String = text.chars().take(EXCERPT_MAX_CHARS).collect();
    format!("{}…", truncated.trim_end())
}

// Field accessors. Only well-typed values count; everything else defaults.

fn string_or(fields: &Value, key: &str, default: &str) -> String {
    match fields.get(key) {
        Some(Value::String(s)) => s.clone(),
        _ => default.to_string(),
    }
}

fn non_empty_string(fields: &Value, key: &str) -> Option<String> {
    match fields.get(key) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

fn bool_field(fields: &Value, key: &str) -> bool {
    matches!(fields.get(key), Some(Value::Bool(true)))
}

fn string_list(fields: &Value, key: &str) -> Vec<String> {
    match fields.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_str().map(|s| s.to_string()))
            .collect(),
        _ => Vec::new(),
    }
}

fn timestamp_or_epoch(fields: &Value, key: &str) -> DateTime<Utc> {
    coerce_timestamp(fields.get(key)).unwrap_or(DateTime::UNIX_EPOCH)
}

/// Accepts the three shapes remote documents actually contain: an RFC3339 (or
/// SQLite-style) string, epoch seconds as a number, or a
/// `{seconds, nanoseconds}` / `{_seconds, _nanoseconds}` object.
pub fn coerce_timestamp(value: Option<&Value>) -> Option<DateTime<Utc>> {
    match value? {
        Value::String(s) => parse_datetime(s),
        Value::Number(n) => {
            let seconds = n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?;
            DateTime::from_timestamp(seconds, 0)
        }
        Value::Object(map) => {
            let seconds = map
                .get("seconds")
                .or_else(|| map.get("_seconds"))
                .and_then(Value::as_i64)?;
            let nanos = map
                .get("nanoseconds")
                .or_else(|| map.get("_nanoseconds"))
                .and_then(Value::as_u64)
                .unwrap_or(0) as u32;
            DateTime::from_timestamp(seconds, nanos)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn malformed_blog_document_gets_defaults() {
        let post = map_blog_post("p1", &json!({ "title": "Hello" }));

        assert_eq!(post.categories, Vec::<String>::new());
        assert_eq!(post.status, PostStatus::Published);
        assert_eq!(post.slug, "hello");
        assert_eq!(post.created_at, DateTime::UNIX_EPOCH);
    }

    #[test]
    fn normalizers_never_panic_on_garbage() {
        let garbage = json!({
            "title": 42,
            "categories": "not-a-list",
            "status": ["draft"],
            "createdAt": { "bogus": true },
            "isPinned": "yes",
        });

        let post = map_blog_post("p1", &garbage);
        assert_eq!(post.title, "Untitled");
        assert!(post.categories.is_empty());

        let note = map_note("n1", &garbage);
        assert!(!note.is_pinned);
    }

    #[test]
    fn normalizing_normalized_output_is_identity() {
        let raw = json!({
            "appName": "My App",
            "status": "testing",
            "playStoreUrl": "https://play.example/x",
            "description": "<p>desc</p>",
            "createdAt": 1700000000,
        });

        let once = map_app("a1", &raw);
        let again = map_app("a1", &serde_json::to_value(&once).unwrap());
        assert_eq!(once, again);

        let raw_post = json!({
            "title": "A Post",
            "description": "<p>Some <b>body</b> text</p>",
            "categories": ["rust", "sync"],
            "date": "2026-03-01T10:00:00Z",
        });
        let once = map_blog_post("p1", &raw_post);
        let again = map_blog_post("p1", &serde_json::to_value(&once).unwrap());
        assert_eq!(once, again);
    }

    #[test]
    fn timestamp_shapes_all_coerce() {
        let iso = coerce_timestamp(Some(&json!("2026-03-01T10:00:00Z"))).unwrap();
        let epoch = coerce_timestamp(Some(&json!(iso.timestamp()))).unwrap();
        let object = coerce_timestamp(Some(&json!({ "seconds": iso.timestamp() }))).unwrap();
        let underscored =
            coerce_timestamp(Some(&json!({ "_seconds": iso.timestamp() }))).unwrap();

        assert_eq!(iso, epoch);
        assert_eq!(iso, object);
        assert_eq!(iso, underscored);
        assert!(coerce_timestamp(Some(&json!(null))).is_none());
        assert!(coerce_timestamp(None).is_none());
    }

    #[test]
    fn excerpt_derived_from_description_when_absent() {
        let post = map_blog_post(
            "p1",
            &json!({
                "title": "Post",
                "description": "<p>First paragraph of the body.</p>",
            }),
        );
        assert!(post.excerpt.contains("First paragraph"));
        assert!(!post.excerpt.contains('<'));
    }

    #[test]
    fn long_excerpt_truncates_on_char_boundary() {
        let body = format!("<p>{}</p>", "héllo wörld ".repeat(100));
        let excerpt = excerpt_from_html(&body);
        assert!(excerpt.chars().count() <= EXCERPT_MAX_CHARS + 1);
        assert!(excerpt.ends_with('…'));
    }

    #[test]
    fn slugify_collapses_punctuation() {
        assert_eq!(slugify("Hello, World!"), "hello-world");
        assert_eq!(slugify("  Rust & Sync 2.0  "), "rust-sync-2-0");
        assert_eq!(slugify("---"), "");
    }
}
