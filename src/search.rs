//! Gallery search and ordering helpers: ranked fuzzy matching plus
//! single-pass filters. Layered on the mirrored lists, never on the remote
//! store.

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;

use crate::models::{BlogPost, Note, PostStatus};

/// Ranked fuzzy search over title, excerpt, and categories. An empty query
/// returns everything in the given order.
pub fn search_posts<'a>(posts: &'a [BlogPost], query: &str) -> Vec<&'a BlogPost> {
    let query = query.trim();
    if query.is_empty() {
        return posts.iter().collect();
    }

    let matcher = SkimMatcherV2::default();
    let mut scored: Vec<(i64, &BlogPost)> = posts
        .iter()
        .filter_map(|post| {
            let haystack = format!(
                "{} {} {}",
                post.title,
                post.excerpt,
                post.categories.join(" ")
            );
            matcher
                .fuzzy_match(&haystack, query)
                .map(|score| (score, post))
        })
        .collect();

    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.into_iter().map(|(_, post)| post).collect()
}

pub fn search_notes<'a>(notes: &'a [Note], query: &str) -> Vec<&'a Note> {
    let query = query.trim();
    if query.is_empty() {
        return notes.iter().collect();
    }

    let matcher = SkimMatcherV2::default();
    let mut scored: Vec<(i64, &Note)> = notes
        .iter()
        .filter_map(|note| {
            let haystack = format!("{} {} {}", note.title, note.content, note.tags.join(" "));
            matcher
                .fuzzy_match(&haystack, query)
                .map(|score| (score, note))
        })
        .collect();

    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.into_iter().map(|(_, note)| note).collect()
}

/// The public gallery shows published posts only.
pub fn published(posts: &[BlogPost]) -> Vec<&BlogPost> {
    posts
        .iter()
        .filter(|post| post.status == PostStatus::Published)
        .collect()
}

pub fn filter_by_category<'a>(posts: &'a [BlogPost], category: &str) -> Vec<&'a BlogPost> {
    posts
        .iter()
        .filter(|post| post.categories.iter().any(|c| c == category))
        .collect()
}

pub fn sort_posts_newest_first(posts: &mut [BlogPost]) {
    posts.sort_by(|a, b| b.date.cmp(&a.date));
}

pub fn sort_notes_pinned_first(notes: &mut [Note]) {
    notes.sort_by(|a, b| {
        b.is_pinned
            .cmp(&a.is_pinned)
            .then(b.updated_at.cmp(&a.updated_at))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, Utc};

    fn post(title: &str, categories: &[&str], status: PostStatus) -> BlogPost {
        BlogPost {
            id: title.to_lowercase(),
            slug: title.to_lowercase(),
            title: title.to_string(),
            date: DateTime::UNIX_EPOCH,
            categories: categories.iter().map(|c| c.to_string()).collect(),
            description: String::new(),
            excerpt: String::new(),
            status,
            author: None,
            thumbnail_color: None,
            created_at: DateTime::UNIX_EPOCH,
            updated_at: DateTime::UNIX_EPOCH,
        }
    }

    fn note(title: &str, pinned: bool, updated: DateTime<Utc>) -> Note {
        Note {
            id: title.to_lowercase(),
            title: title.to_string(),
            content: String::new(),
            tags: vec![],
            is_pinned: pinned,
            created_at: updated,
            updated_at: updated,
        }
    }

    #[test]
    fn empty_query_returns_everything() {
        let posts = vec![
            post("Alpha", &[], PostStatus::Published),
            post("Beta", &[], PostStatus::Draft),
        ];
        assert_eq!(search_posts(&posts, "  ").len(), 2);
    }

    #[test]
    fn closer_match_ranks_first() {
        let posts = vec![
            post("Unrelated", &["rust"], PostStatus::Published),
            post("Async Rust Deep Dive", &[], PostStatus::Published),
        ];

        let results = search_posts(&posts, "async rust");
        assert_eq!(results[0].title, "Async Rust Deep Dive");
    }

    #[test]
    fn categories_are_searchable() {
        let posts = vec![
            post("First", &["databases"], PostStatus::Published),
            post("Second", &["frontend"], PostStatus::Published),
        ];

        let results = search_posts(&posts, "databases");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "First");
    }

    #[test]
    fn published_filter_drops_drafts() {
        let posts = vec![
            post("Live", &[], PostStatus::Published),
            post("WIP", &[], PostStatus::Draft),
        ];
        let visible = published(&posts);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].title, "Live");
    }

    #[test]
    fn pinned_notes_sort_first() {
        let now = Utc::now();
        let mut notes = vec![
            note("recent", false, now),
            note("pinned-old", true, now - Duration::days(30)),
        ];

        sort_notes_pinned_first(&mut notes);
        assert_eq!(notes[0].title, "pinned-old");
    }
}
