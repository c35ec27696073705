//! `Record` bindings for the mirrored tables.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};

use crate::models::{
    AppEntry, AppStatus, BlogPost, BookmarkFolder, BookmarkLink, Note, PostStatus, Subscriber,
    Tester,
};

use super::store::{parse_datetime, Record};

fn datetime(row: &Row, idx: usize) -> DateTime<Utc> {
    row.get::<_, String>(idx)
        .ok()
        .and_then(|s| parse_datetime(&s))
        .unwrap_or(DateTime::UNIX_EPOCH)
}

fn string_list(row: &Row, idx: usize) -> Vec<String> {
    row.get::<_, String>(idx)
        .ok()
        .and_then(|s| serde_json::from_str(&s).ok())
        .unwrap_or_default()
}

impl Record for AppEntry {
    const TABLE: &'static str = "apps";
    const SELECT: &'static str = "SELECT id, slug, app_name, status, play_store_url, apk_url, icon, description, created_at, updated_at FROM apps ORDER BY created_at DESC";

    fn id(&self) -> &str {
        &self.id
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(AppEntry {
            id: row.get(0)?,
            slug: row.get(1)?,
            app_name: row.get(2)?,
            status: AppStatus::parse(&row.get::<_, String>(3)?),
            play_store_url: row.get(4)?,
            apk_url: row.get(5)?,
            icon: row.get(6)?,
            description: row.get(7)?,
            created_at: datetime(row, 8),
            updated_at: datetime(row, 9),
        })
    }

    fn insert(&self, conn: &Connection) -> rusqlite::Result<()> {
        conn.execute(
            "INSERT OR REPLACE INTO apps (id, slug, app_name, status, play_store_url, apk_url, icon, description, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                self.id,
                self.slug,
                self.app_name,
                self.status.as_str(),
                self.play_store_url,
                self.apk_url,
                self.icon,
                self.description,
                self.created_at.to_rfc3339(),
                self.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }
}

impl Record for Tester {
    const TABLE: &'static str = "testers";
    const ID_COLUMN: &'static str = "uid";
    const SELECT: &'static str = "SELECT uid, email, display_name, joined_at, play_store_email, app_id FROM testers ORDER BY joined_at DESC";

    fn id(&self) -> &str {
        &self.uid
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Tester {
            uid: row.get(0)?,
            email: row.get(1)?,
            display_name: row.get(2)?,
            joined_at: datetime(row, 3),
            play_store_email: row.get(4)?,
            app_id: row.get(5)?,
        })
    }

    fn insert(&self, conn: &Connection) -> rusqlite::Result<()> {
        conn.execute(
            "INSERT OR REPLACE INTO testers (uid, email, display_name, joined_at, play_store_email, app_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                self.uid,
                self.email,
                self.display_name,
                self.joined_at.to_rfc3339(),
                self.play_store_email,
                self.app_id,
            ],
        )?;
        Ok(())
    }
}

impl Record for Subscriber {
    const TABLE: &'static str = "subscribers";
    const ID_COLUMN: &'static str = "uid";
    const SELECT: &'static str =
        "SELECT uid, email, joined_at FROM subscribers ORDER BY joined_at DESC";

    fn id(&self) -> &str {
        &self.uid
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Subscriber {
            uid: row.get(0)?,
            email: row.get(1)?,
            joined_at: datetime(row, 2),
        })
    }

    fn insert(&self, conn: &Connection) -> rusqlite::Result<()> {
        conn.execute(
            "INSERT OR REPLACE INTO subscribers (uid, email, joined_at) VALUES (?1, ?2, ?3)",
            params![self.uid, self.email, self.joined_at.to_rfc3339()],
        )?;
        Ok(())
    }
}

impl Record for BlogPost {
    const TABLE: &'static str = "blog_posts";
    const SELECT: &'static str = "SELECT id, slug, title, date, categories, description, excerpt, status, author, thumbnail_color, created_at, updated_at FROM blog_posts ORDER BY date DESC";

    fn id(&self) -> &str {
        &self.id
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(BlogPost {
            id: row.get(0)?,
            slug: row.get(1)?,
            title: row.get(2)?,
            date: datetime(row, 3),
            categories: string_list(row, 4),
            description: row.get(5)?,
            excerpt: row.get(6)?,
            status: PostStatus::parse(&row.get::<_, String>(7)?),
            author: row.get(8)?,
            thumbnail_color: row.get(9)?,
            created_at: datetime(row, 10),
            updated_at: datetime(row, 11),
        })
    }

    fn insert(&self, conn: &Connection) -> rusqlite::Result<()> {
        conn.execute(
            "INSERT OR REPLACE INTO blog_posts (id, slug, title, date, categories, description, excerpt, status, author, thumbnail_color, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                self.id,
                self.slug,
                self.title,
                self.date.to_rfc3339(),
                serde_json::to_string(&self.categories).unwrap_or_else(|_| "[]".to_string()),
                self.description,
                self.excerpt,
                self.status.as_str(),
                self.author,
                self.thumbnail_color,
                self.created_at.to_rfc3339(),
                self.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }
}

impl Record for Note {
    const TABLE: &'static str = "notes";
    const SELECT: &'static str = "SELECT id, title, content, tags, is_pinned, created_at, updated_at FROM notes ORDER BY is_pinned DESC, updated_at DESC";

    fn id(&self) -> &str {
        &self.id
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Note {
            id: row.get(0)?,
            title: row.get(1)?,
            content: row.get(2)?,
            tags: string_list(row, 3),
            is_pinned: row.get::<_, i64>(4)? != 0,
            created_at: datetime(row, 5),
            updated_at: datetime(row, 6),
        })
    }

    fn insert(&self, conn: &Connection) -> rusqlite::Result<()> {
        conn.execute(
            "INSERT OR REPLACE INTO notes (id, title, content, tags, is_pinned, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                self.id,
                self.title,
                self.content,
                serde_json::to_string(&self.tags).unwrap_or_else(|_| "[]".to_string()),
                self.is_pinned as i64,
                self.created_at.to_rfc3339(),
                self.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }
}

impl Record for BookmarkFolder {
    const TABLE: &'static str = "bookmark_folders";
    const SELECT: &'static str = "SELECT id, name, parent_id, created_at, updated_at FROM bookmark_folders ORDER BY name";

    fn id(&self) -> &str {
        &self.id
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(BookmarkFolder {
            id: row.get(0)?,
            name: row.get(1)?,
            parent_id: row.get(2)?,
            created_at: datetime(row, 3),
            updated_at: datetime(row, 4),
        })
    }

    fn insert(&self, conn: &Connection) -> rusqlite::Result<()> {
        conn.execute(
            "INSERT OR REPLACE INTO bookmark_folders (id, name, parent_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                self.id,
                self.name,
                self.parent_id,
                self.created_at.to_rfc3339(),
                self.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }
}

impl Record for BookmarkLink {
    const TABLE: &'static str = "bookmark_links";
    const SELECT: &'static str = "SELECT id, title, url, folder_id, created_at, updated_at FROM bookmark_links ORDER BY title";

    fn id(&self) -> &str {
        &self.id
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(BookmarkLink {
            id: row.get(0)?,
            title: row.get(1)?,
            url: row.get(2)?,
            folder_id: row.get(3)?,
            created_at: datetime(row, 4),
            updated_at: datetime(row, 5),
        })
    }

    fn insert(&self, conn: &Connection) -> rusqlite::Result<()> {
        conn.execute(
            "INSERT OR REPLACE INTO bookmark_links (id, title, url, folder_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                self.id,
                self.title,
                self.url,
                self.folder_id,
                self.created_at.to_rfc3339(),
                self.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }
}
