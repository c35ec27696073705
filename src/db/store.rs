use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use tokio_rusqlite::Connection;

use crate::error::Result;
use crate::models::{Comment, CommentId};

use super::schema;

/// One mirrored entity table. Implementations bind a type's SQL surface so
/// the store serves every root collection through the same generic methods.
pub trait Record: Clone + Send + Sync + 'static {
    const TABLE: &'static str;
    const ID_COLUMN: &'static str = "id";
    /// Full select statement including the table's preferred ordering.
    const SELECT: &'static str;

    fn id(&self) -> &str;
    fn from_row(row: &Row) -> rusqlite::Result<Self>;
    fn insert(&self, conn: &rusqlite::Connection) -> rusqlite::Result<()>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct CacheMetadata {
    pub key: String,
    pub last_sync: DateTime<Utc>,
    pub version: i32,
}

/// Local SQLite mirror of the remote collections. Cloning is cheap; all
/// clones share one connection.
#[derive(Clone)]
pub struct LocalStore {
    conn: Connection,
}

impl LocalStore {
    pub async fn open(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path).await?;
        Self::init(conn).await
    }

    pub async fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().await?;
        Self::init(conn).await
    }

    async fn init(conn: Connection) -> Result<Self> {
        conn.call(|conn| {
            schema::migrate(conn)?;
            Ok(())
        })
        .await?;

        Ok(Self { conn })
    }

    // Generic collection operations

    pub async fn load_all<T: Record>(&self) -> Result<Vec<T>> {
        let rows = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare(T::SELECT)?;
                let rows = stmt
                    .query_map([], |row| T::from_row(row))?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await?;
        Ok(rows)
    }

    pub async fn count<T: Record>(&self) -> Result<usize> {
        let count = self
            .conn
            .call(|conn| {
                let count: i64 = conn.query_row(
                    &format!("SELECT COUNT(*) FROM {}", T::TABLE),
                    [],
                    |row| row.get(0),
                )?;
                Ok(count)
            })
            .await?;
        Ok(count as usize)
    }

    pub async fn put<T: Record>(&self, row: T) -> Result<()> {
        self.conn
            .call(move |conn| {
                row.insert(conn)?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    pub async fn delete<T: Record>(&self, id: &str) -> Result<()> {
        let id = id.to_string();
        self.conn
            .call(move |conn| {
                conn.execute(
                    &format!("DELETE FROM {} WHERE {} = ?1", T::TABLE, T::ID_COLUMN),
                    params![id],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    /// Clear + bulk insert + staleness touch as one transaction. A concurrent
    /// reader sees the previous generation or the new one, never a half-
    /// replaced table.
    pub async fn replace_all<T: Record>(&self, rows: Vec<T>, cache_key: &str) -> Result<()> {
        let key = cache_key.to_string();
        self.conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                tx.execute(&format!("DELETE FROM {}", T::TABLE), [])?;
                for row in &rows {
                    row.insert(&tx)?;
                }
                touch_metadata(&tx, &key)?;
                tx.commit()?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    // Comment operations (sub-collection of apps, scoped by app_id)

    pub async fn comments_for_app(&self, app_id: &str) -> Result<Vec<Comment>> {
        let app_id = app_id.to_string();
        let comments = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, app_id, user_id, display_name, content, timestamp, pending
                     FROM comments WHERE app_id = ?1 ORDER BY timestamp DESC",
                )?;
                let comments = stmt
                    .query_map(params![app_id], comment_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(comments)
            })
            .await?;
        Ok(comments)
    }

    /// Scoped clear + replace for one app's comments. Rows flagged pending
    /// survive the replace; the in-flight post that created them removes them
    /// itself once the remote write settles.
    pub async fn replace_comments(
        &self,
        app_id: &str,
        rows: Vec<Comment>,
        cache_key: &str,
    ) -> Result<()> {
        let app_id = app_id.to_string();
        let key = cache_key.to_string();
        self.conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                tx.execute(
                    "DELETE FROM comments WHERE app_id = ?1 AND pending = 0",
                    params![app_id],
                )?;
                for comment in &rows {
                    insert_comment(&tx, comment)?;
                }
                touch_metadata(&tx, &key)?;
                tx.commit()?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    pub async fn put_comment(&self, comment: Comment) -> Result<()> {
        self.conn
            .call(move |conn| {
                insert_comment(conn, &comment)?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    pub async fn delete_comment(&self, id: &str) -> Result<()> {
        let id = id.to_string();
        self.conn
            .call(move |conn| {
                conn.execute("DELETE FROM comments WHERE id = ?1", params![id])?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    pub async fn delete_comments_for_app(&self, app_id: &str) -> Result<()> {
        let app_id = app_id.to_string();
        self.conn
            .call(move |conn| {
                conn.execute("DELETE FROM comments WHERE app_id = ?1", params![app_id])?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    // Cache metadata

    pub async fn cache_metadata(&self, key: &str) -> Result<Option<CacheMetadata>> {
        let key = key.to_string();
        let metadata = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT key, last_sync, version FROM cache_metadata WHERE key = ?1",
                )?;
                let metadata = stmt
                    .query_row(params![key], |row| {
                        Ok(CacheMetadata {
                            key: row.get(0)?,
                            last_sync: row
                                .get::<_, String>(1)
                                .ok()
                                .and_then(|s| parse_datetime(&s))
                                .unwrap_or(DateTime::UNIX_EPOCH),
                            version: row.get(2)?,
                        })
                    })
                    .optional()?;
                Ok(metadata)
            })
            .await?;
        Ok(metadata)
    }

    /// Unconditionally overwrites the metadata row for `key` with the current
    /// time and version 1.
    pub async fn touch(&self, key: &str) -> Result<()> {
        let key = key.to_string();
        self.conn
            .call(move |conn| {
                touch_metadata(conn, &key)?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    /// Backdates a metadata row so tests can stage stale caches.
    #[cfg(test)]
    pub(crate) async fn set_last_sync(&self, key: &str, last_sync: DateTime<Utc>) -> Result<()> {
        let key = key.to_string();
        let last_sync = last_sync.to_rfc3339();
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT OR REPLACE INTO cache_metadata (key, last_sync, version) VALUES (?1, ?2, 1)",
                    params![key, last_sync],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    pub async fn clear_metadata(&self, key: &str) -> Result<()> {
        let key = key.to_string();
        self.conn
            .call(move |conn| {
                conn.execute("DELETE FROM cache_metadata WHERE key = ?1", params![key])?;
                Ok(())
            })
            .await?;
        Ok(())
    }
}

fn touch_metadata(conn: &rusqlite::Connection, key: &str) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO cache_metadata (key, last_sync, version) VALUES (?1, ?2, 1)",
        params![key, Utc::now().to_rfc3339()],
    )?;
    Ok(())
}

fn insert_comment(conn: &rusqlite::Connection, comment: &Comment) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO comments (id, app_id, user_id, display_name, content, timestamp, pending)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            comment.id.as_str(),
            comment.app_id,
            comment.user_id,
            comment.display_name,
            comment.content,
            comment.timestamp.to_rfc3339(),
            comment.id.is_pending() as i64,
        ],
    )?;
    Ok(())
}

fn comment_from_row(row: &Row) -> rusqlite::Result<Comment> {
    let id: String = row.get(0)?;
    let pending: i64 = row.get(6)?;
    Ok(Comment {
        id: if pending != 0 {
            CommentId::Pending(id)
        } else {
            CommentId::Confirmed(id)
        },
        app_id: row.get(1)?,
        user_id: row.get(2)?,
        display_name: row.get(3)?,
        content: row.get(4)?,
        timestamp: row
            .get::<_, String>(5)
            .ok()
            .and_then(|s| parse_datetime(&s))
            .unwrap_or(DateTime::UNIX_EPOCH),
    })
}

pub(crate) fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    // Try RFC3339 first (e.g., "2026-01-11T12:34:56+00:00")
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // Try SQLite datetime format (e.g., "2026-01-11 12:34:56")
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    None
}
