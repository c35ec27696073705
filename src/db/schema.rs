use rusqlite::Connection;

/// Bumped whenever the mirror layout changes. The mirror is a disposable
/// projection of the remote store, so "migration" for old versions is simply
/// dropping the tables and letting the next sync rebuild them.
pub const SCHEMA_VERSION: i32 = 1;

pub const SCHEMA: &str = r#"
-- apps table
CREATE TABLE IF NOT EXISTS apps (
    id TEXT PRIMARY KEY,
    slug TEXT NOT NULL,
    app_name TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'production',
    play_store_url TEXT NOT NULL,
    apk_url TEXT,
    icon TEXT,
    description TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_apps_slug ON apps(slug);

-- comments table (sub-collection of apps; cascade handled by the sync layer)
CREATE TABLE IF NOT EXISTS comments (
    id TEXT PRIMARY KEY,
    app_id TEXT NOT NULL,
    user_id TEXT NOT NULL,
    display_name TEXT NOT NULL,
    content TEXT NOT NULL,
    timestamp TEXT NOT NULL,
    pending INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_comments_app_id ON comments(app_id);

-- testers table
CREATE TABLE IF NOT EXISTS testers (
    uid TEXT PRIMARY KEY,
    email TEXT NOT NULL,
    display_name TEXT NOT NULL,
    joined_at TEXT NOT NULL,
    play_store_email TEXT,
    app_id TEXT
);

-- subscribers table
CREATE TABLE IF NOT EXISTS subscribers (
    uid TEXT PRIMARY KEY,
    email TEXT NOT NULL,
    joined_at TEXT NOT NULL
);

-- blog_posts table
CREATE TABLE IF NOT EXISTS blog_posts (
    id TEXT PRIMARY KEY,
    slug TEXT NOT NULL,
    title TEXT NOT NULL,
    date TEXT NOT NULL,
    categories TEXT NOT NULL DEFAULT '[]',
    description TEXT NOT NULL,
    excerpt TEXT NOT NULL DEFAULT '',
    status TEXT NOT NULL DEFAULT 'published',
    author TEXT,
    thumbnail_color TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_blog_posts_slug ON blog_posts(slug);
CREATE INDEX IF NOT EXISTS idx_blog_posts_date ON blog_posts(date DESC);

-- notes table
CREATE TABLE IF NOT EXISTS notes (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    content TEXT NOT NULL,
    tags TEXT NOT NULL DEFAULT '[]',
    is_pinned INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- bookmark_folders table
CREATE TABLE IF NOT EXISTS bookmark_folders (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    parent_id TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_bookmark_folders_parent ON bookmark_folders(parent_id);

-- bookmark_links table
CREATE TABLE IF NOT EXISTS bookmark_links (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    url TEXT NOT NULL,
    folder_id TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_bookmark_links_folder ON bookmark_links(folder_id);

-- cache_metadata table (one row per cache key)
CREATE TABLE IF NOT EXISTS cache_metadata (
    key TEXT PRIMARY KEY,
    last_sync TEXT NOT NULL,
    version INTEGER NOT NULL DEFAULT 1
);
"#;

const MIRROR_TABLES: &[&str] = &[
    "apps",
    "comments",
    "testers",
    "subscribers",
    "blog_posts",
    "notes",
    "bookmark_folders",
    "bookmark_links",
    "cache_metadata",
];

/// Applies the schema at open time. An on-disk mirror from an older schema
/// generation is dropped wholesale; it is rebuilt from the remote store on
/// the next sync anyway.
pub fn migrate(conn: &Connection) -> rusqlite::Result<()> {
    let version: i32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

    if version != 0 && version != SCHEMA_VERSION {
        for table in MIRROR_TABLES {
            conn.execute_batch(&format!("DROP TABLE IF EXISTS {table}"))?;
        }
    }

    conn.execute_batch(SCHEMA)?;
    conn.execute_batch(&format!("PRAGMA user_version = {SCHEMA_VERSION}"))?;
    Ok(())
}
