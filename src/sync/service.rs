use std::sync::Arc;

use chrono::Utc;
use futures::future::BoxFuture;
use futures::stream::{self, StreamExt};
use serde_json::Value;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::db::LocalStore;
use crate::error::{AppError, Result};
use crate::models::{
    AdminRole, AppEntry, BlogPost, BookmarkFolder, BookmarkLink, Comment, CommentId, NewApp,
    NewBlogPost, NewBookmarkFolder, NewBookmarkLink, NewNote, NewSubscriber, NewTester, Note,
    Subscriber, Tester, UserIdentity,
};
use crate::remote::RemoteStore;

use super::normalize;
use super::pipeline::Collection;
use super::staleness::CachePolicy;

const ADMIN_ROLES_COLLECTION: &str = "admin_roles";
const AUDIT_LOG_COLLECTION: &str = "audit_log";

fn comments_collection(app_id: &str) -> String {
    format!("apps/{app_id}/comments")
}

fn comments_cache_key(app_id: &str) -> String {
    format!("comments_{app_id}")
}

fn to_fields<T: serde::Serialize>(value: &T) -> Result<Value> {
    Ok(serde_json::to_value(value)?)
}

/// Orchestrates reads and writes between the local mirror and the remote
/// document store. The store handles are injected so tests run against
/// isolated instances and doubles; there is no process-wide singleton.
pub struct SyncService<R: RemoteStore> {
    local: LocalStore,
    remote: Arc<R>,
    policy: CachePolicy,
}

/// Handle to a live subscription. Dropping it (component unmount) tears the
/// feed down; `unsubscribe` is the explicit spelling of the same thing.
pub struct Subscription {
    handle: JoinHandle<()>,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

impl<R: RemoteStore> SyncService<R> {
    pub fn new(local: LocalStore, remote: Arc<R>, policy: CachePolicy) -> Self {
        Self {
            local,
            remote,
            policy,
        }
    }

    // Collection sync. One generic pipeline; the wrappers below are the whole
    // per-entity surface.

    /// Returns the mirrored collection, hitting the remote store only when
    /// `force` is set or the cache is stale. The clear + bulk insert +
    /// metadata touch is a single transaction; concurrent readers see the old
    /// generation or the new one, never a blend. Remote failures propagate
    /// and leave the mirror untouched.
    async fn sync_collection<T: Collection>(&self, force: bool) -> Result<Vec<T>> {
        if !force {
            let metadata = self.local.cache_metadata(T::CACHE_KEY).await?;
            if !self.policy.is_stale(metadata.as_ref(), Utc::now()) {
                let cached: Vec<T> = self.local.load_all().await?;
                // An empty table is a proxy for "never synced", even when the
                // metadata claims freshness.
                if !cached.is_empty() {
                    tracing::debug!(
                        "Serving {} {} records from cache",
                        cached.len(),
                        T::CACHE_KEY
                    );
                    return Ok(cached);
                }
            }
        }

        let documents = self.remote.list(T::COLLECTION).await?;
        let mut records: Vec<T> = documents
            .iter()
            .map(|doc| T::normalize(&doc.id, &doc.fields))
            .collect();
        T::sort(&mut records);

        self.local.replace_all(records.clone(), T::CACHE_KEY).await?;
        tracing::debug!("Synced {} {} records", records.len(), T::CACHE_KEY);
        Ok(records)
    }

    pub async fn sync_apps(&self, force: bool) -> Result<Vec<AppEntry>> {
        self.sync_collection(force).await
    }

    pub async fn sync_testers(&self, force: bool) -> Result<Vec<Tester>> {
        self.sync_collection(force).await
    }

    pub async fn sync_subscribers(&self, force: bool) -> Result<Vec<Subscriber>> {
        self.sync_collection(force).await
    }

    pub async fn sync_blog_posts(&self, force: bool) -> Result<Vec<BlogPost>> {
        self.sync_collection(force).await
    }

    pub async fn sync_notes(&self, force: bool) -> Result<Vec<Note>> {
        self.sync_collection(force).await
    }

    pub async fn sync_bookmark_folders(&self, force: bool) -> Result<Vec<BookmarkFolder>> {
        self.sync_collection(force).await
    }

    pub async fn sync_bookmark_links(&self, force: bool) -> Result<Vec<BookmarkLink>> {
        self.sync_collection(force).await
    }

    /// Same pipeline, scoped to one app's comment sub-collection. The scoped
    /// replace keeps optimistic pending rows out of the blast radius.
    pub async fn sync_comments(&self, app_id: &str, force: bool) -> Result<Vec<Comment>> {
        let cache_key = comments_cache_key(app_id);

        if !force {
            let metadata = self.local.cache_metadata(&cache_key).await?;
            if !self.policy.is_stale(metadata.as_ref(), Utc::now()) {
                let cached = self.local.comments_for_app(app_id).await?;
                if !cached.is_empty() {
                    return Ok(cached);
                }
            }
        }

        let documents = self.remote.list(&comments_collection(app_id)).await?;
        let mut comments: Vec<Comment> = documents
            .iter()
            .map(|doc| normalize::map_comment(&doc.id, app_id, &doc.fields))
            .collect();
        comments.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        self.local
            .replace_comments(app_id, comments.clone(), &cache_key)
            .await?;
        Ok(comments)
    }

    /// Refreshes every root collection with bounded concurrency. One
    /// collection failing does not abort the rest; callers get the
    /// per-collection outcomes.
    pub async fn sync_all(&self, force: bool) -> Vec<(&'static str, Result<usize>)> {
        let tasks: Vec<BoxFuture<'_, (&'static str, Result<usize>)>> = vec![
            Box::pin(async move { ("apps", self.sync_apps(force).await.map(|v| v.len())) }),
            Box::pin(async move { ("testers", self.sync_testers(force).await.map(|v| v.len())) }),
            Box::pin(async move {
                (
                    "subscribers",
                    self.sync_subscribers(force).await.map(|v| v.len()),
                )
            }),
            Box::pin(async move { ("blogs", self.sync_blog_posts(force).await.map(|v| v.len())) }),
            Box::pin(async move { ("notes", self.sync_notes(force).await.map(|v| v.len())) }),
            Box::pin(async move {
                (
                    "bookmark_folders",
                    self.sync_bookmark_folders(force).await.map(|v| v.len()),
                )
            }),
            Box::pin(async move {
                (
                    "bookmark_links",
                    self.sync_bookmark_links(force).await.map(|v| v.len()),
                )
            }),
        ];

        stream::iter(tasks).buffer_unordered(4).collect().await
    }

    // Live subscriptions. Every snapshot is re-normalized and clear-replaced
    // into the mirror before the callback sees it; callback order is snapshot
    // arrival order. A forced sync racing a snapshot on the same collection
    // is last-writer-wins.

    fn subscribe_collection<T, F>(&self, callback: F) -> Subscription
    where
        T: Collection,
        F: Fn(Vec<T>) + Send + 'static,
    {
        let mut feed = self.remote.watch(T::COLLECTION);
        let local = self.local.clone();

        let handle = tokio::spawn(async move {
            while let Some(snapshot) = feed.recv().await {
                let mut records: Vec<T> = snapshot
                    .iter()
                    .map(|doc| T::normalize(&doc.id, &doc.fields))
                    .collect();
                T::sort(&mut records);

                if let Err(e) = local.replace_all(records.clone(), T::CACHE_KEY).await {
                    tracing::warn!("Failed to apply {} snapshot: {}", T::CACHE_KEY, e);
                    continue;
                }
                callback(records);
            }
        });

        Subscription { handle }
    }

    pub fn subscribe_apps<F>(&self, callback: F) -> Subscription
    where
        F: Fn(Vec<AppEntry>) + Send + 'static,
    {
        self.subscribe_collection(callback)
    }

    pub fn subscribe_testers<F>(&self, callback: F) -> Subscription
    where
        F: Fn(Vec<Tester>) + Send + 'static,
    {
        self.subscribe_collection(callback)
    }

    pub fn subscribe_subscribers<F>(&self, callback: F) -> Subscription
    where
        F: Fn(Vec<Subscriber>) + Send + 'static,
    {
        self.subscribe_collection(callback)
    }

    pub fn subscribe_blog_posts<F>(&self, callback: F) -> Subscription
    where
        F: Fn(Vec<BlogPost>) + Send + 'static,
    {
        self.subscribe_collection(callback)
    }

    pub fn subscribe_notes<F>(&self, callback: F) -> Subscription
    where
        F: Fn(Vec<Note>) + Send + 'static,
    {
        self.subscribe_collection(callback)
    }

    pub fn subscribe_bookmark_folders<F>(&self, callback: F) -> Subscription
    where
        F: Fn(Vec<BookmarkFolder>) + Send + 'static,
    {
        self.subscribe_collection(callback)
    }

    pub fn subscribe_bookmark_links<F>(&self, callback: F) -> Subscription
    where
        F: Fn(Vec<BookmarkLink>) + Send + 'static,
    {
        self.subscribe_collection(callback)
    }

    pub fn subscribe_comments<F>(&self, app_id: &str, callback: F) -> Subscription
    where
        F: Fn(Vec<Comment>) + Send + 'static,
    {
        let mut feed = self.remote.watch(&comments_collection(app_id));
        let local = self.local.clone();
        let app_id = app_id.to_string();
        let cache_key = comments_cache_key(&app_id);

        let handle = tokio::spawn(async move {
            while let Some(snapshot) = feed.recv().await {
                let mut comments: Vec<Comment> = snapshot
                    .iter()
                    .map(|doc| normalize::map_comment(&doc.id, &app_id, &doc.fields))
                    .collect();
                comments.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

                if let Err(e) = local
                    .replace_comments(&app_id, comments.clone(), &cache_key)
                    .await
                {
                    tracing::warn!("Failed to apply {} snapshot: {}", cache_key, e);
                    continue;
                }
                callback(comments);
            }
        });

        Subscription { handle }
    }

    // Public lookups over the mirror. Slugs are not unique by construction;
    // first match wins.

    pub async fn find_app_by_slug(&self, slug: &str) -> Result<Option<AppEntry>> {
        Ok(self
            .sync_apps(false)
            .await?
            .into_iter()
            .find(|app| app.slug == slug))
    }

    pub async fn find_post_by_slug(&self, slug: &str) -> Result<Option<BlogPost>> {
        Ok(self
            .sync_blog_posts(false)
            .await?
            .into_iter()
            .find(|post| post.slug == slug))
    }

    // Mutation helpers. Write-through: the remote store is updated first and
    // the mirror patched only after remote success, so reads reflect writes
    // without waiting for the live feed to echo them.

    pub async fn add_app(&self, new: NewApp) -> Result<AppEntry> {
        let now = Utc::now();
        let app = AppEntry {
            id: Uuid::new_v4().to_string(),
            slug: normalize::slugify(&new.app_name),
            app_name: new.app_name,
            status: new.status,
            play_store_url: new.play_store_url,
            apk_url: new.apk_url,
            icon: new.icon,
            description: new.description,
            created_at: now,
            updated_at: now,
        };

        self.remote
            .set(AppEntry::COLLECTION, &app.id, to_fields(&app)?, false)
            .await?;
        self.local.put(app.clone()).await?;
        Ok(app)
    }

    pub async fn update_app(&self, mut app: AppEntry) -> Result<AppEntry> {
        app.updated_at = Utc::now();
        self.remote
            .set(AppEntry::COLLECTION, &app.id, to_fields(&app)?, true)
            .await?;
        self.local.put(app.clone()).await?;
        Ok(app)
    }

    /// Deletes an app and its comment sub-collection, children first. The
    /// cascade is not atomic across documents: a failure partway leaves the
    /// remaining children and the parent in place for a retry.
    pub async fn delete_app(&self, id: &str) -> Result<()> {
        let collection = comments_collection(id);
        let comments = self.remote.list(&collection).await?;
        for comment in &comments {
            self.remote.delete(&collection, &comment.id).await?;
        }
        self.remote.delete(AppEntry::COLLECTION, id).await?;

        self.local.delete_comments_for_app(id).await?;
        self.local.clear_metadata(&comments_cache_key(id)).await?;
        self.local.delete::<AppEntry>(id).await?;
        Ok(())
    }

    pub async fn add_blog_post(&self, new: NewBlogPost) -> Result<BlogPost> {
        let now = Utc::now();
        let excerpt = match new.excerpt {
            Some(excerpt) => excerpt,
            None => normalize::excerpt_from_html(&new.description),
        };
        let post = BlogPost {
            id: Uuid::new_v4().to_string(),
            slug: normalize::slugify(&new.title),
            title: new.title,
            date: new.date,
            categories: new.categories,
            description: new.description,
            excerpt,
            status: new.status,
            author: new.author,
            thumbnail_color: new.thumbnail_color,
            created_at: now,
            updated_at: now,
        };

        self.remote
            .set(BlogPost::COLLECTION, &post.id, to_fields(&post)?, false)
            .await?;
        self.local.put(post.clone()).await?;
        Ok(post)
    }

    pub async fn update_blog_post(&self, mut post: BlogPost) -> Result<BlogPost> {
        post.updated_at = Utc::now();
        self.remote
            .set(BlogPost::COLLECTION, &post.id, to_fields(&post)?, true)
            .await?;
        self.local.put(post.clone()).await?;
        Ok(post)
    }

    pub async fn delete_blog_post(&self, id: &str) -> Result<()> {
        self.remote.delete(BlogPost::COLLECTION, id).await?;
        self.local.delete::<BlogPost>(id).await?;
        Ok(())
    }

    pub async fn add_note(&self, new: NewNote) -> Result<Note> {
        let now = Utc::now();
        let note = Note {
            id: Uuid::new_v4().to_string(),
            title: new.title,
            content: new.content,
            tags: new.tags,
            is_pinned: new.is_pinned,
            created_at: now,
            updated_at: now,
        };

        self.remote
            .set(Note::COLLECTION, &note.id, to_fields(&note)?, false)
            .await?;
        self.local.put(note.clone()).await?;
        Ok(note)
    }

    pub async fn update_note(&self, mut note: Note) -> Result<Note> {
        note.updated_at = Utc::now();
        self.remote
            .set(Note::COLLECTION, &note.id, to_fields(&note)?, true)
            .await?;
        self.local.put(note.clone()).await?;
        Ok(note)
    }

    pub async fn delete_note(&self, id: &str) -> Result<()> {
        self.remote.delete(Note::COLLECTION, id).await?;
        self.local.delete::<Note>(id).await?;
        Ok(())
    }

    pub async fn add_tester(&self, new: NewTester) -> Result<Tester> {
        let tester = Tester {
            uid: new.uid.unwrap_or_else(|| Uuid::new_v4().to_string()),
            email: new.email,
            display_name: new.display_name,
            joined_at: Utc::now(),
            play_store_email: new.play_store_email,
            app_id: new.app_id,
        };

        self.remote
            .set(Tester::COLLECTION, &tester.uid, to_fields(&tester)?, false)
            .await?;
        self.local.put(tester.clone()).await?;
        Ok(tester)
    }

    pub async fn remove_tester(&self, uid: &str) -> Result<()> {
        self.remote.delete(Tester::COLLECTION, uid).await?;
        self.local.delete::<Tester>(uid).await?;
        Ok(())
    }

    pub async fn add_subscriber(&self, new: NewSubscriber) -> Result<Subscriber> {
        let subscriber = Subscriber {
            uid: new.uid.unwrap_or_else(|| Uuid::new_v4().to_string()),
            email: new.email,
            joined_at: Utc::now(),
        };

        self.remote
            .set(
                Subscriber::COLLECTION,
                &subscriber.uid,
                to_fields(&subscriber)?,
                false,
            )
            .await?;
        self.local.put(subscriber.clone()).await?;
        Ok(subscriber)
    }

    pub async fn remove_subscriber(&self, uid: &str) -> Result<()> {
        self.remote.delete(Subscriber::COLLECTION, uid).await?;
        self.local.delete::<Subscriber>(uid).await?;
        Ok(())
    }

    pub async fn add_folder(&self, new: NewBookmarkFolder) -> Result<BookmarkFolder> {
        let now = Utc::now();
        let folder = BookmarkFolder {
            id: Uuid::new_v4().to_string(),
            name: new.name,
            parent_id: new.parent_id,
            created_at: now,
            updated_at: now,
        };

        self.remote
            .set(
                BookmarkFolder::COLLECTION,
                &folder.id,
                to_fields(&folder)?,
                false,
            )
            .await?;
        self.local.put(folder.clone()).await?;
        Ok(folder)
    }

    pub async fn update_folder(&self, mut folder: BookmarkFolder) -> Result<BookmarkFolder> {
        folder.updated_at = Utc::now();
        self.remote
            .set(
                BookmarkFolder::COLLECTION,
                &folder.id,
                to_fields(&folder)?,
                true,
            )
            .await?;
        self.local.put(folder.clone()).await?;
        Ok(folder)
    }

    /// Deletes a folder and every descendant folder and link, children first.
    /// The fan-out is explicit recursion over the mirrored tree; the store
    /// enforces nothing. Not atomic across documents.
    pub async fn delete_folder(&self, id: &str) -> Result<()> {
        let folders = self.sync_bookmark_folders(false).await?;
        let links = self.sync_bookmark_links(false).await?;
        self.delete_folder_recursive(id, &folders, &links).await
    }

    fn delete_folder_recursive<'a>(
        &'a self,
        id: &'a str,
        folders: &'a [BookmarkFolder],
        links: &'a [BookmarkLink],
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            for link in links.iter().filter(|l| l.folder_id.as_deref() == Some(id)) {
                self.remote
                    .delete(BookmarkLink::COLLECTION, &link.id)
                    .await?;
                self.local.delete::<BookmarkLink>(&link.id).await?;
            }
            for child in folders.iter().filter(|f| f.parent_id.as_deref() == Some(id)) {
                self.delete_folder_recursive(&child.id, folders, links)
                    .await?;
            }
            self.remote.delete(BookmarkFolder::COLLECTION, id).await?;
            self.local.delete::<BookmarkFolder>(id).await?;
            Ok(())
        })
    }

    pub async fn add_link(&self, new: NewBookmarkLink) -> Result<BookmarkLink> {
        let now = Utc::now();
        let link = BookmarkLink {
            id: Uuid::new_v4().to_string(),
            title: new.title,
            url: new.url,
            folder_id: new.folder_id,
            created_at: now,
            updated_at: now,
        };

        self.remote
            .set(BookmarkLink::COLLECTION, &link.id, to_fields(&link)?, false)
            .await?;
        self.local.put(link.clone()).await?;
        Ok(link)
    }

    pub async fn update_link(&self, mut link: BookmarkLink) -> Result<BookmarkLink> {
        link.updated_at = Utc::now();
        self.remote
            .set(BookmarkLink::COLLECTION, &link.id, to_fields(&link)?, true)
            .await?;
        self.local.put(link.clone()).await?;
        Ok(link)
    }

    pub async fn delete_link(&self, id: &str) -> Result<()> {
        self.remote.delete(BookmarkLink::COLLECTION, id).await?;
        self.local.delete::<BookmarkLink>(id).await?;
        Ok(())
    }

    /// The one optimistic path: a pending row is visible locally before the
    /// remote write resolves, then reconciled explicitly. On success the
    /// pending row is swapped for the confirmed one; on failure it is removed.
    pub async fn post_comment(
        &self,
        app_id: &str,
        author: &UserIdentity,
        content: &str,
    ) -> Result<Comment> {
        let now = Utc::now();
        let temp_id = format!("pending-{}", Uuid::new_v4());
        let pending = Comment {
            id: CommentId::Pending(temp_id.clone()),
            app_id: app_id.to_string(),
            user_id: author.uid.clone(),
            display_name: author.display_name.clone(),
            content: content.to_string(),
            timestamp: now,
        };
        self.local.put_comment(pending).await?;

        let real_id = Uuid::new_v4().to_string();
        let fields = serde_json::json!({
            "appId": app_id,
            "userId": author.uid,
            "displayName": author.display_name,
            "content": content,
            "timestamp": now.to_rfc3339(),
        });

        match self
            .remote
            .set(&comments_collection(app_id), &real_id, fields, false)
            .await
        {
            Ok(()) => {
                self.local.delete_comment(&temp_id).await?;
                let confirmed = Comment {
                    id: CommentId::Confirmed(real_id),
                    app_id: app_id.to_string(),
                    user_id: author.uid.clone(),
                    display_name: author.display_name.clone(),
                    content: content.to_string(),
                    timestamp: now,
                };
                self.local.put_comment(confirmed.clone()).await?;
                Ok(confirmed)
            }
            Err(e) => {
                let _ = self.local.delete_comment(&temp_id).await;
                Err(e)
            }
        }
    }

    pub async fn delete_comment(&self, app_id: &str, comment_id: &str) -> Result<()> {
        self.remote
            .delete(&comments_collection(app_id), comment_id)
            .await?;
        self.local.delete_comment(comment_id).await?;
        Ok(())
    }

    /// Role changes reject self-targeting before any network call and leave
    /// an audit record carrying the actor's identity.
    pub async fn change_admin_role(
        &self,
        actor: &UserIdentity,
        target_uid: &str,
        role: AdminRole,
    ) -> Result<()> {
        if actor.uid == target_uid {
            return Err(AppError::Validation(
                "You cannot change your own role".to_string(),
            ));
        }

        let now = Utc::now();
        self.remote
            .set(
                ADMIN_ROLES_COLLECTION,
                target_uid,
                serde_json::json!({
                    "role": role.as_str(),
                    "updatedAt": now.to_rfc3339(),
                }),
                true,
            )
            .await?;

        self.remote
            .set(
                AUDIT_LOG_COLLECTION,
                &Uuid::new_v4().to_string(),
                serde_json::json!({
                    "action": "role_change",
                    "actorUid": actor.uid,
                    "actorEmail": actor.email,
                    "targetUid": target_uid,
                    "role": role.as_str(),
                    "timestamp": now.to_rfc3339(),
                }),
                false,
            )
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AppStatus;
    use crate::remote::memory::MemoryRemoteStore;
    use crate::remote::RawDocument;
    use chrono::Duration;
    use serde_json::json;

    async fn service() -> SyncService<MemoryRemoteStore> {
        let local = LocalStore::open_in_memory().await.unwrap();
        SyncService::new(
            local,
            Arc::new(MemoryRemoteStore::new()),
            CachePolicy::new(30),
        )
    }

    fn app_doc(id: &str) -> RawDocument {
        // Distinct creation times keep the newest-first ordering total.
        let second = id.as_bytes().first().copied().unwrap_or(0) % 60;
        RawDocument {
            id: id.to_string(),
            fields: json!({
                "appName": format!("App {id}"),
                "playStoreUrl": "https://play.example/x",
                "description": "demo",
                "createdAt": format!("2026-01-01T00:00:{second:02}Z"),
                "updatedAt": format!("2026-01-01T00:00:{second:02}Z"),
            }),
        }
    }

    fn folder_doc(id: &str, parent: Option<&str>) -> RawDocument {
        RawDocument {
            id: id.to_string(),
            fields: json!({
                "name": format!("Folder {id}"),
                "parentId": parent,
            }),
        }
    }

    fn link_doc(id: &str, folder: Option<&str>) -> RawDocument {
        RawDocument {
            id: id.to_string(),
            fields: json!({
                "title": format!("Link {id}"),
                "url": "https://example.dev",
                "folderId": folder,
            }),
        }
    }

    fn identity(uid: &str) -> UserIdentity {
        UserIdentity {
            uid: uid.to_string(),
            email: format!("{uid}@example.dev"),
            display_name: uid.to_string(),
        }
    }

    #[tokio::test]
    async fn fresh_cache_hit_makes_no_remote_calls() {
        let svc = service().await;
        svc.remote
            .seed("apps", (1..=5).map(|i| app_doc(&i.to_string())).collect());

        // Seed the mirror with its own generation and a fresh timestamp.
        let cached: Vec<AppEntry> = (1..=3)
            .map(|i| AppEntry::normalize(&format!("cached-{i}"), &app_doc("x").fields))
            .collect();
        svc.local.replace_all(cached, "apps").await.unwrap();

        let apps = svc.sync_apps(false).await.unwrap();

        assert_eq!(apps.len(), 3);
        assert_eq!(svc.remote.list_calls("apps"), 0);
    }

    #[tokio::test]
    async fn second_sync_within_window_serves_identical_cached_rows() {
        let svc = service().await;
        svc.remote.seed("apps", vec![app_doc("a"), app_doc("b")]);

        let first = svc.sync_apps(false).await.unwrap();
        let second = svc.sync_apps(false).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(svc.remote.list_calls("apps"), 1);
    }

    #[tokio::test]
    async fn force_always_refetches() {
        let svc = service().await;
        svc.remote.seed("apps", vec![app_doc("a")]);

        svc.sync_apps(false).await.unwrap();
        svc.sync_apps(true).await.unwrap();

        assert_eq!(svc.remote.list_calls("apps"), 2);
    }

    #[tokio::test]
    async fn stale_cache_is_fully_replaced() {
        let svc = service().await;
        svc.remote
            .seed("apps", (1..=5).map(|i| app_doc(&i.to_string())).collect());

        let old = vec![AppEntry::normalize("old", &app_doc("old").fields)];
        svc.local.replace_all(old, "apps").await.unwrap();
        svc.local
            .set_last_sync("apps", Utc::now() - Duration::minutes(40))
            .await
            .unwrap();

        let apps = svc.sync_apps(false).await.unwrap();

        assert_eq!(apps.len(), 5);
        assert_eq!(svc.local.count::<AppEntry>().await.unwrap(), 5);
        assert!(!apps.iter().any(|a| a.id == "old"));

        let meta = svc.local.cache_metadata("apps").await.unwrap();
        assert!(!svc.policy.is_stale(meta.as_ref(), Utc::now()));
    }

    #[tokio::test]
    async fn empty_mirror_forces_fetch_even_when_metadata_is_fresh() {
        let svc = service().await;
        svc.remote.seed("apps", vec![app_doc("a"), app_doc("b")]);
        svc.local.touch("apps").await.unwrap();

        let apps = svc.sync_apps(false).await.unwrap();

        assert_eq!(apps.len(), 2);
        assert_eq!(svc.remote.list_calls("apps"), 1);
    }

    #[tokio::test]
    async fn remote_failure_propagates_and_leaves_the_mirror_untouched() {
        let svc = service().await;
        let old: Vec<AppEntry> = (1..=3)
            .map(|i| AppEntry::normalize(&format!("old-{i}"), &app_doc("x").fields))
            .collect();
        svc.local.replace_all(old, "apps").await.unwrap();
        svc.local
            .set_last_sync("apps", Utc::now() - Duration::minutes(40))
            .await
            .unwrap();
        svc.remote.set_failing(true);

        let result = svc.sync_apps(false).await;

        assert!(result.is_err());
        assert_eq!(svc.local.count::<AppEntry>().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn snapshot_overwrite_keeps_only_the_latest_generation() {
        let svc = service().await;
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let subscription = svc.subscribe_apps(move |apps| {
            let _ = tx.send(apps);
        });

        svc.remote
            .push_snapshot("apps", vec![app_doc("a1"), app_doc("a2")])
            .await;
        svc.remote
            .push_snapshot(
                "apps",
                vec![app_doc("b1"), app_doc("b2"), app_doc("b3")],
            )
            .await;

        // The watch also fires once with the initial (empty) result set.
        let mut latest = Vec::new();
        while latest.len() != 3 {
            latest = rx.recv().await.unwrap();
        }

        let mirrored: Vec<AppEntry> = svc.local.load_all().await.unwrap();
        let mut ids: Vec<&str> = mirrored.iter().map(|a| a.id.as_str()).collect();
        ids.sort();
        assert_eq!(ids, vec!["b1", "b2", "b3"]);

        subscription.unsubscribe();
    }

    #[tokio::test]
    async fn folder_delete_cascades_through_the_whole_subtree() {
        let svc = service().await;
        svc.remote.seed(
            "bookmark_folders",
            vec![
                folder_doc("root", None),
                folder_doc("child", Some("root")),
                folder_doc("grandchild", Some("child")),
                folder_doc("other", None),
            ],
        );
        svc.remote.seed(
            "bookmark_links",
            vec![
                link_doc("l-root", Some("root")),
                link_doc("l-child", Some("child")),
                link_doc("l-grand", Some("grandchild")),
                link_doc("l-other", Some("other")),
            ],
        );
        svc.sync_bookmark_folders(true).await.unwrap();
        svc.sync_bookmark_links(true).await.unwrap();

        svc.delete_folder("root").await.unwrap();

        let folders: Vec<BookmarkFolder> = svc.local.load_all().await.unwrap();
        let links: Vec<BookmarkLink> = svc.local.load_all().await.unwrap();
        assert_eq!(folders.len(), 1);
        assert_eq!(folders[0].id, "other");
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].id, "l-other");
        assert_eq!(svc.remote.document_count("bookmark_folders"), 1);
        assert_eq!(svc.remote.document_count("bookmark_links"), 1);
    }

    #[tokio::test]
    async fn app_delete_cascades_to_comments() {
        let svc = service().await;
        svc.remote.seed("apps", vec![app_doc("a1")]);
        svc.remote.seed(
            "apps/a1/comments",
            vec![RawDocument {
                id: "c1".to_string(),
                fields: json!({ "userId": "u1", "content": "hi" }),
            }],
        );
        svc.sync_apps(true).await.unwrap();
        svc.sync_comments("a1", true).await.unwrap();

        svc.delete_app("a1").await.unwrap();

        assert_eq!(svc.local.count::<AppEntry>().await.unwrap(), 0);
        assert!(svc.local.comments_for_app("a1").await.unwrap().is_empty());
        assert_eq!(svc.remote.document_count("apps"), 0);
        assert_eq!(svc.remote.document_count("apps/a1/comments"), 0);
        assert!(svc
            .local
            .cache_metadata("comments_a1")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn add_blog_post_writes_through_and_derives_slug_and_excerpt() {
        let svc = service().await;

        let post = svc
            .add_blog_post(NewBlogPost {
                title: "Hello, World!".to_string(),
                date: Utc::now(),
                categories: vec!["rust".to_string()],
                description: "<p>Body text here.</p>".to_string(),
                excerpt: None,
                status: crate::models::PostStatus::Published,
                author: None,
                thumbnail_color: None,
            })
            .await
            .unwrap();

        assert_eq!(post.slug, "hello-world");
        assert!(post.excerpt.contains("Body text"));
        assert!(svc.remote.contains("blogs", &post.id));
        assert_eq!(svc.local.count::<BlogPost>().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn failed_remote_write_never_touches_the_mirror() {
        let svc = service().await;
        svc.remote.set_failing(true);

        let result = svc
            .add_note(NewNote {
                title: "n".to_string(),
                content: "c".to_string(),
                tags: vec![],
                is_pinned: false,
            })
            .await;

        assert!(result.is_err());
        assert_eq!(svc.local.count::<Note>().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn post_comment_confirms_the_optimistic_row() {
        let svc = service().await;

        let comment = svc
            .post_comment("a1", &identity("u1"), "nice app")
            .await
            .unwrap();

        assert!(matches!(comment.id, CommentId::Confirmed(_)));
        let local = svc.local.comments_for_app("a1").await.unwrap();
        assert_eq!(local.len(), 1);
        assert!(!local[0].id.is_pending());
        assert!(svc.remote.contains("apps/a1/comments", comment.id.as_str()));
    }

    #[tokio::test]
    async fn failed_comment_post_rolls_the_pending_row_back() {
        let svc = service().await;
        svc.remote.set_failing(true);

        let result = svc.post_comment("a1", &identity("u1"), "nice app").await;

        assert!(result.is_err());
        assert!(svc.local.comments_for_app("a1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn own_role_change_is_rejected_before_any_remote_call() {
        let svc = service().await;

        let result = svc
            .change_admin_role(&identity("u1"), "u1", AdminRole::Editor)
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(svc.remote.document_count("audit_log"), 0);
    }

    #[tokio::test]
    async fn role_change_writes_the_role_and_an_audit_record() {
        let svc = service().await;

        svc.change_admin_role(&identity("u1"), "u2", AdminRole::Admin)
            .await
            .unwrap();

        assert!(svc.remote.contains("admin_roles", "u2"));
        assert_eq!(svc.remote.document_count("audit_log"), 1);
    }

    #[tokio::test]
    async fn slug_lookup_returns_first_match() {
        let svc = service().await;
        svc.remote.seed(
            "apps",
            vec![
                RawDocument {
                    id: "a1".to_string(),
                    fields: json!({ "appName": "Same Name", "createdAt": "2026-01-02T00:00:00Z" }),
                },
                RawDocument {
                    id: "a2".to_string(),
                    fields: json!({ "appName": "Same Name", "createdAt": "2026-01-01T00:00:00Z" }),
                },
            ],
        );

        let found = svc.find_app_by_slug("same-name").await.unwrap().unwrap();
        // Newest-first ordering makes a1 the first match.
        assert_eq!(found.id, "a1");
        assert!(svc.find_app_by_slug("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn sync_all_reports_per_collection_outcomes() {
        let svc = service().await;
        svc.remote.seed("apps", vec![app_doc("a")]);
        svc.remote.seed("notes", vec![RawDocument {
            id: "n1".to_string(),
            fields: json!({ "title": "t", "content": "c" }),
        }]);

        let outcomes = svc.sync_all(true).await;

        assert_eq!(outcomes.len(), 7);
        let apps = outcomes.iter().find(|(name, _)| *name == "apps").unwrap();
        assert_eq!(*apps.1.as_ref().unwrap(), 1);
        let notes = outcomes.iter().find(|(name, _)| *name == "notes").unwrap();
        assert_eq!(*notes.1.as_ref().unwrap(), 1);
    }

    #[tokio::test]
    async fn update_app_stamps_updated_at() {
        let svc = service().await;
        let app = svc
            .add_app(NewApp {
                app_name: "My App".to_string(),
                status: AppStatus::Testing,
                play_store_url: String::new(),
                apk_url: None,
                icon: None,
                description: String::new(),
            })
            .await
            .unwrap();

        let before = app.updated_at;
        let updated = svc.update_app(app).await.unwrap();
        assert!(updated.updated_at >= before);
    }
}
