use std::future::Future;

use serde_json::Value;
use tokio::sync::mpsc;

use crate::error::Result;

/// A document as the remote store hands it over: an id plus an arbitrary
/// JSON field map. Shape is not trusted; the normalizers default everything.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDocument {
    pub id: String,
    pub fields: Value,
}

/// The full current result set of a collection, delivered on every change.
/// The feed is snapshots, not diffs.
pub type CollectionSnapshot = Vec<RawDocument>;

/// The consumed contract of the cloud document store. Collection paths are
/// plain strings so sub-collections compose (`apps/<id>/comments`).
///
/// The sync service is generic over this seam; production uses
/// [`HttpRemoteStore`](super::HttpRemoteStore), tests an in-memory double.
pub trait RemoteStore: Send + Sync + 'static {
    /// Queries the entire collection. No delta fetch exists.
    fn list(&self, collection: &str) -> impl Future<Output = Result<Vec<RawDocument>>> + Send;

    /// Creates or overwrites a document; `merge` patches into existing fields
    /// instead of replacing them.
    fn set(
        &self,
        collection: &str,
        id: &str,
        fields: Value,
        merge: bool,
    ) -> impl Future<Output = Result<()>> + Send;

    fn delete(&self, collection: &str, id: &str) -> impl Future<Output = Result<()>> + Send;

    /// Opens a live subscription. Dropping the receiver tears it down;
    /// reconnection semantics are whatever the underlying client provides.
    fn watch(&self, collection: &str) -> mpsc::Receiver<CollectionSnapshot>;
}
