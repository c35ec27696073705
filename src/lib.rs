//! Offline-first data layer for a portfolio site and its admin dashboard.
//!
//! The remote document store is authoritative; a local SQLite mirror serves
//! reads between syncs. Reads go through [`SyncService`]: fresh cache hits
//! come straight from the mirror, stale ones trigger a full refetch that
//! atomically replaces the mirrored table. Live subscriptions push every
//! remote snapshot into the mirror and on to the caller. Mutations write
//! through: remote first, mirror patched after success.
//!
//! The mirror is a disposable projection: always rebuildable from the remote
//! store, replaced wholesale on every sync, never merged.

pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod models;
pub mod remote;
pub mod search;
pub mod sync;

pub use config::Config;
pub use db::{CacheMetadata, LocalStore};
pub use error::{AppError, Result};
pub use remote::{HttpRemoteStore, RemoteStore};
pub use sync::{CachePolicy, Subscription, SyncService};
