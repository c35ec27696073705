//! In-memory remote store double for tests: records per-collection list-call
//! counts, can be flipped into a failing state, and lets tests inject
//! arbitrary snapshots into open watches.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use serde_json::Value;
use tokio::sync::mpsc;

use crate::error::{AppError, Result};

use super::store::{CollectionSnapshot, RawDocument, RemoteStore};

#[derive(Default)]
pub struct MemoryRemoteStore {
    collections: Mutex<HashMap<String, BTreeMap<String, Value>>>,
    watchers: Mutex<HashMap<String, Vec<mpsc::Sender<CollectionSnapshot>>>>,
    list_calls: Mutex<HashMap<String, usize>>,
    failing: Mutex<bool>,
}

impl MemoryRemoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, collection: &str, documents: Vec<RawDocument>) {
        let mut collections = self.collections.lock().unwrap();
        let entry = collections.entry(collection.to_string()).or_default();
        for doc in documents {
            entry.insert(doc.id, doc.fields);
        }
    }

    pub fn list_calls(&self, collection: &str) -> usize {
        *self
            .list_calls
            .lock()
            .unwrap()
            .get(collection)
            .unwrap_or(&0)
    }

    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock().unwrap() = failing;
    }

    pub fn document_count(&self, collection: &str) -> usize {
        self.collections
            .lock()
            .unwrap()
            .get(collection)
            .map(|docs| docs.len())
            .unwrap_or(0)
    }

    pub fn contains(&self, collection: &str, id: &str) -> bool {
        self.collections
            .lock()
            .unwrap()
            .get(collection)
            .map(|docs| docs.contains_key(id))
            .unwrap_or(false)
    }

    /// Delivers an arbitrary snapshot to every open watch on `collection`,
    /// bypassing the document map.
    pub async fn push_snapshot(&self, collection: &str, snapshot: CollectionSnapshot) {
        let senders: Vec<mpsc::Sender<CollectionSnapshot>> = self
            .watchers
            .lock()
            .unwrap()
            .get(collection)
            .cloned()
            .unwrap_or_default();

        for sender in senders {
            let _ = sender.send(snapshot.clone()).await;
        }
    }

    fn current_snapshot(&self, collection: &str) -> CollectionSnapshot {
        self.collections
            .lock()
            .unwrap()
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, fields)| RawDocument {
                        id: id.clone(),
                        fields: fields.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    async fn notify(&self, collection: &str) {
        let snapshot = self.current_snapshot(collection);
        self.push_snapshot(collection, snapshot).await;
    }

    fn check_failing(&self) -> Result<()> {
        if *self.failing.lock().unwrap() {
            return Err(AppError::RemoteApi("remote unavailable".to_string()));
        }
        Ok(())
    }
}

impl RemoteStore for MemoryRemoteStore {
    async fn list(&self, collection: &str) -> Result<Vec<RawDocument>> {
        *self
            .list_calls
            .lock()
            .unwrap()
            .entry(collection.to_string())
            .or_insert(0) += 1;
        self.check_failing()?;
        Ok(self.current_snapshot(collection))
    }

    async fn set(&self, collection: &str, id: &str, fields: Value, merge: bool) -> Result<()> {
        self.check_failing()?;

        {
            let mut collections = self.collections.lock().unwrap();
            let entry = collections.entry(collection.to_string()).or_default();
            let merged = if merge {
                match (entry.get(id), fields) {
                    (Some(Value::Object(existing)), Value::Object(incoming)) => {
                        let mut merged = existing.clone();
                        merged.extend(incoming);
                        Value::Object(merged)
                    }
                    (_, other) => other,
                }
            } else {
                fields
            };
            entry.insert(id.to_string(), merged);
        }

        self.notify(collection).await;
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        self.check_failing()?;

        {
            let mut collections = self.collections.lock().unwrap();
            if let Some(entry) = collections.get_mut(collection) {
                entry.remove(id);
            }
        }

        self.notify(collection).await;
        Ok(())
    }

    fn watch(&self, collection: &str) -> mpsc::Receiver<CollectionSnapshot> {
        let (tx, rx) = mpsc::channel(16);
        // Live subscriptions fire immediately with the current result set.
        let _ = tx.try_send(self.current_snapshot(collection));
        self.watchers
            .lock()
            .unwrap()
            .entry(collection.to_string())
            .or_default()
            .push(tx);
        rx
    }
}
