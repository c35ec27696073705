use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::mpsc;
use url::Url;

use crate::error::{AppError, Result};

use super::store::{CollectionSnapshot, RawDocument, RemoteStore};

/// REST client for the remote document store.
///
/// The store has no push channel on this surface, so `watch` polls: a spawned
/// task re-lists the collection and emits a snapshot whenever the result set
/// fingerprint changes. Dropping the receiver ends the task.
#[derive(Clone)]
pub struct HttpRemoteStore {
    client: Client,
    base: Url,
    api_key: Option<String>,
    poll_interval: Duration,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    documents: Vec<DocumentPayload>,
}

#[derive(Debug, Deserialize)]
struct DocumentPayload {
    id: String,
    #[serde(default)]
    fields: Value,
}

impl HttpRemoteStore {
    pub fn new(base_url: &str, api_key: Option<String>, poll_interval: Duration) -> Result<Self> {
        let base = Url::parse(base_url)
            .map_err(|e| AppError::Config(format!("invalid remote base URL: {e}")))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("showcase-sync/1.0")
            .build()
            .expect("Failed to create HTTP client");

        Ok(Self {
            client,
            base,
            api_key,
            poll_interval,
        })
    }

    /// `collection` may be a sub-collection path; every segment is encoded
    /// individually so ids with reserved characters survive.
    fn endpoint(&self, collection: &str, id: Option<&str>) -> String {
        let mut path: Vec<String> = collection
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect();
        if let Some(id) = id {
            path.push(urlencoding::encode(id).into_owned());
        }
        format!(
            "{}/{}",
            self.base.as_str().trim_end_matches('/'),
            path.join("/")
        )
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    async fn list_documents(&self, collection: &str) -> Result<Vec<RawDocument>> {
        let response = self
            .request(self.client.get(self.endpoint(collection, None)))
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(AppError::RemoteApi(format!("API error: {}", error_text)));
        }

        let list: ListResponse = response.json().await?;
        Ok(list
            .documents
            .into_iter()
            .map(|doc| RawDocument {
                id: doc.id,
                fields: doc.fields,
            })
            .collect())
    }
}

impl RemoteStore for HttpRemoteStore {
    async fn list(&self, collection: &str) -> Result<Vec<RawDocument>> {
        self.list_documents(collection).await
    }

    async fn set(&self, collection: &str, id: &str, fields: Value, merge: bool) -> Result<()> {
        let mut url = self.endpoint(collection, Some(id));
        if merge {
            url.push_str("?merge=true");
        }

        let response = self
            .request(self.client.put(url))
            .json(&serde_json::json!({ "fields": fields }))
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(AppError::RemoteApi(format!("API error: {}", error_text)));
        }

        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        let response = self
            .request(self.client.delete(self.endpoint(collection, Some(id))))
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(AppError::RemoteApi(format!("API error: {}", error_text)));
        }

        Ok(())
    }

    fn watch(&self, collection: &str) -> mpsc::Receiver<CollectionSnapshot> {
        let (tx, rx) = mpsc::channel(8);
        let store = self.clone();
        let collection = collection.to_string();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(store.poll_interval);
            let mut last_fingerprint: Option<u64> = None;

            loop {
                ticker.tick().await;

                let documents = match store.list_documents(&collection).await {
                    Ok(documents) => documents,
                    Err(e) => {
                        tracing::debug!("Watch poll failed for {}: {}", collection, e);
                        continue;
                    }
                };

                let fingerprint = snapshot_fingerprint(&documents);
                if last_fingerprint == Some(fingerprint) {
                    continue;
                }
                last_fingerprint = Some(fingerprint);

                if tx.send(documents).await.is_err() {
                    // Receiver dropped; subscription torn down.
                    break;
                }
            }
        });

        rx
    }
}

fn snapshot_fingerprint(documents: &[RawDocument]) -> u64 {
    let mut hasher = DefaultHasher::new();
    for doc in documents {
        doc.id.hash(&mut hasher);
        doc.fields.to_string().hash(&mut hasher);
    }
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_encodes_each_path_segment() {
        let store =
            HttpRemoteStore::new("https://content.example.dev/v1", None, Duration::from_secs(5))
                .unwrap();

        assert_eq!(
            store.endpoint("apps", None),
            "https://content.example.dev/v1/apps"
        );
        assert_eq!(
            store.endpoint("apps/my app/comments", Some("c 1")),
            "https://content.example.dev/v1/apps/my%20app/comments/c%201"
        );
    }

    #[test]
    fn fingerprint_tracks_content_changes() {
        let a = vec![RawDocument {
            id: "1".to_string(),
            fields: serde_json::json!({"title": "a"}),
        }];
        let b = vec![RawDocument {
            id: "1".to_string(),
            fields: serde_json::json!({"title": "b"}),
        }];

        assert_eq!(snapshot_fingerprint(&a), snapshot_fingerprint(&a.clone()));
        assert_ne!(snapshot_fingerprint(&a), snapshot_fingerprint(&b));
    }

    #[test]
    fn rejects_invalid_base_url() {
        assert!(HttpRemoteStore::new("not a url", None, Duration::from_secs(5)).is_err());
    }
}
