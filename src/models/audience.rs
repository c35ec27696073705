use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A closed-testing participant for one of the apps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tester {
    pub uid: String,
    pub email: String,
    pub display_name: String,
    pub joined_at: DateTime<Utc>,
    pub play_store_email: Option<String>,
    pub app_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscriber {
    pub uid: String,
    pub email: String,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewTester {
    /// Authenticated uid when the tester self-enrolled; generated otherwise.
    pub uid: Option<String>,
    pub email: String,
    pub display_name: String,
    pub play_store_email: Option<String>,
    pub app_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewSubscriber {
    pub uid: Option<String>,
    pub email: String,
}
