//! CSV export for the admin dashboard's audience lists.

use crate::models::{Subscriber, Tester};

pub fn testers_to_csv(testers: &[Tester]) -> String {
    let mut lines = Vec::with_capacity(testers.len() + 1);
    lines.push("uid,email,displayName,joinedAt,playStoreEmail,appId".to_string());

    for tester in testers {
        lines.push(
            [
                csv_field(&tester.uid),
                csv_field(&tester.email),
                csv_field(&tester.display_name),
                csv_field(&tester.joined_at.to_rfc3339()),
                csv_field(tester.play_store_email.as_deref().unwrap_or("")),
                csv_field(tester.app_id.as_deref().unwrap_or("")),
            ]
            .join(","),
        );
    }

    lines.join("\n")
}

pub fn subscribers_to_csv(subscribers: &[Subscriber]) -> String {
    let mut lines = Vec::with_capacity(subscribers.len() + 1);
    lines.push("uid,email,joinedAt".to_string());

    for subscriber in subscribers {
        lines.push(
            [
                csv_field(&subscriber.uid),
                csv_field(&subscriber.email),
                csv_field(&subscriber.joined_at.to_rfc3339()),
            ]
            .join(","),
        );
    }

    lines.join("\n")
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
