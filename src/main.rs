use std::sync::Arc;
use std::time::Duration;

use showcase_sync::config::Config;
use showcase_sync::db::LocalStore;
use showcase_sync::error::Result;
use showcase_sync::remote::HttpRemoteStore;
use showcase_sync::sync::{CachePolicy, SyncService};

/// Headless refresh of every mirrored collection. Suitable for cron; pass
/// `--force` to bypass the staleness check.
#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (only show warnings and errors by default)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let force = args.iter().any(|arg| arg == "--force");

    let config = Config::load()?;
    let local = LocalStore::open(&config.db_path).await?;
    let remote = Arc::new(HttpRemoteStore::new(
        &config.remote_base_url,
        config.remote_api_key.clone(),
        Duration::from_secs(config.watch_poll_secs),
    )?);
    let service = SyncService::new(
        local,
        remote,
        CachePolicy::new(config.cache_max_age_minutes),
    );

    let outcomes = service.sync_all(force).await;

    let mut failures = 0;
    for (collection, outcome) in &outcomes {
        match outcome {
            Ok(count) => println!("{collection}: {count} records"),
            Err(e) => {
                failures += 1;
                tracing::error!("Failed to sync {}: {}", collection, e);
            }
        }
    }

    if failures > 0 {
        return Err(anyhow::anyhow!("{} collection(s) failed to sync", failures).into());
    }

    Ok(())
}
