use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use super::DirectoryClient;
use crate::error::{LedgerError, LedgerResult};
use crate::repository::Repository;

/// One enrichment pass: fetch stale users, look each up with at most
/// `concurrency` requests in flight, apply what came back. Returns the number
/// of users actually refreshed.
pub async fn refresh_once(
    repo: &Repository,
    directory: Arc<dyn DirectoryClient>,
    concurrency: usize,
) -> LedgerResult<usize> {
    let stale = repo.get_non_update_users().await?;
    if stale.is_empty() {
        return Ok(0);
    }
    debug!(count = stale.len(), "stale users to enrich");

    let permits = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut lookups = JoinSet::new();
    for user in stale {
        let permit = permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| LedgerError::Internal(e.to_string()))?;
        let directory = directory.clone();
        lookups.spawn(async move {
            let _permit = permit;
            let key = user.key();
            (key, directory.lookup(key).await)
        });
    }

    let mut batch = Vec::new();
    while let Some(joined) = lookups.join_next().await {
        match joined {
            Ok((_, Ok(data))) => batch.push(data),
            Ok((key, Err(e))) => warn!(%key, error = %e, "directory lookup failed; skipping"),
            Err(e) => error!(error = %e, "directory lookup task failed"),
        }
    }
    if batch.is_empty() {
        return Ok(0);
    }
    repo.update_users_info(&batch).await
}

/// Runs [`refresh_once`] every `interval` (at least 1 ms) until the task is
/// aborted.
pub async fn run(
    repo: Arc<Repository>,
    directory: Arc<dyn DirectoryClient>,
    interval: Duration,
    concurrency: usize,
) {
    let interval = interval.max(Duration::from_millis(1));
    info!(
        interval_ms = interval.as_millis() as u64,
        concurrency, "directory refresher started"
    );
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        match refresh_once(&repo, directory.clone(), concurrency).await {
            Ok(0) => {}
            Ok(n) => info!(updated = n, "user profiles refreshed"),
            Err(e) => error!(error = %e, "user refresh pass failed"),
        }
    }
}
