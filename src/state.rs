use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::AppConfig;
use crate::db::pg::{KeeperSettings, PgKeeper};
use crate::db::Keeper;
use crate::repository::Repository;

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let db = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;

        if let Err(e) = sqlx::migrate!("./migrations").run(&db).await {
            warn!(error = %e, "migrations folder not found or migration failed; continuing");
        }

        let keeper = Arc::new(PgKeeper::new(
            db,
            KeeperSettings {
                tx_timeout: Duration::from_millis(config.tx_timeout_ms),
                user_update_interval: time::Duration::minutes(config.user_update_interval_minutes),
                stale_batch: config.user_update_batch,
            },
        )) as Arc<dyn Keeper>;
        let clock = Arc::new(SystemClock) as Arc<dyn Clock>;

        let repo = Repository::load(keeper, clock)
            .await
            .context("load repository cache")?;
        info!("repository ready");

        Ok(Self::from_parts(Arc::new(repo), config))
    }

    pub fn from_parts(repo: Arc<Repository>, config: Arc<AppConfig>) -> Self {
        Self { repo, config }
    }

    /// State over the in-memory keeper, with the given clock.
    #[cfg(test)]
    pub async fn fake(clock: Arc<dyn Clock>) -> Self {
        use crate::db::memory::MemoryKeeper;

        let keeper = Arc::new(MemoryKeeper::default()) as Arc<dyn Keeper>;
        let repo = Repository::load(keeper, clock)
            .await
            .expect("memory keeper loads");
        Self::from_parts(Arc::new(repo), Arc::new(AppConfig::for_tests()))
    }
}
