use std::sync::Arc;
use std::time::Duration;

mod app;
mod auth;
mod clock;
mod config;
mod db;
mod directory;
mod error;
mod formats;
mod repository;
mod state;
mod tasks;
mod tracking;
mod tz;
mod users;

use crate::directory::{refresher, DirectoryClient, HttpDirectory};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        "timetracker=debug,axum=info,tower_http=info,sqlx=warn".to_string()
    });
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let app_state = state::AppState::init().await?;

    let refresher = match app_state.config.directory.url.clone() {
        Some(url) => {
            let cfg = &app_state.config.directory;
            let client = Arc::new(HttpDirectory::new(url)?) as Arc<dyn DirectoryClient>;
            Some(tokio::spawn(refresher::run(
                app_state.repo.clone(),
                client,
                Duration::from_millis(cfg.interval_ms),
                cfg.concurrency,
            )))
        }
        None => {
            tracing::info!("DIRECTORY_URL not set; user enrichment disabled");
            None
        }
    };

    let result = app::serve(app::build_app(app_state)).await;
    if let Some(handle) = refresher {
        handle.abort();
    }
    result
}
