pub mod app;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod db;
pub mod feedback;
pub mod filter;
pub mod gateway;
pub mod industry;
pub mod models;
pub mod reaction;
pub mod regions;
mod utils;

use anyhow::Context;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub use app::App;
pub use config::AppConfig;
pub use filter::{filter_and_sort, FilterCriteria};
pub use models::{AppSettings, Event, UserSession};
pub use reaction::{toggle_reaction, Reaction, ReactionKind};

const FEED_PREVIEW: usize = 10;

/// Installs the `RUST_LOG`-driven subscriber; later calls are no-ops.
pub fn init_logging() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "event_monitor_lib=info,event_monitor=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

pub async fn run() -> anyhow::Result<()> {
    init_logging();
    let config = AppConfig::from_env();
    let mut app = App::new(&config).context("failed to build store client")?;
    let total = app
        .load_catalog()
        .await
        .context("failed to load events")?;

    let feed = app.feed();
    tracing::info!(
        total,
        shown = feed.len(),
        region = ?app.settings().primary_region(),
        "feed ready"
    );
    for event in feed.iter().take(FEED_PREVIEW) {
        tracing::info!(
            id = %event.id,
            title = %event.title,
            date = %event.date,
            country = %event.country,
            likes = event.likes,
            dislikes = event.dislikes,
            "event"
        );
    }
    Ok(())
}
