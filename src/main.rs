use std::path::Path;

use anyhow::Context;

use inventory_sync::config::Config;
use inventory_sync::db::{create_pool, PgFieldStore, PgItemStore};
use inventory_sync::repo::{CustomFieldRegistry, ItemRepository};
use inventory_sync::session::Session;
use inventory_sync::sheet;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Export tool: loads one user's inventory and writes the CSV export to
/// EXPORT_DIR. The user comes from INVENTORY_USER_ID; without it the
/// repositories stay in the signed-out state and nothing is exported.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "inventory_sync=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;

    tracing::info!("Connecting to database...");
    let pool = create_pool(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    let session = config.user_id.map(Session::new);
    if session.is_none() {
        tracing::warn!("INVENTORY_USER_ID not set; running signed out");
    }

    let mut registry = CustomFieldRegistry::new(PgFieldStore::new(pool.clone()), session);
    let mut repo = ItemRepository::new(PgItemStore::new(pool), session);

    registry.load().await.context("Failed to load custom fields")?;
    repo.load().await.context("Failed to load items")?;

    let summary = repo.summary();
    tracing::info!(
        items = summary.total,
        fields = registry.fields().len(),
        "inventory loaded"
    );
    for (category, count) in &summary.by_category {
        tracing::debug!(category = %category, count = *count, "category");
    }

    match sheet::export(repo.items(), registry.fields())? {
        Some(export) => {
            let path = Path::new(&config.export_dir).join(&export.file_name);
            std::fs::write(&path, &export.bytes)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), "export written");
        }
        None => tracing::info!("no items to export"),
    }

    Ok(())
}
