use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::{Level, info, warn};

use common::storage::BlobStore;
use common::storage::local::LocalBlobStore;
use common::storage::s3::{S3BlobStore, S3Settings};

use server::config::{AppConfig, StorageBackend};
use server::database;
use server::generator::Generator;
use server::state::AppState;

async fn init_blob_store(config: &AppConfig) -> anyhow::Result<Arc<dyn BlobStore>> {
    match config.storage.backend {
        StorageBackend::S3 => {
            let store = S3BlobStore::connect(&S3Settings {
                bucket: config.storage.bucket.clone(),
                region: config.storage.region.clone(),
                endpoint: config.storage.endpoint.clone(),
                access_key: config.storage.access_key.clone(),
                secret_key: config.storage.secret_key.clone(),
                public_base_url: config.storage.public_base_url.clone(),
            })
            .await
            .context("Failed to connect to object storage")?;
            info!(bucket = %config.storage.bucket, "Object storage ready");
            Ok(Arc::new(store))
        }
        StorageBackend::Local => {
            let public_base = config
                .storage
                .public_base_url
                .clone()
                .unwrap_or_else(|| "/storage".to_string());
            let store = LocalBlobStore::new(config.storage.local_root.clone(), public_base)
                .await
                .context("Failed to initialize local blob store")?;
            info!(root = %config.storage.local_root.display(), "Local blob store ready");
            Ok(Arc::new(store))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let config = AppConfig::load().context("Failed to load config")?;

    let db = database::init_db(&config.database.url)
        .await
        .context("Failed to initialize database")?;

    let blob_store = init_blob_store(&config).await?;

    if !config.assets.fallback_model.exists() {
        warn!(
            path = %config.assets.fallback_model.display(),
            "Fallback model asset not found; uploads will fail when the generator produces no model"
        );
    }
    if !config.assets.frontend_dir.exists() {
        warn!(
            path = %config.assets.frontend_dir.display(),
            "Frontend directory not found, static pages will 404"
        );
    }

    let generator = Arc::new(Generator::new(
        config.generator.program.clone(),
        config.generator.args.clone(),
        Duration::from_secs(config.generator.timeout_secs),
    ));

    let addr = format!("{}:{}", config.server.host, config.server.port);

    let state = AppState {
        db,
        blob_store,
        generator,
        config,
    };
    let app = server::build_router(state);

    info!("Server running at http://{addr}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind server address")?;
    axum::serve(listener, app).await?;

    Ok(())
}
