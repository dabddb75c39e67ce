mod core;
mod features;
mod modules;
mod shared;

use crate::core::config::{AttachmentBackend, Config, StorageConfig};
use crate::core::openapi::{ApiDoc, SwaggerInfoModifier};
use crate::core::router::{api_routes, AppServices};
use crate::core::{database, middleware};
use crate::features::geocoding::{GeoPlaceResolver, NominatimClient};
use crate::features::items::services::{ItemRepository, ItemStore, MemoryItemStore, PgItemStore};
use crate::features::location_sessions::LocationSessionService;
use crate::modules::storage::{AttachmentStore, LocalAttachmentStore, MinIOAttachmentStore};
use axum::extract::DefaultBodyLimit;
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::Modify;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// How often idle location sessions are swept
const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(60);

fn main() -> anyhow::Result<()> {
    // Build Tokio runtime with configurable worker threads
    let worker_threads = std::env::var("TOKIO_WORKER_THREADS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(4)
        });

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(worker_threads)
        .enable_all()
        .build()?;

    runtime.block_on(async_main(worker_threads))
}

async fn async_main(worker_threads: usize) -> anyhow::Result<()> {
    // Load .env file BEFORE initializing logger so RUST_LOG is available
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;
    tracing::info!(
        "Configuration loaded: tokio_worker_threads={}, pid={}",
        worker_threads,
        std::process::id()
    );

    // Item persistence: Postgres when configured, otherwise in-memory
    let item_store: Arc<dyn ItemStore> = match &config.database.url {
        Some(url) => {
            let pool = database::create_pool(&config.database, url).await?;
            tracing::info!("Database connection pool created");

            tracing::info!("Running database migrations...");
            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .map_err(|e| anyhow::anyhow!("Migration failed: {}", e))?;
            tracing::info!("Database migrations completed successfully");

            Arc::new(PgItemStore::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set; items are kept in memory and lost on restart");
            Arc::new(MemoryItemStore::new())
        }
    };

    let attachment_store = create_attachment_store(&config.storage).await?;

    let geocoder = Arc::new(NominatimClient::new(&config.geocoding)?);
    let resolver = Arc::new(GeoPlaceResolver::new(geocoder, config.geocoding.timeout));
    tracing::info!(
        "Reverse geocoding via {} (timeout {:?})",
        config.geocoding.base_url,
        config.geocoding.timeout
    );

    let item_repository = Arc::new(ItemRepository::new(item_store, attachment_store));
    spawn_item_event_logger(&item_repository);

    let session_service = Arc::new(LocationSessionService::new(
        Arc::clone(&resolver),
        Arc::clone(&item_repository),
        config.session.idle_ttl,
    ));
    spawn_session_reaper(Arc::clone(&session_service));
    tracing::info!("Services initialized");

    // Build application router with dynamic swagger config
    let swagger_modifier = SwaggerInfoModifier {
        title: config.swagger.title.clone(),
        version: config.swagger.version.clone(),
        description: config.swagger.description.clone(),
    };

    let mut openapi = ApiDoc::openapi();
    swagger_modifier.modify(&mut openapi);

    let swagger =
        Router::new().merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi));

    let services = AppServices {
        attachments: Arc::clone(item_repository.attachment_store()),
        items: item_repository,
        resolver,
        sessions: session_service,
    };

    let app = Router::new()
        .merge(swagger)
        .merge(api_routes(services))
        .layer(DefaultBodyLimit::max(config.app.max_request_body_size))
        .layer(middleware::cors_layer(
            config.app.cors_allowed_origins.clone(),
        ))
        // Propagate X-Request-Id to response headers
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(middleware::MakeSpanWithRequestId)
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Generate X-Request-Id using UUID v7 (or use client-provided one)
        .layer(SetRequestIdLayer::x_request_id(middleware::MakeRequestUuid));

    // Start server
    let addr = config.app.server_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind {}: {}", addr, e))?;
    tracing::info!("Server listening on {}", format!("http://{}", addr));
    tracing::info!(
        "Swagger UI available at {}",
        format!("http://{}/swagger-ui/", addr)
    );

    axum::serve(listener, app).await?;

    Ok(())
}

async fn create_attachment_store(config: &StorageConfig) -> anyhow::Result<Arc<dyn AttachmentStore>> {
    let store: Arc<dyn AttachmentStore> = match config.backend {
        AttachmentBackend::Local => {
            let store = LocalAttachmentStore::new(&config.local_dir).await?;
            tracing::info!("Attachments stored under {}", store.root().display());
            Arc::new(store)
        }
        AttachmentBackend::MinIO => Arc::new(MinIOAttachmentStore::new(config.minio.clone()).await?),
    };
    tracing::info!("Attachment backend: {:?}", config.backend);
    Ok(store)
}

/// Log every item change; stands in for a presentation layer subscriber
fn spawn_item_event_logger(repository: &ItemRepository) {
    let mut events = repository.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => tracing::debug!(item_id = %event.item_id(), "Item event: {:?}", event),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Item event logger lagged, skipped {} events", skipped)
                }
                Err(RecvError::Closed) => break,
            }
        }
    });
}

fn spawn_session_reaper(sessions: Arc<LocationSessionService>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_PURGE_INTERVAL);
        loop {
            interval.tick().await;
            let purged = sessions.purge_expired().await;
            if purged > 0 {
                tracing::info!("Purged {} idle location sessions", purged);
            }
        }
    });
}
