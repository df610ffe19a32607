//! Shopflow server - commerce catalog sync and semantic search.
//!
//! This binary syncs a product catalog from a commerce backend (Shopify or
//! WooCommerce) into `PostgreSQL`, indexes it into Qdrant for semantic
//! search, and exposes both over a JSON API.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use sentry::integrations::tracing as sentry_tracing;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shopflow_server::commerce::{CommerceProvider, ShopifyClient, WooCommerceClient};
use shopflow_server::config::{AppConfig, ProviderKind};
use shopflow_server::db::{PgStorage, Storage, create_pool};
use shopflow_server::prompts::PromptService;
use shopflow_server::routes;
use shopflow_server::state::AppState;
use shopflow_server::sync::SyncService;
use shopflow_server::vector::indexer::PRODUCTS_COLLECTION;
use shopflow_server::vector::{OpenAiEmbeddings, ProductIndexer, QdrantIndex};

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &AppConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    // Load configuration from environment (needed for Sentry init)
    let config = AppConfig::from_env().expect("Failed to load configuration");

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    // Initialize tracing with EnvFilter and Sentry integration
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "shopflow_server=info,tower_http=debug".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    // Database pool and schema
    let pool = create_pool(&config.database_url)
        .await
        .expect("Failed to create database pool");
    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("Failed to run migrations");
    tracing::info!("Database ready");

    let storage: Arc<dyn Storage> = Arc::new(PgStorage::new(pool.clone()));

    // Commerce backend selected by COMMERCE_PROVIDER
    let provider: Arc<dyn CommerceProvider> = match config.provider {
        ProviderKind::Shopify => {
            let shopify = config
                .shopify
                .as_ref()
                .expect("Shopify configuration missing");
            Arc::new(ShopifyClient::new(shopify))
        }
        ProviderKind::WooCommerce => {
            let woocommerce = config
                .woocommerce
                .as_ref()
                .expect("WooCommerce configuration missing");
            Arc::new(WooCommerceClient::new(woocommerce))
        }
    };
    tracing::info!(provider = provider.name(), "commerce backend configured");

    // Embeddings + vector index
    let embedder = Arc::new(OpenAiEmbeddings::new(&config.openai_api_key));
    let index = Arc::new(QdrantIndex::new(&config.qdrant, PRODUCTS_COLLECTION));
    let indexer = Arc::new(ProductIndexer::new(
        Arc::clone(&storage),
        embedder,
        index,
    ));
    indexer
        .ensure_collection()
        .await
        .expect("Failed to prepare vector collection");

    let sync = Arc::new(SyncService::new(
        provider,
        Arc::clone(&storage),
        Arc::clone(&indexer),
    ));
    let prompts = Arc::new(PromptService::new(Arc::clone(&storage)));

    let state = AppState::new(Some(pool), storage, sync, indexer, prompts);

    // Build router
    let app = routes::router()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction());

    // Start server
    let addr = config.socket_addr();
    tracing::info!("server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
