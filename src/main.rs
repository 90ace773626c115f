use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use shoplane::{
    config::Config,
    handlers::*,
    services::{
        CompletionService, LogNotifier, Notifier, PaymentService, RpcChainClient,
        StubReceiptGenerator, WebhookNotifier,
    },
    storage::MemoryStore,
};
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    tracing::info!("Starting shoplane API v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {:?}", config.environment);

    // Initialize collaborators; all lifecycle is owned here, nothing is a
    // process-wide singleton.
    let store = Arc::new(MemoryStore::new());
    let chain = Arc::new(
        RpcChainClient::new(&config.rpc_url, config.receipt_poll_interval).await?,
    );
    let notifier: Arc<dyn Notifier> = match &config.notify_webhook_url {
        Some(url) => Arc::new(WebhookNotifier::new(url.clone())),
        None => Arc::new(LogNotifier),
    };
    let receipts = Arc::new(StubReceiptGenerator);

    let payments = Arc::new(PaymentService::new(
        config.clone(),
        chain.clone(),
        store.clone(),
        receipts,
        notifier,
    ));
    let completion = Arc::new(CompletionService::new(store.clone()));

    let app_state = AppState {
        payments,
        completion,
        chain,
    };

    // Build router
    let app = Router::new()
        .route("/health", get(health_check))
        .route(
            "/api/orders/:order_id/payments/:payment_id/verify",
            post(verify_payment),
        )
        .route(
            "/api/orders/:order_id/payments/:payment_id/verify-receipt",
            post(verify_payment_from_receipt),
        )
        .route("/api/orders/:order_id/complete", post(complete_order))
        .route("/api/orders/:order_id/proof", get(get_order_proof))
        .with_state(app_state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(true)),
        )
        .layer(CorsLayer::permissive());

    // Start server
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to listen for ctrl+c");
    tracing::info!("Shutting down gracefully...");
}
