use axum::{
    middleware::from_fn,
    routing::{get, post},
    Extension, Router,
};
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::{
    api::handler::{
        create_pool, get_dashboard, get_pool, get_pool_history, get_pool_participants,
        get_pool_transactions, get_swap_quote, health_check, list_pools, submit_transaction,
        AppState,
    },
    api::models::SubmitTransactionRequest,
    middleware::{rate_limit_middleware, validate_json, RateLimitLayer},
};

pub async fn create_app(state: AppState) -> Router {
    info!("Setting up HTTP routes...");

    let app = Router::new()
        // Public health check endpoint
        .route("/health", get(health_check))
        .nest(
            "/api/v1",
            Router::new()
                // Pool registry
                .route("/pools", post(create_pool).get(list_pools))
                .route("/pools/:id", get(get_pool))
                // The sole write path into ledger state
                .route(
                    "/transactions",
                    post(submit_transaction)
                        .route_layer(from_fn(validate_json::<SubmitTransactionRequest>)),
                )
                // Read side
                .route("/pools/:id/transactions", get(get_pool_transactions))
                .route("/pools/:id/history", get(get_pool_history))
                .route("/pools/:id/participants", get(get_pool_participants))
                .route("/dashboard", get(get_dashboard))
                // Swap-quote pass-through
                .route("/quotes", get(get_swap_quote))
                .layer(from_fn(rate_limit_middleware))
                .layer(Extension(Arc::new(RateLimitLayer::new(100, 60)))),
        )
        .layer(CompressionLayer::new())
        .layer(CorsLayer::very_permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    info!("HTTP routes configured");
    app
}

pub async fn run_server(app: Router, bind_address: &str) -> Result<(), Box<dyn std::error::Error>> {
    let listener = tokio::net::TcpListener::bind(bind_address).await?;
    info!("Server listening on: {}", bind_address);

    axum::serve(listener, app).await?;
    Ok(())
}
