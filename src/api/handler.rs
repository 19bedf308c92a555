use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::models::*;
use super::quotes::QuoteProxy;
use crate::{
    error::{AppError, AppResult},
    ingest::service::SubmitEvent,
    ingest::TransactionIngestService,
    ledger::models::{HistorySnapshot, Participant, Pool},
    ledger::LedgerRepository,
    verifier::ChainVerifier,
};

const DEFAULT_TX_PAGE: i64 = 50;
const MAX_TX_PAGE: i64 = 200;

#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<LedgerRepository>,
    pub verifier: Arc<ChainVerifier>,
    pub ingest: Arc<TransactionIngestService>,
    pub quote_proxy: Arc<QuoteProxy>,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "pool-ledger-backend",
        "supported_chains": state.verifier.registered_chains(),
    }))
}

/// Create a liquidity pool
/// POST /api/v1/pools
pub async fn create_pool(
    State(state): State<AppState>,
    Json(request): Json<CreatePoolRequest>,
) -> AppResult<(StatusCode, Json<Pool>)> {
    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    if request.initial_balance < Decimal::ZERO {
        return Err(AppError::Validation(
            "initial_balance must be non-negative".into(),
        ));
    }

    info!("Creating pool '{}' ({})", request.name, request.asset);

    let pool = state
        .ledger
        .create_pool(
            &request.name,
            &request.asset,
            request.initial_balance,
            request.rate,
            request.fee_bps,
            request.lock_period_days,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(pool)))
}

/// GET /api/v1/pools
pub async fn list_pools(State(state): State<AppState>) -> AppResult<Json<PoolListResponse>> {
    let pools = state.ledger.list_pools().await?;
    let total_count = pools.len();

    Ok(Json(PoolListResponse { pools, total_count }))
}

/// GET /api/v1/pools/:id
pub async fn get_pool(
    State(state): State<AppState>,
    Path(pool_id): Path<Uuid>,
) -> AppResult<Json<Pool>> {
    let pool = state
        .ledger
        .get_pool(pool_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Pool not found: {}", pool_id)))?;

    Ok(Json(pool))
}

/// Submit a deposit/withdraw event for verification and reconciliation
/// POST /api/v1/transactions
///
/// The sole path through which ledger state changes.
pub async fn submit_transaction(
    State(state): State<AppState>,
    Json(request): Json<SubmitTransactionRequest>,
) -> AppResult<(StatusCode, Json<SubmitTransactionResponse>)> {
    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    info!(
        "Submitted {} event on {} for pool {}",
        request.kind, request.chain, request.pool_id
    );

    let outcome = state
        .ingest
        .submit(SubmitEvent {
            chain: request.chain,
            tx_ref: request.tx_ref,
            pool_id: request.pool_id,
            user_address: request.user_address,
            amount: request.amount,
            kind: request.kind,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SubmitTransactionResponse {
            transaction: outcome.transaction,
            pool: outcome.pool,
        }),
    ))
}

/// GET /api/v1/pools/:id/transactions?limit=
/// Most-recent-first, bounded page size
pub async fn get_pool_transactions(
    State(state): State<AppState>,
    Path(pool_id): Path<Uuid>,
    Query(query): Query<TransactionPageQuery>,
) -> AppResult<Json<Vec<crate::ledger::models::PoolTransaction>>> {
    ensure_pool_exists(&state, pool_id).await?;

    let limit = query
        .limit
        .unwrap_or(DEFAULT_TX_PAGE)
        .clamp(1, MAX_TX_PAGE);

    let txs = state.ledger.recent_transactions(pool_id, limit).await?;
    Ok(Json(txs))
}

/// GET /api/v1/pools/:id/history
/// Chronological balance-over-time snapshots
pub async fn get_pool_history(
    State(state): State<AppState>,
    Path(pool_id): Path<Uuid>,
) -> AppResult<Json<Vec<HistorySnapshot>>> {
    ensure_pool_exists(&state, pool_id).await?;

    let snapshots = state.ledger.history(pool_id).await?;
    Ok(Json(snapshots))
}

/// GET /api/v1/pools/:id/participants
pub async fn get_pool_participants(
    State(state): State<AppState>,
    Path(pool_id): Path<Uuid>,
) -> AppResult<Json<Vec<Participant>>> {
    ensure_pool_exists(&state, pool_id).await?;

    let participants = state.ledger.list_participants(pool_id).await?;
    Ok(Json(participants))
}

/// GET /api/v1/dashboard
/// Read-side aggregation across all pools
pub async fn get_dashboard(State(state): State<AppState>) -> AppResult<Json<DashboardResponse>> {
    let (pool_count, total_balance, total_active_entries) = state.ledger.pool_totals().await?;

    Ok(Json(DashboardResponse {
        pool_count,
        total_balance,
        total_active_entries,
        generated_at: Utc::now(),
    }))
}

/// GET /api/v1/quotes?from=&to=&amount=
/// Pass-through to the external swap-quote API
pub async fn get_swap_quote(
    State(state): State<AppState>,
    Query(query): Query<QuoteQuery>,
) -> AppResult<Json<serde_json::Value>> {
    query
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let quote = state
        .quote_proxy
        .fetch_quote(&query.from, &query.to, query.amount)
        .await?;

    Ok(Json(quote))
}

async fn ensure_pool_exists(state: &AppState, pool_id: Uuid) -> AppResult<()> {
    state
        .ledger
        .get_pool(pool_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Pool not found: {}", pool_id)))?;
    Ok(())
}
