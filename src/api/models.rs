use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::ledger::models::{Pool, PoolSnapshot, PoolTransaction};

// ========== REQUEST MODELS ==========

/// Request to create a liquidity pool
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePoolRequest {
    #[validate(length(min = 1, max = 128))]
    pub name: String,

    #[validate(length(min = 1, max = 32))]
    pub asset: String,

    /// Caller-supplied starting balance - trusted at this boundary
    pub initial_balance: Decimal,

    #[serde(default)]
    pub rate: Decimal,

    #[serde(default)]
    pub fee_bps: i32,

    #[serde(default)]
    pub lock_period_days: i32,
}

/// Request to submit a deposit/withdraw event for verification and
/// reconciliation. Chain and kind arrive as raw strings; the ingest
/// service normalizes them.
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitTransactionRequest {
    #[validate(length(min = 1))]
    pub chain: String,

    #[validate(length(min = 1))]
    pub tx_ref: String,

    pub pool_id: Uuid,

    #[validate(length(min = 1))]
    pub user_address: String,

    pub amount: Decimal,

    #[validate(length(min = 1))]
    pub kind: String,
}

#[derive(Debug, Deserialize)]
pub struct TransactionPageQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct QuoteQuery {
    #[validate(length(min = 1))]
    pub from: String,

    #[validate(length(min = 1))]
    pub to: String,

    pub amount: Decimal,
}

// ========== RESPONSE MODELS ==========

/// Accepted event: the recorded ledger entry plus post-update totals
#[derive(Debug, Serialize)]
pub struct SubmitTransactionResponse {
    pub transaction: PoolTransaction,
    pub pool: PoolSnapshot,
}

#[derive(Debug, Serialize)]
pub struct PoolListResponse {
    pub pools: Vec<Pool>,
    pub total_count: usize,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub pool_count: i64,

    #[serde(with = "rust_decimal::serde::float")]
    pub total_balance: Decimal,
    pub total_active_entries: i64,
    pub generated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn submit_request_requires_non_empty_strings() {
        let req = SubmitTransactionRequest {
            chain: String::new(),
            tx_ref: "abc".into(),
            pool_id: Uuid::new_v4(),
            user_address: "GABC".into(),
            amount: Decimal::ONE,
            kind: "deposit".into(),
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn create_pool_request_defaults_config_fields() {
        let req: CreatePoolRequest = serde_json::from_value(serde_json::json!({
            "name": "SOL yield pool",
            "asset": "SOL",
            "initial_balance": 0.0,
        }))
        .unwrap();

        assert!(req.validate().is_ok());
        assert_eq!(req.fee_bps, 0);
        assert_eq!(req.lock_period_days, 0);
    }
}
