use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::error::{AppError, AppResult, VerificationError};
use crate::ledger::models::{Chain, PoolSnapshot, PoolTransaction, TxKind};
use crate::ledger::LedgerRepository;
use crate::verifier::ChainVerifier;

/// A raw deposit/withdraw event as submitted by a caller, before any
/// normalization or verification has happened.
#[derive(Debug, Clone)]
pub struct SubmitEvent {
    pub chain: String,
    pub tx_ref: String,
    pub pool_id: Uuid,
    pub user_address: String,
    pub amount: Decimal,
    pub kind: String,
}

/// Outcome of an accepted event: the recorded immutable transaction
/// plus the pool totals after reconciliation.
#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    pub transaction: PoolTransaction,
    pub pool: PoolSnapshot,
}

/// TransactionIngestService - the sole write path into ledger state.
///
/// Orchestrates verify-then-mutate: nothing touches pool balance,
/// participant stake or history except through `submit`.
pub struct TransactionIngestService {
    verifier: Arc<ChainVerifier>,
    ledger: Arc<LedgerRepository>,
}

impl TransactionIngestService {
    pub fn new(verifier: Arc<ChainVerifier>, ledger: Arc<LedgerRepository>) -> Self {
        Self { verifier, ledger }
    }

    pub async fn submit(&self, event: SubmitEvent) -> AppResult<SubmitOutcome> {
        // Input shape problems are rejected before any external call
        let kind = validate_event(&event)?;

        // An unrecognized chain is treated exactly like a failed
        // verification, not like bad input: the caller may retry once
        // the chain is supported
        let chain = Chain::parse(&event.chain)
            .ok_or_else(|| VerificationError::UnsupportedChain(event.chain.clone()))?;

        if !self.verifier.verify(chain, &event.tx_ref).await {
            return Err(VerificationError::NotConfirmed {
                chain,
                tx_ref: event.tx_ref,
            }
            .into());
        }

        info!(
            "Verified {} on {:?}, reconciling {} {} for pool {}",
            event.tx_ref, chain, kind.as_str(), event.amount, event.pool_id
        );

        let (transaction, pool) = self
            .ledger
            .apply_event(
                event.pool_id,
                &event.user_address,
                kind,
                event.amount,
                chain,
                &event.tx_ref,
            )
            .await?;

        Ok(SubmitOutcome { transaction, pool })
    }
}

/// Presence and shape checks, performed before verification so a
/// malformed request never reaches the chain endpoints.
fn validate_event(event: &SubmitEvent) -> AppResult<TxKind> {
    if event.tx_ref.trim().is_empty() {
        return Err(AppError::Validation("tx_ref must not be empty".into()));
    }
    if event.user_address.trim().is_empty() {
        return Err(AppError::Validation("user_address must not be empty".into()));
    }
    if event.chain.trim().is_empty() {
        return Err(AppError::Validation("chain must not be empty".into()));
    }
    if event.amount < Decimal::ZERO {
        return Err(AppError::Validation("amount must be non-negative".into()));
    }

    TxKind::normalize(&event.kind).ok_or_else(|| {
        AppError::Validation(format!(
            "kind must be deposit or withdraw, got '{}'",
            event.kind
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn event() -> SubmitEvent {
        SubmitEvent {
            chain: "solana".into(),
            tx_ref: "5VERYrealSig".into(),
            pool_id: Uuid::new_v4(),
            user_address: "9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin".into(),
            amount: dec!(100),
            kind: "deposit".into(),
        }
    }

    #[test]
    fn valid_event_normalizes_kind() {
        assert_eq!(validate_event(&event()).unwrap(), TxKind::Deposit);

        let mut e = event();
        e.kind = "WITHDRAW".into();
        assert_eq!(validate_event(&e).unwrap(), TxKind::Withdraw);
    }

    #[test]
    fn empty_fields_are_validation_errors() {
        for field in ["tx_ref", "user_address", "chain"] {
            let mut e = event();
            match field {
                "tx_ref" => e.tx_ref = " ".into(),
                "user_address" => e.user_address = String::new(),
                _ => e.chain = String::new(),
            }
            assert!(matches!(
                validate_event(&e),
                Err(AppError::Validation(_))
            ));
        }
    }

    #[test]
    fn negative_amount_is_a_validation_error() {
        let mut e = event();
        e.amount = dec!(-1);
        assert!(matches!(validate_event(&e), Err(AppError::Validation(_))));
    }

    #[test]
    fn unknown_kind_is_a_validation_error() {
        let mut e = event();
        e.kind = "transfer".into();
        assert!(matches!(validate_event(&e), Err(AppError::Validation(_))));
    }

    // A lazy pool never opens a connection; these paths must reject
    // before any storage access happens.
    fn service_without_chains() -> TransactionIngestService {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgresql://localhost/unreachable")
            .expect("lazy pool");
        TransactionIngestService::new(
            Arc::new(ChainVerifier::new()),
            Arc::new(LedgerRepository::new(pool)),
        )
    }

    #[tokio::test]
    async fn unsupported_chain_is_a_verification_failure_not_validation() {
        let svc = service_without_chains();
        let mut e = event();
        e.chain = "dogecoin".into();

        match svc.submit(e).await {
            Err(AppError::Verification(VerificationError::UnsupportedChain(chain))) => {
                assert_eq!(chain, "dogecoin")
            }
            other => panic!("expected UnsupportedChain, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn unverified_transaction_writes_nothing() {
        let svc = service_without_chains();

        match svc.submit(event()).await {
            Err(AppError::Verification(VerificationError::NotConfirmed { chain, .. })) => {
                assert_eq!(chain, Chain::Solana)
            }
            other => panic!("expected NotConfirmed, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn validation_runs_before_verification() {
        let svc = service_without_chains();
        let mut e = event();
        e.chain = "dogecoin".into();
        e.kind = "transfer".into();

        assert!(matches!(
            svc.submit(e).await,
            Err(AppError::Validation(_))
        ));
    }
}
