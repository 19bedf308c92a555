use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, Type};
use std::fmt;
use uuid::Uuid;

/// Universal Chain enum - the finite set of chains a transaction
/// reference can be verified against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[sqlx(type_name = "chain_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    Solana,
    Stellar,
    Near,
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Chain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Chain::Solana => "solana",
            Chain::Stellar => "stellar",
            Chain::Near => "near",
        }
    }

    /// Return all supported chains
    pub fn all() -> Vec<Chain> {
        vec![Chain::Solana, Chain::Stellar, Chain::Near]
    }

    pub fn parse(s: &str) -> Option<Chain> {
        match s.to_lowercase().as_str() {
            "solana" => Some(Chain::Solana),
            "stellar" => Some(Chain::Stellar),
            "near" => Some(Chain::Near),
            _ => None,
        }
    }
}

/// Transaction kind enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "tx_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TxKind {
    Deposit,
    Withdraw,
}

impl TxKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxKind::Deposit => "deposit",
            TxKind::Withdraw => "withdraw",
        }
    }

    /// Normalize a caller-supplied kind string. Anything that is not
    /// deposit or withdraw (case-insensitive) is rejected upstream as
    /// a validation error.
    pub fn normalize(s: &str) -> Option<TxKind> {
        match s.trim().to_lowercase().as_str() {
            "deposit" => Some(TxKind::Deposit),
            "withdraw" => Some(TxKind::Withdraw),
            _ => None,
        }
    }
}

/// Pool entity
///
/// INVARIANT: balance and active_entries are only ever mutated by the
/// reconciler inside its atomic unit, never directly by handlers.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Pool {
    pub id: Uuid,
    pub name: String,
    pub asset: String,

    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
    pub active_entries: i32,

    // Configuration fields, carried through opaquely
    #[serde(with = "rust_decimal::serde::float")]
    pub rate: Decimal,
    pub fee_bps: i32,
    pub lock_period_days: i32,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Participant entity (one row per pool + user with a tracked stake)
///
/// A row exists iff the user currently has a stake in the pool: a
/// withdraw removes the row entirely regardless of the requested
/// amount (full-exit semantics, a product decision).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Participant {
    pub pool_id: Uuid,
    pub user_address: String,

    #[serde(with = "rust_decimal::serde::float")]
    pub staked: Decimal,
    pub last_deposit_at: DateTime<Utc>,
}

/// Immutable ledger entry - created exactly once per accepted event,
/// never mutated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PoolTransaction {
    pub id: Uuid,
    pub pool_id: Uuid,
    pub kind: TxKind,

    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub user_address: String,
    pub chain: Chain,
    pub tx_ref: String,
    pub created_at: DateTime<Utc>,
}

/// Append-only balance-over-time entry, one per reconciled transaction
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct HistorySnapshot {
    pub id: Uuid,
    pub pool_id: Uuid,

    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
    pub active_entries: i32,
    pub recorded_at: DateTime<Utc>,
}

/// Post-update pool totals returned from a reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolSnapshot {
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
    pub active_entries: i32,
}

/// Compute the post-event pool totals.
///
/// Deposits add to the balance and increment the active-entry count;
/// withdrawals subtract and decrement. Both totals are floored at zero
/// rather than rejected when the delta would overshoot - the clamp is
/// a deliberate product policy carried through from the ledger model.
pub fn reconcile_totals(
    balance: Decimal,
    active_entries: i32,
    kind: TxKind,
    amount: Decimal,
) -> PoolSnapshot {
    match kind {
        TxKind::Deposit => PoolSnapshot {
            balance: balance + amount,
            active_entries: active_entries + 1,
        },
        TxKind::Withdraw => PoolSnapshot {
            balance: (balance - amount).max(Decimal::ZERO),
            active_entries: (active_entries - 1).max(0),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn kind_normalization() {
        assert_eq!(TxKind::normalize("deposit"), Some(TxKind::Deposit));
        assert_eq!(TxKind::normalize("  WITHDRAW "), Some(TxKind::Withdraw));
        assert_eq!(TxKind::normalize("Deposit"), Some(TxKind::Deposit));
        assert_eq!(TxKind::normalize("transfer"), None);
        assert_eq!(TxKind::normalize(""), None);
    }

    #[test]
    fn chain_parsing() {
        assert_eq!(Chain::parse("solana"), Some(Chain::Solana));
        assert_eq!(Chain::parse("Stellar"), Some(Chain::Stellar));
        assert_eq!(Chain::parse("NEAR"), Some(Chain::Near));
        assert_eq!(Chain::parse("dogecoin"), None);
    }

    #[test]
    fn deposit_adds_amount_and_increments_entries() {
        let snap = reconcile_totals(dec!(0), 0, TxKind::Deposit, dec!(100));
        assert_eq!(snap.balance, dec!(100));
        assert_eq!(snap.active_entries, 1);
    }

    #[test]
    fn repeat_deposit_keeps_accumulating() {
        // Second deposit from the same user still bumps the entry
        // count - active entries are not deduplicated per depositor.
        let snap = reconcile_totals(dec!(100), 1, TxKind::Deposit, dec!(50));
        assert_eq!(snap.balance, dec!(150));
        assert_eq!(snap.active_entries, 2);
    }

    #[test]
    fn withdraw_subtracts_within_balance() {
        let snap = reconcile_totals(dec!(150), 2, TxKind::Withdraw, dec!(150));
        assert_eq!(snap.balance, dec!(0));
        assert_eq!(snap.active_entries, 1);
    }

    #[test]
    fn withdraw_floors_balance_at_zero() {
        let snap = reconcile_totals(dec!(50), 1, TxKind::Withdraw, dec!(80));
        assert_eq!(snap.balance, dec!(0));
        assert_eq!(snap.active_entries, 0);
    }

    #[test]
    fn withdraw_floors_entries_at_zero() {
        let snap = reconcile_totals(dec!(0), 0, TxKind::Withdraw, dec!(10));
        assert_eq!(snap.balance, dec!(0));
        assert_eq!(snap.active_entries, 0);
    }

    #[test]
    fn concurrent_deposits_are_additive() {
        // Two deposits of 10 applied in sequence under the row lock
        // must land on 20 - the second always sees the first's result.
        let first = reconcile_totals(dec!(0), 0, TxKind::Deposit, dec!(10));
        let second =
            reconcile_totals(first.balance, first.active_entries, TxKind::Deposit, dec!(10));
        assert_eq!(second.balance, dec!(20));
        assert_eq!(second.active_entries, 2);
    }
}
