use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::models::*;
use crate::error::{AppResult, ReconciliationError};

/// Ledger repository - THE source of truth for all pool state
pub struct LedgerRepository {
    pub pool: PgPool,
}

impl LedgerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ========== POOL REGISTRY ==========

    /// Create a pool record.
    ///
    /// The initial balance is accepted as caller input rather than
    /// computed; the active-entry count starts at 1 for the creator.
    pub async fn create_pool(
        &self,
        name: &str,
        asset: &str,
        initial_balance: Decimal,
        rate: Decimal,
        fee_bps: i32,
        lock_period_days: i32,
    ) -> AppResult<Pool> {
        let pool = sqlx::query_as::<_, Pool>(
            r#"
            INSERT INTO pools (name, asset, balance, active_entries, rate, fee_bps, lock_period_days)
            VALUES ($1, $2, $3, 1, $4, $5, $6)
            RETURNING id, name, asset, balance, active_entries, rate, fee_bps,
                      lock_period_days, created_at, updated_at
            "#,
        )
        .bind(name)
        .bind(asset)
        .bind(initial_balance)
        .bind(rate)
        .bind(fee_bps)
        .bind(lock_period_days)
        .fetch_one(&self.pool)
        .await?;

        info!("Pool created: {} ({})", pool.id, pool.name);
        Ok(pool)
    }

    pub async fn get_pool(&self, pool_id: Uuid) -> AppResult<Option<Pool>> {
        let pool = sqlx::query_as::<_, Pool>(
            r#"
            SELECT id, name, asset, balance, active_entries, rate, fee_bps,
                   lock_period_days, created_at, updated_at
            FROM pools
            WHERE id = $1
            "#,
        )
        .bind(pool_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(pool)
    }

    pub async fn list_pools(&self) -> AppResult<Vec<Pool>> {
        let pools = sqlx::query_as::<_, Pool>(
            r#"
            SELECT id, name, asset, balance, active_entries, rate, fee_bps,
                   lock_period_days, created_at, updated_at
            FROM pools
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(pools)
    }

    // ========== RECONCILIATION ==========

    /// Apply a verified deposit/withdraw event across pool balance,
    /// participant registry, transaction ledger and history log as one
    /// atomic unit. All writes commit together or none do.
    ///
    /// The pool row is locked FOR UPDATE for the duration, so events
    /// against the same pool serialize (no lost update on the balance)
    /// while events against different pools proceed in parallel.
    pub async fn apply_event(
        &self,
        pool_id: Uuid,
        user_address: &str,
        kind: TxKind,
        amount: Decimal,
        chain: Chain,
        tx_ref: &str,
    ) -> AppResult<(PoolTransaction, PoolSnapshot)> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(ReconciliationError::Storage)?;

        let current = sqlx::query_as::<_, (Decimal, i32)>(
            r#"
            SELECT balance, active_entries
            FROM pools
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(pool_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(ReconciliationError::Storage)?
        .ok_or(ReconciliationError::PoolNotFound(pool_id))?;

        let snapshot = reconcile_totals(current.0, current.1, kind, amount);

        sqlx::query(
            r#"
            UPDATE pools
            SET balance = $2, active_entries = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(pool_id)
        .bind(snapshot.balance)
        .bind(snapshot.active_entries)
        .execute(&mut *tx)
        .await
        .map_err(ReconciliationError::Storage)?;

        let record = sqlx::query_as::<_, PoolTransaction>(
            r#"
            INSERT INTO pool_transactions (pool_id, kind, amount, user_address, chain, tx_ref)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, pool_id, kind, amount, user_address, chain, tx_ref, created_at
            "#,
        )
        .bind(pool_id)
        .bind(kind)
        .bind(amount)
        .bind(user_address)
        .bind(chain)
        .bind(tx_ref)
        .fetch_one(&mut *tx)
        .await
        .map_err(ReconciliationError::Storage)?;

        match kind {
            TxKind::Deposit => {
                // Accumulate onto an existing stake, or open a new one
                sqlx::query(
                    r#"
                    INSERT INTO participants (pool_id, user_address, staked, last_deposit_at)
                    VALUES ($1, $2, $3, NOW())
                    ON CONFLICT (pool_id, user_address)
                    DO UPDATE SET
                        staked = participants.staked + EXCLUDED.staked,
                        last_deposit_at = NOW()
                    "#,
                )
                .bind(pool_id)
                .bind(user_address)
                .bind(amount)
                .execute(&mut *tx)
                .await
                .map_err(ReconciliationError::Storage)?;
            }
            TxKind::Withdraw => {
                // Full-exit semantics: the tracked position is cleared
                // unconditionally, whatever the requested amount was
                sqlx::query(
                    r#"
                    DELETE FROM participants
                    WHERE pool_id = $1 AND user_address = $2
                    "#,
                )
                .bind(pool_id)
                .bind(user_address)
                .execute(&mut *tx)
                .await
                .map_err(ReconciliationError::Storage)?;
            }
        }

        // Snapshot uses the post-update values computed under the row
        // lock, never recomputed outside the transaction
        sqlx::query(
            r#"
            INSERT INTO pool_history (pool_id, balance, active_entries)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(pool_id)
        .bind(snapshot.balance)
        .bind(snapshot.active_entries)
        .execute(&mut *tx)
        .await
        .map_err(ReconciliationError::Storage)?;

        tx.commit().await.map_err(ReconciliationError::Storage)?;

        info!(
            "Reconciled {} of {} on pool {}: balance={} entries={}",
            kind.as_str(),
            amount,
            pool_id,
            snapshot.balance,
            snapshot.active_entries
        );

        Ok((record, snapshot))
    }

    // ========== READ SIDE ==========

    pub async fn list_participants(&self, pool_id: Uuid) -> AppResult<Vec<Participant>> {
        let participants = sqlx::query_as::<_, Participant>(
            r#"
            SELECT pool_id, user_address, staked, last_deposit_at
            FROM participants
            WHERE pool_id = $1
            ORDER BY last_deposit_at DESC
            "#,
        )
        .bind(pool_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(participants)
    }

    /// Most-recent-first transaction page for a pool
    pub async fn recent_transactions(
        &self,
        pool_id: Uuid,
        limit: i64,
    ) -> AppResult<Vec<PoolTransaction>> {
        let txs = sqlx::query_as::<_, PoolTransaction>(
            r#"
            SELECT id, pool_id, kind, amount, user_address, chain, tx_ref, created_at
            FROM pool_transactions
            WHERE pool_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(pool_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(txs)
    }

    /// Chronological balance-over-time snapshots for a pool
    pub async fn history(&self, pool_id: Uuid) -> AppResult<Vec<HistorySnapshot>> {
        let snapshots = sqlx::query_as::<_, HistorySnapshot>(
            r#"
            SELECT id, pool_id, balance, active_entries, recorded_at
            FROM pool_history
            WHERE pool_id = $1
            ORDER BY recorded_at ASC
            "#,
        )
        .bind(pool_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(snapshots)
    }

    /// Aggregate totals across all pools for the dashboard
    pub async fn pool_totals(&self) -> AppResult<(i64, Decimal, i64)> {
        let totals = sqlx::query_as::<_, (i64, Decimal, i64)>(
            r#"
            SELECT COUNT(*),
                   COALESCE(SUM(balance), 0),
                   COALESCE(SUM(active_entries), 0)::BIGINT
            FROM pools
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(totals)
    }
}
