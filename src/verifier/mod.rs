pub mod near;
pub mod solana;
pub mod stellar;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::AppResult;
use crate::ledger::models::Chain;

pub use near::NearReceipts;
pub use solana::SolanaReceipts;
pub use stellar::StellarReceipts;

/// Read-only receipt lookup - implemented once per supported chain.
///
/// A single best-effort fetch of the transaction's finalized receipt.
/// `Ok(false)` means the receipt is missing or marks a failed
/// transaction; `Err` means the lookup itself could not complete
/// (transport error, timeout). Retrying is the caller's decision.
#[async_trait]
pub trait ReceiptLookup: Send + Sync {
    fn chain(&self) -> Chain;

    async fn receipt_succeeded(&self, tx_ref: &str) -> AppResult<bool>;
}

/// ChainVerifier - routes a (chain, tx_ref) pair to the registered
/// receipt lookup for that chain.
///
/// This is a failure-absorbing boundary: whatever goes wrong below it
/// (unsupported chain, transport error, missing receipt, reverted
/// transaction) comes back as `false`, with the underlying cause
/// logged for operators. It never raises to the caller.
pub struct ChainVerifier {
    lookups: HashMap<Chain, Arc<dyn ReceiptLookup>>,
}

impl ChainVerifier {
    pub fn new() -> Self {
        Self {
            lookups: HashMap::new(),
        }
    }

    /// Register a receipt lookup for a chain. Only called during
    /// system initialization.
    pub fn register_lookup(&mut self, chain: Chain, lookup: Arc<dyn ReceiptLookup>) {
        info!("Registering receipt lookup for chain: {:?}", chain);
        self.lookups.insert(chain, lookup);
    }

    pub fn supports_chain(&self, chain: Chain) -> bool {
        self.lookups.contains_key(&chain)
    }

    pub fn registered_chains(&self) -> Vec<Chain> {
        self.lookups.keys().copied().collect()
    }

    /// Confirm a transaction reference succeeded on its claimed chain.
    pub async fn verify(&self, chain: Chain, tx_ref: &str) -> bool {
        let Some(lookup) = self.lookups.get(&chain) else {
            warn!("Verification skipped: no receipt lookup for chain {:?}", chain);
            return false;
        };

        match lookup.receipt_succeeded(tx_ref).await {
            Ok(confirmed) => confirmed,
            Err(e) => {
                warn!(
                    "Receipt lookup failed on {:?} for {}: {:?}",
                    chain, tx_ref, e
                );
                false
            }
        }
    }
}

impl Default for ChainVerifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    struct FixedLookup {
        chain: Chain,
        outcome: Result<bool, ()>,
    }

    #[async_trait]
    impl ReceiptLookup for FixedLookup {
        fn chain(&self) -> Chain {
            self.chain
        }

        async fn receipt_succeeded(&self, _tx_ref: &str) -> AppResult<bool> {
            self.outcome
                .map_err(|_| AppError::Upstream("rpc unreachable".into()))
        }
    }

    #[tokio::test]
    async fn unsupported_chain_is_unverified_not_an_error() {
        let verifier = ChainVerifier::new();
        assert!(!verifier.verify(Chain::Solana, "sig").await);
    }

    #[tokio::test]
    async fn transport_errors_are_absorbed_as_false() {
        let mut verifier = ChainVerifier::new();
        verifier.register_lookup(
            Chain::Near,
            Arc::new(FixedLookup {
                chain: Chain::Near,
                outcome: Err(()),
            }),
        );
        assert!(!verifier.verify(Chain::Near, "hash:alice.near").await);
    }

    #[tokio::test]
    async fn confirmed_receipt_passes_through() {
        let mut verifier = ChainVerifier::new();
        verifier.register_lookup(
            Chain::Stellar,
            Arc::new(FixedLookup {
                chain: Chain::Stellar,
                outcome: Ok(true),
            }),
        );
        assert!(verifier.verify(Chain::Stellar, "abcdef").await);
        assert!(verifier.supports_chain(Chain::Stellar));
        assert!(!verifier.supports_chain(Chain::Solana));
    }

    #[tokio::test]
    async fn failed_receipt_stays_false() {
        let mut verifier = ChainVerifier::new();
        verifier.register_lookup(
            Chain::Solana,
            Arc::new(FixedLookup {
                chain: Chain::Solana,
                outcome: Ok(false),
            }),
        );
        assert!(!verifier.verify(Chain::Solana, "sig").await);
    }
}
