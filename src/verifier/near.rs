use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::warn;

use super::ReceiptLookup;
use crate::error::AppResult;
use crate::ledger::models::Chain;

/// Receipt lookup against a NEAR JSON-RPC node.
///
/// NEAR's `tx` status method needs the sender account alongside the
/// hash, so the chain-dependent reference format here is
/// `<tx_hash>:<sender_account_id>`.
pub struct NearReceipts {
    client: reqwest::Client,
    rpc_url: String,
    timeout: Duration,
}

impl NearReceipts {
    pub fn new(rpc_url: String, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            rpc_url,
            timeout,
        }
    }
}

#[async_trait]
impl ReceiptLookup for NearReceipts {
    fn chain(&self) -> Chain {
        Chain::Near
    }

    async fn receipt_succeeded(&self, tx_ref: &str) -> AppResult<bool> {
        let Some((tx_hash, sender)) = tx_ref.split_once(':') else {
            warn!("NEAR tx_ref missing sender account: {}", tx_ref);
            return Ok(false);
        };

        let body = json!({
            "jsonrpc": "2.0",
            "id": "dontcare",
            "method": "tx",
            "params": {
                "tx_hash": tx_hash,
                "sender_account_id": sender,
                "wait_until": "FINAL",
            },
        });

        let response: Value = self
            .client
            .post(&self.rpc_url)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await?
            .json()
            .await?;

        Ok(execution_outcome_succeeded(&response))
    }
}

/// Final execution status must be a success variant; a `Failure` key
/// or an RPC-level error (e.g. UNKNOWN_TRANSACTION) means unverified.
fn execution_outcome_succeeded(response: &Value) -> bool {
    let Some(status) = response.pointer("/result/status") else {
        return false;
    };

    status.get("SuccessValue").is_some() || status.get("SuccessReceiptId").is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_value_is_confirmed() {
        let response = json!({
            "jsonrpc": "2.0",
            "result": {
                "status": {"SuccessValue": ""},
                "transaction_outcome": {"id": "abc"},
            },
            "id": "dontcare"
        });
        assert!(execution_outcome_succeeded(&response));
    }

    #[test]
    fn success_receipt_id_is_confirmed() {
        let response = json!({
            "jsonrpc": "2.0",
            "result": {"status": {"SuccessReceiptId": "9Zp3..."}},
            "id": "dontcare"
        });
        assert!(execution_outcome_succeeded(&response));
    }

    #[test]
    fn failure_status_is_not_confirmed() {
        let response = json!({
            "jsonrpc": "2.0",
            "result": {
                "status": {"Failure": {"ActionError": {"index": 0}}},
            },
            "id": "dontcare"
        });
        assert!(!execution_outcome_succeeded(&response));
    }

    #[test]
    fn unknown_transaction_is_not_confirmed() {
        let response = json!({
            "jsonrpc": "2.0",
            "error": {
                "name": "HANDLER_ERROR",
                "cause": {"name": "UNKNOWN_TRANSACTION"},
            },
            "id": "dontcare"
        });
        assert!(!execution_outcome_succeeded(&response));
    }
}
