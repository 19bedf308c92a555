use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;

use super::ReceiptLookup;
use crate::error::AppResult;
use crate::ledger::models::Chain;

/// Receipt lookup against a Solana JSON-RPC node.
///
/// Uses getSignatureStatuses with transaction-history search so
/// signatures older than the recent-status cache still resolve.
pub struct SolanaReceipts {
    client: reqwest::Client,
    rpc_url: String,
    timeout: Duration,
}

impl SolanaReceipts {
    pub fn new(rpc_url: String, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            rpc_url,
            timeout,
        }
    }
}

#[async_trait]
impl ReceiptLookup for SolanaReceipts {
    fn chain(&self) -> Chain {
        Chain::Solana
    }

    async fn receipt_succeeded(&self, tx_ref: &str) -> AppResult<bool> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "getSignatureStatuses",
            "params": [[tx_ref], {"searchTransactionHistory": true}],
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

        Ok(signature_status_succeeded(&response))
    }
}

/// A signature counts as confirmed only when a status entry exists,
/// carries no error, and has reached at least confirmed commitment.
fn signature_status_succeeded(response: &Value) -> bool {
    let Some(status) = response
        .pointer("/result/value/0")
        .filter(|v| !v.is_null())
    else {
        return false;
    };

    if !status.get("err").map(Value::is_null).unwrap_or(false) {
        return false;
    }

    matches!(
        status.get("confirmationStatus").and_then(Value::as_str),
        Some("confirmed") | Some("finalized")
    )
}
