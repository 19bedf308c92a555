use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use super::ReceiptLookup;
use crate::error::AppResult;
use crate::ledger::models::Chain;

/// Receipt lookup against a Stellar Horizon instance.
///
/// Horizon exposes transactions over plain HTTP, so this fetches
/// `GET /transactions/{hash}` and reads the `successful` flag.
pub struct StellarReceipts {
    client: reqwest::Client,
    horizon_url: String,
    timeout: Duration,
}

impl StellarReceipts {
    pub fn new(horizon_url: String, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            horizon_url,
            timeout,
        }
    }
}

#[async_trait]
impl ReceiptLookup for StellarReceipts {
    fn chain(&self) -> Chain {
        Chain::Stellar
    }

    async fn receipt_succeeded(&self, tx_ref: &str) -> AppResult<bool> {
        let url = format!("{}/transactions/{}", self.horizon_url, tx_ref);
        let response = self.client.get(&url).timeout(self.timeout).send().await?;

        // Horizon answers 404 for hashes it has never ingested
        if !response.status().is_success() {
            return Ok(false);
        }

        let record: Value = response.json().await?;
        Ok(transaction_record_succeeded(&record))
    }
}

fn transaction_record_succeeded(record: &Value) -> bool {
    record
        .get("successful")
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn successful_record_is_confirmed() {
        let record = json!({
            "id": "3389e9f0f1a65f19736cacf544c2e825313e8447f569233bb8db39aa607c8889",
            "successful": true,
            "ledger": 26963,
        });
        assert!(transaction_record_succeeded(&record));
    }

    #[test]
    fn failed_record_is_not_confirmed() {
        let record = json!({
            "id": "abc",
            "successful": false,
        });
        assert!(!transaction_record_succeeded(&record));
    }

    #[test]
    fn malformed_record_is_not_confirmed() {
        assert!(!transaction_record_succeeded(&json!({"id": "abc"})));
        assert!(!transaction_record_succeeded(&json!({"successful": "yes"})));
    }
}
