use rust_decimal::Decimal;
use serde_json::Value;
use std::time::Duration;
use tracing::warn;

use crate::error::{AppError, AppResult};

/// Thin pass-through to the external swap-quote API.
///
/// No quoting logic lives here: the upstream response body is relayed
/// as-is, and an unreachable upstream surfaces as a distinct,
/// non-fatal UPSTREAM_UNAVAILABLE to the caller.
pub struct QuoteProxy {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl QuoteProxy {
    pub fn new(base_url: String, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            timeout,
        }
    }

    pub async fn fetch_quote(&self, from: &str, to: &str, amount: Decimal) -> AppResult<Value> {
        let amount = amount.to_string();
        let response = self
            .client
            .get(format!("{}/quote", self.base_url))
            .timeout(self.timeout)
            .query(&[("from", from), ("to", to), ("amount", amount.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            warn!("Quote API returned {} for {}->{}", response.status(), from, to);
            return Err(AppError::Upstream(format!(
                "Quote API returned status {}",
                response.status()
            )));
        }

        Ok(response.json().await?)
    }
}
