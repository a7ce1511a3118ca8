//! HTTP exchange-rate client.

use async_trait::async_trait;
use claimflow_shared::config::ExchangeConfig;
use claimflow_shared::types::CurrencyCode;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Duration;

use crate::currency::conversion::round_money;
use crate::currency::CurrencyConverter;

/// Response body of the `/convert` endpoint.
#[derive(Debug, Deserialize)]
struct ConvertResponse {
    result: Option<Decimal>,
}

/// Converter backed by an exchange-rate HTTP API.
///
/// Failures are logged and degrade to `None`; the caller additionally
/// bounds the whole conversion with its own timeout budget.
#[derive(Debug, Clone)]
pub struct ExchangeRateClient {
    http: reqwest::Client,
    base_url: String,
}

impl ExchangeRateClient {
    /// Builds a client from configuration.
    pub fn new(config: &ExchangeConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl CurrencyConverter for ExchangeRateClient {
    async fn convert(
        &self,
        amount: Decimal,
        from: &CurrencyCode,
        to: &CurrencyCode,
    ) -> Option<Decimal> {
        let url = format!("{}/convert", self.base_url);
        let request = self.http.get(&url).query(&[
            ("from", from.as_str().to_string()),
            ("to", to.as_str().to_string()),
            ("amount", amount.to_string()),
        ]);

        let response = match request.send().await.and_then(|r| r.error_for_status()) {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(%from, %to, error = %err, "exchange-rate request failed");
                return None;
            }
        };

        match response.json::<ConvertResponse>().await {
            Ok(ConvertResponse {
                result: Some(value),
            }) => Some(round_money(value)),
            Ok(ConvertResponse { result: None }) => {
                tracing::warn!(%from, %to, "exchange-rate response carried no result");
                None
            }
            Err(err) => {
                tracing::warn!(%from, %to, error = %err, "exchange-rate response unreadable");
                None
            }
        }
    }
}
