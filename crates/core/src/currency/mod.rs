//! Company-currency normalization.
//!
//! Conversion is an injected capability with an explicit failure mode:
//! the converter returns `None` when it cannot produce a value, and the
//! engine records the claim without a normalized amount instead of
//! failing the submission.
//!
//! # Modules
//!
//! - `conversion` - Rounding arithmetic shared by converters
//! - `client` - HTTP exchange-rate client
//! - `fixed` - In-memory rate table for tests and embedders

pub mod client;
pub mod conversion;
pub mod fixed;

use std::time::Duration;

use async_trait::async_trait;
use claimflow_shared::types::CurrencyCode;
use rust_decimal::Decimal;

pub use client::ExchangeRateClient;
pub use fixed::FixedRateTable;

/// A currency conversion collaborator.
///
/// Implementations never error into business logic; absence is the
/// failure signal.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CurrencyConverter: Send + Sync {
    /// Converts `amount` from one currency to another.
    async fn convert(
        &self,
        amount: Decimal,
        from: &CurrencyCode,
        to: &CurrencyCode,
    ) -> Option<Decimal>;
}

/// Normalizes an amount into the company currency, bounded by `budget`.
///
/// Same-currency amounts pass through unconverted. A conversion that
/// errors or exceeds the budget degrades to `None`.
pub async fn normalize(
    converter: &dyn CurrencyConverter,
    amount: Decimal,
    from: &CurrencyCode,
    company_currency: &CurrencyCode,
    budget: Duration,
) -> Option<Decimal> {
    if from == company_currency {
        return Some(amount);
    }

    match tokio::time::timeout(budget, converter.convert(amount, from, company_currency)).await {
        Ok(converted) => converted,
        Err(_) => {
            tracing::warn!(
                from = %from,
                to = %company_currency,
                budget_ms = budget.as_millis() as u64,
                "currency conversion timed out"
            );
            None
        }
    }
}
