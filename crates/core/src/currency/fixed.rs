//! Fixed-rate conversion table.
//!
//! Used by tests and by embedders that already hold their rates; real
//! deployments use the HTTP client.

use std::collections::HashMap;

use async_trait::async_trait;
use claimflow_shared::types::CurrencyCode;
use rust_decimal::Decimal;

use crate::currency::conversion::{convert_amount, MONEY_DECIMAL_PLACES};
use crate::currency::CurrencyConverter;

/// An in-memory table of exchange rates.
#[derive(Debug, Clone, Default)]
pub struct FixedRateTable {
    rates: HashMap<(CurrencyCode, CurrencyCode), Decimal>,
}

impl FixedRateTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rate (1 `from` = `rate` `to`), returning the table.
    #[must_use]
    pub fn with_rate(mut self, from: CurrencyCode, to: CurrencyCode, rate: Decimal) -> Self {
        self.rates.insert((from, to), rate);
        self
    }
}

#[async_trait]
impl CurrencyConverter for FixedRateTable {
    async fn convert(
        &self,
        amount: Decimal,
        from: &CurrencyCode,
        to: &CurrencyCode,
    ) -> Option<Decimal> {
        if from == to {
            return Some(amount);
        }
        self.rates
            .get(&(from.clone(), to.clone()))
            .map(|rate| convert_amount(amount, *rate, MONEY_DECIMAL_PLACES))
    }
}
