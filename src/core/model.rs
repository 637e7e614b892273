//! Records kept in the store and the values derived from them

use crate::core::error::{PortfolioError, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A buy (positive quantity) or sell (negative quantity) of a security.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub code: String,
    pub date: NaiveDate,
    pub quantity: i64,
    pub unit_price: Decimal,
    pub total_cost: Decimal,
}

impl Transaction {
    /// Builds a transaction, deriving `total_cost` as `quantity * unit_price`.
    /// Fails with `InvalidData` when the product does not fit a `Decimal`.
    pub fn new(code: &str, date: NaiveDate, quantity: i64, unit_price: Decimal) -> Result<Self> {
        let total_cost = Decimal::from(quantity)
            .checked_mul(unit_price)
            .ok_or_else(|| {
                PortfolioError::InvalidData(format!(
                    "Total cost of {quantity} x {unit_price} for {code} overflows"
                ))
            })?;
        Ok(Self {
            code: code.to_string(),
            date,
            quantity,
            unit_price: unit_price.normalize(),
            total_cost: total_cost.normalize(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricePoint {
    pub code: String,
    pub date: NaiveDate,
    pub close: Decimal,
}

impl PricePoint {
    pub fn new(code: &str, date: NaiveDate, close: Decimal) -> Self {
        Self {
            code: code.to_string(),
            date,
            close: close.normalize(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DividendPayment {
    pub code: String,
    pub date: NaiveDate,
    pub amount: Decimal,
}

impl DividendPayment {
    pub fn new(code: &str, date: NaiveDate, amount: Decimal) -> Self {
        Self {
            code: code.to_string(),
            date,
            amount: amount.normalize(),
        }
    }
}

/// Derived state of one security as of a date. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Position {
    pub code: String,
    pub as_of: NaiveDate,
    pub shares_owned: i64,
    pub amount_spent: Decimal,
    pub dividends_received: Decimal,
    pub market_value: Decimal,
}

/// Target allocation attached to a security that takes part in rebalancing.
///
/// `current_percentage` is filled by a weighting pass over the whole
/// portfolio and `desired_trade` by a rebalancing pass.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Weighting {
    pub target_percentage: Decimal,
    pub current_percentage: Option<Decimal>,
    pub desired_trade: Option<i64>,
}

impl Weighting {
    pub fn new(target_percentage: Decimal) -> Self {
        Self {
            target_percentage,
            ..Default::default()
        }
    }
}
