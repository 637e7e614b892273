//! Price feed abstraction

use crate::core::model::PricePoint;
use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

/// Source of daily closing prices used to backfill the record store.
#[async_trait]
pub trait PriceFeed: Send + Sync {
    /// Returns closing prices for `code` on or after `since`, oldest first.
    async fn fetch_history(&self, code: &str, since: NaiveDate) -> Result<Vec<PricePoint>>;
}
