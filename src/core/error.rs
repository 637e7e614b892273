use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PortfolioError {
    #[error("SQLite error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Insufficient shares of {code}: owned {owned}, tried to sell {requested}")]
    InsufficientShares {
        code: String,
        owned: i64,
        requested: i64,
    },

    #[error("Target weightings sum to {total}%, expected 100%")]
    WeightingMismatch { total: Decimal },

    #[error("No priced date for every holding within {lookback_days} days before {date}")]
    DateUnresolvable { date: NaiveDate, lookback_days: u32 },

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

pub type Result<T> = std::result::Result<T, PortfolioError>;
