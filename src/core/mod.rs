//! Core business logic abstractions

pub mod config;
pub mod error;
pub mod feed;
pub mod log;
pub mod model;

// Re-export main types for cleaner imports
pub use error::{PortfolioError, Result};
pub use feed::PriceFeed;
pub use model::{DividendPayment, Position, PricePoint, Transaction, Weighting};
