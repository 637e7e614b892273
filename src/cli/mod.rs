pub mod history;
pub mod purchases;
pub mod rebalance;
pub mod record;
pub mod setup;
pub mod summary;
pub mod ui;
pub mod update;

use crate::core::config::{AppConfig, PortfolioConfig};
use crate::portfolio::Portfolio;
use crate::store::RecordStore;
use anyhow::{Context, Result};
use chrono::NaiveDate;

/// Opens the record store of a configured portfolio and loads its holdings.
pub fn open_portfolio(config: &AppConfig, portfolio_config: &PortfolioConfig) -> Result<Portfolio> {
    let path = config.database_path(&portfolio_config.name)?;
    let store = RecordStore::open(&path)
        .with_context(|| format!("Failed to open record store {}", path.display()))?;
    let mut portfolio = Portfolio::new(&portfolio_config.name, store, config.lookback_days);
    for holding in &portfolio_config.holdings {
        portfolio.add_security(&holding.code, holding.target)?;
    }
    Ok(portfolio)
}

pub fn open_named_portfolio(config: &AppConfig, name: &str) -> Result<Portfolio> {
    open_portfolio(config, config.portfolio(name)?)
}

pub fn open_all_portfolios(config: &AppConfig) -> Result<Vec<Portfolio>> {
    config
        .portfolios
        .iter()
        .map(|p| open_portfolio(config, p))
        .collect()
}

pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}
