pub mod backfill;
pub mod cli;
pub mod core;
pub mod portfolio;
pub mod position;
pub mod providers;
pub mod store;

use crate::cli::history::Metric;
use crate::cli::record::RecordAction;
use crate::core::config::AppConfig;
use crate::providers::yahoo_finance::YahooPriceFeed;
use anyhow::Result;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    Update {
        portfolio: Option<String>,
    },
    Record {
        portfolio: String,
        action: RecordAction,
    },
    Summary {
        date: Option<NaiveDate>,
    },
    Purchases {
        portfolio: String,
        code: Option<String>,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    },
    History {
        portfolio: String,
        code: Option<String>,
        from: NaiveDate,
        to: NaiveDate,
        metric: Metric,
    },
    Rebalance {
        portfolio: String,
        increase: Decimal,
        allow_selling: bool,
        minimum: Decimal,
        date: Option<NaiveDate>,
    },
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("stockfolio starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let today = cli::today();
    match command {
        AppCommand::Update { portfolio } => {
            let portfolios = match portfolio {
                Some(name) => vec![cli::open_named_portfolio(&config, &name)?],
                None => cli::open_all_portfolios(&config)?,
            };
            let feed = YahooPriceFeed::new(config.yahoo_base_url())?;
            cli::update::run(&portfolios, &feed, today).await
        }
        AppCommand::Record { portfolio, action } => {
            let mut portfolio = cli::open_named_portfolio(&config, &portfolio)?;
            cli::record::run(&mut portfolio, &action)
        }
        AppCommand::Summary { date } => {
            let mut portfolios = cli::open_all_portfolios(&config)?;
            cli::summary::run(&mut portfolios, date.unwrap_or(today))
        }
        AppCommand::Purchases {
            portfolio,
            code,
            from,
            to,
        } => {
            let portfolio = cli::open_named_portfolio(&config, &portfolio)?;
            cli::purchases::run(
                &portfolio,
                code.as_deref(),
                from.unwrap_or_else(backfill::earliest_history),
                to.unwrap_or(today),
            )
        }
        AppCommand::History {
            portfolio,
            code,
            from,
            to,
            metric,
        } => {
            let portfolio = cli::open_named_portfolio(&config, &portfolio)?;
            cli::history::run(&portfolio, code.as_deref(), metric, from, to)
        }
        AppCommand::Rebalance {
            portfolio,
            increase,
            allow_selling,
            minimum,
            date,
        } => {
            let mut portfolio = cli::open_named_portfolio(&config, &portfolio)?;
            cli::rebalance::run(
                &mut portfolio,
                date.unwrap_or(today),
                increase,
                allow_selling,
                minimum,
            )
        }
    }
}
