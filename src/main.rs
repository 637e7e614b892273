use anyhow::Result;
use chrono::NaiveDate;
use clap::{CommandFactory, Parser, Subcommand};
use rust_decimal::Decimal;
use stockfolio::cli::history::Metric;
use stockfolio::cli::record::RecordAction;
use stockfolio::core::log::init_logging;
use stockfolio::AppCommand;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Download new closing prices
    Update {
        /// Only update this portfolio
        #[arg(short, long)]
        portfolio: Option<String>,
    },
    /// Record a purchase
    Buy {
        portfolio: String,
        code: String,
        quantity: i64,
        price: Decimal,
        /// Trade date, defaults to today
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },
    /// Record a sale
    Sell {
        portfolio: String,
        code: String,
        quantity: i64,
        price: Decimal,
        /// Trade date, defaults to today
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },
    /// Delete a recorded transaction; all fields must match
    RemoveTransaction {
        portfolio: String,
        code: String,
        /// Signed quantity, negative for sales
        #[arg(allow_negative_numbers = true)]
        quantity_delta: i64,
        price: Decimal,
        date: NaiveDate,
    },
    /// Record a dividend payment
    Dividend {
        portfolio: String,
        code: String,
        amount: Decimal,
        /// Payment date, defaults to today
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },
    /// Delete a recorded dividend; all fields must match
    RemoveDividend {
        portfolio: String,
        code: String,
        amount: Decimal,
        date: NaiveDate,
    },
    /// Display portfolio summary
    Summary {
        /// Value holdings as of this date
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },
    /// List recorded transactions
    Purchases {
        portfolio: String,
        #[arg(long)]
        code: Option<String>,
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        to: Option<NaiveDate>,
    },
    /// Chart a holding or the portfolio over time
    History {
        portfolio: String,
        #[arg(long)]
        code: Option<String>,
        #[arg(long)]
        from: NaiveDate,
        #[arg(long)]
        to: NaiveDate,
        #[arg(short, long, value_enum, default_value_t = Metric::Value)]
        metric: Metric,
    },
    /// Plan trades that bring holdings back to their targets
    Rebalance {
        portfolio: String,
        /// New money to invest
        #[arg(short, long, default_value_t = Decimal::ZERO)]
        increase: Decimal,
        /// Plan sales as well as purchases
        #[arg(long)]
        allow_selling: bool,
        /// Smallest trade worth making
        #[arg(short, long, default_value_t = Decimal::ZERO)]
        minimum: Decimal,
        /// Use prices as of this date
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },
}

impl From<Commands> for AppCommand {
    fn from(cmd: Commands) -> AppCommand {
        let today = stockfolio::cli::today();
        match cmd {
            Commands::Update { portfolio } => AppCommand::Update { portfolio },
            Commands::Buy {
                portfolio,
                code,
                quantity,
                price,
                date,
            } => AppCommand::Record {
                portfolio,
                action: RecordAction::Buy {
                    code,
                    quantity,
                    price,
                    date: date.unwrap_or(today),
                },
            },
            Commands::Sell {
                portfolio,
                code,
                quantity,
                price,
                date,
            } => AppCommand::Record {
                portfolio,
                action: RecordAction::Sell {
                    code,
                    quantity,
                    price,
                    date: date.unwrap_or(today),
                },
            },
            Commands::RemoveTransaction {
                portfolio,
                code,
                quantity_delta,
                price,
                date,
            } => AppCommand::Record {
                portfolio,
                action: RecordAction::RemoveTransaction {
                    code,
                    quantity_delta,
                    price,
                    date,
                },
            },
            Commands::Dividend {
                portfolio,
                code,
                amount,
                date,
            } => AppCommand::Record {
                portfolio,
                action: RecordAction::Dividend {
                    code,
                    amount,
                    date: date.unwrap_or(today),
                },
            },
            Commands::RemoveDividend {
                portfolio,
                code,
                amount,
                date,
            } => AppCommand::Record {
                portfolio,
                action: RecordAction::RemoveDividend { code, amount, date },
            },
            Commands::Summary { date } => AppCommand::Summary { date },
            Commands::Purchases {
                portfolio,
                code,
                from,
                to,
            } => AppCommand::Purchases {
                portfolio,
                code,
                from,
                to,
            },
            Commands::History {
                portfolio,
                code,
                from,
                to,
                metric,
            } => AppCommand::History {
                portfolio,
                code,
                from,
                to,
                metric,
            },
            Commands::Rebalance {
                portfolio,
                increase,
                allow_selling,
                minimum,
                date,
            } => AppCommand::Rebalance {
                portfolio,
                increase,
                allow_selling,
                minimum,
                date,
            },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => match cli.config_path.as_deref() {
            Some(path) => stockfolio::cli::setup::setup_at_path(path),
            None => stockfolio::cli::setup::setup(),
        },
        Some(cmd) => stockfolio::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
