use super::ui;
use crate::core::error::Result;
use crate::portfolio::Portfolio;
use chrono::NaiveDate;
use rust_decimal::Decimal;

/// A change to one holding's transaction or dividend history.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordAction {
    Buy {
        code: String,
        quantity: i64,
        price: Decimal,
        date: NaiveDate,
    },
    Sell {
        code: String,
        quantity: i64,
        price: Decimal,
        date: NaiveDate,
    },
    RemoveTransaction {
        code: String,
        quantity_delta: i64,
        price: Decimal,
        date: NaiveDate,
    },
    Dividend {
        code: String,
        amount: Decimal,
        date: NaiveDate,
    },
    RemoveDividend {
        code: String,
        amount: Decimal,
        date: NaiveDate,
    },
}

impl RecordAction {
    pub fn code(&self) -> &str {
        match self {
            RecordAction::Buy { code, .. }
            | RecordAction::Sell { code, .. }
            | RecordAction::RemoveTransaction { code, .. }
            | RecordAction::Dividend { code, .. }
            | RecordAction::RemoveDividend { code, .. } => code,
        }
    }
}

/// Applies `action` to `portfolio` and describes what changed.
pub fn apply(portfolio: &mut Portfolio, action: &RecordAction) -> Result<String> {
    let message = match action {
        RecordAction::Buy {
            code,
            quantity,
            price,
            date,
        } => {
            let t = portfolio.buy(code, *quantity, *price, *date)?;
            format!(
                "Bought {quantity} {code} at {} on {date}, cost {}",
                price.normalize(),
                ui::money(t.total_cost)
            )
        }
        RecordAction::Sell {
            code,
            quantity,
            price,
            date,
        } => {
            let t = portfolio.sell(code, *quantity, *price, *date)?;
            format!(
                "Sold {quantity} {code} at {} on {date}, proceeds {}",
                price.normalize(),
                ui::money(-t.total_cost)
            )
        }
        RecordAction::RemoveTransaction {
            code,
            quantity_delta,
            price,
            date,
        } => {
            portfolio.remove_transaction(code, *quantity_delta, *price, *date)?;
            format!(
                "Removed transaction of {quantity_delta} {code} at {} on {date}",
                price.normalize()
            )
        }
        RecordAction::Dividend { code, amount, date } => {
            portfolio.add_dividend(code, *amount, *date)?;
            format!("Recorded dividend of {} for {code} on {date}", ui::money(*amount))
        }
        RecordAction::RemoveDividend { code, amount, date } => {
            portfolio.remove_dividend(code, *amount, *date)?;
            format!("Removed dividend of {} for {code} on {date}", ui::money(*amount))
        }
    };
    Ok(message)
}

pub fn run(portfolio: &mut Portfolio, action: &RecordAction) -> anyhow::Result<()> {
    let message = apply(portfolio, action)?;
    println!("{}", ui::style_text(&message, ui::StyleType::TotalLabel));
    if let Some(security) = portfolio.security(action.code()) {
        println!("{security}");
    }
    Ok(())
}
