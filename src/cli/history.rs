use super::ui;
use crate::portfolio::Portfolio;
use crate::position::Series;
use anyhow::{Result, bail};
use chrono::NaiveDate;
use clap::ValueEnum;
use comfy_table::Cell;
use console::style;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::fmt;

/// Most rows shown for one history; longer series are sampled evenly.
const MAX_ROWS: usize = 40;
const BAR_WIDTH: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Metric {
    /// Shares held
    Shares,
    /// Cumulative amount spent
    Spent,
    /// Cumulative dividends received
    Dividends,
    /// Market value
    #[default]
    Value,
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Metric::Shares => "Shares",
            Metric::Spent => "Spent",
            Metric::Dividends => "Dividends",
            Metric::Value => "Value",
        };
        write!(f, "{label}")
    }
}

/// Builds the series for one holding or, without a code, the whole portfolio's
/// value.
pub fn collect_series(
    portfolio: &Portfolio,
    code: Option<&str>,
    metric: Metric,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Series<Decimal>> {
    let engine = portfolio.engine();
    let series = match (code, metric) {
        (None, Metric::Value) => portfolio.value_range(from, to)?,
        (None, other) => bail!("{other} history needs a --code"),
        (Some(code), _) if portfolio.security(code).is_none() => {
            bail!("{code} is not held in {}", portfolio.name())
        }
        (Some(code), Metric::Shares) => engine
            .shares_owned_range(code, from, to)?
            .into_iter()
            .map(|(date, shares)| (date, Decimal::from(shares)))
            .collect(),
        (Some(code), Metric::Spent) => engine.amount_spent_range(code, from, to)?,
        (Some(code), Metric::Dividends) => engine.dividends_range(code, from, to)?,
        (Some(code), Metric::Value) => engine.value_range(code, from, to)?,
    };
    Ok(series)
}

/// Picks at most `max` points spread evenly over `series`, always keeping the
/// last one.
fn sample(series: &[(NaiveDate, Decimal)], max: usize) -> Vec<(NaiveDate, Decimal)> {
    if series.len() <= max || max < 2 {
        return series.to_vec();
    }
    let last = series.len() - 1;
    (0..max)
        .map(|i| series[i * last / (max - 1)])
        .collect()
}

fn bar(value: Decimal, largest: Decimal) -> String {
    if largest.is_zero() {
        return String::new();
    }
    let len = (value.abs() / largest * Decimal::from(BAR_WIDTH))
        .round()
        .to_usize()
        .unwrap_or(0);
    let bar = "█".repeat(len);
    if value.is_sign_negative() {
        style(bar).red().to_string()
    } else {
        style(bar).cyan().to_string()
    }
}

pub fn display_as_chart(title: &str, metric: Metric, series: &[(NaiveDate, Decimal)]) -> String {
    let rows = sample(series, MAX_ROWS);
    let largest = rows
        .iter()
        .map(|(_, v)| v.abs())
        .max()
        .unwrap_or(Decimal::ZERO);

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Date"),
        ui::header_cell(&metric.to_string()),
        ui::header_cell(""),
    ]);
    for (date, value) in &rows {
        let formatted = match metric {
            Metric::Shares => value.normalize().to_string(),
            _ => ui::money(*value),
        };
        table.add_row(vec![
            Cell::new(date),
            ui::number_cell(formatted),
            Cell::new(bar(*value, largest)),
        ]);
    }

    let mut output = format!("{}\n\n", ui::style_text(title, ui::StyleType::Title));
    output.push_str(&table.to_string());
    if rows.len() < series.len() {
        output.push_str(&format!(
            "\n{}",
            ui::style_text(
                &format!("{} of {} priced days shown", rows.len(), series.len()),
                ui::StyleType::Subtle
            )
        ));
    }
    output
}

pub fn run(
    portfolio: &Portfolio,
    code: Option<&str>,
    metric: Metric,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<()> {
    let series = collect_series(portfolio, code, metric, from, to)?;
    if series.is_empty() {
        println!(
            "{}",
            ui::style_text(
                &format!("No priced days between {from} and {to}"),
                ui::StyleType::Subtle
            )
        );
        return Ok(());
    }
    let title = format!(
        "{} {} from {from} to {to}",
        code.unwrap_or(portfolio.name()),
        metric.to_string().to_lowercase()
    );
    println!("{}", display_as_chart(&title, metric, &series));
    Ok(())
}
