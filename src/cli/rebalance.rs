use super::ui;
use crate::portfolio::{Portfolio, RebalancePlan};
use anyhow::Result;
use chrono::NaiveDate;
use comfy_table::Cell;
use rust_decimal::Decimal;

fn percent(value: Decimal) -> String {
    format!("{:.2}", value.round_dp(2))
}

pub fn display_as_table(name: &str, plan: &RebalancePlan) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Code"),
        ui::header_cell("Trade"),
        ui::header_cell("Price"),
        ui::header_cell("Cost"),
        ui::header_cell("Target (%)"),
        ui::header_cell("After (%)"),
    ]);

    for trade in &plan.trades {
        let action = match trade.shares {
            0 => "hold".to_string(),
            n if n > 0 => format!("buy {n}"),
            n => format!("sell {}", n.unsigned_abs()),
        };
        table.add_row(vec![
            Cell::new(&trade.code),
            ui::number_cell(action),
            ui::number_cell(trade.price.normalize()),
            ui::signed_cell(trade.cost),
            ui::number_cell(percent(trade.target_percentage)),
            ui::number_cell(percent(trade.resulting_percentage)),
        ]);
    }

    format!(
        "Rebalance: {} {}\n\n{}\n\n{} {}\n{} {}",
        ui::style_text(name, ui::StyleType::Title),
        ui::style_text(&format!("(prices of {})", plan.date), ui::StyleType::Subtle),
        table,
        ui::style_text("Total Spend:", ui::StyleType::TotalLabel),
        ui::style_text(&ui::money(plan.total_spend), ui::StyleType::TotalValue),
        ui::style_text("Value After Trades:", ui::StyleType::TotalLabel),
        ui::money(plan.post_trade_value),
    )
}

pub fn run(
    portfolio: &mut Portfolio,
    date: NaiveDate,
    increase: Decimal,
    selling_allowed: bool,
    minimum: Decimal,
) -> Result<()> {
    let plan = portfolio.plan_rebalance(date, increase, selling_allowed, minimum)?;
    println!("{}", display_as_table(portfolio.name(), &plan));
    Ok(())
}
