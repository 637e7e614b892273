use super::ui;
use crate::core::model::Transaction;
use crate::portfolio::Portfolio;
use anyhow::Result;
use chrono::NaiveDate;
use comfy_table::Cell;
use rust_decimal::Decimal;

pub fn display_as_table(name: &str, transactions: &[Transaction]) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Date"),
        ui::header_cell("Code"),
        ui::header_cell("Quantity"),
        ui::header_cell("Unit Price"),
        ui::header_cell("Total Cost"),
    ]);

    for transaction in transactions {
        table.add_row(vec![
            Cell::new(transaction.date),
            Cell::new(&transaction.code),
            ui::number_cell(transaction.quantity),
            ui::number_cell(transaction.unit_price.normalize()),
            ui::signed_cell(transaction.total_cost),
        ]);
    }

    let net: Decimal = transactions.iter().map(|t| t.total_cost).sum();
    format!(
        "Transactions: {}\n\n{}\n\n{} {}",
        ui::style_text(name, ui::StyleType::Title),
        table,
        ui::style_text("Net Spent:", ui::StyleType::TotalLabel),
        ui::style_text(&ui::money(net), ui::StyleType::TotalValue)
    )
}

pub fn run(
    portfolio: &Portfolio,
    code: Option<&str>,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<()> {
    let transactions = portfolio.engine().transactions(code, from, to)?;
    if transactions.is_empty() {
        println!(
            "{}",
            ui::style_text(
                &format!("No transactions between {from} and {to}"),
                ui::StyleType::Subtle
            )
        );
        return Ok(());
    }
    println!("{}", display_as_table(portfolio.name(), &transactions));
    Ok(())
}
