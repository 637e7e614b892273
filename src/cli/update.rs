use super::ui;
use crate::backfill;
use crate::core::PriceFeed;
use crate::portfolio::Portfolio;
use anyhow::Result;
use chrono::NaiveDate;
use comfy_table::Cell;
use futures::future::join_all;

/// Downloads new closing prices for every holding of `portfolios`, one
/// portfolio per concurrent task.
pub async fn run(portfolios: &[Portfolio], feed: &dyn PriceFeed, today: NaiveDate) -> Result<()> {
    let total_codes: u64 = portfolios
        .iter()
        .map(|p| p.securities().len())
        .sum::<usize>() as u64;
    let pb = ui::new_progress_bar(total_codes, true);
    pb.set_message("Updating prices...");

    let update_futures = portfolios.iter().map(|portfolio| {
        let pb_clone = pb.clone();
        async move {
            let codes: Vec<&str> = portfolio.securities().iter().map(|s| s.code()).collect();
            let result =
                backfill::update_all(portfolio.store(), feed, &codes, today, &|| pb_clone.inc(1))
                    .await;
            (portfolio, result)
        }
    });
    let results = join_all(update_futures).await;
    pb.finish_and_clear();

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Portfolio"),
        ui::header_cell("Code"),
        ui::header_cell("New Prices"),
        ui::header_cell("Latest"),
    ]);
    for (portfolio, result) in results {
        for (code, inserted) in result? {
            let latest = portfolio.store().latest_price_date(&code)?;
            table.add_row(vec![
                Cell::new(portfolio.name()),
                Cell::new(&code),
                ui::number_cell(inserted),
                ui::format_optional_cell(latest, |d| d.to_string()),
            ]);
        }
    }
    println!("{table}");
    Ok(())
}
