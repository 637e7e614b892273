use super::ui;
use crate::core::PortfolioError;
use crate::core::error::Result;
use crate::portfolio::Portfolio;
use chrono::NaiveDate;
use comfy_table::Cell;
use console::style;
use rust_decimal::Decimal;

/// One row of the holdings table.
#[derive(Debug, Clone, PartialEq)]
pub struct HoldingSummary {
    pub code: String,
    pub shares: i64,
    pub price: Option<Decimal>,
    pub value: Option<Decimal>,
    pub cost: Decimal,
    pub dividends: Decimal,
    pub weight: Option<Decimal>,
    pub target: Option<Decimal>,
}

impl HoldingSummary {
    /// Market value plus dividends less what was spent.
    pub fn gain(&self) -> Option<Decimal> {
        self.value.map(|v| v + self.dividends - self.cost)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioSummary {
    pub name: String,
    pub as_of: Option<NaiveDate>,
    pub holdings: Vec<HoldingSummary>,
    pub total_value: Option<Decimal>,
    pub total_cost: Decimal,
    pub total_dividends: Decimal,
    pub error: Option<String>,
}

impl PortfolioSummary {
    /// Summarises `portfolio` on the closest priced day at or before `date`.
    /// When no such day exists the counts are still reported, without values.
    ///
    /// Spent and dividend totals cover everything recorded up to `date`.
    /// Weights are the holdings' current weightings and are only filled when
    /// the targets are consistent.
    pub fn build(portfolio: &mut Portfolio, date: NaiveDate) -> Result<Self> {
        let total_cost = portfolio.total_cost(date)?;
        let total_dividends = portfolio.total_dividends(date)?;

        let valuation = match portfolio.valuation(date) {
            Ok(valuation) => valuation,
            Err(e @ PortfolioError::DateUnresolvable { .. }) => {
                let engine = portfolio.engine();
                let holdings = portfolio
                    .securities()
                    .iter()
                    .map(|s| -> Result<HoldingSummary> {
                        Ok(HoldingSummary {
                            code: s.code().to_string(),
                            shares: engine.shares_owned_as_of(s.code(), date)?,
                            price: None,
                            value: None,
                            cost: engine.amount_spent_as_of(s.code(), date)?,
                            dividends: engine.dividends_as_of(s.code(), date)?,
                            weight: None,
                            target: s.weighting.as_ref().map(|w| w.target_percentage),
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                return Ok(PortfolioSummary {
                    name: portfolio.name().to_string(),
                    as_of: None,
                    holdings,
                    total_value: None,
                    total_cost,
                    total_dividends,
                    error: Some(e.to_string()),
                });
            }
            Err(e) => return Err(e),
        };

        let weighted = portfolio.securities().iter().any(|s| s.weighting.is_some());
        let error = if weighted {
            match portfolio.compute_current_weightings(date) {
                Ok(_) => None,
                Err(e @ PortfolioError::WeightingMismatch { .. }) => Some(e.to_string()),
                Err(e) => return Err(e),
            }
        } else {
            None
        };

        let engine = portfolio.engine();
        let holdings = portfolio
            .securities()
            .iter()
            .zip(&valuation.values)
            .map(|(s, (code, value))| -> Result<HoldingSummary> {
                let weighting = s.weighting.as_ref();
                Ok(HoldingSummary {
                    code: code.clone(),
                    shares: engine.shares_owned_as_of(code, valuation.date)?,
                    price: Some(engine.price_at(code, valuation.date)?),
                    value: Some(*value),
                    cost: engine.amount_spent_as_of(code, date)?,
                    dividends: engine.dividends_as_of(code, date)?,
                    weight: weighting.and_then(|w| w.current_percentage),
                    target: weighting.map(|w| w.target_percentage),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(PortfolioSummary {
            name: portfolio.name().to_string(),
            as_of: Some(valuation.date),
            holdings,
            total_value: Some(valuation.total),
            total_cost,
            total_dividends,
            error,
        })
    }

    pub fn display_as_table(&self) -> String {
        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("Code"),
            ui::header_cell("Shares"),
            ui::header_cell("Price"),
            ui::header_cell("Value"),
            ui::header_cell("Spent"),
            ui::header_cell("Dividends"),
            ui::header_cell("Gain"),
            ui::header_cell("Weight (%)"),
            ui::header_cell("Target (%)"),
        ]);

        for holding in &self.holdings {
            let gain = match holding.gain() {
                Some(gain) => ui::signed_cell(gain),
                None => ui::format_optional_cell(None, ui::money),
            };
            table.add_row(vec![
                Cell::new(&holding.code),
                ui::number_cell(holding.shares),
                ui::format_optional_cell(holding.price, |p| p.normalize().to_string()),
                ui::format_optional_cell(holding.value, ui::money),
                ui::number_cell(ui::money(holding.cost)),
                ui::number_cell(ui::money(holding.dividends)),
                gain,
                ui::format_optional_cell(holding.weight, |w| format!("{:.2}", w.round_dp(2))),
                ui::format_optional_cell(holding.target, |t| t.normalize().to_string()),
            ]);
        }

        let as_of = self
            .as_of
            .map_or_else(|| "unpriced".to_string(), |d| d.to_string());
        let mut output = format!(
            "Portfolio: {} {}\n\n",
            ui::style_text(&self.name, ui::StyleType::Title),
            ui::style_text(&format!("(as of {as_of})"), ui::StyleType::Subtle)
        );
        output.push_str(&table.to_string());

        if let Some(error) = &self.error {
            output.push_str(&format!(
                "\n\n{}",
                ui::style_text(error, ui::StyleType::Error)
            ));
        }

        let (value, value_style) = match self.total_value {
            Some(v) => (ui::money(v), ui::StyleType::TotalValue),
            None => ("N/A".to_string(), ui::StyleType::Error),
        };
        output.push_str(&format!(
            "\n\n{} {}\n{} {}\n{} {}",
            ui::style_text("Total Value:", ui::StyleType::TotalLabel),
            ui::style_text(&value, value_style),
            ui::style_text("Total Spent:", ui::StyleType::TotalLabel),
            ui::money(self.total_cost),
            ui::style_text("Total Dividends:", ui::StyleType::TotalLabel),
            ui::money(self.total_dividends),
        ));
        output
    }
}

pub fn run(portfolios: &mut [Portfolio], date: NaiveDate) -> anyhow::Result<()> {
    let summaries = portfolios
        .iter_mut()
        .map(|p| PortfolioSummary::build(p, date))
        .collect::<Result<Vec<_>>>()?;

    let num_summaries = summaries.len();
    for (i, summary) in summaries.iter().enumerate() {
        println!("{}", summary.display_as_table());
        if i + 1 < num_summaries {
            ui::print_separator();
        }
    }

    let all_valued = summaries.iter().all(|s| s.total_value.is_some());
    if all_valued && num_summaries > 1 {
        let grand_total: Decimal = summaries.iter().filter_map(|s| s.total_value).sum();
        let term_width = ui::terminal_width();
        println!("\n{}", "=".repeat(term_width));
        let total_str = format!("Grand Total: {}", ui::money(grand_total));
        let styled_total = style(&total_str).bold().green();
        println!("{styled_total:>term_width$}");
    }

    Ok(())
}
