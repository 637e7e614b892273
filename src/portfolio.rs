//! Portfolio level figures composed from the positions of every held
//! security: totals, current weightings and a target-weighted rebalancing plan.

use crate::core::error::{PortfolioError, Result};
use crate::core::model::{Position, Transaction, Weighting};
use crate::position::{PositionEngine, Security, Series};
use crate::store::RecordStore;
use chrono::{Days, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Values of every holding on a date for which all of them have a price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Valuation {
    pub date: NaiveDate,
    pub values: Vec<(String, Decimal)>,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedTrade {
    pub code: String,
    /// Positive to buy, negative to sell.
    pub shares: i64,
    pub price: Decimal,
    pub cost: Decimal,
    pub target_percentage: Decimal,
    pub resulting_percentage: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RebalancePlan {
    pub date: NaiveDate,
    pub trades: Vec<PlannedTrade>,
    pub total_spend: Decimal,
    pub post_trade_value: Decimal,
}

fn percentage_of(part: Decimal, total: Decimal) -> Decimal {
    if total.is_zero() {
        Decimal::ZERO
    } else {
        Decimal::ONE_HUNDRED * part / total
    }
}

/// A named set of securities backed by one record store.
pub struct Portfolio {
    name: String,
    store: RecordStore,
    securities: Vec<Security>,
    lookback_days: u32,
}

impl Portfolio {
    /// `lookback_days` bounds how far back a date without prices is walked
    /// before giving up with `DateUnresolvable`.
    pub fn new(name: &str, store: RecordStore, lookback_days: u32) -> Self {
        Self {
            name: name.to_string(),
            store,
            securities: Vec::new(),
            lookback_days,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn engine(&self) -> PositionEngine<'_> {
        PositionEngine::new(&self.store)
    }

    pub fn securities(&self) -> &[Security] {
        &self.securities
    }

    pub fn security(&self, code: &str) -> Option<&Security> {
        self.securities.iter().find(|s| s.code() == code)
    }

    /// Adds `code` with counters loaded from the store. Adding a code that is
    /// already held only updates its target.
    pub fn add_security(&mut self, code: &str, target: Option<Decimal>) -> Result<&Security> {
        let weighting = target.map(Weighting::new);
        let index = match self.securities.iter().position(|s| s.code() == code) {
            Some(index) => {
                self.securities[index].weighting = weighting;
                index
            }
            None => {
                let security = Security::load(&self.store, code, weighting)?;
                self.securities.push(security);
                self.securities.len() - 1
            }
        };
        Ok(&self.securities[index])
    }

    fn with_security<R, F>(&mut self, code: &str, f: F) -> Result<R>
    where
        F: FnOnce(&mut Security, &RecordStore) -> Result<R>,
    {
        let Self {
            name,
            store,
            securities,
            ..
        } = self;
        let security = securities
            .iter_mut()
            .find(|s| s.code() == code)
            .ok_or_else(|| PortfolioError::NotFound(format!("{code} is not held in {name}")))?;
        f(security, store)
    }

    pub fn buy(
        &mut self,
        code: &str,
        quantity: i64,
        unit_price: Decimal,
        date: NaiveDate,
    ) -> Result<Transaction> {
        self.with_security(code, |s, store| s.buy(store, quantity, unit_price, date))
    }

    pub fn sell(
        &mut self,
        code: &str,
        quantity: i64,
        unit_price: Decimal,
        date: NaiveDate,
    ) -> Result<Transaction> {
        self.with_security(code, |s, store| s.sell(store, quantity, unit_price, date))
    }

    pub fn remove_transaction(
        &mut self,
        code: &str,
        quantity_delta: i64,
        unit_price: Decimal,
        date: NaiveDate,
    ) -> Result<()> {
        self.with_security(code, |s, store| {
            s.remove_transaction(store, quantity_delta, unit_price, date)
        })
    }

    pub fn add_dividend(&mut self, code: &str, amount: Decimal, date: NaiveDate) -> Result<()> {
        self.with_security(code, |s, store| s.add_dividend(store, amount, date))
    }

    pub fn remove_dividend(&mut self, code: &str, amount: Decimal, date: NaiveDate) -> Result<()> {
        self.with_security(code, |s, store| s.remove_dividend(store, amount, date))
    }

    /// Walks back from `date` one calendar day at a time until every holding
    /// has a closing price on the same day.
    pub fn resolve_date(&self, date: NaiveDate) -> Result<NaiveDate> {
        let engine = self.engine();
        for offset in 0..=self.lookback_days {
            let Some(candidate) = date.checked_sub_days(Days::new(offset.into())) else {
                break;
            };
            let mut priced = true;
            for security in &self.securities {
                match engine.price_at(security.code(), candidate) {
                    Ok(_) => {}
                    Err(PortfolioError::NotFound(_)) => {
                        debug!(code = security.code(), %candidate, "No price, stepping back a day");
                        priced = false;
                        break;
                    }
                    Err(e) => return Err(e),
                }
            }
            if priced {
                return Ok(candidate);
            }
        }
        Err(PortfolioError::DateUnresolvable {
            date,
            lookback_days: self.lookback_days,
        })
    }

    /// Values every holding on the closest priced day at or before `date`.
    pub fn valuation(&self, date: NaiveDate) -> Result<Valuation> {
        let resolved = self.resolve_date(date)?;
        let engine = self.engine();
        let values = self
            .securities
            .iter()
            .map(|s| -> Result<(String, Decimal)> {
                Ok((s.code().to_string(), engine.value_as_of(s.code(), resolved)?))
            })
            .collect::<Result<Vec<_>>>()?;
        let total: Decimal = values.iter().map(|(_, v)| *v).sum();
        debug!(portfolio = %self.name, %resolved, %total, "Valued portfolio");
        Ok(Valuation {
            date: resolved,
            values,
            total,
        })
    }

    pub fn total_value(&self, date: NaiveDate) -> Result<Decimal> {
        Ok(self.valuation(date)?.total)
    }

    /// Sum of every holding's spend on or before `date`.
    pub fn total_cost(&self, date: NaiveDate) -> Result<Decimal> {
        let engine = self.engine();
        self.securities
            .iter()
            .map(|s| engine.amount_spent_as_of(s.code(), date))
            .sum()
    }

    /// Sum of every holding's dividends paid on or before `date`.
    pub fn total_dividends(&self, date: NaiveDate) -> Result<Decimal> {
        let engine = self.engine();
        self.securities
            .iter()
            .map(|s| engine.dividends_as_of(s.code(), date))
            .sum()
    }

    /// Positions of every holding on the closest priced day at or before `date`.
    pub fn positions(&self, date: NaiveDate) -> Result<Vec<Position>> {
        let resolved = self.resolve_date(date)?;
        let engine = self.engine();
        self.securities
            .iter()
            .map(|s| engine.position(s.code(), resolved))
            .collect()
    }

    fn check_weightings(&self) -> Result<()> {
        let total: Decimal = self.securities.iter().map(|s| s.target_percentage()).sum();
        if total != Decimal::ONE_HUNDRED {
            return Err(PortfolioError::WeightingMismatch { total });
        }
        Ok(())
    }

    /// Sets each weighted holding's current percentage of the portfolio value.
    /// Returns the priced date the percentages were taken on.
    pub fn compute_current_weightings(&mut self, date: NaiveDate) -> Result<NaiveDate> {
        self.check_weightings()?;
        let valuation = self.valuation(date)?;
        for (security, (_, value)) in self.securities.iter_mut().zip(&valuation.values) {
            if let Some(weighting) = security.weighting.as_mut() {
                weighting.current_percentage = Some(percentage_of(*value, valuation.total));
            }
        }
        Ok(valuation.date)
    }

    /// Plans whole-share trades that move the portfolio towards its targets
    /// after adding `portfolio_increase` of new money.
    ///
    /// A holding trades only when the gap to its target value exceeds
    /// `minimum_transaction`; sales are planned only when `selling_allowed`.
    pub fn plan_rebalance(
        &mut self,
        date: NaiveDate,
        portfolio_increase: Decimal,
        selling_allowed: bool,
        minimum_transaction: Decimal,
    ) -> Result<RebalancePlan> {
        self.check_weightings()?;
        let valuation = self.valuation(date)?;
        let desired_total = valuation.total + portfolio_increase;

        let mut trades = Vec::with_capacity(self.securities.len());
        for (security, (code, value)) in self.securities.iter().zip(&valuation.values) {
            let price = self.engine().price_at(code, valuation.date)?;
            let target = security.target_percentage();
            let desired_value = target / Decimal::ONE_HUNDRED * desired_total;
            let difference = desired_value - *value;

            let wants_trade = difference > minimum_transaction
                || (selling_allowed && difference < -minimum_transaction);
            let shares = match difference.checked_div(price) {
                Some(quantity) if wants_trade => quantity
                    .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
                    .to_i64()
                    .ok_or_else(|| {
                        PortfolioError::InvalidData(format!("Trade size for {code} out of range"))
                    })?,
                None if wants_trade => {
                    warn!(code = %code, %price, "Cannot size a trade at this price");
                    0
                }
                _ => 0,
            };

            trades.push(PlannedTrade {
                code: code.clone(),
                shares,
                price,
                cost: Decimal::from(shares) * price,
                target_percentage: target,
                resulting_percentage: Decimal::ZERO,
            });
        }

        let total_spend: Decimal = trades.iter().map(|t| t.cost).sum();
        let post_trade_value = valuation.total + total_spend;
        for (trade, (_, value)) in trades.iter_mut().zip(&valuation.values) {
            trade.resulting_percentage = percentage_of(*value + trade.cost, post_trade_value);
        }

        for (security, (trade, (_, value))) in self
            .securities
            .iter_mut()
            .zip(trades.iter().zip(&valuation.values))
        {
            if let Some(weighting) = security.weighting.as_mut() {
                weighting.current_percentage = Some(percentage_of(*value, valuation.total));
                weighting.desired_trade = Some(trade.shares);
            }
        }

        Ok(RebalancePlan {
            date: valuation.date,
            trades,
            total_spend,
            post_trade_value,
        })
    }

    /// Total market value on each day in `[start, end]` priced for every holding.
    pub fn value_range(&self, start: NaiveDate, end: NaiveDate) -> Result<Series<Decimal>> {
        let engine = self.engine();
        let mut by_date: BTreeMap<NaiveDate, (usize, Decimal)> = BTreeMap::new();
        for security in &self.securities {
            for (date, value) in engine.value_range(security.code(), start, end)? {
                let entry = by_date.entry(date).or_default();
                entry.0 += 1;
                entry.1 += value;
            }
        }
        Ok(by_date
            .into_iter()
            .filter(|(_, (count, _))| *count == self.securities.len())
            .map(|(date, (_, total))| (date, total))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::PricePoint;
    use rust_decimal_macros::dec;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2016, 11, d).unwrap()
    }

    fn add_prices(portfolio: &Portfolio, code: &str, prices: &[(u32, Decimal)]) {
        let points: Vec<_> = prices
            .iter()
            .map(|(d, p)| PricePoint::new(code, day(*d), *p))
            .collect();
        portfolio.store().insert(&points).unwrap();
    }

    /// A at 10 x 60 = 600, B at 20 x 20 = 400 on Friday the 25th.
    fn two_fund_portfolio(target_a: Decimal, target_b: Decimal) -> Portfolio {
        let store = RecordStore::open_in_memory().unwrap();
        let mut portfolio = Portfolio::new("Test", store, 10);
        portfolio.add_security("A", Some(target_a)).unwrap();
        portfolio.add_security("B", Some(target_b)).unwrap();
        add_prices(&portfolio, "A", &[(24, dec!(9)), (25, dec!(10))]);
        add_prices(&portfolio, "B", &[(24, dec!(19)), (25, dec!(20))]);
        portfolio.buy("A", 60, dec!(8), day(1)).unwrap();
        portfolio.buy("B", 20, dec!(15), day(1)).unwrap();
        portfolio
    }

    #[test]
    fn test_total_value_steps_back_over_weekend() {
        let portfolio = two_fund_portfolio(dec!(50), dec!(50));
        // Sunday the 27th resolves to Friday the 25th
        assert_eq!(portfolio.resolve_date(day(27)).unwrap(), day(25));
        assert_eq!(portfolio.total_value(day(27)).unwrap(), dec!(1000));
        assert_eq!(portfolio.total_value(day(24)).unwrap(), dec!(920));
    }

    #[test]
    fn test_resolution_needs_every_holding_priced() {
        let portfolio = two_fund_portfolio(dec!(50), dec!(50));
        add_prices(&portfolio, "A", &[(28, dec!(11))]);
        assert_eq!(portfolio.resolve_date(day(28)).unwrap(), day(25));
    }

    #[test]
    fn test_resolution_is_bounded() {
        let store = RecordStore::open_in_memory().unwrap();
        let mut portfolio = Portfolio::new("Test", store, 3);
        portfolio.add_security("A", None).unwrap();
        add_prices(&portfolio, "A", &[(20, dec!(1))]);

        assert_eq!(portfolio.resolve_date(day(23)).unwrap(), day(20));
        let err = portfolio.resolve_date(day(24)).unwrap_err();
        assert!(matches!(
            err,
            PortfolioError::DateUnresolvable {
                lookback_days: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_totals_are_date_sensitive() {
        let mut portfolio = two_fund_portfolio(dec!(50), dec!(50));
        portfolio.buy("A", 5, dec!(9), day(24)).unwrap();
        portfolio.add_dividend("B", dec!(12), day(10)).unwrap();

        assert_eq!(portfolio.total_cost(day(23)).unwrap(), dec!(780));
        assert_eq!(portfolio.total_cost(day(24)).unwrap(), dec!(825));
        assert_eq!(portfolio.total_dividends(day(9)).unwrap(), dec!(0));
        assert_eq!(portfolio.total_dividends(day(25)).unwrap(), dec!(12));
        assert_eq!(portfolio.security("A").unwrap().total_cost(), dec!(525));
    }

    #[test]
    fn test_current_weightings() {
        let mut portfolio = two_fund_portfolio(dec!(50), dec!(50));
        let resolved = portfolio.compute_current_weightings(day(26)).unwrap();
        assert_eq!(resolved, day(25));

        let current: Vec<_> = portfolio
            .securities()
            .iter()
            .map(|s| s.weighting.as_ref().unwrap().current_percentage)
            .collect();
        assert_eq!(current, vec![Some(dec!(60)), Some(dec!(40))]);
    }

    #[test]
    fn test_weightings_must_sum_to_one_hundred() {
        for (a, b) in [(dec!(50), dec!(49)), (dec!(50), dec!(51))] {
            let mut portfolio = two_fund_portfolio(a, b);
            let err = portfolio.compute_current_weightings(day(25)).unwrap_err();
            assert!(matches!(err, PortfolioError::WeightingMismatch { .. }));
            assert!(
                portfolio
                    .plan_rebalance(day(25), dec!(100), false, dec!(0))
                    .is_err()
            );
        }

        let mut portfolio = two_fund_portfolio(dec!(33.3), dec!(66.7));
        assert!(portfolio.compute_current_weightings(day(25)).is_ok());
    }

    #[test]
    fn test_rebalance_buys_only_beyond_minimum() {
        let mut portfolio = two_fund_portfolio(dec!(50), dec!(50));
        let plan = portfolio
            .plan_rebalance(day(25), dec!(200), false, dec!(50))
            .unwrap();

        assert_eq!(plan.date, day(25));
        assert_eq!(plan.trades[0].code, "A");
        assert_eq!(plan.trades[0].shares, 0);
        assert_eq!(plan.trades[0].cost, dec!(0));
        assert_eq!(plan.trades[1].code, "B");
        assert_eq!(plan.trades[1].shares, 10);
        assert_eq!(plan.trades[1].price, dec!(20));
        assert_eq!(plan.trades[1].cost, dec!(200));
        assert_eq!(plan.total_spend, dec!(200));
        assert_eq!(plan.post_trade_value, dec!(1200));
        assert_eq!(plan.trades[0].resulting_percentage, dec!(50));
        assert_eq!(plan.trades[1].resulting_percentage, dec!(50));

        let b = portfolio.security("B").unwrap().weighting.as_ref().unwrap();
        assert_eq!(b.desired_trade, Some(10));
        assert_eq!(b.current_percentage, Some(dec!(40)));
    }

    #[test]
    fn test_rebalance_sells_only_when_allowed() {
        let mut portfolio = two_fund_portfolio(dec!(30), dec!(70));
        // desired A = 300 (-300), desired B = 700 (+300)
        let plan = portfolio
            .plan_rebalance(day(25), dec!(0), false, dec!(50))
            .unwrap();
        assert_eq!(plan.trades[0].shares, 0);
        assert_eq!(plan.trades[1].shares, 15);

        let plan = portfolio
            .plan_rebalance(day(25), dec!(0), true, dec!(50))
            .unwrap();
        assert_eq!(plan.trades[0].shares, -30);
        assert_eq!(plan.trades[0].cost, dec!(-300));
        assert_eq!(plan.trades[1].shares, 15);
        assert_eq!(plan.total_spend, dec!(0));
        assert_eq!(plan.trades[0].resulting_percentage, dec!(30));
    }

    #[test]
    fn test_rebalance_rounds_to_whole_shares() {
        let mut portfolio = two_fund_portfolio(dec!(50), dec!(50));
        // desired B = 625, gap 225 at 20 a share = 11.25 -> 11
        let plan = portfolio
            .plan_rebalance(day(25), dec!(250), false, dec!(10))
            .unwrap();
        assert_eq!(plan.trades[1].shares, 11);
        // desired A = 625, gap 25 at 10 a share = 2.5 -> 3
        assert_eq!(plan.trades[0].shares, 3);
    }

    #[test]
    fn test_unknown_security_is_not_found() {
        let mut portfolio = two_fund_portfolio(dec!(50), dec!(50));
        let err = portfolio.buy("C", 1, dec!(1), day(1)).unwrap_err();
        assert!(matches!(err, PortfolioError::NotFound(_)));
    }

    #[test]
    fn test_add_security_twice_keeps_counters() {
        let mut portfolio = two_fund_portfolio(dec!(50), dec!(50));
        let a = portfolio.add_security("A", Some(dec!(20))).unwrap();
        assert_eq!(a.shares_owned(), 60);
        assert_eq!(a.target_percentage(), dec!(20));
        assert_eq!(portfolio.securities().len(), 2);
    }

    #[test]
    fn test_portfolio_value_range_and_positions() {
        let portfolio = two_fund_portfolio(dec!(50), dec!(50));
        add_prices(&portfolio, "A", &[(28, dec!(11))]);

        let series = portfolio.value_range(day(20), day(30)).unwrap();
        assert_eq!(series, vec![(day(24), dec!(920)), (day(25), dec!(1000))]);

        let positions = portfolio.positions(day(27)).unwrap();
        assert_eq!(positions.len(), 2);
        assert_eq!(positions[0].as_of, day(25));
        assert_eq!(positions[0].market_value, dec!(600));
        assert_eq!(positions[1].amount_spent, dec!(300));
    }
}
