//! Per-security positions: as-of and ranged running totals over the
//! record store, and the in-memory counters of a held security.

use crate::core::error::{PortfolioError, Result};
use crate::core::model::{DividendPayment, Position, PricePoint, Transaction, Weighting};
use crate::store::{Filter, RecordStore};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::fmt::Display;
use std::ops::AddAssign;
use tracing::{debug, info};

/// Ordered `(date, value)` pairs, one per priced trading day.
pub type Series<T> = Vec<(NaiveDate, T)>;

/// Samples the cumulative sum of `events` on each of `dates`.
///
/// Both inputs must be sorted by date. Every sample includes all events
/// dated on or before it; samples before the first event are zero.
pub fn running_totals<T>(dates: &[NaiveDate], events: &[(NaiveDate, T)]) -> Series<T>
where
    T: Copy + Default + AddAssign,
{
    let mut total = T::default();
    let mut pending = events.iter().peekable();
    dates
        .iter()
        .map(|date| {
            while let Some((_, value)) = pending.next_if(|(event_date, _)| event_date <= date) {
                total += *value;
            }
            (*date, total)
        })
        .collect()
}

/// Answers what a security cost, how many shares were held, what it was
/// worth and what it paid, as of a date or over a range of dates.
pub struct PositionEngine<'a> {
    store: &'a RecordStore,
}

impl<'a> PositionEngine<'a> {
    pub fn new(store: &'a RecordStore) -> Self {
        Self { store }
    }

    fn transactions_until(&self, code: &str, date: NaiveDate) -> Result<Vec<Transaction>> {
        self.store.query(&Filter::code(code).until(date))
    }

    fn dividends_until(&self, code: &str, date: NaiveDate) -> Result<Vec<DividendPayment>> {
        self.store.query(&Filter::code(code).until(date))
    }

    pub fn shares_owned_as_of(&self, code: &str, date: NaiveDate) -> Result<i64> {
        let shares: i64 = self
            .transactions_until(code, date)?
            .iter()
            .map(|t| t.quantity)
            .sum();
        debug!(code, %date, shares, "Shares owned");
        Ok(shares)
    }

    pub fn amount_spent_as_of(&self, code: &str, date: NaiveDate) -> Result<Decimal> {
        Ok(self
            .transactions_until(code, date)?
            .iter()
            .map(|t| t.total_cost)
            .sum())
    }

    pub fn dividends_as_of(&self, code: &str, date: NaiveDate) -> Result<Decimal> {
        Ok(self
            .dividends_until(code, date)?
            .iter()
            .map(|d| d.amount)
            .sum())
    }

    /// Closing price on exactly `date`. No fill in either direction: a day
    /// without a stored price is `NotFound`.
    pub fn price_at(&self, code: &str, date: NaiveDate) -> Result<Decimal> {
        let prices: Vec<PricePoint> = self.store.query(&Filter::code(code).between(date, date))?;
        prices
            .first()
            .map(|p| p.close)
            .ok_or_else(|| PortfolioError::NotFound(format!("No price for {code} on {date}")))
    }

    pub fn value_as_of(&self, code: &str, date: NaiveDate) -> Result<Decimal> {
        let price = self.price_at(code, date)?;
        let shares = self.shares_owned_as_of(code, date)?;
        Ok(Decimal::from(shares) * price)
    }

    /// Everything known about `code` on `date`. Fails like `price_at` when
    /// the day has no price.
    pub fn position(&self, code: &str, date: NaiveDate) -> Result<Position> {
        let price = self.price_at(code, date)?;
        let shares_owned = self.shares_owned_as_of(code, date)?;
        Ok(Position {
            code: code.to_string(),
            as_of: date,
            shares_owned,
            amount_spent: self.amount_spent_as_of(code, date)?,
            dividends_received: self.dividends_as_of(code, date)?,
            market_value: Decimal::from(shares_owned) * price,
        })
    }

    fn prices_between(
        &self,
        code: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PricePoint>> {
        let mut prices: Vec<PricePoint> =
            self.store.query(&Filter::code(code).between(start, end))?;
        prices.dedup_by_key(|p| p.date);
        Ok(prices)
    }

    fn price_dates(
        &self,
        code: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<NaiveDate>> {
        Ok(self
            .prices_between(code, start, end)?
            .into_iter()
            .map(|p| p.date)
            .collect())
    }

    pub fn shares_owned_range(
        &self,
        code: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Series<i64>> {
        let dates = self.price_dates(code, start, end)?;
        let events: Vec<_> = self
            .transactions_until(code, end)?
            .into_iter()
            .map(|t| (t.date, t.quantity))
            .collect();
        Ok(running_totals(&dates, &events))
    }

    pub fn amount_spent_range(
        &self,
        code: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Series<Decimal>> {
        let dates = self.price_dates(code, start, end)?;
        let events: Vec<_> = self
            .transactions_until(code, end)?
            .into_iter()
            .map(|t| (t.date, t.total_cost))
            .collect();
        Ok(running_totals(&dates, &events))
    }

    pub fn dividends_range(
        &self,
        code: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Series<Decimal>> {
        let dates = self.price_dates(code, start, end)?;
        let events: Vec<_> = self
            .dividends_until(code, end)?
            .into_iter()
            .map(|d| (d.date, d.amount))
            .collect();
        Ok(running_totals(&dates, &events))
    }

    /// Market value on each priced day; zero before the first transaction.
    pub fn value_range(
        &self,
        code: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Series<Decimal>> {
        let prices = self.prices_between(code, start, end)?;
        let dates: Vec<_> = prices.iter().map(|p| p.date).collect();
        let events: Vec<_> = self
            .transactions_until(code, end)?
            .into_iter()
            .map(|t| (t.date, t.quantity))
            .collect();
        Ok(running_totals(&dates, &events)
            .into_iter()
            .zip(&prices)
            .map(|((date, shares), price)| (date, Decimal::from(shares) * price.close))
            .collect())
    }

    /// Transactions dated within `[from, to]`, for one code or all of them.
    pub fn transactions(
        &self,
        code: Option<&str>,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Transaction>> {
        let filter = match code {
            Some(code) => Filter::code(code),
            None => Filter::all(),
        };
        self.store.query(&filter.between(from, to))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct Counters {
    shares_owned: i64,
    total_cost: Decimal,
    dividends: Decimal,
}

impl Counters {
    fn add_trade(self, quantity: i64, cost: Decimal) -> Option<Self> {
        Some(Self {
            shares_owned: self.shares_owned.checked_add(quantity)?,
            total_cost: self.total_cost.checked_add(cost)?,
            ..self
        })
    }

    fn remove_trade(self, quantity: i64, cost: Decimal) -> Option<Self> {
        Some(Self {
            shares_owned: self.shares_owned.checked_sub(quantity)?,
            total_cost: self.total_cost.checked_sub(cost)?,
            ..self
        })
    }

    fn add_dividend(self, amount: Decimal) -> Option<Self> {
        Some(Self {
            dividends: self.dividends.checked_add(amount)?,
            ..self
        })
    }

    fn remove_dividend(self, amount: Decimal) -> Option<Self> {
        Some(Self {
            dividends: self.dividends.checked_sub(amount)?,
            ..self
        })
    }
}

fn overflow(code: &str) -> PortfolioError {
    PortfolioError::InvalidData(format!("Running totals for {code} overflow"))
}

/// A held security with running totals kept in memory alongside the store.
///
/// Counters belong to the instance and move together with every recorded
/// change; a failed change leaves them as they were.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Security {
    code: String,
    counters: Counters,
    pub weighting: Option<Weighting>,
}

impl Security {
    pub fn new(code: &str) -> Self {
        Self {
            code: code.to_string(),
            counters: Counters::default(),
            weighting: None,
        }
    }

    /// Builds a security whose counters reflect every record already stored
    /// for `code`.
    pub fn load(store: &RecordStore, code: &str, weighting: Option<Weighting>) -> Result<Self> {
        let transactions: Vec<Transaction> = store.query(&Filter::code(code))?;
        let dividends: Vec<DividendPayment> = store.query(&Filter::code(code))?;
        let counters = transactions
            .iter()
            .try_fold(Counters::default(), |c, t| c.add_trade(t.quantity, t.total_cost))
            .and_then(|c| dividends.iter().try_fold(c, |c, d| c.add_dividend(d.amount)))
            .ok_or_else(|| overflow(code))?;
        debug!(code, ?counters, "Loaded security");
        Ok(Self {
            code: code.to_string(),
            counters,
            weighting,
        })
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn shares_owned(&self) -> i64 {
        self.counters.shares_owned
    }

    pub fn total_cost(&self) -> Decimal {
        self.counters.total_cost
    }

    pub fn dividends(&self) -> Decimal {
        self.counters.dividends
    }

    pub fn target_percentage(&self) -> Decimal {
        self.weighting
            .as_ref()
            .map_or(Decimal::ZERO, |w| w.target_percentage)
    }

    fn commit<F>(&mut self, next: Counters, persist: F) -> Result<()>
    where
        F: FnOnce() -> Result<()>,
    {
        let previous = std::mem::replace(&mut self.counters, next);
        if let Err(e) = persist() {
            self.counters = previous;
            return Err(e);
        }
        Ok(())
    }

    fn record_transaction(
        &mut self,
        store: &RecordStore,
        transaction: Transaction,
    ) -> Result<Transaction> {
        let next = self
            .counters
            .add_trade(transaction.quantity, transaction.total_cost)
            .ok_or_else(|| overflow(&self.code))?;
        self.commit(next, || store.insert(std::slice::from_ref(&transaction)).map(|_| ()))?;
        info!(
            code = %transaction.code,
            date = %transaction.date,
            quantity = transaction.quantity,
            unit_price = %transaction.unit_price,
            "Recorded transaction"
        );
        Ok(transaction)
    }

    /// Records a purchase of `quantity` shares. The sign of `quantity` is
    /// taken as given.
    pub fn buy(
        &mut self,
        store: &RecordStore,
        quantity: i64,
        unit_price: Decimal,
        date: NaiveDate,
    ) -> Result<Transaction> {
        let transaction = Transaction::new(&self.code, date, quantity, unit_price)?;
        self.record_transaction(store, transaction)
    }

    /// Records a sale of `quantity` shares. Fails without touching the store
    /// when `quantity` is not positive or more shares would be sold than are
    /// currently owned.
    pub fn sell(
        &mut self,
        store: &RecordStore,
        quantity: i64,
        unit_price: Decimal,
        date: NaiveDate,
    ) -> Result<Transaction> {
        if quantity <= 0 {
            return Err(PortfolioError::InvalidData(format!(
                "Cannot sell {quantity} shares of {}",
                self.code
            )));
        }
        if self.counters.shares_owned < quantity {
            return Err(PortfolioError::InsufficientShares {
                code: self.code.clone(),
                owned: self.counters.shares_owned,
                requested: quantity,
            });
        }
        let transaction = Transaction::new(&self.code, date, -quantity, unit_price)?;
        self.record_transaction(store, transaction)
    }

    /// Deletes the transaction matching all fields exactly and reverses its
    /// effect on the counters.
    pub fn remove_transaction(
        &mut self,
        store: &RecordStore,
        quantity_delta: i64,
        unit_price: Decimal,
        date: NaiveDate,
    ) -> Result<()> {
        let transaction = Transaction::new(&self.code, date, quantity_delta, unit_price)?;
        let next = self
            .counters
            .remove_trade(transaction.quantity, transaction.total_cost)
            .ok_or_else(|| overflow(&self.code))?;
        self.commit(next, || match store.delete_one(&transaction)? {
            0 => Err(PortfolioError::NotFound(format!(
                "No transaction of {quantity_delta} x {unit_price} on {date} for {}",
                transaction.code
            ))),
            _ => Ok(()),
        })?;
        info!(code = %self.code, %date, quantity_delta, "Removed transaction");
        Ok(())
    }

    pub fn add_dividend(
        &mut self,
        store: &RecordStore,
        amount: Decimal,
        date: NaiveDate,
    ) -> Result<()> {
        let dividend = DividendPayment::new(&self.code, date, amount);
        let next = self
            .counters
            .add_dividend(dividend.amount)
            .ok_or_else(|| overflow(&self.code))?;
        self.commit(next, || store.insert(std::slice::from_ref(&dividend)).map(|_| ()))?;
        info!(code = %self.code, %date, %amount, "Recorded dividend");
        Ok(())
    }

    pub fn remove_dividend(
        &mut self,
        store: &RecordStore,
        amount: Decimal,
        date: NaiveDate,
    ) -> Result<()> {
        let dividend = DividendPayment::new(&self.code, date, amount);
        let next = self
            .counters
            .remove_dividend(dividend.amount)
            .ok_or_else(|| overflow(&self.code))?;
        self.commit(next, || match store.delete_one(&dividend)? {
            0 => Err(PortfolioError::NotFound(format!(
                "No dividend of {amount} on {date} for {}",
                dividend.code
            ))),
            _ => Ok(()),
        })?;
        info!(code = %self.code, %date, %amount, "Removed dividend");
        Ok(())
    }
}

impl Display for Security {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} - number owned: {}, total cost: {}",
            self.code, self.counters.shares_owned, self.counters.total_cost
        )?;
        if let Some(weighting) = &self.weighting {
            write!(f, ", portfolio weighting: {}%", weighting.target_percentage)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2016, 11, d).unwrap()
    }

    fn store_with_prices(code: &str, prices: &[(u32, Decimal)]) -> RecordStore {
        let store = RecordStore::open_in_memory().unwrap();
        let points: Vec<_> = prices
            .iter()
            .map(|(d, p)| PricePoint::new(code, day(*d), *p))
            .collect();
        store.insert(&points).unwrap();
        store
    }

    #[test]
    fn test_running_totals_fill_forward() {
        let dates = [day(1), day(2), day(3), day(4)];
        let events = [(day(2), 5), (day(2), 1), (day(4), -3)];
        assert_eq!(
            running_totals(&dates, &events),
            vec![(day(1), 0), (day(2), 6), (day(3), 6), (day(4), 3)]
        );

        // events before the first sample are folded into it
        let events = [(day(1), dec!(1.5))];
        assert_eq!(
            running_totals(&dates[2..], &events),
            vec![(day(3), dec!(1.5)), (day(4), dec!(1.5))]
        );
        assert!(running_totals::<i64>(&[], &[(day(1), 1)]).is_empty());
    }

    #[test]
    fn test_shares_owned_range_buy_then_sell() {
        let store = store_with_prices(
            "VAP",
            &[
                (1, dec!(10)),
                (2, dec!(11)),
                (3, dec!(12)),
                (4, dec!(13)),
                (5, dec!(14)),
            ],
        );
        let mut vap = Security::new("VAP");
        vap.buy(&store, 10, dec!(10), day(1)).unwrap();
        vap.sell(&store, 4, dec!(12), day(3)).unwrap();

        let engine = PositionEngine::new(&store);
        let shares: Vec<i64> = engine
            .shares_owned_range("VAP", day(1), day(5))
            .unwrap()
            .into_iter()
            .map(|(_, s)| s)
            .collect();
        assert_eq!(shares, vec![10, 10, 6, 6, 6]);

        let spent = engine.amount_spent_range("VAP", day(1), day(5)).unwrap();
        assert_eq!(spent[1], (day(2), dec!(100)));
        assert_eq!(spent[2], (day(3), dec!(52)));

        let values = engine.value_range("VAP", day(1), day(5)).unwrap();
        assert_eq!(values[0], (day(1), dec!(100)));
        assert_eq!(values[4], (day(5), dec!(84)));
    }

    #[test]
    fn test_ranges_are_zero_before_first_transaction() {
        let store = store_with_prices("VEU", &[(1, dec!(50)), (2, dec!(51)), (3, dec!(52))]);
        let mut veu = Security::new("VEU");
        veu.buy(&store, 3, dec!(52), day(3)).unwrap();
        veu.add_dividend(&store, dec!(4.2), day(3)).unwrap();

        let engine = PositionEngine::new(&store);
        let values = engine.value_range("VEU", day(1), day(3)).unwrap();
        assert_eq!(
            values,
            vec![(day(1), dec!(0)), (day(2), dec!(0)), (day(3), dec!(156))]
        );
        let dividends = engine.dividends_range("VEU", day(2), day(3)).unwrap();
        assert_eq!(dividends, vec![(day(2), dec!(0)), (day(3), dec!(4.2))]);
    }

    #[test]
    fn test_as_of_queries() {
        let store = store_with_prices("IJR", &[(28, dec!(150.5))]);
        let mut ijr = Security::new("IJR");
        ijr.buy(&store, 61, dec!(115.22), day(1)).unwrap();
        ijr.buy(&store, 4, dec!(140), day(20)).unwrap();
        ijr.add_dividend(&store, dec!(20), day(15)).unwrap();

        let engine = PositionEngine::new(&store);
        assert_eq!(engine.shares_owned_as_of("IJR", day(10)).unwrap(), 61);
        assert_eq!(engine.shares_owned_as_of("IJR", day(28)).unwrap(), 65);
        assert_eq!(engine.shares_owned_as_of("IJR", NaiveDate::MIN).unwrap(), 0);
        assert_eq!(engine.shares_owned_as_of("NONE", day(28)).unwrap(), 0);
        assert_eq!(engine.amount_spent_as_of("IJR", day(28)).unwrap(), dec!(7588.42));
        assert_eq!(engine.dividends_as_of("IJR", day(14)).unwrap(), dec!(0));
        assert_eq!(engine.dividends_as_of("IJR", day(15)).unwrap(), dec!(20));

        let price = engine.price_at("IJR", day(28)).unwrap();
        let shares = engine.shares_owned_as_of("IJR", day(28)).unwrap();
        assert_eq!(
            engine.value_as_of("IJR", day(28)).unwrap(),
            Decimal::from(shares) * price
        );

        let position = engine.position("IJR", day(28)).unwrap();
        assert_eq!(position.shares_owned, 65);
        assert_eq!(position.market_value, dec!(9782.5));
        assert_eq!(position.dividends_received, dec!(20));
    }

    #[test]
    fn test_price_lookup_is_exact_date() {
        let store = store_with_prices("IJR", &[(25, dec!(150))]);
        let engine = PositionEngine::new(&store);
        assert!(matches!(
            engine.price_at("IJR", day(26)),
            Err(PortfolioError::NotFound(_))
        ));
        assert!(matches!(
            engine.value_as_of("IJR", day(26)),
            Err(PortfolioError::NotFound(_))
        ));
    }

    #[test]
    fn test_sell_more_than_owned_is_rejected() {
        let store = RecordStore::open_in_memory().unwrap();
        let mut vap = Security::new("VAP");
        vap.buy(&store, 5, dec!(70), day(1)).unwrap();

        let err = vap.sell(&store, 6, dec!(75), day(2)).unwrap_err();
        assert!(matches!(
            err,
            PortfolioError::InsufficientShares {
                owned: 5,
                requested: 6,
                ..
            }
        ));
        assert_eq!(vap.shares_owned(), 5);
        assert_eq!(vap.total_cost(), dec!(350));
        let engine = PositionEngine::new(&store);
        assert_eq!(engine.shares_owned_as_of("VAP", day(2)).unwrap(), 5);

        vap.sell(&store, 5, dec!(75), day(2)).unwrap();
        assert_eq!(vap.shares_owned(), 0);
    }

    #[test]
    fn test_sell_requires_positive_quantity() {
        let store = RecordStore::open_in_memory().unwrap();
        let mut vap = Security::new("VAP");
        vap.buy(&store, 5, dec!(70), day(1)).unwrap();
        let before = vap.clone();

        for quantity in [0, -3] {
            let err = vap.sell(&store, quantity, dec!(75), day(2)).unwrap_err();
            assert!(matches!(err, PortfolioError::InvalidData(_)));
        }
        assert_eq!(vap, before);
        let engine = PositionEngine::new(&store);
        assert_eq!(engine.transactions(Some("VAP"), day(1), day(30)).unwrap().len(), 1);
    }

    #[test]
    fn test_overflowing_amounts_are_rejected() {
        let store = RecordStore::open_in_memory().unwrap();
        let mut big = Security::new("BIG");
        big.buy(&store, 10, dec!(5), day(1)).unwrap();
        big.add_dividend(&store, dec!(1), day(1)).unwrap();
        let before = big.clone();

        // total cost does not fit a Decimal
        let err = big
            .buy(&store, i64::MAX, dec!(10000000000), day(2))
            .unwrap_err();
        assert!(matches!(err, PortfolioError::InvalidData(_)));

        // share count does not fit an i64
        let err = big.buy(&store, i64::MAX, dec!(0), day(2)).unwrap_err();
        assert!(matches!(err, PortfolioError::InvalidData(_)));

        let err = big.add_dividend(&store, Decimal::MAX, day(2)).unwrap_err();
        assert!(matches!(err, PortfolioError::InvalidData(_)));

        assert_eq!(big, before);
        let engine = PositionEngine::new(&store);
        assert_eq!(engine.shares_owned_as_of("BIG", day(30)).unwrap(), 10);
        assert_eq!(engine.dividends_as_of("BIG", day(30)).unwrap(), dec!(1));
    }

    #[test]
    fn test_remove_transaction_restores_counters() {
        let store = RecordStore::open_in_memory().unwrap();
        let mut vap = Security::new("VAP");
        vap.buy(&store, 26, dec!(76.11), day(1)).unwrap();
        let before = vap.clone();
        vap.buy(&store, 18, dec!(74.66), day(2)).unwrap();

        let err = vap
            .remove_transaction(&store, 18, dec!(74.67), day(2))
            .unwrap_err();
        assert!(matches!(err, PortfolioError::NotFound(_)));
        assert_eq!(vap.shares_owned(), 44);

        vap.remove_transaction(&store, 18, dec!(74.66), day(2)).unwrap();
        assert_eq!(vap, before);
        let engine = PositionEngine::new(&store);
        assert_eq!(engine.shares_owned_as_of("VAP", day(30)).unwrap(), 26);

        // a sale is removed by its negative delta
        vap.sell(&store, 6, dec!(80), day(3)).unwrap();
        vap.remove_transaction(&store, -6, dec!(80), day(3)).unwrap();
        assert_eq!(vap, before);
    }

    #[test]
    fn test_dividends_add_and_remove() {
        let store = RecordStore::open_in_memory().unwrap();
        let mut veu = Security::new("VEU");
        veu.add_dividend(&store, dec!(12.5), day(1)).unwrap();
        veu.add_dividend(&store, dec!(7.5), day(2)).unwrap();
        assert_eq!(veu.dividends(), dec!(20));

        let err = veu.remove_dividend(&store, dec!(7.5), day(1)).unwrap_err();
        assert!(matches!(err, PortfolioError::NotFound(_)));
        assert_eq!(veu.dividends(), dec!(20));

        veu.remove_dividend(&store, dec!(7.5), day(2)).unwrap();
        assert_eq!(veu.dividends(), dec!(12.5));
    }

    #[test]
    fn test_repeated_reads_count_insert_once() {
        let store = RecordStore::open_in_memory().unwrap();
        let mut ijr = Security::new("IJR");
        ijr.buy(&store, 61, dec!(115.22), day(1)).unwrap();

        let engine = PositionEngine::new(&store);
        for _ in 0..3 {
            assert_eq!(engine.shares_owned_as_of("IJR", day(1)).unwrap(), 61);
        }
    }

    #[test]
    fn test_load_and_display() {
        let store = RecordStore::open_in_memory().unwrap();
        let mut veu = Security::new("VEU.AX");
        veu.buy(&store, 27, dec!(55.25), day(1)).unwrap();
        veu.buy(&store, 20, dec!(55.26), day(2)).unwrap();
        veu.add_dividend(&store, dec!(30), day(3)).unwrap();

        let loaded = Security::load(&store, "VEU.AX", Some(Weighting::new(dec!(40)))).unwrap();
        assert_eq!(loaded.shares_owned(), 47);
        assert_eq!(loaded.total_cost(), dec!(2596.95));
        assert_eq!(loaded.dividends(), dec!(30));
        assert_eq!(
            loaded.to_string(),
            "VEU.AX - number owned: 47, total cost: 2596.95, portfolio weighting: 40%"
        );
        assert_eq!(
            Security::new("IJR.AX").to_string(),
            "IJR.AX - number owned: 0, total cost: 0"
        );
    }

    #[test]
    fn test_transaction_listing() {
        let store = RecordStore::open_in_memory().unwrap();
        let mut veu = Security::new("VEU.AX");
        let mut ijr = Security::new("IJR.AX");
        ijr.buy(&store, 61, dec!(115.22), day(1)).unwrap();
        veu.buy(&store, 27, dec!(55.25), day(2)).unwrap();
        veu.buy(&store, 20, dec!(55.26), day(9)).unwrap();

        let engine = PositionEngine::new(&store);
        assert_eq!(engine.transactions(None, day(1), day(30)).unwrap().len(), 3);
        let veu_early = engine
            .transactions(Some("VEU.AX"), day(1), day(5))
            .unwrap();
        assert_eq!(veu_early.len(), 1);
        assert_eq!(veu_early[0].quantity, 27);
    }
}
