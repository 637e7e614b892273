//! Mapping between domain records and their SQLite rows

use crate::core::model::{DividendPayment, PricePoint, Transaction};
use chrono::NaiveDate;
use rusqlite::Row;
use rusqlite::types::{Type, Value};
use rust_decimal::Decimal;
use std::str::FromStr;

/// The three record sets the store persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Transactions,
    Prices,
    Dividends,
}

impl Table {
    pub const ALL: [Table; 3] = [Table::Transactions, Table::Prices, Table::Dividends];

    pub fn name(&self) -> &'static str {
        match self {
            Table::Transactions => "transactions",
            Table::Prices => "prices",
            Table::Dividends => "dividends",
        }
    }

    /// Column definitions. Decimals are kept as normalised TEXT so that
    /// exact-match deletes compare the same representation that was written.
    pub(crate) fn column_defs(&self) -> &'static str {
        match self {
            Table::Transactions => {
                "code TEXT NOT NULL, date TEXT NOT NULL, quantity INTEGER NOT NULL, \
                 unit_price TEXT NOT NULL, total_cost TEXT NOT NULL"
            }
            Table::Prices => "code TEXT NOT NULL, date TEXT NOT NULL, close TEXT NOT NULL",
            Table::Dividends => "code TEXT NOT NULL, date TEXT NOT NULL, amount TEXT NOT NULL",
        }
    }
}

/// A record type that lives in one of the store's tables.
pub trait StoredRecord: Sized {
    const TABLE: Table;
    const COLUMNS: &'static [&'static str];

    fn code(&self) -> &str;
    fn to_values(&self) -> Vec<Value>;
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}

fn date_value(date: NaiveDate) -> Value {
    Value::Text(date.format("%Y-%m-%d").to_string())
}

fn decimal_value(value: Decimal) -> Value {
    Value::Text(value.normalize().to_string())
}

pub(crate) fn decimal_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let text: String = row.get(idx)?;
    Decimal::from_str(&text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

impl StoredRecord for Transaction {
    const TABLE: Table = Table::Transactions;
    const COLUMNS: &'static [&'static str] =
        &["code", "date", "quantity", "unit_price", "total_cost"];

    fn code(&self) -> &str {
        &self.code
    }

    fn to_values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.code.clone()),
            date_value(self.date),
            Value::Integer(self.quantity),
            decimal_value(self.unit_price),
            decimal_value(self.total_cost),
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Transaction {
            code: row.get(0)?,
            date: row.get(1)?,
            quantity: row.get(2)?,
            unit_price: decimal_at(row, 3)?,
            total_cost: decimal_at(row, 4)?,
        })
    }
}

impl StoredRecord for PricePoint {
    const TABLE: Table = Table::Prices;
    const COLUMNS: &'static [&'static str] = &["code", "date", "close"];

    fn code(&self) -> &str {
        &self.code
    }

    fn to_values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.code.clone()),
            date_value(self.date),
            decimal_value(self.close),
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(PricePoint {
            code: row.get(0)?,
            date: row.get(1)?,
            close: decimal_at(row, 2)?,
        })
    }
}

impl StoredRecord for DividendPayment {
    const TABLE: Table = Table::Dividends;
    const COLUMNS: &'static [&'static str] = &["code", "date", "amount"];

    fn code(&self) -> &str {
        &self.code
    }

    fn to_values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.code.clone()),
            date_value(self.date),
            decimal_value(self.amount),
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(DividendPayment {
            code: row.get(0)?,
            date: row.get(1)?,
            amount: decimal_at(row, 2)?,
        })
    }
}

/// Predicate for `RecordStore::query`: every field that is set must match.
/// Date bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    pub code: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl Filter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn code(code: &str) -> Self {
        Self {
            code: Some(code.to_string()),
            ..Self::default()
        }
    }

    pub fn since(mut self, date: NaiveDate) -> Self {
        self.from = Some(date);
        self
    }

    pub fn until(mut self, date: NaiveDate) -> Self {
        self.to = Some(date);
        self
    }

    pub fn between(self, from: NaiveDate, to: NaiveDate) -> Self {
        self.since(from).until(to)
    }

    /// Builds the WHERE clause and its bound values.
    pub(crate) fn to_sql(&self) -> (String, Vec<Value>) {
        let mut clauses = Vec::new();
        let mut values = Vec::new();
        if let Some(code) = &self.code {
            values.push(Value::Text(code.clone()));
            clauses.push(format!("code = ?{}", values.len()));
        }
        if let Some(from) = self.from {
            values.push(date_value(from));
            clauses.push(format!("date >= ?{}", values.len()));
        }
        if let Some(to) = self.to {
            values.push(date_value(to));
            clauses.push(format!("date <= ?{}", values.len()));
        }

        if clauses.is_empty() {
            (String::new(), values)
        } else {
            (format!(" WHERE {}", clauses.join(" AND ")), values)
        }
    }
}
