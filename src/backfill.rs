//! Incremental download of closing prices into the record store.

use crate::core::error::Result;
use crate::core::feed::PriceFeed;
use crate::core::model::PricePoint;
use crate::store::RecordStore;
use chrono::{Datelike, Days, NaiveDate, Weekday};
use tracing::{debug, info, warn};

/// Start of the request window for a code with no stored prices.
pub fn earliest_history() -> NaiveDate {
    NaiveDate::from_ymd_opt(1900, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// First day that can hold a price newer than `latest`: the following day,
/// or the Monday after when `latest` is a Friday.
pub fn next_trading_day(latest: NaiveDate) -> NaiveDate {
    let step = if latest.weekday() == Weekday::Fri { 3 } else { 1 };
    latest
        .checked_add_days(Days::new(step))
        .unwrap_or(latest)
}

/// Fetches prices for `code` newer than the latest stored one and appends
/// them. A failing feed is logged and counts as no new data; what is already
/// stored is left untouched. Returns the number of prices added.
pub async fn update_price_data(
    store: &RecordStore,
    feed: &dyn PriceFeed,
    code: &str,
    today: NaiveDate,
) -> Result<usize> {
    let latest = store.latest_price_date(code)?;
    let since = match latest {
        None => {
            info!(code, "No stored prices, downloading full history");
            earliest_history()
        }
        Some(latest) => next_trading_day(latest),
    };
    if since > today {
        debug!(code, %since, "Prices already up to date");
        return Ok(0);
    }

    let points = match feed.fetch_history(code, since).await {
        Ok(points) => points,
        Err(e) => {
            warn!(code, error = %e, "Price feed failed, keeping stored prices");
            return Ok(0);
        }
    };

    let fresh: Vec<PricePoint> = points
        .into_iter()
        .filter(|p| p.code == code && latest.is_none_or(|latest| p.date > latest))
        .collect();
    let inserted = store.insert(&fresh)?;
    info!(code, inserted, "Stored new closing prices");
    Ok(inserted)
}

/// Runs `update_price_data` for each code in turn, reporting progress after
/// every code.
pub async fn update_all(
    store: &RecordStore,
    feed: &dyn PriceFeed,
    codes: &[&str],
    today: NaiveDate,
    update_callback: &dyn Fn(),
) -> Result<Vec<(String, usize)>> {
    let mut results = Vec::with_capacity(codes.len());
    for code in codes {
        let inserted = update_price_data(store, feed, code, today).await?;
        results.push((code.to_string(), inserted));
        update_callback();
    }
    Ok(results)
}
