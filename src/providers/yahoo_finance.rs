use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::core::feed::PriceFeed;
use crate::core::model::PricePoint;
use crate::providers::util::with_retry;

const RETRIES: usize = 2;
const RETRY_DELAY_MS: u64 = 500;

/// Daily closing prices from the Yahoo Finance chart API.
pub struct YahooPriceFeed {
    base_url: String,
    client: reqwest::Client,
}

impl YahooPriceFeed {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("stockfolio/0.1")
            .build()?;
        Ok(YahooPriceFeed {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[derive(Deserialize, Debug)]
struct YahooChartResponse {
    chart: ChartResult,
}

#[derive(Deserialize, Debug)]
struct ChartResult {
    result: Option<Vec<ChartItem>>,
}

#[derive(Deserialize, Debug)]
struct ChartItem {
    meta: ChartMeta,
    timestamp: Option<Vec<i64>>,
    indicators: Option<Indicators>,
}

#[derive(Deserialize, Debug)]
struct ChartMeta {
    #[serde(default, alias = "gmtoffset")]
    gmt_offset: i64,
}

#[derive(Deserialize, Debug)]
struct Indicators {
    quote: Vec<Quote>,
}

#[derive(Deserialize, Debug)]
struct Quote {
    close: Option<Vec<Option<f64>>>,
}

/// Pairs bar timestamps with their closes, shifting each timestamp into the
/// exchange's local day. Bars without a usable close are skipped.
fn closing_prices(code: &str, item: &ChartItem, since: NaiveDate) -> Vec<PricePoint> {
    let (Some(timestamps), Some(closes)) = (
        item.timestamp.as_ref(),
        item.indicators
            .as_ref()
            .and_then(|inds| inds.quote.first())
            .and_then(|q| q.close.as_ref()),
    ) else {
        return Vec::new();
    };

    let mut points: Vec<PricePoint> = timestamps
        .iter()
        .zip(closes)
        .filter_map(|(ts, close)| {
            let date = DateTime::from_timestamp(ts + item.meta.gmt_offset, 0)?.date_naive();
            let close = Decimal::from_f64((*close)?)?.round_dp(4);
            (date >= since && !close.is_sign_negative()).then(|| PricePoint::new(code, date, close))
        })
        .collect();
    points.dedup_by_key(|p| p.date);
    points
}

#[async_trait]
impl PriceFeed for YahooPriceFeed {
    #[instrument(
        name = "YahooHistoryFetch",
        skip(self),
        fields(code = %code, since = %since)
    )]
    async fn fetch_history(&self, code: &str, since: NaiveDate) -> Result<Vec<PricePoint>> {
        let period1 = since
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc().timestamp())
            .unwrap_or_default();
        let period2 = Utc::now().timestamp();
        let url = format!(
            "{}/v8/finance/chart/{}?interval=1d&period1={}&period2={}",
            self.base_url, code, period1, period2
        );
        debug!("Requesting price history from {}", url);

        let response = with_retry(|| self.client.get(&url).send(), RETRIES, RETRY_DELAY_MS)
            .await
            .map_err(|e| anyhow!("Request error: {} for code: {} URL: {}", e, code, url))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for code: {}",
                response.status(),
                code
            ));
        }

        let text = response.text().await?;
        let data: YahooChartResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse JSON response for {}: {}", code, e))?;

        let item = data
            .chart
            .result
            .as_ref()
            .and_then(|r| r.first())
            .ok_or_else(|| anyhow!("No price data found for code: {}", code))?;

        let points = closing_prices(code, item, since);
        debug!(count = points.len(), "Parsed closing prices");
        Ok(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub async fn create_mock_server(code: &str, status: u16, body: &str) -> MockServer {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/v8/finance/chart/{code}")))
            .and(query_param("interval", "1d"))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&mock_server)
            .await;
        mock_server
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_successful_history_fetch() {
        // 23:00 UTC bars land on the next morning in Sydney
        let mock_response = r#"{
            "chart": {
                "result": [{
                    "meta": { "currency": "AUD", "gmtoffset": 39600 },
                    "timestamp": [1479942000, 1480028400, 1480287600],
                    "indicators": { "quote": [{ "close": [75.5, null, 76.125] }] }
                }],
                "error": null
            }
        }"#;
        let mock_server = create_mock_server("VAP.AX", 200, mock_response).await;
        let feed = YahooPriceFeed::new(&mock_server.uri()).unwrap();

        let points = feed.fetch_history("VAP.AX", date(2016, 1, 1)).await.unwrap();
        assert_eq!(
            points,
            vec![
                PricePoint::new("VAP.AX", date(2016, 11, 24), dec!(75.5)),
                PricePoint::new("VAP.AX", date(2016, 11, 28), dec!(76.125)),
            ]
        );
    }

    #[tokio::test]
    async fn test_history_before_since_is_dropped() {
        let mock_response = r#"{
            "chart": {
                "result": [{
                    "meta": { "gmtoffset": 0 },
                    "timestamp": [1479945600, 1480032000],
                    "indicators": { "quote": [{ "close": [10.0, 11.0] }] }
                }]
            }
        }"#;
        let mock_server = create_mock_server("IJR.AX", 200, mock_response).await;
        let feed = YahooPriceFeed::new(&mock_server.uri()).unwrap();

        let points = feed.fetch_history("IJR.AX", date(2016, 11, 25)).await.unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].date, date(2016, 11, 25));
        assert_eq!(points[0].close, dec!(11));
    }

    #[tokio::test]
    async fn test_no_history_result_data() {
        let mock_server = create_mock_server("INVALID", 200, r#"{"chart": {"result": []}}"#).await;
        let feed = YahooPriceFeed::new(&mock_server.uri()).unwrap();

        let result = feed.fetch_history("INVALID", date(2016, 1, 1)).await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "No price data found for code: INVALID"
        );
    }

    #[tokio::test]
    async fn test_history_without_bars_is_empty() {
        let mock_response = r#"{"chart": {"result": [{"meta": {"gmtoffset": 0}}]}}"#;
        let mock_server = create_mock_server("NEW.AX", 200, mock_response).await;
        let feed = YahooPriceFeed::new(&mock_server.uri()).unwrap();

        let points = feed.fetch_history("NEW.AX", date(2016, 1, 1)).await.unwrap();
        assert!(points.is_empty());
    }

    #[tokio::test]
    async fn test_history_api_error_response() {
        let mock_server = create_mock_server("VAP.AX", 404, "").await;
        let feed = YahooPriceFeed::new(&mock_server.uri()).unwrap();

        let result = feed.fetch_history("VAP.AX", date(2016, 1, 1)).await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "HTTP error: 404 Not Found for code: VAP.AX"
        );
    }

    #[tokio::test]
    async fn test_history_malformed_response() {
        let mock_server = create_mock_server("VAP.AX", 200, r#"{"charts": {}}"#).await;
        let feed = YahooPriceFeed::new(&mock_server.uri()).unwrap();

        let result = feed.fetch_history("VAP.AX", date(2016, 1, 1)).await;
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to parse JSON response for VAP.AX")
        );
    }
}
