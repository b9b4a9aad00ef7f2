use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::core::cache::Cache;
use crate::core::price::{PriceProvider, PriceResult};
use crate::core::sector::SectorProvider;
use crate::providers::util::with_retry;

const USER_AGENT: &str = "stockalloc/0.1";
const RETRIES: usize = 3;
const RETRY_DELAY_MS: u64 = 500;

fn client() -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder().user_agent(USER_AGENT).build()?)
}

// YahooFinanceProvider implementation for PriceProvider
pub struct YahooFinanceProvider {
    base_url: String,
    cache: Arc<Cache<String, PriceResult>>,
}

impl YahooFinanceProvider {
    pub fn new(base_url: &str, cache: Arc<Cache<String, PriceResult>>) -> Self {
        YahooFinanceProvider {
            base_url: base_url.to_string(),
            cache,
        }
    }
}

#[derive(Deserialize, Debug)]
struct YahooPriceResponse {
    chart: PriceChartResult,
}

#[derive(Deserialize, Debug)]
struct PriceChartResult {
    result: Option<Vec<PriceChartItem>>,
}

#[derive(Deserialize, Debug)]
struct PriceChartItem {
    meta: PriceChartMeta,
}

#[derive(Deserialize, Debug)]
struct PriceChartMeta {
    #[serde(alias = "regularMarketPrice")]
    regular_market_price: Option<f64>,
    currency: Option<String>,
    #[serde(alias = "regularMarketTime")]
    regular_market_time: Option<i64>,
}

#[async_trait]
impl PriceProvider for YahooFinanceProvider {
    #[instrument(
        name = "YahooPriceFetch",
        skip(self),
        fields(symbol = %symbol)
    )]
    async fn fetch_price(&self, symbol: &str) -> Result<PriceResult> {
        self.cache
            .get_or_fetch(symbol.to_string(), || self.request_price(symbol))
            .await
    }
}

impl YahooFinanceProvider {
    async fn request_price(&self, symbol: &str) -> Result<PriceResult> {
        let url = format!(
            "{}/v8/finance/chart/{}?interval=1d&range=1d",
            self.base_url, symbol
        );
        debug!("Requesting price data from {}", url);

        let client = client()?;
        let response = with_retry(|| client.get(&url).send(), RETRIES, RETRY_DELAY_MS)
            .await
            .map_err(|e| anyhow!("Request error: {} for symbol: {}", e, symbol))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for symbol: {}",
                response.status(),
                symbol
            ));
        }

        let text = response.text().await?;
        let data: YahooPriceResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse JSON response for {}: {}", symbol, e))?;

        let meta = data
            .chart
            .result
            .and_then(|items| items.into_iter().next())
            .map(|item| item.meta)
            .ok_or_else(|| anyhow!("No price data found for symbol: {}", symbol))?;
        let price = meta
            .regular_market_price
            .ok_or_else(|| anyhow!("No market price for symbol: {}", symbol))?;

        Ok(PriceResult {
            price,
            currency: meta.currency.unwrap_or_else(|| "USD".to_string()),
            as_of: meta
                .regular_market_time
                .and_then(|ts| Utc.timestamp_opt(ts, 0).single()),
        })
    }
}

// YahooSectorProvider implementation for SectorProvider
pub struct YahooSectorProvider {
    base_url: String,
    cache: Arc<Cache<String, Option<String>>>,
}

impl YahooSectorProvider {
    pub fn new(base_url: &str, cache: Arc<Cache<String, Option<String>>>) -> Self {
        YahooSectorProvider {
            base_url: base_url.to_string(),
            cache,
        }
    }
}

#[derive(Debug, Deserialize)]
struct YahooSummaryResponse {
    #[serde(alias = "quoteSummary")]
    quote_summary: QuoteSummary,
}

#[derive(Debug, Deserialize)]
struct QuoteSummary {
    result: Option<Vec<QuoteSummaryItem>>,
    error: Option<QuoteSummaryError>,
}

#[derive(Debug, Deserialize)]
struct QuoteSummaryError {
    description: String,
}

#[derive(Debug, Deserialize)]
struct QuoteSummaryItem {
    #[serde(alias = "assetProfile")]
    asset_profile: Option<AssetProfile>,
}

#[derive(Debug, Deserialize)]
struct AssetProfile {
    sector: Option<String>,
}

#[async_trait]
impl SectorProvider for YahooSectorProvider {
    #[instrument(
        name = "YahooSectorFetch",
        skip(self),
        fields(symbol = %symbol)
    )]
    async fn fetch_sector(&self, symbol: &str) -> Result<Option<String>> {
        self.cache
            .get_or_fetch(symbol.to_string(), || self.request_sector(symbol))
            .await
    }
}

impl YahooSectorProvider {
    async fn request_sector(&self, symbol: &str) -> Result<Option<String>> {
        let url = format!(
            "{}/v10/finance/quoteSummary/{}?modules=assetProfile",
            self.base_url, symbol
        );
        debug!("Requesting asset profile from {}", url);

        let client = client()?;
        let response = with_retry(|| client.get(&url).send(), RETRIES, RETRY_DELAY_MS)
            .await
            .map_err(|e| anyhow!("Request error: {} for symbol: {}", e, symbol))?;

        let status = response.status();
        let text = response.text().await?;
        let data: YahooSummaryResponse = serde_json::from_str(&text).map_err(|e| {
            if status.is_success() {
                anyhow!("Failed to parse JSON response for {}: {}", symbol, e)
            } else {
                anyhow!("HTTP error: {} for symbol: {}", status, symbol)
            }
        })?;

        if let Some(err) = data.quote_summary.error {
            return Err(anyhow!(
                "Sector lookup failed for {}: {}",
                symbol,
                err.description
            ));
        }

        Ok(data
            .quote_summary
            .result
            .and_then(|items| items.into_iter().next())
            .and_then(|item| item.asset_profile)
            .and_then(|profile| profile.sector))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub async fn create_mock_server(request_path: &str, status: u16, body: &str) -> MockServer {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(request_path))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&mock_server)
            .await;

        mock_server
    }

    // Tests for YahooFinanceProvider (PriceProvider)
    #[tokio::test]
    async fn test_successful_price_fetch() {
        let mock_response = r#"{
            "chart": {
                "result": [{
                    "meta": {
                        "regularMarketPrice": 150.65,
                        "currency": "USD",
                        "regularMarketTime": 1700000000
                    }
                }]
            }
        }"#;

        let mock_server = create_mock_server("/v8/finance/chart/AAPL", 200, mock_response).await;
        let cache = Arc::new(Cache::new());

        let provider = YahooFinanceProvider::new(&mock_server.uri(), Arc::clone(&cache));
        let result = provider.fetch_price("AAPL").await.unwrap();
        assert_eq!(result.price, 150.65);
        assert_eq!(result.currency, "USD");
        assert_eq!(result.as_of.map(|t| t.timestamp()), Some(1_700_000_000));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_price_served_from_cache() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v8/finance/chart/MSFT"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"chart": {"result": [{"meta": {"regularMarketPrice": 410.0}}]}}"#,
            ))
            .expect(1)
            .mount(&mock_server)
            .await;

        let provider = YahooFinanceProvider::new(&mock_server.uri(), Arc::new(Cache::new()));
        let first = provider.fetch_price("MSFT").await.unwrap();
        let second = provider.fetch_price("MSFT").await.unwrap();
        assert_eq!(first.price, 410.0);
        assert_eq!(second.price, 410.0);
        assert_eq!(second.currency, "USD");
        assert!(second.as_of.is_none());
    }

    #[tokio::test]
    async fn test_no_price_result_data() {
        let mock_response = r#"{"chart": {"result": []}}"#;
        let mock_server = create_mock_server("/v8/finance/chart/INVALID", 200, mock_response).await;

        let provider = YahooFinanceProvider::new(&mock_server.uri(), Arc::new(Cache::new()));
        let result = provider.fetch_price("INVALID").await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "No price data found for symbol: INVALID"
        );
    }

    #[tokio::test]
    async fn test_price_http_error() {
        let mock_server = create_mock_server("/v8/finance/chart/GONE", 404, "").await;

        let provider = YahooFinanceProvider::new(&mock_server.uri(), Arc::new(Cache::new()));
        let result = provider.fetch_price("GONE").await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "HTTP error: 404 Not Found for symbol: GONE"
        );
    }

    // Tests for YahooSectorProvider (SectorProvider)
    #[tokio::test]
    async fn test_successful_sector_fetch() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v10/finance/quoteSummary/CRWD"))
            .and(query_param("modules", "assetProfile"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{
                    "quoteSummary": {
                        "result": [{
                            "assetProfile": {
                                "sector": "Technology",
                                "industry": "Software - Infrastructure"
                            }
                        }],
                        "error": null
                    }
                }"#,
            ))
            .mount(&mock_server)
            .await;

        let provider = YahooSectorProvider::new(&mock_server.uri(), Arc::new(Cache::new()));
        let sector = provider.fetch_sector("CRWD").await.unwrap();
        assert_eq!(sector.as_deref(), Some("Technology"));
    }

    #[tokio::test]
    async fn test_repeated_sector_lookup_hits_cache() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v10/finance/quoteSummary/XOM"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"quoteSummary": {"result": [{"assetProfile": {"sector": "Energy"}}], "error": null}}"#,
            ))
            .expect(1)
            .mount(&mock_server)
            .await;

        let cache = Arc::new(Cache::new());
        let provider = YahooSectorProvider::new(&mock_server.uri(), Arc::clone(&cache));
        for _ in 0..2 {
            let sector = provider.fetch_sector("XOM").await.unwrap();
            assert_eq!(sector.as_deref(), Some("Energy"));
        }
        assert_eq!(cache.stats().hits, 1);
    }

    #[tokio::test]
    async fn test_failed_price_is_retried_on_next_call() {
        let mock_server = create_mock_server("/v8/finance/chart/GONE", 404, "").await;
        let cache = Arc::new(Cache::new());
        let provider = YahooFinanceProvider::new(&mock_server.uri(), Arc::clone(&cache));

        assert!(provider.fetch_price("GONE").await.is_err());
        assert!(provider.fetch_price("GONE").await.is_err());
        assert!(cache.is_empty().await);
        assert_eq!(mock_server.received_requests().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_sector_missing_from_profile() {
        let mock_response = r#"{"quoteSummary": {"result": [{"assetProfile": {}}], "error": null}}"#;
        let mock_server =
            create_mock_server("/v10/finance/quoteSummary/SPY", 200, mock_response).await;

        let provider = YahooSectorProvider::new(&mock_server.uri(), Arc::new(Cache::new()));
        assert_eq!(provider.fetch_sector("SPY").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_sector_not_found() {
        let mock_response = r#"{
            "quoteSummary": {
                "result": null,
                "error": {
                    "code": "Not Found",
                    "description": "Quote not found for symbol: NOPE"
                }
            }
        }"#;
        let mock_server =
            create_mock_server("/v10/finance/quoteSummary/NOPE", 404, mock_response).await;

        let provider = YahooSectorProvider::new(&mock_server.uri(), Arc::new(Cache::new()));
        let result = provider.fetch_sector("NOPE").await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "Sector lookup failed for NOPE: Quote not found for symbol: NOPE"
        );
    }

    #[tokio::test]
    async fn test_sector_server_error() {
        let mock_server =
            create_mock_server("/v10/finance/quoteSummary/AAPL", 500, "Internal Error").await;

        let provider = YahooSectorProvider::new(&mock_server.uri(), Arc::new(Cache::new()));
        let result = provider.fetch_sector("AAPL").await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "HTTP error: 500 Internal Server Error for symbol: AAPL"
        );
    }
}
