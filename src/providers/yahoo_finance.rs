use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::core::cache::Cache;
use crate::core::currency::CurrencyRateProvider;
use crate::core::price::{PriceProvider, Quote};
use crate::providers::util::{get_text, http_client};

// YahooQuoteProvider implementation for PriceProvider
pub struct YahooQuoteProvider {
    base_url: String,
    cache: Cache<Quote>,
}

impl YahooQuoteProvider {
    pub fn new(base_url: &str, cache: Cache<Quote>) -> Self {
        YahooQuoteProvider {
            base_url: base_url.to_string(),
            cache,
        }
    }
}

#[derive(Deserialize, Debug)]
struct YahooQuoteResponse {
    chart: QuoteChartResult,
}

#[derive(Deserialize, Debug)]
struct QuoteChartResult {
    result: Vec<QuoteChartItem>,
}

#[derive(Deserialize, Debug)]
struct QuoteChartItem {
    meta: QuoteChartMeta,
}

#[derive(Deserialize, Debug)]
struct QuoteChartMeta {
    #[serde(alias = "regularMarketPrice")]
    regular_market_price: f64,
    currency: String,
    #[serde(alias = "shortName")]
    short_name: Option<String>,
}

#[async_trait]
impl PriceProvider for YahooQuoteProvider {
    #[instrument(
        name = "YahooQuoteFetch",
        skip(self),
        fields(symbol = %symbol)
    )]
    async fn fetch_quote(&self, symbol: &str) -> Result<Quote> {
        if let Some(cached) = self.cache.get(symbol).await {
            return Ok(cached);
        }

        let url = format!(
            "{}/v8/finance/chart/{}?interval=1d&range=1d",
            self.base_url, symbol
        );
        debug!("Requesting quote from {}", url);

        let client = http_client()?;
        let text = get_text(&client, &url)
            .await
            .map_err(|e| anyhow!("Request error: {} for symbol: {}", e, symbol))?;

        let data: YahooQuoteResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse JSON response for {}: {}", symbol, e))?;
        let item = data
            .chart
            .result
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("No quote data found for symbol: {}", symbol))?;

        let quote = Quote {
            price: item.meta.regular_market_price,
            currency: item.meta.currency,
            short_name: item.meta.short_name,
        };

        self.cache.put(symbol, quote.clone()).await;

        Ok(quote)
    }
}

// YahooCurrencyProvider implementation for CurrencyRateProvider
pub struct YahooCurrencyProvider {
    base_url: String,
    cache: Cache<f64>,
}

impl YahooCurrencyProvider {
    pub fn new(base_url: &str, cache: Cache<f64>) -> Self {
        YahooCurrencyProvider {
            base_url: base_url.to_string(),
            cache,
        }
    }
}

#[derive(Debug, Deserialize)]
struct YahooCurrencyResponse {
    chart: CurrencyChartResult,
}

#[derive(Debug, Deserialize)]
struct CurrencyChartResult {
    result: Vec<CurrencyChartItem>,
}

#[derive(Debug, Deserialize)]
struct CurrencyChartItem {
    meta: CurrencyChartMeta,
}

#[derive(Debug, Deserialize)]
struct CurrencyChartMeta {
    #[serde(alias = "regularMarketPrice")]
    regular_market_price: f64,
}

#[async_trait]
impl CurrencyRateProvider for YahooCurrencyProvider {
    async fn get_rate(&self, from: &str, to: &str) -> Result<f64> {
        let symbol = format!("{from}{to}=X");
        if let Some(cached) = self.cache.get(&symbol).await {
            return Ok(cached);
        }

        let url = format!("{}/v8/finance/chart/{}", self.base_url, symbol);
        debug!("Requesting currency rate from {}", url);

        let client = http_client()?;
        let text = get_text(&client, &url)
            .await
            .map_err(|e| anyhow!("Request error: {} for currency pair: {}", e, symbol))?;

        let data: YahooCurrencyResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse JSON response for {}: {}", symbol, e))?;

        let item = data
            .chart
            .result
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("No rate data found for currency pair: {}", symbol))?;

        let rate = item.meta.regular_market_price;
        self.cache.put(&symbol, rate).await;
        Ok(rate)
    }
}
