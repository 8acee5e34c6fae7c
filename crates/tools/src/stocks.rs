//! Latest-price stock quote tool.
//!
//! Two providers: Yahoo's chart API (default, no credential) and Alpha
//! Vantage's GLOBAL_QUOTE (needs an API key). A missing credential or an
//! unknown ticker is a soft failure phrased for the user; transport and
//! status failures are hard errors.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use switchboard_config::StocksConfig;
use switchboard_core::error::ToolError;
use switchboard_core::tool::{InputSchema, Tool, ToolInput};

const YAHOO_CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const ALPHA_VANTAGE_URL: &str = "https://www.alphavantage.co/query";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QuoteProvider {
    Yahoo,
    AlphaVantage,
}

pub struct StockPriceTool {
    client: reqwest::Client,
    provider: QuoteProvider,
    api_key: Option<String>,
}

impl StockPriceTool {
    pub fn new(config: &StocksConfig) -> Self {
        // Yahoo rejects requests without a user agent
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent(concat!("switchboard/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("Failed to create HTTP client");

        let provider = match config.provider.as_str() {
            "alphavantage" => QuoteProvider::AlphaVantage,
            _ => QuoteProvider::Yahoo,
        };

        Self {
            client,
            provider,
            api_key: config.alpha_vantage_api_key.clone(),
        }
    }

    fn hard_failure(reason: impl Into<String>) -> ToolError {
        ToolError::ExecutionFailed {
            tool_name: "get_stock_price".into(),
            reason: reason.into(),
        }
    }

    async fn yahoo_quote(&self, ticker: &str) -> Result<String, ToolError> {
        let url = format!("{YAHOO_CHART_URL}/{ticker}");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Self::hard_failure(format!("quote request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Self::hard_failure(format!(
                "quote API returned {}",
                response.status()
            )));
        }

        let payload: ChartResponse = response
            .json()
            .await
            .map_err(|e| Self::hard_failure(format!("bad quote payload: {e}")))?;

        let meta = payload
            .chart
            .result
            .unwrap_or_default()
            .into_iter()
            .next()
            .map(|r| r.meta);

        let Some(price) = meta.as_ref().and_then(|m| m.regular_market_price) else {
            return Ok(format!("No price found for {ticker}."));
        };

        match meta.and_then(|m| m.currency).filter(|c| !c.is_empty()) {
            Some(currency) => Ok(format!("{ticker} last price: {price} {currency}")),
            None => Ok(format!("{ticker} last price: {price}")),
        }
    }

    async fn alpha_vantage_quote(&self, ticker: &str) -> Result<String, ToolError> {
        let Some(api_key) = &self.api_key else {
            return Ok(
                "Alpha Vantage API key missing. Set ALPHA_VANTAGE_API_KEY or switch the stocks \
                 provider to yahoo."
                    .into(),
            );
        };

        let response = self
            .client
            .get(ALPHA_VANTAGE_URL)
            .query(&[
                ("function", "GLOBAL_QUOTE"),
                ("symbol", ticker),
                ("apikey", api_key),
            ])
            .send()
            .await
            .map_err(|e| Self::hard_failure(format!("quote request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Self::hard_failure(format!(
                "quote API returned {}",
                response.status()
            )));
        }

        let payload: GlobalQuoteResponse = response
            .json()
            .await
            .map_err(|e| Self::hard_failure(format!("bad quote payload: {e}")))?;

        match payload
            .quote
            .and_then(|q| q.price)
            .filter(|p| !p.trim().is_empty())
        {
            Some(price) => Ok(format!("{ticker} last price: {price}")),
            None => Ok(format!("No price found for {ticker}.")),
        }
    }
}

#[async_trait]
impl Tool for StockPriceTool {
    fn name(&self) -> &str {
        "get_stock_price"
    }

    fn description(&self) -> &str {
        "Get the latest stock price for a ticker."
    }

    fn input_schema(&self) -> InputSchema {
        InputSchema::from([(
            "ticker".to_string(),
            "stock symbol, e.g. AAPL".to_string(),
        )])
    }

    async fn run(&self, input: &ToolInput) -> Result<String, ToolError> {
        let ticker = input
            .get("ticker")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .trim()
            .to_uppercase();
        if ticker.is_empty() {
            return Ok("Please provide a ticker (e.g., AAPL).".into());
        }

        match self.provider {
            QuoteProvider::Yahoo => self.yahoo_quote(&ticker).await,
            QuoteProvider::AlphaVantage => self.alpha_vantage_quote(&ticker).await,
        }
    }
}

// --- Provider payloads ---

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    #[serde(rename = "regularMarketPrice")]
    regular_market_price: Option<f64>,
    currency: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GlobalQuoteResponse {
    #[serde(rename = "Global Quote")]
    quote: Option<GlobalQuote>,
}

#[derive(Debug, Deserialize)]
struct GlobalQuote {
    #[serde(rename = "05. price")]
    price: Option<String>,
}
