pub mod yahoo;

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;

use crate::types::Bar;

pub use yahoo::YahooClient;

/// Pass-through query for the raw chart endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ChartQuery {
    #[serde(default)]
    pub ticker: String,
    pub period1: Option<String>,
    pub period2: Option<String>,
    pub interval: Option<String>,
}

/// Source of historical bars for the indicator pipeline.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Daily bars for `symbol` covering the last `lookback_days` calendar days,
    /// oldest first. An unknown symbol yields an empty vector, not an error.
    async fn daily_bars(&self, symbol: &str, lookback_days: u32) -> Result<Vec<Bar>>;

    /// Raw upstream chart document for `query`, returned unchanged.
    async fn raw_chart(&self, query: &ChartQuery) -> Result<serde_json::Value>;
}
