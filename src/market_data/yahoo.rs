// =============================================================================
// Yahoo Finance chart API client
// =============================================================================
//
// GET {base}/{symbol}?period1=<unix>&period2=<unix>&interval=1d
//
// The chart endpoint answers an unknown symbol with HTTP 404 and
// `chart.error.code == "Not Found"`; that case maps to an empty bar list so the
// caller can report "no data" instead of an upstream failure.
// =============================================================================

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Url;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::market_data::{ChartQuery, MarketDataProvider};
use crate::runtime_config::RuntimeConfig;
use crate::types::Bar;

/// The chart endpoint rejects requests without a browser-like agent.
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

const NOT_FOUND_CODE: &str = "Not Found";

// -----------------------------------------------------------------------------
// Response shape (only the fields we read)
// -----------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Option<Vec<i64>>,
    #[serde(default)]
    indicators: Option<ChartIndicators>,
}

#[derive(Debug, Default, Deserialize)]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<QuoteColumns>,
}

#[derive(Debug, Deserialize)]
struct QuoteColumns {
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

// -----------------------------------------------------------------------------
// Client
// -----------------------------------------------------------------------------

#[derive(Clone)]
pub struct YahooClient {
    base_url: Url,
    client: reqwest::Client,
}

impl YahooClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .with_context(|| format!("invalid chart API base url '{base_url}'"))?;

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .context("failed to build reqwest client")?;

        debug!(base_url = %base_url, "YahooClient initialised");

        Ok(Self { base_url, client })
    }

    pub fn from_config(config: &RuntimeConfig) -> Result<Self> {
        Self::new(
            &config.yahoo_base_url,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    /// `{base}/{symbol}` with the symbol percent-encoded as one path segment.
    fn chart_url(&self, symbol: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("chart API base url cannot take a path"))?
            .pop_if_empty()
            .push(symbol);
        Ok(url)
    }

    async fn get_chart(
        &self,
        symbol: &str,
        params: &[(&str, String)],
    ) -> Result<(reqwest::StatusCode, serde_json::Value)> {
        let url = self.chart_url(symbol)?;

        let resp = self
            .client
            .get(url)
            .query(params)
            .send()
            .await
            .with_context(|| format!("GET chart/{symbol} request failed"))?;

        let status = resp.status();
        let body: serde_json::Value = resp
            .json()
            .await
            .with_context(|| format!("failed to parse chart/{symbol} response"))?;

        Ok((status, body))
    }
}

#[async_trait]
impl MarketDataProvider for YahooClient {
    #[instrument(skip(self), name = "yahoo::daily_bars")]
    async fn daily_bars(&self, symbol: &str, lookback_days: u32) -> Result<Vec<Bar>> {
        let period2 = Utc::now().timestamp();
        let period1 = period2 - i64::from(lookback_days) * 86_400;
        let params = [
            ("period1", period1.to_string()),
            ("period2", period2.to_string()),
            ("interval", "1d".to_string()),
        ];

        let (status, body) = self.get_chart(symbol, &params).await?;

        let envelope: ChartEnvelope = serde_json::from_value(body.clone())
            .with_context(|| format!("unexpected chart payload for {symbol} (HTTP {status})"))?;

        if let Some(err) = &envelope.chart.error {
            if err.code == NOT_FOUND_CODE {
                debug!(symbol, description = %err.description, "symbol not found upstream");
                return Ok(Vec::new());
            }
            anyhow::bail!("chart API error [{}]: {}", err.code, err.description);
        }

        if !status.is_success() {
            anyhow::bail!("chart API returned {}: {}", status, body);
        }

        let bars = parse_daily_bars(envelope)?;
        debug!(symbol, count = bars.len(), "daily bars fetched");
        Ok(bars)
    }

    #[instrument(skip(self), name = "yahoo::raw_chart")]
    async fn raw_chart(&self, query: &ChartQuery) -> Result<serde_json::Value> {
        let params: Vec<(&str, String)> = [
            ("period1", &query.period1),
            ("period2", &query.period2),
            ("interval", &query.interval),
        ]
        .into_iter()
        .filter_map(|(k, v)| v.clone().map(|v| (k, v)))
        .collect();

        let (status, body) = self.get_chart(&query.ticker, &params).await?;
        if !status.is_success() {
            anyhow::bail!("Failed to fetch data for {} ({})", query.ticker, status);
        }
        Ok(body)
    }
}

impl std::fmt::Debug for YahooClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YahooClient")
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}

// -----------------------------------------------------------------------------
// Parsing
// -----------------------------------------------------------------------------

/// Turn a chart document into date-ordered bars.
///
/// - timestamps are shifted by `meta.gmtoffset` to get the exchange-local date
/// - rows without a finite close are skipped
/// - missing volumes become 0
/// - when two rows share a date, the later row wins
fn parse_daily_bars(envelope: ChartEnvelope) -> Result<Vec<Bar>> {
    let Some(result) = envelope.chart.result.and_then(|r| r.into_iter().next()) else {
        return Ok(Vec::new());
    };
    let Some(timestamps) = result.timestamp else {
        return Ok(Vec::new());
    };

    let quote = result
        .indicators
        .and_then(|i| i.quote.into_iter().next())
        .context("chart result has no quote columns")?;

    let mut bars = Vec::with_capacity(timestamps.len());
    let mut skipped = 0_usize;

    for (i, &ts) in timestamps.iter().enumerate() {
        let close = quote.close.get(i).copied().flatten();
        let Some(close) = close.filter(|c| c.is_finite()) else {
            skipped += 1;
            continue;
        };
        let Some(local) = DateTime::from_timestamp(ts + result.meta.gmtoffset, 0) else {
            skipped += 1;
            continue;
        };
        let volume = quote.volume.get(i).copied().flatten();
        bars.push(Bar::new(local.date_naive(), close, volume));
    }

    if skipped > 0 {
        warn!(skipped, "dropped chart rows without a usable close");
    }

    bars.sort_by_key(|b| b.date);
    let mut deduped: Vec<Bar> = Vec::with_capacity(bars.len());
    for bar in bars {
        match deduped.last_mut() {
            Some(last) if last.date == bar.date => *last = bar,
            _ => deduped.push(bar),
        }
    }

    Ok(deduped)
}
