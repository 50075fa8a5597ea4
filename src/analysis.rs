// =============================================================================
// Chart request pipeline
// =============================================================================
//
// periods -> bars -> series -> indicator table -> chart description
//
// Periods are validated before any upstream call.  Every failure becomes a
// `ChartError` with a single descriptive message; the HTTP layer turns it into
// a 400 response.
// =============================================================================

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use tracing::{debug, info};

use crate::chart::{build_chart, ChartSpec};
use crate::indicators::{parse_periods, IndicatorEngine, PeriodError};
use crate::market_data::MarketDataProvider;
use crate::runtime_config::RuntimeConfig;
use crate::types::Series;

#[derive(Debug)]
pub enum ChartError {
    InvalidPeriods(PeriodError),
    MissingSymbol,
    NoData { symbol: String },
    Upstream(String),
    Computation(String),
}

impl std::fmt::Display for ChartError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidPeriods(e) => write!(f, "{e}"),
            Self::MissingSymbol => write!(f, "a ticker symbol is required"),
            Self::NoData { symbol } => write!(f, "No data available for {symbol}"),
            Self::Upstream(msg) => write!(f, "market data unavailable: {msg}"),
            Self::Computation(msg) => write!(f, "Error: {msg}"),
        }
    }
}

impl std::error::Error for ChartError {}

impl From<PeriodError> for ChartError {
    fn from(e: PeriodError) -> Self {
        Self::InvalidPeriods(e)
    }
}

impl IntoResponse for ChartError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.to_string() });
        (StatusCode::BAD_REQUEST, Json(body)).into_response()
    }
}

/// Run the full pipeline for one ticker and raw period string.
pub async fn generate_chart(
    provider: &dyn MarketDataProvider,
    config: &RuntimeConfig,
    symbol: &str,
    raw_periods: &str,
) -> Result<ChartSpec, ChartError> {
    let periods = parse_periods(raw_periods)?;

    let symbol = symbol.trim().to_uppercase();
    if symbol.is_empty() {
        return Err(ChartError::MissingSymbol);
    }

    let bars = provider
        .daily_bars(&symbol, config.lookback_days)
        .await
        .map_err(|e| ChartError::Upstream(format!("{e:#}")))?;

    if bars.is_empty() {
        return Err(ChartError::NoData { symbol });
    }
    debug!(symbol = %symbol, count = bars.len(), "bars received");

    let series = Series::try_new(bars).map_err(|e| ChartError::Computation(e.to_string()))?;

    let table = IndicatorEngine::compute(&series, &periods);
    if !table.has_defined_values() {
        return Err(ChartError::Computation(format!(
            "not enough data for {symbol} to compute RSI ({} bar(s))",
            series.len()
        )));
    }

    info!(
        symbol = %symbol,
        periods = ?table.periods(),
        columns = ?table.column_names(),
        bars = series.len(),
        "chart generated"
    );
    Ok(build_chart(&symbol, &series, &table, config, Utc::now()))
}
