// =============================================================================
// Chart description: the hand-off to the renderer
// =============================================================================
//
// Three panels sharing one date axis:
//   1. close price with volume on a secondary axis
//   2. weighted RSI, one line per period
//   3. RSI, one line per period
// Both RSI panels carry dashed reference lines at the overbought (red) and
// oversold (green) thresholds.  A period keeps the same color in both panels.
// =============================================================================

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use serde::Serialize;

use crate::indicators::rsi::latest_defined;
use crate::indicators::{IndicatorTable, PeriodColumns, RsiZone};
use crate::runtime_config::RuntimeConfig;
use crate::types::Series;

#[derive(Debug, Clone, Serialize)]
pub struct ChartSpec {
    pub symbol: String,
    pub title: String,
    pub generated_at: String,
    pub x_label: &'static str,
    pub dates: Vec<NaiveDate>,
    pub price_panel: PricePanel,
    pub weighted_rsi_panel: IndicatorPanel,
    pub rsi_panel: IndicatorPanel,
}

#[derive(Debug, Clone, Serialize)]
pub struct PricePanel {
    pub price_label: &'static str,
    pub volume_label: &'static str,
    pub close: Vec<f64>,
    pub volume: Vec<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IndicatorPanel {
    pub y_label: &'static str,
    pub lines: Vec<ChartLine>,
    pub reference_lines: Vec<ReferenceLine>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChartLine {
    pub label: String,
    pub column: String,
    pub period: usize,
    pub color: String,
    pub values: Vec<Option<f64>>,
    pub latest: Option<LatestReading>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatestReading {
    pub value: f64,
    pub zone: RsiZone,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceLine {
    pub level: f64,
    pub color: &'static str,
    pub style: &'static str,
}

/// Assemble the chart description for one request.
pub fn build_chart(
    symbol: &str,
    series: &Series,
    table: &IndicatorTable,
    config: &RuntimeConfig,
    now: DateTime<Utc>,
) -> ChartSpec {
    let generated_at = format_generated_at(now, config.display_utc_offset_hours);
    let title = format!(
        "{symbol} - Price, Volume, RSI Analysis - Generated({} Time): {generated_at}",
        config.display_zone_label
    );

    let colors = viridis(table.columns.len());
    let reference_lines = vec![
        ReferenceLine {
            level: config.overbought,
            color: "red",
            style: "dashed",
        },
        ReferenceLine {
            level: config.oversold,
            color: "green",
            style: "dashed",
        },
    ];

    // Columns are looked up by period; a repeated period reuses its first column.
    let columns: Vec<(&PeriodColumns, &String)> = table
        .periods()
        .into_iter()
        .filter_map(|period| table.column(period))
        .zip(&colors)
        .collect();

    let weighted_lines = columns
        .iter()
        .map(|&(col, color)| {
            line(
                format!("Weighted RSI ({})", col.period),
                col.weighted_rsi_name(),
                col,
                color,
                &col.weighted_rsi,
                config,
            )
        })
        .collect();

    let rsi_lines = columns
        .iter()
        .map(|&(col, color)| {
            line(
                format!("RSI ({})", col.period),
                col.rsi_name(),
                col,
                color,
                &col.rsi,
                config,
            )
        })
        .collect();

    ChartSpec {
        symbol: symbol.to_string(),
        title,
        generated_at,
        x_label: "Date",
        dates: table.index.clone(),
        price_panel: PricePanel {
            price_label: "Close Price",
            volume_label: "Volume",
            close: series.closes(),
            volume: series.volumes(),
        },
        weighted_rsi_panel: IndicatorPanel {
            y_label: "Weighted RSI",
            lines: weighted_lines,
            reference_lines: reference_lines.clone(),
        },
        rsi_panel: IndicatorPanel {
            y_label: "RSI",
            lines: rsi_lines,
            reference_lines,
        },
    }
}

fn line(
    label: String,
    column: String,
    col: &PeriodColumns,
    color: &str,
    values: &[Option<f64>],
    config: &RuntimeConfig,
) -> ChartLine {
    let latest = latest_defined(values).map(|value| LatestReading {
        value,
        zone: RsiZone::classify(value, config.overbought, config.oversold),
    });
    ChartLine {
        label,
        column,
        period: col.period,
        color: color.to_string(),
        values: values.to_vec(),
        latest,
    }
}

/// `YYYY-MM-DD HH:MM:SS` at a fixed UTC offset (whole hours).
pub fn format_generated_at(now: DateTime<Utc>, offset_hours: i32) -> String {
    let offset = FixedOffset::east_opt(offset_hours * 3600).unwrap_or(Utc.fix());
    now.with_timezone(&offset)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

// =============================================================================
// Colors
// =============================================================================

/// Stops of matplotlib's viridis map at 0, 0.25, 0.5, 0.75 and 1.
const VIRIDIS_STOPS: [(u8, u8, u8); 5] = [
    (0x44, 0x01, 0x54),
    (0x3b, 0x52, 0x8b),
    (0x21, 0x91, 0x8c),
    (0x5e, 0xc9, 0x62),
    (0xfd, 0xe7, 0x25),
];

/// `n` hex colors sampled at `linspace(0, 1, n)` along viridis.
pub fn viridis(n: usize) -> Vec<String> {
    match n {
        0 => Vec::new(),
        1 => vec![viridis_at(0.0)],
        _ => (0..n)
            .map(|i| viridis_at(i as f64 / (n - 1) as f64))
            .collect(),
    }
}

fn viridis_at(x: f64) -> String {
    let scaled = x.clamp(0.0, 1.0) * (VIRIDIS_STOPS.len() - 1) as f64;
    let lo = (scaled.floor() as usize).min(VIRIDIS_STOPS.len() - 1);
    let hi = (lo + 1).min(VIRIDIS_STOPS.len() - 1);
    let frac = scaled - lo as f64;

    let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * frac).round() as u8;
    let (r0, g0, b0) = VIRIDIS_STOPS[lo];
    let (r1, g1, b1) = VIRIDIS_STOPS[hi];
    format!("#{:02x}{:02x}{:02x}", lerp(r0, r1), lerp(g0, g1), lerp(b0, b1))
}
