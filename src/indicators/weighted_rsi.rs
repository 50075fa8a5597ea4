// =============================================================================
// Volume-Weighted RSI and the multi-period indicator engine
// =============================================================================
//
// For a period P the weighted RSI is the volume-weighted average of the RSI
// values in the trailing window of P bars:
//
//   numerator[t]    = rolling_sum_P(RSI[t'] * volume[t'])
//   denominator[t]  = rolling_sum_P(volume[t'])
//   WeightedRSI[t]  = numerator[t] / max(denominator[t], EPSILON_FLOOR)
//
// Both sums use the same ramp-up window as the RSI averages.  An undefined
// RSI drops out of the numerator but its volume still counts in the
// denominator.  A window whose volumes are all zero yields 0.
//
// `IndicatorEngine::compute` runs RSI + weighted RSI once per requested period
// and collects the results into an `IndicatorTable` that shares the series'
// date index.
// =============================================================================

use chrono::NaiveDate;
use serde::Serialize;

use crate::indicators::rolling::{safe_ratio, TrailingWindow};
use crate::indicators::rsi::calculate_rsi;
use crate::types::Series;

/// Volume-weighted average of `rsi` over a trailing window of `period` bars.
///
/// `rsi` and `volumes` must be aligned; extra entries in the longer slice are
/// ignored.
pub fn calculate_weighted_rsi(rsi: &[Option<f64>], volumes: &[f64], period: usize) -> Vec<Option<f64>> {
    let len = rsi.len().min(volumes.len());
    let window = TrailingWindow::new(period);

    let weighted: Vec<Option<f64>> = rsi[..len]
        .iter()
        .zip(&volumes[..len])
        .map(|(r, v)| r.map(|r| r * v))
        .collect();
    let weights: Vec<Option<f64>> = volumes[..len].iter().copied().map(Some).collect();

    let numerators = window.sum(&weighted);
    let denominators = window.sum(&weights);

    numerators
        .into_iter()
        .zip(denominators)
        .map(|(n, d)| {
            let value = safe_ratio(n?, d?);
            value.is_finite().then_some(value)
        })
        .collect()
}

// =============================================================================
// IndicatorTable
// =============================================================================

/// RSI and weighted RSI for one requested period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodColumns {
    pub period: usize,
    pub rsi: Vec<Option<f64>>,
    pub weighted_rsi: Vec<Option<f64>>,
}

impl PeriodColumns {
    pub fn rsi_name(&self) -> String {
        format!("RSI_{}", self.period)
    }

    pub fn weighted_rsi_name(&self) -> String {
        format!("Weighted_RSI_{}", self.period)
    }
}

/// Per-period indicator columns aligned to a series' date index.
///
/// Columns keep the order in which periods were requested; a period requested
/// twice appears twice.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorTable {
    pub index: Vec<NaiveDate>,
    pub columns: Vec<PeriodColumns>,
}

impl IndicatorTable {
    pub fn periods(&self) -> Vec<usize> {
        self.columns.iter().map(|c| c.period).collect()
    }

    /// First column set computed for `period`.
    pub fn column(&self, period: usize) -> Option<&PeriodColumns> {
        self.columns.iter().find(|c| c.period == period)
    }

    /// Column names in output order: `RSI_P`, `Weighted_RSI_P` per period.
    pub fn column_names(&self) -> Vec<String> {
        self.columns
            .iter()
            .flat_map(|c| [c.rsi_name(), c.weighted_rsi_name()])
            .collect()
    }

    /// Whether any column holds at least one defined value.
    pub fn has_defined_values(&self) -> bool {
        self.columns
            .iter()
            .any(|c| c.rsi.iter().chain(&c.weighted_rsi).any(Option::is_some))
    }
}

// =============================================================================
// IndicatorEngine
// =============================================================================

/// Stateless transform from (series, periods) to an [`IndicatorTable`].
pub struct IndicatorEngine;

impl IndicatorEngine {
    pub fn compute(series: &Series, periods: &[usize]) -> IndicatorTable {
        let closes = series.closes();
        let volumes = series.volumes();

        IndicatorTable {
            index: series.dates(),
            columns: periods
                .iter()
                .map(|&period| Self::compute_period(&closes, &volumes, period))
                .collect(),
        }
    }

    /// One period's columns from raw aligned slices.
    pub fn compute_period(closes: &[f64], volumes: &[f64], period: usize) -> PeriodColumns {
        let rsi = calculate_rsi(closes, period);
        let weighted_rsi = calculate_weighted_rsi(&rsi, volumes, period);
        PeriodColumns {
            period,
            rsi,
            weighted_rsi,
        }
    }
}
