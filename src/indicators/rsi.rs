// =============================================================================
// Relative Strength Index (RSI): simple-moving-average form with ramp-up
// =============================================================================
//
// Step 1: Price deltas from consecutive closes.  delta[0] is undefined.
// Step 2: gain = max(delta, 0), loss = max(-delta, 0).
// Step 3: avg_gain / avg_loss = trailing SMA over `period` points, ramping up
//          over the defined points available at the start of the series.
// Step 4: RS  = avg_gain / max(avg_loss, EPSILON_FLOOR)
//          RSI = 100 - 100 / (1 + RS)
//
// The output is aligned 1:1 with the input closes.  Undefined points are
// `None`, never NaN.
//
// Thresholds:  RSI >= 70 => OVERBOUGHT,  RSI <= 30 => OVERSOLD.
// =============================================================================

use serde::Serialize;

use crate::indicators::rolling::{safe_ratio, TrailingWindow};

/// Compute the full RSI series for `closes` over a trailing `period`.
///
/// # Edge cases
/// - `period == 0` => every point is `None`
/// - index 0 is always `None` (no prior close)
/// - no loss in-window => RS hits the epsilon floor and RSI is ~100
/// - no movement at all in-window => RS is 0 and RSI is 0
/// - a non-finite close makes the deltas touching it undefined; the windows
///   around it average whatever defined points remain
pub fn calculate_rsi(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; closes.len()];
    }

    let (gains, losses) = split_gains_losses(&price_deltas(closes));

    let window = TrailingWindow::new(period);
    let avg_gains = window.mean(&gains);
    let avg_losses = window.mean(&losses);

    avg_gains
        .into_iter()
        .zip(avg_losses)
        .map(|(g, l)| rsi_from_averages(g?, l?))
        .collect()
}

/// `delta[t] = close[t] - close[t-1]`; `None` at index 0 and wherever the
/// difference is not finite.
pub fn price_deltas(closes: &[f64]) -> Vec<Option<f64>> {
    let mut deltas = Vec::with_capacity(closes.len());
    if closes.is_empty() {
        return deltas;
    }

    deltas.push(None);
    deltas.extend(closes.windows(2).map(|w| {
        let d = w[1] - w[0];
        d.is_finite().then_some(d)
    }));
    deltas
}

/// Split deltas into non-negative gain and loss series.
pub fn split_gains_losses(deltas: &[Option<f64>]) -> (Vec<Option<f64>>, Vec<Option<f64>>) {
    deltas
        .iter()
        .map(|d| match *d {
            Some(d) => (Some(d.max(0.0)), Some((-d).max(0.0))),
            None => (None, None),
        })
        .unzip()
}

// =============================================================================
// Zone classification
// =============================================================================

/// Where an RSI reading sits relative to the overbought/oversold lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RsiZone {
    Overbought,
    Neutral,
    Oversold,
}

impl RsiZone {
    pub fn classify(value: f64, overbought: f64, oversold: f64) -> Self {
        if value >= overbought {
            Self::Overbought
        } else if value <= oversold {
            Self::Oversold
        } else {
            Self::Neutral
        }
    }
}

impl std::fmt::Display for RsiZone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Overbought => write!(f, "OVERBOUGHT"),
            Self::Neutral => write!(f, "NEUTRAL"),
            Self::Oversold => write!(f, "OVERSOLD"),
        }
    }
}

/// Most recent defined value of an indicator series.
pub fn latest_defined(series: &[Option<f64>]) -> Option<f64> {
    series.iter().rev().find_map(|v| *v)
}

// =============================================================================
// Internal helpers
// =============================================================================

/// Convert average gain / average loss into an RSI value in [0, 100].
///
/// Returns `None` when either average is non-finite.
fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> Option<f64> {
    if !avg_gain.is_finite() || !avg_loss.is_finite() {
        return None;
    }

    let rs = safe_ratio(avg_gain, avg_loss);
    let rsi = 100.0 - 100.0 / (1.0 + rs);

    rsi.is_finite().then_some(rsi)
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn defined(series: &[Option<f64>]) -> Vec<f64> {
        series.iter().flatten().copied().collect()
    }

    // ---- deltas ----------------------------------------------------------

    #[test]
    fn deltas_and_split_match_worked_example() {
        let deltas = price_deltas(&[10.0, 11.0, 9.0, 9.0, 12.0]);
        assert_eq!(deltas, vec![None, Some(1.0), Some(-2.0), Some(0.0), Some(3.0)]);

        let (gains, losses) = split_gains_losses(&deltas);
        assert_eq!(gains, vec![None, Some(1.0), Some(0.0), Some(0.0), Some(3.0)]);
        assert_eq!(losses, vec![None, Some(0.0), Some(2.0), Some(0.0), Some(0.0)]);
    }

    #[test]
    fn deltas_of_empty_input() {
        assert!(price_deltas(&[]).is_empty());
    }

    // ---- calculate_rsi ---------------------------------------------------

    #[test]
    fn rsi_empty_input() {
        assert!(calculate_rsi(&[], 14).is_empty());
    }

    #[test]
    fn rsi_period_zero_is_all_undefined() {
        assert_eq!(calculate_rsi(&[1.0, 2.0, 3.0], 0), vec![None, None, None]);
    }

    #[test]
    fn rsi_single_bar_is_undefined() {
        assert_eq!(calculate_rsi(&[42.0], 14), vec![None]);
    }

    #[test]
    fn rsi_worked_example() {
        let rsi = calculate_rsi(&[10.0, 11.0, 9.0, 9.0, 12.0], 2);
        assert_eq!(rsi.len(), 5);
        assert_eq!(rsi[0], None);
        // avg_gain 1, avg_loss 0 => floor => ~100
        assert!((rsi[1].unwrap() - 100.0).abs() < 1e-10);
        // RS = 0.5 / 1
        assert!((rsi[2].unwrap() - (100.0 - 100.0 / 1.5)).abs() < 1e-10);
        // avg_gain 0, avg_loss 1
        assert!(rsi[3].unwrap().abs() < 1e-10);
        // avg_gain 1.5, avg_loss 0 => floor => ~100
        assert!((rsi[4].unwrap() - 100.0).abs() < 1e-10);
    }

    #[test]
    fn rsi_defined_during_ramp_up() {
        let closes: Vec<f64> = (1..=5).map(|x| x as f64).collect();
        let rsi = calculate_rsi(&closes, 14);
        assert!(rsi[1..].iter().all(Option::is_some));
    }

    #[test]
    fn rsi_all_gains() {
        let closes: Vec<f64> = (1..=30).map(|x| x as f64).collect();
        let series = calculate_rsi(&closes, 14);
        assert_eq!(defined(&series).len(), 29);
        for v in defined(&series) {
            assert!((v - 100.0).abs() < 1e-10, "expected 100.0, got {v}");
        }
    }

    #[test]
    fn rsi_all_losses() {
        let closes: Vec<f64> = (1..=30).rev().map(|x| x as f64).collect();
        let series = calculate_rsi(&closes, 14);
        assert_eq!(defined(&series).len(), 29);
        for v in defined(&series) {
            assert!(v.abs() < 1e-10, "expected 0.0, got {v}");
        }
    }

    #[test]
    fn rsi_flat_market_is_zero() {
        // No gain and no loss: RS = 0 / floor = 0.
        let series = calculate_rsi(&[100.0; 10], 3);
        for v in defined(&series) {
            assert!(v.abs() < 1e-10, "expected 0.0, got {v}");
        }
    }

    #[test]
    fn rsi_range_check() {
        let closes = vec![
            44.34, 44.09, 44.15, 43.61, 44.33, 44.83, 45.10, 45.42, 45.84, 46.08,
            45.89, 46.03, 44.18, 44.22, 44.57, 43.42, 42.66, 43.13,
        ];
        for period in [1, 2, 5, 14, 50] {
            for v in defined(&calculate_rsi(&closes, period)) {
                assert!((0.0..=100.0).contains(&v), "RSI {v} out of range");
            }
        }
    }

    #[test]
    fn rsi_nan_close_is_local() {
        let closes = [1.0, 2.0, f64::NAN, 4.0, 5.0, 6.0];
        let rsi = calculate_rsi(&closes, 1);
        // Both deltas touching the NaN are undefined.
        assert_eq!(rsi[2], None);
        assert_eq!(rsi[3], None);
        assert!(rsi[4].is_some());
        assert!(rsi[1].is_some());
    }

    #[test]
    fn rsi_all_nan_is_all_undefined() {
        let rsi = calculate_rsi(&[f64::NAN; 4], 2);
        assert!(rsi.iter().all(Option::is_none));
    }

    // ---- zones -----------------------------------------------------------

    #[test]
    fn zone_classification() {
        assert_eq!(RsiZone::classify(85.0, 70.0, 30.0), RsiZone::Overbought);
        assert_eq!(RsiZone::classify(70.0, 70.0, 30.0), RsiZone::Overbought);
        assert_eq!(RsiZone::classify(50.0, 70.0, 30.0), RsiZone::Neutral);
        assert_eq!(RsiZone::classify(30.0, 70.0, 30.0), RsiZone::Oversold);
        assert_eq!(RsiZone::Oversold.to_string(), "OVERSOLD");
    }

    #[test]
    fn latest_defined_skips_trailing_gaps() {
        assert_eq!(latest_defined(&[Some(1.0), Some(2.0), None]), Some(2.0));
        assert_eq!(latest_defined(&[None, None]), None);
    }
}
