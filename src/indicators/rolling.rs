// =============================================================================
// Trailing-window aggregation and the safe ratio
// =============================================================================
//
// Every rolling statistic in the engine goes through `TrailingWindow`:
//
//   out[t] = aggregate(values[t + 1 - size ..= t])       (clamped at 0)
//
// Undefined inputs (`None`) are skipped.  A point is emitted once the window
// holds at least `min_periods` defined values, so with the default of 1 the
// series "ramps up" over the first `size - 1` points instead of being left
// undefined.
//
// Zero denominators never reach a division: `safe_ratio` floors them to
// `EPSILON_FLOOR`.
// =============================================================================

/// Positive stand-in for a zero denominator.
pub const EPSILON_FLOOR: f64 = f64::EPSILON;

/// `numerator / max(denominator, EPSILON_FLOOR)`.
///
/// Intended for non-negative denominators (sums of volumes, average losses).
/// A NaN denominator yields NaN instead of being silently floored.
pub fn safe_ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator.is_nan() {
        return f64::NAN;
    }
    numerator / denominator.max(EPSILON_FLOOR)
}

/// A trailing window of `size` points with a ramp-up threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrailingWindow {
    size: usize,
    min_periods: usize,
}

impl TrailingWindow {
    /// Window of `size` points that emits as soon as one defined value exists.
    pub fn new(size: usize) -> Self {
        Self {
            size,
            min_periods: 1,
        }
    }

    /// Rolling sum of the defined values in each window.
    pub fn sum(&self, values: &[Option<f64>]) -> Vec<Option<f64>> {
        self.aggregate(values, |sum, _| sum)
    }

    /// Rolling mean of the defined values in each window.
    pub fn mean(&self, values: &[Option<f64>]) -> Vec<Option<f64>> {
        self.aggregate(values, |sum, count| sum / count as f64)
    }

    /// Yield `(start, end)` bounds of the window ending at each index.
    pub fn bounds(&self, len: usize) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..len).map(move |t| ((t + 1).saturating_sub(self.size), t + 1))
    }

    /// Whether a window holding `count` defined values may emit.
    pub fn is_ready(&self, count: usize) -> bool {
        self.size > 0 && count >= self.min_periods
    }

    fn aggregate(&self, values: &[Option<f64>], finish: impl Fn(f64, usize) -> f64) -> Vec<Option<f64>> {
        if self.size == 0 {
            return vec![None; values.len()];
        }

        // Summed per window, not incrementally: a flat stretch must sum to
        // exactly 0.0 for the epsilon floor to engage.
        self.bounds(values.len())
            .map(|(start, end)| {
                let (sum, count) = values[start..end]
                    .iter()
                    .flatten()
                    .fold((0.0_f64, 0_usize), |(s, c), &v| (s + v, c + 1));
                self.is_ready(count).then(|| finish(sum, count))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Option<f64>, b: f64) -> bool {
        matches!(a, Some(v) if (v - b).abs() < 1e-10)
    }

    #[test]
    fn safe_ratio_regular_division() {
        assert!((safe_ratio(3.0, 2.0) - 1.5).abs() < 1e-12);
    }

    #[test]
    fn safe_ratio_floors_zero_denominator() {
        let r = safe_ratio(1.0, 0.0);
        assert!(r.is_finite());
        assert!((r - 1.0 / f64::EPSILON).abs() < 1.0);
        assert_eq!(safe_ratio(0.0, 0.0), 0.0);
    }

    #[test]
    fn safe_ratio_nan_denominator_stays_nan() {
        assert!(safe_ratio(1.0, f64::NAN).is_nan());
    }

    #[test]
    fn mean_ramps_up_before_window_is_full() {
        let values = [Some(2.0), Some(4.0), Some(6.0), Some(8.0)];
        let out = TrailingWindow::new(3).mean(&values);
        assert!(approx(out[0], 2.0));
        assert!(approx(out[1], 3.0));
        assert!(approx(out[2], 4.0));
        assert!(approx(out[3], 6.0));
    }

    #[test]
    fn undefined_values_are_skipped() {
        let values = [None, Some(1.0), Some(0.0), Some(3.0)];
        let out = TrailingWindow::new(2).mean(&values);
        assert_eq!(out[0], None);
        assert!(approx(out[1], 1.0));
        assert!(approx(out[2], 0.5));
        assert!(approx(out[3], 1.5));
    }

    #[test]
    fn sum_over_trailing_window() {
        let values = [Some(100.0), Some(100.0), Some(0.0), Some(50.0), Some(200.0)];
        let out = TrailingWindow::new(2).sum(&values);
        let expected = [100.0, 200.0, 100.0, 50.0, 250.0];
        for (o, e) in out.iter().zip(expected) {
            assert!(approx(*o, e), "got {o:?}, expected {e}");
        }
    }

    #[test]
    fn zero_size_window_is_all_undefined() {
        let out = TrailingWindow::new(0).sum(&[Some(1.0), Some(2.0)]);
        assert_eq!(out, vec![None, None]);
    }

    #[test]
    fn window_longer_than_input_uses_everything() {
        let out = TrailingWindow::new(1_000).mean(&[Some(1.0), Some(3.0)]);
        assert!(approx(out[1], 2.0));
    }
}
