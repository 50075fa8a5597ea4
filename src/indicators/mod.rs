// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free implementations of the RSI family used by the chart
// service.  Every series is aligned 1:1 with its input and marks points that
// cannot be computed as `None`, so callers never have to filter out NaN.

pub mod periods;
pub mod rolling;
pub mod rsi;
pub mod weighted_rsi;

pub use periods::{parse_periods, PeriodError};
pub use rsi::RsiZone;
pub use weighted_rsi::{IndicatorEngine, IndicatorTable, PeriodColumns};
