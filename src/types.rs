// =============================================================================
// Shared types used across the volume-weighted RSI service
// =============================================================================
//
// `Bar` and `Series` are read-only inputs built by the market-data layer.
// `Series::try_new` is the single place where the ordering and finiteness
// invariants are checked; every windowed computation downstream relies on the
// bar order alone for temporal adjacency.
// =============================================================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One daily row of the input series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub close: f64,
    /// Always finite and >= 0. Missing or invalid volumes are stored as 0.
    pub volume: f64,
}

impl Bar {
    /// Build a bar, coercing a missing, non-finite or negative volume to 0.
    pub fn new(date: NaiveDate, close: f64, volume: Option<f64>) -> Self {
        Self {
            date,
            close,
            volume: coerce_volume(volume),
        }
    }
}

/// Volume coercion rule shared by every data source.
pub fn coerce_volume(volume: Option<f64>) -> f64 {
    match volume {
        Some(v) if v.is_finite() && v >= 0.0 => v,
        _ => 0.0,
    }
}

// =============================================================================
// Series
// =============================================================================

/// Why a list of bars could not become a [`Series`].
#[derive(Debug, Clone, PartialEq)]
pub enum SeriesError {
    Empty,
    NonFiniteClose { date: NaiveDate },
    OutOfOrder { previous: NaiveDate, next: NaiveDate },
}

impl std::fmt::Display for SeriesError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "series contains no bars"),
            Self::NonFiniteClose { date } => {
                write!(f, "close price on {date} is not a finite number")
            }
            Self::OutOfOrder { previous, next } => write!(
                f,
                "bar dated {next} does not follow {previous} (timestamps must be strictly increasing)"
            ),
        }
    }
}

impl std::error::Error for SeriesError {}

/// A non-empty, strictly date-ordered sequence of bars with finite closes.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    bars: Vec<Bar>,
}

impl Series {
    pub fn try_new(bars: Vec<Bar>) -> Result<Self, SeriesError> {
        if bars.is_empty() {
            return Err(SeriesError::Empty);
        }

        for bar in &bars {
            if !bar.close.is_finite() {
                return Err(SeriesError::NonFiniteClose { date: bar.date });
            }
        }

        for pair in bars.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(SeriesError::OutOfOrder {
                    previous: pair[0].date,
                    next: pair[1].date,
                });
            }
        }

        Ok(Self { bars })
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.bars.iter().map(|b| b.date).collect()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.volume).collect()
    }
}
