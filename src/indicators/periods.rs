// =============================================================================
// RSI period list parsing
// =============================================================================
//
// The period field arrives as free text ("14, 28, 50").  Every token must be an
// integer: one unparsable token rejects the whole list.  Non-positive values
// are dropped, order is preserved, duplicates are kept, and only the first
// `MAX_PERIODS` survivors are used.
// =============================================================================

/// Maximum number of periods computed per request.
pub const MAX_PERIODS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeriodError {
    /// A token was not an integer. Holds the trimmed token.
    InvalidToken(String),
    /// Parsing succeeded but nothing positive was left.
    NoPositivePeriods,
}

impl std::fmt::Display for PeriodError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidToken(token) => {
                write!(f, "invalid period '{token}': expected a comma-separated list of integers")
            }
            Self::NoPositivePeriods => write!(f, "no positive periods supplied."),
        }
    }
}

impl std::error::Error for PeriodError {}

/// Parse a comma-separated period list into at most [`MAX_PERIODS`] positive
/// window lengths.
pub fn parse_periods(raw: &str) -> Result<Vec<usize>, PeriodError> {
    let parsed = raw
        .split(',')
        .map(|token| {
            let token = token.trim();
            token
                .parse::<i64>()
                .map_err(|_| PeriodError::InvalidToken(token.to_string()))
        })
        .collect::<Result<Vec<i64>, _>>()?;

    let periods: Vec<usize> = parsed
        .into_iter()
        .filter(|&p| p > 0)
        .filter_map(|p| usize::try_from(p).ok())
        .take(MAX_PERIODS)
        .collect();

    if periods.is_empty() {
        return Err(PeriodError::NoPositivePeriods);
    }
    Ok(periods)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_trims() {
        assert_eq!(parse_periods(" 14 ,28,  50"), Ok(vec![14, 28, 50]));
    }

    #[test]
    fn keeps_first_three_in_order() {
        assert_eq!(parse_periods("9,3,27,81,2"), Ok(vec![9, 3, 27]));
    }

    #[test]
    fn drops_non_positive_before_capping() {
        assert_eq!(parse_periods("0,-5,7,0,8,9,10"), Ok(vec![7, 8, 9]));
    }

    #[test]
    fn duplicates_are_kept() {
        assert_eq!(parse_periods("14,14"), Ok(vec![14, 14]));
    }

    #[test]
    fn bad_token_rejects_everything() {
        assert_eq!(
            parse_periods("0,-1,abc"),
            Err(PeriodError::InvalidToken("abc".to_string()))
        );
        // Even when it sits past the cap.
        assert!(parse_periods("1,2,3,4,x").is_err());
        assert!(parse_periods("14.5").is_err());
    }

    #[test]
    fn empty_input_is_a_bad_token() {
        assert_eq!(parse_periods(""), Err(PeriodError::InvalidToken(String::new())));
        assert!(parse_periods("14,").is_err());
    }

    #[test]
    fn nothing_positive_is_an_error() {
        let err = parse_periods("0,-1").unwrap_err();
        assert_eq!(err, PeriodError::NoPositivePeriods);
        assert_eq!(err.to_string(), "no positive periods supplied.");
    }

    #[test]
    fn explicit_plus_sign_is_accepted() {
        assert_eq!(parse_periods("+14"), Ok(vec![14]));
    }
}
