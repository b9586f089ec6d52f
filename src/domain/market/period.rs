use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Trailing look-back period for a daily history request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HistoryPeriod {
    OneMonth,
    ThreeMonths,
    SixMonths,
    #[default]
    OneYear,
    TwoYears,
    FiveYears,
    TenYears,
    YearToDate,
    Max,
}

impl HistoryPeriod {
    /// Converts to the Yahoo chart API `range` parameter
    pub fn to_yahoo_range(&self) -> &'static str {
        match self {
            HistoryPeriod::OneMonth => "1mo",
            HistoryPeriod::ThreeMonths => "3mo",
            HistoryPeriod::SixMonths => "6mo",
            HistoryPeriod::OneYear => "1y",
            HistoryPeriod::TwoYears => "2y",
            HistoryPeriod::FiveYears => "5y",
            HistoryPeriod::TenYears => "10y",
            HistoryPeriod::YearToDate => "ytd",
            HistoryPeriod::Max => "max",
        }
    }
}

impl FromStr for HistoryPeriod {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "1mo" => Ok(HistoryPeriod::OneMonth),
            "3mo" => Ok(HistoryPeriod::ThreeMonths),
            "6mo" => Ok(HistoryPeriod::SixMonths),
            "1y" => Ok(HistoryPeriod::OneYear),
            "2y" => Ok(HistoryPeriod::TwoYears),
            "5y" => Ok(HistoryPeriod::FiveYears),
            "10y" => Ok(HistoryPeriod::TenYears),
            "ytd" => Ok(HistoryPeriod::YearToDate),
            "max" => Ok(HistoryPeriod::Max),
            _ => Err(anyhow!(
                "Invalid history period: {}. Must be one of 1mo, 3mo, 6mo, 1y, 2y, 5y, 10y, ytd, max",
                s
            )),
        }
    }
}

impl fmt::Display for HistoryPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_yahoo_range())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_parsing() {
        assert_eq!("1y".parse::<HistoryPeriod>().unwrap(), HistoryPeriod::OneYear);
        assert_eq!("YTD".parse::<HistoryPeriod>().unwrap(), HistoryPeriod::YearToDate);
        assert_eq!(" 6mo ".parse::<HistoryPeriod>().unwrap(), HistoryPeriod::SixMonths);
        assert!("1w".parse::<HistoryPeriod>().is_err());
    }

    #[test]
    fn test_period_display_round_trip() {
        for period in [
            HistoryPeriod::OneMonth,
            HistoryPeriod::OneYear,
            HistoryPeriod::TenYears,
            HistoryPeriod::Max,
        ] {
            let parsed: HistoryPeriod = period.to_string().parse().unwrap();
            assert_eq!(parsed, period);
        }
    }
}
