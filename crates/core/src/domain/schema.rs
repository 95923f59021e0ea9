use crate::error::ScreenerError;
use std::collections::BTreeSet;

pub const NAME_COLUMN: &str = "name";
pub const SCORE_COLUMN: &str = "Recommend.All";
pub const RECOMMENDATION_COLUMN: &str = "recommendation";

// Stock screener "overview" + "technicals" columns, in request order.
const DEFAULT_COLUMNS: &[&str] = &[
    "name",
    "description",
    "close",
    "change",
    "volume",
    "relative_volume_10d_calc",
    "market_cap_basic",
    "price_earnings_ttm",
    "earnings_per_share_diluted_ttm",
    "dividends_yield_current",
    "sector",
    "Recommend.All",
    "Recommend.MA",
    "Recommend.Other",
    "RSI",
    "Mom",
    "AO",
    "CCI20",
    "Stoch.K",
    "Stoch.D",
];

/// Ordered provider columns. The payload's value arrays follow this order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSchema {
    columns: Vec<String>,
}

impl ColumnSchema {
    pub fn new(columns: Vec<String>) -> Result<Self, ScreenerError> {
        let mut seen = BTreeSet::new();
        for col in &columns {
            if col.trim().is_empty() {
                return Err(ScreenerError::SchemaMismatch(
                    "column names must be non-empty".to_string(),
                ));
            }
            if !seen.insert(col.as_str()) {
                return Err(ScreenerError::SchemaMismatch(format!(
                    "duplicate column {col:?}"
                )));
            }
        }

        for required in [NAME_COLUMN, SCORE_COLUMN] {
            if !seen.contains(required) {
                return Err(ScreenerError::SchemaMismatch(format!(
                    "schema must contain {required:?}"
                )));
            }
        }
        if seen.contains(RECOMMENDATION_COLUMN) {
            return Err(ScreenerError::SchemaMismatch(format!(
                "{RECOMMENDATION_COLUMN:?} is derived and cannot be requested"
            )));
        }

        Ok(Self { columns })
    }

    /// Parses a comma-separated list, ignoring blank entries.
    pub fn parse_list(s: &str) -> Result<Self, ScreenerError> {
        let columns = s
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect();
        Self::new(columns)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn position(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }
}

impl Default for ColumnSchema {
    fn default() -> Self {
        Self {
            columns: DEFAULT_COLUMNS.iter().map(|c| c.to_string()).collect(),
        }
    }
}
