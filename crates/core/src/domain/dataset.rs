use crate::domain::recommendation::Recommendation;
use crate::domain::schema::{NAME_COLUMN, RECOMMENDATION_COLUMN};
use crate::error::ScreenerError;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// A single screener value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Cell {
    pub fn from_json(v: &Value) -> Self {
        match v {
            Value::Null => Cell::Null,
            Value::Bool(b) => Cell::Bool(*b),
            Value::Number(n) => n.as_f64().map(Cell::Number).unwrap_or(Cell::Null),
            Value::String(s) => Cell::Text(s.clone()),
            // Nested values are kept as compact JSON text.
            other => Cell::Text(other.to_string()),
        }
    }

    /// Inverse of the `Display` encoding used for cache files.
    pub fn parse_field(s: &str) -> Self {
        if s.is_empty() {
            return Cell::Null;
        }
        match s {
            "true" => return Cell::Bool(true),
            "false" => return Cell::Bool(false),
            _ => {}
        }
        match s.parse::<f64>() {
            Ok(v) if v.is_finite() => Cell::Number(v),
            _ => Cell::Text(s.to_string()),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => Ok(()),
            Cell::Bool(b) => write!(f, "{b}"),
            Cell::Number(v) => write!(f, "{v}"),
            Cell::Text(s) => f.write_str(s),
        }
    }
}

/// Row-ordered table. Row position is the implicit key; `name` is the lookup column.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Dataset {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Result<Self, ScreenerError> {
        if let Some((idx, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != columns.len())
        {
            return Err(ScreenerError::SchemaMismatch(format!(
                "row {idx} has {} values, expected {}",
                row.len(),
                columns.len()
            )));
        }
        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, column: &str) -> Result<usize, ScreenerError> {
        self.columns
            .iter()
            .position(|c| c == column)
            .ok_or_else(|| ScreenerError::SchemaMismatch(format!("missing column {column:?}")))
    }

    pub fn column(&self, column: &str) -> Result<impl Iterator<Item = &Cell> + '_, ScreenerError> {
        let idx = self.column_index(column)?;
        Ok(self.rows.iter().map(move |row| &row[idx]))
    }

    /// `{name, recommendation}` for every row, in row order.
    pub fn recommendations(&self) -> Result<Vec<RecommendationRecord>, ScreenerError> {
        let names = self.column(NAME_COLUMN)?;
        let labels = self.column(RECOMMENDATION_COLUMN)?;

        names
            .zip(labels)
            .map(|(name, label)| -> Result<RecommendationRecord, ScreenerError> {
                Ok(RecommendationRecord {
                    name: name.to_string(),
                    recommendation: label.to_string().parse()?,
                })
            })
            .collect()
    }

    /// Rows whose `name` is one of `tickers`, column-major, keyed by the
    /// row's position in the full dataset (indices are not renumbered).
    pub fn select_column_major(&self, tickers: &[String]) -> Result<ColumnMajor, ScreenerError> {
        let wanted: HashSet<&str> = tickers.iter().map(String::as_str).collect();
        let name_idx = self.column_index(NAME_COLUMN)?;

        let matched: Vec<usize> = self
            .rows
            .iter()
            .enumerate()
            .filter(|(_, row)| wanted.contains(row[name_idx].to_string().as_str()))
            .map(|(idx, _)| idx)
            .collect();

        let columns = self
            .columns
            .iter()
            .enumerate()
            .map(|(col_idx, col)| {
                let values = matched
                    .iter()
                    .map(|&row_idx| (row_idx, self.rows[row_idx][col_idx].clone()))
                    .collect();
                (col.clone(), values)
            })
            .collect();

        Ok(ColumnMajor { columns })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecommendationRecord {
    pub name: String,
    pub recommendation: Recommendation,
}

/// Column name -> (original row index -> value), columns in dataset order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ColumnMajor {
    columns: Vec<(String, BTreeMap<usize, Cell>)>,
}

impl ColumnMajor {
    pub fn column(&self, name: &str) -> Option<&BTreeMap<usize, Cell>> {
        self.columns
            .iter()
            .find(|(col, _)| col == name)
            .map(|(_, values)| values)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(col, _)| col.as_str())
    }

    pub fn row_indices(&self) -> Vec<usize> {
        self.columns
            .first()
            .map(|(_, values)| values.keys().copied().collect())
            .unwrap_or_default()
    }
}

impl Serialize for ColumnMajor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (col, values) in &self.columns {
            map.serialize_entry(col, values)?;
        }
        map.end()
    }
}
