use crate::domain::dataset::{Cell, Dataset};
use crate::domain::recommendation::classify_value;
use crate::domain::schema::{ColumnSchema, NAME_COLUMN, RECOMMENDATION_COLUMN, SCORE_COLUMN};
use crate::error::ScreenerError;
use serde_json::Value;

const DATA_KEY: &str = "data";
const VALUES_KEY: &str = "d";

/// Turns a scanner payload into a dataset with the derived `recommendation` column.
///
/// Entries without a non-empty `d` array are skipped. Every kept entry must match
/// the schema length, and every score must classify; otherwise the whole build fails.
pub fn build_dataset(payload: &Value, schema: &ColumnSchema) -> Result<Dataset, ScreenerError> {
    let entries = payload
        .get(DATA_KEY)
        .and_then(Value::as_array)
        .ok_or_else(|| {
            ScreenerError::MalformedPayload(format!("missing top-level {DATA_KEY:?} array"))
        })?;

    let score_idx = schema.position(SCORE_COLUMN).ok_or_else(|| {
        ScreenerError::SchemaMismatch(format!("schema is missing {SCORE_COLUMN:?}"))
    })?;
    let name_idx = schema.position(NAME_COLUMN).ok_or_else(|| {
        ScreenerError::SchemaMismatch(format!("schema is missing {NAME_COLUMN:?}"))
    })?;

    let mut rows = Vec::with_capacity(entries.len());
    let mut dropped: usize = 0;

    for (entry_idx, entry) in entries.iter().enumerate() {
        let Some(values) = entry
            .get(VALUES_KEY)
            .and_then(Value::as_array)
            .filter(|v| !v.is_empty())
        else {
            dropped += 1;
            continue;
        };

        if values.len() != schema.len() {
            return Err(ScreenerError::SchemaMismatch(format!(
                "entry {entry_idx} has {} values, schema has {} columns",
                values.len(),
                schema.len()
            )));
        }

        let mut row: Vec<Cell> = values.iter().map(Cell::from_json).collect();
        let label = classify_value(&values[score_idx]).map_err(|err| {
            ScreenerError::MalformedPayload(format!(
                "cannot classify {:?}: {err}",
                row[name_idx].to_string()
            ))
        })?;
        row.push(Cell::Text(label.to_string()));
        rows.push(row);
    }

    if dropped > 0 {
        tracing::warn!(dropped, kept = rows.len(), "skipped screener entries without values");
    }
    if rows.is_empty() {
        return Err(ScreenerError::EmptyDataset);
    }

    let mut columns = schema.columns().to_vec();
    columns.push(RECOMMENDATION_COLUMN.to_string());
    Dataset::new(columns, rows)
}
