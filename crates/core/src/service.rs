use crate::domain::dataset::{ColumnMajor, Dataset, RecommendationRecord};
use crate::domain::schema::ColumnSchema;
use crate::error::{ScreenerError, TradingviewError};
use crate::ingest::provider::ScreenerSource;
use crate::storage::cache::{cache_path_for, load_or_build};
use chrono::NaiveDate;
use std::path::PathBuf;
use std::sync::Arc;

pub const RECOMMENDATIONS_PREAMBLE: &str = "The following recommendations are based on \
technical analysis, combining the ratings of multiple technical indicators (on a 1-day \
interval) to help traders and investors identify potential profitable trades more easily.";

/// The two callable operations, backed by the daily snapshot.
#[derive(Clone)]
pub struct ScreenerService {
    source: Arc<dyn ScreenerSource>,
    schema: ColumnSchema,
    cache_dir: PathBuf,
}

impl ScreenerService {
    pub fn new(source: Arc<dyn ScreenerSource>, schema: ColumnSchema, cache_dir: PathBuf) -> Self {
        Self {
            source,
            schema,
            cache_dir,
        }
    }

    pub fn cache_path(&self, as_of_date: NaiveDate) -> PathBuf {
        cache_path_for(&self.cache_dir, as_of_date)
    }

    pub async fn dataset(&self, as_of_date: NaiveDate) -> Result<Dataset, ScreenerError> {
        let path = self.cache_path(as_of_date);
        load_or_build(&path, self.source.as_ref(), &self.schema).await
    }

    pub async fn get_recommendations(
        &self,
        as_of_date: NaiveDate,
    ) -> Result<Vec<RecommendationRecord>, TradingviewError> {
        self.dataset(as_of_date)
            .await
            .and_then(|dataset| dataset.recommendations())
            .map_err(|err| surface("get_stock_recommendations", as_of_date, err))
    }

    /// Preamble sentence followed by the serialized `{name, recommendation}` list.
    pub async fn get_stock_recommendations(
        &self,
        as_of_date: NaiveDate,
    ) -> Result<String, TradingviewError> {
        let records = self.get_recommendations(as_of_date).await?;
        let listing = serde_json::to_string(&records).map_err(|err| {
            surface(
                "get_stock_recommendations",
                as_of_date,
                ScreenerError::MalformedPayload(err.to_string()),
            )
        })?;
        Ok(format!("{RECOMMENDATIONS_PREAMBLE}{listing}"))
    }

    pub async fn check_stock_values(
        &self,
        as_of_date: NaiveDate,
        tickers: &[String],
    ) -> Result<ColumnMajor, TradingviewError> {
        self.dataset(as_of_date)
            .await
            .and_then(|dataset| dataset.select_column_major(tickers))
            .map_err(|err| surface("check_stock_values", as_of_date, err))
    }
}

fn surface(operation: &'static str, as_of_date: NaiveDate, err: ScreenerError) -> TradingviewError {
    tracing::error!(operation, %as_of_date, error = %err, "screener operation failed");
    TradingviewError::from(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dataset::Cell;
    use crate::domain::recommendation::Recommendation;
    use crate::testing::{sample_payload, sample_schema, CountingSource};
    use serde_json::json;
    use std::error::Error as _;
    use std::fs;
    use tempfile::TempDir;

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    fn service(
        dir: &TempDir,
        response: Result<serde_json::Value, ScreenerError>,
    ) -> (ScreenerService, Arc<std::sync::atomic::AtomicUsize>) {
        let (source, calls) = CountingSource::new(response);
        let svc = ScreenerService::new(Arc::new(source), sample_schema(), dir.path().to_path_buf());
        (svc, calls)
    }

    #[tokio::test]
    async fn recommendations_share_one_daily_fetch() {
        let dir = TempDir::new().unwrap();
        let (svc, calls) = service(&dir, Ok(sample_payload()));

        let records = svc.get_recommendations(as_of()).await.unwrap();
        assert_eq!(
            records,
            vec![
                RecommendationRecord {
                    name: "MSFT".into(),
                    recommendation: Recommendation::StrongBuy
                },
                RecommendationRecord {
                    name: "TSLA".into(),
                    recommendation: Recommendation::Sell
                },
                RecommendationRecord {
                    name: "AAPL".into(),
                    recommendation: Recommendation::Buy
                },
            ]
        );

        let _ = svc
            .check_stock_values(as_of(), &["AAPL".to_string()])
            .await
            .unwrap();
        assert_eq!(CountingSource::calls(&calls), 1);
        assert!(svc.cache_path(as_of()).ends_with("2026-10-16.csv"));
    }

    #[tokio::test]
    async fn stock_recommendations_text_has_preamble_and_records() {
        let dir = TempDir::new().unwrap();
        let (svc, _) = service(&dir, Ok(sample_payload()));

        let text = svc.get_stock_recommendations(as_of()).await.unwrap();
        let listing = text.strip_prefix(RECOMMENDATIONS_PREAMBLE).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(listing).unwrap();
        assert_eq!(parsed[2], json!({"name": "AAPL", "recommendation": "buy"}));
    }

    #[tokio::test]
    async fn check_values_indexes_by_original_row() {
        let dir = TempDir::new().unwrap();
        let (svc, _) = service(&dir, Ok(sample_payload()));

        let out = svc
            .check_stock_values(as_of(), &["AAPL".to_string(), "ZZZZ".to_string()])
            .await
            .unwrap();
        assert_eq!(out.row_indices(), vec![2]);
        assert_eq!(
            out.column("name").unwrap().get(&2),
            Some(&Cell::Text("AAPL".into()))
        );
        assert_eq!(serde_json::to_value(&out).unwrap()["close"], json!({"2": 225.25}));
    }

    #[tokio::test]
    async fn failures_surface_as_tradingview_error() {
        let dir = TempDir::new().unwrap();
        let (svc, _) = service(
            &dir,
            Err(ScreenerError::ProviderUnavailable("timed out".into())),
        );

        let err = svc.get_stock_recommendations(as_of()).await.unwrap_err();
        assert_eq!(err.to_string(), "Unable to connect to Tradingview API server");
        assert!(err.source().is_some());

        let err = svc
            .check_stock_values(as_of(), &["AAPL".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err.cause(), ScreenerError::ProviderUnavailable(_)));
    }

    #[tokio::test]
    async fn stale_schema_on_disk_surfaces_at_column_lookup() {
        let dir = TempDir::new().unwrap();
        let (svc, calls) = service(&dir, Ok(sample_payload()));
        fs::write(svc.cache_path(as_of()), "ticker,close\nAAPL,1.5\n").unwrap();

        let err = svc.get_recommendations(as_of()).await.unwrap_err();
        assert!(matches!(err.cause(), ScreenerError::SchemaMismatch(_)));
        assert_eq!(CountingSource::calls(&calls), 0);
    }
}
