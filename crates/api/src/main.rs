use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tvscreener_core::domain::dataset::{ColumnMajor, RecommendationRecord};
use tvscreener_core::error::TradingviewError;
use tvscreener_core::ingest::provider::TradingviewScanner;
use tvscreener_core::service::ScreenerService;
use tvscreener_core::time::cache_date::today;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = tvscreener_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let scanner = TradingviewScanner::from_settings(&settings)?;
    tracing::info!(
        url = scanner.url(),
        cache_dir = %settings.cache_dir.display(),
        "screener configured"
    );

    let service = ScreenerService::new(
        Arc::new(scanner),
        settings.screener_columns.clone(),
        settings.cache_dir.clone(),
    );

    let app = router(service);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn router(service: ScreenerService) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/recommendations", get(get_stock_recommendations))
        .route("/recommendations/records", get(get_recommendation_records))
        .route("/values", get(get_stock_values).post(post_stock_values))
        .with_state(service)
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> &'static str {
    "ok"
}

struct ApiError(TradingviewError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = self.0.message();
        sentry_anyhow::capture_anyhow(&anyhow::Error::new(self.0));
        (
            StatusCode::BAD_GATEWAY,
            Json(serde_json::json!({ "error": message })),
        )
            .into_response()
    }
}

impl From<TradingviewError> for ApiError {
    fn from(err: TradingviewError) -> Self {
        Self(err)
    }
}

async fn get_stock_recommendations(
    State(service): State<ScreenerService>,
) -> Result<String, ApiError> {
    Ok(service.get_stock_recommendations(today()).await?)
}

async fn get_recommendation_records(
    State(service): State<ScreenerService>,
) -> Result<Json<Vec<RecommendationRecord>>, ApiError> {
    Ok(Json(service.get_recommendations(today()).await?))
}

#[derive(Debug, Deserialize)]
struct ValuesQuery {
    tickers: String,
}

#[derive(Debug, Deserialize)]
struct ValuesRequest {
    tickers: Vec<String>,
}

async fn get_stock_values(
    State(service): State<ScreenerService>,
    Query(query): Query<ValuesQuery>,
) -> Result<Json<ColumnMajor>, ApiError> {
    let tickers = split_tickers(&query.tickers);
    Ok(Json(service.check_stock_values(today(), &tickers).await?))
}

async fn post_stock_values(
    State(service): State<ScreenerService>,
    Json(req): Json<ValuesRequest>,
) -> Result<Json<ColumnMajor>, ApiError> {
    Ok(Json(service.check_stock_values(today(), &req.tickers).await?))
}

fn split_tickers(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &tvscreener_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_comma_separated_tickers() {
        assert_eq!(split_tickers("AAPL, MSFT,,NVDA "), ["AAPL", "MSFT", "NVDA"]);
        assert!(split_tickers("").is_empty());
    }
}
