use crate::config::Settings;
use crate::error::ScreenerError;
use crate::ingest::request::{scan_body, scan_headers, scan_url, SCAN_QUERY};
use anyhow::Context;
use serde_json::Value;
use std::time::Duration;

#[async_trait::async_trait]
pub trait ScreenerSource: Send + Sync {
    fn provider_name(&self) -> &'static str;

    /// One request, no retries. Returns the decoded JSON body.
    async fn fetch(&self) -> Result<Value, ScreenerError>;
}

#[derive(Debug, Clone)]
pub struct TradingviewScanner {
    http: reqwest::Client,
    url: String,
    body: Value,
}

impl TradingviewScanner {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.screener_timeout_secs))
            .default_headers(scan_headers())
            .build()
            .context("failed to build screener http client")?;

        Ok(Self {
            http,
            url: scan_url(&settings.screener_base_url, &settings.screener_market),
            body: scan_body(
                &settings.screener_columns,
                &settings.screener_market,
                settings.screener_limit,
            ),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait::async_trait]
impl ScreenerSource for TradingviewScanner {
    fn provider_name(&self) -> &'static str {
        "tradingview_scanner"
    }

    async fn fetch(&self) -> Result<Value, ScreenerError> {
        let res = self
            .http
            .post(&self.url)
            .query(&SCAN_QUERY)
            .body(self.body.to_string())
            .send()
            .await
            .map_err(|err| ScreenerError::ProviderUnavailable(format!("request failed: {err}")))?;

        let status = res.status();
        let text = res.text().await.map_err(|err| {
            ScreenerError::ProviderUnavailable(format!("failed to read response body: {err}"))
        })?;

        if !status.is_success() {
            return Err(ScreenerError::ProviderUnavailable(format!(
                "HTTP {status}: {}",
                truncate(&text, 200)
            )));
        }

        let payload = serde_json::from_str::<Value>(&text).map_err(|err| {
            ScreenerError::MalformedPayload(format!("response is not valid JSON: {err}"))
        })?;

        tracing::debug!(
            provider = self.provider_name(),
            url = %self.url,
            bytes = text.len(),
            "screener payload fetched"
        );
        Ok(payload)
    }
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::post, Router};

    /// Serves a fixed scan response on an ephemeral local port.
    async fn local_scanner(status: StatusCode, body: &'static str) -> TradingviewScanner {
        let app = Router::new().route("/america/scan", post(move || async move { (status, body) }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move { axum::serve(listener, app).await });

        let settings = Settings::from_vars(|key| match key {
            "SCREENER_BASE_URL" => Some(base_url.clone()),
            "SCREENER_TIMEOUT_SECS" => Some("5".to_string()),
            _ => None,
        })
        .unwrap();
        TradingviewScanner::from_settings(&settings).unwrap()
    }

    #[test]
    fn builds_from_default_settings() {
        let settings = Settings::from_vars(|_| None).unwrap();
        let scanner = TradingviewScanner::from_settings(&settings).unwrap();
        assert_eq!(scanner.url(), "https://scanner.tradingview.com/america/scan");
        assert_eq!(scanner.body["range"], serde_json::json!([0, 100]));
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 2), "hé");
        assert_eq!(truncate("abc", 10), "abc");
    }

    #[tokio::test]
    async fn unreachable_host_is_provider_unavailable() {
        let settings = Settings::from_vars(|key| match key {
            "SCREENER_BASE_URL" => Some("http://127.0.0.1:9".to_string()),
            "SCREENER_TIMEOUT_SECS" => Some("2".to_string()),
            _ => None,
        })
        .unwrap();
        let scanner = TradingviewScanner::from_settings(&settings).unwrap();
        assert!(matches!(
            scanner.fetch().await,
            Err(ScreenerError::ProviderUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn non_success_status_is_provider_unavailable() {
        let scanner = local_scanner(StatusCode::SERVICE_UNAVAILABLE, "scanner busy").await;
        match scanner.fetch().await {
            Err(ScreenerError::ProviderUnavailable(detail)) => {
                assert!(detail.contains("503"), "{detail}");
                assert!(detail.contains("scanner busy"), "{detail}");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_json_body_is_malformed_payload() {
        let scanner = local_scanner(StatusCode::OK, "not json").await;
        assert!(matches!(
            scanner.fetch().await,
            Err(ScreenerError::MalformedPayload(_))
        ));
    }

    #[tokio::test]
    async fn json_body_is_returned() {
        let scanner = local_scanner(StatusCode::OK, r#"{"totalCount":0,"data":[]}"#).await;
        let payload = scanner.fetch().await.unwrap();
        assert_eq!(payload["data"], serde_json::json!([]));
    }
}
