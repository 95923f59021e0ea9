pub mod domain;
pub mod error;
pub mod ingest;
pub mod service;
pub mod storage;
pub mod time;

#[cfg(test)]
pub(crate) mod testing;

pub mod config {
    use crate::domain::schema::ColumnSchema;
    use crate::ingest::request::{DEFAULT_BASE_URL, DEFAULT_LIMIT, DEFAULT_MARKET};
    use anyhow::Context;
    use std::path::PathBuf;

    const DEFAULT_TIMEOUT_SECS: u64 = 30;
    const DEFAULT_CACHE_DIR: &str = "src/tempDir";

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub sentry_dsn: Option<String>,
        pub screener_base_url: String,
        pub screener_market: String,
        pub screener_timeout_secs: u64,
        pub screener_limit: u32,
        pub screener_columns: ColumnSchema,
        pub cache_dir: PathBuf,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Self::from_vars(|key| std::env::var(key).ok())
        }

        /// Builds settings from any key lookup; blank values count as unset.
        pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
            let get = |key: &str| var(key).filter(|s| !s.trim().is_empty());

            let screener_timeout_secs = match get("SCREENER_TIMEOUT_SECS") {
                Some(s) => s
                    .trim()
                    .parse::<u64>()
                    .with_context(|| format!("SCREENER_TIMEOUT_SECS is not a number: {s}"))?,
                None => DEFAULT_TIMEOUT_SECS,
            };
            anyhow::ensure!(screener_timeout_secs >= 1, "SCREENER_TIMEOUT_SECS must be >= 1");

            let screener_limit = match get("SCREENER_LIMIT") {
                Some(s) => s
                    .trim()
                    .parse::<u32>()
                    .with_context(|| format!("SCREENER_LIMIT is not a number: {s}"))?,
                None => DEFAULT_LIMIT,
            };
            anyhow::ensure!(screener_limit >= 1, "SCREENER_LIMIT must be >= 1");

            let screener_columns = match get("SCREENER_COLUMNS") {
                Some(s) => ColumnSchema::parse_list(&s).context("invalid SCREENER_COLUMNS")?,
                None => ColumnSchema::default(),
            };

            Ok(Self {
                sentry_dsn: get("SENTRY_DSN"),
                screener_base_url: get("SCREENER_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
                screener_market: get("SCREENER_MARKET")
                    .unwrap_or_else(|| DEFAULT_MARKET.to_string()),
                screener_timeout_secs,
                screener_limit,
                screener_columns,
                cache_dir: get("CACHE_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_DIR)),
            })
        }
    }

}
