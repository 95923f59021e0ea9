use crate::domain::schema::ColumnSchema;
use crate::error::ScreenerError;
use crate::ingest::provider::ScreenerSource;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub(crate) fn sample_schema() -> ColumnSchema {
    ColumnSchema::parse_list("name,close,volume,Recommend.All").unwrap()
}

/// Three usable entries around one without a `d` array; AAPL lands at row 2.
pub(crate) fn sample_payload() -> Value {
    json!({
        "totalCount": 4,
        "data": [
            {"s": "NASDAQ:MSFT", "d": ["MSFT", 410.5, 18250000, 0.6]},
            {"s": "NASDAQ:TSLA", "d": ["TSLA", 251.05, 98000000, -0.3]},
            {"s": "NYSE:BRK.B"},
            {"s": "NASDAQ:AAPL", "d": ["AAPL", 225.25, 45000000, 0.2]},
        ]
    })
}

/// Serves a fixed response and counts calls.
pub(crate) struct CountingSource {
    response: Result<Value, ScreenerError>,
    calls: Arc<AtomicUsize>,
}

impl CountingSource {
    pub(crate) fn new(response: Result<Value, ScreenerError>) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                response,
                calls: calls.clone(),
            },
            calls,
        )
    }

    pub(crate) fn calls(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ScreenerSource for CountingSource {
    fn provider_name(&self) -> &'static str {
        "counting_fake"
    }

    async fn fetch(&self) -> Result<Value, ScreenerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.response.clone()
    }
}
