use thiserror::Error;

/// Failure of one pipeline stage. The detail string keeps the underlying cause.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScreenerError {
    #[error("invalid classifier input: {0}")]
    InvalidInput(String),

    #[error("score {0} is outside [-1.0, 1.0]")]
    Unclassifiable(f64),

    #[error("screener provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("malformed screener payload: {0}")]
    MalformedPayload(String),

    #[error("screener payload contained no usable rows")]
    EmptyDataset,

    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("cache storage error: {0}")]
    Storage(String),
}

impl ScreenerError {
    /// Fixed user-facing message for the stage that failed.
    pub fn user_message(&self) -> &'static str {
        match self {
            ScreenerError::ProviderUnavailable(_) => "Unable to connect to Tradingview API server",
            ScreenerError::MalformedPayload(_)
            | ScreenerError::InvalidInput(_)
            | ScreenerError::Unclassifiable(_) => "Unable to parse the data from API response",
            ScreenerError::EmptyDataset => "Unable to find the rows",
            ScreenerError::SchemaMismatch(_) => {
                "Unable to find the requested columns in the screener data"
            }
            ScreenerError::Storage(_) => "Unable to access the local screener cache",
        }
    }
}

impl From<csv::Error> for ScreenerError {
    fn from(err: csv::Error) -> Self {
        ScreenerError::Storage(err.to_string())
    }
}

/// The single error kind surfaced to callers of the callable operations.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct TradingviewError {
    message: &'static str,
    #[source]
    source: ScreenerError,
}

impl TradingviewError {
    pub fn message(&self) -> &'static str {
        self.message
    }

    pub fn cause(&self) -> &ScreenerError {
        &self.source
    }
}

impl From<ScreenerError> for TradingviewError {
    fn from(source: ScreenerError) -> Self {
        Self {
            message: source.user_message(),
            source,
        }
    }
}
