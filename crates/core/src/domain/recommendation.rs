use crate::error::ScreenerError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    StrongSell,
    Sell,
    Neutral,
    Buy,
    StrongBuy,
}

// Closed intervals checked in this order; the first match wins, so the shared
// endpoints 0.5, 0.1, -0.1 and -0.5 resolve to the earlier bucket.
const BUCKETS: [(Recommendation, f64, f64); 5] = [
    (Recommendation::StrongBuy, 0.5, 1.0),
    (Recommendation::Buy, 0.1, 0.5),
    (Recommendation::Neutral, -0.1, 0.1),
    (Recommendation::Sell, -0.5, -0.1),
    (Recommendation::StrongSell, -1.0, -0.5),
];

impl Recommendation {
    pub fn as_str(self) -> &'static str {
        match self {
            Recommendation::StrongSell => "strong_sell",
            Recommendation::Sell => "sell",
            Recommendation::Neutral => "neutral",
            Recommendation::Buy => "buy",
            Recommendation::StrongBuy => "strong_buy",
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Recommendation {
    type Err = ScreenerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "strong_sell" => Ok(Recommendation::StrongSell),
            "sell" => Ok(Recommendation::Sell),
            "neutral" => Ok(Recommendation::Neutral),
            "buy" => Ok(Recommendation::Buy),
            "strong_buy" => Ok(Recommendation::StrongBuy),
            other => Err(ScreenerError::SchemaMismatch(format!(
                "unknown recommendation label {other:?}"
            ))),
        }
    }
}

/// Maps a `Recommend.All` score onto one of the five buckets.
pub fn classify(score: f64) -> Result<Recommendation, ScreenerError> {
    if !score.is_finite() {
        return Err(ScreenerError::InvalidInput(format!(
            "score must be a finite number (got {score})"
        )));
    }

    BUCKETS
        .iter()
        .find(|(_, min, max)| (*min..=*max).contains(&score))
        .map(|(label, _, _)| *label)
        .ok_or(ScreenerError::Unclassifiable(score))
}

/// Classifies a raw scanner value; anything but a JSON number is `InvalidInput`.
pub fn classify_value(score: &Value) -> Result<Recommendation, ScreenerError> {
    match score.as_f64() {
        Some(v) => classify(v),
        None => Err(ScreenerError::InvalidInput(format!(
            "score must be numeric (got {score})"
        ))),
    }
}
