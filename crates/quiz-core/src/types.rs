use serde::{Deserialize, Serialize};

/// One hourly close from the upstream feed. Only the open time and close
/// price of each upstream record are carried.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Open time, epoch seconds.
    #[serde(rename = "t")]
    pub ts: i64,
    /// Close price.
    #[serde(rename = "p")]
    pub close: f64,
}

/// Everything the client needs to play one round: the opaque session token,
/// the chosen symbol, the 24 historical candles and the target timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizRound {
    pub id: String,
    pub symbol: String,
    pub candles: Vec<Candle>,
    pub target_ts: i64,
}

/// Outcome of scoring a guess. Derived per request, never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringResult {
    pub actual: f64,
    #[serde(rename = "errorPct")]
    pub error_pct: f64,
    pub explanation: String,
}
