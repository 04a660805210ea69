use async_trait::async_trait;

use crate::error::QuizResult;
use crate::symbol::Symbol;
use crate::types::Candle;

/// Read-only access to the upstream hourly-candle feed.
///
/// Implementations perform no caching and no retry; callers decide whether
/// a short or empty result is fatal.
#[async_trait]
pub trait MarketData: Send + Sync {
    /// Fetch up to `limit` hourly candles in `[start, end]` (epoch seconds),
    /// ordered by open time.
    async fn fetch_candles(
        &self,
        symbol: Symbol,
        start: i64,
        end: i64,
        limit: u32,
    ) -> QuizResult<Vec<Candle>>;

    /// Fetch the single candle opening at `ts`, if the feed has it.
    async fn fetch_candle_at(&self, symbol: Symbol, ts: i64) -> QuizResult<Option<Candle>>;
}

/// Auxiliary natural-language rationale service.
///
/// Never fails past its own boundary: degraded outcomes are rendered into
/// the returned text instead of surfacing as errors.
#[async_trait]
pub trait Explainer: Send + Sync {
    async fn explain(&self, symbol: Symbol, actual: f64, guess: f64) -> String;
}
