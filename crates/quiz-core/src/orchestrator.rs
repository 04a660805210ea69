use crate::error::{QuizError, QuizResult};
use crate::session;
use crate::symbol::Symbol;
use crate::traits::{Explainer, MarketData};
use crate::types::{Candle, QuizRound, ScoringResult};
use crate::window::{self, SECS_PER_HOUR, WINDOW_HOURS};

/// Candles requested per round: 24 shown + the target + one spare.
const FETCH_LIMIT: u32 = 26;

/// The 24 window candles plus the target must all be present.
const MIN_CANDLES: usize = WINDOW_HOURS as usize + 1;

/// Composes the validator, window selector, session codec, market data
/// gateway and explanation assembler into the two quiz operations.
///
/// Both operations are stateless: everything a round needs lives in the
/// opaque token the client holds between `begin` and `score`.
pub struct QuizOrchestrator<M, E> {
    market: M,
    explainer: E,
}

impl<M: MarketData, E: Explainer> QuizOrchestrator<M, E> {
    pub fn new(market: M, explainer: E) -> Self {
        Self { market, explainer }
    }

    /// Start a round: pick a symbol (fail-open on bad input) and a random
    /// past window, fetch its candles and encode the session token.
    pub async fn begin(&self, raw_symbol: Option<&str>, now: i64) -> QuizResult<QuizRound> {
        let symbol = Symbol::validate_or_random(raw_symbol);
        let window_start = window::select_window(now);
        self.begin_at(symbol, window_start).await
    }

    /// Deterministic half of `begin`, with the symbol and window already fixed.
    pub async fn begin_at(&self, symbol: Symbol, window_start: i64) -> QuizResult<QuizRound> {
        let window_end = window_start + WINDOW_HOURS * SECS_PER_HOUR;
        let fetch_end = window_end + 2 * SECS_PER_HOUR;

        let raw = self
            .market
            .fetch_candles(symbol, window_start, fetch_end, FETCH_LIMIT)
            .await?;
        if raw.len() < MIN_CANDLES {
            tracing::warn!(%symbol, got = raw.len(), "feed returned too few candles");
            return Err(QuizError::DataUnavailable(format!(
                "feed returned {} of {} candles for {symbol}",
                raw.len(),
                MIN_CANDLES
            )));
        }

        // A gapped series would silently shift the target candle; refuse it.
        let hourly = raw[0].ts == window_start
            && raw[..MIN_CANDLES].windows(2).all(|w| w[1].ts - w[0].ts == SECS_PER_HOUR);
        if !hourly {
            return Err(QuizError::DataUnavailable(format!(
                "feed returned a gapped series for {symbol}"
            )));
        }

        let candles: Vec<Candle> = raw[..WINDOW_HOURS as usize].to_vec();
        let target_ts = raw[WINDOW_HOURS as usize].ts;

        Ok(QuizRound {
            id: session::encode(symbol, window_start),
            symbol: symbol.to_string(),
            candles,
            target_ts,
        })
    }

    /// Score a round: decode the token, fetch the actual close one hour past
    /// the window end, compute the relative error and attach a rationale.
    ///
    /// The explanation can never fail the call; only the decode, the guess
    /// check and the target fetch are fatal.
    pub async fn score(&self, token: &str, guess: f64) -> QuizResult<ScoringResult> {
        let (symbol, window_start) = session::decode(token)?;

        // Also rejects NaN. Checked before any upstream I/O so a zero guess
        // never reaches the division below.
        if !(guess > 0.0) {
            return Err(QuizError::InvalidGuess);
        }

        let target_time = window_start + WINDOW_HOURS * SECS_PER_HOUR;
        let candle = self
            .market
            .fetch_candle_at(symbol, target_time)
            .await?
            .ok_or_else(|| {
                QuizError::Upstream(format!("no candle at {target_time} for {symbol}"))
            })?;

        let actual = candle.close;
        let error_pct = (actual - guess).abs() / guess * 100.0;
        let explanation = self.explainer.explain(symbol, actual, guess).await;

        Ok(ScoringResult {
            actual: round2(actual),
            error_pct: round2(error_pct),
            explanation,
        })
    }
}

/// Two-decimal rounding at the response edge; internal math keeps full precision.
fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::symbol::ALLOWED_SYMBOLS;

    /// Serves an ascending hourly series starting wherever the caller asks,
    /// with optional shortfalls and gaps to exercise the failure paths.
    #[derive(Default)]
    struct FakeFeed {
        serve: Option<usize>,
        gap_at: Option<usize>,
        target_close: f64,
        target_missing: bool,
        calls: AtomicUsize,
    }

    impl FakeFeed {
        fn with_target(close: f64) -> Self {
            Self { target_close: close, ..Self::default() }
        }
    }

    #[async_trait]
    impl MarketData for FakeFeed {
        async fn fetch_candles(
            &self,
            _symbol: Symbol,
            start: i64,
            _end: i64,
            limit: u32,
        ) -> QuizResult<Vec<Candle>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let count = self.serve.unwrap_or(limit as usize).min(limit as usize);
            Ok((0..count)
                .map(|i| {
                    let mut ts = start + i as i64 * SECS_PER_HOUR;
                    if self.gap_at == Some(i) {
                        ts += SECS_PER_HOUR;
                    }
                    Candle { ts, close: 100.0 + i as f64 }
                })
                .collect())
        }

        async fn fetch_candle_at(&self, _symbol: Symbol, ts: i64) -> QuizResult<Option<Candle>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.target_missing {
                return Ok(None);
            }
            Ok(Some(Candle { ts, close: self.target_close }))
        }
    }

    struct CannedExplainer(&'static str);

    #[async_trait]
    impl Explainer for CannedExplainer {
        async fn explain(&self, _symbol: Symbol, _actual: f64, _guess: f64) -> String {
            self.0.to_string()
        }
    }

    fn orchestrator(feed: FakeFeed) -> QuizOrchestrator<FakeFeed, CannedExplainer> {
        QuizOrchestrator::new(feed, CannedExplainer("trend carried on"))
    }

    const T0: i64 = 1_690_000_800; // hour-aligned

    #[test]
    fn round2_rounds_to_two_decimals() {
        assert_eq!(round2(2.004), 2.0);
        assert_eq!(round2(2.006), 2.01);
        assert_eq!(round2(51000.0), 51000.0);
    }

    #[tokio::test]
    async fn begin_returns_24_hourly_candles_and_the_target() {
        let quiz = orchestrator(FakeFeed::default());
        let round = quiz.begin_at(Symbol::from_pair("BTCUSDT").unwrap(), T0).await.unwrap();

        assert_eq!(round.symbol, "BTCUSDT");
        assert_eq!(round.candles.len(), 24);
        assert_eq!(round.candles[0].ts, T0);
        for pair in round.candles.windows(2) {
            assert_eq!(pair[1].ts - pair[0].ts, SECS_PER_HOUR);
        }
        // Target is the 25th candle, one hour past the window end.
        assert_eq!(round.target_ts, T0 + 24 * SECS_PER_HOUR);

        let (symbol, start) = crate::session::decode(&round.id).unwrap();
        assert_eq!(symbol.as_str(), "BTCUSDT");
        assert_eq!(start, T0);
    }

    #[tokio::test]
    async fn begin_canonicalizes_the_requested_base_asset() {
        let quiz = orchestrator(FakeFeed::default());
        let round = quiz.begin(Some("btc"), 1_700_000_000).await.unwrap();
        assert_eq!(round.symbol, "BTCUSDT");
        assert_eq!(round.candles.len(), 24);
    }

    #[tokio::test]
    async fn begin_with_bad_symbol_still_succeeds_with_a_member() {
        let quiz = orchestrator(FakeFeed::default());
        let round = quiz.begin(Some("NOTACOIN"), 1_700_000_000).await.unwrap();
        assert!(ALLOWED_SYMBOLS.contains(&round.symbol.as_str()));
    }

    #[tokio::test]
    async fn begin_fails_when_feed_is_short() {
        let feed = FakeFeed { serve: Some(24), ..FakeFeed::default() };
        let quiz = orchestrator(feed);
        let err = quiz.begin_at(Symbol::from_pair("XRPUSDT").unwrap(), T0).await.unwrap_err();
        assert!(matches!(err, QuizError::DataUnavailable(_)));
    }

    #[tokio::test]
    async fn begin_fails_on_a_gapped_series() {
        let feed = FakeFeed { gap_at: Some(10), ..FakeFeed::default() };
        let quiz = orchestrator(feed);
        let err = quiz.begin_at(Symbol::from_pair("BNBUSDT").unwrap(), T0).await.unwrap_err();
        assert!(matches!(err, QuizError::DataUnavailable(_)));
    }

    #[tokio::test]
    async fn score_computes_relative_error() {
        let quiz = orchestrator(FakeFeed::with_target(51_000.0));
        let token = crate::session::encode(Symbol::from_pair("BTCUSDT").unwrap(), T0);

        let result = quiz.score(&token, 50_000.0).await.unwrap();
        assert_eq!(result.actual, 51_000.0);
        assert_eq!(result.error_pct, 2.0);
        assert_eq!(result.explanation, "trend carried on");
    }

    #[tokio::test]
    async fn score_rejects_non_positive_guesses_before_any_fetch() {
        let quiz = orchestrator(FakeFeed::with_target(51_000.0));
        let token = crate::session::encode(Symbol::from_pair("ETHUSDT").unwrap(), T0);

        for guess in [0.0, -1.0, f64::NAN] {
            let err = quiz.score(&token, guess).await.unwrap_err();
            assert!(matches!(err, QuizError::InvalidGuess));
        }
        assert_eq!(quiz.market.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn score_fails_when_the_target_candle_is_missing() {
        let feed = FakeFeed { target_missing: true, ..FakeFeed::default() };
        let quiz = orchestrator(feed);
        let token = crate::session::encode(Symbol::from_pair("SOLUSDT").unwrap(), T0);

        let err = quiz.score(&token, 25.0).await.unwrap_err();
        assert!(matches!(err, QuizError::Upstream(_)));
    }

    #[tokio::test]
    async fn score_rejects_malformed_tokens() {
        let quiz = orchestrator(FakeFeed::default());
        let err = quiz.score("@@not-a-token@@", 100.0).await.unwrap_err();
        assert!(matches!(err, QuizError::MalformedSession(_)));
    }
}
