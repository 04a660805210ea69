use std::time::Duration;

use async_trait::async_trait;
use quiz_core::{Candle, MarketData, QuizError, QuizResult, Symbol};
use reqwest::Client;
use serde_json::Value;

const BASE_URL: &str = "https://api.binance.com";
const INTERVAL: &str = "1h";

/// Thin client over the Binance hourly-candle feed.
///
/// No caching and no retry: a single failed attempt becomes a typed error
/// and the caller decides what a short result means.
#[derive(Clone)]
pub struct BinanceClient {
    base_url: String,
    client: Client,
}

impl BinanceClient {
    pub fn new() -> Self {
        let base_url =
            std::env::var("BINANCE_BASE_URL").unwrap_or_else(|_| BASE_URL.to_string());

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { base_url, client }
    }

    async fn get_klines(&self, query: &[(&str, String)]) -> QuizResult<Vec<Candle>> {
        let url = format!("{}/api/v3/klines", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| QuizError::Upstream(format!("klines request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(QuizError::Upstream(format!(
                "klines HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        let rows: Vec<Value> = response
            .json()
            .await
            .map_err(|e| QuizError::Upstream(format!("klines body: {e}")))?;

        parse_klines(&rows)
    }
}

impl Default for BinanceClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MarketData for BinanceClient {
    async fn fetch_candles(
        &self,
        symbol: Symbol,
        start: i64,
        end: i64,
        limit: u32,
    ) -> QuizResult<Vec<Candle>> {
        tracing::debug!(%symbol, start, end, limit, "fetching hourly candles");
        self.get_klines(&[
            ("symbol", symbol.as_str().to_string()),
            ("interval", INTERVAL.to_string()),
            ("startTime", (start * 1000).to_string()),
            ("endTime", (end * 1000).to_string()),
            ("limit", limit.to_string()),
        ])
        .await
    }

    async fn fetch_candle_at(&self, symbol: Symbol, ts: i64) -> QuizResult<Option<Candle>> {
        tracing::debug!(%symbol, ts, "fetching target candle");
        let candles = self
            .get_klines(&[
                ("symbol", symbol.as_str().to_string()),
                ("interval", INTERVAL.to_string()),
                ("startTime", (ts * 1000).to_string()),
                ("limit", "1".to_string()),
            ])
            .await?;

        // The feed returns the first candle at or after startTime; a later
        // one means the requested hour is missing.
        Ok(candles.into_iter().next().filter(|c| c.ts == ts))
    }
}

/// Extract (open time, close) pairs from raw kline rows.
///
/// Kline rows are heterogeneous JSON arrays; only field 0 (open time, ms)
/// and field 4 (close price, stringified decimal) are read.
pub fn parse_klines(rows: &[Value]) -> QuizResult<Vec<Candle>> {
    rows.iter()
        .map(|row| {
            let ts_ms = row
                .get(0)
                .and_then(Value::as_i64)
                .ok_or_else(|| QuizError::Upstream("kline row missing open time".into()))?;

            let close = row
                .get(4)
                .and_then(|v| match v {
                    Value::String(s) => s.parse::<f64>().ok(),
                    other => other.as_f64(),
                })
                .ok_or_else(|| QuizError::Upstream("kline row missing close price".into()))?;

            Ok(Candle { ts: ts_ms / 1000, close })
        })
        .collect()
}
