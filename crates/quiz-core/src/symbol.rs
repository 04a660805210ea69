use std::fmt;

use rand::seq::SliceRandom;

/// Quote currency appended to every base asset in the allow-list.
pub const QUOTE_SUFFIX: &str = "USDT";

/// The fixed set of trading pairs the quiz may draw from.
pub const ALLOWED_SYMBOLS: [&str; 5] = ["BTCUSDT", "ETHUSDT", "BNBUSDT", "SOLUSDT", "XRPUSDT"];

/// A validated member of the symbol allow-list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Symbol(&'static str);

impl Symbol {
    /// Normalize a raw user-supplied base asset and validate it against the
    /// allow-list: uppercase, append the quote suffix, check membership.
    pub fn validate(raw: Option<&str>) -> Option<Symbol> {
        let base = raw?.trim().to_uppercase();
        if base.is_empty() {
            return None;
        }
        let pair = format!("{base}{QUOTE_SUFFIX}");
        Self::from_pair(&pair)
    }

    /// Look up a full trading pair (e.g. "BTCUSDT") in the allow-list.
    pub fn from_pair(pair: &str) -> Option<Symbol> {
        ALLOWED_SYMBOLS.iter().find(|&&s| s == pair).map(|&s| Symbol(s))
    }

    /// Uniform draw from the allow-list.
    pub fn random() -> Symbol {
        let mut rng = rand::thread_rng();
        let pair = ALLOWED_SYMBOLS.choose(&mut rng).copied().unwrap_or(ALLOWED_SYMBOLS[0]);
        Symbol(pair)
    }

    /// Fail-open validation: absent or unknown input substitutes a random
    /// member so "begin" always succeeds. Intentional availability-over-
    /// strictness policy; do not turn this into a hard rejection.
    pub fn validate_or_random(raw: Option<&str>) -> Symbol {
        match Self::validate(raw) {
            Some(symbol) => symbol,
            None => {
                let symbol = Self::random();
                tracing::debug!(input = ?raw, chosen = %symbol, "invalid symbol, substituting random");
                symbol
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }

    /// Base asset with the quote suffix stripped, e.g. "BTC".
    pub fn base_asset(&self) -> &'static str {
        self.0.strip_suffix(QUOTE_SUFFIX).unwrap_or(self.0)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}
