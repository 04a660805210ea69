use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

use crate::error::{QuizError, QuizResult};
use crate::symbol::Symbol;

/// Not present in either field: symbols are alphanumeric, timestamps are digits.
const DELIMITER: char = '|';

/// Pack a symbol and window start into the opaque client-held token.
///
/// This is a convenience encoding, not a capability: no signature, no
/// expiry. The token carries the entire session state so the server keeps
/// none.
pub fn encode(symbol: Symbol, window_start: i64) -> String {
    URL_SAFE_NO_PAD.encode(format!("{}{}{}", symbol.as_str(), DELIMITER, window_start))
}

/// Unpack a token back into its session fields.
///
/// Tokens come from the client and are treated as adversarial input: every
/// malformed shape fails cleanly with `MalformedSession`.
pub fn decode(token: &str) -> QuizResult<(Symbol, i64)> {
    let bytes = URL_SAFE_NO_PAD
        .decode(token)
        .map_err(|e| QuizError::MalformedSession(format!("invalid base64: {e}")))?;
    let payload = String::from_utf8(bytes)
        .map_err(|_| QuizError::MalformedSession("payload is not UTF-8".into()))?;
    let (pair, start) = payload
        .split_once(DELIMITER)
        .ok_or_else(|| QuizError::MalformedSession("missing delimiter".into()))?;
    let symbol = Symbol::from_pair(pair)
        .ok_or_else(|| QuizError::MalformedSession(format!("unknown symbol {pair:?}")))?;
    let window_start = start
        .parse::<i64>()
        .map_err(|_| QuizError::MalformedSession(format!("invalid timestamp {start:?}")))?;
    Ok((symbol, window_start))
}
