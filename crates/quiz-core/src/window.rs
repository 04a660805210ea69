use rand::Rng;

pub const SECS_PER_HOUR: i64 = 3600;

/// Number of hourly candles shown to the player.
pub const WINDOW_HOURS: i64 = 24;

/// The window must end at least this far before "now" so the target candle
/// is guaranteed to already exist in the upstream feed.
pub const MIN_OFFSET_HOURS: i64 = 7 * 24;

/// Randomized extra look-back beyond the minimum offset.
pub const MAX_EXTRA_HOURS: i64 = 30 * 24;

/// Pick the start of a 24 h window strictly in the past.
///
/// Draws an hour-granular offset uniformly in [7 days, 37 days] before
/// `now`; the window ends there and the target candle sits one hour past
/// the window end. Only fixes the time boundaries; candles are resolved
/// later by the market data gateway.
pub fn select_window(now: i64) -> i64 {
    select_window_with(&mut rand::thread_rng(), now)
}

pub fn select_window_with<R: Rng>(rng: &mut R, now: i64) -> i64 {
    let offset_hours = MIN_OFFSET_HOURS + rng.gen_range(0..=MAX_EXTRA_HOURS);
    let window_end = align_to_hour(now) - offset_hours * SECS_PER_HOUR;
    window_end - WINDOW_HOURS * SECS_PER_HOUR
}

/// Truncate a timestamp down to the top of its hour.
pub fn align_to_hour(ts: i64) -> i64 {
    ts - ts.rem_euclid(SECS_PER_HOUR)
}
