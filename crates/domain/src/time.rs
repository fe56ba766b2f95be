//! Time and timestamp helpers.
//!
//! Devices report and receive timestamps as integer milliseconds since the
//! Unix epoch, so the whole core reasons in [`EpochMillis`].

use chrono::Utc;

/// Milliseconds since the Unix epoch (UTC).
pub type EpochMillis = i64;

/// Milliseconds in one minute.
pub const MILLIS_PER_MINUTE: i64 = 60_000;

/// Return the current UTC time in epoch milliseconds.
#[must_use]
pub fn now_millis() -> EpochMillis {
    Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_return_current_utc_time() {
        let before = Utc::now().timestamp_millis();
        let ts = now_millis();
        let after = Utc::now().timestamp_millis();
        assert!(ts >= before);
        assert!(ts <= after);
    }
}
