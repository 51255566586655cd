use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::warn;

/// Portfolio-level kill switch plus a sliding-1-second message-rate
/// limiter (§4.C "check_safety"). Adapted from a per-instrument peak/current
/// drawdown-tracking style, collapsed to a single equity curve since the
/// optimizer trades one portfolio, not per-instrument books.
///
/// Once the drawdown limit trips, `killed` latches permanently — there is
/// no reset path, mirroring the "absorption" invariant that a killed
/// portfolio stays killed for the rest of the process lifetime.
#[derive(Debug)]
pub struct SafetyRails {
    max_drawdown: Decimal,
    max_messages_per_second: u32,
    peak_equity: Option<Decimal>,
    killed: bool,
    current_second: Option<i64>,
    messages_this_second: u32,
}

impl SafetyRails {
    /// `max_drawdown` is a negative fraction, e.g. `-0.05` for a 5% limit.
    pub fn new(max_drawdown: Decimal, max_messages_per_second: u32) -> Self {
        Self {
            max_drawdown,
            max_messages_per_second,
            peak_equity: None,
            killed: false,
            current_second: None,
            messages_this_second: 0,
        }
    }

    pub fn is_killed(&self) -> bool {
        self.killed
    }

    /// Update the equity peak from `equity`, check drawdown against
    /// `max_drawdown`, then check the current second's message count
    /// against `max_messages_per_second`. Returns `true` if trading may
    /// proceed this tick.
    ///
    /// Call exactly once per outgoing message/tick — the rate limiter
    /// counts every call, not just the ones that pass.
    pub fn check_safety(&mut self, equity: Decimal, now: DateTime<Utc>) -> bool {
        if self.killed {
            return false;
        }

        let peak = self.peak_equity.map(|p| p.max(equity)).unwrap_or(equity);
        self.peak_equity = Some(peak);

        if !peak.is_zero() {
            let drawdown = (equity - peak) / peak;
            if drawdown < self.max_drawdown {
                warn!(%drawdown, limit = %self.max_drawdown, "drawdown limit breached, killing portfolio");
                self.killed = true;
                return false;
            }
        }

        let second = now.timestamp();
        if self.current_second == Some(second) {
            self.messages_this_second += 1;
        } else {
            self.current_second = Some(second);
            self.messages_this_second = 1;
        }

        if self.messages_this_second > self.max_messages_per_second {
            warn!(count = self.messages_this_second, limit = self.max_messages_per_second, "message rate limit exceeded");
            return false;
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    #[test]
    fn test_drawdown_trips_kill_switch() {
        let mut rails = SafetyRails::new(dec!(-0.05), 100);
        let t0 = Utc::now();
        assert!(rails.check_safety(dec!(1000), t0));
        assert!(!rails.check_safety(dec!(900), t0));
        assert!(rails.is_killed());
    }

    #[test]
    fn test_kill_switch_is_permanent() {
        let mut rails = SafetyRails::new(dec!(-0.05), 100);
        let t0 = Utc::now();
        rails.check_safety(dec!(1000), t0);
        rails.check_safety(dec!(900), t0);
        assert!(rails.is_killed());
        // recovering equity afterwards must not resurrect the portfolio
        assert!(!rails.check_safety(dec!(1500), t0 + Duration::seconds(1)));
    }

    #[test]
    fn test_message_rate_limiter_within_one_second_window() {
        let mut rails = SafetyRails::new(dec!(-0.5), 2);
        let t0 = Utc::now();
        assert!(rails.check_safety(dec!(1000), t0));
        assert!(rails.check_safety(dec!(1000), t0));
        assert!(!rails.check_safety(dec!(1000), t0));
    }

    #[test]
    fn test_message_rate_limiter_resets_on_new_second() {
        let mut rails = SafetyRails::new(dec!(-0.5), 1);
        let t0 = Utc::now();
        assert!(rails.check_safety(dec!(1000), t0));
        assert!(!rails.check_safety(dec!(1000), t0));
        assert!(rails.check_safety(dec!(1000), t0 + Duration::seconds(1)));
    }
}
