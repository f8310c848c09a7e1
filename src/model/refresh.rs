use std::time::{Duration, Instant};

/// Default auto-refresh period.
pub const DEFAULT_REFRESH: Duration = Duration::from_secs(90);
/// How often the countdown label is redrawn.
pub const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Countdown that drives the periodic refetch.
#[derive(Debug, Clone)]
pub struct RefreshCountdown {
    period: Duration,
    deadline: Instant,
    pub paused: bool,
}

impl RefreshCountdown {
    pub fn new(period: Duration, now: Instant) -> Self {
        let period = period.max(TICK_INTERVAL);
        Self {
            period,
            deadline: now + period,
            paused: false,
        }
    }

    /// Change the period and restart the countdown.
    pub fn set_period(&mut self, period: Duration, now: Instant) {
        self.period = period.max(TICK_INTERVAL);
        self.reset(now);
    }

    pub fn reset(&mut self, now: Instant) {
        self.deadline = now + self.period;
    }

    pub fn remaining(&self, now: Instant) -> Duration {
        self.deadline.saturating_duration_since(now)
    }

    pub fn is_due(&self, now: Instant) -> bool {
        !self.paused && now >= self.deadline
    }

    /// Button caption, e.g. `Update (01:29.9)`.
    pub fn caption(&self, base: &str, now: Instant) -> String {
        if self.paused {
            format!("{} (paused)", base)
        } else {
            format!("{} ({})", base, format_remaining(self.remaining(now)))
        }
    }
}

/// `mm:ss.d` with tenths of a second.
pub fn format_remaining(remaining: Duration) -> String {
    let tenths = remaining.as_millis() / 100;
    let minutes = tenths / 600;
    let seconds = (tenths / 10) % 60;
    format!("{:02}:{:02}.{}", minutes % 100, seconds, tenths % 10)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_minutes_seconds_tenths() {
        assert_eq!(format_remaining(Duration::from_secs(90)), "01:30.0");
        assert_eq!(format_remaining(Duration::from_millis(89_950)), "01:29.9");
        assert_eq!(format_remaining(Duration::ZERO), "00:00.0");
    }

    #[test]
    fn becomes_due_exactly_at_period() {
        let t0 = Instant::now();
        let countdown = RefreshCountdown::new(DEFAULT_REFRESH, t0);
        assert!(!countdown.is_due(t0 + Duration::from_millis(89_900)));
        assert!(countdown.is_due(t0 + DEFAULT_REFRESH));
        assert_eq!(countdown.remaining(t0 + Duration::from_secs(100)), Duration::ZERO);
    }

    #[test]
    fn reset_restarts_from_now() {
        let t0 = Instant::now();
        let mut countdown = RefreshCountdown::new(Duration::from_secs(10), t0);
        let later = t0 + Duration::from_secs(8);
        countdown.reset(later);
        assert_eq!(countdown.remaining(later), Duration::from_secs(10));
        assert!(!countdown.is_due(t0 + Duration::from_secs(12)));
    }

    #[test]
    fn paused_countdown_never_fires() {
        let t0 = Instant::now();
        let mut countdown = RefreshCountdown::new(Duration::from_secs(1), t0);
        countdown.paused = true;
        assert!(!countdown.is_due(t0 + Duration::from_secs(5)));
        assert_eq!(countdown.caption("Update", t0), "Update (paused)");
        countdown.paused = false;
        assert_eq!(countdown.caption("Update", t0), "Update (00:01.0)");
    }
}
