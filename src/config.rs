// 7.0 config.rs: all settings in one place. trading window, auto-session
// schedule, log retention.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

fn hms(h: u32, m: u32, s: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, s).unwrap_or(NaiveTime::MIN)
}

/// Daily schedule for the auto-run session. Phase boundaries are wall-clock
/// times; the controller compares the injected clock against them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSchedule {
    /// ATO call auction opens
    pub ato_start: NaiveTime,
    /// Continuous limit-order matching opens
    pub lo_start: NaiveTime,
    /// ATC call auction opens
    pub atc_start: NaiveTime,
    /// Session closes
    pub close: NaiveTime,
}

impl Default for SessionSchedule {
    fn default() -> Self {
        // HOSE hours
        Self {
            ato_start: hms(9, 0, 0),
            lo_start: hms(9, 15, 0),
            atc_start: hms(14, 30, 0),
            close: hms(14, 45, 0),
        }
    }
}

/// Configuration for the admin session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminConfig {
    /// Start of the protected trading window; day rollover is refused inside it
    pub trading_window_start: NaiveTime,
    /// End of the protected trading window
    pub trading_window_end: NaiveTime,
    /// Auto-mode phase schedule
    pub schedule: SessionSchedule,
    /// Maximum action-log entries retained locally
    pub max_log_entries: usize,
    /// Print each workflow outcome (simulation binary only)
    pub verbose: bool,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            trading_window_start: hms(8, 0, 0),
            trading_window_end: hms(15, 0, 0),
            schedule: SessionSchedule::default(),
            max_log_entries: 10_000,
            verbose: false,
        }
    }
}

impl AdminConfig {
    /// True while live-session operations are protected: [start, end).
    pub fn in_trading_window(&self, time: NaiveTime) -> bool {
        time >= self.trading_window_start && time < self.trading_window_end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trading_window_bounds() {
        let config = AdminConfig::default();

        assert!(config.in_trading_window(hms(8, 0, 0)));
        assert!(config.in_trading_window(hms(10, 0, 0)));
        assert!(config.in_trading_window(hms(14, 59, 59)));

        assert!(!config.in_trading_window(hms(7, 59, 59)));
        assert!(!config.in_trading_window(hms(15, 0, 0)));
        assert!(!config.in_trading_window(hms(16, 0, 0)));
    }

    #[test]
    fn schedule_is_ordered() {
        let s = SessionSchedule::default();
        assert!(s.ato_start < s.lo_start);
        assert!(s.lo_start < s.atc_start);
        assert!(s.atc_start < s.close);
    }
}
