// 1.0: primitives. IDs, codes, prices, share counts, timestamps.
// each is a newtype so the compiler catches type mixups (a StockCode is not a String,
// a Price is not a bare Decimal).

use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

// 1.1: the MaCP. 3 to 8 uppercase ASCII alphanumerics, fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StockCode(String);

impl StockCode {
    #[must_use]
    pub fn new(code: &str) -> Option<Self> {
        let len_ok = (3..=8).contains(&code.len());
        let chars_ok = code.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit());
        if len_ok && chars_ok {
            Some(Self(code.to_string()))
        } else {
            None
        }
    }

    pub fn new_unchecked(code: &str) -> Self {
        debug_assert!((3..=8).contains(&code.len()));
        Self(code.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StockCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// 1.2: price in VND. must be positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Price(Decimal);

impl Price {
    #[must_use]
    pub fn new(value: Decimal) -> Option<Self> {
        if value > Decimal::ZERO {
            Some(Self(value))
        } else {
            None
        }
    }

    pub fn new_unchecked(value: Decimal) -> Self {
        debug_assert!(value > Decimal::ZERO);
        Self(value)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// 1.3: number of shares outstanding. zero is not a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ShareCount(u64);

impl ShareCount {
    #[must_use]
    pub fn new(count: u64) -> Option<Self> {
        if count > 0 {
            Some(Self(count))
        } else {
            None
        }
    }

    pub fn new_unchecked(count: u64) -> Self {
        debug_assert!(count > 0);
        Self(count)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ShareCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// 1.4: millisecond timestamp, exchange-local by convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn now() -> Self {
        Self(chrono::Utc::now().timestamp_millis())
    }

    pub fn from_millis(ms: i64) -> Self {
        Self(ms)
    }

    pub fn as_millis(&self) -> i64 {
        self.0
    }

    /// Build a timestamp from a calendar date and wall-clock time.
    /// Convenient for tests and the day-prep window checks.
    pub fn from_date_time(date: NaiveDate, time: NaiveTime) -> Self {
        let dt = Utc.from_utc_datetime(&date.and_time(time));
        Self(dt.timestamp_millis())
    }

    /// Wall-clock time of day for trading-window checks.
    pub fn time_of_day(&self) -> NaiveTime {
        chrono::DateTime::from_timestamp_millis(self.0)
            .map(|dt| dt.time())
            .unwrap_or(NaiveTime::MIN)
    }

    /// Calendar date, used for the once-per-day preparation marker.
    pub fn trading_date(&self) -> NaiveDate {
        chrono::DateTime::from_timestamp_millis(self.0)
            .map(|dt| dt.date_naive())
            .unwrap_or(NaiveDate::MIN)
    }
}
