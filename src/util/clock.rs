use chrono::{DateTime, Utc};

/// Source of "now" for creation timestamps and relative ages.
///
/// Production code uses [`SystemClock`]; tests inject a clock that steps
/// deterministically.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
