use std::sync::{Arc, Mutex};
use chrono::{Duration, NaiveDateTime, Utc};

// Clock is injected into every service so expiration logic can be driven from tests.
pub trait Clock: Sync + Send {
    fn now(&self) -> NaiveDateTime;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Utc::now().naive_utc()
    }
}

// ManualClock only moves when told to.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<NaiveDateTime>>,
}

impl ManualClock {
    pub fn new(start: NaiveDateTime) -> Self {
        Self { now: Arc::new(Mutex::new(start)) }
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut now) = self.now.lock() {
            *now += by;
        }
    }

    pub fn set(&self, to: NaiveDateTime) {
        if let Ok(mut now) = self.now.lock() {
            *now = to;
        }
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        ManualClock::new(Utc::now().naive_utc())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        match self.now.lock() {
            Ok(now) => *now,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use crate::core::clock::{Clock, ManualClock};

    #[tokio::test]
    async fn test_should_advance_manual_clock() {
        let clock = ManualClock::default();
        let start = clock.now();
        clock.advance(Duration::days(2));
        assert_eq!(start + Duration::days(2), clock.now());
        let shared = clock.clone();
        shared.advance(Duration::hours(1));
        assert_eq!(start + Duration::days(2) + Duration::hours(1), clock.now());
    }
}
