//! Minimum-interval gate between spoken announcements.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct AnnouncementThrottle {
    last: Option<Instant>,
    interval: Duration,
}

impl AnnouncementThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            last: None,
            interval,
        }
    }

    /// Allow an announcement at `now` if strictly more than the interval has
    /// passed since the last allowed one. Only a `true` result updates state.
    pub fn try_announce(&mut self, now: Instant) -> bool {
        let ready = match self.last {
            None => true,
            Some(last) => now
                .checked_duration_since(last)
                .is_some_and(|elapsed| elapsed > self.interval),
        };
        if ready {
            self.last = Some(now);
        }
        ready
    }

    pub fn last_announcement(&self) -> Option<Instant> {
        self.last
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Default for AnnouncementThrottle {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}
