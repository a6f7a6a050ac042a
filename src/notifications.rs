//! Per-key cooldown for customer notifications.
//!
//! A notice for a key is let through only when the previous one for the same
//! key is older than the cooldown. Time comes from an injected [`Clock`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

pub const DEFAULT_COOLDOWN_MS: i64 = 3000;

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Kinds of notices the quote flow emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    RouteCalculated,
    TruckSuggested,
    Payment,
}

impl NoticeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoticeKind::RouteCalculated => "route",
            NoticeKind::TruckSuggested => "truck_suggested",
            NoticeKind::Payment => "payment",
        }
    }
}

/// Customer-facing notice.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: String,
    pub description: String,
}

/// Cooldown rate limiter keyed by notice kind and session.
pub struct NotificationLimiter {
    cooldown: Duration,
    clock: Arc<dyn Clock>,
    last_shown: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl NotificationLimiter {
    pub fn new(cooldown: Duration) -> Self {
        Self::with_clock(cooldown, Arc::new(SystemClock))
    }

    pub fn with_clock(cooldown: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            cooldown,
            clock,
            last_shown: Mutex::new(HashMap::new()),
        }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Record and allow the notice if its key is out of cooldown.
    pub fn should_notify(&self, key: &str) -> bool {
        let now = self.clock.now();
        let mut last_shown = self.last_shown.lock().unwrap_or_else(PoisonError::into_inner);

        match last_shown.get(key) {
            Some(last) if now - *last <= self.cooldown => false,
            _ => {
                last_shown.insert(key.to_string(), now);
                true
            }
        }
    }

    /// Pass `notice` through when allowed for the given session.
    pub fn filter(&self, session: &str, notice: Notice) -> Option<Notice> {
        let key = format!("{}:{}", notice.kind.as_str(), session);
        if self.should_notify(&key) {
            Some(notice)
        } else {
            tracing::debug!("Suppressed notice {} during cooldown", key);
            None
        }
    }

    /// Forget all recorded timestamps.
    pub fn reset(&self) {
        self.last_shown
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

/// Clock advanced by hand, for tests.
#[cfg(test)]
pub(crate) struct ManualClock(Mutex<DateTime<Utc>>);

#[cfg(test)]
impl ManualClock {
    pub(crate) fn start() -> Arc<Self> {
        Arc::new(Self(Mutex::new(DateTime::<Utc>::UNIX_EPOCH)))
    }

    pub(crate) fn advance_ms(&self, ms: i64) {
        let mut now = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        *now += Duration::milliseconds(ms);
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(clock: &Arc<ManualClock>) -> NotificationLimiter {
        NotificationLimiter::with_clock(Duration::milliseconds(DEFAULT_COOLDOWN_MS), clock.clone())
    }

    #[test]
    fn test_first_notice_allowed() {
        let clock = ManualClock::start();
        assert!(limiter(&clock).should_notify("route"));
    }

    #[test]
    fn test_cooldown_suppresses_repeats() {
        let clock = ManualClock::start();
        let limiter = limiter(&clock);

        assert!(limiter.should_notify("route"));
        clock.advance_ms(1000);
        assert!(!limiter.should_notify("route"));
        clock.advance_ms(2000);
        // exactly at the cooldown boundary is still suppressed
        assert!(!limiter.should_notify("route"));
        clock.advance_ms(1);
        assert!(limiter.should_notify("route"));
    }

    #[test]
    fn test_suppressed_attempt_does_not_extend_cooldown() {
        let clock = ManualClock::start();
        let limiter = limiter(&clock);

        assert!(limiter.should_notify("payment"));
        clock.advance_ms(2500);
        assert!(!limiter.should_notify("payment"));
        clock.advance_ms(600);
        assert!(limiter.should_notify("payment"));
    }

    #[test]
    fn test_keys_are_independent() {
        let clock = ManualClock::start();
        let limiter = limiter(&clock);

        assert!(limiter.should_notify("pickup"));
        assert!(limiter.should_notify("drop"));
        assert!(!limiter.should_notify("pickup"));

        limiter.reset();
        assert!(limiter.should_notify("pickup"));
    }

    #[test]
    fn test_filter_scopes_by_session() {
        let clock = ManualClock::start();
        let limiter = limiter(&clock);
        let notice = Notice {
            kind: NoticeKind::RouteCalculated,
            title: "Route Calculated".to_string(),
            description: "Total route distance: 10.00 km".to_string(),
        };

        assert!(limiter.filter("alice", notice.clone()).is_some());
        assert!(limiter.filter("alice", notice.clone()).is_none());
        assert!(limiter.filter("bob", notice).is_some());
    }
}
