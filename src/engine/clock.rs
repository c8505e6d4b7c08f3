use chrono::{DateTime, TimeZone, Utc};

/// Monotonic wall-clock cursor advanced by every ingested event timestamp.
///
/// Out-of-order events are accepted but never rewind the cursor; every
/// derived timestamp (task creation, audit, snapshot stamps) reads it. TTL
/// and dedup comparisons use the cursor, not host time, so a timestamped
/// event log replays deterministically.
#[derive(Debug, Clone)]
pub struct EventClock {
    cursor: DateTime<Utc>,
}

impl EventClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self { cursor: start }
    }

    pub fn starting_at_epoch() -> Self {
        Self::new(Utc.timestamp_opt(0, 0).unwrap())
    }

    /// Advance to `max(cursor, t)` and return the new cursor.
    pub fn observe(&mut self, t: DateTime<Utc>) -> DateTime<Utc> {
        if t > self.cursor {
            self.cursor = t;
        }
        self.cursor
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.cursor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn cursor_advances_to_max() {
        let t0 = Utc.timestamp_opt(1_000, 0).unwrap();
        let mut clock = EventClock::new(t0);
        assert_eq!(clock.observe(t0 + Duration::seconds(10)), t0 + Duration::seconds(10));
        assert_eq!(clock.now(), t0 + Duration::seconds(10));
    }

    #[test]
    fn out_of_order_events_do_not_rewind() {
        let t0 = Utc.timestamp_opt(1_000, 0).unwrap();
        let mut clock = EventClock::new(t0);
        clock.observe(t0 + Duration::seconds(60));
        clock.observe(t0 + Duration::seconds(30));
        assert_eq!(clock.now(), t0 + Duration::seconds(60));
    }
}
