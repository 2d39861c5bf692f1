//! Millisecond clock and monotonic id source.
//!
//! # Responsibility
//! - Abstract wall-clock reads so repository logic is testable.
//! - Turn clock ticks into unique, strictly increasing note ids.
//!
//! # Invariants
//! - `IdSource::next_stamp` never returns a value `<=` a previously returned one.
//! - Two creations inside the same clock tick still receive distinct ids.
//! - Once `i64::MAX` has been issued or observed, no further stamp is issued.

use crate::model::note::NoteId;
use log::{debug, warn};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of epoch-millisecond timestamps.
pub trait Clock {
    fn now_millis(&self) -> i64;
}

/// Wall-clock implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
            .unwrap_or(0)
    }
}

/// Settable clock shared between a test and the repository it drives.
///
/// Clones observe the same tick.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicI64>,
}

impl ManualClock {
    pub fn new(now: i64) -> Self {
        Self {
            now: Arc::new(AtomicI64::new(now)),
        }
    }

    pub fn set(&self, now: i64) {
        self.now.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, millis: i64) {
        self.now.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Monotonic id/timestamp generator on top of a [`Clock`].
pub struct IdSource {
    clock: Box<dyn Clock + Send>,
    last_issued: i64,
}

impl IdSource {
    pub fn new(clock: impl Clock + Send + 'static) -> Self {
        Self {
            clock: Box::new(clock),
            last_issued: i64::MIN,
        }
    }

    /// Raises the floor so future stamps stay above `seen`.
    ///
    /// Called with the largest id/timestamp present after load or import.
    pub fn observe(&mut self, seen: i64) {
        if seen > self.last_issued {
            self.last_issued = seen;
        }
    }

    /// Returns `max(now, last + 1)` and records it.
    ///
    /// Returns `None` when the floor already sits at `i64::MAX`.
    pub fn next_stamp(&mut self) -> Option<i64> {
        let now = self.clock.now_millis();
        let stamp = if self.last_issued == i64::MIN || now > self.last_issued {
            now
        } else {
            let Some(bumped) = self.last_issued.checked_add(1) else {
                warn!(
                    "event=id_exhausted module=clock status=error clock_ms={} last={}",
                    now, self.last_issued
                );
                return None;
            };
            debug!(
                "event=id_bumped module=clock status=ok clock_ms={} issued={}",
                now, bumped
            );
            bumped
        };
        self.last_issued = stamp;
        Some(stamp)
    }

    /// Issues a fresh note id.
    pub fn next_id(&mut self) -> Option<NoteId> {
        self.next_stamp()
    }
}

impl std::fmt::Debug for IdSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdSource")
            .field("last_issued", &self.last_issued)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::{Clock, IdSource, ManualClock, SystemClock};

    #[test]
    fn follows_clock_when_it_moves_forward() {
        let clock = ManualClock::new(1000);
        let mut ids = IdSource::new(clock.clone());
        assert_eq!(ids.next_id().unwrap(), 1000);
        clock.set(2500);
        assert_eq!(ids.next_id().unwrap(), 2500);
    }

    #[test]
    fn same_tick_yields_distinct_increasing_ids() {
        let clock = ManualClock::new(1000);
        let mut ids = IdSource::new(clock);
        let first = ids.next_id().unwrap();
        let second = ids.next_id().unwrap();
        let third = ids.next_id().unwrap();
        assert_eq!((first, second, third), (1000, 1001, 1002));
    }

    #[test]
    fn clock_going_backwards_never_reissues() {
        let clock = ManualClock::new(5000);
        let mut ids = IdSource::new(clock.clone());
        assert_eq!(ids.next_id().unwrap(), 5000);
        clock.set(10);
        assert_eq!(ids.next_id().unwrap(), 5001);
    }

    #[test]
    fn observe_raises_floor_above_existing_ids() {
        let clock = ManualClock::new(100);
        let mut ids = IdSource::new(clock);
        ids.observe(900);
        assert_eq!(ids.next_id().unwrap(), 901);
        ids.observe(50);
        assert_eq!(ids.next_id().unwrap(), 902);
    }

    #[test]
    fn exhausted_floor_stops_issuing() {
        let clock = ManualClock::new(100);
        let mut ids = IdSource::new(clock.clone());
        ids.observe(i64::MAX);
        assert_eq!(ids.next_id(), None);
        assert_eq!(ids.next_stamp(), None);

        clock.set(i64::MAX);
        assert_eq!(ids.next_id(), None);
    }

    #[test]
    fn system_clock_is_after_epoch() {
        assert!(SystemClock.now_millis() > 0);
    }
}
