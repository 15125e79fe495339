//! Rate limit counter implementation.

use chrono::{DateTime, Duration, FixedOffset, NaiveTime, Offset, TimeZone, Utc};

/// How a counter's window advances once it expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetWindow {
    /// Window of fixed length starting at creation or last reset.
    Rolling(Duration),
    /// Window ending at the next midnight in a fixed reference zone.
    Daily(FixedOffset),
}

impl ResetWindow {
    /// An hour-long rolling window.
    pub fn hourly() -> Self {
        ResetWindow::Rolling(Duration::hours(1))
    }

    /// A daily window resetting at UTC midnight.
    pub fn daily_utc() -> Self {
        ResetWindow::Daily(Utc.fix())
    }

    /// Compute the reset timestamp for a window opened at `now`.
    ///
    /// Always strictly after `now`.
    pub fn next_reset_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            ResetWindow::Rolling(length) => now + *length,
            ResetWindow::Daily(zone) => next_midnight(now, zone),
        }
    }
}

/// Next midnight strictly after `now`, in the given zone.
///
/// Truncates to midnight of the same calendar day and adds one day. A fixed
/// offset has no daylight-saving gaps, so the local time always maps back.
fn next_midnight(now: DateTime<Utc>, zone: &FixedOffset) -> DateTime<Utc> {
    let local = now.with_timezone(zone);
    let next = local.date_naive().and_time(NaiveTime::MIN) + Duration::days(1);

    match zone.from_local_datetime(&next).single() {
        Some(midnight) => midnight.with_timezone(&Utc),
        None => now + Duration::days(1),
    }
}

/// A counter tracking accepted requests within a time window.
///
/// Entries carry no lock of their own; the store wraps each one in a mutex
/// and every mutation happens while it is held.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterEntry {
    /// Accepted requests in the current window
    count: u64,
    /// When the current window ends
    window_reset_at: DateTime<Utc>,
    /// Most recent acceptance, `None` until the first one
    last_accepted_at: Option<DateTime<Utc>>,
    /// Reset rule for this counter
    window: ResetWindow,
    /// Set once the entry has been evicted from the store
    retired: bool,
}

impl CounterEntry {
    /// Create an empty counter whose window opens at `now`.
    pub fn new(window: ResetWindow, now: DateTime<Utc>) -> Self {
        Self {
            count: 0,
            window_reset_at: window.next_reset_after(now),
            last_accepted_at: None,
            window,
            retired: false,
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn window_reset_at(&self) -> DateTime<Utc> {
        self.window_reset_at
    }

    pub fn last_accepted_at(&self) -> Option<DateTime<Utc>> {
        self.last_accepted_at
    }

    /// Whether the current window has ended.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.window_reset_at
    }

    /// Whether the sweep may drop this entry without losing demand.
    pub fn is_evictable(&self, now: DateTime<Utc>) -> bool {
        self.count == 0 && self.is_expired(now)
    }

    /// Time since the last acceptance, or `None` if nothing was ever accepted.
    pub fn elapsed_since_acceptance(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.last_accepted_at.map(|at| now - at)
    }

    /// Time remaining until the window resets, never negative.
    pub fn until_reset(&self, now: DateTime<Utc>) -> Duration {
        (self.window_reset_at - now).max(Duration::zero())
    }

    /// Start a fresh window if the current one has ended.
    ///
    /// Returns `true` if a reset happened. After a reset `now` lies inside
    /// the new window, so repeated calls with the same `now` do nothing.
    pub fn roll_if_expired(&mut self, now: DateTime<Utc>) -> bool {
        if !self.is_expired(now) {
            return false;
        }

        self.count = 0;
        self.window_reset_at = self.window.next_reset_after(now);
        true
    }

    /// Count an admitted request.
    pub fn record_acceptance(&mut self, now: DateTime<Utc>) {
        self.count += 1;
        self.last_accepted_at = Some(now);
    }

    pub(crate) fn retire(&mut self) {
        self.retired = true;
    }

    pub(crate) fn is_retired(&self) -> bool {
        self.retired
    }
}
