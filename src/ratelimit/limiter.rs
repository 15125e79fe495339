//! Admission controller applying the layered cooldown, hourly and daily policy.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration, FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::counter::ResetWindow;
use super::key::RateKey;
use super::store::WindowedCounterStore;
use crate::error::{GatekeeperError, Result};

/// Default minimum spacing between accepted requests on one endpoint.
const DEFAULT_COOLDOWN_MS: i64 = 3_000;
/// Default accepted requests per endpoint per hourly window.
const DEFAULT_MAX_PER_HOUR: u64 = 30;
/// Default accepted requests per subject per day, across endpoints.
const DEFAULT_MAX_PER_DAY: u64 = 100;
/// Longest hourly window accepted by [`LimitPolicy::validate`].
const MAX_HOUR_WINDOW_SECS: i64 = 24 * 60 * 60;

/// Limits enforced by the [`AdmissionController`].
///
/// Fixed for the lifetime of a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitPolicy {
    /// Minimum spacing between two accepted requests for the same endpoint
    pub cooldown: Duration,
    /// Maximum accepted requests per endpoint within one hourly window
    pub max_per_hour: u64,
    /// Length of the hourly window
    pub hour_window: Duration,
    /// Maximum accepted requests per subject per day
    pub max_per_day: u64,
    /// Zone whose midnight ends the daily window
    pub daily_reset_zone: FixedOffset,
}

impl Default for LimitPolicy {
    fn default() -> Self {
        Self {
            cooldown: Duration::milliseconds(DEFAULT_COOLDOWN_MS),
            max_per_hour: DEFAULT_MAX_PER_HOUR,
            hour_window: Duration::hours(1),
            max_per_day: DEFAULT_MAX_PER_DAY,
            daily_reset_zone: Utc.fix(),
        }
    }
}

impl LimitPolicy {
    /// Reject limits that would make the controller deny or admit everything.
    pub fn validate(&self) -> Result<()> {
        if self.max_per_hour == 0 {
            return Err(GatekeeperError::Config(
                "max_per_hour must be greater than zero".to_string(),
            ));
        }
        if self.max_per_day == 0 {
            return Err(GatekeeperError::Config(
                "max_per_day must be greater than zero".to_string(),
            ));
        }
        if self.hour_window <= Duration::zero() {
            return Err(GatekeeperError::Config(
                "hour_window must be positive".to_string(),
            ));
        }
        if self.hour_window > Duration::seconds(MAX_HOUR_WINDOW_SECS) {
            return Err(GatekeeperError::Config(format!(
                "hour_window must not exceed {} seconds",
                MAX_HOUR_WINDOW_SECS
            )));
        }
        if self.cooldown < Duration::zero() {
            return Err(GatekeeperError::Config(
                "cooldown must not be negative".to_string(),
            ));
        }
        Ok(())
    }

    fn hourly_window(&self) -> ResetWindow {
        ResetWindow::Rolling(self.hour_window)
    }

    fn daily_window(&self) -> ResetWindow {
        ResetWindow::Daily(self.daily_reset_zone)
    }
}

/// Why a request was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    /// The previous accepted request on this endpoint was too recent
    Cooldown,
    /// The endpoint's hourly cap is used up
    HourlyLimit { limit: u64 },
    /// The subject's daily cap is used up
    DailyLimit { limit: u64 },
}

impl DenialReason {
    /// Stable machine-readable identifier.
    pub fn code(&self) -> &'static str {
        match self {
            DenialReason::Cooldown => "cooldown",
            DenialReason::HourlyLimit { .. } => "hourly_limit",
            DenialReason::DailyLimit { .. } => "daily_limit",
        }
    }
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenialReason::Cooldown => {
                write!(f, "Please wait a few seconds between requests")
            }
            DenialReason::HourlyLimit { limit } => {
                write!(f, "Hourly limit of {} requests reached", limit)
            }
            DenialReason::DailyLimit { limit } => {
                write!(f, "Daily limit of {} requests reached", limit)
            }
        }
    }
}

/// A denied request: the reason and when it is worth retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Denial {
    pub reason: DenialReason,
    /// Whole seconds until the blocking condition clears, rounded up.
    ///
    /// Floored at 1, so a denial at the exact reset instant reports 1 where
    /// the plain ceiling would give 0.
    pub retry_after_secs: u64,
}

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The call may proceed; hourly and daily counters were incremented.
    Allowed,
    /// The call must not proceed; no counter was touched.
    Denied(Denial),
}

impl Verdict {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Verdict::Allowed)
    }

    /// Human-readable denial reason.
    pub fn reason(&self) -> Option<String> {
        match self {
            Verdict::Allowed => None,
            Verdict::Denied(denial) => Some(denial.reason.to_string()),
        }
    }

    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            Verdict::Allowed => None,
            Verdict::Denied(denial) => Some(denial.retry_after_secs),
        }
    }

    fn denied(reason: DenialReason, wait: Duration) -> Self {
        Verdict::Denied(Denial {
            reason,
            retry_after_secs: ceil_secs(wait),
        })
    }
}

/// Remaining requests in each window for one subject and endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quota {
    pub hourly: u64,
    pub daily: u64,
}

/// Round a wait up to whole seconds, never below one.
fn ceil_secs(wait: Duration) -> u64 {
    let millis = wait.num_milliseconds().max(0) as u64;
    millis.div_ceil(1000).max(1)
}

/// The admission controller guarding AI-backed endpoints.
///
/// This struct is thread-safe and can be shared across multiple tasks.
#[derive(Debug)]
pub struct AdmissionController {
    /// Counter state, shared with the eviction sweep
    store: Arc<WindowedCounterStore>,
    /// Limits applied to every check
    policy: LimitPolicy,
}

impl AdmissionController {
    /// Create a controller over an existing store.
    pub fn new(store: Arc<WindowedCounterStore>, policy: LimitPolicy) -> Self {
        Self { store, policy }
    }

    pub fn store(&self) -> &Arc<WindowedCounterStore> {
        &self.store
    }

    pub fn policy(&self) -> &LimitPolicy {
        &self.policy
    }

    /// Decide whether `subject` may call `endpoint` at `now`.
    ///
    /// Checks run in order cooldown, hourly cap, daily cap, and the first
    /// failing one decides. Counters are only incremented when every check
    /// passes. The endpoint counter stays locked for the whole decision and
    /// the daily counter is locked after it, so concurrent calls for the same
    /// key are serialized and can never both take the last slot.
    pub fn check_limit(&self, subject: &str, endpoint: &str, now: DateTime<Utc>) -> Verdict {
        let endpoint_key = RateKey::endpoint(subject, endpoint);

        trace!(key = %endpoint_key, now = %now, "Checking admission");

        let mut endpoint_entry = self
            .store
            .lock(&endpoint_key, self.policy.hourly_window(), now);

        if let Some(elapsed) = endpoint_entry.elapsed_since_acceptance(now) {
            if elapsed < self.policy.cooldown {
                let verdict = Verdict::denied(DenialReason::Cooldown, self.policy.cooldown - elapsed);
                debug!(key = %endpoint_key, verdict = ?verdict, "Cooldown active");
                return verdict;
            }
        }

        endpoint_entry.roll_if_expired(now);
        if endpoint_entry.count() >= self.policy.max_per_hour {
            let verdict = Verdict::denied(
                DenialReason::HourlyLimit {
                    limit: self.policy.max_per_hour,
                },
                endpoint_entry.until_reset(now),
            );
            debug!(key = %endpoint_key, verdict = ?verdict, "Hourly limit exceeded");
            return verdict;
        }

        let daily_key = RateKey::daily(subject);
        let mut daily_entry = self.store.lock(&daily_key, self.policy.daily_window(), now);

        daily_entry.roll_if_expired(now);
        if daily_entry.count() >= self.policy.max_per_day {
            let verdict = Verdict::denied(
                DenialReason::DailyLimit {
                    limit: self.policy.max_per_day,
                },
                daily_entry.until_reset(now),
            );
            debug!(key = %daily_key, verdict = ?verdict, "Daily limit exceeded");
            return verdict;
        }

        endpoint_entry.record_acceptance(now);
        daily_entry.record_acceptance(now);

        trace!(
            key = %endpoint_key,
            hourly_count = endpoint_entry.count(),
            daily_count = daily_entry.count(),
            "Request admitted"
        );

        Verdict::Allowed
    }

    /// Remaining requests for `subject` on `endpoint`.
    ///
    /// Read-only: windows are not rolled, so right after a window boundary
    /// the figure may be stale until the next [`check_limit`] normalizes it.
    /// Unseen keys report the full quota.
    ///
    /// [`check_limit`]: AdmissionController::check_limit
    pub fn remaining_quota(&self, subject: &str, endpoint: &str) -> Quota {
        let hourly_used = self
            .store
            .snapshot(&RateKey::endpoint(subject, endpoint))
            .map_or(0, |e| e.count());
        let daily_used = self
            .store
            .snapshot(&RateKey::daily(subject))
            .map_or(0, |e| e.count());

        Quota {
            hourly: self.policy.max_per_hour.saturating_sub(hourly_used),
            daily: self.policy.max_per_day.saturating_sub(daily_used),
        }
    }
}

impl Default for AdmissionController {
    fn default() -> Self {
        Self::new(Arc::new(WindowedCounterStore::new()), LimitPolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Barrier;
    use std::thread;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap()
    }

    fn at_ms(offset: i64) -> DateTime<Utc> {
        t0() + Duration::milliseconds(offset)
    }

    fn controller(policy: LimitPolicy) -> AdmissionController {
        AdmissionController::new(Arc::new(WindowedCounterStore::new()), policy)
    }

    fn no_cooldown(max_per_hour: u64, max_per_day: u64) -> LimitPolicy {
        LimitPolicy {
            cooldown: Duration::zero(),
            max_per_hour,
            max_per_day,
            ..LimitPolicy::default()
        }
    }

    #[test]
    fn test_first_request_allowed() {
        let limiter = AdmissionController::default();
        assert_eq!(limiter.check_limit("u1", "/chat", t0()), Verdict::Allowed);
        assert_eq!(limiter.store().len(), 2);
    }

    #[test]
    fn test_cooldown_enforcement() {
        let limiter = controller(LimitPolicy::default());

        assert_eq!(limiter.check_limit("u1", "/chat", at_ms(0)), Verdict::Allowed);

        let verdict = limiter.check_limit("u1", "/chat", at_ms(1000));
        assert_eq!(
            verdict,
            Verdict::Denied(Denial {
                reason: DenialReason::Cooldown,
                retry_after_secs: 2,
            })
        );
        assert_eq!(verdict.retry_after_secs(), Some(2));
        assert!(!verdict.is_allowed());
    }

    #[test]
    fn test_cooldown_is_per_endpoint() {
        let limiter = controller(LimitPolicy::default());

        assert!(limiter.check_limit("u1", "/chat", at_ms(0)).is_allowed());
        assert!(limiter.check_limit("u1", "/voice", at_ms(500)).is_allowed());
        assert!(limiter.check_limit("u2", "/chat", at_ms(500)).is_allowed());
    }

    #[test]
    fn test_denial_does_not_mutate_counters() {
        let limiter = controller(LimitPolicy::default());
        let key = RateKey::endpoint("u1", "/chat");

        limiter.check_limit("u1", "/chat", at_ms(0));
        let before = limiter.store().snapshot(&key).unwrap();
        let daily_before = limiter.store().snapshot(&RateKey::daily("u1")).unwrap();

        assert!(!limiter.check_limit("u1", "/chat", at_ms(1000)).is_allowed());

        assert_eq!(limiter.store().snapshot(&key).unwrap(), before);
        assert_eq!(
            limiter.store().snapshot(&RateKey::daily("u1")).unwrap(),
            daily_before
        );
    }

    #[test]
    fn test_hourly_boundary_reset() {
        let limiter = controller(LimitPolicy {
            max_per_hour: 2,
            ..LimitPolicy::default()
        });

        assert_eq!(limiter.check_limit("u1", "/chat", at_ms(0)), Verdict::Allowed);

        let verdict = limiter.check_limit("u1", "/chat", at_ms(1));
        assert_eq!(
            verdict,
            Verdict::Denied(Denial {
                reason: DenialReason::Cooldown,
                retry_after_secs: 3,
            })
        );

        assert_eq!(limiter.check_limit("u1", "/chat", at_ms(4000)), Verdict::Allowed);

        let verdict = limiter.check_limit("u1", "/chat", at_ms(8000));
        assert_eq!(
            verdict,
            Verdict::Denied(Denial {
                reason: DenialReason::HourlyLimit { limit: 2 },
                retry_after_secs: 3592,
            })
        );

        assert_eq!(
            limiter.check_limit("u1", "/chat", at_ms(3_600_001)),
            Verdict::Allowed
        );
        assert_eq!(limiter.remaining_quota("u1", "/chat").hourly, 1);
    }

    #[test]
    fn test_daily_independent_from_hourly() {
        let limiter = controller(LimitPolicy {
            max_per_hour: 2,
            max_per_day: 3,
            ..LimitPolicy::default()
        });

        assert!(limiter.check_limit("u1", "A", at_ms(0)).is_allowed());
        assert!(limiter.check_limit("u1", "A", at_ms(4000)).is_allowed());
        assert_eq!(
            limiter.check_limit("u1", "A", at_ms(8000)).reason(),
            Some("Hourly limit of 2 requests reached".to_string())
        );

        // Endpoint B has its own hourly counter but shares the daily one.
        assert_eq!(
            limiter.remaining_quota("u1", "B"),
            Quota { hourly: 2, daily: 1 }
        );
        assert!(limiter.check_limit("u1", "B", at_ms(8000)).is_allowed());

        let verdict = limiter.check_limit("u1", "B", at_ms(12_000));
        match verdict {
            Verdict::Denied(denial) => {
                assert_eq!(denial.reason, DenialReason::DailyLimit { limit: 3 });
                // t0 is 08:00 UTC, so the daily window ends 16 hours later.
                assert_eq!(denial.retry_after_secs, 16 * 3600 - 12);
            }
            Verdict::Allowed => panic!("daily cap should deny"),
        }

        // Another subject is unaffected.
        assert!(limiter.check_limit("u2", "B", at_ms(12_000)).is_allowed());
    }

    #[test]
    fn test_daily_window_resets_at_midnight() {
        let limiter = controller(no_cooldown(10, 1));
        let evening = Utc.with_ymd_and_hms(2026, 3, 2, 23, 59, 0).unwrap();

        assert!(limiter.check_limit("u1", "/chat", evening).is_allowed());
        assert_eq!(
            limiter.check_limit("u1", "/chat", evening + Duration::seconds(30)),
            Verdict::Denied(Denial {
                reason: DenialReason::DailyLimit { limit: 1 },
                retry_after_secs: 30,
            })
        );

        let after_midnight = Utc.with_ymd_and_hms(2026, 3, 3, 0, 0, 1).unwrap();
        assert!(limiter.check_limit("u1", "/chat", after_midnight).is_allowed());
    }

    #[test]
    fn test_remaining_quota_for_unseen_subject() {
        let limiter = controller(LimitPolicy::default());

        assert_eq!(
            limiter.remaining_quota("nobody", "/chat"),
            Quota {
                hourly: 30,
                daily: 100
            }
        );
        assert!(limiter.store().is_empty());
    }

    #[test]
    fn test_remaining_quota_does_not_roll() {
        let limiter = controller(no_cooldown(5, 50));
        let key = RateKey::endpoint("u1", "/chat");
        limiter.check_limit("u1", "/chat", at_ms(0));
        limiter.check_limit("u1", "/chat", at_ms(10));

        let before = limiter.store().snapshot(&key).unwrap();
        assert_eq!(limiter.remaining_quota("u1", "/chat").hourly, 3);
        assert_eq!(limiter.store().snapshot(&key).unwrap(), before);

        // The next check rolls the window and the quota catches up.
        assert!(limiter.check_limit("u1", "/chat", at_ms(3_600_001)).is_allowed());
        assert_eq!(limiter.remaining_quota("u1", "/chat").hourly, 4);
    }

    #[test]
    fn test_quota_reads_do_not_change_verdicts() {
        let policy = LimitPolicy {
            max_per_hour: 3,
            max_per_day: 5,
            ..LimitPolicy::default()
        };
        let events: Vec<(&str, i64)> = vec![
            ("A", 0),
            ("A", 1000),
            ("A", 3000),
            ("B", 3500),
            ("A", 6000),
            ("A", 9000),
            ("B", 9500),
            ("B", 13_000),
            ("A", 3_700_000),
        ];

        let plain = controller(policy);
        let expected: Vec<Verdict> = events
            .iter()
            .map(|(endpoint, t)| plain.check_limit("u1", endpoint, at_ms(*t)))
            .collect();

        let observed = controller(policy);
        let actual: Vec<Verdict> = events
            .iter()
            .map(|(endpoint, t)| {
                for _ in 0..3 {
                    observed.remaining_quota("u1", "A");
                    observed.remaining_quota("u1", "B");
                }
                observed.check_limit("u1", endpoint, at_ms(*t))
            })
            .collect();

        assert_eq!(expected, actual);
    }

    #[test]
    fn test_eviction_between_checks() {
        let limiter = controller(no_cooldown(5, 1));
        assert!(limiter.check_limit("u1", "/chat", t0()).is_allowed());
        // Denied on the daily cap, leaving an empty /voice counter behind.
        assert!(!limiter.check_limit("u1", "/voice", t0()).is_allowed());
        assert_eq!(limiter.store().len(), 3);

        let later = t0() + Duration::hours(2);
        assert_eq!(limiter.store().evict_expired_empty(later), 1);
        assert_eq!(limiter.store().evict_expired_empty(later), 0);
        assert_eq!(limiter.store().len(), 2);
        assert!(limiter
            .store()
            .snapshot(&RateKey::endpoint("u1", "/voice"))
            .is_none());

        assert_eq!(
            limiter.remaining_quota("u1", "/chat"),
            Quota {
                hourly: 4,
                daily: 0
            }
        );
    }

    #[test]
    fn test_end_to_end_hourly_scenario() {
        let limiter = controller(LimitPolicy {
            cooldown: Duration::milliseconds(3000),
            max_per_hour: 30,
            max_per_day: 100,
            ..LimitPolicy::default()
        });

        for i in 0..30 {
            let verdict = limiter.check_limit("u1", "/chat", at_ms(i * 3000));
            assert_eq!(verdict, Verdict::Allowed, "call {} should be allowed", i + 1);
        }

        let verdict = limiter.check_limit("u1", "/chat", at_ms(90_000));
        assert!(!verdict.is_allowed());
        assert!(verdict.reason().unwrap().contains("Hourly limit"));
        assert_eq!(verdict.retry_after_secs(), Some(3510));

        assert_eq!(
            limiter.remaining_quota("u1", "/chat"),
            Quota {
                hourly: 0,
                daily: 70
            }
        );
    }

    #[test]
    fn test_no_double_admission_under_contention() {
        const THREADS: usize = 32;
        const ALREADY_USED: u64 = 5;
        const MAX_PER_HOUR: u64 = 10;

        let limiter = controller(no_cooldown(MAX_PER_HOUR, 1000));
        for _ in 0..ALREADY_USED {
            assert!(limiter.check_limit("u1", "/chat", t0()).is_allowed());
        }

        let barrier = Barrier::new(THREADS);
        let allowed: usize = thread::scope(|scope| {
            let handles: Vec<_> = (0..THREADS)
                .map(|_| {
                    let limiter = &limiter;
                    let barrier = &barrier;
                    scope.spawn(move || {
                        barrier.wait();
                        limiter.check_limit("u1", "/chat", t0()).is_allowed()
                    })
                })
                .collect();

            handles
                .into_iter()
                .map(|h| h.join().unwrap())
                .filter(|allowed| *allowed)
                .count()
        });

        assert_eq!(allowed as u64, MAX_PER_HOUR - ALREADY_USED);
        assert_eq!(limiter.remaining_quota("u1", "/chat").hourly, 0);
    }

    #[test]
    fn test_no_double_admission_on_shared_daily_counter() {
        const THREADS: usize = 24;
        const MAX_PER_DAY: u64 = 7;

        let limiter = controller(no_cooldown(100, MAX_PER_DAY));
        let barrier = Barrier::new(THREADS);

        let allowed: usize = thread::scope(|scope| {
            let handles: Vec<_> = (0..THREADS)
                .map(|i| {
                    let limiter = &limiter;
                    let barrier = &barrier;
                    scope.spawn(move || {
                        let endpoint = format!("/endpoint-{}", i % 4);
                        barrier.wait();
                        limiter.check_limit("u1", &endpoint, t0()).is_allowed()
                    })
                })
                .collect();

            handles
                .into_iter()
                .map(|h| h.join().unwrap())
                .filter(|allowed| *allowed)
                .count()
        });

        assert_eq!(allowed as u64, MAX_PER_DAY);
        assert_eq!(limiter.remaining_quota("u1", "/endpoint-0").daily, 0);
    }

    #[test]
    fn test_no_double_admission_while_sweeping() {
        const THREADS: usize = 16;
        const CALLS_PER_THREAD: usize = 5;
        const MAX_PER_HOUR: u64 = 10;

        let limiter = controller(no_cooldown(MAX_PER_HOUR, 1000));
        let store = Arc::clone(limiter.store());
        let sweep_at = t0() + Duration::hours(5);
        let barrier = Barrier::new(THREADS + 1);
        let done = AtomicBool::new(false);

        let allowed: usize = thread::scope(|scope| {
            let sweeper = {
                let (store, barrier, done) = (&store, &barrier, &done);
                scope.spawn(move || {
                    barrier.wait();
                    let mut evicted = 0;
                    while !done.load(Ordering::Acquire) {
                        evicted += store.evict_expired_empty(sweep_at);
                    }
                    evicted
                })
            };

            let handles: Vec<_> = (0..THREADS)
                .map(|_| {
                    let limiter = &limiter;
                    let barrier = &barrier;
                    scope.spawn(move || {
                        barrier.wait();
                        (0..CALLS_PER_THREAD)
                            .filter(|_| limiter.check_limit("u1", "/chat", t0()).is_allowed())
                            .count()
                    })
                })
                .collect();

            let allowed = handles.into_iter().map(|h| h.join().unwrap()).sum::<usize>();
            done.store(true, Ordering::Release);
            sweeper.join().unwrap();
            allowed
        });

        assert_eq!(allowed as u64, MAX_PER_HOUR);
        assert_eq!(limiter.remaining_quota("u1", "/chat").hourly, 0);
    }

    #[test]
    fn test_replay_is_deterministic() {
        let events: Vec<(&str, &str, i64)> = vec![
            ("u1", "/chat", 0),
            ("u1", "/chat", 100),
            ("u2", "/chat", 200),
            ("u1", "/voice", 300),
            ("u1", "/chat", 3100),
            ("u1", "/chat", 6200),
        ];
        let policy = LimitPolicy {
            max_per_hour: 2,
            ..LimitPolicy::default()
        };

        let run = || {
            let limiter = controller(policy);
            events
                .iter()
                .map(|(subject, endpoint, t)| limiter.check_limit(subject, endpoint, at_ms(*t)))
                .collect::<Vec<_>>()
        };

        assert_eq!(run(), run());
    }

    #[test]
    fn test_policy_validation() {
        assert!(LimitPolicy::default().validate().is_ok());
        assert!(no_cooldown(1, 1).validate().is_ok());

        let bad = [
            LimitPolicy {
                max_per_hour: 0,
                ..LimitPolicy::default()
            },
            LimitPolicy {
                max_per_day: 0,
                ..LimitPolicy::default()
            },
            LimitPolicy {
                hour_window: Duration::zero(),
                ..LimitPolicy::default()
            },
            LimitPolicy {
                hour_window: Duration::seconds(MAX_HOUR_WINDOW_SECS + 1),
                ..LimitPolicy::default()
            },
            LimitPolicy {
                cooldown: Duration::milliseconds(-1),
                ..LimitPolicy::default()
            },
        ];
        for policy in bad {
            assert!(matches!(policy.validate(), Err(GatekeeperError::Config(_))));
        }
    }

    #[test]
    fn test_retry_after_rounding() {
        assert_eq!(ceil_secs(Duration::milliseconds(2000)), 2);
        assert_eq!(ceil_secs(Duration::milliseconds(2001)), 3);
        assert_eq!(ceil_secs(Duration::milliseconds(1)), 1);
        assert_eq!(ceil_secs(Duration::zero()), 1);
    }
}
