//! Rate limiting logic and state management.

mod counter;
mod key;
mod limiter;
mod store;
mod sweep;

pub use counter::{CounterEntry, ResetWindow};
pub use key::{RateKey, Scope};
pub use limiter::{AdmissionController, Denial, DenialReason, LimitPolicy, Quota, Verdict};
pub use store::{EntryGuard, WindowedCounterStore};
pub use sweep::{EvictionSweep, SweepHandle, DEFAULT_SWEEP_INTERVAL};
