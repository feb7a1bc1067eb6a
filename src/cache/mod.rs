//! Cache module for short-lived LMS responses
//!
//! This module provides an in-memory response cache keyed by call type
//! (e.g. `"classes"`, `"all_assignments"`) with a fixed TTL (time-to-live).
//! Entries expire lazily: freshness is only checked when an entry is read,
//! and nothing evicts in the background. The clock is injectable so expiry
//! can be tested deterministically.

mod clock;
mod manager;

pub use clock::{Clock, ManualClock, SystemClock};
pub use manager::{CacheStats, ResponseCache, DEFAULT_TTL_SECS};
