//! Expiry Policy Module
//!
//! Single source of truth for turning a relative TTL into an absolute expiry
//! and for deciding whether a stored record is still live. Timestamps are
//! Unix seconds; an expiry of `0` means the record never expires.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Expiry sentinel for records that never expire.
pub const NEVER_EXPIRES: u64 = 0;

// == Compute Expiry ==
/// Returns `now + ttl`, or `NEVER_EXPIRES` when the TTL is absent or not positive.
pub fn compute_expiry(ttl_seconds: Option<i64>, now: u64) -> u64 {
    match ttl_seconds {
        Some(ttl) if ttl > 0 => now.saturating_add(ttl as u64),
        _ => NEVER_EXPIRES,
    }
}

// == Is Live ==
/// A record is live while `expiry == 0` or `expiry >= now`.
pub fn is_live(expiry: u64, now: u64) -> bool {
    expiry == NEVER_EXPIRES || expiry >= now
}

// == Clock ==
/// Source of the current Unix time in seconds.
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> u64;
}

/// Wall clock backed by `chrono::Utc`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        chrono::Utc::now().timestamp().max(0) as u64
    }
}

/// Manually driven clock. Clones share the same instant.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start: u64) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start)),
        }
    }

    pub fn set(&self, now: u64) {
        self.now.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, seconds: u64) {
        self.now.fetch_add(seconds, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_expiry_without_ttl() {
        assert_eq!(compute_expiry(None, 1_000), NEVER_EXPIRES);
    }

    #[test]
    fn test_compute_expiry_non_positive_ttl() {
        assert_eq!(compute_expiry(Some(0), 1_000), NEVER_EXPIRES);
        assert_eq!(compute_expiry(Some(-5), 1_000), NEVER_EXPIRES);
    }

    #[test]
    fn test_compute_expiry_positive_ttl() {
        assert_eq!(compute_expiry(Some(60), 1_000), 1_060);
    }

    #[test]
    fn test_is_live_boundary() {
        let expiry = compute_expiry(Some(10), 100);
        assert!(is_live(expiry, 100));
        assert!(is_live(expiry, 109));
        // Inclusive at the expiry second itself
        assert!(is_live(expiry, 110));
        assert!(!is_live(expiry, 111));
    }

    #[test]
    fn test_never_expires_is_always_live() {
        assert!(is_live(NEVER_EXPIRES, 0));
        assert!(is_live(NEVER_EXPIRES, 1_000_000_000 + 1_700_000_000));
    }

    #[test]
    fn test_manual_clock_shared_between_clones() {
        let clock = ManualClock::new(50);
        let other = clock.clone();
        clock.advance(10);
        assert_eq!(other.now(), 60);
        other.set(5);
        assert_eq!(clock.now(), 5);
    }

    #[test]
    fn test_system_clock_is_recent() {
        // 2020-01-01T00:00:00Z
        assert!(SystemClock.now() > 1_577_836_800);
    }
}
