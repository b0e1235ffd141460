//! Expiration deadlines
//!
//! Deadlines are wall-clock instants with millisecond precision. There is no
//! protection against the system clock moving: a backward jump can make an
//! expired entry valid again and a forward jump can expire one early.

use chrono::{DateTime, Duration, Utc};
use std::sync::atomic::{AtomicI64, Ordering};

/// Default time-to-live for entries written without an explicit one
pub const DEFAULT_TTL_SECS: i64 = 24 * 60 * 60;

/// Computes and checks entry deadlines for one cache instance
#[derive(Debug)]
pub struct ExpirationPolicy {
    /// Current default TTL in milliseconds
    default_ttl_ms: AtomicI64,
}

impl ExpirationPolicy {
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            default_ttl_ms: AtomicI64::new(default_ttl.num_milliseconds()),
        }
    }

    /// Policy with a default TTL in whole seconds, saturating at chrono's
    /// range instead of panicking
    pub fn from_secs(default_ttl_secs: i64) -> Self {
        let ttl = Duration::try_seconds(default_ttl_secs).unwrap_or(if default_ttl_secs < 0 {
            Duration::MIN
        } else {
            Duration::MAX
        });
        Self::new(ttl)
    }

    /// The TTL applied to writes that do not specify one
    pub fn default_ttl(&self) -> Duration {
        Duration::milliseconds(self.default_ttl_ms.load(Ordering::Relaxed))
    }

    /// Replace the default TTL; affects only later writes
    pub fn set_default_ttl(&self, ttl: Duration) {
        self.default_ttl_ms
            .store(ttl.num_milliseconds(), Ordering::Relaxed);
    }

    /// Deadline for an entry written at `now`.
    ///
    /// A zero or negative TTL yields a deadline that is already due. Results
    /// outside chrono's range saturate.
    pub fn compute_deadline(&self, now: DateTime<Utc>, ttl: Option<Duration>) -> DateTime<Utc> {
        let ttl = ttl.unwrap_or_else(|| self.default_ttl());
        now.checked_add_signed(ttl).unwrap_or(if ttl < Duration::zero() {
            DateTime::<Utc>::MIN_UTC
        } else {
            DateTime::<Utc>::MAX_UTC
        })
    }

    /// An entry is valid strictly before its deadline
    pub fn is_valid(deadline: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now < deadline
    }
}

impl Default for ExpirationPolicy {
    fn default() -> Self {
        Self::new(Duration::seconds(DEFAULT_TTL_SECS))
    }
}
