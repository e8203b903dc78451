//! Injectable time sources.
//!
//! Everything that stamps or compares times goes through [`Clock`], so the
//! recorder can be driven deterministically in tests and accelerated in
//! demos. Times are epoch milliseconds.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

/// Milliseconds per second.
pub const MS_PER_SEC: i64 = 1_000;

/// A source of "now" in epoch milliseconds.
pub trait Clock: Send + Sync {
    /// Current time in epoch milliseconds.
    fn now_ms(&self) -> i64;
}

/// Wall clock backed by `chrono::Utc`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Whether `scale` is usable as an acceleration factor: finite and > 0.
#[must_use]
pub fn is_valid_scale(scale: f64) -> bool {
    scale.is_finite() && scale > 0.0
}

/// A clock that runs `scale` times faster than its inner clock.
///
/// Time is anchored at construction: `now = origin + (inner_now - origin) * scale`.
/// A scale of 1.0 reproduces the inner clock exactly.
pub struct ScaledClock {
    inner: Arc<dyn Clock>,
    origin_ms: i64,
    scale: f64,
}

impl ScaledClock {
    /// Wrap `inner`, anchoring at its current reading.
    ///
    /// Returns `None` unless [`is_valid_scale`] holds; a zero, negative or
    /// NaN scale would freeze or reverse time.
    #[must_use]
    pub fn new(inner: Arc<dyn Clock>, scale: f64) -> Option<Self> {
        if !is_valid_scale(scale) {
            return None;
        }
        let origin_ms = inner.now_ms();
        Some(Self {
            inner,
            origin_ms,
            scale,
        })
    }

    /// Scaled wall clock.
    #[must_use]
    pub fn system(scale: f64) -> Option<Self> {
        Self::new(Arc::new(SystemClock), scale)
    }

    /// The acceleration factor.
    #[must_use]
    pub fn scale(&self) -> f64 {
        self.scale
    }
}

impl Clock for ScaledClock {
    fn now_ms(&self) -> i64 {
        let elapsed = self.inner.now_ms().saturating_sub(self.origin_ms);
        if (self.scale - 1.0).abs() < f64::EPSILON {
            return self.origin_ms.saturating_add(elapsed);
        }
        let scaled = (elapsed as f64 * self.scale).round() as i64;
        self.origin_ms.saturating_add(scaled)
    }
}

impl std::fmt::Debug for ScaledClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScaledClock")
            .field("origin_ms", &self.origin_ms)
            .field("scale", &self.scale)
            .finish()
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now_ms: AtomicI64,
}

impl ManualClock {
    /// Start at `start_ms`.
    #[must_use]
    pub fn new(start_ms: i64) -> Self {
        Self {
            now_ms: AtomicI64::new(start_ms),
        }
    }

    /// Jump to an absolute time.
    pub fn set_ms(&self, now_ms: i64) {
        self.now_ms.store(now_ms, Ordering::SeqCst);
    }

    /// Jump to an absolute time given in whole seconds.
    pub fn set_secs(&self, secs: i64) {
        self.set_ms(secs.saturating_mul(MS_PER_SEC));
    }

    /// Move forward (or backward, for negative deltas).
    pub fn advance_ms(&self, delta_ms: i64) {
        self.now_ms.fetch_add(delta_ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now_ms(&self) -> i64 {
        (**self).now_ms()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_is_after_2020() {
        // 2020-01-01T00:00:00Z
        assert!(SystemClock.now_ms() > 1_577_836_800_000);
    }

    #[test]
    fn manual_clock_set_and_advance() {
        let clock = ManualClock::new(500);
        assert_eq!(clock.now_ms(), 500);
        clock.advance_ms(250);
        assert_eq!(clock.now_ms(), 750);
        clock.set_secs(3);
        assert_eq!(clock.now_ms(), 3_000);
    }

    #[test]
    fn scaled_clock_accelerates_elapsed_time() {
        let inner = Arc::new(ManualClock::new(10_000));
        let scaled = ScaledClock::new(inner.clone(), 10.0).unwrap();
        assert_eq!(scaled.now_ms(), 10_000);

        inner.advance_ms(1_500);
        assert_eq!(scaled.now_ms(), 10_000 + 15_000);
    }

    #[test]
    fn scaled_clock_identity_scale() {
        let inner = Arc::new(ManualClock::new(42));
        let scaled = ScaledClock::new(inner.clone(), 1.0).unwrap();
        inner.advance_ms(7);
        assert_eq!(scaled.now_ms(), 49);
        assert!((scaled.scale() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn scaled_clock_rejects_unusable_scales() {
        let inner: Arc<dyn Clock> = Arc::new(ManualClock::new(0));
        for scale in [0.0, -2.0, f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(
                ScaledClock::new(inner.clone(), scale).is_none(),
                "accepted scale {scale}"
            );
        }
        assert!(ScaledClock::new(inner, 0.5).is_some());
        assert!(ScaledClock::system(-1.0).is_none());
    }

    #[test]
    fn arc_clock_delegates() {
        let clock: Arc<dyn Clock> = Arc::new(ManualClock::new(9));
        assert_eq!(clock.now_ms(), 9);
    }
}
