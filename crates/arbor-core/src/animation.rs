#![forbid(unsafe_code)]

//! Time-based animation primitives.
//!
//! Animations are driven by explicit `tick(dt)` calls from the host's frame
//! scheduler; nothing here reads a clock. That keeps every transition
//! deterministic under test: feed the same deltas, get the same values.

use std::time::Duration;

// ---------------------------------------------------------------------------
// Easing functions
// ---------------------------------------------------------------------------

/// Easing function signature: maps `t` in [0, 1] to output in [0, 1].
pub type EasingFn = fn(f64) -> f64;

/// Identity easing (constant velocity).
#[inline]
pub fn linear(t: f64) -> f64 {
    t.clamp(0.0, 1.0)
}

/// Quadratic ease-in-out (slow start and end).
#[inline]
pub fn ease_in_out(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        2.0 * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
    }
}

/// Cubic ease-in-out. Default curve for layout transitions.
#[inline]
pub fn ease_in_out_cubic(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

// ---------------------------------------------------------------------------
// Animation trait
// ---------------------------------------------------------------------------

/// A time-based animation producing values in [0.0, 1.0].
pub trait Animation {
    /// Advance the animation by `dt`.
    fn tick(&mut self, dt: Duration);

    /// Whether the animation has reached its end.
    fn is_complete(&self) -> bool;

    /// Current output value, clamped to [0.0, 1.0].
    fn value(&self) -> f64;

    /// Reset the animation to its initial state.
    fn reset(&mut self);

    /// Time elapsed past completion.
    fn overshoot(&self) -> Duration {
        Duration::ZERO
    }
}

// ---------------------------------------------------------------------------
// Tween
// ---------------------------------------------------------------------------

/// Eased progression from 0.0 to 1.0 over a fixed duration.
///
/// Elapsed time is accumulated as a [`Duration`], so many small ticks sum
/// exactly and completion is decided without float comparison.
#[derive(Debug, Clone, Copy)]
pub struct Tween {
    elapsed: Duration,
    duration: Duration,
    easing: EasingFn,
}

impl Tween {
    /// Create a tween with linear easing. A zero duration is bumped to one
    /// nanosecond so the first non-zero tick completes it.
    #[must_use]
    pub fn new(duration: Duration) -> Self {
        Self {
            elapsed: Duration::ZERO,
            duration: if duration.is_zero() {
                Duration::from_nanos(1)
            } else {
                duration
            },
            easing: linear,
        }
    }

    /// Set the easing function.
    #[must_use]
    pub fn easing(mut self, easing: EasingFn) -> Self {
        self.easing = easing;
        self
    }

    /// Raw linear progress (before easing), in [0.0, 1.0].
    #[must_use]
    pub fn raw_progress(&self) -> f64 {
        (self.elapsed.as_secs_f64() / self.duration.as_secs_f64()).clamp(0.0, 1.0)
    }

    #[must_use]
    pub const fn duration(&self) -> Duration {
        self.duration
    }

    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

impl Animation for Tween {
    fn tick(&mut self, dt: Duration) {
        self.elapsed = self.elapsed.saturating_add(dt);
    }

    fn is_complete(&self) -> bool {
        self.elapsed >= self.duration
    }

    fn value(&self) -> f64 {
        (self.easing)(self.raw_progress())
    }

    fn reset(&mut self) {
        self.elapsed = Duration::ZERO;
    }

    fn overshoot(&self) -> Duration {
        self.elapsed.saturating_sub(self.duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS_16: Duration = Duration::from_millis(16);
    const MS_400: Duration = Duration::from_millis(400);
    const MS_800: Duration = Duration::from_millis(800);

    #[test]
    fn easing_endpoints() {
        for f in [linear, ease_in_out, ease_in_out_cubic] {
            assert!(f(0.0).abs() < f64::EPSILON);
            assert!((f(1.0) - 1.0).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn easing_clamps_out_of_range_input() {
        assert!(ease_in_out_cubic(-3.0).abs() < f64::EPSILON);
        assert!((ease_in_out_cubic(7.0) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn cubic_is_symmetric_about_midpoint() {
        assert!((ease_in_out_cubic(0.5) - 0.5).abs() < 1e-12);
        for i in 1..10 {
            let t = f64::from(i) / 20.0;
            let lhs = ease_in_out_cubic(t);
            let rhs = 1.0 - ease_in_out_cubic(1.0 - t);
            assert!((lhs - rhs).abs() < 1e-12, "t={t}");
        }
    }

    #[test]
    fn cubic_is_monotonic() {
        let mut prev = 0.0;
        for i in 0..=100 {
            let v = ease_in_out_cubic(f64::from(i) / 100.0);
            assert!(v >= prev);
            prev = v;
        }
    }

    #[test]
    fn tween_progresses_and_completes() {
        let mut tween = Tween::new(MS_800).easing(ease_in_out_cubic);
        assert!(!tween.is_complete());
        tween.tick(MS_400);
        assert!((tween.value() - 0.5).abs() < 1e-9);
        tween.tick(MS_400);
        assert!(tween.is_complete());
        assert!((tween.value() - 1.0).abs() < f64::EPSILON);
        assert_eq!(tween.overshoot(), Duration::ZERO);
    }

    #[test]
    fn tween_reports_overshoot() {
        let mut tween = Tween::new(MS_16);
        tween.tick(MS_400);
        assert_eq!(tween.overshoot(), MS_400 - MS_16);
        tween.reset();
        assert_eq!(tween.elapsed(), Duration::ZERO);
    }

    #[test]
    fn zero_duration_completes_on_first_tick() {
        let mut tween = Tween::new(Duration::ZERO);
        assert!(!tween.is_complete());
        tween.tick(Duration::from_nanos(1));
        assert!(tween.is_complete());
    }
}
