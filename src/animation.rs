//! Settle spring and header fade animations
//!
//! Both animations are driven by explicit frame deltas rather than reading
//! the clock themselves, so the host's frame loop (or a test) decides how
//! time advances.

use std::time::Duration;

/// Largest integration step for the spring, keeps it stable at low frame rates
const MAX_SPRING_STEP: f64 = 1.0 / 240.0;

/// Envelope decay the spring reaches by the end of its duration
const SETTLE_DECAY: f64 = 1000.0;

/// Parameters of a duration-based damped spring
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpringSpec {
    pub duration: Duration,
    /// 1.0 = critically damped, below 1.0 overshoots
    pub damping_ratio: f64,
    /// Initial velocity in units of the total distance per second
    pub initial_velocity: f64,
}

impl SpringSpec {
    /// Natural frequency that lets the envelope decay by `SETTLE_DECAY`
    /// within the duration
    fn natural_frequency(&self) -> f64 {
        let secs = self.duration.as_secs_f64().max(f64::EPSILON);
        SETTLE_DECAY.ln() / (self.damping_ratio.min(1.0) * secs)
    }
}

/// A damped spring moving a scalar from `from` to `to`
///
/// The value is tracked as progress (0.0 at `from`, 1.0 at `to`) so the
/// spring behaves the same regardless of distance. Once the duration has
/// elapsed the value snaps to the target.
#[derive(Debug, Clone)]
pub struct SpringAnimation {
    from: f64,
    to: f64,
    spec: SpringSpec,
    stiffness: f64,
    damping: f64,
    progress: f64,
    velocity: f64,
    elapsed: f64,
}

impl SpringAnimation {
    pub fn new(from: f64, to: f64, spec: SpringSpec) -> Self {
        let omega = spec.natural_frequency();
        Self {
            from,
            to,
            spec,
            stiffness: omega * omega,
            damping: 2.0 * spec.damping_ratio * omega,
            progress: 0.0,
            velocity: spec.initial_velocity,
            elapsed: 0.0,
        }
    }

    pub fn target(&self) -> f64 {
        self.to
    }

    pub fn value(&self) -> f64 {
        if self.is_finished() {
            return self.to;
        }
        self.from + (self.to - self.from) * self.progress
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.spec.duration.as_secs_f64()
    }

    /// Advance by `dt` and return the new value
    pub fn tick(&mut self, dt: Duration) -> f64 {
        let total = self.spec.duration.as_secs_f64();
        let mut remaining = dt.as_secs_f64().min(total - self.elapsed).max(0.0);

        // Semi-implicit Euler: F = -k * displacement - c * velocity
        while remaining > 0.0 {
            let step = remaining.min(MAX_SPRING_STEP);
            let displacement = self.progress - 1.0;
            let force = -self.stiffness * displacement - self.damping * self.velocity;
            self.velocity += force * step;
            self.progress += self.velocity * step;
            remaining -= step;
        }

        self.elapsed = (self.elapsed + dt.as_secs_f64()).min(total);
        if self.is_finished() {
            self.progress = 1.0;
            self.velocity = 0.0;
        }
        self.value()
    }
}

/// Linear fade of an alpha value
#[derive(Debug, Clone)]
pub struct Fade {
    from: f64,
    to: f64,
    duration: f64,
    elapsed: f64,
}

impl Fade {
    pub fn new(from: f64, to: f64, duration: Duration) -> Self {
        Self {
            from,
            to,
            duration: duration.as_secs_f64(),
            elapsed: 0.0,
        }
    }

    pub fn target(&self) -> f64 {
        self.to
    }

    pub fn value(&self) -> f64 {
        if self.duration <= 0.0 {
            return self.to;
        }
        let t = (self.elapsed / self.duration).clamp(0.0, 1.0);
        self.from + (self.to - self.from) * t
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }

    pub fn tick(&mut self, dt: Duration) -> f64 {
        self.elapsed = (self.elapsed + dt.as_secs_f64()).min(self.duration.max(0.0));
        self.value()
    }
}
