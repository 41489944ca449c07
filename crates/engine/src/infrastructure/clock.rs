//! Clock and random implementations.

use crate::infrastructure::ports::{ClockPort, RandomPort};
use chrono::{DateTime, Utc};

/// System clock - uses real time.
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockPort for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// System random - uses real randomness.
pub struct SystemRandom;

impl SystemRandom {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SystemRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomPort for SystemRandom {
    fn gen_float(&self, upper: f64) -> f64 {
        use rand::Rng;
        if !upper.is_finite() || upper <= 0.0 {
            return 0.0;
        }
        rand::thread_rng().gen_range(0.0..upper)
    }

    fn gen_index(&self, len: usize) -> usize {
        use rand::Rng;
        if len == 0 {
            return 0;
        }
        rand::thread_rng().gen_range(0..len)
    }
}

/// Fixed clock for testing.
#[cfg(test)]
pub struct FixedClock(pub DateTime<Utc>);

#[cfg(test)]
impl ClockPort for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Fixed random for testing.
///
/// `gen_float` returns `fraction` of the requested upper bound; `gen_index`
/// returns `index` clamped to the last valid slot.
#[cfg(test)]
pub struct FixedRandom {
    pub fraction: f64,
    pub index: usize,
}

#[cfg(test)]
impl RandomPort for FixedRandom {
    fn gen_float(&self, upper: f64) -> f64 {
        upper * self.fraction
    }

    fn gen_index(&self, len: usize) -> usize {
        self.index.min(len.saturating_sub(1))
    }
}
