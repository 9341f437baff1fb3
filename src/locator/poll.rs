//! Bounded polling
//!
//! Every "wait until X is on screen" in the driver goes through
//! [`Poll::until`]. Running out of time is an [`Outcome`], not an error, so
//! each caller decides which error kind a timeout maps to.

use std::time::Duration;

use tokio::time::Instant;

/// Interval and deadline for one wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Poll {
    pub interval: Duration,
    pub timeout: Duration,
}

/// Result of a bounded wait
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome<T> {
    Ready(T),
    /// Deadline passed; carries the time actually waited
    Elapsed(Duration),
}

impl<T> Outcome<T> {
    pub fn ready(self) -> Option<T> {
        match self {
            Self::Ready(v) => Some(v),
            Self::Elapsed(_) => None,
        }
    }
}

impl Poll {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }

    /// Same interval, different deadline
    pub fn with_timeout(self, timeout: Duration) -> Self {
        Self { timeout, ..self }
    }

    /// Call `probe` until it yields a value, fails, or the deadline passes
    ///
    /// The probe always runs at least once, even with a zero timeout.
    pub async fn until<T, E, F>(&self, mut probe: F) -> Result<Outcome<T>, E>
    where
        F: FnMut() -> Result<Option<T>, E>,
    {
        let start = Instant::now();
        let deadline = start + self.timeout;

        loop {
            if let Some(value) = probe()? {
                return Ok(Outcome::Ready(value));
            }

            let now = Instant::now();
            if now >= deadline {
                return Ok(Outcome::Elapsed(now - start));
            }

            let remaining = deadline - now;
            tokio::time::sleep(self.interval.min(remaining)).await;
        }
    }
}
