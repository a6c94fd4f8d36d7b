//! Wall-clock source for the scheduler

use chrono::{DateTime, Utc};

/// Source of "now"
///
/// The dispatcher converts occurrence instants into tokio sleeps using this
/// clock, so a clock that follows tokio's time keeps both views in step.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;
}

/// The system wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock anchored at a fixed instant that advances with tokio's clock
///
/// Under `tokio::time::pause` this moves only when the runtime auto-advances
/// or the test calls `tokio::time::advance`.
#[derive(Debug, Clone, Copy)]
pub struct TokioClock {
    anchor: DateTime<Utc>,
    started: tokio::time::Instant,
}

impl TokioClock {
    pub fn starting_at(anchor: DateTime<Utc>) -> Self {
        Self {
            anchor,
            started: tokio::time::Instant::now(),
        }
    }
}

impl Clock for TokioClock {
    fn now(&self) -> DateTime<Utc> {
        let elapsed = self.started.elapsed();
        match chrono::Duration::from_std(elapsed) {
            Ok(delta) => self.anchor + delta,
            Err(_) => self.anchor,
        }
    }
}
