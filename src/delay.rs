use std::thread::sleep;
use std::time::{Duration, Instant};

/// Tracks the mandatory quiet interval after a DDC/CI command.
///
/// The DDC/CI specification requires a minimum delay between two consecutive
/// commands on the same channel. A `Delay` remembers when the previous
/// command was sent and can wait out whatever portion of the interval still
/// remains.
#[derive(Clone, Debug, Default)]
pub struct Delay {
    since: Option<Instant>,
    interval: Duration,
}

impl Delay {
    /// Starts a new delay interval beginning now.
    pub fn new(interval: Duration) -> Self {
        Delay {
            since: Some(Instant::now()),
            interval,
        }
    }

    /// Waits out the remaining time in this delay, then clears it.
    pub fn sleep(&mut self) {
        if let Some(remaining) = self
            .since
            .take()
            .and_then(|since| self.interval.checked_sub(since.elapsed()))
        {
            sleep(remaining);
        }
    }
}
