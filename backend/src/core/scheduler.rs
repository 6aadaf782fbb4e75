//! Tick scheduling capability
//!
//! The clock never drives itself. After every tick it asks its scheduler
//! for "one more frame", and the host delivers frames by calling
//! `SimulationClock::on_frame` with a timestamp. The same clock logic runs
//! under a real timer or under a manual pump in tests.

use std::time::{Duration, Instant};

/// Something that can deliver the next frame to the clock
pub trait TickScheduler {
    /// Request one more frame
    fn schedule_next(&mut self);

    /// Drop any outstanding request
    fn cancel(&mut self);

    /// Consume the outstanding request, returning whether there was one
    ///
    /// Called by the clock when a frame arrives; frames that arrive without
    /// a request are ignored.
    fn take_pending(&mut self) -> bool;

    /// Whether a frame has been requested and not yet delivered
    fn is_pending(&self) -> bool;
}

/// Scheduler pumped explicitly by the caller
///
/// Used by tests, the CLI and the host binding: the caller decides the frame
/// timestamps, which makes clock runs fully deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ManualScheduler {
    pending: bool,
    requests: u64,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of frames requested so far
    pub fn requests(&self) -> u64 {
        self.requests
    }
}

impl TickScheduler for ManualScheduler {
    fn schedule_next(&mut self) {
        self.pending = true;
        self.requests += 1;
    }

    fn cancel(&mut self) {
        self.pending = false;
    }

    fn take_pending(&mut self) -> bool {
        std::mem::take(&mut self.pending)
    }

    fn is_pending(&self) -> bool {
        self.pending
    }
}

/// Scheduler backed by the wall clock
///
/// `wait_for_frame` blocks until the next frame is due and returns its
/// timestamp in seconds since the scheduler was created.
#[derive(Debug, Clone)]
pub struct FrameScheduler {
    origin: Instant,
    frame_interval: Duration,
    pending: bool,
}

impl FrameScheduler {
    /// Create a scheduler producing frames every `frame_interval`
    pub fn new(frame_interval: Duration) -> Self {
        Self {
            origin: Instant::now(),
            frame_interval,
            pending: false,
        }
    }

    /// Seconds since the scheduler was created
    pub fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }

    /// Sleep one frame interval and return the frame timestamp
    pub fn wait_for_frame(&self) -> f64 {
        std::thread::sleep(self.frame_interval);
        self.now()
    }
}

impl TickScheduler for FrameScheduler {
    fn schedule_next(&mut self) {
        self.pending = true;
    }

    fn cancel(&mut self) {
        self.pending = false;
    }

    fn take_pending(&mut self) -> bool {
        std::mem::take(&mut self.pending)
    }

    fn is_pending(&self) -> bool {
        self.pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_scheduler_request_is_consumed_once() {
        let mut scheduler = ManualScheduler::new();
        assert!(!scheduler.take_pending());

        scheduler.schedule_next();
        assert!(scheduler.is_pending());
        assert!(scheduler.take_pending());
        assert!(!scheduler.take_pending());
        assert_eq!(scheduler.requests(), 1);
    }

    #[test]
    fn test_cancel_drops_request() {
        let mut scheduler = ManualScheduler::new();
        scheduler.schedule_next();
        scheduler.cancel();
        assert!(!scheduler.is_pending());
    }
}
