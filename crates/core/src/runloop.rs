// Single-threaded run loop: queued jobs plus timers on one clock

use crate::clock::{Clock, ManualClock, SystemClock};
use crate::dispatch::MainQueue;
use crate::scheduler::Scheduler;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Longest sleep between turns when blocking in `run_until`
const IDLE_WAIT: Duration = Duration::from_millis(10);

pub struct RunLoop {
    clock: Arc<dyn Clock>,
    scheduler: Arc<Scheduler>,
    queue: MainQueue,
}

impl RunLoop {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            scheduler: Arc::new(Scheduler::new(clock.clone())),
            clock,
            queue: MainQueue::new(),
        }
    }

    /// Run loop on the wall clock
    pub fn system() -> Self {
        Self::new(Arc::new(SystemClock::new()))
    }

    /// Run loop on a manual clock, returned alongside for `advance`
    pub fn simulated() -> (Self, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        (Self::new(clock.clone()), clock)
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn scheduler(&self) -> &Arc<Scheduler> {
        &self.scheduler
    }

    pub fn queue(&self) -> &MainQueue {
        &self.queue
    }

    /// One pass: queued jobs first, then due timers
    pub fn turn(&self) -> usize {
        self.queue.drain() + self.scheduler.run_due()
    }

    /// Move `clock` forward by `delta`, stopping at every timer deadline on the way.
    /// `clock` must be the clock this loop was built with.
    pub fn advance(&self, clock: &ManualClock, delta: Duration) {
        let target = clock.now() + delta;
        loop {
            self.queue.drain();
            match self.scheduler.next_deadline() {
                Some(deadline) if deadline <= target => {
                    clock.set(deadline);
                    self.scheduler.run_due();
                }
                _ => break,
            }
        }
        clock.set(target);
        self.turn();
    }

    /// Block the calling thread, servicing jobs and timers until `deadline`
    pub fn run_until(&self, deadline: Duration) {
        loop {
            self.turn();
            let now = self.clock.now();
            if now >= deadline {
                break;
            }
            let wait = self
                .scheduler
                .next_deadline()
                .map(|next| next.saturating_sub(now))
                .unwrap_or(IDLE_WAIT)
                .min(IDLE_WAIT)
                .min(deadline - now);
            thread::sleep(wait);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn test_advance_fires_at_each_deadline() {
        let (run_loop, clock) = RunLoop::simulated();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let observed = seen.clone();
        let tick_clock = clock.clone();
        let _handle = run_loop
            .scheduler()
            .schedule_repeating(Duration::from_millis(250), move || {
                observed.lock().push(tick_clock.now());
            });

        run_loop.advance(&clock, Duration::from_millis(800));

        assert_eq!(
            *seen.lock(),
            vec![
                Duration::from_millis(250),
                Duration::from_millis(500),
                Duration::from_millis(750),
            ]
        );
        assert_eq!(clock.now(), Duration::from_millis(800));
    }

    #[test]
    fn test_run_until_services_timers_and_posts() {
        let run_loop = RunLoop::system();
        let ticks = Arc::new(Mutex::new(0u32));
        let posted = Arc::new(Mutex::new(false));

        let counter = ticks.clone();
        let _handle = run_loop
            .scheduler()
            .schedule_repeating(Duration::from_millis(5), move || *counter.lock() += 1);
        let queue = run_loop.queue().clone();
        let flag = posted.clone();
        thread::spawn(move || queue.post(move || *flag.lock() = true))
            .join()
            .unwrap();

        let deadline = run_loop.clock().now() + Duration::from_millis(60);
        run_loop.run_until(deadline);

        assert!(run_loop.clock().now() >= deadline);
        assert!(*ticks.lock() >= 1);
        assert!(*posted.lock());
    }

    #[test]
    fn test_turn_drains_queue() {
        let (run_loop, _clock) = RunLoop::simulated();
        run_loop.queue().post(|| {});
        run_loop.queue().post(|| {});
        assert_eq!(run_loop.turn(), 2);
    }
}
