// Repeating timers owned through cancellable handles

use crate::clock::Clock;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Shortest interval a task may repeat at
const MIN_INTERVAL: Duration = Duration::from_millis(1);

type TaskFn = Box<dyn FnMut() + Send>;

struct ScheduledTask {
    id: u64,
    interval: Duration,
    next_fire: Duration,
    cancelled: Arc<AtomicBool>,
    task: Arc<Mutex<TaskFn>>,
}

/// Handle to a repeating task. Dropping the handle cancels the task.
pub struct TaskHandle {
    cancelled: Arc<AtomicBool>,
}

impl TaskHandle {
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Timer wheel for the run loop thread
pub struct Scheduler {
    clock: Arc<dyn Clock>,
    tasks: Mutex<Vec<ScheduledTask>>,
    next_id: AtomicU64,
}

impl Scheduler {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            tasks: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Run `task` every `interval`, first firing one interval from now
    pub fn schedule_repeating<F>(&self, interval: Duration, task: F) -> TaskHandle
    where
        F: FnMut() + Send + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let interval = interval.max(MIN_INTERVAL);
        let cancelled = Arc::new(AtomicBool::new(false));

        self.tasks.lock().push(ScheduledTask {
            id,
            interval,
            next_fire: self.clock.now() + interval,
            cancelled: cancelled.clone(),
            task: Arc::new(Mutex::new(Box::new(task))),
        });
        log::trace!("Scheduled task {} every {:?}", id, interval);

        TaskHandle { cancelled }
    }

    /// Earliest deadline among live tasks
    pub fn next_deadline(&self) -> Option<Duration> {
        self.tasks
            .lock()
            .iter()
            .filter(|t| !t.cancelled.load(Ordering::Relaxed))
            .map(|t| t.next_fire)
            .min()
    }

    /// Number of live tasks
    pub fn pending(&self) -> usize {
        self.tasks
            .lock()
            .iter()
            .filter(|t| !t.cancelled.load(Ordering::Relaxed))
            .count()
    }

    /// Fire every task whose deadline has passed, returning how many ran.
    /// Missed ticks are coalesced into a single firing.
    pub fn run_due(&self) -> usize {
        let now = self.clock.now();

        // Collect under the lock, run without it: tasks may schedule or cancel
        let due: Vec<(u64, Arc<AtomicBool>, Arc<Mutex<TaskFn>>)> = {
            let mut tasks = self.tasks.lock();
            tasks.retain(|t| !t.cancelled.load(Ordering::Relaxed));
            tasks
                .iter_mut()
                .filter(|t| t.next_fire <= now)
                .map(|t| {
                    while t.next_fire <= now {
                        t.next_fire += t.interval;
                    }
                    (t.id, t.cancelled.clone(), t.task.clone())
                })
                .collect()
        };

        let mut fired = 0;
        for (id, cancelled, task) in due {
            // An earlier task in this pass may have cancelled this one
            if cancelled.load(Ordering::Relaxed) {
                continue;
            }
            log::trace!("Firing task {}", id);
            (task.lock())();
            fired += 1;
        }
        fired
    }
}
