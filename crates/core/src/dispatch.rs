// Hand-off of work from background threads to the run loop thread

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

type Job = Box<dyn FnOnce() + Send>;

/// FIFO of jobs that must run on the thread owning player and view state
#[derive(Clone, Default)]
pub struct MainQueue {
    jobs: Arc<Mutex<VecDeque<Job>>>,
}

impl MainQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a job. Safe to call from any thread.
    pub fn post<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.jobs.lock().push_back(Box::new(job));
    }

    pub fn len(&self) -> usize {
        self.jobs.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.lock().is_empty()
    }

    /// Run queued jobs on the calling thread, including any they post
    pub fn drain(&self) -> usize {
        let mut ran = 0;
        loop {
            let job = self.jobs.lock().pop_front();
            match job {
                Some(job) => {
                    job();
                    ran += 1;
                }
                None => break,
            }
        }
        ran
    }
}
