//! Bounded FIFO work queue drained by the crawl workers

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

/// Errors raised when filling the work queue
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Work queue is full (capacity {capacity})")]
    QueueFull { capacity: usize },
}

/// In-memory FIFO of pending jobs with a fixed capacity
///
/// The queue is filled before the workers start and only drained afterwards,
/// so the lock is never held across a fetch.
#[derive(Debug)]
pub struct WorkQueue<T> {
    jobs: Mutex<VecDeque<T>>,
    capacity: usize,
}

impl<T> WorkQueue<T> {
    /// Creates an empty queue accepting at most `capacity` jobs
    pub fn new(capacity: usize) -> Self {
        Self {
            jobs: Mutex::new(VecDeque::new()),
            capacity,
        }
    }

    /// Creates a queue holding `jobs` in order
    pub fn with_jobs<I>(jobs: I, capacity: usize) -> Result<Self, QueueError>
    where
        I: IntoIterator<Item = T>,
    {
        let queue = Self::new(capacity);
        for job in jobs {
            queue.push(job)?;
        }
        Ok(queue)
    }

    /// Appends a job at the back of the queue
    pub fn push(&self, job: T) -> Result<(), QueueError> {
        let mut jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
        if jobs.len() >= self.capacity {
            return Err(QueueError::QueueFull {
                capacity: self.capacity,
            });
        }
        jobs.push_back(job);
        Ok(())
    }

    /// Takes the job at the front of the queue
    pub fn pop(&self) -> Option<T> {
        self.jobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }

    pub fn len(&self) -> usize {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
