//! Delayed one-shot task scheduling.
//!
//! Tasks are queued with a deadline and executed by whoever drains the queue
//! with [`TaskScheduler::run_due`]. On a live server that is the driver task
//! started by [`TaskScheduler::spawn_driver`]; tests call `run_due` directly
//! with a chosen instant so timing stays deterministic.

use parking_lot::Mutex;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, error, info};

type Task = Box<dyn FnOnce() + Send + 'static>;

struct ScheduledTask {
    deadline: Instant,
    sequence: u64,
    name: String,
    task: Task,
}

impl PartialEq for ScheduledTask {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.sequence == other.sequence
    }
}

impl Eq for ScheduledTask {}

impl PartialOrd for ScheduledTask {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledTask {
    fn cmp(&self, other: &Self) -> Ordering {
        self.deadline
            .cmp(&other.deadline)
            .then(self.sequence.cmp(&other.sequence))
    }
}

#[derive(Default)]
struct Queue {
    tasks: BinaryHeap<Reverse<ScheduledTask>>,
    next_sequence: u64,
}

/// Queue of delayed tasks.
///
/// Tasks due at the same instant run in the order they were scheduled. A
/// panicking task is logged and does not affect the others.
#[derive(Default)]
pub struct TaskScheduler {
    queue: Mutex<Queue>,
}

impl TaskScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `task` to run once `delay` has elapsed.
    pub fn run_later<F>(&self, name: &str, delay: Duration, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.run_at(name, Instant::now() + delay, task);
    }

    /// Schedules `task` to run at or after `deadline`.
    pub fn run_at<F>(&self, name: &str, deadline: Instant, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let mut queue = self.queue.lock();
        let sequence = queue.next_sequence;
        queue.next_sequence += 1;
        queue.tasks.push(Reverse(ScheduledTask {
            deadline,
            sequence,
            name: name.to_string(),
            task: Box::new(task),
        }));
        debug!("⏲️ Scheduled task {} (#{})", name, sequence);
    }

    /// Runs every task whose deadline is at or before `now`.
    ///
    /// Returns the number of tasks that were run. Tasks scheduled by a running
    /// task are not picked up until the next call.
    pub fn run_due(&self, now: Instant) -> usize {
        let due = {
            let mut queue = self.queue.lock();
            let mut due = Vec::new();
            while queue
                .tasks
                .peek()
                .map_or(false, |Reverse(next)| next.deadline <= now)
            {
                if let Some(Reverse(task)) = queue.tasks.pop() {
                    due.push(task);
                }
            }
            due
        };

        let count = due.len();
        for scheduled in due {
            if catch_unwind(AssertUnwindSafe(scheduled.task)).is_err() {
                error!("❌ Scheduled task {} panicked", scheduled.name);
            }
        }
        count
    }

    /// Number of tasks still waiting to run.
    pub fn pending(&self) -> usize {
        self.queue.lock().tasks.len()
    }

    /// Deadline of the earliest queued task.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.queue
            .lock()
            .tasks
            .peek()
            .map(|Reverse(task)| task.deadline)
    }

    /// Starts a background loop that drains due tasks every `tick`.
    pub fn spawn_driver(self: &Arc<Self>, tick: Duration) -> JoinHandle<()> {
        let scheduler = Arc::clone(self);
        info!("🕒 Task scheduler started with interval: {}ms", tick.as_millis());

        tokio::spawn(async move {
            let mut ticker = interval(tick);
            loop {
                ticker.tick().await;
                scheduler.run_due(Instant::now());
            }
        })
    }
}

impl std::fmt::Debug for TaskScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskScheduler")
            .field("pending", &self.pending())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tasks_run_in_deadline_order() {
        let scheduler = TaskScheduler::new();
        let trail = Arc::new(Mutex::new(Vec::new()));
        let start = Instant::now();

        for (label, delay) in [("late", 300), ("early", 100), ("also early", 100)] {
            let trail = Arc::clone(&trail);
            scheduler.run_at(label, start + Duration::from_millis(delay), move || {
                trail.lock().push(label);
            });
        }

        assert_eq!(scheduler.run_due(start), 0);
        assert_eq!(scheduler.run_due(start + Duration::from_millis(100)), 2);
        assert_eq!(*trail.lock(), vec!["early", "also early"]);
        assert_eq!(scheduler.pending(), 1);
        assert_eq!(
            scheduler.next_deadline(),
            Some(start + Duration::from_millis(300))
        );

        assert_eq!(scheduler.run_due(start + Duration::from_secs(1)), 1);
        assert_eq!(*trail.lock(), vec!["early", "also early", "late"]);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn test_panicking_task_does_not_stop_others() {
        let scheduler = TaskScheduler::new();
        let ran = Arc::new(Mutex::new(false));
        let start = Instant::now();

        scheduler.run_at("panics", start, || panic!("Intentional test panic"));
        let ran_flag = Arc::clone(&ran);
        scheduler.run_at("survives", start, move || *ran_flag.lock() = true);

        assert_eq!(scheduler.run_due(start), 2);
        assert!(*ran.lock());
    }

    #[test]
    fn test_tasks_scheduled_while_running_wait_for_next_drain() {
        let scheduler = Arc::new(TaskScheduler::new());
        let start = Instant::now();

        let inner = Arc::clone(&scheduler);
        scheduler.run_at("outer", start, move || {
            inner.run_at("inner", start, || {});
        });

        assert_eq!(scheduler.run_due(start), 1);
        assert_eq!(scheduler.pending(), 1);
        assert_eq!(scheduler.run_due(start), 1);
    }

    #[tokio::test]
    async fn test_driver_runs_due_tasks() {
        let scheduler = Arc::new(TaskScheduler::new());
        let (tx, rx) = tokio::sync::oneshot::channel();

        scheduler.run_later("signal", Duration::from_millis(10), move || {
            let _ = tx.send(());
        });
        let driver = scheduler.spawn_driver(Duration::from_millis(5));

        let result = tokio::time::timeout(Duration::from_secs(2), rx).await;
        driver.abort();

        assert!(matches!(result, Ok(Ok(()))));
    }
}
