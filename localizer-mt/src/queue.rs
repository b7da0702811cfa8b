//! Rate-limited request queue
//!
//! Tasks run one at a time in enqueue order. A dedicated drain task pops the
//! head of the queue, waits until at least `min_spacing` has passed since the
//! previous dispatch started, runs the task and hands the result back to the
//! caller, then cools down for another `min_spacing` before the next pop.
//!
//! ```text
//!   enqueue ──► Idle ──spawn drain──► Draining ──queue empty──► Idle
//!                                       ▲   │
//!                                       └───┘ pop, wait, run, cool down
//! ```
//!
//! # Example
//!
//! ```ignore
//! use localizer_mt::RequestQueue;
//! use std::time::Duration;
//!
//! let queue: RequestQueue<String> = RequestQueue::new(Duration::from_millis(2500));
//! let answer = queue.enqueue(async { Ok("done".to_string()) }).await?;
//! ```

use crate::error::{MtError, MtResult};
use futures::future::BoxFuture;
use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::{Instant, sleep};
use tracing::debug;

/// Spacing used when the configuration does not set one
pub const DEFAULT_MIN_SPACING: Duration = Duration::from_millis(2500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueState {
    Idle,
    Draining,
}

struct Job<T> {
    work: BoxFuture<'static, MtResult<T>>,
    reply: oneshot::Sender<MtResult<T>>,
}

struct Shared<T> {
    jobs: VecDeque<Job<T>>,
    state: QueueState,
    last_dispatch: Option<Instant>,
}

struct Inner<T> {
    min_spacing: Duration,
    shared: Mutex<Shared<T>>,
}

impl<T> Inner<T> {
    fn lock(&self) -> MutexGuard<'_, Shared<T>> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// FIFO queue spacing out calls to a rate-limited backend
pub struct RequestQueue<T = String> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for RequestQueue<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Send + 'static> RequestQueue<T> {
    pub fn new(min_spacing: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                min_spacing,
                shared: Mutex::new(Shared {
                    jobs: VecDeque::new(),
                    state: QueueState::Idle,
                    last_dispatch: None,
                }),
            }),
        }
    }

    pub fn min_spacing(&self) -> Duration {
        self.inner.min_spacing
    }

    /// Number of tasks waiting to be dispatched
    pub fn len(&self) -> usize {
        self.inner.lock().jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn state(&self) -> QueueState {
        self.inner.lock().state
    }

    /// Drop every pending task. Their callers receive `MtError::QueueClosed`.
    ///
    /// # Returns
    ///
    /// The number of tasks dropped. A task already running is not affected.
    pub fn clear(&self) -> usize {
        let dropped: Vec<Job<T>> = self.inner.lock().jobs.drain(..).collect();
        dropped.len()
    }

    /// Queue a unit of work and wait for its result
    ///
    /// The task joins the tail of the queue when this future is first polled.
    /// A failure or panic inside `work` only affects this task.
    ///
    /// # Returns
    ///
    /// * `Ok(T)` - The result of `work`
    /// * `Err(MtError)` - The error of `work`, a `Translation` error if it
    ///   panicked, or `QueueClosed` if it was cleared before running
    pub async fn enqueue<F>(&self, work: F) -> MtResult<T>
    where
        F: Future<Output = MtResult<T>> + Send + 'static,
    {
        let (reply, receiver) = oneshot::channel();

        let start_draining = {
            let mut shared = self.inner.lock();
            shared.jobs.push_back(Job {
                work: Box::pin(work),
                reply,
            });
            if shared.state == QueueState::Idle {
                shared.state = QueueState::Draining;
                true
            } else {
                false
            }
        };

        if start_draining {
            tokio::spawn(drain(Arc::clone(&self.inner)));
        }

        receiver.await.map_err(|_| MtError::QueueClosed)?
    }
}

async fn drain<T: Send + 'static>(inner: Arc<Inner<T>>) {
    loop {
        let (job, delay) = {
            let mut shared = inner.lock();
            let Some(job) = shared.jobs.pop_front() else {
                shared.state = QueueState::Idle;
                return;
            };
            let delay = dispatch_delay(shared.last_dispatch, Instant::now(), inner.min_spacing);
            (job, delay)
        };

        if !delay.is_zero() {
            debug!("Waiting {:?} before next dispatch", delay);
            sleep(delay).await;
        }

        inner.lock().last_dispatch = Some(Instant::now());

        let result = match tokio::spawn(job.work).await {
            Ok(result) => result,
            Err(e) => Err(MtError::Translation(format!("Queued task failed: {}", e))),
        };
        // The caller may have gone away; nothing to do then.
        let _ = job.reply.send(result);

        sleep(inner.min_spacing).await;
    }
}

/// Delay before the next dispatch may start
///
/// `max(0, min_spacing - (now - last_start))`; the first dispatch never waits.
pub fn dispatch_delay(last_start: Option<Instant>, now: Instant, min_spacing: Duration) -> Duration {
    match last_start {
        None => Duration::ZERO,
        Some(last) => min_spacing.saturating_sub(now.saturating_duration_since(last)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::join_all;

    const SPACING: Duration = Duration::from_millis(100);

    // ===== Delay Tests =====

    #[tokio::test(start_paused = true)]
    async fn test_dispatch_delay() {
        let now = Instant::now();
        assert_eq!(dispatch_delay(None, now, SPACING), Duration::ZERO);
        assert_eq!(
            dispatch_delay(Some(now - Duration::from_millis(30)), now, SPACING),
            Duration::from_millis(70)
        );
        assert_eq!(
            dispatch_delay(Some(now - Duration::from_millis(500)), now, SPACING),
            Duration::ZERO
        );
    }

    // ===== Ordering Tests =====

    #[tokio::test(start_paused = true)]
    async fn test_dispatches_are_spaced_and_results_keep_order() {
        let queue: RequestQueue<usize> = RequestQueue::new(SPACING);
        let starts = Arc::new(Mutex::new(Vec::new()));
        let durations = [50u64, 5, 0];

        let calls = durations.iter().enumerate().map(|(i, ms)| {
            let starts = Arc::clone(&starts);
            let ms = *ms;
            queue.enqueue(async move {
                starts.lock().unwrap().push(Instant::now());
                sleep(Duration::from_millis(ms)).await;
                Ok(i)
            })
        });
        let results: Vec<usize> = join_all(calls)
            .await
            .into_iter()
            .map(|r| r.unwrap())
            .collect();

        assert_eq!(results, vec![0, 1, 2]);
        let starts = starts.lock().unwrap();
        assert_eq!(starts.len(), 3);
        for pair in starts.windows(2) {
            assert!(pair[1] - pair[0] >= SPACING);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_only_one_task_runs_at_a_time() {
        let queue: RequestQueue<()> = RequestQueue::new(Duration::from_millis(10));
        let running = Arc::new(Mutex::new((0usize, 0usize)));

        let calls = (0..4).map(|_| {
            let running = Arc::clone(&running);
            queue.enqueue(async move {
                {
                    let mut r = running.lock().unwrap();
                    r.0 += 1;
                    r.1 = r.1.max(r.0);
                }
                sleep(Duration::from_millis(20)).await;
                running.lock().unwrap().0 -= 1;
                Ok(())
            })
        });
        join_all(calls).await;

        assert_eq!(running.lock().unwrap().1, 1);
    }

    // ===== Failure Tests =====

    #[tokio::test(start_paused = true)]
    async fn test_failure_rejects_only_that_task() {
        let queue: RequestQueue<&'static str> = RequestQueue::new(SPACING);
        let (a, b, c) = tokio::join!(
            queue.enqueue(async { Ok("a") }),
            queue.enqueue(async { Err(MtError::Translation("boom".to_string())) }),
            queue.enqueue(async { Ok("c") }),
        );
        assert_eq!(a.unwrap(), "a");
        assert_eq!(b.unwrap_err(), MtError::Translation("boom".to_string()));
        assert_eq!(c.unwrap(), "c");
    }

    async fn explode() -> MtResult<u8> {
        panic!("task exploded")
    }

    #[tokio::test(start_paused = true)]
    async fn test_panic_rejects_only_that_task() {
        let queue: RequestQueue<u8> = RequestQueue::new(SPACING);
        let (a, b) = tokio::join!(
            queue.enqueue(explode()),
            queue.enqueue(async { Ok(2) }),
        );
        assert!(matches!(a, Err(MtError::Translation(_))));
        assert_eq!(b.unwrap(), 2);
    }

    // ===== State Tests =====

    #[tokio::test(start_paused = true)]
    async fn test_returns_to_idle_after_cool_down() {
        let queue: RequestQueue<u8> = RequestQueue::new(SPACING);
        assert_eq!(queue.state(), QueueState::Idle);

        queue.enqueue(async { Ok(1) }).await.unwrap();
        assert_eq!(queue.state(), QueueState::Draining);

        sleep(SPACING * 2).await;
        assert_eq!(queue.state(), QueueState::Idle);
        assert!(queue.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_closes_pending_tasks() {
        let queue: RequestQueue<u8> = RequestQueue::new(SPACING);

        let first = {
            let queue = queue.clone();
            tokio::spawn(async move {
                queue
                    .enqueue(async {
                        sleep(Duration::from_secs(1)).await;
                        Ok(1)
                    })
                    .await
            })
        };
        sleep(Duration::from_millis(1)).await;
        let second = {
            let queue = queue.clone();
            tokio::spawn(async move { queue.enqueue(async { Ok(2) }).await })
        };
        sleep(Duration::from_millis(10)).await;

        assert_eq!(queue.len(), 1);
        assert_eq!(queue.clear(), 1);
        assert_eq!(second.await.unwrap(), Err(MtError::QueueClosed));
        assert_eq!(first.await.unwrap(), Ok(1));
    }
}
