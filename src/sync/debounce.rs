//! Per-field deferred writes.
//!
//! Each field owns at most one pending task. Scheduling a field again replaces
//! its task, so only the last value seen within a window is ever written.
//! Tasks run their action while holding the pending table lock, and
//! cancellation takes the same lock: once [`Debouncer::cancel_all`] returns,
//! no cancelled action can still run.

use crate::core::{DraftError, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

#[derive(Clone)]
pub struct Debouncer {
    inner: Arc<DebouncerInner>,
}

struct DebouncerInner {
    window: Duration,
    handle: Handle,
    pending: Mutex<PendingWrites>,
}

#[derive(Default)]
struct PendingWrites {
    next_seq: u64,
    closed: bool,
    tasks: HashMap<String, PendingTask>,
}

struct PendingTask {
    seq: u64,
    join: JoinHandle<()>,
}

impl Debouncer {
    /// Debouncer on the current Tokio runtime
    pub fn new(window: Duration) -> Result<Self> {
        let handle = Handle::try_current()
            .map_err(|e| DraftError::RuntimeUnavailable(format!("debouncer needs a Tokio runtime: {}", e)))?;
        Ok(Self::with_handle(window, handle))
    }

    pub fn with_handle(window: Duration, handle: Handle) -> Self {
        Self {
            inner: Arc::new(DebouncerInner {
                window,
                handle,
                pending: Mutex::new(PendingWrites::default()),
            }),
        }
    }

    /// Runs `action` once `field` has been quiet for a full window.
    ///
    /// Replaces any action already pending for `field`. Ignored after
    /// [`Debouncer::close`].
    pub fn schedule<F>(&self, field: &str, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let mut pending = self.inner.lock_pending();
        if pending.closed {
            return;
        }

        let seq = pending.next_seq;
        pending.next_seq += 1;

        let weak: Weak<DebouncerInner> = Arc::downgrade(&self.inner);
        let window = self.inner.window;
        let key = field.to_string();
        let join = self.inner.handle.spawn(async move {
            tokio::time::sleep(window).await;

            let Some(inner) = weak.upgrade() else {
                return;
            };
            let mut pending = inner.lock_pending();
            let current = pending.tasks.get(&key).is_some_and(|task| task.seq == seq);
            if pending.closed || !current {
                return;
            }
            pending.tasks.remove(&key);
            action();
        });

        if let Some(previous) = pending.tasks.insert(field.to_string(), PendingTask { seq, join }) {
            previous.join.abort();
        }
    }

    /// Cancels the pending action for `field`, if any.
    pub fn cancel(&self, field: &str) -> bool {
        match self.inner.lock_pending().tasks.remove(field) {
            Some(task) => {
                task.join.abort();
                true
            }
            None => false,
        }
    }

    /// Cancels every pending action; returns how many were dropped.
    pub fn cancel_all(&self) -> usize {
        let mut pending = self.inner.lock_pending();
        let cancelled = pending.tasks.len();
        for (_, task) in pending.tasks.drain() {
            task.join.abort();
        }
        cancelled
    }

    /// Cancels every pending action and refuses new ones.
    pub fn close(&self) -> usize {
        let cancelled = self.cancel_all();
        self.inner.lock_pending().closed = true;
        cancelled
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock_pending().closed
    }

    /// Number of fields with a pending action
    pub fn pending(&self) -> usize {
        self.inner.lock_pending().tasks.len()
    }

    pub fn is_pending(&self, field: &str) -> bool {
        self.inner.lock_pending().tasks.contains_key(field)
    }
}

impl DebouncerInner {
    fn lock_pending(&self) -> MutexGuard<'_, PendingWrites> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    const WINDOW: Duration = Duration::from_millis(200);

    fn sink() -> Arc<StdMutex<Vec<(String, u32)>>> {
        Arc::new(StdMutex::new(Vec::new()))
    }

    fn push(log: &Arc<StdMutex<Vec<(String, u32)>>>, field: &str, value: u32) -> impl FnOnce() + Send + 'static {
        let log = log.clone();
        let field = field.to_string();
        move || log.lock().unwrap().push((field, value))
    }

    #[test]
    fn test_requires_runtime() {
        assert!(matches!(
            Debouncer::new(WINDOW),
            Err(DraftError::RuntimeUnavailable(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_only_last_value_in_window_runs() {
        let log = sink();
        let debouncer = Debouncer::new(WINDOW).unwrap();

        debouncer.schedule("name", push(&log, "name", 1));
        tokio::time::sleep(Duration::from_millis(50)).await;
        debouncer.schedule("name", push(&log, "name", 2));
        tokio::time::sleep(Duration::from_millis(50)).await;
        debouncer.schedule("name", push(&log, "name", 3));

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(log.lock().unwrap().is_empty());

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(*log.lock().unwrap(), vec![("name".to_string(), 3)]);
        assert_eq!(debouncer.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fields_have_independent_timers() {
        let log = sink();
        let debouncer = Debouncer::new(WINDOW).unwrap();

        debouncer.schedule("name", push(&log, "name", 1));
        tokio::time::sleep(Duration::from_millis(100)).await;
        debouncer.schedule("email", push(&log, "email", 2));

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(*log.lock().unwrap(), vec![("name".to_string(), 1)]);
        assert!(debouncer.is_pending("email"));

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(log.lock().unwrap().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_all_drops_pending_actions() {
        let log = sink();
        let debouncer = Debouncer::new(WINDOW).unwrap();

        debouncer.schedule("name", push(&log, "name", 1));
        debouncer.schedule("email", push(&log, "email", 2));
        assert_eq!(debouncer.cancel_all(), 2);

        tokio::time::sleep(WINDOW * 3).await;
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_single_field() {
        let log = sink();
        let debouncer = Debouncer::new(WINDOW).unwrap();

        debouncer.schedule("name", push(&log, "name", 1));
        debouncer.schedule("email", push(&log, "email", 2));
        assert!(debouncer.cancel("name"));
        assert!(!debouncer.cancel("name"));

        tokio::time::sleep(WINDOW * 2).await;
        assert_eq!(*log.lock().unwrap(), vec![("email".to_string(), 2)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_debouncer_ignores_new_work() {
        let log = sink();
        let debouncer = Debouncer::new(WINDOW).unwrap();

        debouncer.schedule("name", push(&log, "name", 1));
        assert_eq!(debouncer.close(), 1);
        assert!(debouncer.is_closed());

        debouncer.schedule("name", push(&log, "name", 2));
        assert_eq!(debouncer.pending(), 0);

        tokio::time::sleep(WINDOW * 3).await;
        assert!(log.lock().unwrap().is_empty());
    }
}
