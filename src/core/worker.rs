//! Background executor for asynchronous emission work
//!
//! Work is spawned on the caller's Tokio runtime when there is one.
//! Otherwise it is queued to a dedicated thread, started on first use,
//! which hands it to a small runtime of its own. The caller never waits
//! for the work either way.

use crossbeam_channel::{unbounded, Sender};
use futures::future::{BoxFuture, FutureExt};
use parking_lot::Mutex;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use tokio::sync::Notify;

const WORKER_THREAD_NAME: &str = "log-layer-worker";

type Task = BoxFuture<'static, ()>;

/// Tasks spawned through a [`Worker`] that have not finished yet
#[derive(Default)]
struct InFlight {
    count: AtomicUsize,
    idle: Notify,
}

impl InFlight {
    fn track(self: &Arc<Self>, task: Task) -> Task {
        self.count.fetch_add(1, Ordering::SeqCst);
        let guard = InFlightGuard(Arc::clone(self));
        async move {
            let _guard = guard;
            task.await;
        }
        .boxed()
    }

    async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            if self.count.load(Ordering::SeqCst) == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// Decrements on drop, so cancelled and panicking tasks are counted out too
struct InFlightGuard(Arc<InFlight>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if self.0.count.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.0.idle.notify_waiters();
        }
    }
}

/// Dedicated thread feeding queued tasks to its own runtime
struct Background {
    sender: Sender<Task>,
    handle: thread::JoinHandle<()>,
}

impl Background {
    fn start(in_flight: Arc<InFlight>) -> io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name(WORKER_THREAD_NAME)
            .enable_all()
            .build()?;
        let (sender, receiver) = unbounded::<Task>();

        let handle = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || {
                while let Ok(task) = receiver.recv() {
                    runtime.spawn(task);
                }
                // Queue closed: let running deliveries land before the runtime goes away
                futures::executor::block_on(in_flight.wait_idle());
                drop(runtime);
            })?;

        Ok(Self { sender, handle })
    }
}

/// Runs asynchronous lazy resolution and async transport deliveries
///
/// Shared by a logger and all of its children.
pub(crate) struct Worker {
    in_flight: Arc<InFlight>,
    background: Mutex<Option<Background>>,
}

impl Worker {
    pub(crate) fn new() -> Self {
        Self {
            in_flight: Arc::new(InFlight::default()),
            background: Mutex::new(None),
        }
    }

    /// Start `task` without waiting for it
    pub(crate) fn spawn(&self, task: Task) {
        let task = self.in_flight.track(task);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(task);
            }
            Err(_) => self.submit(task),
        }
    }

    fn submit(&self, task: Task) {
        let mut background = self.background.lock();
        if background.is_none() {
            match Background::start(Arc::clone(&self.in_flight)) {
                Ok(started) => *background = Some(started),
                Err(error) => {
                    tracing::warn!(target: "log_layer", %error, "background worker failed to start, task dropped");
                    return;
                }
            }
        }

        let sent = background.as_ref().map(|bg| bg.sender.send(task).is_ok());
        if sent == Some(false) {
            // The thread is gone; the next submission starts a fresh one
            *background = None;
            tracing::warn!(target: "log_layer", "background worker stopped, task dropped");
        }
    }

    /// Number of spawned tasks still running
    #[cfg(test)]
    pub(crate) fn in_flight(&self) -> usize {
        self.in_flight.count.load(Ordering::SeqCst)
    }

    /// Resolves once every spawned task has finished
    ///
    /// Must not be awaited from inside a spawned task, which would wait
    /// for itself.
    pub(crate) async fn wait_idle(&self) {
        self.in_flight.wait_idle().await;
    }

    /// Close the queue and join the background thread, if one is running
    pub(crate) fn stop(&self) {
        let Some(Background { sender, handle }) = self.background.lock().take() else {
            return;
        };
        drop(sender);
        if handle.thread().id() != thread::current().id() && handle.join().is_err() {
            tracing::warn!(target: "log_layer", "background worker panicked");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_spawn_without_runtime_does_not_block() {
        let worker = Worker::new();
        let done = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&done);
        worker.spawn(
            async move {
                tokio::time::sleep(Duration::from_millis(100)).await;
                counter.fetch_add(1, Ordering::SeqCst);
            }
            .boxed(),
        );
        assert_eq!(done.load(Ordering::SeqCst), 0);
        assert_eq!(worker.in_flight(), 1);

        futures::executor::block_on(worker.wait_idle());
        assert_eq!(done.load(Ordering::SeqCst), 1);
        assert_eq!(worker.in_flight(), 0);
        worker.stop();
    }

    #[test]
    fn test_restarts_after_stop() {
        let worker = Worker::new();
        let done = Arc::new(AtomicUsize::new(0));

        for _ in 0..2 {
            let counter = Arc::clone(&done);
            worker.spawn(
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                }
                .boxed(),
            );
            futures::executor::block_on(worker.wait_idle());
            worker.stop();
        }

        assert_eq!(done.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_panicking_task_is_counted_out() {
        let worker = Worker::new();
        worker.spawn(async { panic!("task exploded") }.boxed());
        futures::executor::block_on(worker.wait_idle());
        assert_eq!(worker.in_flight(), 0);
        worker.stop();
    }

    #[tokio::test]
    async fn test_spawn_inside_runtime() {
        let worker = Worker::new();
        let done = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&done);
        worker.spawn(
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
            .boxed(),
        );

        worker.wait_idle().await;
        assert_eq!(done.load(Ordering::SeqCst), 1);
        assert!(worker.background.lock().is_none());
    }
}
