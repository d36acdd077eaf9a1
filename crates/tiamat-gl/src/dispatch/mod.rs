//! Thread-confined execution of device work.
//!
//! The device tolerates calls from a single thread. Every device-touching
//! operation is packaged as a [`Task`] and handed to a [`Dispatch`]
//! implementation, which runs it on that thread and blocks the caller until
//! it finishes. Tasks run in submission order and are never retried.
//!
//! Strategies:
//! - [`Dispatcher::inline`]: the caller already is the device thread
//! - [`queue`]: channel hand-off drained by the owning thread
//! - [`WinitDispatcher`]: hand-off through a winit event loop proxy

mod queue;
mod proxy;

use std::sync::mpsc::{self, Receiver, SyncSender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub use queue::{queue, TaskQueue};
pub use proxy::WinitDispatcher;

use crate::error::{Error, Result};

/// A unit of device work.
pub type Task = Box<dyn FnOnce() -> Result<()> + Send + 'static>;

/// Runs tasks on the thread allowed to touch the device.
///
/// Implemented for any `Fn(Task) -> Result<()>` closure, so the windowing
/// layer can supply its own run-on-main-thread function.
pub trait Dispatch: Send + Sync {
    fn run(&self, task: Task) -> Result<()>;
}

impl<F> Dispatch for F
where
    F: Fn(Task) -> Result<()> + Send + Sync,
{
    fn run(&self, task: Task) -> Result<()> {
        self(task)
    }
}

/// Cloneable handle to the active dispatch strategy.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<dyn Dispatch>,
}

impl Dispatcher {
    pub fn new(dispatch: impl Dispatch + 'static) -> Self {
        Self { inner: Arc::new(dispatch) }
    }

    /// Runs tasks directly on the calling thread.
    pub fn inline() -> Self {
        Self::new(|task: Task| task())
    }

    pub fn run(&self, task: Task) -> Result<()> {
        self.inner.run(task)
    }

    /// Runs `f` through the dispatcher and returns its value.
    pub fn call<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce() -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let slot = Arc::new(Mutex::new(None));
        let out = Arc::clone(&slot);

        self.inner.run(Box::new(move || {
            let value = f()?;
            *lock(&out) = Some(value);
            Ok(())
        }))?;

        let value = lock(&slot).take();
        value.ok_or_else(|| Error::dispatch("task completed without producing a value"))
    }
}

/// A task in flight to the owning thread, paired with its reply channel.
///
/// Used as the user event of [`WinitDispatcher`]; the event loop answers it
/// by calling [`DeviceTask::execute`].
pub struct DeviceTask {
    task: Task,
    reply: SyncSender<Result<()>>,
}

impl DeviceTask {
    fn new(task: Task) -> (Self, Receiver<Result<()>>) {
        let (reply, receiver) = mpsc::sync_channel(1);
        (Self { task, reply }, receiver)
    }

    /// Runs the task on the current thread and wakes the waiting caller.
    pub fn execute(self) {
        let result = (self.task)();
        // The caller only disappears if its own thread is unwinding.
        let _ = self.reply.send(result);
    }
}

impl std::fmt::Debug for DeviceTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DeviceTask")
    }
}

fn wait(reply: Receiver<Result<()>>) -> Result<()> {
    reply
        .recv()
        .unwrap_or_else(|_| Err(Error::dispatch("device thread dropped the task before finishing it")))
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn call_returns_the_task_value() {
        let dispatcher = Dispatcher::inline();
        assert_eq!(dispatcher.call(|| Ok(21 * 2)).unwrap(), 42);
    }

    #[test]
    fn task_errors_reach_the_caller() {
        let dispatcher = Dispatcher::inline();
        let err = dispatcher
            .call::<(), _>(|| Err(Error::Link("boom".into())))
            .unwrap_err();
        assert!(matches!(err, Error::Link(msg) if msg == "boom"));
    }

    #[test]
    fn closures_act_as_dispatchers() {
        let seen = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&seen);
        let dispatcher = Dispatcher::new(move |task: Task| {
            *lock(&counter) += 1;
            task()
        });

        dispatcher.run(Box::new(|| Ok(()))).unwrap();
        dispatcher.call(|| Ok(())).unwrap();
        assert_eq!(*lock(&seen), 2);
    }

    #[test]
    fn dropped_task_reports_dispatch_error() {
        let dispatcher = Dispatcher::new(|task: Task| {
            let (envelope, reply) = DeviceTask::new(task);
            drop(envelope);
            wait(reply)
        });
        assert!(matches!(dispatcher.call(|| Ok(1)), Err(Error::Dispatch(_))));
    }
}
