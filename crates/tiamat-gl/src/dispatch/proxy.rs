use std::sync::Mutex;
use std::thread::{self, ThreadId};

use winit::event_loop::EventLoopProxy;

use super::{lock, wait, DeviceTask, Dispatch, Task};
use crate::error::{Error, Result};

/// Dispatches tasks as user events of a winit event loop.
///
/// The event loop's thread is the device thread. The application forwards
/// every received [`DeviceTask`] from `ApplicationHandler::user_event` to
/// [`DeviceTask::execute`]:
///
/// ```ignore
/// fn user_event(&mut self, _: &ActiveEventLoop, task: DeviceTask) {
///     task.execute();
/// }
/// ```
///
/// Applications with their own user event type wrap `DeviceTask` in it via
/// `From<DeviceTask>`.
pub struct WinitDispatcher<T: 'static> {
    proxy: Mutex<EventLoopProxy<T>>,
    owner: ThreadId,
}

impl<T> WinitDispatcher<T>
where
    T: From<DeviceTask> + Send + 'static,
{
    /// Must be called on the thread that runs the event loop.
    pub fn new(proxy: EventLoopProxy<T>) -> Self {
        Self {
            proxy: Mutex::new(proxy),
            owner: thread::current().id(),
        }
    }
}

impl<T> Dispatch for WinitDispatcher<T>
where
    T: From<DeviceTask> + Send + 'static,
{
    fn run(&self, task: Task) -> Result<()> {
        // Inside the event loop already; the loop cannot serve us while we wait.
        if thread::current().id() == self.owner {
            return task();
        }

        let (envelope, reply) = DeviceTask::new(task);
        lock(&self.proxy)
            .send_event(T::from(envelope))
            .map_err(|_| Error::dispatch("event loop is closed"))?;
        wait(reply)
    }
}
