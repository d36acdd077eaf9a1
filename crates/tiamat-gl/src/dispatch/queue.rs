use std::marker::PhantomData;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, ThreadId};

use super::{wait, Dispatch, Dispatcher, DeviceTask, Task};
use crate::error::{Error, Result};

/// Creates a FIFO hand-off to the current thread.
///
/// The returned [`TaskQueue`] must stay on the calling thread, which becomes
/// the device thread; the [`Dispatcher`] can be cloned into any thread.
pub fn queue() -> (Dispatcher, TaskQueue) {
    let (sender, receiver) = mpsc::channel();
    let dispatch = QueueDispatch {
        sender,
        owner: thread::current().id(),
    };

    let queue = TaskQueue {
        receiver,
        _owner_bound: PhantomData,
    };

    (Dispatcher::new(dispatch), queue)
}

struct QueueDispatch {
    sender: Sender<DeviceTask>,
    owner: ThreadId,
}

impl Dispatch for QueueDispatch {
    fn run(&self, task: Task) -> Result<()> {
        // Waiting on ourselves would never return.
        if thread::current().id() == self.owner {
            return task();
        }

        let (envelope, reply) = DeviceTask::new(task);
        self.sender
            .send(envelope)
            .map_err(|_| Error::dispatch("task queue was dropped"))?;
        wait(reply)
    }
}

/// Receiving end of [`queue`], drained by the device thread's run loop.
pub struct TaskQueue {
    receiver: Receiver<DeviceTask>,
    _owner_bound: PhantomData<*const ()>,
}

impl TaskQueue {
    /// Runs every task already submitted, without blocking.
    ///
    /// Returns the number of tasks executed.
    pub fn pump(&self) -> usize {
        let mut executed = 0;
        while let Ok(task) = self.receiver.try_recv() {
            task.execute();
            executed += 1;
        }
        executed
    }

    /// Serves tasks until every dispatcher has been dropped.
    pub fn run(&self) {
        while let Ok(task) = self.receiver.recv() {
            task.execute();
        }
        log::debug!("task queue closed");
    }
}
