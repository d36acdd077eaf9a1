use state::InitCell;

use super::Context;
use crate::device::Device;
use crate::dispatch::Dispatcher;
use crate::error::{Error, Result};

static CONTEXT: InitCell<Context> = InitCell::new();

/// Installs the process-wide context.
///
/// Call once the device thread's run loop is running, then call
/// [`Context::reset`] on the returned context. A second call fails with
/// [`Error::AlreadyInitialized`] and leaves the first context in place.
pub fn initialize(device: impl Device + 'static, dispatcher: Dispatcher) -> Result<&'static Context> {
    if !CONTEXT.set(Context::new(device, dispatcher)) {
        return Err(Error::AlreadyInitialized);
    }
    log::debug!("process-wide context installed");
    CONTEXT.try_get().ok_or(Error::AlreadyInitialized)
}

/// The context installed by [`initialize`], if any.
pub fn current() -> Option<&'static Context> {
    CONTEXT.try_get()
}
