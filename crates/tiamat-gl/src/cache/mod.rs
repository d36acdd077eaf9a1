//! Local mirrors of device state.
//!
//! Both caches are owned by the connection and only touched from inside
//! dispatched tasks, so they need no locking of their own.

mod location;
mod state;

pub use location::{AttribLocation, UniformLocation};
pub(crate) use location::LocationCache;
pub use state::Viewport;
pub(crate) use state::StateCache;
