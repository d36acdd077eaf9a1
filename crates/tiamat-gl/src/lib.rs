//! Tiamat GL device layer.
//!
//! Sits between a 2D drawing engine and OpenGL. All device work is funnelled
//! through one [`Dispatcher`] onto the thread that owns the GL context, and
//! redundant binds/blend changes are dropped against a local state mirror.
//!
//! Typical setup on the device thread:
//!
//! ```ignore
//! let (dispatcher, queue) = tiamat_gl::dispatch::queue();
//! let device = tiamat_gl::device::GlowDevice::new(|name| loader(name));
//! let context = tiamat_gl::initialize(device, dispatcher)?;
//! context.reset()?;
//! // hand `context` to the engine threads, then serve them:
//! queue.run();
//! ```

pub mod blend;
pub mod cache;
pub mod device;
pub mod dispatch;
pub mod error;
pub mod handle;
pub mod logging;

mod context;

pub use blend::CompositeMode;
pub use cache::{AttribLocation, UniformLocation, Viewport};
pub use context::{current, initialize, Context, UniformValue};
pub use dispatch::Dispatcher;
pub use error::{Error, Result};
pub use handle::{Buffer, BufferKind, DataType, Framebuffer, Program, Shader, ShaderKind, Texture};
