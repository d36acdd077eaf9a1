//! The device connection exposed to the drawing engine.
//!
//! [`Context`] owns the device, the state mirror and the location cache.
//! Every method packages its work as one task and runs it through the
//! [`Dispatcher`], so device effects happen on the device thread and in
//! call order. Nothing outside this module can reach the device.
//!
//! Error model:
//! - creation/compile/link failures return [`Error`](crate::Error)
//! - deleting a dead handle is a silent no-op
//! - an unknown uniform/attribute name panics inside the task

mod connection;
mod global;
mod program;
mod resources;

use std::sync::{Arc, Mutex};

pub use global::{current, initialize};
pub use program::UniformValue;

use self::connection::Connection;
use crate::blend::CompositeMode;
use crate::cache::{AttribLocation, UniformLocation, Viewport};
use crate::device::Device;
use crate::dispatch::{lock, Dispatcher};
use crate::error::Result;
use crate::handle::{Buffer, BufferKind, DataType, Framebuffer, Program, Shader, ShaderKind, Texture};

pub struct Context {
    dispatcher: Dispatcher,
    connection: Arc<Mutex<Connection>>,
}

impl Context {
    /// Creates a context that is not registered process-wide.
    ///
    /// The device is untouched until [`Context::reset`].
    pub fn new(device: impl Device + 'static, dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher,
            connection: Arc::new(Mutex::new(Connection::new(Box::new(device)))),
        }
    }

    fn run<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut Connection) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let connection = Arc::clone(&self.connection);
        self.dispatcher.call(move || f(&mut lock(&connection)))
    }

    fn exec<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut Connection) + Send + 'static,
    {
        self.run(move |c| {
            f(c);
            Ok(())
        })
    }

    /// Runs a read-only query; a failed dispatch yields `R::default()`.
    fn query<R, F>(&self, what: &str, f: F) -> R
    where
        F: FnOnce(&mut Connection) -> R + Send + 'static,
        R: Default + Send + 'static,
    {
        self.run(move |c| Ok(f(c))).unwrap_or_else(|err| {
            log::warn!("{what} query failed: {err}");
            R::default()
        })
    }

    // ── lifecycle & state ─────────────────────────────────────────────────

    /// Initializes the device on first use and re-synchronizes every cache.
    ///
    /// Call again whenever the GL context was lost and recreated.
    pub fn reset(&self) -> Result<()> {
        self.run(Connection::reset)
    }

    pub fn set_blend_mode(&self, mode: CompositeMode) -> Result<()> {
        self.exec(move |c| c.set_composite_mode(mode))
    }

    pub fn blend_mode(&self) -> Option<CompositeMode> {
        self.query("blend mode", |c| c.composite_mode())
    }

    /// Cached viewport, `None` while unknown.
    pub fn viewport(&self) -> Option<Viewport> {
        self.query("viewport", |c| c.viewport())
    }

    pub fn max_texture_size(&self) -> i32 {
        self.query("max texture size", |c| c.device.max_texture_size())
    }

    pub fn flush(&self) -> Result<()> {
        self.exec(|c| c.device.flush())
    }

    // ── textures ──────────────────────────────────────────────────────────

    pub fn create_texture(&self, width: i32, height: i32) -> Result<Texture> {
        self.run(move |c| c.create_texture(width, height))
    }

    pub fn delete_texture(&self, texture: Texture) -> Result<()> {
        self.exec(move |c| c.delete_texture(texture))
    }

    pub fn is_texture(&self, texture: Texture) -> bool {
        self.query("texture liveness", move |c| c.is_texture(texture))
    }

    pub fn bind_texture(&self, texture: Texture) -> Result<()> {
        self.exec(move |c| c.bind_texture(texture))
    }

    pub fn bound_texture(&self) -> Texture {
        self.query("bound texture", |c| c.bound_texture())
    }

    /// Uploads RGBA rows into the currently bound texture.
    ///
    /// Fails with [`Error::PixelData`](crate::Error::PixelData) when `pixels`
    /// is shorter than the region.
    pub fn write_sub_region(&self, pixels: &[u8], x: i32, y: i32, width: i32, height: i32) -> Result<()> {
        let pixels = pixels.to_vec();
        self.run(move |c| c.write_sub_region(&pixels, x, y, width, height))
    }

    // ── framebuffers ──────────────────────────────────────────────────────

    /// Creates a framebuffer rendering into `texture`.
    ///
    /// The new framebuffer is left bound.
    pub fn create_framebuffer(&self, texture: Texture) -> Result<Framebuffer> {
        self.run(move |c| c.create_framebuffer(texture))
    }

    pub fn delete_framebuffer(&self, framebuffer: Framebuffer) -> Result<()> {
        self.exec(move |c| c.delete_framebuffer(framebuffer))
    }

    pub fn bind_framebuffer(&self, framebuffer: Framebuffer) -> Result<()> {
        self.exec(move |c| c.bind_framebuffer(framebuffer))
    }

    pub fn bound_framebuffer(&self) -> Framebuffer {
        self.query("bound framebuffer", |c| c.bound_framebuffer())
    }

    /// Binds `framebuffer` and sizes the viewport to `width`x`height`.
    pub fn set_viewport(&self, framebuffer: Framebuffer, width: i32, height: i32) -> Result<()> {
        self.exec(move |c| c.set_viewport(framebuffer, width, height))
    }

    pub fn bind_screen_framebuffer(&self) -> Result<()> {
        self.exec(|c| c.bind_screen_framebuffer())
    }

    /// Framebuffer the windowing layer had bound at the last reset.
    pub fn screen_framebuffer(&self) -> Framebuffer {
        self.query("screen framebuffer", |c| c.screen())
    }

    /// Returns `width * height` RGBA pixels of `framebuffer`.
    pub fn read_pixels(&self, framebuffer: Framebuffer, width: i32, height: i32) -> Result<Vec<u8>> {
        self.run(move |c| c.read_pixels(framebuffer, width, height))
    }

    // ── shaders & programs ────────────────────────────────────────────────

    pub fn compile_shader(&self, kind: ShaderKind, source: &str) -> Result<Shader> {
        let source = source.to_owned();
        self.run(move |c| c.compile_shader(kind, &source))
    }

    pub fn delete_shader(&self, shader: Shader) -> Result<()> {
        self.exec(move |c| c.delete_shader(shader))
    }

    pub fn link_program(&self, shaders: &[Shader]) -> Result<Program> {
        let shaders = shaders.to_vec();
        self.run(move |c| c.link_program(&shaders))
    }

    pub fn use_program(&self, program: Program) -> Result<()> {
        self.exec(move |c| c.use_program(program))
    }

    pub fn delete_program(&self, program: Program) -> Result<()> {
        self.exec(move |c| c.delete_program(program))
    }

    pub fn uniform_location(&self, program: Program, name: &str) -> Result<UniformLocation> {
        let name = name.to_owned();
        self.run(move |c| Ok(c.uniform_location(program, &name)))
    }

    pub fn attrib_location(&self, program: Program, name: &str) -> Result<AttribLocation> {
        let name = name.to_owned();
        self.run(move |c| Ok(c.attrib_location(program, &name)))
    }

    pub fn set_uniform(&self, program: Program, name: &str, value: impl Into<UniformValue>) -> Result<()> {
        let name = name.to_owned();
        let value = value.into();
        self.exec(move |c| c.set_uniform(program, &name, value))
    }

    pub fn vertex_attrib_pointer(
        &self,
        program: Program,
        name: &str,
        size: i32,
        data_type: DataType,
        stride: i32,
        offset: i32,
    ) -> Result<()> {
        let name = name.to_owned();
        self.exec(move |c| c.vertex_attrib_pointer(program, &name, size, data_type, stride, offset))
    }

    pub fn enable_vertex_attrib_array(&self, program: Program, name: &str) -> Result<()> {
        let name = name.to_owned();
        self.exec(move |c| c.enable_vertex_attrib_array(program, &name))
    }

    pub fn disable_vertex_attrib_array(&self, program: Program, name: &str) -> Result<()> {
        let name = name.to_owned();
        self.exec(move |c| c.disable_vertex_attrib_array(program, &name))
    }

    // ── buffers ───────────────────────────────────────────────────────────

    /// Allocates `size` bytes of vertex storage; the buffer is left bound.
    pub fn create_vertex_buffer(&self, size: usize) -> Result<Buffer> {
        self.run(move |c| c.create_buffer(BufferKind::Vertex, size))
    }

    /// Allocates `size` bytes of index storage; the buffer is left bound.
    pub fn create_index_buffer(&self, size: usize) -> Result<Buffer> {
        self.run(move |c| c.create_buffer(BufferKind::Index, size))
    }

    pub fn bind_buffer(&self, kind: BufferKind, buffer: Buffer) -> Result<()> {
        self.exec(move |c| c.bind_buffer(kind, buffer))
    }

    /// Overwrites the bound vertex buffer from its start.
    pub fn overwrite_vertex_buffer(&self, data: &[f32]) -> Result<()> {
        let bytes = bytemuck::cast_slice::<f32, u8>(data).to_vec();
        self.exec(move |c| c.overwrite_buffer(BufferKind::Vertex, &bytes))
    }

    /// Overwrites the bound index buffer from its start.
    pub fn overwrite_index_buffer(&self, data: &[u16]) -> Result<()> {
        let bytes = bytemuck::cast_slice::<u16, u8>(data).to_vec();
        self.exec(move |c| c.overwrite_buffer(BufferKind::Index, &bytes))
    }

    pub fn delete_buffer(&self, buffer: Buffer) -> Result<()> {
        self.exec(move |c| c.delete_buffer(buffer))
    }

    /// Draws `count` indices of the bound index buffer as triangles.
    pub fn draw_indexed(&self, count: i32, byte_offset: i32) -> Result<()> {
        self.exec(move |c| c.draw_indexed(count, byte_offset))
    }
}
