//! The low-level device seam.
//!
//! `Device` lists the primitive calls the context issues, one method per
//! device entry point. Implementations hold no cache of their own; the
//! context layer owns all state tracking. Handles travel as raw ids here and
//! are wrapped in typed handles one level up.
//!
//! Every method must be invoked on the thread that owns the device. The
//! context guarantees this by calling only from dispatched tasks.

mod gl;

#[cfg(test)]
pub(crate) mod fake;

pub use gl::GlowDevice;

use crate::blend::BlendFactor;
use crate::handle::{BufferKind, DataType, ShaderKind};

/// Status reported by [`Device::check_framebuffer_status`] for a usable target.
pub const FRAMEBUFFER_COMPLETE: u32 = 0x8CD5;

/// Value of [`Device::last_error`] when no error is pending.
pub const NO_ERROR: u32 = 0;

/// Location value reported for names the program does not define.
pub const LOCATION_NOT_FOUND: i32 = -1;

pub trait Device: Send {
    /// Loads the device library. Called at most once per successful init.
    fn init(&mut self) -> anyhow::Result<()>;

    // ── global state ──────────────────────────────────────────────────────

    fn enable_blend(&mut self);
    fn blend_func(&mut self, src: BlendFactor, dst: BlendFactor);
    fn viewport(&mut self, width: i32, height: i32);
    /// Id of the framebuffer currently bound for drawing.
    fn framebuffer_binding(&mut self) -> u32;
    fn max_texture_size(&mut self) -> i32;
    fn last_error(&mut self) -> u32;
    fn flush(&mut self);

    // ── textures ──────────────────────────────────────────────────────────

    /// Returns 0 when no name could be generated.
    fn gen_texture(&mut self) -> u32;
    fn is_texture(&mut self, texture: u32) -> bool;
    fn bind_texture(&mut self, texture: u32);
    fn delete_texture(&mut self, texture: u32);
    fn set_unpack_alignment(&mut self, alignment: i32);
    /// Nearest filtering and edge clamping on the bound texture.
    fn set_nearest_clamped_sampling(&mut self);
    /// Allocates RGBA8 storage for the bound texture, leaving it uninitialized.
    fn tex_storage(&mut self, width: i32, height: i32);
    fn tex_sub_image(&mut self, pixels: &[u8], x: i32, y: i32, width: i32, height: i32);

    // ── framebuffers ──────────────────────────────────────────────────────

    fn gen_framebuffer(&mut self) -> u32;
    fn is_framebuffer(&mut self, framebuffer: u32) -> bool;
    fn bind_framebuffer(&mut self, framebuffer: u32);
    fn delete_framebuffer(&mut self, framebuffer: u32);
    /// Attaches `texture` as color attachment 0 of the bound framebuffer.
    fn attach_color_texture(&mut self, texture: u32);
    fn check_framebuffer_status(&mut self) -> u32;
    /// Reads RGBA8 pixels of the bound framebuffer into `out`.
    fn read_pixels(&mut self, width: i32, height: i32, out: &mut [u8]);

    // ── shaders & programs ────────────────────────────────────────────────

    fn create_shader(&mut self, kind: ShaderKind) -> u32;
    fn shader_source(&mut self, shader: u32, source: &str);
    fn compile_shader(&mut self, shader: u32);
    fn shader_compile_status(&mut self, shader: u32) -> bool;
    /// Info log, or `None` when the reported log length is zero.
    fn shader_info_log(&mut self, shader: u32) -> Option<String>;
    fn delete_shader(&mut self, shader: u32);

    fn create_program(&mut self) -> u32;
    fn attach_shader(&mut self, program: u32, shader: u32);
    fn link_program(&mut self, program: u32);
    fn program_link_status(&mut self, program: u32) -> bool;
    /// Info log, or `None` when the reported log length is zero.
    fn program_info_log(&mut self, program: u32) -> Option<String>;
    fn is_program(&mut self, program: u32) -> bool;
    fn use_program(&mut self, program: u32);
    fn delete_program(&mut self, program: u32);

    /// Returns [`LOCATION_NOT_FOUND`] for unknown names.
    fn uniform_location(&mut self, program: u32, name: &str) -> i32;
    /// Returns [`LOCATION_NOT_FOUND`] for unknown names.
    fn attrib_location(&mut self, program: u32, name: &str) -> i32;

    fn uniform_i32(&mut self, location: i32, value: i32);
    fn uniform_f32(&mut self, location: i32, value: f32);
    fn uniform_vec2(&mut self, location: i32, value: &[f32; 2]);
    fn uniform_vec4(&mut self, location: i32, value: &[f32; 4]);
    fn uniform_mat4(&mut self, location: i32, value: &[f32; 16]);

    fn vertex_attrib_pointer(
        &mut self,
        index: u32,
        size: i32,
        data_type: DataType,
        stride: i32,
        offset: i32,
    );
    fn enable_vertex_attrib_array(&mut self, index: u32);
    fn disable_vertex_attrib_array(&mut self, index: u32);

    // ── buffers ───────────────────────────────────────────────────────────

    fn gen_buffer(&mut self) -> u32;
    fn bind_buffer(&mut self, kind: BufferKind, buffer: u32);
    /// Reserves `size` bytes with a dynamic-draw usage hint.
    fn buffer_storage(&mut self, kind: BufferKind, size: i32);
    fn buffer_sub_data(&mut self, kind: BufferKind, offset: i32, data: &[u8]);
    fn delete_buffer(&mut self, buffer: u32);

    /// Draws indexed triangles with `u16` indices.
    fn draw_triangles(&mut self, count: i32, byte_offset: i32);
}
