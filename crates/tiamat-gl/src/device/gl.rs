use std::ffi::c_void;
use std::num::NonZeroU32;

use anyhow::Context as _;
use glow::HasContext;

use super::{Device, LOCATION_NOT_FOUND};
use crate::blend::BlendFactor;
use crate::handle::{BufferKind, DataType, ShaderKind};

type Loader = Box<dyn FnMut(&str) -> *const c_void + Send>;

/// OpenGL device backed by `glow`.
///
/// The GL function table is loaded lazily by [`Device::init`], which the
/// context runs on the device thread after the windowing layer made a GL
/// context current there. Calls made before a successful init do nothing
/// and report zero/false.
pub struct GlowDevice {
    loader: Option<Loader>,
    gl: Option<glow::Context>,
}

// SAFETY: a `GlowDevice` is only reachable through the context's connection,
// and every access to it happens inside a dispatched task. All tasks run on
// the one thread that owns the current GL context, so the function table is
// never called from two threads.
unsafe impl Send for GlowDevice {}

impl GlowDevice {
    /// Creates a device that resolves GL symbols through `loader` on init.
    pub fn new<F>(loader: F) -> Self
    where
        F: FnMut(&str) -> *const c_void + Send + 'static,
    {
        Self {
            loader: Some(Box::new(loader)),
            gl: None,
        }
    }

    /// Wraps an already loaded `glow` context. `init` becomes a no-op.
    pub fn from_context(gl: glow::Context) -> Self {
        Self { loader: None, gl: Some(gl) }
    }

    fn with<R: Default>(&self, f: impl FnOnce(&glow::Context) -> R) -> R {
        match self.gl.as_ref() {
            Some(gl) => f(gl),
            None => {
                log::warn!("gl call before device initialization ignored");
                R::default()
            }
        }
    }
}

fn native<T>(raw: u32, wrap: fn(NonZeroU32) -> T) -> Option<T> {
    NonZeroU32::new(raw).map(wrap)
}

fn uniform(location: i32) -> glow::NativeUniformLocation {
    glow::NativeUniformLocation(location as u32)
}

fn blend_factor(factor: BlendFactor) -> u32 {
    match factor {
        BlendFactor::Zero => glow::ZERO,
        BlendFactor::One => glow::ONE,
        BlendFactor::SrcAlpha => glow::SRC_ALPHA,
        BlendFactor::DstAlpha => glow::DST_ALPHA,
        BlendFactor::OneMinusSrcAlpha => glow::ONE_MINUS_SRC_ALPHA,
        BlendFactor::OneMinusDstAlpha => glow::ONE_MINUS_DST_ALPHA,
    }
}

fn buffer_target(kind: BufferKind) -> u32 {
    match kind {
        BufferKind::Vertex => glow::ARRAY_BUFFER,
        BufferKind::Index => glow::ELEMENT_ARRAY_BUFFER,
    }
}

fn created<T>(what: &str, result: Result<T, String>, raw: impl FnOnce(T) -> u32) -> u32 {
    match result {
        Ok(name) => raw(name),
        Err(err) => {
            log::error!("{what} failed: {err}");
            0
        }
    }
}

impl Device for GlowDevice {
    fn init(&mut self) -> anyhow::Result<()> {
        if self.gl.is_some() {
            return Ok(());
        }

        let mut loader = self
            .loader
            .take()
            .context("GL symbol loader was consumed by an earlier failed init")?;

        anyhow::ensure!(
            !loader("glGetString").is_null(),
            "GL symbol loader cannot resolve glGetString; is a context current?"
        );

        // SAFETY: the loader resolves symbols for the context current on this thread.
        let gl = unsafe { glow::Context::from_loader_function(|name| loader(name)) };

        let version = gl.version();
        log::debug!(
            "loaded OpenGL {}.{} ({})",
            version.major,
            version.minor,
            version.vendor_info
        );
        anyhow::ensure!(
            version.is_embedded || (version.major, version.minor) >= (2, 1),
            "OpenGL 2.1 or newer is required, found {}.{}",
            version.major,
            version.minor
        );

        self.gl = Some(gl);
        Ok(())
    }

    // ── global state ──────────────────────────────────────────────────────

    fn enable_blend(&mut self) {
        self.with(|gl| unsafe { gl.enable(glow::BLEND) })
    }

    fn blend_func(&mut self, src: BlendFactor, dst: BlendFactor) {
        self.with(|gl| unsafe { gl.blend_func(blend_factor(src), blend_factor(dst)) })
    }

    fn viewport(&mut self, width: i32, height: i32) {
        self.with(|gl| unsafe { gl.viewport(0, 0, width, height) })
    }

    fn framebuffer_binding(&mut self) -> u32 {
        self.with(|gl| unsafe { gl.get_parameter_i32(glow::FRAMEBUFFER_BINDING) as u32 })
    }

    fn max_texture_size(&mut self) -> i32 {
        self.with(|gl| unsafe { gl.get_parameter_i32(glow::MAX_TEXTURE_SIZE) })
    }

    fn last_error(&mut self) -> u32 {
        self.with(|gl| unsafe { gl.get_error() })
    }

    fn flush(&mut self) {
        self.with(|gl| unsafe { gl.flush() })
    }

    // ── textures ──────────────────────────────────────────────────────────

    fn gen_texture(&mut self) -> u32 {
        self.with(|gl| unsafe { created("glGenTextures", gl.create_texture(), |t| t.0.get()) })
    }

    fn is_texture(&mut self, texture: u32) -> bool {
        self.with(|gl| {
            native(texture, glow::NativeTexture).is_some_and(|t| unsafe { gl.is_texture(t) })
        })
    }

    fn bind_texture(&mut self, texture: u32) {
        self.with(|gl| unsafe {
            gl.bind_texture(glow::TEXTURE_2D, native(texture, glow::NativeTexture))
        })
    }

    fn delete_texture(&mut self, texture: u32) {
        self.with(|gl| {
            if let Some(t) = native(texture, glow::NativeTexture) {
                unsafe { gl.delete_texture(t) }
            }
        })
    }

    fn set_unpack_alignment(&mut self, alignment: i32) {
        self.with(|gl| unsafe { gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, alignment) })
    }

    fn set_nearest_clamped_sampling(&mut self) {
        self.with(|gl| unsafe {
            let t = glow::TEXTURE_2D;
            gl.tex_parameter_i32(t, glow::TEXTURE_MAG_FILTER, glow::NEAREST as i32);
            gl.tex_parameter_i32(t, glow::TEXTURE_MIN_FILTER, glow::NEAREST as i32);
            gl.tex_parameter_i32(t, glow::TEXTURE_WRAP_S, glow::CLAMP_TO_EDGE as i32);
            gl.tex_parameter_i32(t, glow::TEXTURE_WRAP_T, glow::CLAMP_TO_EDGE as i32);
        })
    }

    fn tex_storage(&mut self, width: i32, height: i32) {
        self.with(|gl| unsafe {
            gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                glow::RGBA as i32,
                width,
                height,
                0,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                None,
            )
        })
    }

    fn tex_sub_image(&mut self, pixels: &[u8], x: i32, y: i32, width: i32, height: i32) {
        self.with(|gl| unsafe {
            gl.tex_sub_image_2d(
                glow::TEXTURE_2D,
                0,
                x,
                y,
                width,
                height,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                glow::PixelUnpackData::Slice(pixels),
            )
        })
    }

    // ── framebuffers ──────────────────────────────────────────────────────

    fn gen_framebuffer(&mut self) -> u32 {
        self.with(|gl| unsafe {
            created("glGenFramebuffers", gl.create_framebuffer(), |f| f.0.get())
        })
    }

    fn is_framebuffer(&mut self, framebuffer: u32) -> bool {
        self.with(|gl| {
            native(framebuffer, glow::NativeFramebuffer)
                .is_some_and(|f| unsafe { gl.is_framebuffer(f) })
        })
    }

    fn bind_framebuffer(&mut self, framebuffer: u32) {
        self.with(|gl| unsafe {
            gl.bind_framebuffer(glow::FRAMEBUFFER, native(framebuffer, glow::NativeFramebuffer))
        })
    }

    fn delete_framebuffer(&mut self, framebuffer: u32) {
        self.with(|gl| {
            if let Some(f) = native(framebuffer, glow::NativeFramebuffer) {
                unsafe { gl.delete_framebuffer(f) }
            }
        })
    }

    fn attach_color_texture(&mut self, texture: u32) {
        self.with(|gl| unsafe {
            gl.framebuffer_texture_2d(
                glow::FRAMEBUFFER,
                glow::COLOR_ATTACHMENT0,
                glow::TEXTURE_2D,
                native(texture, glow::NativeTexture),
                0,
            )
        })
    }

    fn check_framebuffer_status(&mut self) -> u32 {
        self.with(|gl| unsafe { gl.check_framebuffer_status(glow::FRAMEBUFFER) })
    }

    fn read_pixels(&mut self, width: i32, height: i32, out: &mut [u8]) {
        self.with(|gl| unsafe {
            gl.read_pixels(
                0,
                0,
                width,
                height,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                glow::PixelPackData::Slice(out),
            )
        })
    }

    // ── shaders & programs ────────────────────────────────────────────────

    fn create_shader(&mut self, kind: ShaderKind) -> u32 {
        let ty = match kind {
            ShaderKind::Vertex => glow::VERTEX_SHADER,
            ShaderKind::Fragment => glow::FRAGMENT_SHADER,
        };
        self.with(|gl| unsafe { created("glCreateShader", gl.create_shader(ty), |s| s.0.get()) })
    }

    fn shader_source(&mut self, shader: u32, source: &str) {
        self.with(|gl| {
            if let Some(s) = native(shader, glow::NativeShader) {
                unsafe { gl.shader_source(s, source) }
            }
        })
    }

    fn compile_shader(&mut self, shader: u32) {
        self.with(|gl| {
            if let Some(s) = native(shader, glow::NativeShader) {
                unsafe { gl.compile_shader(s) }
            }
        })
    }

    fn shader_compile_status(&mut self, shader: u32) -> bool {
        self.with(|gl| {
            native(shader, glow::NativeShader)
                .is_some_and(|s| unsafe { gl.get_shader_compile_status(s) })
        })
    }

    fn shader_info_log(&mut self, shader: u32) -> Option<String> {
        self.with(|gl| {
            native(shader, glow::NativeShader)
                .map(|s| unsafe { gl.get_shader_info_log(s) })
                .filter(|log| !log.is_empty())
        })
    }

    fn delete_shader(&mut self, shader: u32) {
        self.with(|gl| {
            if let Some(s) = native(shader, glow::NativeShader) {
                unsafe { gl.delete_shader(s) }
            }
        })
    }

    fn create_program(&mut self) -> u32 {
        self.with(|gl| unsafe { created("glCreateProgram", gl.create_program(), |p| p.0.get()) })
    }

    fn attach_shader(&mut self, program: u32, shader: u32) {
        self.with(|gl| {
            let p = native(program, glow::NativeProgram);
            let s = native(shader, glow::NativeShader);
            if let (Some(p), Some(s)) = (p, s) {
                unsafe { gl.attach_shader(p, s) }
            }
        })
    }

    fn link_program(&mut self, program: u32) {
        self.with(|gl| {
            if let Some(p) = native(program, glow::NativeProgram) {
                unsafe { gl.link_program(p) }
            }
        })
    }

    fn program_link_status(&mut self, program: u32) -> bool {
        self.with(|gl| {
            native(program, glow::NativeProgram)
                .is_some_and(|p| unsafe { gl.get_program_link_status(p) })
        })
    }

    fn program_info_log(&mut self, program: u32) -> Option<String> {
        self.with(|gl| {
            native(program, glow::NativeProgram)
                .map(|p| unsafe { gl.get_program_info_log(p) })
                .filter(|log| !log.is_empty())
        })
    }

    fn is_program(&mut self, program: u32) -> bool {
        self.with(|gl| {
            native(program, glow::NativeProgram).is_some_and(|p| unsafe { gl.is_program(p) })
        })
    }

    fn use_program(&mut self, program: u32) {
        self.with(|gl| unsafe { gl.use_program(native(program, glow::NativeProgram)) })
    }

    fn delete_program(&mut self, program: u32) {
        self.with(|gl| {
            if let Some(p) = native(program, glow::NativeProgram) {
                unsafe { gl.delete_program(p) }
            }
        })
    }

    fn uniform_location(&mut self, program: u32, name: &str) -> i32 {
        let Some(p) = native(program, glow::NativeProgram) else {
            return LOCATION_NOT_FOUND;
        };
        match self.gl.as_ref() {
            Some(gl) => unsafe { gl.get_uniform_location(p, name) }
                .map_or(LOCATION_NOT_FOUND, |l| l.0 as i32),
            None => LOCATION_NOT_FOUND,
        }
    }

    fn attrib_location(&mut self, program: u32, name: &str) -> i32 {
        let Some(p) = native(program, glow::NativeProgram) else {
            return LOCATION_NOT_FOUND;
        };
        match self.gl.as_ref() {
            Some(gl) => unsafe { gl.get_attrib_location(p, name) }
                .map_or(LOCATION_NOT_FOUND, |l| l as i32),
            None => LOCATION_NOT_FOUND,
        }
    }

    fn uniform_i32(&mut self, location: i32, value: i32) {
        self.with(|gl| unsafe { gl.uniform_1_i32(Some(&uniform(location)), value) })
    }

    fn uniform_f32(&mut self, location: i32, value: f32) {
        self.with(|gl| unsafe { gl.uniform_1_f32(Some(&uniform(location)), value) })
    }

    fn uniform_vec2(&mut self, location: i32, value: &[f32; 2]) {
        self.with(|gl| unsafe { gl.uniform_2_f32_slice(Some(&uniform(location)), value) })
    }

    fn uniform_vec4(&mut self, location: i32, value: &[f32; 4]) {
        self.with(|gl| unsafe { gl.uniform_4_f32_slice(Some(&uniform(location)), value) })
    }

    fn uniform_mat4(&mut self, location: i32, value: &[f32; 16]) {
        self.with(|gl| unsafe {
            gl.uniform_matrix_4_f32_slice(Some(&uniform(location)), false, value)
        })
    }

    fn vertex_attrib_pointer(
        &mut self,
        index: u32,
        size: i32,
        data_type: DataType,
        stride: i32,
        offset: i32,
    ) {
        let ty = match data_type {
            DataType::Short => glow::SHORT,
            DataType::Float => glow::FLOAT,
        };
        self.with(|gl| unsafe {
            gl.vertex_attrib_pointer_f32(index, size, ty, false, stride, offset)
        })
    }

    fn enable_vertex_attrib_array(&mut self, index: u32) {
        self.with(|gl| unsafe { gl.enable_vertex_attrib_array(index) })
    }

    fn disable_vertex_attrib_array(&mut self, index: u32) {
        self.with(|gl| unsafe { gl.disable_vertex_attrib_array(index) })
    }

    // ── buffers ───────────────────────────────────────────────────────────

    fn gen_buffer(&mut self) -> u32 {
        self.with(|gl| unsafe { created("glGenBuffers", gl.create_buffer(), |b| b.0.get()) })
    }

    fn bind_buffer(&mut self, kind: BufferKind, buffer: u32) {
        self.with(|gl| unsafe {
            gl.bind_buffer(buffer_target(kind), native(buffer, glow::NativeBuffer))
        })
    }

    fn buffer_storage(&mut self, kind: BufferKind, size: i32) {
        self.with(|gl| unsafe { gl.buffer_data_size(buffer_target(kind), size, glow::DYNAMIC_DRAW) })
    }

    fn buffer_sub_data(&mut self, kind: BufferKind, offset: i32, data: &[u8]) {
        self.with(|gl| unsafe { gl.buffer_sub_data_u8_slice(buffer_target(kind), offset, data) })
    }

    fn delete_buffer(&mut self, buffer: u32) {
        self.with(|gl| {
            if let Some(b) = native(buffer, glow::NativeBuffer) {
                unsafe { gl.delete_buffer(b) }
            }
        })
    }

    fn draw_triangles(&mut self, count: i32, byte_offset: i32) {
        self.with(|gl| unsafe {
            gl.draw_elements(glow::TRIANGLES, count, glow::UNSIGNED_SHORT, byte_offset)
        })
    }
}
